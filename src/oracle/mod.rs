//! Narrative-generation oracle boundary.
//!
//! The oracle is an external, rate-limited, non-deterministic service that
//! turns an instruction into free text. Everything above this boundary
//! treats it as unreliable: its arithmetic is re-derived by the
//! verification layer and its failures are absorbed into round markers by
//! the agent runner.

pub mod gemini;

pub use gemini::GeminiOracle;

use crate::errors::OracleError;
use async_trait::async_trait;

/// A service that generates one narrative from an instruction.
///
/// `seed` is the round's deterministic variation parameter; implementations
/// should pass it through so repeated runs reproduce per-round output.
#[async_trait]
pub trait NarrativeOracle: Send + Sync {
    async fn generate(&self, instruction: &str, seed: i64) -> Result<String, OracleError>;

    /// Identifier of the underlying model, recorded alongside cached
    /// payloads.
    fn model_tag(&self) -> &str;
}
