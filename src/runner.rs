//! Agent task runner: one oracle invocation per round.
//!
//! The runner is the failure isolation boundary. A raw oracle error never
//! crosses it: every failure is converted into the round's marker, so a
//! strict join over many runners cannot be aborted by one failing peer.

use crate::documents::DocumentBundle;
use crate::oracle::NarrativeOracle;
use crate::prompts;
use crate::rounds::{Round, RoundOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs audit rounds against a narrative oracle. No side effects beyond
/// the outbound call.
pub struct AgentRunner {
    oracle: Arc<dyn NarrativeOracle>,
}

impl AgentRunner {
    pub fn new(oracle: Arc<dyn NarrativeOracle>) -> Self {
        Self { oracle }
    }

    /// Execute one round: build its instruction, invoke the oracle with
    /// the round's seed, and absorb any failure into the round marker.
    pub async fn run(&self, documents: &DocumentBundle, round: &Round) -> RoundOutcome {
        let instruction = prompts::round_instruction(documents, round);
        debug!(round = %round, seed = round.seed(), "dispatching round");

        match self.oracle.generate(&instruction, round.seed()).await {
            Ok(text) => {
                debug!(round = %round, chars = text.len(), "round completed");
                RoundOutcome::narrative(text)
            }
            Err(e) => {
                warn!(round = %round, error = %e, "round failed, substituting marker");
                RoundOutcome::failure(round)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OracleError;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedOracle {
        fail: bool,
    }

    #[async_trait]
    impl NarrativeOracle for FixedOracle {
        async fn generate(&self, _instruction: &str, _seed: i64) -> Result<String, OracleError> {
            if self.fail {
                Err(OracleError::EmptyResponse)
            } else {
                Ok("narrative body".to_string())
            }
        }

        fn model_tag(&self) -> &str {
            "fixed-test-model"
        }
    }

    fn bundle() -> DocumentBundle {
        DocumentBundle::new(json!({}), json!({}), json!({}))
    }

    #[tokio::test]
    async fn successful_round_returns_the_narrative() {
        let runner = AgentRunner::new(Arc::new(FixedOracle { fail: false }));
        let outcome = runner.run(&bundle(), &Round::peer(1)).await;
        assert!(!outcome.failed);
        assert_eq!(outcome.text, "narrative body");
    }

    #[tokio::test]
    async fn failed_round_yields_the_marker_not_an_error() {
        let runner = AgentRunner::new(Arc::new(FixedOracle { fail: true }));
        let outcome = runner.run(&bundle(), &Round::peer(3)).await;
        assert!(outcome.failed);
        assert_eq!(outcome.text, "[AUDITOR 3 FAILED]");
    }
}
