//! Audit round identity.
//!
//! One audit fans out into K independent peer rounds followed by a single
//! judge round. The judge's extra responsibilities (the concatenated peer
//! context it consolidates and the financial ceiling it must respect)
//! are fields of its variant, so nothing downstream branches on a magic
//! round number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base seed shared by every round.
const SEED_BASE: i64 = 42;

/// Per-round seed stride; keeps sibling peers decorrelated while each
/// round stays reproducible across runs.
const SEED_STRIDE: i64 = 111;

/// One oracle invocation within an audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Round {
    /// An independent auditor with no visibility into siblings.
    /// Indices are 1-based.
    Peer { index: usize },
    /// The single consolidating round that sees every peer narrative and
    /// issues the final verdict.
    Judge {
        /// Round number of the judge (K + 1 for K peers).
        index: usize,
        /// All peer narratives, labeled by round index. Failed peers
        /// contribute their failure marker and read as missing input.
        peer_context: String,
        /// Maximum total the verdict may challenge, when the payment
        /// program declares one.
        ceiling: Option<i64>,
    },
}

impl Round {
    /// Create a peer round. `index` is 1-based.
    pub fn peer(index: usize) -> Self {
        Self::Peer { index }
    }

    /// Create the judge round following `peer_count` peers.
    pub fn judge(peer_count: usize, peer_context: impl Into<String>, ceiling: Option<i64>) -> Self {
        Self::Judge {
            index: peer_count + 1,
            peer_context: peer_context.into(),
            ceiling,
        }
    }

    /// Round number within the audit (peers 1..=K, judge K+1).
    pub fn index(&self) -> usize {
        match self {
            Self::Peer { index } => *index,
            Self::Judge { index, .. } => *index,
        }
    }

    /// Deterministic variation parameter for this round.
    ///
    /// Repeated runs reproduce each round's narrative without requiring
    /// identical text across sibling peers.
    pub fn seed(&self) -> i64 {
        SEED_BASE + SEED_STRIDE * self.index() as i64
    }

    pub fn is_judge(&self) -> bool {
        matches!(self, Self::Judge { .. })
    }

    /// Sentinel substituted for this round's narrative when its oracle
    /// call fails. Embeds the round identity so a strict join over many
    /// rounds stays attributable.
    pub fn failure_marker(&self) -> String {
        match self {
            Self::Peer { index } => format!("[AUDITOR {index} FAILED]"),
            Self::Judge { index, .. } => format!("[AUDITOR {index} FAILED - JUDGE ROUND]"),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer { index } => write!(f, "auditor {index}"),
            Self::Judge { index, .. } => write!(f, "judge (round {index})"),
        }
    }
}

/// Outcome of running one round: the narrative text, or the round's
/// failure marker with `failed` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub text: String,
    pub failed: bool,
}

impl RoundOutcome {
    pub fn narrative(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failed: false,
        }
    }

    pub fn failure(round: &Round) -> Self {
        Self {
            text: round.failure_marker(),
            failed: true,
        }
    }
}
