//! Round-table orchestrator: K independent peers, a strict join, one
//! consolidating judge, and the verified assembly of the final result.
//!
//! Two phases, no retries at this layer:
//!
//! 1. **PEER** — exactly K peer rounds launched concurrently, none seeing
//!    a sibling, each with its own deterministic variation seed. The join
//!    is a strict barrier: the judge phase does not begin until every
//!    peer has settled, success or marker.
//! 2. **JUDGE** — one more round over the concatenated, labeled peer
//!    narratives, instructed to keep every well-founded finding, re-scan
//!    the documents itself for the surgical-theater unbundling pattern,
//!    and respect the financial ceiling.
//!
//! The verification layer then re-derives the challenged total from the
//! judge's own table, and the ceiling guard clamps and flags any excess.

use crate::config::AuditConfig;
use crate::documents::DocumentBundle;
use crate::errors::AuditError;
use crate::oracle::{GeminiOracle, NarrativeOracle};
use crate::prompts;
use crate::rounds::Round;
use crate::runner::AgentRunner;
use crate::verify;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The consolidated verdict of one audit run.
///
/// All K peer narratives are retained in round order; callers are shown
/// the first and last as representative drafts alongside the verdict.
#[derive(Debug, Clone)]
pub struct ConsolidatedResult {
    /// The judge's narrative after verification: corrupted lines removed,
    /// challenged total recomputed, synthetic summary spliced in.
    pub final_report: String,
    /// Every peer narrative, in round order (failure markers included).
    pub peer_reports: Vec<String>,
    /// Total challenged amount recomputed from the final report's table.
    /// Non-negative, and never above `ceiling` when one is known.
    pub verified_total: i64,
    /// The financial ceiling in force, when the payment program declared
    /// a co-payment total (or the caller overrode it).
    pub ceiling: Option<i64>,
    /// Whether the recomputed total exceeded the ceiling and was capped.
    /// The final report carries a visible annotation when set.
    pub ceiling_exceeded: bool,
}

impl ConsolidatedResult {
    /// First peer's narrative, the "first draft" surfaced to callers.
    pub fn first_peer(&self) -> Option<&str> {
        self.peer_reports.first().map(String::as_str)
    }

    /// Last peer's narrative, the "last word" surfaced to callers.
    pub fn last_peer(&self) -> Option<&str> {
        self.peer_reports.last().map(String::as_str)
    }
}

/// The two-phase audit state machine.
pub struct RoundTable {
    config: AuditConfig,
    runner: AgentRunner,
}

impl RoundTable {
    pub fn new(config: AuditConfig, oracle: Arc<dyn NarrativeOracle>) -> Self {
        Self {
            config,
            runner: AgentRunner::new(oracle),
        }
    }

    /// Run a full audit over one document bundle.
    ///
    /// Peer failures never abort the run. A failed judge round is fatal:
    /// its marker becomes the final report, verbatim, inside
    /// [`AuditError::JudgeRoundFailed`], never silently replaced by a
    /// peer's report.
    pub async fn run(&self, documents: &DocumentBundle) -> Result<ConsolidatedResult, AuditError> {
        let ceiling = self
            .config
            .ceiling_override
            .or_else(|| documents.declared_copayment());
        if ceiling.is_none() {
            warn!("payment program declares no co-payment total; ceiling guard is inert");
        }

        // PEER phase. The join is a strict barrier: every round settles
        // before the judge sees anything.
        info!(peers = self.config.peers, "launching independent peer rounds");
        let rounds: Vec<Round> = (1..=self.config.peers).map(Round::peer).collect();
        let outcomes = join_all(rounds.iter().map(|round| self.runner.run(documents, round))).await;

        let failed = outcomes.iter().filter(|o| o.failed).count();
        if failed > 0 {
            warn!(
                failed,
                total = self.config.peers,
                "peer rounds failed; the judge will treat their markers as missing input"
            );
        }
        let peer_reports: Vec<String> = outcomes.into_iter().map(|o| o.text).collect();

        // JUDGE phase: exactly one more call.
        info!("running judge round over {} peer narratives", peer_reports.len());
        let context = prompts::peer_context(&peer_reports);
        let judge = Round::judge(self.config.peers, context, ceiling);
        let verdict = self.runner.run(documents, &judge).await;
        if verdict.failed {
            return Err(AuditError::JudgeRoundFailed {
                marker: verdict.text,
                peer_reports,
            });
        }

        // Recompute the money from the judge's own table, then bound it.
        let mut verified = verify::verify_report(&verdict.text);
        if !verified.table_found {
            info!("no qualifying synthesis table; narrative passes through unsummed");
        }
        let mut ceiling_exceeded = false;
        if let Some(limit) = ceiling {
            ceiling_exceeded = verify::enforce_ceiling(&mut verified, limit);
            if ceiling_exceeded {
                warn!(
                    limit,
                    "recomputed total exceeded the declared co-payment; capped and annotated"
                );
            }
        }

        info!(
            verified_total = verified.verified_total,
            ceiling_exceeded, "audit complete"
        );
        Ok(ConsolidatedResult {
            final_report: verified.content,
            peer_reports,
            verified_total: verified.verified_total,
            ceiling,
            ceiling_exceeded,
        })
    }
}

/// Run a full audit with the environment-configured oracle and default
/// settings.
///
/// Fails with [`AuditError::ServiceUnavailable`] before any round is
/// attempted when no oracle credential is configured.
pub async fn analyze_audit(
    bill: Value,
    payment_program: Value,
    contract: Value,
) -> Result<ConsolidatedResult, AuditError> {
    let oracle =
        GeminiOracle::from_env().map_err(|e| AuditError::ServiceUnavailable(e.to_string()))?;
    let documents = DocumentBundle::new(bill, payment_program, contract);
    RoundTable::new(AuditConfig::default(), Arc::new(oracle))
        .run(&documents)
        .await
}
