//! Typed error hierarchy for the roundtable audit engine.
//!
//! Two top-level enums cover the two subsystems that can fail:
//! - `AuditError` — fatal failures of a whole audit run
//! - `OracleError` — narrative-oracle call failures, confined behind the
//!   agent runner boundary (peers recover via failure markers)
//!
//! Everything else degrades gracefully: a narrative without a qualifying
//! table passes through unmodified, cache write failures are recovered
//! internally, and ceiling violations are flagged on the result rather
//! than raised.

use thiserror::Error;

/// Fatal failures of an audit run.
///
/// These are the only two error kinds a caller of
/// [`analyze_audit`](crate::orchestrator::analyze_audit) ever sees; all
/// other conditions are absorbed into the result with a visible annotation.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The oracle has no usable credential or configuration.
    /// Surfaced immediately, before any round is attempted.
    #[error("narrative oracle unavailable: {0}")]
    ServiceUnavailable(String),

    /// The judge round itself failed. Its failure marker is the final
    /// report, verbatim, never silently replaced by a peer's report.
    #[error("judge round failed: {marker}")]
    JudgeRoundFailed {
        /// The failure marker produced for the judge round.
        marker: String,
        /// Peer narratives collected before the judge ran, in round order.
        peer_reports: Vec<String>,
    },
}

/// Errors from a single narrative-oracle invocation.
///
/// The agent runner converts every one of these into a failure marker for
/// its round, so a strict join over many runners cannot be aborted by one
/// failing call.
#[derive(Debug, Error)]
pub enum OracleError {
    /// No API key configured (checked `GEMINI_API_KEY`, then `API_KEY`).
    #[error("no oracle credential configured (set GEMINI_API_KEY or API_KEY)")]
    MissingCredential,

    /// Transport-level failure, including the per-request timeout.
    #[error("oracle request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The oracle answered but produced no narrative text.
    #[error("oracle returned an empty narrative")]
    EmptyResponse,

    /// The response body did not have the expected shape.
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unavailable_is_matchable() {
        let err = AuditError::ServiceUnavailable("no key".into());
        match &err {
            AuditError::ServiceUnavailable(msg) => assert_eq!(msg, "no key"),
            _ => panic!("Expected ServiceUnavailable"),
        }
    }

    #[test]
    fn judge_round_failed_carries_marker_and_peers() {
        let err = AuditError::JudgeRoundFailed {
            marker: "[AUDITOR 6 FAILED]".into(),
            peer_reports: vec!["report one".into(), "report two".into()],
        };
        match &err {
            AuditError::JudgeRoundFailed {
                marker,
                peer_reports,
            } => {
                assert_eq!(marker, "[AUDITOR 6 FAILED]");
                assert_eq!(peer_reports.len(), 2);
            }
            _ => panic!("Expected JudgeRoundFailed"),
        }
        assert!(err.to_string().contains("[AUDITOR 6 FAILED]"));
    }

    #[test]
    fn oracle_error_missing_credential_names_the_env_vars() {
        let err = OracleError::MissingCredential;
        let msg = err.to_string();
        assert!(msg.contains("GEMINI_API_KEY"));
        assert!(msg.contains("API_KEY"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&AuditError::ServiceUnavailable("x".into()));
        assert_std_error(&OracleError::EmptyResponse);
    }
}
