//! The `audit` command: run the full round table over three documents.

use anyhow::{Context, Result};
use console::style;
use roundtable::errors::AuditError;
use roundtable::oracle::GeminiOracle;
use roundtable::ui::{AuditUi, ProgressTicker};
use roundtable::verify::currency::format_clp;
use roundtable::{AuditConfig, DocumentBundle, RoundTable};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Tick period for the simulated progress surface.
const PROGRESS_PERIOD: Duration = Duration::from_millis(300);

pub async fn cmd_audit(
    bill: &Path,
    pam: &Path,
    contract: &Path,
    peers: Option<usize>,
    ceiling: Option<i64>,
    out: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let bill = load_document(bill, "bill")?;
    let pam = load_document(pam, "payment program")?;
    let contract = load_document(contract, "contract")?;
    let documents = DocumentBundle::new(bill, pam, contract);

    // No credential means no audit - fail before any round is attempted.
    let oracle =
        GeminiOracle::from_env().map_err(|e| AuditError::ServiceUnavailable(e.to_string()))?;

    let mut config = AuditConfig::default();
    if let Some(peers) = peers {
        config = config.with_peers(peers);
    }
    if let Some(ceiling) = ceiling {
        config = config.with_ceiling(ceiling);
    }

    let ui = Arc::new(AuditUi::new(verbose));
    ui.log_step("convening the audit round table");
    let ticker = ProgressTicker::spawn(ui.clone(), PROGRESS_PERIOD);

    let table = RoundTable::new(config, Arc::new(oracle));
    match table.run(&documents).await {
        Ok(result) => {
            ticker.finish(true);

            println!(
                "{} {}",
                style("Verified challenged total:").bold(),
                style(format_clp(result.verified_total)).cyan().bold()
            );
            if let Some(limit) = result.ceiling {
                println!(
                    "{} {}",
                    style("Declared co-payment ceiling:").dim(),
                    format_clp(limit)
                );
            }
            if result.ceiling_exceeded {
                println!(
                    "{}",
                    style("⚠ Recomputed total exceeded the ceiling; capped and annotated.")
                        .yellow()
                        .bold()
                );
            }

            match out {
                Some(path) => {
                    fs::write(path, &result.final_report).with_context(|| {
                        format!("Failed to write report to {}", path.display())
                    })?;
                    println!("Report written to {}", path.display());
                }
                None => {
                    println!("\n{}", result.final_report);
                }
            }
            Ok(())
        }
        Err(AuditError::JudgeRoundFailed {
            marker,
            peer_reports,
        }) => {
            ticker.finish(false);
            ui.audit_failed("judge round failed");
            // The marker is the final report, verbatim.
            println!("\n{marker}");
            Err(AuditError::JudgeRoundFailed {
                marker,
                peer_reports,
            }
            .into())
        }
        Err(e) => {
            ticker.finish(false);
            ui.audit_failed(&e.to_string());
            Err(e.into())
        }
    }
}

fn load_document(path: &Path, label: &str) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} document at {}", label, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} document at {} is not valid JSON", label, path.display()))
}
