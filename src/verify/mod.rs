//! Verification and recomputation of a narrative's financial claims.
//!
//! The narrative oracle is not a reliable arithmetic engine, so the one
//! number that matters, the total challenged amount, is re-derived here
//! from the synthesis table the narrative itself printed:
//!
//! 1. corrupted lines (mojibake, symbol runs) are discarded,
//! 2. the first qualifying table is located and its header resolved once,
//! 3. every data row's amount cell is summed, skipping separator rows and
//!    the oracle's own TOTAL rows,
//! 4. a synthetic summary block derived solely from the recomputed total
//!    is spliced in at the table's end.
//!
//! Prose outside the table region passes through verbatim. Only the first
//! qualifying table per report is summed; later tables are a documented
//! limitation.

pub mod currency;
pub mod table;

use currency::{format_clp, parse_amount};
use regex::Regex;
use std::sync::LazyLock;
use table::{AmountColumn, TableHeader};
use tracing::debug;

/// Glyph classes that only show up in visually hallucinated output.
static MOJIBAKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ØßðÐµ×÷þ]").expect("mojibake pattern is valid"));

/// Repeating interleaved-symbol runs such as `&I&M&P`.
static SYMBOL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[A-Z0-9]&[A-Z0-9]&").expect("symbol-run pattern is valid"));

/// Known glitch fragments seen in corrupted narratives.
const GLITCH_FRAGMENTS: [&str; 3] = ["Ø=Ü", "°Ø", "°&"];

/// Maximum tolerated ratio of unrecognized symbols in a non-table line.
const SYMBOL_RATIO_LIMIT: f32 = 0.4;

/// Synthetic summary block markers. Lines with these prefixes are
/// re-generated on every verification pass, which keeps re-verifying an
/// already-verified report idempotent.
const PATIENT_IMPACT_PREFIX: &str = "**💰 TOTAL PATIENT IMPACT";
const INSURER_REVERSAL_PREFIX: &str = "**📉 TOTAL INSURER REVERSAL";
const GRAND_TOTAL_PREFIX: &str = "### 🏁 GRAND TOTAL CHALLENGED";

/// Output of one verification pass.
#[derive(Debug, Clone)]
pub struct VerifiedReport {
    /// The narrative with corrupted lines removed and, when a table was
    /// summed, the synthetic summary block spliced in.
    pub content: String,
    /// Total challenged amount recomputed from the table rows. Always
    /// non-negative; 0 when no table was summed.
    pub verified_total: i64,
    /// Whether a qualifying table with an amount column was found and
    /// summed. `false` means the narrative passed through unsummed.
    pub table_found: bool,
}

/// Whether a line survives the corruption heuristics.
///
/// Empty lines are kept for spacing. Table lines are exempt from the
/// symbol-ratio check; pipes and dashes would trip it.
fn is_clean_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }

    if MOJIBAKE.is_match(line) || SYMBOL_RUN.is_match(line) {
        return false;
    }
    if GLITCH_FRAGMENTS.iter().any(|frag| line.contains(frag)) {
        return false;
    }
    if trimmed.starts_with("-_-") {
        return false;
    }

    if !trimmed.starts_with('|') {
        let total = trimmed.chars().count();
        let symbols = trimmed.chars().filter(|c| !is_expected_char(*c)).count();
        if symbols as f32 > total as f32 * SYMBOL_RATIO_LIMIT {
            return false;
        }
    }

    true
}

fn is_expected_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '.' | ',' | '$' | '|' | ':' | '(' | ')' | '-')
        || matches!(
            c,
            'á' | 'é' | 'í' | 'ó' | 'ú' | 'Á' | 'É' | 'Í' | 'Ó' | 'Ú' | 'ñ' | 'Ñ'
        )
}

fn is_stale_summary_line(trimmed: &str) -> bool {
    trimmed.starts_with(PATIENT_IMPACT_PREFIX)
        || trimmed.starts_with(INSURER_REVERSAL_PREFIX)
        || trimmed.starts_with(GRAND_TOTAL_PREFIX)
}

fn summary_block(total: i64) -> [String; 3] {
    [
        format!(
            "{} (SUGGESTED REFUND): {}**",
            PATIENT_IMPACT_PREFIX,
            format_clp(total)
        ),
        format!("{} (ADJUSTMENT): $0**", INSURER_REVERSAL_PREFIX),
        format!("{}: {}", GRAND_TOTAL_PREFIX, format_clp(total)),
    ]
}

/// Re-derive the challenged total from the report's own synthesis table
/// and splice a verified summary in at the table's end.
pub fn verify_report(report: &str) -> VerifiedReport {
    let mut total: i64 = 0;
    let mut out: Vec<String> = Vec::new();

    let mut in_table = false;
    let mut table_done = false;
    let mut header: Option<TableHeader> = None;

    for line in report.lines() {
        if !is_clean_line(line) {
            debug!(line, "discarded corrupted line");
            continue;
        }
        let trimmed = line.trim();

        // Stale summary lines are regenerated below, never re-summed.
        if is_stale_summary_line(trimmed) {
            continue;
        }

        if !in_table
            && !table_done
            && trimmed.starts_with('|')
            && table::looks_like_table_start(trimmed)
        {
            in_table = true;
        }

        if in_table {
            if !trimmed.starts_with('|') {
                // Table ended: splice the verified summary before the
                // line that broke the run.
                in_table = false;
                table_done = true;
                if header_summed(&header) {
                    out.extend(summary_block(total.max(0)));
                }
                out.push(line.to_string());
                continue;
            }

            let cells = table::split_cells(trimmed);

            if header.is_none() {
                header = Some(table::parse_header(trimmed));
                out.push(line.to_string());
                continue;
            }
            let amount = header
                .as_ref()
                .map_or(AmountColumn::Missing, |resolved| resolved.amount);

            if table::is_separator_row(&cells) {
                out.push(line.to_string());
                continue;
            }
            // The oracle's own total rows are dropped: their arithmetic
            // is exactly what this pass re-derives.
            if table::is_total_row(&cells) {
                continue;
            }
            if let AmountColumn::Resolved(idx) = amount {
                if idx < cells.len() {
                    total += parse_amount(&cells[idx]);
                }
            }
            out.push(line.to_string());
            continue;
        }

        out.push(line.to_string());
    }

    // Table ran to EOF.
    if in_table && header_summed(&header) {
        out.extend(summary_block(total.max(0)));
    }

    let table_found = (in_table || table_done) && header_summed(&header);
    VerifiedReport {
        content: out.join("\n"),
        verified_total: if table_found { total.max(0) } else { 0 },
        table_found,
    }
}

fn header_summed(header: &Option<TableHeader>) -> bool {
    matches!(
        header,
        Some(TableHeader {
            amount: AmountColumn::Resolved(_),
            ..
        })
    )
}

/// Clamp a verified total to the financial ceiling, annotating the report.
///
/// Returns `true` when the total exceeded the ceiling. The violation is
/// never silent: the total is capped and a visible annotation is appended
/// explaining the adjustment.
pub fn enforce_ceiling(verified: &mut VerifiedReport, ceiling: i64) -> bool {
    if verified.verified_total <= ceiling {
        return false;
    }
    let annotation = format!(
        "\n> **⚠ CEILING ADJUSTMENT:** the recomputed challenged total {} \
exceeds the declared co-payment {}; the verified total has been capped at \
the co-payment.",
        format_clp(verified.verified_total),
        format_clp(ceiling)
    );
    verified.content.push_str(&annotation);
    verified.verified_total = ceiling;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
# Consolidated Forensic Audit Report

Some prose before the table.

| Code | Description | Finding | Challenged Amount | Legal Basis | Anchor |
|---|---|---|---|---|---|
| 0301011 | Thermometer | Bed-day unbundling | 8.605 | IF-319 | bill.sections[0].items[2] |
| 3101002 | Theater materials | Theater unbundling | 1.234.567,89 | IF-319 | bill.sections[2].items[5] |
| TOTAL | | | 1.300.000 | | |

Closing prose after the table.
";

    // =========================================
    // Recomputation
    // =========================================

    #[test]
    fn recomputes_total_from_rows_excluding_total_row() {
        let verified = verify_report(REPORT);
        assert!(verified.table_found);
        // 8.605 => 8605, 1.234.567,89 => 1234568; the TOTAL row's
        // 1.300.000 is excluded.
        assert_eq!(verified.verified_total, 1_243_173);
    }

    #[test]
    fn splices_summary_block_derived_from_verified_total() {
        let verified = verify_report(REPORT);
        assert!(verified.content.contains("GRAND TOTAL CHALLENGED: $1.243.173"));
        assert!(verified.content.contains("TOTAL PATIENT IMPACT"));
        assert!(verified.content.contains("(ADJUSTMENT): $0"));
        // The oracle's own total row is gone.
        assert!(!verified.content.contains("1.300.000"));
    }

    #[test]
    fn prose_outside_the_table_is_preserved_verbatim() {
        let verified = verify_report(REPORT);
        assert!(verified.content.contains("Some prose before the table."));
        assert!(verified.content.contains("Closing prose after the table."));
    }

    #[test]
    fn summary_lands_before_the_line_that_ended_the_table() {
        let verified = verify_report(REPORT);
        let summary_pos = verified.content.find("GRAND TOTAL").unwrap();
        let closing_pos = verified.content.find("Closing prose").unwrap();
        assert!(summary_pos < closing_pos);
    }

    #[test]
    fn table_running_to_eof_still_gets_a_summary() {
        let report = "\
| Code | Challenged Amount |
|---|---|
| 01 | $5.000 |
| 02 | $2.500 |";
        let verified = verify_report(report);
        assert_eq!(verified.verified_total, 7_500);
        assert!(verified.content.contains("GRAND TOTAL CHALLENGED: $7.500"));
    }

    #[test]
    fn reverifying_verified_output_is_idempotent() {
        let first = verify_report(REPORT);
        let second = verify_report(&first.content);
        assert_eq!(second.verified_total, first.verified_total);
        assert_eq!(second.content, first.content);
    }

    // =========================================
    // Pass-through cases
    // =========================================

    #[test]
    fn report_without_table_passes_through() {
        let report = "Just prose.\n\nNo findings table at all.";
        let verified = verify_report(report);
        assert!(!verified.table_found);
        assert_eq!(verified.verified_total, 0);
        assert_eq!(verified.content, report);
    }

    #[test]
    fn table_without_amount_column_is_not_summed() {
        let report = "\
| Code | Description | Notes |
|---|---|---|
| 01 | item | 9.999 |

Done.";
        let verified = verify_report(report);
        assert!(!verified.table_found);
        assert_eq!(verified.verified_total, 0);
        assert!(!verified.content.contains("GRAND TOTAL"));
    }

    #[test]
    fn only_the_first_qualifying_table_is_summed() {
        let report = format!(
            "{REPORT}\n| Code | Challenged Amount |\n|---|---|\n| 99 | $999.999 |\n"
        );
        let verified = verify_report(&report);
        assert_eq!(verified.verified_total, 1_243_173);
    }

    // =========================================
    // Corruption filtering
    // =========================================

    #[test]
    fn mojibake_and_glitch_lines_are_discarded() {
        let report = "Clean prose.\nØ=Ü garbage glyphs µ×÷\n&I&M&P&A&C&T\n-_- noise\nMore prose.";
        let verified = verify_report(report);
        assert!(verified.content.contains("Clean prose."));
        assert!(verified.content.contains("More prose."));
        assert!(!verified.content.contains("garbage"));
        assert!(!verified.content.contains("&I&M&P"));
        assert!(!verified.content.contains("-_-"));
    }

    #[test]
    fn symbol_heavy_lines_are_discarded_unless_table() {
        let noisy = "##%%@@!!^^~~##%%@@";
        let verified = verify_report(&format!("ok\n{noisy}\nstill ok"));
        assert!(!verified.content.contains(noisy));
        // Table rows are exempt from the ratio check.
        let verified = verify_report(
            "| Code | Challenged Amount |\n|---|---|\n| @@##%% | $1.000 |\n\nend",
        );
        assert_eq!(verified.verified_total, 1_000);
    }

    #[test]
    fn filtering_never_increases_the_finding_count() {
        let clean = verify_report(REPORT);
        let corrupted = format!("Ø corrupt header µ\n{REPORT}");
        let filtered = verify_report(&corrupted);
        // The corrupt line vanishes and every surviving row contributes
        // exactly one addend, so the outputs match exactly.
        assert_eq!(filtered.verified_total, clean.verified_total);
        assert_eq!(filtered.content, clean.content);
    }

    // =========================================
    // Ceiling guard
    // =========================================

    #[test]
    fn ceiling_violation_clamps_and_annotates() {
        let mut verified = verify_report(
            "| Code | Challenged Amount |\n|---|---|\n| 01 | $75.000 |\n\nend",
        );
        assert_eq!(verified.verified_total, 75_000);
        let violated = enforce_ceiling(&mut verified, 50_000);
        assert!(violated);
        assert_eq!(verified.verified_total, 50_000);
        assert!(verified.content.contains("CEILING ADJUSTMENT"));
        assert!(verified.content.contains("$75.000"));
        assert!(verified.content.contains("$50.000"));
    }

    #[test]
    fn totals_within_the_ceiling_are_untouched() {
        let mut verified = verify_report(
            "| Code | Challenged Amount |\n|---|---|\n| 01 | $10.000 |\n\nend",
        );
        let violated = enforce_ceiling(&mut verified, 50_000);
        assert!(!violated);
        assert_eq!(verified.verified_total, 10_000);
        assert!(!verified.content.contains("CEILING ADJUSTMENT"));
    }
}
