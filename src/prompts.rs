//! Instruction templates for peer and judge rounds.
//!
//! The domain rule set and legal citations below are owned by the audit
//! methodology team; this module only interpolates them with document data
//! and round identity. Templates instruct the oracle to emit one markdown
//! synthesis table whose amounts the verification layer re-sums; the
//! oracle's own arithmetic is never trusted.

use crate::documents::DocumentBundle;
use crate::rounds::Round;
use crate::verify::currency::format_clp;

/// Mandatory mischarge patterns every auditor must actively check.
const RULESET_TEXT: &str = "\
1. GENERIC LINE LABELS (Law 20.584): items billed under opaque labels \
(\"miscellaneous\", \"general supplies\") with a co-payment > 0 are \
challenged in full for lack of transparency.
2. BED-DAY UNBUNDLING (Circular IF-319): routine care items (thermometers, \
gloves, basic monitoring) billed on top of the bed-day rate are challenged \
in full; they are included in the bed-day.
3. SINGLE-EVENT DOCTRINE (Ruling SS No. 12.287/2016): an emergency \
admission that ends in hospitalization is one event; any outpatient \
co-payment charged for that emergency is challenged and re-settled at \
hospital coverage.
4. SURGICAL-THEATER UNBUNDLING (Circular IF-319, high priority): when the \
bill carries a surgery/theater fee, common theater materials and drugs \
(code families 3101***, 3218***, labels like MATERIALS, DRUGS, PHARMACY) \
are included in the theater fee and their co-payments are challenged in \
full - except explicit implant items (PROSTHESIS, MESH, STENT and similar).
5. HOSPITAL-EVENT ANCILLARIES: clinical exams and supplies inherent to a \
hospital event with contract coverage of 100% (no cap) are challenged for \
the difference when the payment program shows a co-payment > 0.";

/// Header of the synthesis table every round must produce.
const TABLE_HEADER: &str = "\
| Code | Description | Finding | Challenged Amount | Legal Basis | Anchor |
|---|---|---|---|---|---|";

/// Shared grounding rules appended to every round instruction.
const ANCHORING_TEXT: &str = "\
Ground every finding in the documents: anchor each row to an explicit JSON \
reference (for example `bill.sections[2].items[5]` or \
`paymentProgram[0].providers[1].items[3]`). Never challenge more than the \
item's co-payment in the payment program. Challenge an item only if it \
creates a patient co-payment > 0; classify fully-bonified items as an \
insurer adjustment instead.";

/// Build the instruction for one round.
pub fn round_instruction(documents: &DocumentBundle, round: &Round) -> String {
    match round {
        Round::Peer { index } => peer_instruction(documents, *index),
        Round::Judge {
            peer_context,
            ceiling,
            ..
        } => judge_instruction(documents, peer_context, *ceiling),
    }
}

/// Instruction for one independent peer auditor.
///
/// Each peer sees only the three documents, never a sibling's narrative.
fn peer_instruction(documents: &DocumentBundle, index: usize) -> String {
    format!(
        r#"ROLE: INDEPENDENT FORENSIC BILL AUDITOR (ROUND {index})

You audit a clinic bill against the patient's payment program and health
plan contract. Work alone; no other auditor's opinion is available to you.
Do not invent data - use only the JSON documents below.

MANDATORY MISCHARGE PATTERNS:
{ruleset}

INPUT DOCUMENTS:
1. BILL:
```json
{bill}
```
2. PAYMENT PROGRAM:
```json
{pam}
```
3. CONTRACT:
```json
{contract}
```

{anchoring}

REQUIRED OUTPUT (MARKDOWN): a short prose assessment, then one detailed
synthesis table of every challenged item:

{table_header}
"#,
        index = index,
        ruleset = RULESET_TEXT,
        bill = documents.bill_json(),
        pam = documents.payment_program_json(),
        contract = documents.contract_json(),
        anchoring = ANCHORING_TEXT,
        table_header = TABLE_HEADER,
    )
}

/// Instruction for the consolidating judge round.
///
/// The judge keeps every independently well-founded peer finding, re-scans
/// the documents itself for the surgical-theater unbundling pattern, and
/// is bound (advisorily - the post-hoc guard enforces it) by the ceiling.
fn judge_instruction(
    documents: &DocumentBundle,
    peer_context: &str,
    ceiling: Option<i64>,
) -> String {
    let ceiling_text = match ceiling {
        Some(limit) => format!(
            "The summed challenged amount must never exceed the declared \
co-payment of {}. If your table would exceed it, correct the amounts \
downward and note the adjustment in the affected findings.",
            format_clp(limit)
        ),
        None => "The payment program declares no co-payment total; still never \
challenge more than any item's own co-payment."
            .to_string(),
    };

    format!(
        r#"ROLE: SUPREME JUDGE AND FORENSIC ACCOUNTANT (FINAL ROUND)

You received the reports of several independent auditors. Your job is NOT
to summarize - it is to CORRECT AND CONSOLIDATE. A finding reported by any
single auditor stands if it is independently well-founded under the rules
below, even when every other auditor missed it. A report reading
[AUDITOR N FAILED] is missing input for that round; ignore it.

MANDATORY MISCHARGE PATTERNS:
{ruleset}

ACTIVE RE-SCAN (JUDGE SUPERVISION): independently re-scan the payment
program yourself for the surgical-theater unbundling pattern - code
families 3101*** / 3218*** or labels MATERIALS / DRUGS / PHARMACY alongside
a surgery or theater fee in the bill. Incorporate such items as findings
even if no auditor flagged them, except explicit implant items (PROSTHESIS,
MESH, STENT and similar).

FINANCIAL CEILING: {ceiling_text}

INPUT DOCUMENTS:
1. BILL:
```json
{bill}
```
2. PAYMENT PROGRAM:
```json
{pam}
```
3. CONTRACT:
```json
{contract}
```

PRIOR INDEPENDENT AUDITS:
{peer_context}

{anchoring}

REQUIRED OUTPUT (STRICT MARKDOWN):

# Consolidated Forensic Audit Report

## 1. Executive Summary
A short paragraph on the account's state and the main irregularities.

## 2. Synthesis of Findings

{table_header}
"#,
        ruleset = RULESET_TEXT,
        ceiling_text = ceiling_text,
        bill = documents.bill_json(),
        pam = documents.payment_program_json(),
        contract = documents.contract_json(),
        peer_context = peer_context,
        anchoring = ANCHORING_TEXT,
        table_header = TABLE_HEADER,
    )
}

/// Concatenate peer narratives into the judge's context, labeled by round.
///
/// Failed peers contribute their failure marker; the judge instruction
/// tells it to treat those as missing input.
pub fn peer_context(reports: &[String]) -> String {
    let mut context = String::new();
    for (i, report) in reports.iter().enumerate() {
        context.push_str(&format!(
            "\n\n--- INDEPENDENT AUDITOR REPORT {} ---\n{}\n----------------------------------\n",
            i + 1,
            report
        ));
    }
    context
}
