//! Structure of the pipe-delimited synthesis table.
//!
//! Column roles are resolved once from the header row into tagged
//! variants; downstream code never re-matches header strings against
//! keywords, and a table without an amount column is an explicit
//! [`AmountColumn::Missing`], not a sentinel index.

/// Header keywords that identify a synthesis table.
const TABLE_KEYWORDS: [&str; 6] = ["CODE", "LABEL", "FINDING", "AMOUNT", "VALUE", "CHALLENGED"];

/// Role of one table column, resolved from its header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Billing code of the challenged item.
    Code,
    /// Item label or description.
    Label,
    /// The finding text.
    Finding,
    /// The challenged monetary amount; the only column that is summed.
    Amount,
    /// Legal basis / cited rule.
    Basis,
    /// Anchor reference into the source documents.
    Anchor,
    /// Anything the header keyword set does not recognize.
    Other,
}

/// Location of the amount column within a parsed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountColumn {
    /// Cell index (within [`split_cells`] output) of the amount column.
    Resolved(usize),
    /// The header declares no amount column; the table is not summed.
    Missing,
}

/// A synthesis-table header, resolved once at parse time.
#[derive(Debug, Clone)]
pub struct TableHeader {
    pub columns: Vec<ColumnKind>,
    pub amount: AmountColumn,
}

/// Classify one header cell into a column role.
pub fn classify_header_cell(cell: &str) -> ColumnKind {
    let lowered = cell.to_lowercase();
    if lowered.contains("amount") || lowered.contains("value") || lowered.contains("challenged") {
        ColumnKind::Amount
    } else if lowered.contains("code") {
        ColumnKind::Code
    } else if lowered.contains("label") || lowered.contains("description") {
        ColumnKind::Label
    } else if lowered.contains("finding") {
        ColumnKind::Finding
    } else if lowered.contains("basis") || lowered.contains("norm") || lowered.contains("rule") {
        ColumnKind::Basis
    } else if lowered.contains("anchor") || lowered.contains("ref") {
        ColumnKind::Anchor
    } else {
        ColumnKind::Other
    }
}

/// Resolve a header row into column roles and the amount-column location.
pub fn parse_header(line: &str) -> TableHeader {
    let columns: Vec<ColumnKind> = split_cells(line)
        .iter()
        .map(|cell| classify_header_cell(cell))
        .collect();
    let amount = columns
        .iter()
        .position(|kind| *kind == ColumnKind::Amount)
        .map_or(AmountColumn::Missing, AmountColumn::Resolved);
    TableHeader { columns, amount }
}

/// Whether a delimiter-led line looks like the start of a synthesis table.
pub fn looks_like_table_start(trimmed: &str) -> bool {
    if !trimmed.starts_with('|') {
        return false;
    }
    let upper = trimmed.to_uppercase();
    TABLE_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

/// Split a table line into trimmed interior cells, dropping the empty
/// fragments produced by the leading and trailing `|`.
pub fn split_cells(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    if parts.len() < 3 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// All-dash alignment rows (`|---|---|`) separate header from data.
pub fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':' || c == ' ')
        })
}

/// Rows whose leading cells announce a total are the oracle's own
/// arithmetic; summing them would double-count.
pub fn is_total_row(cells: &[String]) -> bool {
    cells
        .iter()
        .take(2)
        .any(|cell| cell.to_uppercase().contains("TOTAL"))
}
