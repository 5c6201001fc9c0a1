use crate::flatten::row::TableRow;
use crate::payload::Payload;

/// Tally tag fragment to readable column name. Order matters: the first fragment
/// contained in a leaf's path wins.
pub const TALLY_MAP: [(&str, &str); 10] = [
    ("DSPDISPNAME", "Item Name"),
    ("NAME", "Name"),
    ("DSPCLQTY", "Quantity"),
    ("DSPCLRATE", "Rate"),
    ("DSPCLAMTA", "Amount"),
    ("DSPSTKCL", "Closing Balance"),
    ("BSMAINAMT", "Amount"),
    ("PLAMT", "Amount"),
    ("CAMT", "Credit"),
    ("DAMT", "Debit"),
];

const COLUMN_KEYWORDS: [&str; 7] = ["Name", "Amount", "Qty", "Quantity", "Rate", "Total", "Particulars"];

/// Column used when a row is a bare value rather than a mapping.
const VALUE_COLUMN: &str = "Value";

pub fn readable_name(path: &str) -> &str {
    TALLY_MAP
        .iter()
        .find(|(tag, _)| path.contains(tag))
        .map(|(_, label)| *label)
        .unwrap_or(path)
}

fn is_known_label(column: &str) -> bool {
    TALLY_MAP.iter().any(|(_, label)| *label == column)
}

fn is_name_like(column: &str) -> bool {
    column.contains("Name") || column.contains("Particular")
}

/// Display text of any payload value: lists become comma-joined text and a
/// mapping without `content` falls back to compact JSON.
pub fn scalar_text(value: &Payload) -> String {
    match value {
        Payload::Leaf(text) => text.clone(),
        Payload::Node(_) => match value.text() {
            Some(text) => text.to_string(),
            None if value.is_empty() => String::new(),
            None => serde_json::to_string(value).unwrap_or_default(),
        },
        Payload::List(items) => items
            .iter()
            .map(scalar_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// `label`, or `label (tail)` with the tail of the raw path widened until the
/// column name is unused.
fn unique_column(row: &TableRow, label: &str, raw_path: &str) -> String {
    if !row.contains(label) {
        return label.to_string();
    }
    let chars: Vec<char> = raw_path.chars().collect();
    for width in 4..=chars.len().max(4) {
        let tail: String = chars[chars.len().saturating_sub(width)..].iter().collect();
        let candidate = format!("{} ({})", label, tail);
        if !row.contains(&candidate) {
            return candidate;
        }
    }
    (2..)
        .map(|n| format!("{} ({}) #{}", label, raw_path, n))
        .find(|candidate| !row.contains(candidate))
        .unwrap_or_else(|| label.to_string())
}

fn flatten_into(value: &Payload, prefix: &str, row: &mut TableRow) {
    match value {
        Payload::Node(entries) => {
            for (key, child) in entries {
                flatten_into(child, &format!("{}{}_", prefix, key), row);
            }
        }
        Payload::Leaf(_) | Payload::List(_) => {
            let raw_path = prefix.strip_suffix('_').unwrap_or(prefix);
            let column = unique_column(row, readable_name(raw_path), raw_path);
            row.insert(column, scalar_text(value));
        }
    }
}

/// Flattens one row: nested keys joined with `_`, then renamed through [`TALLY_MAP`].
pub fn flatten_row(value: &Payload) -> TableRow {
    let mut row = TableRow::new();
    match value {
        Payload::Node(_) => flatten_into(value, "", &mut row),
        Payload::Leaf(_) | Payload::List(_) => {
            row.insert(VALUE_COLUMN, scalar_text(value));
        }
    }
    row
}

/// Financially meaningful columns, name-like ones first (otherwise stable).
/// Falls back to every column when none qualifies.
pub fn select_columns(columns: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = columns
        .iter()
        .filter(|c| is_known_label(c) || COLUMN_KEYWORDS.iter().any(|k| c.contains(k)))
        .cloned()
        .collect();
    if selected.is_empty() {
        return columns.to_vec();
    }
    selected.sort_by_key(|c| !is_name_like(c));
    selected
}
