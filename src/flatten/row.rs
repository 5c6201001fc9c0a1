use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One flattened record: readable column name to display text, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    cells: Vec<(String, String)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.iter().any(|(name, _)| name == column)
    }

    /// Adds a cell. An existing column is never overwritten; returns `false` in that case.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) -> bool {
        let column = column.into();
        if self.contains(&column) {
            return false;
        }
        self.cells.push((column, value.into()));
        true
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TableRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = TableRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Rows plus the union of their columns in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn from_rows(rows: Vec<TableRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, empty when the row has no such column.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or("")
    }

    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().map(move |r| r.get(column).unwrap_or(""))
    }

    /// Keeps only `columns` (in the given order) and the first `max_rows` rows.
    pub fn project(&self, columns: &[String], max_rows: usize) -> Table {
        let rows = self
            .rows
            .iter()
            .take(max_rows)
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).unwrap_or("").to_string()))
                    .collect()
            })
            .collect();
        Table {
            columns: columns.to_vec(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_never_overwrites() {
        let mut row = TableRow::new();
        assert!(row.insert("Name", "Cash"));
        assert!(!row.insert("Name", "Bank"));
        assert_eq!(row.get("Name"), Some("Cash"));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_table_columns_union_and_project() {
        let rows = vec![
            TableRow::from_iter([("Name", "Cash"), ("Amount", "10")]),
            TableRow::from_iter([("Name", "Bank"), ("Rate", "2")]),
        ];
        let table = Table::from_rows(rows);
        assert_eq!(table.columns, vec!["Name", "Amount", "Rate"]);
        assert_eq!(table.cell(1, "Amount"), "");

        let projected = table.project(&["Rate".to_string(), "Name".to_string()], 1);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.rows[0].columns().collect::<Vec<_>>(), vec!["Rate", "Name"]);
    }

    #[test]
    fn test_row_serializes_as_ordered_map() {
        let row = TableRow::from_iter([("Vch No", "7"), ("Amount", "1,000.00")]);
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"Vch No":"7","Amount":"1,000.00"}"#
        );
    }
}
