use crate::error::{Result, TallyError};
use crate::flatten::Table;
use crate::utils::parse_amount;
use rust_decimal::prelude::ToPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered category → value mapping. Only finite numbers are ever stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    points: Vec<(String, f64)>,
}

impl ChartSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `label`, keeping its original position when it already exists.
    /// Non-finite values are ignored.
    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        if !value.is_finite() {
            return;
        }
        let label = label.into();
        match self.points.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.points.push((label, value)),
        }
    }

    pub fn from_pairs<L: Into<String>>(pairs: impl IntoIterator<Item = (L, f64)>) -> Self {
        let mut series = Self::new();
        for (label, value) in pairs {
            series.insert(label, value);
        }
        series
    }

    /// Keeps JSON numbers only; strings, booleans and nulls are dropped, never coerced.
    pub fn from_json<'a, L: Into<String>>(pairs: impl IntoIterator<Item = (L, &'a Value)>) -> Self {
        let mut series = Self::new();
        for (label, value) in pairs {
            if let Some(number) = value.as_f64() {
                series.insert(label, number);
            }
        }
        series
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.points.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn head(&self, n: usize) -> ChartSeries {
        Self {
            points: self.points.iter().take(n).cloned().collect(),
        }
    }

    /// Strictly positive entries, in order.
    pub fn positive(&self) -> ChartSeries {
        Self {
            points: self.points.iter().filter(|(_, v)| *v > 0.0).cloned().collect(),
        }
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|(_, v)| v).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartPoint {
    /// Category label shown on the axis or legend.
    pub label: String,
    /// Numeric value. Anything else is dropped when the chart is drawn.
    #[schemars(with = "f64")]
    pub value: Value,
}

/// A declarative chart request: what to draw, never how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub points: Vec<ChartPoint>,
}

const PIE_HINTS: [&str; 6] = ["share", "breakdown", "distribution", "proportion", "composition", "pie"];
const VALUE_HINTS: [&str; 7] = ["Amount", "Total", "Closing Balance", "Debit", "Credit", "Value", "Rate"];

fn is_name_like(column: &str) -> bool {
    column.contains("Name") || column.contains("Particular")
}

fn numeric(text: &str) -> Option<f64> {
    parse_amount(text).and_then(|d| d.to_f64())
}

fn has_numbers(table: &Table, column: &str) -> bool {
    table.column_values(column).any(|v| numeric(v).is_some())
}

/// Pie for composition questions, bar otherwise.
pub fn kind_for_query(query: &str) -> ChartKind {
    let query = query.to_lowercase();
    if PIE_HINTS.iter().any(|hint| query.contains(hint)) {
        ChartKind::Pie
    } else {
        ChartKind::Bar
    }
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            points: Vec::new(),
        }
    }

    pub fn with_point(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.points.push(ChartPoint {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Checks the shape and returns the numeric series to draw.
    pub fn validate(&self) -> Result<ChartSeries> {
        if self.title.trim().is_empty() {
            return Err(TallyError::Render("chart title is empty".to_string()));
        }
        let series = ChartSeries::from_json(
            self.points
                .iter()
                .filter(|p| !p.label.trim().is_empty())
                .map(|p| (p.label.clone(), &p.value)),
        );
        if series.is_empty() {
            return Err(TallyError::Render("chart has no numeric data".to_string()));
        }
        Ok(series)
    }

    /// Derives a chart from a display table: the first name-like column labels the
    /// points and the amount-like column holding numbers (by hint priority) gives the values.
    /// Cells that are not numbers are kept as text and dropped at validation.
    pub fn from_table(table: &Table, query: &str) -> Option<ChartSpec> {
        let label_column = table
            .columns
            .iter()
            .find(|c| is_name_like(c))
            .or_else(|| table.columns.first())?;

        let candidates = || table.columns.iter().filter(|c| *c != label_column);
        let value_column = VALUE_HINTS
            .iter()
            .find_map(|h| candidates().find(|c| c.contains(h) && has_numbers(table, c)))
            .or_else(|| candidates().find(|c| has_numbers(table, c)))?;

        let mut spec = ChartSpec::new(kind_for_query(query), query.trim());
        for row in &table.rows {
            let label = row.get(label_column).unwrap_or("").trim();
            let raw = row.get(value_column).unwrap_or("");
            let value = numeric(raw)
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string()));
            spec.points.push(ChartPoint {
                label: label.to_string(),
                value,
            });
        }
        if spec.title.is_empty() {
            spec.title = value_column.clone();
        }
        Some(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::TableRow;
    use serde_json::json;

    #[test]
    fn test_non_numeric_entries_are_dropped() {
        let series = ChartSeries::from_json(vec![
            ("Cash", &json!(1200.5)),
            ("Bank", &json!("3,000")),
            ("Stock", &json!(null)),
            ("Debtors", &json!(-40)),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![("Cash", 1200.5), ("Debtors", -40.0)]);
    }

    #[test]
    fn test_insert_keeps_position_and_skips_nan() {
        let mut series = ChartSeries::from_pairs([("A", 1.0), ("B", 2.0)]);
        series.insert("A", 5.0);
        series.insert("C", f64::NAN);
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![("A", 5.0), ("B", 2.0)]);
        assert_eq!(series.positive().total(), 7.0);
    }

    #[test]
    fn test_validate() {
        let spec = ChartSpec::new(ChartKind::Bar, "Balances")
            .with_point("Assets", 50000)
            .with_point("Notes", "n/a");
        assert_eq!(spec.validate().unwrap().len(), 1);

        let empty = ChartSpec::new(ChartKind::Pie, "Nothing").with_point("X", "abc");
        assert!(matches!(empty.validate(), Err(TallyError::Render(_))));
    }

    #[test]
    fn test_spec_deserializes_from_model_json() {
        let raw = r#"{"kind":"pie","title":"Expense share","points":[{"label":"Rent","value":1200},{"label":"Wages","value":"x"}]}"#;
        let spec: ChartSpec = serde_json::from_str(raw).unwrap();
        assert_eq!(spec.kind, ChartKind::Pie);
        assert_eq!(spec.validate().unwrap().len(), 1);
    }

    #[test]
    fn test_schema_declares_numeric_value() {
        let schema = serde_json::to_value(schemars::schema_for!(ChartSpec)).unwrap();
        let text = schema.to_string();
        assert!(text.contains("\"points\""));
        assert!(text.contains("\"number\""));
    }

    #[test]
    fn test_from_table() {
        let table = Table::from_rows(vec![
            TableRow::from_iter([("Item Name", "Bolts"), ("Quantity", "10 nos"), ("Amount", "1,500.00")]),
            TableRow::from_iter([("Item Name", "Nuts"), ("Quantity", "4 nos"), ("Amount", "-250")]),
        ]);
        let spec = ChartSpec::from_table(&table, "stock value breakdown").unwrap();
        assert_eq!(spec.kind, ChartKind::Pie);
        assert_eq!(spec.title, "stock value breakdown");
        let series = spec.validate().unwrap();
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![("Bolts", 1500.0), ("Nuts", -250.0)]);
    }

    #[test]
    fn test_from_table_without_numbers() {
        let table = Table::from_rows(vec![TableRow::from_iter([("Name", "Acme"), ("Notes", "none")])]);
        assert!(ChartSpec::from_table(&table, "chart").is_none());
        assert_eq!(kind_for_query("monthly sales"), ChartKind::Bar);
    }
}
