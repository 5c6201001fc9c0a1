//! Deterministic PNG rendering: bar charts, pie charts and table images.
//!
//! Layout is fixed (1000×700 canvas, 80 px padding, six-colour palette) so the
//! same input always produces the same pixels. Files get UUID v4 suffixes and
//! can be written concurrently into one shared directory.

pub mod bar;
pub mod canvas;
pub mod pie;
pub mod series;
pub mod table;

pub use bar::{draw_bar_chart, BarLayout};
pub use canvas::{load_font, PALETTE};
pub use pie::{draw_pie_chart, PieLayout};
pub use series::{kind_for_query, ChartKind, ChartPoint, ChartSeries, ChartSpec};
pub use table::draw_table;

use crate::config::TallyConfig;
use crate::error::{Result, TallyError};
use crate::flatten::Table;
use ab_glyph::FontVec;
use canvas::save_png;
use log::{info, warn};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct Renderer {
    output_dir: PathBuf,
    font: Option<FontVec>,
}

impl Renderer {
    /// A renderer without a font: shapes only, no text.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn from_config(config: &TallyConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            font: load_font(config.font_path.as_deref()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn bar_chart(&self, series: &ChartSeries, title: &str) -> Result<PathBuf> {
        let image = draw_bar_chart(series, title, self.font.as_ref())
            .ok_or_else(|| TallyError::Render("no numeric data to chart".to_string()))?;
        let path = save_png(&image, &self.output_dir, &format!("chart_bar_{}.png", Uuid::new_v4()))?;
        info!("Rendered bar chart '{}' with {} categories", title, series.len().min(bar::MAX_BARS));
        Ok(path)
    }

    /// Falls back to a bar chart of the same input when no value is strictly positive.
    pub fn pie_chart(&self, series: &ChartSeries, title: &str) -> Result<PathBuf> {
        match draw_pie_chart(series, title, self.font.as_ref()) {
            Some(image) => {
                let path =
                    save_png(&image, &self.output_dir, &format!("chart_pie_{}.png", Uuid::new_v4()))?;
                info!("Rendered pie chart '{}'", title);
                Ok(path)
            }
            None => {
                warn!("Pie chart '{}' has no positive values, drawing a bar chart instead", title);
                self.bar_chart(series, title)
            }
        }
    }

    /// Validates the chart request and draws the requested kind.
    pub fn chart(&self, spec: &ChartSpec) -> Result<PathBuf> {
        let series = spec.validate()?;
        match spec.kind {
            ChartKind::Bar => self.bar_chart(&series, &spec.title),
            ChartKind::Pie => self.pie_chart(&series, &spec.title),
        }
    }

    pub fn table_image(&self, table: &Table, caption: &str) -> Result<PathBuf> {
        let image = draw_table(table, caption, self.font.as_ref())
            .ok_or_else(|| TallyError::Render("table has no columns".to_string()))?;
        let simple = Uuid::new_v4().simple().to_string();
        let path = save_png(&image, &self.output_dir, &format!("table_{}.png", &simple[..8]))?;
        info!("Rendered table with {} rows", table.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::TableRow;

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().to_string()
    }

    #[test]
    fn test_pie_of_non_positive_values_matches_bar() {
        let series = ChartSeries::from_pairs([("A", -5.0), ("B", -3.0)]);
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path());

        let pie = renderer.pie_chart(&series, "Losses").unwrap();
        let bar = renderer.bar_chart(&series, "Losses").unwrap();
        assert!(file_name(&pie).starts_with("chart_bar_"));

        let pie_pixels = image::open(&pie).unwrap().to_rgb8();
        let bar_pixels = image::open(&bar).unwrap().to_rgb8();
        assert_eq!(pie_pixels, bar_pixels);
    }

    #[test]
    fn test_file_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path().join("plots"));
        let series = ChartSeries::from_pairs([("Cash", 10.0), ("Bank", 30.0)]);

        let first = renderer.pie_chart(&series, "Split").unwrap();
        let second = renderer.pie_chart(&series, "Split").unwrap();
        assert_ne!(first, second);
        assert!(file_name(&first).starts_with("chart_pie_"));
        assert!(first.exists() && second.exists());

        let table = Table::from_rows(vec![TableRow::from_iter([("Name", "Cash"), ("Amount", "10")])]);
        let image = renderer.table_image(&table, "Balances").unwrap();
        let name = file_name(&image);
        assert!(name.starts_with("table_") && name.len() == "table_12345678.png".len());
    }

    #[test]
    fn test_chart_from_spec() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path());

        let spec = ChartSpec::new(ChartKind::Bar, "Balances")
            .with_point("Assets", 50000)
            .with_point("Liabilities", 30000);
        assert!(file_name(&renderer.chart(&spec).unwrap()).starts_with("chart_bar_"));

        let nothing = ChartSpec::new(ChartKind::Bar, "Nothing").with_point("X", "n/a");
        assert!(matches!(renderer.chart(&nothing), Err(TallyError::Render(_))));
        assert!(matches!(
            renderer.bar_chart(&ChartSeries::new(), "Empty"),
            Err(TallyError::Render(_))
        ));
    }
}
