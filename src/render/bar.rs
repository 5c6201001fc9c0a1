use crate::render::canvas::{palette_color, Anchor, Canvas, BLACK, GRID, HEIGHT, PADDING, TEXT, WIDTH};
use crate::render::series::ChartSeries;
use crate::utils::{format_amount, truncate_label};
use ab_glyph::FontVec;
use image::{Rgb, RgbImage};

pub const MAX_BARS: usize = 8;
pub const GRIDLINES: usize = 6;
const LABEL_CHARS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub center_x: f64,
    pub width: f64,
    pub top: f64,
    pub bottom: f64,
    pub color: Rgb<u8>,
}

/// Plot geometry for a bar chart. The value range always includes zero, so the
/// zero baseline lies inside the plot area.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub min: f64,
    pub max: f64,
    pub scale: f64,
    pub zero_y: f64,
    pub bars: Vec<Bar>,
}

impl BarLayout {
    /// `None` when the series is empty.
    pub fn compute(series: &ChartSeries) -> Option<Self> {
        let shown = series.head(MAX_BARS);
        if shown.is_empty() {
            return None;
        }

        let max = shown.iter().map(|(_, v)| v).fold(0.0_f64, f64::max);
        let min = shown.iter().map(|(_, v)| v).fold(0.0_f64, f64::min);
        let range = if max != min { max - min } else { 1.0 };

        let top = f64::from(PADDING + 50);
        let bottom = f64::from(HEIGHT - PADDING);
        let left = f64::from(PADDING);
        let right = f64::from(WIDTH - PADDING);
        let scale = (bottom - top) / range;
        let zero_y = bottom - (0.0 - min) * scale;

        let spacing = (right - left) / shown.len() as f64;
        let width = spacing * 0.6;
        let bars = shown
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                let height = value.abs() * scale;
                let (bar_top, bar_bottom) = if value >= 0.0 {
                    (zero_y - height, zero_y)
                } else {
                    (zero_y, zero_y + height)
                };
                Bar {
                    label: label.to_string(),
                    value,
                    center_x: left + i as f64 * spacing + spacing / 2.0,
                    width,
                    top: bar_top,
                    bottom: bar_bottom,
                    color: palette_color(i),
                }
            })
            .collect();

        Some(Self {
            top,
            bottom,
            left,
            right,
            min,
            max,
            scale,
            zero_y,
            bars,
        })
    }

    /// Values and y positions of the evenly spaced gridlines, bottom to top.
    pub fn gridlines(&self) -> Vec<(f64, f64)> {
        let range = if self.max != self.min { self.max - self.min } else { 1.0 };
        (0..GRIDLINES)
            .map(|i| {
                let value = self.min + range * i as f64 / (GRIDLINES - 1) as f64;
                (value, self.bottom - (value - self.min) * self.scale)
            })
            .collect()
    }
}

/// Draws the chart, or `None` when there is nothing numeric to draw.
pub fn draw_bar_chart(series: &ChartSeries, title: &str, font: Option<&FontVec>) -> Option<RgbImage> {
    let layout = BarLayout::compute(series)?;
    let mut canvas = Canvas::new(WIDTH, HEIGHT, font);

    canvas.text(f64::from(WIDTH) / 2.0, 40.0, title, 24.0, TEXT, Anchor::MiddleTop);

    for (value, y) in layout.gridlines() {
        canvas.hline(layout.left, layout.right, y, 1, GRID);
        canvas.text(layout.left - 10.0, y, &format_amount(value, 0), 12.0, TEXT, Anchor::RightMiddle);
    }

    for bar in &layout.bars {
        canvas.fill_rect(
            bar.center_x - bar.width / 2.0,
            bar.top,
            bar.center_x + bar.width / 2.0,
            bar.bottom,
            bar.color,
        );
        let label_y = if bar.value >= 0.0 { bar.top - 15.0 } else { bar.bottom + 15.0 };
        canvas.text(bar.center_x, label_y, &format_amount(bar.value, 0), 12.0, TEXT, Anchor::Middle);
        canvas.text(
            bar.center_x,
            layout.bottom + 20.0,
            &truncate_label(&bar.label, LABEL_CHARS),
            12.0,
            TEXT,
            Anchor::MiddleTop,
        );
    }

    canvas.hline(layout.left, layout.right, layout.zero_y, 2, BLACK);
    Some(canvas.into_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::WHITE;

    #[test]
    fn test_positive_values_put_zero_at_bottom() {
        let series = ChartSeries::from_pairs([("Assets", 50000.0), ("Liabilities", 30000.0)]);
        let layout = BarLayout::compute(&series).unwrap();
        assert_eq!(layout.bottom, 620.0);
        assert_eq!(layout.zero_y, layout.bottom);
        assert_eq!(layout.min, 0.0);
        assert!((layout.bars[0].top - layout.top).abs() < 1e-9);
        assert!((layout.bars[1].top - (620.0 - 30000.0 * layout.scale)).abs() < 1e-9);
    }

    #[test]
    fn test_negative_values_put_zero_at_top() {
        let series = ChartSeries::from_pairs([("Loss", -5.0), ("Drawings", -3.0)]);
        let layout = BarLayout::compute(&series).unwrap();
        assert!((layout.zero_y - layout.top).abs() < 1e-9);
        assert!((layout.bars[0].bottom - layout.bottom).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_values_and_gridlines() {
        let series = ChartSeries::from_pairs([("Income", 100.0), ("Expense", -50.0)]);
        let layout = BarLayout::compute(&series).unwrap();
        assert!(layout.zero_y > layout.top && layout.zero_y < layout.bottom);

        let grid = layout.gridlines();
        assert_eq!(grid.len(), GRIDLINES);
        assert_eq!(grid[0], (-50.0, layout.bottom));
        assert!((grid[5].1 - layout.top).abs() < 1e-9);
    }

    #[test]
    fn test_caps_at_eight_bars() {
        let series = ChartSeries::from_pairs((0..12).map(|i| (format!("L{}", i), i as f64 + 1.0)));
        let layout = BarLayout::compute(&series).unwrap();
        assert_eq!(layout.bars.len(), MAX_BARS);
        assert_eq!(layout.max, 8.0);
        assert_eq!(layout.bars[6].color, layout.bars[0].color);
    }

    #[test]
    fn test_zero_line_drawn_at_plot_bottom() {
        let series = ChartSeries::from_pairs([("Assets", 50000.0), ("Liabilities", 30000.0)]);
        let image = draw_bar_chart(&series, "Balance Sheet", None).unwrap();
        let layout = BarLayout::compute(&series).unwrap();

        let x = layout.left as u32 + 5;
        assert_eq!(*image.get_pixel(x, 620), BLACK);
        assert_eq!(*image.get_pixel(x, 622), WHITE);
        let bar = &layout.bars[0];
        assert_eq!(*image.get_pixel(bar.center_x as u32, 400), bar.color);
    }

    #[test]
    fn test_empty_series_draws_nothing() {
        assert!(draw_bar_chart(&ChartSeries::new(), "Empty", None).is_none());
    }
}
