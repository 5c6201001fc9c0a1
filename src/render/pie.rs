use crate::render::canvas::{palette_color, Anchor, Canvas, HEIGHT, TEXT, WHITE, WIDTH};
use crate::render::series::ChartSeries;
use ab_glyph::FontVec;
use image::{Rgb, RgbImage};

pub const RADIUS: f64 = 220.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
    /// Degrees clockwise from three o'clock.
    pub start: f64,
    pub end: f64,
    pub color: Rgb<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieLayout {
    pub center: (f64, f64),
    pub radius: f64,
    pub wedges: Vec<Wedge>,
}

impl PieLayout {
    /// Wedges for the strictly positive entries in input order; `None` when their
    /// total is zero.
    pub fn compute(series: &ChartSeries) -> Option<Self> {
        let positive = series.positive();
        let total = positive.total();
        if total <= 0.0 {
            return None;
        }

        let mut start = 0.0;
        let wedges = positive
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                let fraction = value / total;
                let end = start + fraction * 360.0;
                let wedge = Wedge {
                    label: label.to_string(),
                    value,
                    fraction,
                    start,
                    end,
                    color: palette_color(i),
                };
                start = end;
                wedge
            })
            .collect();

        Some(Self {
            center: (f64::from(WIDTH / 2 - 150), f64::from(HEIGHT / 2)),
            radius: RADIUS,
            wedges,
        })
    }

    pub fn point_at(&self, degrees: f64) -> (f64, f64) {
        let radians = degrees.to_radians();
        (
            self.center.0 + self.radius * radians.cos(),
            self.center.1 + self.radius * radians.sin(),
        )
    }

    /// Wedge outline: the center followed by arc points at most one degree apart.
    pub fn wedge_polygon(&self, wedge: &Wedge) -> Vec<(f64, f64)> {
        let steps = (wedge.end - wedge.start).ceil().max(1.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push(self.center);
        for step in 0..=steps {
            let angle = wedge.start + (wedge.end - wedge.start) * step as f64 / steps as f64;
            points.push(self.point_at(angle));
        }
        points
    }
}

pub fn legend_label(wedge: &Wedge) -> String {
    format!("{} ({:.1}%)", wedge.label, wedge.fraction * 100.0)
}

/// Draws the pie, or `None` when no entry is strictly positive.
pub fn draw_pie_chart(series: &ChartSeries, title: &str, font: Option<&FontVec>) -> Option<RgbImage> {
    let layout = PieLayout::compute(series)?;
    let mut canvas = Canvas::new(WIDTH, HEIGHT, font);

    canvas.text(f64::from(WIDTH) / 2.0, 40.0, title, 24.0, TEXT, Anchor::MiddleTop);

    for wedge in &layout.wedges {
        canvas.polygon(&layout.wedge_polygon(wedge), wedge.color);
    }
    if layout.wedges.len() > 1 {
        for wedge in &layout.wedges {
            canvas.line(layout.center, layout.point_at(wedge.start), WHITE);
        }
    }

    let legend_x = f64::from(WIDTH - 250);
    for (i, wedge) in layout.wedges.iter().enumerate() {
        let legend_y = 150.0 + i as f64 * 40.0;
        canvas.fill_rect(legend_x, legend_y, legend_x + 20.0, legend_y + 20.0, wedge.color);
        canvas.text(legend_x + 30.0, legend_y + 10.0, &legend_label(wedge), 14.0, TEXT, Anchor::LeftMiddle);
    }

    Some(canvas.into_image())
}
