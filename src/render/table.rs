use crate::flatten::Table;
use crate::render::canvas::{Anchor, Canvas, TEXT};
use crate::utils::truncate_label;
use ab_glyph::FontVec;
use image::{Rgb, RgbImage};

const MARGIN: u32 = 20;
const CAPTION_HEIGHT: u32 = 50;
const HEADER_HEIGHT: u32 = 40;
const ROW_HEIGHT: u32 = 32;
const CELL_PADDING: u32 = 10;
const MIN_COLUMN_WIDTH: u32 = 60;
const MAX_COLUMN_WIDTH: u32 = 320;
const MAX_CELL_CHARS: usize = 40;
const FONT_SIZE: f32 = 14.0;

const HEADER_FILL: Rgb<u8> = Rgb([0xE9, 0xEC, 0xEF]);
const STRIPE_FILL: Rgb<u8> = Rgb([0xF8, 0xF9, 0xFA]);
const GRIDLINE: Rgb<u8> = Rgb([0xDD, 0xDD, 0xDD]);
const CAPTION: Rgb<u8> = Rgb([0x44, 0x44, 0x44]);

#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub width: u32,
    pub height: u32,
    pub column_widths: Vec<u32>,
    /// Top edge of the header row.
    pub grid_top: u32,
}

impl TableLayout {
    pub fn compute(table: &Table, canvas_probe: &Canvas<'_>) -> Self {
        let column_widths: Vec<u32> = table
            .columns
            .iter()
            .map(|column| {
                let widest = std::iter::once(column.as_str())
                    .chain(table.column_values(column))
                    .map(|text| canvas_probe.text_size(&cell_text(text), FONT_SIZE).0)
                    .max()
                    .unwrap_or(0);
                (widest + 2 * CELL_PADDING).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
            })
            .collect();

        let grid_width: u32 = column_widths.iter().sum();
        let grid_top = MARGIN + CAPTION_HEIGHT;
        Self {
            width: grid_width + 2 * MARGIN,
            height: grid_top + HEADER_HEIGHT + ROW_HEIGHT * table.len() as u32 + MARGIN,
            column_widths,
            grid_top,
        }
    }

    pub fn row_top(&self, row: usize) -> u32 {
        self.grid_top + HEADER_HEIGHT + ROW_HEIGHT * row as u32
    }

    pub fn column_left(&self, column: usize) -> u32 {
        MARGIN + self.column_widths.iter().take(column).sum::<u32>()
    }
}

fn cell_text(text: &str) -> String {
    truncate_label(text.trim(), MAX_CELL_CHARS)
}

/// Grid with a bold shaded header, striped rows and thin gridlines, captioned
/// with `caption`. `None` when the table has no columns.
pub fn draw_table(table: &Table, caption: &str, font: Option<&FontVec>) -> Option<RgbImage> {
    if table.columns.is_empty() {
        return None;
    }
    let layout = TableLayout::compute(table, &Canvas::new(1, 1, font));
    let mut canvas = Canvas::new(layout.width, layout.height, font);
    let grid_left = f64::from(MARGIN);
    let grid_right = f64::from(layout.width - MARGIN);
    let grid_bottom = f64::from(layout.row_top(table.len()));

    canvas.text(
        f64::from(layout.width) / 2.0,
        f64::from(MARGIN + CAPTION_HEIGHT / 2),
        caption,
        18.0,
        CAPTION,
        Anchor::Middle,
    );

    let header_top = f64::from(layout.grid_top);
    canvas.fill_rect(grid_left, header_top, grid_right, header_top + f64::from(HEADER_HEIGHT), HEADER_FILL);
    for (i, column) in table.columns.iter().enumerate() {
        let x = f64::from(layout.column_left(i) + CELL_PADDING);
        let y = header_top + f64::from(HEADER_HEIGHT) / 2.0;
        canvas.bold_text(x, y, &cell_text(column), FONT_SIZE, TEXT, Anchor::LeftMiddle);
    }

    for (r, row) in table.rows.iter().enumerate() {
        let top = f64::from(layout.row_top(r));
        if r % 2 == 1 {
            canvas.fill_rect(grid_left, top, grid_right, top + f64::from(ROW_HEIGHT), STRIPE_FILL);
        }
        for (c, column) in table.columns.iter().enumerate() {
            let x = f64::from(layout.column_left(c) + CELL_PADDING);
            let y = top + f64::from(ROW_HEIGHT) / 2.0;
            let text = cell_text(row.get(column).unwrap_or(""));
            canvas.text(x, y, &text, FONT_SIZE, TEXT, Anchor::LeftMiddle);
        }
    }

    let mut y = header_top;
    for _ in 0..=table.len() + 1 {
        canvas.hline(grid_left, grid_right, y, 1, GRIDLINE);
        y += if y == header_top { f64::from(HEADER_HEIGHT) } else { f64::from(ROW_HEIGHT) };
    }
    for c in 0..=table.columns.len() {
        let x = f64::from(layout.column_left(c));
        canvas.fill_rect(x, header_top, x + 1.0, grid_bottom + 1.0, GRIDLINE);
    }

    Some(canvas.into_image())
}
