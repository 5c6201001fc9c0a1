use crate::error::Result;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use log::{debug, warn};
use std::path::{Path, PathBuf};

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 700;
pub const PADDING: u32 = 80;

/// #2E86AB #A23B72 #F18F01 #C73E1D #3B1F2B #5B8C5A, cycled per category.
pub const PALETTE: [Rgb<u8>; 6] = [
    Rgb([0x2E, 0x86, 0xAB]),
    Rgb([0xA2, 0x3B, 0x72]),
    Rgb([0xF1, 0x8F, 0x01]),
    Rgb([0xC7, 0x3E, 0x1D]),
    Rgb([0x3B, 0x1F, 0x2B]),
    Rgb([0x5B, 0x8C, 0x5A]),
];

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const TEXT: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
pub const GRID: Rgb<u8> = Rgb([0xE0, 0xE0, 0xE0]);

pub fn palette_color(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

const FONT_CANDIDATES: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn read_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Ignoring unreadable font {}: {}", path.display(), e);
            None
        }
    }
}

/// Loads the configured font, else the first common system font found.
/// Without a font, charts are drawn without text.
pub fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = configured {
        if let Some(font) = read_font(path) {
            return Some(font);
        }
        warn!("Configured font {} could not be loaded", path.display());
    }
    let found = FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(read_font);
    if found.is_none() {
        warn!("No font available; chart text will be omitted");
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LeftTop,
    LeftMiddle,
    MiddleTop,
    Middle,
    RightMiddle,
}

/// An RGB image plus an optional font, drawing with float coordinates.
pub struct Canvas<'f> {
    pub image: RgbImage,
    font: Option<&'f FontVec>,
}

impl<'f> Canvas<'f> {
    pub fn new(width: u32, height: u32, font: Option<&'f FontVec>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, WHITE),
            font,
        }
    }

    /// Fills the rectangle spanning the two corners; degenerate rectangles draw nothing.
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb<u8>) {
        let left = x0.min(x1).round() as i32;
        let top = y0.min(y1).round() as i32;
        let width = (x0.max(x1).round() as i32 - left).max(0) as u32;
        let height = (y0.max(y1).round() as i32 - top).max(0) as u32;
        if width == 0 || height == 0 {
            return;
        }
        draw_filled_rect_mut(&mut self.image, Rect::at(left, top).of_size(width, height), color);
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        draw_line_segment_mut(
            &mut self.image,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            color,
        );
    }

    /// Horizontal line `thickness` pixels tall, covering the rows ending at `y`.
    pub fn hline(&mut self, x0: f64, x1: f64, y: f64, thickness: u32, color: Rgb<u8>) {
        let bottom = y.round() + 1.0;
        self.fill_rect(x0, bottom - f64::from(thickness), x1, bottom, color);
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], color: Rgb<u8>) {
        let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
        for &(x, y) in points {
            let p = Point::new(x.round() as i32, y.round() as i32);
            if poly.last() != Some(&p) {
                poly.push(p);
            }
        }
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() < 3 {
            return;
        }
        draw_polygon_mut(&mut self.image, &poly, color);
    }

    /// Rendered text size, or an estimate when no font is loaded.
    pub fn text_size(&self, text: &str, size: f32) -> (u32, u32) {
        match self.font {
            Some(font) => text_size(PxScale::from(size), font, text),
            None => (
                (text.chars().count() as f32 * size * 0.55).ceil() as u32,
                size.ceil() as u32,
            ),
        }
    }

    pub fn text(&mut self, x: f64, y: f64, text: &str, size: f32, color: Rgb<u8>, anchor: Anchor) {
        let font = match self.font {
            Some(font) => font,
            None => return,
        };
        if text.is_empty() {
            return;
        }
        let (w, h) = text_size(PxScale::from(size), font, text);
        let (w, h) = (f64::from(w), f64::from(h));
        let (dx, dy) = match anchor {
            Anchor::LeftTop => (0.0, 0.0),
            Anchor::LeftMiddle => (0.0, h / 2.0),
            Anchor::MiddleTop => (w / 2.0, 0.0),
            Anchor::Middle => (w / 2.0, h / 2.0),
            Anchor::RightMiddle => (w, h / 2.0),
        };
        draw_text_mut(
            &mut self.image,
            color,
            (x - dx).round() as i32,
            (y - dy).round() as i32,
            PxScale::from(size),
            font,
            text,
        );
    }

    /// Text drawn twice with a one pixel offset.
    pub fn bold_text(&mut self, x: f64, y: f64, text: &str, size: f32, color: Rgb<u8>, anchor: Anchor) {
        self.text(x, y, text, size, color, anchor);
        self.text(x + 1.0, y, text, size, color, anchor);
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Writes a PNG into `dir` (created if missing) and returns its path.
pub fn save_png(image: &RgbImage, dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    image.save(&path)?;
    debug!("Saved {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_normalizes_corners_and_skips_empty() {
        let mut canvas = Canvas::new(20, 20, None);
        canvas.fill_rect(10.0, 10.0, 2.0, 4.0, BLACK);
        assert_eq!(*canvas.image.get_pixel(5, 5), BLACK);
        assert_eq!(*canvas.image.get_pixel(12, 12), WHITE);

        canvas.fill_rect(15.0, 15.0, 15.0, 19.0, BLACK);
        assert_eq!(*canvas.image.get_pixel(15, 16), WHITE);
    }

    #[test]
    fn test_hline_thickness() {
        let mut canvas = Canvas::new(20, 20, None);
        canvas.hline(0.0, 20.0, 10.0, 2, BLACK);
        assert_eq!(*canvas.image.get_pixel(3, 9), BLACK);
        assert_eq!(*canvas.image.get_pixel(3, 10), BLACK);
        assert_eq!(*canvas.image.get_pixel(3, 11), WHITE);
        assert_eq!(*canvas.image.get_pixel(3, 8), WHITE);
    }

    #[test]
    fn test_text_without_font_is_skipped() {
        let mut canvas = Canvas::new(50, 20, None);
        canvas.text(25.0, 10.0, "Total", 12.0, BLACK, Anchor::Middle);
        assert!(canvas.image.pixels().all(|p| *p == WHITE));
        assert!(canvas.text_size("abcd", 10.0).0 > 0);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), palette_color(6));
        assert_eq!(palette_color(1), Rgb([0xA2, 0x3B, 0x72]));
    }

    #[test]
    fn test_save_png_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("plots");
        let path = save_png(&RgbImage::new(4, 4), &nested, "x.png").unwrap();
        assert!(path.exists());
    }
}
