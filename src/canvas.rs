use crate::colormap::Rgb;
use crate::error::PlotError;
use crate::font::{self, CELL};
use image::{ImageFormat, RgbImage};
use rayon::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// A position in pixels, origin top-left, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f64,
    /// (on, off) lengths in pixels
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub fn solid(color: Rgb, width: f64) -> Self {
        Stroke { color, width, dash: None }
    }

    pub fn dashed(color: Rgb, width: f64, on: f64, off: f64) -> Self {
        Stroke { color, width, dash: Some((on, off)) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Text placement relative to its anchor point.
///
/// Alignment applies to the box the text occupies after rotation, so a
/// rotated label with `VAlign::Top` hangs below its anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph cell size in pixels (a multiple of 8 for crisp bitmap text).
    pub size: u32,
    pub color: Rgb,
    pub h_align: HAlign,
    pub v_align: VAlign,
    /// Rotated 90 degrees counter-clockwise, reading bottom to top.
    pub rotated: bool,
}

impl TextStyle {
    pub fn new(size: u32, color: Rgb, h_align: HAlign, v_align: VAlign) -> Self {
        TextStyle { size, color, h_align, v_align, rotated: false }
    }

    pub fn rotated(self) -> Self {
        TextStyle { rotated: true, ..self }
    }
}

/// (width, height) in pixels of `text` once laid out.
pub fn text_extent(text: &str, style: &TextStyle) -> (f64, f64) {
    let along = text.chars().count() as f64 * style.size as f64;
    let across = style.size as f64;
    if style.rotated {
        (across, along)
    } else {
        (along, across)
    }
}

/// Top-left corner of the aligned text box.
pub fn text_origin(anchor: Point, text: &str, style: &TextStyle) -> Point {
    let (w, h) = text_extent(text, style);
    let x = match style.h_align {
        HAlign::Left => anchor.x,
        HAlign::Center => anchor.x - w / 2.0,
        HAlign::Right => anchor.x - w,
    };
    let y = match style.v_align {
        VAlign::Top => anchor.y,
        VAlign::Center => anchor.y - h / 2.0,
        VAlign::Bottom => anchor.y - h,
    };
    Point::new(x, y)
}

/// A drawing surface. Implementations own their buffers, which are freed
/// when the canvas is dropped.
pub trait Canvas {
    fn line(&mut self, from: Point, to: Point, stroke: &Stroke);
    fn marker(&mut self, center: Point, radius: f64, color: Rgb);
    fn text(&mut self, anchor: Point, text: &str, style: &TextStyle);
}

/// In-memory RGBA raster.
pub struct RasterCanvas {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        RasterCanvas {
            width,
            height,
            buffer: vec![255u8; (width * height * 4) as usize],
        }
    }

    fn put_pixel(&mut self, x: i64, y: i64, (r, g, b): Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        if idx + 3 < self.buffer.len() {
            self.buffer[idx] = r;
            self.buffer[idx + 1] = g;
            self.buffer[idx + 2] = b;
            self.buffer[idx + 3] = 255;
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        Some((self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]))
    }

    /// Fill every pixel whose center lies within `radius` of (cx, cy).
    fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, rgb: Rgb) {
        if radius < 1.0 {
            self.put_pixel(cx.floor() as i64, cy.floor() as i64, rgb);
            return;
        }
        let r2 = radius * radius;
        for y in (cy - radius).floor() as i64..=(cy + radius).ceil() as i64 {
            for x in (cx - radius).floor() as i64..=(cx + radius).ceil() as i64 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put_pixel(x, y, rgb);
                }
            }
        }
    }

    fn write_char(&mut self, origin: Point, data: &[u8; 8], scale: u32, rotated: bool, rgb: Rgb) {
        let (ox, oy) = (origin.x.round() as i64, origin.y.round() as i64);
        for (col, row) in font::lit_pixels(data) {
            let (gx, gy) = if rotated { (row, CELL - 1 - col) } else { (col, row) };
            for rx in 0..scale {
                for ry in 0..scale {
                    self.put_pixel(
                        ox + (gx * scale + rx) as i64,
                        oy + (gy * scale + ry) as i64,
                        rgb,
                    );
                }
            }
        }
    }

    pub fn into_image(self) -> Option<RgbImage> {
        let rgb_pixels: Vec<u8> = self
            .buffer
            .par_chunks_exact(4)
            .flat_map_iter(|px| [px[0], px[1], px[2]])
            .collect();
        RgbImage::from_raw(self.width, self.height, rgb_pixels)
    }

    /// Encode in `format` and write the result to `path`. Nothing is written
    /// if encoding fails.
    pub fn save(self, path: &Path, format: ImageFormat) -> Result<(), PlotError> {
        let img = self.into_image().ok_or_else(|| {
            PlotError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "raster buffer does not match the image size",
            ))
        })?;
        let mut encoded = Cursor::new(Vec::new());
        img.write_to(&mut encoded, format)?;
        std::fs::write(path, encoded.into_inner())?;
        Ok(())
    }
}

impl Canvas for RasterCanvas {
    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let length = dx.hypot(dy);
        let steps = ((length * 2.0).ceil() as usize).max(1);
        let radius = stroke.width / 2.0;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            if let Some((on, off)) = stroke.dash {
                if (t * length) % (on + off) >= on {
                    continue;
                }
            }
            self.fill_disc(from.x + t * dx, from.y + t * dy, radius, stroke.color);
        }
    }

    fn marker(&mut self, center: Point, radius: f64, color: Rgb) {
        self.fill_disc(center.x, center.y, radius, color);
    }

    fn text(&mut self, anchor: Point, text: &str, style: &TextStyle) {
        let scale = (style.size / CELL).max(1);
        let advance = (scale * CELL) as f64;
        let origin = text_origin(anchor, text, style);
        let len = text.chars().count();

        for (i, c) in text.chars().enumerate() {
            let cell = if style.rotated {
                origin.offset(0.0, (len - 1 - i) as f64 * advance)
            } else {
                origin.offset(i as f64 * advance, 0.0)
            };
            self.write_char(cell, font::glyph(c), scale, style.rotated, style.color);
        }
    }
}
