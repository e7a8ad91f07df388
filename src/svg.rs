use crate::canvas::{Canvas, HAlign, Point, Stroke, TextStyle, VAlign};
use crate::colormap::{hex, Rgb};
use crate::error::PlotError;
use std::path::Path;

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Vector canvas that accumulates SVG elements.
pub struct SvgCanvas {
    width: u32,
    height: u32,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        SvgCanvas {
            width,
            height,
            body: String::new(),
        }
    }

    pub fn into_string(self) -> String {
        let mut svg = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
  text {{ font-family: 'DejaVu Sans Mono', 'Courier New', monospace; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
            w = self.width,
            h = self.height
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }

    pub fn save(self, path: &Path) -> Result<(), PlotError> {
        std::fs::write(path, self.into_string())?;
        Ok(())
    }
}

/// (text-anchor, dominant-baseline) for an aligned box.
fn text_attrs(style: &TextStyle) -> (&'static str, &'static str) {
    if style.rotated {
        // rotate(-90): the text runs upwards and glyph tops face left
        let anchor = match style.v_align {
            VAlign::Top => "end",
            VAlign::Center => "middle",
            VAlign::Bottom => "start",
        };
        let baseline = match style.h_align {
            HAlign::Left => "hanging",
            HAlign::Center => "central",
            HAlign::Right => "alphabetic",
        };
        (anchor, baseline)
    } else {
        let anchor = match style.h_align {
            HAlign::Left => "start",
            HAlign::Center => "middle",
            HAlign::Right => "end",
        };
        let baseline = match style.v_align {
            VAlign::Top => "hanging",
            VAlign::Center => "central",
            VAlign::Bottom => "alphabetic",
        };
        (anchor, baseline)
    }
}

impl Canvas for SvgCanvas {
    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let dash = match stroke.dash {
            Some((on, off)) => format!(r#" stroke-dasharray="{},{}""#, on, off),
            None => String::new(),
        };
        self.body.push_str(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}" stroke-linecap="round"{}/>"#,
            from.x, from.y, to.x, to.y, hex(stroke.color), stroke.width, dash
        ));
        self.body.push('\n');
    }

    fn marker(&mut self, center: Point, radius: f64, color: Rgb) {
        self.body.push_str(&format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{}" fill="{}"/>"#,
            center.x, center.y, radius, hex(color)
        ));
        self.body.push('\n');
    }

    fn text(&mut self, anchor: Point, text: &str, style: &TextStyle) {
        let (text_anchor, baseline) = text_attrs(style);
        let transform = if style.rotated {
            format!(r#" transform="rotate(-90 {:.2} {:.2})""#, anchor.x, anchor.y)
        } else {
            String::new()
        };
        self.body.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" fill="{}" text-anchor="{}" dominant-baseline="{}"{}>{}</text>"#,
            anchor.x,
            anchor.y,
            style.size,
            hex(style.color),
            text_anchor,
            baseline,
            transform,
            escape_xml(text)
        ));
        self.body.push('\n');
    }
}
