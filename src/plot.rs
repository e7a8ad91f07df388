use crate::canvas::{text_extent, Canvas, HAlign, Point, RasterCanvas, Stroke, TextStyle, VAlign};
use crate::colormap::{link_colors, Rgb, BLACK, GRID_GREY};
use crate::error::PlotError;
use crate::layout::Layout;
use crate::svg::SvgCanvas;
use image::ImageFormat;
use log::debug;
use std::path::Path;

pub const X_LABEL: &str = "Secuencias / Clusters";
pub const Y_LABEL: &str = "Distancia";

const LINK_WIDTH: f64 = 2.0;
const MARKER_RADIUS: f64 = 4.0;
/// Annotation offset from the marker, right and up.
const ANNOTATION_OFFSET: f64 = 3.0;

const TITLE_SIZE: u32 = 16;
const TEXT_SIZE: u32 = 8;
const PAD: f64 = 10.0;
const TICK_LEN: f64 = 4.0;
/// Share of the figure height leaf labels may take.
const LEAF_LABEL_SHARE: f64 = 0.35;

/// Output backend chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Svg,
    Raster(ImageFormat),
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, PlotError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Ok(OutputFormat::Svg),
            _ => ImageFormat::from_path(path)
                .map(OutputFormat::Raster)
                .map_err(|_| PlotError::UnsupportedFormat {
                    path: path.to_path_buf(),
                }),
        }
    }
}

/// Python-style capitalization: first letter upper case, the rest lower.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn title_for(method: &str) -> String {
    format!("Dendrograma - Método: Distancia {}", capitalize(method))
}

/// Evenly spaced y ticks on a 1/2/2.5/5 x 10^k grid covering [0, extent],
/// plus the number of decimals needed to print them.
pub fn y_ticks(extent: f64) -> (Vec<f64>, usize) {
    if !(extent.is_finite() && extent > 0.0) {
        return (vec![0.0], 0);
    }
    let raw = extent / 6.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 2.5 {
        2.5
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    let step = nice * magnitude;
    if !(step.is_finite() && step > 0.0) {
        return (vec![0.0, extent], 0);
    }

    let mut decimals = (-step.log10().floor()).max(0.0) as usize;
    if nice == 2.5 {
        decimals += 1;
    }

    let count = (extent / step + 1e-9).floor() as usize;
    ((0..=count).map(|i| i as f64 * step).collect(), decimals)
}

/// Fixed-point tick labels, or scientific notation when that would need
/// more than six decimals or the values run into the millions.
fn tick_labels(ticks: &[f64], decimals: usize) -> Vec<String> {
    let largest = ticks.iter().copied().fold(0.0, f64::max);
    if decimals > 6 || largest >= 1e7 {
        ticks.iter().map(|t| format!("{:.2e}", t)).collect()
    } else {
        ticks.iter().map(|t| format!("{:.*}", decimals, t)).collect()
    }
}

/// Shorten `label` to `max_chars`, marking the cut with an ellipsis.
fn fit_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// Pixel rectangle of the plotting area and the data range it shows.
struct Frame {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    x_extent: f64,
    y_extent: f64,
}

impl Frame {
    fn to_px(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.left + x / self.x_extent * (self.right - self.left),
            self.bottom - y / self.y_extent * (self.bottom - self.top),
        )
    }
}

/// A dendrogram ready to be drawn: geometry, labels and one color per link.
pub struct Figure<'a> {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub layout: &'a Layout,
    pub labels: &'a [String],
    /// Color of `layout.links[i]`.
    pub colors: Vec<Rgb>,
}

impl<'a> Figure<'a> {
    pub fn new(
        width: u32,
        height: u32,
        method: &str,
        layout: &'a Layout,
        labels: &'a [String],
    ) -> Self {
        Figure {
            width,
            height,
            title: title_for(method),
            layout,
            labels,
            colors: link_colors(layout.links.len()),
        }
    }

    /// Leaf labels in left-to-right order, shortened to fit the margin.
    fn leaf_labels(&self) -> Vec<String> {
        let max_chars =
            ((self.height as f64 * LEAF_LABEL_SHARE / TEXT_SIZE as f64).floor() as usize).max(1);
        self.layout
            .leaf_order
            .iter()
            .map(|&leaf| fit_label(&self.labels[leaf], max_chars))
            .collect()
    }

    fn frame(&self, tick_labels: &[String], leaf_labels: &[String]) -> Frame {
        let tick_width = tick_labels
            .iter()
            .map(|t| t.chars().count())
            .max()
            .unwrap_or(0) as f64
            * TEXT_SIZE as f64;
        let leaf_height = leaf_labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as f64
            * TEXT_SIZE as f64;

        Frame {
            left: PAD + TEXT_SIZE as f64 + PAD + tick_width + TICK_LEN + 4.0,
            top: PAD + TITLE_SIZE as f64 + 14.0,
            right: self.width as f64 - 2.0 * PAD,
            bottom: self.height as f64 - (TICK_LEN + 4.0 + leaf_height + 8.0 + TEXT_SIZE as f64 + PAD),
            x_extent: self.layout.x_extent(),
            y_extent: self.layout.y_extent(),
        }
    }

    /// Draw the whole figure onto `canvas`.
    pub fn draw<C: Canvas>(&self, canvas: &mut C) {
        let (ticks, decimals) = y_ticks(self.layout.y_extent());
        let tick_labels = tick_labels(&ticks, decimals);
        let leaf_labels = self.leaf_labels();
        let frame = self.frame(&tick_labels, &leaf_labels);
        debug!("Y ticks: {:?}", tick_labels);

        // grid below everything else
        let grid = Stroke::dashed(GRID_GREY, 1.0, 4.0, 3.0);
        for &t in &ticks {
            let y = frame.to_px(0.0, t).y;
            canvas.line(Point::new(frame.left, y), Point::new(frame.right, y), &grid);
        }

        let annotation = TextStyle::new(TEXT_SIZE, BLACK, HAlign::Left, VAlign::Bottom);
        for (link, &color) in self.layout.links.iter().zip(&self.colors) {
            let pts: Vec<Point> = (0..4).map(|i| frame.to_px(link.xs[i], link.ys[i])).collect();
            let stroke = Stroke::solid(color, LINK_WIDTH);
            for pair in pts.windows(2) {
                canvas.line(pair[0], pair[1], &stroke);
            }

            let (ax, ay) = link.apex();
            let apex = frame.to_px(ax, ay);
            debug!("Row {} drawn at ({:.1}, {:.1}) in {:?}", link.merge + 1, apex.x, apex.y, color);
            canvas.marker(apex, MARKER_RADIUS, color);
            canvas.text(
                apex.offset(ANNOTATION_OFFSET, -ANNOTATION_OFFSET),
                &format!("{:.2}", link.distance()),
                &annotation,
            );
        }

        let axis = Stroke::solid(BLACK, 1.0);
        let corners = [
            Point::new(frame.left, frame.top),
            Point::new(frame.right, frame.top),
            Point::new(frame.right, frame.bottom),
            Point::new(frame.left, frame.bottom),
        ];
        for (&from, &to) in corners.iter().zip(corners.iter().cycle().skip(1)) {
            canvas.line(from, to, &axis);
        }

        let tick_style = TextStyle::new(TEXT_SIZE, BLACK, HAlign::Right, VAlign::Center);
        for (&t, label) in ticks.iter().zip(&tick_labels) {
            let y = frame.to_px(0.0, t).y;
            canvas.line(Point::new(frame.left - TICK_LEN, y), Point::new(frame.left, y), &axis);
            canvas.text(Point::new(frame.left - TICK_LEN - 4.0, y), label, &tick_style);
        }

        let leaf_style = TextStyle::new(TEXT_SIZE, BLACK, HAlign::Center, VAlign::Top).rotated();
        for (slot, label) in leaf_labels.iter().enumerate() {
            let x = frame.to_px(Layout::leaf_position(slot), 0.0).x;
            canvas.line(Point::new(x, frame.bottom), Point::new(x, frame.bottom + TICK_LEN), &axis);
            canvas.text(Point::new(x, frame.bottom + TICK_LEN + 4.0), label, &leaf_style);
        }

        let leaf_height = leaf_labels
            .iter()
            .map(|l| text_extent(l, &leaf_style).1)
            .fold(0.0, f64::max);
        canvas.text(
            Point::new(
                (frame.left + frame.right) / 2.0,
                frame.bottom + TICK_LEN + 4.0 + leaf_height + 8.0,
            ),
            X_LABEL,
            &TextStyle::new(TEXT_SIZE, BLACK, HAlign::Center, VAlign::Top),
        );
        canvas.text(
            Point::new(PAD, (frame.top + frame.bottom) / 2.0),
            Y_LABEL,
            &TextStyle::new(TEXT_SIZE, BLACK, HAlign::Left, VAlign::Center).rotated(),
        );
        canvas.text(
            Point::new(self.width as f64 / 2.0, PAD),
            &self.title,
            &TextStyle::new(TITLE_SIZE, BLACK, HAlign::Center, VAlign::Top),
        );
    }
}

/// Draw `figure` with the backend matching `format` and write it to `out`.
/// The canvas lives only for this call.
pub fn render_to_file(figure: &Figure, format: OutputFormat, out: &Path) -> Result<(), PlotError> {
    match format {
        OutputFormat::Svg => {
            let mut canvas = SvgCanvas::new(figure.width, figure.height);
            figure.draw(&mut canvas);
            canvas.save(out)
        }
        OutputFormat::Raster(image_format) => {
            let mut canvas = RasterCanvas::new(figure.width, figure.height);
            figure.draw(&mut canvas);
            canvas.save(out, image_format)
        }
    }
}
