/// An opaque 8-bit RGB color.
pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);
pub const GRID_GREY: Rgb = (176, 176, 176);

/// Viridis anchor colors at t = 0.0, 0.1, ..., 1.0
const VIRIDIS_11: [Rgb; 11] = [
    (68, 1, 84),
    (72, 36, 117),
    (65, 68, 135),
    (53, 95, 141),
    (42, 120, 142),
    (33, 145, 140),
    (34, 168, 132),
    (68, 191, 112),
    (122, 209, 81),
    (189, 223, 38),
    (253, 231, 37),
];

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

/// Sample the viridis scale at `t` in [0, 1] (clamped).
pub fn viridis(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * (VIRIDIS_11.len() - 1) as f64;
    let i = (pos.floor() as usize).min(VIRIDIS_11.len() - 2);
    let f = pos - i as f64;
    let (a, b) = (VIRIDIS_11[i], VIRIDIS_11[i + 1]);
    (lerp(a.0, b.0, f), lerp(a.1, b.1, f), lerp(a.2, b.2, f))
}

/// `count` colors spread evenly from one end of the scale to the other.
///
/// The i-th link in drawing order takes the i-th color, so the assignment
/// depends only on the layout.
pub fn link_colors(count: usize) -> Vec<Rgb> {
    match count {
        0 => Vec::new(),
        1 => vec![viridis(0.0)],
        _ => (0..count)
            .map(|i| viridis(i as f64 / (count - 1) as f64))
            .collect(),
    }
}

pub fn hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2)
}
