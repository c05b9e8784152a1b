use crate::canvas::Canvas;
use crate::types::{Point, Pt, Rect};

/// 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn components(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Linear interpolation between two colours, rounded per channel.
///
/// `t` is clamped to `[0, 1]`; NaN is treated as 0.
pub fn blend(from: Rgb, to: Rgb, t: f32) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let mix = |a: u8, b: u8| -> u8 {
        let value = a as f32 + (b as f32 - a as f32) * t;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgb::new(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b))
}

/// Paints `rect` with `bands` horizontal stripes running from `top` to
/// `bottom`. Each stripe overlaps the next by one point so no seam shows.
pub fn fill_band_gradient(canvas: &mut Canvas, rect: Rect, top: Rgb, bottom: Rgb, bands: u32) {
    let bands = bands.max(1);
    let band_height = rect.height / bands as i32;
    for i in 0..bands {
        let t = i as f32 / bands as f32;
        canvas.set_fill_color(blend(top, bottom, t));
        let y = rect.y + band_height * i as i32;
        let height = (band_height + Pt::from_i32(1)).min(rect.bottom() - y + Pt::from_i32(1));
        canvas.draw_rect(rect.x, y, rect.width, height);
    }
}

/// Arc band used by gauge meters: `segments` wedge slices from `start_deg` to
/// `end_deg` (0° points right, angles grow clockwise on the page), each one
/// blended along the arc.
#[allow(clippy::too_many_arguments)]
pub fn fill_arc_gradient(
    canvas: &mut Canvas,
    centre: Point,
    radius: f32,
    thickness: f32,
    start_deg: f32,
    end_deg: f32,
    from: Rgb,
    to: Rgb,
    segments: u32,
) {
    if !(radius.is_finite() && thickness.is_finite() && start_deg.is_finite() && end_deg.is_finite())
    {
        return;
    }
    if radius <= 0.0 || thickness <= 0.0 {
        return;
    }
    let inner = (radius - thickness).max(0.0);
    let segments = segments.max(1);
    let step = (end_deg - start_deg) / segments as f32;
    for i in 0..segments {
        let a0 = start_deg + step * i as f32;
        // Overlap slightly so neighbouring wedges don't leave hairlines.
        let a1 = a0 + step * 1.08;
        canvas.set_fill_color(blend(from, to, i as f32 / segments as f32));
        let outer0 = polar(centre, radius, a0);
        let outer1 = polar(centre, radius, a1);
        let inner1 = polar(centre, inner, a1);
        let inner0 = polar(centre, inner, a0);
        canvas.move_to(outer0.x, outer0.y);
        canvas.line_to(outer1.x, outer1.y);
        canvas.line_to(inner1.x, inner1.y);
        canvas.line_to(inner0.x, inner0.y);
        canvas.close_path();
        canvas.fill();
    }
}

pub(crate) fn polar(centre: Point, radius: f32, deg: f32) -> Point {
    let rad = deg.to_radians();
    centre.offset(radius * libm::cosf(rad), radius * libm::sinf(rad))
}

/// Colour scheme for one deck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background_top: Rgb,
    pub background_bottom: Rgb,
    pub ink: Rgb,
    pub muted: Rgb,
    pub accent: Rgb,
    pub accent_alt: Rgb,
    pub card: Rgb,
    pub card_alt: Rgb,
}

impl Palette {
    pub const ROAST: Palette = Palette {
        background_top: Rgb::new(0x1a, 0x05, 0x0a),
        background_bottom: Rgb::new(0x4a, 0x0d, 0x16),
        ink: Rgb::new(0xf8, 0xf1, 0xe5),
        muted: Rgb::new(0xc9, 0xa8, 0x9a),
        accent: Rgb::new(0xf5, 0xb7, 0x2a),
        accent_alt: Rgb::new(0xe2, 0x3d, 0x3d),
        card: Rgb::new(0x2c, 0x0b, 0x12),
        card_alt: Rgb::new(0x5c, 0x14, 0x20),
    };

    pub const COURTROOM: Palette = Palette {
        background_top: Rgb::new(0x0b, 0x13, 0x2b),
        background_bottom: Rgb::new(0x1c, 0x25, 0x41),
        ink: Rgb::new(0xf0, 0xf4, 0xf8),
        muted: Rgb::new(0x9a, 0xa5, 0xb8),
        accent: Rgb::new(0xf2, 0xa5, 0x41),
        accent_alt: Rgb::new(0x5b, 0xc0, 0xbe),
        card: Rgb::new(0x1f, 0x2a, 0x48),
        card_alt: Rgb::new(0x3a, 0x50, 0x6b),
    };
}
