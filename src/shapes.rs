//! Procedural vector illustration built from the canvas path primitives.
//!
//! Icons are designed on a nominal 100x100 grid whose top-left corner lands on
//! the caller's origin; `scale` maps one grid unit to `scale` points. Drawing
//! order is paint order: later calls cover earlier ones.

use crate::canvas::Canvas;
use crate::color::{Rgb, blend, fill_arc_gradient, polar};
use crate::types::{Point, Pt, Rect};

// Cubic bezier control distance for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Fill,
    Stroke,
    FillStroke,
}

fn finish_path(canvas: &mut Canvas, paint: Paint) {
    match paint {
        Paint::Fill => canvas.fill(),
        Paint::Stroke => canvas.stroke(),
        Paint::FillStroke => canvas.fill_stroke(),
    }
}

fn usable(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

pub fn polygon(canvas: &mut Canvas, points: &[Point], paint: Paint) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }
    canvas.move_to(first.x, first.y);
    for point in rest {
        canvas.line_to(point.x, point.y);
    }
    canvas.close_path();
    finish_path(canvas, paint);
}

pub fn line(canvas: &mut Canvas, from: Point, to: Point, width: f32) {
    if !usable(width) {
        return;
    }
    canvas.set_line_width(Pt::from_f32(width));
    canvas.move_to(from.x, from.y);
    canvas.line_to(to.x, to.y);
    canvas.stroke();
}

pub fn ellipse(canvas: &mut Canvas, centre: Point, rx: f32, ry: f32, paint: Paint) {
    if !usable(rx) || !usable(ry) {
        return;
    }
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    let p = |dx: f32, dy: f32| centre.offset(dx, dy);
    let start = p(rx, 0.0);
    canvas.move_to(start.x, start.y);
    for [c1, c2, end] in [
        [p(rx, ky), p(kx, ry), p(0.0, ry)],
        [p(-kx, ry), p(-rx, ky), p(-rx, 0.0)],
        [p(-rx, -ky), p(-kx, -ry), p(0.0, -ry)],
        [p(kx, -ry), p(rx, -ky), p(rx, 0.0)],
    ] {
        canvas.curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y);
    }
    canvas.close_path();
    finish_path(canvas, paint);
}

pub fn circle(canvas: &mut Canvas, centre: Point, radius: f32, paint: Paint) {
    ellipse(canvas, centre, radius, radius, paint);
}

pub fn rounded_rect(canvas: &mut Canvas, rect: Rect, radius: f32, paint: Paint) {
    if rect.width <= Pt::ZERO || rect.height <= Pt::ZERO {
        return;
    }
    let w = rect.width.to_f32();
    let h = rect.height.to_f32();
    let r = if radius.is_finite() {
        radius.clamp(0.0, w.min(h) / 2.0)
    } else {
        0.0
    };
    let origin = Point {
        x: rect.x,
        y: rect.y,
    };
    let p = |dx: f32, dy: f32| origin.offset(dx, dy);
    let k = r * (1.0 - KAPPA);
    let start = p(r, 0.0);
    canvas.move_to(start.x, start.y);
    let corners = [
        (p(w - r, 0.0), p(w - k, 0.0), p(w, k), p(w, r)),
        (p(w, h - r), p(w, h - k), p(w - k, h), p(w - r, h)),
        (p(r, h), p(k, h), p(0.0, h - k), p(0.0, h - r)),
        (p(0.0, r), p(0.0, k), p(k, 0.0), p(r, 0.0)),
    ];
    for (edge_end, c1, c2, end) in corners {
        canvas.line_to(edge_end.x, edge_end.y);
        if r > 0.0 {
            canvas.curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y);
        }
    }
    canvas.close_path();
    finish_path(canvas, paint);
}

pub fn regular_star(
    canvas: &mut Canvas,
    centre: Point,
    outer: f32,
    inner: f32,
    tips: u32,
    paint: Paint,
) {
    if !usable(outer) || !usable(inner) || tips < 2 {
        return;
    }
    let step = 180.0 / tips as f32;
    let points: Vec<Point> = (0..tips * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            polar(centre, radius, -90.0 + step * i as f32)
        })
        .collect();
    polygon(canvas, &points, paint);
}

pub fn arc_polyline(
    canvas: &mut Canvas,
    centre: Point,
    radius: f32,
    start_deg: f32,
    end_deg: f32,
    segments: u32,
) {
    if !usable(radius) || !start_deg.is_finite() || !end_deg.is_finite() {
        return;
    }
    let segments = segments.max(1);
    let first = polar(centre, radius, start_deg);
    canvas.move_to(first.x, first.y);
    for i in 1..=segments {
        let deg = start_deg + (end_deg - start_deg) * i as f32 / segments as f32;
        let next = polar(centre, radius, deg);
        canvas.line_to(next.x, next.y);
    }
    canvas.stroke();
}

/// Fills with `color` at `alpha`, or with `color` pre-blended onto `backdrop`
/// when the surface has no transparency.
pub fn translucent<F>(canvas: &mut Canvas, color: Rgb, alpha: f32, backdrop: Rgb, draw: F)
where
    F: FnOnce(&mut Canvas),
{
    canvas.save_state();
    if canvas.set_opacity(alpha, alpha) {
        canvas.set_fill_color(color);
    } else {
        canvas.set_fill_color(blend(backdrop, color, alpha));
    }
    draw(canvas);
    canvas.restore_state();
}

/// Colours an icon is painted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconStyle {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub detail: Rgb,
    /// What the icon sits on; used for cut-outs and opaque fallbacks.
    pub backdrop: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Icon {
    Microphone,
    Curtain,
    Star,
    Heart,
    BrokenHeart,
    Gavel,
    Clock { hour: u8, minute: u8 },
    /// Semicircular meter; `value` in 0..=100.
    Gauge { value: f32 },
    Stage,
    Ghost,
    SpeechBubble,
    Crown,
    Flame,
}

/// Maps design-grid units to page points.
#[derive(Clone, Copy)]
struct Grid {
    origin: Point,
    scale: f32,
}

impl Grid {
    fn p(&self, x: f32, y: f32) -> Point {
        self.origin.offset(x * self.scale, y * self.scale)
    }

    fn u(&self, units: f32) -> f32 {
        units * self.scale
    }

    fn pts(&self, coords: &[(f32, f32)]) -> Vec<Point> {
        coords.iter().map(|(x, y)| self.p(*x, *y)).collect()
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        let top_left = self.p(x, y);
        Rect::new(
            top_left.x,
            top_left.y,
            Pt::from_f32(self.u(w)),
            Pt::from_f32(self.u(h)),
        )
    }
}

pub fn draw_icon(canvas: &mut Canvas, icon: Icon, origin: Point, scale: f32, style: &IconStyle) {
    if !usable(scale) {
        return;
    }
    let g = Grid { origin, scale };
    match icon {
        Icon::Microphone => microphone(canvas, g, style),
        Icon::Curtain => curtain(canvas, g, style),
        Icon::Star => {
            canvas.set_fill_color(style.primary);
            regular_star(canvas, g.p(50.0, 52.0), g.u(46.0), g.u(19.0), 5, Paint::Fill);
        }
        Icon::Heart => heart(canvas, g, style, false),
        Icon::BrokenHeart => heart(canvas, g, style, true),
        Icon::Gavel => gavel(canvas, g, style),
        Icon::Clock { hour, minute } => clock(canvas, g, style, hour, minute),
        Icon::Gauge { value } => gauge(canvas, g, style, value),
        Icon::Stage => stage(canvas, g, style),
        Icon::Ghost => ghost(canvas, g, style),
        Icon::SpeechBubble => speech_bubble(canvas, g, style),
        Icon::Crown => crown(canvas, g, style),
        Icon::Flame => flame(canvas, g, style),
    }
}

fn microphone(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    canvas.set_fill_color(style.secondary);
    polygon(
        canvas,
        &g.pts(&[(40.0, 44.0), (60.0, 44.0), (55.0, 80.0), (45.0, 80.0)]),
        Paint::Fill,
    );
    canvas.set_stroke_color(style.secondary);
    line(canvas, g.p(50.0, 80.0), g.p(50.0, 93.0), g.u(4.0));
    rounded_rect(canvas, g.rect(32.0, 92.0, 36.0, 6.0), g.u(3.0), Paint::Fill);
    canvas.set_fill_color(style.primary);
    circle(canvas, g.p(50.0, 27.0), g.u(19.0), Paint::Fill);
    canvas.set_stroke_color(style.detail);
    for dy in [-9.0, 0.0, 9.0] {
        let half = if dy == 0.0 { 16.0 } else { 13.0 };
        line(
            canvas,
            g.p(50.0 - half, 27.0 + dy),
            g.p(50.0 + half, 27.0 + dy),
            g.u(1.5),
        );
    }
    rounded_rect(canvas, g.rect(38.0, 43.0, 24.0, 5.0), g.u(2.0), Paint::Fill);
}

fn curtain(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    canvas.set_fill_color(style.primary);
    for mirror in [false, true] {
        let x = |v: f32| if mirror { 100.0 - v } else { v };
        let top_left = g.p(x(0.0), 8.0);
        let top_inner = g.p(x(46.0), 8.0);
        let waist = g.p(x(14.0), 62.0);
        let hem = g.p(x(22.0), 100.0);
        let floor = g.p(x(0.0), 100.0);
        canvas.move_to(top_left.x, top_left.y);
        canvas.line_to(top_inner.x, top_inner.y);
        let c1 = g.p(x(40.0), 30.0);
        let c2 = g.p(x(20.0), 50.0);
        canvas.curve_to(c1.x, c1.y, c2.x, c2.y, waist.x, waist.y);
        let c3 = g.p(x(20.0), 74.0);
        let c4 = g.p(x(24.0), 88.0);
        canvas.curve_to(c3.x, c3.y, c4.x, c4.y, hem.x, hem.y);
        canvas.line_to(floor.x, floor.y);
        canvas.close_path();
        canvas.fill();
    }
    // Folds.
    canvas.set_stroke_color(style.secondary);
    for fold in [8.0, 16.0] {
        line(canvas, g.p(fold, 12.0), g.p(fold, 96.0), g.u(1.5));
        line(canvas, g.p(100.0 - fold, 12.0), g.p(100.0 - fold, 96.0), g.u(1.5));
    }
    canvas.set_fill_color(style.detail);
    canvas.draw_rect(
        g.p(0.0, 0.0).x,
        g.p(0.0, 0.0).y,
        Pt::from_f32(g.u(100.0)),
        Pt::from_f32(g.u(12.0)),
    );
    circle(canvas, g.p(14.0, 62.0), g.u(4.0), Paint::Fill);
    circle(canvas, g.p(86.0, 62.0), g.u(4.0), Paint::Fill);
}

fn heart(canvas: &mut Canvas, g: Grid, style: &IconStyle, broken: bool) {
    canvas.set_fill_color(style.primary);
    circle(canvas, g.p(31.0, 36.0), g.u(21.0), Paint::Fill);
    circle(canvas, g.p(69.0, 36.0), g.u(21.0), Paint::Fill);
    polygon(
        canvas,
        &g.pts(&[(11.5, 44.0), (50.0, 90.0), (88.5, 44.0), (50.0, 30.0)]),
        Paint::Fill,
    );
    if broken {
        canvas.set_stroke_color(style.backdrop);
        canvas.set_line_join(1);
        let crack = g.pts(&[
            (50.0, 22.0),
            (43.0, 38.0),
            (56.0, 50.0),
            (44.0, 64.0),
            (53.0, 76.0),
            (50.0, 90.0),
        ]);
        canvas.set_line_width(Pt::from_f32(g.u(5.0)));
        if let Some((first, rest)) = crack.split_first() {
            canvas.move_to(first.x, first.y);
            for point in rest {
                canvas.line_to(point.x, point.y);
            }
            canvas.stroke();
        }
    } else {
        canvas.set_fill_color(style.detail);
        circle(canvas, g.p(30.0, 30.0), g.u(6.0), Paint::Fill);
    }
}

fn gavel(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    canvas.set_fill_color(style.secondary);
    rounded_rect(canvas, g.rect(8.0, 84.0, 52.0, 10.0), g.u(2.0), Paint::Fill);
    // Handle runs diagonally from the head down to the right.
    canvas.set_fill_color(style.detail);
    polygon(
        canvas,
        &g.pts(&[(44.0, 40.0), (50.0, 34.0), (94.0, 78.0), (88.0, 84.0)]),
        Paint::Fill,
    );
    canvas.set_fill_color(style.primary);
    polygon(
        canvas,
        &g.pts(&[(14.0, 36.0), (44.0, 6.0), (64.0, 26.0), (34.0, 56.0)]),
        Paint::Fill,
    );
    canvas.set_fill_color(style.secondary);
    polygon(
        canvas,
        &g.pts(&[(10.0, 40.0), (16.0, 34.0), (36.0, 54.0), (30.0, 60.0)]),
        Paint::Fill,
    );
    polygon(
        canvas,
        &g.pts(&[(42.0, 8.0), (48.0, 2.0), (68.0, 22.0), (62.0, 28.0)]),
        Paint::Fill,
    );
}

/// Hand angle in degrees on the page, 0 = twelve o'clock.
fn hand_angles(hour: u8, minute: u8) -> (f32, f32) {
    let minute = (minute % 60) as f32;
    let hour = (hour % 12) as f32 + minute / 60.0;
    (hour * 30.0 - 90.0, minute * 6.0 - 90.0)
}

fn clock(canvas: &mut Canvas, g: Grid, style: &IconStyle, hour: u8, minute: u8) {
    let centre = g.p(50.0, 50.0);
    canvas.set_fill_color(style.secondary);
    canvas.set_stroke_color(style.primary);
    canvas.set_line_width(Pt::from_f32(g.u(5.0)));
    circle(canvas, centre, g.u(44.0), Paint::FillStroke);
    for tick in 0..12 {
        let deg = tick as f32 * 30.0;
        let inner = if tick % 3 == 0 { 32.0 } else { 36.0 };
        line(
            canvas,
            polar(centre, g.u(inner), deg),
            polar(centre, g.u(40.0), deg),
            g.u(2.5),
        );
    }
    let (hour_deg, minute_deg) = hand_angles(hour, minute);
    canvas.set_stroke_color(style.detail);
    canvas.set_line_cap(1);
    line(canvas, centre, polar(centre, g.u(22.0), hour_deg), g.u(6.0));
    line(canvas, centre, polar(centre, g.u(34.0), minute_deg), g.u(3.5));
    canvas.set_fill_color(style.detail);
    circle(canvas, centre, g.u(4.0), Paint::Fill);
}

fn gauge(canvas: &mut Canvas, g: Grid, style: &IconStyle, value: f32) {
    let value = if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let centre = g.p(50.0, 70.0);
    fill_arc_gradient(
        canvas,
        centre,
        g.u(46.0),
        g.u(14.0),
        180.0,
        360.0,
        style.secondary,
        style.primary,
        36,
    );
    canvas.set_stroke_color(style.detail);
    canvas.set_line_width(Pt::from_f32(g.u(1.0)));
    arc_polyline(canvas, centre, g.u(48.0), 180.0, 360.0, 36);
    let needle_deg = 180.0 + value * 1.8;
    let tip = polar(centre, g.u(40.0), needle_deg);
    let left = polar(centre, g.u(4.0), needle_deg - 90.0);
    let right = polar(centre, g.u(4.0), needle_deg + 90.0);
    canvas.set_fill_color(style.detail);
    polygon(canvas, &[left, tip, right], Paint::Fill);
    circle(canvas, centre, g.u(7.0), Paint::Fill);
}

fn stage(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    // Spotlight cone sits behind everything else.
    translucent(canvas, style.detail, 0.25, style.backdrop, |canvas| {
        polygon(
            canvas,
            &g.pts(&[(44.0, 0.0), (56.0, 0.0), (82.0, 78.0), (18.0, 78.0)]),
            Paint::Fill,
        );
    });
    canvas.set_fill_color(style.secondary);
    polygon(
        canvas,
        &g.pts(&[(0.0, 78.0), (100.0, 78.0), (92.0, 100.0), (8.0, 100.0)]),
        Paint::Fill,
    );
    canvas.set_stroke_color(style.backdrop);
    for x in [25.0, 50.0, 75.0] {
        line(canvas, g.p(x, 78.0), g.p(x + (x - 50.0) * 0.1, 100.0), g.u(1.0));
    }
    canvas.set_fill_color(style.primary);
    ellipse(canvas, g.p(50.0, 80.0), g.u(32.0), g.u(5.0), Paint::Fill);
}

fn ghost(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    canvas.set_fill_color(style.primary);
    circle(canvas, g.p(50.0, 40.0), g.u(30.0), Paint::Fill);
    polygon(
        canvas,
        &g.pts(&[
            (20.0, 40.0),
            (80.0, 40.0),
            (80.0, 92.0),
            (70.0, 82.0),
            (60.0, 92.0),
            (50.0, 82.0),
            (40.0, 92.0),
            (30.0, 82.0),
            (20.0, 92.0),
        ]),
        Paint::Fill,
    );
    canvas.set_fill_color(style.detail);
    ellipse(canvas, g.p(40.0, 40.0), g.u(5.0), g.u(8.0), Paint::Fill);
    ellipse(canvas, g.p(60.0, 40.0), g.u(5.0), g.u(8.0), Paint::Fill);
    ellipse(canvas, g.p(50.0, 60.0), g.u(6.0), g.u(4.0), Paint::Fill);
}

fn speech_bubble(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    canvas.set_fill_color(style.primary);
    rounded_rect(canvas, g.rect(4.0, 8.0, 92.0, 64.0), g.u(14.0), Paint::Fill);
    polygon(
        canvas,
        &g.pts(&[(22.0, 66.0), (42.0, 70.0), (18.0, 92.0)]),
        Paint::Fill,
    );
    canvas.set_fill_color(style.detail);
    for x in [30.0, 50.0, 70.0] {
        circle(canvas, g.p(x, 40.0), g.u(6.0), Paint::Fill);
    }
}

fn crown(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    canvas.set_fill_color(style.primary);
    polygon(
        canvas,
        &g.pts(&[
            (8.0, 30.0),
            (30.0, 54.0),
            (50.0, 18.0),
            (70.0, 54.0),
            (92.0, 30.0),
            (84.0, 80.0),
            (16.0, 80.0),
        ]),
        Paint::Fill,
    );
    canvas.set_fill_color(style.secondary);
    canvas.draw_rect(
        g.p(16.0, 80.0).x,
        g.p(16.0, 80.0).y,
        Pt::from_f32(g.u(68.0)),
        Pt::from_f32(g.u(10.0)),
    );
    canvas.set_fill_color(style.detail);
    for (x, y) in [(8.0, 30.0), (50.0, 18.0), (92.0, 30.0)] {
        circle(canvas, g.p(x, y), g.u(6.0), Paint::Fill);
    }
}

fn flame(canvas: &mut Canvas, g: Grid, style: &IconStyle) {
    for (color, inset) in [(style.primary, 0.0f32), (style.secondary, 16.0)] {
        canvas.set_fill_color(color);
        let k = inset;
        let base = g.p(50.0, 96.0);
        canvas.move_to(base.x, base.y);
        let c1 = g.p(14.0 + k, 96.0);
        let c2 = g.p(10.0 + k, 60.0 + k * 0.5);
        let left = g.p(30.0 + k * 0.6, 44.0 + k);
        canvas.curve_to(c1.x, c1.y, c2.x, c2.y, left.x, left.y);
        let c3 = g.p(36.0 + k * 0.4, 56.0 + k * 0.5);
        let c4 = g.p(44.0, 30.0 + k);
        let tip = g.p(52.0, 4.0 + k * 1.6);
        canvas.curve_to(c3.x, c3.y, c4.x, c4.y, tip.x, tip.y);
        let c5 = g.p(78.0 - k * 0.5, 30.0 + k);
        let c6 = g.p(90.0 - k, 62.0);
        let right = g.p(82.0 - k * 0.8, 80.0);
        canvas.curve_to(c5.x, c5.y, c6.x, c6.y, right.x, right.y);
        let c7 = g.p(76.0 - k * 0.5, 94.0);
        canvas.curve_to(c7.x, c7.y, c7.x, c7.y, base.x, base.y);
        canvas.close_path();
        canvas.fill();
    }
}
