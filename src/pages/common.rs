//! Page furniture and layout helpers shared by both decks.

use super::BuildContext;
use crate::canvas::Canvas;
use crate::color::{Rgb, fill_band_gradient};
use crate::shapes::{Icon, IconStyle, Paint, draw_icon, rounded_rect, translucent};
use crate::text::{TextStyle, clamp_lines};
use crate::types::{Point, Pt, Rect};

pub(crate) const BACKGROUND_BANDS: u32 = 45;

pub(crate) fn icon_style(ctx: &BuildContext<'_>) -> IconStyle {
    IconStyle {
        primary: ctx.palette.accent,
        secondary: ctx.palette.accent_alt,
        detail: ctx.palette.ink,
        backdrop: ctx.palette.background_top,
    }
}

/// Starts a page of the current section: tags it and paints the gradient.
pub(crate) fn begin_page(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    canvas.meta("section", ctx.section);
    let size = canvas.page_size();
    fill_band_gradient(
        canvas,
        Rect::new(Pt::ZERO, Pt::ZERO, size.width, size.height),
        ctx.palette.background_top,
        ctx.palette.background_bottom,
        BACKGROUND_BANDS,
    );
}

/// Footer line: deck title on the left, `label` on the right. Pages carry
/// no document-wide numbering, so dropping one section leaves the others'
/// drawings untouched.
pub(crate) fn footer(canvas: &mut Canvas, ctx: &BuildContext<'_>, label: &str) {
    let content = ctx.content_rect();
    let style = TextStyle::regular(8.0);
    let y = content.bottom() + Pt::from_i32(14);
    canvas.set_fill_color(ctx.palette.muted);
    canvas.set_font(style.face, style.size);
    canvas.draw_string(content.x, y, ctx.bundle.meta.title.clone());
    if !label.is_empty() {
        let width = style.measure(label);
        canvas.draw_string(content.right() - width, y, label);
    }
}

/// Closes the page with a footer.
pub(crate) fn end_page(canvas: &mut Canvas, ctx: &BuildContext<'_>, label: &str) {
    footer(canvas, ctx, label);
    canvas.show_page();
}

pub(crate) fn draw_line(canvas: &mut Canvas, style: TextStyle, color: Rgb, x: Pt, y: Pt, text: &str) {
    canvas.set_fill_color(color);
    canvas.set_font(style.face, style.size);
    canvas.draw_string(x, y, text);
}

pub(crate) fn centered(canvas: &mut Canvas, style: TextStyle, color: Rgb, centre_x: Pt, y: Pt, text: &str) {
    let width = style.measure(text);
    draw_line(canvas, style, color, centre_x - width / 2, y, text);
}

/// Draws pre-wrapped lines and returns the y below the last one.
pub(crate) fn draw_lines(
    canvas: &mut Canvas,
    style: TextStyle,
    color: Rgb,
    x: Pt,
    y: Pt,
    lines: &[String],
) -> Pt {
    let mut cursor = y;
    for line in lines {
        draw_line(canvas, style, color, x, cursor, line);
        cursor += style.line_height();
    }
    cursor
}

/// Wraps and draws `text`, stopping after `max_lines`.
pub(crate) fn paragraph(
    canvas: &mut Canvas,
    style: TextStyle,
    color: Rgb,
    area: (Pt, Pt, Pt),
    text: &str,
    max_lines: usize,
) -> Pt {
    let (x, y, width) = area;
    let lines = clamp_lines(style.wrap(text, width), max_lines, &style, width);
    draw_lines(canvas, style, color, x, y, &lines)
}

pub(crate) fn centered_paragraph(
    canvas: &mut Canvas,
    style: TextStyle,
    color: Rgb,
    centre_x: Pt,
    y: Pt,
    width: Pt,
    text: &str,
) -> Pt {
    let mut cursor = y;
    for line in style.wrap(text, width) {
        centered(canvas, style, color, centre_x, cursor, &line);
        cursor += style.line_height();
    }
    cursor
}

const KICKER_ADVANCE: i32 = 16;
const TITLE_MAX_LINES: usize = 2;
const HEADING_TAIL: i32 = 24;

fn title_style() -> TextStyle {
    TextStyle::bold(26.0)
}

/// Section heading with an accent rule underneath. Returns the y below it.
pub(crate) fn heading(canvas: &mut Canvas, ctx: &BuildContext<'_>, title: &str, kicker: &str) -> Pt {
    let content = ctx.content_rect();
    let mut y = content.y;
    if !kicker.is_empty() {
        draw_line(canvas, TextStyle::bold(9.0), ctx.palette.accent, content.x, y, &kicker.to_uppercase());
        y += Pt::from_i32(KICKER_ADVANCE);
    }
    let style = title_style();
    y = paragraph(canvas, style, ctx.palette.ink, (content.x, y, content.width), title, TITLE_MAX_LINES);
    canvas.set_fill_color(ctx.palette.accent);
    canvas.draw_rect(content.x, y + Pt::from_i32(4), Pt::from_i32(64), Pt::from_i32(3));
    y + Pt::from_i32(HEADING_TAIL)
}

/// Height [`heading`] takes, measured without drawing.
pub(crate) fn heading_height(ctx: &BuildContext<'_>, title: &str, kicker: &str) -> Pt {
    let style = title_style();
    let lines = style.wrap(title, ctx.content_rect().width).len().clamp(1, TITLE_MAX_LINES);
    let kicker = if kicker.is_empty() {
        Pt::ZERO
    } else {
        Pt::from_i32(KICKER_ADVANCE)
    };
    kicker + style.line_height() * lines as i32 + Pt::from_i32(HEADING_TAIL)
}

/// How far a card's shadow reaches below the card.
pub(crate) const CARD_SHADOW: i32 = 4;

/// Card with a soft drop shadow.
pub(crate) fn card(canvas: &mut Canvas, ctx: &BuildContext<'_>, rect: Rect, fill: Rgb) {
    let shadow = Rect::new(
        rect.x + Pt::from_i32(3),
        rect.y + Pt::from_i32(CARD_SHADOW),
        rect.width,
        rect.height,
    );
    translucent(canvas, Rgb::BLACK, 0.35, ctx.palette.background_bottom, |canvas| {
        rounded_rect(canvas, shadow, 10.0, Paint::Fill);
    });
    canvas.set_fill_color(fill);
    rounded_rect(canvas, rect, 10.0, Paint::Fill);
}

/// Draws the photo registered for `participant` fitted inside `frame`, or a
/// ghost figure when there is none.
pub(crate) fn portrait(canvas: &mut Canvas, ctx: &BuildContext<'_>, participant: &str, frame: Rect) {
    let image = ctx
        .bundle
        .photos
        .get(participant)
        .and_then(|key| ctx.assets.get(key).map(|image| (key, image)))
        .filter(|(key, _)| canvas.has_image(key));
    match image {
        Some((key, image)) if image.width > 0 && image.height > 0 => {
            let (w, h) = fit(image.width, image.height, frame.width.to_f32(), frame.height.to_f32());
            let x = frame.x + Pt::from_f32((frame.width.to_f32() - w) / 2.0);
            let y = frame.y + Pt::from_f32((frame.height.to_f32() - h) / 2.0);
            canvas.draw_image(x, y, Pt::from_f32(w), Pt::from_f32(h), key.clone());
        }
        _ => {
            let side = frame.width.min(frame.height).to_f32();
            let origin = Point {
                x: frame.x + Pt::from_f32((frame.width.to_f32() - side) / 2.0),
                y: frame.y + Pt::from_f32((frame.height.to_f32() - side) / 2.0),
            };
            draw_icon(canvas, Icon::Ghost, origin, side / 100.0, &icon_style(ctx));
        }
    }
}

/// Draws a registered decoration asset across `frame`, or nothing. Returns
/// whether the image was drawn.
pub(crate) fn decoration(canvas: &mut Canvas, ctx: &BuildContext<'_>, key: &str, frame: Rect) -> bool {
    let Some(image) = ctx.assets.get(key) else {
        return false;
    };
    if !canvas.has_image(key) || image.width == 0 {
        return false;
    }
    let height = Pt::from_f32(image.height_for_width(frame.width.to_f32())).min(frame.height);
    canvas.draw_image(frame.x, frame.y, frame.width, height, key);
    true
}

/// Largest size with the image's aspect ratio inside `max_w` x `max_h`.
pub(crate) fn fit(width: u32, height: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    if width == 0 || height == 0 || max_w <= 0.0 || max_h <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_w / width as f32).min(max_h / height as f32);
    (width as f32 * scale, height as f32 * scale)
}

/// Horizontal bar with a filled share, `value` in 0..=100.
pub(crate) fn meter(canvas: &mut Canvas, ctx: &BuildContext<'_>, rect: Rect, value: f64, fill: Rgb) {
    canvas.set_fill_color(ctx.palette.card_alt);
    rounded_rect(canvas, rect, rect.height.to_f32() / 2.0, Paint::Fill);
    let share = (value.clamp(0.0, 100.0) / 100.0) as f32;
    let filled = Pt::from_f32(rect.width.to_f32() * share);
    if filled > Pt::ZERO {
        canvas.set_fill_color(fill);
        let bar = Rect::new(rect.x, rect.y, filled.max(rect.height), rect.height);
        rounded_rect(canvas, bar, rect.height.to_f32() / 2.0, Paint::Fill);
    }
}

/// Rows of `columns` equal cells inside `area`.
pub(crate) fn grid_cell(area: Rect, columns: usize, index: usize, cell_height: Pt, gap: Pt) -> Rect {
    let columns = columns.max(1);
    let cols = columns as i32;
    let width = (area.width - gap * (cols - 1)) / cols;
    let col = (index % columns) as i32;
    let row = (index / columns) as i32;
    Rect::new(
        area.x + (width + gap) * col,
        area.y + (cell_height + gap) * row,
        width,
        cell_height,
    )
}

pub(crate) fn format_minutes(minutes: f64) -> String {
    if minutes < 1.0 {
        "under a minute".to_string()
    } else if minutes < 90.0 {
        format!("{:.0} min", minutes)
    } else {
        format!("{:.1} h", minutes / 60.0)
    }
}
