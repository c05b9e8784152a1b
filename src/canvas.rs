use crate::assets::EmbeddedImage;
use crate::color::Rgb;
use crate::text::FontFace;
use crate::types::{Pt, Size};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    // Non-rendered metadata (section names, placement records). Ignored by the PDF writer.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Rgb),
    SetStrokeColor(Rgb),
    SetLineWidth(Pt),
    SetLineCap(u8),
    SetLineJoin(u8),
    SetDash {
        pattern: Vec<Pt>,
        phase: Pt,
    },
    // Fill and stroke alpha (ca/CA), already clamped to 0..1.
    SetOpacity {
        fill: f32,
        stroke: f32,
    },
    SetFont(FontFace),
    SetFontSize(Pt),
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    CurveTo {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
        x: Pt,
        y: Pt,
    },
    ClosePath,
    Fill,
    Stroke,
    FillStroke,
    // `y` is the top of the text line; the writer places the baseline below it.
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        key: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.commands.iter().find_map(|cmd| match cmd {
            Command::Meta { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::DrawString { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A finished, immutable drawing: what the PDF writer consumes.
#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
    pub images: BTreeMap<String, EmbeddedImage>,
}

/// What the output surface can do. Decided once per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub transparency: bool,
}

impl Default for SurfaceCapabilities {
    fn default() -> Self {
        Self { transparency: true }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Rgb,
    stroke_color: Rgb,
    line_width: Pt,
    font_size: Pt,
    font: FontFace,
}

impl GraphicsState {
    fn initial() -> Self {
        Self {
            fill_color: Rgb::BLACK,
            stroke_color: Rgb::BLACK,
            line_width: Pt::from_i32(1),
            font_size: Pt::from_i32(12),
            font: FontFace::Regular,
        }
    }
}

/// The drawing handle every builder and primitive writes through.
///
/// One canvas serves exactly one generation; it is consumed by [`Canvas::finish`].
pub struct Canvas {
    page_size: Size,
    capabilities: SurfaceCapabilities,
    pages: Vec<Page>,
    current: Page,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
    images: BTreeMap<String, EmbeddedImage>,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self::with_capabilities(page_size, SurfaceCapabilities::default())
    }

    pub fn with_capabilities(page_size: Size, capabilities: SurfaceCapabilities) -> Self {
        Self {
            page_size,
            capabilities,
            pages: Vec::new(),
            current: Page::new(),
            state_stack: Vec::new(),
            current_state: GraphicsState::initial(),
            images: BTreeMap::new(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn capabilities(&self) -> SurfaceCapabilities {
        self.capabilities
    }

    /// Number of pages already closed with [`Canvas::show_page`].
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.current.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.current.commands.push(Command::RestoreState);
        }
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.current.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        if self.current_state.fill_color == color {
            return;
        }
        self.current_state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Rgb) {
        if self.current_state.stroke_color == color {
            return;
        }
        self.current_state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.current_state.line_width == width {
            return;
        }
        self.current_state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_line_cap(&mut self, cap: u8) {
        self.current.commands.push(Command::SetLineCap(cap.min(2)));
    }

    pub fn set_line_join(&mut self, join: u8) {
        self.current.commands.push(Command::SetLineJoin(join.min(2)));
    }

    pub fn set_dash(&mut self, pattern: Vec<Pt>, phase: Pt) {
        self.current
            .commands
            .push(Command::SetDash { pattern, phase });
    }

    /// Returns false when the surface has no transparency; the caller should
    /// then paint with an opaque substitute instead.
    pub fn set_opacity(&mut self, fill: f32, stroke: f32) -> bool {
        if !self.capabilities.transparency {
            return false;
        }
        let clamp = |v: f32| if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) };
        self.current.commands.push(Command::SetOpacity {
            fill: clamp(fill),
            stroke: clamp(stroke),
        });
        true
    }

    pub fn set_font(&mut self, font: FontFace, size: Pt) {
        if self.current_state.font != font {
            self.current_state.font = font;
            self.current.commands.push(Command::SetFont(font));
        }
        if self.current_state.font_size != size {
            self.current_state.font_size = size;
            self.current.commands.push(Command::SetFontSize(size));
        }
    }

    pub fn font(&self) -> (FontFace, Pt) {
        (self.current_state.font, self.current_state.font_size)
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
        self.current.commands.push(Command::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close_path(&mut self) {
        self.current.commands.push(Command::ClosePath);
    }

    pub fn fill(&mut self) {
        self.current.commands.push(Command::Fill);
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn fill_stroke(&mut self) {
        self.current.commands.push(Command::FillStroke);
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.current
            .commands
            .push(Command::DrawString { x, y, text });
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        if width <= Pt::ZERO || height <= Pt::ZERO {
            return;
        }
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    /// Makes `image` drawable under `key` for the rest of the generation.
    pub fn register_image(&mut self, key: impl Into<String>, image: &EmbeddedImage) {
        self.images
            .entry(key.into())
            .or_insert_with(|| image.clone());
    }

    pub fn has_image(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    pub fn draw_image(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, key: impl Into<String>) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            key: key.into(),
        });
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state_stack.clear();
        self.current_state = GraphicsState::initial();
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
            images: self.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_state_changes_are_elided() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Rgb::WHITE);
        canvas.set_fill_color(Rgb::WHITE);
        canvas.set_font(FontFace::Bold, Pt::from_i32(14));
        canvas.set_font(FontFace::Bold, Pt::from_i32(14));
        assert_eq!(canvas.current_command_count(), 3);
    }

    #[test]
    fn opacity_is_bypassed_without_transparency() {
        let mut canvas = Canvas::with_capabilities(
            Size::a4(),
            SurfaceCapabilities {
                transparency: false,
            },
        );
        assert!(!canvas.set_opacity(0.5, 0.5));
        assert!(canvas.is_current_empty());
    }

    #[test]
    fn show_page_resets_graphics_state() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Rgb::WHITE);
        canvas.draw_rect(Pt::ZERO, Pt::ZERO, Pt::from_i32(5), Pt::from_i32(5));
        canvas.show_page();
        canvas.set_fill_color(Rgb::WHITE);
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[1].commands, vec![Command::SetFillColor(Rgb::WHITE)]);
    }

    #[test]
    fn finish_always_yields_a_page() {
        let doc = Canvas::new(Size::letter()).finish();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }
}
