//! Measurement-driven pagination of variable-length content.
//!
//! Planning and drawing are separate passes. [`plan_flow`] only measures and
//! decides where every divider and item lands; [`render_flow`] replays that
//! plan onto the canvas. Dividers and items are atomic: each is placed whole
//! on one page or moved to the next. An item taller than a whole page body is
//! not split either; it is placed alone at the top of a fresh page, runs past
//! the bottom margin, and is flagged `oversized`.

use crate::canvas::Canvas;
use crate::model::ContentItem;
use crate::types::Pt;

/// Something with a section tag; a change of tag between neighbours opens a
/// new section.
pub trait FlowItem {
    fn section_key(&self) -> &str;
}

impl FlowItem for ContentItem {
    fn section_key(&self) -> &str {
        &self.phase
    }
}

/// Vertical band the flow may use on every page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowConfig {
    /// Cursor position on a fresh page.
    pub top: Pt,
    /// Nothing placed may extend below this line.
    pub bottom: Pt,
    /// Space added after every item.
    pub item_gap: Pt,
}

impl FlowConfig {
    pub fn body_height(&self) -> Pt {
        (self.bottom - self.top).max(Pt::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Divider,
    Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: PlacementKind,
    /// Index of the item (for dividers, the item the divider introduces).
    pub index: usize,
    pub y: Pt,
    pub height: Pt,
    pub oversized: bool,
}

impl Placement {
    pub fn bottom(&self) -> Pt {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowPage {
    pub placements: Vec<Placement>,
}

impl FlowPage {
    pub fn item_indices(&self) -> Vec<usize> {
        self.indices_of(PlacementKind::Item)
    }

    pub fn divider_indices(&self) -> Vec<usize> {
        self.indices_of(PlacementKind::Divider)
    }

    fn indices_of(&self, kind: PlacementKind) -> Vec<usize> {
        self.placements
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.index)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowPlan {
    pub pages: Vec<FlowPage>,
}

impl FlowPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Item indices per page.
    pub fn item_pages(&self) -> Vec<Vec<usize>> {
        self.pages.iter().map(FlowPage::item_indices).collect()
    }

    pub fn divider_indices(&self) -> Vec<usize> {
        self.pages.iter().flat_map(FlowPage::divider_indices).collect()
    }

    pub fn oversized_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|page| page.placements.iter())
            .filter(|p| p.oversized)
            .count()
    }
}

struct Cursor {
    pages: Vec<FlowPage>,
    y: Pt,
    config: FlowConfig,
}

impl Cursor {
    fn new(config: FlowConfig) -> Self {
        Self {
            pages: vec![FlowPage::default()],
            y: config.top,
            config,
        }
    }

    fn page_is_empty(&self) -> bool {
        self.pages
            .last()
            .map(|page| page.placements.is_empty())
            .unwrap_or(true)
    }

    fn break_page(&mut self) {
        self.pages.push(FlowPage::default());
        self.y = self.config.top;
    }

    /// Places a unit of `height`, breaking first when it would cross the
    /// bottom line and the current page already holds something.
    fn place(&mut self, kind: PlacementKind, index: usize, height: Pt) {
        let fits = self.y + height <= self.config.bottom;
        if !fits && !self.page_is_empty() {
            log::debug!(
                "page break before {:?} {} (needs {}pt, {}pt left)",
                kind,
                index,
                height.to_f32(),
                (self.config.bottom - self.y).to_f32()
            );
            self.break_page();
        }
        let oversized = height > self.config.body_height();
        if oversized {
            log::warn!(
                "{:?} {} is {}pt tall but a page body holds {}pt; it will overrun the page",
                kind,
                index,
                height.to_f32(),
                self.config.body_height().to_f32()
            );
        }
        let placement = Placement {
            kind,
            index,
            y: self.y,
            height,
            oversized,
        };
        self.y += height;
        match self.pages.last_mut() {
            Some(page) => page.placements.push(placement),
            None => self.pages.push(FlowPage {
                placements: vec![placement],
            }),
        }
    }
}

/// Decides page boundaries for `items` without drawing anything.
///
/// `is_new_section(previous, next)` is asked for every neighbouring pair; a
/// `true` answer reserves a divider before `next`. The result depends only on
/// the inputs, so equal inputs always give equal plans.
pub fn plan_flow<T, S, D, M>(
    items: &[T],
    config: &FlowConfig,
    is_new_section: S,
    mut measure_divider: D,
    mut measure_item: M,
) -> FlowPlan
where
    S: Fn(&T, &T) -> bool,
    D: FnMut(&T) -> Pt,
    M: FnMut(&T) -> Pt,
{
    let mut cursor = Cursor::new(*config);
    for (index, item) in items.iter().enumerate() {
        if index > 0 && is_new_section(&items[index - 1], item) {
            let height = measure_divider(item).max(Pt::ZERO);
            cursor.place(PlacementKind::Divider, index, height);
        }
        let height = measure_item(item).max(Pt::ZERO);
        cursor.place(PlacementKind::Item, index, height);
        cursor.y += config.item_gap;
    }
    FlowPlan {
        pages: cursor.pages,
    }
}

/// Per-page information handed to headers and footers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// 1-based page number within this flow.
    pub section_page: usize,
    pub section_pages: usize,
}

/// Draws one flow: measurement, the persistent page furniture and the units.
pub trait FlowRenderer<T: FlowItem> {
    fn is_new_section(&self, previous: &T, next: &T) -> bool {
        previous.section_key() != next.section_key()
    }

    fn measure_divider(&self, item: &T) -> Pt;

    fn measure_item(&self, item: &T) -> Pt;

    /// Background and header; called on every physical page of the flow.
    fn begin_page(&mut self, canvas: &mut Canvas, page: &PageContext);

    fn draw_divider(&mut self, canvas: &mut Canvas, item: &T, y: Pt, height: Pt);

    fn draw_item(&mut self, canvas: &mut Canvas, item: &T, y: Pt, height: Pt);

    /// Footer; called after the last unit of every page.
    fn finish_page(&mut self, canvas: &mut Canvas, page: &PageContext);
}

/// Replays `plan` onto `canvas`, closing one canvas page per plan page.
pub fn render_flow<T, R>(canvas: &mut Canvas, plan: &FlowPlan, items: &[T], renderer: &mut R)
where
    T: FlowItem,
    R: FlowRenderer<T>,
{
    let section_pages = plan.page_count();
    for (page_index, page) in plan.pages.iter().enumerate() {
        let ctx = PageContext {
            section_page: page_index + 1,
            section_pages,
        };
        renderer.begin_page(canvas, &ctx);
        for placement in &page.placements {
            let Some(item) = items.get(placement.index) else {
                continue;
            };
            match placement.kind {
                PlacementKind::Divider => {
                    canvas.meta("flow.divider", placement.index.to_string());
                    renderer.draw_divider(canvas, item, placement.y, placement.height);
                }
                PlacementKind::Item => {
                    canvas.meta("flow.item", placement.index.to_string());
                    renderer.draw_item(canvas, item, placement.y, placement.height);
                }
            }
        }
        renderer.finish_page(canvas, &ctx);
        canvas.show_page();
    }
}

/// Plans with the renderer's own measurements, then draws.
pub fn paginate<T, R>(canvas: &mut Canvas, items: &[T], config: &FlowConfig, renderer: &mut R) -> FlowPlan
where
    T: FlowItem,
    R: FlowRenderer<T>,
{
    let plan = {
        let measurer = &*renderer;
        plan_flow(
            items,
            config,
            |previous, next| measurer.is_new_section(previous, next),
            |item| measurer.measure_divider(item),
            |item| measurer.measure_item(item),
        )
    };
    render_flow(canvas, &plan, items, renderer);
    plan
}
