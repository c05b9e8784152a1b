//! Page builders. Each builder draws one logical page, or for variable-length
//! sections drives the flow engine over as many physical pages as it needs,
//! and closes every page it starts.

pub mod argument;
pub(crate) mod common;
pub mod roast;
pub mod shared;

use crate::assets::AssetMap;
use crate::canvas::Canvas;
use crate::color::Palette;
use crate::debug::DebugLogger;
use crate::flow::{FlowConfig, FlowPlan};
use crate::model::AnalysisBundle;
use crate::types::{Margins, Pt, Rect, Size};
use serde_json::json;

/// Read-only inputs of one builder call.
pub struct BuildContext<'a> {
    pub bundle: &'a AnalysisBundle,
    pub assets: &'a AssetMap,
    pub palette: Palette,
    pub page_size: Size,
    pub margins: Margins,
    /// Name of the page rule being drawn; tagged onto every page.
    pub section: &'static str,
    pub debug: Option<&'a DebugLogger>,
}

impl BuildContext<'_> {
    pub fn content_rect(&self) -> Rect {
        self.margins.content_rect(self.page_size)
    }

    /// Flow band below a page header of `header_height`.
    pub(crate) fn flow_config(&self, header_height: Pt, item_gap: Pt) -> FlowConfig {
        let content = self.content_rect();
        FlowConfig {
            top: content.y + header_height,
            bottom: content.bottom(),
            item_gap,
        }
    }

    pub(crate) fn record_plan(&self, plan: &FlowPlan) {
        let Some(logger) = self.debug else {
            return;
        };
        for (page_index, page) in plan.pages.iter().enumerate() {
            logger.log_event(
                "flow.page",
                json!({
                    "section": self.section,
                    "page": page_index + 1,
                    "items": page.item_indices(),
                    "dividers": page.divider_indices(),
                }),
            );
        }
        logger.increment("flow.pages", plan.page_count() as u64);
        logger.increment("flow.oversized", plan.oversized_count() as u64);
    }

    /// Records that a single-page layout had room for only `drawn` of `total`
    /// entries of `what`.
    pub(crate) fn record_truncation(&self, canvas: &mut Canvas, what: &str, drawn: usize, total: usize) {
        log::warn!(
            "{} page holds {} of {} {}; the rest are left out",
            self.section,
            drawn,
            total,
            what
        );
        canvas.meta("layout.truncated", format!("{what} {drawn}/{total}"));
        let Some(logger) = self.debug else {
            return;
        };
        logger.log_event(
            "layout.truncated",
            json!({
                "section": self.section,
                "what": what,
                "drawn": drawn,
                "total": total,
            }),
        );
        logger.increment("layout.truncated", total.saturating_sub(drawn) as u64);
    }
}

/// Signature every page rule's builder has.
pub type PageBuilder = fn(&mut Canvas, &BuildContext<'_>);
