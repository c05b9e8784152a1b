mod assets;
mod canvas;
mod color;
mod compose;
mod debug;
mod error;
mod flow;
mod inspect;
mod metrics;
mod model;
pub mod pages;
mod pdf;
mod progress;
mod shapes;
mod text;
mod types;

pub use assets::{
    AssetMap, AssetOptions, AssetSource, DirectoryAssetSource, EmbeddedImage, MemoryAssetSource,
    prepare_image, preprocess_assets, scaled_height,
};
pub use canvas::{Canvas, Command, Document, Page, SurfaceCapabilities};
pub use color::{Palette, Rgb, blend, fill_arc_gradient, fill_band_gradient};
pub use compose::{CivilDate, DeckKind, PageRule, file_name, slugify};
pub use debug::DebugLogger;
pub use error::DeckError;
pub use flow::{
    FlowConfig, FlowItem, FlowPage, FlowPlan, FlowRenderer, PageContext, Placement, PlacementKind,
    paginate, plan_flow, render_flow,
};
pub use inspect::{
    PageInspect, PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes,
    inspect_pdf_path, require_deck_integrity,
};
pub use metrics::{DeckMetrics, PageMetrics, SectionMetrics};
pub use model::{
    ANONYMOUS, AnalysisBundle, ArgumentSimulation, ArgumentSummary, ContentItem, Contribution,
    ConversationMeta, HealthScore, ParticipantMetrics, PersonalityProfile, RoastAct, RoastScript,
    REACTION, UNTITLED, ViralScores,
};
pub use pages::{BuildContext, PageBuilder};
pub use pdf::{PdfOptions, document_to_pdf, document_to_pdf_with_metrics};
pub use progress::{Progress, ProgressReporter};
pub use shapes::{
    Icon, IconStyle, Paint, arc_polyline, circle, draw_icon, ellipse, line, polygon, regular_star,
    rounded_rect, translucent,
};
pub use text::{FontFace, TextStyle, clamp_lines, line_height, measure, sanitize_text, wrap};
pub use types::{Margins, Point, Pt, Rect, Size};

use compose::Layout;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Smallest content area a deck can be laid out in.
const MIN_CONTENT: i32 = 144;

const ASSET_RANGE: (u8, u8) = (0, 30);
const DRAW_RANGE_WITH_ASSETS: (u8, u8) = (30, 85);
const DRAW_RANGE: (u8, u8) = (0, 85);
const WRITE_PERCENT: u8 = 90;
const VERIFY_PERCENT: u8 = 95;

/// A configured generator. Cheap to share; every call is independent.
pub struct DeckEngine {
    page_size: Size,
    margins: Margins,
    capabilities: SurfaceCapabilities,
    compress: bool,
    asset_options: AssetOptions,
    debug: Option<DebugLogger>,
    verify_output: bool,
    generation_date: Option<CivilDate>,
}

#[derive(Clone)]
pub struct DeckBuilder {
    page_size: Size,
    margins: Margins,
    transparency: bool,
    compress: bool,
    asset_options: AssetOptions,
    debug_path: Option<PathBuf>,
    verify_output: bool,
    generation_date: Option<CivilDate>,
}

/// One finished artifact.
#[derive(Debug, Clone)]
pub struct DeckOutput {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub metrics: DeckMetrics,
}

impl DeckOutput {
    /// Writes the artifact into `dir` under its derived name and returns the path.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DeckError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

impl DeckEngine {
    pub fn builder() -> DeckBuilder {
        DeckBuilder::new()
    }

    fn layout(&self) -> Layout {
        Layout {
            page_size: self.page_size,
            margins: self.margins,
            capabilities: self.capabilities,
        }
    }

    fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = self.debug.as_ref() {
            logger.emit_summary(context);
            logger.flush();
        }
    }

    /// Draws the deck without serializing it.
    pub fn render_document(
        &self,
        kind: DeckKind,
        bundle: &AnalysisBundle,
        assets: &AssetMap,
    ) -> Result<(Document, DeckMetrics), DeckError> {
        let bundle = bundle.clone().sanitize();
        let rendered = compose::compose(
            kind,
            &bundle,
            assets,
            &self.layout(),
            self.debug.as_ref(),
            &mut ProgressReporter::silent(),
            DRAW_RANGE,
        );
        self.emit_debug_summary("render_document");
        Ok(rendered)
    }

    /// Produces the PDF from already prepared assets.
    pub fn generate(
        &self,
        kind: DeckKind,
        bundle: &AnalysisBundle,
        assets: &AssetMap,
        progress: Option<&mut (dyn FnMut(Progress) + Send)>,
    ) -> Result<DeckOutput, DeckError> {
        let mut reporter = ProgressReporter::new(progress);
        let output = self.generate_with_reporter(kind, bundle, assets, &mut reporter, DRAW_RANGE);
        self.emit_debug_summary("generate");
        output
    }

    /// Fetches and prepares the bundle's images from `source`, then generates.
    /// Images that fail are replaced by drawn placeholders.
    pub fn generate_with_source(
        &self,
        kind: DeckKind,
        bundle: &AnalysisBundle,
        source: &dyn AssetSource,
        progress: Option<&mut (dyn FnMut(Progress) + Send)>,
    ) -> Result<DeckOutput, DeckError> {
        let mut reporter = ProgressReporter::new(progress);
        reporter.report("Preparing images", ASSET_RANGE.0);
        let keys = bundle.clone().sanitize().asset_keys();
        let assets = preprocess_assets(source, &keys, &self.asset_options, &mut reporter, ASSET_RANGE);
        if let Some(logger) = self.debug.as_ref() {
            let missing: Vec<&String> = keys.iter().filter(|key| !assets.contains_key(*key)).collect();
            logger.log_event(
                "assets.prepared",
                json!({ "requested": keys.len(), "prepared": assets.len(), "missing": missing }),
            );
        }
        let output =
            self.generate_with_reporter(kind, bundle, &assets, &mut reporter, DRAW_RANGE_WITH_ASSETS);
        self.emit_debug_summary("generate_with_source");
        output
    }

    fn generate_with_reporter(
        &self,
        kind: DeckKind,
        bundle: &AnalysisBundle,
        assets: &AssetMap,
        reporter: &mut ProgressReporter<'_>,
        draw_range: (u8, u8),
    ) -> Result<DeckOutput, DeckError> {
        let bundle = bundle.clone().sanitize();
        let (document, mut metrics) = compose::compose(
            kind,
            &bundle,
            assets,
            &self.layout(),
            self.debug.as_ref(),
            reporter,
            draw_range,
        );

        reporter.report("Writing PDF", WRITE_PERCENT);
        let title = kind.title(&bundle);
        let options = PdfOptions {
            compress: self.compress,
            title: Some(title.clone()),
            ..PdfOptions::default()
        };
        let bytes = document_to_pdf_with_metrics(&document, &options, &mut metrics, self.debug.as_ref())
            .map_err(|err| DeckError::Pdf(err.to_string()))?;

        if self.verify_output {
            reporter.report("Verifying PDF", VERIFY_PERCENT);
            let report = inspect_pdf_bytes(&bytes).map_err(|err| DeckError::Pdf(err.to_string()))?;
            require_deck_integrity(&report, document.pages.len())
                .map_err(|err| DeckError::Pdf(err.to_string()))?;
        }

        let date = self.generation_date.unwrap_or_else(CivilDate::today);
        let file_name = file_name(&title, date);
        log::debug!(
            "{} deck '{}': {} pages, {} bytes",
            kind.as_str(),
            file_name,
            metrics.page_count,
            bytes.len()
        );
        if let Some(logger) = self.debug.as_ref() {
            logger.log_event(
                "deck.generated",
                json!({
                    "deck": kind.as_str(),
                    "file_name": file_name,
                    "pages": metrics.page_count,
                    "bytes": bytes.len(),
                    "sections": metrics.section_names(),
                }),
            );
        }
        reporter.report("Done", 100);
        Ok(DeckOutput {
            bytes,
            file_name,
            metrics,
        })
    }
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            transparency: true,
            compress: true,
            asset_options: AssetOptions::default(),
            debug_path: None,
            verify_output: false,
            generation_date: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Margins::all(value);
        self
    }

    // Without transparency, translucent fills are flattened against their backdrop.
    pub fn transparency(mut self, enabled: bool) -> Self {
        self.transparency = enabled;
        self
    }

    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn asset_options(mut self, options: AssetOptions) -> Self {
        self.asset_options = options;
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    // Re-parse every artifact with an independent reader before returning it.
    pub fn verify_output(mut self, enabled: bool) -> Self {
        self.verify_output = enabled;
        self
    }

    /// Fixes the date used in file names; defaults to today (UTC).
    pub fn generation_date(mut self, date: CivilDate) -> Self {
        self.generation_date = Some(date);
        self
    }

    pub fn build(self) -> Result<DeckEngine, DeckError> {
        let content = self.margins.content_rect(self.page_size);
        let min = Pt::from_i32(MIN_CONTENT);
        if content.width < min || content.height < min {
            return Err(DeckError::InvalidConfiguration(format!(
                "page leaves a {}x{}pt content area; at least {MIN_CONTENT}pt each way is required",
                content.width.to_f32(),
                content.height.to_f32()
            )));
        }
        let margins = [
            self.margins.left,
            self.margins.top,
            self.margins.right,
            self.margins.bottom,
        ];
        if margins.iter().any(|m| *m < Pt::ZERO) {
            return Err(DeckError::InvalidConfiguration(
                "margins must not be negative".to_string(),
            ));
        }
        if self.asset_options.target_width == 0 {
            return Err(DeckError::InvalidConfiguration(
                "asset target width must be > 0".to_string(),
            ));
        }
        if !(1..=100).contains(&self.asset_options.quality) {
            return Err(DeckError::InvalidConfiguration(
                "asset quality must be within 1..=100".to_string(),
            ));
        }
        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(DeckEngine {
            page_size: self.page_size,
            margins: self.margins,
            capabilities: SurfaceCapabilities {
                transparency: self.transparency,
            },
            compress: self.compress,
            asset_options: self.asset_options,
            debug,
            verify_output: self.verify_output,
            generation_date: self.generation_date,
        })
    }
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new()
    }
}
