//! Declarative page tables and the loop that runs them.

use crate::assets::AssetMap;
use crate::canvas::{Canvas, Document, SurfaceCapabilities};
use crate::color::Palette;
use crate::debug::DebugLogger;
use crate::metrics::{DeckMetrics, PageMetrics, SectionMetrics};
use crate::model::AnalysisBundle;
use crate::pages::{BuildContext, PageBuilder, argument, roast};
use crate::progress::ProgressReporter;
use crate::types::{Margins, Size};
use serde_json::json;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which deck to produce from a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckKind {
    Roast,
    Transcript,
}

/// One entry of a deck's page table: draw `build` when `include` holds.
#[derive(Clone, Copy)]
pub struct PageRule {
    pub name: &'static str,
    pub include: fn(&AnalysisBundle) -> bool,
    pub build: PageBuilder,
}

impl fmt::Debug for PageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRule").field("name", &self.name).finish()
    }
}

fn always(_: &AnalysisBundle) -> bool {
    true
}

fn has_roast(bundle: &AnalysisBundle) -> bool {
    bundle.roast.is_some()
}

fn has_personality(bundle: &AnalysisBundle) -> bool {
    bundle.personality.as_ref().is_some_and(|p| !p.is_empty())
}

fn has_health(bundle: &AnalysisBundle) -> bool {
    bundle.health.is_some()
}

fn has_viral(bundle: &AnalysisBundle) -> bool {
    bundle.viral.is_some()
}

fn has_argument(bundle: &AnalysisBundle) -> bool {
    bundle.argument.is_some()
}

const ROAST_RULES: [PageRule; 8] = [
    PageRule { name: "cover", include: always, build: roast::cover },
    PageRule { name: "roster", include: always, build: roast::roster },
    PageRule { name: "acts", include: has_roast, build: roast::acts },
    PageRule { name: "personality", include: has_personality, build: roast::personality },
    PageRule { name: "health", include: has_health, build: roast::health },
    PageRule { name: "viral", include: has_viral, build: roast::viral },
    PageRule { name: "finale", include: has_roast, build: roast::finale },
    PageRule { name: "disclaimer", include: always, build: roast::disclaimer },
];

const TRANSCRIPT_RULES: [PageRule; 6] = [
    PageRule { name: "cover", include: always, build: argument::cover },
    PageRule { name: "roster", include: always, build: argument::roster },
    PageRule { name: "transcript", include: has_argument, build: argument::transcript },
    PageRule { name: "summary", include: has_argument, build: argument::summary },
    PageRule { name: "health", include: has_health, build: argument::health },
    PageRule { name: "disclaimer", include: always, build: argument::disclaimer },
];

impl DeckKind {
    pub fn rules(self) -> &'static [PageRule] {
        match self {
            DeckKind::Roast => &ROAST_RULES,
            DeckKind::Transcript => &TRANSCRIPT_RULES,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            DeckKind::Roast => Palette::ROAST,
            DeckKind::Transcript => Palette::COURTROOM,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeckKind::Roast => "roast",
            DeckKind::Transcript => "transcript",
        }
    }

    /// Deck title: the roast title or argument topic, else the chat title.
    pub fn title(self, bundle: &AnalysisBundle) -> String {
        let specific = match self {
            DeckKind::Roast => bundle.roast.as_ref().map(|r| r.title.clone()),
            DeckKind::Transcript => bundle.argument.as_ref().map(|a| a.topic.clone()),
        };
        specific
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| bundle.meta.title.clone())
    }
}

/// Page geometry and surface of one composition.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub page_size: Size,
    pub margins: Margins,
    pub capabilities: SurfaceCapabilities,
}

/// Runs `kind`'s page table over `bundle`, reporting "Drawing <name>" per rule
/// with percentages spread over `percent_range`. Skipped rules still advance
/// the percentage.
pub(crate) fn compose(
    kind: DeckKind,
    bundle: &AnalysisBundle,
    assets: &AssetMap,
    layout: &Layout,
    debug: Option<&DebugLogger>,
    progress: &mut ProgressReporter<'_>,
    percent_range: (u8, u8),
) -> (Document, DeckMetrics) {
    let mut canvas = Canvas::with_capabilities(layout.page_size, layout.capabilities);
    for (key, image) in assets {
        canvas.register_image(key.clone(), image);
    }

    let rules = kind.rules();
    let mut sections = Vec::new();
    let (from, to) = percent_range;
    let span = to.saturating_sub(from) as usize;
    for (index, rule) in rules.iter().enumerate() {
        let percent = from as usize + span * index / rules.len();
        progress.report(format!("Drawing {}", rule.name), percent as u8);
        if !(rule.include)(bundle) {
            log::debug!("{} deck: skipping {}", kind.as_str(), rule.name);
            if let Some(logger) = debug {
                logger.log_event("compose.skip", json!({ "deck": kind.as_str(), "section": rule.name }));
                logger.increment("compose.skipped", 1);
            }
            continue;
        }

        let ctx = BuildContext {
            bundle,
            assets,
            palette: kind.palette(),
            page_size: layout.page_size,
            margins: layout.margins,
            section: rule.name,
            debug,
        };
        let before = canvas.page_count();
        (rule.build)(&mut canvas, &ctx);
        if !canvas.is_current_empty() {
            log::warn!("{} left its last page open; closing it", rule.name);
            canvas.show_page();
        }
        let added = canvas.page_count() - before;
        if added == 0 {
            log::debug!("{} drew no pages", rule.name);
            continue;
        }
        if let Some(logger) = debug {
            logger.log_event(
                "compose.section",
                json!({ "deck": kind.as_str(), "section": rule.name, "first_page": before + 1, "pages": added }),
            );
            logger.increment("compose.pages", added as u64);
        }
        sections.push(SectionMetrics {
            name: rule.name.to_string(),
            first_page: before + 1,
            page_count: added,
        });
    }

    let document = canvas.finish();
    let pages: Vec<PageMetrics> = document
        .pages
        .iter()
        .enumerate()
        .map(|(index, page)| PageMetrics {
            page_number: index + 1,
            section: page.meta_value("section").unwrap_or_default().to_string(),
            command_count: page.commands.len(),
            content_bytes: 0,
        })
        .collect();
    let metrics = DeckMetrics {
        sections,
        page_count: pages.len(),
        command_count: pages.iter().map(|p| p.command_count).sum(),
        pages,
        total_bytes: 0,
    };
    (document, metrics)
}

const SLUG_MAX: usize = 48;
const SLUG_FALLBACK: &str = "chat-report";

/// Lowercase ASCII alphanumerics with every other run collapsed to one '-'.
pub fn slugify(text: &str) -> String {
    let mut out = String::new();
    let mut prev_dash = true;
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_dash = false;
        } else if !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    out.truncate(SLUG_MAX);
    let slug = out.trim_matches('-');
    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

/// Calendar date in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CivilDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CivilDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Date of the given day count since 1970-01-01.
    pub fn from_unix_days(days: i64) -> Self {
        let z = days + 719_468;
        let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
        let year = (yoe + era * 400 + i64::from(month <= 2)) as i32;
        Self { year, month, day }
    }

    pub fn today() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_unix_days((secs / 86_400) as i64)
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// `<slug>-<YYYY-MM-DD>.pdf`
pub fn file_name(topic: &str, date: CivilDate) -> String {
    format!("{}-{}.pdf", slugify(topic), date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ArgumentSimulation, ContentItem, ConversationMeta, HealthScore, RoastAct, RoastScript,
    };
    use crate::progress::Progress;

    fn layout() -> Layout {
        Layout {
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            capabilities: SurfaceCapabilities::default(),
        }
    }

    fn roast_bundle() -> AnalysisBundle {
        AnalysisBundle {
            meta: ConversationMeta {
                title: "Book Club".into(),
                participants: vec!["Ana".into(), "Ben".into()],
                message_count: 420,
                date_range: None,
            },
            roast: Some(RoastScript {
                title: "Chapter and Worse".into(),
                opener: "Welcome, readers.".into(),
                acts: vec![RoastAct {
                    title: "Ana".into(),
                    target: "Ana".into(),
                    jokes: vec!["Ana has finished zero books this year.".into()],
                }],
                closer: String::new(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn tables_list_sections_in_order() {
        let roast: Vec<&str> = DeckKind::Roast.rules().iter().map(|r| r.name).collect();
        assert_eq!(
            roast,
            vec!["cover", "roster", "acts", "personality", "health", "viral", "finale", "disclaimer"]
        );
        let transcript: Vec<&str> = DeckKind::Transcript.rules().iter().map(|r| r.name).collect();
        assert_eq!(
            transcript,
            vec!["cover", "roster", "transcript", "summary", "health", "disclaimer"]
        );
    }

    #[test]
    fn optional_sections_follow_the_bundle() {
        let bundle = roast_bundle();
        let (document, metrics) = compose(
            DeckKind::Roast,
            &bundle,
            &AssetMap::new(),
            &layout(),
            None,
            &mut ProgressReporter::silent(),
            (0, 90),
        );
        assert_eq!(
            metrics.section_names(),
            vec!["cover", "roster", "acts", "finale", "disclaimer"]
        );
        assert_eq!(metrics.page_count, document.pages.len());
        assert_eq!(metrics.pages[0].section, "cover");
        let acts = metrics.section("acts").expect("acts drawn");
        assert_eq!(acts.first_page, 3);

        let mut with_health = bundle.clone();
        with_health.health = Some(HealthScore {
            score: 30.0,
            verdict: "Rocky".into(),
            factors: vec!["Nobody reads".into()],
        });
        let (_, metrics) = compose(
            DeckKind::Roast,
            &with_health,
            &AssetMap::new(),
            &layout(),
            None,
            &mut ProgressReporter::silent(),
            (0, 90),
        );
        assert_eq!(metrics.section("health").map(|s| s.page_count), Some(1));
    }

    #[test]
    fn every_rule_reports_progress() {
        let mut seen = Vec::new();
        let mut sink = |p: Progress| seen.push((p.stage, p.percent));
        {
            let mut reporter = ProgressReporter::new(Some(&mut sink));
            let bundle = AnalysisBundle {
                argument: Some(ArgumentSimulation {
                    topic: "Dishes".into(),
                    turns: vec![ContentItem {
                        sender: "Ana".into(),
                        text: "Your turn.".into(),
                        phase: "opening".into(),
                        ordinal: 1,
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            };
            compose(DeckKind::Transcript, &bundle, &AssetMap::new(), &layout(), None, &mut reporter, (30, 90));
        }
        let stages: Vec<&str> = seen.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            stages,
            vec![
                "Drawing cover",
                "Drawing roster",
                "Drawing transcript",
                "Drawing summary",
                "Drawing health",
                "Drawing disclaimer"
            ]
        );
        assert_eq!(seen[0].1, 30);
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(seen.iter().all(|(_, p)| *p < 90));
    }

    #[test]
    fn slugs_are_ascii_and_bounded() {
        assert_eq!(slugify("Who took the LAST yoghurt?!"), "who-took-the-last-yoghurt");
        assert_eq!(slugify("  ***  "), SLUG_FALLBACK);
        assert_eq!(slugify("Caf\u{e9} & Cr\u{e8}me"), "caf-cr-me");
        let long = slugify(&"word ".repeat(30));
        assert!(long.len() <= SLUG_MAX);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn civil_dates_from_day_counts() {
        assert_eq!(CivilDate::from_unix_days(0), CivilDate::new(1970, 1, 1));
        assert_eq!(CivilDate::from_unix_days(11_016), CivilDate::new(2000, 2, 29));
        assert_eq!(CivilDate::from_unix_days(19_723), CivilDate::new(2024, 1, 1));
        assert_eq!(CivilDate::from_unix_days(-1), CivilDate::new(1969, 12, 31));
        assert!(CivilDate::today().year >= 2024);
    }

    #[test]
    fn file_names_combine_slug_and_date() {
        assert_eq!(
            file_name("Chapter and Worse", CivilDate::new(2024, 3, 7)),
            "chapter-and-worse-2024-03-07.pdf"
        );
        assert_eq!(file_name("", CivilDate::new(2024, 12, 31)), "chat-report-2024-12-31.pdf");
    }

    #[test]
    fn deck_title_prefers_specific_title() {
        let bundle = roast_bundle();
        assert_eq!(DeckKind::Roast.title(&bundle), "Chapter and Worse");
        assert_eq!(DeckKind::Transcript.title(&bundle), "Book Club");
    }
}
