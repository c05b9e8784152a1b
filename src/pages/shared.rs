//! Pages both decks carry, drawn in the deck's own palette and wording.

use super::BuildContext;
use super::common::{
    CARD_SHADOW, begin_page, card, centered, centered_paragraph, draw_line, end_page, format_minutes,
    grid_cell, heading, heading_height, icon_style, paragraph, portrait,
};
use crate::canvas::Canvas;
use crate::model::{HealthScore, ParticipantMetrics};
use crate::shapes::{Icon, draw_icon};
use crate::text::TextStyle;
use crate::types::{Point, Pt, Rect};

const ROSTER_COLUMNS: usize = 2;
const ROSTER_CARD_HEIGHT: i32 = 132;
const ROSTER_GAP: i32 = 16;
const PORTRAIT_SIZE: i32 = 84;
const MIN_PORTRAIT: i32 = 24;
const MIN_TEXT_WIDTH: i32 = 48;

fn stat_lines(metrics: Option<&ParticipantMetrics>) -> Vec<String> {
    let Some(m) = metrics else {
        return vec!["No stats on record".to_string()];
    };
    vec![
        format!("{} messages, {} words", m.messages, m.words),
        format!("Replies in {}", format_minutes(m.avg_response_minutes)),
        format!("{} emoji, {} questions", m.emoji, m.questions),
        format!("{:.0}% sent after midnight", m.late_night_share),
    ]
}

/// One card per participant, as many pages as the roster needs.
pub fn roster(canvas: &mut Canvas, ctx: &BuildContext<'_>, title: &str, kicker: &str) {
    let participants = &ctx.bundle.meta.participants;
    let content = ctx.content_rect();
    let header = heading_height(ctx, title, kicker);
    // Room below the heading, less the drop shadow under the last row.
    let available = content.height - header - Pt::from_i32(CARD_SHADOW);
    let gap = Pt::from_i32(ROSTER_GAP);
    let full_rows = ((available + gap).to_f32() / (Pt::from_i32(ROSTER_CARD_HEIGHT) + gap).to_f32()).floor();
    // Short pages get a single row of cards squeezed to the space left.
    let (rows, card_height) = if full_rows >= 1.0 {
        (full_rows as usize, Pt::from_i32(ROSTER_CARD_HEIGHT))
    } else {
        (1, available.max(Pt::ZERO))
    };
    let per_page = rows * ROSTER_COLUMNS;
    let chunks: Vec<&[String]> = if participants.is_empty() {
        vec![participants.as_slice()]
    } else {
        participants.chunks(per_page).collect()
    };
    let total = chunks.len();

    for (page_index, chunk) in chunks.into_iter().enumerate() {
        begin_page(canvas, ctx);
        let top = heading(canvas, ctx, title, kicker);
        if chunk.is_empty() {
            draw_line(
                canvas,
                TextStyle::oblique(12.0),
                ctx.palette.muted,
                content.x,
                top,
                "Nobody showed up. Not even the group chat admin.",
            );
        }
        let area = Rect::new(content.x, content.y + header, content.width, available);
        for (index, name) in chunk.iter().enumerate() {
            let cell = grid_cell(area, ROSTER_COLUMNS, index, card_height, gap);
            roster_card(canvas, ctx, name, cell);
        }
        let label = if total > 1 {
            format!("{} / {}", page_index + 1, total)
        } else {
            String::new()
        };
        end_page(canvas, ctx, &label);
    }
}

fn roster_card(canvas: &mut Canvas, ctx: &BuildContext<'_>, name: &str, cell: Rect) {
    card(canvas, ctx, cell, ctx.palette.card);
    let pad = Pt::from_i32(12);
    let inner_bottom = cell.bottom() - pad;
    let side = Pt::from_i32(PORTRAIT_SIZE).min(cell.height - pad * 2);
    let room_beside = cell.width - side - pad * 3;
    let text_x = if side >= Pt::from_i32(MIN_PORTRAIT) && room_beside >= Pt::from_i32(MIN_TEXT_WIDTH) {
        let frame = Rect::new(cell.x + pad, cell.y + (cell.height - side) / 2, side, side);
        portrait(canvas, ctx, name, frame);
        frame.right() + pad
    } else {
        cell.x + pad
    };

    let text_width = cell.right() - pad - text_x;
    let name_style = TextStyle::bold(13.0);
    let mut y = cell.y + pad;
    if y + name_style.line_height() > inner_bottom {
        return;
    }
    y = paragraph(canvas, name_style, ctx.palette.ink, (text_x, y, text_width), name, 1);
    y += Pt::from_i32(4);
    let stats = TextStyle::regular(8.5);
    for line in stat_lines(ctx.bundle.metrics_for(name)) {
        if y + stats.line_height() > inner_bottom {
            break;
        }
        y = paragraph(canvas, stats, ctx.palette.muted, (text_x, y, text_width), &line, 1);
    }
}

/// Gauge, verdict and contributing factors of the health score.
pub fn health(canvas: &mut Canvas, ctx: &BuildContext<'_>, score: &HealthScore, title: &str, kicker: &str) {
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let mut y = heading(canvas, ctx, title, kicker);
    let style = icon_style(ctx);
    let centre_x = content.x + content.width / 2;

    let gauge_size = 240.0f32;
    let origin = Point {
        x: centre_x - Pt::from_f32(gauge_size / 2.0),
        y,
    };
    draw_icon(canvas, Icon::Gauge { value: score.score as f32 }, origin, gauge_size / 100.0, &style);
    // Clear the hub, which sits at 70% of the gauge height.
    y += Pt::from_f32(gauge_size * 0.8);
    centered(
        canvas,
        TextStyle::bold(40.0),
        ctx.palette.ink,
        centre_x,
        y,
        &format!("{:.0}/100", score.score),
    );
    y += Pt::from_i32(56);
    y = centered_paragraph(
        canvas,
        TextStyle::bold(16.0),
        ctx.palette.accent,
        centre_x,
        y,
        content.width,
        &score.verdict,
    );
    y += Pt::from_i32(12);

    let heart = if score.score < 50.0 {
        Icon::BrokenHeart
    } else {
        Icon::Heart
    };
    let heart_size = 64.0f32;
    draw_icon(
        canvas,
        heart,
        Point {
            x: centre_x - Pt::from_f32(heart_size / 2.0),
            y,
        },
        heart_size / 100.0,
        &style,
    );
    y += Pt::from_f32(heart_size + 16.0);

    let body = TextStyle::regular(11.0);
    let bullet_indent = Pt::from_i32(14);
    for (index, factor) in score.factors.iter().enumerate() {
        let lines = body.wrap(factor, content.width - bullet_indent);
        let needed = body.line_height() * lines.len() as i32;
        if y + needed > content.bottom() {
            ctx.record_truncation(canvas, "factors", index, score.factors.len());
            break;
        }
        draw_line(canvas, body, ctx.palette.accent, content.x, y, "*");
        paragraph(
            canvas,
            body,
            ctx.palette.ink,
            (content.x + bullet_indent, y, content.width - bullet_indent),
            factor,
            lines.len(),
        );
        y += needed + Pt::from_i32(4);
    }
    end_page(canvas, ctx, "");
}

/// Closing page with the deck's fine print.
pub fn disclaimer(canvas: &mut Canvas, ctx: &BuildContext<'_>, paragraphs: &[&str]) {
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let mut y = heading(canvas, ctx, "The Fine Print", "Disclaimer");
    let body = TextStyle::regular(11.0);
    for text in paragraphs {
        y = paragraph(canvas, body, ctx.palette.ink, (content.x, y, content.width), text, 8);
        y += Pt::from_i32(10);
    }
    let size = 72.0f32;
    let origin = Point {
        x: content.x + content.width / 2 - Pt::from_f32(size / 2.0),
        y: (y + Pt::from_i32(24)).min(content.bottom() - Pt::from_f32(size)),
    };
    draw_icon(canvas, Icon::SpeechBubble, origin, size / 100.0, &icon_style(ctx));
    end_page(canvas, ctx, "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::color::Palette;
    use crate::model::{AnalysisBundle, ConversationMeta};
    use crate::types::{Margins, Size};
    use std::collections::BTreeMap;

    fn bundle(participants: &[&str]) -> AnalysisBundle {
        AnalysisBundle {
            meta: ConversationMeta {
                title: "Flatmates".into(),
                participants: participants.iter().map(|p| p.to_string()).collect(),
                message_count: 10,
                date_range: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn roster_stays_inside_the_smallest_content_area() {
        let bundle = bundle(&["Ana", "Ben", "Cy"]);
        let assets = BTreeMap::new();
        // 224pt pages with 40pt margins leave the 144pt minimum each way.
        let page_size = Size {
            width: Pt::from_i32(224),
            height: Pt::from_i32(224),
        };
        let ctx = BuildContext {
            bundle: &bundle,
            assets: &assets,
            palette: Palette::ROAST,
            page_size,
            margins: Margins::all(40.0),
            section: "roster",
            debug: None,
        };
        let mut canvas = Canvas::new(page_size);
        roster(&mut canvas, &ctx, "The Cast", "Meet");
        let document = canvas.finish();
        let bottom = ctx.content_rect().bottom();
        let footer_y = bottom + Pt::from_i32(14);

        assert_eq!(document.pages.len(), 2);
        let mut names = Vec::new();
        for page in &document.pages {
            let mut size = Pt::from_i32(12);
            for cmd in &page.commands {
                match cmd {
                    Command::SetFontSize(s) => size = *s,
                    Command::DrawString { y, text, .. } if *y >= bottom => {
                        assert_eq!(*y, footer_y, "{text} drawn below the content area");
                    }
                    Command::DrawString { y, text, .. } => {
                        assert!(*y + size <= bottom, "{text} overruns the content area");
                        names.push(text.clone());
                    }
                    Command::MoveTo { y, .. } | Command::LineTo { y, .. } => assert!(*y <= bottom),
                    Command::CurveTo { y1, y2, y, .. } => {
                        assert!(*y1 <= bottom && *y2 <= bottom && *y <= bottom);
                    }
                    _ => {}
                }
            }
        }
        for name in ["Ana", "Ben", "Cy"] {
            assert!(names.iter().any(|n| n == name), "{name} missing");
        }
    }

    #[test]
    fn roster_keeps_full_cards_on_a4() {
        let bundle = bundle(&["Ana", "Ben", "Cy", "Dee", "Eli", "Fay", "Gus", "Hal", "Ivy"]);
        let assets = BTreeMap::new();
        let ctx = BuildContext {
            bundle: &bundle,
            assets: &assets,
            palette: Palette::ROAST,
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            section: "roster",
            debug: None,
        };
        let mut canvas = Canvas::new(Size::a4());
        roster(&mut canvas, &ctx, "The Cast", "Meet");
        let document = canvas.finish();
        // Four rows of two per page.
        assert_eq!(document.pages.len(), 2);
        assert!(document.pages[1].texts().any(|t| t == "2 / 2"));
        assert!(document.pages[0].texts().any(|t| t == "No stats on record"));
    }

    #[test]
    fn health_notes_factors_it_cannot_fit() {
        let factors: Vec<String> = (1..=60)
            .map(|i| format!("Factor {i}: somebody left the other on read again"))
            .collect();
        let score = HealthScore {
            score: 42.0,
            verdict: "Salvageable".into(),
            factors,
        };
        let bundle = bundle(&["Ana", "Ben"]);
        let assets = BTreeMap::new();
        let ctx = BuildContext {
            bundle: &bundle,
            assets: &assets,
            palette: Palette::ROAST,
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            section: "health",
            debug: None,
        };
        let mut canvas = Canvas::new(Size::a4());
        health(&mut canvas, &ctx, &score, "Vital Signs", "Health");
        let document = canvas.finish();
        assert_eq!(document.pages.len(), 1);
        let page = &document.pages[0];
        let note = page.meta_value("layout.truncated").expect("truncation recorded");
        let drawn: usize = note
            .strip_prefix("factors ")
            .and_then(|rest| rest.strip_suffix("/60"))
            .and_then(|count| count.parse().ok())
            .expect("drawn count");
        assert!(drawn > 0 && drawn < 60);
        assert_eq!(page.texts().filter(|t| *t == "*").count(), drawn);

        let short = HealthScore {
            factors: vec!["ghosting".into()],
            ..score
        };
        let mut canvas = Canvas::new(Size::a4());
        health(&mut canvas, &ctx, &short, "Vital Signs", "Health");
        assert_eq!(canvas.finish().pages[0].meta_value("layout.truncated"), None);
    }
}
