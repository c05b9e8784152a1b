//! The argument-simulation transcript deck.

use super::BuildContext;
use super::common::{
    begin_page, card, centered, centered_paragraph, draw_line, draw_lines, end_page, footer, heading,
    icon_style, meter, paragraph,
};
use super::shared;
use crate::canvas::Canvas;
use crate::flow::{FlowRenderer, PageContext, paginate};
use crate::model::{ArgumentSimulation, ContentItem};
use crate::shapes::{Icon, IconStyle, Paint, draw_icon, rounded_rect, translucent};
use crate::text::{TextStyle, clamp_lines};
use crate::types::{Point, Pt, Rect};

const FLOW_HEADER: i32 = 56;
const BUBBLE_PAD: i32 = 12;
const DIVIDER_HEIGHT: i32 = 34;

/// Which edge of the page a bubble hugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleSide {
    Left,
    Right,
}

/// Right for the reference participant, left for everyone else. Alignment
/// follows identity, never turn parity.
pub fn bubble_side(reference: Option<&str>, sender: &str) -> BubbleSide {
    match reference {
        Some(name) if name == sender => BubbleSide::Right,
        _ => BubbleSide::Left,
    }
}

/// "Ana vs Ben", "Ana vs Ben vs Cy" or the single name.
pub fn versus_line(participants: &[String]) -> String {
    match participants {
        [] => "Nobody vs Nobody".to_string(),
        [only] => format!("{only} vs Themselves"),
        _ => participants.join(" vs "),
    }
}

fn phase_label(phase: &str) -> String {
    let mut chars = phase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn cover(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let centre_x = content.x + content.width / 2;
    let style = icon_style(ctx);

    let gavel = 200.0f32;
    let mut y = content.y + Pt::from_i32(60);
    translucent(canvas, ctx.palette.accent_alt, 0.2, ctx.palette.background_top, |canvas| {
        let halo = Rect::new(
            centre_x - Pt::from_f32(gavel * 0.7),
            y - Pt::from_f32(gavel * 0.2),
            Pt::from_f32(gavel * 1.4),
            Pt::from_f32(gavel * 1.4),
        );
        rounded_rect(canvas, halo, gavel * 0.7, Paint::Fill);
    });
    draw_icon(
        canvas,
        Icon::Gavel,
        Point {
            x: centre_x - Pt::from_f32(gavel / 2.0),
            y,
        },
        gavel / 100.0,
        &style,
    );
    y += Pt::from_f32(gavel + 60.0);

    let topic = ctx
        .bundle
        .argument
        .as_ref()
        .map(|a| a.topic.as_str())
        .unwrap_or("The Great Debate");
    centered(canvas, TextStyle::bold(10.0), ctx.palette.accent, centre_x, y, "IN THE MATTER OF");
    y += Pt::from_i32(20);
    y = centered_paragraph(canvas, TextStyle::bold(30.0), ctx.palette.ink, centre_x, y, content.width, topic);
    y += Pt::from_i32(14);
    y = centered_paragraph(
        canvas,
        TextStyle::oblique(16.0),
        ctx.palette.muted,
        centre_x,
        y,
        content.width,
        &versus_line(&ctx.bundle.meta.participants),
    );
    y += Pt::from_i32(18);
    centered(
        canvas,
        TextStyle::regular(10.0),
        ctx.palette.muted,
        centre_x,
        y,
        &format!("A simulated argument based on {}", ctx.bundle.meta.title),
    );
    end_page(canvas, ctx, "");
}

pub fn roster(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    shared::roster(canvas, ctx, "The Parties", "Who's Arguing");
}

struct BubbleRenderer<'a, 'b> {
    ctx: &'a BuildContext<'b>,
    topic: String,
    sender: TextStyle,
    body: TextStyle,
}

impl BubbleRenderer<'_, '_> {
    fn bubble_width(&self) -> Pt {
        self.ctx.content_rect().width.mul_ratio(7, 10)
    }

    fn text_width(&self) -> Pt {
        self.bubble_width() - Pt::from_i32(2 * BUBBLE_PAD)
    }

    fn side(&self, item: &ContentItem) -> BubbleSide {
        bubble_side(self.ctx.bundle.reference_participant(), &item.sender)
    }
}

impl FlowRenderer<ContentItem> for BubbleRenderer<'_, '_> {
    fn measure_divider(&self, _item: &ContentItem) -> Pt {
        Pt::from_i32(DIVIDER_HEIGHT)
    }

    fn measure_item(&self, item: &ContentItem) -> Pt {
        self.sender.line_height()
            + self.body.block_height(&item.text, self.text_width())
            + Pt::from_i32(2 * BUBBLE_PAD)
    }

    fn begin_page(&mut self, canvas: &mut Canvas, _page: &PageContext) {
        begin_page(canvas, self.ctx);
        let content = self.ctx.content_rect();
        draw_line(canvas, TextStyle::bold(9.0), self.ctx.palette.accent, content.x, content.y, "THE TRANSCRIPT");
        let title = TextStyle::bold(18.0);
        let lines = clamp_lines(title.wrap(&self.topic, content.width), 1, &title, content.width);
        if let Some(line) = lines.first() {
            draw_line(canvas, title, self.ctx.palette.ink, content.x, content.y + Pt::from_i32(14), line);
        }
    }

    fn draw_divider(&mut self, canvas: &mut Canvas, item: &ContentItem, y: Pt, height: Pt) {
        let content = self.ctx.content_rect();
        let label = phase_label(&item.phase);
        let style = TextStyle::bold(10.0);
        let centre_x = content.x + content.width / 2;
        let mid = y + height / 2;
        let pill_width = style.measure(&label) + Pt::from_i32(24);
        let pill = Rect::new(centre_x - pill_width / 2, mid - Pt::from_i32(10), pill_width, Pt::from_i32(20));

        canvas.set_fill_color(self.ctx.palette.muted);
        canvas.draw_rect(content.x, mid, pill.x - content.x - Pt::from_i32(8), Pt::from_i32(1));
        let right_start = pill.right() + Pt::from_i32(8);
        canvas.draw_rect(right_start, mid, content.right() - right_start, Pt::from_i32(1));
        canvas.set_fill_color(self.ctx.palette.accent_alt);
        rounded_rect(canvas, pill, 10.0, Paint::Fill);
        let text_y = mid - style.line_height() / 2;
        centered(canvas, style, self.ctx.palette.background_top, centre_x, text_y, &label);
    }

    fn draw_item(&mut self, canvas: &mut Canvas, item: &ContentItem, y: Pt, height: Pt) {
        let content = self.ctx.content_rect();
        let width = self.bubble_width();
        let side = self.side(item);
        let (x, fill, name_color) = match side {
            BubbleSide::Left => (content.x, self.ctx.palette.card, self.ctx.palette.accent_alt),
            BubbleSide::Right => (content.right() - width, self.ctx.palette.card_alt, self.ctx.palette.accent),
        };
        card(canvas, self.ctx, Rect::new(x, y, width, height), fill);
        let pad = Pt::from_i32(BUBBLE_PAD);
        let mut cursor = y + pad;
        let name = clamp_lines(self.sender.wrap(&item.sender, self.text_width()), 1, &self.sender, self.text_width());
        if let Some(name) = name.first() {
            let name_x = match side {
                BubbleSide::Left => x + pad,
                BubbleSide::Right => x + width - pad - self.sender.measure(name),
            };
            draw_line(canvas, self.sender, name_color, name_x, cursor, name);
        }
        let ordinal = format!("#{}", item.ordinal);
        let ordinal_style = TextStyle::regular(8.0);
        let ordinal_x = match side {
            BubbleSide::Left => x + width - pad - ordinal_style.measure(&ordinal),
            BubbleSide::Right => x + pad,
        };
        draw_line(canvas, ordinal_style, self.ctx.palette.muted, ordinal_x, cursor, &ordinal);
        cursor += self.sender.line_height();
        let lines = self.body.wrap(&item.text, self.text_width());
        draw_lines(canvas, self.body, self.ctx.palette.ink, x + pad, cursor, &lines);
    }

    fn finish_page(&mut self, canvas: &mut Canvas, page: &PageContext) {
        footer(canvas, self.ctx, &format!("{} / {}", page.section_page, page.section_pages));
    }
}

pub fn transcript(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    let Some(argument) = ctx.bundle.argument.as_ref() else {
        return;
    };
    let config = ctx.flow_config(Pt::from_i32(FLOW_HEADER), Pt::from_i32(10));
    let mut renderer = BubbleRenderer {
        ctx,
        topic: argument.topic.clone(),
        sender: TextStyle::bold(9.0),
        body: TextStyle::regular(11.0),
    };
    let plan = paginate(canvas, &argument.turns, &config, &mut renderer);
    ctx.record_plan(&plan);
}

/// Turns spent in each phase, in order of first appearance.
pub fn phase_counts(argument: &ArgumentSimulation) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for turn in &argument.turns {
        match counts.iter_mut().find(|(phase, _)| *phase == turn.phase) {
            Some((_, count)) => *count += 1,
            None => counts.push((turn.phase.clone(), 1)),
        }
    }
    counts
}

pub fn summary(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    let Some(argument) = ctx.bundle.argument.as_ref() else {
        return;
    };
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let style = icon_style(ctx);
    let mut y = heading(canvas, ctx, "The Verdict", "Summary");

    let badge = Rect::new(content.x, y, content.width, Pt::from_i32(86));
    card(canvas, ctx, badge, ctx.palette.card);
    draw_icon(
        canvas,
        Icon::Clock { hour: 11, minute: 58 },
        Point {
            x: badge.x + Pt::from_i32(14),
            y: badge.y + Pt::from_i32(11),
        },
        0.64,
        &style,
    );
    let text_x = badge.x + Pt::from_i32(96);
    draw_line(canvas, TextStyle::bold(9.0), ctx.palette.accent, text_x, badge.y + Pt::from_i32(16), "DOMINANT PHASE");
    draw_line(
        canvas,
        TextStyle::bold(22.0),
        ctx.palette.ink,
        text_x,
        badge.y + Pt::from_i32(30),
        &phase_label(&argument.summary.dominant_phase),
    );
    let counts = phase_counts(argument)
        .iter()
        .map(|(phase, count)| format!("{} {}", phase_label(phase), count))
        .collect::<Vec<_>>()
        .join("  |  ");
    if !counts.is_empty() {
        let small = TextStyle::regular(9.0);
        let width = badge.right() - text_x - Pt::from_i32(14);
        paragraph(canvas, small, ctx.palette.muted, (text_x, badge.y + Pt::from_i32(60), width), &counts, 1);
    }
    y = badge.bottom() + Pt::from_i32(24);

    draw_line(canvas, TextStyle::bold(13.0), ctx.palette.ink, content.x, y, "Who brought the heat");
    y += Pt::from_i32(24);
    let name_style = TextStyle::bold(11.0);
    let style_line = TextStyle::oblique(9.5);
    let label_width = Pt::from_i32(130);
    let value_width = Pt::from_i32(44);
    let contributions = &argument.summary.contributions;
    for (index, contribution) in contributions.iter().enumerate() {
        if y + Pt::from_i32(40) > content.bottom() - Pt::from_i32(120) {
            ctx.record_truncation(canvas, "contributions", index, contributions.len());
            break;
        }
        let name = clamp_lines(name_style.wrap(&contribution.name, label_width), 1, &name_style, label_width);
        if let Some(name) = name.first() {
            draw_line(canvas, name_style, ctx.palette.ink, content.x, y, name);
        }
        let fill = if index % 2 == 0 {
            ctx.palette.accent
        } else {
            ctx.palette.accent_alt
        };
        let bar = Rect::new(
            content.x + label_width,
            y + Pt::from_i32(1),
            content.width - label_width - value_width,
            Pt::from_i32(12),
        );
        meter(canvas, ctx, bar, contribution.share, fill);
        let value = format!("{:.0}%", contribution.share);
        let value_style = TextStyle::regular(11.0);
        draw_line(canvas, value_style, ctx.palette.muted, content.right() - value_style.measure(&value), y, &value);
        y += Pt::from_i32(18);
        if !contribution.style.is_empty() {
            let width = content.width - label_width;
            y = paragraph(canvas, style_line, ctx.palette.muted, (content.x + label_width, y, width), &contribution.style, 2);
        }
        y += Pt::from_i32(12);
    }

    if !argument.summary.comparison.is_empty() {
        let body = TextStyle::oblique(12.0);
        let inner = content.width - Pt::from_i32(2 * BUBBLE_PAD + 56);
        let lines = clamp_lines(body.wrap(&argument.summary.comparison, inner), 5, &body, inner);
        let box_height = (body.line_height() * lines.len() as i32 + Pt::from_i32(2 * BUBBLE_PAD)).max(Pt::from_i32(64));
        let top = (y + Pt::from_i32(12)).min(content.bottom() - box_height);
        let bubble = Rect::new(content.x, top, content.width, box_height);
        translucent(canvas, ctx.palette.accent_alt, 0.2, ctx.palette.background_bottom, |canvas| {
            rounded_rect(canvas, bubble, 14.0, Paint::Fill);
        });
        let bubble_style = IconStyle {
            primary: ctx.palette.accent_alt,
            ..style
        };
        draw_icon(
            canvas,
            Icon::SpeechBubble,
            Point {
                x: content.x + Pt::from_i32(BUBBLE_PAD),
                y: top + Pt::from_i32(BUBBLE_PAD),
            },
            0.4,
            &bubble_style,
        );
        draw_lines(
            canvas,
            body,
            ctx.palette.ink,
            content.x + Pt::from_i32(BUBBLE_PAD + 56),
            top + Pt::from_i32(BUBBLE_PAD),
            &lines,
        );
    }
    end_page(canvas, ctx, "");
}

pub fn health(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    if let Some(score) = ctx.bundle.health.as_ref() {
        shared::health(canvas, ctx, score, "Can This Be Saved?", "Relationship Health");
    }
}

pub fn disclaimer(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    shared::disclaimer(
        canvas,
        ctx,
        &[
            "This argument never happened. It was simulated from the tone and habits of your chat, and any resemblance to a real fight is your own fault.",
            "Shares and phases are estimates produced from message statistics. They are not evidence and will not hold up in any court.",
            "Please do not forward this transcript to the other party mid-argument.",
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Palette;
    use crate::model::{AnalysisBundle, ArgumentSummary, Contribution, ConversationMeta};
    use crate::types::{Margins, Size};
    use std::collections::BTreeMap;

    fn turn(sender: &str, phase: &str, ordinal: u32) -> ContentItem {
        ContentItem {
            sender: sender.into(),
            text: format!("Turn {ordinal} from {sender}, and I am not letting this go."),
            phase: phase.into(),
            ordinal,
        }
    }

    fn bundle(turns: Vec<ContentItem>) -> AnalysisBundle {
        AnalysisBundle {
            meta: ConversationMeta {
                title: "Flatmates".into(),
                participants: vec!["Ana".into(), "Ben".into()],
                message_count: 10,
                date_range: None,
            },
            argument: Some(ArgumentSimulation {
                topic: "Who took the last yoghurt".into(),
                turns,
                summary: ArgumentSummary::default(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn alignment_follows_identity() {
        assert_eq!(bubble_side(Some("Ana"), "Ana"), BubbleSide::Right);
        assert_eq!(bubble_side(Some("Ana"), "Ben"), BubbleSide::Left);
        assert_eq!(bubble_side(None, "Ana"), BubbleSide::Left);
    }

    #[test]
    fn versus_line_names_everyone() {
        assert_eq!(versus_line(&["Ana".into(), "Ben".into()]), "Ana vs Ben");
        assert_eq!(versus_line(&["Ana".into()]), "Ana vs Themselves");
        assert_eq!(versus_line(&[]), "Nobody vs Nobody");
    }

    #[test]
    fn phases_are_counted_in_order() {
        let turns = vec![
            turn("Ana", "opening", 1),
            turn("Ben", "escalation", 2),
            turn("Ana", "escalation", 3),
            turn("Ben", "opening", 4),
        ];
        let counts = phase_counts(&ArgumentSimulation {
            topic: String::new(),
            turns,
            summary: ArgumentSummary::default(),
        });
        assert_eq!(counts, vec![("opening".to_string(), 2), ("escalation".to_string(), 2)]);
        assert_eq!(phase_label("escalation"), "Escalation");
        assert_eq!(phase_label(""), "");
    }

    #[test]
    fn transcript_marks_every_phase_change() {
        let mut turns = Vec::new();
        for i in 1..=30 {
            let phase = if i <= 10 {
                "opening"
            } else if i <= 20 {
                "escalation"
            } else {
                "resolution"
            };
            let sender = if i % 2 == 1 { "Ana" } else { "Ben" };
            turns.push(turn(sender, phase, i));
        }
        let bundle = bundle(turns);
        let assets = BTreeMap::new();
        let ctx = BuildContext {
            bundle: &bundle,
            assets: &assets,
            palette: Palette::COURTROOM,
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            section: "transcript",
            debug: None,
        };
        let mut canvas = Canvas::new(Size::a4());
        transcript(&mut canvas, &ctx);
        let document = canvas.finish();
        assert!(document.pages.len() > 1);

        let dividers: Vec<String> = document
            .pages
            .iter()
            .flat_map(|page| page.commands.iter())
            .filter_map(|cmd| match cmd {
                crate::canvas::Command::Meta { key, value } if key == "flow.divider" => Some(value.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(dividers, vec!["10", "20"]);

        let total = document.pages.len();
        for page in &document.pages {
            assert_eq!(page.meta_value("section"), Some("transcript"));
            assert!(page.texts().any(|t| t == "THE TRANSCRIPT"));
            assert!(page.texts().any(|t| t.ends_with(&format!("/ {total}"))));
        }
    }

    #[test]
    fn non_latin_senders_keep_their_own_sides() {
        let ivan = "\u{0418}\u{0432}\u{0430}\u{043D}";
        let lukasz = "\u{0141}ukasz";
        let turns = (1..=12)
            .map(|i| turn(if i % 2 == 1 { ivan } else { lukasz }, "\u{0441}\u{043F}\u{043E}\u{0440}", i))
            .collect();
        let mut raw = bundle(turns);
        raw.meta.participants = vec![ivan.into(), lukasz.into()];
        let bundle = raw.sanitize();
        assert_eq!(bundle.argument.as_ref().map(|a| a.turns.len()), Some(12));
        let reference = bundle.reference_participant();
        assert_eq!(bubble_side(reference, ivan), BubbleSide::Right);
        assert_eq!(bubble_side(reference, lukasz), BubbleSide::Left);

        let assets = BTreeMap::new();
        let ctx = BuildContext {
            bundle: &bundle,
            assets: &assets,
            palette: Palette::COURTROOM,
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            section: "transcript",
            debug: None,
        };
        let mut canvas = Canvas::new(Size::a4());
        transcript(&mut canvas, &ctx);
        let document = canvas.finish();
        let content = ctx.content_rect();
        let centre = content.x + content.width / 2;

        let mut items = 0;
        let (mut right, mut left) = (0, 0);
        for cmd in document.pages.iter().flat_map(|page| page.commands.iter()) {
            match cmd {
                crate::canvas::Command::Meta { key, .. } if key == "flow.item" => items += 1,
                crate::canvas::Command::DrawString { x, text, .. } if text == ivan => {
                    assert!(*x > centre);
                    right += 1;
                }
                crate::canvas::Command::DrawString { x, text, .. } if text == lukasz => {
                    assert!(*x < centre);
                    left += 1;
                }
                _ => {}
            }
        }
        assert_eq!(items, 12);
        assert_eq!((right, left), (6, 6));
    }

    #[test]
    fn summary_notes_contributions_it_cannot_fit() {
        let mut crowded = bundle(vec![turn("Ana", "opening", 1)]);
        if let Some(argument) = crowded.argument.as_mut() {
            argument.summary.contributions = (1..=30)
                .map(|i| Contribution {
                    name: format!("Person {i}"),
                    share: 3.0,
                    style: String::new(),
                })
                .collect();
        }
        let assets = BTreeMap::new();
        let ctx = BuildContext {
            bundle: &crowded,
            assets: &assets,
            palette: Palette::COURTROOM,
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            section: "summary",
            debug: None,
        };
        let mut canvas = Canvas::new(Size::a4());
        summary(&mut canvas, &ctx);
        let document = canvas.finish();
        assert_eq!(document.pages.len(), 1);
        let page = &document.pages[0];
        let note = page.meta_value("layout.truncated").expect("truncation recorded");
        let drawn: usize = note
            .strip_prefix("contributions ")
            .and_then(|rest| rest.strip_suffix("/30"))
            .and_then(|count| count.parse().ok())
            .expect("drawn count");
        assert!(drawn > 0 && drawn < 30);
        assert_eq!(page.texts().filter(|t| t.starts_with("Person ")).count(), drawn);

        let quiet = bundle(vec![turn("Ana", "opening", 1)]);
        let ctx = BuildContext { bundle: &quiet, ..ctx };
        let mut canvas = Canvas::new(Size::a4());
        summary(&mut canvas, &ctx);
        assert_eq!(canvas.finish().pages[0].meta_value("layout.truncated"), None);
    }

    #[test]
    fn builders_skip_without_argument() {
        let bundle = AnalysisBundle::default();
        let assets = BTreeMap::new();
        let ctx = BuildContext {
            bundle: &bundle,
            assets: &assets,
            palette: Palette::COURTROOM,
            page_size: Size::a4(),
            margins: Margins::all(40.0),
            section: "summary",
            debug: None,
        };
        let mut canvas = Canvas::new(Size::a4());
        transcript(&mut canvas, &ctx);
        summary(&mut canvas, &ctx);
        assert_eq!(canvas.page_count(), 0);
    }
}
