//! The stand-up roast deck.

use super::BuildContext;
use super::common::{
    begin_page, card, centered, centered_paragraph, decoration, draw_line, draw_lines, end_page, fit,
    footer, heading, icon_style, meter, paragraph,
};
use super::shared;
use crate::canvas::Canvas;
use crate::flow::{FlowItem, FlowRenderer, PageContext, paginate};
use crate::model::{PersonalityProfile, RoastScript};
use crate::shapes::{Icon, IconStyle, Paint, draw_icon, polygon, rounded_rect, translucent};
use crate::text::{TextStyle, clamp_lines};
use crate::types::{Point, Pt, Rect};

const FLOW_HEADER: i32 = 56;
const CARD_PAD: i32 = 14;
const ICON_GUTTER: i32 = 34;

/// One bit of the set: the opener or a single joke of an act.
#[derive(Debug, Clone, PartialEq)]
pub struct RoastLine {
    pub section: String,
    pub act_number: usize,
    pub act_title: String,
    pub target: String,
    pub text: String,
}

impl FlowItem for RoastLine {
    fn section_key(&self) -> &str {
        &self.section
    }
}

/// Flattens the script into flow items; each act is its own section.
pub fn script_lines(script: &RoastScript, chat_title: &str) -> Vec<RoastLine> {
    let opener = if script.opener.is_empty() {
        format!("Good evening! Tonight we roast the legends of {chat_title}. Nobody leaves unscathed.")
    } else {
        script.opener.clone()
    };
    let mut lines = vec![RoastLine {
        section: "opener".to_string(),
        act_number: 0,
        act_title: "Opening".to_string(),
        target: String::new(),
        text: opener,
    }];
    for (index, act) in script.acts.iter().enumerate() {
        for joke in &act.jokes {
            lines.push(RoastLine {
                section: format!("act-{}", index + 1),
                act_number: index + 1,
                act_title: act.title.clone(),
                target: act.target.clone(),
                text: joke.clone(),
            });
        }
    }
    lines
}

pub fn cover(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let size = ctx.page_size;
    let style = icon_style(ctx);
    let centre_x = size.width / 2;

    let drape = Rect::new(Pt::ZERO, Pt::ZERO, size.width, Pt::from_i32(170));
    if !decoration(canvas, ctx, "curtains", drape) {
        let scale = size.width.to_f32() / 100.0;
        let curtain_style = IconStyle {
            primary: ctx.palette.accent_alt,
            secondary: ctx.palette.card_alt,
            detail: ctx.palette.accent,
            backdrop: ctx.palette.background_top,
        };
        // Drapes frame the stage art drawn next.
        draw_icon(canvas, Icon::Curtain, Point { x: Pt::ZERO, y: Pt::ZERO }, scale, &curtain_style);
    }

    let art = Rect::new(content.x + Pt::from_i32(40), Pt::from_i32(190), content.width - Pt::from_i32(80), Pt::from_i32(260));
    match ctx.assets.get("cover").filter(|_| canvas.has_image("cover")) {
        Some(image) => {
            let (w, h) = fit(image.width, image.height, art.width.to_f32(), art.height.to_f32());
            let x = art.x + Pt::from_f32((art.width.to_f32() - w) / 2.0);
            canvas.draw_image(x, art.y, Pt::from_f32(w), Pt::from_f32(h), "cover");
        }
        None => {
            let side = art.height.to_f32();
            let origin = Point {
                x: centre_x - Pt::from_f32(side / 2.0),
                y: art.y,
            };
            draw_icon(canvas, Icon::Stage, origin, side / 100.0, &style);
            draw_icon(
                canvas,
                Icon::Microphone,
                Point {
                    x: centre_x - Pt::from_i32(40),
                    y: art.y + Pt::from_i32(60),
                },
                0.8,
                &style,
            );
        }
    }

    let title = ctx
        .bundle
        .roast
        .as_ref()
        .map(|r| r.title.as_str())
        .unwrap_or("The Roast");
    let mut y = art.bottom() + Pt::from_i32(30);
    draw_line(canvas, TextStyle::bold(10.0), ctx.palette.accent, content.x, y, "LIVE FROM THE GROUP CHAT");
    y += Pt::from_i32(18);
    y = paragraph(canvas, TextStyle::bold(34.0), ctx.palette.ink, (content.x, y, content.width), title, 2);
    y += Pt::from_i32(6);
    y = paragraph(
        canvas,
        TextStyle::regular(16.0),
        ctx.palette.muted,
        (content.x, y, content.width),
        &format!("A roast of {}", ctx.bundle.meta.title),
        2,
    );
    y += Pt::from_i32(14);
    let starring = starring_line(&ctx.bundle.meta.participants);
    y = paragraph(canvas, TextStyle::oblique(12.0), ctx.palette.ink, (content.x, y, content.width), &starring, 3);
    let mut facts = vec![format!("{} messages of evidence", ctx.bundle.meta.message_count)];
    if let Some(range) = &ctx.bundle.meta.date_range {
        facts.push(range.clone());
    }
    draw_line(
        canvas,
        TextStyle::regular(10.0),
        ctx.palette.muted,
        content.x,
        y + Pt::from_i32(8),
        &facts.join("  |  "),
    );
    end_page(canvas, ctx, "");
}

fn starring_line(participants: &[String]) -> String {
    match participants {
        [] => "Starring nobody in particular".to_string(),
        [only] => format!("Starring {only}"),
        [init @ .., last] => format!("Starring {} and {}", init.join(", "), last),
    }
}

pub fn roster(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    shared::roster(canvas, ctx, "Tonight's Lineup", "The Roastees");
}

struct ActRenderer<'a, 'b> {
    ctx: &'a BuildContext<'b>,
    script_title: String,
    heading: TextStyle,
    body: TextStyle,
}

impl ActRenderer<'_, '_> {
    fn text_width(&self) -> Pt {
        self.ctx.content_rect().width - Pt::from_i32(2 * CARD_PAD + ICON_GUTTER)
    }

    fn target_line(line: &RoastLine) -> String {
        if line.target.is_empty() {
            String::new()
        } else {
            format!("Roasting: {}", line.target)
        }
    }
}

impl FlowRenderer<RoastLine> for ActRenderer<'_, '_> {
    fn measure_divider(&self, item: &RoastLine) -> Pt {
        let width = self.ctx.content_rect().width;
        let mut height = Pt::from_i32(18) + self.heading.block_height(&item.act_title, width);
        if !item.target.is_empty() {
            height += Pt::from_i32(16);
        }
        height + Pt::from_i32(14)
    }

    fn measure_item(&self, item: &RoastLine) -> Pt {
        self.body.block_height(&item.text, self.text_width()) + Pt::from_i32(2 * CARD_PAD)
    }

    fn begin_page(&mut self, canvas: &mut Canvas, _page: &PageContext) {
        begin_page(canvas, self.ctx);
        let content = self.ctx.content_rect();
        draw_line(canvas, TextStyle::bold(9.0), self.ctx.palette.accent, content.x, content.y, "THE SET");
        let title = TextStyle::bold(18.0);
        let lines = clamp_lines(title.wrap(&self.script_title, content.width), 1, &title, content.width);
        if let Some(line) = lines.first() {
            draw_line(canvas, title, self.ctx.palette.ink, content.x, content.y + Pt::from_i32(14), line);
        }
    }

    fn draw_divider(&mut self, canvas: &mut Canvas, item: &RoastLine, y: Pt, _height: Pt) {
        let content = self.ctx.content_rect();
        let style = icon_style(self.ctx);
        draw_icon(canvas, Icon::Star, Point { x: content.x, y }, 0.14, &style);
        draw_line(
            canvas,
            TextStyle::bold(9.0),
            self.ctx.palette.accent,
            content.x + Pt::from_i32(20),
            y + Pt::from_i32(2),
            &format!("ACT {}", item.act_number),
        );
        let mut cursor = y + Pt::from_i32(18);
        cursor = paragraph(
            canvas,
            self.heading,
            self.ctx.palette.ink,
            (content.x, cursor, content.width),
            &item.act_title,
            usize::MAX,
        );
        let target = Self::target_line(item);
        if !target.is_empty() {
            draw_line(canvas, TextStyle::oblique(11.0), self.ctx.palette.muted, content.x, cursor + Pt::from_i32(2), &target);
        }
    }

    fn draw_item(&mut self, canvas: &mut Canvas, item: &RoastLine, y: Pt, height: Pt) {
        let content = self.ctx.content_rect();
        let fill = if item.act_number % 2 == 0 {
            self.ctx.palette.card
        } else {
            self.ctx.palette.card_alt
        };
        card(canvas, self.ctx, Rect::new(content.x, y, content.width, height), fill);
        let icon = if item.act_number == 0 {
            Icon::Microphone
        } else {
            Icon::Flame
        };
        let pad = Pt::from_i32(CARD_PAD);
        draw_icon(canvas, icon, Point { x: content.x + pad, y: y + pad }, 0.22, &icon_style(self.ctx));
        let x = content.x + pad + Pt::from_i32(ICON_GUTTER);
        let lines = self.body.wrap(&item.text, self.text_width());
        draw_lines(canvas, self.body, self.ctx.palette.ink, x, y + pad, &lines);
    }

    fn finish_page(&mut self, canvas: &mut Canvas, page: &PageContext) {
        footer(canvas, self.ctx, &format!("The Set {} / {}", page.section_page, page.section_pages));
    }
}

pub fn acts(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    let Some(script) = ctx.bundle.roast.as_ref() else {
        return;
    };
    let lines = script_lines(script, &ctx.bundle.meta.title);
    let config = ctx.flow_config(Pt::from_i32(FLOW_HEADER), Pt::from_i32(10));
    let mut renderer = ActRenderer {
        ctx,
        script_title: script.title.clone(),
        heading: TextStyle::bold(18.0),
        body: TextStyle::regular(12.0),
    };
    let plan = paginate(canvas, &lines, &config, &mut renderer);
    ctx.record_plan(&plan);
}

impl FlowItem for PersonalityProfile {
    fn section_key(&self) -> &str {
        "profiles"
    }
}

struct ProfileRenderer<'a, 'b> {
    ctx: &'a BuildContext<'b>,
}

const PROFILE_SUMMARY_LINES: usize = 6;

impl ProfileRenderer<'_, '_> {
    fn inner_width(&self) -> Pt {
        self.ctx.content_rect().width - Pt::from_i32(2 * CARD_PAD)
    }

    fn summary_lines(&self, profile: &PersonalityProfile) -> Vec<String> {
        let style = TextStyle::regular(11.0);
        let width = self.inner_width();
        if profile.summary.is_empty() {
            return Vec::new();
        }
        clamp_lines(style.wrap(&profile.summary, width), PROFILE_SUMMARY_LINES, &style, width)
    }

    fn traits_line(profile: &PersonalityProfile) -> String {
        profile.traits.join("  *  ")
    }
}

impl FlowRenderer<PersonalityProfile> for ProfileRenderer<'_, '_> {
    fn measure_divider(&self, _item: &PersonalityProfile) -> Pt {
        Pt::ZERO
    }

    fn measure_item(&self, item: &PersonalityProfile) -> Pt {
        let width = self.inner_width();
        let mut height = TextStyle::bold(15.0).line_height() + TextStyle::bold(11.0).line_height();
        if !item.traits.is_empty() {
            height += TextStyle::oblique(10.0).block_height(&Self::traits_line(item), width);
        }
        height += TextStyle::regular(11.0).line_height() * self.summary_lines(item).len() as i32;
        height + Pt::from_i32(2 * CARD_PAD + 8)
    }

    fn begin_page(&mut self, canvas: &mut Canvas, _page: &PageContext) {
        begin_page(canvas, self.ctx);
        heading(canvas, self.ctx, "Psych Evaluations", "Personality");
    }

    fn draw_divider(&mut self, _canvas: &mut Canvas, _item: &PersonalityProfile, _y: Pt, _height: Pt) {}

    fn draw_item(&mut self, canvas: &mut Canvas, item: &PersonalityProfile, y: Pt, height: Pt) {
        let content = self.ctx.content_rect();
        card(canvas, self.ctx, Rect::new(content.x, y, content.width, height), self.ctx.palette.card);
        let pad = Pt::from_i32(CARD_PAD);
        let x = content.x + pad;
        let width = self.inner_width();
        let mut cursor = y + pad;
        draw_line(canvas, TextStyle::bold(15.0), self.ctx.palette.ink, x, cursor, &item.name);
        cursor += TextStyle::bold(15.0).line_height();
        draw_line(canvas, TextStyle::bold(11.0), self.ctx.palette.accent, x, cursor, &item.archetype);
        cursor += TextStyle::bold(11.0).line_height();
        if !item.traits.is_empty() {
            cursor = paragraph(
                canvas,
                TextStyle::oblique(10.0),
                self.ctx.palette.muted,
                (x, cursor, width),
                &Self::traits_line(item),
                usize::MAX,
            );
        }
        let lines = self.summary_lines(item);
        draw_lines(canvas, TextStyle::regular(11.0), self.ctx.palette.ink, x, cursor + Pt::from_i32(4), &lines);
    }

    fn finish_page(&mut self, canvas: &mut Canvas, page: &PageContext) {
        let label = if page.section_pages > 1 {
            format!("{} / {}", page.section_page, page.section_pages)
        } else {
            String::new()
        };
        footer(canvas, self.ctx, &label);
    }
}

pub fn personality(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    let Some(profiles) = ctx.bundle.personality.as_ref().filter(|p| !p.is_empty()) else {
        return;
    };
    // Heading height matches what `heading` draws for a one-line title.
    let config = ctx.flow_config(Pt::from_i32(84), Pt::from_i32(14));
    let mut renderer = ProfileRenderer { ctx };
    let plan = paginate(canvas, profiles, &config, &mut renderer);
    ctx.record_plan(&plan);
}

pub fn health(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    if let Some(score) = ctx.bundle.health.as_ref() {
        shared::health(canvas, ctx, score, "Relationship Damage Report", "Health Check");
    }
}

/// Whole stars out of five for a 0..=100 score.
pub fn star_count(score: f64) -> usize {
    if !score.is_finite() {
        return 0;
    }
    (score.clamp(0.0, 100.0) / 20.0).round() as usize
}

pub fn viral(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    let Some(viral) = ctx.bundle.viral.as_ref() else {
        return;
    };
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let mut y = heading(canvas, ctx, "Going Viral", "Virality Index");
    let lit = icon_style(ctx);
    let unlit = IconStyle {
        primary: ctx.palette.card_alt,
        ..lit
    };
    let star = 52.0f32;
    let gap = 12.0f32;
    let row_width = star * 5.0 + gap * 4.0;
    let start_x = content.x + content.width / 2 - Pt::from_f32(row_width / 2.0);
    let filled = star_count(viral.overall);
    for i in 0..5 {
        let origin = Point {
            x: start_x + Pt::from_f32(i as f32 * (star + gap)),
            y,
        };
        draw_icon(canvas, Icon::Star, origin, star / 100.0, if i < filled { &lit } else { &unlit });
    }
    y += Pt::from_f32(star + 14.0);
    centered(
        canvas,
        TextStyle::bold(22.0),
        ctx.palette.ink,
        content.x + content.width / 2,
        y,
        &format!("{:.0}/100 chance of going viral", viral.overall),
    );
    y += Pt::from_i32(44);

    let name_style = TextStyle::bold(11.0);
    let label_width = Pt::from_i32(130);
    let value_width = Pt::from_i32(40);
    let bar_height = Pt::from_i32(12);
    for (name, score) in &viral.per_participant {
        if y + Pt::from_i32(28) > content.bottom() - Pt::from_i32(140) {
            break;
        }
        let lines = clamp_lines(name_style.wrap(name, label_width), 1, &name_style, label_width);
        if let Some(line) = lines.first() {
            draw_line(canvas, name_style, ctx.palette.ink, content.x, y, line);
        }
        let bar = Rect::new(
            content.x + label_width,
            y + Pt::from_i32(1),
            content.width - label_width - value_width,
            bar_height,
        );
        meter(canvas, ctx, bar, *score, ctx.palette.accent);
        let value = format!("{score:.0}");
        let style = TextStyle::regular(11.0);
        draw_line(canvas, style, ctx.palette.muted, content.right() - style.measure(&value), y, &value);
        y += Pt::from_i32(28);
    }

    if !viral.quote.is_empty() {
        let quote_style = TextStyle::oblique(13.0);
        let inner = content.width - Pt::from_i32(2 * CARD_PAD + 56);
        let lines = clamp_lines(quote_style.wrap(&format!("\"{}\"", viral.quote), inner), 4, &quote_style, inner);
        let box_height = quote_style.line_height() * lines.len() as i32 + Pt::from_i32(2 * CARD_PAD);
        let top = (y + Pt::from_i32(16)).min(content.bottom() - box_height);
        let bubble = Rect::new(content.x, top, content.width, box_height);
        translucent(canvas, ctx.palette.accent, 0.18, ctx.palette.background_bottom, |canvas| {
            rounded_rect(canvas, bubble, 14.0, Paint::Fill);
        });
        draw_icon(
            canvas,
            Icon::SpeechBubble,
            Point {
                x: content.x + Pt::from_i32(CARD_PAD),
                y: top + Pt::from_i32(CARD_PAD),
            },
            0.4,
            &lit,
        );
        draw_lines(
            canvas,
            quote_style,
            ctx.palette.ink,
            content.x + Pt::from_i32(CARD_PAD + 56),
            top + Pt::from_i32(CARD_PAD),
            &lines,
        );
    }
    end_page(canvas, ctx, "");
}

/// Whoever sent the most messages, else the first participant.
fn headliner(ctx: &BuildContext<'_>) -> Option<String> {
    ctx.bundle
        .metrics
        .iter()
        .max_by(|a, b| a.messages.cmp(&b.messages).then_with(|| b.name.cmp(&a.name)))
        .map(|m| m.name.clone())
        .or_else(|| ctx.bundle.meta.participants.first().cloned())
}

pub fn finale(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    let Some(script) = ctx.bundle.roast.as_ref() else {
        return;
    };
    begin_page(canvas, ctx);
    let content = ctx.content_rect();
    let centre_x = content.x + content.width / 2;
    let style = icon_style(ctx);

    let beam_top = content.y;
    let beam_bottom = content.bottom() - Pt::from_i32(120);
    translucent(canvas, ctx.palette.ink, 0.12, ctx.palette.background_top, |canvas| {
        let top_left = Point {
            x: centre_x - Pt::from_i32(30),
            y: beam_top,
        };
        let top_right = Point {
            x: centre_x + Pt::from_i32(30),
            y: beam_top,
        };
        let bottom_right = Point {
            x: centre_x + Pt::from_i32(200),
            y: beam_bottom,
        };
        let bottom_left = Point {
            x: centre_x - Pt::from_i32(200),
            y: beam_bottom,
        };
        polygon(canvas, &[top_left, top_right, bottom_right, bottom_left], Paint::Fill);
    });

    let mut y = content.y + Pt::from_i32(40);
    draw_line(canvas, TextStyle::bold(10.0), ctx.palette.accent, content.x, content.y, "CURTAIN CALL");
    if let Some(name) = headliner(ctx) {
        draw_icon(canvas, Icon::Crown, Point { x: centre_x - Pt::from_i32(45), y }, 0.9, &style);
        y += Pt::from_i32(100);
        centered(canvas, TextStyle::bold(12.0), ctx.palette.muted, centre_x, y, "Headliner of the night");
        y += Pt::from_i32(18);
        y = centered_paragraph(canvas, TextStyle::bold(26.0), ctx.palette.ink, centre_x, y, content.width, &name);
        y += Pt::from_i32(24);
    }
    let closer = if script.closer.is_empty() {
        "That's our show. Please tip your group chat admin.".to_string()
    } else {
        script.closer.clone()
    };
    centered_paragraph(
        canvas,
        TextStyle::oblique(15.0),
        ctx.palette.ink,
        centre_x,
        y,
        content.width - Pt::from_i32(60),
        &closer,
    );
    draw_icon(
        canvas,
        Icon::Microphone,
        Point {
            x: centre_x - Pt::from_i32(40),
            y: beam_bottom - Pt::from_i32(10),
        },
        0.8,
        &style,
    );
    end_page(canvas, ctx, "");
}

pub fn disclaimer(canvas: &mut Canvas, ctx: &BuildContext<'_>) {
    shared::disclaimer(
        canvas,
        ctx,
        &[
            "This roast was written by a machine reading your messages. It is comedy, not a character reference.",
            "Statistics are computed from the exported chat and may miss deleted messages, media and anything sent from a second phone.",
            "No friendships were harmed in the making of this report. If one was, it was probably already on thin ice.",
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoastAct;

    #[test]
    fn script_lines_open_then_follow_acts() {
        let script = RoastScript {
            title: "Roast".into(),
            opener: String::new(),
            acts: vec![
                RoastAct {
                    title: "Ana".into(),
                    target: "Ana".into(),
                    jokes: vec!["one".into(), "two".into()],
                },
                RoastAct {
                    title: "Ben".into(),
                    target: "Ben".into(),
                    jokes: vec!["three".into()],
                },
            ],
            closer: String::new(),
        };
        let lines = script_lines(&script, "Friends");
        let sections: Vec<&str> = lines.iter().map(|l| l.section_key()).collect();
        assert_eq!(sections, vec!["opener", "act-1", "act-1", "act-2"]);
        assert!(lines[0].text.contains("Friends"));
        assert_eq!(lines[3].act_number, 2);
    }

    #[test]
    fn stars_round_to_fifths() {
        assert_eq!(star_count(0.0), 0);
        assert_eq!(star_count(49.0), 2);
        assert_eq!(star_count(50.0), 3);
        assert_eq!(star_count(100.0), 5);
        assert_eq!(star_count(f64::NAN), 0);
    }

    #[test]
    fn starring_lists_everyone() {
        assert_eq!(starring_line(&[]), "Starring nobody in particular");
        assert_eq!(starring_line(&["Ana".into()]), "Starring Ana");
        assert_eq!(
            starring_line(&["Ana".into(), "Ben".into(), "Cy".into()]),
            "Starring Ana, Ben and Cy"
        );
    }
}
