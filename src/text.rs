//! Text metrics for the base-14 Helvetica family and greedy word wrapping.
//!
//! Widths come from the Adobe AFM tables, so measurement needs no font files
//! and agrees with what a PDF viewer renders for the standard fonts.

use crate::types::Pt;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontFace {
    Regular,
    Bold,
    Oblique,
}

impl FontFace {
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
            FontFace::Oblique => "Helvetica-Oblique",
        }
    }

    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
            FontFace::Oblique => "F3",
        }
    }

    pub const ALL: [FontFace; 3] = [FontFace::Regular, FontFace::Bold, FontFace::Oblique];
}

const MISSING_WIDTH: u16 = 556;

// Advance widths for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

// WinAnsi 0x80..=0xFF. Unassigned codes carry the bullet width.
#[rustfmt::skip]
const HELVETICA_HIGH_WIDTHS: [u16; 128] = [
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_HIGH_WIDTHS: [u16; 128] = [
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// The WinAnsi code for `ch`, or `None` when the base-14 fonts cannot show it.
pub(crate) fn winansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{0000}'..='\u{007F}' | '\u{00A0}'..='\u{00FF}' => ch as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Characters outside WinAnsi are written as `?`, so they measure as one.
fn char_units(face: FontFace, ch: char) -> u16 {
    let (low, high) = match face {
        FontFace::Bold => (&HELVETICA_BOLD_WIDTHS, &HELVETICA_BOLD_HIGH_WIDTHS),
        FontFace::Regular | FontFace::Oblique => (&HELVETICA_WIDTHS, &HELVETICA_HIGH_WIDTHS),
    };
    match winansi_byte(ch).unwrap_or(b'?') {
        code @ 32..=126 => low[(code - 32) as usize],
        code @ 0x80..=0xFF => high[(code - 0x80) as usize],
        _ => MISSING_WIDTH,
    }
}

fn text_units(face: FontFace, text: &str) -> u64 {
    text.chars().map(|ch| char_units(face, ch) as u64).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: Pt,
}

impl TextStyle {
    pub fn new(face: FontFace, size: f32) -> Self {
        Self {
            face,
            size: Pt::from_f32(size),
        }
    }

    pub fn regular(size: f32) -> Self {
        Self::new(FontFace::Regular, size)
    }

    pub fn bold(size: f32) -> Self {
        Self::new(FontFace::Bold, size)
    }

    pub fn oblique(size: f32) -> Self {
        Self::new(FontFace::Oblique, size)
    }

    pub fn measure(&self, text: &str) -> Pt {
        measure(self.face, self.size, text)
    }

    pub fn line_height(&self) -> Pt {
        line_height(self.size)
    }

    pub fn wrap(&self, text: &str, max_width: Pt) -> Vec<String> {
        wrap(text, self.face, self.size, max_width)
    }

    /// Height of `text` wrapped to `max_width`: line count times line height.
    pub fn block_height(&self, text: &str, max_width: Pt) -> Pt {
        self.line_height() * self.wrap(text, max_width).len() as i32
    }
}

pub fn measure(face: FontFace, size: Pt, text: &str) -> Pt {
    Pt::from_font_units(text_units(face, text), size)
}

pub fn line_height(size: Pt) -> Pt {
    size.mul_ratio(13, 10)
}

/// Greedy word wrap.
///
/// Every returned line measures at most `max_width`, except a line holding a
/// single word that is wider on its own; such a word is never split.
pub fn wrap(text: &str, face: FontFace, size: Pt, max_width: Pt) -> Vec<String> {
    let space_units = char_units(face, ' ') as u64;
    let mut word_units: HashMap<&str, u64> = HashMap::new();
    let mut lines = Vec::new();

    for segment in text.split('\n') {
        let mut current = String::new();
        let mut current_units = 0u64;
        for word in segment.split_whitespace() {
            let units = *word_units
                .entry(word)
                .or_insert_with(|| text_units(face, word));
            if current.is_empty() {
                current.push_str(word);
                current_units = units;
                continue;
            }
            let tentative = current_units + space_units + units;
            if Pt::from_font_units(tentative, size) <= max_width {
                current.push(' ');
                current.push_str(word);
                current_units = tentative;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_units = units;
            }
        }
        lines.push(current);
    }

    // A trailing newline shouldn't produce a dangling blank line.
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Keeps at most `max_lines`, marking the cut with an ellipsis that still fits
/// `max_width`.
pub fn clamp_lines(mut lines: Vec<String>, max_lines: usize, style: &TextStyle, max_width: Pt) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        loop {
            let candidate = format!("{}...", last.trim_end());
            if style.measure(&candidate) <= max_width || last.is_empty() {
                *last = candidate;
                break;
            }
            last.pop();
        }
    }
    lines
}

/// Normalises whitespace and typographic punctuation, and drops control
/// characters and emoji. Letters from any script are kept; the PDF writer
/// shows what WinAnsi cannot encode as `?`.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push('*'),
            '\u{00A0}' | '\u{2009}' | '\u{202F}' => out.push(' '),
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            c if c.is_control() || is_pictographic(c) => {}
            c => out.push(c),
        }
    }
    out
}

fn is_pictographic(ch: char) -> bool {
    matches!(
        ch as u32,
        0x200D
            | 0x20E3
            | 0x231A..=0x23FF
            | 0x2600..=0x27BF
            | 0x2B00..=0x2BFF
            | 0xE000..=0xF8FF
            | 0xFE00..=0xFE0F
            | 0x1F000..=0x1FAFF
            | 0xE0000..=0xE007F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle::regular(10.0)
    }

    #[test]
    fn measures_with_afm_widths() {
        // "Hi" = H(722) + i(222) = 944 units -> 9.44pt at 10pt.
        assert_eq!(style().measure("Hi"), Pt::from_milli_i64(9440));
        assert_eq!(TextStyle::bold(10.0).measure("Hi"), Pt::from_milli_i64(10000));
        assert_eq!(style().measure(""), Pt::ZERO);
    }

    #[test]
    fn wrapped_lines_respect_the_budget() {
        let text = "the quick brown fox jumps over the lazy dog and then \
                    keeps running through several more clauses of filler text";
        for width in [40.0, 75.0, 120.0, 200.0, 333.3] {
            let max = Pt::from_f32(width);
            for line in style().wrap(text, max) {
                let single_token = !line.contains(' ');
                assert!(style().measure(&line) <= max || single_token, "{line}");
            }
        }
    }

    #[test]
    fn wrap_preserves_every_word_in_order() {
        let text = "one two three four five six seven eight nine ten";
        let lines = style().wrap(text, Pt::from_i32(60));
        let joined = lines.join(" ");
        assert_eq!(joined, text);
        assert!(lines.len() > 1);
    }

    #[test]
    fn oversized_token_sits_alone() {
        let lines = style().wrap("a supercalifragilisticexpialidocious b", Pt::from_i32(30));
        assert_eq!(lines, vec!["a", "supercalifragilisticexpialidocious", "b"]);
    }

    #[test]
    fn explicit_newlines_start_new_lines() {
        let lines = style().wrap("first\n\nsecond\n", Pt::from_i32(500));
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        assert_eq!(style().wrap("", Pt::from_i32(100)), vec![String::new()]);
    }

    #[test]
    fn clamp_adds_ellipsis_within_width() {
        let s = style();
        let max = Pt::from_i32(80);
        let lines = s.wrap("alpha beta gamma delta epsilon zeta eta theta iota kappa", max);
        let clamped = clamp_lines(lines, 2, &s, max);
        assert_eq!(clamped.len(), 2);
        assert!(clamped[1].ends_with("..."));
        assert!(s.measure(&clamped[1]) <= max);
    }

    #[test]
    fn sanitize_maps_typography_and_drops_emoji() {
        assert_eq!(
            sanitize_text("It\u{2019}s \u{201C}fine\u{201D} \u{2014} really\u{2026} \u{1F602}"),
            "It's \"fine\" - really... "
        );
        assert_eq!(sanitize_text("caf\u{00E9}"), "caf\u{00E9}");
        assert_eq!(sanitize_text("thumbs \u{1F44D}\u{1F3FD}"), "thumbs ");
    }

    #[test]
    fn sanitize_keeps_letters_from_every_script() {
        assert_eq!(sanitize_text("\u{0141}ukasz"), "\u{0141}ukasz");
        assert_eq!(sanitize_text("\u{0418}\u{0432}\u{0430}\u{043D}"), "\u{0418}\u{0432}\u{0430}\u{043D}");
        assert_eq!(sanitize_text("a\u{0007}b\tc"), "ab c");
    }

    #[test]
    fn measures_latin1_and_winansi_extras() {
        // AE = 1000, e-acute = 556, sharp s = 611.
        assert_eq!(style().measure("\u{00C6}"), Pt::from_milli_i64(10000));
        assert_eq!(style().measure("\u{00E9}"), Pt::from_milli_i64(5560));
        assert_eq!(style().measure("\u{00DF}"), Pt::from_milli_i64(6110));
        assert_eq!(TextStyle::bold(10.0).measure("\u{00F6}"), Pt::from_milli_i64(6110));
        assert_eq!(style().measure("\u{20AC}"), Pt::from_milli_i64(5560));
        assert_eq!(style().measure("\u{0152}"), Pt::from_milli_i64(10000));
        assert_eq!(style().measure("\u{2014}"), Pt::from_milli_i64(10000));
        let accented = "Ren\u{00E9}e \u{00E0} Z\u{00FC}rich";
        assert_eq!(style().measure(accented), style().measure("Renee a Zurich"));
        assert!(style().measure("\u{00C6}\u{00C6}") > style().measure("AA"));
    }

    #[test]
    fn unencodable_characters_measure_as_the_substitute() {
        for face in FontFace::ALL {
            let s = TextStyle::new(face, 12.0);
            assert_eq!(s.measure("\u{0141}ukasz"), s.measure("?ukasz"));
            assert_eq!(s.measure("\u{0418}\u{0432}"), s.measure("??"));
        }
        assert_eq!(winansi_byte('\u{0141}'), None);
        assert_eq!(winansi_byte('\u{0161}'), Some(0x9A));
    }

    #[test]
    fn wraps_non_latin_text_within_the_budget() {
        let text = "\u{041F}\u{0440}\u{0438}\u{0432}\u{0435}\u{0442} \u{043C}\u{0438}\u{0440} \u{0141}\u{00F3}d\u{017A} \u{017C}\u{00F3}\u{0142}w \u{00E9}t\u{00E9} na\u{00EF}ve";
        let max = Pt::from_i32(60);
        let lines = style().wrap(text, max);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        for line in &lines {
            assert!(style().measure(line) <= max || !line.contains(' '), "{line}");
        }
    }
}
