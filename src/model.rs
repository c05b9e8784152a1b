//! Input records produced upstream (chat statistics and AI passes).
//!
//! Everything here is read-only during generation. AI-produced sections are
//! optional and frequently imperfect, so [`AnalysisBundle::sanitize`] turns
//! whatever arrived into something every page builder can draw.

use crate::error::DeckError;
use crate::text::sanitize_text;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNTITLED: &str = "Untitled chat";
pub const ANONYMOUS: &str = "Anonymous";
/// Stands in for a turn made only of emoji or other undrawable marks.
pub const REACTION: &str = "(reaction)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationMeta {
    pub title: String,
    pub participants: Vec<String>,
    pub message_count: u64,
    /// Free-form span label, e.g. "Jan 2023 - Mar 2024".
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantMetrics {
    pub name: String,
    pub messages: u64,
    pub words: u64,
    pub avg_response_minutes: f64,
    pub emoji: u64,
    pub questions: u64,
    pub late_night_share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityProfile {
    pub name: String,
    pub archetype: String,
    pub traits: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthScore {
    /// 0..=100, higher is healthier.
    pub score: f64,
    pub verdict: String,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViralScores {
    pub overall: f64,
    pub per_participant: BTreeMap<String, f64>,
    pub quote: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoastAct {
    pub title: String,
    pub target: String,
    pub jokes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoastScript {
    pub title: String,
    pub opener: String,
    pub acts: Vec<RoastAct>,
    pub closer: String,
}

/// One simulated dialogue turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentItem {
    pub sender: String,
    pub text: String,
    pub phase: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contribution {
    pub name: String,
    /// Share of the argument, 0..=100.
    pub share: f64,
    pub style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentSummary {
    pub dominant_phase: String,
    pub contributions: Vec<Contribution>,
    pub comparison: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentSimulation {
    pub topic: String,
    pub turns: Vec<ContentItem>,
    pub summary: ArgumentSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisBundle {
    pub meta: ConversationMeta,
    pub metrics: Vec<ParticipantMetrics>,
    pub personality: Option<Vec<PersonalityProfile>>,
    pub health: Option<HealthScore>,
    pub viral: Option<ViralScores>,
    /// Participant name -> logical asset key of their photo.
    pub photos: BTreeMap<String, String>,
    pub roast: Option<RoastScript>,
    pub argument: Option<ArgumentSimulation>,
}

impl AnalysisBundle {
    pub fn from_json(raw: &str) -> Result<Self, DeckError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The participant bubbles are aligned against.
    pub fn reference_participant(&self) -> Option<&str> {
        self.meta.participants.first().map(String::as_str)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&ParticipantMetrics> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Asset keys the decks may draw: fixed decorations plus every photo.
    pub fn asset_keys(&self) -> Vec<String> {
        let mut keys = vec!["cover".to_string(), "curtains".to_string()];
        for key in self.photos.values() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Replaces missing or non-conforming values with safe defaults.
    pub fn sanitize(mut self) -> Self {
        self.meta.title = clean_or(&self.meta.title, UNTITLED);
        self.meta.date_range = self
            .meta
            .date_range
            .map(|r| clean(&r))
            .filter(|r| !r.is_empty());
        let mut participants: Vec<String> = Vec::new();
        for name in &self.meta.participants {
            let name = clean_name(name);
            if !participants.contains(&name) {
                participants.push(name);
            }
        }
        if participants.is_empty() {
            participants = self.metrics.iter().map(|m| clean_name(&m.name)).collect();
            participants.dedup();
        }
        self.meta.participants = participants;

        for m in &mut self.metrics {
            m.name = clean_name(&m.name);
            m.avg_response_minutes = finite_non_negative(m.avg_response_minutes);
            m.late_night_share = finite_non_negative(m.late_night_share).min(100.0);
        }

        self.personality = self.personality.map(|profiles| {
            profiles
                .into_iter()
                .map(|p| PersonalityProfile {
                    name: clean_name(&p.name),
                    archetype: clean_or(&p.archetype, "Unclassifiable"),
                    traits: clean_list(p.traits),
                    summary: clean(&p.summary),
                })
                .collect()
        });

        self.health = self.health.map(|h| HealthScore {
            score: clamp_score(h.score),
            verdict: clean_or(&h.verdict, "No verdict"),
            factors: clean_list(h.factors),
        });

        self.viral = self.viral.map(|v| ViralScores {
            overall: clamp_score(v.overall),
            per_participant: v
                .per_participant
                .into_iter()
                .map(|(name, score)| (clean_name(&name), clamp_score(score)))
                .collect(),
            quote: clean(&v.quote),
        });

        self.photos = self
            .photos
            .into_iter()
            .map(|(name, key)| (clean_name(&name), key.trim().to_string()))
            .filter(|(_, key)| !key.is_empty())
            .collect();

        self.roast = self.roast.map(|r| RoastScript {
            title: clean_or(&r.title, "The Roast"),
            opener: clean(&r.opener),
            acts: r
                .acts
                .into_iter()
                .map(|act| RoastAct {
                    title: clean_or(&act.title, "Untitled Bit"),
                    target: clean(&act.target),
                    jokes: clean_list(act.jokes),
                })
                .filter(|act| !act.jokes.is_empty())
                .collect(),
            closer: clean(&r.closer),
        });

        self.argument = self.argument.map(|a| {
            // Upstream order is the conversation order; ordinals are only renumbered.
            let mut turns: Vec<ContentItem> = a
                .turns
                .into_iter()
                .filter(|t| !t.text.trim().is_empty())
                .map(|t| ContentItem {
                    sender: clean_name(&t.sender),
                    text: clean_or(&t.text, REACTION),
                    phase: clean_or(&t.phase, "argument"),
                    ordinal: t.ordinal,
                })
                .collect();
            for (index, turn) in turns.iter_mut().enumerate() {
                turn.ordinal = index as u32 + 1;
            }
            ArgumentSimulation {
                topic: clean_or(&a.topic, "The Great Debate"),
                turns,
                summary: ArgumentSummary {
                    dominant_phase: clean_or(&a.summary.dominant_phase, "argument"),
                    contributions: a
                        .summary
                        .contributions
                        .into_iter()
                        .map(|c| Contribution {
                            name: clean_name(&c.name),
                            share: clamp_score(c.share),
                            style: clean(&c.style),
                        })
                        .collect(),
                    comparison: clean(&a.summary.comparison),
                },
            }
        });
        self
    }
}

fn clean(raw: &str) -> String {
    sanitize_text(raw).trim().to_string()
}

/// Names are identity keys (bubble sides, photos, metrics), so a name that
/// cleans away entirely, such as an emoji handle, is kept raw rather than
/// collapsing into [`ANONYMOUS`].
fn clean_name(raw: &str) -> String {
    let value = clean(raw);
    if !value.is_empty() {
        return value;
    }
    let raw: String = raw.chars().filter(|c| !c.is_control()).collect();
    match raw.trim() {
        "" => ANONYMOUS.to_string(),
        kept => kept.to_string(),
    }
}

fn clean_or(raw: &str, fallback: &str) -> String {
    let value = clean(raw);
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .iter()
        .map(|item| clean(item))
        .filter(|item| !item.is_empty())
        .collect()
}

fn finite_non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn clamp_score(value: f64) -> f64 {
    finite_non_negative(value).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_json() {
        let bundle = AnalysisBundle::from_json(
            r#"{"meta":{"title":"Group chat","participants":["Ana","Ben"]},"extra":1}"#,
        )
        .expect("parse");
        assert_eq!(bundle.meta.participants, vec!["Ana", "Ben"]);
        assert!(bundle.health.is_none());
        assert!(bundle.metrics.is_empty());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            AnalysisBundle::from_json("not json"),
            Err(DeckError::Decode(_))
        ));
    }

    #[test]
    fn sanitize_fills_placeholders_and_clamps() {
        let bundle = AnalysisBundle {
            meta: ConversationMeta {
                title: "   ".into(),
                participants: vec!["".into(), "Ben".into(), "Ben".into()],
                ..Default::default()
            },
            health: Some(HealthScore {
                score: 140.0,
                verdict: String::new(),
                factors: vec!["".into(), "ghosting".into()],
            }),
            ..Default::default()
        }
        .sanitize();
        assert_eq!(bundle.meta.title, UNTITLED);
        assert_eq!(bundle.meta.participants, vec![ANONYMOUS, "Ben"]);
        let health = bundle.health.expect("health kept");
        assert_eq!(health.score, 100.0);
        assert_eq!(health.verdict, "No verdict");
        assert_eq!(health.factors, vec!["ghosting"]);
    }

    #[test]
    fn sanitize_keeps_turn_order_and_drops_blank_ones() {
        let turn = |ordinal, text: &str| ContentItem {
            sender: "Ana".into(),
            text: text.into(),
            phase: String::new(),
            ordinal,
        };
        let bundle = AnalysisBundle {
            argument: Some(ArgumentSimulation {
                topic: String::new(),
                turns: vec![
                    turn(9, "opening"),
                    turn(2, "  "),
                    turn(3, "reply"),
                    turn(4, "\u{1F602}"),
                ],
                summary: ArgumentSummary::default(),
            }),
            ..Default::default()
        }
        .sanitize();
        let argument = bundle.argument.expect("argument kept");
        let ordinals: Vec<(u32, &str)> = argument
            .turns
            .iter()
            .map(|t| (t.ordinal, t.text.as_str()))
            .collect();
        assert_eq!(ordinals, vec![(1, "opening"), (2, "reply"), (3, REACTION)]);
        assert_eq!(argument.turns[0].phase, "argument");
        assert_eq!(argument.topic, "The Great Debate");
    }

    #[test]
    fn sanitize_keeps_non_latin_identities_distinct() {
        let turn = |sender: &str, text: &str| ContentItem {
            sender: sender.into(),
            text: text.into(),
            phase: "\u{0441}\u{043F}\u{043E}\u{0440}".into(),
            ordinal: 0,
        };
        let bundle = AnalysisBundle {
            meta: ConversationMeta {
                participants: vec![
                    "\u{0418}\u{0432}\u{0430}\u{043D}".into(),
                    "\u{041C}\u{0430}\u{0440}\u{0438}\u{044F}".into(),
                    "\u{0141}ukasz".into(),
                    "\u{1F98A}".into(),
                ],
                ..Default::default()
            },
            argument: Some(ArgumentSimulation {
                topic: "\u{0141}\u{00F3}d\u{017A}".into(),
                turns: vec![
                    turn("\u{0418}\u{0432}\u{0430}\u{043D}", "\u{041D}\u{0435}\u{0442}!"),
                    turn("\u{0141}ukasz", "Tak \u{017C}e"),
                    turn("\u{1F98A}", "ok"),
                ],
                summary: ArgumentSummary::default(),
            }),
            ..Default::default()
        }
        .sanitize();
        assert_eq!(
            bundle.meta.participants,
            vec![
                "\u{0418}\u{0432}\u{0430}\u{043D}",
                "\u{041C}\u{0430}\u{0440}\u{0438}\u{044F}",
                "\u{0141}ukasz",
                "\u{1F98A}",
            ]
        );
        assert_eq!(bundle.reference_participant(), Some("\u{0418}\u{0432}\u{0430}\u{043D}"));
        let argument = bundle.argument.expect("argument kept");
        assert_eq!(argument.topic, "\u{0141}\u{00F3}d\u{017A}");
        let senders: Vec<&str> = argument.turns.iter().map(|t| t.sender.as_str()).collect();
        assert_eq!(senders, vec!["\u{0418}\u{0432}\u{0430}\u{043D}", "\u{0141}ukasz", "\u{1F98A}"]);
        assert_eq!(argument.turns[0].phase, "\u{0441}\u{043F}\u{043E}\u{0440}");
    }

    #[test]
    fn asset_keys_include_decorations_and_photos() {
        let mut bundle = AnalysisBundle::default();
        bundle.photos.insert("Ana".into(), "ana".into());
        bundle.photos.insert("Ben".into(), "cover".into());
        assert_eq!(bundle.asset_keys(), vec!["cover", "curtains", "ana"]);
    }
}
