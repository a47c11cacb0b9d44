use super::SignTranslator;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Milliseconds each sign is held
const SIGN_DURATION_MS: u64 = 1000;
/// Milliseconds between consecutive signs
const TRANSITION_MS: u64 = 200;
/// Rough rendered length of one sign in a generated clip
const VIDEO_SECS_PER_SIGN: f64 = 1.5;

/// Output shape requested from the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationFormat {
    Animation,
    Video,
    Text,
}

impl FromStr for AnimationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "animation" => Ok(Self::Animation),
            "video" => Ok(Self::Video),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown animation format `{}`", other)),
        }
    }
}

impl fmt::Display for AnimationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Animation => "animation",
            Self::Video => "video",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// How a word was rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// A dedicated sign exists for the word
    Exact,
    /// Fingerspelled letter by letter
    Spelling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub label: String,
    pub handshape: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSegment {
    pub word: String,
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub duration_ms: u64,
    pub keyframes: Vec<Keyframe>,
    pub transition_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub format: String,
    pub duration_secs: f64,
    pub gestures: Vec<String>,
}

/// Translator output; the variant follows the requested [`AnimationFormat`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationPayload {
    Segments(Vec<AnimationSegment>),
    Video(VideoSummary),
    Text(String),
}

/// One entry of the sign catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureInfo {
    pub name: String,
    /// `sign` for words and phrases, `letter` for the manual alphabet
    pub category: String,
    pub handshape: String,
    /// `None` when the sign is shared across regions
    pub region: Option<String>,
}

/// Text read back from a sequence of recognized gestures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInterpretation {
    pub text: String,
    /// Share of gestures that matched the lexicon or the manual alphabet
    pub confidence: f32,
    pub unrecognized: Vec<String>,
}

struct LexiconEntry {
    phrase: &'static str,
    handshape: &'static str,
    /// `None` means the sign is shared across regions
    region: Option<&'static str>,
}

const LEXICON: &[LexiconEntry] = &[
    LexiconEntry { phrase: "a", handshape: "closed fist, thumb alongside", region: None },
    LexiconEntry { phrase: "b", handshape: "fingers extended and together, thumb folded", region: None },
    LexiconEntry { phrase: "c", handshape: "fingers curved into a C", region: None },
    LexiconEntry { phrase: "hola", handshape: "open hand, lateral sweep", region: Some("es") },
    LexiconEntry { phrase: "gracias", handshape: "open hand moving forward from the mouth", region: Some("es") },
    LexiconEntry { phrase: "por favor", handshape: "palms pressed together", region: Some("es") },
    LexiconEntry { phrase: "si", handshape: "fist nodding", region: Some("es") },
    LexiconEntry { phrase: "no", handshape: "index finger wagging", region: None },
    LexiconEntry { phrase: "como", handshape: "bent fingers, wrist rotating", region: Some("es") },
    LexiconEntry { phrase: "estas", handshape: "thumbs out, hands lowering", region: Some("es") },
];

/// Word-by-word translator over a small built-in sign lexicon.
///
/// Two-word phrases are tried before single words; anything not in the
/// lexicon is fingerspelled.
#[derive(Debug, Default)]
pub struct LexiconTranslator;

impl LexiconTranslator {
    pub fn new() -> Self {
        Self
    }

    fn lookup(phrase: &str, region: &str) -> Option<&'static LexiconEntry> {
        LEXICON
            .iter()
            .find(|e| e.phrase == phrase && e.region.map_or(true, |r| r == region))
    }

    fn segments(text: &str, region: &str) -> Vec<AnimationSegment> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut segments = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            if i + 1 < words.len() {
                let pair = format!("{} {}", words[i], words[i + 1]);
                if let Some(entry) = Self::lookup(&pair, region) {
                    segments.push(Self::exact(&pair, entry));
                    i += 2;
                    continue;
                }
            }

            match Self::lookup(&words[i], region) {
                Some(entry) => segments.push(Self::exact(&words[i], entry)),
                None => segments.push(Self::spelled(&words[i])),
            }
            i += 1;
        }
        segments
    }

    /// Read a gesture sequence back as text. Runs of single letters are
    /// joined into one fingerspelled word.
    fn interpretation(gestures: &[String], region: &str) -> SignInterpretation {
        let mut words: Vec<String> = Vec::new();
        let mut unrecognized = Vec::new();
        let mut spelled = String::new();
        let mut total = 0usize;

        for gesture in gestures {
            let word = gesture
                .trim()
                .to_lowercase()
                .replace(|c: char| c == '_' || c == '-', " ");
            if word.is_empty() {
                continue;
            }
            total += 1;

            let mut chars = word.chars();
            if let (Some(letter), None) = (chars.next(), chars.next()) {
                if letter.is_alphabetic() {
                    spelled.push(letter);
                    continue;
                }
            }

            if !spelled.is_empty() {
                words.push(std::mem::take(&mut spelled));
            }
            if Self::lookup(&word, region).is_none() {
                unrecognized.push(gesture.trim().to_string());
            }
            words.push(word);
        }
        if !spelled.is_empty() {
            words.push(spelled);
        }

        let confidence = if total == 0 {
            0.0
        } else {
            (total - unrecognized.len()) as f32 / total as f32
        };

        SignInterpretation {
            text: words.join(" "),
            confidence,
            unrecognized,
        }
    }

    fn exact(word: &str, entry: &LexiconEntry) -> AnimationSegment {
        AnimationSegment {
            word: word.to_string(),
            kind: MatchKind::Exact,
            duration_ms: SIGN_DURATION_MS,
            keyframes: vec![Keyframe {
                label: word.to_string(),
                handshape: entry.handshape.to_string(),
            }],
            transition_ms: TRANSITION_MS,
        }
    }

    fn spelled(word: &str) -> AnimationSegment {
        AnimationSegment {
            word: word.to_string(),
            kind: MatchKind::Spelling,
            duration_ms: SIGN_DURATION_MS,
            keyframes: word
                .chars()
                .map(|letter| Keyframe {
                    label: letter.to_string(),
                    handshape: format!("manual alphabet {}", letter.to_uppercase()),
                })
                .collect(),
            transition_ms: TRANSITION_MS,
        }
    }
}

#[async_trait::async_trait]
impl SignTranslator for LexiconTranslator {
    async fn translate(&self, text: &str, format: AnimationFormat, region: &str) -> Result<AnimationPayload> {
        debug!("Translating to sign ({}, region {}): {:?}", format, region, text);

        let segments = Self::segments(text, region);
        let payload = match format {
            AnimationFormat::Animation => AnimationPayload::Segments(segments),
            AnimationFormat::Video => AnimationPayload::Video(VideoSummary {
                format: "mp4".to_string(),
                duration_secs: segments.len() as f64 * VIDEO_SECS_PER_SIGN,
                gestures: segments.into_iter().map(|s| s.word).collect(),
            }),
            AnimationFormat::Text => AnimationPayload::Text(
                segments
                    .into_iter()
                    .map(|s| s.word)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        };

        Ok(payload)
    }

    async fn interpret(&self, gestures: &[String], region: &str) -> Result<SignInterpretation> {
        Ok(Self::interpretation(gestures, region))
    }

    async fn catalogue(&self) -> Result<Vec<GestureInfo>> {
        Ok(LEXICON
            .iter()
            .map(|entry| GestureInfo {
                name: entry.phrase.to_string(),
                category: if entry.phrase.chars().count() == 1 {
                    "letter".to_string()
                } else {
                    "sign".to_string()
                },
                handshape: entry.handshape.to_string(),
                region: entry.region.map(str::to_string),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn animate(text: &str, region: &str) -> Vec<AnimationSegment> {
        match LexiconTranslator::new()
            .translate(text, AnimationFormat::Animation, region)
            .await
            .unwrap()
        {
            AnimationPayload::Segments(segments) => segments,
            other => panic!("expected segments, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_known_and_unknown_words() {
        let segments = animate("Hola, amigo", "es").await;

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].word, "hola");
        assert_eq!(segments[0].kind, MatchKind::Exact);
        assert_eq!(segments[1].kind, MatchKind::Spelling);
        assert_eq!(segments[1].keyframes.len(), "amigo".len());
    }

    #[tokio::test]
    async fn test_two_word_phrase_wins() {
        let segments = animate("por favor", "es").await;
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].word, "por favor");
    }

    #[tokio::test]
    async fn test_regional_signs_fall_back_to_spelling() {
        let segments = animate("hola no", "us").await;
        assert_eq!(segments[0].kind, MatchKind::Spelling);
        // Shared across regions
        assert_eq!(segments[1].kind, MatchKind::Exact);
    }

    #[tokio::test]
    async fn test_video_and_text_formats() {
        let translator = LexiconTranslator::new();

        let video = translator
            .translate("si no", AnimationFormat::Video, "es")
            .await
            .unwrap();
        assert_eq!(
            video,
            AnimationPayload::Video(VideoSummary {
                format: "mp4".to_string(),
                duration_secs: 3.0,
                gestures: vec!["si".to_string(), "no".to_string()],
            })
        );

        let text = translator
            .translate("Buenos  DÍAS", AnimationFormat::Text, "es")
            .await
            .unwrap();
        assert_eq!(text, AnimationPayload::Text("buenos días".to_string()));
    }

    fn gestures(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_interpret_joins_spelled_letters() {
        let result = LexiconTranslator::new()
            .interpret(&gestures(&["HOLA", "A", "M", "I", "G", "O", "POR_FAVOR"]), "es")
            .await
            .unwrap();

        assert_eq!(result.text, "hola amigo por favor");
        assert_eq!(result.confidence, 1.0);
        assert!(result.unrecognized.is_empty());
    }

    #[tokio::test]
    async fn test_interpret_reports_unknown_gestures() {
        let result = LexiconTranslator::new()
            .interpret(&gestures(&["GRACIAS", "SALUDO", " "]), "es")
            .await
            .unwrap();

        assert_eq!(result.text, "gracias saludo");
        assert_eq!(result.unrecognized, vec!["SALUDO".to_string()]);
        assert!((result.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_catalogue_lists_lexicon() {
        let catalogue = LexiconTranslator::new().catalogue().await.unwrap();

        assert_eq!(catalogue.len(), LEXICON.len());
        let hola = catalogue.iter().find(|g| g.name == "hola").unwrap();
        assert_eq!(hola.category, "sign");
        assert_eq!(hola.region.as_deref(), Some("es"));
        let a = catalogue.iter().find(|g| g.name == "a").unwrap();
        assert_eq!(a.category, "letter");
        assert_eq!(a.region, None);
    }

    #[test]
    fn test_segment_wire_shape() {
        let json = serde_json::to_value(LexiconTranslator::spelled("ok")).unwrap();
        assert_eq!(json["type"], "spelling");
        assert_eq!(json["durationMs"], 1000);
        assert_eq!(json["transitionMs"], 200);
    }
}
