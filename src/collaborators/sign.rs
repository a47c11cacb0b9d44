use super::{SignRecognition, SignRecognizer};
use anyhow::Result;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

/// Recognizer for frames that arrive already labelled by a client-side
/// hand-pose model:
///
/// ```json
/// { "gesture": "HOLA", "confidence": 0.92, "endOfUtterance": false }
/// ```
///
/// `frameData` may also be an array of such frames. Gestures accumulate per
/// session until a frame marks the end of an utterance or the history fills
/// up, at which point the utterance is reported complete and the history
/// starts over. Frames without a label (raw landmarks) yield an empty result.
pub struct LabelledFrameRecognizer {
    max_history: usize,
    histories: DashMap<String, Vec<String>>,
}

struct LabelledFrame {
    gesture: String,
    confidence: f32,
    end_of_utterance: bool,
}

impl LabelledFrameRecognizer {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            histories: DashMap::new(),
        }
    }

    /// Gestures accumulated for a session in the current utterance
    pub fn history(&self, session_id: &str) -> Vec<String> {
        self.histories
            .get(session_id)
            .map(|h| h.value().clone())
            .unwrap_or_default()
    }

    fn labelled(frame: &Value) -> Vec<LabelledFrame> {
        match frame {
            Value::Array(frames) => frames.iter().filter_map(Self::label).collect(),
            other => Self::label(other).into_iter().collect(),
        }
    }

    fn label(frame: &Value) -> Option<LabelledFrame> {
        let gesture = frame.get("gesture")?.as_str()?.trim();
        if gesture.is_empty() {
            return None;
        }

        Some(LabelledFrame {
            gesture: gesture.to_uppercase(),
            confidence: frame
                .get("confidence")
                .and_then(Value::as_f64)
                .map(|c| c.clamp(0.0, 1.0) as f32)
                .unwrap_or(1.0),
            end_of_utterance: frame
                .get("endOfUtterance")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

#[async_trait::async_trait]
impl SignRecognizer for LabelledFrameRecognizer {
    async fn recognize(&self, session_id: &str, frame: &Value) -> Result<SignRecognition> {
        let frames = Self::labelled(frame);
        if frames.is_empty() {
            return Ok(SignRecognition::empty());
        }

        let gestures: Vec<String> = frames.iter().map(|f| f.gesture.clone()).collect();
        let confidence = frames.iter().map(|f| f.confidence).sum::<f32>() / frames.len() as f32;
        let marked_end = frames.iter().any(|f| f.end_of_utterance);

        let mut history = self.histories.entry(session_id.to_string()).or_default();
        history.extend(gestures.iter().cloned());
        if history.len() > self.max_history {
            let overflow = history.len() - self.max_history;
            history.drain(..overflow);
        }

        let accumulated_text = history.join(" ").to_lowercase();
        let is_complete_utterance = marked_end || history.len() >= self.max_history;
        if is_complete_utterance {
            debug!("Utterance complete in session {}: {}", session_id, accumulated_text);
            history.clear();
        }

        Ok(SignRecognition {
            text: gestures.join(" ").to_lowercase(),
            confidence,
            gestures,
            is_complete_utterance,
            accumulated_text,
        })
    }

    async fn reset(&self, session_id: &str) {
        self.histories.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unlabelled_frame_is_empty() {
        let recognizer = LabelledFrameRecognizer::new(30);
        let result = recognizer
            .recognize("S1", &json!({"landmarks": [[0.1, 0.2, 0.3]]}))
            .await
            .unwrap();

        assert_eq!(result, SignRecognition::empty());
        assert!(recognizer.history("S1").is_empty());
    }

    #[tokio::test]
    async fn test_gestures_accumulate_until_end_marker() {
        let recognizer = LabelledFrameRecognizer::new(30);

        let first = recognizer
            .recognize("S1", &json!({"gesture": "hola", "confidence": 0.9}))
            .await
            .unwrap();
        assert_eq!(first.text, "hola");
        assert_eq!(first.gestures, vec!["HOLA".to_string()]);
        assert!(!first.is_complete_utterance);

        let second = recognizer
            .recognize(
                "S1",
                &json!({"gesture": "GRACIAS", "confidence": 0.8, "endOfUtterance": true}),
            )
            .await
            .unwrap();
        assert!(second.is_complete_utterance);
        assert_eq!(second.accumulated_text, "hola gracias");
        assert!(recognizer.history("S1").is_empty());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_history() {
        let recognizer = LabelledFrameRecognizer::new(30);
        recognizer.recognize("S1", &json!({"gesture": "SI"})).await.unwrap();
        let other = recognizer.recognize("S2", &json!({"gesture": "NO"})).await.unwrap();

        assert_eq!(other.accumulated_text, "no");
    }

    #[tokio::test]
    async fn test_full_history_completes_utterance() {
        let recognizer = LabelledFrameRecognizer::new(2);
        recognizer.recognize("S1", &json!({"gesture": "A"})).await.unwrap();
        let result = recognizer.recognize("S1", &json!({"gesture": "B"})).await.unwrap();

        assert!(result.is_complete_utterance);
        assert_eq!(result.accumulated_text, "a b");
    }

    #[tokio::test]
    async fn test_batch_of_frames_averages_confidence() {
        let recognizer = LabelledFrameRecognizer::new(30);
        let result = recognizer
            .recognize(
                "S1",
                &json!([
                    {"gesture": "COMO", "confidence": 0.5},
                    {"landmarks": []},
                    {"gesture": "ESTAS", "confidence": 1.0}
                ]),
            )
            .await
            .unwrap();

        assert_eq!(result.gestures.len(), 2);
        assert!((result.confidence - 0.75).abs() < f32::EPSILON);
        assert_eq!(result.text, "como estas");
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let recognizer = LabelledFrameRecognizer::new(30);
        recognizer.recognize("S1", &json!({"gesture": "SI"})).await.unwrap();
        recognizer.reset("S1").await;

        assert!(recognizer.history("S1").is_empty());
    }
}
