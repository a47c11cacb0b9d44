use crate::collaborators::{AnimationPayload, SignRecognition};
use crate::session::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events delivered to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// To the joining connection only
    SessionJoined(SessionJoined),
    UserJoined(UserJoined),
    UserLeft(UserLeft),
    SignLanguageResult(SignLanguageResult),
    TextToSpeech(TextToSpeech),
    SignLanguageAnimation(SignLanguageAnimation),
    TextMessage(TextMessage),
    SessionTimeout(SessionTimeout),
    /// To the originating connection only
    Error(ErrorMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionJoined {
    pub session_id: String,
    pub active_participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoined {
    pub participant_id: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeft {
    pub participant_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignLanguageResult {
    pub text: String,
    pub confidence: f32,
    pub gestures: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToSpeech {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignLanguageAnimation {
    pub animation: AnimationPayload,
    pub original_text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    pub text: String,
    pub from_participant_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimeout {
    pub message: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionJoined(_) => "session_joined",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft(_) => "user_left",
            Self::SignLanguageResult(_) => "sign_language_result",
            Self::TextToSpeech(_) => "text_to_speech",
            Self::SignLanguageAnimation(_) => "sign_language_animation",
            Self::TextMessage(_) => "text_message",
            Self::SessionTimeout(_) => "session_timeout",
            Self::Error(_) => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorMessage {
            message: message.into(),
        })
    }

    pub fn session_joined(session_id: &str, active_participants: Vec<String>) -> Self {
        Self::SessionJoined(SessionJoined {
            session_id: session_id.to_string(),
            active_participants,
        })
    }

    pub fn user_joined(participant_id: &str, role: Role) -> Self {
        Self::UserJoined(UserJoined {
            participant_id: participant_id.to_string(),
            role,
            timestamp: Utc::now(),
        })
    }

    pub fn user_left(participant_id: &str) -> Self {
        Self::UserLeft(UserLeft {
            participant_id: participant_id.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn sign_result(result: &SignRecognition) -> Self {
        Self::SignLanguageResult(SignLanguageResult {
            text: result.text.clone(),
            confidence: result.confidence,
            gestures: result.gestures.clone(),
            timestamp: Utc::now(),
        })
    }

    pub fn text_to_speech(text: &str) -> Self {
        Self::TextToSpeech(TextToSpeech {
            text: text.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn animation(animation: AnimationPayload, original_text: &str) -> Self {
        Self::SignLanguageAnimation(SignLanguageAnimation {
            animation,
            original_text: original_text.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn text_message(text: &str, from_participant_id: &str) -> Self {
        Self::TextMessage(TextMessage {
            text: text.to_string(),
            from_participant_id: from_participant_id.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn session_timeout(session_id: &str, at: DateTime<Utc>) -> Self {
        Self::SessionTimeout(SessionTimeout {
            message: "session closed due to inactivity".to_string(),
            session_id: session_id.to_string(),
            timestamp: at,
        })
    }

    /// Serialize to the JSON text frame sent over the socket
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(OutboundEvent::session_joined(
            "S1",
            vec!["p1".to_string(), "p2".to_string()],
        ))
        .unwrap();

        assert_eq!(json["event"], "session_joined");
        assert_eq!(json["data"]["sessionId"], "S1");
        assert_eq!(json["data"]["activeParticipants"][1], "p2");
    }

    #[test]
    fn test_user_joined_carries_role() {
        let json = serde_json::to_value(OutboundEvent::user_joined("p1", Role::Listener)).unwrap();
        assert_eq!(json["event"], "user_joined");
        assert_eq!(json["data"]["participantId"], "p1");
        assert_eq!(json["data"]["role"], "listener");
        assert!(json["data"]["timestamp"].is_string());
    }

    #[test]
    fn test_animation_event_round_trips() {
        let event = OutboundEvent::animation(AnimationPayload::Text("hola".to_string()), "Hola");
        let json = event.to_json().unwrap();
        assert!(json.contains("\"originalText\":\"Hola\""));

        let parsed: OutboundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_error_event() {
        let json = serde_json::to_value(OutboundEvent::error("missing required field `text`")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "missing required field `text`");
    }
}
