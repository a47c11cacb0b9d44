use crate::error::RelayError;
use crate::session::Role;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A validated inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Join {
        session_id: String,
        participant_id: String,
        role: Role,
    },
    SignFrame {
        session_id: String,
        frame: serde_json::Value,
    },
    SpeechAudio {
        session_id: String,
        audio: Vec<u8>,
    },
    TextMessage {
        session_id: String,
        text: String,
        from_participant_id: String,
    },
    Leave {
        session_id: String,
        participant_id: String,
    },
}

impl InboundEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join_session",
            Self::SignFrame { .. } => "sign_language_frame",
            Self::SpeechAudio { .. } => "speech_audio",
            Self::TextMessage { .. } => "text_message",
            Self::Leave { .. } => "leave_session",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::Join { session_id, .. }
            | Self::SignFrame { session_id, .. }
            | Self::SpeechAudio { session_id, .. }
            | Self::TextMessage { session_id, .. }
            | Self::Leave { session_id, .. } => session_id,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinPayload {
    #[serde(alias = "userId")]
    participant_id: Option<String>,
    session_id: Option<String>,
    role: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FramePayload {
    session_id: Option<String>,
    frame_data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioPayload {
    session_id: Option<String>,
    audio_data: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextPayload {
    session_id: Option<String>,
    text: Option<String>,
    #[serde(alias = "fromUserId")]
    from_participant_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeavePayload {
    session_id: Option<String>,
    #[serde(alias = "userId")]
    participant_id: Option<String>,
}

/// Parse and validate one inbound text frame.
pub fn parse_inbound(raw: &str) -> Result<InboundEvent, RelayError> {
    let envelope: Envelope = serde_json::from_str(raw)
        .map_err(|e| RelayError::validation(format!("malformed message: {}", e)))?;

    match envelope.event.as_str() {
        "join_session" => {
            let p: JoinPayload = payload(&envelope)?;
            let participant_id = required(p.participant_id, "participantId")?;
            let session_id = required(p.session_id, "sessionId")?;
            let role = required(p.role, "role")?
                .parse::<Role>()
                .map_err(RelayError::Validation)?;
            Ok(InboundEvent::Join {
                session_id,
                participant_id,
                role,
            })
        }
        "sign_language_frame" => {
            let p: FramePayload = payload(&envelope)?;
            let session_id = required(p.session_id, "sessionId")?;
            let frame = match p.frame_data {
                Some(frame) if !frame.is_null() => frame,
                _ => return Err(missing("frameData")),
            };
            Ok(InboundEvent::SignFrame { session_id, frame })
        }
        "speech_audio" => {
            let p: AudioPayload = payload(&envelope)?;
            let session_id = required(p.session_id, "sessionId")?;
            let audio = base64::engine::general_purpose::STANDARD
                .decode(required(p.audio_data, "audioData")?)
                .map_err(|e| RelayError::validation(format!("audioData is not valid base64: {}", e)))?;
            Ok(InboundEvent::SpeechAudio { session_id, audio })
        }
        "text_message" => {
            let p: TextPayload = payload(&envelope)?;
            Ok(InboundEvent::TextMessage {
                session_id: required(p.session_id, "sessionId")?,
                text: required(p.text, "text")?,
                from_participant_id: required(p.from_participant_id, "fromParticipantId")?,
            })
        }
        "leave_session" => {
            let p: LeavePayload = payload(&envelope)?;
            Ok(InboundEvent::Leave {
                session_id: required(p.session_id, "sessionId")?,
                participant_id: required(p.participant_id, "participantId")?,
            })
        }
        other => Err(RelayError::validation(format!("unknown event `{}`", other))),
    }
}

fn payload<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, RelayError> {
    // A missing `data` is treated like an empty payload so the per-field
    // checks below report exactly which field is absent.
    let data = if envelope.data.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        envelope.data.clone()
    };

    serde_json::from_value(data).map_err(|e| {
        RelayError::validation(format!("invalid {} payload: {}", envelope.event, e))
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, RelayError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> RelayError {
    RelayError::validation(format!("missing required field `{}`", field))
}
