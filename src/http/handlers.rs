use super::state::AppState;
use crate::collaborators::AnimationFormat;
use crate::error::RelayError;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,

    /// `animation` (default from config), `video` or `text`
    pub format: Option<String>,

    /// Sign-language region (default from config)
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    pub text: String,

    /// Voice preset (default from config)
    pub voice_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeSignRequest {
    pub session_id: String,
    pub frame_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeSpeechRequest {
    /// Base64-encoded audio
    pub audio_data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignsToTextRequest {
    /// Recognized gesture names, in signing order
    pub sign_data: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    pub format: String,
    /// Base64-encoded audio
    pub audio: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn relay_error(err: RelayError) -> Response {
    let status = match err {
        RelayError::Validation(_) => StatusCode::BAD_REQUEST,
        RelayError::UnknownSession(_) => StatusCode::NOT_FOUND,
        RelayError::CollaboratorTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.client_message())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /sessions
/// List active sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.router.coordinator().sessions.summaries())
}

/// GET /sessions/:session_id
/// Get roster and activity of one session
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.router.coordinator().sessions.get(&session_id) {
        Some(summary) => (StatusCode::OK, Json(summary)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
    }
}

/// POST /translate/text-to-sign
/// Render text as sign language in the requested format
pub async fn translate_text(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text must not be empty");
    }

    let collaborators = state.router.collaborators();
    let format = match req.format.as_deref() {
        Some(f) => match f.parse::<AnimationFormat>() {
            Ok(format) => format,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        },
        None => collaborators.animation_format,
    };
    let region = req.region.as_deref().unwrap_or(collaborators.region.as_str());

    info!("Translating {} chars to sign ({}, {})", req.text.len(), format, region);

    match collaborators.translate(&req.text, format, region).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => {
            error!("Translation failed: {}", e);
            relay_error(e)
        }
    }
}

async fn synthesize(state: &AppState, req: &SynthesizeRequest) -> Result<Vec<u8>, Response> {
    if req.text.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "text must not be empty"));
    }

    state
        .router
        .collaborators()
        .synthesize(&req.text, req.voice_type.as_deref())
        .await
        .map_err(|e| {
            error!("Speech synthesis failed: {}", e);
            relay_error(e)
        })
}

/// POST /speech/synthesize
/// Convert text to speech audio, returned base64-encoded in JSON
pub async fn synthesize_speech(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> impl IntoResponse {
    match synthesize(&state, &req).await {
        Ok(audio) => (
            StatusCode::OK,
            Json(SynthesizeResponse {
                format: "wav".to_string(),
                audio: base64::engine::general_purpose::STANDARD.encode(audio),
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// POST /speech/text-to-speech
/// Convert text to speech audio, returned as a WAV attachment
pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> impl IntoResponse {
    match synthesize(&state, &req).await {
        Ok(audio) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/wav"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"speech.wav\""),
            ],
            audio,
        )
            .into_response(),
        Err(response) => response,
    }
}

/// POST /speech/recognize-stream
/// Transcribe one chunk of audio
pub async fn recognize_speech(
    State(state): State<AppState>,
    Json(req): Json<RecognizeSpeechRequest>,
) -> impl IntoResponse {
    let audio = match base64::engine::general_purpose::STANDARD.decode(req.audio_data.trim()) {
        Ok(audio) if !audio.is_empty() => audio,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, "audioData must not be empty"),
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "audioData is not valid base64"),
    };

    match state.router.collaborators().recognize_speech(&audio).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => relay_error(e),
    }
}

/// POST /sign-language/recognize-stream
/// Recognize a frame against a live session's gesture history
pub async fn recognize_sign(
    State(state): State<AppState>,
    Json(req): Json<RecognizeSignRequest>,
) -> impl IntoResponse {
    let sessions = &state.router.coordinator().sessions;
    if !sessions.touch(&req.session_id) {
        return relay_error(RelayError::UnknownSession(req.session_id));
    }

    match state.router.recognize_sign(&req.session_id, &req.frame_data).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => relay_error(e),
    }
}

/// GET /sign-language/gestures
/// Signs the translator knows
pub async fn list_gestures(State(state): State<AppState>) -> impl IntoResponse {
    match state.router.collaborators().gesture_catalogue().await {
        Ok(gestures) => (StatusCode::OK, Json(gestures)).into_response(),
        Err(e) => relay_error(e),
    }
}

/// POST /translation/signs-to-text
/// Read a gesture sequence back as text
pub async fn signs_to_text(
    State(state): State<AppState>,
    Json(req): Json<SignsToTextRequest>,
) -> impl IntoResponse {
    if req.sign_data.iter().all(|g| g.trim().is_empty()) {
        return error_response(StatusCode::BAD_REQUEST, "signData must not be empty");
    }

    match state.router.collaborators().interpret_signs(&req.sign_data).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => relay_error(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
