//! HTTP and WebSocket surface
//!
//! - GET /interpreter - WebSocket endpoint for session events
//! - GET /sessions - List active sessions
//! - GET /sessions/:session_id - Inspect one session
//! - POST /translate/text-to-sign - Render text as sign animation
//!   (also served at /translation/text-to-signs)
//! - POST /translation/signs-to-text - Gesture sequence to text
//! - GET /sign-language/gestures - Sign catalogue
//! - POST /sign-language/recognize-stream - Recognize a frame for a session
//! - POST /speech/recognize-stream - Transcribe an audio chunk
//! - POST /speech/synthesize - Text to speech (WAV, base64)
//! - POST /speech/text-to-speech - Text to speech (WAV attachment)
//! - GET /health - Health check

mod handlers;
mod routes;
mod socket;
mod state;

pub use routes::create_router;
pub use state::AppState;
