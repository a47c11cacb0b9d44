//! External recognition, translation and speech collaborators
//!
//! The router only depends on the traits in this module. The default
//! implementations are deterministic stand-ins; a model-backed recognizer
//! plugs in by implementing the same trait and handing it to
//! [`Collaborators`].

mod sign;
mod speech;
mod translation;

pub use sign::LabelledFrameRecognizer;
pub use speech::{LoopbackSpeechRecognizer, SilentSpeechSynthesizer};
pub use translation::{
    AnimationFormat, AnimationPayload, AnimationSegment, GestureInfo, Keyframe, LexiconTranslator,
    MatchKind, SignInterpretation, VideoSummary,
};

use crate::config::CollaboratorsConfig;
use crate::error::RelayError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Outcome of recognizing one frame (or a batch of frames)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRecognition {
    pub text: String,
    /// 0.0 to 1.0
    pub confidence: f32,
    pub gestures: Vec<String>,
    pub is_complete_utterance: bool,
    /// Everything recognized in the current utterance so far
    pub accumulated_text: String,
}

impl SignRecognition {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            gestures: Vec::new(),
            is_complete_utterance: false,
            accumulated_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognition {
    pub text: String,
    pub confidence: f32,
    pub is_final: bool,
}

/// Sign recognition over landmark frames.
///
/// Implementations may accumulate gestures per session; `reset` is called
/// when a session closes.
#[async_trait::async_trait]
pub trait SignRecognizer: Send + Sync {
    async fn recognize(&self, session_id: &str, frame: &serde_json::Value) -> Result<SignRecognition>;

    async fn reset(&self, _session_id: &str) {}
}

#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: &[u8]) -> Result<SpeechRecognition>;
}

/// Text to sign-language rendering, and reading gesture sequences back
#[async_trait::async_trait]
pub trait SignTranslator: Send + Sync {
    async fn translate(&self, text: &str, format: AnimationFormat, region: &str) -> Result<AnimationPayload>;

    async fn interpret(&self, gestures: &[String], region: &str) -> Result<SignInterpretation>;

    /// Signs this translator knows
    async fn catalogue(&self) -> Result<Vec<GestureInfo>> {
        Ok(Vec::new())
    }
}

/// Text to speech. Returns an encoded audio container.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_type: &str) -> Result<Vec<u8>>;
}

/// The set of collaborators the router calls, plus the per-call policy
#[derive(Clone)]
pub struct Collaborators {
    pub sign: Arc<dyn SignRecognizer>,
    pub speech: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn SignTranslator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Upper bound on any single call
    pub timeout: Duration,
    pub animation_format: AnimationFormat,
    pub region: String,
    pub voice_type: String,
    /// Longest text handed to the synthesizer
    pub max_synthesis_chars: usize,
}

impl Collaborators {
    /// Deterministic collaborators configured from `config`
    pub fn from_config(config: &CollaboratorsConfig) -> Result<Self> {
        let animation_format = config
            .animation_format
            .parse::<AnimationFormat>()
            .map_err(anyhow::Error::msg)?;

        Ok(Self {
            sign: Arc::new(LabelledFrameRecognizer::new(config.max_gesture_history)),
            speech: Arc::new(LoopbackSpeechRecognizer),
            translator: Arc::new(LexiconTranslator::new()),
            synthesizer: Arc::new(SilentSpeechSynthesizer::default()),
            timeout: config.timeout(),
            animation_format,
            region: config.region.clone(),
            voice_type: config.voice_type.clone(),
            max_synthesis_chars: config.max_synthesis_chars,
        })
    }

    pub fn with_sign_recognizer(mut self, sign: Arc<dyn SignRecognizer>) -> Self {
        self.sign = sign;
        self
    }

    pub fn with_speech_recognizer(mut self, speech: Arc<dyn SpeechRecognizer>) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn SignTranslator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn recognize_sign(
        &self,
        session_id: &str,
        frame: &serde_json::Value,
    ) -> Result<SignRecognition, RelayError> {
        bounded("sign recognizer", self.timeout, self.sign.recognize(session_id, frame)).await
    }

    pub async fn recognize_speech(&self, audio: &[u8]) -> Result<SpeechRecognition, RelayError> {
        bounded("speech recognizer", self.timeout, self.speech.recognize(audio)).await
    }

    /// Render `text` in the configured format and region
    pub async fn translate_to_sign(&self, text: &str) -> Result<AnimationPayload, RelayError> {
        self.translate(text, self.animation_format, &self.region).await
    }

    pub async fn translate(
        &self,
        text: &str,
        format: AnimationFormat,
        region: &str,
    ) -> Result<AnimationPayload, RelayError> {
        bounded(
            "sign translator",
            self.timeout,
            self.translator.translate(text, format, region),
        )
        .await
    }

    /// Read a gesture sequence back as text in the configured region
    pub async fn interpret_signs(&self, gestures: &[String]) -> Result<SignInterpretation, RelayError> {
        bounded(
            "sign translator",
            self.timeout,
            self.translator.interpret(gestures, &self.region),
        )
        .await
    }

    pub async fn gesture_catalogue(&self) -> Result<Vec<GestureInfo>, RelayError> {
        bounded("sign translator", self.timeout, self.translator.catalogue()).await
    }

    /// Synthesize `text`, refusing anything longer than `max_synthesis_chars`
    pub async fn synthesize(&self, text: &str, voice_type: Option<&str>) -> Result<Vec<u8>, RelayError> {
        if text.chars().count() > self.max_synthesis_chars {
            return Err(RelayError::validation(format!(
                "text exceeds {} characters",
                self.max_synthesis_chars
            )));
        }
        let voice = voice_type.unwrap_or(self.voice_type.as_str());
        bounded(
            "speech synthesizer",
            self.timeout,
            self.synthesizer.synthesize(text, voice),
        )
        .await
    }

    pub async fn reset_session(&self, session_id: &str) {
        self.sign.reset(session_id).await;
    }
}

async fn bounded<T, F>(collaborator: &'static str, limit: Duration, call: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("{} failed: {:#}", collaborator, e);
            Err(RelayError::CollaboratorFailed {
                collaborator,
                reason: e.to_string(),
            })
        }
        Err(_) => {
            warn!("{} timed out after {:?}", collaborator, limit);
            Err(RelayError::CollaboratorTimeout {
                collaborator,
                after: limit,
            })
        }
    }
}
