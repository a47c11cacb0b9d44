use super::{SpeechRecognition, SpeechRecognizer, SpeechSynthesizer};
use anyhow::{Context, Result};
use std::io::Cursor;
use tracing::debug;

/// Speech recognizer for clients that transcribe on-device and send the
/// transcript as the audio payload. Non-UTF-8 audio yields no transcript.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackSpeechRecognizer;

#[async_trait::async_trait]
impl SpeechRecognizer for LoopbackSpeechRecognizer {
    async fn recognize(&self, audio: &[u8]) -> Result<SpeechRecognition> {
        let text = match std::str::from_utf8(audio) {
            Ok(text) => text.trim().to_string(),
            Err(_) => {
                debug!("Audio payload of {} bytes is not a transcript", audio.len());
                String::new()
            }
        };

        Ok(SpeechRecognition {
            confidence: if text.is_empty() { 0.0 } else { 1.0 },
            text,
            is_final: true,
        })
    }
}

/// Produces a silent WAV clip whose length follows the text, so clients
/// always receive a playable container.
#[derive(Debug, Clone)]
pub struct SilentSpeechSynthesizer {
    pub sample_rate: u32,
    /// Clip length per input character for the standard voice
    pub ms_per_char: u32,
}

impl Default for SilentSpeechSynthesizer {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            ms_per_char: 60,
        }
    }
}

impl SilentSpeechSynthesizer {
    fn ms_per_char(&self, voice_type: &str) -> u32 {
        match voice_type {
            "slow" => self.ms_per_char * 2,
            "fast" => self.ms_per_char / 2,
            _ => self.ms_per_char,
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SilentSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice_type: &str) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let duration_ms = text.chars().count() as u64 * self.ms_per_char(voice_type) as u64;
        let samples = duration_ms * self.sample_rate as u64 / 1000;

        let wav = tokio::task::spawn_blocking(move || silent_wav(spec, samples))
            .await
            .context("WAV encoding task failed")??;

        debug!(
            "Synthesized {} ms of audio ({} voice) for {} chars",
            duration_ms,
            voice_type,
            text.chars().count()
        );

        Ok(wav)
    }
}

fn silent_wav(spec: hound::WavSpec, samples: u64) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to start WAV stream")?;
        for _ in 0..samples {
            writer.write_sample(0i16)?;
        }
        writer.finalize().context("Failed to finalize WAV stream")?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_transcript() {
        let result = LoopbackSpeechRecognizer
            .recognize(" Buenos días ".as_bytes())
            .await
            .unwrap();

        assert_eq!(result.text, "Buenos días");
        assert!(result.is_final);
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_binary_audio_has_no_transcript() {
        let result = LoopbackSpeechRecognizer
            .recognize(&[0xff, 0xfe, 0x00, 0x80])
            .await
            .unwrap();

        assert!(result.text.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_synthesized_wav_is_readable() {
        let synth = SilentSpeechSynthesizer::default();
        let bytes = synth.synthesize("hola", "standard").await.unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        // 4 chars * 60 ms at 16 kHz
        assert_eq!(reader.len(), 3840);
    }

    #[tokio::test]
    async fn test_slow_voice_is_longer() {
        let synth = SilentSpeechSynthesizer::default();
        let standard = synth.synthesize("hola", "standard").await.unwrap();
        let slow = synth.synthesize("hola", "slow").await.unwrap();

        assert!(slow.len() > standard.len());
    }
}
