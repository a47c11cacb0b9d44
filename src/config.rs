use crate::collaborators::AnimationFormat;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub sessions: SessionsConfig,
    pub collaborators: CollaboratorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Sessions idle for longer than this are reaped
    pub inactivity_threshold_secs: u64,
    /// How often the reaper sweeps
    pub sweep_interval_secs: u64,
    /// Outbound events buffered per connection before dropping
    pub outbound_queue: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorsConfig {
    /// Upper bound on any single recognition/translation call
    pub timeout_ms: u64,
    pub animation_format: String,
    pub region: String,
    pub voice_type: String,
    pub max_gesture_history: usize,
    /// Longest text accepted for speech synthesis, in characters
    pub max_synthesis_chars: usize,
}

impl SessionsConfig {
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl CollaboratorsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from built-in defaults, an optional file at `path`
    /// (extension inferred) and `RELAY__`-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("RELAY").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()
            .with_context(|| format!("Invalid config in {}", path))?;
        Ok(cfg)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("sessions.inactivity_threshold_secs", self.sessions.inactivity_threshold_secs),
            ("sessions.sweep_interval_secs", self.sessions.sweep_interval_secs),
            ("sessions.outbound_queue", self.sessions.outbound_queue as u64),
            ("collaborators.timeout_ms", self.collaborators.timeout_ms),
            ("collaborators.max_gesture_history", self.collaborators.max_gesture_history as u64),
            ("collaborators.max_synthesis_chars", self.collaborators.max_synthesis_chars as u64),
        ];
        for (key, value) in nonzero {
            if value == 0 {
                bail!("{} must be greater than zero", key);
            }
        }

        self.collaborators
            .animation_format
            .parse::<AnimationFormat>()
            .map_err(anyhow::Error::msg)
            .context("collaborators.animation_format")?;

        Ok(())
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "interpreter-relay")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 5000)?
            .set_default("sessions.inactivity_threshold_secs", 15 * 60)?
            .set_default("sessions.sweep_interval_secs", 5 * 60)?
            .set_default("sessions.outbound_queue", 256)?
            .set_default("collaborators.timeout_ms", 10_000)?
            .set_default("collaborators.animation_format", "animation")?
            .set_default("collaborators.region", "es")?
            .set_default("collaborators.voice_type", "standard")?
            .set_default("collaborators.max_gesture_history", 30)?
            .set_default("collaborators.max_synthesis_chars", 1000)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "interpreter-relay".to_string(),
                http: HttpConfig {
                    bind: "0.0.0.0".to_string(),
                    port: 5000,
                },
            },
            sessions: SessionsConfig {
                inactivity_threshold_secs: 15 * 60, // 15 minutes
                sweep_interval_secs: 5 * 60,        // 5 minutes
                outbound_queue: 256,
            },
            collaborators: CollaboratorsConfig {
                timeout_ms: 10_000,
                animation_format: "animation".to_string(),
                region: "es".to_string(),
                voice_type: "standard".to_string(),
                max_gesture_history: 30,
                max_synthesis_chars: 1000,
            },
        }
    }
}
