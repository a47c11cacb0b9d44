use std::time::Duration;
use thiserror::Error;

/// Errors raised while relaying events between session participants.
///
/// None of these are fatal: the router reports them to the originating
/// connection and carries on serving everyone else.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RelayError {
    /// Missing or malformed field in an inbound event
    #[error("{0}")]
    Validation(String),

    #[error("session {0} not found")]
    UnknownSession(String),

    #[error("connection {0} is not registered")]
    UnknownConnection(String),

    #[error("connection is not a participant of session {session_id}")]
    NotParticipant { session_id: String },

    #[error("{collaborator} failed: {reason}")]
    CollaboratorFailed {
        collaborator: &'static str,
        reason: String,
    },

    #[error("{collaborator} timed out after {after:?}")]
    CollaboratorTimeout {
        collaborator: &'static str,
        after: Duration,
    },
}

impl RelayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Message delivered to the client in an `error` event.
    ///
    /// Collaborator failures are reported generically so internal detail
    /// stays in the server log.
    pub fn client_message(&self) -> String {
        match self {
            Self::CollaboratorFailed { collaborator, .. }
            | Self::CollaboratorTimeout { collaborator, .. } => {
                format!("failed to process {}", collaborator_subject(collaborator))
            }
            other => other.to_string(),
        }
    }
}

fn collaborator_subject(collaborator: &str) -> &'static str {
    match collaborator {
        "sign recognizer" => "video frame",
        "speech recognizer" => "audio",
        "sign translator" => "message",
        _ => "request",
    }
}
