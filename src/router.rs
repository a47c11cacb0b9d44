// Event router for the interpreter namespace
//
// Each inbound event is validated, checked against session membership,
// handed to the relevant collaborator and the result fanned out to the
// session. The router itself holds no per-session state: everything lives
// in the coordinator's maps, and no map lock is held across a collaborator
// call.

use crate::collaborators::{Collaborators, SignRecognition};
use crate::connection::{Binding, ConnectionId};
use crate::coordinator::Coordinator;
use crate::error::RelayError;
use crate::protocol::{parse_inbound, InboundEvent, OutboundEvent};
use crate::session::{LeaveOutcome, Role};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct EventRouter {
    coordinator: Arc<Coordinator>,
    collaborators: Collaborators,
}

impl EventRouter {
    pub fn new(coordinator: Arc<Coordinator>, collaborators: Collaborators) -> Self {
        Self {
            coordinator,
            collaborators,
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Register a new transport connection. The returned receiver yields
    /// every event addressed to it.
    pub fn connect(&self, connection_id: ConnectionId) -> mpsc::Receiver<OutboundEvent> {
        debug!("Registering connection {}", connection_id);
        self.coordinator.connections.register(connection_id)
    }

    /// Parse, validate and dispatch one raw text frame.
    ///
    /// Callers must await this before handling the next frame from the same
    /// connection; that is what keeps per-connection ordering FIFO.
    pub async fn handle_text(&self, connection_id: &ConnectionId, raw: &str) {
        match parse_inbound(raw) {
            Ok(event) => self.handle(connection_id, event).await,
            Err(e) => self.reject(connection_id, &e),
        }
    }

    pub async fn handle(&self, connection_id: &ConnectionId, event: InboundEvent) {
        debug!(
            "{} from {} for session {}",
            event.name(),
            connection_id,
            event.session_id()
        );

        let outcome = match event {
            InboundEvent::Join {
                session_id,
                participant_id,
                role,
            } => self.join(connection_id, &session_id, &participant_id, role).await,
            InboundEvent::SignFrame { session_id, frame } => {
                self.sign_frame(connection_id, &session_id, &frame).await
            }
            InboundEvent::SpeechAudio { session_id, audio } => {
                self.speech_audio(connection_id, &session_id, &audio).await
            }
            InboundEvent::TextMessage {
                session_id,
                text,
                from_participant_id,
            } => {
                self.text_message(connection_id, &session_id, &text, &from_participant_id)
                    .await
            }
            InboundEvent::Leave {
                session_id,
                participant_id,
            } => self.leave(connection_id, &session_id, &participant_id).await,
        };

        if let Err(e) = outcome {
            self.reject(connection_id, &e);
        }
    }

    /// Report a failure to the originating connection only
    pub fn reject(&self, connection_id: &ConnectionId, err: &RelayError) {
        match err {
            RelayError::CollaboratorFailed { .. } | RelayError::CollaboratorTimeout { .. } => {
                warn!("Event from {} failed: {}", connection_id, err)
            }
            _ => debug!("Rejecting event from {}: {}", connection_id, err),
        }
        self.coordinator
            .send(connection_id, OutboundEvent::error(err.client_message()));
    }

    /// Transport closed: drop the connection and leave whatever session it
    /// was in. Safe to call more than once.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        match self.coordinator.connections.unregister(connection_id) {
            Some(binding) => {
                info!(
                    "Connection {} closed, removing {} from session {}",
                    connection_id, binding.participant_id, binding.session_id
                );
                self.depart(connection_id, &binding).await;
            }
            None => debug!("Connection {} closed with no session", connection_id),
        }
    }

    async fn join(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        participant_id: &str,
        role: Role,
    ) -> Result<(), RelayError> {
        let connections = &self.coordinator.connections;
        if !connections.is_registered(connection_id) {
            return Err(RelayError::UnknownConnection(connection_id.to_string()));
        }

        // Switching session or identity is a leave followed by a join
        if let Some(prior) = connections.binding(connection_id) {
            if prior.session_id != session_id || prior.participant_id != participant_id {
                self.depart(connection_id, &prior).await;
            }
        }

        let active = self.coordinator.sessions.join(
            session_id,
            participant_id,
            role,
            connection_id.clone(),
        );
        connections.bind(connection_id, session_id, participant_id)?;

        info!(
            "Participant {} ({}) joined session {} ({} present)",
            participant_id,
            role,
            session_id,
            active.len()
        );

        self.coordinator
            .send(connection_id, OutboundEvent::session_joined(session_id, active));
        self.coordinator.broadcast_except(
            session_id,
            OutboundEvent::user_joined(participant_id, role),
            Some(connection_id),
        );

        Ok(())
    }

    async fn sign_frame(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        frame: &serde_json::Value,
    ) -> Result<(), RelayError> {
        if self.member(connection_id, session_id, "sign_language_frame")?.is_none() {
            return Ok(());
        }
        self.coordinator.sessions.touch(session_id);

        let result = self.recognize_sign(session_id, frame).await?;
        self.coordinator
            .broadcast(session_id, OutboundEvent::sign_result(&result));

        if result.is_complete_utterance && !result.accumulated_text.is_empty() {
            self.coordinator.broadcast(
                session_id,
                OutboundEvent::text_to_speech(&result.accumulated_text),
            );
        }

        Ok(())
    }

    /// Run the sign recognizer for `session_id`. A session that closed while
    /// the call was in flight has its recognizer state cleared again, since
    /// the call may have recreated it after the close reset it.
    pub async fn recognize_sign(
        &self,
        session_id: &str,
        frame: &serde_json::Value,
    ) -> Result<SignRecognition, RelayError> {
        let result = self.collaborators.recognize_sign(session_id, frame).await;
        if !self.coordinator.sessions.contains(session_id) {
            debug!("Session {} closed during recognition", session_id);
            self.collaborators.reset_session(session_id).await;
        }
        result
    }

    async fn speech_audio(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        audio: &[u8],
    ) -> Result<(), RelayError> {
        if self.member(connection_id, session_id, "speech_audio")?.is_none() {
            return Ok(());
        }
        self.coordinator.sessions.touch(session_id);

        let speech = self.collaborators.recognize_speech(audio).await?;
        if speech.text.trim().is_empty() {
            debug!("No transcript for audio in session {}", session_id);
            return Ok(());
        }

        let animation = self.collaborators.translate_to_sign(&speech.text).await?;
        self.coordinator
            .broadcast(session_id, OutboundEvent::animation(animation, &speech.text));

        Ok(())
    }

    async fn text_message(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        text: &str,
        from_participant_id: &str,
    ) -> Result<(), RelayError> {
        let Some(binding) = self.member(connection_id, session_id, "text_message")? else {
            return Ok(());
        };
        if binding.participant_id != from_participant_id {
            return Err(RelayError::validation(
                "fromParticipantId does not match the joined participant",
            ));
        }
        self.coordinator.sessions.touch(session_id);

        self.coordinator.broadcast(
            session_id,
            OutboundEvent::text_message(text, from_participant_id),
        );

        let needs_signing = self
            .coordinator
            .sessions
            .participant(session_id, from_participant_id)
            .map(|p| p.role.needs_sign_translation())
            .unwrap_or(false);

        if needs_signing {
            let animation = self.collaborators.translate_to_sign(text).await?;
            self.coordinator
                .broadcast(session_id, OutboundEvent::animation(animation, text));
        }

        Ok(())
    }

    async fn leave(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        participant_id: &str,
    ) -> Result<(), RelayError> {
        if !self.coordinator.sessions.contains(session_id) {
            return Err(RelayError::UnknownSession(session_id.to_string()));
        }

        let binding = match self.coordinator.connections.binding(connection_id) {
            Some(b) if b.session_id == session_id && b.participant_id == participant_id => b,
            _ => {
                return Err(RelayError::NotParticipant {
                    session_id: session_id.to_string(),
                })
            }
        };

        self.coordinator.connections.unbind(connection_id);
        info!("Participant {} left session {}", participant_id, session_id);
        self.depart(connection_id, &binding).await;

        Ok(())
    }

    /// Resolve the sender's membership in `session_id`.
    ///
    /// `Ok(None)` means the session no longer exists and the event should be
    /// dropped quietly (a late event for a closed or reaped session).
    fn member(
        &self,
        connection_id: &ConnectionId,
        session_id: &str,
        event: &str,
    ) -> Result<Option<Binding>, RelayError> {
        if !self.coordinator.sessions.contains(session_id) {
            warn!("Dropping {} for unknown session {}", event, session_id);
            return Ok(None);
        }

        let binding = self
            .coordinator
            .connections
            .binding(connection_id)
            .filter(|b| b.session_id == session_id)
            .filter(|b| {
                self.coordinator
                    .sessions
                    .participant(session_id, &b.participant_id)
                    .map_or(false, |p| &p.connection_id == connection_id)
            });

        match binding {
            Some(b) => Ok(Some(b)),
            None => Err(RelayError::NotParticipant {
                session_id: session_id.to_string(),
            }),
        }
    }

    /// Remove a bound participant from its session and tell whoever is left
    async fn depart(&self, connection_id: &ConnectionId, binding: &Binding) {
        let outcome = self.coordinator.sessions.release(
            &binding.session_id,
            &binding.participant_id,
            connection_id,
        );

        match outcome {
            LeaveOutcome::Left { remaining } => {
                debug!(
                    "{} participants remain in session {}",
                    remaining.len(),
                    binding.session_id
                );
                self.coordinator.broadcast(
                    &binding.session_id,
                    OutboundEvent::user_left(&binding.participant_id),
                );
            }
            LeaveOutcome::Closed => {
                self.collaborators.reset_session(&binding.session_id).await;
            }
            LeaveOutcome::NotMember => {}
        }
    }
}
