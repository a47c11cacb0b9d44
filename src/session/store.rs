use super::session::{Participant, Role, Session};
use super::stats::SessionSummary;
use crate::connection::ConnectionId;
use crate::error::RelayError;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Result of removing a participant from a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Participant removed; these participant ids remain
    Left { remaining: Vec<String> },
    /// Participant removed and the session was deleted because it became empty
    Closed,
    /// The participant was not (or no longer) bound to the session
    NotMember,
}

/// Concurrent map of session id to session record
///
/// Every read-modify-write goes through the map's entry API, so mutations of
/// one session id are atomic while unrelated ids live in other shards.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-attach: add (or overwrite) `participant_id` in `session_id`,
    /// creating the session if needed. Returns the resulting participant ids.
    pub fn join(
        &self,
        session_id: &str,
        participant_id: &str,
        role: Role,
        connection_id: ConnectionId,
    ) -> Vec<String> {
        self.join_at(session_id, participant_id, role, connection_id, Utc::now())
    }

    pub fn join_at(
        &self,
        session_id: &str,
        participant_id: &str,
        role: Role,
        connection_id: ConnectionId,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut session = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!("Creating session {}", session_id);
                Session::new(session_id.to_string(), now)
            });

        session.upsert(
            participant_id.to_string(),
            Participant {
                connection_id,
                role,
                joined_at: now,
            },
        );
        session.touch(now);

        session.participant_ids()
    }

    /// Record activity now. Returns false (and creates nothing) for an unknown session.
    pub fn touch(&self, session_id: &str) -> bool {
        self.touch_at(session_id, Utc::now())
    }

    pub fn touch_at(&self, session_id: &str, at: DateTime<Utc>) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut session) => {
                session.touch(at);
                true
            }
            None => {
                debug!("Ignoring activity for unknown session {}", session_id);
                false
            }
        }
    }

    /// Remove a participant regardless of the connection it is bound to.
    pub fn leave(&self, session_id: &str, participant_id: &str) -> Result<LeaveOutcome, RelayError> {
        self.remove_participant(session_id, participant_id, None)
            .ok_or_else(|| RelayError::UnknownSession(session_id.to_string()))
    }

    /// Remove a participant only if it is still bound to `connection_id`.
    ///
    /// Used on disconnect: a participant that re-joined from a newer
    /// connection must survive the old connection closing.
    pub fn release(
        &self,
        session_id: &str,
        participant_id: &str,
        connection_id: &ConnectionId,
    ) -> LeaveOutcome {
        self.remove_participant(session_id, participant_id, Some(connection_id))
            .unwrap_or(LeaveOutcome::NotMember)
    }

    fn remove_participant(
        &self,
        session_id: &str,
        participant_id: &str,
        bound_to: Option<&ConnectionId>,
    ) -> Option<LeaveOutcome> {
        let Entry::Occupied(mut entry) = self.sessions.entry(session_id.to_string()) else {
            return None;
        };

        let owned = match (entry.get().participant(participant_id), bound_to) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(p), Some(conn)) => &p.connection_id == conn,
        };
        if !owned {
            return Some(LeaveOutcome::NotMember);
        }

        entry.get_mut().remove(participant_id);
        if entry.get().is_empty() {
            entry.remove();
            info!("Closing empty session {}", session_id);
            return Some(LeaveOutcome::Closed);
        }

        Some(LeaveOutcome::Left {
            remaining: entry.get().participant_ids(),
        })
    }

    /// Current participant ids, or empty if the session does not exist
    pub fn list_participants(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .map(|s| s.participant_ids())
            .unwrap_or_default()
    }

    pub fn participant(&self, session_id: &str, participant_id: &str) -> Option<Participant> {
        self.sessions
            .get(session_id)
            .and_then(|s| s.participant(participant_id).cloned())
    }

    /// Connections of every participant in the session
    pub fn connection_ids(&self, session_id: &str) -> Vec<ConnectionId> {
        self.sessions
            .get(session_id)
            .map(|s| s.connection_ids())
            .unwrap_or_default()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn get(&self, session_id: &str) -> Option<SessionSummary> {
        self.sessions.get(session_id).map(|s| SessionSummary::from(&*s))
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut all: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| SessionSummary::from(entry.value()))
            .collect();
        all.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        all
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Ids of sessions idle for longer than `threshold`. Detection only;
    /// nothing is removed.
    pub fn evict_if_stale(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_stale(now, threshold))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Remove `session_id` if it is still stale, calling `on_evict` with the
    /// session before it is dropped. The staleness re-check, the callback and
    /// the removal all happen under the session's entry lock, so a concurrent
    /// touch either lands first (and the session survives) or finds it gone.
    ///
    /// `on_evict` must not call back into this store.
    pub fn evict<F>(&self, session_id: &str, now: DateTime<Utc>, threshold: Duration, on_evict: F) -> bool
    where
        F: FnOnce(&Session),
    {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) if entry.get().is_stale(now, threshold) => {
                on_evict(entry.get());
                entry.remove();
                true
            }
            _ => false,
        }
    }
}
