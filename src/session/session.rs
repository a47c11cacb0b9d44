use crate::connection::ConnectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Role a participant plays in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Communicates in sign language; produces video frames
    Signer,
    /// Communicates by voice or text; receives sign animations
    Listener,
}

impl Role {
    /// Whether text typed by this role must be rendered as sign animation
    pub fn needs_sign_translation(&self) -> bool {
        matches!(self, Role::Listener)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Signer => "signer",
            Role::Listener => "listener",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // Older clients still send the classroom role names
            "signer" | "student" => Ok(Role::Signer),
            "listener" | "teacher" => Ok(Role::Listener),
            other => Err(format!("unknown role `{}`", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant's membership entry within one session
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Connection the participant is currently reachable on
    pub connection_id: ConnectionId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

/// One ongoing interpretation conversation
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    participants: HashMap<String, Participant>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            participants: HashMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn participants(&self) -> &HashMap<String, Participant> {
        &self.participants
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.get(participant_id)
    }

    pub fn participant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.participants.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.participants
            .values()
            .map(|p| p.connection_id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Advance the activity clock; never moves backwards
    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    pub(crate) fn upsert(&mut self, participant_id: String, participant: Participant) {
        self.participants.insert(participant_id, participant);
    }

    pub(crate) fn remove(&mut self, participant_id: &str) -> Option<Participant> {
        self.participants.remove(participant_id)
    }

    /// Idle for strictly longer than `threshold` as of `now`
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let idle_ms = now.signed_duration_since(self.last_activity).num_milliseconds();
        idle_ms > threshold.as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_role_parsing_accepts_aliases() {
        assert_eq!("signer".parse::<Role>().unwrap(), Role::Signer);
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Listener);
        assert_eq!("student".parse::<Role>().unwrap(), Role::Signer);
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_touch_is_monotonic() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let mut session = Session::new("s".to_string(), t0);

        let later = t0 + chrono::Duration::seconds(10);
        session.touch(later);
        session.touch(t0 + chrono::Duration::seconds(5));

        assert_eq!(session.last_activity(), later);
    }

    #[test]
    fn test_staleness_is_strict() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let session = Session::new("s".to_string(), t0);
        let threshold = Duration::from_secs(60);

        assert!(!session.is_stale(t0 + chrono::Duration::seconds(60), threshold));
        assert!(session.is_stale(t0 + chrono::Duration::milliseconds(60_001), threshold));
    }
}
