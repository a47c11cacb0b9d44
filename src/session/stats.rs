use super::session::{Role, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a session, as exposed over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,

    /// Participants ordered by identifier
    pub participants: Vec<ParticipantSummary>,

    /// When the first participant joined
    pub created_at: DateTime<Utc>,

    /// Last join or relayed event
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub participant_id: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        let mut participants: Vec<ParticipantSummary> = session
            .participants()
            .iter()
            .map(|(id, p)| ParticipantSummary {
                participant_id: id.clone(),
                role: p.role,
                joined_at: p.joined_at,
            })
            .collect();
        participants.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));

        Self {
            session_id: session.id().to_string(),
            participants,
            created_at: session.created_at(),
            last_activity: session.last_activity(),
        }
    }
}
