//! In-memory session state
//!
//! This module tracks interpretation sessions:
//! - Participant roster (who is in which session, under which role)
//! - Activity timestamps used for liveness
//! - Create-on-first-join and delete-when-empty lifecycle
//! - Detection of stale sessions for the reaper

mod session;
mod stats;
mod store;

pub use session::{Participant, Role, Session};
pub use stats::{ParticipantSummary, SessionSummary};
pub use store::{LeaveOutcome, SessionStore};
