use crate::collaborators::Collaborators;
use crate::connection::ConnectionId;
use crate::coordinator::Coordinator;
use crate::protocol::OutboundEvent;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Periodic sweep that closes sessions nobody has used for a while
pub struct Reaper {
    coordinator: Arc<Coordinator>,
    collaborators: Collaborators,
    /// Idle time after which a session is closed
    threshold: Duration,
    /// Time between sweeps
    interval: Duration,
}

impl Reaper {
    pub fn new(
        coordinator: Arc<Coordinator>,
        collaborators: Collaborators,
        threshold: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            collaborators,
            threshold,
            interval,
        }
    }

    /// Close every session idle for longer than the threshold as of `now`.
    /// Participants get a `session_timeout` before the session is removed.
    /// Returns the ids of the sessions closed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Vec<String> {
        let candidates = self.coordinator.sessions.evict_if_stale(now, self.threshold);
        let mut evicted = Vec::with_capacity(candidates.len());

        for session_id in candidates {
            let connections = &self.coordinator.connections;
            let mut notified: Vec<ConnectionId> = Vec::new();

            let removed = self
                .coordinator
                .sessions
                .evict(&session_id, now, self.threshold, |session| {
                    notified = session.connection_ids();
                    connections.send_all(&notified, &OutboundEvent::session_timeout(session.id(), now));
                    // Still under the entry lock: a concurrent rejoin binds after this
                    for connection_id in &notified {
                        connections.unbind_from(connection_id, session.id());
                    }
                });

            if !removed {
                // Activity arrived between detection and eviction
                continue;
            }

            self.collaborators.reset_session(&session_id).await;

            info!(
                "Closed inactive session {} ({} participants notified)",
                session_id,
                notified.len()
            );
            evicted.push(session_id);
        }

        evicted
    }

    /// Run the sweep on a fixed interval until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Session reaper started (every {:?}, idle threshold {:?})",
                self.interval, self.threshold
            );

            let period = if self.interval.is_zero() {
                warn!("Reaper interval is zero, sweeping every second instead");
                Duration::from_secs(1)
            } else {
                self.interval
            };
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // first tick completes immediately

            loop {
                ticker.tick().await;
                let evicted = self.sweep(Utc::now()).await;
                if !evicted.is_empty() {
                    info!("Reaper closed {} inactive sessions", evicted.len());
                }
            }
        })
    }
}
