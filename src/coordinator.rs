use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::protocol::OutboundEvent;
use crate::session::SessionStore;
use tracing::debug;

/// Owner of the process-wide session and connection maps.
///
/// Built once at startup and shared as `Arc<Coordinator>` with the router,
/// the reaper and the HTTP handlers.
pub struct Coordinator {
    pub sessions: SessionStore,
    pub connections: ConnectionRegistry,
}

impl Coordinator {
    pub fn new(outbound_queue: usize) -> Self {
        Self {
            sessions: SessionStore::new(),
            connections: ConnectionRegistry::new(outbound_queue),
        }
    }

    /// Deliver `event` to one connection
    pub fn send(&self, connection_id: &ConnectionId, event: OutboundEvent) -> bool {
        self.connections.send(connection_id, event)
    }

    /// Deliver `event` to every participant of the session
    pub fn broadcast(&self, session_id: &str, event: OutboundEvent) -> usize {
        self.broadcast_except(session_id, event, None)
    }

    /// Deliver `event` to every participant of the session except `skip`
    pub fn broadcast_except(
        &self,
        session_id: &str,
        event: OutboundEvent,
        skip: Option<&ConnectionId>,
    ) -> usize {
        let targets: Vec<ConnectionId> = self
            .sessions
            .connection_ids(session_id)
            .into_iter()
            .filter(|id| Some(id) != skip)
            .collect();

        let delivered = self.connections.send_all(&targets, &event);
        debug!(
            "Broadcast {} to session {} ({}/{} delivered)",
            event.name(),
            session_id,
            delivered,
            targets.len()
        );
        delivered
    }
}
