use crate::error::RelayError;
use crate::protocol::OutboundEvent;
use dashmap::DashMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of one live transport connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(format!("conn-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// "This connection participates in session X as participant Y"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub session_id: String,
    pub participant_id: String,
}

struct Connection {
    tx: mpsc::Sender<OutboundEvent>,
    binding: Option<Binding>,
}

/// Registry of live connections: their outbound queues and at most one
/// session binding each.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
    queue_capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a connection with no binding. Returns the receiving end of
    /// its outbound queue, to be drained by the transport writer.
    pub fn register(&self, id: ConnectionId) -> mpsc::Receiver<OutboundEvent> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.connections.insert(id, Connection { tx, binding: None });
        rx
    }

    /// Bind a registered connection, returning the binding it replaced.
    pub fn bind(
        &self,
        id: &ConnectionId,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Option<Binding>, RelayError> {
        let mut conn = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RelayError::UnknownConnection(id.to_string()))?;

        Ok(conn.binding.replace(Binding {
            session_id: session_id.to_string(),
            participant_id: participant_id.to_string(),
        }))
    }

    pub fn binding(&self, id: &ConnectionId) -> Option<Binding> {
        self.connections.get(id).and_then(|c| c.binding.clone())
    }

    /// Clear the binding, returning it. `None` if unregistered or unbound.
    pub fn unbind(&self, id: &ConnectionId) -> Option<Binding> {
        self.connections.get_mut(id).and_then(|mut c| c.binding.take())
    }

    /// Clear the binding only if it still points at `session_id`
    pub fn unbind_from(&self, id: &ConnectionId, session_id: &str) -> bool {
        match self.connections.get_mut(id) {
            Some(mut conn) if conn.binding.as_ref().map(|b| b.session_id.as_str()) == Some(session_id) => {
                conn.binding = None;
                true
            }
            _ => false,
        }
    }

    /// Forget the connection entirely, returning whatever binding it held.
    /// A second call for the same id is a no-op.
    pub fn unregister(&self, id: &ConnectionId) -> Option<Binding> {
        self.connections.remove(id).and_then(|(_, c)| c.binding)
    }

    pub fn is_registered(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue an event for one connection. Never blocks: a full queue drops
    /// the event, an unknown connection is ignored.
    pub fn send(&self, id: &ConnectionId, event: OutboundEvent) -> bool {
        let Some(tx) = self.connections.get(id).map(|c| c.tx.clone()) else {
            debug!("Dropping {} for unregistered connection {}", event.name(), id);
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("Outbound queue full for {}, dropping {}", id, event.name());
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Queue the same event for several connections; returns how many accepted it
    pub fn send_all<'a, I>(&self, ids: I, event: &OutboundEvent) -> usize
    where
        I: IntoIterator<Item = &'a ConnectionId>,
    {
        ids.into_iter()
            .filter(|id| self.send(id, event.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event() -> OutboundEvent {
        OutboundEvent::error("boom")
    }

    #[test]
    fn test_register_starts_unbound() {
        let registry = ConnectionRegistry::new(8);
        let id = ConnectionId::from("c1");
        let _rx = registry.register(id.clone());

        assert!(registry.is_registered(&id));
        assert_eq!(registry.binding(&id), None);
    }

    #[test]
    fn test_bind_requires_registration() {
        let registry = ConnectionRegistry::new(8);
        let err = registry.bind(&ConnectionId::from("ghost"), "S1", "p1").unwrap_err();
        assert_eq!(err, RelayError::UnknownConnection("ghost".to_string()));
    }

    #[test]
    fn test_rebind_returns_prior_binding() {
        let registry = ConnectionRegistry::new(8);
        let id = ConnectionId::from("c1");
        let _rx = registry.register(id.clone());

        assert_eq!(registry.bind(&id, "S1", "p1").unwrap(), None);
        let prior = registry.bind(&id, "S2", "p1").unwrap();

        assert_eq!(
            prior,
            Some(Binding {
                session_id: "S1".to_string(),
                participant_id: "p1".to_string()
            })
        );
        assert_eq!(registry.binding(&id).unwrap().session_id, "S2");
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new(8);
        let id = ConnectionId::from("c1");
        let _rx = registry.register(id.clone());
        registry.bind(&id, "S1", "p1").unwrap();

        assert!(registry.unregister(&id).is_some());
        assert_eq!(registry.unregister(&id), None);
        assert_eq!(registry.unbind(&id), None);
    }

    #[tokio::test]
    async fn test_send_delivers_and_drops_when_full() {
        let registry = ConnectionRegistry::new(1);
        let id = ConnectionId::from("c1");
        let mut rx = registry.register(id.clone());

        assert!(registry.send(&id, error_event()));
        assert!(!registry.send(&id, error_event()));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.name(), "error");
    }

    #[test]
    fn test_send_to_unknown_connection_is_ignored() {
        let registry = ConnectionRegistry::new(8);
        assert!(!registry.send(&ConnectionId::from("ghost"), error_event()));
    }
}
