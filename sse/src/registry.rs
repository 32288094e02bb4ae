use crate::connection::{ConnectionId, Sink};
use crate::error::Error;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Distinguishes one registration from a later one under the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationToken(Uuid);

impl RegistrationToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A live streaming client, owned exclusively by the registry.
struct Connection {
    sink: Arc<dyn Sink>,
    token: RegistrationToken,
}

/// A visit that returned an error during `ConnectionRegistry::for_each`.
#[derive(Debug)]
pub struct FailedVisit {
    pub connection_id: ConnectionId,
    pub token: RegistrationToken,
    pub error: Error,
}

/// Mapping from client identity to its open sink.
///
/// All access goes through one reader/writer lock owned by this instance:
/// `insert`, `remove`, `evict` and `clear` take it exclusively, `for_each`
/// shares it for the whole traversal. Nothing here ever upgrades a read
/// guard, so callers must apply removals found during a traversal only after
/// `for_each` has returned.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a sink under `connection_id`, replacing any previous entry.
    pub fn insert(&self, connection_id: ConnectionId, sink: Arc<dyn Sink>) -> RegistrationToken {
        let token = RegistrationToken::new();
        self.write().insert(connection_id, Connection { sink, token });
        token
    }

    /// Remove whatever is registered under `connection_id`. No-op if absent.
    pub fn remove(&self, connection_id: &ConnectionId) {
        self.write().remove(connection_id);
    }

    /// Remove the entry only if it is still the registration identified by
    /// `token`. Returns whether an entry was removed.
    pub fn evict(&self, connection_id: &ConnectionId, token: RegistrationToken) -> bool {
        let mut connections = self.write();
        match connections.get(connection_id) {
            Some(connection) if connection.token == token => {
                connections.remove(connection_id);
                true
            }
            _ => false,
        }
    }

    /// Visit every registered sink under the shared lock.
    ///
    /// The registry is never mutated here; entries whose visit failed are
    /// returned so the caller can evict them once the read guard is gone.
    pub fn for_each<F>(&self, mut visit: F) -> Vec<FailedVisit>
    where
        F: FnMut(&ConnectionId, &dyn Sink) -> Result<(), Error>,
    {
        let connections = self.read();
        let mut failed = Vec::new();

        for (connection_id, connection) in connections.iter() {
            if let Err(error) = visit(connection_id, connection.sink.as_ref()) {
                failed.push(FailedVisit {
                    connection_id: connection_id.clone(),
                    token: connection.token,
                    error,
                });
            }
        }

        failed
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.read().contains_key(connection_id)
    }

    pub fn identities(&self) -> Vec<ConnectionId> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut connections = self.write();
        let count = connections.len();
        connections.clear();
        count
    }

    // A panic while the lock is held cannot leave the map half-updated, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_sinks::RecordingSink;

    fn id(identity: &str) -> ConnectionId {
        ConnectionId::new(identity)
    }

    #[test]
    fn test_insert_makes_entry_visible() {
        let registry = ConnectionRegistry::new();
        registry.insert(id("10.0.0.1:4000"), Arc::new(RecordingSink::new()));

        assert!(registry.contains(&id("10.0.0.1:4000")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_same_identity_is_last_writer_wins() {
        let registry = ConnectionRegistry::new();
        let first = RecordingSink::new();
        let second = RecordingSink::new();

        let first_token = registry.insert(id("a"), Arc::new(first.clone()));
        let second_token = registry.insert(id("a"), Arc::new(second.clone()));

        assert_ne!(first_token, second_token);
        assert_eq!(registry.len(), 1);

        registry.for_each(|_, sink| sink.write(b"x").and_then(|_| sink.flush()));
        assert!(first.frames().is_empty());
        assert_eq!(second.frames(), vec![b"x".to_vec()]);
    }

    #[test]
    fn test_remove_twice_matches_remove_once() {
        let registry = ConnectionRegistry::new();
        registry.insert(id("a"), Arc::new(RecordingSink::new()));
        registry.insert(id("b"), Arc::new(RecordingSink::new()));

        registry.remove(&id("a"));
        let after_once = registry.identities();
        registry.remove(&id("a"));

        assert_eq!(registry.identities(), after_once);
        assert_eq!(registry.identities(), vec![id("b")]);
    }

    #[test]
    fn test_remove_unknown_identity_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.remove(&id("nobody"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_ignores_stale_token() {
        let registry = ConnectionRegistry::new();
        let stale = registry.insert(id("a"), Arc::new(RecordingSink::new()));
        let fresh = registry.insert(id("a"), Arc::new(RecordingSink::new()));

        assert!(!registry.evict(&id("a"), stale));
        assert!(registry.contains(&id("a")));

        assert!(registry.evict(&id("a"), fresh));
        assert!(!registry.evict(&id("a"), fresh));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_for_each_reports_failures_without_mutating() {
        let registry = ConnectionRegistry::new();
        registry.insert(id("ok"), Arc::new(RecordingSink::new()));
        let token = registry.insert(id("bad"), Arc::new(RecordingSink::broken()));

        let mut visited = 0;
        let failed = registry.for_each(|_, sink| {
            visited += 1;
            sink.write(b"x")
        });

        assert_eq!(visited, 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].connection_id, id("bad"));
        assert_eq!(failed[0].token, token);
        assert_eq!(failed[0].error.error_kind, ErrorKind::SinkWriteFailure);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_for_each_on_empty_registry_visits_nothing() {
        let registry = ConnectionRegistry::new();
        let mut visited = 0;
        let failed = registry.for_each(|_, _| {
            visited += 1;
            Ok(())
        });

        assert_eq!(visited, 0);
        assert!(failed.is_empty());
    }

    #[test]
    fn test_clear_drops_every_entry() {
        let registry = ConnectionRegistry::new();
        registry.insert(id("a"), Arc::new(RecordingSink::new()));
        registry.insert(id("b"), Arc::new(RecordingSink::new()));

        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
    }
}
