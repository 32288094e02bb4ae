use crate::connection::{ConnectionId, Sink, RELOAD_FRAME};
use crate::error::Error;
use crate::registry::{ConnectionRegistry, RegistrationToken};
use log::*;
use std::future::Future;
use std::sync::Arc;

/// Accepts streaming clients and pushes the reload event to all of them.
pub struct Broker {
    registry: Arc<ConnectionRegistry>,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a streaming client and return the guard that keeps it registered.
    ///
    /// Fails with `ErrorKind::StreamingUnsupported` when the sink cannot be
    /// flushed, in which case the registry is left untouched. Dropping the
    /// returned `Subscription` removes this registration again.
    pub fn register<S>(&self, connection_id: ConnectionId, sink: S) -> Result<Subscription, Error>
    where
        S: Sink + 'static,
    {
        if !sink.is_flushable() {
            warn!("Refusing SSE connection {connection_id}: sink cannot be flushed");
            return Err(Error::streaming_unsupported());
        }

        let token = self.registry.insert(connection_id.clone(), Arc::new(sink));
        info!("Registered new SSE connection {connection_id}");

        Ok(Subscription {
            registry: Arc::clone(&self.registry),
            connection_id,
            token,
        })
    }

    /// Register a streaming client and suspend until `cancelled` resolves.
    ///
    /// The registration is released on every exit path, including when the
    /// returned future is dropped before completion.
    pub async fn subscribe<S, C>(
        &self,
        connection_id: ConnectionId,
        sink: S,
        cancelled: C,
    ) -> Result<(), Error>
    where
        S: Sink + 'static,
        C: Future<Output = ()>,
    {
        self.register(connection_id, sink)?.hold(cancelled).await;
        Ok(())
    }

    /// Remove a client by identity. Idempotent.
    pub fn unsubscribe(&self, connection_id: &ConnectionId) {
        self.registry.remove(connection_id);
    }

    /// Write the reload event to every registered client.
    ///
    /// A client whose write or flush fails is evicted and delivery carries on
    /// with the rest. Evictions happen after the traversal has released the
    /// shared lock.
    pub fn broadcast(&self) {
        let mut delivered = 0usize;
        let failed = self.registry.for_each(|_, sink| {
            sink.write(RELOAD_FRAME)?;
            sink.flush()?;
            delivered += 1;
            Ok(())
        });

        let evicted = failed.len();
        for failure in failed {
            warn!(
                "Failed to send reload to connection {}: {}. Evicting it.",
                failure.connection_id, failure.error
            );
            self.registry.evict(&failure.connection_id, failure.token);
        }

        debug!("Broadcast reload to {delivered} connection(s), evicted {evicted}");
    }

    /// Drop every registration so open streams end. Used on server shutdown.
    pub fn shutdown(&self) {
        let count = self.registry.clear();
        info!("Closed {count} SSE connection(s)");
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.registry.contains(connection_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.registry.identities()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration of one streaming client.
///
/// Removes exactly its own registry entry when dropped. If the identity has
/// since been taken over by a newer subscribe, that newer entry is kept.
#[must_use = "dropping a Subscription unregisters the connection"]
pub struct Subscription {
    registry: Arc<ConnectionRegistry>,
    connection_id: ConnectionId,
    token: RegistrationToken,
}

impl Subscription {
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Keep the connection registered until `cancelled` resolves.
    pub async fn hold<C>(self, cancelled: C)
    where
        C: Future<Output = ()>,
    {
        cancelled.await;
        debug!("SSE connection {} cancelled", self.connection_id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.evict(&self.connection_id, self.token) {
            info!("Unregistered SSE connection {}", self.connection_id);
        }
    }
}
