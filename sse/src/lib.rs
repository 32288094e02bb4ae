//! Live-reload connection broker.
//!
//! Holds the set of open `text/event-stream` responses and pushes a single
//! fixed `reload` event to all of them on demand.
//!
//! # Architecture
//!
//! - **ConnectionRegistry**: identity → sink map behind one reader/writer lock.
//!   Insert and remove are exclusive, broadcast traversal is shared.
//! - **Broker**: subscribe / unsubscribe / broadcast over the registry. Write
//!   failures found during a broadcast are evicted only after the shared lock
//!   is released, so a traversal never needs to upgrade its guard.
//! - **Subscription**: RAII registration guard. Whatever ends the request
//!   (client disconnect, shutdown, task abort or panic) drops it and the
//!   entry is removed.
//!
//! # Modules
//!
//! - `connection`: `ConnectionId`, the `Sink` trait and the channel-backed sink
//! - `registry`: `ConnectionRegistry`
//! - `broker`: `Broker` and `Subscription`
//! - `error`: error kinds raised by the broker

pub mod broker;
pub mod connection;
pub mod error;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_sinks;

pub use broker::{Broker, Subscription};
pub use connection::{ChannelSink, ConnectionId, Sink, RELOAD_FRAME};
