use crate::error::Error;
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// The only event this broker ever emits, in text/event-stream framing.
pub const RELOAD_FRAME: &[u8] = b"data: reload\n\n";

/// Identifies a streaming client by its transport-level peer address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for ConnectionId {
    fn from(peer: SocketAddr) -> Self {
        Self(peer.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A writable, flushable byte stream into one client's response.
///
/// `write` may buffer; only `flush` guarantees the bytes are handed to the
/// transport. Both fail with `ErrorKind::SinkWriteFailure` once the client
/// is gone.
pub trait Sink: Send + Sync {
    fn write(&self, frame: &[u8]) -> Result<(), Error>;

    fn flush(&self) -> Result<(), Error>;

    /// Whether this sink supports explicit flushing. Sinks that answer `false`
    /// are refused at subscribe time.
    fn is_flushable(&self) -> bool {
        true
    }
}

/// Sink backed by an unbounded channel whose receiver feeds an HTTP response body.
///
/// Writes accumulate in a local buffer and each flush forwards the buffered
/// bytes as a single chunk.
pub struct ChannelSink {
    buffer: Mutex<BytesMut>,
    sender: UnboundedSender<Bytes>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<Bytes>) -> Self {
        Self {
            buffer: Mutex::new(BytesMut::new()),
            sender,
        }
    }

    /// Creates a sink along with the receiving half that the response body drains.
    pub fn channel() -> (Self, UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn buffer(&self) -> MutexGuard<'_, BytesMut> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for ChannelSink {
    fn write(&self, frame: &[u8]) -> Result<(), Error> {
        if self.sender.is_closed() {
            return Err(Error::sink_write_failure("client stream closed"));
        }

        self.buffer().extend_from_slice(frame);
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let chunk = self.buffer().split().freeze();
        if chunk.is_empty() {
            return Ok(());
        }

        self.sender.send(chunk).map_err(Error::sink_write_failure)
    }
}

impl fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChannelSink")
            .field("buffered", &self.buffer().len())
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
