//! In-memory sinks shared by the unit tests of this crate.
use crate::connection::Sink;
use crate::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Records every flushed chunk. Can be switched into a failing state to
/// simulate a client that went away.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    pending: Arc<Mutex<Vec<u8>>>,
    flushed: Arc<Mutex<Vec<Vec<u8>>>>,
    broken: Arc<AtomicBool>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn broken() -> Self {
        let sink = Self::new();
        sink.break_pipe();
        sink
    }

    pub(crate) fn break_pipe(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
        self.flushed.lock().unwrap().clone()
    }
}

impl Sink for RecordingSink {
    fn write(&self, frame: &[u8]) -> Result<(), Error> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::sink_write_failure("broken pipe"));
        }
        self.pending.lock().unwrap().extend_from_slice(frame);
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let chunk = std::mem::take(&mut *self.pending.lock().unwrap());
        if !chunk.is_empty() {
            self.flushed.lock().unwrap().push(chunk);
        }
        Ok(())
    }
}

/// A sink without flush support.
pub(crate) struct UnflushableSink;

impl Sink for UnflushableSink {
    fn write(&self, _frame: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        Err(Error::streaming_unsupported())
    }

    fn is_flushable(&self) -> bool {
        false
    }
}
