use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;
use std::time::Duration;

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::settings::LineSettings;
use crate::traits::SerialTransport;

/// One operation observed by a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Close,
    LineSettings(LineSettings),
    BreakOn,
    BreakOff,
    Write(Vec<u8>),
}

#[derive(Default)]
struct Shared {
    events: Mutex<VecDeque<TransportEvent>>,
    history_limit: Option<usize>,
    writes_total: AtomicUsize,
    writers: Mutex<HashSet<ThreadId>>,
    open: AtomicBool,
    reject_open: AtomicBool,
    reject_settings: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Duration>,
}

impl Shared {
    fn events(&self) -> MutexGuard<'_, VecDeque<TransportEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: TransportEvent) {
        let mut events = self.events();
        events.push_back(event);
        if let Some(limit) = self.history_limit {
            while events.len() > limit {
                events.pop_front();
            }
        }
    }
}

/// An in-memory serial transport that records everything done to it.
///
/// Used as a stand-in device for dry runs and tests. A [`MemoryProbe`]
/// obtained from [`probe`](MemoryTransport::probe) keeps observing (and
/// steering) the transport after it has been moved into a sender.
pub struct MemoryTransport {
    name: String,
    shared: Arc<Shared>,
}

impl MemoryTransport {
    /// Create a closed in-memory transport that keeps every event.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Create a closed in-memory transport that keeps only the most recent
    /// `limit` events. Write counters still cover the whole lifetime.
    pub fn with_history(name: impl Into<String>, limit: usize) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                history_limit: Some(limit),
                ..Shared::default()
            }),
        }
    }

    /// Handle for inspecting this transport from another owner.
    pub fn probe(&self) -> MemoryProbe {
        MemoryProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl SerialTransport for MemoryTransport {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn open(&mut self) -> Result<()> {
        if self.shared.reject_open.load(Ordering::SeqCst) {
            return Err(TransportError::Open {
                port: self.name.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "open rejected by memory transport",
                ),
            });
        }
        if !self.shared.open.swap(true, Ordering::SeqCst) {
            self.shared.record(TransportEvent::Open);
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.shared.open.swap(false, Ordering::SeqCst) {
            self.shared.record(TransportEvent::Close);
        }
    }

    fn set_line_settings(&mut self, settings: LineSettings) -> Result<()> {
        if self.shared.reject_settings.load(Ordering::SeqCst) {
            return Err(TransportError::Configure {
                port: self.name.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "line settings rejected by memory transport",
                ),
            });
        }
        self.shared.record(TransportEvent::LineSettings(settings));
        Ok(())
    }

    fn set_break(&mut self) -> Result<()> {
        self.require_open()?;
        self.shared.record(TransportEvent::BreakOn);
        Ok(())
    }

    fn clear_break(&mut self) -> Result<()> {
        self.require_open()?;
        self.shared.record(TransportEvent::BreakOff);
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.require_open()?;

        let delay = *self
            .shared
            .write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "write failed on memory transport",
            )));
        }

        self.shared
            .writers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(std::thread::current().id());
        // Recorded before counted, so a reader never sees a count ahead of the history.
        self.shared.record(TransportEvent::Write(data.to_vec()));
        self.shared.writes_total.fetch_add(1, Ordering::SeqCst);
        trace!(port = %self.name, len = data.len(), "memory transport write");
        Ok(())
    }
}

impl MemoryTransport {
    fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TransportError::NotOpen {
                port: self.name.clone(),
            })
        }
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Observer and fault injector for a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryProbe {
    shared: Arc<Shared>,
}

impl MemoryProbe {
    /// Snapshot of every recorded event, oldest first.
    pub fn events(&self) -> Vec<TransportEvent> {
        self.shared.events().iter().cloned().collect()
    }

    /// Payloads of all successful writes, oldest first.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.shared
            .events()
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Write(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of successful writes since creation or the last [`clear`](Self::clear).
    pub fn write_count(&self) -> usize {
        self.shared.writes_total.load(Ordering::SeqCst)
    }

    /// Payload of the most recent successful write.
    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.shared.events().iter().rev().find_map(|event| match event {
            TransportEvent::Write(data) => Some(data.clone()),
            _ => None,
        })
    }

    /// Number of distinct threads that have written to the transport.
    pub fn writer_threads(&self) -> usize {
        self.shared
            .writers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the transport is currently open.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Make subsequent `open` calls fail.
    pub fn set_reject_open(&self, reject: bool) {
        self.shared.reject_open.store(reject, Ordering::SeqCst);
    }

    /// Make subsequent `set_line_settings` calls fail.
    pub fn set_reject_settings(&self, reject: bool) {
        self.shared.reject_settings.store(reject, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with a broken pipe error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every write by `delay`, simulating a slow device.
    pub fn set_write_delay(&self, delay: Duration) {
        *self
            .shared
            .write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Forget all recorded events and writer threads.
    pub fn clear(&self) {
        self.shared.events().clear();
        self.shared.writes_total.store(0, Ordering::SeqCst);
        self.shared
            .writers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
