use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use dmxline_frame::{ChannelBuffer, CHANNEL_COUNT};
use dmxline_transport::{SerialTransport, SystemPort};
use tracing::{debug, info, warn};

use crate::config::SenderConfig;
use crate::error::{Result, SenderError};
use crate::transmitter::{lock_transport, TransmissionLoop, TransmitStats};
use crate::validator;

/// A running transmission thread and the handles needed to end it.
struct ActiveLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    /// Disconnects when the thread ends, including by panic.
    finished: Receiver<()>,
}

/// DMX512 transmitter for one serial device.
///
/// Owns the universe and the transport. Any number of threads may update
/// channels through a shared reference while the background transmission
/// thread keeps refreshing the line. At most one transmission thread exists
/// per communicator at any time.
pub struct Communicator<T: SerialTransport + 'static> {
    port: String,
    config: SenderConfig,
    buffer: Arc<ChannelBuffer>,
    transport: Arc<Mutex<T>>,
    stats: Arc<TransmitStats>,
    active: AtomicBool,
    lifecycle: Mutex<Option<ActiveLoop>>,
}

impl Communicator<SystemPort> {
    /// Validate and wrap the named system serial port.
    pub fn open(port_name: &str) -> Result<Self> {
        Self::new(SystemPort::new(port_name))
    }
}

impl<T: SerialTransport + 'static> Communicator<T> {
    /// Validate `transport` for DMX512 and wrap it with default settings.
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, SenderConfig::default())
    }

    /// Validate `transport` for DMX512 and wrap it with explicit settings.
    ///
    /// The transport is left closed; it is opened by [`start`](Self::start).
    pub fn with_config(transport: T, config: SenderConfig) -> Result<Self> {
        config.validate()?;
        let transport = validator::configure(transport)?;
        let port = transport.port_name().to_string();
        debug!(%port, "communicator ready");

        Ok(Self {
            port,
            config,
            buffer: Arc::new(ChannelBuffer::new()),
            transport: Arc::new(Mutex::new(transport)),
            stats: Arc::new(TransmitStats::default()),
            active: AtomicBool::new(false),
            lifecycle: Mutex::new(None),
        })
    }

    /// System name of the wrapped port.
    pub fn port_name(&self) -> &str {
        &self.port
    }

    /// Settings this communicator was built with.
    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Whether a transmission thread is currently running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Value of the channel at a 0-based index (0..=511).
    pub fn get_byte(&self, index: usize) -> Result<u8> {
        Ok(self.buffer.get(index)?)
    }

    /// Set the channel at a 0-based index (0..=511).
    pub fn set_byte(&self, index: usize, value: u8) -> Result<()> {
        Ok(self.buffer.set(index, value)?)
    }

    /// Snapshot of all 512 channel values.
    pub fn get_bytes(&self) -> [u8; CHANNEL_COUNT] {
        self.buffer.get_all()
    }

    /// Replace all 512 channel values. Any other length is rejected.
    pub fn set_bytes(&self, values: &[u8]) -> Result<()> {
        Ok(self.buffer.set_all(values)?)
    }

    /// Shared handle to the universe, for producers that outlive a borrow.
    pub fn buffer(&self) -> Arc<ChannelBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Frames written since construction.
    pub fn frames_sent(&self) -> u64 {
        self.stats.frames_sent()
    }

    /// Failed transmission cycles since construction.
    pub fn write_errors(&self) -> u64 {
        self.stats.write_errors()
    }

    /// Open the port and begin transmitting.
    ///
    /// Does nothing if already active. Concurrent callers are serialized, so
    /// exactly one transmission thread is spawned. If the port cannot be
    /// opened the communicator stays idle and the failure is returned.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.is_some() {
            return Ok(());
        }

        {
            let mut transport = lock_transport(&self.transport);
            if !transport.is_open() {
                transport.open().map_err(|source| SenderError::Start {
                    port: self.port.clone(),
                    source,
                })?;
            }
        }

        let running = Arc::new(AtomicBool::new(true));
        let (done, finished) = mpsc::channel::<()>();
        let tx_loop = TransmissionLoop::new(
            Arc::clone(&self.buffer),
            Arc::clone(&self.transport),
            Arc::clone(&running),
            Arc::clone(&self.stats),
            self.config.break_duration,
        );

        let spawned = thread::Builder::new()
            .name(format!("dmx-tx-{}", self.port))
            .spawn(move || {
                let _done = done;
                tx_loop.run();
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                lock_transport(&self.transport).close();
                return Err(SenderError::Spawn(err));
            }
        };

        *lifecycle = Some(ActiveLoop {
            running,
            handle,
            finished,
        });
        self.active.store(true, Ordering::SeqCst);
        info!(port = %self.port, "DMX512 output active");
        Ok(())
    }

    /// Stop transmitting and close the port.
    ///
    /// Does nothing if idle. Waits up to the configured stop timeout for the
    /// transmission thread; a thread that overruns is detached and the port
    /// is closed regardless.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle();
        let Some(active) = lifecycle.take() else {
            return;
        };
        self.active.store(false, Ordering::SeqCst);
        active.running.store(false, Ordering::SeqCst);

        match active.finished.recv_timeout(self.config.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if active.handle.join().is_err() {
                    warn!(port = %self.port, "transmission thread panicked");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    port = %self.port,
                    timeout_ms = self.config.stop_timeout.as_millis() as u64,
                    "transmission thread did not stop in time; detaching it"
                );
            }
        }

        let mut transport = lock_transport(&self.transport);
        if transport.is_open() {
            transport.close();
        }
        info!(port = %self.port, frames = self.stats.frames_sent(), "DMX512 output stopped");
    }

    fn lifecycle(&self) -> MutexGuard<'_, Option<ActiveLoop>> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: SerialTransport + 'static> Drop for Communicator<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: SerialTransport + 'static> std::fmt::Debug for Communicator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Communicator")
            .field("port", &self.port)
            .field("active", &self.is_active())
            .field("frames_sent", &self.frames_sent())
            .finish()
    }
}
