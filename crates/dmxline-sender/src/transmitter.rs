//! The break/frame transmission loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use dmxline_frame::{ChannelBuffer, FRAME_SIZE};
use dmxline_transport::{SerialTransport, TransportError};
use tracing::{debug, info, warn};

/// Pause after a failed cycle so a dead device does not spin the CPU.
const FAILURE_PAUSE: Duration = Duration::from_millis(10);

/// Counters shared between a transmission loop and its owner.
#[derive(Debug, Default)]
pub struct TransmitStats {
    frames_sent: AtomicU64,
    write_errors: AtomicU64,
}

impl TransmitStats {
    /// Frames written completely.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Cycles that failed at the transport.
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }
}

/// Repeatedly emits break + frame on a transport until its run flag clears.
///
/// The loop never opens or closes the transport. It holds the transport lock
/// for one break/write cycle at a time and takes a fresh snapshot of the
/// universe at the start of every cycle.
pub struct TransmissionLoop<T> {
    port: String,
    buffer: Arc<ChannelBuffer>,
    transport: Arc<Mutex<T>>,
    running: Arc<AtomicBool>,
    stats: Arc<TransmitStats>,
    break_duration: Duration,
    wire: BytesMut,
    failing: bool,
}

impl<T: SerialTransport> TransmissionLoop<T> {
    /// Build a loop over shared state. It transmits while `running` is set.
    pub fn new(
        buffer: Arc<ChannelBuffer>,
        transport: Arc<Mutex<T>>,
        running: Arc<AtomicBool>,
        stats: Arc<TransmitStats>,
        break_duration: Duration,
    ) -> Self {
        let port = lock_transport(&transport).port_name().to_string();
        Self {
            port,
            buffer,
            transport,
            running,
            stats,
            break_duration,
            wire: BytesMut::with_capacity(FRAME_SIZE),
            failing: false,
        }
    }

    /// Transmit until the run flag is cleared.
    ///
    /// The flag is checked before each cycle; a cycle that has begun always
    /// completes. Transport failures are logged and never end the loop.
    pub fn run(mut self) {
        info!(port = %self.port, break_us = self.break_duration.as_micros() as u64, "transmission started");
        while self.running.load(Ordering::SeqCst) {
            if !self.cycle() {
                thread::sleep(FAILURE_PAUSE);
            }
        }
        info!(
            port = %self.port,
            frames = self.stats.frames_sent(),
            errors = self.stats.write_errors(),
            "transmission stopped"
        );
    }

    /// Run one break + frame cycle. Returns whether the frame went out.
    pub fn cycle(&mut self) -> bool {
        match self.transmit_frame() {
            Ok(()) => {
                self.stats.frames_sent.fetch_add(1, Ordering::Relaxed);
                if self.failing {
                    info!(port = %self.port, "transmission recovered");
                    self.failing = false;
                }
                true
            }
            Err(err) => {
                self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
                if self.failing {
                    debug!(port = %self.port, error = %err, "transmission still failing");
                } else {
                    warn!(port = %self.port, error = %err, "transmission failed; retrying");
                    self.failing = true;
                }
                false
            }
        }
    }

    fn transmit_frame(&mut self) -> Result<(), TransportError> {
        self.wire.clear();
        self.buffer.encode_into(&mut self.wire);

        let mut transport = lock_transport(&self.transport);
        transport.set_break()?;
        // Break, then mark-after-break once the line is released.
        thread::sleep(self.break_duration);
        transport.clear_break()?;
        transport.write_all(&self.wire)
    }
}

pub(crate) fn lock_transport<T>(transport: &Mutex<T>) -> MutexGuard<'_, T> {
    transport.lock().unwrap_or_else(PoisonError::into_inner)
}
