//! Spectrum Capture Pipeline
//!
//! Turns frequency-domain capture callbacks into [`MagnitudeFrame`]s and
//! hands them to a consumer on a dedicated delivery thread.
//!
//! # Threading
//!
//! ```text
//! backend capture thread          delivery thread ("mixfx-spectrum")
//!   FftListener                     select! { frames | shutdown }
//!     bytes -> MagnitudeFrame   ->    consumer(frame)
//!     try_send (bounded queue)
//!     full? drop newest, count
//! ```
//!
//! The capture thread never blocks. Delivered frames keep their capture
//! order; sequence gaps mark dropped frames.
//!
//! # Stop order
//!
//! clear listener -> disable -> close shutdown channel -> join delivery
//! thread -> release unit. Once `stop` returns (from any thread other than
//! the delivery thread) the consumer is never called again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use mixfx_dsp::MagnitudeFrame;
use mixfx_platform::{CaptureUnit, EffectBackend, FftListener, GLOBAL_SESSION};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::error::ChainResult;

/// Per-session frame counters
#[derive(Debug, Default)]
struct CaptureStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// An acquired capture unit and its delivery thread
struct CaptureSession {
    unit: Box<dyn CaptureUnit>,
    delivery: Option<JoinHandle<()>>,
    /// Dropping the sender tells the delivery thread to exit
    shutdown: Option<Sender<()>>,
}

/// Real-time spectrum capture, `Idle -> Capturing -> Idle`
///
/// Methods take `&self`; share it through an `Arc` when the consumer itself
/// needs to stop the capture.
pub struct SpectrumCapture {
    backend: Arc<dyn EffectBackend>,
    queue_depth: usize,
    thread_name: String,
    session: Mutex<Option<CaptureSession>>,
    stats: Mutex<Arc<CaptureStats>>,
}

impl SpectrumCapture {
    pub fn new(backend: Arc<dyn EffectBackend>, config: &ChainConfig) -> ChainResult<Self> {
        config.validate()?;

        Ok(Self {
            backend,
            queue_depth: config.frame_queue_depth,
            thread_name: config.delivery_thread_name.clone(),
            session: Mutex::new(None),
            stats: Mutex::new(Arc::new(CaptureStats::default())),
        })
    }

    /// Start capturing and delivering frames to `consumer`
    ///
    /// Returns whether capture is active afterwards. A second call while
    /// capturing keeps the running session and drops `consumer`.
    pub fn start<F>(&self, consumer: F) -> bool
    where
        F: FnMut(MagnitudeFrame) + Send + 'static,
    {
        let mut slot = self.session.lock();
        if slot.is_some() {
            debug!("Spectrum capture already running");
            return true;
        }

        let mut unit = match self.backend.open_capture(GLOBAL_SESSION) {
            Ok(unit) => unit,
            Err(e) => {
                info!("Spectrum capture unavailable: {}", e);
                return false;
            }
        };

        match unit.capture_size_range() {
            Ok((_, max)) => {
                if let Err(e) = unit.set_capture_size(max) {
                    warn!("Failed to set capture size {}: {}", max, e);
                }
            }
            Err(e) => warn!("Could not query capture size range: {}", e),
        }

        let rate_mhz = match unit.max_capture_rate_mhz() {
            Ok(rate) => rate,
            Err(e) => {
                warn!("Could not query capture rate: {}", e);
                release_unit(unit);
                return false;
            }
        };

        let stats = Arc::new(CaptureStats::default());
        let (frame_tx, frame_rx) = bounded::<MagnitudeFrame>(self.queue_depth);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let delivery_stats = Arc::clone(&stats);
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || deliver(frame_rx, shutdown_rx, consumer, &delivery_stats));

        let delivery = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Failed to spawn spectrum delivery thread: {}", e);
                release_unit(unit);
                return false;
            }
        };

        let mut session = CaptureSession {
            unit,
            delivery: Some(delivery),
            shutdown: Some(shutdown_tx),
        };

        let listener = frame_listener(frame_tx, Arc::clone(&stats));
        if let Err(e) = session.unit.set_fft_listener(listener, rate_mhz) {
            warn!("Failed to register spectrum listener: {}", e);
            teardown(session);
            return false;
        }
        if let Err(e) = session.unit.set_enabled(true) {
            warn!("Failed to enable spectrum capture: {}", e);
            teardown(session);
            return false;
        }

        *self.stats.lock() = stats;
        *slot = Some(session);
        info!(
            "Spectrum capture started at {} mHz (queue depth {})",
            rate_mhz, self.queue_depth
        );
        true
    }

    /// Stop capturing and release the unit. Idempotent.
    pub fn stop(&self) {
        // Taken out of the lock so a consumer calling stop never waits on
        // a teardown that is joining it.
        let session = self.session.lock().take();
        if let Some(session) = session {
            info!("Stopping spectrum capture");
            teardown(session);
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Frames handed to the consumer in the current or last session
    pub fn frames_delivered(&self) -> u64 {
        self.stats.lock().delivered.load(Ordering::Relaxed)
    }

    /// Frames dropped because the queue was full, current or last session
    pub fn frames_dropped(&self) -> u64 {
        self.stats.lock().dropped.load(Ordering::Relaxed)
    }
}

impl Drop for SpectrumCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Listener run on the backend's capture thread
fn frame_listener(frames: Sender<MagnitudeFrame>, stats: Arc<CaptureStats>) -> FftListener {
    let mut sequence = 0u64;
    Box::new(move |fft: &[u8], sampling_rate_mhz: u32| {
        let frame = MagnitudeFrame::from_capture(sequence, sampling_rate_mhz, fft);
        sequence += 1;

        match frames.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    })
}

/// Delivery thread body
fn deliver<F>(
    frames: Receiver<MagnitudeFrame>,
    shutdown: Receiver<()>,
    mut consumer: F,
    stats: &CaptureStats,
) where
    F: FnMut(MagnitudeFrame),
{
    debug!("Spectrum delivery thread started");

    loop {
        select! {
            recv(frames) -> frame => match frame {
                Ok(frame) => {
                    consumer(frame);
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }

    debug!("Spectrum delivery thread exiting");
}

fn release_unit(mut unit: Box<dyn CaptureUnit>) {
    if let Err(e) = unit.release() {
        warn!("Ignoring capture release failure: {}", e);
    }
}

fn teardown(mut session: CaptureSession) {
    if let Err(e) = session.unit.clear_listener() {
        warn!("Failed to clear spectrum listener: {}", e);
    }
    if let Err(e) = session.unit.set_enabled(false) {
        debug!("Failed to disable capture: {}", e);
    }

    drop(session.shutdown.take());
    if let Some(handle) = session.delivery.take() {
        if handle.thread().id() == thread::current().id() {
            debug!("Stopped from the consumer, delivery thread exits on return");
        } else if handle.join().is_err() {
            warn!("Spectrum consumer panicked");
        }
    }

    release_unit(session.unit);
    debug!("Spectrum capture released");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixfx_platform::MemoryBackend;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn capture_for(backend: &MemoryBackend, queue_depth: usize) -> SpectrumCapture {
        let config = ChainConfig {
            frame_queue_depth: queue_depth,
            ..Default::default()
        };
        SpectrumCapture::new(Arc::new(backend.clone()), &config).unwrap()
    }

    #[test]
    fn test_start_configures_unit() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 1);

        assert!(capture.start(|_frame| {}));
        assert!(capture.is_capturing());

        let state = backend.snapshot().capture;
        assert!(state.live);
        assert!(state.enabled);
        assert!(state.listening);
        assert_eq!(state.capture_size, 1024);
        assert_eq!(state.rate_mhz, 20_000);
    }

    #[test]
    fn test_start_twice_acquires_once() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 1);

        assert!(capture.start(|_frame| {}));
        assert!(capture.start(|_frame| {}));
        assert_eq!(backend.snapshot().capture.acquisitions, 1);
    }

    #[test]
    fn test_stop_while_idle() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 1);

        capture.stop();
        capture.stop();
        assert!(!capture.is_capturing());
        assert_eq!(backend.snapshot().capture.acquisitions, 0);
    }

    #[test]
    fn test_capture_unavailable() {
        let backend = MemoryBackend::default();
        backend.set_capture_available(false);
        let capture = capture_for(&backend, 1);

        assert!(!capture.start(|_frame| {}));
        assert!(!capture.is_capturing());
    }

    #[test]
    fn test_ordered_delivery() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 16);
        let (out_tx, out_rx) = crossbeam_channel::unbounded();

        assert!(capture.start(move |frame| {
            let _ = out_tx.send(frame);
        }));

        for _ in 0..10 {
            assert!(backend.emit_fft(&[3, 4, 0, 0]));
        }

        for expected in 0..10u64 {
            let frame = out_rx.recv_timeout(TIMEOUT).unwrap();
            assert_eq!(frame.sequence, expected);
            assert_eq!(frame.bins, vec![5.0, 0.0]);
            assert_eq!(frame.sampling_rate_mhz, 44_100_000);
        }

        capture.stop();
        assert_eq!(capture.frames_delivered(), 10);
        assert_eq!(capture.frames_dropped(), 0);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 1);
        let (out_tx, out_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();

        assert!(capture.start(move |frame| {
            let _ = out_tx.send(frame.sequence);
            // Blocks until the gate closes
            let _ = gate_rx.recv();
        }));

        backend.emit_fft(&[1, 1]);
        assert_eq!(out_rx.recv_timeout(TIMEOUT).unwrap(), 0);

        // Consumer is parked: one frame fits in the queue, the rest drop
        for _ in 0..5 {
            backend.emit_fft(&[1, 1]);
        }
        assert_eq!(capture.frames_dropped(), 4);

        drop(gate_tx);
        assert_eq!(out_rx.recv_timeout(TIMEOUT).unwrap(), 1);

        capture.stop();
        assert_eq!(capture.frames_delivered(), 2);
        assert!(out_rx.try_recv().is_err());
    }

    #[test]
    fn test_no_delivery_after_stop() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 4);

        assert!(capture.start(|_frame| {}));
        capture.stop();

        assert!(!backend.emit_fft(&[1, 2]));
        let state = backend.snapshot().capture;
        assert!(!state.live);
        assert!(!state.listening);
    }

    #[test]
    fn test_stop_during_concurrent_emission() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use std::time::Instant;

        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 4);
        let calls = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(true));

        let counter = Arc::clone(&calls);
        assert!(capture.start(move |_frame| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let emitter = {
            let backend = backend.clone();
            let running = Arc::clone(&running);
            std::thread::spawn(move || {
                let mut accepted = 0usize;
                while running.load(Ordering::SeqCst) {
                    if backend.emit_fft(&[7, 1, 2, 3]) {
                        accepted += 1;
                    }
                }
                accepted
            })
        };

        let deadline = Instant::now() + TIMEOUT;
        while calls.load(Ordering::SeqCst) < 10 && Instant::now() < deadline {
            std::thread::yield_now();
        }
        assert!(calls.load(Ordering::SeqCst) >= 10);

        capture.stop();
        let after_stop = calls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
        assert_eq!(capture.frames_delivered() as usize, after_stop);

        running.store(false, Ordering::SeqCst);
        let accepted = emitter.join().unwrap();
        assert!(accepted >= after_stop);
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
        assert!(!backend.snapshot().capture.listening);
    }

    #[test]
    fn test_restart_reacquires() {
        let backend = MemoryBackend::default();
        let capture = capture_for(&backend, 1);

        assert!(capture.start(|_frame| {}));
        capture.stop();
        assert!(capture.start(|_frame| {}));

        assert_eq!(backend.snapshot().capture.acquisitions, 2);
        assert!(capture.is_capturing());
    }

    #[test]
    fn test_release_failure_is_suppressed() {
        let backend = MemoryBackend::default();
        backend.fail_capture_release();
        let capture = capture_for(&backend, 1);

        assert!(capture.start(|_frame| {}));
        capture.stop();

        assert!(!capture.is_capturing());
        assert!(!backend.snapshot().capture.live);
    }

    #[test]
    fn test_stop_from_consumer() {
        let backend = MemoryBackend::default();
        let capture = Arc::new(capture_for(&backend, 1));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let handle = Arc::clone(&capture);
        assert!(capture.start(move |_frame| {
            handle.stop();
            let _ = done_tx.send(());
        }));

        assert!(backend.emit_fft(&[0, 0]));
        done_rx.recv_timeout(TIMEOUT).unwrap();

        assert!(!capture.is_capturing());
        assert!(!backend.snapshot().capture.live);
    }

    #[test]
    fn test_drop_releases_capture() {
        let backend = MemoryBackend::default();
        {
            let capture = capture_for(&backend, 1);
            assert!(capture.start(|_frame| {}));
        }
        assert!(!backend.snapshot().capture.live);
    }
}
