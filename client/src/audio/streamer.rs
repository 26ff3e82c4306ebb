//! Audio Streaming Task
//!
//! A dedicated thread that pulls encoded microphone frames and pushes them
//! into the transport at a fixed period while the session is connected.
//! [`AudioStreamer::stop`] joins the thread, so once it returns the task no
//! longer holds the transport and the caller may destroy it.

use super::AudioSource;
use crate::session::{Phase, PhaseCell};
use crate::transport::{SharedTransport, lock_transport};
use logging::Logger;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Iterations between two timing reports.
const STATS_WINDOW: u32 = 50;

type SharedSource = Arc<Mutex<Box<dyn AudioSource>>>;

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owner of the (at most one) streaming thread.
pub struct AudioStreamer {
    source: SharedSource,
    interval: Duration,
    logger: Logger,
    worker: Option<Worker>,
    live: Arc<AtomicUsize>,
}

impl AudioStreamer {
    pub fn new(source: Box<dyn AudioSource>, interval: Duration, logger: Logger) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            interval,
            logger,
            worker: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Starts streaming into `transport`. No-op if a task is already running.
    ///
    /// Returns `true` if a new task was spawned.
    pub fn start(&mut self, transport: SharedTransport, phase: PhaseCell) -> bool {
        if let Some(worker) = &self.worker {
            if !worker.handle.is_finished() {
                self.logger.debug("Streaming task already running");
                return false;
            }
            // The previous task left on its own (phase changed); reap it.
            self.stop();
        }

        let stop = Arc::new(AtomicBool::new(false));
        let context = StreamContext {
            source: self.source.clone(),
            transport,
            phase,
            stop: stop.clone(),
            interval: self.interval,
            live: self.live.clone(),
            logger: self.logger.clone(),
        };

        match thread::Builder::new()
            .name("audio-stream".to_string())
            .spawn(move || run_stream_loop(context))
        {
            Ok(handle) => {
                self.logger.info("Streaming task started");
                self.worker = Some(Worker { stop, handle });
                true
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to spawn streaming task: {}", e));
                false
            }
        }
    }

    /// Stops the task and waits for it to exit. No-op if none is running.
    ///
    /// Returns `true` if a task was joined.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };

        worker.stop.store(true, Ordering::Release);
        worker.handle.thread().unpark();
        if worker.handle.join().is_err() {
            self.logger.error("Streaming task panicked");
        } else {
            self.logger.info("Streaming task stopped");
        }
        true
    }

    /// True while a task is alive and has not exited on its own.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Number of streaming loops currently executing (0 or 1).
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for AudioStreamer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct StreamContext {
    source: SharedSource,
    transport: SharedTransport,
    phase: PhaseCell,
    stop: Arc<AtomicBool>,
    interval: Duration,
    live: Arc<AtomicUsize>,
    logger: Logger,
}

/// Decrements the live counter however the loop exits.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Default)]
struct StreamStats {
    cycles: u32,
    frames: u32,
    send_errors: u64,
    source_time: Duration,
    send_time: Duration,
}

impl StreamStats {
    fn report(&mut self, logger: &Logger) {
        let cycles = self.cycles.max(1);
        logger.debug(&format!(
            "Audio timing (avg over {} cycles): source={} us, send={} us, frames={}",
            self.cycles,
            self.source_time.as_micros() / cycles as u128,
            self.send_time.as_micros() / cycles as u128,
            self.frames
        ));
        *self = StreamStats {
            send_errors: self.send_errors,
            ..StreamStats::default()
        };
    }
}

fn lock_source(source: &SharedSource) -> std::sync::MutexGuard<'_, Box<dyn AudioSource>> {
    match source.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn run_stream_loop(ctx: StreamContext) {
    let _live = LiveGuard::enter(ctx.live.clone());
    lock_source(&ctx.source).reset();
    let mut stats = StreamStats::default();

    while !ctx.stop.load(Ordering::Acquire) {
        let started = Instant::now();

        if ctx.phase.get() != Phase::Connected {
            ctx.logger.info("Session left Connected, streaming task exiting");
            break;
        }

        let frame = lock_source(&ctx.source).next_encoded_frame();
        let pulled = Instant::now();

        if let Some(frame) = frame {
            let mut transport = lock_transport(&ctx.transport);
            // Re-check under the lock: the phase may have moved while waiting.
            if ctx.phase.get() != Phase::Connected || ctx.stop.load(Ordering::Acquire) {
                break;
            }
            match transport.send_audio(&frame) {
                Ok(()) => stats.frames += 1,
                Err(e) => {
                    stats.send_errors += 1;
                    if stats.send_errors == 1 || stats.send_errors.is_multiple_of(100) {
                        ctx.logger.warn(&format!(
                            "Failed to send audio frame ({} failures): {}",
                            stats.send_errors, e
                        ));
                    }
                }
            }
        }

        stats.cycles += 1;
        stats.source_time += pulled - started;
        stats.send_time += pulled.elapsed();
        if stats.cycles >= STATS_WINDOW {
            stats.report(&ctx.logger);
        }

        let elapsed = started.elapsed();
        if elapsed < ctx.interval {
            // Woken early by `stop`.
            thread::park_timeout(ctx.interval - elapsed);
        }
    }
}
