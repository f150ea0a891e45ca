//! Single-flight execution of animation programs.
//!
//! [`StripRunner`] owns the strip and guarantees that at most one program
//! mutates it at any instant. A program runs on a dedicated worker thread;
//! the scheduling call returns immediately with a [`RunHandle`] the caller
//! may wait on or drop. [`StripRunner::stop`] raises cancellation and
//! blocks until the worker has fully wound down, so a stop-triggered clear
//! can never race a stopping program's last write.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cancel::CancelToken;
use crate::params::ProgramParams;
use crate::strip::{LedStrip, StripError, StripTransport};

/// Errors raised when scheduling a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Another program currently occupies the strip. The active run is
    /// unaffected; stop it and retry.
    #[error("a program is already running; stop it before starting another")]
    AlreadyRunning,

    /// Strip construction failed.
    #[error(transparent)]
    Strip(#[from] StripError),

    /// The worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    SpawnWorker(#[source] io::Error),
}

/// Completion handle for a scheduled run.
///
/// The handle resolves when the worker finishes, whether the program
/// returned normally, was cancelled, or faulted. Dropping the handle
/// detaches from the run without affecting it.
pub struct RunHandle {
    done: Receiver<()>,
}

impl RunHandle {
    /// Blocks until the run has finished and the strip is free again.
    pub fn wait(self) {
        let _ = self.done.recv();
    }

    /// Returns true once the run has finished.
    pub fn is_finished(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Once,
    Recurring,
}

struct ActiveRun {
    /// Scheduling token for the whole run; program tokens are its children.
    token: CancelToken,
    worker: JoinHandle<()>,
}

struct RunnerShared {
    running: AtomicBool,
    recurring_cancelled: AtomicBool,
    active: Mutex<Option<ActiveRun>>,
}

/// Executes animation programs against one [`LedStrip`], one at a time.
///
/// Construct one runner per strip and share it by reference; there is no
/// process-wide state. Scheduling is non-blocking, stopping is blocking.
pub struct StripRunner<T: StripTransport> {
    strip: Arc<Mutex<LedStrip<T>>>,
    shared: Arc<RunnerShared>,
}

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Program panics are already contained at the invocation boundary, so a
/// poisoned strip still holds a structurally valid frame.
fn lock<U>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: StripTransport + Send + 'static> StripRunner<T> {
    /// Creates a runner driving a fresh strip of `pixel_count` pixels.
    pub fn new(pixel_count: usize, transport: T) -> Result<Self, RunnerError> {
        let strip = LedStrip::new(pixel_count, transport)?;
        Ok(Self {
            strip: Arc::new(Mutex::new(strip)),
            shared: Arc::new(RunnerShared {
                running: AtomicBool::new(false),
                recurring_cancelled: AtomicBool::new(false),
                active: Mutex::new(None),
            }),
        })
    }

    /// Returns true while a program occupies the strip.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Number of pixels on the strip.
    pub fn pixel_count(&self) -> usize {
        lock(&self.strip).pixel_count()
    }

    /// Runs `f` with exclusive access to the strip, e.g. to show a static
    /// frame without scheduling a program.
    ///
    /// Blocks until the strip is free: a running program holds the strip
    /// for the whole invocation.
    pub fn with_strip<R>(&self, f: impl FnOnce(&mut LedStrip<T>) -> R) -> R {
        f(&mut lock(&self.strip))
    }

    /// Schedules `program` for a single invocation.
    ///
    /// Returns immediately with a [`RunHandle`]; the program runs on a
    /// worker thread with exclusive strip access and a fresh cancellation
    /// token. Refused with [`RunnerError::AlreadyRunning`] while any run
    /// is active.
    pub fn run_once<F>(
        &self,
        program: F,
        params: impl Into<ProgramParams>,
    ) -> Result<RunHandle, RunnerError>
    where
        F: FnMut(&mut LedStrip<T>, &CancelToken, &ProgramParams) + Send + 'static,
    {
        self.schedule(program, params.into(), RunMode::Once)
    }

    /// Schedules `program` to re-run until stopped.
    ///
    /// Iterations are strictly sequential, each with a fresh program
    /// token; the strip stays claimed between iterations so nothing can
    /// slip in mid-loop. The loop ends at the first iteration boundary
    /// after [`stop`] is called.
    ///
    /// [`stop`]: StripRunner::stop
    pub fn run_recurring<F>(
        &self,
        program: F,
        params: impl Into<ProgramParams>,
    ) -> Result<RunHandle, RunnerError>
    where
        F: FnMut(&mut LedStrip<T>, &CancelToken, &ProgramParams) + Send + 'static,
    {
        self.schedule(program, params.into(), RunMode::Recurring)
    }

    fn schedule<F>(
        &self,
        mut program: F,
        params: ProgramParams,
        mode: RunMode,
    ) -> Result<RunHandle, RunnerError>
    where
        F: FnMut(&mut LedStrip<T>, &CancelToken, &ProgramParams) + Send + 'static,
    {
        // Hold the active-run slot across claim and spawn so a concurrent
        // stop() cannot observe the claim without the handle.
        let mut active = lock(&self.shared.active);

        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("a program is already running; call stop() first");
            return Err(RunnerError::AlreadyRunning);
        }

        let token = CancelToken::new();
        let worker_token = token.clone();
        let strip = Arc::clone(&self.strip);
        let shared = Arc::clone(&self.shared);
        let (done_tx, done_rx) = bounded::<()>(0);

        let spawned = thread::Builder::new()
            .name("strip-program".into())
            .spawn(move || {
                // Dropped when this closure returns; that is what resolves
                // any RunHandle waiting on the run.
                let _done_tx = done_tx;

                loop {
                    let program_token = worker_token.child();
                    let faulted = {
                        let mut strip = lock(&strip);
                        panic::catch_unwind(AssertUnwindSafe(|| {
                            program(&mut strip, &program_token, &params)
                        }))
                        .is_err()
                    };
                    if faulted {
                        error!("program faulted; abandoning the run");
                        break;
                    }
                    match mode {
                        RunMode::Once => break,
                        RunMode::Recurring => {
                            if shared.recurring_cancelled.load(Ordering::SeqCst)
                                || worker_token.is_cancelled()
                            {
                                break;
                            }
                        }
                    }
                }

                if mode == RunMode::Recurring {
                    shared.recurring_cancelled.store(false, Ordering::SeqCst);
                }
                shared.running.store(false, Ordering::SeqCst);
            });

        let worker = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                return Err(RunnerError::SpawnWorker(err));
            }
        };

        *active = Some(ActiveRun { token, worker });
        Ok(RunHandle { done: done_rx })
    }

    /// Stops the active run, blocking until the worker has fully stopped.
    ///
    /// Raises the scheduling token (program tokens observe it
    /// transitively), latches the recurring-cancel flag so an enclosing
    /// recurring loop ends after the current iteration, then joins the
    /// worker. Stop latency is bounded by the program's polling interval.
    ///
    /// After the worker is confirmed stopped, `clear_pixels` clears the
    /// strip and pushes one frame. Calling this with nothing running is a
    /// no-op. Must not be called from inside a program; the worker cannot
    /// join itself.
    pub fn stop(&self, clear_pixels: bool) {
        let taken = {
            let mut active = lock(&self.shared.active);
            if !self.shared.running.load(Ordering::SeqCst) {
                // Worker already finished or was never scheduled; drop any
                // stale handle and treat as already stopped.
                active.take();
                debug!("stop requested with nothing running");
                return;
            }
            active.take()
        };

        let Some(run) = taken else {
            debug!("stop requested with nothing running");
            return;
        };

        self.shared.recurring_cancelled.store(true, Ordering::SeqCst);
        run.token.cancel();

        if run.worker.join().is_err() {
            // Program panics are contained at the invocation boundary, so
            // this means the worker itself died unexpectedly.
            error!("worker thread terminated abnormally");
        }

        if clear_pixels {
            let mut strip = lock(&self.strip);
            strip.clear();
            if let Err(err) = strip.render() {
                warn!(error = %err, "failed to flush cleared pixels");
            }
        }

        self.shared.recurring_cancelled.store(false, Ordering::SeqCst);
        self.shared.running.store(false, Ordering::SeqCst);
    }
}
