//! Replay Executor
//!
//! Runs an instruction sequence against the injection sink on a dedicated
//! thread, under a cancellable run state. Execution is strictly
//! serialized: at most one run may be active at a time, and a second
//! request is rejected rather than queued. Cancellation is cooperative,
//! checked at instruction boundaries; waits sleep in sub-second slices so
//! a cancel request takes effect without finishing a long sleep first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::InjectionSink;
use crate::script::Instruction;
use crate::{Error, Result};

/// Default granularity for polling the cancel flag during a wait.
pub const DEFAULT_CANCEL_POLL: Duration = Duration::from_millis(100);

/// How a replay run ended (when it did not fail).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every instruction executed.
    Completed,
    /// The run stopped at an instruction boundary after a cancel request.
    Cancelled,
}

/// Spawns and serializes replay runs.
pub struct ReplayExecutor {
    running: Arc<AtomicBool>,
    cancel_poll: Duration,
}

impl ReplayExecutor {
    pub fn new() -> Self {
        Self::with_cancel_poll(DEFAULT_CANCEL_POLL)
    }

    /// Executor with a custom cancel-poll granularity (tests use a short
    /// interval to keep waits fast).
    pub fn with_cancel_poll(cancel_poll: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            cancel_poll,
        }
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start executing `instructions` on a dedicated thread.
    ///
    /// Returns [`Error::AlreadyRunning`] if a run is already active. On
    /// any exit path (completion, cancellation, injection failure) the
    /// execution state returns to idle before the handle's `wait` yields.
    pub fn spawn(
        &self,
        instructions: Vec<Instruction>,
        mut sink: Box<dyn InjectionSink>,
    ) -> Result<RunHandle> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyRunning);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_thread = Arc::clone(&cancel);
        let running = Arc::clone(&self.running);
        let cancel_poll = self.cancel_poll;

        info!(instructions = instructions.len(), "starting replay run");

        let join = thread::spawn(move || {
            // Reset the running flag on every exit path, panics included
            let _guard = RunningGuard(running);
            execute_sequence(&instructions, sink.as_mut(), &cancel_for_thread, cancel_poll)
        });

        Ok(RunHandle {
            cancel,
            running: Arc::clone(&self.running),
            join,
        })
    }
}

impl Default for ReplayExecutor {
    fn default() -> Self {
        Self::new()
    }
}

struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Cloneable cancellation token for a single run.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Request cooperative cancellation of the associated run.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to an in-flight replay run.
pub struct RunHandle {
    cancel: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    join: JoinHandle<Result<RunOutcome>>,
}

impl RunHandle {
    /// Request cooperative cancellation. The run stops before executing
    /// its next instruction (an in-flight wait is cut short at the next
    /// poll slice).
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Token that can cancel this run after the handle has been moved.
    pub fn canceller(&self) -> CancelToken {
        CancelToken(Arc::clone(&self.cancel))
    }

    /// Whether the run is still active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Block until the run finishes and return its outcome or failure.
    pub fn wait(self) -> Result<RunOutcome> {
        match self.join.join() {
            Ok(result) => result,
            Err(_) => Err(Error::InvalidState("replay thread panicked".to_string())),
        }
    }
}

/// Execute instructions strictly in order, checking the cancel flag at
/// every instruction boundary.
fn execute_sequence(
    instructions: &[Instruction],
    sink: &mut dyn InjectionSink,
    cancel: &AtomicBool,
    cancel_poll: Duration,
) -> Result<RunOutcome> {
    for (position, instruction) in instructions.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            info!(at = position, "replay cancelled");
            return Ok(RunOutcome::Cancelled);
        }

        debug!(position, ?instruction, "executing instruction");

        // Index surfaced on failure is the 1-based position in the script
        let index = position + 1;
        let result = match instruction {
            Instruction::Wait(secs) => {
                if !interruptible_wait(*secs, cancel, cancel_poll) {
                    info!(at = position, "replay cancelled during wait");
                    return Ok(RunOutcome::Cancelled);
                }
                Ok(())
            }
            Instruction::KeyDown(key) => sink.key_down(key),
            Instruction::KeyUp(key) => sink.key_up(key),
            Instruction::MouseDown { button, x, y } => sink.mouse_down(button, *x, *y),
            Instruction::MouseUp { button, x, y } => sink.mouse_up(button, *x, *y),
        };

        if let Err(source) = result {
            warn!(index, %source, "injection failed, halting replay");
            return Err(Error::InjectionFailure { index, source });
        }
    }

    info!("replay completed");
    Ok(RunOutcome::Completed)
}

/// Sleep for `secs`, polling the cancel flag at sub-second granularity.
/// Returns false if the wait was cut short by cancellation.
fn interruptible_wait(secs: f64, cancel: &AtomicBool, poll: Duration) -> bool {
    if !(secs > 0.0) {
        return true;
    }

    let deadline = Instant::now() + Duration::from_secs_f64(secs);
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(poll));
    }
}
