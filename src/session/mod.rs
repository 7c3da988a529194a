//! Session Controller
//!
//! The state machine over the two independent session flags (recording and
//! execution) and the single point of mutation for session state. The
//! controller owns the hook service, the ring-buffer drain thread, the
//! shared timeline, and the replay executor; it is the only component that
//! talks to the external hook service and the shell.
//!
//! Recording: `Idle -> start_recording -> Recording -> stop_recording ->
//! Idle`. Execution: `Idle -> execute -> Running -> (completes | cancel |
//! fails) -> Idle`. Replay and capture never run concurrently: injected
//! events would be captured as if user-generated, corrupting the timeline.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capture::ring_buffer::{HookEventBuffer, HookEventConsumer};
use crate::capture::{EventNormalizer, HookService};
use crate::replay::executor::CancelToken;
use crate::replay::{InjectionSink, ReplayExecutor, RunHandle, RunOutcome};
use crate::script::{Script, Synthesizer};
use crate::timeline::{Event, Timeline};
use crate::{Error, Result};

/// Recording flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Execution flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
}

/// Notification sent to the shell when a session flag changes, so it can
/// update its affordances. The shell re-queries the controller for the
/// current flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    RecordingStarted,
    RecordingStopped,
    ExecutionStarted,
    ExecutionFinished,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Capacity of the hook-event ring buffer (power of 2).
    pub ring_capacity: usize,
    /// Sleep between drain passes when the buffer is empty.
    pub drain_interval: Duration,
    /// Compiler used for script synthesis.
    pub synthesizer: Synthesizer,
    /// Cancel-poll granularity for replay waits.
    pub cancel_poll: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ring_capacity: crate::capture::ring_buffer::DEFAULT_CAPACITY,
            drain_interval: Duration::from_millis(10),
            synthesizer: Synthesizer::new(),
            cancel_poll: crate::replay::executor::DEFAULT_CANCEL_POLL,
        }
    }
}

/// Orchestrates recording sessions and replay runs.
pub struct SessionController {
    hook: Box<dyn HookService>,
    timeline: Arc<RwLock<Timeline>>,
    recording: RecordingState,
    drain_stop: Option<Arc<AtomicBool>>,
    drain_join: Option<JoinHandle<()>>,
    executor: ReplayExecutor,
    current_run: Option<RunHandle>,
    run_cancel: Option<CancelToken>,
    synthesizer: Synthesizer,
    drain_interval: Duration,
    ring_capacity: usize,
    notifier: Option<Sender<StateChange>>,
}

impl SessionController {
    /// Controller with default options.
    pub fn new(hook: Box<dyn HookService>) -> Self {
        Self::with_options(hook, SessionOptions::default())
    }

    pub fn with_options(hook: Box<dyn HookService>, options: SessionOptions) -> Self {
        Self {
            hook,
            timeline: Arc::new(RwLock::new(Timeline::new())),
            recording: RecordingState::Idle,
            drain_stop: None,
            drain_join: None,
            executor: ReplayExecutor::with_cancel_poll(options.cancel_poll),
            current_run: None,
            run_cancel: None,
            synthesizer: options.synthesizer,
            drain_interval: options.drain_interval,
            ring_capacity: options.ring_capacity,
            notifier: None,
        }
    }

    /// Register the channel that receives state-change notifications.
    pub fn set_state_listener(&mut self, sender: Sender<StateChange>) {
        self.notifier = Some(sender);
    }

    /// Current recording flag.
    pub fn recording_state(&self) -> RecordingState {
        self.recording
    }

    /// Current execution flag.
    pub fn execution_state(&self) -> ExecutionState {
        if self.executor.is_running() {
            ExecutionState::Running
        } else {
            ExecutionState::Idle
        }
    }

    /// Begin a recording session.
    ///
    /// Clears the timeline (restarting the session clock), starts a fresh
    /// normalizer with empty active-input sets on a dedicated drain
    /// thread, and asks the hook service to start delivering events.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.recording == RecordingState::Recording {
            return Err(Error::InvalidState(
                "recording already in progress".to_string(),
            ));
        }
        // A live hook would capture the executor's own injections as if
        // they were user input
        if self.executor.is_running() {
            return Err(Error::InvalidState(
                "cannot start recording while a replay is running".to_string(),
            ));
        }

        self.timeline.write().clear();

        let (producer, consumer) = HookEventBuffer::with_capacity(self.ring_capacity).split();

        let stop = Arc::new(AtomicBool::new(false));
        let drain_stop = Arc::clone(&stop);
        let timeline = Arc::clone(&self.timeline);
        let interval = self.drain_interval;
        let join = thread::spawn(move || drain_loop(consumer, timeline, drain_stop, interval));

        if let Err(e) = self.hook.start_listening(producer) {
            stop.store(true, Ordering::SeqCst);
            let _ = join.join();
            return Err(Error::Hook(e));
        }

        self.drain_stop = Some(stop);
        self.drain_join = Some(join);
        self.recording = RecordingState::Recording;
        info!("recording started");
        self.notify(StateChange::RecordingStarted);
        Ok(())
    }

    /// Stop the current recording session. The timeline is kept.
    pub fn stop_recording(&mut self) -> Result<()> {
        if self.recording != RecordingState::Recording {
            return Err(Error::InvalidState("not recording".to_string()));
        }

        self.hook.stop_listening();

        if let Some(stop) = self.drain_stop.take() {
            stop.store(true, Ordering::SeqCst);
        }
        if let Some(join) = self.drain_join.take() {
            let _ = join.join();
        }

        self.recording = RecordingState::Idle;
        info!(events = self.timeline.read().len(), "recording stopped");
        self.notify(StateChange::RecordingStopped);
        Ok(())
    }

    /// Owned snapshot of the current timeline, safe during recording.
    pub fn timeline_snapshot(&self) -> Vec<Event> {
        self.timeline.read().snapshot()
    }

    /// Human-readable timeline view for the shell.
    pub fn timeline_log_lines(&self) -> Vec<String> {
        self.timeline.read().log_lines()
    }

    /// Compile the current timeline into a script.
    pub fn synthesize(&self) -> Script {
        self.synthesizer.compile(&self.timeline.read().snapshot())
    }

    /// The current script rendered as export text.
    pub fn script_text(&self) -> String {
        self.synthesize().render_python()
    }

    /// Start replaying the current timeline against `sink`.
    ///
    /// Rejected with [`Error::RecordingInProgress`] while recording and
    /// with [`Error::AlreadyRunning`] while a run is in flight; neither
    /// changes any state.
    pub fn execute(&mut self, sink: Box<dyn InjectionSink>) -> Result<()> {
        if self.recording == RecordingState::Recording {
            return Err(Error::RecordingInProgress);
        }
        if self.executor.is_running() {
            return Err(Error::AlreadyRunning);
        }

        // Reap a previous run that finished on its own
        if let Some(handle) = self.current_run.take() {
            match handle.wait() {
                Ok(outcome) => debug!(?outcome, "reaped finished replay run"),
                Err(e) => warn!(error = %e, "previous replay run failed unreaped"),
            }
            self.run_cancel = None;
            self.notify(StateChange::ExecutionFinished);
        }

        let script = self.synthesize();
        let handle = self.executor.spawn(script.instructions, sink)?;
        self.run_cancel = Some(handle.canceller());
        self.current_run = Some(handle);
        self.notify(StateChange::ExecutionStarted);
        Ok(())
    }

    /// Request cooperative cancellation of the in-flight run, if any.
    pub fn cancel_execution(&self) {
        if let Some(cancel) = &self.run_cancel {
            debug!("cancellation requested");
            cancel.cancel();
        }
    }

    /// Block until the in-flight run finishes and return its outcome.
    pub fn wait_for_execution(&mut self) -> Result<RunOutcome> {
        let handle = self
            .current_run
            .take()
            .ok_or_else(|| Error::InvalidState("no replay run in flight".to_string()))?;
        self.run_cancel = None;

        let result = handle.wait();
        self.notify(StateChange::ExecutionFinished);
        result
    }

    /// Clear the timeline and session clock.
    ///
    /// Only legal while both flags are idle.
    pub fn reset(&mut self) -> Result<()> {
        if self.recording == RecordingState::Recording {
            return Err(Error::InvalidState(
                "cannot reset while recording".to_string(),
            ));
        }
        if self.executor.is_running() {
            return Err(Error::InvalidState(
                "cannot reset while a replay is running".to_string(),
            ));
        }

        self.timeline.write().clear();
        info!("session reset");
        Ok(())
    }

    fn notify(&self, change: StateChange) {
        if let Some(sender) = &self.notifier {
            let _ = sender.send(change);
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.recording == RecordingState::Recording {
            let _ = self.stop_recording();
        }
        self.cancel_execution();
    }
}

/// Drain thread body: pop raw events in batches, normalize, append.
///
/// Keeps draining after the stop signal until the buffer is empty so
/// events delivered just before `stop_recording` are not lost.
fn drain_loop(
    mut consumer: HookEventConsumer,
    timeline: Arc<RwLock<Timeline>>,
    stop: Arc<AtomicBool>,
    interval: Duration,
) {
    let mut normalizer = EventNormalizer::new();

    loop {
        let batch = consumer.pop_batch(128);
        if batch.is_empty() {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(interval);
            continue;
        }

        let mut timeline = timeline.write();
        for raw in batch {
            if let Some(normalized) = normalizer.normalize(raw) {
                let event = timeline.append(normalized.kind, normalized.action, normalized.payload);
                debug!(line = %event.log_line(), "recorded event");
            }
        }
    }
}
