//! # Input Replay
//!
//! A desktop input-recording and replay engine. It observes global keyboard
//! and mouse activity through a pluggable hook service, normalizes the raw
//! event stream into a deduplicated, timestamped timeline, and compiles that
//! timeline into a replayable instruction script with faithful inter-action
//! timing.
//!
//! ## Quick Start
//!
//! ```
//! use input_replay::script::Synthesizer;
//! use input_replay::timeline::{Event, EventAction, EventKind, EventPayload};
//!
//! // Build a timeline (normally produced by a recording session)
//! let events = vec![
//!     Event::at(0.0, EventKind::Keyboard, EventAction::Pressed,
//!               EventPayload::key("a", false)),
//!     Event::at(0.5, EventKind::Keyboard, EventAction::Released,
//!               EventPayload::key("a", false)),
//! ];
//!
//! // Compile it into an executable script
//! let script = Synthesizer::new().compile(&events);
//! println!("{}", script.render_python());
//! ```
//!
//! ## Architecture
//!
//! - [`capture`]: hook-event model, SPSC ring buffer, and press/release
//!   deduplication (the event normalizer)
//! - [`timeline`]: the append-only, time-ordered event log
//! - [`script`]: pure timeline-to-instruction compilation plus the textual
//!   export format
//! - [`replay`]: cancellable instruction execution against an injection sink
//! - [`session`]: the state machine wiring capture and replay together
//! - [`app`]: CLI and configuration management
//!
//! ## Event Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Hook Service│───▶│ Ring Buffer │───▶│ Normalizer  │───▶│  Timeline   │
//! │ (callbacks) │    │ (lock-free) │    │   (dedup)   │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Injection  │◀───│   Replay    │◀───│ Instruction │◀───│ Synthesizer │
//! │    Sink     │    │  Executor   │    │   Script    │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! Replay never evaluates generated source text: the instruction sequence is
//! the authoritative representation and the rendered script is a derived
//! export format.

pub mod app;
pub mod capture;
pub mod replay;
pub mod script;
pub mod session;
pub mod timeline;

// Re-export commonly used types
pub use capture::normalizer::EventNormalizer;
pub use capture::raw::{HookError, HookService, MouseButton, RawHookEvent, RawKey};
pub use replay::executor::{ReplayExecutor, RunHandle, RunOutcome};
pub use replay::{InjectionError, InjectionSink};
pub use script::{Instruction, Script, Synthesizer};
pub use session::{ExecutionState, RecordingState, SessionController, StateChange};
pub use timeline::{Event, EventAction, EventKind, EventPayload, Timeline};

/// Result type alias for the replay engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the replay engine.
///
/// None of these are fatal to the process: every failure path returns the
/// engine to an Idle-compatible state so subsequent operations stay usable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A replay run was requested while one is already in flight.
    #[error("a replay run is already in progress")]
    AlreadyRunning,

    /// A replay run was requested while a recording session is active.
    /// Replaying during capture would record the synthetic events as if
    /// they were user input, corrupting the timeline.
    #[error("cannot replay while a recording is in progress")]
    RecordingInProgress,

    /// The injection sink failed mid-run. `index` is the 1-based position
    /// of the offending instruction in the script.
    #[error("injection failed at instruction {index}: {source}")]
    InjectionFailure {
        index: usize,
        #[source]
        source: replay::InjectionError,
    },

    /// The hook service could not start listening.
    #[error("hook service error: {0}")]
    Hook(#[from] capture::HookError),

    /// A session-state transition was requested in the wrong state.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
