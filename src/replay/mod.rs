//! Replay Module
//!
//! The injection-sink boundary and the executor that drives an instruction
//! sequence against it under a cancellable run state.

pub mod executor;

pub use executor::{CancelToken, ReplayExecutor, RunHandle, RunOutcome};

use tracing::info;

/// Failure reported by an injection sink call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct InjectionError(pub String);

impl InjectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// External service capable of synthesizing keyboard/mouse input at the OS
/// level. Each call may fail; the executor halts the run on the first
/// failure and surfaces it with the offending instruction index.
pub trait InjectionSink: Send {
    fn key_down(&mut self, key: &str) -> Result<(), InjectionError>;
    fn key_up(&mut self, key: &str) -> Result<(), InjectionError>;
    fn mouse_down(&mut self, button: &str, x: i32, y: i32) -> Result<(), InjectionError>;
    fn mouse_up(&mut self, button: &str, x: i32, y: i32) -> Result<(), InjectionError>;
}

/// A sink that logs each injection instead of performing it.
///
/// Used for dry runs and when no platform injection backend is wired up.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl InjectionSink for TracingSink {
    fn key_down(&mut self, key: &str) -> Result<(), InjectionError> {
        info!(key, "inject: key down");
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<(), InjectionError> {
        info!(key, "inject: key up");
        Ok(())
    }

    fn mouse_down(&mut self, button: &str, x: i32, y: i32) -> Result<(), InjectionError> {
        info!(button, x, y, "inject: mouse down");
        Ok(())
    }

    fn mouse_up(&mut self, button: &str, x: i32, y: i32) -> Result<(), InjectionError> {
        info!(button, x, y, "inject: mouse up");
        Ok(())
    }
}
