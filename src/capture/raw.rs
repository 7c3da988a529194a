//! Raw Hook-Event Model
//!
//! Types delivered by the external global-hook service, before
//! normalization. The hook service itself (OS event tap, low-level
//! keyboard/mouse hook) is a black box behind the [`HookService`] trait:
//! it pushes [`RawHookEvent`]s into the capture ring buffer from whatever
//! thread the platform delivers callbacks on.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ring_buffer::HookEventProducer;

/// Failure reported by a hook service when it cannot start listening
/// (missing OS permissions, tap creation failure).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A raw keyboard key as reported by the platform hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawKey {
    /// A key with a direct character representation.
    Char(char),
    /// The shift modifier.
    Shift,
    /// The alt/option modifier.
    Alt,
    /// The OS meta modifier (command on macOS, win/super elsewhere).
    Meta,
    /// Any other key without a character representation, identified by its
    /// symbolic name (`enter`, `esc`, `f1`, ...).
    Named(String),
}

impl RawKey {
    /// Convenience constructor for named keys.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

/// A mouse button as reported by the platform hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Additional buttons, numbered from 4 upward.
    Other(u8),
}

impl MouseButton {
    /// Canonical lowercase token for this button.
    pub fn token(&self) -> String {
        match self {
            MouseButton::Left => "left".to_string(),
            MouseButton::Right => "right".to_string(),
            MouseButton::Middle => "middle".to_string(),
            MouseButton::Other(n) => format!("button{}", n),
        }
    }
}

/// One raw notification from the hook service.
///
/// Coordinates arrive as the floating-point values the OS reports; they are
/// rounded to integers by the normalizer, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawHookEvent {
    /// A key transition.
    Key { key: RawKey, pressed: bool },
    /// A mouse button transition at the given screen position.
    Mouse {
        button: MouseButton,
        x: f64,
        y: f64,
        pressed: bool,
    },
}

/// External global-hook service.
///
/// Implementations own the platform listening machinery. `start_listening`
/// hands over the producing half of the capture ring buffer; the service
/// pushes every observed transition into it until `stop_listening`. At most
/// one hook is active at a time (enforced by the session controller).
pub trait HookService: Send {
    /// Begin delivering raw events into `producer`.
    fn start_listening(&mut self, producer: HookEventProducer) -> Result<(), HookError>;

    /// Stop delivering events and release platform resources.
    fn stop_listening(&mut self);
}

/// A hook service that listens to nothing.
///
/// Used when no platform backend is wired up, so the rest of the engine
/// can run in demo mode (recording sessions simply capture no events).
#[derive(Debug, Default)]
pub struct NullHookService {
    listening: bool,
}

impl NullHookService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HookService for NullHookService {
    fn start_listening(&mut self, _producer: HookEventProducer) -> Result<(), HookError> {
        warn!("no platform hook backend available; recording will capture no events");
        self.listening = true;
        Ok(())
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }
}
