//! Recording Timeline
//!
//! The canonical event model and the append-only, time-ordered log of one
//! recording session. Timestamps are assigned here, at append time, as
//! seconds elapsed since the session clock started, rounded to millisecond
//! precision. The log is never mutated once an event is appended; readers
//! take an owned snapshot and iterate that, so the timeline may keep
//! growing underneath them during an active recording.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Round a seconds value to millisecond precision (3 decimal places).
#[inline]
pub fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Which input device produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Keyboard,
    Mouse,
}

/// The observed transition direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventAction {
    Pressed,
    Released,
}

impl EventAction {
    /// Display label used in timeline log lines.
    pub fn label(&self) -> &'static str {
        match self {
            EventAction::Pressed => "Pressed",
            EventAction::Released => "Released",
        }
    }
}

/// Device-specific event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// A keyboard key, as a canonical lowercase character or named token.
    Keyboard { key: String, is_special: bool },
    /// A mouse button with integer screen coordinates.
    Mouse { button: String, x: i32, y: i32 },
}

impl EventPayload {
    /// Keyboard payload constructor.
    pub fn key(key: impl Into<String>, is_special: bool) -> Self {
        Self::Keyboard {
            key: key.into(),
            is_special,
        }
    }

    /// Mouse payload constructor.
    pub fn mouse(button: impl Into<String>, x: i32, y: i32) -> Self {
        Self::Mouse {
            button: button.into(),
            x,
            y,
        }
    }
}

/// Immutable record of one observed input transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds since the recording session began, rounded to milliseconds.
    /// Non-decreasing across the timeline.
    pub timestamp: f64,
    pub kind: EventKind,
    pub action: EventAction,
    pub payload: EventPayload,
}

impl Event {
    /// Construct an event with an explicit timestamp.
    ///
    /// Recording sessions stamp events via [`Timeline::append`]; this
    /// constructor exists for synthesizing timelines directly (tests,
    /// imported data).
    pub fn at(timestamp: f64, kind: EventKind, action: EventAction, payload: EventPayload) -> Self {
        Self {
            timestamp,
            kind,
            action,
            payload,
        }
    }

    /// Human-readable log line in the shell's display format:
    /// `[+1.234s] Mouse Event - Left button Pressed at (100, 200)`
    /// `[+0.500s] Keyboard Event - Key Pressed: a`
    pub fn log_line(&self) -> String {
        match &self.payload {
            EventPayload::Mouse { button, x, y } => {
                format!(
                    "[+{:.3}s] Mouse Event - {} button {} at ({}, {})",
                    self.timestamp,
                    capitalize(button),
                    self.action.label(),
                    x,
                    y
                )
            }
            EventPayload::Keyboard { key, is_special } => {
                let kind = if *is_special { "Special Key" } else { "Key" };
                format!(
                    "[+{:.3}s] Keyboard Event - {} {}: {}",
                    self.timestamp,
                    kind,
                    self.action.label(),
                    key
                )
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Append-only, time-ordered log of canonical events for one session.
///
/// Owned exclusively by the current recording session: created empty at
/// session start, appended to only while recording, cleared on reset.
#[derive(Debug)]
pub struct Timeline {
    events: Vec<Event>,
    started_at: Instant,
}

impl Timeline {
    /// Create an empty timeline with the session clock starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            started_at: Instant::now(),
        }
    }

    /// Append a normalized event, stamping it with the elapsed session time
    /// rounded to millisecond precision. Returns the stored record.
    pub fn append(&mut self, kind: EventKind, action: EventAction, payload: EventPayload) -> Event {
        let timestamp = round_millis(self.started_at.elapsed().as_secs_f64());
        let event = Event {
            timestamp,
            kind,
            action,
            payload,
        };
        self.events.push(event.clone());
        event
    }

    /// Clear the log and restart the session clock.
    pub fn clear(&mut self) {
        self.events.clear();
        self.started_at = Instant::now();
    }

    /// Owned copy of the current (possibly partial) event sequence.
    /// Safe to call at any time, including mid-recording.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.clone()
    }

    /// Render the current log as human-readable display lines.
    pub fn log_lines(&self) -> Vec<String> {
        self.events.iter().map(Event::log_line).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the timeline is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Elapsed session time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
