//! Script Synthesizer
//!
//! Pure, deterministic compilation of a timeline snapshot into an ordered
//! instruction sequence. The instruction sequence is the authoritative
//! replay representation; [`python`] renders it to the textual export
//! format. Compiling the same snapshot twice yields byte-identical output:
//! there are no hidden counters and no clock reads beyond the timestamps
//! stored in the events themselves.

pub mod python;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::timeline::{round_millis, Event, EventAction, EventKind, EventPayload};

/// Fixed startup delay emitted ahead of the first action, giving any
/// external trigger time to settle before replay begins.
pub const DEFAULT_STARTUP_DELAY_SECS: f64 = 2.0;

/// One atomic replay step: a timed wait or an injected input action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Suspend replay for the given number of seconds (never negative).
    Wait(f64),
    KeyDown(String),
    KeyUp(String),
    MouseDown { button: String, x: i32, y: i32 },
    MouseUp { button: String, x: i32, y: i32 },
}

/// Compilation output: the ordered instruction sequence plus a count of
/// malformed events that were skipped (kind/payload mismatches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub instructions: Vec<Instruction>,
    pub skipped_events: usize,
}

impl Script {
    /// Number of instructions in the script.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the script contains no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Render the script as pyautogui source text (the export format).
    pub fn render_python(&self) -> String {
        python::render(&self.instructions)
    }
}

/// Stateless timeline-to-script compiler.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer {
    startup_delay_secs: f64,
}

impl Synthesizer {
    /// Synthesizer with the default 2-second startup delay.
    pub fn new() -> Self {
        Self {
            startup_delay_secs: DEFAULT_STARTUP_DELAY_SECS,
        }
    }

    /// Synthesizer with a custom startup delay.
    pub fn with_startup_delay(startup_delay_secs: f64) -> Self {
        Self { startup_delay_secs }
    }

    /// Compile a timeline snapshot into a script.
    ///
    /// Emits the startup wait, then for each event the matching action
    /// instruction, preceded (from the second action onward) by a wait for
    /// the timestamp delta to the previously emitted action. Negative or
    /// zero deltas are clamped to 0 rather than rejected. Events whose
    /// kind does not match their payload are skipped and counted.
    pub fn compile(&self, events: &[Event]) -> Script {
        let mut instructions = vec![Instruction::Wait(self.startup_delay_secs)];
        let mut skipped_events = 0;
        let mut previous_timestamp: Option<f64> = None;

        for event in events {
            let action = match instruction_for(event) {
                Some(instr) => instr,
                None => {
                    warn!(
                        kind = ?event.kind,
                        action = ?event.action,
                        "skipping malformed event during synthesis"
                    );
                    skipped_events += 1;
                    continue;
                }
            };

            if let Some(prev) = previous_timestamp {
                let delta = round_millis((event.timestamp - prev).max(0.0));
                instructions.push(Instruction::Wait(delta));
            }
            previous_timestamp = Some(event.timestamp);

            instructions.push(action);
        }

        Script {
            instructions,
            skipped_events,
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an event to its action instruction, or `None` when the event's kind
/// does not match its payload.
fn instruction_for(event: &Event) -> Option<Instruction> {
    match (event.kind, event.action, &event.payload) {
        (EventKind::Keyboard, EventAction::Pressed, EventPayload::Keyboard { key, .. }) => {
            Some(Instruction::KeyDown(key.clone()))
        }
        (EventKind::Keyboard, EventAction::Released, EventPayload::Keyboard { key, .. }) => {
            Some(Instruction::KeyUp(key.clone()))
        }
        (EventKind::Mouse, EventAction::Pressed, EventPayload::Mouse { button, x, y }) => {
            Some(Instruction::MouseDown {
                button: button.clone(),
                x: *x,
                y: *y,
            })
        }
        (EventKind::Mouse, EventAction::Released, EventPayload::Mouse { button, x, y }) => {
            Some(Instruction::MouseUp {
                button: button.clone(),
                x: *x,
                y: *y,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(timestamp: f64, key: &str, action: EventAction) -> Event {
        Event::at(
            timestamp,
            EventKind::Keyboard,
            action,
            EventPayload::key(key, false),
        )
    }

    fn mouse_event(timestamp: f64, button: &str, x: i32, y: i32, action: EventAction) -> Event {
        Event::at(
            timestamp,
            EventKind::Mouse,
            action,
            EventPayload::mouse(button, x, y),
        )
    }

    #[test]
    fn test_empty_timeline_compiles_to_preamble_only() {
        let script = Synthesizer::new().compile(&[]);
        assert_eq!(script.instructions, vec![Instruction::Wait(2.0)]);
        assert_eq!(script.skipped_events, 0);
    }

    #[test]
    fn test_round_trip_timing() {
        let events = vec![
            key_event(0.0, "a", EventAction::Pressed),
            key_event(0.5, "a", EventAction::Released),
        ];
        let script = Synthesizer::new().compile(&events);

        assert_eq!(
            script.instructions,
            vec![
                Instruction::Wait(2.0),
                Instruction::KeyDown("a".to_string()),
                Instruction::Wait(0.5),
                Instruction::KeyUp("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_wait_before_first_action() {
        let events = vec![key_event(3.7, "x", EventAction::Pressed)];
        let script = Synthesizer::new().compile(&events);

        // The first action follows the preamble directly, regardless of the
        // first event's absolute timestamp
        assert_eq!(
            script.instructions,
            vec![
                Instruction::Wait(2.0),
                Instruction::KeyDown("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_mouse_instruction_mapping() {
        let events = vec![
            mouse_event(0.1, "left", 100, 200, EventAction::Pressed),
            mouse_event(0.25, "left", 100, 200, EventAction::Released),
        ];
        let script = Synthesizer::new().compile(&events);

        assert_eq!(
            script.instructions,
            vec![
                Instruction::Wait(2.0),
                Instruction::MouseDown {
                    button: "left".to_string(),
                    x: 100,
                    y: 200,
                },
                Instruction::Wait(0.15),
                Instruction::MouseUp {
                    button: "left".to_string(),
                    x: 100,
                    y: 200,
                },
            ]
        );
    }

    #[test]
    fn test_negative_delta_clamped_to_zero() {
        // Not expected from a well-formed timeline, but clock jitter must
        // clamp rather than reject
        let events = vec![
            key_event(1.0, "a", EventAction::Pressed),
            key_event(0.6, "a", EventAction::Released),
        ];
        let script = Synthesizer::new().compile(&events);

        assert_eq!(script.instructions[2], Instruction::Wait(0.0));
    }

    #[test]
    fn test_zero_delta_emits_zero_wait() {
        let events = vec![
            key_event(0.5, "a", EventAction::Pressed),
            key_event(0.5, "b", EventAction::Pressed),
        ];
        let script = Synthesizer::new().compile(&events);

        assert_eq!(
            script.instructions,
            vec![
                Instruction::Wait(2.0),
                Instruction::KeyDown("a".to_string()),
                Instruction::Wait(0.0),
                Instruction::KeyDown("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_delta_rounded_to_millis() {
        let events = vec![
            key_event(0.0, "a", EventAction::Pressed),
            key_event(0.1234567, "a", EventAction::Released),
        ];
        let script = Synthesizer::new().compile(&events);
        assert_eq!(script.instructions[2], Instruction::Wait(0.123));
    }

    #[test]
    fn test_malformed_events_skipped_and_counted() {
        let events = vec![
            key_event(0.0, "a", EventAction::Pressed),
            // Keyboard kind carrying a mouse payload: malformed
            Event::at(
                0.2,
                EventKind::Keyboard,
                EventAction::Pressed,
                EventPayload::mouse("left", 1, 2),
            ),
            key_event(0.5, "a", EventAction::Released),
        ];
        let script = Synthesizer::new().compile(&events);

        assert_eq!(script.skipped_events, 1);
        // The wait spans from the last emitted action, keeping total timing
        assert_eq!(
            script.instructions,
            vec![
                Instruction::Wait(2.0),
                Instruction::KeyDown("a".to_string()),
                Instruction::Wait(0.5),
                Instruction::KeyUp("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_synthesis_determinism() {
        let events = vec![
            key_event(0.0, "h", EventAction::Pressed),
            key_event(0.08, "h", EventAction::Released),
            mouse_event(1.5, "right", 640, 480, EventAction::Pressed),
            mouse_event(1.62, "right", 640, 480, EventAction::Released),
        ];

        let synth = Synthesizer::new();
        let first = synth.compile(&events);
        let second = synth.compile(&events);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_custom_startup_delay() {
        let events = vec![key_event(0.0, "a", EventAction::Pressed)];
        let script = Synthesizer::with_startup_delay(0.5).compile(&events);
        assert_eq!(script.instructions[0], Instruction::Wait(0.5));
    }

    #[test]
    fn test_instruction_serialization_roundtrip() {
        let instr = Instruction::MouseDown {
            button: "left".to_string(),
            x: -5,
            y: 10,
        };
        let json = serde_json::to_string(&instr).unwrap();
        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(instr, back);
    }
}
