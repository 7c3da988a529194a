//! Event Normalizer
//!
//! Translates raw hook notifications into canonical events, applying
//! press/release deduplication. OS auto-repeat delivers a stream of
//! key-down callbacks while a key is held; only the first real transition
//! may reach the timeline. The normalizer owns the two session-scoped
//! active-input sets (held keys, held mouse buttons) and is the only
//! component allowed to mutate them.

use std::collections::HashSet;
use tracing::trace;

use super::raw::{MouseButton, RawHookEvent, RawKey};
use crate::timeline::{EventAction, EventKind, EventPayload};

/// A canonical event body, ready to be stamped and appended to the
/// timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub action: EventAction,
    pub payload: EventPayload,
}

/// Stateful raw-event translator with press-repeat deduplication.
#[derive(Debug, Default)]
pub struct EventNormalizer {
    /// Canonical tokens of currently-held keys.
    active_keys: HashSet<String>,
    /// Canonical tokens of currently-held mouse buttons.
    active_buttons: HashSet<String>,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both active-input sets. Called when a new recording session
    /// starts so held state never leaks across sessions.
    pub fn reset(&mut self) {
        self.active_keys.clear();
        self.active_buttons.clear();
    }

    /// Normalize one raw hook notification.
    pub fn normalize(&mut self, raw: RawHookEvent) -> Option<NormalizedEvent> {
        match raw {
            RawHookEvent::Key { key, pressed } => self.on_key_transition(&key, pressed),
            RawHookEvent::Mouse {
                button,
                x,
                y,
                pressed,
            } => self.on_mouse_transition(button, x, y, pressed),
        }
    }

    /// Handle a key transition.
    ///
    /// Returns `None` when the transition is suppressed: a press of a key
    /// already held (auto-repeat), or a release of a key not held (stray
    /// release, ignored defensively). On a real transition the active-key
    /// set is updated and the canonical event is returned.
    pub fn on_key_transition(&mut self, raw_key: &RawKey, pressed: bool) -> Option<NormalizedEvent> {
        let (token, is_special) = canonical_key(raw_key);

        if pressed {
            if !self.active_keys.insert(token.clone()) {
                trace!(key = %token, "suppressed repeat key press");
                return None;
            }
        } else if !self.active_keys.remove(&token) {
            trace!(key = %token, "ignored stray key release");
            return None;
        }

        Some(NormalizedEvent {
            kind: EventKind::Keyboard,
            action: action_for(pressed),
            payload: EventPayload::key(token, is_special),
        })
    }

    /// Handle a mouse button transition.
    ///
    /// Coordinates are rounded to the nearest integer at this boundary so
    /// fractional OS-reported positions never leak into the timeline.
    /// Suppression mirrors [`Self::on_key_transition`], keyed on the
    /// active-button set.
    pub fn on_mouse_transition(
        &mut self,
        button: MouseButton,
        x: f64,
        y: f64,
        pressed: bool,
    ) -> Option<NormalizedEvent> {
        let token = button.token();

        if pressed {
            if !self.active_buttons.insert(token.clone()) {
                trace!(button = %token, "suppressed repeat button press");
                return None;
            }
        } else if !self.active_buttons.remove(&token) {
            trace!(button = %token, "ignored stray button release");
            return None;
        }

        Some(NormalizedEvent {
            kind: EventKind::Mouse,
            action: action_for(pressed),
            payload: EventPayload::mouse(token, x.round() as i32, y.round() as i32),
        })
    }

    /// Number of currently-held keys (diagnostics).
    pub fn held_key_count(&self) -> usize {
        self.active_keys.len()
    }

    /// Number of currently-held mouse buttons (diagnostics).
    pub fn held_button_count(&self) -> usize {
        self.active_buttons.len()
    }
}

fn action_for(pressed: bool) -> EventAction {
    if pressed {
        EventAction::Pressed
    } else {
        EventAction::Released
    }
}

/// Map a raw key to its canonical token and special-key flag.
///
/// Modifiers use the macOS-style names the script host expects: the alt
/// modifier becomes `option` and the OS meta modifier becomes `command`.
/// Character keys are lowercased; any other key keeps its symbolic name.
fn canonical_key(raw: &RawKey) -> (String, bool) {
    match raw {
        RawKey::Shift => ("shift".to_string(), true),
        RawKey::Alt => ("option".to_string(), true),
        RawKey::Meta => ("command".to_string(), true),
        RawKey::Char(c) => (c.to_lowercase().collect(), false),
        RawKey::Named(name) => (name.clone(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_key_lowercased() {
        let mut norm = EventNormalizer::new();
        let event = norm.on_key_transition(&RawKey::Char('A'), true).unwrap();

        assert_eq!(event.kind, EventKind::Keyboard);
        assert_eq!(event.action, EventAction::Pressed);
        assert_eq!(event.payload, EventPayload::key("a", false));
    }

    #[test]
    fn test_modifier_mapping() {
        let mut norm = EventNormalizer::new();

        let shift = norm.on_key_transition(&RawKey::Shift, true).unwrap();
        assert_eq!(shift.payload, EventPayload::key("shift", true));

        let alt = norm.on_key_transition(&RawKey::Alt, true).unwrap();
        assert_eq!(alt.payload, EventPayload::key("option", true));

        let meta = norm.on_key_transition(&RawKey::Meta, true).unwrap();
        assert_eq!(meta.payload, EventPayload::key("command", true));
    }

    #[test]
    fn test_named_key_is_special() {
        let mut norm = EventNormalizer::new();
        let event = norm
            .on_key_transition(&RawKey::named("enter"), true)
            .unwrap();
        assert_eq!(event.payload, EventPayload::key("enter", true));
    }

    #[test]
    fn test_auto_repeat_suppressed() {
        let mut norm = EventNormalizer::new();

        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_some());
        // OS auto-repeat: further presses with no intervening release
        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_none());
        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_none());

        // Release goes through, after which press is real again
        assert!(norm.on_key_transition(&RawKey::Char('a'), false).is_some());
        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_some());
    }

    #[test]
    fn test_stray_release_ignored() {
        let mut norm = EventNormalizer::new();
        assert!(norm.on_key_transition(&RawKey::Char('z'), false).is_none());
        assert!(norm
            .on_mouse_transition(MouseButton::Left, 0.0, 0.0, false)
            .is_none());
    }

    #[test]
    fn test_distinct_keys_tracked_independently() {
        let mut norm = EventNormalizer::new();

        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_some());
        assert!(norm.on_key_transition(&RawKey::Char('b'), true).is_some());
        assert_eq!(norm.held_key_count(), 2);

        assert!(norm.on_key_transition(&RawKey::Char('a'), false).is_some());
        assert_eq!(norm.held_key_count(), 1);
    }

    #[test]
    fn test_mouse_coordinates_rounded() {
        let mut norm = EventNormalizer::new();
        let event = norm
            .on_mouse_transition(MouseButton::Left, 100.4, 200.6, true)
            .unwrap();

        assert_eq!(event.kind, EventKind::Mouse);
        assert_eq!(event.payload, EventPayload::mouse("left", 100, 201));
    }

    #[test]
    fn test_mouse_dedup() {
        let mut norm = EventNormalizer::new();

        assert!(norm
            .on_mouse_transition(MouseButton::Left, 1.0, 1.0, true)
            .is_some());
        assert!(norm
            .on_mouse_transition(MouseButton::Left, 2.0, 2.0, true)
            .is_none());
        // A different button is independent
        assert!(norm
            .on_mouse_transition(MouseButton::Right, 2.0, 2.0, true)
            .is_some());

        assert!(norm
            .on_mouse_transition(MouseButton::Left, 3.0, 3.0, false)
            .is_some());
    }

    #[test]
    fn test_keys_and_buttons_independent() {
        let mut norm = EventNormalizer::new();

        // Holding a key does not affect button dedup and vice versa
        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_some());
        assert!(norm
            .on_mouse_transition(MouseButton::Left, 0.0, 0.0, true)
            .is_some());
        assert_eq!(norm.held_key_count(), 1);
        assert_eq!(norm.held_button_count(), 1);
    }

    #[test]
    fn test_reset_clears_held_state() {
        let mut norm = EventNormalizer::new();
        norm.on_key_transition(&RawKey::Char('a'), true);
        norm.on_mouse_transition(MouseButton::Left, 0.0, 0.0, true);
        norm.reset();

        assert_eq!(norm.held_key_count(), 0);
        assert_eq!(norm.held_button_count(), 0);

        // After reset, a press of the formerly-held key is a real transition
        assert!(norm.on_key_transition(&RawKey::Char('a'), true).is_some());
    }

    #[test]
    fn test_normalize_dispatches() {
        let mut norm = EventNormalizer::new();

        let key = norm
            .normalize(RawHookEvent::Key {
                key: RawKey::Char('q'),
                pressed: true,
            })
            .unwrap();
        assert_eq!(key.kind, EventKind::Keyboard);

        let mouse = norm
            .normalize(RawHookEvent::Mouse {
                button: MouseButton::Middle,
                x: 7.5,
                y: 8.5,
                pressed: true,
            })
            .unwrap();
        assert_eq!(mouse.kind, EventKind::Mouse);
        assert_eq!(mouse.payload, EventPayload::mouse("middle", 8, 9));
    }
}
