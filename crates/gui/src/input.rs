//! Normalized pointer/keyboard events and the pointer state derived from them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Escape,
    Shift,
}

/// Input event as delivered by the host after normalization.
/// Positions are viewport pixels with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseMove {
        current: Vec2,
        delta: Vec2,
        previous: Vec2,
    },
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    /// Scroll direction, -1 or 1
    MouseScroll(i8),
    KeyDown(Key),
    KeyUp(Key),
}

impl InputEvent {
    /// Build a move event from the previous and current position
    pub fn moved(previous: Vec2, current: Vec2) -> Self {
        InputEvent::MouseMove {
            current,
            delta: current - previous,
            previous,
        }
    }
}

/// Pointer state owned by the input layer. The core only reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Current position
    pub position: Vec2,
    /// Position at the last button press
    pub press: Vec2,
    /// Movement since the previous move event
    pub delta: Vec2,
    pub left: bool,
    pub middle: bool,
    pub right: bool,
    pub shift: bool,
}

impl PointerState {
    pub fn is_down(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Middle => self.middle,
            MouseButton::Right => self.right,
        }
    }

    /// Bookkeeping the input layer performs before the event reaches the core
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::MouseMove { current, delta, .. } => {
                self.position = current;
                self.delta = delta;
            }
            InputEvent::MouseDown(button) => {
                self.press = self.position;
                self.set_button(button, true);
            }
            InputEvent::MouseUp(button) => self.set_button(button, false),
            InputEvent::KeyDown(Key::Shift) => self.shift = true,
            InputEvent::KeyUp(Key::Shift) => self.shift = false,
            InputEvent::MouseScroll(_) | InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => {}
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left = down,
            MouseButton::Middle => self.middle = down,
            MouseButton::Right => self.right = down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_records_position() {
        let mut p = PointerState::default();
        p.apply(&InputEvent::moved(Vec2::ZERO, Vec2::new(12.0, 7.0)));
        p.apply(&InputEvent::MouseDown(MouseButton::Left));
        assert_eq!(p.press, Vec2::new(12.0, 7.0));
        assert!(p.left);
        assert!(!p.middle);

        p.apply(&InputEvent::moved(Vec2::new(12.0, 7.0), Vec2::new(20.0, 9.0)));
        assert_eq!(p.press, Vec2::new(12.0, 7.0));
        assert_eq!(p.delta, Vec2::new(8.0, 2.0));
    }

    #[test]
    fn test_release_clears_only_that_button() {
        let mut p = PointerState::default();
        p.apply(&InputEvent::MouseDown(MouseButton::Left));
        p.apply(&InputEvent::MouseDown(MouseButton::Middle));
        p.apply(&InputEvent::MouseUp(MouseButton::Middle));
        assert!(p.left);
        assert!(!p.is_down(MouseButton::Middle));
    }

    #[test]
    fn test_shift_tracked_from_keys() {
        let mut p = PointerState::default();
        p.apply(&InputEvent::KeyDown(Key::Shift));
        assert!(p.shift);
        p.apply(&InputEvent::KeyDown(Key::Char('a')));
        assert!(p.shift);
        p.apply(&InputEvent::KeyUp(Key::Shift));
        assert!(!p.shift);
    }
}
