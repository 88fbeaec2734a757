//! Platform-agnostic input types.
//!
//! [`KeyCode`] identifies physical keys without depending on any windowing
//! crate. [`InputState`] tracks which keys are held and where the cursor
//! was last seen, so per-frame logic can poll instead of reacting to events.

use std::collections::HashSet;

/// Physical keyboard key identifier (US QWERTY position names).
///
/// Only keys the demo shell reacts to are listed; platform layers return
/// `None` for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyCode {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Digits
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,

    // Modifiers
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,

    BracketLeft,
    BracketRight,
    Space,
    Escape,
}

impl KeyCode {
    /// Numeric value of a digit key.
    pub fn digit(self) -> Option<u32> {
        Some(match self {
            Self::Digit0 => 0,
            Self::Digit1 => 1,
            Self::Digit2 => 2,
            Self::Digit3 => 3,
            Self::Digit4 => 4,
            Self::Digit5 => 5,
            Self::Digit6 => 6,
            Self::Digit7 => 7,
            Self::Digit8 => 8,
            Self::Digit9 => 9,
            _ => return None,
        })
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Held keys, held buttons and the last cursor position.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    cursor: Option<(f64, f64)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition. Returns `true` if the key was not already
    /// held, so auto-repeat presses can be told apart from the first one.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        if pressed {
            self.keys.insert(key)
        } else {
            self.keys.remove(&key);
            false
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn shift(&self) -> bool {
        self.is_pressed(KeyCode::ShiftLeft) || self.is_pressed(KeyCode::ShiftRight)
    }

    pub fn ctrl(&self) -> bool {
        self.is_pressed(KeyCode::ControlLeft) || self.is_pressed(KeyCode::ControlRight)
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    /// Move the cursor and return the offset from the previous position.
    ///
    /// The first position after creation or [`release_all`](Self::release_all)
    /// has no predecessor and yields `None`, which keeps the camera from
    /// jumping when the cursor enters the window.
    pub fn move_cursor(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        let previous = self.cursor.replace((x, y));
        previous.map(|(px, py)| (x - px, y - py))
    }

    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    /// Drop the cursor position so the next move starts a new track.
    pub fn forget_cursor(&mut self) {
        self.cursor = None;
    }

    /// Forget everything, e.g. when the window loses focus and release
    /// events will never arrive.
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.buttons.clear();
        self.cursor = None;
    }
}
