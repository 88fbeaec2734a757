//! Input conversion utilities.
//!
//! Maps winit key codes and mouse buttons to the engine-agnostic types in
//! [`lumina_core::input`].

use lumina_core::input::{KeyCode, MouseButton};
use winit::{event, keyboard};

/// Convert a winit [`keyboard::KeyCode`] to an engine [`KeyCode`], if a
/// mapping exists.
pub fn map_winit_key(key: keyboard::KeyCode) -> Option<KeyCode> {
    Some(match key {
        // Letters
        keyboard::KeyCode::KeyA => KeyCode::A,
        keyboard::KeyCode::KeyB => KeyCode::B,
        keyboard::KeyCode::KeyC => KeyCode::C,
        keyboard::KeyCode::KeyD => KeyCode::D,
        keyboard::KeyCode::KeyE => KeyCode::E,
        keyboard::KeyCode::KeyF => KeyCode::F,
        keyboard::KeyCode::KeyG => KeyCode::G,
        keyboard::KeyCode::KeyH => KeyCode::H,
        keyboard::KeyCode::KeyI => KeyCode::I,
        keyboard::KeyCode::KeyJ => KeyCode::J,
        keyboard::KeyCode::KeyK => KeyCode::K,
        keyboard::KeyCode::KeyL => KeyCode::L,
        keyboard::KeyCode::KeyM => KeyCode::M,
        keyboard::KeyCode::KeyN => KeyCode::N,
        keyboard::KeyCode::KeyO => KeyCode::O,
        keyboard::KeyCode::KeyP => KeyCode::P,
        keyboard::KeyCode::KeyQ => KeyCode::Q,
        keyboard::KeyCode::KeyR => KeyCode::R,
        keyboard::KeyCode::KeyS => KeyCode::S,
        keyboard::KeyCode::KeyT => KeyCode::T,
        keyboard::KeyCode::KeyU => KeyCode::U,
        keyboard::KeyCode::KeyV => KeyCode::V,
        keyboard::KeyCode::KeyW => KeyCode::W,
        keyboard::KeyCode::KeyX => KeyCode::X,
        keyboard::KeyCode::KeyY => KeyCode::Y,
        keyboard::KeyCode::KeyZ => KeyCode::Z,

        // Digits, with the numpad doubling as the digit row
        keyboard::KeyCode::Digit0 | keyboard::KeyCode::Numpad0 => KeyCode::Digit0,
        keyboard::KeyCode::Digit1 | keyboard::KeyCode::Numpad1 => KeyCode::Digit1,
        keyboard::KeyCode::Digit2 | keyboard::KeyCode::Numpad2 => KeyCode::Digit2,
        keyboard::KeyCode::Digit3 | keyboard::KeyCode::Numpad3 => KeyCode::Digit3,
        keyboard::KeyCode::Digit4 | keyboard::KeyCode::Numpad4 => KeyCode::Digit4,
        keyboard::KeyCode::Digit5 | keyboard::KeyCode::Numpad5 => KeyCode::Digit5,
        keyboard::KeyCode::Digit6 | keyboard::KeyCode::Numpad6 => KeyCode::Digit6,
        keyboard::KeyCode::Digit7 | keyboard::KeyCode::Numpad7 => KeyCode::Digit7,
        keyboard::KeyCode::Digit8 | keyboard::KeyCode::Numpad8 => KeyCode::Digit8,
        keyboard::KeyCode::Digit9 | keyboard::KeyCode::Numpad9 => KeyCode::Digit9,

        // Modifiers
        keyboard::KeyCode::ShiftLeft => KeyCode::ShiftLeft,
        keyboard::KeyCode::ShiftRight => KeyCode::ShiftRight,
        keyboard::KeyCode::ControlLeft => KeyCode::ControlLeft,
        keyboard::KeyCode::ControlRight => KeyCode::ControlRight,

        keyboard::KeyCode::BracketLeft => KeyCode::BracketLeft,
        keyboard::KeyCode::BracketRight => KeyCode::BracketRight,
        keyboard::KeyCode::Space => KeyCode::Space,
        keyboard::KeyCode::Escape => KeyCode::Escape,

        _ => return None,
    })
}

/// Convert a winit mouse button. Back, forward and extra buttons are
/// ignored.
pub fn map_winit_button(button: event::MouseButton) -> Option<MouseButton> {
    match button {
        event::MouseButton::Left => Some(MouseButton::Left),
        event::MouseButton::Right => Some(MouseButton::Right),
        event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numpad_maps_to_digits() {
        assert_eq!(
            map_winit_key(keyboard::KeyCode::Numpad3),
            Some(KeyCode::Digit3)
        );
        assert_eq!(
            map_winit_key(keyboard::KeyCode::Digit3),
            Some(KeyCode::Digit3)
        );
    }

    #[test]
    fn test_unmapped_keys() {
        assert_eq!(map_winit_key(keyboard::KeyCode::F5), None);
        assert_eq!(map_winit_button(event::MouseButton::Back), None);
        assert_eq!(
            map_winit_button(event::MouseButton::Right),
            Some(MouseButton::Right)
        );
    }
}
