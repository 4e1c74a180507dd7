//! OS-facing key codes, expressed as USB HID Usage IDs (page 0x07).
//!
//! The receiver never talks to the OS in platform-native codes: every key it
//! holds, repeats or releases is one of these values, and the injector at the
//! edge of the system translates them into whatever the desktop needs.
//!
//! Only the keys a gamepad-style mapping or a client `key_hint` realistically
//! targets are listed.  A hint outside this set is rejected by
//! [`KeyCode::try_from`] and the receiver falls back to the default mapping.

use serde::{Deserialize, Serialize};

/// Declares the [`KeyCode`] enum together with its `u16` conversion table so
/// the variant list and the raw-value lookup can never drift apart.
macro_rules! key_codes {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)+) => {
        /// USB HID Usage ID for a keyboard key understood by the receiver.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum KeyCode {
            $($(#[$meta])* $name = $value,)+
        }

        impl TryFrom<u16> for KeyCode {
            type Error = u16;

            /// Converts a raw HID usage id; the unmatched value is handed back.
            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(KeyCode::$name),)+
                    other => Err(other),
                }
            }
        }

        impl KeyCode {
            /// Every key code in declaration order.
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$name,)+];
        }
    };
}

key_codes! {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Numpad digits
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,

    // Modifiers (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl KeyCode {
    /// Returns the raw USB HID Usage ID.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Interprets a wire `key_hint`.  Negative or out-of-range values are `None`.
    pub fn from_hint(hint: i32) -> Option<Self> {
        u16::try_from(hint).ok().and_then(|v| KeyCode::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_round_trips_every_declared_key() {
        for &key in KeyCode::ALL {
            assert_eq!(KeyCode::try_from(key.as_u16()), Ok(key));
        }
    }

    #[test]
    fn test_try_from_returns_raw_value_for_unassigned_usage() {
        // 0x32 (non-US hash) and 0x39 (caps lock) are deliberately not mapped.
        assert_eq!(KeyCode::try_from(0x32), Err(0x32));
        assert_eq!(KeyCode::try_from(0x39), Err(0x39));
        assert_eq!(KeyCode::try_from(0x00), Err(0x00));
    }

    #[test]
    fn test_from_hint_rejects_negative_and_oversized_values() {
        assert_eq!(KeyCode::from_hint(-1), None);
        assert_eq!(KeyCode::from_hint(70_000), None);
        assert_eq!(KeyCode::from_hint(0x2C), Some(KeyCode::Space));
    }
}
