//! Logical button identifiers and their default key bindings.
//!
//! The sender speaks in *logical* buttons (gamepad A, Start, D-pad up, …) and
//! analog sticks; the receiver presses *keys*.  This module is the single
//! place where one is turned into the other.
//!
//! ```text
//! Button { code: 10 } ──> LogicalButton::A ──> ButtonMap ──> KeyCode::KeyJ
//! Axis { id: 0, x: -800 } ─────────────────────> StickKeys ──> KeyCode::KeyA
//! ```

pub mod key_code;

pub use key_code::KeyCode;

/// Wire button codes reserved for the mouse.
pub const MOUSE_LEFT_CODE: i32 = 0;
pub const MOUSE_RIGHT_CODE: i32 = 1;

/// First wire button code of the gamepad range.
pub const GAMEPAD_CODE_BASE: i32 = 10;

/// Stick id of the left analog stick.
pub const LEFT_STICK_ID: i32 = 0;
/// Stick id of the right analog stick.
pub const RIGHT_STICK_ID: i32 = 1;

/// Fixed-point full scale of axis and steering values.
pub const AXIS_FULL_SCALE: i32 = 1000;

/// A gamepad-class logical button (wire codes ≥ 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LogicalButton {
    A = 10,
    B = 11,
    X = 12,
    Y = 13,
    L1 = 14,
    R1 = 15,
    Start = 16,
    Select = 17,
    DpadUp = 18,
    DpadDown = 19,
    DpadLeft = 20,
    DpadRight = 21,
}

impl TryFrom<i32> for LogicalButton {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            10 => Ok(LogicalButton::A),
            11 => Ok(LogicalButton::B),
            12 => Ok(LogicalButton::X),
            13 => Ok(LogicalButton::Y),
            14 => Ok(LogicalButton::L1),
            15 => Ok(LogicalButton::R1),
            16 => Ok(LogicalButton::Start),
            17 => Ok(LogicalButton::Select),
            18 => Ok(LogicalButton::DpadUp),
            19 => Ok(LogicalButton::DpadDown),
            20 => Ok(LogicalButton::DpadLeft),
            21 => Ok(LogicalButton::DpadRight),
            other => Err(other),
        }
    }
}

impl LogicalButton {
    /// Returns the wire code of this button.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Menu-class buttons post one down/up pair and never auto-repeat.
    pub fn is_repeatable(self) -> bool {
        !matches!(self, LogicalButton::Start | LogicalButton::Select)
    }
}

/// Whether a wire button code belongs to the gamepad range.
pub fn is_gamepad_code(code: i32) -> bool {
    code >= GAMEPAD_CODE_BASE
}

/// The four direction keys driven by one stick (or the two driven by steering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickKeys {
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
}

/// Binding table from logical controls to key codes.
///
/// The defaults suit a keyboard-driven game: face buttons on the right hand
/// (J/K/U/I), shoulders on Q/E, left stick on WASD, D-pad on the arrows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    pub a: KeyCode,
    pub b: KeyCode,
    pub x: KeyCode,
    pub y: KeyCode,
    pub l1: KeyCode,
    pub r1: KeyCode,
    pub start: KeyCode,
    pub select: KeyCode,
    pub dpad: StickKeys,
    pub left_stick: StickKeys,
    pub right_stick: StickKeys,
    /// Steering uses only `left` and `right`.
    pub steering: StickKeys,
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            a: KeyCode::KeyJ,
            b: KeyCode::KeyK,
            x: KeyCode::KeyU,
            y: KeyCode::KeyI,
            l1: KeyCode::KeyQ,
            r1: KeyCode::KeyE,
            start: KeyCode::Escape,
            select: KeyCode::Tab,
            dpad: StickKeys {
                up: KeyCode::ArrowUp,
                down: KeyCode::ArrowDown,
                left: KeyCode::ArrowLeft,
                right: KeyCode::ArrowRight,
            },
            left_stick: StickKeys {
                up: KeyCode::KeyW,
                down: KeyCode::KeyS,
                left: KeyCode::KeyA,
                right: KeyCode::KeyD,
            },
            right_stick: StickKeys {
                up: KeyCode::Numpad8,
                down: KeyCode::Numpad2,
                left: KeyCode::Numpad4,
                right: KeyCode::Numpad6,
            },
            steering: StickKeys {
                up: KeyCode::ArrowUp,
                down: KeyCode::ArrowDown,
                left: KeyCode::ArrowLeft,
                right: KeyCode::ArrowRight,
            },
        }
    }
}

impl ButtonMap {
    /// Returns the key bound to a logical button.
    pub fn key_for(&self, button: LogicalButton) -> KeyCode {
        match button {
            LogicalButton::A => self.a,
            LogicalButton::B => self.b,
            LogicalButton::X => self.x,
            LogicalButton::Y => self.y,
            LogicalButton::L1 => self.l1,
            LogicalButton::R1 => self.r1,
            LogicalButton::Start => self.start,
            LogicalButton::Select => self.select,
            LogicalButton::DpadUp => self.dpad.up,
            LogicalButton::DpadDown => self.dpad.down,
            LogicalButton::DpadLeft => self.dpad.left,
            LogicalButton::DpadRight => self.dpad.right,
        }
    }

    /// Resolves a wire button code (plus optional client hint) to a key.
    ///
    /// A valid `key_hint` always wins over the table.  Returns `None` for
    /// codes outside the gamepad range that carry no usable hint.
    pub fn resolve(&self, code: i32, key_hint: Option<i32>) -> Option<KeyCode> {
        if let Some(key) = key_hint.and_then(KeyCode::from_hint) {
            return Some(key);
        }
        LogicalButton::try_from(code).ok().map(|b| self.key_for(b))
    }

    /// Returns the direction keys for a stick id, if that stick is mapped.
    pub fn stick(&self, id: i32) -> Option<StickKeys> {
        match id {
            LEFT_STICK_ID => Some(self.left_stick),
            RIGHT_STICK_ID => Some(self.right_stick),
            _ => None,
        }
    }
}

/// Returns `false` for codes whose button must never auto-repeat.
///
/// Unknown gamepad codes (reachable only through a `key_hint`) repeat like
/// ordinary keys.
pub fn code_is_repeatable(code: i32) -> bool {
    LogicalButton::try_from(code)
        .map(LogicalButton::is_repeatable)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_button_round_trips_through_wire_code() {
        for code in 10..=21 {
            let button = LogicalButton::try_from(code).expect("gamepad code");
            assert_eq!(button.code(), code);
        }
        assert_eq!(LogicalButton::try_from(22), Err(22));
        assert_eq!(LogicalButton::try_from(0), Err(0));
    }

    #[test]
    fn test_start_and_select_are_not_repeatable() {
        assert!(!LogicalButton::Start.is_repeatable());
        assert!(!LogicalButton::Select.is_repeatable());
        assert!(LogicalButton::A.is_repeatable());
        assert!(LogicalButton::DpadLeft.is_repeatable());
        assert!(!code_is_repeatable(16));
        assert!(code_is_repeatable(99));
    }

    #[test]
    fn test_resolve_uses_default_table_without_hint() {
        // Arrange
        let map = ButtonMap::default();

        // Act / Assert
        assert_eq!(map.resolve(10, None), Some(KeyCode::KeyJ));
        assert_eq!(map.resolve(18, None), Some(KeyCode::ArrowUp));
        assert_eq!(map.resolve(16, None), Some(KeyCode::Escape));
    }

    #[test]
    fn test_resolve_prefers_valid_hint_over_table() {
        let map = ButtonMap::default();
        assert_eq!(map.resolve(10, Some(0x2C)), Some(KeyCode::Space));
    }

    #[test]
    fn test_resolve_falls_back_when_hint_is_invalid() {
        let map = ButtonMap::default();
        assert_eq!(map.resolve(11, Some(-5)), Some(KeyCode::KeyK));
        assert_eq!(map.resolve(42, Some(0x39)), None);
    }

    #[test]
    fn test_stick_lookup_by_id() {
        let map = ButtonMap::default();
        assert_eq!(map.stick(LEFT_STICK_ID).map(|s| s.left), Some(KeyCode::KeyA));
        assert_eq!(map.stick(RIGHT_STICK_ID).map(|s| s.up), Some(KeyCode::Numpad8));
        assert_eq!(map.stick(7), None);
    }

    #[test]
    fn test_gamepad_code_range() {
        assert!(is_gamepad_code(10));
        assert!(!is_gamepad_code(9));
    }
}
