//! The input event vocabulary shared by sender and receiver.
//!
//! Every gesture the mobile client recognises becomes exactly one [`Event`].
//! Events have no identity and no sequence number: they are fire-and-forget
//! values that live only between a gesture callback and the next flush.
//!
//! # Serde representation
//!
//! Events serialize as internally tagged JSON objects.  Only the fields of
//! the active variant are present, so a decoder never mistakes an absent
//! field for a zero:
//!
//! ```json
//! {"type":"pointer_move","dx":4,"dy":-2}
//! {"type":"button","code":10,"down":true}
//! {"type":"button","code":11,"down":false,"key_hint":44}
//! {"type":"axis","id":0,"x":-812,"y":35}
//! {"type":"steer_state","steer":-420,"deadzone":8,"hold_threshold":70,"tap_rate":40}
//! ```

use serde::{Deserialize, Serialize};

/// How an event must travel from sender to receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryClass {
    /// Ordered, eventually delivered.  Used for edges that must not be lost.
    Reliable,
    /// Best effort, may drop or reorder.  Used for self-contained deltas and
    /// latest-value state.
    Unreliable,
}

/// One input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Relative pointer delta in client-scaled pixels.
    PointerMove { dx: i32, dy: i32 },

    /// Relative scroll delta.
    Scroll { dx: i32, dy: i32 },

    /// Press or release edge of a mouse button (codes 0/1) or a gamepad
    /// logical button (codes ≥ 10).
    Button {
        code: i32,
        down: bool,
        /// Client-chosen key-code override (HID usage id).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_hint: Option<i32>,
    },

    /// Analog stick position, fixed-point in `[-1000, 1000]`.
    Axis { id: i32, x: i32, y: i32 },

    /// Racing-wheel steering value plus receiver-side tuning.
    ///
    /// `steer` is in `[-1000, 1000]`; the three tuning values are
    /// percentages in `[0, 100]`.
    SteerState {
        steer: i32,
        deadzone: i32,
        hold_threshold: i32,
        tap_rate: i32,
    },
}

impl Event {
    /// Convenience constructor for a button edge without a key hint.
    pub fn button(code: i32, down: bool) -> Self {
        Event::Button {
            code,
            down,
            key_hint: None,
        }
    }

    /// The channel class this event travels on.
    pub fn delivery_class(&self) -> DeliveryClass {
        match self {
            Event::PointerMove { .. } | Event::Scroll { .. } | Event::Axis { .. } => {
                DeliveryClass::Unreliable
            }
            Event::Button { .. } | Event::SteerState { .. } => DeliveryClass::Reliable,
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::PointerMove { .. } => "pointer_move",
            Event::Scroll { .. } => "scroll",
            Event::Button { .. } => "button",
            Event::Axis { .. } => "axis",
            Event::SteerState { .. } => "steer_state",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_and_axis_events_are_unreliable() {
        assert_eq!(
            Event::PointerMove { dx: 1, dy: 1 }.delivery_class(),
            DeliveryClass::Unreliable
        );
        assert_eq!(
            Event::Scroll { dx: 0, dy: -3 }.delivery_class(),
            DeliveryClass::Unreliable
        );
        assert_eq!(
            Event::Axis { id: 0, x: 10, y: 10 }.delivery_class(),
            DeliveryClass::Unreliable
        );
    }

    #[test]
    fn test_button_and_steer_events_are_reliable() {
        assert_eq!(Event::button(10, true).delivery_class(), DeliveryClass::Reliable);
        let steer = Event::SteerState {
            steer: 0,
            deadzone: 5,
            hold_threshold: 80,
            tap_rate: 50,
        };
        assert_eq!(steer.delivery_class(), DeliveryClass::Reliable);
    }

    #[test]
    fn test_button_without_hint_omits_key_hint_field() {
        // Act
        let json = serde_json::to_string(&Event::button(1, true)).expect("serialize");

        // Assert
        assert_eq!(json, r#"{"type":"button","code":1,"down":true}"#);
    }

    #[test]
    fn test_axis_json_contains_only_axis_fields() {
        let json = serde_json::to_string(&Event::Axis { id: 1, x: -5, y: 7 }).expect("serialize");
        assert_eq!(json, r#"{"type":"axis","id":1,"x":-5,"y":7}"#);
    }
}
