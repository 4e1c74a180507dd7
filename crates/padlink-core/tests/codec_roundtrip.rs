//! Integration tests for the padlink-core wire codec.
//!
//! These tests go through the public API only: every event variant is
//! encoded and decoded back, frames are concatenated the way the sender
//! pump batches them, and damaged buffers are fed to the decoder the way an
//! unreliable channel might deliver them.

use padlink_core::{
    decode, encode,
    protocol::{encode_batch, DeliveryClass},
    Event,
};

/// Encodes a single event and decodes it again, asserting exactly one
/// event comes back.
fn roundtrip(event: Event) -> Event {
    let bytes = encode(&event);
    let mut decoded = decode(&bytes);
    assert_eq!(decoded.len(), 1, "exactly one event must decode");
    decoded.remove(0)
}

fn representative_events() -> Vec<Event> {
    vec![
        Event::PointerMove { dx: 17, dy: -4 },
        Event::PointerMove {
            dx: i32::MIN,
            dy: i32::MAX,
        },
        Event::Scroll { dx: -1, dy: 120 },
        Event::Button {
            code: 0,
            down: true,
            key_hint: None,
        },
        Event::Button {
            code: 13,
            down: false,
            key_hint: Some(0x2C),
        },
        Event::Axis {
            id: 0,
            x: -1000,
            y: 1000,
        },
        Event::Axis { id: 1, x: 3, y: -250 },
        Event::SteerState {
            steer: -640,
            deadzone: 8,
            hold_threshold: 75,
            tap_rate: 40,
        },
    ]
}

#[test]
fn test_roundtrip_every_variant() {
    for event in representative_events() {
        assert_eq!(roundtrip(event), event, "round-trip of {event:?}");
    }
}

#[test]
fn test_concatenated_frames_decode_in_order() {
    // Arrange
    let e1 = Event::button(10, true);
    let e2 = Event::Axis { id: 0, x: 500, y: 0 };
    let mut bytes = encode(&e1);
    bytes.extend(encode(&e2));

    // Act
    let decoded = decode(&bytes);

    // Assert
    assert_eq!(decoded, vec![e1, e2]);
}

#[test]
fn test_batch_of_all_variants_decodes_in_order() {
    let events = representative_events();
    assert_eq!(decode(&encode_batch(&events)), events);
}

#[test]
fn test_no_frame_contains_an_inner_delimiter() {
    for event in representative_events() {
        let bytes = encode(&event);
        let newlines = bytes.iter().filter(|b| **b == b'\n').count();
        assert_eq!(newlines, 1, "{event:?} must encode as exactly one line");
    }
}

#[test]
fn test_damaged_middle_frame_does_not_poison_neighbours() {
    // Arrange – flip the middle frame into garbage
    let events = representative_events();
    let mut bytes = Vec::new();
    for (i, event) in events.iter().enumerate() {
        if i == 3 {
            bytes.extend_from_slice(b"{\"type\":\"button\",\"code\":oops}\n");
        } else {
            bytes.extend(encode(event));
        }
    }

    // Act
    let decoded = decode(&bytes);

    // Assert
    let mut expected = events.clone();
    expected.remove(3);
    assert_eq!(decoded, expected);
}

#[test]
fn test_decode_ignores_unknown_extra_fields() {
    let decoded = decode(b"{\"type\":\"pointer_move\",\"dx\":1,\"dy\":2,\"ts\":99}\n");
    assert_eq!(decoded, vec![Event::PointerMove { dx: 1, dy: 2 }]);
}

#[test]
fn test_decoded_events_keep_their_delivery_class() {
    let bytes = encode_batch(&[Event::Scroll { dx: 0, dy: 1 }, Event::button(16, true)]);
    let classes: Vec<DeliveryClass> = decode(&bytes).iter().map(Event::delivery_class).collect();
    assert_eq!(classes, vec![DeliveryClass::Unreliable, DeliveryClass::Reliable]);
}
