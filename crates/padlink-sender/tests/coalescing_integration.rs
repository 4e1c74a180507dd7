//! Integration tests for the sender coalescing pump.
//!
//! The pump is driven through its public API against a `mockall` transport
//! (to pin exact call counts and ordering) and against the in-memory
//! loopback transport (to check what a receiver would actually see).

use std::sync::Arc;

use mockall::{mock, Sequence};
use padlink_core::{
    decode, ConnectionState, DeliveryClass, Event, LoopbackTransport, TransportChannel,
    TransportError, TransportEvent,
};
use padlink_sender::application::CoalescingPump;

mock! {
    pub Channel {}

    impl TransportChannel for Channel {
        fn send_reliable(&self, bytes: Vec<u8>) -> Result<(), TransportError>;
        fn send_unreliable(&self, bytes: Vec<u8>) -> Result<(), TransportError>;
        fn state(&self) -> ConnectionState;
    }
}

fn decodes_to(expected: Vec<Event>) -> impl Fn(&Vec<u8>) -> bool + Send + 'static {
    move |bytes: &Vec<u8>| decode(bytes) == expected
}

// ── Mock transport ────────────────────────────────────────────────────────────

#[test]
fn test_many_moves_produce_exactly_one_unreliable_send() {
    // Arrange
    let mut channel = MockChannel::new();
    channel
        .expect_send_unreliable()
        .withf(decodes_to(vec![Event::PointerMove { dx: 100, dy: -50 }]))
        .times(1)
        .returning(|_| Ok(()));
    channel.expect_send_reliable().times(0);
    let pump = CoalescingPump::new(Arc::new(channel));

    // Act
    for _ in 0..50 {
        pump.enqueue(Event::PointerMove { dx: 2, dy: -1 });
    }
    pump.tick();
    pump.tick();

    // Assert: expectations are verified when the mock drops
}

#[test]
fn test_button_edge_sends_motion_then_button_in_sequence() {
    // Arrange
    let mut seq = Sequence::new();
    let mut channel = MockChannel::new();
    channel
        .expect_send_unreliable()
        .withf(decodes_to(vec![
            Event::PointerMove { dx: 5, dy: 5 },
            Event::Axis { id: 0, x: 300, y: 0 },
        ]))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    channel
        .expect_send_reliable()
        .withf(decodes_to(vec![Event::button(11, true)]))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let pump = CoalescingPump::new(Arc::new(channel));

    // Act
    pump.enqueue(Event::PointerMove { dx: 5, dy: 5 });
    pump.enqueue(Event::Axis { id: 0, x: 300, y: 0 });
    pump.enqueue(Event::button(11, true));
}

#[test]
fn test_not_connected_is_logged_and_not_retried() {
    // Arrange
    let mut channel = MockChannel::new();
    channel
        .expect_send_reliable()
        .times(2)
        .returning(|_| Err(TransportError::NotConnected));
    let pump = CoalescingPump::new(Arc::new(channel));

    // Act: two edges, two attempts, nothing carried over
    pump.enqueue(Event::button(10, true));
    pump.enqueue(Event::button(10, false));
    pump.tick();
}

// ── Loopback transport ────────────────────────────────────────────────────────

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<TransportEvent>) -> Vec<(DeliveryClass, Event)> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let TransportEvent::BytesReceived { class, bytes } = event {
            out.extend(decode(&bytes).into_iter().map(|e| (class, e)));
        }
    }
    out
}

#[test]
fn test_loopback_receives_classified_events() {
    // Arrange
    let (transport, mut rx) = LoopbackTransport::pair();
    let pump = CoalescingPump::new(transport);

    // Act
    pump.enqueue(Event::Scroll { dx: 0, dy: 1 });
    pump.enqueue(Event::Scroll { dx: 0, dy: 1 });
    pump.enqueue(Event::Axis { id: 1, x: 0, y: 999 });
    pump.tick();
    pump.enqueue(Event::button(16, true));

    // Assert
    assert_eq!(
        drain(&mut rx),
        vec![
            (DeliveryClass::Unreliable, Event::Scroll { dx: 0, dy: 2 }),
            (DeliveryClass::Unreliable, Event::Axis { id: 1, x: 0, y: 999 }),
            (DeliveryClass::Reliable, Event::button(16, true)),
        ]
    );
}

#[test]
fn test_loopback_disconnect_drops_batches_and_resumes_after_reconnect() {
    // Arrange
    let (transport, mut rx) = LoopbackTransport::pair();
    let pump = CoalescingPump::new(transport.clone());

    // Act
    transport.disconnect();
    pump.enqueue(Event::PointerMove { dx: 9, dy: 9 });
    pump.tick();
    transport.connect();
    pump.enqueue(Event::PointerMove { dx: 1, dy: 0 });
    pump.tick();

    // Assert: the batch sent while disconnected is gone for good
    assert_eq!(
        drain(&mut rx),
        vec![(DeliveryClass::Unreliable, Event::PointerMove { dx: 1, dy: 0 })]
    );
}

#[tokio::test(start_paused = true)]
async fn test_running_pump_flushes_through_loopback() {
    // Arrange
    let (transport, mut rx) = LoopbackTransport::pair();
    let pump = Arc::new(CoalescingPump::new(transport));
    pump.start().expect("runtime is available");

    // Act
    pump.enqueue(Event::Axis { id: 0, x: -1000, y: 0 });
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    pump.stop();

    // Assert
    assert_eq!(
        drain(&mut rx),
        vec![(DeliveryClass::Unreliable, Event::Axis { id: 0, x: -1000, y: 0 })]
    );
}
