//! Event handler transitions: reception lifecycle, general call and TX
//! outcomes.
use super::*;
use crate::core::Tick;

#[derive(Default)]
struct StubTransport {
    receives: usize,
    sends: usize,
    aborts: usize,
    nacks: usize,
    disabled: bool,
    /// Bytes reported by the next `abort()`.
    moved: usize,
}

impl BusTransport for StubTransport {
    fn start_transfer(&mut self, transfer: Transfer<'_>) {
        match transfer {
            Transfer::Receive { capacity } => {
                assert_eq!(capacity, RX_BUFFER_SIZE);
                self.receives += 1;
            }
            Transfer::Send { .. } => self.sends += 1,
        }
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn abort(&mut self) -> usize {
        self.aborts += 1;
        core::mem::take(&mut self.moved)
    }

    fn read_captured(&self, _buffer: &mut [u8]) -> usize {
        0
    }

    fn enable_receiver(&mut self, _own_address: u8) {
        self.disabled = false;
    }

    fn disable_receiver(&mut self) {
        self.disabled = true;
    }

    fn nack(&mut self) {
        self.nacks += 1;
    }
}

fn state() -> LinkState<StubTransport> {
    LinkState::new(StubTransport::default(), 0x20)
}

//==================================================================================RX
#[test]
/// Start arms a receive; stop with data parks the frame and wakes the loop.
fn test_start_then_stop_pauses_frame() {
    let mut link = state();
    assert!(!link.handle(BusEvent::Start));
    assert_eq!(link.rx, RxState::Receiving);
    assert_eq!(link.transport.receives, 1);

    link.transport.moved = 7;
    assert!(link.handle(BusEvent::Stop));
    assert_eq!(link.rx, RxState::Paused { captured: 7 });
    assert!(link.transport.disabled);
}

#[test]
/// Start/stop with nothing moved returns to Idle without waking anyone.
fn test_spurious_start_stop_returns_idle() {
    let mut link = state();
    link.handle(BusEvent::Start);
    assert!(!link.handle(BusEvent::Stop));
    assert_eq!(link.rx, RxState::Idle);
    assert!(!link.transport.disabled);
}

#[test]
/// Repeated start mid-frame ends the captured frame and disarms the receiver.
fn test_repeated_start_with_data_pauses() {
    let mut link = state();
    link.handle(BusEvent::Start);
    link.transport.moved = 3;
    assert!(link.handle(BusEvent::Start));
    assert_eq!(link.rx, RxState::Paused { captured: 3 });
    assert!(link.transport.disabled);
    assert_eq!(link.transport.receives, 1);

    // Further starts are ignored until the loop reacts.
    assert!(!link.handle(BusEvent::Start));
    assert_eq!(link.rx, RxState::Paused { captured: 3 });
}

#[test]
/// Repeated start with nothing captured restarts reception.
fn test_repeated_start_without_data_restarts() {
    let mut link = state();
    link.handle(BusEvent::Start);
    assert!(!link.handle(BusEvent::Start));
    assert_eq!(link.rx, RxState::Receiving);
    assert_eq!(link.transport.receives, 2);
}

#[test]
/// Bytes outside of a transfer are refused while a frame is parked.
fn test_bytes_nacked_while_paused() {
    let mut link = state();
    link.handle(BusEvent::Start);
    link.transport.moved = 6;
    link.handle(BusEvent::Stop);
    link.handle(BusEvent::Byte(0x20));
    assert_eq!(link.transport.nacks, 1);
}

//==================================================================================GENERAL_CALL
#[test]
/// General call followed by our address starts reception.
fn test_general_call_with_own_address() {
    let mut link = state();
    assert!(!link.handle(BusEvent::GeneralCall));
    assert_eq!(link.rx, RxState::Idle);
    assert!(link.broadcast_pending);

    link.handle(BusEvent::Byte(0x20));
    assert_eq!(link.rx, RxState::Receiving);
    assert!(!link.broadcast_pending);
    assert_eq!(link.transport.nacks, 0);
}

#[test]
/// General call for someone else is NACKed and stays Idle.
fn test_general_call_other_address() {
    let mut link = state();
    link.handle(BusEvent::GeneralCall);
    link.handle(BusEvent::Byte(0x72));
    assert_eq!(link.rx, RxState::Idle);
    assert_eq!(link.transport.nacks, 1);
    assert_eq!(link.transport.receives, 0);
    assert!(!link.broadcast_pending);

    link.handle(BusEvent::Stop);
    assert!(!link.broadcast_pending);
    // Without a pending general call our address byte is refused too.
    link.handle(BusEvent::Byte(0x20));
    assert_eq!(link.transport.nacks, 2);
}

#[test]
/// Our address later inside a foreign general call does not start reception.
fn test_general_call_mismatch_clears_pending() {
    let mut link = state();
    link.handle(BusEvent::GeneralCall);
    link.handle(BusEvent::Byte(0x30));
    link.handle(BusEvent::Byte(0x20));
    assert_eq!(link.rx, RxState::Idle);
    assert_eq!(link.transport.receives, 0);
    assert_eq!(link.transport.nacks, 2);
}

//==================================================================================TX
#[test]
/// Outcomes only count while transmitting.
fn test_tx_outcomes() {
    let mut link = state();
    assert!(!link.handle(BusEvent::Nack));
    assert_eq!(link.tx, TxState::Idle);

    link.tx = TxState::Transmitting;
    assert!(link.handle(BusEvent::Nack));
    assert_eq!(link.tx, TxState::Nacked);
    assert_eq!(link.transport.aborts, 1);

    link.tx = TxState::Transmitting;
    assert!(link.handle(BusEvent::ArbitrationLost));
    assert_eq!(link.tx, TxState::ArbitrationLost);

    link.tx = TxState::Transmitting;
    assert!(link.handle(BusEvent::TransferComplete));
    assert_eq!(link.tx, TxState::Complete);
    assert_eq!(link.transport.aborts, 2);

    link.tx = TxState::RetryWait { deadline: Tick(5) };
    assert!(!link.handle(BusEvent::TransferComplete));
    assert_eq!(link.tx, TxState::RetryWait { deadline: Tick(5) });
}

#[test]
/// The shared wrapper exposes the same transitions through its callbacks.
fn test_ipmb_link_callbacks() {
    let link = IpmbLink::new(StubTransport::default(), 0x20);
    link.on_start();
    assert_eq!(link.rx_state(), RxState::Receiving);
    link.with(|state| state.transport.moved = 9);
    link.on_stop();
    assert_eq!(link.rx_state(), RxState::Paused { captured: 9 });
    assert_eq!(link.tx_state(), TxState::Idle);
    assert_eq!(link.own_address(), 0x20);
}
