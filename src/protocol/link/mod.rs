//! Event-handler side of the engine.
//!
//! The link owns the transport together with the RX/TX states the hardware
//! event handler is allowed to move. Every callback runs inside one short
//! critical section and only updates state and starts or stops the mover;
//! validation and dispatch always happen later, in [`Engine::poll`].
//!
//! Transitions taken here:
//!
//! * RX `Idle -> Receiving` on a start addressed to us (or a general call
//!   followed by our address byte);
//! * RX `Receiving -> Paused | Idle` on stop or repeated start, depending on
//!   whether any byte was captured;
//! * TX `Transmitting -> Complete | Nacked | ArbitrationLost` on the transfer
//!   outcome.
//!
//! Whenever a transition leaves work for the poll loop, the wake signal is
//! raised.
//!
//! [`Engine::poll`]: crate::protocol::engine::Engine::poll
use core::cell::RefCell;

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    signal::Signal,
};

use crate::core::{Tick, RX_BUFFER_SIZE};
use crate::protocol::traits::bus_transport::{BusTransport, Transfer};

//==================================================================================STATES
/// Hardware outcome reported by the bus event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Start (or repeated start) with our own address matched.
    Start,
    /// Start addressed to the general-call address.
    GeneralCall,
    /// Byte received outside of a buffered transfer.
    Byte(u8),
    Stop,
    /// Peer did not acknowledge our transmission.
    Nack,
    ArbitrationLost,
    /// Byte counter of the send reached zero.
    TransferComplete,
}

/// Receive side lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Listening for a start condition.
    #[default]
    Idle,
    /// Mover is capturing bytes.
    Receiving,
    /// `captured` bytes wait for the poll loop; the receiver is disabled.
    Paused { captured: usize },
    /// Poll loop owns the receive buffer.
    Processing { len: usize },
    /// A reply is queued and the TX machine owns the bus.
    Handoff,
}

/// Transmit side lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    #[default]
    Idle,
    /// Reply queued, not yet handed to the mover.
    Started,
    Transmitting,
    ArbitrationLost,
    Nacked,
    /// Waiting for the back-off deadline before the next attempt.
    RetryWait { deadline: Tick },
    /// Sent or abandoned; the receiver is re-armed once the bus is free.
    Complete,
}

//==================================================================================LINK_STATE
/// Everything the event handler may touch.
pub(crate) struct LinkState<T> {
    pub(crate) rx: RxState,
    pub(crate) tx: TxState,
    pub(crate) transport: T,
    pub(crate) own_address: u8,
    /// General call seen, waiting for the address byte.
    pub(crate) broadcast_pending: bool,
}

impl<T: BusTransport> LinkState<T> {
    const fn new(transport: T, own_address: u8) -> Self {
        Self {
            rx: RxState::Idle,
            tx: TxState::Idle,
            transport,
            own_address,
            broadcast_pending: false,
        }
    }

    /// Apply `event`. Returns `true` when the poll loop has work to do.
    pub(crate) fn handle(&mut self, event: BusEvent) -> bool {
        #[cfg(feature = "defmt")]
        defmt::trace!("IPMB event {} rx={} tx={}", event, self.rx, self.tx);

        match event {
            BusEvent::Start => {
                if let Some(wake) = self.repeated_start() {
                    return wake;
                }
                self.broadcast_pending = false;
                self.begin_receive();
                false
            }
            BusEvent::GeneralCall => {
                if let Some(wake) = self.repeated_start() {
                    return wake;
                }
                // Reception starts once the address byte matches.
                self.broadcast_pending = true;
                false
            }
            BusEvent::Byte(byte) => {
                match self.rx {
                    RxState::Receiving => {}
                    RxState::Idle if self.broadcast_pending && byte == self.own_address => {
                        self.broadcast_pending = false;
                        self.begin_receive();
                    }
                    RxState::Idle if self.broadcast_pending => {
                        // General call for another device.
                        self.broadcast_pending = false;
                        self.transport.nack();
                    }
                    _ => self.transport.nack(),
                }
                false
            }
            BusEvent::Stop => match self.rx {
                RxState::Receiving => self.end_receive(),
                RxState::Idle => {
                    self.broadcast_pending = false;
                    false
                }
                _ => false,
            },
            BusEvent::Nack => self.finish_send(TxState::Nacked),
            BusEvent::ArbitrationLost => self.finish_send(TxState::ArbitrationLost),
            BusEvent::TransferComplete => self.finish_send(TxState::Complete),
        }
    }

    /// A start while a frame is in flight ends that frame. `None` means the
    /// start should be treated as a fresh one.
    fn repeated_start(&mut self) -> Option<bool> {
        match self.rx {
            RxState::Idle => None,
            RxState::Receiving => {
                if self.end_receive() {
                    Some(true)
                } else {
                    // Start + address, then restart + address: nothing captured.
                    None
                }
            }
            _ => Some(false),
        }
    }

    fn begin_receive(&mut self) {
        self.transport.start_transfer(Transfer::Receive {
            capacity: RX_BUFFER_SIZE,
        });
        self.rx = RxState::Receiving;
    }

    /// Stop the mover and park the frame for the poll loop. Returns `true`
    /// if bytes were captured.
    fn end_receive(&mut self) -> bool {
        let captured = self.transport.abort();
        self.broadcast_pending = false;
        if captured == 0 {
            self.rx = RxState::Idle;
            return false;
        }
        self.rx = RxState::Paused { captured };
        self.transport.disable_receiver();
        true
    }

    fn finish_send(&mut self, outcome: TxState) -> bool {
        if self.tx != TxState::Transmitting {
            return false;
        }
        if outcome != TxState::Complete {
            self.transport.abort();
        }
        self.tx = outcome;
        true
    }
}

//==================================================================================IPMB_LINK
/// State shared between the bus event handler and the poll loop.
pub struct IpmbLink<T> {
    state: Mutex<CriticalSectionRawMutex, RefCell<LinkState<T>>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl<T: BusTransport> IpmbLink<T> {
    /// Link in `Idle`/`Idle`. The receiver is armed by the engine.
    pub const fn new(transport: T, own_address: u8) -> Self {
        Self {
            state: Mutex::new(RefCell::new(LinkState::new(transport, own_address))),
            wake: Signal::new(),
        }
    }

    /// Feed one hardware outcome. Call from the bus event handler.
    pub fn on_bus_event(&self, event: BusEvent) {
        let wake = self.with(|state| state.handle(event));
        if wake {
            self.wake.signal(());
        }
    }

    pub fn on_start(&self) {
        self.on_bus_event(BusEvent::Start)
    }

    pub fn on_general_call(&self) {
        self.on_bus_event(BusEvent::GeneralCall)
    }

    pub fn on_stop(&self) {
        self.on_bus_event(BusEvent::Stop)
    }

    pub fn on_byte(&self, byte: u8) {
        self.on_bus_event(BusEvent::Byte(byte))
    }

    pub fn on_nack(&self) {
        self.on_bus_event(BusEvent::Nack)
    }

    pub fn on_arbitration_lost(&self) {
        self.on_bus_event(BusEvent::ArbitrationLost)
    }

    pub fn on_transfer_complete(&self) {
        self.on_bus_event(BusEvent::TransferComplete)
    }

    pub fn rx_state(&self) -> RxState {
        self.with(|state| state.rx)
    }

    pub fn tx_state(&self) -> TxState {
        self.with(|state| state.tx)
    }

    pub fn own_address(&self) -> u8 {
        self.with(|state| state.own_address)
    }

    /// Run `f` on the shared state inside a critical section.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut LinkState<T>) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Resolve once an event left work for the poll loop.
    pub async fn wait_wake(&self) {
        self.wake.wait().await
    }

    /// Drop a pending wake-up.
    pub fn reset_wake(&self) {
        self.wake.reset();
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
