//! Poll-loop side of the controller.
//!
//! [`Engine::poll`] re-evaluates the RX/TX state machines until one of them
//! has to wait on the bus or the clock, bounded by [`MAX_POLL_STEPS`]. A
//! complete cycle goes
//!
//! ```text
//! RX Paused -> Processing -> Handoff   (validate, dispatch, queue reply)
//! TX Started -> Transmitting -> Complete -> Idle, RX Idle (receiver re-armed)
//! ```
//!
//! with `Nacked`/`ArbitrationLost` detouring through `RetryWait` at most
//! [`TX_RETRY_MAX`] - 1 times before the reply is abandoned.
use futures_util::{future::select, pin_mut};

use crate::core::{MAX_POLL_STEPS, RX_BUFFER_SIZE, TX_RETRY_DELAY_TICKS, TX_RETRY_MAX};
use crate::error::ConfigError;
use crate::infra::config::validate_address;
use crate::protocol::dispatch::{dispatch, DispatchContext};
use crate::protocol::link::{BusEvent, IpmbLink, RxState, TxState};
use crate::protocol::response::ResponseFrame;
use crate::protocol::traits::{
    bus_transport::{BusTransport, Transfer},
    clock::Clock,
    delay::Delay,
    log_sink::LogSink,
    sdr_repository::SdrRepository,
    sensor_repository::SensorRepository,
};
use crate::protocol::validator::{validate_frame, Validation};

/// Result of one state-machine evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// State moved; evaluate again.
    Continue,
    /// Waiting on the bus, the event handler or the clock.
    Blocked,
}

/// Request/response engine for one IPMB controller.
pub struct Engine<'a, T, C, R, S, L> {
    link: &'a IpmbLink<T>,
    clock: C,
    repository: R,
    sensors: S,
    log: L,
    rx_buffer: [u8; RX_BUFFER_SIZE],
    response: ResponseFrame,
    retry_count: u8,
}

impl<'a, T, C, R, S, L> Engine<'a, T, C, R, S, L>
where
    T: BusTransport,
    C: Clock,
    R: SdrRepository,
    S: SensorRepository,
    L: LogSink,
{
    /// Build the engine and arm the receiver on the link's address.
    pub fn new(link: &'a IpmbLink<T>, clock: C, mut repository: R, sensors: S, log: L) -> Self {
        let own_address = link.with(|state| {
            state.rx = RxState::Idle;
            state.tx = TxState::Idle;
            state.transport.enable_receiver(state.own_address);
            state.own_address
        });
        repository.set_owner(own_address);
        Self {
            link,
            clock,
            repository,
            sensors,
            log,
            rx_buffer: [0; RX_BUFFER_SIZE],
            response: ResponseFrame::new(),
            retry_count: 0,
        }
    }

    /// Forward a hardware outcome to the link.
    pub fn on_bus_event(&self, event: BusEvent) {
        self.link.on_bus_event(event)
    }

    /// Change the controller address.
    ///
    /// Takes effect for the next frame: a frame already in flight finishes
    /// under the previous address.
    pub fn set_own_address(&mut self, address: u8) -> Result<(), ConfigError> {
        let address = validate_address(address)?;
        self.link.with(|state| {
            state.own_address = address;
            if state.rx == RxState::Idle {
                state.transport.enable_receiver(address);
            }
        });
        self.repository.set_owner(address);
        self.log
            .line(format_args!("IPMI> own address {:02X}", address));
        Ok(())
    }

    /// Advance the state machines as far as they go without waiting.
    pub fn poll(&mut self) {
        for _ in 0..MAX_POLL_STEPS {
            if self.step() == Step::Blocked {
                return;
            }
        }
        self.log.line(format_args!("IPMI> poll step budget reached"));
    }

    /// Drive [`poll`](Self::poll) forever: after each pass, sleep until the
    /// link raises its wake signal or `period_ms` elapses on `delay`.
    pub async fn run<D: Delay>(&mut self, delay: &mut D, period_ms: u32) -> ! {
        loop {
            self.poll();
            let wake = self.link.wait_wake();
            let tick = delay.delay_ms(period_ms);
            pin_mut!(wake, tick);
            select(wake, tick).await;
        }
    }

    pub fn link(&self) -> &'a IpmbLink<T> {
        self.link
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Failed attempts for the reply currently queued.
    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    //==================================================================================RX
    fn step(&mut self) -> Step {
        match self.link.rx_state() {
            RxState::Idle | RxState::Receiving => Step::Blocked,
            RxState::Paused { captured } => self.take_frame(captured),
            RxState::Processing { len } => self.process(len),
            RxState::Handoff => self.tx_step(),
        }
    }

    /// Copy the parked frame out of the mover and validate it.
    fn take_frame(&mut self, captured: usize) -> Step {
        let buffer = &mut self.rx_buffer[..captured.min(RX_BUFFER_SIZE)];
        let (len, own_address) = self
            .link
            .with(|state| (state.transport.read_captured(buffer), state.own_address));

        match validate_frame(&mut self.rx_buffer[..len], own_address) {
            Ok(validation) => {
                if validation == Validation::Repaired {
                    self.log.line(format_args!("IPMI> repaired broadcast header"));
                }
                self.link
                    .with(|state| state.rx = RxState::Processing { len });
            }
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("IPMB frame dropped: {}", _err);
                self.rearm_receiver();
            }
        }
        Step::Continue
    }

    /// Dispatch a validated frame and hand any reply to the TX machine.
    fn process(&mut self, len: usize) -> Step {
        let own_address = self.link.own_address();
        let mut ctx = DispatchContext {
            repository: &self.repository,
            sensors: &self.sensors,
            log: &mut self.log,
            own_address,
        };
        if !dispatch(&mut ctx, &self.rx_buffer[..len], &mut self.response) {
            self.rearm_receiver();
            return Step::Continue;
        }
        self.retry_count = 0;
        self.link.with(|state| {
            state.tx = TxState::Started;
            state.rx = RxState::Handoff;
        });
        Step::Continue
    }

    /// Back to listening: RX Idle and the receiver armed on our address.
    fn rearm_receiver(&mut self) {
        self.link.with(|state| {
            state.rx = RxState::Idle;
            state.transport.enable_receiver(state.own_address);
        });
    }

    //==================================================================================TX
    fn tx_step(&mut self) -> Step {
        match self.link.tx_state() {
            // Nothing left to send for this cycle.
            TxState::Idle => {
                self.response.clear();
                self.rearm_receiver();
                Step::Continue
            }
            TxState::Started => self.start_send(),
            TxState::Transmitting => Step::Blocked,
            TxState::ArbitrationLost => self.send_failed("arbitration lost"),
            TxState::Nacked => self.send_failed("nack"),
            TxState::RetryWait { deadline } => {
                if !self.clock.has_elapsed(deadline) {
                    return Step::Blocked;
                }
                self.log.line(format_args!(
                    "IPMI> tx attempt {}/{}",
                    self.retry_count + 1,
                    TX_RETRY_MAX
                ));
                self.link.with(|state| state.tx = TxState::Started);
                Step::Continue
            }
            TxState::Complete => {
                let released = self.link.with(|state| {
                    if state.transport.is_busy() {
                        return false;
                    }
                    state.tx = TxState::Idle;
                    state.rx = RxState::Idle;
                    state.transport.enable_receiver(state.own_address);
                    true
                });
                if !released {
                    return Step::Blocked;
                }
                self.response.clear();
                Step::Continue
            }
        }
    }

    fn start_send(&mut self) -> Step {
        if self.response.is_empty() {
            self.log.line(format_args!("IPMI> zero length msg"));
            self.link.with(|state| state.tx = TxState::Idle);
            return Step::Continue;
        }
        let response = &self.response;
        self.link.with(|state| {
            state.tx = TxState::Transmitting;
            state.transport.start_transfer(Transfer::Send {
                peer: response.peer(),
                frame: response.as_bytes(),
            });
        });
        Step::Blocked
    }

    fn send_failed(&mut self, reason: &str) -> Step {
        self.retry_count = self.retry_count.saturating_add(1);
        self.log.line(format_args!(
            "IPMI> tx fail {} ({}/{})",
            reason, self.retry_count, TX_RETRY_MAX
        ));
        if self.retry_count >= TX_RETRY_MAX {
            self.log.line(format_args!(
                "IPMI> tx abandoned after {} attempts",
                self.retry_count
            ));
            self.link.with(|state| state.tx = TxState::Complete);
        } else {
            let deadline = self.clock.now().wrapping_add(TX_RETRY_DELAY_TICKS);
            self.link
                .with(|state| state.tx = TxState::RetryWait { deadline });
        }
        Step::Continue
    }
}
