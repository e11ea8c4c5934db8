/// Test doubles standing in for the bus peripheral, the tick counter, the
/// sensor pipeline and the console during integration tests.
use ipmb_controller::{
    core::Tick,
    protocol::{
        frame::{checksum, header_checksum},
        link::IpmbLink,
        traits::{
            bus_transport::{BusTransport, Transfer},
            clock::Clock,
            delay::Delay,
            log_sink::LogSink,
            sensor_repository::SensorRepository,
        },
    },
};
use std::fmt;
use std::sync::{
    atomic::{AtomicU16, Ordering},
    Arc, Mutex,
};

#[derive(Debug, Default)]
#[allow(dead_code)]
/// Everything the mock peripheral saw, shared between the test and the link.
pub struct BusRecord {
    /// Frames handed over for transmission, with their destination.
    pub sent: Vec<(u8, Vec<u8>)>,
    /// Bytes the "wire" delivered for the current receive.
    pub captured: Vec<u8>,
    pub receiving: bool,
    pub busy: bool,
    pub receiver_enabled: bool,
    pub receives: usize,
    pub reads: usize,
    pub nacks: usize,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// In-memory bus peripheral implementing `BusTransport`.
pub struct MockTransport {
    record: Arc<Mutex<BusRecord>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put bytes on the wire for the receive currently armed.
    pub fn feed(&self, bytes: &[u8]) {
        let mut record = self.record.lock().unwrap();
        record.captured.extend_from_slice(bytes);
    }

    pub fn sent(&self) -> Vec<(u8, Vec<u8>)> {
        self.record.lock().unwrap().sent.clone()
    }

    pub fn last_sent(&self) -> Option<(u8, Vec<u8>)> {
        self.record.lock().unwrap().sent.last().cloned()
    }

    pub fn set_busy(&self, busy: bool) {
        self.record.lock().unwrap().busy = busy;
    }

    pub fn receiver_enabled(&self) -> bool {
        self.record.lock().unwrap().receiver_enabled
    }

    pub fn reads(&self) -> usize {
        self.record.lock().unwrap().reads
    }

    pub fn nacks(&self) -> usize {
        self.record.lock().unwrap().nacks
    }
}

impl BusTransport for MockTransport {
    fn start_transfer(&mut self, transfer: Transfer<'_>) {
        let mut record = self.record.lock().unwrap();
        match transfer {
            Transfer::Send { peer, frame } => {
                record.sent.push((peer, frame.to_vec()));
                record.busy = false;
            }
            Transfer::Receive { .. } => {
                record.captured.clear();
                record.receiving = true;
                record.receives += 1;
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.record.lock().unwrap().busy
    }

    fn abort(&mut self) -> usize {
        let mut record = self.record.lock().unwrap();
        if !record.receiving {
            return 0;
        }
        record.receiving = false;
        record.captured.len()
    }

    fn read_captured(&self, buffer: &mut [u8]) -> usize {
        let mut record = self.record.lock().unwrap();
        record.reads += 1;
        let len = record.captured.len().min(buffer.len());
        buffer[..len].copy_from_slice(&record.captured[..len]);
        len
    }

    fn enable_receiver(&mut self, _own_address: u8) {
        self.record.lock().unwrap().receiver_enabled = true;
    }

    fn disable_receiver(&mut self) {
        self.record.lock().unwrap().receiver_enabled = false;
    }

    fn nack(&mut self) {
        self.record.lock().unwrap().nacks += 1;
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Tick counter moved by hand.
pub struct ManualClock {
    ticks: Arc<AtomicU16>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn starting_at(tick: u16) -> Self {
        Self {
            ticks: Arc::new(AtomicU16::new(tick)),
        }
    }

    pub fn advance(&self, ticks: u16) {
        let now = self.ticks.load(Ordering::SeqCst);
        self.ticks.store(now.wrapping_add(ticks), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        Tick(self.ticks.load(Ordering::SeqCst))
    }
}

#[allow(dead_code)]
/// Delay based on `tokio::time::sleep` to drive the poll loop in tests.
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn delay_ms(&mut self, millis: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(millis as u64)).await;
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Calibrated values for temperature (0) and supply voltage (1).
pub struct FixedSensors {
    values: Arc<Mutex<[i16; 2]>>,
}

#[allow(dead_code)]
impl FixedSensors {
    pub fn new(temperature: i16, voltage: i16) -> Self {
        Self {
            values: Arc::new(Mutex::new([temperature, voltage])),
        }
    }

    pub fn set(&self, index: usize, value: i16) {
        self.values.lock().unwrap()[index] = value;
    }
}

impl SensorRepository for FixedSensors {
    fn latest(&self, index: u8) -> i16 {
        self.values
            .lock()
            .unwrap()
            .get(index as usize)
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Console stand-in keeping every line.
pub struct RecordingLog {
    lines: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for RecordingLog {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push(args.to_string());
    }
}

#[allow(dead_code)]
/// Well-formed request from `requester` to `responder`.
pub fn request(
    responder: u8,
    requester: u8,
    netfn_lun: u8,
    seq_lun: u8,
    command: u8,
    data: &[u8],
) -> Vec<u8> {
    let mut frame = vec![
        netfn_lun,
        header_checksum(responder, netfn_lun),
        requester,
        seq_lun,
        command,
    ];
    frame.extend_from_slice(data);
    frame.push(checksum(&frame[2..]));
    frame
}

#[allow(dead_code)]
/// Address match, bytes, stop: one inbound frame through the link.
pub fn deliver(link: &IpmbLink<MockTransport>, transport: &MockTransport, frame: &[u8]) {
    link.on_start();
    transport.feed(frame);
    link.on_stop();
}
