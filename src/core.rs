//! Constants and small value types shared by the framing, dispatch and
//! state-machine modules.
//!
//! Frame layout on the wire (one byte per row):
//!
//! ```text
//! 0      netFn (6 bits) | LUN (2 bits)
//! 1      check1 = -(rsSA + byte0)
//! 2      source address
//! 3      sequence (6 bits) | LUN (2 bits)
//! 4      command
//! 5..n-2 payload (responses start with a completion code)
//! n-1    check2 = -(sum of bytes 2..n-2)
//! ```

/// Capacity of the receive buffer armed for every inbound frame.
pub const RX_BUFFER_SIZE: usize = 128;
/// Size of the transmit buffer.
pub const TX_BUFFER_SIZE: usize = 32;
/// Largest frame the controller will ever emit.
pub const TX_BUFFER_MAX: usize = 31;
/// Shortest valid frame: header, command and trailing checksum.
pub const MIN_MESSAGE_LENGTH: usize = 6;
/// Bytes preceding the payload: netFn/LUN, check1, source, seq/LUN, command.
pub const HEADER_LENGTH: usize = 5;

/// Transmission attempts before a response is abandoned.
pub const TX_RETRY_MAX: u8 = 3;
/// Ticks to wait between two transmission attempts.
pub const TX_RETRY_DELAY_TICKS: u16 = 2;
/// Rate of the board tick counter.
pub const TICKS_PER_SECOND: u64 = 30;

/// Upper bound on state-machine steps evaluated by a single `poll()`.
pub const MAX_POLL_STEPS: usize = 8;

/// Header byte substituted when a broadcast frame with a corrupted netFn/LUN
/// byte is repaired (Application request, LUN 0).
pub const BROADCAST_REPAIR_NETFN_LUN: u8 = 0x18;

//==================================================================================NETWORK_FUNCTIONS
/// Network-function classes routed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetFn {
    /// Sensor/Event requests (0x04).
    SensorEvent,
    /// Application requests (0x06).
    App,
    /// OEM/Group requests (0x30).
    Oem,
    /// Any other even code.
    Other(u8),
}

impl NetFn {
    pub const SENSOR_EVENT: u8 = 0x04;
    pub const APP: u8 = 0x06;
    pub const OEM: u8 = 0x30;

    /// Classify a 6-bit network-function code.
    pub fn from_code(code: u8) -> Self {
        match code & 0x3F {
            Self::SENSOR_EVENT => NetFn::SensorEvent,
            Self::APP => NetFn::App,
            Self::OEM => NetFn::Oem,
            other => NetFn::Other(other),
        }
    }
}

/// Application command codes.
pub mod app_cmd {
    pub const GET_DEVICE_ID: u8 = 0x01;
    pub const GET_SELF_TEST_RESULTS: u8 = 0x04;
}

/// Sensor/Event command codes.
pub mod sensor_cmd {
    pub const GET_DEVICE_SDR_INFO: u8 = 0x20;
    pub const GET_DEVICE_SDR: u8 = 0x21;
    pub const RESERVE_DEVICE_SDR_REPOSITORY: u8 = 0x22;
    pub const GET_SENSOR_READING: u8 = 0x2D;
}

//==================================================================================COMPLETION_CODES
/// Completion codes carried in the first payload byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CompletionCode {
    Ok = 0x00,
    Invalid = 0xC1,
    RequestDataTruncated = 0xC6,
    RequestDataLengthInvalid = 0xC7,
    ParameterOutOfRange = 0xC9,
    CannotReturnNumberOfBytes = 0xCA,
    NotPresent = 0xCB,
    InvalidDataField = 0xCC,
}

impl CompletionCode {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<CompletionCode> for u8 {
    fn from(code: CompletionCode) -> Self {
        code as u8
    }
}

//==================================================================================TICK
/// Value of the free-running 16-bit board tick counter.
///
/// Comparisons use the signed difference, so they stay correct across the
/// counter wrapping as long as the compared instants are less than half the
/// counter range apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(pub u16);

impl Tick {
    /// Tick `ticks` after `self`, wrapping at the counter width.
    #[inline]
    pub fn wrapping_add(self, ticks: u16) -> Tick {
        Tick(self.0.wrapping_add(ticks))
    }

    /// `true` once `self` lies strictly after `deadline`.
    #[inline]
    pub fn is_after(self, deadline: Tick) -> bool {
        (self.0.wrapping_sub(deadline.0) as i16) > 0
    }
}
