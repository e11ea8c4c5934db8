//! Error definitions shared across library modules.
//! None of them is fatal: framing errors drop the frame, response errors are
//! answered with a completion code, configuration errors reject the write.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Reasons a captured frame is rejected by the validator.
pub enum FrameError {
    /// Fewer bytes than the minimum frame (header, command, check2).
    #[error("Frame too short: {len} bytes")]
    TooShort { len: usize },
    /// More bytes than the receive buffer can hold.
    #[error("Frame too long: {len} bytes")]
    TooLong { len: usize },
    /// `rsSA + netFn/LUN + check1` is not zero and the broadcast repair
    /// conditions do not hold either.
    #[error("Header checksum mismatch")]
    HeaderChecksum,
    /// Bytes 2..=n-1 do not sum to zero.
    #[error("Payload checksum mismatch")]
    PayloadChecksum,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures while assembling a response frame.
pub enum ResponseError {
    /// A handler tried to write past the transmit budget.
    #[error("Response overflow -> asked: {asked}, available: {available}")]
    Overflow { asked: usize, available: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Rejected writes to the persisted board configuration.
pub enum ConfigError {
    /// IPMB addresses are 8-bit slave addresses: even and non-zero.
    #[error("Invalid IPMB address {address}")]
    InvalidAddress { address: u8 },
}
