//! Checksum and framing checks applied by the poll loop to a captured
//! frame before anything is dispatched.
//!
//! Two laws must hold for a frame of length `n` addressed to `rsSA`:
//!
//! * `rsSA + byte0 + byte1 ≡ 0 (mod 256)` (header checksum);
//! * `byte2 + … + byte(n-1) ≡ 0 (mod 256)` (payload checksum, check2 included).
//!
//! One controller family mangles broadcast sends: its transmit pointer slips,
//! so byte 0 carries the checksum of `(0, rsSA)` instead of netFn/LUN and the
//! source address is written twice. Minimum-length frames matching exactly
//! that pattern are repaired in place and accepted as Application requests.
use crate::core::{BROADCAST_REPAIR_NETFN_LUN, MIN_MESSAGE_LENGTH, RX_BUFFER_SIZE};
use crate::error::FrameError;
use crate::protocol::frame::wrapping_sum;

/// Outcome of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validation {
    /// Both checksum laws hold.
    Valid,
    /// The broadcast corruption pattern matched and byte 0 was rewritten.
    Repaired,
}

/// Validate `frame` (exactly the captured bytes) for `own_address`.
///
/// May rewrite byte 0 when the broadcast repair applies.
pub fn validate_frame(frame: &mut [u8], own_address: u8) -> Result<Validation, FrameError> {
    let len = frame.len();
    if len < MIN_MESSAGE_LENGTH {
        return Err(FrameError::TooShort { len });
    }
    if len > RX_BUFFER_SIZE {
        return Err(FrameError::TooLong { len });
    }

    if wrapping_sum(&[own_address, frame[0], frame[1]]) != 0 {
        return repair_broadcast(frame, own_address);
    }

    if wrapping_sum(&frame[2..]) != 0 {
        return Err(FrameError::PayloadChecksum);
    }
    Ok(Validation::Valid)
}

/// Boolean form of [`validate_frame`].
pub fn validate(frame: &mut [u8], own_address: u8) -> bool {
    validate_frame(frame, own_address).is_ok()
}

/// Narrow repair path: every condition must hold at once.
fn repair_broadcast(frame: &mut [u8], own_address: u8) -> Result<Validation, FrameError> {
    if frame.len() != MIN_MESSAGE_LENGTH {
        return Err(FrameError::HeaderChecksum);
    }
    // Byte 0 holds -(rsSA) instead of netFn/LUN.
    if own_address.wrapping_add(frame[0]) != 0 {
        return Err(FrameError::HeaderChecksum);
    }
    // Source address echoed into the check1 slot.
    if frame[1] != frame[2] {
        return Err(FrameError::HeaderChecksum);
    }
    if wrapping_sum(&frame[1..]) != 0 {
        return Err(FrameError::HeaderChecksum);
    }

    frame[0] = BROADCAST_REPAIR_NETFN_LUN;
    Ok(Validation::Repaired)
}
