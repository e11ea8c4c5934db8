//! IPMB frame header view and the checksum arithmetic shared by the
//! validator and the response builder.
use crate::core::HEADER_LENGTH;

//==================================================================================CHECKSUM
/// Two's-complement checksum: the byte that makes `bytes` sum to zero.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(wrapping_sum(bytes))
}

/// Sum of `bytes` modulo 256.
#[inline]
pub fn wrapping_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// check1 for a frame sent to `responder_address` with the given netFn/LUN
/// byte.
#[inline]
pub fn header_checksum(responder_address: u8, netfn_lun: u8) -> u8 {
    checksum(&[responder_address, netfn_lun])
}

//==================================================================================BIT_FIELDS
/// 6-bit network function of a netFn/LUN byte.
#[inline]
pub fn netfn(netfn_lun: u8) -> u8 {
    netfn_lun >> 2
}

/// 2-bit LUN of a netFn/LUN or seq/LUN byte.
#[inline]
pub fn lun(byte: u8) -> u8 {
    byte & 0x03
}

/// Sequence bits of a seq/LUN byte, left in place.
#[inline]
pub fn seq(seq_lun: u8) -> u8 {
    seq_lun & 0xFC
}

//==================================================================================REQUEST_HEADER
/// Decoded connection header of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestHeader {
    pub netfn_lun: u8,
    pub check1: u8,
    pub source_address: u8,
    pub seq_lun: u8,
    pub command: u8,
}

impl RequestHeader {
    /// Read the first five bytes of `frame`.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        if frame.len() < HEADER_LENGTH {
            return None;
        }
        Some(Self {
            netfn_lun: frame[0],
            check1: frame[1],
            source_address: frame[2],
            seq_lun: frame[3],
            command: frame[4],
        })
    }

    #[inline]
    pub fn netfn(&self) -> u8 {
        netfn(self.netfn_lun)
    }

    /// Responder (destination) LUN.
    #[inline]
    pub fn lun(&self) -> u8 {
        lun(self.netfn_lun)
    }

    /// Requester (source) LUN.
    #[inline]
    pub fn source_lun(&self) -> u8 {
        lun(self.seq_lun)
    }

    /// Odd network functions are responses.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.netfn() & 0x01 == 0x01
    }
}
