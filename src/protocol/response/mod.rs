//! Response construction: handlers write the completion code and payload
//! through a [`PayloadWriter`], then [`ResponseFrame::respond`] fills in the
//! connection header and both checksums from the request.
use crate::core::{CompletionCode, HEADER_LENGTH, TX_BUFFER_MAX, TX_BUFFER_SIZE};
use crate::error::ResponseError;
use crate::protocol::frame::{checksum, header_checksum, lun, seq, RequestHeader};

/// Response marker: netFn + 1, expressed on the netFn/LUN byte.
const RESPONSE_NETFN_INCREMENT: u8 = 0x04;

//==================================================================================RESPONSE_FRAME
/// The transmit buffer plus the bookkeeping needed to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    buffer: [u8; TX_BUFFER_SIZE],
    len: usize,
    peer: u8,
}

impl Default for ResponseFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFrame {
    /// Empty frame, nothing queued.
    pub const fn new() -> Self {
        Self {
            buffer: [0; TX_BUFFER_SIZE],
            len: 0,
            peer: 0,
        }
    }

    /// Start writing the payload; the cursor sits right after the command byte.
    pub fn payload(&mut self) -> PayloadWriter<'_> {
        self.len = 0;
        PayloadWriter {
            buffer: &mut self.buffer,
            cursor: HEADER_LENGTH,
        }
    }

    /// Fill the header for a reply to `request` and close the frame with
    /// check2.
    ///
    /// `payload_end` is the index one past the last payload byte (the value
    /// returned by [`PayloadWriter::end`]). Returns the total frame length.
    pub fn respond(
        &mut self,
        request: &RequestHeader,
        own_address: u8,
        payload_end: usize,
    ) -> Result<usize, ResponseError> {
        let len = payload_end.max(HEADER_LENGTH) + 1;
        if len > TX_BUFFER_MAX {
            self.len = 0;
            return Err(ResponseError::Overflow {
                asked: len,
                available: TX_BUFFER_MAX,
            });
        }

        let netfn_lun = (request.netfn_lun & 0xFC).wrapping_add(RESPONSE_NETFN_INCREMENT)
            | lun(request.seq_lun);
        let seq_lun = seq(request.seq_lun) | lun(request.netfn_lun);

        self.peer = request.source_address;
        self.buffer[0] = netfn_lun;
        self.buffer[1] = header_checksum(self.peer, netfn_lun);
        self.buffer[2] = own_address;
        self.buffer[3] = seq_lun;
        self.buffer[4] = request.command;
        self.buffer[len - 1] = checksum(&self.buffer[2..len - 1]);
        self.len = len;
        Ok(len)
    }

    /// Reply carrying only `code`, used when the handler's payload did not fit.
    pub fn respond_with_code(
        &mut self,
        request: &RequestHeader,
        own_address: u8,
        code: CompletionCode,
    ) -> Result<usize, ResponseError> {
        let mut writer = self.payload();
        writer.push(code.as_u8())?;
        let end = writer.end();
        self.respond(request, own_address, end)
    }

    /// Slave address the frame goes to.
    #[inline]
    pub fn peer(&self) -> u8 {
        self.peer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop whatever was queued.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Bytes to put on the wire.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

//==================================================================================PAYLOAD_WRITER
/// Bounded cursor over the payload region of the transmit buffer. The last
/// usable byte is reserved for check2.
#[derive(Debug)]
pub struct PayloadWriter<'a> {
    buffer: &'a mut [u8; TX_BUFFER_SIZE],
    cursor: usize,
}

impl PayloadWriter<'_> {
    /// Last payload index + 1 that still leaves room for check2.
    const LIMIT: usize = TX_BUFFER_MAX - 1;

    pub fn push(&mut self, byte: u8) -> Result<(), ResponseError> {
        self.extend(&[byte])
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), ResponseError> {
        let end = self.cursor + bytes.len();
        if end > Self::LIMIT {
            return Err(ResponseError::Overflow {
                asked: end + 1,
                available: TX_BUFFER_MAX,
            });
        }
        self.buffer[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        Ok(())
    }

    /// Completion code helper.
    pub fn completion(&mut self, code: CompletionCode) -> Result<(), ResponseError> {
        self.push(code.as_u8())
    }

    /// Payload bytes still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        Self::LIMIT - self.cursor
    }

    /// Index one past the last written byte.
    #[inline]
    pub fn end(&self) -> usize {
        self.cursor
    }
}
