//! Minimal abstraction over the bus peripheral and its bulk byte mover
//! (DMA). The engine never touches hardware registers: it arms, disarms and
//! queries the mover through this trait, and learns about outcomes through
//! the link's event callbacks.

/// One buffered transfer handed to the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer<'a> {
    /// Master transmit of `frame` to `peer` (8-bit slave address). The
    /// implementation issues the start condition and stops automatically once
    /// `frame.len()` bytes have been shifted out.
    Send { peer: u8, frame: &'a [u8] },
    /// Slave receive of up to `capacity` bytes addressed to this controller.
    Receive { capacity: usize },
}

/// Contract for the bus peripheral.
///
/// No method reports an error: transfer outcomes (completion, NACK,
/// arbitration loss) surface asynchronously as bus events.
pub trait BusTransport {
    /// Arm the mover for `transfer` and enable the completion, NACK and
    /// arbitration interrupt sources that belong to it.
    ///
    /// For [`Transfer::Send`] the implementation copies or pins the frame
    /// before returning.
    fn start_transfer(&mut self, transfer: Transfer<'_>);

    /// `true` while the bus is still busy with the last transfer.
    fn is_busy(&self) -> bool;

    /// Disable the mover without touching the bus state. Returns the number
    /// of bytes moved before it was stopped.
    fn abort(&mut self) -> usize;

    /// Copy the bytes captured by the last receive into `buffer`, returning
    /// the number written.
    fn read_captured(&self, buffer: &mut [u8]) -> usize;

    /// Listen as a slave on `own_address` (and general call), with the start
    /// interrupt enabled.
    fn enable_receiver(&mut self, own_address: u8);

    /// Stop answering to any address; further bytes are NACKed.
    fn disable_receiver(&mut self);

    /// NACK the byte currently being received.
    fn nack(&mut self);
}
