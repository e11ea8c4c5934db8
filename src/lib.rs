//! `ipmb-controller` library: the request/response engine of an IPMB
//! management controller in a `no_std` environment. The crate exposes the
//! infrastructure modules (logging, timekeeping, persisted configuration),
//! the protocol logic (framing, validation, dispatch, RX/TX state machines),
//! and the board-specific sensor data repository.
#![no_std]
//==================================================================================
/// Protocol constants and small value types shared across the crate.
pub mod core;
/// Framing, response-construction and configuration errors.
pub mod error;
/// Board description: device identity, sensor data records and reading scaling.
pub mod device;
/// Platform glue: log sinks, tick clock and persisted configuration.
pub mod infra;
/// IPMB protocol implementation: frames, validator, dispatcher, bus link and
/// the poll-driven engine.
pub mod protocol;
//==================================================================================
