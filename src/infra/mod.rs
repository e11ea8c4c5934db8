//! Platform glue shared by the protocol engine: where log lines go, where
//! ticks come from and how the persisted board configuration is guarded.
pub mod clock;
pub mod config;
pub mod log;
