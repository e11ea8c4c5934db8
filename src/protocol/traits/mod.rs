//! Collaborator contracts consumed by the engine: bulk-transfer hardware,
//! tick clock, async delay, sensor data repository, sensor readings and log sink.
pub mod bus_transport;
pub mod clock;
pub mod delay;
pub mod log_sink;
pub mod sdr_repository;
pub mod sensor_repository;
