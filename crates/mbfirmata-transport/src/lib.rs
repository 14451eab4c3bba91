//! Byte-stream transports for micro:bit Firmata boards.
//!
//! The protocol layers above only need "write these bytes" and "some bytes
//! arrived". This crate provides that over:
//! - A local serial port (USB CDC on the micro:bit, 57600 baud by default)
//! - A TCP bridge such as `ser2net` for boards attached to another host
//!
//! Everything is surfaced as a single [`BoardStream`] type that implements
//! `Read + Write`.

pub mod error;
pub mod serial;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{available_ports, default_port, PortSummary, SerialConfig, SerialLink};
pub use tcp::connect_tcp;
pub use traits::BoardStream;
