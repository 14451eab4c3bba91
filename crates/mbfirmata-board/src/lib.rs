//! Host-side board model for micro:bit Firmata.
//!
//! [`Board`] turns the raw byte stream from the link into [`DeviceState`]
//! updates and listener callbacks. [`Connection`] pairs a board with a live
//! serial or TCP link and adds the request/response queries.

pub mod board;
pub mod connector;
pub mod dispatch;
pub mod error;
pub mod listeners;
pub mod query;
pub mod state;

pub use board::{Board, BoardConfig};
pub use connector::{open_serial, open_tcp, Connection};
pub use dispatch::{Dispatched, Dispatcher};
pub use error::{BoardError, Result};
pub use listeners::{EventListener, ListenerId, ListenerRegistry, UpdateListener};
pub use query::BoardVersions;
pub use state::{DeviceState, PinCapability, PinState};
