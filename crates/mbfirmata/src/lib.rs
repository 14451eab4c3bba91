//! Host-side toolkit for boards running micro:bit Firmata.
//!
//! The serial link carries a Firmata-style byte protocol with no length
//! prefixes. This crate bundles the layers needed to talk to it.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial port and TCP bridge links
//! - [`frame`]: Stream framing, 7-bit codecs and command encoding
//! - [`board`]: Device state, dispatch and listeners (behind `board` feature)

/// Re-export transport types.
pub mod transport {
    pub use mbfirmata_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mbfirmata_frame::*;
}

/// Re-export board types (requires `board` feature).
#[cfg(feature = "board")]
pub mod board {
    pub use mbfirmata_board::*;
}
