//! Request/response exchanges with the board.
//!
//! The protocol has no request ids: a query is answered when a message of the
//! matching kind arrives. Unrelated traffic (streamed updates, events) keeps
//! flowing through the board model while waiting.

use std::time::Instant;

use mbfirmata_frame::encoder;
use serde::Serialize;
use tracing::debug;

use crate::connector::Connection;
use crate::dispatch::Dispatched;
use crate::error::{BoardError, Result};
use crate::state::{PinCapability, PinState};

/// Both version strings reported by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardVersions {
    pub firmata_version: String,
    pub firmware_version: String,
}

impl Connection {
    /// Ask for the protocol and firmware versions and wait for both replies.
    pub fn query_versions(&mut self) -> Result<BoardVersions> {
        self.send_bytes(&encoder::request_protocol_version())?;
        self.send_bytes(&encoder::request_firmware())?;

        let (mut protocol, mut firmware) = (false, false);
        self.wait_for("version query", |outcome| {
            match outcome {
                Dispatched::ProtocolVersion { .. } => protocol = true,
                Dispatched::Firmware { .. } => firmware = true,
                _ => {}
            }
            protocol && firmware
        })?;

        let state = self.board().state();
        Ok(BoardVersions {
            firmata_version: state.firmata_version.clone(),
            firmware_version: state.firmware_version.clone(),
        })
    }

    pub fn query_capabilities(&mut self) -> Result<Vec<Vec<PinCapability>>> {
        self.send_bytes(&encoder::query_capabilities())?;
        self.wait_for("capability query", |outcome| {
            matches!(outcome, Dispatched::Capabilities { .. })
        })?;
        Ok(self.board().state().pin_capabilities.clone())
    }

    pub fn query_analog_mapping(&mut self) -> Result<Vec<Option<u8>>> {
        self.send_bytes(&encoder::query_analog_mapping())?;
        self.wait_for("analog mapping query", |outcome| {
            matches!(outcome, Dispatched::AnalogMapping { .. })
        })?;
        Ok(self.board().state().analog_mapping.clone())
    }

    pub fn query_pin_state(&mut self, pin: u8) -> Result<PinState> {
        self.send(encoder::query_pin_state(pin), "pin state query")?;
        let mut reply = None;
        self.wait_for("pin state query", |outcome| match outcome {
            Dispatched::PinState {
                pin: reported,
                mode,
                state,
            } if *reported == pin => {
                reply = Some(PinState {
                    mode: *mode,
                    state: *state,
                });
                true
            }
            _ => false,
        })?;
        reply.ok_or(BoardError::Timeout {
            query: "pin state query",
            waited: self.board().config().query_timeout,
        })
    }

    /// Poll until `done` accepts a dispatched message or the query timeout
    /// passes.
    fn wait_for<F>(&mut self, query: &'static str, mut done: F) -> Result<()>
    where
        F: FnMut(&Dispatched) -> bool,
    {
        let timeout = self.board().config().query_timeout;
        let deadline = Instant::now() + timeout;
        loop {
            let mut finished = false;
            self.poll_with(|_, outcome| {
                if !finished && done(outcome) {
                    finished = true;
                }
            })?;
            if finished {
                debug!(query, "query answered");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BoardError::Timeout {
                    query,
                    waited: timeout,
                });
            }
        }
    }
}
