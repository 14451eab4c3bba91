use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::BoardStream;

/// USB vendor id of the DAPLink interface chip on the micro:bit.
pub const MICROBIT_USB_VID: u16 = 0x0D28;
/// USB product id of the DAPLink CMSIS-DAP interface.
pub const MICROBIT_USB_PID: u16 = 0x0204;

/// Serial line settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed. The board firmware runs at 57600 baud.
    pub baud_rate: u32,
    /// Read timeout for blocking reads.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 57_600,
            timeout: Duration::from_millis(100),
        }
    }
}

/// A serial port found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub kind: &'static str,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub product: Option<String>,
}

impl PortSummary {
    /// True when the USB ids match a micro:bit interface chip.
    pub fn is_microbit(&self) -> bool {
        self.vid == Some(MICROBIT_USB_VID) && self.pid == Some(MICROBIT_USB_PID)
    }
}

/// Serial port transport.
pub struct SerialLink;

impl SerialLink {
    /// Open a serial port with default line settings.
    pub fn open(path: impl AsRef<Path>) -> Result<BoardStream> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open a serial port with explicit line settings.
    pub fn open_with_config(path: impl AsRef<Path>, config: &SerialConfig) -> Result<BoardStream> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        let port = serialport::new(name.as_ref(), config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        info!(?path, baud = config.baud_rate, "opened serial port");
        Ok(BoardStream::from_serial(port))
    }
}

/// List the serial ports visible to this host.
pub fn available_ports() -> Result<Vec<PortSummary>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports.into_iter().map(summarize).collect())
}

/// Pick the most likely board port.
///
/// Prefers a port whose USB ids identify a micro:bit, then any USB port,
/// and falls back to a conventional device path.
pub fn default_port() -> String {
    let ports = match available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            debug!(%err, "port enumeration failed");
            Vec::new()
        }
    };

    let usable: Vec<&PortSummary> = ports.iter().filter(|p| !skip_port(&p.name)).collect();

    if let Some(port) = usable.iter().find(|p| p.is_microbit()) {
        return port.name.clone();
    }
    if let Some(port) = usable.iter().find(|p| p.kind == "usb") {
        return port.name.clone();
    }

    if cfg!(windows) {
        "COM3".to_owned()
    } else {
        "/dev/ttyACM0".to_owned()
    }
}

// macOS exposes both tty.* and cu.* nodes; the tty.* ones wait on carrier detect.
fn skip_port(name: &str) -> bool {
    cfg!(target_os = "macos")
        && (name.starts_with("/dev/tty.") || name.ends_with(".Bluetooth-Incoming-Port"))
}

fn summarize(info: serialport::SerialPortInfo) -> PortSummary {
    let (kind, vid, pid, product) = match info.port_type {
        serialport::SerialPortType::UsbPort(usb) => {
            ("usb", Some(usb.vid), Some(usb.pid), usb.product)
        }
        serialport::SerialPortType::PciPort => ("pci", None, None, None),
        serialport::SerialPortType::BluetoothPort => ("bluetooth", None, None, None),
        #[allow(unreachable_patterns)]
        _ => ("unknown", None, None, None),
    };
    PortSummary {
        name: info.port_name,
        kind,
        vid,
        pid,
        product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_board_firmware() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.timeout, Duration::from_millis(100));
    }

    #[test]
    fn open_missing_port_reports_path() {
        let err = SerialLink::open("/dev/mbfirmata-does-not-exist").unwrap_err();
        match err {
            TransportError::Open { path, .. } => {
                assert_eq!(path, Path::new("/dev/mbfirmata-does-not-exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn microbit_ids_are_recognized() {
        let port = PortSummary {
            name: "/dev/ttyACM0".to_string(),
            kind: "usb",
            vid: Some(MICROBIT_USB_VID),
            pid: Some(MICROBIT_USB_PID),
            product: Some("BBC micro:bit CMSIS-DAP".to_string()),
        };
        assert!(port.is_microbit());

        let other = PortSummary {
            vid: Some(0x2341),
            ..port
        };
        assert!(!other.is_microbit());
    }

    #[test]
    fn default_port_is_never_empty() {
        assert!(!default_port().is_empty());
    }
}
