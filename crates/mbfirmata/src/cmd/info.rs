use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mbfirmata_board::{PinCapability, PinState};
use mbfirmata_frame::PinMode;
use serde::Serialize;

use crate::cmd::{link, InfoArgs};
use crate::exit::{board_error, CliResult, SUCCESS};
use crate::output::{print_json_value, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    endpoint: Option<String>,
    firmata_version: String,
    firmware_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<Vec<Vec<PinCapability>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analog_mapping: Option<Vec<Option<u8>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pin_states: BTreeMap<u8, PinState>,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut conn = link::open(&args.link)?;

    let versions = conn
        .query_versions()
        .map_err(|err| board_error("version query failed", err))?;

    let capabilities = if args.capabilities {
        Some(
            conn.query_capabilities()
                .map_err(|err| board_error("capability query failed", err))?,
        )
    } else {
        None
    };

    let analog_mapping = if args.mapping {
        Some(
            conn.query_analog_mapping()
                .map_err(|err| board_error("analog mapping query failed", err))?,
        )
    } else {
        None
    };

    let mut pin_states = BTreeMap::new();
    for &pin in &args.pins {
        let state = conn
            .query_pin_state(pin)
            .map_err(|err| board_error(&format!("pin {pin} state query failed"), err))?;
        pin_states.insert(pin, state);
    }

    let out = InfoOutput {
        endpoint: conn.endpoint(),
        firmata_version: versions.firmata_version,
        firmware_version: versions.firmware_version,
        capabilities,
        analog_mapping,
        pin_states,
    };

    print_info(&out, format);
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json_value(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Board Info:");
            println!(
                "  Endpoint:  {}",
                out.endpoint.as_deref().unwrap_or("unknown")
            );
            println!("  Protocol:  {}", out.firmata_version);
            println!("  Firmware:  {}", out.firmware_version);

            if let Some(mapping) = &out.analog_mapping {
                let entries = mapping
                    .iter()
                    .enumerate()
                    .filter_map(|(i, ch)| ch.map(|ch| format!("{i}->A{ch}")))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  Analog:    {entries}");
            }
            for (pin, state) in &out.pin_states {
                println!(
                    "  Pin {pin:<2}:    mode={} state={}",
                    mode_label(state.mode),
                    state.state
                );
            }

            if let Some(pins) = &out.capabilities {
                if matches!(format, OutputFormat::Table) {
                    println!("{}", capability_table(pins));
                } else {
                    for (pin, caps) in pins.iter().enumerate() {
                        println!("  P{pin:<2} {}", capability_list(caps));
                    }
                }
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.firmware_version);
        }
    }
}

fn capability_table(pins: &[Vec<PinCapability>]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["PIN", "MODES"]);
    for (pin, caps) in pins.iter().enumerate() {
        table.add_row(vec![format!("P{pin}"), capability_list(caps)]);
    }
    table
}

fn capability_list(caps: &[PinCapability]) -> String {
    if caps.is_empty() {
        return "-".to_string();
    }
    caps.iter()
        .map(|cap| format!("{}/{}", mode_label(cap.mode), cap.resolution))
        .collect::<Vec<_>>()
        .join(" ")
}

fn mode_label(mode: u8) -> String {
    PinMode::from_byte(mode)
        .map(|mode| mode.name().to_string())
        .unwrap_or_else(|| format!("0x{mode:02X}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_text() {
        let caps = vec![
            PinCapability {
                mode: 0x00,
                resolution: 1,
            },
            PinCapability {
                mode: 0x03,
                resolution: 10,
            },
        ];
        assert_eq!(capability_list(&caps), "input/1 pwm/10");
        assert_eq!(capability_list(&[]), "-");
    }

    #[test]
    fn unknown_modes_show_hex() {
        assert_eq!(mode_label(0x7F), "0x7F");
        assert_eq!(mode_label(0x0B), "pullup");
    }
}
