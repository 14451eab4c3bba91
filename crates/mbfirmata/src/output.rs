use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mbfirmata_board::{DeviceState, Dispatched};
use mbfirmata_frame::wire::source_name;
use mbfirmata_frame::{FramerStats, Message};
use mbfirmata_transport::PortSummary;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded message and what it did.
#[derive(Debug, Serialize)]
pub struct MessageRecord {
    pub index: usize,
    pub kind: &'static str,
    pub data: String,
    pub outcome: Dispatched,
}

impl MessageRecord {
    pub fn new(index: usize, message: &Message, outcome: &Dispatched) -> Self {
        Self {
            index,
            kind: message.label(),
            data: message_hex(message),
            outcome: outcome.clone(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Print a single record as it arrives (monitor).
pub fn print_record(record: &MessageRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "#{:<5} {:<24} {}",
                record.index,
                record.kind,
                outcome_summary(&record.outcome)
            );
        }
        OutputFormat::Raw => println!("{}", record.data),
    }
}

/// Print a finished batch of records (decode).
pub fn print_records(records: &[MessageRecord], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "MESSAGE", "BYTES", "EFFECT"]);
            for record in records {
                table.add_row(vec![
                    record.index.to_string(),
                    record.kind.to_string(),
                    record.data.clone(),
                    outcome_summary(&record.outcome),
                ]);
            }
            println!("{table}");
        }
        _ => {
            for record in records {
                print_record(record, format);
            }
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    messages: u64,
    stray_bytes: u64,
    discarded_sysex: u64,
    dropped_bytes: u64,
    pending_bytes: usize,
}

#[derive(Serialize)]
struct StateOutput<'a> {
    state: &'a DeviceState,
    framer: StatsOutput,
}

pub fn print_state(state: &DeviceState, stats: FramerStats, pending: usize, format: OutputFormat) {
    let framer = StatsOutput {
        messages: stats.messages,
        stray_bytes: stats.stray_bytes,
        discarded_sysex: stats.discarded_sysex,
        dropped_bytes: stats.dropped_bytes,
        pending_bytes: pending,
    };

    match format {
        OutputFormat::Json => print_json(&StateOutput { state, framer }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["Protocol".to_string(), or_unknown(&state.firmata_version)])
                .add_row(vec!["Firmware".to_string(), or_unknown(&state.firmware_version)])
                .add_row(vec!["Digital 0-20".to_string(), digital_bits(state)])
                .add_row(vec!["Analog 0-15".to_string(), analog_values(state)])
                .add_row(vec![
                    "Framer".to_string(),
                    format!(
                        "{} messages, {} stray, {} bad sysex, {} dropped, {} pending",
                        framer.messages,
                        framer.stray_bytes,
                        framer.discarded_sysex,
                        framer.dropped_bytes,
                        framer.pending_bytes
                    ),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Board State:");
            println!("  Protocol:  {}", or_unknown(&state.firmata_version));
            println!("  Firmware:  {}", or_unknown(&state.firmware_version));
            println!("  Digital:   {}", digital_bits(state));
            println!("  Analog:    {}", analog_values(state));
            println!(
                "  Framer:    messages={} stray={} bad_sysex={} dropped={} pending={}",
                framer.messages,
                framer.stray_bytes,
                framer.discarded_sysex,
                framer.dropped_bytes,
                framer.pending_bytes
            );
        }
        OutputFormat::Raw => println!("{}", digital_bits(state)),
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    vid: Option<String>,
    pid: Option<String>,
    product: Option<&'a str>,
    microbit: bool,
}

pub fn print_ports(ports: &[PortSummary], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports
        .iter()
        .map(|port| PortOutput {
            name: &port.name,
            kind: port.kind,
            vid: port.vid.map(|vid| format!("{vid:04x}")),
            pid: port.pid.map(|pid| format!("{pid:04x}")),
            product: port.product.as_deref(),
            microbit: port.is_microbit(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "PRODUCT", "MICRO:BIT"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.kind.to_string(),
                    usb_ids(row),
                    row.product.unwrap_or("-").to_string(),
                    if row.microbit { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                let marker = if row.microbit { " (micro:bit)" } else { "" };
                println!("{} [{} {}]{}", row.name, row.kind, usb_ids(row), marker);
            }
        }
        OutputFormat::Raw => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }
}

pub fn print_json_value<T: Serialize>(value: &T) {
    print_json(value);
}

/// Space-separated hex of a message as it appears on the wire.
///
/// Channel messages always show both argument slots.
pub fn message_hex(message: &Message) -> String {
    let bytes: Vec<u8> = match message {
        Message::Channel(msg) => vec![msg.command, msg.arg1, msg.arg2],
        Message::Sysex(msg) => {
            let mut bytes = Vec::with_capacity(msg.wire_size());
            bytes.push(mbfirmata_frame::wire::SYSEX_START);
            bytes.push(msg.subcommand);
            bytes.extend_from_slice(&msg.payload);
            bytes.push(mbfirmata_frame::wire::SYSEX_END);
            bytes
        }
    };
    hex(&bytes)
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-readable effect of a dispatched message.
pub fn outcome_summary(outcome: &Dispatched) -> String {
    match outcome {
        Dispatched::DigitalPort { port, mask } => {
            format!("port {port} = {:08b}", mask & 0xFF)
        }
        Dispatched::Analog { channel, value } => format!("analog {channel} = {value}"),
        Dispatched::ProtocolVersion { version } | Dispatched::Firmware { version } => {
            version.clone()
        }
        Dispatched::Event {
            source_id,
            event_id,
        } => format!(
            "event source={} ({}) id={}",
            source_id,
            source_name(*source_id),
            event_id
        ),
        Dispatched::DebugString { text } => format!("debug: {text}"),
        Dispatched::Capabilities { pins } => format!("capabilities for {pins} pins"),
        Dispatched::AnalogMapping { entries } => format!("analog mapping, {entries} entries"),
        Dispatched::PinState { pin, mode, state } => {
            format!("pin {pin} mode=0x{mode:02X} state={state}")
        }
        Dispatched::Ignored => "-".to_string(),
    }
}

fn or_unknown(value: &str) -> String {
    if value.is_empty() {
        "unknown".to_string()
    } else {
        value.to_string()
    }
}

fn digital_bits(state: &DeviceState) -> String {
    state
        .digital_input
        .iter()
        .map(|&high| if high { '1' } else { '0' })
        .collect()
}

fn analog_values(state: &DeviceState) -> String {
    state
        .analog_channel
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn usb_ids(row: &PortOutput<'_>) -> String {
    match (&row.vid, &row.pid) {
        (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
        _ => "-".to_string(),
    }
}
