use std::path::PathBuf;
use std::time::Duration;

use mbfirmata_board::{open_serial, open_tcp, BoardConfig, Connection};
use mbfirmata_transport::{default_port, SerialConfig};
use tracing::info;

use crate::cmd::LinkArgs;
use crate::exit::{board_error, CliError, CliResult, USAGE};

/// Open the board named by the link arguments.
pub fn open(args: &LinkArgs) -> CliResult<Connection> {
    let config = BoardConfig {
        query_timeout: parse_duration(&args.timeout)?,
        ..BoardConfig::default()
    };

    if let Some(addr) = &args.tcp {
        info!(addr = %addr, "connecting to tcp bridge");
        return open_tcp(addr, config)
            .map_err(|err| board_error(&format!("connect {addr} failed"), err));
    }

    let path = args
        .port
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_port()));
    let serial = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    open_serial(&path, &serial, config)
        .map_err(|err| board_error(&format!("open {} failed", path.display()), err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse on/off style values.
pub fn parse_switch(input: &str) -> Result<bool, String> {
    match input.to_ascii_lowercase().as_str() {
        "on" | "high" | "1" | "true" => Ok(true),
        "off" | "low" | "0" | "false" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

/// Parse an 8-bit mask written as decimal, `0x..` or `0b..`.
pub fn parse_mask(input: &str) -> Result<u8, String> {
    let parsed = if let Some(hex) = input.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = input.strip_prefix("0b") {
        u8::from_str_radix(bin, 2)
    } else {
        input.parse()
    };
    parsed.map_err(|err| format!("invalid mask '{input}': {err}"))
}

/// Parse whitespace- or comma-separated hex bytes, with optional `0x` prefixes.
pub fn parse_hex_bytes(input: &str) -> Result<Vec<u8>, String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .flat_map(|token| {
            let token = token.trim_start_matches("0x").trim_start_matches("0X");
            // Allow run-together pairs such as "F00DF7".
            let pairs: Vec<String> = if token.len() > 2 && token.len() % 2 == 0 {
                token
                    .as_bytes()
                    .chunks(2)
                    .map(|pair| String::from_utf8_lossy(pair).into_owned())
                    .collect()
            } else {
                vec![token.to_string()]
            };
            pairs
        })
        .map(|pair| u8::from_str_radix(&pair, 16).map_err(|_| format!("invalid hex byte '{pair}'")))
        .collect()
}
