use mbfirmata_frame::encoder::{self, DISPLAY_SIZE};
use serde::Serialize;

use crate::cmd::{link, SendAction, SendArgs};
use crate::exit::{board_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex, print_json_value, OutputFormat};

/// A command ready for the wire.
struct Encoded {
    name: &'static str,
    bytes: Vec<u8>,
}

#[derive(Serialize)]
struct SentOutput<'a> {
    command: &'a str,
    bytes: String,
    endpoint: Option<String>,
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let encoded = encode(&args.action)?;
    let mut conn = link::open(&args.link)?;
    conn.send_bytes(&encoded.bytes)
        .map_err(|err| board_error("send failed", err))?;

    let out = SentOutput {
        command: encoded.name,
        bytes: hex(&encoded.bytes),
        endpoint: conn.endpoint(),
    };
    match format {
        OutputFormat::Json => print_json_value(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent {} [{}]", out.command, out.bytes)
        }
        OutputFormat::Raw => println!("{}", out.bytes),
    }
    Ok(SUCCESS)
}

fn encode(action: &SendAction) -> CliResult<Encoded> {
    let (name, command) = match action {
        SendAction::PinMode { pin, mode } => ("pin-mode", encoder::set_pin_mode(*pin, *mode)),
        SendAction::Digital { pin, level } => ("digital", encoder::set_digital_pin(*pin, *level)),
        SendAction::Port { port, mask } => ("port", encoder::write_digital_port(*port, *mask)),
        SendAction::Analog { pin, value } => ("analog", encoder::analog_write(*pin, *value)),
        SendAction::Scroll { text, delay } => ("scroll", encoder::scroll_string(text, *delay)),
        SendAction::Number { value, delay } => ("number", encoder::scroll_integer(*value, *delay)),
        SendAction::Clear => ("clear", Some(encoder::display_clear())),
        SendAction::Plot { x, y, brightness } => {
            ("plot", encoder::display_plot(*x, *y, *brightness))
        }
        SendAction::Show { rows, grayscale } => {
            let image = parse_image(rows)?;
            ("show", Some(encoder::display_show(*grayscale, &image)))
        }
        SendAction::Touch { pin, enabled } => ("touch", encoder::set_touch_mode(*pin, *enabled)),
        SendAction::Sampling { millis } => ("sampling", encoder::set_sampling_interval(*millis)),
        SendAction::Reset => ("reset", Some(encoder::system_reset())),
        SendAction::Raw { bytes } => {
            let bytes = link::parse_hex_bytes(&bytes.join(" "))
                .map_err(|err| CliError::new(USAGE, err))?;
            return Ok(Encoded { name: "raw", bytes });
        }
    };

    match command {
        Some(bytes) => Ok(Encoded {
            name,
            bytes: bytes.to_vec(),
        }),
        None => Err(CliError::new(
            USAGE,
            format!("{name}: argument out of range for this board"),
        )),
    }
}

/// Rows of digits 0-9, scaled to 0-255 like micro:bit image strings.
fn parse_image(rows: &[String]) -> CliResult<[[u8; DISPLAY_SIZE]; DISPLAY_SIZE]> {
    if rows.len() != DISPLAY_SIZE {
        return Err(CliError::new(
            USAGE,
            format!("show needs {DISPLAY_SIZE} rows, got {}", rows.len()),
        ));
    }
    let mut image = [[0u8; DISPLAY_SIZE]; DISPLAY_SIZE];
    for (y, row) in rows.iter().enumerate() {
        let digits: Vec<u32> = row.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != DISPLAY_SIZE || row.chars().count() != DISPLAY_SIZE {
            return Err(CliError::new(
                USAGE,
                format!("row {y} must be {DISPLAY_SIZE} digits 0-9, got '{row}'"),
            ));
        }
        for (x, level) in digits.into_iter().enumerate() {
            // 9 -> 255
            image[y][x] = ((level * 255 + 4) / 9) as u8;
        }
    }
    Ok(image)
}
