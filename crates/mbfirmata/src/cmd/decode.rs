use std::fs;
use std::io::{self, Read};
use std::path::Path;

use mbfirmata_board::{Board, BoardConfig};
use mbfirmata_frame::FramerConfig;
use tracing::debug;

use crate::cmd::{link, DecodeArgs, InputFormat};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_records, print_state, MessageRecord, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk == Some(0) {
        return Err(CliError::new(USAGE, "--chunk must be at least 1"));
    }
    if args.buffer == 0 {
        return Err(CliError::new(USAGE, "--buffer must be at least 1"));
    }

    let raw = read_input(args.input.as_deref())?;
    let data = parse_capture(&raw, args.input_format)?;
    debug!(bytes = data.len(), "decoding capture");

    let (board, records) = decode(&data, args.chunk, args.buffer);

    if !args.state_only {
        print_records(&records, format);
    }
    print_state(board.state(), board.stats(), board.pending().len(), format);
    Ok(SUCCESS)
}

/// Run a capture through a fresh board, in `chunk`-sized pieces.
fn decode(data: &[u8], chunk: Option<usize>, buffer: usize) -> (Board, Vec<MessageRecord>) {
    let mut board = Board::with_config(BoardConfig {
        framer: FramerConfig {
            buffer_capacity: buffer,
        },
        ..BoardConfig::default()
    });

    let mut records = Vec::new();
    let step = chunk.unwrap_or(data.len()).max(1);
    for piece in data.chunks(step) {
        board.process_bytes_with(piece, |message, outcome| {
            records.push(MessageRecord::new(records.len(), message, outcome));
        });
    }
    (board, records)
}

fn read_input(path: Option<&Path>) -> CliResult<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => fs::read(path)
            .map_err(|err| io_error(&format!("read {} failed", path.display()), err)),
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("read stdin failed", err))?;
            Ok(buf)
        }
    }
}

fn parse_capture(raw: &[u8], format: InputFormat) -> CliResult<Vec<u8>> {
    let as_hex = match format {
        InputFormat::Hex => true,
        InputFormat::Binary => false,
        InputFormat::Auto => looks_like_hex(raw),
    };
    if !as_hex {
        return Ok(raw.to_vec());
    }

    let text = std::str::from_utf8(raw)
        .map_err(|_| CliError::new(DATA_INVALID, "hex capture is not valid text"))?;
    link::parse_hex_bytes(text).map_err(|err| CliError::new(DATA_INVALID, err))
}

/// Hex digits, separators and `0x` prefixes only.
fn looks_like_hex(raw: &[u8]) -> bool {
    !raw.is_empty()
        && raw.iter().all(|&b| {
            b.is_ascii_hexdigit() || b.is_ascii_whitespace() || matches!(b, b',' | b'x' | b'X')
        })
}

#[cfg(test)]
mod tests {
    use mbfirmata_board::Dispatched;

    use super::*;

    #[test]
    fn auto_detects_hex_text() {
        let data = parse_capture(b"F9 02 05\n90 05 00\n", InputFormat::Auto).unwrap();
        assert_eq!(data, vec![0xF9, 0x02, 0x05, 0x90, 0x05, 0x00]);
    }

    #[test]
    fn auto_falls_back_to_binary() {
        let raw = [0xF9, 0x02, 0x05];
        assert_eq!(parse_capture(&raw, InputFormat::Auto).unwrap(), raw.to_vec());
        // Forced binary keeps text as-is.
        assert_eq!(
            parse_capture(b"F9", InputFormat::Binary).unwrap(),
            b"F9".to_vec()
        );
    }

    #[test]
    fn bad_hex_is_invalid_data() {
        let err = parse_capture(b"F9 0G", InputFormat::Hex).err().unwrap();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn decode_builds_records_and_state() {
        let data = [0xF9, 0x02, 0x05, 0x90, 0x05, 0x00, 0xE1, 0x10, 0x00];
        let (board, records) = decode(&data, Some(1), 250);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].index, 0);
        assert_eq!(records[2].index, 2);
        assert!(matches!(
            records[1].outcome,
            Dispatched::DigitalPort { port: 0, mask: 5 }
        ));
        assert_eq!(board.state().firmata_version, "Firmata Protocol 2.5");
        assert!(board.state().digital_input[0]);
        assert!(!board.state().digital_input[1]);
        assert!(board.state().digital_input[2]);
        assert_eq!(board.state().analog_channel[1], 16);
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let data = [
            0xF0, 0x0E, 0x68, 0x69, 0xF7, 0xE0, 0x7F, 0x7F, 0x91, 0x01, 0x00,
        ];
        let (whole, whole_records) = decode(&data, None, 250);
        let (split, split_records) = decode(&data, Some(3), 250);
        assert_eq!(whole.state(), split.state());
        assert_eq!(whole_records.len(), split_records.len());
    }
}
