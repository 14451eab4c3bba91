use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mbfirmata_board::{BoardError, Connection, Dispatched};
use mbfirmata_frame::{encoder, FrameError};
use tracing::{info, warn};

use crate::cmd::{link, MonitorArgs};
use crate::exit::{board_error, CliError, CliResult, SUCCESS};
use crate::output::{print_record, MessageRecord, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let mut conn = link::open(&args.link)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    if let Some(millis) = args.interval {
        conn.send(encoder::set_sampling_interval(millis), "sampling interval")
            .map_err(|err| board_error("set sampling interval failed", err))?;
    }
    set_streaming(&mut conn, &args, true)?;

    let result = stream(&mut conn, &args, format, &running);

    if let Err(err) = set_streaming(&mut conn, &args, false) {
        warn!(error = %err, "could not turn streaming off");
    }
    result
}

fn stream(
    conn: &mut Connection,
    args: &MonitorArgs,
    format: OutputFormat,
    running: &AtomicBool,
) -> CliResult<i32> {
    let mut seen = 0usize;
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut records = Vec::new();
        let polled = conn.poll_with(|message, outcome| {
            if args.all || !matches!(outcome, Dispatched::Ignored) {
                records.push(MessageRecord::new(seen, message, outcome));
            }
            seen += 1;
        });

        match polled {
            Ok(_) => {}
            Err(BoardError::Frame(FrameError::ConnectionClosed)) => {
                info!("board closed the link");
                return Ok(SUCCESS);
            }
            Err(err) => return Err(board_error("receive failed", err)),
        }

        for record in &records {
            print_record(record, format);
            printed += 1;
            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn set_streaming(conn: &mut Connection, args: &MonitorArgs, on: bool) -> CliResult<()> {
    for &channel in &args.analog {
        conn.send(
            encoder::stream_analog_channel(channel, on),
            &format!("analog channel {channel}"),
        )
        .map_err(|err| board_error("analog streaming failed", err))?;
    }
    for &port in &args.digital {
        conn.send(
            encoder::stream_digital_port(port, on),
            &format!("digital port {port}"),
        )
        .map_err(|err| board_error("digital streaming failed", err))?;
    }
    for &pin in &args.touch {
        conn.send(encoder::set_touch_mode(pin, on), &format!("touch pin {pin}"))
            .map_err(|err| board_error("touch mode failed", err))?;
    }
    Ok(())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
