use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{link_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.port.serial_config()?;
    let link = canlink_link::open(&config).map_err(|err| link_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let frames = link
        .subscribe()
        .map_err(|err| link_error("receive loop failed to start", err))?;
    info!(port = %link.label(), baud = config.baud_rate, "listening");

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match frames.recv_timeout(POLL_INTERVAL) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(match link.take_loop_error() {
                    Some(err) => link_error("receive failed", err),
                    None => CliError::new(FAILURE, "receive loop stopped"),
                });
            }
        };

        if let Some(ids) = &args.ids {
            if !ids.contains(&frame.id()) {
                continue;
            }
        }

        print_frame("received", &frame, link.label(), format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    link.close();
    info!(printed, "listen finished");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
