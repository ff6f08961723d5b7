use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::cmd::read::read_record;
use crate::cmd::{install_ctrlc_handler, open_transport, parse_duration, Context, WatchArgs};
use crate::exit::{CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_record, RecordOutput};

pub fn run(args: WatchArgs, ctx: &Context) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let mut transport = open_transport(&args.address, ctx)?;
    let size = usize::from(args.size);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut sequence = 0u64;
    let mut missed = 0u64;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| sequence >= count) {
            break;
        }

        match read_record(&mut transport, size) {
            Ok(record) => {
                let out = RecordOutput::new(transport.peer_display(), sequence, &record);
                print_record(&out, &record, ctx.format);
                sequence += 1;
            }
            // a dropped datagram is routine; keep polling
            Err(err) if err.code == TIMEOUT => {
                missed += 1;
                tracing::warn!(missed, error = %err, "no status reply");
            }
            Err(err) => return Err(err),
        }

        thread::sleep(interval);
    }

    tracing::info!(received = sequence, missed, "watch stopped");
    Ok(SUCCESS)
}
