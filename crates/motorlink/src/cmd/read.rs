use motorlink_transport::DatagramTransport;

use crate::cmd::{open_transport, Context, ReadArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_record, RecordOutput};

pub fn run(args: ReadArgs, ctx: &Context) -> CliResult<i32> {
    let mut transport = open_transport(&args.address, ctx)?;
    let size = usize::from(args.size);

    for sequence in 0..args.count {
        let record = read_record(&mut transport, size)?;
        let out = RecordOutput::new(transport.peer_display(), sequence, &record);
        print_record(&out, &record, ctx.format);
    }
    Ok(SUCCESS)
}

/// One status query that must return exactly `size` bytes.
pub fn read_record(transport: &mut DatagramTransport, size: usize) -> CliResult<Vec<u8>> {
    let mut buf = vec![0u8; size];
    motorlink_session::read_exact(transport, &mut buf)
        .map_err(|err| session_error("read failed", err))?;
    Ok(buf)
}
