use motorlink_frame::MAX_REQUEST_PAYLOAD;
use motorlink_transport::ByteChannel;

use crate::cmd::{open_transport, parse_hex, Context, SendArgs};
use crate::exit::{transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_record, RecordOutput};

pub fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    let payload = parse_hex(&args.hex)?;
    if payload.len() > MAX_REQUEST_PAYLOAD {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "payload is {} bytes, at most {MAX_REQUEST_PAYLOAD} fit in one command",
                payload.len()
            ),
        ));
    }

    let mut transport = open_transport(&args.address, ctx)?;
    let ack = transport
        .write(&payload)
        .map_err(|err| transport_error("send failed", err))?;

    tracing::debug!(sent = payload.len(), ack = ack.len(), "command acknowledged");
    let out = RecordOutput::new(transport.peer_display(), 0, &ack);
    print_record(&out, &ack, ctx.format);
    Ok(SUCCESS)
}
