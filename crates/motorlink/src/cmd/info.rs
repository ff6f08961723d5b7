use motorlink_session::{DeviceSession, SessionConfig};

use crate::cmd::{parse_address, Context, InfoArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::print_device_info;

pub fn run(args: InfoArgs, ctx: &Context) -> CliResult<i32> {
    let address = parse_address(&args.address)?;
    let config = SessionConfig {
        transport: ctx.transport.clone(),
    };

    let session =
        DeviceSession::open(&address, config).map_err(|err| session_error("connect failed", err))?;
    print_device_info(session.info(), ctx.format);
    Ok(SUCCESS)
}
