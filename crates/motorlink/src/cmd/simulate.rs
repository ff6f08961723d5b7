use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use motorlink_session::{DeviceProfile, SimulatedDevice};
use serde::Serialize;

use crate::cmd::{install_ctrlc_handler, Context, SimulateArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct ListeningOutput {
    listening: String,
    identity_keys: usize,
    status_size: usize,
}

pub fn run(args: SimulateArgs, ctx: &Context) -> CliResult<i32> {
    let profile = match &args.profile {
        Some(path) => DeviceProfile::load(path)
            .map_err(|err| session_error(&format!("failed loading {}", path.display()), err))?,
        None => default_profile(),
    };

    let mut device =
        SimulatedDevice::bind(&args.bind, profile).map_err(|err| session_error("bind failed", err))?;
    let addr = device
        .local_addr()
        .map_err(|err| session_error("bind failed", err))?;

    let out = ListeningOutput {
        listening: addr.to_string(),
        identity_keys: device.profile().identity.len(),
        status_size: device.profile().status.len(),
    };
    match ctx.format {
        OutputFormat::Json => print_json(&out),
        _ => println!("listening on {}", out.listening),
    }
    let _ = std::io::stdout().flush();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    device
        .run(&running)
        .map_err(|err| session_error("simulated device failed", err))?;
    Ok(SUCCESS)
}

fn default_profile() -> DeviceProfile {
    DeviceProfile::default()
        .with_identity("name", "motorlink-sim")
        .with_identity("version", env!("CARGO_PKG_VERSION"))
        .with_identity("messages_version", "1")
        .with_identity("board_name", "sim")
        .with_identity("board_rev", "0")
        .with_identity("board_num", "0")
        .with_identity("config", "default")
        .with_identity("serial", "SIM-0000")
        .with_status(vec![0; 8])
}
