use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("motorlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: motorlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("MOTORLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "wire: marker=0x{:04X} kind={} max_payload={}",
        motorlink_frame::START_MARKER,
        motorlink_frame::FRAME_KIND,
        motorlink_frame::MAX_PAYLOAD
    );
    println!(
        "features: session={}, cli=true",
        cfg!(feature = "session")
    );

    Ok(SUCCESS)
}
