mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use motorlink_frame::{ChecksumPolicy, FrameConfig};
use motorlink_transport::TransportConfig;

use crate::cmd::{Command, Context};
use crate::exit::CliResult;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "motorlink", version, about = "Motor controller UDP link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Reply timeout per request (e.g. 10ms, 2s).
    #[arg(
        long,
        value_name = "DURATION",
        default_value = "10ms",
        env = "MOTORLINK_TIMEOUT",
        global = true
    )]
    timeout: String,

    /// Accept replies whose checksum does not match (legacy firmware).
    #[arg(long, global = true)]
    lenient_checksum: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn context(&self) -> CliResult<Context> {
        let checksum = if self.lenient_checksum {
            ChecksumPolicy::Ignore
        } else {
            ChecksumPolicy::Enforce
        };
        Ok(Context {
            format: self.format.unwrap_or_else(OutputFormat::default_for_stdout),
            transport: TransportConfig {
                timeout: cmd::parse_duration(&self.timeout)?,
                frame: FrameConfig { checksum },
            },
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = cli
        .context()
        .and_then(|ctx| cmd::run(cli.command, &ctx));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from(["motorlink", "send", "10.0.0.5", "--hex", "01ff"])
            .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn send_requires_payload() {
        let err = Cli::try_parse_from(["motorlink", "send", "10.0.0.5"])
            .expect_err("missing --hex should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_build_context() {
        let cli = Cli::try_parse_from([
            "motorlink",
            "--format",
            "json",
            "--lenient-checksum",
            "read",
            "10.0.0.5:9000",
            "--size",
            "16",
            "--timeout",
            "250ms",
        ])
        .expect("read args should parse");

        let ctx = cli.context().expect("context should build");
        assert_eq!(ctx.transport.timeout, Duration::from_millis(250));
        assert_eq!(ctx.transport.frame.checksum, ChecksumPolicy::Ignore);
        assert!(matches!(ctx.format, OutputFormat::Json));
    }

    #[test]
    fn rejects_oversized_record() {
        let err = Cli::try_parse_from(["motorlink", "read", "10.0.0.5", "--size", "300"])
            .expect_err("size above 255 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_get_subcommand() {
        let cli = Cli::try_parse_from(["motorlink", "get", "motor-a", "serial"])
            .expect("get args should parse");
        assert!(matches!(cli.command, Command::Get(ref args) if args.key == "serial"));
    }
}
