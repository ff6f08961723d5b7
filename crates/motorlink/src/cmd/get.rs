use motorlink_session::{IdentityQuery, TextQueryChannel};
use serde::Serialize;

use crate::cmd::{open_transport, Context, GetArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct GetOutput<'a> {
    key: &'a str,
    value: &'a str,
}

pub fn run(args: GetArgs, ctx: &Context) -> CliResult<i32> {
    let transport = open_transport(&args.address, ctx)?;
    let mut identity = TextQueryChannel::new(transport);

    let value = identity
        .get(&args.key)
        .map_err(|err| transport_error(&format!("query '{}' failed", args.key), err))?;

    match ctx.format {
        OutputFormat::Json => print_json(&GetOutput {
            key: &args.key,
            value: &value,
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}: {}", args.key, value),
        OutputFormat::Raw => println!("{value}"),
    }
    Ok(SUCCESS)
}
