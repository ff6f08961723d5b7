use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use motorlink_session::DeviceInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One payload exchanged with the device.
#[derive(Serialize)]
pub struct RecordOutput<'a> {
    pub peer: &'a str,
    pub sequence: u64,
    pub size: usize,
    pub hex: String,
    pub timestamp: String,
}

impl<'a> RecordOutput<'a> {
    pub fn new(peer: &'a str, sequence: u64, payload: &[u8]) -> Self {
        Self {
            peer,
            sequence,
            size: payload.len(),
            hex: hex(payload),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_record(out: &RecordOutput<'_>, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "PEER", "SIZE", "BYTES"])
                .add_row(vec![
                    out.sequence.to_string(),
                    out.peer.to_string(),
                    out.size.to_string(),
                    spaced_hex(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} peer={} size={} bytes={}",
                out.sequence,
                out.peer,
                out.size,
                spaced_hex(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

pub fn print_device_info(info: &DeviceInfo, format: OutputFormat) {
    let rows = [
        ("Name", info.name.as_str()),
        ("Version", info.version.as_str()),
        ("Messages version", info.messages_version.as_str()),
        ("Board", info.board_name.as_str()),
        ("Board rev", info.board_rev.as_str()),
        ("Board num", info.board_num.as_str()),
        ("Config", info.config.as_str()),
        ("Serial", info.serial_number.as_str()),
        ("Address", info.dev_path.as_str()),
        ("Host", info.base_path.as_str()),
    ];

    match format {
        OutputFormat::Json => print_json(info),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in rows {
                table.add_row(vec![field.to_string(), value.to_string()]);
            }
            table.add_row(vec!["Port".to_string(), info.devnum.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Device Info:");
            for (field, value) in rows {
                println!("  {:<18}{}", format!("{field}:"), value);
            }
            println!("  {:<18}{}", "Port:", info.devnum);
        }
        OutputFormat::Raw => println!("{}", info.name),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formats() {
        assert_eq!(hex(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(spaced_hex(&[0x00, 0xab, 0x10]), "00 ab 10");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn record_output_serializes() {
        let out = RecordOutput::new("10.0.0.5", 3, &[1, 2]);
        let value = serde_json::to_value(&out).expect("record should serialize");
        assert_eq!(value["peer"], "10.0.0.5");
        assert_eq!(value["sequence"], 3);
        assert_eq!(value["size"], 2);
        assert_eq!(value["hex"], "0102");
    }
}
