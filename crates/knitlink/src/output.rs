use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use knitlink_ayab::{tag_name, AyabMessage};
use knitlink_control::{Envelope, WireId};
use knitlink_session::{CloseInfo, Diagnostic, Inbound, Severity};
use serde::Serialize;
use serde_json::Value;

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

/// One printable event: a decoded message, a diagnostic or a lifecycle change.
#[derive(Debug, Serialize)]
pub struct EventRow {
    pub event: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    pub detail: Value,
    pub timestamp: String,
    /// Bytes written in `raw` format.
    #[serde(skip)]
    pub raw: Vec<u8>,
}

impl EventRow {
    fn new(event: &'static str, name: impl Into<String>, detail: Value) -> Self {
        Self {
            event,
            name: name.into(),
            id: None,
            size: None,
            detail,
            timestamp: now_unix_seconds(),
            raw: Vec::new(),
        }
    }

    pub fn machine(message: &AyabMessage) -> Self {
        let mut row = Self::new(
            "machine",
            tag_name(message.tag()),
            serde_json::to_value(message).unwrap_or(Value::Null),
        );
        row.id = Some(format!("0x{:02X}", message.tag()));
        row
    }

    /// A machine message together with the frame it came from.
    pub fn frame(message: &AyabMessage, frame: &[u8]) -> Self {
        let mut row = Self::machine(message);
        row.size = Some(frame.len());
        row.raw = frame.to_vec();
        row
    }

    pub fn control(envelope: &Envelope) -> Self {
        let name = match envelope.wire_id() {
            WireId::Request(message) => message.name().to_string(),
            WireId::Reply(message) => format!("{message} reply"),
            WireId::Unknown(_) => "unknown".to_string(),
        };
        let json = envelope.to_json().unwrap_or_default();
        let mut row = Self::new(
            "control",
            name,
            serde_json::to_value(envelope).unwrap_or(Value::Null),
        );
        row.id = Some(envelope.id.to_string());
        row.size = Some(json.len());
        row.raw = json.into_bytes();
        row
    }

    pub fn inbound(item: &Inbound) -> Self {
        match item {
            Inbound::Machine(message) => Self::machine(message),
            Inbound::Control(envelope) => Self::control(envelope),
        }
    }

    pub fn diagnostic(diagnostic: &Diagnostic) -> Self {
        let severity = match diagnostic.severity() {
            Severity::Info => "info",
            Severity::Warn => "warn",
        };
        let mut detail = serde_json::json!({
            "severity": severity,
            "message": diagnostic.to_string(),
        });
        if let Some(text) = diagnostic.text() {
            detail["text"] = Value::from(text);
        }
        Self::new("diagnostic", diagnostic.kind(), detail)
    }

    pub fn opened(url: &str) -> Self {
        Self::new("open", "connection", serde_json::json!({ "url": url }))
    }

    pub fn closed(close: &CloseInfo) -> Self {
        Self::new(
            "closed",
            "connection",
            serde_json::json!({ "code": close.code, "reason": close.reason }),
        )
    }
}

pub fn print_row(row: &EventRow, format: OutputFormat) {
    print_rows(std::slice::from_ref(row), format);
}

pub fn print_rows(rows: &[EventRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for row in rows {
                println!(
                    "{}",
                    serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "NAME", "ID", "SIZE", "DETAIL"]);
            for row in rows {
                table.add_row(vec![
                    row.event.to_string(),
                    row.name.clone(),
                    row.id.clone().unwrap_or_default(),
                    row.size.map(|size| size.to_string()).unwrap_or_default(),
                    row.detail.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                let mut line = format!("event={} name={}", row.event, row.name);
                if let Some(id) = &row.id {
                    line.push_str(&format!(" id={id}"));
                }
                if let Some(size) = row.size {
                    line.push_str(&format!(" size={size}"));
                }
                println!("{line} detail={}", row.detail);
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                print_raw(&row.raw);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Lowercase hex without separators.
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Parse hex, ignoring whitespace, `:` and `,` separators and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<char> = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != ',')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text: String = pair.iter().collect();
            u8::from_str_radix(&text, 16).map_err(|_| format!("invalid hex byte: {text}"))
        })
        .collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
