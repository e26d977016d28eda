use knitlink_ayab::{encode_message, AyabMessage};
use knitlink_frame::{encode_to_vec, FrameConfig, FrameWriter};
use serde::Serialize;

use crate::cmd::EncodeArgs;
use crate::exit::{ayab_error, frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{parse_hex, to_hex, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    payload: String,
    frame: String,
    payload_size: usize,
    frame_size: usize,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = match &args.hex {
        Some(hex) => parse_hex(hex).map_err(|err| CliError::new(USAGE, format!("--hex: {err}")))?,
        None => encode_message(&AyabMessage::RequestInfo)
            .map_err(|err| ayab_error("encode failed", err))?
            .to_vec(),
    };

    let max = FrameConfig::default().max_payload_size;
    if payload.len() > max {
        return Err(CliError::new(
            DATA_INVALID,
            format!("payload too large ({} bytes, max {max})", payload.len()),
        ));
    }
    let frame = encode_to_vec(&payload);

    match format {
        OutputFormat::Raw => FrameWriter::new(std::io::stdout().lock())
            .send(&payload)
            .map_err(|err| frame_error("write failed", err))?,
        OutputFormat::Json => {
            let out = EncodeOutput {
                payload: to_hex(&payload),
                frame: to_hex(&frame),
                payload_size: payload.len(),
                frame_size: frame.len(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", to_hex(&frame)),
    }

    Ok(SUCCESS)
}
