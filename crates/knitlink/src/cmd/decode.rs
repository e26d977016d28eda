use std::fs::File;
use std::io::{self, Cursor, Read};

use knitlink_ayab::{decode_message, AyabError};
use knitlink_frame::{FrameConfig, FrameError, FrameReader};
use knitlink_session::Diagnostic;
use tracing::{debug, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{parse_hex, print_rows, EventRow, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = FrameConfig::default();
    if let Some(max) = args.max_payload {
        config.max_payload_size = max;
    }

    let source = open_input(&args)?;
    let source: Box<dyn Read> = match args.chunk_size {
        Some(0) => return Err(CliError::new(USAGE, "--chunk-size must be greater than zero")),
        Some(size) => Box::new(Chunked::new(source, size)),
        None => source,
    };

    let summary = decode_stream(FrameReader::with_config(source, config))
        .map_err(|err| frame_error("decode failed", err))?;
    if summary.pending > 0 {
        warn!(
            pending = summary.pending,
            "input ends inside a frame; trailing bytes ignored"
        );
    }
    print_rows(&summary.rows, format);

    if args.strict && summary.problems > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} malformed frame(s) in input", summary.problems),
        ));
    }
    Ok(SUCCESS)
}

struct DecodeSummary {
    rows: Vec<EventRow>,
    problems: usize,
    /// Bytes left in the decoder at end of input.
    pending: usize,
}

fn decode_stream<R: Read>(mut reader: FrameReader<R>) -> Result<DecodeSummary, FrameError> {
    let mut rows = Vec::new();
    let mut problems = 0usize;

    loop {
        let next = reader.read_frame();
        for violation in reader.decoder().take_violations() {
            problems += 1;
            rows.push(EventRow::diagnostic(&Diagnostic::FramingViolation(violation)));
        }

        let frame = match next {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(err),
        };
        match decode_message(&frame) {
            Ok(message) => rows.push(EventRow::frame(&message, &frame)),
            Err(AyabError::Truncated { tag, len, required }) => {
                problems += 1;
                rows.push(EventRow::diagnostic(&Diagnostic::MalformedFrame {
                    tag,
                    len,
                    required,
                }));
            }
            Err(err) => {
                problems += 1;
                warn!(error = %err, "frame skipped");
            }
        }
    }
    debug!(rows = rows.len(), problems, "decode finished");

    Ok(DecodeSummary {
        rows,
        problems,
        pending: reader.decoder().pending_len(),
    })
}

fn open_input(args: &DecodeArgs) -> CliResult<Box<dyn Read>> {
    if let Some(hex) = &args.hex {
        let bytes =
            parse_hex(hex).map_err(|err| CliError::new(USAGE, format!("--hex: {err}")))?;
        return Ok(Box::new(Cursor::new(bytes)));
    }

    match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(io::stdin())),
    }
}

/// Caps every read at `size` bytes, so captures replay as small arrivals.
struct Chunked<R> {
    inner: R,
    size: usize,
}

impl<R> Chunked<R> {
    fn new(inner: R, size: usize) -> Self {
        Self { inner, size }
    }
}

impl<R: Read> Read for Chunked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.size);
        self.inner.read(&mut buf[..len])
    }
}

#[cfg(test)]
mod tests {
    use knitlink_frame::encode_to_vec;

    use super::*;

    fn sample_stream() -> Vec<u8> {
        let mut wire = encode_to_vec(&[0x84, 0, 1, 0, 16, 0, 32, 2, 3, 1, 1, 5]).to_vec();
        wire.extend_from_slice(&encode_to_vec(&[0x84, 0x00]));
        wire.extend_from_slice(&encode_to_vec(&[0x7F]));
        wire
    }

    fn decode_chunked(wire: &[u8], size: usize) -> DecodeSummary {
        let source = Chunked::new(Cursor::new(wire.to_vec()), size);
        decode_stream(FrameReader::new(source)).unwrap()
    }

    fn names(rows: &[EventRow]) -> Vec<String> {
        rows.iter().map(|row| row.name.clone()).collect()
    }

    #[test]
    fn chunking_does_not_change_result() {
        let wire = sample_stream();
        let whole = decode_chunked(&wire, wire.len());
        let bytewise = decode_chunked(&wire, 1);

        assert_eq!(whole.problems, 1);
        assert_eq!(names(&whole.rows), vec!["indState", "malformed_frame", "unknown"]);
        assert_eq!(names(&whole.rows), names(&bytewise.rows));
        assert_eq!(
            whole.rows[1].detail["message"],
            "malformed frame (tag 0x84: 2 bytes, need 12)"
        );
    }

    #[test]
    fn violations_are_counted() {
        let summary = decode_chunked(&[0xC0, 0x84, 0xDB, 0x01, 0xC0], 2);

        assert_eq!(summary.problems, 1);
        assert_eq!(summary.rows[0].name, "framing_violation");
        assert_eq!(summary.pending, 0);
    }

    #[test]
    fn trailing_partial_frame_is_pending() {
        let summary = decode_chunked(&[0xC0, 0x84, 0x00], 8);
        assert!(summary.rows.is_empty());
        assert_eq!(summary.pending, 2);
    }

    #[test]
    fn chunked_reader_caps_reads() {
        let mut source = Chunked::new(Cursor::new(vec![1u8, 2, 3, 4, 5]), 2);
        let mut buf = [0u8; 8];
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(source.read(&mut buf).unwrap(), 1);
    }
}
