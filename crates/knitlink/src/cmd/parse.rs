use std::io::Read;

use knitlink_control::parse;

use crate::cmd::ParseArgs;
use crate::exit::{control_error, io_error, CliResult, SUCCESS};
use crate::output::{print_row, EventRow, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let text = match args.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };

    let envelope = parse(text.trim()).map_err(|err| control_error("parse failed", err))?;
    print_row(&EventRow::control(&envelope), format);
    Ok(SUCCESS)
}
