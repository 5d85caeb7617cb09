use std::fs::File;
use std::io::{self, Read};

use netstring::{CodecConfig, Decoder};
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{decode_error, io_error, CliResult, SUCCESS};
use crate::output::{Decoded, OutputFormat, Printer};

pub fn run(args: DecodeArgs, format: OutputFormat, config: CodecConfig) -> CliResult<i32> {
    let source: Box<dyn Read> = match &args.path {
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), &err))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let mut dec = Decoder::with_config(source, config);
    let mut printer = Printer::new(format, args.keyed);
    let result = decode_all(&mut dec, &args, &mut printer);
    printer.finish();
    result
}

fn decode_all<R: Read>(
    dec: &mut Decoder<R>,
    args: &DecodeArgs,
    printer: &mut Printer,
) -> CliResult<i32> {
    let mut index = 0usize;
    while args.count.map_or(true, |count| index < count) {
        let next = if args.keyed {
            dec.decode_keyed().map(|(key, value)| (Some(key), value))
        } else {
            dec.decode().map(|value| (None, value))
        };

        let (key, value) = match next {
            Ok(next) => next,
            Err(err) if err.is_end_of_stream() && !dec.is_mid_netstring() => break,
            Err(err) => return Err(decode_error(index, err, dec.is_mid_netstring())),
        };

        printer.push(&Decoded { index, key, value });
        index += 1;
    }

    debug!(count = index, "decoded netstrings");
    Ok(SUCCESS)
}
