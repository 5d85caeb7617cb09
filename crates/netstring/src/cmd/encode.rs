use std::fs;
use std::io::{self, Read};

use netstring::{CodecConfig, Encoder, Key};
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{codec_error, io_error, CliResult, SUCCESS};

pub fn run(args: EncodeArgs, config: CodecConfig) -> CliResult<i32> {
    let values = resolve_values(&args)?;
    let key = args.key.unwrap_or(Key::NONE);

    let stdout = io::stdout();
    let mut enc = Encoder::with_config(stdout.lock(), config);
    for value in &values {
        enc.encode_bytes(key, &[value.as_slice()])
            .map_err(|err| codec_error("encode failed", err))?;
    }
    if let Some(eom) = args.eom {
        enc.encode_bytes(eom, &[])
            .map_err(|err| codec_error("encode failed", err))?;
    }
    enc.flush().map_err(|err| codec_error("flush failed", err))?;

    debug!(count = values.len(), %key, "encoded values");
    Ok(SUCCESS)
}

fn resolve_values(args: &EncodeArgs) -> CliResult<Vec<Vec<u8>>> {
    if let Some(path) = &args.file {
        let value = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), &err))?;
        return Ok(vec![value]);
    }
    if !args.values.is_empty() {
        return Ok(args.values.iter().map(|v| v.as_bytes().to_vec()).collect());
    }

    let mut value = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut value)
        .map_err(|err| io_error("failed reading stdin", &err))?;
    Ok(vec![value])
}
