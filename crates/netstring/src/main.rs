mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use netstring::{CodecConfig, MAXIMUM_LENGTH};

use crate::cmd::Command;
use crate::logging::{init_logging, LogArgs};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "netstring", version, about = "Netstring encoder and decoder")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Maximum value length in bytes, key byte included.
    #[arg(long, value_name = "BYTES", default_value_t = MAXIMUM_LENGTH, env = "NETSTRING_MAX_LENGTH", global = true)]
    max_length: usize,

    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            max_length: self.max_length,
            ..CodecConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = cli.codec_config();
    let result = cmd::run(cli.command, format, config);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
