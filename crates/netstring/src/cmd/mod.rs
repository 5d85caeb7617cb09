use clap::{Args, Subcommand};
use std::path::PathBuf;

use netstring::{CodecConfig, Key};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode values as netstrings on stdout.
    Encode(EncodeArgs),
    /// Decode netstrings and print them.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: CodecConfig) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, config),
        Command::Decode(args) => decode::run(args, format, config),
        Command::Version(args) => version::run(args),
    }
}

/// Parse a key argument: a single ASCII letter.
pub fn parse_key(input: &str) -> Result<Key, String> {
    match input.as_bytes() {
        &[byte] if byte.is_ascii_alphabetic() => Ok(Key::new(byte)),
        _ => Err(format!("key must be a single ASCII letter, got {input:?}")),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Values to encode, one netstring each. Reads stdin as one value when none are given.
    #[arg(conflicts_with = "file")]
    pub values: Vec<String>,
    /// Key prefixed to every value.
    #[arg(long, short = 'k', value_parser = parse_key)]
    pub key: Option<Key>,
    /// Append an empty end-of-message netstring with this key.
    #[arg(long, value_parser = parse_key)]
    pub eom: Option<Key>,
    /// Encode the contents of a file as one value.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File to decode. Reads stdin when omitted.
    pub path: Option<PathBuf>,
    /// Treat the first byte of each value as its key.
    #[arg(long)]
    pub keyed: bool,
    /// Exit after decoding N netstrings.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
