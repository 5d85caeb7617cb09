use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use netstring::{Bytes, Key};
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

/// One decoded netstring, numbered from zero in stream order.
#[derive(Debug)]
pub struct Decoded {
    pub index: usize,
    pub key: Option<Key>,
    pub value: Bytes,
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    index: usize,
    key: Option<String>,
    length: usize,
    value: &'a str,
    binary: bool,
}

/// Prints decoded netstrings as they arrive. Tables are buffered until [`Printer::finish`].
pub struct Printer {
    format: OutputFormat,
    keyed: bool,
    table: Option<Table>,
}

impl Printer {
    pub fn new(format: OutputFormat, keyed: bool) -> Self {
        let table = matches!(format, OutputFormat::Table).then(|| {
            let mut table = Table::new();
            let header = if keyed {
                vec!["#", "KEY", "LENGTH", "VALUE"]
            } else {
                vec!["#", "LENGTH", "VALUE"]
            };
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header);
            table
        });
        Self {
            format,
            keyed,
            table,
        }
    }

    pub fn push(&mut self, decoded: &Decoded) {
        let (text, binary) = preview(&decoded.value);
        match self.format {
            OutputFormat::Json => {
                let out = DecodedOutput {
                    index: decoded.index,
                    key: decoded.key.map(|key| key.to_string()),
                    length: decoded.value.len(),
                    value: &text,
                    binary,
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Table => {
                if let Some(table) = &mut self.table {
                    let mut row = vec![decoded.index.to_string()];
                    if self.keyed {
                        row.push(key_label(decoded.key));
                    }
                    row.push(decoded.value.len().to_string());
                    row.push(text);
                    table.add_row(row);
                }
            }
            OutputFormat::Pretty => match decoded.key {
                Some(key) => println!(
                    "#{} key={} length={} value={}",
                    decoded.index,
                    key,
                    decoded.value.len(),
                    text
                ),
                None => println!(
                    "#{} length={} value={}",
                    decoded.index,
                    decoded.value.len(),
                    text
                ),
            },
            OutputFormat::Raw => print_raw(&decoded.value),
        }
    }

    pub fn finish(self) {
        if let Some(table) = self.table {
            println!("{table}");
        }
    }
}

/// Write `data` to stdout followed by a newline.
pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn key_label(key: Option<Key>) -> String {
    key.map(|key| key.to_string()).unwrap_or_default()
}

fn preview(value: &[u8]) -> (String, bool) {
    match std::str::from_utf8(value) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (format!("<binary {} bytes>", value.len()), true),
    }
}
