/*!
Output formats for `show`.

Variants:
  tabular (default; summary table, YAML otherwise)
  yaml
  json

Helpers:
  - serialize()      : value -> bytes for the generic formats
  - write_output()   : bytes -> stdout or file, newline terminated
*/

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Output format selected with `--format`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum OutputFormat {
    /// Human readable summary (falls back to YAML outside summary mode)
    #[default]
    Tabular,
    /// YAML document
    Yaml,
    /// Compact JSON
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Tabular => "tabular",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        };
        f.write_str(s)
    }
}

/// Serialize a value with one of the generic encoders. `Tabular` means YAML here.
pub fn serialize<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => serde_json::to_vec(value).context("cannot encode JSON output"),
        OutputFormat::Yaml | OutputFormat::Tabular => serde_yaml::to_string(value)
            .map(String::into_bytes)
            .context("cannot encode YAML output"),
    }
}

/// Write fully rendered output; adds the trailing newline if missing.
pub fn write_output(mut bytes: Vec<u8>, dest: Option<&Path>) -> Result<()> {
    if !bytes.is_empty() && bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    match dest {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("cannot write output to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("cannot write output")?;
            stdout.flush().context("cannot write output")
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */
