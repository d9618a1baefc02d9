//! Output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::error::Result;
use serde::Serialize;

/// Helper for formatting and printing output.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Render a serializable value in the configured format.
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Toml => toml::to_string_pretty(value)?,
        })
    }

    /// Print a serializable value in the configured format.
    pub fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.format(value)?);
        Ok(())
    }

    /// Print raw text (not serialized).
    pub fn print_raw(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a status line to stderr unless quiet.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> BTreeMap<&'static str, Vec<&'static str>> {
        BTreeMap::from([("links", vec!["/a", "/b"])])
    }

    #[test]
    fn test_formats() {
        let json = Output::new(OutputFormat::Json, false).format(&sample()).unwrap();
        assert!(json.contains("\"links\": ["));

        let yaml = Output::new(OutputFormat::Yaml, false).format(&sample()).unwrap();
        assert_eq!(yaml, "links:\n- /a\n- /b\n");

        let toml = Output::new(OutputFormat::Toml, true).format(&sample()).unwrap();
        assert!(toml.contains("links = ["));
    }
}
