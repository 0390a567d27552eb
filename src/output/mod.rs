//
//  schematics-cli
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output Module
//!
//! Everything `sch` prints to stdout goes through [`OutputWriter`], which
//! renders a value in one of three formats:
//!
//! - **Table**: `comfy_table` tables and key/value blocks for terminals
//! - **JSON**: the API representation, pretty-printed, for `jq` and scripts
//! - **YAML**: the same document as YAML
//!
//! Status messages (`write_success`, `write_warning`, ...) never go into the
//! structured output, so `sch job list --json | jq` keeps working when a
//! command also reports progress.
//!
//! ## Example
//!
//! ```rust,ignore
//! use schematics_cli::output::{OutputFormat, OutputWriter};
//!
//! let writer = OutputWriter::new(OutputFormat::Json);
//! writer.write_list(&workspaces.workspaces)?;
//! writer.write_success("Workspace deleted");
//! ```

mod serialize;
mod table;

pub use serialize::*;
pub use table::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// `true` for the machine-readable formats.
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Table)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => anyhow::bail!("Unknown output format '{}'. Use table, json or yaml", s),
        }
    }
}

/// Writes command results in the selected [`OutputFormat`].
pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: console::colors_enabled(),
        }
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Writes a single resource: its detail view, or the serialized value.
    pub fn write<T: Serialize + TableOutput>(&self, value: &T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => value.print_table(self.color),
            format => write_structured(format, value)?,
        }
        Ok(())
    }

    /// Writes a list of resources as one table with a row per item.
    pub fn write_list<T: Serialize + TableRow>(&self, values: &[T]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => {
                if values.is_empty() {
                    self.write_info("No results");
                    return Ok(());
                }
                TableBuilder::new()
                    .color(self.color)
                    .headers(T::headers())
                    .rows(values.iter().map(|v| v.row(self.color)))
                    .print();
            }
            format => write_structured(format, &values)?,
        }
        Ok(())
    }

    /// Writes an untyped document. Table output falls back to pretty JSON.
    pub fn write_value(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Yaml => write_yaml(value),
            _ => write_json(value),
        }
    }

    pub fn write_error(&self, msg: &str) {
        use console::style;
        if self.color {
            eprintln!("{} {}", style("error:").red().bold(), msg);
        } else {
            eprintln!("error: {}", msg);
        }
    }

    pub fn write_warning(&self, msg: &str) {
        use console::style;
        if self.color {
            eprintln!("{} {}", style("warning:").yellow().bold(), msg);
        } else {
            eprintln!("warning: {}", msg);
        }
    }

    /// Informational lines go to stderr when the output is structured.
    pub fn write_info(&self, msg: &str) {
        if self.format.is_structured() {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    }

    pub fn write_success(&self, msg: &str) {
        use console::style;
        let line = if self.color {
            format!("{} {}", style("✓").green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        };
        if self.format.is_structured() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Detail view of a single resource.
pub trait TableOutput {
    fn print_table(&self, color: bool);
}

/// One row in a list table.
pub trait TableRow {
    fn headers() -> Vec<&'static str>;

    fn row(&self, color: bool) -> Vec<String>;
}

pub fn print_header(text: &str) {
    use console::style;
    println!("{}", style(text).bold());
    println!("{}", "-".repeat(text.chars().count()));
}

pub fn print_field(key: &str, value: &str, color: bool) {
    use console::style;
    if color {
        println!("{:>14}: {}", style(key).dim(), value);
    } else {
        println!("{:>14}: {}", key, value);
    }
}

/// Prints a field only when it has a value.
pub fn print_optional(key: &str, value: Option<&str>, color: bool) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        print_field(key, value, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_structured_formats() {
        assert!(!OutputFormat::Table.is_structured());
        assert!(OutputFormat::Json.is_structured());
        assert!(OutputFormat::Yaml.is_structured());
    }
}
