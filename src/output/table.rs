//
//  schematics-cli
//  output/table.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Table Formatting
//!
//! `comfy_table` helpers for list output, plus colouring of the status
//! codes Schematics returns for jobs, workspaces, actions and agents.
//!
//! ```rust,no_run
//! use schematics_cli::output::{format_status, TableBuilder};
//!
//! TableBuilder::new()
//!     .headers(["ID", "STATUS"])
//!     .row(["us-south.JOB.abc", &format_status("job_finished", true)])
//!     .print();
//! ```

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub struct TableBuilder {
    table: Table,
    color: bool,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            table: create_table(),
            color: console::colors_enabled(),
        }
    }

    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| {
                let cell = Cell::new(h.into());
                if self.color {
                    cell.fg(Color::Cyan)
                } else {
                    cell
                }
            })
            .collect();
        self.table.set_header(cells);
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        self.table.add_row(row);
        self
    }

    pub fn rows<I, R, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for row in rows {
            let row: Vec<String> = row.into_iter().map(Into::into).collect();
            self.table.add_row(row);
        }
        self
    }

    pub fn print(self) {
        println!("{}", self.table);
    }

    pub fn build(self) -> Table {
        self.table
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Colours a status code by how it reads: green for success, red for
/// failure, yellow for work in progress.
///
/// Job codes (`job_finished`), workspace states (`ACTIVE`, `FAILED`) and
/// action/agent states (`normal`, `in_progress`) are all recognised.
pub fn format_status(status: &str, color: bool) -> String {
    if !color || status.is_empty() {
        return status.to_string();
    }

    use console::style;
    let lower = status.to_lowercase();
    match lower.as_str() {
        "job_finished" | "active" | "normal" | "ok" | "success" | "connected" => {
            style(status).green().to_string()
        }
        "job_failed" | "failed" | "error" | "critical" | "disconnected" => {
            style(status).red().to_string()
        }
        "job_cancelled" | "job_stopped" | "stopped" | "locked" | "frozen" => {
            style(status).magenta().to_string()
        }
        "job_pending" | "job_in_progress" | "job_queued" | "job_ready_to_execute" | "pending"
        | "in_progress" | "inprogress" | "inactive" | "draft" | "connecting" => {
            style(status).yellow().to_string()
        }
        _ => status.to_string(),
    }
}

pub fn format_bool(value: bool, color: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    if !color {
        return text.to_string();
    }

    use console::style;
    if value {
        style(text).green().to_string()
    } else {
        style(text).dim().to_string()
    }
}

/// `-` for missing cells.
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status_without_color() {
        assert_eq!(format_status("job_failed", false), "job_failed");
        assert_eq!(format_status("ACTIVE", false), "ACTIVE");
    }

    #[test]
    fn test_format_status_with_color_keeps_text() {
        let styled = format_status("job_finished", true);
        assert!(styled.contains("job_finished"));
        assert_eq!(format_status("", true), "");
    }

    #[test]
    fn test_format_bool() {
        assert_eq!(format_bool(true, false), "Yes");
        assert_eq!(format_bool(false, false), "No");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("eu-de")), "eu-de");
    }

    #[test]
    fn test_builder_renders_rows() {
        let table = TableBuilder::new()
            .color(false)
            .headers(["ID", "NAME"])
            .row(["ws-1", "network"])
            .rows(vec![vec!["ws-2", "cluster"]])
            .build();
        let rendered = table.to_string();
        assert!(rendered.contains("network"));
        assert!(rendered.contains("cluster"));
    }
}
