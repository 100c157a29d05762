//! Table formatting for list commands
//!
//! Rows are built from typed cells so that each output format can render them
//! its own way: styled and aligned for terminals, escaped for CSV and Markdown.

use console::style;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Row key (activity name, slot time), cyan in tables
    Key(String),
    /// Plain text, truncated to the column width
    Text(String),
    Number(i64),
    /// Yes/no flag
    Flag(bool),
    /// Places left out of a capacity, coloured by how full the slot is
    Places { remaining: u32, capacity: u32 },
    /// Slot status word (open, full, past)
    Status(String),
    Empty,
}

impl CellValue {
    /// Aligned, styled rendering
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Key(k) => format!("{:<width$}", style(truncate_str(k, width)).cyan()),
            CellValue::Text(s) => format!("{:<width$}", truncate_str(s, width)),
            CellValue::Number(n) => format!("{n:>width$}"),
            CellValue::Flag(b) => {
                let styled = if *b { style("yes").yellow() } else { style("no").dim() };
                format!("{styled:<width$}")
            }
            CellValue::Places {
                remaining,
                capacity,
            } => {
                let text = format!("{remaining}/{capacity}");
                let styled = if *remaining == 0 {
                    style(text).red()
                } else if remaining * 4 <= *capacity {
                    style(text).yellow()
                } else {
                    style(text).green()
                };
                format!("{styled:>width$}")
            }
            CellValue::Status(s) => {
                let styled = match s.as_str() {
                    "open" => style(s).green(),
                    "full" => style(s).red(),
                    _ => style(s).dim(),
                };
                format!("{styled:<width$}")
            }
            CellValue::Empty => format!("{:<width$}", "-"),
        }
    }

    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Places { remaining, .. } => remaining.to_string(),
            CellValue::Empty => String::new(),
            other => escape_csv(&other.raw()),
        }
    }

    pub fn format_md(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            other => other.raw().replace('|', "\\|"),
        }
    }

    /// Unstyled value
    pub fn raw(&self) -> String {
        match self {
            CellValue::Key(s) | CellValue::Text(s) | CellValue::Status(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            CellValue::Places {
                remaining,
                capacity,
            } => format!("{remaining}/{capacity}"),
            CellValue::Empty => String::new(),
        }
    }

    fn display_width(&self) -> usize {
        self.raw().chars().count().max(1)
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

#[derive(Debug, Default)]
pub struct TableRow {
    cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Outputs rows in the tabular formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_summary = !quiet;
        self
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => self.output_md(rows),
            OutputFormat::Id => self.output_ids(rows),
            _ => self.output_tsv(rows),
        }
    }

    /// Header or widest content, capped at the column's width
    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content).min(col.width)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.widths(rows);

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$}", style(col.header).bold(), w = *w))
            .collect();
        println!("{}", header.join("  "));
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total));

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| {
                    row.get(col.key)
                        .unwrap_or(&CellValue::Empty)
                        .format_tsv(*w)
                })
                .collect();
            println!("{}", parts.join("  ").trim_end());
        }

        if self.show_summary {
            println!();
            println!("{} {}(s)", style(rows.len()).cyan(), self.noun);
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        println!("{}", header.join(","));
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| row.get(c.key).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            println!("{}", cells.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let header: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        println!("| {} |", header.join(" | "));
        println!("|{}", "---|".repeat(self.columns.len()));
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| row.get(c.key).map(CellValue::format_md).unwrap_or_else(|| "-".into()))
                .collect();
            println!("| {} |", cells.join(" | "));
        }
    }

    /// First column only
    fn output_ids(&self, rows: &[TableRow]) {
        let Some(first) = self.columns.first() else {
            return;
        };
        for row in rows {
            if let Some(value) = row.get(first.key) {
                println!("{}", value.raw());
            }
        }
    }
}
