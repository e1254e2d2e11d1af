// Report model and output dispatch

use crate::config::DATETIME_FORMAT;
use crate::error::Result;
use chrono::{DateTime, Local};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Rows of display strings under a fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn all_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        std::iter::once(&self.header).chain(self.rows.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One line per row, cells separated by spaces.
    Plain,
    Pretty,
    File,
}

impl OutputMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Some(OutputMode::Plain),
            "pretty" => Some(OutputMode::Pretty),
            "file" => Some(OutputMode::File),
            _ => None,
        }
    }
}

pub fn render_plain(report: &Report) -> String {
    let mut out = String::new();
    for row in report.all_rows() {
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

pub fn render_pretty(report: &Report) -> String {
    let columns = report.all_rows().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in report.all_rows() {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let divider = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };

    let format_row = |row: &[String], bold: bool| {
        let mut line = String::from("|");
        for (idx, width) in widths.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            let padded = format!("{:<width$}", cell, width = width);
            if bold {
                line.push_str(&format!(" {} |", padded.as_str().bold()));
            } else {
                line.push_str(&format!(" {} |", padded));
            }
        }
        line.push('\n');
        line
    };

    let mut table = String::new();
    table.push_str(&divider);
    table.push_str(&format_row(report.header(), true));
    table.push_str(&divider);
    for row in report.rows() {
        table.push_str(&format_row(row, false));
    }
    table.push_str(&divider);
    table
}

pub fn results_file_name(mode_name: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.csv", mode_name, now.format(DATETIME_FORMAT))
}

pub fn write_csv(report: &Report, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    for row in report.all_rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the report as CSV under `results_dir`, named after the mode and the current time.
pub fn save_report(report: &Report, mode_name: &str, results_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(results_dir)?;
    let path = results_dir.join(results_file_name(mode_name, Local::now()));
    write_csv(report, &path)?;
    info!(path = %path.display(), "Results saved");
    Ok(path)
}

/// Send a report to the console or to a results file.
///
/// Returns the file path when one was written.
pub fn control_output(
    report: &Report,
    output: OutputMode,
    mode_name: &str,
    results_dir: &Path,
) -> Result<Option<PathBuf>> {
    match output {
        OutputMode::Plain => {
            print!("{}", render_plain(report));
            Ok(None)
        }
        OutputMode::Pretty => {
            print!("{}", render_pretty(report));
            Ok(None)
        }
        OutputMode::File => save_report(report, mode_name, results_dir).map(Some),
    }
}
