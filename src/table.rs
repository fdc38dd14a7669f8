// src/table.rs
//! Console and JSON rendering of a sprint report

use anyhow::{Context, Result};

use crate::board::ResultRow;
use crate::points::SprintReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

const HEADERS: [&str; 3] = ["(index)", "labelName", "points"];

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(mid.to_string().as_str()), right)
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let fill = width.saturating_sub(cell.chars().count());
            format!(" {}{} ", cell, " ".repeat(fill))
        })
        .collect();
    format!("│{}│", padded.join("│"))
}

/// Boxed table with one line per row, in the order given.
pub fn render_table(rows: &[ResultRow]) -> String {
    let body: Vec<[String; 3]> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| [i.to_string(), row.label_name.clone(), row.points.to_string()])
        .collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = vec![
        border(&widths, '┌', '┬', '┐'),
        line(&headers, &widths),
        border(&widths, '├', '┼', '┤'),
    ];
    for cells in &body {
        out.push(line(cells, &widths));
    }
    out.push(border(&widths, '└', '┴', '┘'));
    out.join("\n")
}

pub fn render_json(report: &SprintReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize sprint report")
}
