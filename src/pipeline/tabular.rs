//! Tabular ingestion: CSV and XLSX uploads → [`DataTable`] → prompt text.
//!
//! Both formats are read fully from memory. The first row is the header.
//! The rendering is a fixed-width text grid with a row-index column, the
//! layout models already read well from dataframe printouts.

use crate::error::ChatError;
use crate::pipeline::input::TabularFormat;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::fmt::Write as _;
use std::io::Cursor;
use tracing::{debug, info};

/// Placeholder for an empty cell.
const MISSING: &str = "NaN";

/// A parsed table: header plus rows of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// `(rows, columns)`, header excluded from the row count.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    /// Render the whole table.
    pub fn render(&self) -> String {
        self.render_rows(self.rows.len())
    }

    /// Render only the first `n` rows.
    pub fn head(&self, n: usize) -> String {
        self.render_rows(n.min(self.rows.len()))
    }

    fn render_rows(&self, n: usize) -> String {
        if n == 0 {
            return format!(
                "Empty table\nColumns: [{}]\nIndex: []",
                self.headers.join(", ")
            );
        }

        let rows = &self.rows[..n];
        let index_width = (n - 1).to_string().len();
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                rows.iter()
                    .map(|row| row.get(col).map_or(0, |cell| width(cell)))
                    .chain(std::iter::once(width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (header, w) in self.headers.iter().zip(&widths) {
            out.push_str("  ");
            push_right_aligned(&mut out, header, *w);
        }
        for (idx, row) in rows.iter().enumerate() {
            out.push('\n');
            let _ = write!(out, "{idx:<index_width$}");
            for (cell, w) in row.iter().zip(&widths) {
                out.push_str("  ");
                push_right_aligned(&mut out, cell, *w);
            }
        }
        out
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn push_right_aligned(out: &mut String, s: &str, w: usize) {
    out.push_str(&" ".repeat(w.saturating_sub(width(s))));
    out.push_str(s);
}

/// Parse an upload in the given format.
pub fn parse_table(format: TabularFormat, bytes: &[u8]) -> Result<DataTable, ChatError> {
    let table = match format {
        TabularFormat::Csv => parse_csv(bytes),
        TabularFormat::Xlsx => parse_xlsx(bytes),
    }
    .map_err(|detail| ChatError::TabularParse {
        format: format.label().to_string(),
        detail,
    })?;

    let (rows, cols) = table.shape();
    info!("Parsed {} table: {} rows × {} columns", format.label(), rows, cols);
    Ok(table)
}

fn parse_csv(bytes: &[u8]) -> Result<DataTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err("No columns to parse from file".to_string());
    }
    let headers = name_columns(headers.iter().map(str::to_string));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(cell_text).collect());
    }

    debug!("CSV: {} header fields, {} records", headers.len(), rows.len());
    Ok(DataTable { headers, rows })
}

fn parse_xlsx(bytes: &[u8]) -> Result<DataTable, String> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e: calamine::XlsxError| e.to_string())?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "Workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut sheet_rows = range.rows();
    let header_row = sheet_rows
        .next()
        .ok_or_else(|| "No columns to parse from file".to_string())?;
    let headers = name_columns(header_row.iter().map(data_text));

    let rows: Vec<Vec<String>> = sheet_rows
        .map(|row| row.iter().map(|d| cell_text(&data_text(d))).collect())
        .collect();

    debug!("XLSX: {} header fields, {} rows", headers.len(), rows.len());
    Ok(DataTable { headers, rows })
}

fn data_text(d: &Data) -> String {
    match d {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_text(s: &str) -> String {
    if s.trim().is_empty() {
        MISSING.to_string()
    } else {
        s.to_string()
    }
}

/// Blank header cells become `Unnamed: <index>`.
fn name_columns(headers: impl Iterator<Item = String>) -> Vec<String> {
    headers
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h
            }
        })
        .collect()
}
