//! Verbatim table exports: spreadsheet (xlsx), comma- and tab-separated text.

use crate::errors::{EvalError, Result};
use crate::model::{EvaluationRecord, EvaluationTable};
use crate::storage::schema::COLUMNS;
use chrono::SecondsFormat;
use rust_xlsxwriter::Workbook;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            other => Err(EvalError::config(format!(
                "invalid export format {:?} (expected xlsx, csv or tsv)",
                other
            ))),
        }
    }
}

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

fn text(v: &Option<String>) -> Cell<'_> {
    v.as_deref().map(Cell::Text).unwrap_or(Cell::Empty)
}

fn number(v: Option<f64>) -> Cell<'static> {
    v.map(Cell::Number).unwrap_or(Cell::Empty)
}

/// Cells of one record in [`COLUMNS`] order.
fn cells<'a>(r: &'a EvaluationRecord, timestamp: &'a str) -> [Cell<'a>; 10] {
    [
        Cell::Text(&r.statement),
        number(r.model_score),
        number(r.reviewer_score),
        text(&r.justification),
        Cell::Text(&r.award),
        text(&r.tier),
        text(&r.wing),
        text(&r.squadron),
        text(&r.reviewer_identity),
        Cell::Text(timestamp),
    ]
}

fn timestamp(r: &EvaluationRecord) -> String {
    r.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn export_table(table: &EvaluationTable, format: ExportFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Xlsx => to_xlsx(table)?,
        ExportFormat::Csv => to_delimited(table, b',')?,
        ExportFormat::Tsv => to_delimited(table, b'\t')?,
    };
    tracing::info!(event = "table_exported", format = %format, rows = table.len(), bytes = bytes.len());
    Ok(bytes)
}

fn to_delimited(table: &EvaluationTable, delimiter: u8) -> Result<Vec<u8>> {
    let err = |e: csv::Error| EvalError::Export(e.to_string());
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    wtr.write_record(COLUMNS).map_err(err)?;
    for r in table.iter() {
        let ts = timestamp(r);
        let row: Vec<String> = cells(r, &ts)
            .iter()
            .map(|c| match c {
                Cell::Text(s) => s.to_string(),
                Cell::Number(n) => n.to_string(),
                Cell::Empty => String::new(),
            })
            .collect();
        wtr.write_record(&row).map_err(err)?;
    }
    wtr.into_inner()
        .map_err(|e| EvalError::Export(e.error().to_string()))
}

fn to_xlsx(table: &EvaluationTable) -> Result<Vec<u8>> {
    let err = |e: rust_xlsxwriter::XlsxError| EvalError::Export(e.to_string());
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("evaluations").map_err(err)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).map_err(err)?;
    }
    for (i, r) in table.iter().enumerate() {
        let row = (i + 1) as u32;
        let ts = timestamp(r);
        for (col, cell) in cells(r, &ts).iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(row, col, *s).map_err(err)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row, col, *n).map_err(err)?;
                }
                Cell::Empty => {}
            }
        }
    }
    workbook.save_to_buffer().map_err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn table() -> EvaluationTable {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        EvaluationTable::from_records(vec![
            EvaluationRecord {
                position: 0,
                statement: "- Led 3 teams, delivered 40% faster reporting.".into(),
                model_score: Some(14.5),
                reviewer_score: None,
                justification: Some("line one\nline \"two\"".into()),
                award: "SIJAN".into(),
                tier: Some("NCO".into()),
                wing: None,
                squadron: Some("30 IS".into()),
                reviewer_identity: Some("msgt.doe".into()),
                timestamp: ts,
            },
            EvaluationRecord {
                position: 1,
                statement: "tab\there".into(),
                model_score: Some(9.0),
                reviewer_score: Some(10.0),
                justification: None,
                award: "ISR Tech".into(),
                tier: None,
                wing: None,
                squadron: None,
                reviewer_identity: None,
                timestamp: ts,
            },
        ])
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("tsv".parse::<ExportFormat>().unwrap(), ExportFormat::Tsv);
        assert!("json".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_header_and_values() {
        let out = String::from_utf8(export_table(&table(), ExportFormat::Csv).unwrap()).unwrap();
        let first_line = out.lines().next().unwrap();
        assert_eq!(first_line, COLUMNS.join(","));
        assert!(out.contains("\"- Led 3 teams, delivered 40% faster reporting.\",14.5,,"));
        assert!(out.contains("\"line one\nline \"\"two\"\"\""));
        assert!(out.contains("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn test_tsv_round_trips_through_reader() {
        let bytes = export_table(&table(), ExportFormat::Tsv).unwrap();
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(bytes.as_slice());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), COLUMNS.len());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "tab\there");
        assert_eq!(&rows[1][1], "9");
        assert_eq!(&rows[1][2], "10");
        assert_eq!(&rows[0][1], "14.5");
        assert_eq!(&rows[0][6], "");
    }

    #[test]
    fn test_xlsx_is_zip_container() {
        let bytes = export_table(&table(), ExportFormat::Xlsx).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_empty_table_exports_header_only() {
        let out = export_table(&EvaluationTable::new(), ExportFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
