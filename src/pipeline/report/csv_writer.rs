use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::pipeline::common::error::{BenchError, Result};
use crate::pipeline::report::record::{METRIC_KEYS, MetricsRecord};
use crate::pipeline::report::writer::ReportWriter;

/// Appends one comma-delimited row per record to a report file.
///
/// The header is written only when the file does not exist at the time of the
/// write, so re-running against an existing report never repeats it. There
/// is no locking: concurrent writers to one path are unsupported.
pub struct CsvReportWriter {
    path: PathBuf,
}

impl CsvReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, e: std::io::Error) -> BenchError {
        BenchError::ReportWriteError(format!("{}: {}", self.path.display(), e))
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_record(&mut self, record: &MetricsRecord) -> Result<()> {
        let file_exists = self.path.is_file();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;

        let mut text = String::new();
        if !file_exists {
            info!(path = %self.path.display(), "Creating report");
            text.push_str(&join_row(METRIC_KEYS.iter().map(|k| k.to_string())));
        }
        text.push_str(&join_row(record.cells().into_iter().map(Option::unwrap_or_default)));

        file.write_all(text.as_bytes()).map_err(|e| self.write_error(e))?;
        debug!(path = %self.path.display(), "Appended report row");
        Ok(())
    }
}

fn join_row(cells: impl Iterator<Item = String>) -> String {
    let mut row = cells.map(|cell| escape(&cell)).collect::<Vec<_>>().join(",");
    row.push_str("\r\n");
    row
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(compressor: &str, bound: f64) -> MetricsRecord {
        MetricsRecord {
            compressor: Some(compressor.to_string()),
            bound: Some(bound),
            compression_ratio: Some(3.5),
            psnr: Some(42.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_header_written_once_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");

        let mut first = CsvReportWriter::new(&path);
        first.write_record(&record("sz", 0.5)).unwrap();
        first.write_record(&record("sz", 1.0)).unwrap();
        let mut second = CsvReportWriter::new(&path);
        second.write_record(&record("zfp", 0.5)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "info:compressor,info:bound,size:compression_ratio,composite:compression_rate,error_stat:psnr,error_stat:rmse,error_stat:mse"
        );
        assert_eq!(lines[1], "sz,0.5,3.5,,42,,");
        assert_eq!(lines[2], "sz,1,3.5,,42,,");
        assert_eq!(lines[3], "zfp,0.5,3.5,,42,,");
        assert_eq!(contents.matches("info:compressor").count(), 1);
    }

    #[test]
    fn test_existing_file_gets_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "old,header\r\n").unwrap();

        CsvReportWriter::new(&path).write_record(&record("sz", 0.5)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "old,header\r\nsz,0.5,3.5,,42,,\r\n");
    }

    #[test]
    fn test_cells_are_quoted_when_needed() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_unwritable_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("stats.csv");

        let result = CsvReportWriter::new(&path).write_record(&record("sz", 0.5));

        assert!(matches!(result, Err(BenchError::ReportWriteError(_))));
    }
}
