//! Report module
//!
//! The typed metrics record persisted per sweep iteration and the CSV
//! report writer.

mod csv_writer;
pub mod record;
mod writer;

pub use csv_writer::CsvReportWriter;
pub use record::{METRIC_KEYS, MetricsRecord};
pub use writer::ReportWriter;
