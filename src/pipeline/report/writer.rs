use crate::pipeline::common::error::Result;
use crate::pipeline::report::record::MetricsRecord;

pub trait ReportWriter {
    fn write_record(&mut self, record: &MetricsRecord) -> Result<()>;
}
