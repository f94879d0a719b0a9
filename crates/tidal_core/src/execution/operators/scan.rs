use std::sync::Arc;

use tidal_error::Result;
use tracing::trace;

use super::ExecutionPlan;
use crate::arrays::field::Schema;
use crate::datasource::DataSource;
use crate::execution::stream::BoxedBatchStream;
use crate::explain::explainable::{ExplainEntry, Explainable};

/// Reads batches from a data source.
///
/// The projection is pushed down into the source.
#[derive(Debug)]
pub struct ScanExec {
    source: Arc<dyn DataSource>,
    projection: Vec<String>,
    schema: Arc<Schema>,
}

impl ScanExec {
    /// Errors with `SchemaResolution` if the projection names a column the
    /// source doesn't have. An empty projection scans everything.
    pub fn try_new(source: Arc<dyn DataSource>, projection: Vec<String>) -> Result<Self> {
        let (schema, _) = source.schema().try_select(&projection)?;
        Ok(ScanExec {
            source,
            projection,
            schema: Arc::new(schema),
        })
    }
}

impl ExecutionPlan for ScanExec {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn execute(&self) -> Result<BoxedBatchStream> {
        trace!(source = %self.source.name(), projection = ?self.projection, "executing scan");
        self.source.scan(&self.projection)
    }

    fn children(&self) -> Vec<Arc<dyn ExecutionPlan>> {
        Vec::new()
    }
}

impl Explainable for ScanExec {
    fn explain_entry(&self) -> ExplainEntry {
        let ent = ExplainEntry::new("Scan").with_value("source", self.source.name());
        if self.projection.is_empty() {
            return ent;
        }
        ent.with_values("projection", &self.projection)
    }
}

#[cfg(test)]
mod tests {
    use tidal_error::ErrorKind;

    use super::*;
    use crate::arrays::testutil::assert_batches_eq;
    use crate::datasource::memory::MemoryDataSource;
    use crate::execution::stream::collect_stream;
    use crate::generate_batch;

    fn source() -> Arc<dyn DataSource> {
        let batch = generate_batch!(("a", [1, 2, 3]), ("b", ["x", "y", "z"]));
        Arc::new(MemoryDataSource::try_from_batches([batch]).unwrap())
    }

    #[test]
    fn scan_projected() {
        let scan = ScanExec::try_new(source(), vec!["b".to_string()]).unwrap();
        assert_eq!(1, scan.schema().len());

        let batches = collect_stream(scan.execute().unwrap()).unwrap();
        let expected = generate_batch!(("b", ["x", "y", "z"]));
        assert_batches_eq(&expected, &batches[0]);
    }

    #[test]
    fn scan_unknown_column() {
        let err = ScanExec::try_new(source(), vec!["c".to_string()]).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }

    #[test]
    fn explain() {
        let scan = ScanExec::try_new(source(), vec!["b".to_string()]).unwrap();
        let ent = scan.explain_entry();
        assert_eq!("Scan (projection = [b], source = memory)", ent.to_string());
    }
}
