pub mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use tidal_error::Result;

use crate::arrays::field::Schema;
use crate::execution::stream::BoxedBatchStream;

/// A source of batches that a scan reads from.
///
/// Sources push projections down, only producing the requested columns.
pub trait DataSource: Debug + Send + Sync {
    /// Short description of the source, used when explaining plans.
    fn name(&self) -> String;

    /// Schema of the full source, before any projection.
    fn schema(&self) -> Arc<Schema>;

    /// Scan the source, producing only the named columns in the requested
    /// order.
    ///
    /// An empty projection scans every column. Each call returns a fresh
    /// stream starting from the beginning of the source. Unknown column names
    /// error with `SchemaResolution`.
    fn scan(&self, projection: &[String]) -> Result<BoxedBatchStream>;
}
