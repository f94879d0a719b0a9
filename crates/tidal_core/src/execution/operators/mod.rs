//! Physical operators.
//!
//! Each operator describes how to produce a stream of batches from its
//! children. Executing an operator is cheap, nothing is read until the stream
//! is pulled.

pub mod hash_aggregate;
pub mod projection;
pub mod scan;
pub mod selection;

use std::fmt::Debug;
use std::sync::Arc;

use tidal_error::Result;

use super::stream::BoxedBatchStream;
use crate::arrays::field::Schema;
use crate::explain::explainable::Explainable;

pub trait ExecutionPlan: Debug + Send + Sync + Explainable {
    /// Schema of batches produced by this operator.
    fn schema(&self) -> Arc<Schema>;

    /// Create a new stream over this operator's output.
    fn execute(&self) -> Result<BoxedBatchStream>;

    /// Direct children of this operator.
    fn children(&self) -> Vec<Arc<dyn ExecutionPlan>>;
}
