use std::sync::Arc;

use tidal_error::Result;
use tracing::debug;

use crate::arrays::batch::Batch;
use crate::config::ExecutionConfig;
use crate::datasource::DataSource;
use crate::datasource::memory::MemoryDataSource;
use crate::execution::operators::ExecutionPlan;
use crate::execution::stream::{BoxedBatchStream, collect_stream};
use crate::logical::dataframe::DataFrame;
use crate::planner::QueryPlanner;

/// Entry point for building and running queries.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    config: ExecutionConfig,
    planner: QueryPlanner,
}

impl ExecutionContext {
    pub fn try_new(config: ExecutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(ExecutionContext {
            config,
            planner: QueryPlanner::new(),
        })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Start a query over a data source.
    pub fn read_source(&self, source: Arc<dyn DataSource>) -> DataFrame {
        DataFrame::scan(source)
    }

    /// Start a query over in-memory batches, re-chunked to the configured
    /// batch size.
    pub fn read_batches(&self, batches: impl IntoIterator<Item = Batch>) -> Result<DataFrame> {
        let source =
            MemoryDataSource::try_from_batches(batches)?.with_batch_size(self.config.batch_size)?;
        Ok(self.read_source(Arc::new(source)))
    }

    pub fn create_physical_plan(&self, df: &DataFrame) -> Result<Arc<dyn ExecutionPlan>> {
        self.planner.create_physical_plan(df.logical_plan())
    }

    pub fn execute(&self, df: &DataFrame) -> Result<BoxedBatchStream> {
        let plan = self.create_physical_plan(df)?;
        plan.execute()
    }

    /// Execute and pull every output batch.
    pub fn collect(&self, df: &DataFrame) -> Result<Vec<Batch>> {
        let batches = collect_stream(self.execute(df)?)?;
        debug!(num_batches = batches.len(), "collected query output");
        Ok(batches)
    }
}
