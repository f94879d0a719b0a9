use tidal_error::{DbError, ErrorKind, Result};

/// Default number of rows per batch produced by sources.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Configuration for executing queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Maximum number of rows in batches produced by data sources.
    pub batch_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ExecutionConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        self.batch_size = batch_size;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Batch size must be greater than zero",
            ));
        }
        Ok(())
    }
}
