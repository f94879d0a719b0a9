use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::DataSource;
use crate::arrays::batch::Batch;
use crate::arrays::field::Schema;
use crate::config::DEFAULT_BATCH_SIZE;
use crate::execution::stream::{BatchStream, BoxedBatchStream};

/// A data source over batches already in memory.
///
/// Batches larger than the configured batch size are split when scanned.
#[derive(Debug, Clone)]
pub struct MemoryDataSource {
    schema: Arc<Schema>,
    batches: Arc<[Batch]>,
    batch_size: usize,
}

impl MemoryDataSource {
    /// Create a new source, checking that every batch matches the schema.
    pub fn try_new(schema: Arc<Schema>, batches: impl IntoIterator<Item = Batch>) -> Result<Self> {
        let batches: Vec<_> = batches.into_iter().collect();
        for (idx, batch) in batches.iter().enumerate() {
            if batch.schema().as_ref() != schema.as_ref() {
                return Err(DbError::with_kind(
                    ErrorKind::InvariantViolation,
                    "Batch schema does not match source schema",
                )
                .with_field("batch", idx)
                .with_field("expected", schema.as_ref())
                .with_field("got", batch.schema().as_ref()));
            }
        }

        Ok(MemoryDataSource {
            schema,
            batches: batches.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Create a source from batches, taking the schema from the first batch.
    pub fn try_from_batches(batches: impl IntoIterator<Item = Batch>) -> Result<Self> {
        let batches: Vec<_> = batches.into_iter().collect();
        let schema = match batches.first() {
            Some(batch) => batch.schema().clone(),
            None => {
                return Err(DbError::with_kind(
                    ErrorKind::InvariantViolation,
                    "Cannot infer schema without any batches",
                ));
            }
        };
        Self::try_new(schema, batches)
    }

    /// Set the maximum number of rows per scanned batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Batch size must be greater than zero",
            ));
        }
        self.batch_size = batch_size;
        Ok(self)
    }
}

impl DataSource for MemoryDataSource {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn scan(&self, projection: &[String]) -> Result<BoxedBatchStream> {
        let (schema, indices) = self.schema.try_select(projection)?;
        Ok(Box::new(MemoryStream {
            schema: Arc::new(schema),
            indices,
            batches: self.batches.clone(),
            batch_size: self.batch_size,
            next_batch: 0,
            current: None,
        }))
    }
}

#[derive(Debug)]
struct MemoryStream {
    schema: Arc<Schema>,
    indices: Vec<usize>,
    batches: Arc<[Batch]>,
    batch_size: usize,
    /// Index of the next batch to pull from `batches`.
    next_batch: usize,
    /// Projected batch currently being split along with the row offset.
    current: Option<(Batch, usize)>,
}

impl BatchStream for MemoryStream {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn poll_next(&mut self) -> Result<Option<Batch>> {
        loop {
            if let Some((batch, offset)) = &mut self.current {
                let remaining = batch.num_rows() - *offset;
                if remaining > 0 {
                    let count = remaining.min(self.batch_size);
                    let out = batch.slice(*offset, count)?;
                    *offset += count;
                    return Ok(Some(out));
                }
                self.current = None;
            }

            let batch = match self.batches.get(self.next_batch) {
                Some(batch) => batch,
                None => return Ok(None),
            };
            self.next_batch += 1;

            let projected = Batch::try_new(
                self.schema.clone(),
                self.indices
                    .iter()
                    .map(|&idx| batch.get_column(idx).cloned())
                    .collect::<Result<Vec<_>>>()?,
            )?;

            if projected.num_rows() == 0 {
                return Ok(Some(projected));
            }
            self.current = Some((projected, 0));
        }
    }

    fn close(&mut self) {
        self.current = None;
        self.next_batch = self.batches.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;
    use crate::arrays::testutil::{assert_arrays_eq, assert_batches_eq};
    use crate::execution::stream::collect_stream;
    use crate::generate_batch;

    fn source() -> MemoryDataSource {
        let batch = generate_batch!(
            ("model", ["Mazda RX4", "Datsun 710", "Hornet 4 Drive", "Valiant", "Duster 360"]),
            ("mpg", [21.0, 22.8, 21.4, 18.1, 14.3]),
            ("cyl", [6, 4, 6, 6, 8]),
        );
        MemoryDataSource::try_from_batches([batch]).unwrap()
    }

    #[test]
    fn scan_all_columns() {
        let source = source();
        let batches = collect_stream(source.scan(&[]).unwrap()).unwrap();
        assert_eq!(1, batches.len());
        assert_eq!(3, batches[0].num_columns());
        assert_eq!(5, batches[0].num_rows());
    }

    #[test]
    fn scan_projection_order() {
        let source = source();
        let projection = vec!["cyl".to_string(), "model".to_string()];
        let batches = collect_stream(source.scan(&projection).unwrap()).unwrap();

        let expected = generate_batch!(
            ("cyl", [6, 4, 6, 6, 8]),
            ("model", ["Mazda RX4", "Datsun 710", "Hornet 4 Drive", "Valiant", "Duster 360"]),
        );
        assert_batches_eq(&expected, &batches[0]);
    }

    #[test]
    fn scan_unknown_column() {
        let source = source();
        let err = source.scan(&["hp".to_string()]).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }

    #[test]
    fn scan_rechunks() {
        let source = source().with_batch_size(2).unwrap();
        let batches = collect_stream(source.scan(&[]).unwrap()).unwrap();

        let rows: Vec<_> = batches.iter().map(|b| b.num_rows()).collect();
        assert_eq!(vec![2, 2, 1], rows);
        assert_arrays_eq(&Array::from_iter([8]), batches[2].column(2).unwrap());
    }

    #[test]
    fn scan_is_restartable() {
        let source = source();
        let first = collect_stream(source.scan(&[]).unwrap()).unwrap();
        let second = collect_stream(source.scan(&[]).unwrap()).unwrap();
        assert_batches_eq(&first[0], &second[0]);
    }

    #[test]
    fn closed_stream_is_exhausted() {
        let source = source().with_batch_size(1).unwrap();
        let mut stream = source.scan(&[]).unwrap();
        assert!(stream.poll_next().unwrap().is_some());
        stream.close();
        assert!(stream.poll_next().unwrap().is_none());
    }

    #[test]
    fn zero_batch_size_rejected() {
        assert!(source().with_batch_size(0).is_err());
    }

    #[test]
    fn schema_mismatch_rejected() {
        let batch = generate_batch!(("a", [1, 2]));
        let other = generate_batch!(("b", [1, 2]));
        let err = MemoryDataSource::try_new(batch.schema().clone(), [other]).unwrap_err();
        assert_eq!(ErrorKind::InvariantViolation, err.kind());
    }
}
