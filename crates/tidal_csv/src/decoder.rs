use std::fmt;
use std::io::Read;
use std::sync::Arc;

use csv::StringRecord;
use tidal_core::arrays::array::Array;
use tidal_core::arrays::batch::Batch;
use tidal_core::arrays::datatype::DataType;
use tidal_core::arrays::field::Schema;
use tidal_core::arrays::scalar::{OwnedScalarValue, ScalarValue};
use tidal_core::execution::stream::BatchStream;
use tidal_error::{DbError, ErrorKind, Result};
use tracing::trace;

/// Stream decoding CSV records into batches.
///
/// Only the projected columns are parsed. Every batch holds `batch_size` rows
/// except possibly the last.
pub(crate) struct CsvStream {
    /// Schema of the projected output.
    schema: Arc<Schema>,
    /// Index into each record for every output column.
    indices: Vec<usize>,
    batch_size: usize,
    /// None once exhausted, closed or errored.
    reader: Option<csv::Reader<Box<dyn Read + Send>>>,
    record: StringRecord,
    /// Number of data rows read so far, not counting the header.
    rows_read: usize,
}

impl CsvStream {
    pub(crate) fn new(
        schema: Arc<Schema>,
        indices: Vec<usize>,
        batch_size: usize,
        reader: csv::Reader<Box<dyn Read + Send>>,
    ) -> Self {
        CsvStream {
            schema,
            indices,
            batch_size,
            reader: Some(reader),
            record: StringRecord::new(),
            rows_read: 0,
        }
    }

    fn read_batch(&mut self) -> Result<Option<Batch>> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(None),
        };

        let mut columns: Vec<Vec<OwnedScalarValue>> = self
            .indices
            .iter()
            .map(|_| Vec::with_capacity(self.batch_size))
            .collect();
        let mut num_rows = 0;

        while num_rows < self.batch_size {
            let has_record = reader.read_record(&mut self.record).map_err(|e| {
                DbError::with_source("Failed to read CSV record", Box::new(e))
                    .kind_of(ErrorKind::Parse)
                    .with_field("row", self.rows_read + 1)
            })?;
            if !has_record {
                self.reader = None;
                break;
            }
            self.rows_read += 1;
            num_rows += 1;

            for ((col, &record_idx), field) in columns
                .iter_mut()
                .zip(&self.indices)
                .zip(&self.schema.fields)
            {
                let cell = self.record.get(record_idx).unwrap_or_default();
                let value = decode_cell(cell, field.datatype).map_err(|e| {
                    e.with_field("row", self.rows_read)
                        .with_field("column", &field.name)
                })?;
                col.push(value);
            }
        }

        if num_rows == 0 {
            return Ok(None);
        }

        let arrays = columns
            .into_iter()
            .zip(&self.schema.fields)
            .map(|(values, field)| Array::try_from_scalars(field.datatype, values))
            .collect::<Result<Vec<_>>>()?;

        trace!(num_rows, "decoded csv batch");

        Batch::try_from_arrays(self.schema.clone(), arrays).map(Some)
    }
}

/// Parse a single cell. Empty cells are NULL for every type.
fn decode_cell(cell: &str, datatype: DataType) -> Result<OwnedScalarValue> {
    if cell.is_empty() {
        return Ok(ScalarValue::Null);
    }
    ScalarValue::try_parse(cell, datatype)
}

impl BatchStream for CsvStream {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn poll_next(&mut self) -> Result<Option<Batch>> {
        match self.read_batch() {
            Ok(batch) => Ok(batch),
            Err(e) => {
                self.reader = None;
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

impl fmt::Debug for CsvStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvStream")
            .field("schema", &self.schema)
            .field("indices", &self.indices)
            .field("batch_size", &self.batch_size)
            .field("rows_read", &self.rows_read)
            .finish_non_exhaustive()
    }
}
