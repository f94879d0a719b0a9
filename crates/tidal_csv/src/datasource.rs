use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use tidal_core::arrays::datatype::DataType;
use tidal_core::arrays::field::{Field, Schema};
use tidal_core::config::DEFAULT_BATCH_SIZE;
use tidal_core::datasource::DataSource;
use tidal_core::execution::stream::BoxedBatchStream;
use tidal_error::{DbError, ErrorKind, Result};
use tracing::debug;

use crate::decoder::CsvStream;

#[derive(Debug, Clone)]
enum CsvInput {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

impl CsvInput {
    fn open(&self) -> Result<csv::Reader<Box<dyn Read + Send>>> {
        let read: Box<dyn Read + Send> = match self {
            Self::File(path) => {
                let file = File::open(path)
                    .map_err(|e| DbError::from(e).with_field("path", path.display()))?;
                Box::new(BufReader::new(file))
            }
            Self::Bytes(bytes) => Box::new(Cursor::new(bytes.clone())),
        };

        Ok(csv::ReaderBuilder::new().has_headers(true).from_reader(read))
    }
}

/// A data source reading a CSV file with a header row.
///
/// By default every column is `Utf8` and named by the header. A schema can be
/// supplied to parse cells into other types. Empty cells are NULL.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    input: CsvInput,
    schema: Arc<Schema>,
    batch_size: usize,
}

impl CsvDataSource {
    pub fn try_from_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::try_from_input(CsvInput::File(path.into()))
    }

    pub fn try_from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::try_from_input(CsvInput::Bytes(bytes.into()))
    }

    fn try_from_input(input: CsvInput) -> Result<Self> {
        let mut reader = input.open()?;
        let headers = reader.headers().map_err(|e| {
            DbError::with_source("Failed to read CSV header", Box::new(e)).kind_of(ErrorKind::Parse)
        })?;

        let schema = Schema::new(
            headers
                .iter()
                .map(|name| Field::new(name, DataType::Utf8)),
        );

        Ok(CsvDataSource {
            input,
            schema: Arc::new(schema),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Replace the header-derived schema.
    ///
    /// Fields are matched to CSV columns by position, so the schema must have
    /// one field per column.
    pub fn with_schema(mut self, schema: Schema) -> Result<Self> {
        if schema.len() != self.schema.len() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Schema does not match number of CSV columns",
            )
            .with_field("columns", self.schema.len())
            .with_field("fields", schema.len()));
        }
        self.schema = Arc::new(schema);
        Ok(self)
    }

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

impl DataSource for CsvDataSource {
    fn name(&self) -> String {
        match &self.input {
            CsvInput::File(path) => format!("csv({})", path.display()),
            CsvInput::Bytes(_) => "csv(memory)".to_string(),
        }
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn scan(&self, projection: &[String]) -> Result<BoxedBatchStream> {
        let (schema, indices) = self.schema.try_select(projection)?;
        debug!(source = %self.name(), ?projection, batch_size = self.batch_size, "scanning csv");

        let reader = self.input.open()?;
        Ok(Box::new(CsvStream::new(
            Arc::new(schema),
            indices,
            self.batch_size,
            reader,
        )))
    }
}

#[cfg(test)]
mod tests {
    use tidal_core::arrays::scalar::ScalarValue;
    use tidal_core::arrays::testutil::assert_batches_eq;
    use tidal_core::execution::stream::collect_stream;
    use tidal_core::generate_batch;

    use super::*;

    const CARS: &str = "\
model,mpg,cyl
Mazda RX4,21.0,6
Datsun 710,22.8,4
Hornet 4 Drive,,6
Valiant,18.1,6
Duster 360,14.3,8
";

    fn typed_schema() -> Schema {
        Schema::new([
            Field::new("model", DataType::Utf8),
            Field::new("mpg", DataType::Float64),
            Field::new("cyl", DataType::Int32),
        ])
    }

    fn cars() -> CsvDataSource {
        CsvDataSource::try_from_bytes(CARS.as_bytes()).unwrap()
    }

    #[test]
    fn header_schema_is_utf8() {
        let source = cars();
        let schema = source.schema();

        assert_eq!(vec!["model", "mpg", "cyl"], schema.names().collect::<Vec<_>>());
        assert!(schema.datatypes().all(|dt| dt == DataType::Utf8));
        assert_eq!("csv(memory)", source.name());
    }

    #[test]
    fn typed_scan_with_nulls() {
        logutil::init_test();

        let source = cars().with_schema(typed_schema()).unwrap();
        let batches = collect_stream(source.scan(&[]).unwrap()).unwrap();

        assert_eq!(1, batches.len());
        assert_eq!(5, batches[0].num_rows());
        assert_eq!(
            vec![
                ScalarValue::from("Hornet 4 Drive"),
                ScalarValue::Null,
                ScalarValue::Int32(6)
            ],
            batches[0].row(2).unwrap()
        );
    }

    #[test]
    fn batch_sizes() {
        let source = cars().with_batch_size(2).unwrap();
        let batches = collect_stream(source.scan(&[]).unwrap()).unwrap();

        let sizes: Vec<_> = batches.iter().map(|b| b.num_rows()).collect();
        assert_eq!(vec![2, 2, 1], sizes);
    }

    #[test]
    fn projection_only_reads_requested() {
        let source = cars().with_schema(typed_schema()).unwrap();
        let batches =
            collect_stream(source.scan(&["cyl".to_string(), "model".to_string()]).unwrap())
                .unwrap();

        let expected = generate_batch!(
            ("cyl", [6, 4, 6, 6, 8]),
            (
                "model",
                ["Mazda RX4", "Datsun 710", "Hornet 4 Drive", "Valiant", "Duster 360"]
            ),
        );
        assert_batches_eq(&expected, &batches[0]);
    }

    #[test]
    fn unknown_projection() {
        let err = cars().scan(&["hp".to_string()]).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }

    #[test]
    fn parse_error_names_row_and_column() {
        let data = "model,mpg\nMazda RX4,21.0\nDatsun 710,fast\n";
        let source = CsvDataSource::try_from_bytes(data.as_bytes())
            .unwrap()
            .with_schema(Schema::new([
                Field::new("model", DataType::Utf8),
                Field::new("mpg", DataType::Float64),
            ]))
            .unwrap();

        let mut stream = source.scan(&[]).unwrap();
        let err = stream.poll_next().unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind());
        assert_eq!(Some("2"), err.get_field("row"));
        assert_eq!(Some("mpg"), err.get_field("column"));

        assert!(stream.poll_next().unwrap().is_none());
    }

    #[test]
    fn header_only_produces_no_batches() {
        let source = CsvDataSource::try_from_bytes("model,mpg\n".as_bytes()).unwrap();
        let batches = collect_stream(source.scan(&[]).unwrap()).unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn schema_length_mismatch() {
        let err = cars()
            .with_schema(Schema::new([Field::new("model", DataType::Utf8)]))
            .unwrap_err();
        assert_eq!(ErrorKind::InvariantViolation, err.kind());
    }

    #[test]
    fn missing_file() {
        let err = CsvDataSource::try_from_path("/definitely/not/here.csv").unwrap_err();
        assert_eq!(ErrorKind::Io, err.kind());
    }

    #[test]
    fn close_ends_stream() {
        let source = cars().with_batch_size(1).unwrap();
        let mut stream = source.scan(&[]).unwrap();

        assert!(stream.poll_next().unwrap().is_some());
        stream.close();
        assert!(stream.poll_next().unwrap().is_none());
    }
}
