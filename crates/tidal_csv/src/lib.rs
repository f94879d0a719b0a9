//! CSV data source.

pub mod datasource;

mod decoder;

pub use datasource::CsvDataSource;
