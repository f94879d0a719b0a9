pub mod array;
pub mod batch;
pub mod bitmap;
pub mod compute;
pub mod datatype;
pub mod executor;
pub mod field;
pub mod format;
pub mod scalar;
pub mod testutil;
