pub mod operators;
pub mod stream;
