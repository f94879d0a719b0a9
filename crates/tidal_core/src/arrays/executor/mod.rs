pub mod builder;
pub mod scalar;
