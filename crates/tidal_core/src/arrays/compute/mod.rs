//! Kernels over whole arrays.

pub mod arith;
pub mod boolean;
pub mod cmp;
