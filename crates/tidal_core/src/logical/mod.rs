//! Logical plans and the DataFrame builder.
//!
//! Logical plans reference columns by name and carry no execution state.
//! The planner lowers them into physical operators.

pub mod dataframe;
pub mod plan;
