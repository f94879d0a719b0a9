//! Columnar query engine.
//!
//! Data flows through the engine as [`arrays::batch::Batch`]es pulled from
//! operator streams. Queries are built as logical plans through a
//! [`logical::dataframe::DataFrame`], lowered by the
//! [`planner::QueryPlanner`], and run through an
//! [`engine::ExecutionContext`].

pub mod arrays;
pub mod config;
pub mod datasource;
pub mod engine;
pub mod execution;
pub mod explain;
pub mod expr;
pub mod functions;
pub mod logical;
pub mod planner;
