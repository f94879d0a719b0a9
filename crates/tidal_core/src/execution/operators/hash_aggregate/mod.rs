//! Grouped aggregation.
//!
//! The entire input is drained into a hash table keyed on the group values
//! before a single output batch is produced. Memory is bounded by the number
//! of distinct groups, not by the number of input rows.

pub mod group_key;
pub mod group_table;

use std::sync::Arc;

use ahash::RandomState;
use group_table::GroupTable;
use tidal_error::{DbError, ErrorKind, Result};
use tracing::{debug, trace};

use super::ExecutionPlan;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};
use crate::execution::stream::{BatchStream, BoxedBatchStream, Upstream};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::physical::{PhysicalAggregateExpression, PhysicalScalarExpression};

/// Fixed seeds so group output order is stable between runs.
pub const RANDOM_STATE: RandomState = RandomState::with_seeds(0, 0, 0, 0);

/// Groups input rows by the group expressions and computes aggregates per
/// group.
///
/// Output is one batch holding group columns followed by aggregate columns.
/// Group order in the output is unspecified. With no group expressions every
/// row lands in a single group. An input with no rows produces a single batch
/// with no rows.
#[derive(Debug)]
pub struct HashAggregateExec {
    input: Arc<dyn ExecutionPlan>,
    group_exprs: Arc<[PhysicalScalarExpression]>,
    group_types: Arc<[DataType]>,
    aggregates: Arc<[PhysicalAggregateExpression]>,
    schema: Arc<Schema>,
}

impl HashAggregateExec {
    pub fn try_new(
        input: Arc<dyn ExecutionPlan>,
        groups: Vec<(PhysicalScalarExpression, String)>,
        aggregates: Vec<PhysicalAggregateExpression>,
    ) -> Result<Self> {
        if groups.is_empty() && aggregates.is_empty() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Aggregate requires at least one group or aggregate expression",
            ));
        }

        let input_schema = input.schema();

        let mut fields = Vec::with_capacity(groups.len() + aggregates.len());
        let mut group_types = Vec::with_capacity(groups.len());
        for (expr, name) in &groups {
            let datatype = expr.datatype(&input_schema)?;
            group_types.push(datatype);
            fields.push(Field::new(name.clone(), datatype));
        }

        for agg in &aggregates {
            let input_type = agg.input.datatype(&input_schema)?;
            if input_type != agg.input_type {
                return Err(DbError::with_kind(
                    ErrorKind::TypeMismatch,
                    "Aggregate input type does not match input schema",
                )
                .with_field("aggregate", agg)
                .with_field("expected", agg.input_type)
                .with_field("got", input_type));
            }
            fields.push(agg.output_field());
        }

        Ok(HashAggregateExec {
            input,
            group_exprs: groups.into_iter().map(|(expr, _)| expr).collect(),
            group_types: group_types.into(),
            aggregates: aggregates.into(),
            schema: Arc::new(Schema::new(fields)),
        })
    }
}

impl ExecutionPlan for HashAggregateExec {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn execute(&self) -> Result<BoxedBatchStream> {
        Ok(Box::new(HashAggregateStream {
            schema: self.schema.clone(),
            group_exprs: self.group_exprs.clone(),
            group_types: self.group_types.clone(),
            aggregates: self.aggregates.clone(),
            input: Upstream::new(self.input.execute()?),
            finished: false,
        }))
    }

    fn children(&self) -> Vec<Arc<dyn ExecutionPlan>> {
        vec![self.input.clone()]
    }
}

impl Explainable for HashAggregateExec {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("HashAggregate")
            .with_values("groups", self.group_exprs.iter())
            .with_values("aggregates", self.aggregates.iter())
    }
}

#[derive(Debug)]
struct HashAggregateStream {
    schema: Arc<Schema>,
    group_exprs: Arc<[PhysicalScalarExpression]>,
    group_types: Arc<[DataType]>,
    aggregates: Arc<[PhysicalAggregateExpression]>,
    input: Upstream,
    /// Set once the output batch has been produced, or on error.
    finished: bool,
}

impl HashAggregateStream {
    fn aggregate_input(&mut self) -> Result<Batch> {
        let mut table = GroupTable::new();
        let mut num_rows = 0;

        let group_exprs = &self.group_exprs;
        let aggregates = &self.aggregates;

        while let Some(batch) = self.input.pull_map(|batch| {
            table.insert_batch(&batch, group_exprs, aggregates)?;
            Ok(batch)
        })? {
            trace!(rows = batch.num_rows(), "aggregated batch");
            num_rows += batch.num_rows();
        }

        debug!(
            num_rows,
            num_groups = table.num_groups(),
            "finished hash aggregate"
        );

        let arrays = table.into_arrays(&self.group_types, aggregates)?;
        Batch::try_from_arrays(self.schema.clone(), arrays)
    }
}

impl BatchStream for HashAggregateStream {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn poll_next(&mut self) -> Result<Option<Batch>> {
        if self.finished {
            return Ok(None);
        }
        self.finished = true;

        match self.aggregate_input() {
            Ok(batch) => Ok(Some(batch)),
            Err(e) => {
                self.input.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.finished = true;
        self.input.close();
    }
}
