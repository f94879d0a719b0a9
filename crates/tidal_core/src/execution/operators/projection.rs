use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::ExecutionPlan;
use crate::arrays::batch::Batch;
use crate::arrays::field::{Field, Schema};
use crate::execution::stream::{BatchStream, BoxedBatchStream, Upstream};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::physical::PhysicalScalarExpression;

/// Evaluates a list of expressions against every input batch.
#[derive(Debug)]
pub struct ProjectionExec {
    input: Arc<dyn ExecutionPlan>,
    exprs: Arc<[PhysicalScalarExpression]>,
    schema: Arc<Schema>,
}

impl ProjectionExec {
    /// Create a projection from expressions and their output names.
    ///
    /// The output schema is fixed here from the expression types.
    pub fn try_new(
        input: Arc<dyn ExecutionPlan>,
        exprs: Vec<(PhysicalScalarExpression, String)>,
    ) -> Result<Self> {
        if exprs.is_empty() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Projection requires at least one expression",
            ));
        }

        let input_schema = input.schema();
        let fields = exprs
            .iter()
            .map(|(expr, name)| Ok(Field::new(name.clone(), expr.datatype(&input_schema)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(ProjectionExec {
            input,
            exprs: exprs.into_iter().map(|(expr, _)| expr).collect(),
            schema: Arc::new(Schema::new(fields)),
        })
    }
}

impl ExecutionPlan for ProjectionExec {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn execute(&self) -> Result<BoxedBatchStream> {
        Ok(Box::new(ProjectionStream {
            schema: self.schema.clone(),
            exprs: self.exprs.clone(),
            input: Upstream::new(self.input.execute()?),
        }))
    }

    fn children(&self) -> Vec<Arc<dyn ExecutionPlan>> {
        vec![self.input.clone()]
    }
}

impl Explainable for ProjectionExec {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Projection").with_values("expressions", self.exprs.iter())
    }
}

#[derive(Debug)]
struct ProjectionStream {
    schema: Arc<Schema>,
    exprs: Arc<[PhysicalScalarExpression]>,
    input: Upstream,
}

impl BatchStream for ProjectionStream {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn poll_next(&mut self) -> Result<Option<Batch>> {
        let exprs = &self.exprs;
        let schema = &self.schema;

        self.input.pull_map(|batch| {
            // Each expression sees only the input batch.
            let arrays = exprs
                .iter()
                .map(|expr| expr.eval(&batch))
                .collect::<Result<Vec<_>>>()?;
            Batch::try_new(schema.clone(), arrays)
        })
    }

    fn close(&mut self) {
        self.input.close();
    }
}
