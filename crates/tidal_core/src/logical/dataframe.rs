use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::plan::{LogicalAggregate, LogicalPlan, LogicalProjection, LogicalScan, LogicalSelection};
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;
use crate::datasource::DataSource;
use crate::expr::Expression;
use crate::expr::aggregate_expr::AggregateExpr;

/// Builder for logical plans.
///
/// Each method wraps the current plan in a new node and checks that the
/// result resolves, so errors surface while the query is being built rather
/// than when it runs.
#[derive(Debug, Clone)]
pub struct DataFrame {
    plan: LogicalPlan,
}

impl DataFrame {
    /// Start a query that scans every column of `source`.
    pub fn scan(source: Arc<dyn DataSource>) -> Self {
        DataFrame {
            plan: LogicalPlan::Scan(LogicalScan {
                source,
                projection: Vec::new(),
            }),
        }
    }

    /// Wrap an existing plan, validating that it resolves.
    pub fn try_from_plan(plan: LogicalPlan) -> Result<Self> {
        plan.schema()?;
        Ok(DataFrame { plan })
    }

    pub fn project(self, exprs: Vec<Expression>) -> Result<Self> {
        if exprs.is_empty() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Projection requires at least one expression",
            ));
        }

        Self::try_from_plan(LogicalPlan::Projection(LogicalProjection {
            input: Box::new(self.plan),
            exprs,
        }))
    }

    pub fn filter(self, predicate: Expression) -> Result<Self> {
        let datatype = predicate.datatype(&self.plan.schema()?)?;
        if datatype != DataType::Boolean {
            return Err(DbError::with_kind(
                ErrorKind::NonBooleanPredicate,
                "Expected filter predicate to evaluate to a boolean",
            )
            .with_field("predicate", &predicate)
            .with_field("got", datatype));
        }

        Ok(DataFrame {
            plan: LogicalPlan::Selection(LogicalSelection {
                input: Box::new(self.plan),
                predicate,
            }),
        })
    }

    /// Group by `group_exprs` and compute `aggregate_exprs` per group.
    ///
    /// An empty group list computes a single global row.
    pub fn aggregate(
        self,
        group_exprs: Vec<Expression>,
        aggregate_exprs: Vec<AggregateExpr>,
    ) -> Result<Self> {
        if group_exprs.is_empty() && aggregate_exprs.is_empty() {
            return Err(DbError::with_kind(
                ErrorKind::InvariantViolation,
                "Aggregate requires at least one group or aggregate expression",
            ));
        }

        Self::try_from_plan(LogicalPlan::Aggregate(LogicalAggregate {
            input: Box::new(self.plan),
            group_exprs,
            aggregate_exprs,
        }))
    }

    pub fn schema(&self) -> Result<Schema> {
        self.plan.schema()
    }

    pub fn logical_plan(&self) -> &LogicalPlan {
        &self.plan
    }

    pub fn into_logical_plan(self) -> LogicalPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::memory::MemoryDataSource;
    use crate::expr::aggregate_expr::{max, sum};
    use crate::expr::{col, lit};
    use crate::generate_batch;

    fn cars() -> DataFrame {
        let batch = generate_batch!(
            ("model", ["Mazda RX4", "Datsun 710", "Valiant"]),
            ("mpg", [21.0, 22.8, 18.1]),
            ("cyl", [6, 4, 6]),
        );
        DataFrame::scan(Arc::new(MemoryDataSource::try_from_batches([batch]).unwrap()))
    }

    #[test]
    fn build_filter_project() {
        let df = cars()
            .filter(col("mpg").eq(lit(21.0)))
            .unwrap()
            .project(vec![col("model"), col("mpg")])
            .unwrap();

        let schema = df.schema().unwrap();
        assert_eq!(vec!["model", "mpg"], schema.names().collect::<Vec<_>>());
        assert!(matches!(df.logical_plan(), LogicalPlan::Projection(_)));
    }

    #[test]
    fn filter_non_boolean() {
        let err = cars().filter(col("mpg")).unwrap_err();
        assert_eq!(ErrorKind::NonBooleanPredicate, err.kind());
    }

    #[test]
    fn filter_unknown_column() {
        let err = cars().filter(col("hp").eq(lit(100))).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }

    #[test]
    fn project_type_mismatch() {
        let err = cars().project(vec![col("cyl") * col("mpg")]).unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }

    #[test]
    fn aggregate_names() {
        let df = cars()
            .aggregate(vec![col("cyl")], vec![sum(col("mpg")), max(col("mpg")).alias("best")])
            .unwrap();

        let schema = df.schema().unwrap();
        assert_eq!(
            vec!["cyl", "SUM(mpg)", "best"],
            schema.names().collect::<Vec<_>>()
        );
    }

    #[test]
    fn aggregate_requires_expressions() {
        let err = cars().aggregate(Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(ErrorKind::InvariantViolation, err.kind());
    }
}
