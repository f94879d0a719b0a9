//! Lowering of logical plans into physical operators.
//!
//! Column names are resolved to positions once here. Physical operators and
//! expressions only ever reference columns by index.

use std::sync::Arc;

use tidal_error::Result;
use tracing::{debug, trace};

use crate::arrays::field::Schema;
use crate::execution::operators::ExecutionPlan;
use crate::execution::operators::hash_aggregate::HashAggregateExec;
use crate::execution::operators::projection::ProjectionExec;
use crate::execution::operators::scan::ScanExec;
use crate::execution::operators::selection::SelectionExec;
use crate::explain::explainable::Explainable;
use crate::expr::Expression;
use crate::expr::aggregate_expr::AggregateExpr;
use crate::expr::physical::literal_expr::PhysicalLiteralExpr;
use crate::expr::physical::{PhysicalAggregateExpression, PhysicalScalarExpression};
use crate::logical::plan::LogicalPlan;

#[derive(Debug, Default, Clone, Copy)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        QueryPlanner
    }

    pub fn create_physical_plan(&self, plan: &LogicalPlan) -> Result<Arc<dyn ExecutionPlan>> {
        let physical = self.plan_node(plan)?;
        debug!(root = %physical.explain_entry(), "created physical plan");
        Ok(physical)
    }

    fn plan_node(&self, plan: &LogicalPlan) -> Result<Arc<dyn ExecutionPlan>> {
        trace!(node = %plan, "planning node");

        match plan {
            LogicalPlan::Scan(scan) => Ok(Arc::new(ScanExec::try_new(
                scan.source.clone(),
                scan.projection.clone(),
            )?)),
            LogicalPlan::Projection(proj) => {
                let input = self.plan_node(&proj.input)?;
                let input_schema = input.schema();
                let exprs = proj
                    .exprs
                    .iter()
                    .map(|expr| self.plan_named_expression(expr, &input_schema))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Arc::new(ProjectionExec::try_new(input, exprs)?))
            }
            LogicalPlan::Selection(sel) => {
                let input = self.plan_node(&sel.input)?;
                let predicate = self.plan_scalar(&sel.predicate, &input.schema())?;

                Ok(Arc::new(SelectionExec::try_new(input, predicate)?))
            }
            LogicalPlan::Aggregate(agg) => {
                let input = self.plan_node(&agg.input)?;
                let input_schema = input.schema();
                let groups = agg
                    .group_exprs
                    .iter()
                    .map(|expr| self.plan_named_expression(expr, &input_schema))
                    .collect::<Result<Vec<_>>>()?;
                let aggregates = agg
                    .aggregate_exprs
                    .iter()
                    .map(|expr| self.plan_aggregate(expr, &input_schema))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Arc::new(HashAggregateExec::try_new(
                    input, groups, aggregates,
                )?))
            }
        }
    }

    /// Plan an expression along with its output name.
    fn plan_named_expression(
        &self,
        expr: &Expression,
        input: &Schema,
    ) -> Result<(PhysicalScalarExpression, String)> {
        let field = expr.to_field(input)?;
        Ok((self.plan_scalar(expr, input)?, field.name))
    }

    fn plan_aggregate(
        &self,
        expr: &AggregateExpr,
        input: &Schema,
    ) -> Result<PhysicalAggregateExpression> {
        let physical_input = self.plan_scalar(&expr.input, input)?;
        let agg = PhysicalAggregateExpression::try_new(expr.function, physical_input, input)?;
        Ok(agg.with_name(expr.output_name()))
    }

    /// Bind column references to their position in `input`.
    pub fn plan_scalar(
        &self,
        expr: &Expression,
        input: &Schema,
    ) -> Result<PhysicalScalarExpression> {
        match expr {
            Expression::Alias(alias) => self.plan_scalar(&alias.expr, input),
            Expression::Column(col) => {
                let idx = input.find_index(&col.name)?;
                Ok(PhysicalScalarExpression::column(idx))
            }
            Expression::Literal(lit) => {
                let literal = match PhysicalLiteralExpr::new(lit.literal.clone()) {
                    Some(literal) => literal,
                    None => PhysicalLiteralExpr::new_typed_null(lit.datatype),
                };
                Ok(PhysicalScalarExpression::Literal(literal))
            }
            Expression::Arith(arith) => Ok(PhysicalScalarExpression::arith(
                arith.op,
                self.plan_scalar(&arith.left, input)?,
                self.plan_scalar(&arith.right, input)?,
            )),
            Expression::Comparison(cmp) => Ok(PhysicalScalarExpression::comparison(
                cmp.op,
                self.plan_scalar(&cmp.left, input)?,
                self.plan_scalar(&cmp.right, input)?,
            )),
            Expression::Conjunction(conj) => Ok(PhysicalScalarExpression::conjunction(
                conj.op,
                self.plan_scalar(&conj.left, input)?,
                self.plan_scalar(&conj.right, input)?,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use tidal_error::ErrorKind;

    use super::*;
    use crate::arrays::testutil::{assert_batches_eq, assert_batches_eq_unordered};
    use crate::datasource::memory::MemoryDataSource;
    use crate::execution::stream::collect_stream;
    use crate::expr::aggregate_expr::{count, sum};
    use crate::expr::{col, lit};
    use crate::generate_batch;
    use crate::logical::dataframe::DataFrame;

    fn cars() -> DataFrame {
        let batch = generate_batch!(
            ("model", ["Mazda RX4", "Mazda RX4 Wag", "Datsun 710", "Valiant"]),
            ("mpg", [21.0, 21.0, 22.5, 18.0]),
            ("cyl", [6, 6, 4, 6]),
        );
        DataFrame::scan(Arc::new(MemoryDataSource::try_from_batches([batch]).unwrap()))
    }

    #[test]
    fn binds_columns_by_position() {
        let schema = cars().schema().unwrap();
        let expr = QueryPlanner::new()
            .plan_scalar(&(col("cyl") * lit(2)).alias("x"), &schema)
            .unwrap();
        assert_eq!("(@2 * 2)", expr.to_string());
    }

    #[test]
    fn unknown_column() {
        let schema = cars().schema().unwrap();
        let err = QueryPlanner::new()
            .plan_scalar(&col("hp"), &schema)
            .unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }

    #[test]
    fn filter_project() {
        let df = cars()
            .filter(col("mpg").eq(lit(21.0)))
            .unwrap()
            .project(vec![col("model"), (col("cyl") * lit(2)).alias("double_cyl")])
            .unwrap();

        let plan = QueryPlanner::new()
            .create_physical_plan(df.logical_plan())
            .unwrap();
        let batches = collect_stream(plan.execute().unwrap()).unwrap();

        let expected = generate_batch!(
            ("model", ["Mazda RX4", "Mazda RX4 Wag"]),
            ("double_cyl", [12, 12]),
        );
        assert_batches_eq(&expected, &batches[0]);
    }

    #[test]
    fn aggregate_uses_logical_names() {
        let df = cars()
            .aggregate(vec![col("cyl")], vec![sum(col("mpg")), count(col("model"))])
            .unwrap();

        let plan = QueryPlanner::new()
            .create_physical_plan(df.logical_plan())
            .unwrap();
        assert_eq!(df.schema().unwrap(), *plan.schema());

        let batches = collect_stream(plan.execute().unwrap()).unwrap();
        let expected = generate_batch!(
            ("cyl", [6, 4]),
            ("SUM(mpg)", [60.0, 22.5]),
            ("COUNT", [3_i64, 1]),
        );
        assert_batches_eq_unordered(&expected, &batches[0]);
    }
}
