use std::fmt;
use std::sync::Arc;

use tidal_error::Result;

use crate::arrays::field::Schema;
use crate::datasource::DataSource;
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::explain::node::ExplainNode;
use crate::expr::Expression;
use crate::expr::aggregate_expr::AggregateExpr;

#[derive(Debug, Clone)]
pub enum LogicalPlan {
    Scan(LogicalScan),
    Projection(LogicalProjection),
    Selection(LogicalSelection),
    Aggregate(LogicalAggregate),
}

/// Read from a data source. The only leaf node.
#[derive(Debug, Clone)]
pub struct LogicalScan {
    pub source: Arc<dyn DataSource>,
    /// Columns to read. Empty reads every column.
    pub projection: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LogicalProjection {
    pub input: Box<LogicalPlan>,
    pub exprs: Vec<Expression>,
}

/// Keep rows where the predicate is true.
#[derive(Debug, Clone)]
pub struct LogicalSelection {
    pub input: Box<LogicalPlan>,
    pub predicate: Expression,
}

#[derive(Debug, Clone)]
pub struct LogicalAggregate {
    pub input: Box<LogicalPlan>,
    pub group_exprs: Vec<Expression>,
    pub aggregate_exprs: Vec<AggregateExpr>,
}

impl LogicalPlan {
    /// Resolve the output schema of this plan.
    ///
    /// Errors if any expression references an unknown column or combines
    /// mismatched types.
    pub fn schema(&self) -> Result<Schema> {
        match self {
            Self::Scan(scan) => {
                let (schema, _) = scan.source.schema().try_select(&scan.projection)?;
                Ok(schema)
            }
            Self::Projection(proj) => {
                let input = proj.input.schema()?;
                let fields = proj
                    .exprs
                    .iter()
                    .map(|expr| expr.to_field(&input))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Schema::new(fields))
            }
            Self::Selection(sel) => sel.input.schema(),
            Self::Aggregate(agg) => {
                let input = agg.input.schema()?;
                let groups = agg.group_exprs.iter().map(|expr| expr.to_field(&input));
                let aggs = agg.aggregate_exprs.iter().map(|expr| expr.to_field(&input));
                let fields = groups.chain(aggs).collect::<Result<Vec<_>>>()?;
                Ok(Schema::new(fields))
            }
        }
    }

    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            Self::Scan(_) => Vec::new(),
            Self::Projection(proj) => vec![proj.input.as_ref()],
            Self::Selection(sel) => vec![sel.input.as_ref()],
            Self::Aggregate(agg) => vec![agg.input.as_ref()],
        }
    }

    /// Format the plan as an indented tree, root first.
    ///
    /// ```text
    /// Projection (expressions = [model, mpg])
    ///   Selection (predicate = mpg = 21)
    ///     Scan (source = csv(cars.csv))
    /// ```
    pub fn pretty(&self) -> Result<String> {
        ExplainNode::new_from_logical_plan(false, self).format_text()
    }
}

impl Explainable for LogicalPlan {
    fn explain_entry(&self) -> ExplainEntry {
        match self {
            Self::Scan(scan) => {
                let ent = ExplainEntry::new("Scan").with_value("source", scan.source.name());
                if scan.projection.is_empty() {
                    ent
                } else {
                    ent.with_values("projection", &scan.projection)
                }
            }
            Self::Projection(proj) => {
                ExplainEntry::new("Projection").with_values("expressions", &proj.exprs)
            }
            Self::Selection(sel) => {
                ExplainEntry::new("Selection").with_value("predicate", &sel.predicate)
            }
            Self::Aggregate(agg) => ExplainEntry::new("Aggregate")
                .with_values("groups", &agg.group_exprs)
                .with_values("aggregates", &agg.aggregate_exprs),
        }
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain_entry())
    }
}
