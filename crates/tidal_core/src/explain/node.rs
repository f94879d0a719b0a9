use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tidal_error::{Result, ResultExt};

use super::explainable::{ExplainEntry, Explainable};
use crate::execution::operators::ExecutionPlan;
use crate::logical::plan::LogicalPlan;

/// Tree of explain entries mirroring the shape of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExplainNode {
    pub entry: ExplainEntry,
    pub children: Vec<ExplainNode>,
}

impl ExplainNode {
    /// Explain a physical plan. `verbose` adds each operator's output schema.
    pub fn new_from_physical_plan(verbose: bool, plan: &dyn ExecutionPlan) -> Self {
        let mut entry = plan.explain_entry();
        if verbose {
            entry = entry.with_schema(&plan.schema());
        }

        let children = plan
            .children()
            .iter()
            .map(|child| Self::new_from_physical_plan(verbose, child.as_ref()))
            .collect();

        ExplainNode { entry, children }
    }

    /// Explain a logical plan. `verbose` adds each node's output schema where
    /// it resolves.
    pub fn new_from_logical_plan(verbose: bool, plan: &LogicalPlan) -> Self {
        let mut entry = plan.explain_entry();
        let schema = if verbose { plan.schema().ok() } else { None };
        if let Some(schema) = schema {
            entry = entry.with_schema(&schema);
        }

        let children = plan
            .children()
            .into_iter()
            .map(|child| Self::new_from_logical_plan(verbose, child))
            .collect();

        ExplainNode { entry, children }
    }

    /// Format the tree with each level of children indented by two spaces.
    pub fn format_text(&self) -> Result<String> {
        self.write_text(0, String::new())
    }

    fn write_text(&self, indent: usize, mut buf: String) -> Result<String> {
        writeln!(buf, "{}{}", " ".repeat(indent), self.entry)
            .context("failed to write to explain buffer")?;

        for child in &self.children {
            buf = child.write_text(indent + 2, buf)?;
        }

        Ok(buf)
    }

    pub fn format_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize explain node")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::arrays::compute::cmp::ComparisonOperator;
    use crate::arrays::scalar::ScalarValue;
    use crate::datasource::memory::MemoryDataSource;
    use crate::execution::operators::scan::ScanExec;
    use crate::execution::operators::selection::SelectionExec;
    use crate::expr::physical::PhysicalScalarExpression;
    use crate::expr::physical::literal_expr::PhysicalLiteralExpr;
    use crate::generate_batch;

    fn plan() -> Arc<dyn ExecutionPlan> {
        let batch = generate_batch!(("a", [1, 2, 3]));
        let source = Arc::new(MemoryDataSource::try_from_batches([batch]).unwrap());
        let scan = Arc::new(ScanExec::try_new(source, Vec::new()).unwrap());
        let predicate = PhysicalScalarExpression::comparison(
            ComparisonOperator::Gt,
            PhysicalScalarExpression::column(0),
            PhysicalScalarExpression::Literal(
                PhysicalLiteralExpr::new(ScalarValue::Int32(1)).unwrap(),
            ),
        );
        Arc::new(SelectionExec::try_new(scan, predicate).unwrap())
    }

    #[test]
    fn physical_text() {
        let node = ExplainNode::new_from_physical_plan(false, plan().as_ref());
        let text = node.format_text().unwrap();

        let expected = "Selection (predicate = (@0 > 1))\n  Scan (source = memory)\n";
        assert_eq!(expected, text);
    }

    #[test]
    fn verbose_adds_schemas() {
        let node = ExplainNode::new_from_physical_plan(true, plan().as_ref());
        let text = node.format_text().unwrap();

        let expected = "Selection (predicate = (@0 > 1), schema = [a: Int32])\n  Scan (source = memory, schema = [a: Int32])\n";
        assert_eq!(expected, text);
    }

    #[test]
    fn json_roundtrip() {
        let node = ExplainNode::new_from_physical_plan(true, plan().as_ref());
        let json = node.format_json().unwrap();
        let parsed: ExplainNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, parsed);
    }
}
