use std::sync::Arc;

use tidal_error::{DbError, ErrorKind, Result};

use super::ExecutionPlan;
use crate::arrays::array::Array;
use crate::arrays::array::physical_type::PhysicalBool;
use crate::arrays::batch::Batch;
use crate::arrays::bitmap::Bitmap;
use crate::arrays::datatype::DataType;
use crate::arrays::executor::scalar::UnaryExecutor;
use crate::arrays::field::Schema;
use crate::execution::stream::{BatchStream, BoxedBatchStream, Upstream};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::physical::PhysicalScalarExpression;

/// Keeps rows where a predicate evaluates to true.
///
/// Rows where the predicate is false or null are dropped. Row order is
/// preserved and every input batch produces exactly one output batch, which
/// may have zero rows.
#[derive(Debug)]
pub struct SelectionExec {
    input: Arc<dyn ExecutionPlan>,
    predicate: Arc<PhysicalScalarExpression>,
}

impl SelectionExec {
    /// Errors with `NonBooleanPredicate` if the predicate doesn't produce
    /// booleans for the input schema.
    pub fn try_new(input: Arc<dyn ExecutionPlan>, predicate: PhysicalScalarExpression) -> Result<Self> {
        let datatype = predicate.datatype(&input.schema())?;
        check_boolean(&predicate, datatype)?;

        Ok(SelectionExec {
            input,
            predicate: Arc::new(predicate),
        })
    }
}

impl ExecutionPlan for SelectionExec {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn execute(&self) -> Result<BoxedBatchStream> {
        let input = self.input.execute()?;
        Ok(Box::new(SelectionStream {
            schema: input.schema().clone(),
            predicate: self.predicate.clone(),
            input: Upstream::new(input),
        }))
    }

    fn children(&self) -> Vec<Arc<dyn ExecutionPlan>> {
        vec![self.input.clone()]
    }
}

impl Explainable for SelectionExec {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Selection").with_value("predicate", &self.predicate)
    }
}

#[derive(Debug)]
struct SelectionStream {
    schema: Arc<Schema>,
    predicate: Arc<PhysicalScalarExpression>,
    input: Upstream,
}

impl BatchStream for SelectionStream {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn poll_next(&mut self) -> Result<Option<Batch>> {
        let predicate = &self.predicate;
        self.input.pull_map(|batch| {
            let selection = predicate.eval(&batch)?;
            check_boolean(predicate, selection.datatype())?;
            batch.select(&selection_bitmap(&selection)?)
        })
    }

    fn close(&mut self) {
        self.input.close();
    }
}

fn check_boolean(predicate: &PhysicalScalarExpression, datatype: DataType) -> Result<()> {
    if datatype != DataType::Boolean {
        return Err(DbError::with_kind(
            ErrorKind::NonBooleanPredicate,
            "Expected selection predicate to evaluate to a boolean",
        )
        .with_field("predicate", predicate)
        .with_field("got", datatype));
    }
    Ok(())
}

/// Bitmap with bits set only where the predicate is valid and true.
fn selection_bitmap(selection: &Array) -> Result<Bitmap> {
    let mut bitmap = Bitmap::new_with_all_false(selection.logical_len());
    UnaryExecutor::for_each::<PhysicalBool, _>(selection, |idx, val| {
        if val == Some(&true) {
            bitmap.set_unchecked(idx, true);
        }
    })?;
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::arrays::compute::cmp::ComparisonOperator;
    use crate::arrays::scalar::ScalarValue;
    use crate::arrays::testutil::assert_batches_eq;
    use crate::datasource::memory::MemoryDataSource;
    use crate::execution::operators::scan::ScanExec;
    use crate::execution::stream::collect_stream;
    use crate::execution::stream::testutil::TrackedStream;
    use crate::expr::physical::literal_expr::PhysicalLiteralExpr;
    use crate::generate_batch;

    fn scan(batches: Vec<Batch>) -> Arc<dyn ExecutionPlan> {
        let source = Arc::new(MemoryDataSource::try_from_batches(batches).unwrap());
        Arc::new(ScanExec::try_new(source, Vec::new()).unwrap())
    }

    fn mpg_eq(val: f64) -> PhysicalScalarExpression {
        PhysicalScalarExpression::comparison(
            ComparisonOperator::Eq,
            PhysicalScalarExpression::column(1),
            PhysicalScalarExpression::Literal(
                PhysicalLiteralExpr::new(ScalarValue::Float64(val)).unwrap(),
            ),
        )
    }

    #[test]
    fn filter_rows() {
        let input = scan(vec![generate_batch!(
            ("model", ["Mazda RX4", "Mazda RX4 Wag", "Datsun 710"]),
            ("mpg", [21.0, 21.0, 22.8]),
        )]);
        let sel = SelectionExec::try_new(input.clone(), mpg_eq(21.0)).unwrap();
        assert_eq!(input.schema(), sel.schema());

        let batches = collect_stream(sel.execute().unwrap()).unwrap();
        let expected = generate_batch!(
            ("model", ["Mazda RX4", "Mazda RX4 Wag"]),
            ("mpg", [21.0, 21.0]),
        );
        assert_batches_eq(&expected, &batches[0]);
    }

    #[test]
    fn null_predicate_drops_row() {
        let input = scan(vec![generate_batch!(
            ("flag", [Some(true), None, Some(false), Some(true)]),
            ("v", [1, 2, 3, 4]),
        )]);
        let sel = SelectionExec::try_new(input, PhysicalScalarExpression::column(0)).unwrap();

        let batches = collect_stream(sel.execute().unwrap()).unwrap();
        let expected = generate_batch!(("flag", [Some(true), Some(true)]), ("v", [1, 4]));
        assert_batches_eq(&expected, &batches[0]);
    }

    #[test]
    fn empty_batches_still_emitted() {
        let input = scan(vec![
            generate_batch!(("model", ["a", "b"]), ("mpg", [1.0, 2.0])),
            generate_batch!(("model", ["c"]), ("mpg", [21.0])),
        ]);
        let sel = SelectionExec::try_new(input, mpg_eq(21.0)).unwrap();

        let batches = collect_stream(sel.execute().unwrap()).unwrap();
        assert_eq!(2, batches.len());
        assert_eq!(0, batches[0].num_rows());
        assert_eq!(1, batches[1].num_rows());
    }

    #[test]
    fn non_boolean_predicate() {
        let input = scan(vec![generate_batch!(("a", [1, 2]))]);
        let err = SelectionExec::try_new(input, PhysicalScalarExpression::column(0)).unwrap_err();
        assert_eq!(ErrorKind::NonBooleanPredicate, err.kind());
    }

    #[test]
    fn non_boolean_predicate_at_eval() {
        let batch = generate_batch!(("a", [1, 2]));
        let (tracked, closed) = TrackedStream::new(batch.schema().clone(), vec![batch.clone()]);

        let mut stream = SelectionStream {
            schema: batch.schema().clone(),
            predicate: Arc::new(PhysicalScalarExpression::column(0)),
            input: Upstream::new(Box::new(tracked)),
        };

        let err = stream.poll_next().unwrap_err();
        assert_eq!(ErrorKind::NonBooleanPredicate, err.kind());
        assert!(closed.load(Ordering::SeqCst));
        assert!(stream.poll_next().unwrap().is_none());
    }

    #[test]
    fn idempotent() {
        let batch = generate_batch!(("model", ["a", "b", "c"]), ("mpg", [21.0, 3.0, 21.0]));

        let once = SelectionExec::try_new(scan(vec![batch.clone()]), mpg_eq(21.0)).unwrap();
        let inner = SelectionExec::try_new(scan(vec![batch]), mpg_eq(21.0)).unwrap();
        let twice = SelectionExec::try_new(Arc::new(inner), mpg_eq(21.0)).unwrap();

        let a = collect_stream(once.execute().unwrap()).unwrap();
        let b = collect_stream(twice.execute().unwrap()).unwrap();
        assert_batches_eq(&a[0], &b[0]);
    }
}
