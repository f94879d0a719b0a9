use std::path::Path;
use std::sync::Arc;

use tidal_core::arrays::datatype::DataType;
use tidal_core::arrays::field::{Field, Schema};
use tidal_core::engine::ExecutionContext;
use tidal_core::execution::stream::{BatchIter, BatchStream};
use tidal_core::explain::node::ExplainNode;
use tidal_core::expr::aggregate_expr::sum;
use tidal_core::expr::{col, lit};
use tidal_csv::CsvDataSource;

fn cars(batch_size: usize) -> Arc<CsvDataSource> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/cars.csv");
    let source = CsvDataSource::try_from_path(path)
        .unwrap()
        .with_schema(Schema::new([
            Field::new("model", DataType::Utf8),
            Field::new("mpg", DataType::Float64),
            Field::new("cyl", DataType::Int32),
            Field::new("hp", DataType::Int64),
        ]))
        .unwrap()
        .with_batch_size(batch_size)
        .unwrap();
    Arc::new(source)
}

#[test]
fn close_mid_stream() {
    let ctx = ExecutionContext::default();
    let df = ctx
        .read_source(cars(2))
        .filter(col("cyl").eq(lit(6)))
        .unwrap()
        .project(vec![col("model")])
        .unwrap();

    let mut stream = ctx.execute(&df).unwrap();
    assert!(stream.poll_next().unwrap().is_some());

    stream.close();
    assert!(stream.poll_next().unwrap().is_none());
    // Idempotent.
    stream.close();
}

#[test]
fn batches_pulled_lazily() {
    let ctx = ExecutionContext::default();
    let df = ctx
        .read_source(cars(3))
        .project(vec![col("model"), col("hp")])
        .unwrap();

    let sizes = BatchIter::new(ctx.execute(&df).unwrap())
        .map(|batch| batch.map(|b| b.num_rows()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(vec![3, 3, 3, 1], sizes);
}

#[test]
fn aggregate_emits_once() {
    let ctx = ExecutionContext::default();
    let df = ctx
        .read_source(cars(4))
        .aggregate(vec![col("cyl")], vec![sum(col("hp"))])
        .unwrap();

    let mut stream = ctx.execute(&df).unwrap();
    let batch = stream.poll_next().unwrap().unwrap();
    assert_eq!(3, batch.num_rows());
    assert!(stream.poll_next().unwrap().is_none());
    assert!(stream.poll_next().unwrap().is_none());
}

#[test]
fn re_executing_plan_restarts() {
    let ctx = ExecutionContext::default();
    let df = ctx.read_source(cars(1024));
    let plan = ctx.create_physical_plan(&df).unwrap();

    for _ in 0..2 {
        let rows: usize = BatchIter::new(plan.execute().unwrap())
            .map(|b| b.unwrap().num_rows())
            .sum();
        assert_eq!(10, rows);
    }
}

#[test]
fn explain_plans() {
    let ctx = ExecutionContext::default();
    let df = ctx
        .read_source(cars(1024))
        .filter(col("mpg").gt(lit(20.0)))
        .unwrap()
        .aggregate(vec![col("cyl")], vec![sum(col("hp")).alias("total_hp")])
        .unwrap();

    let logical = ExplainNode::new_from_logical_plan(false, df.logical_plan())
        .format_text()
        .unwrap();
    let logical_lines: Vec<_> = logical.lines().collect();
    assert_eq!(
        "Aggregate (aggregates = [SUM(hp) AS total_hp], groups = [cyl])",
        logical_lines[0]
    );
    assert_eq!("  Selection (predicate = mpg > 20)", logical_lines[1]);
    assert!(logical_lines[2].starts_with("    Scan (source = csv("));

    let plan = ctx.create_physical_plan(&df).unwrap();
    let physical = ExplainNode::new_from_physical_plan(false, plan.as_ref())
        .format_text()
        .unwrap();
    let physical_lines: Vec<_> = physical.lines().collect();
    assert_eq!(
        "HashAggregate (aggregates = [SUM(@3)], groups = [@2])",
        physical_lines[0]
    );
    assert_eq!("  Selection (predicate = (@1 > 20))", physical_lines[1]);
}
