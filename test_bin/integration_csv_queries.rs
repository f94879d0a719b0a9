use std::path::Path;
use std::sync::Arc;

use tidal_core::arrays::batch::Batch;
use tidal_core::arrays::datatype::DataType;
use tidal_core::arrays::field::{Field, Schema};
use tidal_core::arrays::scalar::ScalarValue;
use tidal_core::arrays::testutil::{assert_batches_eq, assert_batches_eq_unordered};
use tidal_core::config::ExecutionConfig;
use tidal_core::engine::ExecutionContext;
use tidal_core::expr::aggregate_expr::{avg, count, max, min, sum};
use tidal_core::expr::{col, lit};
use tidal_core::generate_batch;
use tidal_core::logical::dataframe::DataFrame;
use tidal_csv::CsvDataSource;
use tidal_error::ErrorKind;

fn testdata(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

fn int_source(name: &str, batch_size: usize) -> CsvDataSource {
    CsvDataSource::try_from_path(testdata(name))
        .unwrap()
        .with_schema(Schema::new([
            Field::new("mpg", DataType::Int32),
            Field::new("cyl", DataType::Int32),
        ]))
        .unwrap()
        .with_batch_size(batch_size)
        .unwrap()
}

fn cars(ctx: &ExecutionContext) -> DataFrame {
    let source = CsvDataSource::try_from_path(testdata("cars.csv"))
        .unwrap()
        .with_schema(Schema::new([
            Field::new("model", DataType::Utf8),
            Field::new("mpg", DataType::Float64),
            Field::new("cyl", DataType::Int32),
            Field::new("hp", DataType::Int64),
        ]))
        .unwrap()
        .with_batch_size(ctx.config().batch_size)
        .unwrap();
    ctx.read_source(Arc::new(source))
}

fn concat_rows(batches: &[Batch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

#[test]
fn filter_equal_mpg() {
    logutil::init_test();

    let ctx = ExecutionContext::default();
    let df = ctx
        .read_source(Arc::new(int_source("filter.csv", 1024)))
        .filter(col("mpg").eq(lit(21)))
        .unwrap();

    let batches = ctx.collect(&df).unwrap();
    let expected = generate_batch!(("mpg", [21, 21]), ("cyl", [160, 200]));
    assert_batches_eq(&expected, &batches[0]);
}

#[test]
fn sum_group_by_cyl() {
    let ctx = ExecutionContext::default();
    let df = ctx
        .read_source(Arc::new(int_source("groups.csv", 1024)))
        .aggregate(vec![col("cyl")], vec![sum(col("mpg"))])
        .unwrap();

    let batches = ctx.collect(&df).unwrap();
    assert_eq!(1, batches.len());

    let expected = generate_batch!(("cyl", [160, 200]), ("SUM(mpg)", [43, 30]));
    assert_batches_eq_unordered(&expected, &batches[0]);
}

#[test]
fn aggregate_invariant_to_batch_size() {
    let ctx = ExecutionContext::default();
    let run = |batch_size| {
        let df = ctx
            .read_source(Arc::new(int_source("groups.csv", batch_size)))
            .aggregate(vec![col("cyl")], vec![sum(col("mpg")), count(col("mpg"))])
            .unwrap();
        ctx.collect(&df).unwrap().remove(0)
    };

    let whole = run(1024);
    for batch_size in [1, 2] {
        assert_batches_eq_unordered(&whole, &run(batch_size));
    }
}

#[test]
fn cars_aggregates_by_cylinders() {
    let ctx = ExecutionContext::try_new(ExecutionConfig::default().with_batch_size(3).unwrap())
        .unwrap();
    let df = cars(&ctx)
        .aggregate(
            vec![col("cyl")],
            vec![
                max(col("hp")).alias("max_hp"),
                min(col("model")).alias("first_model"),
                count(col("mpg")).alias("num"),
            ],
        )
        .unwrap();

    let batches = ctx.collect(&df).unwrap();
    let expected = generate_batch!(
        ("cyl", [6, 4, 8]),
        ("max_hp", [123_i64, 95, 245]),
        ("first_model", ["Hornet 4 Drive", "Datsun 710", "Duster 360"]),
        ("num", [5_i64, 3, 2]),
    );
    assert_batches_eq_unordered(&expected, &batches[0]);
}

#[test]
fn global_avg_and_max_with_null() {
    let ctx = ExecutionContext::default();
    let df = cars(&ctx)
        .filter(col("cyl").eq(lit(6)))
        .unwrap()
        .aggregate(Vec::new(), vec![avg(col("hp")), max(col("mpg"))])
        .unwrap();

    let batches = ctx.collect(&df).unwrap();
    assert_eq!(
        vec![ScalarValue::Float64(111.6), ScalarValue::Float64(21.4)],
        batches[0].row(0).unwrap()
    );
}

#[test]
fn filter_conjunction_then_project() {
    let ctx = ExecutionContext::default();
    let df = cars(&ctx)
        .filter(col("cyl").gt(lit(4)).and(col("hp").lt(lit(110_i64))))
        .unwrap()
        .project(vec![col("model"), (col("hp") * lit(2_i64)).alias("double_hp")])
        .unwrap();

    let batches = ctx.collect(&df).unwrap();
    let expected = generate_batch!(("model", ["Valiant"]), ("double_hp", [210_i64]));
    assert_batches_eq(&expected, &batches[0]);
}

#[test]
fn filter_rows_never_increase() {
    let ctx = ExecutionContext::try_new(ExecutionConfig::default().with_batch_size(4).unwrap())
        .unwrap();
    let all = ctx.collect(&cars(&ctx)).unwrap();
    let filtered = ctx
        .collect(&cars(&ctx).filter(col("mpg").gt_eq(lit(21.0))).unwrap())
        .unwrap();

    assert_eq!(10, concat_rows(&all));
    assert_eq!(6, concat_rows(&filtered));
    for (a, b) in all.iter().zip(&filtered) {
        assert!(b.num_rows() <= a.num_rows());
        assert_eq!(a.schema(), b.schema());
    }
}

#[test]
fn int_times_float_mismatch() {
    let ctx = ExecutionContext::default();
    let err = cars(&ctx)
        .project(vec![col("cyl") * lit(2.0)])
        .unwrap_err();
    assert_eq!(ErrorKind::TypeMismatch, err.kind());
}

#[test]
fn untyped_csv_reads_strings() {
    let ctx = ExecutionContext::default();
    let source = CsvDataSource::try_from_path(testdata("filter.csv")).unwrap();
    let df = ctx
        .read_source(Arc::new(source))
        .filter(col("mpg").eq(lit("21")))
        .unwrap()
        .project(vec![col("cyl")])
        .unwrap();

    let batches = ctx.collect(&df).unwrap();
    let expected = generate_batch!(("cyl", ["160", "200"]));
    assert_batches_eq(&expected, &batches[0]);
}

#[test]
fn missing_column() {
    let ctx = ExecutionContext::default();
    let err = cars(&ctx).project(vec![col("wt")]).unwrap_err();
    assert_eq!(ErrorKind::SchemaResolution, err.kind());
}
