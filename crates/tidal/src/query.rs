use std::io::Write;
use std::sync::Arc;

use tidal_core::arrays::format::pretty_format_batches;
use tidal_core::arrays::scalar::ScalarValue;
use tidal_core::config::ExecutionConfig;
use tidal_core::datasource::DataSource;
use tidal_core::engine::ExecutionContext;
use tidal_core::execution::stream::collect_stream;
use tidal_core::explain::node::ExplainNode;
use tidal_core::expr::aggregate_expr::AggregateExpr;
use tidal_core::expr::{Expression, col, lit, lit_null};
use tidal_core::logical::dataframe::DataFrame;
use tidal_csv::CsvDataSource;
use tidal_error::{Result, ResultExt};
use tracing::info;

use crate::args::{AggArg, Arguments, ExplainFormat, FilterArg, parse_schema};

/// Run the query described by `args`, writing output to `out`.
pub fn run(args: &Arguments, out: &mut impl Write) -> Result<()> {
    let config = ExecutionConfig::default().with_batch_size(args.batch_size)?;
    let ctx = ExecutionContext::try_new(config)?;

    let source = open_source(args)?;
    let df = build_dataframe(&ctx, Arc::new(source), args)?;
    let plan = ctx.create_physical_plan(&df)?;

    if let Some(format) = args.explain {
        let logical = ExplainNode::new_from_logical_plan(args.verbose_explain, df.logical_plan());
        let physical = ExplainNode::new_from_physical_plan(args.verbose_explain, plan.as_ref());

        match format {
            ExplainFormat::Text => {
                writeln!(out, "Logical plan:\n{}", logical.format_text()?)?;
                writeln!(out, "Physical plan:\n{}", physical.format_text()?)?;
            }
            ExplainFormat::Json => {
                let json = serde_json::json!({
                    "logical": logical,
                    "physical": physical,
                });
                let s = serde_json::to_string_pretty(&json)
                    .context("failed to serialize explain output")?;
                writeln!(out, "{s}")?;
            }
        }
    }

    let batches = collect_stream(plan.execute()?)?;
    let num_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    info!(num_rows, num_batches = batches.len(), "query complete");

    writeln!(out, "{}", pretty_format_batches(&plan.schema(), &batches)?)?;

    Ok(())
}

fn open_source(args: &Arguments) -> Result<CsvDataSource> {
    let source = CsvDataSource::try_from_path(&args.path)?.with_batch_size(args.batch_size)?;
    if args.schema.is_empty() {
        return Ok(source);
    }
    source.with_schema(parse_schema(&args.schema)?)
}

/// Filter, then aggregate, then project.
pub fn build_dataframe(
    ctx: &ExecutionContext,
    source: Arc<dyn DataSource>,
    args: &Arguments,
) -> Result<DataFrame> {
    let schema = source.schema();
    let mut df = ctx.read_source(source);

    let mut predicate: Option<Expression> = None;
    for filter in &args.filter {
        let filter = FilterArg::parse(filter)?;
        let idx = schema.find_index(&filter.column)?;
        let datatype = schema.fields[idx].datatype;

        // Literal takes the column's type so the comparison type checks.
        let value = ScalarValue::try_parse(&filter.value, datatype)?;
        let value = if value.is_null() {
            lit_null(datatype)
        } else {
            lit(value)
        };

        let expr = col(filter.column).compare(filter.op, value);
        predicate = Some(match predicate {
            Some(prev) => prev.and(expr),
            None => expr,
        });
    }
    if let Some(predicate) = predicate {
        df = df.filter(predicate)?;
    }

    if !args.group_by.is_empty() || !args.agg.is_empty() {
        let groups = args.group_by.iter().map(col).collect();
        let aggs = args
            .agg
            .iter()
            .map(|agg| {
                let agg = AggArg::parse(agg)?;
                Ok(AggregateExpr::new(agg.function, col(agg.column)))
            })
            .collect::<Result<Vec<_>>>()?;
        df = df.aggregate(groups, aggs)?;
    }

    if !args.project.is_empty() {
        df = df.project(args.project.iter().map(col).collect())?;
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tidal_core::arrays::testutil::assert_batches_eq_unordered;
    use tidal_core::generate_batch;
    use tidal_error::ErrorKind;

    use super::*;

    const CARS: &str = "\
model,mpg,cyl
Mazda RX4,21.0,6
Mazda RX4 Wag,21.0,6
Datsun 710,22.5,4
Valiant,18.0,6
";

    fn run_args(argv: &[&str]) -> Result<Vec<tidal_core::arrays::batch::Batch>> {
        let args = Arguments::try_parse_from(
            ["tidal", "cars.csv", "--schema", "model:utf8,mpg:float64,cyl:int32"]
                .iter()
                .chain(argv),
        )
        .unwrap();

        let ctx = ExecutionContext::default();
        let source = CsvDataSource::try_from_bytes(CARS.as_bytes())?
            .with_schema(parse_schema(&args.schema)?)?;
        let df = build_dataframe(&ctx, Arc::new(source), &args)?;
        ctx.collect(&df)
    }

    #[test]
    fn filter_and_project() {
        let batches = run_args(&["--filter", "mpg=21", "--project", "model"]).unwrap();
        let expected = generate_batch!(("model", ["Mazda RX4", "Mazda RX4 Wag"]));
        assert_batches_eq_unordered(&expected, &batches[0]);
    }

    #[test]
    fn group_by_sum() {
        let batches = run_args(&["--group-by", "cyl", "--agg", "SUM:mpg"]).unwrap();
        let expected = generate_batch!(("cyl", [6, 4]), ("SUM(mpg)", [60.0, 22.5]));
        assert_batches_eq_unordered(&expected, &batches[0]);
    }

    #[test]
    fn filter_bad_value() {
        let err = run_args(&["--filter", "cyl=six"]).unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind());
    }

    #[test]
    fn filter_unknown_column() {
        let err = run_args(&["--filter", "hp>100"]).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }
}
