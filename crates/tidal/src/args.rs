use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tidal_core::arrays::compute::cmp::ComparisonOperator;
use tidal_core::arrays::datatype::DataType;
use tidal_core::arrays::field::{Field, Schema};
use tidal_core::config::DEFAULT_BATCH_SIZE;
use tidal_core::functions::aggregate::AggregateFunction;
use tidal_error::{DbError, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormatArg {
    #[default]
    Human,
    Json,
}

impl From<LogFormatArg> for logutil::LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Human => logutil::LogFormat::HumanReadable,
            LogFormatArg::Json => logutil::LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExplainFormat {
    Text,
    Json,
}

/// Run a query over a CSV file.
///
/// Rows are filtered first, then grouped and aggregated, then projected.
#[derive(Debug, Parser)]
#[clap(name = "tidal")]
#[clap(version)]
pub struct Arguments {
    /// CSV file to read. The first row must be a header.
    pub path: PathBuf,

    /// Column types as `name:type`, one per CSV column in order.
    ///
    /// Columns are read as Utf8 when omitted.
    #[clap(long, value_delimiter = ',')]
    pub schema: Vec<String>,

    /// Keep rows matching `col=value`. Also accepts `!=`, `<`, `<=`, `>`,
    /// `>=`. Repeated filters are combined with AND.
    #[clap(long)]
    pub filter: Vec<String>,

    /// Columns to output.
    #[clap(long, value_delimiter = ',')]
    pub project: Vec<String>,

    /// Columns to group by.
    #[clap(long, value_delimiter = ',')]
    pub group_by: Vec<String>,

    /// Aggregates as `FUNC:col`, e.g. `SUM:mpg`.
    #[clap(long)]
    pub agg: Vec<String>,

    /// Maximum rows per batch.
    #[clap(long, env = "TIDAL_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Print the logical and physical plans before the results.
    #[clap(long, value_enum, num_args = 0..=1, default_missing_value = "text")]
    pub explain: Option<ExplainFormat>,

    /// Include schemas in explain output.
    #[clap(long)]
    pub verbose_explain: bool,

    /// Log verbosity, repeat for more.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[clap(long, value_enum, env = "TIDAL_LOG_FORMAT", default_value_t = LogFormatArg::Human)]
    pub log_format: LogFormatArg,
}

impl Arguments {
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

/// A parsed `--filter` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub column: String,
    pub op: ComparisonOperator,
    pub value: String,
}

impl FilterArg {
    pub fn parse(s: &str) -> Result<Self> {
        // Two character operators first so `>=` isn't read as `>`.
        const OPERATORS: [(&str, ComparisonOperator); 6] = [
            (">=", ComparisonOperator::GtEq),
            ("<=", ComparisonOperator::LtEq),
            ("!=", ComparisonOperator::NotEq),
            ("=", ComparisonOperator::Eq),
            (">", ComparisonOperator::Gt),
            ("<", ComparisonOperator::Lt),
        ];

        for (symbol, op) in OPERATORS {
            if let Some((column, value)) = s.split_once(symbol) {
                let column = column.trim();
                if column.is_empty() {
                    break;
                }
                return Ok(FilterArg {
                    column: column.to_string(),
                    op,
                    value: value.trim().to_string(),
                });
            }
        }

        Err(DbError::with_kind(
            ErrorKind::Parse,
            "Expected filter in the form 'col=value'",
        )
        .with_field("filter", s))
    }
}

/// A parsed `--agg` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggArg {
    pub function: AggregateFunction,
    pub column: String,
}

impl AggArg {
    pub fn parse(s: &str) -> Result<Self> {
        let (function, column) = s.split_once(':').ok_or_else(|| {
            DbError::with_kind(ErrorKind::Parse, "Expected aggregate in the form 'FUNC:col'")
                .with_field("agg", s)
        })?;

        Ok(AggArg {
            function: AggregateFunction::from_name(function)?,
            column: column.trim().to_string(),
        })
    }
}

/// Parse `--schema` entries into a schema.
pub fn parse_schema(entries: &[String]) -> Result<Schema> {
    let fields = entries
        .iter()
        .map(|entry| {
            let (name, datatype) = entry.split_once(':').ok_or_else(|| {
                DbError::with_kind(ErrorKind::Parse, "Expected schema field as 'name:type'")
                    .with_field("field", entry)
            })?;
            Ok(Field::new(name.trim(), DataType::from_name(datatype)?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Schema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filters() {
        assert_eq!(
            FilterArg {
                column: "mpg".to_string(),
                op: ComparisonOperator::Eq,
                value: "21".to_string(),
            },
            FilterArg::parse("mpg=21").unwrap()
        );
        assert_eq!(ComparisonOperator::GtEq, FilterArg::parse("cyl >= 6").unwrap().op);
        assert_eq!(ComparisonOperator::NotEq, FilterArg::parse("model!=Valiant").unwrap().op);
        assert_eq!(
            ErrorKind::Parse,
            FilterArg::parse("mpg").unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::Parse,
            FilterArg::parse("=21").unwrap_err().kind()
        );
    }

    #[test]
    fn parse_aggs() {
        let agg = AggArg::parse("sum:mpg").unwrap();
        assert_eq!(AggregateFunction::Sum, agg.function);
        assert_eq!("mpg", agg.column);

        assert!(AggArg::parse("median:mpg").is_err());
        assert!(AggArg::parse("sum").is_err());
    }

    #[test]
    fn parse_schema_entries() {
        let schema = parse_schema(&["model:utf8".to_string(), "cyl:int".to_string()]).unwrap();
        assert_eq!(
            Schema::new([
                Field::new("model", DataType::Utf8),
                Field::new("cyl", DataType::Int32),
            ]),
            schema
        );
        assert!(parse_schema(&["model".to_string()]).is_err());
    }

    #[test]
    fn cli_parses() {
        let args = Arguments::try_parse_from([
            "tidal",
            "cars.csv",
            "--schema",
            "model:utf8,mpg:float64,cyl:int32",
            "--group-by",
            "cyl",
            "--agg",
            "SUM:mpg",
            "--agg",
            "COUNT:model",
            "--explain",
        ])
        .unwrap();

        assert_eq!(3, args.schema.len());
        assert_eq!(vec!["cyl"], args.group_by);
        assert_eq!(2, args.agg.len());
        assert_eq!(Some(ExplainFormat::Text), args.explain);
        assert_eq!(tracing::Level::WARN, args.log_level());
    }
}
