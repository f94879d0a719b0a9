pub mod arith_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod literal_expr;

use std::fmt;
use std::sync::Arc;

use arith_expr::PhysicalArithExpr;
use column_expr::PhysicalColumnExpr;
use comparison_expr::PhysicalComparisonExpr;
use conjunction_expr::PhysicalConjunctionExpr;
use literal_expr::PhysicalLiteralExpr;
use tidal_error::{DbError, ErrorKind, Result};

use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::compute::arith::ArithOperator;
use crate::arrays::compute::boolean::ConjunctionOperator;
use crate::arrays::compute::cmp::ComparisonOperator;
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};
use crate::functions::aggregate::{Accumulator, AggregateFunction};

/// An expression evaluated against a batch, producing one array.
///
/// Column references are bound to positions ahead of time. Nothing here looks
/// up columns by name.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalScalarExpression {
    Arith(PhysicalArithExpr),
    Column(PhysicalColumnExpr),
    Comparison(PhysicalComparisonExpr),
    Conjunction(PhysicalConjunctionExpr),
    Literal(PhysicalLiteralExpr),
}

impl PhysicalScalarExpression {
    /// Evaluate the expression on a batch.
    ///
    /// The resulting array has the same number of rows as the batch.
    pub fn eval(&self, batch: &Batch) -> Result<Arc<Array>> {
        match self {
            Self::Arith(expr) => expr.eval(batch),
            Self::Column(expr) => expr.eval(batch),
            Self::Comparison(expr) => expr.eval(batch),
            Self::Conjunction(expr) => expr.eval(batch),
            Self::Literal(expr) => expr.eval(batch),
        }
    }

    /// Output type of the expression given the input schema.
    ///
    /// Performs the same type checks evaluation would, so a plan can be
    /// rejected before any data flows.
    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Self::Arith(expr) => expr.datatype(schema),
            Self::Column(expr) => expr.datatype(schema),
            Self::Comparison(expr) => expr.datatype(schema),
            Self::Conjunction(expr) => expr.datatype(schema),
            Self::Literal(expr) => Ok(expr.datatype),
        }
    }

    pub fn column(idx: usize) -> Self {
        Self::Column(PhysicalColumnExpr::new(idx))
    }

    pub fn arith(op: ArithOperator, left: Self, right: Self) -> Self {
        Self::Arith(PhysicalArithExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn comparison(op: ComparisonOperator, left: Self, right: Self) -> Self {
        Self::Comparison(PhysicalComparisonExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn conjunction(op: ConjunctionOperator, left: Self, right: Self) -> Self {
        Self::Conjunction(PhysicalConjunctionExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

impl fmt::Display for PhysicalScalarExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arith(expr) => expr.fmt(f),
            Self::Column(expr) => expr.fmt(f),
            Self::Comparison(expr) => expr.fmt(f),
            Self::Conjunction(expr) => expr.fmt(f),
            Self::Literal(expr) => expr.fmt(f),
        }
    }
}

/// Both sides of a binary expression must agree on length and type.
pub(crate) fn check_binary_inputs(
    op: &dyn fmt::Display,
    left: &Array,
    right: &Array,
) -> Result<()> {
    if left.logical_len() != right.logical_len() {
        return Err(DbError::with_kind(
            ErrorKind::TypeMismatch,
            format!("Operands to '{op}' have differing lengths"),
        )
        .with_field("left", left.logical_len())
        .with_field("right", right.logical_len()));
    }
    check_binary_types(op, left.datatype(), right.datatype())?;
    Ok(())
}

/// Returns the shared operand type.
pub(crate) fn check_binary_types(
    op: &dyn fmt::Display,
    left: DataType,
    right: DataType,
) -> Result<DataType> {
    if left != right {
        return Err(DbError::with_kind(
            ErrorKind::TypeMismatch,
            format!("Operands to '{op}' have differing types"),
        )
        .with_field("left", left)
        .with_field("right", right));
    }
    Ok(left)
}

/// An aggregate over a single input expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalAggregateExpression {
    /// The function producing accumulators.
    pub function: AggregateFunction,
    /// Expression producing the values to aggregate.
    pub input: PhysicalScalarExpression,
    /// Type of `input` against the aggregate's input schema.
    pub input_type: DataType,
    /// Output type of the aggregate.
    pub output_type: DataType,
    /// Name of the output field.
    pub name: String,
}

impl PhysicalAggregateExpression {
    /// Type check the aggregate against the schema of its input.
    pub fn try_new(
        function: AggregateFunction,
        input: PhysicalScalarExpression,
        input_schema: &Schema,
    ) -> Result<Self> {
        let input_type = input.datatype(input_schema)?;
        let output_type = function.return_type(input_type)?;
        let name = match function {
            AggregateFunction::Count => function.name().to_string(),
            _ => format!("{function}({input})"),
        };

        Ok(PhysicalAggregateExpression {
            function,
            input,
            input_type,
            output_type,
            name,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn create_accumulator(&self) -> Result<Box<dyn Accumulator>> {
        self.function.create_accumulator(self.input_type)
    }

    pub fn output_field(&self) -> Field {
        Field::new(self.name.clone(), self.output_type)
    }
}

impl fmt::Display for PhysicalAggregateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function, self.input)
    }
}
