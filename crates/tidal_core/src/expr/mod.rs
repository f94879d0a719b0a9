//! Logical and physical expressions.
//!
//! Logical expressions reference columns by name. The planner binds them to
//! physical expressions that reference columns by position.

pub mod aggregate_expr;
pub mod alias_expr;
pub mod arith_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod literal_expr;
pub mod physical;

use std::fmt;
use std::ops;

use alias_expr::AliasExpr;
use arith_expr::ArithExpr;
use column_expr::ColumnExpr;
use comparison_expr::ComparisonExpr;
use conjunction_expr::ConjunctionExpr;
use literal_expr::LiteralExpr;
use tidal_error::Result;

use crate::arrays::compute::arith::ArithOperator;
use crate::arrays::compute::boolean::ConjunctionOperator;
use crate::arrays::compute::cmp::ComparisonOperator;
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};
use crate::arrays::scalar::OwnedScalarValue;

/// A scalar expression in a logical plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Alias(AliasExpr),
    Arith(ArithExpr),
    Column(ColumnExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
    Literal(LiteralExpr),
}

impl Expression {
    /// Resolve the field this expression produces against an input schema.
    ///
    /// Errors with `SchemaResolution` if a referenced column doesn't exist,
    /// and with `TypeMismatch` if binary operands disagree on type.
    pub fn to_field(&self, input: &Schema) -> Result<Field> {
        match self {
            Self::Alias(expr) => expr.to_field(input),
            Self::Arith(expr) => expr.to_field(input),
            Self::Column(expr) => expr.to_field(input),
            Self::Comparison(expr) => expr.to_field(input),
            Self::Conjunction(expr) => expr.to_field(input),
            Self::Literal(expr) => Ok(expr.to_field()),
        }
    }

    pub fn datatype(&self, input: &Schema) -> Result<DataType> {
        Ok(self.to_field(input)?.datatype)
    }

    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias(AliasExpr {
            expr: Box::new(self),
            name: name.into(),
        })
    }

    pub fn eq(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::Eq, other)
    }

    pub fn not_eq(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::NotEq, other)
    }

    pub fn lt(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::Lt, other)
    }

    pub fn lt_eq(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::LtEq, other)
    }

    pub fn gt(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::Gt, other)
    }

    pub fn gt_eq(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::GtEq, other)
    }

    pub fn and(self, other: Expression) -> Self {
        Self::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::And,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    pub fn or(self, other: Expression) -> Self {
        Self::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::Or,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    pub fn compare(self, op: ComparisonOperator, other: Expression) -> Self {
        Self::Comparison(ComparisonExpr {
            op,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    fn arith(self, op: ArithOperator, other: Expression) -> Self {
        Self::Arith(ArithExpr {
            op,
            left: Box::new(self),
            right: Box::new(other),
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias(expr) => expr.fmt(f),
            Self::Arith(expr) => expr.fmt(f),
            Self::Column(expr) => expr.fmt(f),
            Self::Comparison(expr) => expr.fmt(f),
            Self::Conjunction(expr) => expr.fmt(f),
            Self::Literal(expr) => expr.fmt(f),
        }
    }
}

macro_rules! impl_arith_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for Expression {
            type Output = Expression;

            fn $method(self, rhs: Expression) -> Expression {
                self.arith($op, rhs)
            }
        }
    };
}

impl_arith_op!(Add, add, ArithOperator::Add);
impl_arith_op!(Sub, sub, ArithOperator::Sub);
impl_arith_op!(Mul, mul, ArithOperator::Mul);
impl_arith_op!(Div, div, ArithOperator::Div);
impl_arith_op!(Rem, rem, ArithOperator::Rem);

/// Reference a column by name.
pub fn col(name: impl Into<String>) -> Expression {
    Expression::Column(ColumnExpr { name: name.into() })
}

/// A non-null literal. The type is taken from the value.
///
/// ```text
/// col("mpg").eq(lit(21.0))
/// ```
pub fn lit(value: impl Into<OwnedScalarValue>) -> Expression {
    let literal = value.into();
    // Untyped nulls default to Utf8, use `lit_null` to pick a type.
    let datatype = literal.datatype().unwrap_or(DataType::Utf8);
    Expression::Literal(LiteralExpr { literal, datatype })
}

/// A null literal of the given type.
pub fn lit_null(datatype: DataType) -> Expression {
    Expression::Literal(LiteralExpr {
        literal: OwnedScalarValue::Null,
        datatype,
    })
}

#[cfg(test)]
mod tests {
    use tidal_error::ErrorKind;

    use super::*;

    fn schema() -> Schema {
        Schema::new([
            Field::new("model", DataType::Utf8),
            Field::new("mpg", DataType::Float64),
            Field::new("cyl", DataType::Int32),
        ])
    }

    #[test]
    fn column_field() {
        let field = col("mpg").to_field(&schema()).unwrap();
        assert_eq!(Field::new("mpg", DataType::Float64), field);
    }

    #[test]
    fn unknown_column() {
        let err = col("hp").to_field(&schema()).unwrap_err();
        assert_eq!(ErrorKind::SchemaResolution, err.kind());
    }

    #[test]
    fn comparison_field() {
        let expr = col("mpg").eq(lit(21.0));
        let field = expr.to_field(&schema()).unwrap();
        assert_eq!(DataType::Boolean, field.datatype);
        assert_eq!("mpg = 21", expr.to_string());
    }

    #[test]
    fn arith_field() {
        let expr = (col("cyl") * lit(2)).alias("double_cyl");
        let field = expr.to_field(&schema()).unwrap();
        assert_eq!(Field::new("double_cyl", DataType::Int32), field);
        assert_eq!("cyl * 2 AS double_cyl", expr.to_string());
    }

    #[test]
    fn arith_mismatch() {
        let err = (col("cyl") * lit(2.0)).to_field(&schema()).unwrap_err();
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }

    #[test]
    fn conjunction_field() {
        let expr = col("cyl").gt(lit(4)).and(col("model").not_eq(lit("Valiant")));
        assert_eq!(DataType::Boolean, expr.datatype(&schema()).unwrap());
        assert_eq!("cyl > 4 AND model != 'Valiant'", expr.to_string());
    }

    #[test]
    fn typed_null_literal() {
        let expr = lit_null(DataType::Int64);
        assert_eq!(DataType::Int64, expr.datatype(&schema()).unwrap());
    }
}
