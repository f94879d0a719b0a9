use std::fmt;

use tidal_error::Result;

use super::Expression;
use crate::arrays::field::{Field, Schema};
use crate::functions::aggregate::AggregateFunction;

/// An aggregate function applied to a single input expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    pub input: Box<Expression>,
    /// Optional output name overriding the default.
    pub alias: Option<String>,
}

impl AggregateExpr {
    pub fn new(function: AggregateFunction, input: Expression) -> Self {
        AggregateExpr {
            function,
            input: Box::new(input),
            alias: None,
        }
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Output name. COUNT is always named `COUNT` unless aliased.
    pub fn output_name(&self) -> String {
        match (&self.alias, self.function) {
            (Some(alias), _) => alias.clone(),
            (None, AggregateFunction::Count) => self.function.name().to_string(),
            (None, _) => format!("{}({})", self.function, self.input),
        }
    }

    pub fn to_field(&self, input: &Schema) -> Result<Field> {
        let input_type = self.input.datatype(input)?;
        let datatype = self.function.return_type(input_type)?;
        Ok(Field::new(self.output_name(), datatype))
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function, self.input)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

pub fn min(input: Expression) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Min, input)
}

pub fn max(input: Expression) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Max, input)
}

pub fn sum(input: Expression) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Sum, input)
}

pub fn count(input: Expression) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Count, input)
}

pub fn avg(input: Expression) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Avg, input)
}
