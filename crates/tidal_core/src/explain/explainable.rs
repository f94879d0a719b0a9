use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arrays::field::Schema;

/// Description of a single plan node, logical or physical.
///
/// Properties are keyed by name and print in key order so explain output is
/// deterministic. The output schema is kept apart from the properties and is
/// only filled in by verbose explains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainEntry {
    /// Operator name, e.g. `Selection` or `HashAggregate`.
    pub name: String,
    pub properties: BTreeMap<String, ExplainValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl ExplainEntry {
    pub fn new(name: impl Into<String>) -> Self {
        ExplainEntry {
            name: name.into(),
            properties: BTreeMap::new(),
            schema: None,
        }
    }

    /// Set a property holding one expression or name.
    pub fn with_value(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.properties
            .insert(key.into(), ExplainValue::Single(value.to_string()));
        self
    }

    /// Set a property holding a list, e.g. projected columns or group
    /// expressions.
    pub fn with_values<S: fmt::Display>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.properties
            .insert(key.into(), ExplainValue::List(values));
        self
    }

    pub fn with_schema(mut self, schema: &Schema) -> Self {
        self.schema = Some(schema.to_string());
        self
    }
}

impl fmt::Display for ExplainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.properties.is_empty() && self.schema.is_none() {
            return Ok(());
        }

        f.write_str(" (")?;
        let mut sep = "";
        for (key, value) in &self.properties {
            write!(f, "{sep}{key} = {value}")?;
            sep = ", ";
        }
        if let Some(schema) = &self.schema {
            write!(f, "{sep}schema = {schema}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplainValue {
    Single(String),
    List(Vec<String>),
}

impl fmt::Display for ExplainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => f.write_str(v),
            Self::List(vs) => write!(f, "[{}]", vs.join(", ")),
        }
    }
}

/// Plan nodes that can describe themselves, not including their children.
pub trait Explainable {
    fn explain_entry(&self) -> ExplainEntry;
}
