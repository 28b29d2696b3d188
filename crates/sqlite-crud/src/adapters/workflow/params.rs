use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    adapters::coerce_i64,
    cli::DEFAULT_DB_PATH,
    core::Record,
    error::{AppError, AppResult},
};

/// Source of node parameters, resolved per input item the way a workflow
/// engine evaluates expressions against each item.
pub trait ParameterSource {
    fn parameter(&self, name: &str, item: usize) -> Option<&Value>;

    fn string(&self, name: &str, item: usize, default: &str) -> AppResult<String> {
        match self.parameter(name, item) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(AppError::validation(format!(
                "parameter {name} must be a string, got {other}"
            ))),
        }
    }

    fn number(&self, name: &str, item: usize, default: i64) -> AppResult<i64> {
        match self.parameter(name, item) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => coerce_i64(v, name),
        }
    }

    /// Reads a `{"values": [{"column": .., "value": ..}]}` collection.
    /// Values are taken as text; a repeated column keeps its last value.
    fn column_values(&self, name: &str, item: usize) -> AppResult<Record> {
        let mut record = Record::new();
        let Some(collection) = self.parameter(name, item) else {
            return Ok(record);
        };
        let Some(values) = collection.get("values").and_then(|v| v.as_array()) else {
            return Ok(record);
        };
        for pair in values {
            let column = pair
                .get("column")
                .and_then(|c| c.as_str())
                .ok_or_else(|| AppError::validation(format!("{name}: every entry needs a column")))?;
            let value = match pair.get("value") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            record.insert(column, value);
        }
        Ok(record)
    }
}

/// Node-level parameters with optional per-item overrides.
#[derive(Debug, Clone, Default)]
pub struct NodeParameters {
    base: Map<String, Value>,
    per_item: Vec<Option<Map<String, Value>>>,
}

impl NodeParameters {
    pub fn new(base: Map<String, Value>) -> Self {
        Self {
            base,
            per_item: Vec::new(),
        }
    }

    pub fn with_item_overrides(mut self, per_item: Vec<Option<Map<String, Value>>>) -> Self {
        self.per_item = per_item;
        self
    }
}

impl ParameterSource for NodeParameters {
    fn parameter(&self, name: &str, item: usize) -> Option<&Value> {
        self.per_item
            .get(item)
            .and_then(|o| o.as_ref())
            .and_then(|o| o.get(name))
            .or_else(|| self.base.get(name))
    }
}

/// Database credentials. There is no authentication; only the path matters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

/// One node run: configuration plus the input items.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub continue_on_fail: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl Execution {
    /// Parameters with each item's `parameters` object layered on top.
    pub fn node_parameters(&self) -> NodeParameters {
        let per_item = self
            .items
            .iter()
            .map(|item| item.get("parameters").and_then(|p| p.as_object()).cloned())
            .collect();
        NodeParameters::new(self.parameters.clone()).with_item_overrides(per_item)
    }
}
