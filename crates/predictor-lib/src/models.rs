//! Core data models for the box-office predictor

use crate::features::InputScheme;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single raw attribute value as supplied by a caller
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
    /// Any JSON shape the pipeline has no reading for (bool, object, mixed array).
    /// Kept so that a recognized field with this shape is reported, not dropped.
    Unsupported(String),
}

impl RawValue {
    /// Short description of the value's shape for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "text",
            RawValue::List(_) => "list",
            RawValue::Unsupported(_) => "unsupported value",
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(values: Vec<String>) -> Self {
        RawValue::List(values)
    }
}

impl From<RawValue> for Value {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawValue::Text(s) | RawValue::Unsupported(s) => Value::String(s),
            RawValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        }
    }
}

/// Converts a JSON value into a raw value. `null` means "absent".
fn raw_from_json(value: Value) -> Option<RawValue> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) => RawValue::Number(f),
            None => RawValue::Unsupported(n.to_string()),
        }),
        Value::String(s) => Some(RawValue::Text(s)),
        Value::Array(items) => {
            let members: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect();
            Some(match members {
                Some(list) => RawValue::List(list),
                None => RawValue::Unsupported(Value::Array(items).to_string()),
            })
        }
        other => Some(RawValue::Unsupported(other.to_string())),
    }
}

/// Partial, unordered bag of raw attributes for one prediction request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct RawAttributes {
    values: BTreeMap<String, RawValue>,
}

impl RawAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for RawAttributes {
    fn from(map: Map<String, Value>) -> Self {
        let values = map
            .into_iter()
            .filter_map(|(key, value)| raw_from_json(value).map(|raw| (key, raw)))
            .collect();
        Self { values }
    }
}

impl From<RawAttributes> for Map<String, Value> {
    fn from(attributes: RawAttributes) -> Self {
        attributes
            .values
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect()
    }
}

/// Numeric row whose columns match the feature column list exactly
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl AlignedRow {
    pub(crate) fn new(columns: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named column, if the row carries it
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Currency-scale prediction returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted final box office in currency units, never negative
    pub revenue: f64,
    /// Raw model output in log1p space
    pub log_revenue: f64,
    pub scheme: InputScheme,
    /// SHA-256 over the three artifacts the prediction was made with
    pub model_fingerprint: String,
    pub generated_at: i64,
}

/// HTTP request body for a prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub attributes: RawAttributes,
}

/// Description of the feature contract currently in force
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureListing {
    pub columns: Vec<String>,
    pub scheme: InputScheme,
    pub model_fingerprint: String,
}
