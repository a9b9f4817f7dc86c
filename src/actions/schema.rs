//! Typed parameter schemas and argument validation
//!
//! Model output is loosely typed JSON. [`ActionSchema::validate`] is the single
//! boundary that turns it into [`Arguments`]: every required parameter must be
//! present, values are coerced to the declared type where unambiguous, and any
//! failure rejects the whole request. Parameters the schema does not declare
//! are ignored.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Semantic type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    StringList,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "number",
            ParamType::Boolean => "boolean",
            ParamType::StringList => "array",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "number",
            ParamType::Boolean => "boolean",
            ParamType::StringList => "list of strings",
        };
        f.write_str(name)
    }
}

/// A normalized argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    StringList(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("missing required parameter `{0}`")]
    Missing(String),
    #[error("parameter `{param}` must be a {expected}, got {found}")]
    Invalid {
        param: String,
        expected: ParamType,
        found: String,
    },
}

/// One declared parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub description: &'static str,
    pub default: Option<ArgValue>,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description,
            default: None,
        }
    }

    pub fn with_default(mut self, value: ArgValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Declared contract of one action
#[derive(Debug, Clone)]
pub struct ActionSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ActionSchema {
    /// Validate and normalize raw arguments
    pub fn validate(&self, raw: &Value) -> Result<Arguments, ValidationError> {
        let empty = Map::new();
        let object = match raw {
            Value::Object(map) => map,
            // Some providers send no args at all for a zero-arg call
            Value::Null => &empty,
            other => return Err(ValidationError::NotAnObject(json_kind(other))),
        };

        let mut values = BTreeMap::new();
        for spec in &self.params {
            let supplied = object.get(spec.name).filter(|v| !is_blank(v));
            let value = match (supplied, &spec.default) {
                (Some(raw), _) => coerce(spec, raw)?,
                (None, Some(default)) => default.clone(),
                (None, None) => return Err(ValidationError::Missing(spec.name.to_string())),
            };
            values.insert(spec.name, value);
        }

        Ok(Arguments { values })
    }

    /// JSON schema advertised to the model
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.params {
            let mut property = json!({
                "type": spec.ty.json_type(),
                "description": spec.description,
            });
            if spec.ty == ParamType::StringList {
                property["items"] = json!({ "type": "string" });
            }
            properties.insert(spec.name.to_string(), property);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Arguments that passed validation, keyed by parameter name
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    values: BTreeMap<&'static str, ArgValue>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn string(&self, name: &str) -> Result<String, ValidationError> {
        match self.get(name) {
            Some(ArgValue::String(s)) => Ok(s.clone()),
            other => Err(mismatch(name, ParamType::String, other)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ValidationError> {
        match self.get(name) {
            Some(ArgValue::Integer(n)) => Ok(*n),
            other => Err(mismatch(name, ParamType::Integer, other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, ValidationError> {
        match self.get(name) {
            Some(ArgValue::Float(n)) => Ok(*n),
            other => Err(mismatch(name, ParamType::Float, other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ValidationError> {
        match self.get(name) {
            Some(ArgValue::Boolean(b)) => Ok(*b),
            other => Err(mismatch(name, ParamType::Boolean, other)),
        }
    }

    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ValidationError> {
        match self.get(name) {
            Some(ArgValue::StringList(items)) => Ok(items.clone()),
            other => Err(mismatch(name, ParamType::StringList, other)),
        }
    }
}

fn mismatch(name: &str, expected: ParamType, found: Option<&ArgValue>) -> ValidationError {
    match found {
        None => ValidationError::Missing(name.to_string()),
        Some(value) => ValidationError::Invalid {
            param: name.to_string(),
            expected,
            found: format!("{value:?}"),
        },
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce(spec: &ParamSpec, raw: &Value) -> Result<ArgValue, ValidationError> {
    let coerced = match spec.ty {
        ParamType::String => coerce_string(raw).map(ArgValue::String),
        ParamType::Integer => coerce_integer(raw).map(ArgValue::Integer),
        ParamType::Float => coerce_float(raw).map(ArgValue::Float),
        ParamType::Boolean => coerce_boolean(raw).map(ArgValue::Boolean),
        ParamType::StringList => coerce_string_list(raw).map(ArgValue::StringList),
    };

    coerced.ok_or_else(|| ValidationError::Invalid {
        param: spec.name.to_string(),
        expected: spec.ty,
        found: match raw {
            Value::String(s) => format!("\"{s}\""),
            other => json_kind(other).to_string(),
        },
    })
}

fn coerce_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)] // guarded by the range and fract checks
fn coerce_integer(raw: &Value) -> Option<i64> {
    let as_integral = |f: f64| {
        (f.is_finite() && f.fract().abs() < f64::EPSILON && f.abs() < 9.0e15).then_some(f as i64)
    };
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(as_integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(as_integral))
        }
        _ => None,
    }
}

fn coerce_float(raw: &Value) -> Option<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn coerce_boolean(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_string_list(raw: &Value) -> Option<Vec<String>> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ActionSchema {
        ActionSchema {
            name: "sample",
            description: "sample action",
            params: vec![
                ParamSpec::required("name", ParamType::String, "a name"),
                ParamSpec::required("count", ParamType::Integer, "a count"),
                ParamSpec::required("rate", ParamType::Float, "a rate"),
                ParamSpec::required("enabled", ParamType::Boolean, "a flag"),
                ParamSpec::required("labels", ParamType::StringList, "labels"),
                ParamSpec::required("state", ParamType::String, "a state")
                    .with_default(ArgValue::String("draft".to_string())),
            ],
        }
    }

    #[test]
    fn test_accepts_well_typed_arguments() {
        let args = schema()
            .validate(&json!({
                "name": "Acme",
                "count": 3,
                "rate": 1.5,
                "enabled": true,
                "labels": ["a", "b"],
                "state": "final"
            }))
            .unwrap();

        assert_eq!(args.string("name").unwrap(), "Acme");
        assert_eq!(args.integer("count").unwrap(), 3);
        assert!((args.float("rate").unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(args.boolean("enabled").unwrap());
        assert_eq!(args.string_list("labels").unwrap(), vec!["a", "b"]);
        assert_eq!(args.string("state").unwrap(), "final");
    }

    #[test]
    fn test_coerces_numeric_strings_and_words() {
        let args = schema()
            .validate(&json!({
                "name": 560_001,
                "count": "42",
                "rate": "18%",
                "enabled": "yes",
                "labels": "bulk, fragile"
            }))
            .unwrap();

        assert_eq!(args.string("name").unwrap(), "560001");
        assert_eq!(args.integer("count").unwrap(), 42);
        assert!((args.float("rate").unwrap() - 18.0).abs() < f64::EPSILON);
        assert!(args.boolean("enabled").unwrap());
        assert_eq!(args.string_list("labels").unwrap(), vec!["bulk", "fragile"]);
    }

    #[test]
    fn test_integral_float_is_an_integer() {
        let args = schema()
            .validate(&json!({
                "name": "x", "count": 12.0, "rate": 1, "enabled": false, "labels": []
            }))
            .unwrap();
        assert_eq!(args.integer("count").unwrap(), 12);
    }

    #[test]
    fn test_default_fills_absent_parameter() {
        let args = schema()
            .validate(&json!({
                "name": "x", "count": 1, "rate": 1, "enabled": false, "labels": []
            }))
            .unwrap();
        assert_eq!(args.string("state").unwrap(), "draft");
    }

    #[test]
    fn test_missing_required_is_named() {
        let err = schema()
            .validate(&json!({ "name": "x", "rate": 1, "enabled": false, "labels": [] }))
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("count".to_string()));
        assert_eq!(err.to_string(), "missing required parameter `count`");
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let err = schema()
            .validate(&json!({
                "name": "   ", "count": 1, "rate": 1, "enabled": false, "labels": []
            }))
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("name".to_string()));
    }

    #[test]
    fn test_coercion_failure_rejects_request() {
        let err = schema()
            .validate(&json!({
                "name": "x", "count": "a dozen", "rate": 1, "enabled": false, "labels": []
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Invalid { ref param, expected: ParamType::Integer, .. } if param == "count"
        ));
    }

    #[test]
    fn test_fractional_integer_rejected() {
        let err = schema()
            .validate(&json!({
                "name": "x", "count": 2.5, "rate": 1, "enabled": false, "labels": []
            }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_parameters_ignored() {
        let args = schema()
            .validate(&json!({
                "name": "x", "count": 1, "rate": 1, "enabled": false, "labels": [],
                "store_id": "ST-FORGED"
            }))
            .unwrap();
        assert!(args.get("store_id").is_none());
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = schema().validate(&json!(["name"])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject("array"));
    }

    #[test]
    fn test_json_schema_lists_required() {
        let schema_json = schema().to_json_schema();
        let required = schema_json["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
        assert!(!required.contains(&json!("state")));
        assert_eq!(schema_json["properties"]["labels"]["items"]["type"], "string");
        assert_eq!(schema_json["properties"]["rate"]["type"], "number");
    }
}
