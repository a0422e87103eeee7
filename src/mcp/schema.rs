//! Declarative input schemas for tools.
//!
//! Each tool describes its arguments as a table of [`FieldSpec`]s. The same
//! table is used to validate and coerce incoming arguments and to render the
//! JSON Schema advertised by `tools/list`.

use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Finite floating point number.
    Number,
    Integer,
}

/// Predicate applied after a value has been coerced to its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    None,
    /// Text that is not blank after trimming.
    NonEmpty,
    /// Number `>= 0`.
    NonNegative,
    /// Integer within `min..=max`.
    Range { min: i64, max: i64 },
}

/// Value used when an optional field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Integer(i64),
}

/// One argument of a tool.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub constraint: Constraint,
    pub required: bool,
    pub fallback: Option<Fallback>,
    pub description: &'static str,
}

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Number(f64),
    Integer(i64),
}

/// Validated arguments, keyed by field name.
///
/// Accessors return `None` for absent optional fields without a fallback.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Args(HashMap<&'static str, ArgValue>);

impl Args {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ArgValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}

/// Checks `raw` against `fields`, collecting every problem found.
///
/// `raw` may be `null` (treated as no arguments) or an object. Fields not
/// named in the table are ignored.
pub fn validate(fields: &[FieldSpec], raw: &Value) -> Result<Args, Vec<String>> {
    let empty = Map::new();
    let obj = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => return Err(vec!["arguments must be an object".to_string()]),
    };

    let mut args = Args::default();
    let mut problems = Vec::new();

    for field in fields {
        match obj.get(field.name).filter(|v| !v.is_null()) {
            Some(value) => match check_field(field, value) {
                Ok(v) => {
                    args.0.insert(field.name, v);
                }
                Err(problem) => problems.push(format!("`{}` {}", field.name, problem)),
            },
            None => match field.fallback {
                Some(Fallback::Integer(n)) => {
                    args.0.insert(field.name, ArgValue::Integer(n));
                }
                None if field.required => problems.push(format!("`{}` is required", field.name)),
                None => {}
            },
        }
    }

    if problems.is_empty() {
        Ok(args)
    } else {
        Err(problems)
    }
}

fn check_field(field: &FieldSpec, value: &Value) -> Result<ArgValue, String> {
    let coerced = match field.kind {
        FieldKind::Text => value
            .as_str()
            .map(|s| ArgValue::Text(s.to_string()))
            .ok_or("must be a string")?,
        FieldKind::Number => coerce_number(value)
            .map(ArgValue::Number)
            .ok_or("must be a number")?,
        FieldKind::Integer => coerce_integer(value)
            .map(ArgValue::Integer)
            .ok_or("must be an integer")?,
    };

    let violation = match (field.constraint, &coerced) {
        (Constraint::NonEmpty, ArgValue::Text(s)) if s.trim().is_empty() => {
            Some("must not be empty".to_string())
        }
        (Constraint::NonNegative, ArgValue::Number(n)) if *n < 0.0 => {
            Some("must be zero or greater".to_string())
        }
        (Constraint::Range { min, .. }, ArgValue::Integer(n)) if *n < min => {
            Some(format!("must be an integer >= {min}"))
        }
        (Constraint::Range { max, .. }, ArgValue::Integer(n)) if *n > max => {
            Some(format!("must be an integer <= {max}"))
        }
        _ => None,
    };

    match violation {
        Some(problem) => Err(problem),
        None => Ok(coerced),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Renders `fields` as a JSON Schema object.
pub fn json_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        let mut prop = match field.kind {
            FieldKind::Text => json!({ "type": "string" }),
            FieldKind::Number => json!({ "type": "number" }),
            FieldKind::Integer => json!({ "type": "integer" }),
        };
        match field.constraint {
            Constraint::NonEmpty => prop["minLength"] = json!(1),
            Constraint::NonNegative => prop["minimum"] = json!(0),
            Constraint::Range { min, max } => {
                prop["minimum"] = json!(min);
                prop["maximum"] = json!(max);
            }
            Constraint::None => {}
        }
        if let Some(Fallback::Integer(n)) = field.fallback {
            prop["default"] = json!(n);
        }
        if !field.description.is_empty() {
            prop["description"] = json!(field.description);
        }
        if field.required {
            required.push(field.name);
        }
        properties.insert(field.name.to_string(), prop);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}
