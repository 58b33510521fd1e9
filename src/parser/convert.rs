//! Raw string and JSON conversion into [`FieldValue`]s.

use super::value::FieldValue;
use crate::error::{ParseError, Stage};
use crate::schema::{Kind, TypeShape};
use serde_json::Value;
use std::collections::BTreeMap;

/// Boolean literals accepted in paths, query strings and defaults.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Convert one raw string to the primitive kind of `shape`.
///
/// Returns the expected kind on failure, including integers outside the
/// declared width; records and opaque values never convert from a string.
pub fn convert_scalar(raw: &str, shape: &TypeShape) -> Result<FieldValue, Kind> {
    let kind = shape.kind();
    let converted = match kind {
        Kind::String => Some(FieldValue::String(raw.to_string())),
        Kind::Integer => raw
            .parse::<i64>()
            .ok()
            .filter(|v| shape.admits(i128::from(*v)))
            .map(FieldValue::Integer),
        Kind::Unsigned => raw
            .parse::<u64>()
            .ok()
            .filter(|v| shape.admits(i128::from(*v)))
            .map(FieldValue::Unsigned),
        Kind::Float => raw.parse::<f64>().ok().map(FieldValue::Float),
        Kind::Boolean => parse_bool(raw).map(FieldValue::Boolean),
        Kind::Record | Kind::Sequence | Kind::Object => None,
    };
    converted.ok_or(kind)
}

/// Convert raw values for a parameter field.
///
/// Sequence fields take every value; scalar fields take the first.
pub fn convert_raw(
    raws: &[&str],
    shape: &TypeShape,
    stage: Stage,
    field: &str,
) -> Result<FieldValue, ParseError> {
    let failure = |value: &str, expected: Kind| ParseError::InvalidConversion {
        stage,
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };

    match shape.element() {
        Some(item) => raws
            .iter()
            .map(|raw| convert_scalar(raw, item).map_err(|kind| failure(raw, kind)))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::Sequence),
        None => {
            let raw = raws.first().copied().unwrap_or_default();
            convert_scalar(raw, shape).map_err(|kind| failure(raw, kind))
        }
    }
}

/// Split a `default` tag for a field. Sequence defaults are comma separated.
pub fn default_raws<'a>(default: &'a str, shape: &TypeShape) -> Vec<&'a str> {
    if shape.element().is_some() {
        default.split(',').map(str::trim).collect()
    } else {
        vec![default]
    }
}

/// Bind a decoded JSON body against its declared shape.
///
/// Unknown object keys are ignored; absent record fields receive their
/// declared default, if any. Type mismatches report the field path.
pub fn bind_json(value: &Value, shape: &TypeShape, path: &str) -> Result<FieldValue, ParseError> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }

    let resolved = shape.resolve();
    let mismatch = || ParseError::InvalidConversion {
        stage: Stage::Body,
        field: path.to_string(),
        value: describe_json(value),
        expected: resolved.kind(),
    };

    match (&*resolved, value) {
        (TypeShape::String, Value::String(s)) => Ok(FieldValue::String(s.clone())),
        (TypeShape::Integer(_), Value::Number(n)) => n
            .as_i64()
            .filter(|v| resolved.admits(i128::from(*v)))
            .map(FieldValue::Integer)
            .ok_or_else(mismatch),
        (TypeShape::Unsigned(_), Value::Number(n)) => n
            .as_u64()
            .filter(|v| resolved.admits(i128::from(*v)))
            .map(FieldValue::Unsigned)
            .ok_or_else(mismatch),
        (TypeShape::Float, Value::Number(n)) => n.as_f64().map(FieldValue::Float).ok_or_else(mismatch),
        (TypeShape::Boolean, Value::Bool(b)) => Ok(FieldValue::Boolean(*b)),
        (TypeShape::Sequence(item), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| bind_json(v, item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::Sequence),
        (TypeShape::Record(record), Value::Object(map)) => {
            let mut fields = BTreeMap::new();
            for field in &record.fields {
                let key = field.json_name();
                if key == "-" {
                    continue;
                }
                let child_path = format!("{}.{}", path, key);
                match map.get(&key) {
                    Some(v) => {
                        fields.insert(key, bind_json(v, &field.shape, &child_path)?);
                    }
                    None => {
                        if let Some(default) = field.tags.default_value() {
                            let raws = default_raws(default, &field.shape);
                            fields.insert(
                                key,
                                convert_raw(&raws, &field.shape, Stage::Body, &child_path)?,
                            );
                        }
                    }
                }
            }
            Ok(FieldValue::Record(fields))
        }
        (TypeShape::Opaque, other) => Ok(FieldValue::from_json(other)),
        _ => Err(mismatch()),
    }
}

fn describe_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
        Value::Null => "null".to_string(),
    }
}
