use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A parsed field value.
///
/// Closed over the kinds a request can carry, so every conversion has an
/// exhaustive match instead of a dynamic type switch.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    Record(BTreeMap<String, FieldValue>),
    Sequence(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// Convert an arbitrary JSON value without a target shape.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Unsigned(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Array(items) => FieldValue::Sequence(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => FieldValue::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Unsigned(u) => Value::from(*u),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            FieldValue::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Null => Value::Null,
        }
    }

    /// Zero value of its kind (empty string, 0, false, empty collection, null).
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::String(s) => s.is_empty(),
            FieldValue::Integer(i) => *i == 0,
            FieldValue::Unsigned(u) => *u == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Boolean(b) => !*b,
            FieldValue::Record(fields) => fields.is_empty(),
            FieldValue::Sequence(items) => items.is_empty(),
            FieldValue::Null => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Unsigned(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Unsigned(u) => Some(*u as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text form used by `oneof` comparisons.
    pub(crate) fn literal(&self) -> Option<String> {
        match self {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Unsigned(u) => Some(u.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn child(&self, segment: &str) -> Option<&FieldValue> {
        let (key, indexes) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };
        let mut current = if key.is_empty() {
            self
        } else {
            match self {
                FieldValue::Record(fields) => fields.get(key)?,
                _ => return None,
            }
        };
        for index in indexes
            .split(']')
            .filter_map(|part| part.strip_prefix('['))
        {
            let i: usize = index.parse().ok()?;
            current = match current {
                FieldValue::Sequence(items) => items.get(i)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// A validated schema instance.
///
/// The root is a record keyed by serialized field names: containers appear as
/// nested records (`params`, `query`, `body`), auto-detected query fields sit
/// at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    root: FieldValue,
}

impl Instance {
    pub(crate) fn new(root: BTreeMap<String, FieldValue>) -> Self {
        Self {
            root: FieldValue::Record(root),
        }
    }

    pub fn root(&self) -> &FieldValue {
        &self.root
    }

    /// Look up a value by path, e.g. `params.id` or `body.items[0].name`.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        path.split('.')
            .try_fold(&self.root, |value, segment| value.child(segment))
    }

    pub fn to_value(&self) -> Value {
        self.root.to_json()
    }

    /// Deserialize into a concrete schema type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}
