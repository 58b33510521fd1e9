use super::shape::Kind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Tags that may carry a `required` marker.
const REQUIRED_CARRIERS: [&str; 5] = ["validate", "binding", "query", "param", "json"];

/// Struct-tag style annotations attached to a field.
///
/// Recognised keys: `json`, `param`, `query`, `default`, `validate`,
/// `binding`. Values follow the usual `name,option,...` convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw tag text.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// First comma-separated segment of a tag, if non-empty.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|tag| tag.split(',').next())
            .filter(|v| !v.is_empty())
    }

    pub fn is_required(&self) -> bool {
        REQUIRED_CARRIERS.iter().any(|key| {
            self.get(key)
                .map(|tag| tag.contains("required"))
                .unwrap_or(false)
        })
    }

    /// Serialized name: `json` tag, else the lowercased field name.
    pub fn json_name(&self, field_name: &str) -> String {
        self.value("json")
            .map(str::to_string)
            .unwrap_or_else(|| field_name.to_lowercase())
    }

    pub fn default_value(&self) -> Option<&str> {
        self.get("default").filter(|v| !v.is_empty())
    }
}

/// String formats understood by the `validate` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Url,
    Uuid,
}

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok());
static UUID_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").ok()
});

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Url => "uri",
            Format::Uuid => "uuid",
        }
    }

    /// Rule name as written in the `validate` tag.
    pub fn rule(self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Url => "url",
            Format::Uuid => "uuid",
        }
    }

    pub fn matches(self, value: &str) -> bool {
        match self {
            Format::Email => EMAIL_RE.as_ref().map(|re| re.is_match(value)).unwrap_or(false),
            Format::Uuid => UUID_RE.as_ref().map(|re| re.is_match(value)).unwrap_or(false),
            Format::Url => url::Url::parse(value).is_ok(),
        }
    }
}

/// Validation constraints of one field, resolved against its kind.
///
/// `min`/`max` in the tag become numeric bounds for numbers, length bounds for
/// strings and item-count bounds for sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub format: Option<Format>,
    pub enumeration: Vec<String>,
    /// Skip every other rule when the value is empty
    pub omit_empty: bool,
}

impl Constraints {
    /// Parse the `validate` tag of `tags` for a field of `kind`.
    pub fn from_tags(tags: &Tags, kind: Kind) -> Self {
        let mut constraints = Constraints::default();
        let Some(rules) = tags.get("validate") else {
            return constraints;
        };

        let mut min = None;
        let mut max = None;
        for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let (name, arg) = match rule.split_once('=') {
                Some((n, a)) => (n.trim(), Some(a.trim())),
                None => (rule, None),
            };
            let bound = arg.and_then(|a| a.parse::<f64>().ok());
            match name {
                "min" | "gte" => min = bound.or(min),
                "max" | "lte" => max = bound.or(max),
                "len" => {
                    min = bound.or(min);
                    max = bound.or(max);
                }
                "oneof" => {
                    constraints.enumeration = arg
                        .map(|a| a.split_whitespace().map(str::to_string).collect())
                        .unwrap_or_default();
                }
                "email" => constraints.format = Some(Format::Email),
                "url" | "uri" => constraints.format = Some(Format::Url),
                "uuid" => constraints.format = Some(Format::Uuid),
                "omitempty" => constraints.omit_empty = true,
                _ => {}
            }
        }

        let as_count = |v: f64| if v < 0.0 { 0 } else { v as u64 };
        match kind {
            Kind::String => {
                constraints.min_length = min.map(as_count);
                constraints.max_length = max.map(as_count);
            }
            Kind::Sequence => {
                constraints.min_items = min.map(as_count);
                constraints.max_items = max.map(as_count);
            }
            k if k.is_numeric() => {
                constraints.minimum = min;
                constraints.maximum = max;
            }
            _ => {}
        }
        constraints
    }

    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }
}
