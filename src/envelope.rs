//! Response envelope strategy.
//!
//! One [`ResponseWrapper`] is selected per process with
//! [`set_response_wrapper`] before serving begins. Until then (or if never
//! set) [`DefaultWrapper`] is used.

use once_cell::sync::OnceCell;
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wraps handler payloads and error pairs into their wire shape.
pub trait ResponseWrapper: Send + Sync {
    fn wrap_success(&self, data: Value) -> Value;
    fn wrap_error(&self, code: &str, message: &str) -> Value;
}

/// `{"success": bool, "data": T|null, "error": {code, message}|null}`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWrapper;

impl ResponseWrapper for DefaultWrapper {
    fn wrap_success(&self, data: Value) -> Value {
        json!({"success": true, "data": data, "error": null})
    }

    fn wrap_error(&self, code: &str, message: &str) -> Value {
        json!({
            "success": false,
            "error": {"code": code, "message": message},
            "data": null
        })
    }
}

/// Bare data on success, `{"error": {code, message}}` on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalWrapper;

impl ResponseWrapper for MinimalWrapper {
    fn wrap_success(&self, data: Value) -> Value {
        data
    }

    fn wrap_error(&self, code: &str, message: &str) -> Value {
        json!({"error": {"code": code, "message": message}})
    }
}

/// Envelope with caller-chosen field names.
///
/// An empty `success_field` omits the flag; an empty `error_field` omits the
/// error slot on success. Data and error default to `data` / `error`.
#[derive(Debug, Clone, Default)]
pub struct CustomWrapper {
    pub success_field: String,
    pub data_field: String,
    pub error_field: String,
    pub add_timestamp: bool,
}

impl CustomWrapper {
    fn data_key(&self) -> &str {
        if self.data_field.is_empty() {
            "data"
        } else {
            &self.data_field
        }
    }

    fn stamp(&self, map: &mut Map<String, Value>) {
        if self.add_timestamp {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            map.insert("timestamp".to_string(), Value::from(now));
        }
    }
}

impl ResponseWrapper for CustomWrapper {
    fn wrap_success(&self, data: Value) -> Value {
        let mut map = Map::new();
        if !self.success_field.is_empty() {
            map.insert(self.success_field.clone(), Value::Bool(true));
        }
        map.insert(self.data_key().to_string(), data);
        if !self.error_field.is_empty() {
            map.insert(self.error_field.clone(), Value::Null);
        }
        self.stamp(&mut map);
        Value::Object(map)
    }

    fn wrap_error(&self, code: &str, message: &str) -> Value {
        let mut map = Map::new();
        if !self.success_field.is_empty() {
            map.insert(self.success_field.clone(), Value::Bool(false));
        }
        let error_key = if self.error_field.is_empty() {
            "error"
        } else {
            &self.error_field
        };
        map.insert(
            error_key.to_string(),
            json!({"code": code, "message": message}),
        );
        map.insert(self.data_key().to_string(), Value::Null);
        self.stamp(&mut map);
        Value::Object(map)
    }
}

static WRAPPER: OnceCell<Box<dyn ResponseWrapper>> = OnceCell::new();
static FALLBACK: DefaultWrapper = DefaultWrapper;

/// Returned when the process-wide wrapper is selected twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeError {
    AlreadyConfigured,
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::AlreadyConfigured => {
                write!(f, "response wrapper already configured for this process")
            }
        }
    }
}

impl std::error::Error for EnvelopeError {}

/// Select the process-wide wrapper. Only the first call succeeds.
pub fn set_response_wrapper<W: ResponseWrapper + 'static>(wrapper: W) -> Result<(), EnvelopeError> {
    WRAPPER
        .set(Box::new(wrapper))
        .map_err(|_| EnvelopeError::AlreadyConfigured)
}

/// The configured wrapper, or [`DefaultWrapper`].
pub fn response_wrapper() -> &'static dyn ResponseWrapper {
    match WRAPPER.get() {
        Some(wrapper) => wrapper.as_ref(),
        None => &FALLBACK,
    }
}
