use super::{Credential, CredentialValidator, SecurityProvider};
use crate::error::SchemaError;
use crate::request::SchemaRequest;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

const PREFIX: &str = "bearer ";

/// `Authorization: Bearer <token>` authentication.
///
/// The prefix match is case-insensitive. Token verification is delegated to
/// the validator; without one any non-empty token is accepted.
#[derive(Clone)]
pub struct BearerSecurity {
    name: String,
    description: Option<String>,
    bearer_format: Option<String>,
    validator: Option<CredentialValidator>,
}

impl BearerSecurity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            bearer_format: None,
            validator: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn bearer_format(mut self, format: impl Into<String>) -> Self {
        self.bearer_format = Some(format.into());
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaRequest, &str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }
}

impl SecurityProvider for BearerSecurity {
    fn name(&self) -> &str {
        &self.name
    }

    fn document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("type".into(), Value::from("http"));
        doc.insert("scheme".into(), Value::from("bearer"));
        if let Some(format) = &self.bearer_format {
            doc.insert("bearerFormat".into(), Value::from(format.as_str()));
        }
        if let Some(description) = &self.description {
            doc.insert("description".into(), Value::from(description.as_str()));
        }
        doc
    }

    fn authenticate(&self, req: &SchemaRequest) -> Result<Credential, SchemaError> {
        let header = req
            .get_header("authorization")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SchemaError::unauthorized("Authorization header required"))?;

        let has_prefix = header
            .get(..PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(PREFIX));
        if !has_prefix {
            return Err(SchemaError::unauthorized("Invalid authorization header format"));
        }

        let token = header[PREFIX.len()..].trim();
        if token.is_empty() {
            return Err(SchemaError::unauthorized("Bearer token required"));
        }
        if let Some(validate) = &self.validator {
            if !validate(req, token) {
                return Err(SchemaError::unauthorized("Invalid bearer token"));
            }
        }
        Ok(Credential {
            scheme: self.name.clone(),
            method: "bearer".to_string(),
            value: token.to_string(),
        })
    }
}

impl fmt::Debug for BearerSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerSecurity")
            .field("name", &self.name)
            .field("bearer_format", &self.bearer_format)
            .finish()
    }
}
