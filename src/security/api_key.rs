use super::{Credential, CredentialValidator, SecurityProvider};
use crate::error::SchemaError;
use crate::request::SchemaRequest;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Where an API key is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

impl ApiKeyLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Query => "query",
            ApiKeyLocation::Cookie => "cookie",
        }
    }
}

/// API key carried in a header, query parameter or cookie.
///
/// Without a validator any non-empty key is accepted.
#[derive(Clone)]
pub struct ApiKeySecurity {
    name: String,
    description: Option<String>,
    location: ApiKeyLocation,
    key_name: String,
    validator: Option<CredentialValidator>,
}

impl ApiKeySecurity {
    pub fn new(name: impl Into<String>, location: ApiKeyLocation, key_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            location,
            key_name: key_name.into(),
            validator: None,
        }
    }

    pub fn header(name: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self::new(name, ApiKeyLocation::Header, key_name)
    }

    pub fn query(name: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self::new(name, ApiKeyLocation::Query, key_name)
    }

    pub fn cookie(name: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self::new(name, ApiKeyLocation::Cookie, key_name)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaRequest, &str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn location(&self) -> ApiKeyLocation {
        self.location
    }

    fn extract<'a>(&self, req: &'a SchemaRequest) -> Option<&'a str> {
        let key = match self.location {
            ApiKeyLocation::Header => req.get_header(&self.key_name),
            ApiKeyLocation::Query => req.get_query_param(&self.key_name),
            ApiKeyLocation::Cookie => req.get_cookie(&self.key_name),
        };
        key.filter(|k| !k.is_empty())
    }
}

impl SecurityProvider for ApiKeySecurity {
    fn name(&self) -> &str {
        &self.name
    }

    fn document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("type".into(), Value::from("apiKey"));
        doc.insert("in".into(), Value::from(self.location.as_str()));
        doc.insert("name".into(), Value::from(self.key_name.as_str()));
        if let Some(description) = &self.description {
            doc.insert("description".into(), Value::from(description.as_str()));
        }
        doc
    }

    fn authenticate(&self, req: &SchemaRequest) -> Result<Credential, SchemaError> {
        let key = self
            .extract(req)
            .ok_or_else(|| SchemaError::unauthorized("API key required"))?;
        if let Some(validate) = &self.validator {
            if !validate(req, key) {
                return Err(SchemaError::unauthorized("Invalid API key"));
            }
        }
        Ok(Credential {
            scheme: self.name.clone(),
            method: "api_key".to_string(),
            value: key.to_string(),
        })
    }
}

impl fmt::Debug for ApiKeySecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeySecurity")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("key_name", &self.key_name)
            .finish()
    }
}
