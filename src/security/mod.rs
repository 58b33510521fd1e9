//! # Security Module
//!
//! Authentication capabilities attached to registered operations.
//!
//! A [`SecurityProvider`] is a named capability with a document fragment (its
//! `securitySchemes` entry) and a predicate over the live request. The
//! engine only ever talks to providers through that trait; concrete token
//! verification (JWT signatures, key stores) lives in the caller-supplied
//! validation closures.
//!
//! [`SecurityScheme`] is what routes carry:
//!
//! - [`SecurityScheme::Single`] wraps one provider.
//! - [`SecurityScheme::Multi`] groups providers with OR semantics: the request
//!   is accepted by the first provider that accepts it. Documents expand a
//!   `Multi` into one requirement object per component, never one combined
//!   (AND) requirement.
//!
//! ```rust
//! use routeschema::security::{ApiKeySecurity, BearerSecurity, SecurityScheme};
//!
//! let api_key = ApiKeySecurity::header("ApiKeyAuth", "X-API-Key")
//!     .validator(|_req, key| key == "secret");
//! let bearer = BearerSecurity::new("BearerAuth").bearer_format("JWT");
//!
//! let either = SecurityScheme::multi(
//!     "ApiKeyOrBearer",
//!     vec![SecurityScheme::single(api_key), SecurityScheme::single(bearer)],
//! );
//! assert_eq!(either.requirements().len(), 2);
//! ```

mod api_key;
mod bearer;

pub use api_key::{ApiKeyLocation, ApiKeySecurity};
pub use bearer::BearerSecurity;

use crate::error::SchemaError;
use crate::request::SchemaRequest;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Caller-supplied check for an extracted key or token.
pub type CredentialValidator = Arc<dyn Fn(&SchemaRequest, &str) -> bool + Send + Sync>;

const MULTI_FAILURE: &str = "Valid authentication required (API key, bearer token, etc.)";

/// A credential accepted by a provider, made available to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Name of the accepting scheme
    pub scheme: String,
    /// `api_key` or `bearer`
    pub method: String,
    pub value: String,
}

/// Authentication capability.
pub trait SecurityProvider: Send + Sync {
    /// Name used as the `securitySchemes` key and in requirements.
    fn name(&self) -> &str;

    /// The `securitySchemes` entry for this provider.
    fn document(&self) -> Map<String, Value>;

    /// Extract and check the credential, or explain the rejection.
    fn authenticate(&self, req: &SchemaRequest) -> Result<Credential, SchemaError>;

    fn validate(&self, req: &SchemaRequest) -> bool {
        self.authenticate(req).is_ok()
    }
}

/// A route's security requirement.
#[derive(Clone)]
pub enum SecurityScheme {
    Single(Arc<dyn SecurityProvider>),
    /// Any component is sufficient. Owns no document fragment.
    Multi {
        name: String,
        schemes: Vec<Arc<dyn SecurityProvider>>,
    },
}

impl SecurityScheme {
    pub fn single<P: SecurityProvider + 'static>(provider: P) -> Self {
        SecurityScheme::Single(Arc::new(provider))
    }

    /// Compose schemes with OR semantics. Nested `Multi`s are flattened.
    pub fn multi(name: impl Into<String>, schemes: Vec<SecurityScheme>) -> Self {
        let schemes = schemes
            .into_iter()
            .flat_map(|scheme| scheme.components().to_vec())
            .collect();
        SecurityScheme::Multi {
            name: name.into(),
            schemes,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SecurityScheme::Single(provider) => provider.name(),
            SecurityScheme::Multi { name, .. } => name,
        }
    }

    /// Single-provider components, in declared order.
    pub fn components(&self) -> &[Arc<dyn SecurityProvider>] {
        match self {
            SecurityScheme::Single(provider) => std::slice::from_ref(provider),
            SecurityScheme::Multi { schemes, .. } => schemes,
        }
    }

    pub fn validate(&self, req: &SchemaRequest) -> bool {
        self.components().iter().any(|p| p.validate(req))
    }

    /// Authenticate with the first accepting component.
    ///
    /// A single scheme reports its own rejection; a `Multi` reports the
    /// generic "valid authentication required" message.
    pub fn authenticate(&self, req: &SchemaRequest) -> Result<Credential, SchemaError> {
        match self {
            SecurityScheme::Single(provider) => provider.authenticate(req),
            SecurityScheme::Multi { name, schemes } => {
                for provider in schemes {
                    match provider.authenticate(req) {
                        Ok(credential) => return Ok(credential),
                        Err(err) => {
                            debug!(scheme = %provider.name(), multi = %name, reason = %err.message, "Component scheme rejected request");
                        }
                    }
                }
                Err(SchemaError::unauthorized(MULTI_FAILURE))
            }
        }
    }

    /// OpenAPI requirement objects: one `{name: []}` per component.
    pub fn requirements(&self) -> Vec<BTreeMap<String, Vec<String>>> {
        self.components()
            .iter()
            .map(|p| BTreeMap::from([(p.name().to_string(), Vec::new())]))
            .collect()
    }
}

impl fmt::Debug for SecurityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityScheme::Single(provider) => f.debug_tuple("Single").field(&provider.name()).finish(),
            SecurityScheme::Multi { name, schemes } => {
                let names: Vec<&str> = schemes.iter().map(|p| p.name()).collect();
                f.debug_struct("Multi")
                    .field("name", name)
                    .field("schemes", &names)
                    .finish()
            }
        }
    }
}
