//! Operation registry.
//!
//! Routes are registered once at startup: each registration records the
//! method, path, input schema, response type and ordered security schemes of
//! an operation. After startup the registry is only read (request serving and
//! document generation), so it carries no locks. Registering while requests
//! are being served is a programming error; build the registry first, then
//! share it behind an `Arc`.

use crate::envelope::{response_wrapper, ResponseWrapper};
use crate::request::SchemaRequest;
use crate::schema::{describe, SchemaDescriptor, TypeShape};
use crate::security::SecurityScheme;
use crate::typed::{HandlerResponse, TypedHandler};
use http::Method;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Methods an operation can be registered under.
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An operation already exists for this method and path
    Duplicate { method: Method, path: String },
    UnsupportedMethod(Method),
    /// Security attached to a route that was never registered
    UnknownOperation { method: Method, path: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate { method, path } => {
                write!(f, "operation {} {} is already registered", method, path)
            }
            RegistryError::UnsupportedMethod(method) => {
                write!(f, "method {} cannot be registered as an operation", method)
            }
            RegistryError::UnknownOperation { method, path } => {
                write!(f, "no operation registered for {} {}", method, path)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// One registered operation. Immutable once the registry is built.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub method: Method,
    /// Route pattern in gin form, e.g. `/items/:id`
    pub path: String,
    pub schema: SchemaDescriptor,
    pub input: TypeShape,
    pub response: Option<TypeShape>,
    pub security: Vec<SecurityScheme>,
    handler: Option<TypedHandler>,
}

impl OperationRecord {
    /// Record serving `handler`, taking its input and response shapes.
    pub fn new(method: Method, path: impl Into<String>, handler: TypedHandler) -> Self {
        Self {
            method,
            path: path.into(),
            schema: handler.descriptor().clone(),
            input: handler.input_shape().clone(),
            response: Some(handler.output_shape().clone()),
            security: Vec::new(),
            handler: Some(handler),
        }
    }

    /// Record without a handler, for documentation only.
    pub fn described(
        method: Method,
        path: impl Into<String>,
        input: TypeShape,
        response: Option<TypeShape>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            schema: describe(&input),
            input,
            response,
            security: Vec::new(),
            handler: None,
        }
    }

    pub fn with_security(mut self, schemes: &[SecurityScheme]) -> Self {
        self.security.extend_from_slice(schemes);
        self
    }

    pub fn handler(&self) -> Option<&TypedHandler> {
        self.handler.as_ref()
    }

    /// Serve with the process-wide envelope. `None` when no handler is bound.
    pub fn serve(&self, req: SchemaRequest) -> Option<HandlerResponse> {
        self.serve_with(req, response_wrapper())
    }

    /// Enforce every security scheme, then run the handler.
    ///
    /// Each scheme must accept the request (a `Multi` scheme accepts through
    /// any component); the first rejection answers 401.
    pub fn serve_with(
        &self,
        mut req: SchemaRequest,
        wrapper: &dyn ResponseWrapper,
    ) -> Option<HandlerResponse> {
        let handler = self.handler.as_ref()?;
        for scheme in &self.security {
            match scheme.authenticate(&req) {
                Ok(credential) => req.credentials.push(credential),
                Err(err) => {
                    debug!(method = %self.method, path = %self.path, scheme = %scheme.name(), "Authentication failed");
                    return Some(HandlerResponse::error(
                        401,
                        wrapper.wrap_error(&err.code, &err.message),
                    ));
                }
            }
        }
        Some(handler.serve_with(&req, wrapper))
    }
}

fn key(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

/// All operations of an API, keyed by `METHOD path`.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    operations: BTreeMap<String, OperationRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation. Rejects duplicates and unsupported methods.
    pub fn register(&mut self, record: OperationRecord) -> Result<(), RegistryError> {
        if !SUPPORTED_METHODS.contains(&record.method) {
            return Err(RegistryError::UnsupportedMethod(record.method));
        }
        let k = key(&record.method, &record.path);
        if self.operations.contains_key(&k) {
            return Err(RegistryError::Duplicate {
                method: record.method,
                path: record.path,
            });
        }
        info!(
            method = %record.method,
            path = %record.path,
            schema = record.schema.name.as_deref().unwrap_or("-"),
            security = record.security.len(),
            "Operation registered"
        );
        self.operations.insert(k, record);
        Ok(())
    }

    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: TypedHandler,
        security: &[SecurityScheme],
    ) -> Result<(), RegistryError> {
        self.register(OperationRecord::new(method, path, handler).with_security(security))
    }

    pub fn get(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::GET, path, handler, security)
    }

    pub fn post(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::POST, path, handler, security)
    }

    pub fn put(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::PUT, path, handler, security)
    }

    pub fn delete(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::DELETE, path, handler, security)
    }

    pub fn patch(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::PATCH, path, handler, security)
    }

    /// Append security schemes to an existing operation.
    pub fn secure(
        &mut self,
        method: &Method,
        path: &str,
        schemes: &[SecurityScheme],
    ) -> Result<(), RegistryError> {
        let record = self
            .operations
            .get_mut(&key(method, path))
            .ok_or_else(|| RegistryError::UnknownOperation {
                method: method.clone(),
                path: path.to_string(),
            })?;
        record.security.extend_from_slice(schemes);
        Ok(())
    }

    /// Routes registered through the group get `prefix` prepended and the
    /// group's schemes appended after their own.
    pub fn group(&mut self, prefix: &str, security: &[SecurityScheme]) -> RouteGroup<'_> {
        RouteGroup {
            registry: self,
            prefix: prefix.trim_end_matches('/').to_string(),
            security: security.to_vec(),
        }
    }

    pub fn operation(&self, method: &Method, path: &str) -> Option<&OperationRecord> {
        self.operations.get(&key(method, path))
    }

    /// Security schemes of an operation, empty when unknown or public.
    pub fn security(&self, method: &Method, path: &str) -> &[SecurityScheme] {
        self.operation(method, path)
            .map(|op| op.security.as_slice())
            .unwrap_or(&[])
    }

    pub fn typed_handler(&self, method: &Method, path: &str) -> Option<&TypedHandler> {
        self.operation(method, path).and_then(OperationRecord::handler)
    }

    /// Operations in `METHOD path` order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.values()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Registration scope sharing a path prefix and security schemes.
pub struct RouteGroup<'r> {
    registry: &'r mut Registry,
    prefix: String,
    security: Vec<SecurityScheme>,
}

impl RouteGroup<'_> {
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: TypedHandler,
        security: &[SecurityScheme],
    ) -> Result<(), RegistryError> {
        let full = format!("{}{}", self.prefix, path);
        let mut schemes = security.to_vec();
        schemes.extend(self.security.iter().cloned());
        self.registry.route(method, &full, handler, &schemes)
    }

    pub fn get(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::GET, path, handler, security)
    }

    pub fn post(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::POST, path, handler, security)
    }

    pub fn put(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::PUT, path, handler, security)
    }

    pub fn delete(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::DELETE, path, handler, security)
    }

    pub fn patch(&mut self, path: &str, handler: TypedHandler, security: &[SecurityScheme]) -> Result<(), RegistryError> {
        self.route(Method::PATCH, path, handler, security)
    }

    /// Nested group; schemes of the inner group come before the outer's.
    pub fn group(&mut self, prefix: &str, security: &[SecurityScheme]) -> RouteGroup<'_> {
        let mut schemes = security.to_vec();
        schemes.extend(self.security.iter().cloned());
        RouteGroup {
            prefix: format!("{}{}", self.prefix, prefix.trim_end_matches('/')),
            registry: &mut *self.registry,
            security: schemes,
        }
    }
}
