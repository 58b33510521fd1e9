//! # routeschema
//!
//! **routeschema** derives request parsing, validation, error mapping and an
//! [OpenAPI 3.1.1](https://spec.openapis.org/oas/v3.1.1) document from one
//! declarative description of each operation's input type.
//!
//! ## Architecture
//!
//! - **[`schema`]** - Type shapes and the descriptor walker that classifies
//!   fields into path, query and body locations
//! - **[`parser`]** - Request parser and constraint validator producing an
//!   [`parser::Instance`]
//! - **[`error`]** - Error taxonomy and the mapping to `{code, message}`
//! - **[`security`]** - API key and bearer providers, `Multi` OR-composition
//! - **[`registry`]** - Operation registry with per-route and group security
//! - **[`typed`]** - Typed handlers: parse, handle, envelope
//! - **[`envelope`]** - Response envelope wrappers
//! - **[`openapi`]** - Document generator and naming resolver
//! - **[`config`]** / **[`logging`]** - Environment-driven configuration
//!
//! ### Request flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Op as OperationRecord
//!     participant Sec as SecurityScheme
//!     participant Parser as parser::parse
//!     participant Handler as TypedHandler
//!     participant Env as ResponseWrapper
//!
//!     Caller->>Op: serve(request)
//!     Op->>Sec: authenticate (every scheme)
//!     Sec-->>Op: Credential or 401
//!     Op->>Handler: serve
//!     Handler->>Parser: params, query, body, then constraints
//!     Parser-->>Handler: Instance or ParseError (400)
//!     Handler->>Handler: deserialize + handle
//!     Handler->>Env: wrap_success / wrap_error
//!     Env-->>Caller: HandlerResponse
//! ```
//!
//! ## Example
//!
//! ```rust
//! use routeschema::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Greet {
//!     name: String,
//! }
//!
//! impl Describe for Greet {
//!     fn describe() -> TypeShape {
//!         RecordShape::named("Greet")
//!             .field(FieldShape::of::<String>("Name").validate("required"))
//!             .into()
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .get("/greet", handler(|_req, g: Greet| Ok(format!("hello {}", g.name))), &[])
//!     .unwrap();
//!
//! let doc = generate(&registry, &DocumentConfig::default()).unwrap();
//! assert!(doc.paths.contains_key("/greet"));
//! ```

pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod openapi;
pub mod parser;
pub mod path;
pub mod registry;
pub mod request;
pub mod schema;
pub mod security;
pub mod typed;

pub use error::{to_error_result, ErrorInfo, ParseError, SchemaError};
pub use parser::{parse, Instance};
pub use registry::{OperationRecord, Registry, RegistryError};
pub use request::SchemaRequest;
pub use typed::{handler, Handler, HandlerResponse, TypedHandler};

/// Common imports for declaring schemas and registering operations.
pub mod prelude {
    pub use crate::config::DocumentConfig;
    pub use crate::openapi::generate;
    pub use crate::registry::Registry;
    pub use crate::request::SchemaRequest;
    pub use crate::schema::{Describe, FieldShape, RecordShape, TypeShape};
    pub use crate::security::{ApiKeySecurity, BearerSecurity, SecurityScheme};
    pub use crate::typed::handler;
}
