//! Interface document generation.
//!
//! [`generate`] turns a [`crate::registry::Registry`] into a [`Document`]
//! (OpenAPI 3.1.1). [`openapi`] additionally writes the result to the
//! configured output file.

mod build;
pub mod naming;
mod types;
mod write;

pub use build::{generate, DocumentError};
pub use types::{
    Components, Contact, Document, Info, License, MediaType, Operation, Parameter, PathItem,
    RequestBody, Response, SchemaNode, SecurityRequirement, JSON_CONTENT, OPENAPI_VERSION,
    SCHEMA_REF_PREFIX,
};
pub use write::{openapi, write_document};
