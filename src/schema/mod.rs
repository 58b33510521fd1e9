//! # Schema Module
//!
//! Declarative description of operation inputs and outputs.
//!
//! - [`shape`] - the [`TypeShape`] tree and the [`Describe`] trait
//! - [`tags`] - struct-tag style annotations and validation constraints
//! - [`descriptor`] - the walker classifying fields into path, query and body

pub mod descriptor;
pub mod shape;
pub mod tags;

pub use descriptor::{
    describe, describe_fields, BodyDescriptor, FieldDescriptor, Location, SchemaDescriptor,
};
pub use shape::{Describe, FieldShape, Kind, RecordShape, RecursiveShape, TypeShape};
pub use tags::{Constraints, Format, Tags};
