//! Type descriptor walker.
//!
//! Turns a [`TypeShape`] describing an operation's input into a
//! [`SchemaDescriptor`]: every field classified by request location, with its
//! kind, constraints, default and required flag resolved from the tags.
//!
//! Top-level fields named `Params`, `Query` or `Body` (case-insensitive) are
//! containers whose own fields are path parameters, query parameters and body
//! fields respectively. Any other top-level field is treated as a query
//! parameter when it is a primitive or a sequence of primitives, and left
//! unclassified otherwise. A record is never a path or query parameter.

use super::shape::{FieldShape, Kind, RecordShape, TypeShape};
use super::tags::Constraints;
use std::fmt;

/// Where a field's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Path,
    Query,
    Body,
    Unclassified,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path => write!(f, "path"),
            Location::Query => write!(f, "query"),
            Location::Body => write!(f, "body"),
            Location::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// One classified field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Declared field name
    pub name: String,
    /// Serialized (json) name used in instances and documents
    pub source_tag: String,
    /// Name looked up in the request location (path param or query key)
    pub lookup: String,
    pub location: Location,
    pub kind: Kind,
    /// Full shape of the field, pointers included
    pub shape: TypeShape,
    pub constraints: Constraints,
    pub default: Option<String>,
    pub required: bool,
    /// Serialized name of the enclosing `Params`/`Query`/`Body` container
    pub container: Option<String>,
}

impl FieldDescriptor {
    /// Dotted path of the field inside a parsed instance, e.g. `params.id`.
    pub fn instance_path(&self) -> String {
        match &self.container {
            Some(c) => format!("{}.{}", c, self.source_tag),
            None => self.source_tag.clone(),
        }
    }
}

/// The `Body` container of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    /// Serialized name of the container field
    pub field: String,
    pub shape: TypeShape,
    /// Fields of the body record (empty when the body is not a record)
    pub fields: Vec<FieldDescriptor>,
    /// Whether the body record has any required field
    pub required: bool,
}

/// An operation's input description, partitioned by location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDescriptor {
    /// Name of the described input type, if it has one
    pub name: Option<String>,
    pub params: Vec<FieldDescriptor>,
    pub query: Vec<FieldDescriptor>,
    pub body: Option<BodyDescriptor>,
    pub unclassified: Vec<FieldDescriptor>,
    /// Serialized names of the `Params`/`Query` containers present
    pub containers: Vec<String>,
}

impl SchemaDescriptor {
    /// All classified fields in declaration order: params, query, body.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.params
            .iter()
            .chain(self.query.iter())
            .chain(self.body.iter().flat_map(|b| b.fields.iter()))
            .chain(self.unclassified.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
            && self.query.is_empty()
            && self.body.is_none()
            && self.unclassified.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Container {
    Params,
    Query,
    Body,
}

fn container_of(field: &FieldShape) -> Option<Container> {
    match field.name.to_ascii_lowercase().as_str() {
        "params" => Some(Container::Params),
        "query" => Some(Container::Query),
        "body" => Some(Container::Body),
        _ => None,
    }
}

/// Describe an operation input type.
///
/// Non-record shapes yield an empty descriptor rather than an error.
pub fn describe(shape: &TypeShape) -> SchemaDescriptor {
    let resolved = shape.resolve();
    let TypeShape::Record(record) = &*resolved else {
        return SchemaDescriptor::default();
    };

    let mut descriptor = SchemaDescriptor {
        name: record.name.clone(),
        ..SchemaDescriptor::default()
    };

    for field in &record.fields {
        let json = field.json_name();
        match container_of(field) {
            Some(Container::Body) => {
                let body_shape = field.shape.resolve().into_owned();
                let (fields, required) = match &body_shape {
                    TypeShape::Record(r) => (
                        describe_fields(r, Location::Body, Some(&json)),
                        r.has_required_fields(),
                    ),
                    _ => (Vec::new(), field.tags.is_required()),
                };
                descriptor.body = Some(BodyDescriptor {
                    field: json,
                    shape: body_shape,
                    fields,
                    required,
                });
            }
            Some(kind @ (Container::Params | Container::Query)) => {
                let inner = field.shape.resolve();
                let TypeShape::Record(r) = &*inner else {
                    descriptor
                        .unclassified
                        .push(describe_field(field, Location::Unclassified, None));
                    continue;
                };
                let location = match kind {
                    Container::Params => Location::Path,
                    _ => Location::Query,
                };
                for f in describe_fields(r, location, Some(&json)) {
                    match f.location {
                        Location::Path => descriptor.params.push(f),
                        Location::Query => descriptor.query.push(f),
                        _ => descriptor.unclassified.push(f),
                    }
                }
                descriptor.containers.push(json);
            }
            None => {
                let location = if field.shape.is_parameter_eligible() {
                    Location::Query
                } else {
                    Location::Unclassified
                };
                let f = describe_field(field, location, None);
                match f.location {
                    Location::Query => descriptor.query.push(f),
                    _ => descriptor.unclassified.push(f),
                }
            }
        }
    }

    descriptor
}

/// Describe every field of a record at one location.
///
/// Path and query locations only accept parameter-eligible fields; others are
/// demoted to [`Location::Unclassified`]. Fields tagged `json:"-"` are skipped
/// for bodies.
pub fn describe_fields(
    record: &RecordShape,
    location: Location,
    container: Option<&str>,
) -> Vec<FieldDescriptor> {
    record
        .fields
        .iter()
        .filter(|f| !(location == Location::Body && f.json_name() == "-"))
        .map(|f| {
            let loc = match location {
                Location::Path | Location::Query if !f.shape.is_parameter_eligible() => {
                    Location::Unclassified
                }
                other => other,
            };
            describe_field(f, loc, container)
        })
        .collect()
}

fn describe_field(field: &FieldShape, location: Location, container: Option<&str>) -> FieldDescriptor {
    let kind = field.shape.kind();
    let source_tag = field.json_name();
    let lookup = match location {
        Location::Path => field
            .tags
            .value("param")
            .map(str::to_string)
            .unwrap_or_else(|| field.name.to_lowercase()),
        Location::Query => field
            .tags
            .value("query")
            .map(str::to_string)
            .unwrap_or_else(|| match source_tag.as_str() {
                "-" => field.name.to_lowercase(),
                _ => source_tag.clone(),
            }),
        _ => source_tag.clone(),
    };
    FieldDescriptor {
        name: field.name.clone(),
        source_tag,
        lookup,
        location,
        kind,
        shape: field.shape.clone(),
        constraints: Constraints::from_tags(&field.tags, kind),
        default: field.tags.default_value().map(str::to_string),
        required: field.tags.is_required(),
        container: container.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::shape::Describe;

    fn search_schema() -> TypeShape {
        RecordShape::named("SearchItems")
            .field(FieldShape::new(
                "Params",
                RecordShape::anonymous()
                    .field(FieldShape::of::<String>("ID").validate("required")),
            ))
            .field(FieldShape::new(
                "Query",
                RecordShape::anonymous()
                    .field(FieldShape::of::<i64>("Limit").default_value("10"))
                    .field(FieldShape::of::<Vec<String>>("Tags").tag("query", "tag")),
            ))
            .field(FieldShape::of::<Option<bool>>("Verbose"))
            .field(FieldShape::new(
                "Filter",
                RecordShape::anonymous().field(FieldShape::of::<String>("Term")),
            ))
            .field(FieldShape::new(
                "Body",
                RecordShape::anonymous()
                    .field(FieldShape::of::<String>("Name").validate("required,max=20"))
                    .field(FieldShape::of::<String>("Secret").json("-")),
            ))
            .into()
    }

    #[test]
    fn test_containers_are_partitioned() {
        let d = describe(&search_schema());
        assert_eq!(d.name.as_deref(), Some("SearchItems"));
        assert_eq!(d.params.len(), 1);
        assert_eq!(d.params[0].lookup, "id");
        assert_eq!(d.params[0].location, Location::Path);
        assert!(d.params[0].required);
        assert_eq!(d.params[0].instance_path(), "params.id");

        let names: Vec<&str> = d.query.iter().map(|f| f.lookup.as_str()).collect();
        assert_eq!(names, vec!["limit", "tag", "verbose"]);
        assert_eq!(d.query[0].default.as_deref(), Some("10"));
        assert_eq!(d.query[2].kind, Kind::Boolean);
        assert_eq!(d.query[2].container, None);
        assert_eq!(d.containers, vec!["params", "query"]);
    }

    #[test]
    fn test_records_are_never_auto_detected_as_query() {
        let d = describe(&search_schema());
        assert_eq!(d.unclassified.len(), 1);
        assert_eq!(d.unclassified[0].name, "Filter");
        assert_eq!(d.unclassified[0].location, Location::Unclassified);
    }

    #[test]
    fn test_body_fields_and_required() {
        let d = describe(&search_schema());
        let body = d.body.expect("body");
        assert_eq!(body.field, "body");
        assert!(body.required);
        assert_eq!(body.fields.len(), 1);
        assert_eq!(body.fields[0].constraints.max_length, Some(20));
        assert_eq!(body.fields[0].instance_path(), "body.name");
    }

    #[test]
    fn test_non_record_input_is_empty() {
        assert!(describe(&TypeShape::of::<String>()).is_empty());
        assert!(describe(&TypeShape::Opaque).is_empty());
    }

    #[test]
    fn test_record_inside_query_container_is_unclassified() {
        struct Nested;
        impl Describe for Nested {
            fn describe() -> TypeShape {
                RecordShape::named("Nested")
                    .field(FieldShape::of::<String>("A"))
                    .into()
            }
        }
        let shape: TypeShape = RecordShape::named("Input")
            .field(FieldShape::new(
                "Query",
                RecordShape::anonymous().field(FieldShape::of::<Nested>("Inner")),
            ))
            .into();
        let d = describe(&shape);
        assert!(d.query.is_empty());
        assert_eq!(d.unclassified[0].container.as_deref(), Some("query"));
    }

    #[test]
    fn test_hidden_query_field_looks_up_by_name() {
        let shape: TypeShape = RecordShape::named("Lookup")
            .field(FieldShape::new(
                "Query",
                RecordShape::anonymous()
                    .field(FieldShape::of::<String>("Token").json("-"))
                    .field(FieldShape::of::<String>("Cursor").json("-").tag("query", "c")),
            ))
            .field(FieldShape::of::<Option<bool>>("Trace").json("-"))
            .into();
        let d = describe(&shape);
        let lookups: Vec<&str> = d.query.iter().map(|f| f.lookup.as_str()).collect();
        assert_eq!(lookups, vec!["token", "c", "trace"]);
    }
}
