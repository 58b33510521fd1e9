//! Document generator.
//!
//! Walks every registered operation's input and response shapes and
//! synthesizes one [`Document`]. Named records are stored once per
//! generation in the component table and referenced thereafter. The name is
//! reserved before the record's fields are walked, so self-referencing and
//! repeated types terminate and always resolve to the same `$ref`.
//!
//! Generation is read-only over the registry and keeps its tables local to
//! the call; concurrent generations do not interact.

use super::naming;
use super::types::{
    Components, Contact, Document, Info, License, MediaType, Operation, Parameter, PathItem,
    RequestBody, Response, SchemaNode, SecurityRequirement, JSON_CONTENT, OPENAPI_VERSION,
};
use crate::config::{CollisionPolicy, DocumentConfig};
use crate::parser::convert_scalar;
use crate::path::to_openapi_path;
use crate::registry::{OperationRecord, Registry};
use crate::schema::{Constraints, FieldDescriptor, Kind, RecordShape, TypeShape};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Two different record shapes resolved to the same component name
    NameCollision { name: String },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::NameCollision { name } => write!(
                f,
                "schema name '{}' is produced by two different record shapes",
                name
            ),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Generate the document for every operation in `registry`.
pub fn generate(registry: &Registry, config: &DocumentConfig) -> Result<Document, DocumentError> {
    let mut generator = Generator::new(config.collisions);
    let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();

    for record in registry.operations() {
        let operation = generator.operation(record);
        let item = paths.entry(to_openapi_path(&record.path)).or_default();
        let slot = match record.method.as_str() {
            "GET" => &mut item.get,
            "POST" => &mut item.post,
            "PUT" => &mut item.put,
            "DELETE" => &mut item.delete,
            "PATCH" => &mut item.patch,
            _ => continue,
        };
        *slot = Some(operation);
    }

    if let Some(name) = generator.collisions.first() {
        return Err(DocumentError::NameCollision { name: name.clone() });
    }

    info!(
        operations = registry.len(),
        paths = paths.len(),
        schemas = generator.schemas.len(),
        security_schemes = generator.security_schemes.len(),
        "Document generated"
    );

    Ok(Document {
        openapi: OPENAPI_VERSION.to_string(),
        info: info_from(config),
        paths,
        components: Components {
            schemas: generator.schemas,
            security_schemes: generator.security_schemes,
        },
    })
}

fn info_from(config: &DocumentConfig) -> Info {
    Info {
        title: config.title.clone(),
        description: config.description.clone(),
        version: config.version.clone(),
        contact: config.contact.clone().map(|email| Contact { email }),
        license: config.license.clone().map(|name| License { name }),
    }
}

/// Per-call generation state: the component tables and collision log.
struct Generator {
    policy: CollisionPolicy,
    schemas: BTreeMap<String, SchemaNode>,
    /// Record shape that first claimed each component name
    claimed: BTreeMap<String, RecordShape>,
    security_schemes: BTreeMap<String, Map<String, Value>>,
    collisions: Vec<String>,
}

impl Generator {
    fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            schemas: BTreeMap::new(),
            claimed: BTreeMap::new(),
            security_schemes: BTreeMap::new(),
            collisions: Vec::new(),
        }
    }

    fn operation(&mut self, record: &OperationRecord) -> Operation {
        let context = naming::operation_context(&record.method, &record.path);
        debug!(method = %record.method, path = %record.path, context = %context, "Generating operation");

        let mut parameters: Vec<Parameter> = record
            .schema
            .params
            .iter()
            .map(|f| self.parameter(f, "path", true, &context))
            .collect();
        parameters.extend(
            record
                .schema
                .query
                .iter()
                .map(|f| self.parameter(f, "query", f.required, &context)),
        );

        let request_body = record.schema.body.as_ref().map(|body| {
            let input_name = naming::record_name(
                record.schema.name.as_deref(),
                &format!("{}Request", context),
            );
            let body_context = naming::field_context(&input_name, &body.field);
            RequestBody {
                description: "Request body".to_string(),
                content: BTreeMap::from([(
                    JSON_CONTENT.to_string(),
                    MediaType {
                        schema: self.node(&body.shape, &body_context),
                    },
                )]),
                required: body.required,
            }
        });

        let success = match &record.response {
            Some(shape) => {
                let data = self.node(shape, &format!("{}Response", context));
                Response::json("Success", success_envelope(data))
            }
            None => Response {
                description: "Success".to_string(),
                content: None,
            },
        };
        let responses = BTreeMap::from([
            ("200".to_string(), success),
            ("400".to_string(), Response::json("Error", error_envelope())),
        ]);

        Operation {
            summary: naming::summary(&record.method, &record.path),
            parameters,
            request_body,
            responses,
            security: self.security(record),
        }
    }

    fn parameter(
        &mut self,
        field: &FieldDescriptor,
        location: &str,
        required: bool,
        context: &str,
    ) -> Parameter {
        let mut schema = self.node(&field.shape, &naming::field_context(context, &field.lookup));
        apply_constraints(&mut schema, &field.constraints);
        if let Some(default) = &field.default {
            schema.default = Some(typed_default(default, &field.shape));
        }
        Parameter {
            name: field.lookup.clone(),
            location: location.to_string(),
            required,
            schema,
        }
    }

    /// Register each component scheme once and expand every route scheme to
    /// one requirement per component.
    fn security(&mut self, record: &OperationRecord) -> Vec<SecurityRequirement> {
        let mut requirements = Vec::new();
        for scheme in &record.security {
            for provider in scheme.components() {
                self.security_schemes
                    .entry(provider.name().to_string())
                    .or_insert_with(|| provider.document());
            }
            requirements.extend(scheme.requirements());
        }
        requirements
    }

    /// Node for any shape found at `context`.
    fn node(&mut self, shape: &TypeShape, context: &str) -> SchemaNode {
        let resolved = shape.resolve();
        match &*resolved {
            TypeShape::String => SchemaNode::of_type("string"),
            TypeShape::Integer(_) => SchemaNode::of_type("integer"),
            TypeShape::Unsigned(_) => SchemaNode {
                minimum: Some(Value::from(0)),
                ..SchemaNode::of_type("integer")
            },
            TypeShape::Float => SchemaNode::of_type("number"),
            TypeShape::Boolean => SchemaNode::of_type("boolean"),
            TypeShape::Sequence(item) => SchemaNode {
                items: Some(Box::new(self.node(item, &naming::item_context(context)))),
                ..SchemaNode::of_type("array")
            },
            TypeShape::Record(record) => self.record(record, context),
            TypeShape::Opaque | TypeShape::Pointer(_) | TypeShape::Recursive(_) => {
                SchemaNode::of_type("object")
            }
        }
    }

    fn record(&mut self, record: &RecordShape, context: &str) -> SchemaNode {
        let name = naming::record_name(record.name.as_deref(), context);

        if let Some(first) = self.claimed.get(&name) {
            if first != record {
                match self.policy {
                    CollisionPolicy::Reuse => {
                        warn!(schema = %name, "Different record shapes share a schema name; reusing the first");
                    }
                    CollisionPolicy::Reject => {
                        if !self.collisions.contains(&name) {
                            self.collisions.push(name.clone());
                        }
                    }
                }
            }
            return SchemaNode::reference(&name);
        }

        self.claimed.insert(name.clone(), record.clone());
        self.schemas.insert(name.clone(), SchemaNode::of_type("object"));

        let parent = if name == naming::ANONYMOUS {
            context.to_string()
        } else {
            name.clone()
        };

        let mut node = SchemaNode::of_type("object");
        for field in &record.fields {
            let json = field.json_name();
            if json == "-" {
                continue;
            }
            let kind = field.shape.kind();
            let mut child = self.node(&field.shape, &naming::field_context(&parent, &json));
            apply_constraints(&mut child, &Constraints::from_tags(&field.tags, kind));
            if let Some(default) = field.tags.default_value() {
                child.default = Some(typed_default(default, &field.shape));
            }
            if field.tags.is_required() {
                node.required.push(json.clone());
            }
            node.properties.insert(json, child);
        }

        self.schemas.insert(name.clone(), node);
        SchemaNode::reference(&name)
    }
}

fn success_envelope(data: SchemaNode) -> SchemaNode {
    let mut node = SchemaNode::of_type("object");
    node.properties.insert(
        "success".into(),
        SchemaNode::of_type("boolean").with_default(Value::Bool(true)),
    );
    node.properties.insert("data".into(), data);
    node.properties.insert(
        "error".into(),
        SchemaNode::of_type("null").with_default(Value::Null),
    );
    node.required = vec!["success".into(), "data".into(), "error".into()];
    node
}

fn error_envelope() -> SchemaNode {
    let mut error = SchemaNode::of_type("object");
    error.properties.insert("code".into(), SchemaNode::of_type("string"));
    error.properties.insert("message".into(), SchemaNode::of_type("string"));
    error.required = vec!["code".into(), "message".into()];

    let mut node = SchemaNode::of_type("object");
    node.properties.insert(
        "success".into(),
        SchemaNode::of_type("boolean").with_default(Value::Bool(false)),
    );
    node.properties.insert("error".into(), error);
    node.properties.insert(
        "data".into(),
        SchemaNode::of_type("null").with_default(Value::Null),
    );
    node.required = vec!["success".into(), "error".into(), "data".into()];
    node
}

/// Integral bounds render as integers (`1`, not `1.0`).
fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

fn apply_constraints(node: &mut SchemaNode, constraints: &Constraints) {
    if node.reference.is_some() {
        return;
    }
    if let Some(min) = constraints.minimum {
        node.minimum = Some(number(min));
    }
    if let Some(max) = constraints.maximum {
        node.maximum = Some(number(max));
    }
    node.min_length = constraints.min_length.or(node.min_length);
    node.max_length = constraints.max_length.or(node.max_length);
    node.min_items = constraints.min_items.or(node.min_items);
    node.max_items = constraints.max_items.or(node.max_items);
    if let Some(format) = constraints.format {
        node.format = Some(format.as_str().to_string());
    }
    if !constraints.enumeration.is_empty() {
        let kind = match node.kind.as_deref() {
            Some("integer") => Kind::Integer,
            Some("number") => Kind::Float,
            Some("boolean") => Kind::Boolean,
            _ => Kind::String,
        };
        node.enumeration = constraints
            .enumeration
            .iter()
            .map(|e| literal_value(e, kind))
            .collect();
    }
}

fn literal_value(raw: &str, kind: Kind) -> Value {
    let shape = match kind {
        Kind::Integer => TypeShape::Integer(64),
        Kind::Float => TypeShape::Float,
        Kind::Boolean => TypeShape::Boolean,
        _ => TypeShape::String,
    };
    convert_scalar(raw, &shape)
        .map(|v| v.to_json())
        .unwrap_or_else(|_| Value::from(raw))
}

/// Default tag rendered with the field's type; unparsable defaults stay text.
fn typed_default(raw: &str, shape: &TypeShape) -> Value {
    match shape.element() {
        Some(item) => Value::Array(
            raw.split(',')
                .map(|part| typed_default(part.trim(), item))
                .collect(),
        ),
        None => convert_scalar(raw, shape)
            .map(|v| v.to_json())
            .unwrap_or_else(|_| Value::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldShape;
    use serde_json::json;

    fn page() -> RecordShape {
        RecordShape::named("SearchResponse")
            .field(FieldShape::of::<u32>("Total"))
            .field(FieldShape::new(
                "Page",
                RecordShape::anonymous()
                    .field(FieldShape::of::<u32>("Number").validate("min=1"))
                    .field(FieldShape::of::<u32>("Size")),
            ))
    }

    #[test]
    fn test_anonymous_child_named_from_parent() {
        let mut g = Generator::new(CollisionPolicy::Reuse);
        let node = g.node(&TypeShape::from(page()), "Ignored");
        assert_eq!(node.ref_name(), Some("SearchResponse"));
        assert!(g.schemas.contains_key("SearchResponsePage"));
        let page_node = &g.schemas["SearchResponsePage"];
        assert_eq!(page_node.properties["number"].minimum, Some(json!(1)));
        assert_eq!(page_node.properties["size"].minimum, Some(json!(0)));
    }

    #[test]
    fn test_sequence_items_get_item_suffix() {
        let order: TypeShape = RecordShape::named("Order")
            .field(FieldShape::new(
                "Lines",
                TypeShape::sequence(RecordShape::anonymous().field(FieldShape::of::<String>("Sku"))),
            ))
            .into();
        let mut g = Generator::new(CollisionPolicy::Reuse);
        g.node(&order, "");
        assert!(g.schemas.contains_key("OrderLinesItem"));
        assert_eq!(
            g.schemas["Order"].properties["lines"].items.as_deref().and_then(SchemaNode::ref_name),
            Some("OrderLinesItem")
        );
    }

    #[test]
    fn test_collision_policies() {
        let a = RecordShape::anonymous().field(FieldShape::of::<String>("A"));
        let b = RecordShape::anonymous().field(FieldShape::of::<i64>("B"));

        let mut reuse = Generator::new(CollisionPolicy::Reuse);
        reuse.record(&a, "Shared");
        reuse.record(&b, "Shared");
        assert!(reuse.collisions.is_empty());
        assert!(reuse.schemas["Shared"].properties.contains_key("a"));

        let mut reject = Generator::new(CollisionPolicy::Reject);
        reject.record(&a, "Shared");
        reject.record(&a, "Shared");
        assert!(reject.collisions.is_empty());
        reject.record(&b, "Shared");
        assert_eq!(reject.collisions, vec!["Shared".to_string()]);
    }

    #[test]
    fn test_typed_defaults_and_enums() {
        assert_eq!(typed_default("10", &TypeShape::Integer(64)), json!(10));
        assert_eq!(typed_default("true", &TypeShape::Boolean), json!(true));
        assert_eq!(typed_default("x", &TypeShape::Integer(64)), json!("x"));
        assert_eq!(
            typed_default("1, 2", &TypeShape::sequence(TypeShape::Unsigned(64))),
            json!([1, 2])
        );

        let mut node = SchemaNode::of_type("integer");
        apply_constraints(
            &mut node,
            &Constraints {
                enumeration: vec!["1".into(), "2".into()],
                ..Constraints::default()
            },
        );
        assert_eq!(node.enumeration, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_envelopes() {
        let success = serde_json::to_value(success_envelope(SchemaNode::of_type("string"))).unwrap();
        assert_eq!(
            success,
            json!({
                "type": "object",
                "properties": {
                    "success": {"type": "boolean", "default": true},
                    "data": {"type": "string"},
                    "error": {"type": "null", "default": null}
                },
                "required": ["success", "data", "error"]
            })
        );
        let error = serde_json::to_value(error_envelope()).unwrap();
        assert_eq!(error["required"], json!(["success", "error", "data"]));
        assert_eq!(error["properties"]["error"]["required"], json!(["code", "message"]));
    }
}
