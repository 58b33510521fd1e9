//! Integration tests for interface document generation
//!
//! Generates the document for the demo API and checks paths, parameters,
//! component naming, security expansion and determinism.

mod common;

use common::temp_files::temp_path;
use http::Method;
use routeschema::config::{CollisionPolicy, DocumentConfig};
use routeschema::openapi::{generate, openapi, DocumentError};
use routeschema::registry::{OperationRecord, Registry};
use routeschema::schema::{Describe, FieldShape, RecordShape, TypeShape};
use serde_json::{json, Value};

fn demo_doc() -> Value {
    let doc = generate(&common::demo_registry(), &DocumentConfig::new("Demo", "2.1.0")).unwrap();
    serde_json::to_value(doc).unwrap()
}

#[test]
fn test_header_and_paths() {
    let doc = demo_doc();
    assert_eq!(doc["openapi"], "3.1.1");
    assert_eq!(doc["info"], json!({"title": "Demo", "version": "2.1.0"}));

    let paths: Vec<&str> = doc["paths"].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        vec!["/admin/items", "/items", "/items/search", "/items/{id}", "/users/{id}"]
    );
    assert!(doc["paths"]["/items/{id}"]["get"].is_object());
    assert!(doc["paths"]["/items/{id}"]["delete"].is_object());
}

#[test]
fn test_path_and_query_parameters() {
    let doc = demo_doc();
    let get_item = &doc["paths"]["/items/{id}"]["get"];
    assert_eq!(get_item["summary"], "Get /items/by ID");
    assert_eq!(
        get_item["parameters"],
        json!([{"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "minimum": 0}}])
    );

    let params = doc["paths"]["/items"]["get"]["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 3);
    assert_eq!(
        params[0],
        json!({
            "name": "limit",
            "in": "query",
            "required": false,
            "schema": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10}
        })
    );
    assert_eq!(params[1]["schema"]["default"], json!(0));
    assert_eq!(params[2]["name"], "tag");
    assert_eq!(params[2]["schema"], json!({"type": "string"}));

    let search = doc["paths"]["/items/search"]["get"]["parameters"].as_array().unwrap();
    assert_eq!(search[0]["name"], "q");
    assert_eq!(search[0]["required"], true);
    assert_eq!(search[1]["schema"]["enum"], json!(["name", "price"]));
    assert_eq!(search[1]["schema"]["default"], json!("name"));
}

#[test]
fn test_request_body_naming() {
    let doc = demo_doc();
    let body = &doc["paths"]["/admin/items"]["post"]["requestBody"];
    assert_eq!(body["description"], "Request body");
    assert_eq!(body["required"], true);
    assert_eq!(
        body["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/PostAdminItemsRequestBody"})
    );

    let schema = &doc["components"]["schemas"]["PostAdminItemsRequestBody"];
    assert_eq!(schema["required"], json!(["name", "price"]));
    assert_eq!(schema["properties"]["name"]["minLength"], json!(1));
    assert_eq!(schema["properties"]["name"]["maxLength"], json!(64));
    assert_eq!(schema["properties"]["tags"]["maxItems"], json!(10));
    assert_eq!(
        schema["properties"]["dimensions"],
        json!({"$ref": "#/components/schemas/PostAdminItemsRequestBodyDimensions"})
    );
}

#[test]
fn test_response_envelopes_and_components() {
    let doc = demo_doc();
    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("SearchResponse"));
    assert!(schemas.contains_key("SearchResponsePage"));
    assert_ne!(schemas["SearchResponse"], schemas["SearchResponsePage"]);
    assert_eq!(
        schemas["SearchResponse"]["properties"]["results"]["items"],
        json!({"$ref": "#/components/schemas/Item"})
    );
    assert_eq!(schemas["User"]["properties"]["email"]["format"], "email");

    let ok = &doc["paths"]["/items"]["get"]["responses"]["200"];
    assert_eq!(ok["description"], "Success");
    let envelope = &ok["content"]["application/json"]["schema"];
    assert_eq!(envelope["properties"]["success"]["default"], true);
    assert_eq!(
        envelope["properties"]["data"],
        json!({"type": "array", "items": {"$ref": "#/components/schemas/Item"}})
    );

    let bad = &doc["paths"]["/items"]["get"]["responses"]["400"];
    assert_eq!(bad["description"], "Error");
    assert_eq!(
        bad["content"]["application/json"]["schema"]["properties"]["success"]["default"],
        false
    );

    // Documentation-only operation without a response type.
    assert_eq!(
        doc["paths"]["/items/{id}"]["delete"]["responses"]["200"],
        json!({"description": "Success"})
    );
}

#[test]
fn test_security_expansion() {
    let doc = demo_doc();
    assert_eq!(
        doc["paths"]["/users/{id}"]["get"]["security"],
        json!([{"ApiKeyAuth": []}, {"BearerAuth": []}])
    );
    assert_eq!(
        doc["paths"]["/admin/items"]["post"]["security"],
        json!([{"BearerAuth": []}])
    );
    assert!(doc["paths"]["/items"]["get"].get("security").is_none());

    let schemes = doc["components"]["securitySchemes"].as_object().unwrap();
    let names: Vec<&str> = schemes.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["ApiKeyAuth", "BearerAuth"]);
    assert_eq!(
        schemes["ApiKeyAuth"],
        json!({"type": "apiKey", "in": "header", "name": "X-API-Key", "description": "Static demo key"})
    );
    assert_eq!(
        schemes["BearerAuth"],
        json!({"type": "http", "scheme": "bearer", "bearerFormat": "JWT"})
    );
}

#[test]
fn test_generation_is_deterministic() {
    let registry = common::demo_registry();
    let config = DocumentConfig::default();
    let first = generate(&registry, &config).unwrap().to_json().unwrap();
    let second = generate(&registry, &config).unwrap().to_json().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        generate(&registry, &config).unwrap().to_yaml().unwrap(),
        generate(&registry, &config).unwrap().to_yaml().unwrap()
    );
}

struct Node;

impl Describe for Node {
    fn describe() -> TypeShape {
        RecordShape::named("Node")
            .field(FieldShape::of::<String>("Label"))
            .field(FieldShape::new(
                "Children",
                TypeShape::sequence(TypeShape::recursive::<Node>("Node")),
            ))
            .into()
    }
}

#[test]
fn test_self_referencing_type_terminates() {
    let mut registry = Registry::new();
    registry
        .register(OperationRecord::described(
            Method::GET,
            "/tree",
            RecordShape::anonymous().into(),
            Some(Node::describe()),
        ))
        .unwrap();
    let doc = serde_json::to_value(generate(&registry, &DocumentConfig::default()).unwrap()).unwrap();
    assert_eq!(
        doc["components"]["schemas"]["Node"]["properties"]["children"]["items"],
        json!({"$ref": "#/components/schemas/Node"})
    );
}

fn colliding_registry() -> Registry {
    let shared_a: TypeShape = RecordShape::named("Shared")
        .field(FieldShape::of::<String>("A"))
        .into();
    let shared_b: TypeShape = RecordShape::named("Shared")
        .field(FieldShape::of::<i64>("B"))
        .into();
    let mut registry = Registry::new();
    registry
        .register(OperationRecord::described(
            Method::GET,
            "/a",
            RecordShape::anonymous().into(),
            Some(shared_a),
        ))
        .unwrap();
    registry
        .register(OperationRecord::described(
            Method::GET,
            "/b",
            RecordShape::anonymous().into(),
            Some(shared_b),
        ))
        .unwrap();
    registry
}

#[test]
fn test_collision_policy() {
    let registry = colliding_registry();

    let doc = generate(&registry, &DocumentConfig::default()).unwrap();
    assert!(doc.components.schemas["Shared"].properties.contains_key("a"));

    let strict = DocumentConfig::default().collisions(CollisionPolicy::Reject);
    assert_eq!(
        generate(&registry, &strict).unwrap_err(),
        DocumentError::NameCollision {
            name: "Shared".to_string()
        }
    );
}

#[test]
fn test_openapi_writes_output_file() {
    let (_dir, path) = temp_path("openapi.json");
    let config = DocumentConfig::default().output_file(&path);
    let doc = openapi(&common::demo_registry(), &config).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, serde_json::to_value(&doc).unwrap());
}
