//! Integration tests for typed handlers served through the registry

mod common;

use common::{demo_registry, serve};
use http::Method;
use routeschema::cli::demo::{Item, ListItems};
use routeschema::envelope::MinimalWrapper;
use routeschema::error::SchemaError;
use routeschema::schema::{Describe, FieldShape, RecordShape, TypeShape};
use routeschema::{Handler, SchemaRequest, TypedHandler};
use serde::Deserialize;
use serde_json::json;

#[test]
fn test_list_uses_defaults() {
    let registry = demo_registry();
    let resp = serve(&registry, Method::GET, "/items", SchemaRequest::get("/items"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["error"], json!(null));
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 3);
    assert_eq!(resp.body["data"][0]["id"], 1);
}

#[test]
fn test_offset_and_filter() {
    let registry = demo_registry();
    let resp = serve(
        &registry,
        Method::GET,
        "/items",
        SchemaRequest::get("/items?offset=10&limit=2&tag=demo"),
    );
    let ids: Vec<u64> = resp.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![11, 12]);

    let resp = serve(
        &registry,
        Method::GET,
        "/items",
        SchemaRequest::get("/items?tag=other"),
    );
    assert_eq!(resp.body["data"], json!([]));
}

#[test]
fn test_parse_failures_are_400() {
    let registry = demo_registry();
    let resp = serve(&registry, Method::GET, "/items/:id", SchemaRequest::get("/items/x"));
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["error"]["code"], "ERR_INVALID_PARAMS");
    assert_eq!(resp.body["data"], json!(null));
}

#[test]
fn test_handler_error_passes_through() {
    let registry = demo_registry();
    let resp = serve(&registry, Method::GET, "/items/:id", SchemaRequest::get("/items/0"));
    assert_eq!(resp.status, 400);
    assert_eq!(
        resp.body["error"],
        json!({"code": "ERR_ITEM_NOT_FOUND", "message": "Item not found"})
    );
}

#[test]
fn test_documentation_only_operation_has_no_handler() {
    let registry = demo_registry();
    let op = registry.operation(&Method::DELETE, "/items/:id").unwrap();
    assert!(op.handler().is_none());
    assert!(op.serve(SchemaRequest::new(Method::DELETE, "/items/1")).is_none());
}

struct Counter;

impl Handler for Counter {
    type Request = ListItems;
    type Response = Vec<Item>;

    fn handle(&self, _req: &SchemaRequest, input: ListItems) -> anyhow::Result<Vec<Item>> {
        if input.query.limit > 50 {
            return Err(SchemaError::invalid_request().into());
        }
        if input.query.offset > 1000 {
            anyhow::bail!("offset overflow in storage layer");
        }
        Ok(Vec::new())
    }
}

#[test]
fn test_trait_handler_and_wrapper() {
    let handler = TypedHandler::from_handler(Counter);
    assert_eq!(handler.input_shape(), &ListItems::describe());
    assert_eq!(handler.output_shape(), &TypeShape::sequence(Item::describe()));

    let ok = handler.serve_with(&SchemaRequest::get("/c"), &MinimalWrapper);
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body, json!([]));

    let user = handler.serve_with(&SchemaRequest::get("/c?limit=60"), &MinimalWrapper);
    assert_eq!(user.status, 400);
    assert_eq!(user.body["error"]["code"], "ERR_INVALID_REQUEST");

    let unknown = handler.serve_with(&SchemaRequest::get("/c?offset=5000"), &MinimalWrapper);
    assert_eq!(
        unknown.body,
        json!({"error": {"code": "ERR_NOT_SPECIFIED", "message": "An unknown exception occurred"}})
    );
}

#[derive(Deserialize)]
struct Thumbnail {
    query: ThumbnailQuery,
}

#[derive(Deserialize)]
struct ThumbnailQuery {
    size: u8,
}

impl Describe for Thumbnail {
    fn describe() -> TypeShape {
        RecordShape::named("Thumbnail")
            .field(FieldShape::new(
                "Query",
                RecordShape::anonymous().field(FieldShape::of::<u8>("Size").validate("required")),
            ))
            .into()
    }
}

#[test]
fn test_out_of_range_integer_is_bad_query() {
    let handler = routeschema::handler(|_req, input: Thumbnail| Ok(u64::from(input.query.size) * 2));

    let ok = handler.serve_with(&SchemaRequest::get("/thumb?size=200"), &MinimalWrapper);
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body, json!(400));

    let wide = handler.serve_with(&SchemaRequest::get("/thumb?size=300"), &MinimalWrapper);
    assert_eq!(wide.status, 400);
    assert_eq!(wide.body["error"]["code"], "ERR_INVALID_QUERY");
}
