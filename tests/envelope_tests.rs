//! Process-wide envelope selection.
//!
//! This is the only test binary that sets the global wrapper; each test
//! binary is its own process, so other suites keep the default.

mod common;

use http::Method;
use routeschema::envelope::{
    response_wrapper, set_response_wrapper, CustomWrapper, EnvelopeError, MinimalWrapper,
};
use routeschema::SchemaRequest;
use serde_json::json;

#[test]
fn test_global_wrapper_applies_once() {
    let before = response_wrapper().wrap_success(json!(1));
    assert_eq!(before, json!({"success": true, "data": 1, "error": null}));

    let custom = CustomWrapper {
        success_field: "ok".into(),
        data_field: "result".into(),
        error_field: "problem".into(),
        add_timestamp: false,
    };
    set_response_wrapper(custom).unwrap();
    assert_eq!(
        set_response_wrapper(MinimalWrapper),
        Err(EnvelopeError::AlreadyConfigured)
    );

    let registry = common::demo_registry();
    let op = registry.operation(&Method::GET, "/items/:id").unwrap();

    let ok = op
        .serve(SchemaRequest::get("/items/3").route("/items/:id"))
        .unwrap();
    assert_eq!(ok.body["ok"], true);
    assert_eq!(ok.body["result"]["id"], 3);

    let missing = op
        .serve(SchemaRequest::get("/items/0").route("/items/:id"))
        .unwrap();
    assert_eq!(missing.body["ok"], false);
    assert_eq!(missing.body["problem"]["code"], "ERR_ITEM_NOT_FOUND");
    assert_eq!(missing.body["result"], json!(null));
}
