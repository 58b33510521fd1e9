//! # Request Parser & Validator
//!
//! [`parse`] populates a schema [`Instance`] from a [`SchemaRequest`] in two
//! passes:
//!
//! 1. **Assignment**, in the fixed order params → query → body. A missing
//!    value takes the declared default, fails with `MissingRequired` when the
//!    field is required, and is skipped otherwise. Raw strings convert to the
//!    field's kind; failures are reported per stage.
//! 2. **Constraints** over the whole instance (`required`, `min`/`max`,
//!    `oneof`, formats). The first failing rule ends the parse.
//!
//! The body is decoded as one JSON document bound to the whole `Body` record.
//! An empty or `null` body is only an error when the body record has required
//! fields; otherwise the record takes its declared defaults.
//!
//! Parsing never touches shared state, so any number of requests may be
//! parsed concurrently against the same descriptor.

mod convert;
mod validate;
mod value;

pub use convert::{bind_json, convert_scalar, parse_bool};
pub use validate::check_value;
pub use value::{FieldValue, Instance};

use crate::error::{ParseError, Stage};
use crate::request::SchemaRequest;
use crate::schema::{BodyDescriptor, FieldDescriptor, Kind, SchemaDescriptor};
use convert::{convert_raw, default_raws};
use std::collections::BTreeMap;
use tracing::debug;

/// Parse and validate a request against a schema descriptor.
pub fn parse(descriptor: &SchemaDescriptor, req: &SchemaRequest) -> Result<Instance, ParseError> {
    let mut root: BTreeMap<String, FieldValue> = descriptor
        .containers
        .iter()
        .map(|c| (c.clone(), FieldValue::Record(BTreeMap::new())))
        .collect();

    for field in &descriptor.params {
        let raws: Vec<&str> = candidates(field)
            .iter()
            .find_map(|name| req.get_path_param(name).filter(|v| !v.is_empty()))
            .into_iter()
            .collect();
        assign(&mut root, field, &raws, Stage::Params)?;
    }
    debug!(count = descriptor.params.len(), "Path params assigned");

    for field in &descriptor.query {
        let raws = candidates(field)
            .iter()
            .map(|name| query_values(req, name, field.shape.element().is_some()))
            .find(|values| !values.is_empty())
            .unwrap_or_default();
        assign(&mut root, field, &raws, Stage::Query)?;
    }
    debug!(count = descriptor.query.len(), "Query params assigned");

    if let Some(body) = &descriptor.body {
        if let Some(value) = parse_body(body, req)? {
            root.insert(body.field.clone(), value);
        }
    }

    let instance = Instance::new(root);
    if let Err(err) = validate::check(descriptor, &instance) {
        debug!(error = %err, "Constraint pass failed");
        return Err(err);
    }
    Ok(instance)
}

/// Names tried in order: declared lookup, field name, lowercase name, json name.
fn candidates(field: &FieldDescriptor) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(4);
    for name in [
        field.lookup.clone(),
        field.name.clone(),
        field.name.to_lowercase(),
        field.source_tag.clone(),
    ] {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn query_values<'r>(req: &'r SchemaRequest, name: &str, repeated: bool) -> Vec<&'r str> {
    if repeated {
        req.get_query_values(name)
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect()
    } else {
        req.get_query_param(name)
            .filter(|v| !v.is_empty())
            .into_iter()
            .collect()
    }
}

fn assign(
    root: &mut BTreeMap<String, FieldValue>,
    field: &FieldDescriptor,
    raws: &[&str],
    stage: Stage,
) -> Result<(), ParseError> {
    let value = if raws.is_empty() {
        match &field.default {
            Some(default) => convert_raw(
                &default_raws(default, &field.shape),
                &field.shape,
                stage,
                &field.lookup,
            )?,
            None if field.required => {
                debug!(field = %field.lookup, stage = ?stage, "Required value missing");
                return Err(ParseError::MissingRequired {
                    stage,
                    field: field.lookup.clone(),
                });
            }
            None => return Ok(()),
        }
    } else {
        convert_raw(raws, &field.shape, stage, &field.lookup)?
    };

    match &field.container {
        Some(container) => {
            if let Some(FieldValue::Record(fields)) = root.get_mut(container) {
                fields.insert(field.source_tag.clone(), value);
            }
        }
        None => {
            root.insert(field.source_tag.clone(), value);
        }
    }
    Ok(())
}

fn parse_body(body: &BodyDescriptor, req: &SchemaRequest) -> Result<Option<FieldValue>, ParseError> {
    let decoded = match req.content() {
        Some(bytes) => {
            let decoded: serde_json::Value =
                serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidJson {
                    reason: e.to_string(),
                })?;
            debug!(bytes = bytes.len(), "Request body decoded");
            decoded
        }
        None => serde_json::Value::Null,
    };

    // A `null` document carries no record fields, same as an empty body.
    if decoded.is_null() && body.shape.kind() == Kind::Record {
        if body.required {
            debug!("Request body required but empty");
            return Err(ParseError::MissingRequired {
                stage: Stage::Body,
                field: body.field.clone(),
            });
        }
        return bind_json(
            &serde_json::Value::Object(serde_json::Map::new()),
            &body.shape,
            &body.field,
        )
        .map(Some);
    }
    if req.content().is_none() {
        return Ok(None);
    }
    bind_json(&decoded, &body.shape, &body.field).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{describe, FieldShape, RecordShape, TypeShape};
    use serde_json::json;

    fn get_item() -> SchemaDescriptor {
        describe(
            &RecordShape::named("GetItem")
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
                .into(),
        )
    }

    #[test]
    fn test_params_then_query_with_default() {
        let req = SchemaRequest::get("/items/42").route("/items/:id");
        let instance = parse(&get_item(), &req).unwrap();
        assert_eq!(
            instance.to_value(),
            json!({"params": {"id": "42"}, "query": {"limit": 10}})
        );
    }

    #[test]
    fn test_repeated_query_keys_become_sequence() {
        let req = SchemaRequest::get("/items/1?tag=a&tag=b&limit=2").route("/items/:id");
        let instance = parse(&get_item(), &req).unwrap();
        assert_eq!(instance.get("query.tags").map(FieldValue::to_json), Some(json!(["a", "b"])));
        assert_eq!(instance.get("query.limit"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn test_query_conversion_failure_names_stage() {
        let req = SchemaRequest::get("/items/1?limit=abc").route("/items/:id");
        let err = parse(&get_item(), &req).unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_QUERY");
    }

    #[test]
    fn test_missing_param_is_missing_required() {
        let req = SchemaRequest::get("/items");
        let err = parse(&get_item(), &req).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingRequired {
                stage: Stage::Params,
                field: "id".into()
            }
        );
    }

    #[test]
    fn test_empty_optional_body_is_skipped() {
        let d = describe(
            &RecordShape::named("Patch")
                .field(FieldShape::new(
                    "Body",
                    RecordShape::anonymous().field(FieldShape::of::<Option<String>>("Note")),
                ))
                .into(),
        );
        let instance = parse(&d, &SchemaRequest::post("/notes")).unwrap();
        assert_eq!(instance.to_value(), json!({"body": {}}));
    }

    #[test]
    fn test_non_record_input_parses_to_empty_instance() {
        let d = describe(&TypeShape::Opaque);
        let instance = parse(&d, &SchemaRequest::get("/anything?x=1")).unwrap();
        assert_eq!(instance.to_value(), json!({}));
    }
}
