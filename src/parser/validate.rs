//! Constraint pass over a fully assigned instance.

use super::value::{FieldValue, Instance};
use crate::error::ParseError;
use crate::schema::{Constraints, FieldDescriptor, SchemaDescriptor, TypeShape};

/// Run every declared rule; the first failure ends the pass.
///
/// Order is params, query, body (recursively), then declaration order.
pub fn check(descriptor: &SchemaDescriptor, instance: &Instance) -> Result<(), ParseError> {
    for field in descriptor.params.iter().chain(descriptor.query.iter()) {
        check_descriptor(field, instance)?;
    }
    if let Some(body) = &descriptor.body {
        match instance.get(&body.field) {
            None | Some(FieldValue::Null) if body.required => {
                return Err(ParseError::ValidationFailed {
                    field: body.field.clone(),
                    rule: "required".to_string(),
                });
            }
            None | Some(FieldValue::Null) => {}
            Some(value) => check_nested(&body.shape, value, &body.field)?,
        }
    }
    Ok(())
}

fn check_descriptor(field: &FieldDescriptor, instance: &Instance) -> Result<(), ParseError> {
    let path = field.instance_path();
    check_value(&path, field.required, &field.constraints, instance.get(&path))
}

/// Check the rules of one field. Absent values only fail `required`.
pub fn check_value(
    path: &str,
    required: bool,
    constraints: &Constraints,
    value: Option<&FieldValue>,
) -> Result<(), ParseError> {
    let fail = |rule: &str| ParseError::ValidationFailed {
        field: path.to_string(),
        rule: rule.to_string(),
    };

    let value = match value {
        None | Some(FieldValue::Null) => {
            return if required { Err(fail("required")) } else { Ok(()) };
        }
        Some(v) => v,
    };
    if constraints.omit_empty && value.is_zero() {
        return Ok(());
    }

    match value {
        FieldValue::String(s) => {
            if required && s.is_empty() {
                return Err(fail("required"));
            }
            let len = s.chars().count() as u64;
            if constraints.min_length.is_some_and(|min| len < min) {
                return Err(fail("min"));
            }
            if constraints.max_length.is_some_and(|max| len > max) {
                return Err(fail("max"));
            }
            if let Some(format) = constraints.format {
                if !format.matches(s) {
                    return Err(fail(format.rule()));
                }
            }
        }
        FieldValue::Integer(_) | FieldValue::Unsigned(_) | FieldValue::Float(_) => {
            let n = value.as_f64().unwrap_or_default();
            if constraints.minimum.is_some_and(|min| n < min) {
                return Err(fail("min"));
            }
            if constraints.maximum.is_some_and(|max| n > max) {
                return Err(fail("max"));
            }
        }
        FieldValue::Sequence(items) => {
            let len = items.len() as u64;
            if constraints.min_items.is_some_and(|min| len < min) {
                return Err(fail("min"));
            }
            if constraints.max_items.is_some_and(|max| len > max) {
                return Err(fail("max"));
            }
        }
        FieldValue::Boolean(_) | FieldValue::Record(_) | FieldValue::Null => {}
    }

    if !constraints.enumeration.is_empty() {
        let literal = value.literal();
        let allowed = literal
            .as_deref()
            .map(|l| constraints.enumeration.iter().any(|e| e == l))
            .unwrap_or(true);
        if !allowed {
            return Err(fail("oneof"));
        }
    }
    Ok(())
}

/// Descend into records and sequences of records inside a body value.
fn check_nested(shape: &TypeShape, value: &FieldValue, path: &str) -> Result<(), ParseError> {
    let resolved = shape.resolve();
    match (&*resolved, value) {
        (TypeShape::Record(record), FieldValue::Record(fields)) => {
            for field in &record.fields {
                let key = field.json_name();
                if key == "-" {
                    continue;
                }
                let child_path = format!("{}.{}", path, key);
                let constraints = Constraints::from_tags(&field.tags, field.shape.kind());
                let child = fields.get(&key);
                check_value(&child_path, field.tags.is_required(), &constraints, child)?;
                if let Some(child) = child {
                    check_nested(&field.shape, child, &child_path)?;
                }
            }
            Ok(())
        }
        (TypeShape::Sequence(item), FieldValue::Sequence(items)) => {
            for (i, child) in items.iter().enumerate() {
                check_nested(item, child, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{describe, FieldShape, Format, Kind, RecordShape, Tags};
    use std::collections::BTreeMap;

    fn constraints(rules: &str, kind: Kind) -> Constraints {
        let mut tags = Tags::default();
        tags.insert("validate", rules);
        Constraints::from_tags(&tags, kind)
    }

    fn rule_of(result: Result<(), ParseError>) -> Option<String> {
        match result {
            Err(ParseError::ValidationFailed { rule, .. }) => Some(rule),
            _ => None,
        }
    }

    #[test]
    fn test_absent_values_only_fail_required() {
        let c = constraints("min=3", Kind::String);
        assert!(check_value("q", false, &c, None).is_ok());
        assert_eq!(rule_of(check_value("q", true, &c, None)).as_deref(), Some("required"));
        assert_eq!(
            rule_of(check_value("q", true, &c, Some(&FieldValue::Null))).as_deref(),
            Some("required")
        );
    }

    #[test]
    fn test_string_bounds_and_formats() {
        let c = constraints("min=2,max=4", Kind::String);
        let s = |v: &str| FieldValue::String(v.to_string());
        assert_eq!(rule_of(check_value("n", false, &c, Some(&s("a")))).as_deref(), Some("min"));
        assert_eq!(rule_of(check_value("n", false, &c, Some(&s("abcde")))).as_deref(), Some("max"));
        assert!(check_value("n", false, &c, Some(&s("abc"))).is_ok());

        let email = constraints("email", Kind::String);
        assert_eq!(email.format, Some(Format::Email));
        assert_eq!(rule_of(check_value("e", false, &email, Some(&s("nope")))).as_deref(), Some("email"));
    }

    #[test]
    fn test_numeric_bounds_and_oneof() {
        let c = constraints("gte=1,lte=100", Kind::Integer);
        assert_eq!(
            rule_of(check_value("l", false, &c, Some(&FieldValue::Integer(0)))).as_deref(),
            Some("min")
        );
        assert!(check_value("l", false, &c, Some(&FieldValue::Integer(100))).is_ok());

        let order = constraints("oneof=asc desc", Kind::String);
        assert_eq!(
            rule_of(check_value("o", false, &order, Some(&FieldValue::String("up".into())))).as_deref(),
            Some("oneof")
        );
    }

    #[test]
    fn test_omitempty_skips_zero_values() {
        let c = constraints("omitempty,email", Kind::String);
        assert!(check_value("e", false, &c, Some(&FieldValue::String(String::new()))).is_ok());
    }

    #[test]
    fn test_null_body_fails_when_fields_required() {
        let shape: TypeShape = RecordShape::named("Order")
            .field(FieldShape::new(
                "Body",
                RecordShape::anonymous().field(FieldShape::of::<String>("Name").validate("required")),
            ))
            .into();
        let d = describe(&shape);
        let instance = Instance::new(BTreeMap::from([("body".to_string(), FieldValue::Null)]));
        assert_eq!(
            check(&d, &instance),
            Err(ParseError::ValidationFailed {
                field: "body".into(),
                rule: "required".into(),
            })
        );
    }
}
