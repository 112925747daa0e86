use jschema::{Compiler, ValidateError, ValidationError, ValidationErrorKind};
use serde_json::json;
use std::io::Read;

fn reader(value: serde_json::Value) -> impl Read {
    std::io::Cursor::new(serde_json::to_vec(&value).expect("Valid JSON"))
}

fn compiled(schema: serde_json::Value) -> jschema::Schema {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(schema))
        .expect("valid resource");
    compiler.compile("schema.json").expect("valid schema")
}

fn tree(schema: serde_json::Value, instance: &serde_json::Value) -> ValidationError {
    match compiled(schema).validate_value(instance) {
        Err(ValidateError::Validation(tree)) => tree,
        other => panic!("expected a validation tree, got {other:?}"),
    }
}

fn keyword_locations(error: &ValidationError, into: &mut Vec<String>) {
    into.push(error.keyword_location.clone());
    for cause in &error.causes {
        keyword_locations(cause, into);
    }
}

#[test]
fn simple_type() {
    let schema = compiled(json!({"type": "string"}));
    assert!(schema.validate_value(&json!("hi")).is_ok());
    let error = tree(json!({"type": "string"}), &json!(5));
    assert!(matches!(error.kind, ValidationErrorKind::Schema { .. }));
    assert_eq!(error.causes.len(), 1);
    let cause = &error.causes[0];
    assert!(cause.keyword_location.ends_with("#/type"));
    assert!(matches!(cause.kind, ValidationErrorKind::Type { .. }));
}

#[test]
fn two_level_all_of_error() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("base.json", reader(json!({"type": "string"})))
        .expect("valid resource");
    compiler
        .add_resource(
            "schema.json",
            reader(json!({"allOf": [{"$ref": "base.json"}, {"maxLength": 3}]})),
        )
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.validate_value(&json!("foo")).is_ok());
    let Err(ValidateError::Validation(error)) = schema.validate_value(&json!("long")) else {
        panic!("expected a validation tree");
    };
    let outer = &error.causes[0];
    assert!(outer.keyword_location.ends_with("#/allOf/1"));
    let inner = &outer.causes[0];
    assert!(inner.keyword_location.ends_with("#/allOf/1/maxLength"));
    assert!(matches!(inner.kind, ValidationErrorKind::MaxLength { limit: 3 }));
}

#[test]
fn custom_format() {
    let mut options = Compiler::options();
    options.assert_format(true).with_format("even-number", |value| {
        value.as_i64().is_some_and(|number| number % 2 == 0)
    });
    let mut compiler = options.build();
    compiler
        .add_resource(
            "schema.json",
            reader(json!({"type": "integer", "format": "even-number"})),
        )
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!(6)));
    let error = match schema.validate_value(&json!(5)) {
        Err(ValidateError::Validation(error)) => error,
        other => panic!("expected a validation tree, got {other:?}"),
    };
    assert!(
        matches!(&error.causes[0].kind, ValidationErrorKind::Format { format } if format == "even-number")
    );
}

#[test]
fn invalid_json_instance() {
    let schema = compiled(json!({"type": "object"}));
    for bytes in [&b"{"[..], &b"{}{}"[..], &b""[..]] {
        assert!(
            matches!(schema.validate(bytes), Err(ValidateError::InvalidJson { .. })),
            "{bytes:?} must be rejected as invalid JSON"
        );
    }
    assert!(schema.validate(&b" {} "[..]).is_ok());
}

#[test]
fn duplicate_instance_keys_resolve_first_wins() {
    let schema = compiled(json!({"properties": {"a": {"type": "integer"}}}));
    assert!(schema.validate(&br#"{"a": 1, "a": "x"}"#[..]).is_ok());
    assert!(schema.validate(&br#"{"a": "x", "a": 1}"#[..]).is_err());
}

#[test]
fn annotation_extraction_off_and_on() {
    let document = json!({"title": "t", "examples": [1, 2], "default": {"x": 1}});
    let schema = compiled(document.clone());
    assert_eq!(schema.annotations().title, None);
    assert!(schema.annotations().examples.is_empty());

    let mut options = Compiler::options();
    options.extract_annotations(true);
    let mut compiler = options.build();
    compiler
        .add_resource("schema.json", reader(document))
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    let annotations = schema.annotations();
    assert_eq!(annotations.title.as_deref(), Some("t"));
    assert_eq!(annotations.examples, vec![json!(1), json!(2)]);
    assert_eq!(annotations.default, Some(json!({"x": 1})));
}

#[test]
fn required_reports_each_missing_name_in_order() {
    let error = tree(
        json!({"required": ["a", "b", "c"]}),
        &json!({"b": 1}),
    );
    let properties: Vec<_> = error
        .causes
        .iter()
        .map(|cause| match &cause.kind {
            ValidationErrorKind::Required { property } => property.clone(),
            other => panic!("unexpected kind {other:?}"),
        })
        .collect();
    assert_eq!(properties, ["a", "c"]);
}

#[test]
fn property_failures_in_declaration_order() {
    let error = tree(
        json!({"properties": {"b": {"type": "integer"}, "a": {"type": "integer"}}}),
        &json!({"a": "x", "b": "y"}),
    );
    assert_eq!(error.causes.len(), 2);
    assert!(error.causes[0].keyword_location.ends_with("/properties/b"));
    assert_eq!(error.causes[0].instance_location.to_string(), "/b");
    assert!(error.causes[1].keyword_location.ends_with("/properties/a"));
    assert_eq!(error.causes[1].instance_location.to_string(), "/a");
}

#[test]
fn one_of_zero_and_multiple_matches_are_distinct() {
    let schema = json!({"oneOf": [{"type": "integer"}, {"type": "number", "minimum": 2}]});
    let error = tree(schema.clone(), &json!("text"));
    assert!(matches!(
        error.causes[0].kind,
        ValidationErrorKind::OneOfNotValid
    ));
    let error = tree(schema, &json!(3));
    assert!(matches!(
        error.causes[0].kind,
        ValidationErrorKind::OneOfMultipleValid { first: 0, second: 1 }
    ));
}

#[test]
fn silent_keywords_do_not_leak_errors() {
    // `if` errors are discarded; only the `else` branch shows up
    let error = tree(
        json!({"if": {"type": "string"}, "else": {"minimum": 5}}),
        &json!(3),
    );
    let mut locations = Vec::new();
    keyword_locations(&error, &mut locations);
    assert!(locations.iter().any(|location| location.ends_with("/else")));
    assert!(!locations.iter().any(|location| location.contains("/if")));

    // `not` and `anyOf` report only themselves
    let error = tree(json!({"not": {"type": "string"}}), &json!("x"));
    assert!(matches!(error.causes[0].kind, ValidationErrorKind::Not));
    assert!(error.causes[0].causes.is_empty());
    let error = tree(
        json!({"anyOf": [{"type": "string"}, {"minimum": 10}]}),
        &json!(5),
    );
    assert!(matches!(error.causes[0].kind, ValidationErrorKind::AnyOf));
    assert!(error.causes[0].causes.is_empty());
}

#[test]
fn if_then_applies_on_condition_success() {
    let schema = compiled(json!({
        "if": {"type": "integer"},
        "then": {"minimum": 10},
        "else": {"maxLength": 2}
    }));
    assert!(schema.is_valid(&json!(12)));
    assert!(!schema.is_valid(&json!(3)));
    assert!(schema.is_valid(&json!("ab")));
    assert!(!schema.is_valid(&json!("abc")));
}

#[test]
fn unique_items_compares_by_json_equality() {
    let error = tree(json!({"uniqueItems": true}), &json!([1, "x", 1.0]));
    assert!(matches!(
        error.causes[0].kind,
        ValidationErrorKind::UniqueItems { first: 0, second: 2 }
    ));
    let schema = compiled(json!({"uniqueItems": true}));
    assert!(schema.is_valid(&json!([{"a": 1, "b": 2}, {"b": 2, "a": 2}])));
    assert!(!schema.is_valid(&json!([{"a": 1, "b": 2}, {"b": 2.0, "a": 1}])));
}

#[test]
fn integer_matches_whole_floats() {
    let schema = compiled(json!({"type": "integer"}));
    assert!(schema.is_valid(&json!(1)));
    assert!(schema.is_valid(&json!(1.0)));
    assert!(!schema.is_valid(&json!(1.5)));
}

#[test]
fn multiple_of_uses_exact_decimals() {
    assert!(jschema::is_valid(&json!({"multipleOf": 0.1}), &json!(1.1)));
    assert!(jschema::is_valid(&json!({"multipleOf": 0.01}), &json!(19.99)));
    assert!(!jschema::is_valid(&json!({"multipleOf": 0.3}), &json!(1.0)));
}

#[test]
fn string_length_counts_code_points() {
    let schema = compiled(json!({"minLength": 2, "maxLength": 3}));
    assert!(schema.is_valid(&json!("日本語")));
    assert!(!schema.is_valid(&json!("日本語だ")));
    assert!(!schema.is_valid(&json!("日")));
}

#[test]
fn draft4_boolean_exclusive_bounds() {
    let schema = compiled(json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "maximum": 10,
        "exclusiveMaximum": true,
        "minimum": 1
    }));
    assert!(schema.is_valid(&json!(9.5)));
    assert!(!schema.is_valid(&json!(10)));
    assert!(schema.is_valid(&json!(1)));
    assert!(!schema.is_valid(&json!(0)));
}

#[test]
fn numeric_exclusive_bounds_since_draft6() {
    let schema = compiled(json!({"exclusiveMinimum": 0, "exclusiveMaximum": 1}));
    assert!(schema.is_valid(&json!(0.5)));
    assert!(!schema.is_valid(&json!(0)));
    assert!(!schema.is_valid(&json!(1)));
}

#[test]
fn contains_with_bounds() {
    let schema = compiled(json!({"contains": {"type": "integer"}}));
    assert!(schema.is_valid(&json!(["a", 1])));
    let error = tree(json!({"contains": {"type": "integer"}}), &json!(["a", "b"]));
    assert!(matches!(error.causes[0].kind, ValidationErrorKind::Contains));
    // Every failing element contributes a cause
    assert_eq!(error.causes[0].causes.len(), 2);

    let schema = compiled(json!({"contains": {"type": "integer"}, "minContains": 2}));
    assert!(schema.is_valid(&json!([1, "a", 2])));
    assert!(!schema.is_valid(&json!([1, "a"])));

    let schema = compiled(json!({"contains": {"type": "integer"}, "maxContains": 1}));
    assert!(schema.is_valid(&json!([1, "a"])));
    assert!(!schema.is_valid(&json!([1, 2])));

    // `minContains: 0` makes `contains` trivially satisfied
    let schema = compiled(json!({"contains": {"type": "integer"}, "minContains": 0}));
    assert!(schema.is_valid(&json!(["a"])));
}

#[test]
fn items_list_and_additional_items() {
    let schema = compiled(json!({
        "items": [{"type": "integer"}, {"type": "string"}],
        "additionalItems": false
    }));
    assert!(schema.is_valid(&json!([1, "a"])));
    assert!(!schema.is_valid(&json!([1, "a", true])));
    assert!(!schema.is_valid(&json!(["a", "a"])));

    let schema = compiled(json!({
        "items": [{"type": "integer"}],
        "additionalItems": {"type": "boolean"}
    }));
    assert!(schema.is_valid(&json!([1, true, false])));
    assert!(!schema.is_valid(&json!([1, "x"])));
}

#[test]
fn additional_properties_reports_unexpected_names() {
    let error = tree(
        json!({"properties": {"a": true}, "additionalProperties": false}),
        &json!({"a": 1, "b": 2, "c": 3}),
    );
    let ValidationErrorKind::AdditionalProperties { unexpected } = &error.causes[0].kind else {
        panic!("unexpected kind {:?}", error.causes[0].kind);
    };
    assert_eq!(unexpected, &["b".to_string(), "c".to_string()]);
}

#[test]
fn additional_properties_schema_applies_to_unmatched_names() {
    let schema = compiled(json!({
        "properties": {"a": {"type": "integer"}},
        "patternProperties": {"^p": {"type": "string"}},
        "additionalProperties": {"type": "boolean"}
    }));
    assert!(schema.is_valid(&json!({"a": 1, "p1": "x", "other": true})));
    assert!(!schema.is_valid(&json!({"other": 1})));
    // Pattern-matched names are exempt from additionalProperties
    assert!(schema.is_valid(&json!({"p-only": "x"})));
}

#[test]
fn property_names() {
    let error = tree(
        json!({"propertyNames": {"maxLength": 3}}),
        &json!({"abcd": 1}),
    );
    assert!(
        matches!(&error.causes[0].kind, ValidationErrorKind::PropertyNames { property } if property == "abcd")
    );
    let schema = compiled(json!({"propertyNames": {"pattern": "^a"}}));
    assert!(schema.is_valid(&json!({"abc": 1})));
    assert!(!schema.is_valid(&json!({"xbc": 1})));
}

#[test]
fn dependencies_draft7() {
    let schema = compiled(json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "dependencies": {
            "credit_card": ["billing_address"],
            "name": {"properties": {"age": {"type": "integer"}}}
        }
    }));
    assert!(schema.is_valid(&json!({"credit_card": 1, "billing_address": "x"})));
    assert!(!schema.is_valid(&json!({"credit_card": 1})));
    assert!(schema.is_valid(&json!({"name": "n", "age": 3})));
    assert!(!schema.is_valid(&json!({"name": "n", "age": "3"})));
    assert!(schema.is_valid(&json!({"age": "3"})));
}

#[test]
fn dependent_keywords_2019() {
    let schema = compiled(json!({
        "dependentRequired": {"credit_card": ["billing_address"]},
        "dependentSchemas": {"name": {"properties": {"age": {"type": "integer"}}}}
    }));
    assert!(!schema.is_valid(&json!({"credit_card": 1})));
    assert!(schema.is_valid(&json!({"credit_card": 1, "billing_address": "x"})));
    assert!(!schema.is_valid(&json!({"name": "n", "age": "3"})));
}

#[test]
fn format_assertion_is_draft_dependent() {
    // Drafts 4/6/7 assert formats by default
    let schema = compiled(json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "format": "ipv4"
    }));
    assert!(!schema.is_valid(&json!("999.1.1.1")));
    assert!(schema.is_valid(&json!("127.0.0.1")));

    // 2019-09 only annotates unless opted in
    let schema = compiled(json!({"format": "ipv4"}));
    assert!(schema.is_valid(&json!("999.1.1.1")));

    // Explicit opt-out wins over the draft default
    let mut options = Compiler::options();
    options.assert_format(false);
    let mut compiler = options.build();
    compiler
        .add_resource(
            "schema.json",
            reader(json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "format": "ipv4"
            })),
        )
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!("999.1.1.1")));
}

#[test]
fn unknown_formats_never_fail() {
    let mut options = Compiler::options();
    options.assert_format(true);
    let mut compiler = options.build();
    compiler
        .add_resource("schema.json", reader(json!({"format": "no-such-format"})))
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!("anything")));
}

#[test]
fn content_keywords_assert_in_draft7_only() {
    let draft7 = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "contentEncoding": "base64",
        "contentMediaType": "application/json"
    });
    let schema = compiled(draft7);
    // base64-encoded `{"foo": "bar"}`
    assert!(schema.is_valid(&json!("eyJmb28iOiAiYmFyIn0=")));
    assert!(!schema.is_valid(&json!("not base64")));
    // valid base64, but not JSON inside
    assert!(!schema.is_valid(&json!("aGVsbG8=")));

    // 2019-09 treats them as annotations
    let schema = compiled(json!({
        "contentEncoding": "base64",
        "contentMediaType": "application/json"
    }));
    assert!(schema.is_valid(&json!("not base64")));
}

#[test]
fn recursive_anchor_2019() {
    let schema = compiled(json!({
        "$recursiveAnchor": true,
        "type": ["object", "integer"],
        "properties": {"child": {"$recursiveRef": "#"}}
    }));
    assert!(schema.is_valid(&json!({"child": {"child": 5}})));
    assert!(!schema.is_valid(&json!({"child": {"child": "leaf"}})));
}

#[test]
fn validate_data_serializes_rust_values() {
    let schema = compiled(json!({"type": "array", "items": {"type": "integer"}}));
    assert!(schema.validate_data(&vec![1, 2, 3]).is_ok());
    assert!(schema.validate_data(&vec!["a"]).is_err());

    let mut weird = std::collections::HashMap::new();
    weird.insert((1_u8, 2_u8), "x");
    let error = schema.validate_data(&weird).expect_err("should fail");
    assert!(matches!(error, ValidateError::InvalidInstanceType { .. }));
}

#[test]
fn evaluation_depth_limit() {
    let mut options = Compiler::options();
    options.with_max_eval_depth(64);
    let mut compiler = options.build();
    compiler
        .add_resource("schema.json", reader(json!({"$ref": "#"})))
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(matches!(
        schema.validate_value(&json!(1)),
        Err(ValidateError::EvaluationDepthExceeded { limit: 64 })
    ));
}

#[test]
fn validation_is_shareable_across_threads() {
    let schema = compiled(json!({"type": "integer", "minimum": 0}));
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let schema = schema.clone();
            scope.spawn(move || {
                for round in 0..100 {
                    assert!(schema.is_valid(&json!(worker * 100 + round)));
                    assert!(!schema.is_valid(&json!(-1)));
                }
            });
        }
    });
}

#[test]
fn error_tree_is_deterministic() {
    let schema = json!({
        "properties": {"a": {"type": "integer"}, "b": {"required": ["x"]}},
        "required": ["c"]
    });
    let instance = json!({"a": "x", "b": {}});
    let first = tree(schema.clone(), &instance);
    let second = tree(schema, &instance);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn display_is_indented_one_line_per_node() {
    let error = tree(
        json!({"properties": {"a": {"type": "integer"}}, "required": ["b"]}),
        &json!({"a": "x"}),
    );
    let rendered = error.to_string();
    let lines: Vec<_> = rendered.lines().collect();
    assert!(lines.len() >= 3, "{rendered}");
    assert!(lines[0].starts_with("at '':"), "{rendered}");
    assert!(lines[1].starts_with("  at "), "{rendered}");
}

#[test]
fn false_schema_rejects_everything() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!(false)))
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    let Err(ValidateError::Validation(error)) = schema.validate_value(&json!(1)) else {
        panic!("expected a validation tree");
    };
    assert!(matches!(
        error.causes[0].kind,
        ValidationErrorKind::FalseSchema
    ));

    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!(true)))
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!({"anything": ["goes", 1, null]})));
}

#[test]
fn enum_and_const_use_numeric_equality() {
    let schema = compiled(json!({"enum": [1, "x"]}));
    assert!(schema.is_valid(&json!(1.0)));
    assert!(!schema.is_valid(&json!(2)));
    let schema = compiled(json!({"const": {"a": [1]}}));
    assert!(schema.is_valid(&json!({"a": [1.0]})));
    assert!(!schema.is_valid(&json!({"a": [2]})));
}
