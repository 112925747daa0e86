use jschema::{CompileError, Compiler, Draft, ValidationErrorKind};
use serde_json::json;
use std::{
    io::Read,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

fn reader(value: serde_json::Value) -> impl Read {
    std::io::Cursor::new(serde_json::to_vec(&value).expect("Valid JSON"))
}

#[test]
fn simple_schema() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!({"type": "string"})))
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert_eq!(schema.location(), "json-schema:///schema.json#");
    assert!(schema.is_valid(&json!("hi")));
    assert!(!schema.is_valid(&json!(5)));
}

#[test]
fn fragment_entry_point() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource(
            "schema.json",
            reader(json!({"definitions": {"name": {"type": "string"}}})),
        )
        .expect("valid resource");
    let schema = compiler
        .compile("schema.json#/definitions/name")
        .expect("valid schema");
    assert_eq!(schema.location(), "json-schema:///schema.json#/definitions/name");
    assert!(schema.is_valid(&json!("hi")));
    assert!(!schema.is_valid(&json!(5)));
}

#[test]
fn array_pointer_entry_point() {
    // A top-level `#/0` fragment pointing into a JSON array is an ordinary
    // pointer target; only the referenced node is meta-validated
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schemas.json", reader(json!([{"type": "integer"}])))
        .expect("valid resource");
    let schema = compiler.compile("schemas.json#/0").expect("valid schema");
    assert!(schema.is_valid(&json!(3)));
    assert!(!schema.is_valid(&json!("3")));
}

#[test]
fn recursive_tree_via_anchor() {
    let mut options = Compiler::options();
    options.with_draft(Draft::Draft7);
    let mut compiler = options.build();
    compiler
        .add_resource(
            "schema.json",
            reader(json!({"properties": {"otype": {"$ref": "defs.json#someid"}}})),
        )
        .expect("valid resource");
    compiler
        .add_resource(
            "defs.json",
            reader(json!({
                "definitions": {
                    "odef": {
                        "$id": "#someid",
                        "properties": {"name": {"enum": ["zinc"]}}
                    }
                }
            })),
        )
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!({"otype": {"name": "zinc"}})));
    assert!(!schema.is_valid(&json!({"otype": {"name": "gold"}})));
}

#[test]
fn self_recursive_schema() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource(
            "tree.json",
            reader(json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "children": {"type": "array", "items": {"$ref": "#"}}
                },
                "required": ["name"]
            })),
        )
        .expect("valid resource");
    let schema = compiler.compile("tree.json").expect("valid schema");
    assert!(schema.is_valid(&json!({
        "name": "root",
        "children": [{"name": "leaf", "children": []}]
    })));
    assert!(!schema.is_valid(&json!({
        "name": "root",
        "children": [{"children": []}]
    })));
}

#[test]
fn external_loader() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut options = Compiler::options();
    options.with_loader(Arc::new(
        move |url: &str| -> Result<Box<dyn Read>, jschema::LoadErrorSource> {
            counter.fetch_add(1, Ordering::SeqCst);
            let document = if url.ends_with("/base.json") {
                json!({"type": "string"})
            } else if url.ends_with("/schema.json") {
                json!({"allOf": [{"$ref": "base.json"}, {"maxLength": 3}]})
            } else {
                return Err(format!("unexpected URL: {url}").into());
            };
            Ok(Box::new(reader(document)))
        },
    ));
    let mut compiler = options.build();
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!("foo")));
    assert!(!schema.is_valid(&json!("long")));
    // The loader is invoked exactly once per URL per compiler
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    compiler.compile("schema.json").expect("valid schema");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn embedded_id_carves_out_a_resource() {
    let mut options = Compiler::options();
    options.with_draft(Draft::Draft7);
    let mut compiler = options.build();
    compiler
        .add_resource(
            "http://example.com/root.json",
            reader(json!({
                "definitions": {
                    "sub": {
                        "$id": "http://example.com/sub.json",
                        "type": "integer"
                    }
                },
                "properties": {"value": {"$ref": "http://example.com/sub.json"}}
            })),
        )
        .expect("valid resource");
    let schema = compiler
        .compile("http://example.com/root.json")
        .expect("valid schema");
    assert!(schema.is_valid(&json!({"value": 5})));
    assert!(!schema.is_valid(&json!({"value": "5"})));
    // The embedded resource is addressable on its own
    let sub = compiler
        .compile("http://example.com/sub.json")
        .expect("valid schema");
    assert!(sub.is_valid(&json!(5)));
}

#[test]
fn escaped_pointer_segments() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource(
            "schema.json",
            reader(json!({
                "definitions": {"a/b": {"type": "integer"}},
                "properties": {"x": {"$ref": "#/definitions/a~1b"}}
            })),
        )
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!({"x": 1})));
    assert!(!schema.is_valid(&json!({"x": "1"})));
}

#[test]
fn ref_not_found() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource(
            "schema.json",
            reader(json!({"properties": {"x": {"$ref": "#/definitions/missing"}}})),
        )
        .expect("valid resource");
    let error = compiler.compile("schema.json").expect_err("should fail");
    assert!(
        matches!(error, CompileError::RefNotFound { ref reference } if reference.contains("/definitions/missing")),
        "{error}"
    );
    // Recompiling reproduces the error instead of finding a leftover
    // placeholder
    assert!(matches!(
        compiler.compile("schema.json"),
        Err(CompileError::RefNotFound { .. })
    ));
}

#[test]
fn unknown_anchor() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!({"$ref": "#nowhere"})))
        .expect("valid resource");
    assert!(matches!(
        compiler.compile("schema.json"),
        Err(CompileError::RefNotFound { .. })
    ));
}

#[test]
fn duplicate_anchor() {
    let mut options = Compiler::options();
    options.with_draft(Draft::Draft7);
    let mut compiler = options.build();
    let error = compiler
        .add_resource(
            "schema.json",
            reader(json!({
                "definitions": {
                    "a": {"$id": "#dup"},
                    "b": {"$id": "#dup"}
                }
            })),
        )
        .expect_err("should fail");
    assert!(matches!(error, CompileError::DuplicateAnchor { ref anchor, .. } if anchor == "dup"));
}

#[test]
fn unknown_draft() {
    let mut compiler = Compiler::new();
    let error = compiler
        .add_resource(
            "schema.json",
            reader(json!({"$schema": "http://example.com/unknown"})),
        )
        .expect_err("should fail");
    assert!(matches!(error, CompileError::UnknownDraft { .. }));
}

#[test]
fn schema_invalid_carries_a_validation_tree() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!({"type": 42})))
        .expect("valid resource");
    let error = compiler.compile("schema.json").expect_err("should fail");
    let CompileError::SchemaInvalid { url, cause } = error else {
        panic!("expected SchemaInvalid, got {error}");
    };
    assert_eq!(url, "json-schema:///schema.json#");
    // The cause is a full validation tree against the meta-schema
    assert!(matches!(cause.kind, ValidationErrorKind::Schema { .. }));
    assert!(!cause.causes.is_empty());
}

#[test]
fn meta_validation_verdict_is_stable_across_recompiles() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!({"multipleOf": -5})))
        .expect("valid resource");
    assert!(matches!(
        compiler.compile("schema.json"),
        Err(CompileError::SchemaInvalid { .. })
    ));
    assert!(matches!(
        compiler.compile("schema.json"),
        Err(CompileError::SchemaInvalid { .. })
    ));
}

#[test]
fn duplicate_schema_keys_resolve_first_wins() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource(
            "schema.json",
            &br#"{"type": "integer", "type": "string"}"#[..],
        )
        .expect("valid resource");
    let schema = compiler.compile("schema.json").expect("valid schema");
    assert!(schema.is_valid(&json!(5)));
    assert!(!schema.is_valid(&json!("5")));
}

#[test]
fn schema_validation_can_be_disabled() {
    let mut options = Compiler::options();
    options.without_schema_validation();
    let mut compiler = options.build();
    compiler
        .add_resource("schema.json", reader(json!({"minimum": 1, "unknown!": []})))
        .expect("valid resource");
    assert!(compiler.compile("schema.json").is_ok());
}

#[test]
fn invalid_regex() {
    let mut options = Compiler::options();
    options.without_schema_validation();
    let mut compiler = options.build();
    compiler
        .add_resource("schema.json", reader(json!({"pattern": "(unclosed"})))
        .expect("valid resource");
    assert!(matches!(
        compiler.compile("schema.json"),
        Err(CompileError::InvalidRegex { .. })
    ));
}

#[test]
fn meta_schemas_are_bundled() {
    // `$ref`s to the published meta-schema URLs never touch the loader
    for url in [
        "http://json-schema.org/draft-04/schema",
        "http://json-schema.org/draft-06/schema",
        "http://json-schema.org/draft-07/schema",
        "https://json-schema.org/draft/2019-09/schema",
    ] {
        let mut compiler = Compiler::new();
        let schema = compiler.compile(url).expect("bundled meta-schema");
        assert!(schema.is_valid(&json!({"type": "string"})));
        assert!(!schema.is_valid(&json!({"type": 42})));
    }
}

#[test]
fn compilation_is_idempotent() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", reader(json!({"type": "integer"})))
        .expect("valid resource");
    let first = compiler.compile("schema.json").expect("valid schema");
    let second = compiler.compile("schema.json").expect("valid schema");
    assert_eq!(first.location(), second.location());
    let instance = json!("not a number");
    let left = first.validate_value(&instance).expect_err("invalid");
    let right = second.validate_value(&instance).expect_err("invalid");
    assert_eq!(left.to_string(), right.to_string());
}

#[test]
fn urls_are_normalized() {
    let mut compiler = Compiler::new();
    compiler
        .add_resource("HTTP://EXAMPLE.com:80/a.json", reader(json!({"type": "null"})))
        .expect("valid resource");
    let schema = compiler
        .compile("http://example.com/a.json")
        .expect("same resource under its normalized URL");
    assert!(schema.is_valid(&json!(null)));
}

#[test]
#[should_panic(expected = "compile('missing.json')")]
fn must_compile_panics() {
    Compiler::new().must_compile("missing.json");
}
