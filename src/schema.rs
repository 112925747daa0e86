//! Compiled schema nodes, the arena that owns them, and the public handle.
use crate::{
    content::{ContentEncodingCheck, ContentEncodingConvert, ContentMediaTypeCheck},
    error::ValidateError,
    formats::FormatCheck,
    primitive_type::TypeSet,
    validator,
};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{de, Serialize};
use serde_json::{Map, Number, Value};
use std::{fmt, io, sync::Arc};

/// Stable address of a compiled node inside its [`SchemaStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SchemaIndex(usize);

/// Arena of compiled nodes. The graph may be cyclic; cycles go through
/// indices, so nodes never own each other.
#[derive(Debug, Default)]
pub(crate) struct SchemaStore {
    nodes: Vec<SchemaNode>,
    /// Identity: (resource base URL, JSON pointer) -> node. Two references
    /// that resolve to the same location share one compiled node.
    by_location: AHashMap<(String, String), SchemaIndex>,
}

impl SchemaStore {
    pub(crate) fn get(&self, index: SchemaIndex) -> &SchemaNode {
        &self.nodes[index.0]
    }

    pub(crate) fn lookup(&self, base: &str, pointer: &str) -> Option<SchemaIndex> {
        self.by_location
            .get(&(base.to_string(), pointer.to_string()))
            .copied()
    }

    /// Insert a placeholder so that back-edges created while compiling the
    /// node's subschemas find it.
    pub(crate) fn reserve(&mut self, base: &str, pointer: &str, location: String) -> SchemaIndex {
        let index = SchemaIndex(self.nodes.len());
        self.nodes.push(SchemaNode::new(location));
        self.by_location
            .insert((base.to_string(), pointer.to_string()), index);
        index
    }

    pub(crate) fn replace(&mut self, index: SchemaIndex, node: SchemaNode) {
        self.nodes[index.0] = node;
    }

    pub(crate) fn unregister(&mut self, base: &str, pointer: &str) {
        self.by_location
            .remove(&(base.to_string(), pointer.to_string()));
    }
}

/// A keyword whose value is either a boolean or a subschema.
#[derive(Debug, Default)]
pub(crate) enum Additional {
    #[default]
    Absent,
    Bool(bool),
    Schema(SchemaIndex),
}

/// The two shapes of the `items` keyword.
#[derive(Debug, Default)]
pub(crate) enum Items {
    #[default]
    Absent,
    Single(SchemaIndex),
    List(Vec<SchemaIndex>),
}

/// One entry of `dependencies`: a list of required names or a subschema.
#[derive(Debug)]
pub(crate) enum Dependency {
    Required(Vec<String>),
    Schema(SchemaIndex),
}

/// Annotation keywords extracted from a schema node when the compiler is
/// configured to do so.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    /// `title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `default`
    pub default: Option<Value>,
    /// `examples`
    pub examples: Vec<Value>,
    /// `readOnly`
    pub read_only: bool,
    /// `writeOnly`
    pub write_only: bool,
    /// `deprecated` (2019-09)
    pub deprecated: bool,
    /// `$comment`
    pub comment: Option<String>,
}

/// One compiled unit of assertion: the evaluator's smallest addressable
/// target. Immutable once compilation finishes.
#[derive(Debug)]
pub(crate) struct SchemaNode {
    /// Canonical absolute URL including the pointer fragment.
    pub(crate) location: String,

    /// Set for boolean schemas: `true` accepts everything, `false` nothing.
    pub(crate) always: Option<bool>,

    pub(crate) ref_: Option<SchemaIndex>,
    pub(crate) recursive_ref: Option<SchemaIndex>,
    pub(crate) recursive_anchor: bool,

    pub(crate) types: TypeSet,
    pub(crate) enum_: Option<Vec<Value>>,
    pub(crate) constant: Option<Value>,
    pub(crate) not: Option<SchemaIndex>,
    pub(crate) all_of: Vec<SchemaIndex>,
    pub(crate) any_of: Vec<SchemaIndex>,
    pub(crate) one_of: Vec<SchemaIndex>,
    pub(crate) if_: Option<SchemaIndex>,
    pub(crate) then_: Option<SchemaIndex>,
    pub(crate) else_: Option<SchemaIndex>,

    /// Insertion order is preserved so error order is deterministic.
    pub(crate) properties: Vec<(String, SchemaIndex)>,
    pub(crate) pattern_properties: Vec<(String, fancy_regex::Regex, SchemaIndex)>,
    pub(crate) additional_properties: Additional,
    pub(crate) property_names: Option<SchemaIndex>,
    pub(crate) required: Vec<String>,
    pub(crate) dependencies: Vec<(String, Dependency)>,
    pub(crate) dependent_required: Vec<(String, Vec<String>)>,
    pub(crate) dependent_schemas: Vec<(String, SchemaIndex)>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,

    pub(crate) items: Items,
    pub(crate) additional_items: Additional,
    pub(crate) contains: Option<SchemaIndex>,
    pub(crate) min_contains: Option<u64>,
    pub(crate) max_contains: Option<u64>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,

    pub(crate) minimum: Option<Number>,
    pub(crate) maximum: Option<Number>,
    pub(crate) exclusive_minimum: Option<Number>,
    pub(crate) exclusive_maximum: Option<Number>,
    pub(crate) multiple_of: Option<Number>,

    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<(String, fancy_regex::Regex)>,
    pub(crate) format: Option<(String, Option<FormatCheck>)>,
    pub(crate) content_encoding: Option<(String, ContentEncodingCheck, ContentEncodingConvert)>,
    pub(crate) content_media_type: Option<(String, ContentMediaTypeCheck)>,

    pub(crate) annotations: Option<Box<Annotations>>,
}

impl SchemaNode {
    pub(crate) fn new(location: String) -> SchemaNode {
        SchemaNode {
            location,
            always: None,
            ref_: None,
            recursive_ref: None,
            recursive_anchor: false,
            types: TypeSet::new(),
            enum_: None,
            constant: None,
            not: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            if_: None,
            then_: None,
            else_: None,
            properties: Vec::new(),
            pattern_properties: Vec::new(),
            additional_properties: Additional::Absent,
            property_names: None,
            required: Vec::new(),
            dependencies: Vec::new(),
            dependent_required: Vec::new(),
            dependent_schemas: Vec::new(),
            min_properties: None,
            max_properties: None,
            items: Items::Absent,
            additional_items: Additional::Absent,
            contains: None,
            min_contains: None,
            max_contains: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            content_encoding: None,
            content_media_type: None,
            annotations: None,
        }
    }
}

/// A compiled schema, ready for validation.
///
/// Handles are cheap to clone and safe to share: evaluation never writes,
/// so any number of threads may validate concurrently. The underlying node
/// graph lives as long as any handle (or the owning compiler) does.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) store: Arc<RwLock<SchemaStore>>,
    pub(crate) index: SchemaIndex,
    pub(crate) location: String,
    pub(crate) max_depth: Option<usize>,
}

impl Schema {
    /// Validate a JSON document read from `reader`.
    ///
    /// # Errors
    ///
    /// [`ValidateError::InvalidJson`] if the input is empty, unparseable or
    /// contains more than one top-level value; [`ValidateError::Validation`]
    /// with the full error tree if the instance does not conform.
    pub fn validate(&self, reader: impl io::Read) -> Result<(), ValidateError> {
        let instance = parse_document(reader)
            .map_err(|source| ValidateError::InvalidJson { source })?;
        self.validate_value(&instance)
    }

    /// Validate an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// [`ValidateError::Validation`] with the full error tree.
    pub fn validate_value(&self, instance: &Value) -> Result<(), ValidateError> {
        let store = self.store.read();
        validator::validate(&store, self.index, instance, self.max_depth)
    }

    /// Validate any serializable value.
    ///
    /// # Errors
    ///
    /// [`ValidateError::InvalidInstanceType`] if the value is not
    /// representable as JSON; otherwise as [`Schema::validate_value`].
    pub fn validate_data<T: Serialize>(&self, data: &T) -> Result<(), ValidateError> {
        let instance = serde_json::to_value(data)
            .map_err(|source| ValidateError::InvalidInstanceType { source })?;
        self.validate_value(&instance)
    }

    /// Boolean shortcut without error materialization.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate_value(instance).is_ok()
    }

    /// Canonical absolute URL of this schema.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Annotations of the root node. Empty unless the compiler was built
    /// with annotation extraction enabled.
    #[must_use]
    pub fn annotations(&self) -> Annotations {
        let store = self.store.read();
        store
            .get(self.index)
            .annotations
            .as_deref()
            .cloned()
            .unwrap_or_default()
    }
}

/// Parse exactly one JSON document from a reader; empty input and trailing
/// content are errors. Objects keep their keys in document order, and the
/// first occurrence of a duplicated key wins.
pub(crate) fn parse_document(reader: impl io::Read) -> Result<Value, serde_json::Error> {
    use serde::de::Error;

    let mut stream = serde_json::Deserializer::from_reader(reader).into_iter::<FirstWins>();
    let value = match stream.next() {
        Some(result) => result?.0,
        None => return Err(serde_json::Error::custom("EOF while parsing a value")),
    };
    match stream.next() {
        Some(Ok(_)) => Err(serde_json::Error::custom(
            "trailing content after the first document",
        )),
        Some(Err(error)) => Err(error),
        None => Ok(value),
    }
}

/// A JSON value deserialized with first-wins semantics for duplicated
/// object keys. `serde_json`'s own `Value` keeps the last occurrence.
struct FirstWins(Value);

impl<'de> de::Deserialize<'de> for FirstWins {
    fn deserialize<D>(deserializer: D) -> Result<FirstWins, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct FirstWinsVisitor;

        impl<'de> de::Visitor<'de> for FirstWinsVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("any valid JSON value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Number(value.into()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Number(value.into()))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Number::from_f64(value).map_or(Value::Null, Value::Number))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::String(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut array = Vec::new();
                while let Some(FirstWins(value)) = seq.next_element()? {
                    array.push(value);
                }
                Ok(Value::Array(array))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut object = Map::new();
                let Some(key) = map.next_key::<String>()? else {
                    return Ok(Value::Object(object));
                };
                // `arbitrary_precision` delivers numbers as a map with this
                // marker key and the source literal as its value
                if key == "$serde_json::private::Number" {
                    let literal: String = map.next_value()?;
                    return literal
                        .parse::<Number>()
                        .map(Value::Number)
                        .map_err(de::Error::custom);
                }
                let value = map.next_value::<FirstWins>()?.0;
                object.insert(key, value);
                while let Some(key) = map.next_key::<String>()? {
                    let value = map.next_value::<FirstWins>()?.0;
                    object.entry(key).or_insert(value);
                }
                Ok(Value::Object(object))
            }
        }

        deserializer.deserialize_any(FirstWinsVisitor).map(FirstWins)
    }
}
