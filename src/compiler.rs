//! Schema compilation: fetching, reference resolution, memoization.
use crate::{
    content,
    draft::Draft,
    error::{CompileError, ValidateError},
    formats::{default_formats, FormatCheck, Formats},
    loader::{DefaultLoader, UrlLoader},
    primitive_type::PrimitiveType,
    resource::{self, Resource},
    schema::{
        self, Additional, Annotations, Dependency, Items, Schema, SchemaIndex, SchemaNode,
        SchemaStore,
    },
    uri,
};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{Map, Number, Value};
use std::{convert::TryFrom, fmt, io, sync::Arc};
use url::Url;

const SUPPORTED_DRAFTS: [Draft; 4] = [
    Draft::Draft4,
    Draft::Draft6,
    Draft::Draft7,
    Draft::Draft201909,
];

static KNOWN_META_URLS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    SUPPORTED_DRAFTS
        .iter()
        .flat_map(|draft| draft.meta_resources())
        .map(|(url, _)| url)
        .collect()
});

const EXPECT_MESSAGE: &str = "Invalid meta-schema";
static META_VALIDATORS: Lazy<AHashMap<Draft, Schema>> = Lazy::new(|| {
    let mut validators = AHashMap::with_capacity(4);
    for draft in SUPPORTED_DRAFTS {
        let mut options = Compiler::options();
        options.with_draft(draft).without_schema_validation();
        let mut compiler = options.build();
        for (url, document) in draft.meta_resources() {
            compiler
                .add_document(url, (*document).clone())
                .expect(EXPECT_MESSAGE);
        }
        validators.insert(draft, compiler.compile(draft.meta_url()).expect(EXPECT_MESSAGE));
    }
    validators
});

/// Full configuration to guide schema compilation.
///
/// The default format registry is a field here, populated by the
/// constructor; there is no process-wide mutable state.
#[derive(Clone)]
pub struct CompilerOptions {
    draft: Option<Draft>,
    assert_format: Option<bool>,
    extract_annotations: bool,
    validate_schema: bool,
    loader: Arc<dyn UrlLoader>,
    formats: Formats,
    max_eval_depth: Option<usize>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            draft: None,
            assert_format: None,
            extract_annotations: false,
            validate_schema: true,
            loader: Arc::new(DefaultLoader),
            formats: default_formats(),
            max_eval_depth: None,
        }
    }
}

impl CompilerOptions {
    /// Interpret resources without a `$schema` under the given draft.
    pub fn with_draft(&mut self, draft: Draft) -> &mut Self {
        self.draft = Some(draft);
        self
    }

    /// Force `format` to assert (or not), overriding the draft default.
    /// Drafts 4/6/7 assert by default, 2019-09 only annotates.
    pub fn assert_format(&mut self, assert: bool) -> &mut Self {
        self.assert_format = Some(assert);
        self
    }

    /// Populate `title`, `description`, `default` and the other annotation
    /// fields of compiled schemas.
    pub fn extract_annotations(&mut self, extract: bool) -> &mut Self {
        self.extract_annotations = extract;
        self
    }

    /// Skip validating schema documents against their draft meta-schema.
    pub fn without_schema_validation(&mut self) -> &mut Self {
        self.validate_schema = false;
        self
    }

    /// Use `loader` for URLs not covered by `add_resource`. It receives a
    /// normalized absolute URL without fragment, once per URL per compiler.
    pub fn with_loader(&mut self, loader: Arc<dyn UrlLoader>) -> &mut Self {
        self.loader = loader;
        self
    }

    /// Register a custom `format` predicate. The predicate sees the whole
    /// JSON value, so it may apply to non-strings.
    pub fn with_format<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.formats.insert(name.into(), FormatCheck::new(check));
        self
    }

    /// Abort validation with an error once evaluation nests this deep.
    /// Unset by default: a `$ref` loop that never consumes an instance step
    /// is the schema author's responsibility.
    pub fn with_max_eval_depth(&mut self, limit: usize) -> &mut Self {
        self.max_eval_depth = Some(limit);
        self
    }

    /// Create a [`Compiler`] with these options.
    #[must_use]
    pub fn build(&self) -> Compiler {
        Compiler {
            options: self.clone(),
            resources: AHashMap::new(),
            store: Arc::new(RwLock::new(SchemaStore::default())),
            meta_checked: AHashSet::new(),
        }
    }
}

/// Compiles schema documents into validation-ready [`Schema`] handles.
///
/// Compilation mutates the internal registry and is not meant for
/// concurrent use; the handles it returns are freely shareable.
pub struct Compiler {
    options: CompilerOptions,
    resources: AHashMap<String, Resource>,
    store: Arc<RwLock<SchemaStore>>,
    meta_checked: AHashSet<String>,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

impl Compiler {
    /// A compiler with default options.
    #[must_use]
    pub fn new() -> Compiler {
        CompilerOptions::default().build()
    }

    /// Get [`CompilerOptions`] for configuring a new [`Compiler`].
    #[must_use]
    pub fn options() -> CompilerOptions {
        CompilerOptions::default()
    }

    /// Register an in-memory resource under `url`.
    ///
    /// # Errors
    ///
    /// [`CompileError::InvalidJson`] if the reader does not hold exactly one
    /// JSON document; [`CompileError::DuplicateResource`] if the URL is
    /// taken; id-scan failures such as [`CompileError::DuplicateAnchor`].
    pub fn add_resource(&mut self, url: &str, reader: impl io::Read) -> Result<(), CompileError> {
        let (base, _) = uri::parse(url)?;
        let key = base.to_string();
        if self.resources.contains_key(&key) {
            return Err(CompileError::DuplicateResource { url: key });
        }
        let document = schema::parse_document(reader)
            .map_err(|source| CompileError::InvalidJson { url: key, source })?;
        self.register(base, document)
    }

    fn add_document(&mut self, url: &str, document: Value) -> Result<(), CompileError> {
        let (base, _) = uri::parse(url)?;
        self.register(base, document)
    }

    fn register(&mut self, base: Url, document: Value) -> Result<(), CompileError> {
        let draft = Draft::detect(&document, self.options.draft.unwrap_or_default())?;
        let resource = Resource::new(base.clone(), document, draft)?;
        self.resources.insert(base.to_string(), resource);
        Ok(())
    }

    /// Compile the schema at `url` (which may carry a fragment) and return
    /// a handle whose validation may be invoked repeatedly.
    ///
    /// # Errors
    ///
    /// Any [`CompileError`]: load or parse failures, unknown drafts,
    /// unresolvable references, invalid regexes, or a meta-schema violation
    /// ([`CompileError::SchemaInvalid`], whose cause is a full validation
    /// tree pointing into the offending schema).
    pub fn compile(&mut self, url: &str) -> Result<Schema, CompileError> {
        let (base, fragment) = uri::parse(url)?;
        let index = self.compile_ref(&base, fragment.as_deref())?;
        let location = self.store.read().get(index).location.clone();
        Ok(Schema {
            store: Arc::clone(&self.store),
            index,
            location,
            max_depth: self.options.max_eval_depth,
        })
    }

    /// Like [`Compiler::compile`], but panics on failure. For entry points
    /// where a broken schema is a programming error.
    pub fn must_compile(&mut self, url: &str) -> Schema {
        match self.compile(url) {
            Ok(schema) => schema,
            Err(error) => panic!("compile('{url}'): {error}"),
        }
    }

    fn compile_ref(
        &mut self,
        base: &Url,
        fragment: Option<&str>,
    ) -> Result<SchemaIndex, CompileError> {
        let key = base.to_string();
        let (resource_key, prefix) = if self.resources.contains_key(&key) {
            (key, String::new())
        } else if let Some(embedded) = self.find_embedded(&key) {
            embedded
        } else {
            self.fetch(base)?;
            (key, String::new())
        };
        let pointer = match fragment {
            None => prefix,
            Some(fragment) => {
                let decoded = percent_encoding::percent_decode_str(fragment)
                    .decode_utf8()
                    .map_err(|_| CompileError::RefNotFound {
                        reference: format!("{base}#{fragment}"),
                    })?
                    .into_owned();
                if decoded.starts_with('/') {
                    format!("{prefix}{decoded}")
                } else {
                    self.resources[&resource_key]
                        .anchor(&decoded)
                        .ok_or_else(|| CompileError::RefNotFound {
                            reference: format!("{base}#{fragment}"),
                        })?
                        .to_string()
                }
            }
        };
        self.check_meta(&resource_key, &pointer)?;
        self.compile_at(&resource_key, &pointer)
    }

    /// A `$id` embedded in an already-registered resource may carve out a
    /// nested resource under its own absolute URL.
    fn find_embedded(&self, url: &str) -> Option<(String, String)> {
        for (key, resource) in &self.resources {
            if let Some(pointer) = resource.ids.get(url) {
                return Some((key.clone(), pointer.clone()));
            }
        }
        None
    }

    fn fetch(&mut self, base: &Url) -> Result<(), CompileError> {
        // The bundled meta-schemas never go through the loader
        let key = base.to_string();
        for draft in SUPPORTED_DRAFTS {
            for (url, document) in draft.meta_resources() {
                if url == key {
                    return self.register(base.clone(), document.clone());
                }
            }
        }
        let reader = self
            .options
            .loader
            .load(base.as_str())
            .map_err(|source| CompileError::LoadError {
                url: base.to_string(),
                source,
            })?;
        let document = schema::parse_document(reader).map_err(|source| {
            CompileError::InvalidJson {
                url: base.to_string(),
                source,
            }
        })?;
        self.register(base.clone(), document)
    }

    /// Validate the node a reference resolves to against its draft's
    /// meta-schema. Validation is per referenced node, so pointing into a
    /// larger non-schema document (e.g. `#/0` of an array) stays legal.
    fn check_meta(&mut self, resource_key: &str, pointer: &str) -> Result<(), CompileError> {
        if !self.options.validate_schema || KNOWN_META_URLS.contains(resource_key) {
            return Ok(());
        }
        let checked = format!("{resource_key}#{pointer}");
        if self.meta_checked.contains(&checked) {
            return Ok(());
        }
        let resource = &self.resources[resource_key];
        let Some(value) = resource.lookup(pointer) else {
            // Missing targets are reported by `compile_at`
            return Ok(());
        };
        let location = uri::location(&resource.url, pointer);
        let validator = &META_VALIDATORS[&resource.draft];
        if let Err(ValidateError::Validation(cause)) = validator.validate_value(value) {
            // Not recorded as checked: recompiling the same location must
            // fail the same way
            return Err(CompileError::SchemaInvalid {
                url: location,
                cause: Box::new(cause),
            });
        }
        self.meta_checked.insert(checked);
        Ok(())
    }

    fn compile_at(
        &mut self,
        resource_key: &str,
        pointer: &str,
    ) -> Result<SchemaIndex, CompileError> {
        if let Some(index) = self.store.read().lookup(resource_key, pointer) {
            return Ok(index);
        }
        let (value, base, draft, location) = {
            let resource = &self.resources[resource_key];
            let value = resource
                .lookup(pointer)
                .ok_or_else(|| CompileError::RefNotFound {
                    reference: uri::location(&resource.url, pointer),
                })?
                .clone();
            (
                value,
                resource.base_for(pointer).clone(),
                resource.draft,
                uri::location(&resource.url, pointer),
            )
        };
        let index = self
            .store
            .write()
            .reserve(resource_key, pointer, location.clone());
        match self.compile_value(resource_key, pointer, &value, base, draft, location) {
            Ok(node) => {
                self.store.write().replace(index, node);
                Ok(index)
            }
            Err(error) => {
                // Unregister the placeholder: recompiling this location must
                // fail the same way, not find an empty node
                self.store.write().unregister(resource_key, pointer);
                Err(error)
            }
        }
    }

    fn compile_value(
        &mut self,
        resource_key: &str,
        pointer: &str,
        value: &Value,
        base: Url,
        draft: Draft,
        location: String,
    ) -> Result<SchemaNode, CompileError> {
        let mut node = SchemaNode::new(location);
        match value {
            Value::Bool(value) => {
                node.always = Some(*value);
                Ok(node)
            }
            Value::Object(object) => {
                self.compile_object(resource_key, pointer, object, &base, draft, node)
            }
            _ => Err(CompileError::InvalidKeywordValue {
                location: node.location,
                keyword: "schema".to_string(),
            }),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn compile_object(
        &mut self,
        resource_key: &str,
        pointer: &str,
        object: &Map<String, Value>,
        base: &Url,
        draft: Draft,
        mut node: SchemaNode,
    ) -> Result<SchemaNode, CompileError> {
        if self.options.extract_annotations {
            node.annotations = Some(Box::new(extract_annotations(object)));
        }

        if let Some(reference) = object.get("$ref") {
            let Value::String(reference) = reference else {
                return Err(invalid(&node, "$ref"));
            };
            let (ref_base, ref_fragment) = uri::resolve(base, reference)?;
            node.ref_ = Some(self.compile_ref(&ref_base, ref_fragment.as_deref())?);
            if !draft.ref_keeps_siblings() {
                // Older drafts ignore all keywords next to `$ref`
                return Ok(node);
            }
        }
        if draft.keyword_applies("$recursiveRef") {
            if let Some(reference) = object.get("$recursiveRef") {
                let Value::String(reference) = reference else {
                    return Err(invalid(&node, "$recursiveRef"));
                };
                let (ref_base, ref_fragment) = uri::resolve(base, reference)?;
                node.recursive_ref = Some(self.compile_ref(&ref_base, ref_fragment.as_deref())?);
            }
            node.recursive_anchor =
                matches!(object.get("$recursiveAnchor"), Some(Value::Bool(true)));
        }

        if let Some(types) = object.get("type") {
            match types {
                Value::String(name) => {
                    node.types = node.types.add_type(type_of(name, &node)?);
                }
                Value::Array(names) => {
                    for name in names {
                        let Value::String(name) = name else {
                            return Err(invalid(&node, "type"));
                        };
                        node.types = node.types.add_type(type_of(name, &node)?);
                    }
                }
                _ => return Err(invalid(&node, "type")),
            }
        }
        if let Some(options) = object.get("enum") {
            let Value::Array(options) = options else {
                return Err(invalid(&node, "enum"));
            };
            node.enum_ = Some(options.clone());
        }
        if draft.keyword_applies("const") {
            if let Some(constant) = object.get("const") {
                node.constant = Some(constant.clone());
            }
        }

        if draft.numeric_exclusive_bounds() {
            node.minimum = number_of(object, "minimum", &node)?;
            node.maximum = number_of(object, "maximum", &node)?;
            node.exclusive_minimum = number_of(object, "exclusiveMinimum", &node)?;
            node.exclusive_maximum = number_of(object, "exclusiveMaximum", &node)?;
        } else {
            // Draft 4: `exclusiveMinimum`/`exclusiveMaximum` are boolean
            // modifiers of the adjacent bound
            let minimum = number_of(object, "minimum", &node)?;
            if matches!(object.get("exclusiveMinimum"), Some(Value::Bool(true))) {
                node.exclusive_minimum = minimum;
            } else {
                node.minimum = minimum;
            }
            let maximum = number_of(object, "maximum", &node)?;
            if matches!(object.get("exclusiveMaximum"), Some(Value::Bool(true))) {
                node.exclusive_maximum = maximum;
            } else {
                node.maximum = maximum;
            }
        }
        node.multiple_of = number_of(object, "multipleOf", &node)?;

        node.min_length = limit_of(object, "minLength", &node)?;
        node.max_length = limit_of(object, "maxLength", &node)?;
        if let Some(pattern) = object.get("pattern") {
            let Value::String(pattern) = pattern else {
                return Err(invalid(&node, "pattern"));
            };
            node.pattern = Some((pattern.clone(), compile_regex(pattern)?));
        }

        if let Some(properties) = object.get("properties") {
            let Value::Object(properties) = properties else {
                return Err(invalid(&node, "properties"));
            };
            node.properties.reserve(properties.len());
            for name in properties.keys() {
                let child = subpointer(pointer, "properties", name);
                let index = self.compile_at(resource_key, &child)?;
                node.properties.push((name.clone(), index));
            }
        }
        if let Some(patterns) = object.get("patternProperties") {
            let Value::Object(patterns) = patterns else {
                return Err(invalid(&node, "patternProperties"));
            };
            for pattern in patterns.keys() {
                let child = subpointer(pointer, "patternProperties", pattern);
                let index = self.compile_at(resource_key, &child)?;
                node.pattern_properties
                    .push((pattern.clone(), compile_regex(pattern)?, index));
            }
        }
        node.additional_properties =
            self.compile_additional(resource_key, pointer, object, "additionalProperties")?;
        if draft.keyword_applies("propertyNames") {
            if object.get("propertyNames").is_some() {
                let child = format!("{pointer}/propertyNames");
                node.property_names = Some(self.compile_at(resource_key, &child)?);
            }
        }
        if let Some(required) = object.get("required") {
            node.required = string_list(required, "required", &node)?;
        }
        if let Some(dependencies) = object.get("dependencies") {
            let Value::Object(dependencies) = dependencies else {
                return Err(invalid(&node, "dependencies"));
            };
            for (name, dependency) in dependencies {
                let compiled = match dependency {
                    Value::Array(_) => {
                        Dependency::Required(string_list(dependency, "dependencies", &node)?)
                    }
                    _ => {
                        let child = subpointer(pointer, "dependencies", name);
                        Dependency::Schema(self.compile_at(resource_key, &child)?)
                    }
                };
                node.dependencies.push((name.clone(), compiled));
            }
        }
        if draft.keyword_applies("dependentRequired") {
            if let Some(dependent) = object.get("dependentRequired") {
                let Value::Object(dependent) = dependent else {
                    return Err(invalid(&node, "dependentRequired"));
                };
                for (name, required) in dependent {
                    node.dependent_required
                        .push((name.clone(), string_list(required, "dependentRequired", &node)?));
                }
            }
            if let Some(dependent) = object.get("dependentSchemas") {
                let Value::Object(dependent) = dependent else {
                    return Err(invalid(&node, "dependentSchemas"));
                };
                for name in dependent.keys() {
                    let child = subpointer(pointer, "dependentSchemas", name);
                    let index = self.compile_at(resource_key, &child)?;
                    node.dependent_schemas.push((name.clone(), index));
                }
            }
        }
        node.min_properties = limit_of(object, "minProperties", &node)?;
        node.max_properties = limit_of(object, "maxProperties", &node)?;

        if let Some(items) = object.get("items") {
            node.items = match items {
                Value::Array(list) => {
                    let mut compiled = Vec::with_capacity(list.len());
                    for index in 0..list.len() {
                        let child = format!("{pointer}/items/{index}");
                        compiled.push(self.compile_at(resource_key, &child)?);
                    }
                    Items::List(compiled)
                }
                _ => Items::Single(self.compile_at(resource_key, &format!("{pointer}/items"))?),
            };
        }
        node.additional_items =
            self.compile_additional(resource_key, pointer, object, "additionalItems")?;
        if draft.keyword_applies("contains") && object.get("contains").is_some() {
            let child = format!("{pointer}/contains");
            node.contains = Some(self.compile_at(resource_key, &child)?);
            if draft.keyword_applies("minContains") {
                node.min_contains = limit_of(object, "minContains", &node)?;
                node.max_contains = limit_of(object, "maxContains", &node)?;
            }
        }
        node.min_items = limit_of(object, "minItems", &node)?;
        node.max_items = limit_of(object, "maxItems", &node)?;
        node.unique_items = matches!(object.get("uniqueItems"), Some(Value::Bool(true)));

        if let Some(list) = self.compile_list(resource_key, pointer, object, "allOf", &node)? {
            node.all_of = list;
        }
        if let Some(list) = self.compile_list(resource_key, pointer, object, "anyOf", &node)? {
            node.any_of = list;
        }
        if let Some(list) = self.compile_list(resource_key, pointer, object, "oneOf", &node)? {
            node.one_of = list;
        }
        if object.get("not").is_some() {
            node.not = Some(self.compile_at(resource_key, &format!("{pointer}/not"))?);
        }
        if draft.keyword_applies("if") {
            if object.get("if").is_some() {
                node.if_ = Some(self.compile_at(resource_key, &format!("{pointer}/if"))?);
            }
            if object.get("then").is_some() {
                node.then_ = Some(self.compile_at(resource_key, &format!("{pointer}/then"))?);
            }
            if object.get("else").is_some() {
                node.else_ = Some(self.compile_at(resource_key, &format!("{pointer}/else"))?);
            }
        }

        if let Some(format) = object.get("format") {
            let Value::String(format) = format else {
                return Err(invalid(&node, "format"));
            };
            let assert = self
                .options
                .assert_format
                .unwrap_or_else(|| draft.assert_formats_by_default());
            if assert {
                // Unknown formats never fail
                let check = self.options.formats.get(format).cloned();
                node.format = Some((format.clone(), check));
            }
        }
        if draft.keyword_applies("contentEncoding") {
            if let Some(Value::String(encoding)) = object.get("contentEncoding") {
                if let Some((check, convert)) = content::CONTENT_ENCODINGS.get(encoding.as_str()) {
                    node.content_encoding = Some((encoding.clone(), *check, *convert));
                }
            }
            if let Some(Value::String(media_type)) = object.get("contentMediaType") {
                if let Some(check) = content::CONTENT_MEDIA_TYPES.get(media_type.as_str()) {
                    node.content_media_type = Some((media_type.clone(), *check));
                }
            }
        }

        Ok(node)
    }

    fn compile_list(
        &mut self,
        resource_key: &str,
        pointer: &str,
        object: &Map<String, Value>,
        keyword: &str,
        node: &SchemaNode,
    ) -> Result<Option<Vec<SchemaIndex>>, CompileError> {
        let Some(subschemas) = object.get(keyword) else {
            return Ok(None);
        };
        let Value::Array(subschemas) = subschemas else {
            return Err(invalid(node, keyword));
        };
        let mut compiled = Vec::with_capacity(subschemas.len());
        for index in 0..subschemas.len() {
            let child = format!("{pointer}/{keyword}/{index}");
            compiled.push(self.compile_at(resource_key, &child)?);
        }
        Ok(Some(compiled))
    }

    fn compile_additional(
        &mut self,
        resource_key: &str,
        pointer: &str,
        object: &Map<String, Value>,
        keyword: &str,
    ) -> Result<Additional, CompileError> {
        match object.get(keyword) {
            None => Ok(Additional::Absent),
            Some(Value::Bool(allowed)) => Ok(Additional::Bool(*allowed)),
            Some(_) => {
                let child = format!("{pointer}/{keyword}");
                Ok(Additional::Schema(self.compile_at(resource_key, &child)?))
            }
        }
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("draft", &self.draft)
            .field("assert_format", &self.assert_format)
            .field("extract_annotations", &self.extract_annotations)
            .field("validate_schema", &self.validate_schema)
            .field("max_eval_depth", &self.max_eval_depth)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

fn subpointer(pointer: &str, keyword: &str, name: &str) -> String {
    format!("{pointer}/{keyword}/{}", resource::escape(name))
}

fn invalid(node: &SchemaNode, keyword: &str) -> CompileError {
    CompileError::InvalidKeywordValue {
        location: node.location.clone(),
        keyword: keyword.to_string(),
    }
}

fn type_of(name: &str, node: &SchemaNode) -> Result<PrimitiveType, CompileError> {
    PrimitiveType::try_from(name).map_err(|()| invalid(node, "type"))
}

fn number_of(
    object: &Map<String, Value>,
    keyword: &str,
    node: &SchemaNode,
) -> Result<Option<Number>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Number(number)) => Ok(Some(number.clone())),
        Some(_) => Err(invalid(node, keyword)),
    }
}

fn limit_of(
    object: &Map<String, Value>,
    keyword: &str,
    node: &SchemaNode,
) -> Result<Option<u64>, CompileError> {
    match number_of(object, keyword, node)? {
        None => Ok(None),
        Some(number) => number
            .as_u64()
            .or_else(|| {
                // Integral floats like `2.0` are valid limits
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0 && *value >= 0.0)
                    .map(|value| value as u64)
            })
            .map(Some)
            .ok_or_else(|| invalid(node, keyword)),
    }
}

fn string_list(
    value: &Value,
    keyword: &str,
    node: &SchemaNode,
) -> Result<Vec<String>, CompileError> {
    let Value::Array(values) = value else {
        return Err(invalid(node, keyword));
    };
    let mut list = Vec::with_capacity(values.len());
    for value in values {
        let Value::String(value) = value else {
            return Err(invalid(node, keyword));
        };
        list.push(value.clone());
    }
    Ok(list)
}

fn compile_regex(pattern: &str) -> Result<fancy_regex::Regex, CompileError> {
    fancy_regex::Regex::new(pattern).map_err(|source| CompileError::InvalidRegex {
        pattern: pattern.to_string(),
        source: Box::new(source),
    })
}

fn extract_annotations(object: &Map<String, Value>) -> Annotations {
    let mut annotations = Annotations::default();
    if let Some(Value::String(title)) = object.get("title") {
        annotations.title = Some(title.clone());
    }
    if let Some(Value::String(description)) = object.get("description") {
        annotations.description = Some(description.clone());
    }
    if let Some(default) = object.get("default") {
        annotations.default = Some(default.clone());
    }
    if let Some(Value::Array(examples)) = object.get("examples") {
        annotations.examples = examples.clone();
    }
    annotations.read_only = matches!(object.get("readOnly"), Some(Value::Bool(true)));
    annotations.write_only = matches!(object.get("writeOnly"), Some(Value::Bool(true)));
    annotations.deprecated = matches!(object.get("deprecated"), Some(Value::Bool(true)));
    if let Some(Value::String(comment)) = object.get("$comment") {
        annotations.comment = Some(comment.clone());
    }
    annotations
}
