//! Schema resources: parsed documents with their base URLs and anchors.
use crate::{draft::Draft, error::CompileError, uri};
use ahash::AHashMap;
use serde_json::Value;
use std::borrow::Cow;
use url::Url;

/// A parsed JSON document together with everything the one-shot id scan
/// discovered: anchor declarations, embedded `$id` scopes, and the base URI
/// in effect for every subtree.
#[derive(Debug)]
pub(crate) struct Resource {
    pub(crate) url: Url,
    pub(crate) draft: Draft,
    pub(crate) document: Value,
    /// Plain-name anchor -> JSON pointer of the declaring subschema.
    anchors: AHashMap<String, String>,
    /// Absolute URLs declared by embedded `$id`s -> their JSON pointer.
    pub(crate) ids: AHashMap<String, String>,
    /// JSON pointer of a subschema that changes the base URI -> the new base.
    /// The root scope is always present.
    scopes: Vec<(String, Url)>,
}

impl Resource {
    pub(crate) fn new(url: Url, document: Value, draft: Draft) -> Result<Resource, CompileError> {
        let mut resource = Resource {
            scopes: vec![(String::new(), url.clone())],
            url,
            draft,
            document,
            anchors: AHashMap::new(),
            ids: AHashMap::new(),
        };
        // The scan borrows the document, so it runs over a temporary move
        let document = std::mem::take(&mut resource.document);
        resource.scan(&document, resource.url.clone(), String::new())?;
        resource.document = document;
        Ok(resource)
    }

    /// Walk every subschema position in document order, interpreting
    /// `$id`/`id` as base-URI changes and registering plain-name anchors.
    fn scan(&mut self, node: &Value, base: Url, pointer: String) -> Result<(), CompileError> {
        let Value::Object(object) = node else {
            return Ok(());
        };
        let mut base = base;
        if let Some(Value::String(id)) = object.get(self.draft.id_keyword()) {
            let id = id.trim_end_matches('#');
            let (resolved, fragment) = uri::resolve(&base, id)?;
            if let Some(fragment) = fragment {
                // `$id: "#name"` declares an anchor in drafts 6 and 7
                if self.draft.supports_anchors() && !self.draft.ref_keeps_siblings() {
                    self.add_anchor(fragment, &pointer)?;
                }
            }
            if resolved != base {
                self.ids.insert(resolved.to_string(), pointer.clone());
                self.scopes.push((pointer.clone(), resolved.clone()));
                base = resolved;
            }
        }
        if self.draft >= Draft::Draft201909 {
            if let Some(Value::String(anchor)) = object.get("$anchor") {
                self.add_anchor(anchor.clone(), &pointer)?;
            }
        }
        for (keyword, value) in object {
            match keyword.as_str() {
                // Maps of subschemas
                "properties" | "patternProperties" | "definitions" | "$defs" | "dependencies"
                | "dependentSchemas" => {
                    if let Value::Object(members) = value {
                        for (name, subschema) in members {
                            let pointer = format!("{pointer}/{keyword}/{}", escape(name));
                            self.scan(subschema, base.clone(), pointer)?;
                        }
                    }
                }
                // Single subschemas
                "additionalProperties" | "additionalItems" | "contains" | "propertyNames"
                | "not" | "if" | "then" | "else" | "contentSchema" => {
                    self.scan(value, base.clone(), format!("{pointer}/{keyword}"))?;
                }
                // Arrays of subschemas; `items` is also a single subschema
                "allOf" | "anyOf" | "oneOf" | "items" => {
                    if let Value::Array(subschemas) = value {
                        for (index, subschema) in subschemas.iter().enumerate() {
                            let pointer = format!("{pointer}/{keyword}/{index}");
                            self.scan(subschema, base.clone(), pointer)?;
                        }
                    } else if keyword == "items" {
                        self.scan(value, base.clone(), format!("{pointer}/{keyword}"))?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn add_anchor(&mut self, anchor: String, pointer: &str) -> Result<(), CompileError> {
        if self
            .anchors
            .insert(anchor.clone(), pointer.to_string())
            .is_some()
        {
            return Err(CompileError::DuplicateAnchor {
                anchor,
                url: self.url.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn anchor(&self, name: &str) -> Option<&str> {
        self.anchors.get(name).map(String::as_str)
    }

    /// The base URI in effect at `pointer`: the scope of the nearest
    /// enclosing subschema that declared an id.
    pub(crate) fn base_for(&self, pointer: &str) -> &Url {
        let mut best = &self.scopes[0];
        for scope in &self.scopes[1..] {
            let (prefix, _) = scope;
            let aligned = pointer.strip_prefix(prefix.as_str()).is_some_and(|rest| {
                rest.is_empty() || rest.starts_with('/')
            });
            if aligned && prefix.len() >= best.0.len() {
                best = scope;
            }
        }
        &best.1
    }

    /// Follow a JSON Pointer to a node inside the document.
    pub(crate) fn lookup(&self, pointer: &str) -> Option<&Value> {
        let mut current = &self.document;
        if pointer.is_empty() {
            return Some(current);
        }
        for segment in pointer.strip_prefix('/')?.split('/') {
            match current {
                Value::Object(object) => {
                    current = object.get(unescape(segment).as_ref())?;
                }
                Value::Array(array) => {
                    let index = segment.parse::<usize>().ok()?;
                    current = array.get(index)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }
}

pub(crate) fn escape(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

pub(crate) fn unescape(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}
