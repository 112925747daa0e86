//! Supported JSON Schema drafts and their keyword tables.
use crate::error::CompileError;
use once_cell::sync::Lazy;
use serde_json::Value;

macro_rules! schema {
    ($name:ident, $path:expr) => {
        static $name: Lazy<Value> = Lazy::new(|| {
            serde_json::from_slice(include_bytes!($path)).expect("Invalid meta-schema")
        });
    };
}

schema!(DRAFT4, "../meta_schemas/draft4.json");
schema!(DRAFT6, "../meta_schemas/draft6.json");
schema!(DRAFT7, "../meta_schemas/draft7.json");
schema!(DRAFT201909, "../meta_schemas/draft2019_09.json");
schema!(DRAFT201909_CORE, "../meta_schemas/draft2019_09_core.json");
schema!(
    DRAFT201909_APPLICATOR,
    "../meta_schemas/draft2019_09_applicator.json"
);
schema!(
    DRAFT201909_VALIDATION,
    "../meta_schemas/draft2019_09_validation.json"
);
schema!(
    DRAFT201909_META_DATA,
    "../meta_schemas/draft2019_09_meta_data.json"
);
schema!(DRAFT201909_FORMAT, "../meta_schemas/draft2019_09_format.json");
schema!(
    DRAFT201909_CONTENT,
    "../meta_schemas/draft2019_09_content.json"
);

/// JSON Schema draft version.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub enum Draft {
    /// JSON Schema Draft 4
    Draft4,
    /// JSON Schema Draft 6
    Draft6,
    /// JSON Schema Draft 7
    Draft7,
    /// JSON Schema Draft 2019-09
    Draft201909,
}

impl Default for Draft {
    fn default() -> Self {
        Draft::Draft201909
    }
}

impl Draft {
    /// URL of this draft's meta-schema.
    #[must_use]
    pub const fn meta_url(self) -> &'static str {
        match self {
            Draft::Draft4 => "http://json-schema.org/draft-04/schema",
            Draft::Draft6 => "http://json-schema.org/draft-06/schema",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
        }
    }

    /// Meta-schema documents required to compile this draft's meta-schema.
    pub(crate) fn meta_resources(self) -> Vec<(&'static str, &'static Value)> {
        match self {
            Draft::Draft4 => vec![(Draft::Draft4.meta_url(), &*DRAFT4)],
            Draft::Draft6 => vec![(Draft::Draft6.meta_url(), &*DRAFT6)],
            Draft::Draft7 => vec![(Draft::Draft7.meta_url(), &*DRAFT7)],
            Draft::Draft201909 => vec![
                (Draft::Draft201909.meta_url(), &*DRAFT201909),
                (
                    "https://json-schema.org/draft/2019-09/meta/core",
                    &*DRAFT201909_CORE,
                ),
                (
                    "https://json-schema.org/draft/2019-09/meta/applicator",
                    &*DRAFT201909_APPLICATOR,
                ),
                (
                    "https://json-schema.org/draft/2019-09/meta/validation",
                    &*DRAFT201909_VALIDATION,
                ),
                (
                    "https://json-schema.org/draft/2019-09/meta/meta-data",
                    &*DRAFT201909_META_DATA,
                ),
                (
                    "https://json-schema.org/draft/2019-09/meta/format",
                    &*DRAFT201909_FORMAT,
                ),
                (
                    "https://json-schema.org/draft/2019-09/meta/content",
                    &*DRAFT201909_CONTENT,
                ),
            ],
        }
    }

    /// Get the draft from a meta-schema URL. A trailing empty fragment is
    /// ignored, as are the `http`/`https` scheme differences the published
    /// documents went through.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Draft> {
        let url = url.trim_end_matches('#');
        let rest = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))?;
        match rest {
            "json-schema.org/draft-04/schema" => Some(Draft::Draft4),
            "json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            "json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            "json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            _ => None,
        }
    }

    /// Detect the draft of a schema document from its root `$schema`,
    /// falling back to `default`.
    pub(crate) fn detect(document: &Value, default: Draft) -> Result<Draft, CompileError> {
        match document.get("$schema") {
            Some(Value::String(url)) => {
                Draft::from_url(url).ok_or_else(|| CompileError::UnknownDraft { url: url.clone() })
            }
            Some(_) => Err(CompileError::UnknownDraft {
                url: "<non-string $schema>".to_string(),
            }),
            None => Ok(default),
        }
    }

    /// The identifier keyword: `id` in draft 4, `$id` afterwards.
    #[must_use]
    pub const fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft4 => "id",
            _ => "$id",
        }
    }

    /// Whether `exclusiveMinimum`/`exclusiveMaximum` are standalone numbers
    /// (drafts 6+) rather than boolean modifiers of `minimum`/`maximum`.
    pub(crate) const fn numeric_exclusive_bounds(self) -> bool {
        !matches!(self, Draft::Draft4)
    }

    /// Whether `format` asserts without an explicit opt-in.
    pub(crate) const fn assert_formats_by_default(self) -> bool {
        match self {
            Draft::Draft4 | Draft::Draft6 | Draft::Draft7 => true,
            Draft::Draft201909 => false,
        }
    }

    /// Whether plain-name anchors can be declared (`$id: "#name"` in 6/7,
    /// `$anchor` in 2019-09).
    pub(crate) const fn supports_anchors(self) -> bool {
        !matches!(self, Draft::Draft4)
    }

    /// Whether `$ref` keeps its siblings alive (2019-09) or shadows them.
    pub(crate) const fn ref_keeps_siblings(self) -> bool {
        matches!(self, Draft::Draft201909)
    }

    /// Whether the keyword is interpreted by this draft. Unknown keywords
    /// are ignored during compilation.
    #[allow(clippy::match_same_arms)]
    pub(crate) fn keyword_applies(self, keyword: &str) -> bool {
        match keyword {
            "$ref" | "type" | "enum" | "minimum" | "maximum" | "multipleOf" | "minLength"
            | "maxLength" | "pattern" | "items" | "additionalItems" | "minItems" | "maxItems"
            | "uniqueItems" | "properties" | "patternProperties" | "additionalProperties"
            | "required" | "dependencies" | "minProperties" | "maxProperties" | "allOf"
            | "anyOf" | "oneOf" | "not" | "format" => true,
            "const" | "contains" | "propertyNames" | "exclusiveMinimum" | "exclusiveMaximum" => {
                self >= Draft::Draft6
            }
            "contentEncoding" | "contentMediaType" => {
                // Annotation-only in 2019-09
                matches!(self, Draft::Draft6 | Draft::Draft7)
            }
            "if" | "then" | "else" => self >= Draft::Draft7,
            "dependentRequired" | "dependentSchemas" | "minContains" | "maxContains"
            | "$recursiveRef" | "$recursiveAnchor" | "$anchor" => self >= Draft::Draft201909,
            _ => false,
        }
    }
}
