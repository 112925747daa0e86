//! Error types for the compile and validation planes.
use crate::{
    paths::JsonPointer,
    primitive_type::{PrimitiveType, TypeSet},
};
use serde_json::{Number, Value};
use std::{error, fmt};

/// An error that aborts schema compilation.
///
/// Compile-plane errors are never retried by the crate; the caller corrects
/// the input and recompiles.
#[derive(Debug)]
pub enum CompileError {
    /// Fetching a resource failed at the transport level.
    LoadError {
        url: String,
        source: Box<dyn error::Error + Send + Sync>,
    },
    /// A resource is not a single well-formed JSON document.
    InvalidJson {
        url: String,
        source: serde_json::Error,
    },
    /// A resource URL or a `$ref`/`$id` value could not be parsed.
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    /// The `$schema` value does not name a supported draft.
    UnknownDraft { url: String },
    /// The schema document does not conform to its draft meta-schema.
    SchemaInvalid {
        url: String,
        cause: Box<ValidationError>,
    },
    /// A reference points to a location that does not exist.
    RefNotFound { reference: String },
    /// Two subschemas of one resource declare the same anchor.
    DuplicateAnchor { anchor: String, url: String },
    /// A resource was added twice under the same URL.
    DuplicateResource { url: String },
    /// A `pattern` or `patternProperties` regex does not compile.
    InvalidRegex {
        pattern: String,
        source: Box<fancy_regex::Error>,
    },
    /// A keyword value has the wrong shape and meta-schema validation is off.
    InvalidKeywordValue { location: String, keyword: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::LoadError { url, source } => {
                write!(f, "failed to load '{url}': {source}")
            }
            CompileError::InvalidJson { url, source } => {
                write!(f, "'{url}' is not a single valid JSON document: {source}")
            }
            CompileError::InvalidUrl { url, source } => {
                write!(f, "invalid URL '{url}': {source}")
            }
            CompileError::UnknownDraft { url } => {
                write!(f, "'{url}' does not identify a known JSON Schema draft")
            }
            CompileError::SchemaInvalid { url, cause } => {
                write!(f, "'{url}' is not a valid schema: {cause}")
            }
            CompileError::RefNotFound { reference } => {
                write!(f, "reference '{reference}' does not exist")
            }
            CompileError::DuplicateAnchor { anchor, url } => {
                write!(f, "anchor '{anchor}' is declared more than once in '{url}'")
            }
            CompileError::DuplicateResource { url } => {
                write!(f, "resource '{url}' is already registered")
            }
            CompileError::InvalidRegex { pattern, source } => {
                write!(f, "invalid regex '{pattern}': {source}")
            }
            CompileError::InvalidKeywordValue { location, keyword } => {
                write!(f, "invalid value for '{keyword}' at '{location}'")
            }
        }
    }
}

impl error::Error for CompileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            CompileError::LoadError { source, .. } => Some(&**source),
            CompileError::InvalidJson { source, .. } => Some(source),
            CompileError::InvalidUrl { source, .. } => Some(source),
            CompileError::InvalidRegex { source, .. } => Some(&**source),
            CompileError::SchemaInvalid { cause, .. } => Some(&**cause),
            _ => None,
        }
    }
}

/// An error returned by the validation entry points.
///
/// Malformed input gets a distinct top-level variant instead of a validation
/// tree; assertion failures are always [`ValidateError::Validation`].
#[derive(Debug)]
pub enum ValidateError {
    /// The instance bytes are not a single well-formed JSON document.
    InvalidJson { source: serde_json::Error },
    /// The value passed to `validate_data` is not representable as JSON.
    InvalidInstanceType { source: serde_json::Error },
    /// The configured maximum evaluation depth was reached.
    EvaluationDepthExceeded { limit: usize },
    /// The instance does not conform to the schema.
    Validation(ValidationError),
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidateError::InvalidJson { source } => {
                write!(f, "instance is not a single valid JSON document: {source}")
            }
            ValidateError::InvalidInstanceType { source } => {
                write!(f, "instance is not representable as JSON: {source}")
            }
            ValidateError::EvaluationDepthExceeded { limit } => {
                write!(f, "evaluation depth exceeded {limit}")
            }
            ValidateError::Validation(error) => error.fmt(f),
        }
    }
}

impl error::Error for ValidateError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ValidateError::InvalidJson { source }
            | ValidateError::InvalidInstanceType { source } => Some(source),
            ValidateError::Validation(error) => Some(error),
            ValidateError::EvaluationDepthExceeded { .. } => None,
        }
    }
}

impl From<ValidationError> for ValidateError {
    fn from(error: ValidationError) -> Self {
        ValidateError::Validation(error)
    }
}

/// One failing assertion, with the failures it is composed of.
///
/// The tree mirrors the schema/instance traversal: child errors are ordered
/// by schema-declaration order for object keys and by index for arrays.
#[derive(Debug)]
pub struct ValidationError {
    /// Absolute schema URL plus JSON-pointer fragment of the failing keyword.
    pub keyword_location: String,
    /// JSON Pointer to the instance value that failed.
    pub instance_location: JsonPointer,
    /// What failed.
    pub kind: ValidationErrorKind,
    /// Failures this assertion is composed of, in stable order.
    pub causes: Vec<ValidationError>,
}

impl ValidationError {
    pub(crate) fn new(
        keyword_location: String,
        instance_location: JsonPointer,
        kind: ValidationErrorKind,
    ) -> ValidationError {
        ValidationError {
            keyword_location,
            instance_location,
            kind,
            causes: Vec::new(),
        }
    }

    pub(crate) fn with_causes(
        keyword_location: String,
        instance_location: JsonPointer,
        kind: ValidationErrorKind,
        causes: Vec<ValidationError>,
    ) -> ValidationError {
        ValidationError {
            keyword_location,
            instance_location,
            kind,
            causes,
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > 0 {
            f.write_str("\n")?;
            for _ in 0..depth {
                f.write_str("  ")?;
            }
        }
        write!(
            f,
            "at '{}': {} [{}]",
            self.instance_location, self.kind, self.keyword_location
        )?;
        for cause in &self.causes {
            cause.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationError {
    /// Multi-line form: one line per node, depth-indented.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl error::Error for ValidationError {}

/// Kinds of failing assertions.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum ValidationErrorKind {
    /// The whole instance does not validate with the schema it was checked
    /// against. Always the root of a reported tree.
    Schema { url: String },
    /// A subschema application failed; `url` is the subschema's canonical URL.
    Subschema { url: String },
    /// More than one keyword failed at a single schema node.
    Group,
    AdditionalItems { limit: usize },
    AdditionalProperties { unexpected: Vec<String> },
    AnyOf,
    Constant { expected: Value },
    Contains,
    MinContains { matched: usize, limit: u64 },
    MaxContains { matched: usize, limit: u64 },
    ContentEncoding { encoding: String },
    ContentMediaType { media_type: String },
    Enum { options: Vec<Value> },
    ExclusiveMaximum { limit: Number },
    ExclusiveMinimum { limit: Number },
    FalseSchema,
    Format { format: String },
    Maximum { limit: Number },
    Minimum { limit: Number },
    MaxItems { limit: u64 },
    MinItems { limit: u64 },
    MaxLength { limit: u64 },
    MinLength { limit: u64 },
    MaxProperties { limit: u64 },
    MinProperties { limit: u64 },
    MultipleOf { multiple_of: Number },
    Not,
    OneOfNotValid,
    OneOfMultipleValid { first: usize, second: usize },
    Pattern { pattern: String },
    PropertyNames { property: String },
    Required { property: String },
    Type { expected: TypeSet, actual: PrimitiveType },
    UniqueItems { first: usize, second: usize },
    /// The regex engine gave up while matching `pattern`.
    BacktrackLimitExceeded { pattern: String },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::Schema { url } | ValidationErrorKind::Subschema { url } => {
                write!(f, "does not validate with '{url}'")
            }
            ValidationErrorKind::Group => f.write_str("validation failed"),
            ValidationErrorKind::AdditionalItems { limit } => {
                write!(f, "additional items are not allowed (beyond index {limit})")
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                f.write_str("additional properties are not allowed (")?;
                let mut first = true;
                for name in unexpected {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "'{name}'")?;
                }
                f.write_str(" unexpected)")
            }
            ValidationErrorKind::AnyOf => f.write_str("anyOf failed, none matched"),
            ValidationErrorKind::Constant { expected } => {
                write!(f, "value must be {expected}")
            }
            ValidationErrorKind::Contains => f.write_str("no items match the contains schema"),
            ValidationErrorKind::MinContains { matched, limit } => {
                write!(f, "{matched} items match the contains schema, minimum {limit}")
            }
            ValidationErrorKind::MaxContains { matched, limit } => {
                write!(f, "{matched} items match the contains schema, maximum {limit}")
            }
            ValidationErrorKind::ContentEncoding { encoding } => {
                write!(f, "value is not encoded as '{encoding}'")
            }
            ValidationErrorKind::ContentMediaType { media_type } => {
                write!(f, "value is not of media type '{media_type}'")
            }
            ValidationErrorKind::Enum { options } => {
                f.write_str("value must be one of ")?;
                let mut first = true;
                for option in options {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{option}")?;
                }
                Ok(())
            }
            ValidationErrorKind::ExclusiveMaximum { limit } => {
                write!(f, "value must be less than {limit}")
            }
            ValidationErrorKind::ExclusiveMinimum { limit } => {
                write!(f, "value must be greater than {limit}")
            }
            ValidationErrorKind::FalseSchema => f.write_str("false schema allows nothing"),
            ValidationErrorKind::Format { format } => {
                write!(f, "value is not a valid '{format}'")
            }
            ValidationErrorKind::Maximum { limit } => {
                write!(f, "value must be less than or equal to {limit}")
            }
            ValidationErrorKind::Minimum { limit } => {
                write!(f, "value must be greater than or equal to {limit}")
            }
            ValidationErrorKind::MaxItems { limit } => {
                write!(f, "array has more than {limit} items")
            }
            ValidationErrorKind::MinItems { limit } => {
                write!(f, "array has less than {limit} items")
            }
            ValidationErrorKind::MaxLength { limit } => {
                write!(f, "string is longer than {limit} characters")
            }
            ValidationErrorKind::MinLength { limit } => {
                write!(f, "string is shorter than {limit} characters")
            }
            ValidationErrorKind::MaxProperties { limit } => {
                write!(f, "object has more than {limit} properties")
            }
            ValidationErrorKind::MinProperties { limit } => {
                write!(f, "object has less than {limit} properties")
            }
            ValidationErrorKind::MultipleOf { multiple_of } => {
                write!(f, "value is not a multiple of {multiple_of}")
            }
            ValidationErrorKind::Not => f.write_str("negated schema matched"),
            ValidationErrorKind::OneOfNotValid => f.write_str("oneOf failed, none matched"),
            ValidationErrorKind::OneOfMultipleValid { first, second } => {
                write!(f, "oneOf failed, subschemas {first} and {second} matched")
            }
            ValidationErrorKind::Pattern { pattern } => {
                write!(f, "value does not match pattern '{pattern}'")
            }
            ValidationErrorKind::PropertyNames { property } => {
                write!(f, "property name '{property}' is invalid")
            }
            ValidationErrorKind::Required { property } => {
                write!(f, "required property '{property}' is missing")
            }
            ValidationErrorKind::Type { expected, actual } => {
                write!(f, "value must be of type {expected}, got {actual}")
            }
            ValidationErrorKind::UniqueItems { first, second } => {
                write!(f, "items at {first} and {second} are equal")
            }
            ValidationErrorKind::BacktrackLimitExceeded { pattern } => {
                write!(f, "backtrack limit exceeded while matching '{pattern}'")
            }
        }
    }
}
