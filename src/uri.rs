//! URL handling: normalization, fragment splitting, reference resolution.
//!
//! Resources added without an absolute URL are parked under a synthetic
//! scheme so that relative references between them keep working.
use crate::error::CompileError;
use url::Url;

pub(crate) const DEFAULT_SCOPE: &str = "json-schema:///";

/// Parse a resource URL, resolving relative ones against the default scope.
/// Returns the base URL (fragment stripped, scheme lowercased, default port
/// dropped) and the raw fragment, if any.
pub(crate) fn parse(url: &str) -> Result<(Url, Option<String>), CompileError> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let scope = Url::parse(DEFAULT_SCOPE).expect("Valid default scope");
            scope.join(url).map_err(|source| CompileError::InvalidUrl {
                url: url.to_string(),
                source,
            })?
        }
        Err(source) => {
            return Err(CompileError::InvalidUrl {
                url: url.to_string(),
                source,
            })
        }
    };
    Ok(split_fragment(parsed))
}

/// Resolve a URI reference against a base and split off the fragment.
pub(crate) fn resolve(base: &Url, reference: &str) -> Result<(Url, Option<String>), CompileError> {
    let joined = base
        .join(reference)
        .map_err(|source| CompileError::InvalidUrl {
            url: reference.to_string(),
            source,
        })?;
    Ok(split_fragment(joined))
}

fn split_fragment(mut url: Url) -> (Url, Option<String>) {
    let fragment = url
        .fragment()
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string);
    url.set_fragment(None);
    (url, fragment)
}

/// Canonical location of a schema node: base URL plus pointer fragment.
pub(crate) fn location(base: &Url, pointer: &str) -> String {
    format!("{base}#{pointer}")
}
