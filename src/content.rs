//! `contentEncoding` and `contentMediaType` checks (asserted in drafts 6/7).
use ahash::AHashMap;
use once_cell::sync::Lazy;

pub(crate) type ContentEncodingCheck = fn(&str) -> bool;
pub(crate) type ContentEncodingConvert = fn(&str) -> Option<String>;
pub(crate) type ContentMediaTypeCheck = fn(&str) -> bool;

fn is_base64(instance_string: &str) -> bool {
    base64::decode(instance_string).is_ok()
}

fn from_base64(instance_string: &str) -> Option<String> {
    let decoded = base64::decode(instance_string).ok()?;
    String::from_utf8(decoded).ok()
}

fn is_json(instance_string: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(instance_string).is_ok()
}

pub(crate) static CONTENT_ENCODINGS: Lazy<
    AHashMap<&'static str, (ContentEncodingCheck, ContentEncodingConvert)>,
> = Lazy::new(|| {
    let mut map: AHashMap<&'static str, (ContentEncodingCheck, ContentEncodingConvert)> =
        AHashMap::with_capacity(1);
    map.insert("base64", (is_base64, from_base64));
    map
});

pub(crate) static CONTENT_MEDIA_TYPES: Lazy<AHashMap<&'static str, ContentMediaTypeCheck>> =
    Lazy::new(|| {
        let mut map: AHashMap<&'static str, ContentMediaTypeCheck> = AHashMap::with_capacity(1);
        map.insert("application/json", is_json);
        map
    });
