//! Built-in `format` predicates and the registry they live in.
//!
//! A predicate receives the whole JSON value so custom formats can apply to
//! non-strings; every built-in accepts anything that is not a string, as the
//! specification requires.
use ahash::AHashMap;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::{fmt, net::Ipv6Addr, str::FromStr, sync::Arc};
use url::Url;

/// A named predicate applied by the `format` keyword.
#[derive(Clone)]
pub struct FormatCheck(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl FormatCheck {
    pub(crate) fn new<F>(check: F) -> FormatCheck
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        FormatCheck(Arc::new(check))
    }

    pub(crate) fn check(&self, instance: &Value) -> bool {
        (self.0)(instance)
    }
}

impl fmt::Debug for FormatCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FormatCheck")
    }
}

pub(crate) type Formats = AHashMap<String, FormatCheck>;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\z").expect("Is a valid regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([01][0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9]|60)(\.[0-9]+)?(([Zz])|([+-]([01][0-9]|2[0-3]):[0-5][0-9]))\z",
    )
    .expect("Is a valid regex")
});
static URI_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+:(/?/?))?[^#\\\s]*(#[^\\\s]*)?\z").expect("Is a valid regex"));
static URI_TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?:[^\x00-\x20"'<>%\\^`{|}]|%[0-9a-f]{2})|\{[+#./;?&=,!@|]?(?:[a-z0-9_]|%[0-9a-f]{2})+(?::[1-9][0-9]{0,3}|\*)?(?:,(?:[a-z0-9_]|%[0-9a-f]{2})+(?::[1-9][0-9]{0,3}|\*)?)*})*\z"#,
    )
    .expect("Is a valid regex")
});
static JSON_POINTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/(([^/~])|(~[01]))*)*\z").expect("Is a valid regex"));
static RELATIVE_JSON_POINTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^~/]|~0|~1)*)*)\z").expect("Is a valid regex")
});
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\z")
        .expect("Is a valid regex")
});

macro_rules! string_format {
    ($name:ident, $check:expr) => {
        fn $name(instance: &Value) -> bool {
            if let Value::String(item) = instance {
                let check: fn(&str) -> bool = $check;
                check(item)
            } else {
                true
            }
        }
    };
}

string_format!(is_date, |item| {
    // The underlying parser ignores padding with zeroes, the regex does not
    NaiveDate::parse_from_str(item, "%Y-%m-%d").is_ok() && DATE_RE.is_match(item)
});
string_format!(is_date_time, |item| {
    // RFC 3339 allows lowercase separators
    DateTime::parse_from_rfc3339(&item.replace('t', "T").replace('z', "Z")).is_ok()
});
string_format!(is_time, |item| TIME_RE.is_match(item));
string_format!(is_email, |item| item.contains('@'));
string_format!(is_hostname, |item| {
    !(item.ends_with('-')
        || item.starts_with('-')
        || item.is_empty()
        || item.chars().count() > 255
        || item
            .chars()
            .any(|c| !(c.is_alphanumeric() || c == '-' || c == '.'))
        || item.split('.').any(|part| part.chars().count() > 63))
});
string_format!(is_ipv4, |item| {
    let mut octets = 0;
    for part in item.split('.') {
        octets += 1;
        if part.is_empty() || part.len() > 3 || (part.len() > 1 && part.starts_with('0')) {
            return false;
        }
        match part.parse::<u16>() {
            Ok(value) if value <= 255 => {}
            _ => return false,
        }
    }
    octets == 4
});
string_format!(is_ipv6, |item| {
    !item.contains('%') && Ipv6Addr::from_str(item).is_ok()
});
string_format!(is_uri, |item| {
    !item.contains(char::is_whitespace) && !item.contains('\\') && Url::parse(item).is_ok()
});
string_format!(is_uri_reference, |item| URI_REFERENCE_RE.is_match(item));
string_format!(is_uri_template, |item| URI_TEMPLATE_RE.is_match(item));
string_format!(is_json_pointer, |item| JSON_POINTER_RE.is_match(item));
string_format!(is_relative_json_pointer, |item| {
    RELATIVE_JSON_POINTER_RE.is_match(item)
});
string_format!(is_regex, |item| fancy_regex::Regex::new(item).is_ok());
string_format!(is_uuid, |item| UUID_RE.is_match(item));
string_format!(is_duration, duration);

/// RFC 3339 appendix-A duration: `P` followed by date and/or time
/// components in order, or a bare week count.
fn duration(item: &str) -> bool {
    fn units(mut input: &str, order: &[char]) -> bool {
        let mut next = 0;
        while !input.is_empty() {
            let digits = input
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(input.len());
            if digits == 0 {
                return false;
            }
            let Some(unit) = input[digits..].chars().next() else {
                return false;
            };
            let Some(position) = order[next..].iter().position(|&u| u == unit) else {
                return false;
            };
            next += position + 1;
            input = &input[digits + 1..];
        }
        true
    }

    let Some(rest) = item.strip_prefix('P') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    if let Some(weeks) = rest.strip_suffix('W') {
        return !weeks.is_empty() && weeks.bytes().all(|b| b.is_ascii_digit());
    }
    let (date, time) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if !date.is_empty() && !units(date, &['Y', 'M', 'D']) {
        return false;
    }
    match time {
        Some(time) => !time.is_empty() && units(time, &['H', 'M', 'S']),
        None => !date.is_empty(),
    }
}

/// The default registry handed to every new compiler.
pub(crate) fn default_formats() -> Formats {
    let mut formats = Formats::with_capacity(16);
    let entries: [(&str, fn(&Value) -> bool); 15] = [
        ("date", is_date),
        ("date-time", is_date_time),
        ("time", is_time),
        ("duration", is_duration),
        ("email", is_email),
        ("hostname", is_hostname),
        ("ipv4", is_ipv4),
        ("ipv6", is_ipv6),
        ("uri", is_uri),
        ("uri-reference", is_uri_reference),
        ("uri-template", is_uri_template),
        ("json-pointer", is_json_pointer),
        ("relative-json-pointer", is_relative_json_pointer),
        ("regex", is_regex),
        ("uuid", is_uuid),
    ];
    for (name, check) in entries {
        formats.insert(name.to_string(), FormatCheck::new(check));
    }
    formats
}
