//! Field-level validation of member payloads.
//!
//! Rules are declared once in [`MEMBER_RULES`] and applied to the wire-format
//! mapping (snake_case keys). A path segment of `*` fans out over every
//! element of an array, so `marketing_permissions.*.enabled` checks each
//! permission entry and reports it under its concrete index.

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::OnceLock;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MEMBER_STATUSES: &[&str] = &["subscribed", "unsubscribed", "cleaned", "pending"];
pub const EMAIL_TYPES: &[&str] = &["html", "text"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    Email,
    In(&'static [&'static str]),
    String,
    /// JSON array or object.
    Collection,
    /// JSON array only.
    List,
    /// JSON object only.
    Map,
    Boolean,
    Numeric,
    Ip,
    Timestamp,
}

pub const MEMBER_RULES: &[(&str, &[Rule])] = &[
    ("email_address", &[Rule::Required, Rule::Email]),
    ("email_type", &[Rule::String, Rule::In(EMAIL_TYPES)]),
    ("status", &[Rule::Required, Rule::String, Rule::In(MEMBER_STATUSES)]),
    ("merge_fields", &[Rule::Collection]),
    ("interests", &[Rule::Collection]),
    ("language", &[Rule::String]),
    ("vip", &[Rule::Boolean]),
    ("location", &[Rule::Map]),
    ("location.latitude", &[Rule::Numeric]),
    ("location.longitude", &[Rule::Numeric]),
    ("marketing_permissions", &[Rule::List]),
    ("marketing_permissions.*", &[Rule::Map]),
    ("marketing_permissions.*.marketing_permission_id", &[Rule::String]),
    ("marketing_permissions.*.enabled", &[Rule::Boolean]),
    ("ip_signup", &[Rule::Ip]),
    ("timestamp_signup", &[Rule::Timestamp]),
    ("ip_opt", &[Rule::Ip]),
    ("timestamp_opt", &[Rule::Timestamp]),
    ("tags", &[Rule::Collection]),
];

/// Violated rules keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Validates a member wire mapping against [`MEMBER_RULES`].
pub fn validate_member(data: &Map<String, Value>) -> Result<(), ValidationErrors> {
    validate(data, MEMBER_RULES)
}

pub fn validate(
    data: &Map<String, Value>,
    rules: &[(&str, &[Rule])],
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for (path, field_rules) in rules {
        // Collection elements are present even when null or empty
        let element = path.ends_with(".*");
        for (field, value) in resolve(data, path) {
            check_field(&field, value, element, field_rules, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(
    field: &str,
    value: Option<&Value>,
    element: bool,
    rules: &[Rule],
    errors: &mut ValidationErrors,
) {
    let attribute = field.replace('_', " ");

    if !element && is_blank(value) {
        if rules.contains(&Rule::Required) {
            errors.add(field, format!("The {} field is required.", attribute));
        }
        // Absent optional fields are not checked further
        return;
    }
    let Some(value) = value else { return };

    for rule in rules {
        let message = match rule {
            Rule::Required => None,
            Rule::Email => (!value.as_str().is_some_and(is_valid_email))
                .then(|| format!("The {} must be a valid email address.", attribute)),
            Rule::In(allowed) => (!value.as_str().is_some_and(|s| allowed.iter().any(|a| *a == s)))
                .then(|| format!("The selected {} is invalid.", attribute)),
            Rule::String => (!value.is_string())
                .then(|| format!("The {} must be a string.", attribute)),
            Rule::Collection => (!value.is_array() && !value.is_object())
                .then(|| format!("The {} must be an array.", attribute)),
            Rule::List => (!value.is_array())
                .then(|| format!("The {} must be an array.", attribute)),
            Rule::Map => (!value.is_object())
                .then(|| format!("The {} must be an object.", attribute)),
            Rule::Boolean => (!value.is_boolean())
                .then(|| format!("The {} field must be true or false.", attribute)),
            Rule::Numeric => (!value.is_number())
                .then(|| format!("The {} must be a number.", attribute)),
            Rule::Ip => (!value.as_str().is_some_and(is_valid_ip))
                .then(|| format!("The {} must be a valid IP address.", attribute)),
            Rule::Timestamp => (!value.as_str().is_some_and(is_valid_timestamp)).then(|| {
                format!("The {} does not match the format Y-m-d H:i:s.", attribute)
            }),
        };

        if let Some(message) = message {
            errors.add(field, message);
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Expands a dotted rule path into the concrete field paths present in `data`.
///
/// Plain paths always yield exactly one entry (with `None` when missing);
/// wildcard segments yield one entry per element found.
fn resolve<'a>(data: &'a Map<String, Value>, path: &str) -> Vec<(String, Option<&'a Value>)> {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Vec::new();
    };
    let rest: Vec<&str> = segments.collect();

    let mut resolved = Vec::new();
    descend(first.to_string(), data.get(first), &rest, &mut resolved);
    resolved
}

fn descend<'a>(
    prefix: String,
    current: Option<&'a Value>,
    rest: &[&str],
    out: &mut Vec<(String, Option<&'a Value>)>,
) {
    let Some((segment, tail)) = rest.split_first() else {
        out.push((prefix, current));
        return;
    };

    if *segment == "*" {
        match current {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    descend(format!("{}.{}", prefix, index), Some(item), tail, out);
                }
            }
            Some(Value::Object(map)) => {
                for (key, item) in map {
                    descend(format!("{}.{}", prefix, key), Some(item), tail, out);
                }
            }
            _ => {}
        }
        return;
    }

    let next = match current {
        Some(Value::Object(map)) => map.get(*segment),
        Some(Value::Array(items)) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };
    descend(format!("{}.{}", prefix, segment), next, tail, out);
}

/// Syntactic email check (simplified RFC 5322: `local@domain`).
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email regex is valid")
    });

    regex.is_match(email)
}

pub fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// Exact `YYYY-MM-DD HH:MM:SS`, and a real calendar instant.
pub fn is_valid_timestamp(timestamp: &str) -> bool {
    static TIMESTAMP_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TIMESTAMP_REGEX.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("timestamp regex is valid")
    });

    regex.is_match(timestamp) && NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok()
}
