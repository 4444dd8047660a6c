use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============ Wire Format ============

/// Every member field exchanged with MailChimp, by wire (snake_case) name.
///
/// `MemberFields` serializes to exactly these keys; the only renamed field is
/// the local identifier, which goes out as `member_id` and never reaches MailChimp.
pub const MEMBER_FIELDS: &[&str] = &[
    "email_address",
    "email_type",
    "status",
    "merge_fields",
    "interests",
    "language",
    "vip",
    "location",
    "marketing_permissions",
    "ip_signup",
    "timestamp_signup",
    "ip_opt",
    "timestamp_opt",
    "tags",
];

/// Subscription state of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Subscribed,
    Unsubscribed,
    Cleaned,
    Pending,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Subscribed => "subscribed",
            MemberStatus::Unsubscribed => "unsubscribed",
            MemberStatus::Cleaned => "cleaned",
            MemberStatus::Pending => "pending",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribed" => Ok(MemberStatus::Subscribed),
            "unsubscribed" => Ok(MemberStatus::Unsubscribed),
            "cleaned" => Ok(MemberStatus::Cleaned),
            "pending" => Ok(MemberStatus::Pending),
            other => Err(AppError::InternalError(format!(
                "Unknown member status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred email format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Html,
    Text,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Html => "html",
            EmailType::Text => "text",
        }
    }
}

impl FromStr for EmailType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(EmailType::Html),
            "text" => Ok(EmailType::Text),
            other => Err(AppError::InternalError(format!(
                "Unknown email type '{}'",
                other
            ))),
        }
    }
}

/// The member data MailChimp knows about, in wire shape.
///
/// `merge_fields`, `interests`, `tags`, `location` and `marketing_permissions`
/// are kept as the validated JSON, so numbers and extra keys echo back as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberFields {
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_type: Option<EmailType>,
    pub status: MemberStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_permissions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_signup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_signup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_opt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_opt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
}

impl MemberFields {
    /// Builds fields from an already validated wire mapping.
    pub fn from_wire_map(map: Map<String, Value>) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            AppError::InternalError(format!("Validated member payload did not map: {}", e))
        })
    }

    /// Payload sent to MailChimp; absent optionals are left out.
    pub fn to_wire_map(&self) -> Map<String, Value> {
        // MemberFields always serializes to an object
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Current wire mapping overlaid with the known keys of `patch`.
    ///
    /// A JSON `null` in the patch clears the field.
    pub fn merged_with(&self, patch: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.to_wire_map();
        for (key, value) in pick_member_fields(patch) {
            if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        merged
    }
}

/// Keeps only the keys listed in [`MEMBER_FIELDS`].
///
/// Blank strings and empty collections become `null`, so they read as
/// "not given" downstream, the same way the rule table treats them.
pub fn pick_member_fields(payload: &Map<String, Value>) -> Map<String, Value> {
    payload
        .iter()
        .filter(|(key, _)| MEMBER_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| {
            let blank = match value {
                Value::String(s) => s.trim().is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::Object(map) => map.is_empty(),
                _ => false,
            };
            let value = if blank { Value::Null } else { value.clone() };
            (key.clone(), value)
        })
        .collect()
}

// ============ Local Mirror ============

/// Local mirror of a MailChimp list member.
///
/// Stored under an opaque generated `id`; MailChimp addresses the same member
/// by the subscriber hash of `fields.email_address`.
#[derive(Debug, Clone, PartialEq)]
pub struct MailChimpMember {
    pub id: Uuid,
    pub fields: MemberFields,
    /// MailChimp identifier of the parent list.
    pub list_id: String,
}

impl MailChimpMember {
    pub fn new(fields: MemberFields, list_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
            list_id: list_id.into(),
        }
    }

    pub fn to_mailchimp_map(&self) -> Map<String, Value> {
        self.fields.to_wire_map()
    }

    /// Full local view: `member_id`, every member field (null when unset) and `list_id`.
    pub fn to_array(&self) -> Value {
        let mut array = Map::new();
        array.insert("member_id".to_string(), Value::String(self.id.to_string()));
        for field in MEMBER_FIELDS {
            array.insert((*field).to_string(), Value::Null);
        }
        array.extend(self.to_mailchimp_map());
        array.insert("list_id".to_string(), Value::String(self.list_id.clone()));
        Value::Object(array)
    }
}

/// Local record of a MailChimp list; only looked up, never written here.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MailChimpList {
    pub id: Uuid,
    /// Identifier MailChimp assigned to the list.
    pub mailchimp_id: String,
    pub name: String,
}

impl MailChimpList {
    pub fn new(mailchimp_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mailchimp_id: mailchimp_id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_fields() -> MemberFields {
        MemberFields::from_wire_map(
            json!({ "email_address": "a@b.com", "status": "subscribed" })
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_wire_map_omits_unset_optionals() {
        let wire = minimal_fields().to_wire_map();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire["email_address"], "a@b.com");
        assert_eq!(wire["status"], "subscribed");
    }

    #[test]
    fn test_to_array_carries_every_field() {
        let member = MailChimpMember::new(minimal_fields(), "L1");
        let array = member.to_array();

        assert_eq!(array["member_id"], member.id.to_string());
        assert_eq!(array["list_id"], "L1");
        assert_eq!(array["email_address"], "a@b.com");
        for field in MEMBER_FIELDS {
            assert!(array.get(*field).is_some(), "missing {}", field);
        }
        assert!(array["vip"].is_null());
    }

    #[test]
    fn test_wire_names_match_field_table() {
        let full = json!({
            "email_address": "a@b.com",
            "email_type": "text",
            "status": "pending",
            "merge_fields": { "FNAME": "A" },
            "interests": { "abc": true },
            "language": "en",
            "vip": false,
            "location": { "latitude": 1.0, "longitude": 2.0 },
            "marketing_permissions": [{ "enabled": true }],
            "ip_signup": "10.0.0.1",
            "timestamp_signup": "2018-09-09 09:09:09",
            "ip_opt": "10.0.0.2",
            "timestamp_opt": "2018-09-09 09:09:09",
            "tags": ["t"]
        });
        let fields = MemberFields::from_wire_map(full.as_object().cloned().unwrap()).unwrap();
        let wire = fields.to_wire_map();

        let mut keys: Vec<&str> = wire.keys().map(String::as_str).collect();
        let mut expected = MEMBER_FIELDS.to_vec();
        keys.sort_unstable();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(Value::Object(wire), full);
    }

    #[test]
    fn test_pick_drops_unknown_keys() {
        let payload = json!({ "status": "pending", "member_id": "x", "list_id": "y", "foo": 1 });
        let picked = pick_member_fields(payload.as_object().unwrap());
        assert_eq!(picked.len(), 1);
        assert!(picked.contains_key("status"));
    }

    #[test]
    fn test_pick_turns_blank_strings_into_null() {
        let payload = json!({ "email_type": "  ", "language": "" });
        let picked = pick_member_fields(payload.as_object().unwrap());
        assert!(picked["email_type"].is_null());
        assert!(picked["language"].is_null());
    }

    #[test]
    fn test_pick_turns_empty_collections_into_null() {
        let payload = json!({ "marketing_permissions": {}, "tags": [], "location": {} });
        let picked = pick_member_fields(payload.as_object().unwrap());
        assert!(picked.values().all(Value::is_null));

        let fields = MemberFields::from_wire_map(
            json!({ "email_address": "a@b.com", "status": "subscribed" })
                .as_object()
                .cloned()
                .unwrap()
                .into_iter()
                .chain(picked)
                .collect(),
        )
        .unwrap();
        assert!(fields.marketing_permissions.is_none());
        assert!(fields.location.is_none());
    }

    #[test]
    fn test_location_and_permissions_keep_numbers_and_extra_keys() {
        let full = json!({
            "email_address": "a@b.com",
            "status": "subscribed",
            "location": { "latitude": 32, "longitude": 141.5, "country_code": "US" },
            "marketing_permissions": [
                { "marketing_permission_id": "p1", "enabled": true, "text": "Email" }
            ]
        });
        let fields = MemberFields::from_wire_map(full.as_object().cloned().unwrap()).unwrap();
        let wire = Value::Object(fields.to_wire_map());

        assert_eq!(wire, full);
        assert_eq!(wire["location"]["latitude"].to_string(), "32");
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let mut fields = minimal_fields();
        fields.language = Some("en".into());

        let merged = fields.merged_with(json!({ "status": "unsubscribed" }).as_object().unwrap());
        assert_eq!(merged["status"], "unsubscribed");
        assert_eq!(merged["email_address"], "a@b.com");
        assert_eq!(merged["language"], "en");
    }

    #[test]
    fn test_merge_null_clears_field() {
        let mut fields = minimal_fields();
        fields.vip = Some(true);

        let merged = fields.merged_with(json!({ "vip": null }).as_object().unwrap());
        assert!(!merged.contains_key("vip"));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            MemberStatus::Subscribed,
            MemberStatus::Unsubscribed,
            MemberStatus::Cleaned,
            MemberStatus::Pending,
        ] {
            assert_eq!(status.as_str().parse::<MemberStatus>().unwrap(), status);
        }
        assert!("archived".parse::<MemberStatus>().is_err());
    }
}
