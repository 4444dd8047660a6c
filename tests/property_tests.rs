/// Property-based tests using proptest
/// Tests invariants of the subscriber hash and the member rule table
use mailchimp_member_sync::models::{pick_member_fields, MemberFields};
use mailchimp_member_sync::remote_key::subscriber_hash;
use mailchimp_member_sync::validation::{is_valid_timestamp, validate_member, MEMBER_STATUSES};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn as_map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

// Property: the remote key depends only on the lower-cased address
proptest! {
    #[test]
    fn subscriber_hash_ignores_case(email in "[a-zA-Z0-9._+-]{1,20}@[a-zA-Z0-9-]{1,15}\\.[a-zA-Z]{2,6}") {
        prop_assert_eq!(subscriber_hash(&email), subscriber_hash(&email.to_uppercase()));
        prop_assert_eq!(subscriber_hash(&email), subscriber_hash(&email.to_lowercase()));
    }

    #[test]
    fn subscriber_hash_is_lowercase_hex(email in "\\PC*") {
        let hash = subscriber_hash(&email);
        prop_assert_eq!(hash.len(), 32);
        prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

// Property: validation never panics, whatever shape the payload has
proptest! {
    #[test]
    fn validation_never_panics(
        email in "\\PC*",
        status in "\\PC*",
        latitude in proptest::option::of(any::<f64>()),
        vip in proptest::option::of(any::<bool>())
    ) {
        let payload = as_map(json!({
            "email_address": email,
            "status": status,
            "location": { "latitude": latitude },
            "vip": vip,
            "marketing_permissions": [{ "enabled": vip }, "x", 3]
        }));
        let _ = validate_member(&payload);
    }

    #[test]
    fn payloads_missing_required_fields_are_rejected(
        language in "[a-z]{2}",
        drop_email in any::<bool>()
    ) {
        let mut payload = as_map(json!({
            "email_address": "a@b.com",
            "status": "subscribed",
            "language": language
        }));
        let missing = if drop_email { "email_address" } else { "status" };
        payload.remove(missing);

        let errors = validate_member(&payload).unwrap_err();
        prop_assert_eq!(errors.fields(), vec![missing]);
    }

    #[test]
    fn unknown_statuses_are_rejected(status in "[a-z]{1,12}") {
        prop_assume!(!MEMBER_STATUSES.contains(&status.as_str()));
        let payload = as_map(json!({ "email_address": "a@b.com", "status": status }));

        let errors = validate_member(&payload).unwrap_err();
        prop_assert!(errors.contains("status"));
    }
}

// Property: valid payloads survive the wire mapping unchanged
proptest! {
    #[test]
    fn valid_payload_echoes_through_wire_map(
        local in "[a-z][a-z0-9]{0,10}",
        domain in "[a-z]{2,10}",
        status_index in 0usize..4,
        vip in any::<bool>(),
        latitude in -90.0f64..90.0,
        tags in proptest::collection::vec("[a-z]{1,8}", 0..4)
    ) {
        let payload = as_map(json!({
            "email_address": format!("{}@{}.com", local, domain),
            "status": MEMBER_STATUSES[status_index],
            "vip": vip,
            "location": { "latitude": latitude },
            "tags": tags
        }));
        let candidate = pick_member_fields(&payload);
        prop_assert!(validate_member(&candidate).is_ok());

        let wire = MemberFields::from_wire_map(candidate).unwrap().to_wire_map();
        for (key, value) in &payload {
            prop_assert_eq!(wire.get(key), Some(value));
        }
    }
}

// Property: timestamps must be exactly `YYYY-MM-DD HH:MM:SS`
proptest! {
    #[test]
    fn well_formed_timestamps_accepted(
        year in 1970u32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        hour in 0u32..24,
        minute in 0u32..60,
        second in 0u32..60
    ) {
        let timestamp = format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        );
        prop_assert!(is_valid_timestamp(&timestamp));
        prop_assert!(!is_valid_timestamp(&timestamp.replace(' ', "T")));
    }
}
