//! Turns a provider payload into a `QueryResult`.
//!
//! Never fails: absent or oddly-typed fields degrade to empty strings.

use super::providers::ProviderProfile;
use super::types::{LocationRecord, QueryResult, RawLookupResponse, UNKNOWN_ERROR};
use serde_json::Value;

pub fn normalize(raw: RawLookupResponse, original_ip: &str, profile: &ProviderProfile) -> QueryResult {
    let payload = match raw {
        Ok(payload) => payload,
        Err(e) => return QueryResult::failure(original_ip, e.to_string()),
    };

    if !profile.is_success(&payload) {
        let message = profile
            .message_key
            .as_deref()
            .map(|key| text_field(&payload, &[key]))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        return QueryResult::failure(original_ip, message);
    }

    // The message of a success status without data is just "success".
    let Some(data) = profile.data(&payload) else {
        return QueryResult::failure(original_ip, UNKNOWN_ERROR);
    };

    let fields = &profile.fields;
    let mut ip = text_field(data, &fields.ip);
    if ip.is_empty() {
        // Flat providers may echo the IP outside the data object.
        ip = text_field(&payload, &fields.ip);
    }
    if ip.is_empty() {
        ip = original_ip.to_string();
    }

    QueryResult::Success {
        record: LocationRecord {
            ip,
            country: text_field(data, &fields.country),
            province: text_field(data, &fields.province),
            city: text_field(data, &fields.city),
            isp: text_field(data, &fields.isp),
        },
    }
}

/// First non-empty value among `keys`, rendered as text.
fn text_field<K: AsRef<str>>(obj: &Value, keys: &[K]) -> String {
    keys.iter()
        .filter_map(|k| obj.get(k.as_ref()))
        .map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}
