//! Geolocation providers: profile definitions, built-in profiles and the HTTP client.
//!
//! A profile describes one upstream contract: where to send the request, how to tell a
//! success from a failure, and under which keys each canonical field arrives.

use super::types::{LookupError, RawLookupResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("ipsift/", env!("CARGO_PKG_VERSION"));

// ─── Profiles ───────────────────────────────────────────────────

/// Provider keys to try, in order, for each canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default = "default_ip_keys")]
    pub ip: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    #[serde(default)]
    pub province: Vec<String>,
    #[serde(default)]
    pub city: Vec<String>,
    #[serde(default)]
    pub isp: Vec<String>,
}

fn default_ip_keys() -> Vec<String> {
    vec!["ip".into()]
}

/// Swappable description of one upstream geolocation API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub name: String,
    /// Request URL with an `{ip}` placeholder.
    pub url_template: String,
    /// Top-level key holding the status code.
    pub status_key: String,
    /// Value of `status_key` that means success. Compared with `==`.
    pub success_value: Value,
    /// Key of the nested data object; `None` when fields sit at the top level.
    #[serde(default)]
    pub data_key: Option<String>,
    /// Top-level key carrying the provider's error text.
    #[serde(default)]
    pub message_key: Option<String>,
    pub fields: FieldMap,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl ProviderProfile {
    /// `api.qjqq.cn` district API: `{"code":200,"msg":"..","data":{"ip","country","prov","city","isp"}}`.
    pub fn qjqq() -> Self {
        Self {
            name: "qjqq".into(),
            url_template: "https://api.qjqq.cn/api/district?ip={ip}".into(),
            status_key: "code".into(),
            success_value: Value::from(200),
            data_key: Some("data".into()),
            message_key: Some("msg".into()),
            fields: FieldMap {
                ip: keys(&["ip"]),
                country: keys(&["country"]),
                province: keys(&["prov", "province", "region"]),
                city: keys(&["city"]),
                isp: keys(&["isp", "operator"]),
            },
        }
    }

    /// ip-api.com in Chinese: flat `{"status":"success","query","country","regionName","city","isp"}`.
    pub fn ip_api() -> Self {
        Self {
            name: "ip-api".into(),
            url_template: "http://ip-api.com/json/{ip}?lang=zh-CN".into(),
            status_key: "status".into(),
            success_value: Value::from("success"),
            data_key: None,
            message_key: Some("message".into()),
            fields: FieldMap {
                ip: keys(&["query", "ip"]),
                country: keys(&["country"]),
                province: keys(&["regionName", "region"]),
                city: keys(&["city"]),
                isp: keys(&["isp", "org"]),
            },
        }
    }

    /// The request URL for one IP.
    pub fn url_for(&self, ip: &str) -> String {
        self.url_template.replace("{ip}", &urlencode(ip))
    }

    /// Whether the payload's status equals the success value.
    pub fn is_success(&self, payload: &Value) -> bool {
        payload.get(&self.status_key) == Some(&self.success_value)
    }

    /// The object holding the location fields, if present.
    pub fn data<'a>(&self, payload: &'a Value) -> Option<&'a Value> {
        let data = match &self.data_key {
            Some(key) => payload.get(key)?,
            None => payload,
        };
        data.is_object().then_some(data)
    }
}

/// Built-in profiles, first one is the default.
pub fn builtin_profiles() -> Vec<ProviderProfile> {
    vec![ProviderProfile::qjqq(), ProviderProfile::ip_api()]
}

// ─── Lookup seam ────────────────────────────────────────────────

/// One blocking lookup per IP.
pub trait GeoLookup {
    fn fetch(&self, ip: &str) -> RawLookupResponse;
}

/// HTTP lookup against a provider profile.
pub struct HttpLookup {
    agent: ureq::Agent,
    profile: ProviderProfile,
}

impl HttpLookup {
    pub fn new(profile: ProviderProfile, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent, profile }
    }
}

impl GeoLookup for HttpLookup {
    fn fetch(&self, ip: &str) -> RawLookupResponse {
        let url = self.profile.url_for(ip);
        log::debug!("GET {}", url);

        let response = match self.agent.get(&url).call() {
            Ok(r) => r,
            // Some providers put their error payload on a non-2xx response.
            Err(ureq::Error::Status(code, r)) => {
                return r.into_json().map_err(|_| LookupError::Status(code));
            }
            Err(e) => return Err(LookupError::Network(e.to_string())),
        };

        response
            .into_json()
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))
    }
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

fn urlencode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b':' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_for_ipv4_and_ipv6() {
        let p = ProviderProfile::qjqq();
        assert_eq!(p.url_for("1.1.1.1"), "https://api.qjqq.cn/api/district?ip=1.1.1.1");
        let p = ProviderProfile::ip_api();
        assert_eq!(p.url_for("2001:db8::1"), "http://ip-api.com/json/2001:db8::1?lang=zh-CN");
    }

    #[test]
    fn test_urlencode_escapes_reserved() {
        assert_eq!(urlencode("1.1.1.1 &x"), "1.1.1.1%20%26x");
    }

    #[test]
    fn test_is_success_uses_equality() {
        let p = ProviderProfile::qjqq();
        assert!(p.is_success(&json!({"code": 200})));
        assert!(!p.is_success(&json!({"code": 500})));
        assert!(!p.is_success(&json!({"code": "200"})));
        assert!(!p.is_success(&json!({})));

        let p = ProviderProfile::ip_api();
        assert!(p.is_success(&json!({"status": "success"})));
        assert!(!p.is_success(&json!({"status": "fail"})));
    }

    #[test]
    fn test_data_nested_and_flat() {
        let p = ProviderProfile::qjqq();
        let payload = json!({"code": 200, "data": {"ip": "1.1.1.1"}});
        assert_eq!(p.data(&payload).unwrap()["ip"], "1.1.1.1");
        assert!(p.data(&json!({"code": 200, "data": null})).is_none());

        let p = ProviderProfile::ip_api();
        let payload = json!({"status": "success", "query": "1.1.1.1"});
        assert_eq!(p.data(&payload).unwrap()["query"], "1.1.1.1");
    }

    #[test]
    fn test_builtin_profiles_unique_names() {
        let profiles = builtin_profiles();
        assert_eq!(profiles[0].name, "qjqq");
        assert!(profiles.iter().any(|p| p.name == "ip-api"));
    }

    #[test]
    fn test_profile_from_toml() {
        let src = r#"
            name = "custom"
            url_template = "https://geo.example/{ip}"
            status_key = "ok"
            success_value = true

            [fields]
            country = ["country_name"]
        "#;
        let p: ProviderProfile = toml::from_str(src).unwrap();
        assert_eq!(p.fields.ip, vec!["ip".to_string()]);
        assert!(p.data_key.is_none());
        assert!(p.is_success(&json!({"ok": true})));
    }
}
