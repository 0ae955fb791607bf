//! Core types for the lookup subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message used when neither the provider nor the transport explains a failure.
pub const UNKNOWN_ERROR: &str = "未知错误";

/// A normalized geolocation record. Any field but `ip` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub ip: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub isp: String,
}

impl LocationRecord {
    /// "country-province-city" with empty parts dropped.
    pub fn location_label(&self) -> String {
        [&self.country, &self.province, &self.city]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Outcome of looking up a single IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResult {
    Success { record: LocationRecord },
    Failure { ip: String, message: String },
}

impl QueryResult {
    pub fn failure(ip: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            ip: ip.into(),
            message: message.into(),
        }
    }

    pub fn ip(&self) -> &str {
        match self {
            Self::Success { record } => &record.ip,
            Self::Failure { ip, .. } => ip,
        }
    }

    pub fn record(&self) -> Option<&LocationRecord> {
        match self {
            Self::Success { record } => Some(record),
            Self::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The per-IP error carried by a failed lookup.
    pub fn lookup_error(&self) -> Option<SessionError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { ip, message } => Some(SessionError::LookupFailure {
                ip: ip.clone(),
                message: message.clone(),
            }),
        }
    }

    /// One line of the results view.
    pub fn display_line(&self) -> String {
        match self {
            Self::Success { record } => {
                format!("{} => {}-{}", record.ip, record.location_label(), record.isp)
            }
            Self::Failure { ip, message } => format!("{} => 查询失败: {}", ip, message),
        }
    }
}

/// What the provider handed back for one IP, before normalization.
pub type RawLookupResponse = Result<serde_json::Value, LookupError>;

/// Errors raised while fetching a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Network(String),
    Status(u16),
    InvalidResponse(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

/// Session-level errors surfaced at the boundary of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Query or dedupe requested without a single non-blank line.
    EmptyInput,
    /// A single IP could not be looked up. Recorded as a `Failure` result.
    LookupFailure { ip: String, message: String },
    /// Encoding or decoding the persisted session failed.
    SerializationFailure(String),
    /// The clipboard rejected the copy.
    CopyFailure(String),
    /// Nothing visible to copy.
    NothingToCopy,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "请输入至少一个IP地址"),
            Self::LookupFailure { ip, message } => write!(f, "{} => 查询失败: {}", ip, message),
            Self::SerializationFailure(msg) => write!(f, "Serialization failed: {}", msg),
            Self::CopyFailure(msg) => write!(f, "复制失败: {}", msg),
            Self::NothingToCopy => write!(f, "没有可复制的内容"),
        }
    }
}

impl std::error::Error for SessionError {}
