use std::collections::HashMap;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Token payload.
///
/// Registered claims from RFC 7519 that this workspace uses, plus custom
/// fields flattened into the payload through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (the username the token was issued for)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued at (Unix timestamp, seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration time (Unix timestamp, seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Claim names held in typed fields. They never appear in `extra`.
    pub const REGISTERED: [&'static str; 4] = ["sub", "iat", "exp", "iss"];

    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subject, issue time and optional expiry onto these claims.
    ///
    /// `exp` is cleared when `ttl` is `None`, so the resulting token never
    /// expires on its own. Registered names are dropped from `extra` so the
    /// payload has no duplicate keys.
    pub fn stamped(mut self, subject: &str, now: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        self.extra
            .retain(|key, _| !Self::REGISTERED.contains(&key.as_str()));
        self.sub = Some(subject.to_string());
        self.iat = Some(now.timestamp());
        self.exp = ttl.map(|ttl| (now + ttl).timestamp());
        self
    }

    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn with_issuer(mut self, iss: impl ToString) -> Self {
        self.iss = Some(iss.to_string());
        self
    }

    /// Add a custom field. Values that fail to serialize and registered
    /// claim names are skipped; use the typed builders for those.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        let key = key.to_string();
        if Self::REGISTERED.contains(&key.as_str()) {
            return self;
        }
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key, json_value);
        }
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Check if the token has expired at `current_timestamp`.
    ///
    /// A token is still valid during the second named by `exp`. Claims
    /// without `exp` never expire.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(false, |exp| exp < current_timestamp)
    }
}
