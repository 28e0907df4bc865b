use std::collections::HashMap;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Claim names the codec owns; extra claims may not override them.
pub const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Claim set carried by every issued token.
///
/// `sub`, `iat` and `exp` are mandatory. Anything else a service wants to
/// carry goes in `extra`, which is flattened into the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (login handle of the identity)
    pub sub: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Build a claim set issued at `now` that lives for `ttl`.
    ///
    /// Timestamps are truncated to whole seconds. Reserved keys present in
    /// `extra` are discarded.
    ///
    /// # Errors
    /// * `EncodingFailed` - `now + ttl` falls outside the representable range
    pub fn new(
        subject: impl ToString,
        mut extra: HashMap<String, serde_json::Value>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }

        let expiration = now.checked_add_signed(ttl).ok_or_else(|| {
            JwtError::EncodingFailed(format!(
                "expiry overflows for a ttl of {}ms",
                ttl.num_milliseconds()
            ))
        })?;

        Ok(Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            extra,
        })
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        let key = key.to_string();
        if RESERVED_CLAIMS.contains(&key.as_str()) {
            return self;
        }
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key, json_value);
        }
        self
    }

    /// Read a string-valued custom field.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    /// Read a custom field holding a list of strings, e.g. `roles`.
    ///
    /// Absent or differently-typed fields yield an empty list.
    pub fn extra_strings(&self, key: &str) -> Vec<String> {
        self.extra
            .get(key)
            .and_then(|v| v.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A token is usable strictly before its expiry second.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
