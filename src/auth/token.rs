use chrono::{DateTime, Duration, Utc};
use std::fmt;

use super::credentials::AuthMode;

/// Tokens this close to expiry are treated as expired
pub const REFRESH_MARGIN_SECS: i64 = 120;

/// A bearer token plus the bookkeeping needed to decide when to replace it
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: Option<DateTime<Utc>>,
    mode: AuthMode,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>, mode: AuthMode) -> Self {
        Self {
            value: value.into(),
            expires_at,
            mode,
        }
    }

    /// A caller-supplied token. Its validity is only known to the server.
    pub fn fixed(value: impl Into<String>) -> Self {
        Self::new(value, None, AuthMode::AccessToken)
    }

    /// Token from an exchange that reported its lifetime in seconds
    pub fn expiring_in(value: impl Into<String>, expires_in: u64, mode: AuthMode) -> Self {
        let lifetime = Duration::seconds(expires_in.min(u64::from(u32::MAX)) as i64);
        Self::new(value, Some(Utc::now() + lifetime), mode)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// True while `now` is outside the refresh margin before expiry
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(exp) => now + Duration::seconds(REFRESH_MARGIN_SECS) < exp,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("mode", &self.mode)
            .finish()
    }
}
