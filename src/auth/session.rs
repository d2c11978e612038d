use std::sync::Arc;

use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::models::UserSummary;
use crate::db::queries;
use crate::error::AppResult;

pub const SESSION_COOKIE: &str = "RJ_session";
pub const SESSION_TTL_DAYS: i64 = 30;

/// Signing mechanism behind the session cookie. Swappable without touching
/// any caller: `encode` turns a user id into an opaque token, `decode`
/// returns the id only for a token we issued that has not expired.
pub trait SessionCodec: Send + Sync {
    fn encode(&self, user_id: i64) -> AppResult<String>;
    fn decode(&self, token: &str) -> Option<i64>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HMAC-SHA256 token codec. The payload carries only the user id and the
/// issue/expiry timestamps.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl JwtCodec {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, chrono::Duration::days(SESSION_TTL_DAYS))
    }

    fn with_ttl(secret: &str, ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl SessionCodec for JwtCodec {
    fn encode(&self, user_id: i64) -> AppResult<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    fn decode(&self, token: &str) -> Option<i64> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        data.claims.sub.parse().ok()
    }
}

/// Outcome of resolving the session against the user table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No cookie, or one that failed verification or expired.
    Anonymous,
    Authenticated(UserSummary),
    /// The cookie verified but its user no longer exists. The caller must
    /// clear the cookie and send the client back to login.
    Stale,
}

/// Issues, resolves and destroys the session cookie. The only component that
/// creates or terminates sessions.
#[derive(Clone)]
pub struct Sessions {
    codec: Arc<dyn SessionCodec>,
    secure_cookies: bool,
}

impl Sessions {
    pub fn new(secret: &str, secure_cookies: bool) -> Self {
        Self::with_codec(Arc::new(JwtCodec::new(secret)), secure_cookies)
    }

    pub fn with_codec(codec: Arc<dyn SessionCodec>, secure_cookies: bool) -> Self {
        Self {
            codec,
            secure_cookies,
        }
    }

    /// Issue a session for `user_id`. Returns the full `Set-Cookie` value.
    pub fn create_session(&self, user_id: i64) -> AppResult<String> {
        let token = self.codec.encode(user_id)?;
        Ok(self.session_cookie(&token))
    }

    /// `Set-Cookie` value that drops the session on the client.
    pub fn destroy_session(&self) -> String {
        self.session_cookie("")
    }

    /// The authenticated user id, if the request carries a valid session.
    /// Absent, tampered and expired cookies all resolve to `None`.
    pub fn user_id(&self, parts: &Parts) -> Option<i64> {
        let token = cookie_value(parts, SESSION_COOKIE)?;
        self.codec.decode(token)
    }

    /// Resolve the session against the user table.
    pub fn current_user(&self, parts: &Parts, conn: &Connection) -> AppResult<SessionState> {
        let Some(user_id) = self.user_id(parts) else {
            return Ok(SessionState::Anonymous);
        };

        match queries::find_user_by_id(conn, user_id)? {
            Some(user) => Ok(SessionState::Authenticated(user)),
            None => Ok(SessionState::Stale),
        }
    }

    fn session_cookie(&self, token: &str) -> String {
        let max_age_secs = if token.is_empty() {
            0
        } else {
            SESSION_TTL_DAYS * 24 * 3600
        };
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

pub(crate) fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
