//! Stateless signed session cookies.
//!
//! A token is `base64url(claims) "." base64url(HMAC-SHA256(base64url(claims)))`
//! where the claims are `{"sub": <user id>, "exp": <unix seconds>}`. The
//! server keeps no session table: a token is valid while its signature matches
//! one of the configured secrets and `exp` is still in the future.

use anyhow::{anyhow, Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

use super::config::AuthConfig;

/// Sessions last seven days from issuance.
pub const SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;

// Used only when no secret is configured outside production.
const DEVELOPMENT_SECRET: &str = "super_duper_secret";

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct Claims {
    sub: Uuid,
    exp: i64,
}

/// A `Set-Cookie` value for the session cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    value: String,
    max_age_seconds: i64,
    secure: bool,
}

impl SessionCookie {
    /// The signed token, or an empty string for a revoking cookie.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn max_age_seconds(&self) -> i64 {
        self.max_age_seconds
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Render as a `Set-Cookie` header value.
    ///
    /// # Errors
    /// Returns an error if the cookie name contains bytes not allowed in headers.
    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.to_string())
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, self.value, self.max_age_seconds
        )?;
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"***")
            .field("max_age_seconds", &self.max_age_seconds)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Issues and validates session cookies over a rotating list of secrets.
pub struct SessionIssuer {
    cookie_name: String,
    secrets: Vec<SecretString>,
    secure: bool,
}

impl SessionIssuer {
    /// Build an issuer from configuration.
    ///
    /// # Errors
    /// Returns an error if the cookie name is not a valid cookie token, or if
    /// no secret is configured in production.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let cookie_name = config.cookie_name().trim().to_string();
        if !valid_cookie_name(&cookie_name) {
            return Err(anyhow!("invalid session cookie name: {cookie_name:?}"));
        }

        let mut secrets: Vec<SecretString> = config
            .secrets()
            .iter()
            .filter(|secret| !secret.expose_secret().is_empty())
            .cloned()
            .collect();
        if secrets.is_empty() {
            if config.environment().is_production() {
                return Err(anyhow!(
                    "at least one session signing secret is required in production"
                ));
            }
            warn!("No session secret configured, using the development secret");
            secrets.push(SecretString::from(DEVELOPMENT_SECRET.to_string()));
        }

        Ok(Self {
            cookie_name,
            secrets,
            secure: config.cookie_secure(),
        })
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issue a session cookie for `user_id`, valid for seven days from now.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be encoded or signed.
    pub fn issue(&self, user_id: Uuid) -> Result<SessionCookie> {
        self.issue_at(user_id, crate::now_unix_seconds())
    }

    /// Issue a session cookie as if the current time were `now_unix`.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be encoded or signed.
    pub fn issue_at(&self, user_id: Uuid, now_unix: i64) -> Result<SessionCookie> {
        let claims = Claims {
            sub: user_id,
            exp: now_unix.saturating_add(SESSION_TTL_SECONDS),
        };
        let payload = serde_json::to_vec(&claims).context("failed to encode session claims")?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        // The newest secret always signs.
        let secret = self
            .secrets
            .first()
            .ok_or_else(|| anyhow!("no session signing secret"))?;
        let signature = sign(secret, payload.as_bytes())?;

        Ok(SessionCookie {
            name: self.cookie_name.clone(),
            value: format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature)),
            max_age_seconds: SESSION_TTL_SECONDS,
            secure: self.secure,
        })
    }

    /// Resolve a token into the user id it was issued for.
    ///
    /// Returns `None` for empty, malformed, unsigned, tampered or expired
    /// tokens; validation never fails loudly.
    #[must_use]
    pub fn validate(&self, token: &str) -> Option<Uuid> {
        self.validate_at(token, crate::now_unix_seconds())
    }

    #[must_use]
    pub fn validate_at(&self, token: &str, now_unix: i64) -> Option<Uuid> {
        let (payload, signature) = token.trim().split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let signed = self
            .secrets
            .iter()
            .any(|secret| verify(secret, payload.as_bytes(), &signature));
        if !signed {
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: Claims = serde_json::from_slice(&payload).ok()?;
        if now_unix >= claims.exp {
            return None;
        }
        Some(claims.sub)
    }

    /// A cookie that clears the session immediately.
    #[must_use]
    pub fn revoke(&self) -> SessionCookie {
        SessionCookie {
            name: self.cookie_name.clone(),
            value: String::new(),
            max_age_seconds: 0,
            secure: self.secure,
        }
    }

    /// Read the session cookie out of request headers and validate it.
    #[must_use]
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<Uuid> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                (key.trim() == self.cookie_name).then(|| val.trim())
            })
            .find_map(|token| self.validate(token))
    }
}

impl fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("cookie_name", &self.cookie_name)
            .field("secrets", &format_args!("[***; {}]", self.secrets.len()))
            .field("secure", &self.secure)
            .finish()
    }
}

fn sign(secret: &SecretString, payload: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| anyhow!("invalid session signing key"))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify(secret: &SecretString, payload: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(payload);
    // Constant-time comparison
    mac.verify_slice(signature).is_ok()
}

/// Cookie names are RFC 6265 tokens: visible ASCII without separators.
fn valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|byte| {
            byte.is_ascii_graphic()
                && !matches!(
                    byte,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                        | b'{'
                        | b'}'
                )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::Environment;

    const NOW: i64 = 1_700_000_000;

    fn issuer_with(secrets: &[&str]) -> Result<SessionIssuer> {
        let config = AuthConfig::new(Environment::Development).with_secrets(
            secrets
                .iter()
                .map(|secret| SecretString::from(secret.to_string()))
                .collect(),
        );
        SessionIssuer::new(&config)
    }

    #[test]
    fn issued_token_validates_until_expiry() -> Result<()> {
        let issuer = issuer_with(&["s3cret"])?;
        let user_id = Uuid::new_v4();
        let cookie = issuer.issue_at(user_id, NOW)?;

        assert_eq!(issuer.validate_at(cookie.value(), NOW), Some(user_id));
        assert_eq!(
            issuer.validate_at(cookie.value(), NOW + SESSION_TTL_SECONDS - 1),
            Some(user_id)
        );
        assert_eq!(
            issuer.validate_at(cookie.value(), NOW + SESSION_TTL_SECONDS),
            None
        );
        assert_eq!(
            issuer.validate_at(cookie.value(), NOW + SESSION_TTL_SECONDS * 2),
            None
        );
        Ok(())
    }

    #[test]
    fn issue_uses_current_time() -> Result<()> {
        let issuer = issuer_with(&["s3cret"])?;
        let user_id = Uuid::new_v4();
        let cookie = issuer.issue(user_id)?;
        assert_eq!(issuer.validate(cookie.value()), Some(user_id));
        Ok(())
    }

    #[test]
    fn truncated_or_tampered_tokens_are_rejected() -> Result<()> {
        let issuer = issuer_with(&["s3cret"])?;
        let token = issuer.issue_at(Uuid::new_v4(), NOW)?.value().to_string();

        let truncated = &token[..token.len() - 3];
        assert_eq!(issuer.validate_at(truncated, NOW), None);

        let (payload, signature) = token.split_once('.').map_or(("", ""), |parts| parts);
        let forged_claims = Claims {
            sub: Uuid::new_v4(),
            exp: NOW + SESSION_TTL_SECONDS,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims)?);
        assert_eq!(
            issuer.validate_at(&format!("{forged_payload}.{signature}"), NOW),
            None
        );

        // Unsigned and garbage inputs collapse to "no session".
        assert_eq!(issuer.validate_at(payload, NOW), None);
        assert_eq!(issuer.validate_at("", NOW), None);
        assert_eq!(issuer.validate_at("...", NOW), None);
        assert_eq!(issuer.validate_at("not base64.!!!", NOW), None);
        Ok(())
    }

    #[test]
    fn token_signed_with_unknown_secret_is_rejected() -> Result<()> {
        let ours = issuer_with(&["ours"])?;
        let theirs = issuer_with(&["theirs"])?;
        let token = theirs.issue_at(Uuid::new_v4(), NOW)?;
        assert_eq!(ours.validate_at(token.value(), NOW), None);
        Ok(())
    }

    #[test]
    fn rotation_keeps_old_sessions_valid() -> Result<()> {
        let old = issuer_with(&["old"])?;
        let rotated = issuer_with(&["new", "old"])?;
        let user_id = Uuid::new_v4();

        let legacy = old.issue_at(user_id, NOW)?;
        assert_eq!(rotated.validate_at(legacy.value(), NOW), Some(user_id));

        // New tokens are signed with the newest secret only.
        let fresh = rotated.issue_at(user_id, NOW)?;
        assert_eq!(old.validate_at(fresh.value(), NOW), None);
        let new_only = issuer_with(&["new"])?;
        assert_eq!(new_only.validate_at(fresh.value(), NOW), Some(user_id));
        Ok(())
    }

    #[test]
    fn revoke_clears_the_session() -> Result<()> {
        let issuer = issuer_with(&["s3cret"])?;
        let cookie = issuer.revoke();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age_seconds(), 0);
        assert_eq!(issuer.validate_at(cookie.value(), NOW), None);
        assert_eq!(
            cookie.to_string(),
            "AUTH=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
        Ok(())
    }

    #[test]
    fn cookie_attributes_follow_environment() -> Result<()> {
        let development = issuer_with(&["s3cret"])?.issue_at(Uuid::new_v4(), NOW)?;
        let rendered = development.to_string();
        assert!(rendered.starts_with("AUTH="));
        assert!(rendered.contains("; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
        assert!(development.to_header_value().is_ok());

        let config = AuthConfig::new(Environment::Production)
            .with_cookie_name("tk_session".to_string())
            .with_secrets(vec![SecretString::from("prod-secret".to_string())]);
        let production = SessionIssuer::new(&config)?.issue_at(Uuid::new_v4(), NOW)?;
        assert!(production.secure());
        assert!(production.to_string().starts_with("tk_session="));
        assert!(production.to_string().ends_with("; Secure"));
        Ok(())
    }

    #[test]
    fn production_requires_a_secret() {
        let config = AuthConfig::new(Environment::Production);
        assert!(SessionIssuer::new(&config).is_err());

        let config = AuthConfig::new(Environment::Production)
            .with_secrets(vec![SecretString::from(String::new())]);
        assert!(SessionIssuer::new(&config).is_err());

        assert!(SessionIssuer::new(&AuthConfig::new(Environment::Development)).is_ok());
    }

    #[test]
    fn invalid_cookie_names_are_rejected() {
        for name in ["", "a b", "a;b", "a=b", "sess\u{e9}"] {
            let config = AuthConfig::new(Environment::Development).with_cookie_name(name.into());
            assert!(SessionIssuer::new(&config).is_err(), "{name:?} should fail");
        }
    }

    #[test]
    fn session_from_headers_reads_named_cookie() -> Result<()> {
        let issuer = issuer_with(&["s3cret"])?;
        let user_id = Uuid::new_v4();
        let cookie = issuer.issue(user_id)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!(
                "theme=dark; AUTH={}; other=1",
                cookie.value()
            ))?,
        );
        assert_eq!(issuer.session_from_headers(&headers), Some(user_id));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("AUTH=garbage"));
        assert_eq!(issuer.session_from_headers(&headers), None);
        assert_eq!(issuer.session_from_headers(&HeaderMap::new()), None);
        Ok(())
    }
}
