use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload. `sub` is the decimal user id; registered claims are strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a JWT at all, or carries claims this service never issues.
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

/// Signing material, derived once from config at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(&self, user_id: i64, now: OffsetDateTime) -> anyhow::Result<String> {
        let ttl = TimeDuration::try_from(self.ttl).context("token lifetime out of range")?;
        let exp = now
            .checked_add(ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, jti = %claims.jti, "jwt signed");
        Ok(token)
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;
        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed)?;
        debug!(user_id, jti = %data.claims.jti, "jwt verified");
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: crate::config::DEFAULT_TOKEN_TTL_MINUTES,
        })
    }

    fn flip_signature_char(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').expect("three segments");
        let mut chars: Vec<char> = sig.chars().collect();
        // Middle of the signature, so the change lands in real data bits.
        let i = chars.len() / 2;
        chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
        format!("{head}.{}", chars.into_iter().collect::<String>())
    }

    #[test]
    fn issue_and_verify() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(42).expect("sign");
        assert_eq!(keys.verify(&token), Ok(42));
    }

    #[test]
    fn lifetime_is_seven_days() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_eq!(keys.ttl(), Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let eight_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(8);
        let token = keys.issue_at(7, eight_days_ago).expect("sign");
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_just_inside_lifetime_still_verifies() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let six_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(6);
        let token = keys.issue_at(7, six_days_ago).expect("sign");
        assert_eq!(keys.verify(&token), Ok(7));
    }

    #[test]
    fn flipped_signature_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(1).expect("sign");
        let tampered = flip_signature_char(&token);
        assert_ne!(token, tampered);
        assert_eq!(keys.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let ours = make_keys("secret-a", "iss", "aud");
        let theirs = make_keys("secret-b", "iss", "aud");
        let token = theirs.issue(1).expect("sign");
        assert_eq!(ours.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_eq!(keys.verify("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(keys.verify(""), Err(TokenError::Malformed));
        assert_eq!(keys.verify("not-a-jwt"), Err(TokenError::Malformed));
    }

    #[test]
    fn foreign_audience_is_rejected() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(1).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn non_numeric_subject_is_malformed() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: "alice".into(),
            iat: now.unix_timestamp(),
            exp: (now + TimeDuration::hours(1)).unix_timestamp(),
            iss: "iss".into(),
            aud: "aud".into(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).expect("sign");
        assert_eq!(keys.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn oversized_lifetime_fails_instead_of_panicking() {
        for ttl_minutes in [1_000_000_000_000, i64::MAX] {
            let keys = JwtKeys::from_config(&JwtConfig {
                secret: "dev-secret".into(),
                issuer: "iss".into(),
                audience: "aud".into(),
                ttl_minutes,
            });
            assert!(keys.issue(1).is_err(), "ttl_minutes={ttl_minutes}");
        }
    }

    #[test]
    fn each_token_has_its_own_id() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_ne!(keys.issue(1).expect("a"), keys.issue(1).expect("b"));
    }
}
