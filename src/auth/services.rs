pub(crate) use crate::auth::dto::{Claims, JwtKeys, TokenKind};
use crate::auth::dto::RegisterRequest;
use crate::auth::repo;
use crate::auth::repo_types::User;
use crate::config::JwtConfig;
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::state::AppState;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use sqlx::PgPool;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

/// A freshly issued access/refresh pair.
#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Exchange credentials for a token pair. Any credential failure collapses
/// into one generic Unauthorized message.
pub async fn attempt(
    db: &PgPool,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> ApiResult<(TokenPair, User)> {
    let invalid = || ApiError::Unauthorized("Your email or password is invalid".to_string());

    let user = User::find_by_email(db, email)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(invalid)?;

    let ok = verify_password(password, &user.password_hash).map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let pair = issue_pair(keys, user.id)?;
    Ok((pair, user))
}

pub fn issue_pair(keys: &JwtKeys, user_id: Uuid) -> ApiResult<TokenPair> {
    let access = keys.sign_access(user_id).map_err(ApiError::internal)?;
    let refresh = keys.sign_refresh(user_id).map_err(ApiError::internal)?;
    Ok(TokenPair { access, refresh })
}

/// Deny-list the token until its natural expiry.
pub async fn invalidate(db: &PgPool, claims: &Claims) -> anyhow::Result<()> {
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp as i64)?;
    repo::revoke_token(db, claims.jti, expires_at).await
}

/// Registration field rules. Email uniqueness is checked separately against
/// the store; this covers everything checkable from the payload alone.
pub fn validate_register(req: &RegisterRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (field, value) in [
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
    ] {
        match value {
            None => errors.add(field, format!("The {} field is required", field.replace('_', " "))),
            Some(v) if v.len() < 2 || v.len() > 255 => errors.add(
                field,
                format!(
                    "The {} must be between 2 and 255 characters",
                    field.replace('_', " ")
                ),
            ),
            Some(_) => {}
        }
    }

    if req.gender.as_deref().map_or(true, |g| g.is_empty()) {
        errors.add("gender", "The gender field is required");
    }

    match req.email.as_deref() {
        None => errors.add("email", "The email field is required"),
        Some(email) => {
            if !is_valid_email(email) {
                errors.add("email", "The email must be a valid email address");
            }
            if email.len() > 100 {
                errors.add("email", "The email may not be greater than 100 characters");
            }
        }
    }

    match req.password.as_deref() {
        None => errors.add("password", "The password field is required"),
        Some(p) if p.len() < 6 => {
            errors.add("password", "The password must be at least 6 characters")
        }
        Some(_) => {}
    }

    match (req.confirm_password.as_deref(), req.password.as_deref()) {
        (None, _) => errors.add("confirm_password", "The confirm password field is required"),
        (Some(c), Some(p)) if c != p => {
            errors.add("confirm_password", "The confirm password and password must match")
        }
        _ => {}
    }

    errors
}

/// Split a raw comma-separated address string into syntactically valid and
/// invalid entries. Entries are trimmed; empties dropped; duplicates keep
/// their first occurrence.
pub fn parse_invite_emails(raw: &str) -> (Vec<String>, Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() || !seen.insert(entry.to_string()) {
            continue;
        }
        if is_valid_email(entry) {
            valid.push(entry.to_string());
        } else {
            invalid.push(entry.to_string());
        }
    }
    (valid, invalid)
}

/// Subtract already-registered addresses from the invite set, keeping order.
pub fn remove_existing(valid: Vec<String>, existing: &[String]) -> Vec<String> {
    valid
        .into_iter()
        .filter(|email| !existing.contains(email))
        .collect()
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn hash_never_equals_plaintext() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
    }
}

#[cfg(test)]
mod jwt_tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn sign_and_verify_refresh_token_and_verify_refresh() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_refresh(user_id).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[tokio::test]
    async fn every_token_gets_a_distinct_jti() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let a = keys.verify(&keys.sign_access(user_id).unwrap()).unwrap();
        let b = keys.verify(&keys.sign_access(user_id).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn valid_payload() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Arta".into()),
            last_name: Some("Krasniqi".into()),
            gender: Some("female".into()),
            email: Some("arta@example.com".into()),
            password: Some("secret1".into()),
            confirm_password: Some("secret1".into()),
            image: None,
            date_of_birth: None,
            academic_year: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_register(&valid_payload()).is_empty());
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let req = RegisterRequest {
            first_name: None,
            last_name: None,
            gender: None,
            email: None,
            password: None,
            confirm_password: None,
            image: None,
            date_of_birth: None,
            academic_year: None,
        };
        let errors = validate_register(&req);
        for field in [
            "first_name",
            "last_name",
            "gender",
            "email",
            "password",
            "confirm_password",
        ] {
            assert!(errors.0.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn name_length_bounds() {
        let mut req = valid_payload();
        req.first_name = Some("A".into());
        assert!(validate_register(&req).0.contains_key("first_name"));

        req.first_name = Some("Ab".into());
        assert!(validate_register(&req).is_empty());

        req.last_name = Some("x".repeat(256));
        assert!(validate_register(&req).0.contains_key("last_name"));

        req.last_name = Some("x".repeat(255));
        assert!(validate_register(&req).is_empty());
    }

    #[test]
    fn email_format_and_length() {
        let mut req = valid_payload();
        req.email = Some("not-an-email".into());
        assert!(validate_register(&req).0.contains_key("email"));

        req.email = Some(format!("{}@example.com", "a".repeat(95)));
        assert!(validate_register(&req).0.contains_key("email"));
    }

    #[test]
    fn short_password_rejected() {
        let mut req = valid_payload();
        req.password = Some("12345".into());
        req.confirm_password = Some("12345".into());
        assert!(validate_register(&req).0.contains_key("password"));
    }

    #[test]
    fn mismatched_confirmation_rejected() {
        let mut req = valid_payload();
        req.confirm_password = Some("different".into());
        let errors = validate_register(&req);
        assert!(errors.0.contains_key("confirm_password"));
    }
}

#[cfg(test)]
mod invite_tests {
    use super::*;

    #[test]
    fn parses_trims_dedups_and_partitions() {
        let (valid, invalid) = parse_invite_emails("a@x.com, a@x.com, bad, b@x.com");
        assert_eq!(valid, vec!["a@x.com".to_string(), "b@x.com".to_string()]);
        assert_eq!(invalid, vec!["bad".to_string()]);
    }

    #[test]
    fn empty_entries_are_dropped() {
        let (valid, invalid) = parse_invite_emails(" , a@x.com,, ,");
        assert_eq!(valid, vec!["a@x.com".to_string()]);
        assert!(invalid.is_empty());
    }

    #[test]
    fn existing_addresses_are_subtracted() {
        let (valid, invalid) = parse_invite_emails("a@x.com, a@x.com, bad, b@x.com");
        let existing = vec!["b@x.com".to_string()];
        let invited = remove_existing(valid, &existing);
        assert_eq!(invited, vec!["a@x.com".to_string()]);
        assert_eq!(invalid, vec!["bad".to_string()]);
        assert_eq!(existing, vec!["b@x.com".to_string()]);
    }
}
