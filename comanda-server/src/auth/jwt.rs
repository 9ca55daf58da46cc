//! JWT token service
//!
//! Tokens are issued by the PIN check and carry the user id, name and role.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use shared::models::{User, UserRole};
use thiserror::Error;

const ISSUER: &str = "comanda-server";
const AUDIENCE: &str = "comanda-clients";
/// Minimum accepted length for a configured secret
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Use the configured secret, or a random one outside release builds
    pub fn resolve(secret: Option<&str>, expiration_minutes: i64) -> Result<Self, JwtError> {
        let secret = match secret {
            Some(s) if s.len() >= MIN_SECRET_LEN => s.to_string(),
            Some(_) => {
                return Err(JwtError::ConfigError(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )));
            }
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using a temporary random key; tokens will not survive a restart");
                generate_secret()
            }
            None => {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set in production".to_string(),
                ));
            }
        };
        Ok(Self {
            secret,
            expiration_minutes: expiration_minutes.max(1),
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
        })
    }
}

/// 64 random alphanumeric characters
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("expiration_minutes", &self.config.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        self.config.expiration_minutes * 60
    }

    pub fn generate_token(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role: user.role,
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;
        Ok(token_data.claims)
    }

    /// Token part of an `Authorization: Bearer <token>` header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Authenticated caller, attached to the request by the auth middleware
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("Malformed subject: {}", claims.sub)))?;
        Ok(Self {
            id,
            name: claims.name,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(minutes: i64) -> JwtService {
        JwtService::with_config(JwtConfig::resolve(Some(&"k".repeat(40)), minutes).unwrap())
    }

    fn user(role: UserRole) -> User {
        User {
            id: 12,
            name: "Lucia".into(),
            role,
            pin_hash: String::new(),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn token_round_trip_carries_role() {
        let jwt = service(60);
        let token = jwt.generate_token(&user(UserRole::Admin)).unwrap();
        let claims = jwt.validate_token(&token).unwrap();
        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.id, 12);
        assert!(current.is_admin());
        assert_eq!(jwt.expires_in(), 3600);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = service(60).generate_token(&user(UserRole::Mozo)).unwrap();
        let other = JwtService::with_config(JwtConfig::resolve(Some(&"z".repeat(40)), 60).unwrap());
        assert!(matches!(other.validate_token(&token), Err(JwtError::InvalidSignature)));
        assert!(other.validate_token("garbage").is_err());
    }

    #[test]
    fn short_secret_is_a_config_error() {
        assert!(matches!(
            JwtConfig::resolve(Some("short"), 60),
            Err(JwtError::ConfigError(_))
        ));
        // debug builds fall back to a random key
        let generated = JwtConfig::resolve(None, 60).unwrap();
        assert_eq!(generated.secret.len(), 64);
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
