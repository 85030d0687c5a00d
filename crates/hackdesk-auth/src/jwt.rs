//! JWT (JSON Web Token) session handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::{Caller, UserRole};

/// Claims carried by a hackdesk session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Platform role of the user
    pub role: String,
}

impl SessionClaims {
    pub fn new(
        user_id: Uuid,
        role: UserRole,
        issuer: String,
        audience: String,
        validity: Duration,
    ) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer,
            aud: audience,
            role: role.as_str().to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Resolve the claims into a caller identity
    pub fn caller(&self) -> Result<Caller, JwtError> {
        let user_id = Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)?;
        let role = UserRole::from_str(&self.role).map_err(|_| JwtError::InvalidToken)?;

        Ok(Caller::authenticated(user_id, role))
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// JWT validator using HMAC-SHA256 (symmetric secret)
///
/// Validates signature and expiration; issuer/audience checks are opt-in
/// via `with_issuer`/`with_audience`.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.validate_nbf = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn with_audience(mut self, audience: String) -> Self {
        self.validation.set_audience(&[audience]);
        self
    }

    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.is_expired() {
            return Err(JwtError::TokenExpired);
        }

        Ok(token_data.claims)
    }

    /// Encode a session token using HMAC-SHA256
    pub fn encode(secret: &[u8], claims: &SessionClaims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(secret);

        Ok(encode(&header, claims, &encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    fn claims_for(role: UserRole) -> SessionClaims {
        SessionClaims::new(
            Uuid::new_v4(),
            role,
            "hackdesk".to_string(),
            "hackdesk-web".to_string(),
            Duration::hours(1),
        )
    }

    #[test]
    fn test_jwt_encode_decode() {
        let claims = claims_for(UserRole::Participant);

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();

        let validator = JwtValidator::new(TEST_SECRET)
            .with_issuer("hackdesk".to_string())
            .with_audience("hackdesk-web".to_string());

        let decoded = validator.validate(&token).unwrap();

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, "participant");
    }

    #[test]
    fn test_claims_resolve_to_caller() {
        let user_id = Uuid::new_v4();
        let claims = SessionClaims::new(
            user_id,
            UserRole::Admin,
            "hackdesk".to_string(),
            "hackdesk-web".to_string(),
            Duration::hours(1),
        );

        let caller = claims.caller().unwrap();
        assert_eq!(
            caller,
            Caller::Authenticated {
                user_id,
                role: UserRole::Admin
            }
        );
    }

    #[test]
    fn test_malformed_subject_rejected() {
        let mut claims = claims_for(UserRole::Judge);
        claims.sub = "not-a-uuid".to_string();

        assert!(matches!(claims.caller(), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut claims = claims_for(UserRole::Judge);
        claims.role = "superuser".to_string();

        assert!(matches!(claims.caller(), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let claims = SessionClaims::new(
            Uuid::new_v4(),
            UserRole::Participant,
            "hackdesk".to_string(),
            "hackdesk-web".to_string(),
            Duration::seconds(-10), // Already expired
        );

        assert!(claims.is_expired());

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();

        let validator = JwtValidator::new(TEST_SECRET);
        assert!(validator.validate(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = claims_for(UserRole::Participant);
        let token = JwtValidator::encode(b"other_secret", &claims).unwrap();

        let validator = JwtValidator::new(TEST_SECRET);
        assert!(validator.validate(&token).is_err());
    }
}
