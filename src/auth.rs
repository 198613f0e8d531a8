//! Bearer-token verification
//!
//! Tokens are issued by the external identity provider; this service only
//! verifies the HS256 signature and expiry and reads the role claims.
//! Issuer and audience are not validated, matching the deployed token
//! validation parameters.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::AppState;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_STAFF: &str = "Staff";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id issued by the identity provider.
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Registered email, used as the recipient for order bills.
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn is_staff(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_STAFF)
    }
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token.".to_string()))
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token.".to_string()))
}

/// Any authenticated user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// A user carrying the Staff or Admin role.
#[derive(Debug, Clone)]
pub struct Staff(pub Claims);

/// A user carrying the Admin role.
#[derive(Debug, Clone)]
pub struct Admin(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = decode_claims(bearer_token(parts)?, &state.config.jwt_secret)?;
        Ok(Self(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Staff {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = decode_claims(bearer_token(parts)?, &state.config.jwt_secret)?;
        if !claims.is_staff() {
            return Err(ApiError::Forbidden("Staff role required.".to_string()));
        }
        Ok(Self(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = decode_claims(bearer_token(parts)?, &state.config.jwt_secret)?;
        if !claims.is_admin() {
            return Err(ApiError::Forbidden("Admin role required.".to_string()));
        }
        Ok(Self(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_for(roles: &[&str]) -> String {
        let claims = Claims {
            sub: "user-1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            email: Some("user@example.com".to_string()),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let claims = decode_claims(&token_for(&["Staff"]), SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.is_staff());
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_admin_implies_staff() {
        let claims = decode_claims(&token_for(&["Admin"]), SECRET).unwrap();
        assert!(claims.is_admin());
        assert!(claims.is_staff());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let err = decode_claims(&token_for(&[]), "other-secret").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: "user-1".to_string(),
            roles: vec![],
            email: None,
            exp: 1, // 1970
        };
        let token =
            encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        assert!(decode_claims(&token, SECRET).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(decode_claims("not-a-jwt", SECRET).is_err());
    }
}
