/// Access token issuing and validation
///
/// Tokens are HS256-signed JWTs carrying the owning user's id as the
/// subject. There is no server-side session state: a token is re-validated
/// on every request until its expiry passes.
///
/// # Claims
///
/// - `sub`: user id
/// - `iss`: always "tasknest"
/// - `iat`: issued-at timestamp
/// - `exp`: expiry timestamp (issued-at + ttl)
/// - `token_type`: always "access"

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token is structurally invalid (not a decodable JWT)
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Signature or claim validation failed
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Token type identifier; only access tokens are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: Uuid,

    /// Issuer - always "tasknest"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims for a user, expiring after `ttl`
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: "tasknest".to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: TokenType::Access,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues a signed access token for a user
///
/// # Arguments
///
/// * `user_id` - Subject of the token
/// * `ttl` - How long the token stays valid
/// * `secret` - Symmetric signing key (at least 32 bytes in production)
pub fn issue_token(user_id: Uuid, ttl: Duration, secret: &str) -> Result<String, JwtError> {
    let claims = Claims::new(user_id, ttl);
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, expiry, and issuer.
///
/// # Errors
///
/// - [`JwtError::Expired`] when the expiry has passed
/// - [`JwtError::Malformed`] when the token is not a decodable JWT
/// - [`JwtError::Invalid`] when the signature or a claim check fails
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["tasknest"]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => JwtError::Malformed(format!("{}", e)),
            _ => JwtError::Invalid(format!("{}", e)),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(12));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "tasknest");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, Duration::hours(1), SECRET).expect("Should issue token");

        let claims = verify_token(&token, SECRET).expect("Should verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "tasknest");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issue_token(Uuid::new_v4(), Duration::hours(1), SECRET).unwrap();

        let result = verify_token(&token, "a-completely-different-secret-key");
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        let claims = Claims::new(Uuid::new_v4(), Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = verify_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_verify_malformed_token() {
        let result = verify_token("not-a-jwt-at-all", SECRET);
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_verify_wrong_issuer() {
        #[derive(Serialize)]
        struct ForeignClaims {
            sub: Uuid,
            iss: String,
            iat: i64,
            exp: i64,
            token_type: TokenType,
        }

        let now = Utc::now();
        let foreign = ForeignClaims {
            sub: Uuid::new_v4(),
            iss: "someone-else".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            token_type: TokenType::Access,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &foreign,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = verify_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }
}
