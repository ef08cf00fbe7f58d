//! Credential verification and session-token issuance.
//!
//! Tokens are stateless: `Claims` carries the minimal identity and an
//! expiry exactly one hour after issuance, signed with HS256. Nothing is
//! persisted server-side; verification is signature + expiry only.

use crate::error::FolioError;
use crate::store::SqlitePool;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub exp: i64,
}

/// Email + bcrypt hash pair from the fixed `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credential {
    pub id: i64,
    pub email: String,
    pub password: String,
}

pub async fn find_credential(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<Credential>, FolioError> {
    let credential =
        sqlx::query_as::<_, Credential>("SELECT id, email, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(credential)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, FolioError> {
    Ok(bcrypt::verify(password, hash)?)
}

pub fn issue_token(secret: &str, id: i64, email: &str) -> Result<String, FolioError> {
    let expiry = Utc::now() + Duration::seconds(TOKEN_TTL_SECS);
    let claims = Claims {
        id,
        email: email.to_string(),
        exp: expiry.timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, FolioError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips_minimal_claims() {
        let token = issue_token(SECRET, 7, "user@example.com").unwrap();
        let claims = decode_token(SECRET, &token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "user@example.com");
    }

    #[test]
    fn token_expires_in_exactly_one_hour() {
        let before = Utc::now().timestamp();
        let token = issue_token(SECRET, 1, "user@example.com").unwrap();
        let after = Utc::now().timestamp();
        let claims = decode_token(SECRET, &token).unwrap();
        assert!(claims.exp >= before + TOKEN_TTL_SECS);
        assert!(claims.exp <= after + TOKEN_TTL_SECS);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = issue_token(SECRET, 1, "user@example.com").unwrap();
        assert!(decode_token("other-secret", &token).is_err());
    }

    #[test]
    fn password_verification_matches_bcrypt_hash() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
