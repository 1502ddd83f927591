use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

impl Claims {
    pub fn admin_id(&self) -> Result<i32> {
        self.sub
            .parse::<i32>()
            .map_err(|_| AppError::Unauthorized("Invalid session".to_string()))
    }
}

pub fn generate_token(secret: &str, admin_id: i32, email: &str, ttl_hours: i64) -> Result<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: admin_id.to_string(),
        email: email.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid session: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_with_same_secret() {
        let token = generate_token("s3cret", 42, "admin@umkm.test", 1).unwrap();
        let claims = verify_token("s3cret", &token).unwrap();

        assert_eq!(claims.admin_id().unwrap(), 42);
        assert_eq!(claims.email, "admin@umkm.test");
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = generate_token("s3cret", 42, "admin@umkm.test", 1).unwrap();
        assert!(matches!(
            verify_token("other", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = generate_token("s3cret", 1, "admin@umkm.test", -2).unwrap();
        assert!(verify_token("s3cret", &token).is_err());
    }
}
