use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID (Subject)
    pub exp: usize,
    pub iat: usize,
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// Identity stamped into a session token.
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub user_id: i32,
    pub username: &'a str,
    pub role: &'a str,
    pub permissions: &'a [String],
}

pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_seconds: u64,
}

impl JwtManager {
    pub fn new(secret: &str, expiration_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_seconds,
        }
    }

    pub fn expiration_seconds(&self) -> u64 {
        self.expiration_seconds
    }

    pub fn generate_token(&self, subject: &TokenSubject<'_>) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

        let claims = Claims {
            sub: subject.user_id.to_string(),
            exp: now + self.expiration_seconds as usize,
            iat: now,
            user_id: subject.user_id,
            username: subject.username.to_string(),
            role: subject.role.to_string(),
            permissions: subject.permissions.to_vec(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip_keeps_permissions() {
        let manager = JwtManager::new("test-secret", 3600);
        let permissions = vec!["act.read".to_string(), "act.write".to_string()];
        let token = manager
            .generate_token(&TokenSubject {
                user_id: 2,
                username: "jperez",
                role: "Supervisor",
                permissions: &permissions,
            })
            .unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.user_id, 2);
        assert_eq!(claims.sub, "2");
        assert_eq!(claims.role, "Supervisor");
        assert_eq!(claims.permissions, permissions);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        let token = issuer
            .generate_token(&TokenSubject {
                user_id: 1,
                username: "admin",
                role: "Administrador",
                permissions: &[],
            })
            .unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }
}
