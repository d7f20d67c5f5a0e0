//! Identity resolver seam. The marketplace never verifies credentials
//! itself; it consumes a [`TokenVerifier`] that turns a bearer
//! credential into a stable subject id plus email. The shipped
//! implementation decodes HS256 JWTs with a shared secret.

use crate::error::AppError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

/// Identity asserted by the provider for a verified credential.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Stable subject identifier
    pub subject: String,
    pub email: Option<String>,
}

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<VerifiedIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    #[allow(dead_code)]
    exp: Option<usize>,
}

/// HS256 JWT verification against a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<VerifiedIdentity, AppError> {
        let data = decode::<Claims>(credential, &self.key, &self.validation)
            .map_err(|err| AppError::Auth(format!("invalid credential: {err}")))?;

        Ok(VerifiedIdentity {
            subject: data.claims.sub,
            email: data.claims.email.map(|e| e.to_lowercase()),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: Option<&'a str>,
        exp: usize,
    }

    pub fn issue_token(secret: &str, subject: &str, email: Option<&str>) -> String {
        let claims = TestClaims {
            sub: subject,
            email,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}
