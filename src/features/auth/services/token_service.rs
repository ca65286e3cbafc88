use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::models::{AuthFailure, Principal, Role};

/// Claims carried by access tokens. Signed HS256 with the process-wide
/// secret; there is no per-user or per-session keying.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// Issues and verifies access tokens, and resolves request credentials
/// into a [`Principal`].
pub struct TokenService {
    pool: PgPool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: i64,
}

impl TokenService {
    pub fn new(pool: PgPool, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt_leeway.as_secs();

        Self {
            pool,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            token_ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    /// Sign a new access token for the given account.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<IssuedToken> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.token_ttl_secs,
        })
    }

    /// Check signature and expiry only. Expiry is the one failure worth
    /// telling apart; every other defect is an opaque invalid credential.
    pub fn verify(&self, credential: &str) -> std::result::Result<Principal, AuthFailure> {
        let token_data = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthFailure::ExpiredCredential,
                _ => AuthFailure::InvalidCredential,
            })?;

        let claims = token_data.claims;
        let issued_at =
            DateTime::from_timestamp(claims.iat, 0).ok_or(AuthFailure::InvalidCredential)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AuthFailure::InvalidCredential)?;

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }

    /// Full claim resolution for a request: verify the credential, then
    /// re-check the account row so a deactivated user is rejected even
    /// while holding an unexpired token.
    pub async fn authenticate(&self, credential: &str) -> Result<Principal> {
        let principal = self.verify(credential)?;

        let is_active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1")
            .bind(principal.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load account state: {:?}", e);
                AppError::Database(e)
            })?;

        match is_active {
            Some(true) => Ok(principal),
            // Deleted accounts and deactivated accounts look the same to
            // the caller.
            _ => Err(AuthFailure::AccountInactive.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    fn test_config(leeway_secs: u64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-with-at-least-32-characters!".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_leeway: Duration::from_secs(leeway_secs),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }

    fn test_service() -> TokenService {
        // connect_lazy never dials; these tests only exercise the signing
        // paths.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        TokenService::new(pool, &test_config(0))
    }

    fn raw_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_issue_then_verify_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let issued = service.issue(user_id, Role::Psychologist).unwrap();
        assert_eq!(issued.expires_in, 3600);

        let principal = service.verify(&issued.access_token).unwrap();
        assert_eq!(principal.id, user_id);
        assert_eq!(principal.role, Role::Psychologist);
        assert!(principal.expires_at > principal.issued_at);
    }

    #[tokio::test]
    async fn test_expired_token_is_reported_as_expired() {
        let service = test_service();
        let now = Utc::now().timestamp();
        let token = raw_token(
            &Claims {
                sub: Uuid::new_v4(),
                role: Role::Patient,
                iat: now - 7200,
                exp: now - 3600,
            },
            "test-secret-with-at-least-32-characters!",
        );

        assert_eq!(
            service.verify(&token).unwrap_err(),
            AuthFailure::ExpiredCredential
        );
    }

    #[tokio::test]
    async fn test_wrong_secret_is_invalid_not_expired() {
        let service = test_service();
        let now = Utc::now().timestamp();
        let token = raw_token(
            &Claims {
                sub: Uuid::new_v4(),
                role: Role::Patient,
                iat: now,
                exp: now + 3600,
            },
            "a-completely-different-signing-secret!!!",
        );

        assert_eq!(
            service.verify(&token).unwrap_err(),
            AuthFailure::InvalidCredential
        );
    }

    #[tokio::test]
    async fn test_garbage_credential_is_invalid() {
        let service = test_service();
        assert_eq!(
            service.verify("not-a-jwt").unwrap_err(),
            AuthFailure::InvalidCredential
        );
        assert_eq!(
            service.verify("").unwrap_err(),
            AuthFailure::InvalidCredential
        );
    }

    #[tokio::test]
    async fn test_leeway_tolerates_slight_clock_skew() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = TokenService::new(pool, &test_config(120));

        let now = Utc::now().timestamp();
        let token = raw_token(
            &Claims {
                sub: Uuid::new_v4(),
                role: Role::Patient,
                iat: now - 3660,
                exp: now - 60,
            },
            "test-secret-with-at-least-32-characters!",
        );

        // Expired by less than the configured leeway: still accepted.
        assert!(service.verify(&token).is_ok());
    }
}
