//! Bearer-token identity.
//!
//! The identity provider issues HS256 tokens carrying the caller's id, email
//! and numeric role. [`JwtAuthenticator`] verifies them and turns the claims
//! into an [`Actor`]; a missing, malformed or expired token, or a role outside
//! the known set, is [`LendingError::Unauthorized`].

use asset_lending_core::error::LendingError;
use asset_lending_core::types::{Actor, Role, UserId};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolves a bearer token to a verified caller.
pub trait Authenticator: Send + Sync {
    /// Verify `token` and return the caller it identifies.
    ///
    /// # Errors
    ///
    /// [`LendingError::Unauthorized`] for any token that does not verify.
    fn authenticate(&self, token: &str) -> Result<Actor, LendingError>;
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: i64,
    /// Email
    pub email: String,
    /// Role: 1 admin, 2 employee, 3 manager
    pub id_role: i64,
    /// Expiration (unix timestamp)
    pub exp: i64,
}

/// HS256 token verifier and issuer.
#[derive(Clone)]
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthenticator {
    /// Create an authenticator with an HMAC secret and token lifetime.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl,
        }
    }

    /// Mint a token for `actor`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if signing fails.
    pub fn issue(&self, actor: &Actor) -> jsonwebtoken::errors::Result<String> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        self.issue_claims(&Claims {
            id: actor.user_id.get(),
            email: actor.email.clone(),
            id_role: actor.role.code(),
            exp: Utc::now().timestamp().saturating_add(ttl),
        })
    }

    /// Sign arbitrary claims.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if signing fails.
    pub fn issue_claims(&self, claims: &Claims) -> jsonwebtoken::errors::Result<String> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key)
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Actor, LendingError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| {
                tracing::debug!(%error, "Token rejected");
                LendingError::Unauthorized
            })?;

        if claims.id <= 0 {
            return Err(LendingError::Unauthorized);
        }
        let role = Role::try_from(claims.id_role)?;

        Ok(Actor {
            user_id: UserId::new(claims.id),
            email: claims.email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn authenticator() -> JwtAuthenticator {
        JwtAuthenticator::new("test-secret", Duration::from_secs(3600))
    }

    fn actor(role: Role) -> Actor {
        Actor {
            user_id: UserId::new(7),
            email: "rina@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn issue_and_authenticate() {
        let auth = authenticator();
        let token = auth.issue(&actor(Role::Manager)).unwrap();
        assert_eq!(auth.authenticate(&token), Ok(actor(Role::Manager)));
    }

    #[test]
    fn unknown_role_claim_is_unauthorized() {
        let auth = authenticator();
        let token = auth
            .issue_claims(&Claims {
                id: 7,
                email: "x@example.com".to_string(),
                id_role: 9,
                exp: Utc::now().timestamp() + 60,
            })
            .unwrap();
        assert_eq!(auth.authenticate(&token), Err(LendingError::Unauthorized));
    }

    #[test]
    fn wrong_secret_and_garbage_are_unauthorized() {
        let token = JwtAuthenticator::new("other", Duration::from_secs(60))
            .issue(&actor(Role::Admin))
            .unwrap();
        assert_eq!(
            authenticator().authenticate(&token),
            Err(LendingError::Unauthorized)
        );
        assert_eq!(
            authenticator().authenticate("not.a.token"),
            Err(LendingError::Unauthorized)
        );
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let auth = authenticator();
        let token = auth
            .issue_claims(&Claims {
                id: 7,
                email: "x@example.com".to_string(),
                id_role: 1,
                exp: Utc::now().timestamp() - 600,
            })
            .unwrap();
        assert_eq!(auth.authenticate(&token), Err(LendingError::Unauthorized));
    }
}
