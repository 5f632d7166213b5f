//! Identity provider integration: Firebase ID token verification.
//!
//! Requests carry a bearer ID token issued by Firebase Auth. Tokens are RS256
//! JWTs signed with Google's securetoken keys, published as a JWKS; we verify
//! the signature locally and pin audience/issuer to the configured project.
//!
//! When FIREBASE_PROJECT_ID is not set, verification degrades to a fixed
//! development identity. This disables authentication entirely and is only
//! acceptable for local development; main() warns loudly when it happens.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed identity used when no provider is configured.
pub const DEV_USER_ID: &str = "dev-user";

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Debug)]
pub enum IdentityError {
    InvalidToken,
    Expired,
    KeyFetch(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::InvalidToken => write!(f, "Invalid token"),
            IdentityError::Expired => write!(f, "Token expired"),
            IdentityError::KeyFetch(e) => write!(f, "Key fetch failed: {}", e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies bearer ID tokens against the identity provider, or hands out the
/// fixed development identity when no provider is configured.
#[derive(Clone)]
pub enum IdentityProvider {
    Firebase(FirebaseVerifier),
    Development,
}

impl IdentityProvider {
    /// Build from FIREBASE_PROJECT_ID. None configured means development mode.
    pub fn from_env() -> Self {
        match std::env::var("FIREBASE_PROJECT_ID") {
            Ok(project_id) if !project_id.is_empty() => {
                IdentityProvider::Firebase(FirebaseVerifier::new(&project_id))
            }
            _ => IdentityProvider::Development,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, IdentityProvider::Development)
    }

    /// Resolve the requesting user's id from an optional bearer token.
    /// Development mode ignores the token entirely.
    pub async fn verify(&self, token: Option<&str>) -> Result<String, IdentityError> {
        match self {
            IdentityProvider::Development => Ok(DEV_USER_ID.to_string()),
            IdentityProvider::Firebase(verifier) => {
                let token = token.ok_or(IdentityError::InvalidToken)?;
                verifier.verify(token).await
            }
        }
    }
}

/// RS256 verification against Google's securetoken JWKS. Keys are cached in
/// memory and refetched when a token arrives signed with an unknown kid
/// (Google rotates the set every few days).
#[derive(Clone)]
pub struct FirebaseVerifier {
    project_id: String,
    http: reqwest::Client,
    keys: Arc<RwLock<HashMap<String, (String, String)>>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            http: reqwest::Client::new(),
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn refresh_keys(&self) -> Result<(), IdentityError> {
        let jwks: JwkSet = self
            .http
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityError::KeyFetch(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();
        for jwk in jwks.keys {
            keys.insert(jwk.kid, (jwk.n, jwk.e));
        }
        Ok(())
    }

    async fn key_components(&self, kid: &str) -> Result<(String, String), IdentityError> {
        if let Some(components) = self.keys.read().await.get(kid) {
            return Ok(components.clone());
        }

        self.refresh_keys().await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or(IdentityError::InvalidToken)
    }

    pub async fn verify(&self, token: &str) -> Result<String, IdentityError> {
        let header = decode_header(token).map_err(|_| IdentityError::InvalidToken)?;
        let kid = header.kid.ok_or(IdentityError::InvalidToken)?;

        let (n, e) = self.key_components(&kid).await?;
        let key =
            DecodingKey::from_rsa_components(&n, &e).map_err(|_| IdentityError::InvalidToken)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::Expired,
            _ => IdentityError::InvalidToken,
        })?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn development_mode_ignores_tokens() {
        let provider = IdentityProvider::Development;
        assert_eq!(provider.verify(None).await.unwrap(), DEV_USER_ID);
        assert_eq!(provider.verify(Some("garbage")).await.unwrap(), DEV_USER_ID);
    }

    #[tokio::test]
    async fn firebase_mode_requires_a_token() {
        let provider = IdentityProvider::Firebase(FirebaseVerifier::new("memo-test"));
        assert!(matches!(
            provider.verify(None).await,
            Err(IdentityError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_key_fetch() {
        let verifier = FirebaseVerifier::new("memo-test");
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(IdentityError::InvalidToken)
        ));
    }
}
