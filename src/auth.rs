//! Service account authentication for the Drive API.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{DriveError, Result};
use crate::models::{Credentials, TokenResponse};

/// Default Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Fixed permission scope: full read/write access to Drive.
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Source of bearer tokens for Drive API requests. The seam between the
/// storage facade and the authentication collaborator.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    async fn access_token(&self) -> Result<String>;
}

/// JWT claims for the service-account assertion.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // OAuth scope
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
}

/// Cached access token with expiration.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

/// Authenticator implementing the service-account JWT flow.
///
/// Construction never fails; malformed key material surfaces as an error
/// on the first operation that needs a token.
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Arc<Credentials>,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Create an authenticator from a service-account JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let credentials: Credentials = serde_json::from_str(&content)?;
        Ok(Self::new(credentials))
    }

    /// Create an authenticator from in-memory credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    fn token_uri(&self) -> &str {
        self.credentials.token_uri.as_deref().unwrap_or(TOKEN_URI)
    }

    /// Get a valid access token, refreshing if necessary.
    async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                // 60 second buffer before expiration
                let buffer = Duration::from_secs(60);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.refresh_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    /// Exchange a signed JWT assertion for an access token.
    async fn refresh_token(&self) -> Result<CachedToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DriveError::TokenRefresh(e.to_string()))?
            .as_secs();

        let claims = Claims {
            iss: self.credentials.client_email.clone(),
            scope: DRIVE_SCOPE.to_string(),
            aud: self.token_uri().to_string(),
            iat: now,
            exp: now + 3600, // 1 hour
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        let jwt = encode(&header, &claims, &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        let response = self.client.post(self.token_uri()).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenRefresh(format!(
                "status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}

impl TokenSource for Authenticator {
    async fn access_token(&self) -> Result<String> {
        self.get_access_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            client_email: "svc@project.iam.gserviceaccount.com".to_string(),
            private_key: "not-a-real-key".to_string(),
            token_uri: None,
        }
    }

    #[test]
    fn test_claims_serialization() {
        let claims = Claims {
            iss: "svc@project.iam.gserviceaccount.com".to_string(),
            scope: DRIVE_SCOPE.to_string(),
            aud: TOKEN_URI.to_string(),
            iat: 1234567890,
            exp: 1234571490,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("svc@project.iam.gserviceaccount.com"));
        assert!(json.contains(DRIVE_SCOPE));
    }

    #[test]
    fn test_default_token_uri() {
        let auth = Authenticator::new(credentials());
        assert_eq!(auth.token_uri(), TOKEN_URI);
    }

    #[test]
    fn test_token_uri_override() {
        let mut creds = credentials();
        creds.token_uri = Some("http://localhost:9999/token".to_string());
        let auth = Authenticator::new(creds);
        assert_eq!(auth.token_uri(), "http://localhost:9999/token");
    }

    #[tokio::test]
    async fn test_malformed_key_surfaces_lazily() {
        // Construction accepts garbage key material; the failure appears
        // on first token use.
        let auth = Authenticator::new(credentials());
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, DriveError::Jwt(_)));
    }
}
