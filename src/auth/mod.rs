//! Authentication providers for the Transfer API.
//!
//! Two mutually exclusive strategies produce the same [`AuthProvider`] capability:
//!
//! - [`ClientCredentialsProvider`]: the client authenticates as itself (service identity).
//! - [`AuthorizationCodeProvider`]: the client acts for a user who grants consent
//!   through a browser (authorization code + PKCE).
//!
//! [`authenticate`] picks one of them from an [`AuthMode`] and returns an
//! [`Authenticator`]; everything downstream only sees the [`AuthProvider`] trait.
//!
//! # Example
//!
//! ```no_run
//! use integrations_globus_transfer::auth::{authenticate, AuthMode, Credentials, IdentityProvider};
//! use integrations_globus_transfer::auth::scopes::compose_transfer_scopes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scopes = compose_transfer_scopes(["source-collection-id", "dest-collection-id"]);
//! let credentials = Credentials::new("client-id").with_secret("client-secret");
//!
//! let provider = authenticate(
//!     &IdentityProvider::default(),
//!     AuthMode::ServiceIdentity,
//!     credentials,
//!     scopes,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

mod authorization_code;
mod client_credentials;
pub mod pkce;
pub mod scopes;

pub use authorization_code::{
    AuthorizationCodeProvider, AuthorizationPrompt, TerminalPrompt, NATIVE_APP_REDIRECT_URL,
};
pub use client_credentials::ClientCredentialsProvider;

use crate::config::DEFAULT_AUTH_BASE_URL;
use crate::errors::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use url::Url;

/// Token expiry buffer (5 minutes) - refresh tokens proactively before expiry.
pub const TOKEN_EXPIRY_BUFFER_SECONDS: i64 = 300;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Authentication provider abstraction.
///
/// Implementations own a token cache that is safe to use from many tasks at once;
/// refreshing an expired token is the provider's job, never the caller's.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get an access token for API requests, refreshing it if needed.
    async fn get_access_token(&self) -> Result<AccessToken, AuthError>;

    /// Force refresh the access token.
    async fn refresh_token(&self) -> Result<AccessToken, AuthError>;

    /// Check if the current token is expired.
    fn is_expired(&self) -> bool;
}

/// Access token with metadata.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The token string.
    pub token: SecretString,

    /// Token type (usually "Bearer").
    pub token_type: String,

    /// Expiration time.
    pub expires_at: DateTime<Utc>,

    /// Scopes granted.
    pub scopes: Vec<String>,
}

impl AccessToken {
    /// Creates a new access token.
    pub fn new(
        token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            token: SecretString::new(token.into()),
            token_type: token_type.into(),
            expires_at,
            scopes,
        }
    }

    /// Checks if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Checks if the token needs proactive refresh (within 5 minutes of expiry).
    pub fn needs_refresh(&self) -> bool {
        self.expires_at
            .checked_sub_signed(Duration::seconds(TOKEN_EXPIRY_BUFFER_SECONDS))
            .map_or(true, |threshold| Utc::now() >= threshold)
    }

    /// Returns the authorization header value.
    ///
    /// The scheme is always `Bearer`; identity providers report the type in varying case.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

/// Identity provider endpoints.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    token_url: Url,
    authorize_url: Url,
}

impl IdentityProvider {
    /// Derives the endpoints from a versioned base URL such as `https://auth.globus.org/v2/`.
    pub fn new(base_url: Url) -> Self {
        let base_path = base_url.path().trim_end_matches('/').to_string();

        let mut token_url = base_url.clone();
        token_url.set_path(&format!("{}/oauth2/token", base_path));

        let mut authorize_url = base_url;
        authorize_url.set_path(&format!("{}/oauth2/authorize", base_path));

        Self {
            token_url,
            authorize_url,
        }
    }

    /// Token endpoint (client credentials, authorization code and refresh grants).
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Authorize endpoint the operator visits to grant consent.
    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_AUTH_BASE_URL).expect("Invalid default auth base URL"))
    }
}

/// Client credentials registered with the identity provider.
#[derive(Clone)]
pub struct Credentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret. Native (thick) clients may not have one.
    pub client_secret: Option<SecretString>,
    /// Redirect target for the delegated flow.
    pub redirect_url: Option<String>,
}

impl Credentials {
    /// Creates credentials for a client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_url: None,
        }
    }

    /// Sets the client secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Sets the redirect URL used by the delegated flow.
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// How the caller authenticates.
#[derive(Clone)]
pub enum AuthMode {
    /// Two-legged: the client authenticates as itself.
    ServiceIdentity,
    /// Three-legged: the operator visits a consent URL and pastes back a code.
    DelegatedUser {
        /// Channel used to show the consent URL and read the code.
        prompt: Arc<dyn AuthorizationPrompt>,
    },
}

impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::ServiceIdentity => write!(f, "ServiceIdentity"),
            AuthMode::DelegatedUser { .. } => write!(f, "DelegatedUser"),
        }
    }
}

/// Provider produced by [`authenticate`].
pub enum Authenticator {
    /// Client credentials grant.
    ServiceIdentity(ClientCredentialsProvider),
    /// Authorization code grant with refresh.
    DelegatedUser(AuthorizationCodeProvider),
}

impl Authenticator {
    /// Short name of the strategy, for logs.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Authenticator::ServiceIdentity(_) => "service_identity",
            Authenticator::DelegatedUser(_) => "delegated_user",
        }
    }
}

#[async_trait]
impl AuthProvider for Authenticator {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        match self {
            Authenticator::ServiceIdentity(p) => p.get_access_token().await,
            Authenticator::DelegatedUser(p) => p.get_access_token().await,
        }
    }

    async fn refresh_token(&self) -> Result<AccessToken, AuthError> {
        match self {
            Authenticator::ServiceIdentity(p) => p.refresh_token().await,
            Authenticator::DelegatedUser(p) => p.refresh_token().await,
        }
    }

    fn is_expired(&self) -> bool {
        match self {
            Authenticator::ServiceIdentity(p) => p.is_expired(),
            Authenticator::DelegatedUser(p) => p.is_expired(),
        }
    }
}

/// Authenticates with the selected strategy and returns a ready provider.
///
/// Both strategies acquire a token before returning, so bad credentials or scopes
/// fail here rather than on the first API call.
pub async fn authenticate(
    identity: &IdentityProvider,
    mode: AuthMode,
    credentials: Credentials,
    scopes: Vec<String>,
) -> Result<Authenticator, AuthError> {
    debug!(client_id = %credentials.client_id, mode = ?mode, scopes = scopes.len(), "Authenticating");

    let authenticator = match mode {
        AuthMode::ServiceIdentity => {
            ClientCredentialsProvider::connect(identity.clone(), credentials, scopes)
                .await
                .map(Authenticator::ServiceIdentity)?
        }
        AuthMode::DelegatedUser { prompt } => AuthorizationCodeProvider::authorize(
            identity.clone(),
            credentials,
            scopes,
            prompt.as_ref(),
        )
        .await
        .map(Authenticator::DelegatedUser)?,
    };

    debug!(mode = authenticator.mode_name(), "Authenticator ready");
    Ok(authenticator)
}

/// Provider wrapping a pre-issued bearer token. It never refreshes.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a provider for a token with no known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, "Bearer", DateTime::<Utc>::MAX_UTC, Vec::new()),
        }
    }

    /// Creates a provider from a token with explicit metadata.
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        if self.token.is_expired() {
            return Err(AuthError::RefreshFailed(
                "static token expired and cannot be refreshed".to_string(),
            ));
        }
        Ok(self.token.clone())
    }

    async fn refresh_token(&self) -> Result<AccessToken, AuthError> {
        self.get_access_token().await
    }

    fn is_expired(&self) -> bool {
        self.token.is_expired()
    }
}

/// Cached token shared by the grant-based providers.
///
/// Reads go through the `RwLock`; refreshes are serialized by `refresh_lock` and
/// re-check the cache so concurrent callers trigger a single token request.
pub(crate) struct TokenCache {
    cached: RwLock<Option<AccessToken>>,
    refresh_lock: Mutex<()>,
}

impl TokenCache {
    pub(crate) fn new() -> Self {
        Self {
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    async fn fresh(&self) -> Option<AccessToken> {
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|token| !token.needs_refresh())
            .cloned()
    }

    pub(crate) async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, AuthError>>,
    {
        if let Some(token) = self.fresh().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.fresh().await {
            return Ok(token);
        }

        let token = refresh().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    pub(crate) async fn force_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, AuthError>>,
    {
        let _guard = self.refresh_lock.lock().await;
        let token = refresh().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    pub(crate) async fn store(&self, token: AccessToken) {
        *self.cached.write().await = Some(token);
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.cached
            .try_read()
            .map(|cached| cached.as_ref().map_or(true, AccessToken::is_expired))
            .unwrap_or(false)
    }
}

/// Expiry of a token issued at `now` with a lifetime of `expires_in` seconds.
///
/// Non-positive lifetimes expire at once; lifetimes past chrono's range saturate to the
/// latest representable instant.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    if expires_in <= 0 {
        return now;
    }
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Tokens returned by a successful grant.
pub(crate) struct TokenGrant {
    pub(crate) access_token: AccessToken,
    pub(crate) refresh_token: Option<SecretString>,
}

/// Posts a form-encoded grant to the token endpoint.
///
/// Confidential clients authenticate with HTTP Basic; clients without a secret send
/// their id in the form body. Errors are returned as plain messages so each flow can
/// wrap them in its own [`AuthError`] variant.
pub(crate) async fn request_token(
    http_client: &Client,
    token_url: &Url,
    credentials: &Credentials,
    mut form: Vec<(&'static str, String)>,
) -> Result<TokenGrant, String> {
    #[derive(Deserialize)]
    struct TokenResponse {
        access_token: String,
        #[serde(default = "default_token_type")]
        token_type: String,
        expires_in: Option<i64>,
        scope: Option<String>,
        refresh_token: Option<String>,
        resource_server: Option<String>,
    }

    fn default_token_type() -> String {
        "Bearer".to_string()
    }

    let mut request = http_client
        .post(token_url.clone())
        .header(reqwest::header::ACCEPT, "application/json");

    match &credentials.client_secret {
        Some(secret) => {
            request = request.basic_auth(&credentials.client_id, Some(secret.expose_secret()));
        }
        None => form.push(("client_id", credentials.client_id.clone())),
    }

    let response = request
        .form(&form)
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(format!("token endpoint returned {}: {}", status, text));
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse token response: {}", e))?;

    let expires_at = token_expiry(
        Utc::now(),
        token_response
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS),
    );
    let scopes = token_response
        .scope
        .map(|s| s.split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    debug!(
        resource_server = token_response.resource_server.as_deref().unwrap_or("unknown"),
        expires_at = %expires_at,
        "Token acquired"
    );

    Ok(TokenGrant {
        access_token: AccessToken::new(
            token_response.access_token,
            token_response.token_type,
            expires_at,
            scopes,
        ),
        refresh_token: token_response.refresh_token.map(SecretString::new),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_saturates() {
        let now = Utc::now();
        assert_eq!(token_expiry(now, 3600), now + Duration::hours(1));
        assert_eq!(token_expiry(now, 9_000_000_000_000_000), DateTime::<Utc>::MAX_UTC);
        assert_eq!(token_expiry(now, i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(token_expiry(now, -5), now);
    }

    #[test]
    fn test_access_token_expiry() {
        let expires_at = Utc::now() + Duration::hours(1);
        let token = AccessToken::new("test_token", "Bearer", expires_at, vec![]);
        assert!(!token.is_expired());

        let expired = Utc::now() - Duration::hours(1);
        let token = AccessToken::new("test_token", "Bearer", expired, vec![]);
        assert!(token.is_expired());
    }

    #[test]
    fn test_access_token_needs_refresh() {
        let expires_at = Utc::now() + Duration::hours(1);
        let token = AccessToken::new("test_token", "Bearer", expires_at, vec![]);
        assert!(!token.needs_refresh());

        // Inside the 5 minute buffer
        let expires_soon = Utc::now() + Duration::minutes(4);
        let token = AccessToken::new("test_token", "Bearer", expires_soon, vec![]);
        assert!(token.needs_refresh());
    }

    #[test]
    fn test_authorization_header() {
        let expires_at = Utc::now() + Duration::hours(1);
        let token = AccessToken::new("test_token", "bearer", expires_at, vec![]);
        assert_eq!(token.authorization_header(), "Bearer test_token");
    }

    #[test]
    fn test_identity_provider_custom_base() {
        let idp = IdentityProvider::new(Url::parse("http://127.0.0.1:9000/v2").unwrap());
        assert_eq!(idp.token_url().as_str(), "http://127.0.0.1:9000/v2/oauth2/token");
        assert_eq!(
            idp.authorize_url().as_str(),
            "http://127.0.0.1:9000/v2/oauth2/authorize"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::new("client").with_secret("hunter2");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_static_token_provider() {
        let provider = StaticTokenProvider::new("abc");
        let token = provider.get_access_token().await.unwrap();
        assert_eq!(token.authorization_header(), "Bearer abc");
        assert!(!provider.is_expired());
    }

    #[tokio::test]
    async fn test_token_cache_reuses_fresh_token() {
        let cache = TokenCache::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);

        for _ in 0..3 {
            let token = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(AccessToken::new(
                        "t",
                        "Bearer",
                        Utc::now() + Duration::hours(1),
                        vec![],
                    ))
                })
                .await
                .unwrap();
            assert_eq!(token.token.expose_secret(), "t");
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_cache_refreshes_stale_token() {
        let cache = TokenCache::new();
        cache
            .store(AccessToken::new(
                "old",
                "Bearer",
                Utc::now() + Duration::minutes(1),
                vec![],
            ))
            .await;

        let token = cache
            .get_or_refresh(|| async {
                Ok(AccessToken::new(
                    "new",
                    "Bearer",
                    Utc::now() + Duration::hours(1),
                    vec![],
                ))
            })
            .await
            .unwrap();

        assert_eq!(token.token.expose_secret(), "new");
    }
}
