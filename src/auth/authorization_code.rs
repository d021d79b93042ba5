use super::pkce::{PkceParams, CHALLENGE_METHOD};
use super::{request_token, AccessToken, AuthProvider, Credentials, IdentityProvider, TokenCache};
use crate::errors::AuthError;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::io;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Redirect target for native apps; the identity provider shows the code to the user.
pub const NATIVE_APP_REDIRECT_URL: &str = "https://auth.globus.org/v2/web/auth-code";

/// Out-of-band channel between the delegated flow and the operator.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Shows the consent URL to the operator.
    fn present(&self, authorization_url: &Url);

    /// Reads the authorization code the operator obtained from the consent page.
    async fn read_code(&self) -> io::Result<String>;
}

/// Prompt that prints the consent URL to stdout and reads the code from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl AuthorizationPrompt for TerminalPrompt {
    fn present(&self, authorization_url: &Url) {
        println!("Visit the URL for the auth dialog: {}", authorization_url);
        println!("Enter the authorization code:");
    }

    async fn read_code(&self) -> io::Result<String> {
        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(line)
    }
}

/// Authorization code (delegated user) authentication provider.
///
/// Acts on behalf of a user who granted consent in a browser. The code exchange is
/// bound to a PKCE verifier and requests offline access, so the provider holds a
/// refresh token and renews the access token without further interaction.
///
/// Refresh tokens rotated by the identity provider replace the stored one.
pub struct AuthorizationCodeProvider {
    identity: IdentityProvider,
    credentials: Credentials,
    scopes: Vec<String>,
    refresh_token: RwLock<Option<SecretString>>,
    cache: TokenCache,
    http_client: Client,
}

impl AuthorizationCodeProvider {
    /// Runs the interactive consent flow and exchanges the returned code.
    pub async fn authorize(
        identity: IdentityProvider,
        credentials: Credentials,
        scopes: Vec<String>,
        prompt: &dyn AuthorizationPrompt,
    ) -> Result<Self, AuthError> {
        let pkce = PkceParams::generate();
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();

        let url = Self::authorization_url(
            &identity,
            &credentials,
            &scopes,
            &pkce.code_challenge,
            &state,
        );
        prompt.present(&url);

        let code = prompt
            .read_code()
            .await
            .map_err(|e| AuthError::InputFailed(e.to_string()))?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::InputFailed(
                "no authorization code entered".to_string(),
            ));
        }

        let provider = Self::unauthorized(identity, credentials, scopes, None);
        provider.exchange_code(code, &pkce.code_verifier).await?;

        info!(client_id = %provider.credentials.client_id, "Delegated user authenticated");
        Ok(provider)
    }

    /// Resumes a delegated session from a previously issued refresh token.
    ///
    /// No request is made until the first token is needed.
    pub fn from_refresh_token(
        identity: IdentityProvider,
        credentials: Credentials,
        scopes: Vec<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self::unauthorized(
            identity,
            credentials,
            scopes,
            Some(SecretString::new(refresh_token.into())),
        )
    }

    fn unauthorized(
        identity: IdentityProvider,
        credentials: Credentials,
        scopes: Vec<String>,
        refresh_token: Option<SecretString>,
    ) -> Self {
        Self {
            identity,
            credentials,
            scopes,
            refresh_token: RwLock::new(refresh_token),
            cache: TokenCache::new(),
            http_client: Client::new(),
        }
    }

    /// Replaces the HTTP client used for token requests.
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Builds the consent URL the operator has to visit.
    pub fn authorization_url(
        identity: &IdentityProvider,
        credentials: &Credentials,
        scopes: &[String],
        code_challenge: &str,
        state: &str,
    ) -> Url {
        let mut url = identity.authorize_url().clone();
        url.query_pairs_mut()
            .append_pair("client_id", &credentials.client_id)
            .append_pair("redirect_uri", redirect_uri(credentials))
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("state", state)
            .append_pair("access_type", "offline")
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        url
    }

    /// Current refresh token, for callers that persist the session.
    pub async fn current_refresh_token(&self) -> Option<SecretString> {
        self.refresh_token.read().await.clone()
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<(), AuthError> {
        debug!(token_url = %self.identity.token_url(), "Exchanging authorization code");

        let form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri(&self.credentials).to_string()),
            ("code_verifier", code_verifier.to_string()),
        ];

        let grant = request_token(
            &self.http_client,
            self.identity.token_url(),
            &self.credentials,
            form,
        )
        .await
        .map_err(AuthError::CodeExchangeFailed)?;

        if grant.refresh_token.is_none() {
            warn!("Identity provider issued no refresh token; session ends when the access token expires");
        }
        *self.refresh_token.write().await = grant.refresh_token;
        self.cache.store(grant.access_token).await;
        Ok(())
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, AuthError> {
        let refresh_token = self
            .refresh_token
            .read()
            .await
            .as_ref()
            .map(|token| token.expose_secret().clone())
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token available".to_string()))?;

        debug!(token_url = %self.identity.token_url(), "Refreshing delegated access token");

        let form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token),
        ];

        let grant = request_token(
            &self.http_client,
            self.identity.token_url(),
            &self.credentials,
            form,
        )
        .await
        .map_err(AuthError::RefreshFailed)?;

        if let Some(rotated) = grant.refresh_token {
            *self.refresh_token.write().await = Some(rotated);
        }

        Ok(grant.access_token)
    }
}

fn redirect_uri(credentials: &Credentials) -> &str {
    credentials
        .redirect_url
        .as_deref()
        .unwrap_or(NATIVE_APP_REDIRECT_URL)
}

#[async_trait]
impl AuthProvider for AuthorizationCodeProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.get_or_refresh(|| self.refresh_access_token()).await
    }

    async fn refresh_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.force_refresh(|| self.refresh_access_token()).await
    }

    fn is_expired(&self) -> bool {
        self.cache.is_expired()
    }
}
