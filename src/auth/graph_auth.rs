use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use log::{info, warn};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use url::Url;

use crate::remote::{Authenticator, Credentials, LoginOutcome};

/// Redirect URI for public clients; the user copies the code from it
const REDIRECT_URI: &str = "https://login.microsoftonline.com/common/oauth2/nativeclient";

/// OAuth scopes for drive access
const SCOPES: &str = "https://graph.microsoft.com/User.Read https://graph.microsoft.com/Files.ReadWrite offline_access";

/// Identity provider base URL, tenant and endpoint are appended
const LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// Token refresh buffer time in seconds (refresh 5 minutes before expiry)
const TOKEN_REFRESH_BUFFER_SECS: u64 = 300;

/// PKCE code verifier length
const PKCE_CODE_VERIFIER_LENGTH: usize = 128;

/// PKCE character set
const PKCE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// AADSTS codes meaning the password grant needs a second factor
const MFA_ERROR_CODES: &[u64] = &[50072, 50074, 50076, 50079, 50158];

/// Token response from the identity provider
#[derive(Debug, Serialize, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
    token_type: String,
}

/// Error body of a rejected token request
#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
    #[serde(default)]
    error_codes: Vec<u64>,
}

impl TokenErrorResponse {
    fn requires_second_factor(&self) -> bool {
        self.error == "interaction_required"
            || self.error_codes.iter().any(|c| MFA_ERROR_CODES.contains(c))
    }
}

#[derive(Debug, Clone)]
struct TokenSet {
    access_token: String,
    refresh_token: String,
    expires_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Microsoft identity platform authentication for the Graph drive.
///
/// Tokens only live in memory for the lifetime of the mount.
pub struct GraphAuth {
    client: Client,
    runtime: Handle,
    client_id: String,
    tenant: String,
    tokens: Mutex<Option<TokenSet>>,
    pending_verifier: Mutex<Option<String>>,
}

impl GraphAuth {
    pub fn new(client_id: &str, tenant: &str, runtime: Handle) -> Self {
        Self {
            client: Client::new(),
            runtime,
            client_id: client_id.to_string(),
            tenant: tenant.to_string(),
            tokens: Mutex::new(None),
            pending_verifier: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", LOGIN_BASE, self.tenant)
    }

    /// Generate PKCE code verifier and challenge
    fn generate_pkce() -> (String, String) {
        let mut rng = rand::rng();
        let code_verifier: String = (0..PKCE_CODE_VERIFIER_LENGTH)
            .map(|_| PKCE_CHARS[rng.random_range(0..PKCE_CHARS.len())] as char)
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(code_verifier.as_bytes());
        let code_challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        (code_verifier, code_challenge)
    }

    /// Build the authorization URL used for the second-factor sign in
    fn build_auth_url(&self, code_challenge: &str, login_hint: &str) -> Result<Url> {
        let mut auth_url = Url::parse(&format!(
            "{}/{}/oauth2/v2.0/authorize",
            LOGIN_BASE, self.tenant
        ))?;
        auth_url
            .query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", REDIRECT_URI)
            .append_pair("scope", SCOPES)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("response_mode", "query")
            .append_pair("login_hint", login_hint);

        Ok(auth_url)
    }

    /// Accepts either the bare code or the whole redirect URL it was copied from
    fn extract_authorization_code(input: &str) -> String {
        let input = input.trim();
        Url::parse(input)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == "code")
                    .map(|(_, value)| value.to_string())
            })
            .unwrap_or_else(|| input.to_string())
    }

    fn build_password_params(&self, credentials: &Credentials) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.clone());
        params.insert("scope", SCOPES.to_string());
        params.insert("grant_type", "password".to_string());
        params.insert("username", credentials.username.clone());
        params.insert("password", credentials.password.clone());
        params
    }

    fn build_token_exchange_params(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.clone());
        params.insert("code", code.to_string());
        params.insert("redirect_uri", REDIRECT_URI.to_string());
        params.insert("grant_type", "authorization_code".to_string());
        params.insert("code_verifier", code_verifier.to_string());
        params
    }

    fn build_refresh_token_params(&self, refresh_token: &str) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.clone());
        params.insert("scope", SCOPES.to_string());
        params.insert("refresh_token", refresh_token.to_string());
        params.insert("grant_type", "refresh_token".to_string());
        params
    }

    /// Posts a token request. `Err(TokenErrorResponse)` carries a rejection from
    /// the identity provider, transport failures are the outer error.
    async fn request_tokens(
        &self,
        params: &HashMap<&'static str, String>,
    ) -> Result<std::result::Result<TokenResponse, TokenErrorResponse>> {
        let response = self
            .client
            .post(self.token_url())
            .form(params)
            .send()
            .await
            .context("Failed to send token request")?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            let rejection = serde_json::from_str::<TokenErrorResponse>(&error_text)
                .unwrap_or_else(|_| TokenErrorResponse {
                    error_description: error_text,
                    ..Default::default()
                });
            return Ok(Err(rejection));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        Ok(Ok(token_response))
    }

    fn store_tokens(&self, tokens: TokenResponse, previous_refresh: Option<String>) -> TokenSet {
        let set = TokenSet {
            access_token: tokens.access_token,
            refresh_token: tokens
                .refresh_token
                .or(previous_refresh)
                .unwrap_or_default(),
            expires_at: now_secs() + tokens.expires_in,
        };
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = Some(set.clone());
        set
    }

    fn is_token_expired(tokens: &TokenSet) -> bool {
        now_secs() + TOKEN_REFRESH_BUFFER_SECS >= tokens.expires_at
    }

    /// Refresh access token using refresh token
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenSet> {
        let params = self.build_refresh_token_params(refresh_token);
        match self.request_tokens(&params).await? {
            Ok(tokens) => Ok(self.store_tokens(tokens, Some(refresh_token.to_string()))),
            Err(rejection) => Err(anyhow!(
                "Token refresh failed: {} {}",
                rejection.error,
                rejection.error_description
            )),
        }
    }

    /// Get valid access token (refresh if needed)
    pub async fn get_valid_token(&self) -> Result<String> {
        let current = self
            .tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| anyhow!("Not authenticated"))?;

        if Self::is_token_expired(&current) {
            warn!("Token expired, refreshing...");
            let refreshed = self.refresh_tokens(&current.refresh_token).await?;
            Ok(refreshed.access_token)
        } else {
            Ok(current.access_token)
        }
    }

    /// Get authorization header with valid token
    pub async fn auth_header(&self) -> Result<String> {
        let token = self
            .get_valid_token()
            .await
            .context("Failed to get valid token")?;
        Ok(format!("Bearer {}", token))
    }

    async fn authenticate_async(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let params = self.build_password_params(credentials);
        match self.request_tokens(&params).await? {
            Ok(tokens) => {
                self.store_tokens(tokens, None);
                info!("Authenticated as {}", credentials.username);
                Ok(LoginOutcome::Authenticated)
            }
            Err(rejection) if rejection.requires_second_factor() => {
                let (code_verifier, code_challenge) = Self::generate_pkce();
                let auth_url = self.build_auth_url(&code_challenge, &credentials.username)?;
                *self
                    .pending_verifier
                    .lock()
                    .map_err(|_| anyhow!("Verifier lock poisoned"))? = Some(code_verifier);

                info!("Second factor required, opening browser for sign in");
                if let Err(e) = webbrowser::open(auth_url.as_str()) {
                    warn!("Failed to open browser: {}", e);
                }
                Ok(LoginOutcome::ChallengeRequired {
                    prompt: format!(
                        "Sign in at {} and paste the code from the page you are redirected to",
                        auth_url
                    ),
                })
            }
            Err(rejection) => Err(anyhow!(
                "Authentication failed: {} {}",
                rejection.error,
                rejection.error_description
            )),
        }
    }

    async fn validate_challenge_async(&self, input: &str) -> Result<bool> {
        let code_verifier = self
            .pending_verifier
            .lock()
            .map_err(|_| anyhow!("Verifier lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("No authentication challenge is pending"))?;

        let code = Self::extract_authorization_code(input);
        let params = self.build_token_exchange_params(&code, &code_verifier);
        match self.request_tokens(&params).await? {
            Ok(tokens) => {
                self.store_tokens(tokens, None);
                info!("Second factor accepted");
                Ok(true)
            }
            Err(rejection) => {
                warn!(
                    "Code rejected: {} {}",
                    rejection.error, rejection.error_description
                );
                Ok(false)
            }
        }
    }
}

impl Authenticator for GraphAuth {
    fn authenticate(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        self.runtime.block_on(self.authenticate_async(credentials))
    }

    fn validate_challenge(&self, code: &str) -> Result<bool> {
        self.runtime.block_on(self.validate_challenge_async(code))
    }
}
