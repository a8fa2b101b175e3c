//! Sign-in against the Microsoft identity platform.
//!
//! [`IdentitySession`] is created once per process and passed to whatever
//! needs a token. Tokens are acquired silently from the cache (refreshing
//! when needed) and fall back to the browser authorization code flow with
//! PKCE when the identity platform asks for user interaction.

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::{GraphError, GraphResult};
use crate::pkce::PkceChallenge;
use crate::session::{AccessToken, AccountInfo, CachedSession, TokenCache};
use crate::types::{TokenErrorResponse, TokenResponse};

pub const LOGIN_SCOPES: &[&str] = &["User.Read", "Calendars.Read", "Calendars.Read.Shared"];
pub const DIRECTORY_SCOPES: &[&str] = &["User.Read", "User.ReadBasic.All"];
pub const INVITE_SCOPES: &[&str] = &["Calendars.ReadWrite"];

/// Added to every request so we get an id token and a refresh token.
const OIDC_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

/// Shows the authorization page to the user and waits for the redirect.
#[async_trait]
pub trait Interaction: Send + Sync {
    async fn authorize(&self, authorize_url: &Url) -> GraphResult<AuthorizationResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready { account: Option<AccountInfo> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Acquired(AccessToken),
    NeedsInteraction,
    Failed(String),
}

/// `prompt` parameter of the authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Consent,
    SelectAccount,
}

impl Prompt {
    fn as_str(self) -> &'static str {
        match self {
            Prompt::Consent => "consent",
            Prompt::SelectAccount => "select_account",
        }
    }
}

enum TokenReply {
    Granted(TokenResponse),
    Rejected(TokenErrorResponse),
}

impl TokenErrorResponse {
    fn reason(&self) -> String {
        self.error_description
            .clone()
            .unwrap_or_else(|| self.error.clone())
    }
}

fn scope_param(scopes: &[&str]) -> String {
    let mut all: Vec<&str> = scopes.to_vec();
    for scope in OIDC_SCOPES {
        if !all.contains(scope) {
            all.push(scope);
        }
    }
    all.join(" ")
}

fn owned_scopes(scopes: &[&str]) -> Vec<String> {
    scopes.iter().map(|s| s.to_string()).collect()
}

pub struct IdentitySession {
    config: AppConfig,
    cache: TokenCache,
    interaction: Box<dyn Interaction>,
    http: reqwest::Client,
    state: SessionState,
}

impl IdentitySession {
    pub fn new(config: AppConfig, cache: TokenCache, interaction: Box<dyn Interaction>) -> Self {
        Self {
            config,
            cache,
            interaction,
            http: reqwest::Client::new(),
            state: SessionState::Uninitialized,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn account(&self) -> Option<&AccountInfo> {
        match &self.state {
            SessionState::Ready { account } => account.as_ref(),
            _ => None,
        }
    }

    /// Restore the first cached account. Only the first call does any work.
    pub fn initialize(&mut self) -> GraphResult<&SessionState> {
        if self.state != SessionState::Uninitialized {
            return Ok(&self.state);
        }

        self.state = SessionState::Initializing;
        match self.cache.first_account() {
            Ok(account) => {
                match &account {
                    Some(account) => debug!(username = %account.username, "Restored cached account"),
                    None => debug!("No cached account"),
                }
                self.state = SessionState::Ready { account };
                Ok(&self.state)
            }
            Err(e) => {
                self.state = SessionState::Uninitialized;
                Err(e)
            }
        }
    }

    /// Interactive sign-in with explicit consent for the calendar read scopes.
    pub async fn login(&mut self) -> GraphResult<AccountInfo> {
        self.acquire_token_interactive(LOGIN_SCOPES, Some(Prompt::Consent))
            .await?;
        self.account().cloned().ok_or(GraphError::NotSignedIn)
    }

    /// Forget the current account and its cached tokens.
    pub fn logout(&mut self) -> GraphResult<Option<AccountInfo>> {
        let account = self.account().cloned();
        if let Some(account) = &account {
            self.cache.remove(&account.username)?;
            info!(username = %account.username, "Signed out");
        }
        self.state = SessionState::Ready { account: None };
        Ok(account)
    }

    /// A cached token covering `scopes`, or a refreshed one. Never prompts.
    pub async fn acquire_token_silent(&self, scopes: &[&str]) -> TokenOutcome {
        let Some(account) = self.account() else {
            return TokenOutcome::NeedsInteraction;
        };

        let mut session = match self.cache.load(&account.username) {
            Ok(Some(session)) => session,
            Ok(None) => return TokenOutcome::NeedsInteraction,
            Err(e) => return TokenOutcome::Failed(e.to_string()),
        };

        if let Some(token) = session.token_for(scopes) {
            debug!(?scopes, "Using cached access token");
            return TokenOutcome::Acquired(token.clone());
        }
        if session.refresh_token.is_empty() {
            return TokenOutcome::NeedsInteraction;
        }

        let scope = scope_param(scopes);
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
            ("scope", scope.as_str()),
        ];

        match self.request_token(&form).await {
            Ok(TokenReply::Granted(reply)) => {
                let token =
                    AccessToken::expiring_in(reply.access_token, owned_scopes(scopes), reply.expires_in);
                if let Some(refresh_token) = reply.refresh_token {
                    session.refresh_token = refresh_token;
                }
                session.insert_token(token.clone());
                if let Err(e) = self.cache.save(&session) {
                    warn!("Failed to update token cache: {e}");
                }
                debug!(?scopes, "Refreshed access token");
                TokenOutcome::Acquired(token)
            }
            Ok(TokenReply::Rejected(err)) if err.requires_interaction() => {
                debug!(error = %err.error, "Silent token acquisition needs interaction");
                TokenOutcome::NeedsInteraction
            }
            Ok(TokenReply::Rejected(err)) => TokenOutcome::Failed(err.reason()),
            Err(e) => TokenOutcome::Failed(e.to_string()),
        }
    }

    /// Run the authorization code flow in the browser.
    pub async fn acquire_token_interactive(
        &mut self,
        scopes: &[&str],
        prompt: Option<Prompt>,
    ) -> GraphResult<AccessToken> {
        self.config.require_registration()?;

        let pkce = PkceChallenge::generate();
        let scope = scope_param(scopes);
        let redirect_uri = self.config.redirect_uri();

        let mut authorize_url = Url::parse(&self.config.authorize_endpoint())
            .map_err(|e| GraphError::Config(format!("Invalid authority: {e}")))?;
        {
            let mut query = authorize_url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", &redirect_uri)
                .append_pair("response_mode", "query")
                .append_pair("scope", &scope)
                .append_pair("state", &pkce.state)
                .append_pair("code_challenge", &pkce.code_challenge)
                .append_pair("code_challenge_method", PkceChallenge::METHOD);
            match (prompt, self.account()) {
                (Some(prompt), _) => {
                    query.append_pair("prompt", prompt.as_str());
                }
                (None, Some(account)) => {
                    query.append_pair("login_hint", &account.username);
                }
                (None, None) => {}
            }
        }

        let response = self.interaction.authorize(&authorize_url).await?;
        if response.state != pkce.state {
            return Err(GraphError::Auth(
                "OAuth state mismatch - possible CSRF attack".into(),
            ));
        }

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", response.code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code_verifier", pkce.code_verifier.as_str()),
            ("scope", scope.as_str()),
        ];

        let reply = match self.request_token(&form).await? {
            TokenReply::Granted(reply) => reply,
            TokenReply::Rejected(err) => return Err(GraphError::Auth(err.reason())),
        };

        let account = match reply.id_token.as_deref() {
            Some(id_token) => AccountInfo::from_id_token(id_token)?,
            None => self
                .account()
                .cloned()
                .ok_or_else(|| GraphError::Auth("Token response has no id token".into()))?,
        };

        let mut session = self
            .cache
            .load(&account.username)?
            .unwrap_or_else(|| CachedSession {
                refresh_token: String::new(),
                account: account.clone(),
                access_tokens: Vec::new(),
            });
        session.account = account.clone();
        if let Some(refresh_token) = reply.refresh_token {
            session.refresh_token = refresh_token;
        }

        let token = AccessToken::expiring_in(reply.access_token, owned_scopes(scopes), reply.expires_in);
        session.insert_token(token.clone());
        self.cache.save(&session)?;

        info!(username = %account.username, "Signed in");
        self.state = SessionState::Ready {
            account: Some(account),
        };
        Ok(token)
    }

    /// Silent acquisition with a single interactive fallback.
    pub async fn acquire_token(&mut self, scopes: &[&str]) -> GraphResult<AccessToken> {
        match self.acquire_token_silent(scopes).await {
            TokenOutcome::Acquired(token) => Ok(token),
            TokenOutcome::NeedsInteraction => {
                info!(?scopes, "Interaction required, opening the browser");
                self.acquire_token_interactive(scopes, None).await
            }
            TokenOutcome::Failed(reason) => Err(GraphError::Auth(reason)),
        }
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> GraphResult<TokenReply> {
        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let reply = serde_json::from_str(&body)
                .map_err(|e| GraphError::UnexpectedFormat(format!("token response: {e}")))?;
            return Ok(TokenReply::Granted(reply));
        }

        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => {
                warn!(status = status.as_u16(), error = %err.error, "Token request rejected");
                Ok(TokenReply::Rejected(err))
            }
            Err(_) => Err(GraphError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}
