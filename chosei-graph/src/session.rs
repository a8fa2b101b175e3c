//! Token cache: one file per signed-in account under ~/.config/chosei/session/
//!
//! An `accounts.toml` index keeps the accounts in sign-in order so a restart
//! can restore the first one.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::base_dir;
use crate::error::{GraphError, GraphResult};

/// Tokens this close to expiry are refreshed rather than reused.
const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Sign-in name (`preferred_username`), also the cache key.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `{oid}.{tid}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_account_id: Option<String>,
}

#[derive(Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    tid: Option<String>,
}

impl AccountInfo {
    /// Read the account from an id token's claims. The signature is not
    /// checked; the token came straight from the token endpoint over TLS.
    pub fn from_id_token(id_token: &str) -> GraphResult<Self> {
        let payload = id_token
            .split('.')
            .nth(1)
            .ok_or_else(|| GraphError::Auth("Malformed id token".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| GraphError::Auth(format!("Malformed id token: {e}")))?;
        let claims: IdTokenClaims = serde_json::from_slice(&bytes)
            .map_err(|e| GraphError::Auth(format!("Malformed id token claims: {e}")))?;

        let username = claims
            .preferred_username
            .or(claims.email)
            .ok_or_else(|| GraphError::Auth("Id token has no username".into()))?;

        let home_account_id = match (claims.oid, claims.tid) {
            (Some(oid), Some(tid)) => Some(format!("{oid}.{tid}")),
            _ => None,
        };

        Ok(Self {
            username,
            name: claims.name.filter(|n| !n.trim().is_empty()),
            home_account_id,
        })
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }

    pub fn greeting(&self) -> String {
        format!("ようこそ、{}さん", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub secret: String,
    pub scopes: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn expiring_in(secret: String, scopes: Vec<String>, expires_in: i64) -> Self {
        Self {
            secret,
            scopes,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    /// Whether this token was granted every scope in `scopes`.
    pub fn covers(&self, scopes: &[&str]) -> bool {
        scopes
            .iter()
            .all(|wanted| self.scopes.iter().any(|s| s.eq_ignore_ascii_case(wanted)))
    }

    pub fn is_fresh(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Everything cached for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSession {
    pub refresh_token: String,
    pub account: AccountInfo,
    #[serde(default)]
    pub access_tokens: Vec<AccessToken>,
}

impl CachedSession {
    pub fn token_for(&self, scopes: &[&str]) -> Option<&AccessToken> {
        self.access_tokens
            .iter()
            .find(|t| t.is_fresh() && t.covers(scopes))
    }

    /// Add `token`, replacing any cached token with the same scopes.
    pub fn insert_token(&mut self, token: AccessToken) {
        self.access_tokens.retain(|t| t.is_fresh() && t.scopes != token.scopes);
        self.access_tokens.push(token);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountIndex {
    #[serde(default)]
    accounts: Vec<String>,
}

pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> GraphResult<Self> {
        Ok(Self::new(base_dir()?.join("session")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("accounts.toml")
    }

    fn path_for(&self, username: &str) -> PathBuf {
        let slug = username.replace(['/', '\\', ':'], "_");
        self.dir.join(format!("{slug}.toml"))
    }

    fn read_index(&self) -> GraphResult<AccountIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(AccountIndex::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents)
            .map_err(|e| GraphError::Cache(format!("Failed to parse {}: {e}", path.display())))
    }

    fn write_index(&self, index: &AccountIndex) -> GraphResult<()> {
        let contents = toml::to_string_pretty(index)
            .map_err(|e| GraphError::Cache(format!("Failed to serialize account index: {e}")))?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.index_path(), contents)?;
        Ok(())
    }

    /// Cached accounts in sign-in order. Index entries without a session file
    /// are skipped.
    pub fn accounts(&self) -> GraphResult<Vec<AccountInfo>> {
        let mut accounts = Vec::new();
        for username in self.read_index()?.accounts {
            if let Some(session) = self.load(&username)? {
                accounts.push(session.account);
            }
        }
        Ok(accounts)
    }

    pub fn first_account(&self) -> GraphResult<Option<AccountInfo>> {
        Ok(self.accounts()?.into_iter().next())
    }

    pub fn load(&self, username: &str) -> GraphResult<Option<CachedSession>> {
        let path = self.path_for(username);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let session = toml::from_str(&contents)
            .map_err(|e| GraphError::Cache(format!("Failed to parse {}: {e}", path.display())))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &CachedSession) -> GraphResult<()> {
        let contents = toml::to_string_pretty(session)
            .map_err(|e| GraphError::Cache(format!("Failed to serialize session: {e}")))?;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&session.account.username);
        std::fs::write(&path, contents)?;

        // Owner-only, the file holds a refresh token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        let mut index = self.read_index()?;
        if !index.accounts.contains(&session.account.username) {
            index.accounts.push(session.account.username.clone());
            self.write_index(&index)?;
        }

        Ok(())
    }

    pub fn remove(&self, username: &str) -> GraphResult<()> {
        let path = self.path_for(username);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let mut index = self.read_index()?;
        let before = index.accounts.len();
        index.accounts.retain(|u| u != username);
        if index.accounts.len() != before {
            self.write_index(&index)?;
        }
        Ok(())
    }
}
