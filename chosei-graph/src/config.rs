//! App configuration at ~/.config/chosei/config.toml
//!
//! The Azure AD application registration is user-provided. `CHOSEI_CLIENT_ID`
//! and `CHOSEI_TENANT_ID` override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

pub const CLIENT_ID_ENV: &str = "CHOSEI_CLIENT_ID";
pub const TENANT_ID_ENV: &str = "CHOSEI_TENANT_ID";

const DEFAULT_TIME_ZONE: &str = "Asia/Tokyo";
const DEFAULT_REDIRECT_PORT: u16 = 8085;
const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

pub fn base_dir() -> GraphResult<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| GraphError::Config("Could not determine config directory".into()))?
        .join("chosei"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client_id: String,
    pub tenant_id: String,
    /// IANA zone attached to meeting start and end times.
    pub time_zone: String,
    pub redirect_port: u16,
    pub graph_base_url: String,
    pub authority_host: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tenant_id: String::new(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            redirect_port: DEFAULT_REDIRECT_PORT,
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> GraphResult<PathBuf> {
        Ok(base_dir()?.join("config.toml"))
    }

    /// Optional availability data shown by the schedule grid.
    pub fn schedule_path() -> GraphResult<PathBuf> {
        Ok(base_dir()?.join("schedule.toml"))
    }

    /// Load the config file (defaults if absent) and apply environment overrides.
    pub fn load() -> GraphResult<Self> {
        let path = Self::config_path()?;

        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Self::from_toml(&contents)?
        } else {
            Self::default()
        };

        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_toml(contents: &str) -> GraphResult<Self> {
        toml::from_str(contents).map_err(|e| GraphError::Config(e.to_string()))
    }

    /// Replace client and tenant ids with non-empty values from `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(client_id) = lookup(CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.client_id = client_id;
        }
        if let Some(tenant_id) = lookup(TENANT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.tenant_id = tenant_id;
        }
        self
    }

    /// Sign-in needs both ids.
    pub fn require_registration(&self) -> GraphResult<()> {
        let missing: Vec<&str> = [("client_id", &self.client_id), ("tenant_id", &self.tenant_id)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        let path = Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "~/.config/chosei/config.toml".to_string());

        Err(GraphError::Config(format!(
            "Missing {} in {path} (or set {CLIENT_ID_ENV} / {TENANT_ID_ENV}).\n\
            Register an application at https://entra.microsoft.com and add\n\
            http://localhost:{}/callback as a redirect URI.",
            missing.join(" and "),
            self.redirect_port
        )))
    }

    /// Tenant-scoped authority, e.g. https://login.microsoftonline.com/{tenant}
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority())
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    pub fn redirect_address(&self) -> String {
        format!("127.0.0.1:{}", self.redirect_port)
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> GraphResult<()> {
        let contents = format!(
            "\
# chosei configuration

# Application (client) ID and Directory (tenant) ID of your app registration:
# client_id = \"00000000-0000-0000-0000-000000000000\"
# tenant_id = \"00000000-0000-0000-0000-000000000000\"

# Time zone for meeting invites:
# time_zone = \"{DEFAULT_TIME_ZONE}\"

# Local port for the sign-in redirect (http://localhost:<port>/callback):
# redirect_port = {DEFAULT_REDIRECT_PORT}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GraphError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| GraphError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
