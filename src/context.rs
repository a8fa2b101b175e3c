//! Per-process state handed to every command.

use anyhow::{Context, Result};
use chosei_core::schedule::ScheduleGrid;
use chosei_graph::{AppConfig, GraphClient, IdentitySession, TokenCache};

use crate::oauth::BrowserInteraction;

pub struct AppContext {
    pub config: AppConfig,
    pub identity: IdentitySession,
    pub graph: GraphClient,
}

impl AppContext {
    /// Load config and restore the cached account.
    pub fn load() -> Result<Self> {
        let config = AppConfig::load().context("Failed to load config")?;
        let cache = TokenCache::default_location()?;
        let interaction = BrowserInteraction::new(config.redirect_address());

        let mut identity = IdentitySession::new(config.clone(), cache, Box::new(interaction));
        identity
            .initialize()
            .context("Failed to read the token cache")?;

        let graph = GraphClient::from_config(&config);

        Ok(Self {
            config,
            identity,
            graph,
        })
    }
}

/// `schedule.toml` when present, otherwise the demonstration data.
pub fn load_schedule() -> Result<ScheduleGrid> {
    let path = AppConfig::schedule_path()?;
    ScheduleGrid::load_or_demo(&path)
        .with_context(|| format!("Failed to load schedule from {}", path.display()))
}
