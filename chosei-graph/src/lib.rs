//! Microsoft identity sign-in and Graph API access for chosei.

pub mod actions;
pub mod auth;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod pkce;
pub mod session;
pub mod types;

pub use auth::{IdentitySession, Interaction, SessionState, TokenOutcome};
pub use client::GraphClient;
pub use config::AppConfig;
pub use error::{GraphError, GraphResult};
pub use session::{AccessToken, AccountInfo, TokenCache};
