use anyhow::Result;
use owo_colors::OwoColorize;

use crate::context::AppContext;

pub async fn run() -> Result<()> {
    let mut ctx = AppContext::load()?;
    ctx.config.require_registration()?;

    println!("Signing in to Microsoft...");
    let account = ctx.identity.login().await?;

    println!("\n{}", account.greeting().bold());
    println!("   {}", account.username.dimmed());
    Ok(())
}
