use anyhow::Result;
use chosei_graph::{AppConfig, TokenCache};
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = AppConfig::config_path()?;

    if !config_path.exists() {
        AppConfig::create_default_config(&config_path)?;
        println!("Created {}\n", config_path.display());
    }

    let schedule_path = AppConfig::schedule_path()?;
    let schedule_note = if schedule_path.exists() {
        ""
    } else {
        " (not found, using demo data)"
    };

    println!("{}", "Paths".bold());
    println!("  Config:    {}", config_path.display());
    println!(
        "  Schedule:  {}{}",
        schedule_path.display(),
        schedule_note.dimmed()
    );
    println!("  Sessions:  {}", TokenCache::default_location()?.dir().display());

    Ok(())
}
