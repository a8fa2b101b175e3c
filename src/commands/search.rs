use anyhow::Result;
use chosei_core::search::AvailabilitySearch;

use crate::context::load_schedule;
use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run() -> Result<()> {
    let grid = load_schedule()?;
    search_availability().await;
    println!("{}", grid.render());
    Ok(())
}

/// Show the searching state for the fixed delay.
pub async fn search_availability() {
    let mut search = AvailabilitySearch::new();
    let spinner = create_spinner("検索中...".to_string());
    search.run().await;
    spinner.finish_and_clear();
}
