use anyhow::Result;
use chosei_core::directory::DirectorySearch;
use chosei_graph::actions;
use tracing::warn;

use crate::context::AppContext;
use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run(query: Option<String>) -> Result<()> {
    let mut ctx = AppContext::load()?;

    let mut search = fetch_directory(&mut ctx)
        .await
        .map_err(|message| anyhow::anyhow!(message))?;

    if let Some(query) = query {
        search.set_query(query);
    }

    println!("{}", search.render());
    Ok(())
}

/// Fetch the organization's users. Failures come back as the message to show.
pub async fn fetch_directory(ctx: &mut AppContext) -> Result<DirectorySearch, &'static str> {
    let spinner = create_spinner("ユーザーを取得中...".to_string());
    let result = actions::fetch_directory(&mut ctx.identity, &ctx.graph).await;
    spinner.finish_and_clear();

    match result {
        Ok(users) => Ok(DirectorySearch::new(users)),
        Err(e) => {
            warn!(error = %e, "Failed to fetch directory users");
            Err(actions::directory_failure_message(&e))
        }
    }
}
