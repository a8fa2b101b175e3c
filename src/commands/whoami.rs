use anyhow::Result;
use chosei_graph::SessionState;
use owo_colors::OwoColorize;

use crate::context::AppContext;

pub fn run() -> Result<()> {
    let ctx = AppContext::load()?;

    match ctx.identity.state() {
        SessionState::Ready {
            account: Some(account),
        } => {
            println!("{}", account.greeting());
            println!("   {}", account.username.dimmed());
        }
        _ => println!("Not signed in. Run `chosei login` to sign in."),
    }
    Ok(())
}
