use anyhow::Result;

use crate::context::AppContext;

pub fn run() -> Result<()> {
    let mut ctx = AppContext::load()?;

    match ctx.identity.logout()? {
        Some(account) => println!("Signed out {}", account.username),
        None => println!("Not signed in."),
    }
    Ok(())
}
