mod account;
mod ask;

use crate::state::Context;

/// FactVerify - answers with checkable sources
#[poise::command(
    slash_command,
    subcommands(
        "account::signup",
        "account::login",
        "account::logout",
        "account::whoami",
        "ask::ask"
    )
)]
pub async fn factverify(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}
