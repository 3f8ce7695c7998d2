mod auth;
mod commands;
mod config;
mod llm;
mod session;
mod state;
mod verify;

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tracing::{error, info, Level};

use auth::IdentityClient;
use config::Config;
use llm::LlmClient;
use session::SessionStore;
use state::AppState;
use verify::VerificationEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Missing or invalid configuration stops us before anything is served
    let config = Config::from_env()?;
    info!(
        project = config.identity.project_id,
        auth_domain = config.identity.auth_domain,
        model = config.completion.model,
        "Configuration loaded"
    );

    let identity = Arc::new(IdentityClient::new(&config.identity)?);
    info!("Identity client initialized");

    let llm_client = Arc::new(LlmClient::new(&config.completion)?);
    let engine = Arc::new(VerificationEngine::new(llm_client));
    info!("Verification engine initialized");

    let app_state = AppState {
        identity,
        engine,
        sessions: Arc::new(SessionStore::new()),
    };

    let guild_id = config.discord_guild_id.map(serenity::GuildId::new);
    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::factverify()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                for cmd in commands {
                    for sub in &cmd.subcommands {
                        info!("  /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, commands, gid).await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, commands).await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting FactVerify bot...");

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
