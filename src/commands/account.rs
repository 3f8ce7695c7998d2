use poise::CreateReply;
use tracing::{info, warn};

use crate::auth::DisplayName;
use crate::session::Session;
use crate::state::Context;

/// Replies only the caller can see; credentials go through these commands.
async fn reply_private(ctx: &Context<'_>, text: impl Into<String>) -> Result<(), anyhow::Error> {
    ctx.send(CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Create a FactVerify account
#[poise::command(slash_command)]
pub async fn signup(
    ctx: Context<'_>,
    #[description = "Email address"] email: String,
    #[description = "Password (at least 6 characters)"] password: String,
) -> Result<(), anyhow::Error> {
    ctx.defer_ephemeral().await?;

    let reply = match ctx.data().identity.sign_up(&email, &password).await {
        Ok(()) => "Account created! Please log in.".to_string(),
        Err(e) => {
            warn!(user = ctx.author().name, error = %e, "Signup rejected");
            e.to_string()
        }
    };

    reply_private(&ctx, reply).await
}

/// Log in to ask questions
#[poise::command(slash_command)]
pub async fn login(
    ctx: Context<'_>,
    #[description = "Email address"] email: String,
    #[description = "Password"] password: String,
) -> Result<(), anyhow::Error> {
    ctx.defer_ephemeral().await?;

    let success = match ctx.data().identity.log_in(&email, &password).await {
        Ok(success) => success,
        Err(e) => {
            warn!(user = ctx.author().name, error = %e, "Login rejected");
            return reply_private(&ctx, e.to_string()).await;
        }
    };

    let session = Session {
        email,
        display_name: success.display_name,
        auth_token: success.id_token,
    };
    let greeting = session.greeting_name();
    ctx.data()
        .sessions
        .start(ctx.author().id.get(), session)
        .await;

    info!(user = ctx.author().name, "Session started");
    reply_private(&ctx, format!("Login successful! Welcome, {}.", greeting)).await
}

/// Log out of FactVerify
#[poise::command(slash_command)]
pub async fn logout(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let ended = ctx.data().sessions.end(ctx.author().id.get()).await;
    if ended {
        info!(user = ctx.author().name, "Session ended");
        reply_private(&ctx, "You have been logged out.").await
    } else {
        reply_private(&ctx, "You are not logged in.").await
    }
}

/// Show which account you are signed in with
#[poise::command(slash_command)]
pub async fn whoami(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let Some(session) = ctx.data().sessions.get(ctx.author().id.get()).await else {
        return reply_private(&ctx, "Please log in to access the AI model.").await;
    };

    // Read-only: only login writes a session and only logout clears it.
    let fresh_name = match ctx
        .data()
        .identity
        .lookup_display_name(&session.auth_token)
        .await
    {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "Display name refresh failed");
            None
        }
    };

    reply_private(&ctx, whoami_text(&session, fresh_name.as_deref())).await
}

/// Prefers a name fetched just now over the one stored at login.
fn whoami_text(session: &Session, fresh_name: Option<&str>) -> String {
    let name = match fresh_name.map(DisplayName::from_full_name) {
        Some(fresh) if !fresh.is_empty() => fresh.full(),
        _ => session.greeting_name(),
    };
    format!("Welcome, {} (signed in as {}).", name, session.email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    fn session(name: &str) -> Session {
        Session {
            email: "ada@uni.edu".to_string(),
            display_name: DisplayName::from_full_name(name),
            auth_token: "tok".to_string(),
        }
    }

    #[test]
    fn test_whoami_uses_fresh_name() {
        assert_eq!(
            whoami_text(&session("Ada Lovelace"), Some("Augusta Ada King")),
            "Welcome, Augusta King (signed in as ada@uni.edu)."
        );
    }

    #[test]
    fn test_whoami_falls_back_to_stored_name_then_email() {
        assert_eq!(
            whoami_text(&session("Ada Lovelace"), None),
            "Welcome, Ada Lovelace (signed in as ada@uni.edu)."
        );
        assert_eq!(
            whoami_text(&session(""), Some("  ")),
            "Welcome, ada@uni.edu (signed in as ada@uni.edu)."
        );
    }

    #[tokio::test]
    async fn test_refreshed_name_never_revives_ended_session() {
        let store = SessionStore::new();
        store.start(7, session("Ada Lovelace")).await;
        let snapshot = store.get(7).await.unwrap();

        // Logout lands while the lookup is in flight.
        assert!(store.end(7).await);
        let _ = whoami_text(&snapshot, Some("Ada King"));

        assert!(store.get(7).await.is_none());
    }
}
