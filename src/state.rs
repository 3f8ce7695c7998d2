use std::sync::Arc;

use crate::auth::IdentityClient;
use crate::session::SessionStore;
use crate::verify::VerificationEngine;

pub struct AppState {
    pub identity: Arc<IdentityClient>,
    pub engine: Arc<VerificationEngine>,
    pub sessions: Arc<SessionStore>,
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
