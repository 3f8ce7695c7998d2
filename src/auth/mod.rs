pub mod types;

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::IdentityConfig;
use types::{
    CredentialsRequest, ErrorEnvelope, LookupRequest, LookupResponse, TokenResponse,
};
pub use types::{DisplayName, LoginSuccess};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Signup,
    Login,
    Lookup,
}

impl fmt::Display for AuthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Signup => "Signup",
            Self::Login => "Login",
            Self::Lookup => "Lookup",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider answered, but not with a 200.
    #[error("{action} failed: {message}")]
    Rejected { action: AuthAction, message: String },

    #[error("Connection error: could not reach the sign-in service. Please try again.")]
    Connection(#[from] reqwest::Error),
}

/// Email/password accounts against the identity provider's REST API.
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, method, self.api_key)
    }

    /// Create an account. Any 200 counts; the body is not inspected because the
    /// user logs in separately.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.post_credentials(AuthAction::Signup, "signUp", email, password)
            .await?;
        info!(email, "Account created");
        Ok(())
    }

    pub async fn log_in(&self, email: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let body = self
            .post_credentials(AuthAction::Login, "signInWithPassword", email, password)
            .await?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| AuthError::Rejected {
            action: AuthAction::Login,
            message: format!("unreadable response: {}", e),
        })?;

        let full_name = match self.lookup_display_name(&token.id_token).await {
            Ok(name) => name.or(token.display_name),
            Err(e) => {
                warn!(email, error = %e, "Display name lookup failed");
                token.display_name
            }
        };

        info!(email, "Login succeeded");
        Ok(LoginSuccess {
            id_token: token.id_token,
            display_name: DisplayName::from_full_name(full_name.as_deref().unwrap_or_default()),
        })
    }

    pub async fn lookup_display_name(&self, id_token: &str) -> Result<Option<String>, AuthError> {
        let resp = self
            .client
            .post(self.endpoint("lookup"))
            .json(&LookupRequest { id_token })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(rejection(AuthAction::Lookup, &body));
        }

        let lookup: LookupResponse = serde_json::from_str(&body).map_err(|e| AuthError::Rejected {
            action: AuthAction::Lookup,
            message: format!("unreadable response: {}", e),
        })?;

        Ok(lookup
            .users
            .into_iter()
            .next()
            .and_then(|u| u.display_name)
            .filter(|n| !n.trim().is_empty()))
    }

    /// Returns the raw 200 body; non-200 becomes a rejection.
    async fn post_credentials(
        &self,
        action: AuthAction,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let resp = self
            .client
            .post(self.endpoint(method))
            .json(&CredentialsRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(%action, status = status.as_u16(), "Identity provider responded");

        if status != StatusCode::OK {
            return Err(rejection(action, &body));
        }
        Ok(body)
    }
}

/// Pull `error.message` out of a non-200 body, defaulting to "Unknown error".
fn rejection(action: AuthAction, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Unknown error".to_string());
    AuthError::Rejected { action, message }
}
