use std::fmt;

use serde::{Deserialize, Serialize};

/// Body shared by the signup and password-login endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CredentialsRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LookupRequest<'a> {
    pub id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TokenResponse {
    pub id_token: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LookupResponse {
    #[serde(default)]
    pub users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LookupUser {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: Option<String>,
}

/// Account display name split into first/last parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayName {
    pub first: String,
    pub last: String,
}

impl DisplayName {
    /// First whitespace token is the first name, last token the last name.
    /// A single token leaves `last` empty; middle tokens are dropped.
    pub fn from_full_name(full: &str) -> Self {
        let mut tokens = full.split_whitespace();
        let first = tokens.next().unwrap_or_default().to_string();
        let last = if first.is_empty() {
            String::new()
        } else {
            tokens.last().unwrap_or_default().to_string()
        };
        Self { first, last }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.last.is_empty()
    }

    pub fn full(&self) -> String {
        format!("{} {}", self.first, self.last).trim().to_string()
    }
}

pub struct LoginSuccess {
    pub id_token: String,
    pub display_name: DisplayName,
}

impl fmt::Debug for LoginSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSuccess")
            .field("id_token", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}
