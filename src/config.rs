use std::fmt;
use std::str::FromStr;

const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration value `{0}`")]
    Missing(&'static str),

    #[error("invalid configuration value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Identity provider settings (email/password accounts).
#[derive(Clone)]
pub struct IdentityConfig {
    pub api_key: String,
    /// Required at startup and logged there; the REST calls only need `api_key`.
    pub auth_domain: String,
    /// Required at startup and logged there; the REST calls only need `api_key`.
    pub project_id: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Chat-completions settings.
#[derive(Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Clone)]
pub struct Config {
    pub identity: IdentityConfig,
    pub completion: CompletionConfig,
    pub discord_token: String,
    pub discord_guild_id: Option<u64>,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_key", &REDACTED)
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &REDACTED)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("identity", &self.identity)
            .field("completion", &self.completion)
            .field("discord_token", &REDACTED)
            .field("discord_guild_id", &self.discord_guild_id)
            .finish()
    }
}

impl Config {
    /// Load from the process environment, after an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let identity = IdentityConfig {
            api_key: vars.required("IDENTITY_API_KEY")?,
            auth_domain: vars.required("IDENTITY_AUTH_DOMAIN")?,
            project_id: vars.required("IDENTITY_PROJECT_ID")?,
            base_url: vars
                .optional("IDENTITY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string()),
            timeout_secs: vars.parsed("IDENTITY_TIMEOUT_SECS", 10)?,
        };

        let completion = CompletionConfig {
            api_key: vars.required("LLM_API_KEY")?,
            base_url: vars.required("LLM_BASE_URL")?,
            model: vars.required("LLM_MODEL")?,
            timeout_secs: vars.parsed("LLM_TIMEOUT_SECS", 120)?,
            temperature: vars.parsed("LLM_TEMPERATURE", 0.2)?,
            max_tokens: vars.parsed("LLM_MAX_TOKENS", 2048)?,
        };

        if !(60..=120).contains(&completion.timeout_secs) {
            return Err(ConfigError::Invalid {
                key: "LLM_TIMEOUT_SECS",
                reason: format!("{} is outside 60..=120", completion.timeout_secs),
            });
        }
        if !(0.0..=0.3).contains(&completion.temperature) {
            return Err(ConfigError::Invalid {
                key: "LLM_TEMPERATURE",
                reason: format!("{} is outside 0.0..=0.3", completion.temperature),
            });
        }
        if completion.max_tokens < 2000 {
            return Err(ConfigError::Invalid {
                key: "LLM_MAX_TOKENS",
                reason: format!("{} is below 2000", completion.max_tokens),
            });
        }

        let discord_token = vars.required("DISCORD_TOKEN")?;
        let discord_guild_id = match vars.optional("DISCORD_GUILD_ID") {
            Some(_) => Some(vars.parsed("DISCORD_GUILD_ID", 0)?),
            None => None,
        };

        Ok(Self {
            identity,
            completion,
            discord_token,
            discord_guild_id,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty and whitespace-only values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: format!("{:?}: {}", raw, e),
            }),
        }
    }
}
