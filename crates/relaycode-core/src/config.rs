use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default timeout for blocking agent invocations (`session list` etc.).
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Top-level config (relaycode.toml + RELAYCODE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// When set, only this chat ID is served; all other chats are ignored.
    /// Absent means the bot answers any chat (original controller behaviour).
    #[serde(default)]
    pub allowed_chat: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Executable name or path of the coding-assistant CLI.
    #[serde(default = "default_command")]
    pub command: String,
    /// Timeout for blocking invocations. Streaming runs have no deadline.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            run_timeout_secs: default_run_timeout(),
        }
    }
}

fn default_command() -> String {
    "opencode".to_string()
}

fn default_run_timeout() -> u64 {
    DEFAULT_RUN_TIMEOUT_SECS
}

impl BridgeConfig {
    /// Load config from a TOML file with RELAYCODE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.relaycode/relaycode.toml
    ///
    /// Env overrides use double underscores for nesting, e.g.
    /// `RELAYCODE_TELEGRAM__BOT_TOKEN`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: BridgeConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("RELAYCODE_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        if config.telegram.bot_token.trim().is_empty() {
            return Err(crate::error::CoreError::Config(
                "telegram.bot_token is not set".to_string(),
            ));
        }

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.relaycode/relaycode.toml", home)
}
