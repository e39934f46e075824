use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const LLM_ENDPOINT: &str = "FOREMAN_LLM_ENDPOINT";
    pub const LLM_API_KEY: &str = "FOREMAN_LLM_API_KEY";
    pub const LLM_MODEL: &str = "FOREMAN_LLM_MODEL";
    pub const LLM_MAX_TOKENS: &str = "FOREMAN_LLM_MAX_TOKENS";
    /// Base URL the react/scheduler paths use to call back into /api/agent/chat
    pub const CHAT_BASE_URL: &str = "FOREMAN_CHAT_BASE_URL";
    pub const SCHEDULER_POLL_SECS: &str = "FOREMAN_SCHEDULER_POLL_SECS";
    pub const SCHEDULER_ENABLED: &str = "FOREMAN_SCHEDULER_ENABLED";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/foreman.db";
    pub const LLM_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
    pub const LLM_MODEL: &str = "claude-sonnet-4-20250514";
    pub const LLM_MAX_TOKENS: u32 = 4096;
    pub const SCHEDULER_POLL_SECS: u64 = 30;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub llm_endpoint: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub chat_base_url: String,
    pub scheduler_poll_secs: u64,
    pub scheduler_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var(env_vars::PORT)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults::PORT);

        Config {
            port,
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            llm_endpoint: env::var(env_vars::LLM_ENDPOINT)
                .unwrap_or_else(|_| defaults::LLM_ENDPOINT.to_string()),
            llm_api_key: env::var(env_vars::LLM_API_KEY).unwrap_or_default(),
            llm_model: env::var(env_vars::LLM_MODEL)
                .unwrap_or_else(|_| defaults::LLM_MODEL.to_string()),
            llm_max_tokens: env::var(env_vars::LLM_MAX_TOKENS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::LLM_MAX_TOKENS),
            chat_base_url: env::var(env_vars::CHAT_BASE_URL)
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port)),
            scheduler_poll_secs: env::var(env_vars::SCHEDULER_POLL_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::SCHEDULER_POLL_SECS),
            scheduler_enabled: env::var(env_vars::SCHEDULER_ENABLED)
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }
}
