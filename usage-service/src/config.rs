use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
    /// When set, every route requires this bearer token.
    pub auth_bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    /// Key for the text-generation capability. Requests fail with a
    /// configuration error when neither this nor GEMINI_API_KEY is set.
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Wall-clock budget for one generation call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Endpoint override, used by tests; the default is the public API.
    pub endpoint: Option<String>,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            endpoint: None,
        }
    }
}

impl InsightsConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path =
            env::var("USAGE_TRACKER_CONFIG").unwrap_or_else(|_| "usage-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "postgres://localhost/usage"
            max_connections = 5

            [http]
            bind_addr = "127.0.0.1:8080"
            auth_bearer_token = "secret"

            [insights]
            api_key = "k"
            model = "gemini-pro"
            timeout_ms = 2500
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.http.auth_bearer_token.as_deref(), Some("secret"));
        assert_eq!(cfg.insights.timeout_ms, 2500);
    }

    #[test]
    fn insights_section_is_optional_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "postgres://localhost/usage"
            max_connections = 5

            [http]
            bind_addr = "127.0.0.1:8080"
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.insights.model, "gemini-pro");
        assert_eq!(cfg.insights.timeout_ms, 10_000);
        assert!(cfg.http.auth_bearer_token.is_none());
    }
}
