use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Duckdb,
}

/// Connection settings. `path` is only read by the embedded DuckDB backend,
/// the remaining fields only by Postgres.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "12345".to_string(),
            name: "gcn".to_string(),
            max_connections: 5,
            path: "navigator.duckdb".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: DatabaseBackend::Duckdb,
            path: ":memory:".to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for session tokens. Empty means a random per-process key.
    pub token_secret: String,
    pub token_expiry_hours: u32,
    pub bcrypt_cost: u32,
    pub require_token: bool,
    pub api_keys: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_expiry_hours: 24,
            bcrypt_cost: 10,
            require_token: false,
            api_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnswererConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AnswererConfig {
    fn default() -> Self {
        Self {
            base_url: "http://0.0.0.0:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetadataConfig {
    /// allorigins-style proxy answering `GET <proxy>?url=` with `{"contents": ...}`.
    /// Empty fetches pages directly.
    pub proxy_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            proxy_url: "https://api.allorigins.win/get".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age_secs: Option<usize>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: [
                "Origin",
                "X-Requested-With",
                "Content-Type",
                "Accept",
                "Authorization",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            max_age_secs: Some(3600),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base: String,
    /// Where recent queries survive between sessions. Defaults to the
    /// platform data directory.
    pub recent_queries_path: Option<PathBuf>,
    pub recent_queries_cap: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            recent_queries_path: None,
            recent_queries_cap: 5,
        }
    }
}

impl ClientConfig {
    pub fn recent_queries_file(&self) -> Option<PathBuf> {
        self.recent_queries_path.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("navigator").join("recent_queries.json"))
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VoiceConfig {
    /// Program that reads text from stdin aloud, e.g. `espeak --stdin`.
    pub tts_command: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub answerer: AnswererConfig,
    pub metadata: MetadataConfig,
    pub cors: CorsConfig,
    pub client: ClientConfig,
    pub voice: VoiceConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("NAVIGATOR")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.api_keys")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers"),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.apply_env_overrides(|name| std::env::var(name).ok())?;

        // Expand environment variables if present like ${DB_PASSWORD}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.database.host = expand_env(&app_config.database.host);
        app_config.database.user = expand_env(&app_config.database.user);
        app_config.database.password = expand_env(&app_config.database.password);
        app_config.database.path = expand_env(&app_config.database.path);
        app_config.auth.token_secret = expand_env(&app_config.auth.token_secret);
        app_config.answerer.base_url = expand_env(&app_config.answerer.base_url);

        Ok(app_config)
    }

    /// Flat variables of the original deployment (`DB_HOST`, `PORT`, ...).
    /// They win over the config file and the prefixed environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = parse_port("DB_PORT", &v)?;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_port("PORT", &v)?;
        }
        Ok(())
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, config::ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| config::ConfigError::Message(format!("{} is not a valid port: {}", name, value)))
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| "".to_string())
    } else {
        val.to_string()
    }
}
