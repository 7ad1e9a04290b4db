use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub push: PushSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Appwrite,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    pub appwrite: Option<AppwriteSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub timeout_secs: Option<u64>,
    /// Documents per list request
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_users_collection")]
    pub users: String,
    #[serde(default = "default_restaurants_collection")]
    pub restaurants: String,
    #[serde(default = "default_reservations_collection")]
    pub reservations: String,
    #[serde(default = "default_chat_messages_collection")]
    pub chat_messages: String,
    #[serde(default = "default_notifications_collection")]
    pub notifications: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            users: default_users_collection(),
            restaurants: default_restaurants_collection(),
            reservations: default_reservations_collection(),
            chat_messages: default_chat_messages_collection(),
            notifications: default_notifications_collection(),
        }
    }
}

fn default_users_collection() -> String { "users".to_string() }
fn default_restaurants_collection() -> String { "restaurants".to_string() }
fn default_reservations_collection() -> String { "reservations".to_string() }
fn default_chat_messages_collection() -> String { "chat_messages".to_string() }
fn default_notifications_collection() -> String { "notifications".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

fn default_issuer() -> String { "dine-match".to_string() }
fn default_token_ttl() -> i64 { 1440 }

#[derive(Debug, Clone, Deserialize)]
pub struct PushSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_push_endpoint")]
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_push_endpoint(),
            access_token: None,
            timeout_secs: None,
        }
    }
}

fn default_push_endpoint() -> String { "https://exp.host/--/api/v2/push/send".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DINE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DINE__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        Self::from_config(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::from_config(settings)
    }

    fn from_config(settings: Config) -> Result<Self, ConfigError> {
        apply_secret_overrides(settings, |name| std::env::var(name).ok())?.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("DINE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Let the conventional plain variables override their settings
///
/// `JWT_SECRET` -> auth.jwt_secret, `APPWRITE_API_KEY` -> store.appwrite.api_key,
/// `EXPO_ACCESS_TOKEN` -> push.access_token. The Appwrite key is only applied when a
/// `[store.appwrite]` table is configured.
fn apply_secret_overrides(
    settings: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let has_appwrite = settings.get_table("store.appwrite").is_ok();
    let mut builder = Config::builder().add_source(settings);

    if let Some(secret) = lookup("JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }
    if let Some(api_key) = lookup("APPWRITE_API_KEY") {
        if has_appwrite {
            builder = builder.set_override("store.appwrite.api_key", api_key)?;
        } else {
            tracing::debug!("APPWRITE_API_KEY set without [store.appwrite], ignoring");
        }
    }
    if let Some(token) = lookup("EXPO_ACCESS_TOKEN") {
        builder = builder.set_override("push.access_token", token)?;
    }

    builder.build()
}
