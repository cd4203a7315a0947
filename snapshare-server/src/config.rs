use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Secret used when `APP_SECRET` is not configured. Only fit for local development.
pub const DEVELOPMENT_SECRET: &str = "snapshare-development-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin, or `*` for any
    pub cors_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub cloud_name: String,
    pub upload_preset: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub upload: Upload,
    pub rate_limit: RateLimit,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in snapshare-server directory (for development)
        let dev_path = PathBuf::from("snapshare-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = Self::with_defaults(builder)?;

        // 2. Override with environment variables (highest priority)
        let overrides = [
            ("HOST", "server.host"),
            ("PORT", "server.port"),
            ("CORS_ORIGIN", "server.cors_origin"),
            ("DATABASE_PATH", "database.path"),
            ("APP_SECRET", "auth.secret"),
            ("TOKEN_TTL_HOURS", "auth.token_ttl_hours"),
            ("BCRYPT_COST", "auth.bcrypt_cost"),
            ("CLOUDINARY_CLOUD_NAME", "upload.cloud_name"),
            ("CLOUDINARY_UPLOAD_PRESET", "upload.upload_preset"),
            ("UPLOAD_MAX_BYTES", "upload.max_bytes"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    /// Defaults only, no files or environment. Used by tests.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder())?
            .build()?
            .try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        // Default to 0.0.0.0 for deployment (allows external connections)
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("server.cors_origin", "http://localhost:5173")?
            .set_default("database.path", "snapshare.db")?
            .set_default("auth.secret", DEVELOPMENT_SECRET)?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("auth.bcrypt_cost", 10)?
            .set_default("upload.cloud_name", "")?
            .set_default("upload.upload_preset", "")?
            .set_default("upload.max_bytes", 10 * 1024 * 1024)?
            .set_default("rate_limit.max_requests", 100)?
            .set_default("rate_limit.window_secs", 60)
    }

    pub fn uses_development_secret(&self) -> bool {
        self.auth.secret == DEVELOPMENT_SECRET
    }
}
