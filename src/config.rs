use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// When unset the sign-in and feedback records live in process memory.
    pub mongo_uri: Option<String>,
    pub mongo_db_name: String,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub gnews_api_key: Option<String>,
    pub rapidapi_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub app_url: String,
    pub admin_email: Option<String>,
    pub cache_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub rate_limit_max: usize,
    pub rate_limit_window_secs: i64,
}

impl Config {
    pub fn from_env() -> Config {
        dotenv().ok(); // Load .env file if present
        Config {
            bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:3000"),
            mongo_uri: get_env_opt("MONGO_URI"),
            mongo_db_name: get_env_or_default("MONGO_DB_NAME", "compli"),
            google_api_key: get_env_opt("GOOGLE_API_KEY"),
            google_cse_id: get_env_opt("GOOGLE_CSE_ID"),
            gnews_api_key: get_env_opt("GNEWS_API_KEY"),
            rapidapi_key: get_env_opt("RAPIDAPI_KEY"),
            openrouter_api_key: get_env_opt("OPENROUTER_API_KEY"),
            openrouter_model: get_env_or_default("OPENROUTER_MODEL", "moonshotai/kimi-dev-72b:free"),
            app_url: get_env_or_default("APP_URL", "http://localhost:3000"),
            admin_email: get_env_opt("ADMIN_EMAIL"),
            cache_dir: PathBuf::from(get_env_or_default("CACHE_DIR", ".cache")),
            http_timeout_secs: get_env_parsed("HTTP_TIMEOUT_SECS", 8),
            rate_limit_max: get_env_parsed("RATE_LIMIT_MAX", 10),
            rate_limit_window_secs: get_env_parsed("RATE_LIMIT_WINDOW_SECS", 60),
        }
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparsable value for {key}: {raw:?}");
            default
        }),
        Err(_) => default,
    }
}
