use std::env;

/// Application configuration loaded from environment variables.
///
/// Platform credentials are optional: a platform with incomplete credentials
/// is disabled, not an error. The feed stays functional (empty) with no
/// platforms configured at all.
#[derive(Debug, Clone)]
pub struct Config {
    // Feed
    pub feed_enabled: bool,
    pub feed_tag: Option<String>,
    pub fetch_limit: u32,
    pub cache_ttl_minutes: i64,

    // Instagram
    pub instagram_access_token: Option<String>,
    pub instagram_user_id: Option<String>,

    // Facebook
    pub facebook_access_token: Option<String>,
    pub facebook_page_id: Option<String>,

    // Storage
    pub database_url: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Admin
    pub admin_username: String,
    pub admin_password: String,

    /// When set, a background task forces a refresh at this interval to keep
    /// the cache warm.
    pub refresh_interval_minutes: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        Self {
            feed_enabled: env::var("FEED_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            feed_tag: optional_env("FEED_TAG"),
            fetch_limit: parsed_env("FEED_FETCH_LIMIT", 25),
            cache_ttl_minutes: parsed_env("FEED_CACHE_TTL_MINUTES", 30),
            instagram_access_token: optional_env("INSTAGRAM_ACCESS_TOKEN"),
            instagram_user_id: optional_env("INSTAGRAM_USER_ID"),
            facebook_access_token: optional_env("FACEBOOK_ACCESS_TOKEN"),
            facebook_page_id: optional_env("FACEBOOK_PAGE_ID"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:lanefeed.db".to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: parsed_env("API_PORT", 3000),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: required_env("ADMIN_PASSWORD"),
            refresh_interval_minutes: optional_env("FEED_REFRESH_INTERVAL_MINUTES")
                .map(|v| v.parse().expect("FEED_REFRESH_INTERVAL_MINUTES must be a number")),
        }
    }

    /// Cache freshness window as a chrono duration.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache_ttl_minutes)
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Empty values count as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
