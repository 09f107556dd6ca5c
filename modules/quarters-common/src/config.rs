use std::env;

/// Default maximum age gap between the oldest and youngest occupant of a
/// room, in whole years. Used when the settings store has no override.
pub const DEFAULT_MAX_AGE_GAP: i32 = 5;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    /// Fallback for the age-gap limit when the settings store has no row.
    pub max_age_gap: i32,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            max_age_gap: env::var("MAX_AGE_GAP")
                .unwrap_or_else(|_| DEFAULT_MAX_AGE_GAP.to_string())
                .parse()
                .expect("MAX_AGE_GAP must be a positive integer"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
