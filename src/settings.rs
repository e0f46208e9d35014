use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub scraper_base_url: Url,
    pub debug: bool,
    pub enable_swagger: bool,
    pub port: u16,
    pub groups_file: String,
    pub staff_file: String,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix
            .add_source(Environment::with_prefix("APP").separator("_"))
            .set_default("scraper_base_url", "https://ssau.ru/rasp")?
            .set_default("debug", false)?
            .set_default("enable_swagger", true)?
            .set_default("port", 3000)?
            .set_default("groups_file", "groups.json")?
            .set_default("staff_file", "teachers.json")?
            .set_default("request_timeout_secs", 10)?
            .build()?;

        config.try_deserialize()
    }
}
