use std::env;

const DEFAULT_TABLE_NAME: &str = "SuperTechHeroes.Characters";
const DEFAULT_TTL_HOURS: i64 = 4;

/// Store configuration. Because the API is intended for demos, every record
/// carries a TTL after which the table engine deletes it automatically.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub table_name: String,
    pub ttl_hours: i64,
}

impl StoreConfig {
    /// Reads the configuration from `SUPER_TECH_HEROES_TABLE_NAME` and
    /// `SUPER_TECH_HEROES_TTL_HOURS`, falling back to the defaults.
    pub fn from_env() -> StoreConfig {
        let table_name = env::var("SUPER_TECH_HEROES_TABLE_NAME")
            .unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string());
        let ttl_hours = env::var("SUPER_TECH_HEROES_TTL_HOURS")
            .ok()
            .and_then(|hours| hours.parse().ok())
            .unwrap_or(DEFAULT_TTL_HOURS);

        StoreConfig {
            table_name,
            ttl_hours,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}
