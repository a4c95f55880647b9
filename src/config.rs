use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POLL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub poll_interval: Duration,
    pub default_user_id: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from("data/state.json"),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            default_user_id: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let poll_interval = lookup("SCHEDULE_POLL_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs >= 1)
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        let default_user_id = lookup("DEFAULT_USER_ID")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(defaults.default_user_id);

        Self {
            port,
            data_path,
            poll_interval,
            default_user_id,
        }
    }
}
