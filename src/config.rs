use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medicare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend the hospital deployment runs next to the front desk.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Extraction and prediction run a model server-side, so requests are slow.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_URL: &str = "MEDICARE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "MEDICARE_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "MEDICARE_CONNECT_TIMEOUT_SECS";
pub const ENV_STATE_DIR: &str = "MEDICARE_STATE_DIR";

/// Get the application data directory
/// ~/Medicare/ on all platforms, or ./Medicare when no home directory exists
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Directory holding the selected hospital and patient between runs
pub fn state_dir() -> PathBuf {
    app_data_dir().join("state")
}

/// Filter used when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "medicare_lib=debug,reqwest=info"
    } else {
        "medicare_lib=info,reqwest=warn"
    }
}

/// Runtime settings for talking to the backend and persisting selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub state_dir: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            state_dir: state_dir(),
        }
    }
}

impl AssistantConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys keep defaults;
    /// unparseable numbers are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = value(ENV_API_URL) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = value(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs =
                parse_secs(ENV_TIMEOUT_SECS, &raw, DEFAULT_REQUEST_TIMEOUT_SECS);
        }
        if let Some(raw) = value(ENV_CONNECT_TIMEOUT_SECS) {
            config.connect_timeout_secs =
                parse_secs(ENV_CONNECT_TIMEOUT_SECS, &raw, DEFAULT_CONNECT_TIMEOUT_SECS);
        }
        if let Some(dir) = value(ENV_STATE_DIR) {
            config.state_dir = PathBuf::from(dir);
        }
        config
    }
}

fn parse_secs(key: &str, raw: &str, fallback: u64) -> u64 {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            tracing::warn!(key, value = raw, fallback, "Invalid timeout, using default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Medicare"));
    }

    #[test]
    fn state_dir_under_app_data() {
        let state = state_dir();
        assert!(state.starts_with(app_data_dir()));
        assert!(state.ends_with("state"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_without_overrides() {
        let config = AssistantConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AssistantConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AssistantConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://10.0.0.5:9000/"),
            (ENV_TIMEOUT_SECS, "30"),
            (ENV_CONNECT_TIMEOUT_SECS, "2"),
            (ENV_STATE_DIR, "/tmp/medicare-state"),
        ]));
        assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 2);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/medicare-state"));
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = AssistantConfig::from_lookup(lookup(&[
            (ENV_TIMEOUT_SECS, "soon"),
            (ENV_CONNECT_TIMEOUT_SECS, "0"),
            (ENV_API_URL, "   "),
        ]));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }
}
