use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub database_url: String,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            database_url: "sqlite://./data/console.db".into(),
            debounce_ms: 400,
            request_timeout_secs: 30,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("console.toml") {
        apply_file_settings(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("server_url") {
            settings.server_url = v.clone();
        }
        if let Some(v) = file_cfg.get("database_url") {
            settings.database_url = v.clone();
        }
        if let Some(v) = file_cfg.get("debounce_ms") {
            if let Ok(parsed) = v.parse::<u64>() {
                settings.debounce_ms = parsed;
            }
        }
        if let Some(v) = file_cfg.get("request_timeout_secs") {
            if let Ok(parsed) = v.parse::<u64>() {
                settings.request_timeout_secs = parsed;
            }
        }
    }
}

// The `APP__` form wins over the plain name; unparseable numerics keep
// the current value.
fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__DEBOUNCE_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.debounce_ms = parsed;
        }
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

// Accepts plain file paths as well as sqlite URLs, so
// `--database-url ./console.db` works the same as the URL form.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(normalize_database_url("sqlite:./x.db"), "sqlite://./x.db");
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    fn empty_database_url_falls_back_to_the_default() {
        assert_eq!(
            normalize_database_url("  "),
            Settings::default().database_url
        );
    }

    #[test]
    fn file_settings_override_known_keys_only() {
        let mut settings = Settings::default();
        apply_file_settings(
            &mut settings,
            "server_url = \"https://ops.example.com\"\nunknown = \"ignored\"\n",
        );
        assert_eq!(settings.server_url, "https://ops.example.com");
        assert_eq!(settings.database_url, Settings::default().database_url);
    }

    #[test]
    fn malformed_settings_file_is_ignored() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "server_url = [1, 2]");
        assert_eq!(settings.server_url, Settings::default().server_url);
    }

    #[test]
    fn quoted_numeric_file_values_parse() {
        let mut settings = Settings::default();
        apply_file_settings(
            &mut settings,
            "debounce_ms = \"250\"\nrequest_timeout_secs = \"ten\"\n",
        );
        assert_eq!(settings.debounce_ms, 250);
        assert_eq!(
            settings.request_timeout_secs,
            Settings::default().request_timeout_secs
        );
    }

    #[test]
    fn prefixed_env_name_beats_file_and_plain_values() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "server_url = \"https://file.example.com\"\n");
        let env: HashMap<&str, &str> = [
            ("SERVER_URL", "https://plain.example.com"),
            ("APP__SERVER_URL", "https://app.example.com"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()));
        assert_eq!(settings.server_url, "https://app.example.com");
    }

    #[test]
    fn plain_env_name_applies_on_its_own() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| {
            (name == "DATABASE_URL").then(|| "sqlite://./env.db".to_string())
        });
        assert_eq!(settings.database_url, "sqlite://./env.db");
        assert_eq!(settings.server_url, Settings::default().server_url);
    }

    #[test]
    fn numeric_env_values_parse_or_keep_the_default() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| match name {
            "APP__DEBOUNCE_MS" => Some("soon".to_string()),
            "APP__REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        });
        assert_eq!(settings.debounce_ms, Settings::default().debounce_ms);
        assert_eq!(settings.request_timeout_secs, 5);
    }
}
