use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use storefront_core::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub session_id: Option<String>,
    pub request_timeout_secs: u64,
    pub snapshot_path: PathBuf,
    pub countries_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            csrf_token: None,
            session_id: None,
            request_timeout_secs: 15,
            snapshot_path: "cart.json".into(),
            countries_path: "countries.json".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    csrf_token: Option<String>,
    session_id: Option<String>,
    cookie: Option<String>,
    request_timeout_secs: Option<u64>,
    snapshot_path: Option<PathBuf>,
    countries_path: Option<PathBuf>,
}

impl Settings {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            csrf_token: self.csrf_token.clone(),
            session_id: self.session_id.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Copies both cookies out of a browser `Cookie` header; missing ones leave the current value.
    pub fn apply_cookie_header(&mut self, raw: &str) {
        let parsed = Credentials::from_cookie_header(raw);
        if parsed.csrf_token.is_some() {
            self.csrf_token = parsed.csrf_token;
        }
        if parsed.session_id.is_some() {
            self.session_id = parsed.session_id;
        }
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.base_url {
            self.base_url = v;
        }
        if let Some(v) = file_cfg.cookie {
            self.apply_cookie_header(&v);
        }
        if let Some(v) = file_cfg.csrf_token {
            self.csrf_token = Some(v);
        }
        if let Some(v) = file_cfg.session_id {
            self.session_id = Some(v);
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.snapshot_path {
            self.snapshot_path = v;
        }
        if let Some(v) = file_cfg.countries_path {
            self.countries_path = v;
        }
        Ok(())
    }

    /// Later names win, so `APP__*` overrides `STOREFRONT_*`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        for key in ["STOREFRONT_BASE_URL", "APP__BASE_URL"] {
            if let Some(v) = var(key) {
                self.base_url = v;
            }
        }

        if let Some(v) = var("STOREFRONT_COOKIE") {
            self.apply_cookie_header(&v);
        }

        for key in ["STOREFRONT_CSRF_TOKEN", "APP__CSRF_TOKEN"] {
            if let Some(v) = var(key) {
                self.csrf_token = Some(v);
            }
        }

        for key in ["STOREFRONT_SESSION_ID", "APP__SESSION_ID"] {
            if let Some(v) = var(key) {
                self.session_id = Some(v);
            }
        }

        if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }

        if let Some(v) = var("APP__SNAPSHOT_PATH") {
            self.snapshot_path = v.into();
        }
        if let Some(v) = var("APP__COUNTRIES_PATH") {
            self.countries_path = v.into();
        }
    }
}

/// Defaults, then the optional config file, then the environment.
/// Command line flags are applied on top by the caller.
pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with(
    config_path: &Path,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("invalid config file '{}'", config_path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", config_path.display()))
        }
    }

    settings.apply_env(var);
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
