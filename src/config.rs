//! TOML-based configuration system.
//!
//! Loads the shell settings from a `config.toml` file, falling back to the
//! defaults of a freshly generated site wrapper. Every struct implements
//! `Default` so a missing or partial config file still yields a usable shell.
//!
//! ## Config file search order
//!
//! 1. `SITESHELL_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\SiteShell\config.toml` on Windows)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub links: LinksConfig,
    pub security: SecurityConfig,
    pub shell: ShellConfig,
    pub engine: EngineConfig,
}

/// The wrapped website.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Start page. Its host becomes the trust host.
    pub main_url: String,
    /// Let a URL handed over at launch (view intent, CLI) replace `main_url`.
    pub launch_url_overrides: bool,
}

/// Internal/external link handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub allow_subdomains: bool,
    pub enable_external_links: bool,
    pub open_external_links_in_browser: bool,
    pub confirm_open_in_browser: bool,
    /// Hand non-http(s) links (`tel:`, `intent:`, app schemes) to the OS.
    pub allow_open_mobile_app: bool,
    pub confirm_open_external_app: bool,
}

/// Trust decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub block_localhost_requests: bool,
    /// `user:password`, applied to every HTTP auth challenge. Empty = prompt.
    pub basic_auth: String,
    pub geolocation_enabled: bool,
}

/// Shell UI behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub require_double_back_to_exit: bool,
    pub show_details_on_error_screen: bool,
    /// Exit-confirmation window in milliseconds.
    pub exit_window_ms: u64,
}

/// Browser engine preferences, passed through to the engine binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub javascript: bool,
    pub javascript_can_open_windows: bool,
    pub dom_storage: bool,
    pub database: bool,
    pub media_requires_user_gesture: bool,
    pub allow_file_access: bool,
    pub remote_debugging: bool,
    /// User-agent string. Empty = engine default.
    pub user_agent: String,
    /// Cookies preset for the main URL (`k=v; k2=v2`).
    pub cookies: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Default impls
// ─────────────────────────────────────────────────────────────────────────────

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            main_url: "https://example.com".to_string(),
            launch_url_overrides: true,
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            allow_subdomains: true,
            enable_external_links: true,
            open_external_links_in_browser: true,
            confirm_open_in_browser: true,
            allow_open_mobile_app: false,
            confirm_open_external_app: false,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            block_localhost_requests: true,
            basic_auth: String::new(),
            geolocation_enabled: false,
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            require_double_back_to_exit: true,
            show_details_on_error_screen: false,
            exit_window_ms: 2000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            javascript: true,
            javascript_can_open_windows: true,
            dom_storage: true,
            database: true,
            media_requires_user_gesture: true,
            allow_file_access: true,
            remote_debugging: false,
            user_agent: String::new(),
            cookies: String::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading and saving
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Loads configuration from a TOML file. Never panics: returns defaults
    /// if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Config::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }

    /// Loads configuration from an explicit path, reporting failures.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&content)?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Saves configuration to the platform config directory.
    /// Creates the directory if it doesn't exist.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(&save_path())
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, content)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Effective start page: the launch URL when overrides are allowed,
    /// `site.main_url` otherwise.
    pub fn start_url(&self, launch_url: Option<&Url>) -> Result<Url, ConfigError> {
        if self.site.launch_url_overrides
            && let Some(url) = launch_url
        {
            return Ok(url.clone());
        }
        Url::parse(&self.site.main_url).map_err(|source| ConfigError::InvalidMainUrl {
            url: self.site.main_url.clone(),
            source,
        })
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    // 1. Explicit env var override
    if let Ok(path) = std::env::var("SITESHELL_CONFIG") {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
    }

    // 2. Next to the executable
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 3. Platform config directory
    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 4. Current working directory
    let p = PathBuf::from("config.toml");
    if p.is_file() {
        return Some(p);
    }

    None
}

/// Returns the platform-specific save path for the config file.
fn save_path() -> PathBuf {
    platform_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("SiteShell"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("siteshell"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_generated_wrapper() {
        let c = Config::default();
        assert_eq!(c.site.main_url, "https://example.com");
        assert!(c.links.allow_subdomains);
        assert!(c.links.enable_external_links);
        assert!(c.links.confirm_open_in_browser);
        assert!(!c.links.allow_open_mobile_app);
        assert!(!c.links.confirm_open_external_app);
        assert!(c.security.block_localhost_requests);
        assert!(c.security.basic_auth.is_empty());
        assert!(c.shell.require_double_back_to_exit);
        assert_eq!(c.shell.exit_window_ms, 2000);
        assert!(c.engine.javascript);
        assert!(!c.engine.remote_debugging);
    }

    #[test]
    fn test_empty_toml_returns_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.site.main_url, "https://example.com");
        assert!(config.security.block_localhost_requests);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
[links]
allow_subdomains = false

[security]
basic_auth = "admin:hunter2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.links.allow_subdomains);
        assert!(config.links.enable_external_links); // default
        assert_eq!(config.security.basic_auth, "admin:hunter2");
        assert!(config.security.block_localhost_requests); // default
    }

    #[test]
    fn test_full_toml_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.site.main_url, config.site.main_url);
        assert_eq!(deserialized.shell.exit_window_ms, config.shell.exit_window_ms);
    }

    #[test]
    fn test_start_url_prefers_launch_url() {
        let config = Config::default();
        let launch = Url::parse("https://shop.example.com/item/42").unwrap();
        assert_eq!(config.start_url(Some(&launch)).unwrap(), launch);
        assert_eq!(
            config.start_url(None).unwrap().as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_start_url_ignores_launch_url_when_disabled() {
        let mut config = Config::default();
        config.site.launch_url_overrides = false;
        let launch = Url::parse("https://other.org/").unwrap();
        assert_eq!(
            config.start_url(Some(&launch)).unwrap().host_str(),
            Some("example.com")
        );
    }

    #[test]
    fn test_start_url_invalid_main_url() {
        let mut config = Config::default();
        config.site.main_url = "not a url".to_string();
        assert!(matches!(
            config.start_url(None),
            Err(ConfigError::InvalidMainUrl { .. })
        ));
    }

    #[test]
    fn test_save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siteshell").join("config.toml");

        let mut config = Config::default();
        config.site.main_url = "https://shop.example.org/".to_string();
        config.links.allow_open_mobile_app = true;
        config.shell.exit_window_ms = 3500;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.site.main_url, "https://shop.example.org/");
        assert!(loaded.links.allow_open_mobile_app);
        assert_eq!(loaded.shell.exit_window_ms, 3500);
    }

    #[test]
    fn test_load_from_reports_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[links\nallow_subdomains = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_save_path_not_empty() {
        let path = save_path();
        assert!(!path.as_os_str().is_empty());
    }
}
