//! Browser engine preferences for the wrapped site.
//!
//! Builds the [`EngineSettings`] the engine binding applies to its webview
//! before the first load:
//! - JavaScript, DOM storage and database toggles
//! - user-agent override (empty = engine default)
//! - cookies preset for the start URL
//! - geolocation only when the policy grants it

use tracing::info;
use url::Url;

use crate::config::Config;

/// Preferences applied to the webview at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub javascript: bool,
    pub javascript_can_open_windows: bool,
    pub dom_storage: bool,
    pub database: bool,
    pub media_requires_user_gesture: bool,
    pub allow_file_access: bool,
    pub geolocation: bool,
    pub remote_debugging: bool,
    pub user_agent: Option<String>,
    /// `(url, cookie string)` to seed the cookie store with.
    pub preset_cookies: Option<(Url, String)>,
}

/// Builds engine settings for `start_url` from the configuration file.
pub fn build_engine_settings(config: &Config, start_url: &Url) -> EngineSettings {
    let engine = &config.engine;

    let user_agent = Some(engine.user_agent.trim())
        .filter(|ua| !ua.is_empty())
        .map(str::to_string);
    let preset_cookies = Some(engine.cookies.trim())
        .filter(|c| !c.is_empty())
        .map(|c| (start_url.clone(), c.to_string()));

    let settings = EngineSettings {
        javascript: engine.javascript,
        javascript_can_open_windows: engine.javascript_can_open_windows,
        dom_storage: engine.dom_storage,
        database: engine.database,
        media_requires_user_gesture: engine.media_requires_user_gesture,
        allow_file_access: engine.allow_file_access,
        geolocation: config.security.geolocation_enabled,
        remote_debugging: engine.remote_debugging,
        user_agent,
        preset_cookies,
    };

    info!(
        start_url = %start_url,
        javascript = settings.javascript,
        dom_storage = settings.dom_storage,
        custom_ua = settings.user_agent.is_some(),
        preset_cookies = settings.preset_cookies.is_some(),
        remote_debugging = settings.remote_debugging,
        "Engine settings configured"
    );

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_defaults_enable_site_features() {
        let settings = build_engine_settings(&Config::default(), &start());
        assert!(settings.javascript);
        assert!(settings.dom_storage);
        assert!(settings.database);
        assert!(settings.media_requires_user_gesture);
        assert!(!settings.geolocation);
        assert!(!settings.remote_debugging);
    }

    #[test]
    fn test_empty_user_agent_keeps_engine_default() {
        let settings = build_engine_settings(&Config::default(), &start());
        assert!(settings.user_agent.is_none());
    }

    #[test]
    fn test_user_agent_override() {
        let mut config = Config::default();
        config.engine.user_agent = "SiteShell/0.1".to_string();
        let settings = build_engine_settings(&config, &start());
        assert_eq!(settings.user_agent.as_deref(), Some("SiteShell/0.1"));
    }

    #[test]
    fn test_cookies_preset_for_start_url() {
        let mut config = Config::default();
        config.engine.cookies = "lang=fr; theme=dark".to_string();
        let settings = build_engine_settings(&config, &start());
        let (url, cookies) = settings.preset_cookies.unwrap();
        assert_eq!(url, start());
        assert_eq!(cookies, "lang=fr; theme=dark");
    }

    #[test]
    fn test_geolocation_follows_security_section() {
        let mut config = Config::default();
        config.security.geolocation_enabled = true;
        assert!(build_engine_settings(&config, &start()).geolocation);
    }
}
