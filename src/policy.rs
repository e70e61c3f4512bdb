//! Immutable policy configuration.
//!
//! [`PolicyConfig`] is resolved once at startup (usually from [`Config`]) and
//! only read afterwards. It holds the trust host and every toggle consumed by
//! the deciders, the challenge handler and the page lifecycle.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};
use url::{Host, Url};

use crate::config::Config;
use crate::error::ConfigError;

/// Stored HTTP basic-auth credential.
///
/// Applied to every challenge regardless of host: the configuration surface
/// has no per-host structure.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthCredential {
    pub username: String,
    pub password: String,
}

impl BasicAuthCredential {
    /// Parses the `user:password` form. The password may itself contain `:`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (username, password) = raw.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for BasicAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Toggles accepted by [`PolicyConfig::new`].
#[derive(Debug, Clone)]
pub struct PolicyOptions {
    pub match_subdomains: bool,
    pub allow_external_links: bool,
    pub external_links_in_browser: bool,
    pub confirm_before_browser_open: bool,
    pub allow_non_http_schemes: bool,
    pub confirm_non_http_scheme: bool,
    pub block_loopback_hosts: bool,
    pub basic_auth_credential: Option<BasicAuthCredential>,
    pub geolocation_enabled: bool,
    pub exit_confirmation: bool,
    pub exit_window: Duration,
    pub show_error_details: bool,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            match_subdomains: true,
            allow_external_links: true,
            external_links_in_browser: true,
            confirm_before_browser_open: true,
            allow_non_http_schemes: false,
            confirm_non_http_scheme: false,
            block_loopback_hosts: true,
            basic_auth_credential: None,
            geolocation_enabled: false,
            exit_confirmation: true,
            exit_window: Duration::from_millis(2000),
            show_error_details: false,
        }
    }
}

/// Read-only policy shared by every component of the shell.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    trust_host: String,
    options: PolicyOptions,
}

impl PolicyConfig {
    /// Validates `trust_host` and freezes the options.
    pub fn new(trust_host: &str, options: PolicyOptions) -> Result<Self, ConfigError> {
        let trimmed = trust_host.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyTrustHost);
        }
        let host = Host::parse(trimmed)
            .map_err(|_| ConfigError::InvalidTrustHost(trimmed.to_string()))?;

        Ok(Self {
            trust_host: host.to_string(),
            options,
        })
    }

    /// Builds the policy from the configuration file, taking the trust host
    /// from the effective start URL.
    pub fn from_config(config: &Config, launch_url: Option<&Url>) -> Result<Self, ConfigError> {
        let start_url = config.start_url(launch_url)?;
        let host = start_url
            .host_str()
            .ok_or_else(|| ConfigError::MissingHost(start_url.to_string()))?;

        let basic_auth_credential = if config.security.basic_auth.is_empty() {
            None
        } else {
            let parsed = BasicAuthCredential::parse(&config.security.basic_auth);
            if parsed.is_none() {
                warn!("basic_auth is not in `user:password` form, ignoring it");
            }
            parsed
        };

        let options = PolicyOptions {
            match_subdomains: config.links.allow_subdomains,
            allow_external_links: config.links.enable_external_links,
            external_links_in_browser: config.links.open_external_links_in_browser,
            confirm_before_browser_open: config.links.confirm_open_in_browser,
            allow_non_http_schemes: config.links.allow_open_mobile_app,
            confirm_non_http_scheme: config.links.confirm_open_external_app,
            block_loopback_hosts: config.security.block_localhost_requests,
            basic_auth_credential,
            geolocation_enabled: config.security.geolocation_enabled,
            exit_confirmation: config.shell.require_double_back_to_exit,
            exit_window: Duration::from_millis(config.shell.exit_window_ms),
            show_error_details: config.shell.show_details_on_error_screen,
        };

        let policy = Self::new(host, options)?;
        info!(
            trust_host = %policy.trust_host,
            subdomains = policy.options.match_subdomains,
            external_links = policy.options.allow_external_links,
            loopback_blocked = policy.options.block_loopback_hosts,
            stored_credential = policy.options.basic_auth_credential.is_some(),
            "Navigation policy resolved"
        );
        Ok(policy)
    }

    pub fn trust_host(&self) -> &str {
        &self.trust_host
    }

    pub fn match_subdomains(&self) -> bool {
        self.options.match_subdomains
    }

    pub fn allow_external_links(&self) -> bool {
        self.options.allow_external_links
    }

    pub fn external_links_in_browser(&self) -> bool {
        self.options.external_links_in_browser
    }

    pub fn confirm_before_browser_open(&self) -> bool {
        self.options.confirm_before_browser_open
    }

    pub fn allow_non_http_schemes(&self) -> bool {
        self.options.allow_non_http_schemes
    }

    pub fn confirm_non_http_scheme(&self) -> bool {
        self.options.confirm_non_http_scheme
    }

    pub fn block_loopback_hosts(&self) -> bool {
        self.options.block_loopback_hosts
    }

    pub fn basic_auth_credential(&self) -> Option<&BasicAuthCredential> {
        self.options.basic_auth_credential.as_ref()
    }

    pub fn geolocation_enabled(&self) -> bool {
        self.options.geolocation_enabled
    }

    pub fn exit_confirmation(&self) -> bool {
        self.options.exit_confirmation
    }

    pub fn exit_window(&self) -> Duration {
        self.options.exit_window
    }

    pub fn show_error_details(&self) -> bool {
        self.options.show_error_details
    }
}
