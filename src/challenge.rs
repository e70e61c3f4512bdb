//! Certificate and HTTP-auth challenges.
//!
//! A certificate override is always an explicit, per-occurrence user decision:
//! nothing is remembered and nothing is accepted without a prompt. HTTP auth
//! uses the stored credential when one is configured (for every host), and
//! prompts otherwise.

use tracing::{debug, info, warn};

use crate::host::Prompter;
use crate::policy::{BasicAuthCredential, PolicyConfig};
use crate::sink::ResolutionSink;

/// Answer to a certificate error. Defaults to the safe side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificateDecision {
    AcceptOnce,
    #[default]
    Reject,
}

/// Answer to an HTTP auth challenge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthResponse {
    Proceed(BasicAuthCredential),
    #[default]
    Cancel,
}

/// A suspended security challenge together with its sink.
#[derive(Debug)]
pub enum ChallengeContext {
    CertificateError {
        hostname: String,
        sink: ResolutionSink<CertificateDecision>,
    },
    HttpAuthChallenge {
        host: String,
        realm: String,
        sink: ResolutionSink<AuthResponse>,
    },
    GeolocationPermission {
        origin: String,
        sink: ResolutionSink<bool>,
    },
}

/// Resolves trust challenges, automatically or through the [`Prompter`].
#[derive(Debug, Clone)]
pub struct SecurityChallengeHandler {
    credential: Option<BasicAuthCredential>,
    geolocation_enabled: bool,
}

impl SecurityChallengeHandler {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            credential: config.basic_auth_credential().cloned(),
            geolocation_enabled: config.geolocation_enabled(),
        }
    }

    /// Routes a challenge to the matching resolver.
    pub fn handle(&self, challenge: ChallengeContext, prompter: &dyn Prompter) {
        match challenge {
            ChallengeContext::CertificateError { hostname, sink } => {
                self.resolve_certificate_error(&hostname, sink, prompter)
            }
            ChallengeContext::HttpAuthChallenge { host, realm, sink } => {
                self.resolve_http_auth(&host, &realm, sink, prompter)
            }
            ChallengeContext::GeolocationPermission { origin, sink } => {
                self.resolve_geolocation(&origin, sink)
            }
        }
    }

    /// Always asks the user. There is no stored override policy.
    pub fn resolve_certificate_error(
        &self,
        hostname: &str,
        sink: ResolutionSink<CertificateDecision>,
        prompter: &dyn Prompter,
    ) {
        warn!(hostname, "Certificate error, asking the user");
        prompter.confirm_certificate(hostname, sink);
    }

    pub fn resolve_http_auth(
        &self,
        host: &str,
        realm: &str,
        sink: ResolutionSink<AuthResponse>,
        prompter: &dyn Prompter,
    ) {
        match &self.credential {
            Some(credential) => {
                debug!(host, realm, "HTTP auth answered with stored credential");
                sink.resolve(AuthResponse::Proceed(credential.clone()));
            }
            None => {
                info!(host, realm, "HTTP auth challenge, prompting for credentials");
                prompter.prompt_credentials(host, realm, sink);
            }
        }
    }

    /// Geolocation requests are answered from configuration and never retained.
    pub fn resolve_geolocation(&self, origin: &str, sink: ResolutionSink<bool>) {
        debug!(origin, granted = self.geolocation_enabled, "Geolocation permission");
        sink.resolve(self.geolocation_enabled);
    }
}
