//! Décisions de navigation et interception des ressources.
//!
//! [`decide`] ne fait aucun effet de bord : l'appelant (le [`SiteShell`])
//! exécute l'action retournée (ouvrir une app externe, afficher une
//! confirmation, ou ne rien faire).
//!
//! [`SiteShell`]: crate::shell::SiteShell

use url::Url;

use crate::domain::{self, Classification};
use crate::policy::PolicyConfig;

/// Opaque identifier of the view that raised a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ViewHandle(pub u64);

/// One navigation event, owned by the dispatch call.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub url: Url,
    pub is_main_frame: bool,
    pub triggering_view: ViewHandle,
}

impl NavigationRequest {
    pub fn main_frame(url: Url) -> Self {
        Self {
            url,
            is_main_frame: true,
            triggering_view: ViewHandle::default(),
        }
    }
}

/// What to do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Le moteur continue le chargement dans la vue courante.
    AllowInPlace,
    /// Bloquée par configuration. Pas une erreur.
    BlockSilently,
    /// Confiée à l'application système capable de gérer l'URL.
    DelegateToExternalHandler(Url),
    /// Confirmation utilisateur, puis délégation si acceptée.
    PromptThenMaybeExternal(Url),
}

impl NavigationAction {
    /// `true` si le moteur doit abandonner le chargement dans la vue.
    pub fn overrides_loading(&self) -> bool {
        !matches!(self, Self::AllowInPlace)
    }
}

/// Décide du sort d'une navigation.
///
/// Un schéma non-web autorisé part directement vers l'application externe ;
/// si `confirm_non_http_scheme` est activé (désactivé par défaut), une
/// confirmation est demandée d'abord, comme pour les liens externes.
pub fn decide(request: &NavigationRequest, config: &PolicyConfig) -> NavigationAction {
    let url = &request.url;

    // ── 1. Schémas non-web (tel:, mailto:, intent:, schémas d'apps) ────
    if !is_web_scheme(url) {
        if !config.allow_non_http_schemes() {
            return NavigationAction::BlockSilently;
        }
        if config.confirm_non_http_scheme() {
            return NavigationAction::PromptThenMaybeExternal(url.clone());
        }
        return NavigationAction::DelegateToExternalHandler(url.clone());
    }

    // ── 2-3. Classification interne / externe ──────────────────────────
    let classification = match url.host_str() {
        Some(host) => domain::classify(host, config.trust_host(), config.match_subdomains()),
        None => Classification::External,
    };
    if classification == Classification::Internal {
        return NavigationAction::AllowInPlace;
    }

    // ── 4. Lien externe : politique fermée ─────────────────────────────
    if !config.allow_external_links() || !config.external_links_in_browser() {
        return NavigationAction::BlockSilently;
    }
    if config.confirm_before_browser_open() {
        NavigationAction::PromptThenMaybeExternal(url.clone())
    } else {
        NavigationAction::DelegateToExternalHandler(url.clone())
    }
}

fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// `true` si la ressource vers `host` doit être bloquée (hôte loopback).
pub fn should_block_resource(host: &str, block_loopback_hosts: bool) -> bool {
    block_loopback_hosts && is_loopback_host(host)
}

fn is_loopback_host(host: &str) -> bool {
    let host = host.trim();
    host == "127.0.0.1"
        || host == "::1"
        || host == "[::1]"
        || host.eq_ignore_ascii_case("localhost")
}

/// Réponse vide servie à la place d'une ressource bloquée.
///
/// Le moteur reçoit une réponse valide (et non une erreur réseau) pour ne pas
/// déclencher l'écran d'erreur à cause d'une sous-ressource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedResponse {
    pub mime_type: &'static str,
    pub encoding: &'static str,
    pub cache_control: &'static str,
    pub body: Vec<u8>,
}

impl Default for BlockedResponse {
    fn default() -> Self {
        Self {
            mime_type: "text/plain",
            encoding: "UTF-8",
            cache_control: "no-store",
            body: Vec::new(),
        }
    }
}
