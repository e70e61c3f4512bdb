//! Façade événementielle entre le moteur de navigation et l'application hôte.
//!
//! Chaque événement remonté par le moteur est routé vers exactement un
//! composant :
//!
//! ```text
//! navigation / ressource   → navigation::decide / should_block_resource
//! certificat / auth / géo  → SecurityChallengeHandler
//! sélection de fichier     → TransferInterceptor (slot unique)
//! téléchargement           → TransferInterceptor → HostShell
//! chargement / erreur      → PageLifecycle → ViewEffect → HostShell
//! retour                   → PageLifecycle (sous-machine de sortie)
//! ```
//!
//! Tout s'exécute sur le thread UI : état mutable dans des `RefCell`, comme
//! l'état partagé d'un delegate de webview. Les effets de bord passent par
//! [`HostShell`] et [`Prompter`], jamais directement par le système.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};
use url::Url;

use crate::challenge::{AuthResponse, CertificateDecision, ChallengeContext, SecurityChallengeHandler};
use crate::error::ShellError;
use crate::host::{HostShell, Notice, Prompter};
use crate::lifecycle::{BackOutcome, Clock, LifecycleState, PageLifecycle, SystemClock, ViewEffect};
use crate::navigation::{self, BlockedResponse, NavigationAction, NavigationRequest};
use crate::policy::PolicyConfig;
use crate::sink::{ResolutionSink, SinkScope};
use crate::transfer::{self, DownloadJob, DownloadRequest, FileSelection, TransferInterceptor};

/// Moteur de politique de navigation d'une fenêtre d'application.
pub struct SiteShell {
    /// Déclaré en premier : détruit avant le slot de fichiers, ce qui rend
    /// inertes les sinks encore en attente au moment du démontage.
    scope: SinkScope,
    config: PolicyConfig,
    challenges: SecurityChallengeHandler,
    transfers: RefCell<TransferInterceptor>,
    lifecycle: RefCell<PageLifecycle>,
    host: Rc<dyn HostShell>,
    prompter: Rc<dyn Prompter>,
    clock: Box<dyn Clock>,
}

impl SiteShell {
    pub fn new(config: PolicyConfig, host: Rc<dyn HostShell>, prompter: Rc<dyn Prompter>) -> Self {
        Self {
            scope: SinkScope::new(),
            challenges: SecurityChallengeHandler::new(&config),
            transfers: RefCell::new(TransferInterceptor::new()),
            lifecycle: RefCell::new(PageLifecycle::new(&config)),
            config,
            host,
            prompter,
            clock: Box::new(SystemClock),
        }
    }

    /// Remplace l'horloge système (tests, rejeu).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Navigation et ressources
    // ─────────────────────────────────────────────────────────────────────

    /// Décide puis exécute. Le moteur ne poursuit le chargement que si
    /// l'action est [`NavigationAction::AllowInPlace`].
    pub fn on_navigation_requested(&self, request: &NavigationRequest) -> NavigationAction {
        let action = navigation::decide(request, &self.config);
        match &action {
            NavigationAction::AllowInPlace => {}
            NavigationAction::BlockSilently => {
                debug!(url = %request.url, "Navigation bloquée par la politique");
            }
            NavigationAction::DelegateToExternalHandler(url) => {
                open_external(self.host.as_ref(), url);
            }
            NavigationAction::PromptThenMaybeExternal(url) => {
                let host = Rc::clone(&self.host);
                let target = url.clone();
                let sink = ResolutionSink::new("external-open", move |accepted: bool| {
                    if accepted {
                        open_external(host.as_ref(), &target);
                    } else {
                        debug!(url = %target, "Ouverture externe refusée");
                    }
                })
                .bind(&self.scope);
                self.prompter.confirm_external_open(url, sink);
            }
        }
        action
    }

    /// `true` si la ressource vers `host` doit être bloquée.
    pub fn on_resource_requested(&self, host: &str) -> bool {
        let blocked = navigation::should_block_resource(host, self.config.block_loopback_hosts());
        if blocked {
            debug!(host, "Requête loopback bloquée");
        }
        blocked
    }

    /// Variante par URL : retourne la réponse vide à servir si bloquée.
    pub fn intercept_resource(&self, url: &Url) -> Option<BlockedResponse> {
        let host = url.host_str()?;
        self.on_resource_requested(host)
            .then(BlockedResponse::default)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Défis de sécurité
    // ─────────────────────────────────────────────────────────────────────

    pub fn on_certificate_error(&self, hostname: &str, sink: ResolutionSink<CertificateDecision>) {
        self.dispatch_challenge(ChallengeContext::CertificateError {
            hostname: hostname.to_string(),
            sink: sink.bind(&self.scope),
        });
    }

    pub fn on_http_auth_challenge(&self, host: &str, realm: &str, sink: ResolutionSink<AuthResponse>) {
        self.dispatch_challenge(ChallengeContext::HttpAuthChallenge {
            host: host.to_string(),
            realm: realm.to_string(),
            sink: sink.bind(&self.scope),
        });
    }

    pub fn on_geolocation_permission(&self, origin: &str, sink: ResolutionSink<bool>) {
        self.dispatch_challenge(ChallengeContext::GeolocationPermission {
            origin: origin.to_string(),
            sink: sink.bind(&self.scope),
        });
    }

    fn dispatch_challenge(&self, challenge: ChallengeContext) {
        self.challenges.handle(challenge, self.prompter.as_ref());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fichiers et téléchargements
    // ─────────────────────────────────────────────────────────────────────

    /// Ouvre le sélecteur natif. Retourne `false` si l'hôte n'a pas pu
    /// l'ouvrir (la sélection est alors résolue « aucune sélection »).
    ///
    /// Les sinks sont toujours résolus hors emprunt du slot : le moteur peut
    /// rappeler le shell depuis leur callback.
    pub fn on_file_chooser_requested(
        &self,
        accept_types: Vec<String>,
        allow_multiple: bool,
        sink: ResolutionSink<FileSelection>,
    ) -> bool {
        let stale = self.transfers.borrow_mut().take_pending();
        if let Some(stale) = stale {
            debug!("Sélection de fichiers remplacée");
            stale.cancel();
        }

        let (request, superseded) = self.transfers.borrow_mut().begin_file_selection(
            accept_types,
            allow_multiple,
            sink.bind(&self.scope),
        );
        // Sélecteur ouvert depuis le callback de l'ancienne sélection.
        if let Some(superseded) = superseded {
            superseded.cancel();
        }

        match self.host.launch_file_picker(&request) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Impossible d'ouvrir le sélecteur de fichiers");
                let pending = self.transfers.borrow_mut().take_pending();
                if let Some(pending) = pending {
                    pending.cancel();
                }
                self.host.notify(Notice::FilePickerUnavailable);
                false
            }
        }
    }

    /// Résultat du sélecteur natif. Sans effet si rien n'est en attente.
    pub fn complete_file_selection(&self, selection: FileSelection) -> bool {
        let pending = self.transfers.borrow_mut().take_pending();
        match pending {
            Some(pending) => {
                pending.resolve(selection);
                true
            }
            None => {
                debug!("Sélection de fichiers reçue sans demande en attente");
                false
            }
        }
    }

    pub fn on_download_requested(&self, request: &DownloadRequest) -> Result<DownloadJob, ShellError> {
        transfer::intercept_download(request, self.host.as_ref())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cycle de vie de la page
    // ─────────────────────────────────────────────────────────────────────

    pub fn on_main_frame_load_finished(&self) {
        let effects = self.lifecycle.borrow_mut().on_main_frame_load_finished();
        self.apply(effects);
    }

    pub fn on_main_frame_load_error(&self, description: &str) {
        let effects = self
            .lifecycle
            .borrow_mut()
            .on_main_frame_load_error(description);
        self.apply(effects);
    }

    pub fn on_sub_frame_load_error(&self, description: &str) {
        self.lifecycle.borrow().on_sub_frame_load_error(description);
    }

    /// Action « Réessayer » de l'écran d'erreur.
    pub fn retry_after_error(&self) {
        let effects = self.lifecycle.borrow_mut().retry();
        self.apply(effects);
    }

    /// Appui sur « retour ». Toujours consommé par le shell.
    pub fn on_back_navigation_requested(&self) -> bool {
        let can_go_back = self.host.can_go_back();
        let outcome = self
            .lifecycle
            .borrow_mut()
            .on_back(can_go_back, self.clock.now());

        match outcome {
            BackOutcome::NavigatedBack => self.host.go_back(),
            BackOutcome::ExitArmed => self.host.notify(Notice::ExitArmed),
            BackOutcome::Exit => {
                info!("Fermeture de l'application");
                self.host.terminate();
            }
        }
        true
    }

    pub fn current_lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.borrow().state()
    }

    pub fn is_exit_armed(&self) -> bool {
        self.lifecycle.borrow().is_exit_armed(self.clock.now())
    }

    pub fn has_pending_file_selection(&self) -> bool {
        self.transfers.borrow().has_pending_selection()
    }

    fn apply(&self, effects: Vec<ViewEffect>) {
        for effect in effects {
            self.host.apply_view(effect);
        }
    }
}

/// Confie `url` à l'application système. Un échec est signalé, jamais fatal.
fn open_external(host: &dyn HostShell, url: &Url) {
    match host.launch_external(url) {
        Ok(()) => info!(url = %url, "URL confiée à une application externe"),
        Err(e) => {
            warn!(url = %url, error = %e, "Aucune application pour cette URL");
            host.notify(Notice::NoHandler {
                url: url.to_string(),
            });
        }
    }
}
