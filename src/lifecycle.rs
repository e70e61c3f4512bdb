//! Cycle de vie de la page : machine à états spinner / contenu / erreur.
//!
//! ```text
//!            load_finished              load_error
//! Loading ─────────────────▶ Loaded ─────────────────▶ Errored
//!    │                                                   │
//!    └───────────────── load_error ─────────────────────▶│
//!    ◀──────────────────────── retry ────────────────────┘
//! ```
//!
//! Les transitions retournent des [`ViewEffect`] que le shell applique ; ce
//! module ne touche à aucune vue. Les erreurs de sous-frames ne changent
//! jamais l'état.
//!
//! La confirmation de sortie (double appui sur « retour ») est une
//! sous-machine parallèle basée sur une échéance monotone comparée à
//! l'heure courante, sans minuterie à annuler.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::policy::PolicyConfig;

/// État visible de la page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Loading,
    Loaded,
    Errored,
}

/// Changement de visibilité à appliquer par l'hôte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    ShowLoadingIndicator,
    HideLoadingIndicator,
    /// Affichage du contenu avec fondu (une seule fois par chargement).
    RevealContent,
    HideContent,
    /// Remplace la vue de contenu par l'écran d'erreur.
    ShowErrorView { detail: Option<String> },
    /// Remet la vue de contenu à la place de l'écran d'erreur.
    RestoreContentView,
    /// Relance la navigation courante.
    Reload,
}

/// Résultat d'un appui sur « retour ».
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    NavigatedBack,
    /// Premier appui à la racine : un second appui dans la fenêtre quitte.
    ExitArmed,
    Exit,
}

/// Source de temps monotone, injectable pour les tests.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Horloge pilotée à la main.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Machine à états du chargement et de la sortie.
#[derive(Debug)]
pub struct PageLifecycle {
    state: LifecycleState,
    /// Le fondu d'apparition a déjà eu lieu pour ce chargement.
    content_revealed: bool,
    show_error_details: bool,
    exit_confirmation: bool,
    exit_window: Duration,
    exit_armed_until: Option<Instant>,
}

impl PageLifecycle {
    /// Démarre en `Loading`, sortie non armée.
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            state: LifecycleState::Loading,
            content_revealed: false,
            show_error_details: config.show_error_details(),
            exit_confirmation: config.exit_confirmation(),
            exit_window: config.exit_window(),
            exit_armed_until: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn on_main_frame_load_finished(&mut self) -> Vec<ViewEffect> {
        match self.state {
            LifecycleState::Loading => {
                self.state = LifecycleState::Loaded;
                let mut effects = vec![ViewEffect::HideLoadingIndicator];
                if !self.content_revealed {
                    self.content_revealed = true;
                    effects.push(ViewEffect::RevealContent);
                }
                info!("Page loaded");
                effects
            }
            LifecycleState::Loaded => Vec::new(),
            LifecycleState::Errored => {
                // Le moteur signale aussi la fin du chargement d'une page en erreur.
                debug!("Load finished after error, reveal suppressed");
                Vec::new()
            }
        }
    }

    pub fn on_main_frame_load_error(&mut self, description: &str) -> Vec<ViewEffect> {
        warn!(description, "Main frame failed to load");
        if self.state == LifecycleState::Errored {
            return Vec::new();
        }

        self.state = LifecycleState::Errored;
        let detail = self
            .show_error_details
            .then(|| format!("Error: {description}"));
        vec![ViewEffect::ShowErrorView { detail }]
    }

    pub fn on_sub_frame_load_error(&self, description: &str) {
        debug!(description, state = ?self.state, "Sub-frame error ignored");
    }

    /// Action « Réessayer » de l'écran d'erreur. Sans effet hors `Errored`.
    pub fn retry(&mut self) -> Vec<ViewEffect> {
        if self.state != LifecycleState::Errored {
            debug!(state = ?self.state, "Retry ignored");
            return Vec::new();
        }

        info!("Retrying after error");
        self.state = LifecycleState::Loading;
        self.content_revealed = false;
        vec![
            ViewEffect::RestoreContentView,
            ViewEffect::HideContent,
            ViewEffect::ShowLoadingIndicator,
            ViewEffect::Reload,
        ]
    }

    /// Appui sur « retour ». L'historique passe toujours en premier, quel
    /// que soit l'état de la page.
    pub fn on_back(&mut self, can_go_back: bool, now: Instant) -> BackOutcome {
        if can_go_back {
            return BackOutcome::NavigatedBack;
        }

        if !self.exit_confirmation || self.is_exit_armed(now) {
            self.exit_armed_until = None;
            return BackOutcome::Exit;
        }

        self.exit_armed_until = Some(now + self.exit_window);
        BackOutcome::ExitArmed
    }

    /// Vrai tant que l'échéance de confirmation n'est pas dépassée.
    pub fn is_exit_armed(&self, now: Instant) -> bool {
        self.exit_armed_until.is_some_and(|deadline| now < deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyOptions;

    fn lifecycle(options: PolicyOptions) -> PageLifecycle {
        PageLifecycle::new(&PolicyConfig::new("example.com", options).unwrap())
    }

    #[test]
    fn test_starts_loading() {
        let page = lifecycle(PolicyOptions::default());
        assert_eq!(page.state(), LifecycleState::Loading);
        assert!(!page.is_exit_armed(Instant::now()));
    }

    #[test]
    fn test_load_finished_reveals_once() {
        let mut page = lifecycle(PolicyOptions::default());
        assert_eq!(
            page.on_main_frame_load_finished(),
            vec![ViewEffect::HideLoadingIndicator, ViewEffect::RevealContent]
        );
        assert_eq!(page.state(), LifecycleState::Loaded);
        assert!(page.on_main_frame_load_finished().is_empty());
    }

    #[test]
    fn test_full_cycle_loaded_errored_retry() {
        let mut page = lifecycle(PolicyOptions::default());
        page.on_main_frame_load_finished();

        let effects = page.on_main_frame_load_error("net::ERR_NAME_NOT_RESOLVED");
        assert_eq!(effects, vec![ViewEffect::ShowErrorView { detail: None }]);
        assert_eq!(page.state(), LifecycleState::Errored);

        let effects = page.retry();
        assert_eq!(page.state(), LifecycleState::Loading);
        assert_eq!(effects.last(), Some(&ViewEffect::Reload));
        assert!(effects.contains(&ViewEffect::ShowLoadingIndicator));
        assert!(effects.contains(&ViewEffect::RestoreContentView));

        // Le contenu est de nouveau révélé avec fondu après le retry.
        assert!(page
            .on_main_frame_load_finished()
            .contains(&ViewEffect::RevealContent));
    }

    #[test]
    fn test_error_suppresses_pending_reveal() {
        let mut page = lifecycle(PolicyOptions::default());
        page.on_main_frame_load_error("timeout");
        assert!(page.on_main_frame_load_finished().is_empty());
        assert_eq!(page.state(), LifecycleState::Errored);
    }

    #[test]
    fn test_error_details_when_enabled() {
        let mut page = lifecycle(PolicyOptions {
            show_error_details: true,
            ..PolicyOptions::default()
        });
        assert_eq!(
            page.on_main_frame_load_error("net::ERR_CONNECTION_REFUSED"),
            vec![ViewEffect::ShowErrorView {
                detail: Some("Error: net::ERR_CONNECTION_REFUSED".to_string())
            }]
        );
    }

    #[test]
    fn test_repeated_error_does_not_swap_again() {
        let mut page = lifecycle(PolicyOptions::default());
        page.on_main_frame_load_error("a");
        assert!(page.on_main_frame_load_error("b").is_empty());
    }

    #[test]
    fn test_sub_frame_error_keeps_state() {
        let page = lifecycle(PolicyOptions::default());
        page.on_sub_frame_load_error("ad iframe blocked");
        assert_eq!(page.state(), LifecycleState::Loading);
    }

    #[test]
    fn test_retry_is_idempotent() {
        let mut page = lifecycle(PolicyOptions::default());
        assert!(page.retry().is_empty());
        page.on_main_frame_load_error("offline");
        assert!(!page.retry().is_empty());
        assert!(page.retry().is_empty());
        assert_eq!(page.state(), LifecycleState::Loading);
    }

    #[test]
    fn test_back_with_history_always_navigates() {
        let mut page = lifecycle(PolicyOptions::default());
        let now = Instant::now();
        page.on_main_frame_load_error("x");
        assert_eq!(page.on_back(true, now), BackOutcome::NavigatedBack);
        assert!(!page.is_exit_armed(now));
    }

    #[test]
    fn test_double_back_within_window_exits() {
        let clock = ManualClock::new();
        let mut page = lifecycle(PolicyOptions::default());
        assert_eq!(page.on_back(false, clock.now()), BackOutcome::ExitArmed);
        assert!(page.is_exit_armed(clock.now()));
        clock.advance(Duration::from_millis(1500));
        assert_eq!(page.on_back(false, clock.now()), BackOutcome::Exit);
    }

    #[test]
    fn test_exit_window_expires() {
        let clock = ManualClock::new();
        let mut page = lifecycle(PolicyOptions::default());
        page.on_back(false, clock.now());
        clock.advance(Duration::from_millis(2000));
        assert!(!page.is_exit_armed(clock.now()));
        assert_eq!(page.on_back(false, clock.now()), BackOutcome::ExitArmed);
    }

    #[test]
    fn test_rearm_supersedes_previous_deadline() {
        let clock = ManualClock::new();
        let mut page = lifecycle(PolicyOptions::default());
        page.on_back(false, clock.now());
        clock.advance(Duration::from_secs(3));
        page.on_back(false, clock.now());
        clock.advance(Duration::from_millis(1900));
        assert_eq!(page.on_back(false, clock.now()), BackOutcome::Exit);
    }

    #[test]
    fn test_exit_without_confirmation() {
        let mut page = lifecycle(PolicyOptions {
            exit_confirmation: false,
            ..PolicyOptions::default()
        });
        assert_eq!(page.on_back(false, Instant::now()), BackOutcome::Exit);
    }
}
