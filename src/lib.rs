//! # SiteShell — moteur de politique de navigation
//!
//! Cœur décisionnel d'une application qui embarque un moteur web pour
//! présenter un seul site. Le moteur (rendu, réseau, JavaScript) et la
//! plateforme (dialogues, gestionnaire de téléchargements, sélecteur de
//! fichiers) sont des collaborateurs externes ; ce crate décide seulement de
//! ce qui arrive à chaque événement qu'ils remontent.
//!
//! ## Architecture des modules
//!
//! - [`config`] : Fichier `config.toml` (ordre de recherche, valeurs par défaut).
//!
//! - [`policy`] : [`PolicyConfig`](policy::PolicyConfig), configuration immuable
//!   résolue au démarrage (trust host, liens externes, loopback, identifiants).
//!
//! - [`domain`] : Classification interne / externe d'un hôte, par frontière de labels.
//!
//! - [`navigation`] : Décision par navigation ([`NavigationAction`](navigation::NavigationAction))
//!   et blocage des ressources loopback.
//!
//! - [`sink`] : Capacités de résolution à usage unique ; détection des sinks
//!   abandonnés et neutralisation après démontage.
//!
//! - [`challenge`] : Erreurs de certificat, authentification HTTP, géolocalisation.
//!
//! - [`transfer`] : Slot unique de sélection de fichiers et téléchargements.
//!
//! - [`lifecycle`] : Machine à états spinner / contenu / erreur et double
//!   appui « retour » pour quitter.
//!
//! - [`host`] : Traits des collaborateurs fournis par l'application hôte.
//!
//! - [`shell`] : [`SiteShell`](shell::SiteShell), la façade qui route chaque
//!   événement du moteur vers un composant.
//!
//! - [`engine`] : Préférences du moteur dérivées de la configuration.

pub mod challenge;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod navigation;
pub mod policy;
pub mod shell;
pub mod sink;
pub mod transfer;
