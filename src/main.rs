//! Point d'entrée de SiteShell : simulation de la politique de navigation.
//!
//! Usage :
//!   siteshell [--config PATH] [--launch URL] URL...
//!
//! Exemples :
//!   cargo run -- https://example.com/about          → interne, chargée sur place
//!   cargo run -- rust-lang.org                      → ajoute https:// automatiquement
//!   cargo run -- --launch https://app.example.org tel:+33123456789
//!
//! Pour chaque URL, affiche l'action décidée et si la ressource serait bloquée.

use std::env;
use std::error::Error;
use std::path::PathBuf;

use siteshell::config::Config;
use siteshell::engine;
use siteshell::navigation::{self, NavigationRequest};
use siteshell::policy::PolicyConfig;
use url::Url;

fn main() -> Result<(), Box<dyn Error>> {
    // ── 1. Logging / Tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ── 2. Arguments ───────────────────────────────────────────────────
    let args = Args::parse(env::args().skip(1))?;

    // ── 3. Configuration ───────────────────────────────────────────────
    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let launch_url = args.launch_url.as_deref().map(parse_url).transpose()?;
    let start_url = config.start_url(launch_url.as_ref())?;
    let policy = PolicyConfig::from_config(&config, launch_url.as_ref())?;
    let settings = engine::build_engine_settings(&config, &start_url);

    println!("start page : {start_url}");
    println!("trust host : {}", policy.trust_host());
    println!("javascript : {}", settings.javascript);

    // ── 4. Décisions ───────────────────────────────────────────────────
    for raw in &args.urls {
        let url = parse_url(raw)?;
        let action = navigation::decide(&NavigationRequest::main_frame(url.clone()), &policy);
        let blocked = url
            .host_str()
            .is_some_and(|host| navigation::should_block_resource(host, policy.block_loopback_hosts()));
        println!("{url} → {action:?} (resource blocked: {blocked})");
    }

    Ok(())
}

#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    launch_url: Option<String>,
    urls: Vec<String>,
}

impl Args {
    fn parse(mut iter: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut args = Args::default();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    let path = iter.next().ok_or("--config attend un chemin")?;
                    args.config_path = Some(PathBuf::from(path));
                }
                "--launch" => {
                    args.launch_url = Some(iter.next().ok_or("--launch attend une URL")?);
                }
                _ => args.urls.push(arg),
            }
        }
        Ok(args)
    }
}

/// Parse une URL ; sans schéma, on ajoute "https://".
fn parse_url(input: &str) -> Result<Url, url::ParseError> {
    // Essaie de parser directement (fonctionne si l'utilisateur a mis le schéma)
    if let Ok(url) = Url::parse(input) {
        return Ok(url);
    }

    // Sinon, ajoute https:// et réessaie
    Url::parse(&format!("https://{input}"))
}
