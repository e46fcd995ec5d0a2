// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod builder;
pub mod classify;
pub mod config;
pub mod history;
pub mod lexicon;
pub mod metrics;
pub mod render;
pub mod result;
pub mod session;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tracing::info;

pub use crate::api::{create_router, AppState};
pub use crate::builder::SentimentResultBuilder;
pub use crate::config::AppConfig;

/// Wire lexicon, classifier, builder and session store from `cfg`.
pub fn build_state(cfg: &AppConfig) -> Result<AppState> {
    let lexicon = Arc::new(lexicon::LexiconAnalyzer::from_optional_path(
        cfg.lexicon.path.as_deref(),
    )?);
    info!(
        words = lexicon.lexicon().len(),
        custom = cfg.lexicon.path.is_some(),
        "lexicon loaded"
    );

    let classifier = classify::build_classifier(&cfg.classifier, lexicon.clone())?;
    // Safe diagnostics: mode + endpoint + whether a token is set
    info!(
        mode = %cfg.classifier.mode,
        local_model = ?cfg.classifier.local_model,
        endpoint = %cfg.classifier.endpoint,
        auth = cfg.classifier.api_token.is_some(),
        "classifier configured"
    );

    Ok(AppState {
        builder: Arc::new(SentimentResultBuilder::new(classifier, lexicon)),
        sessions: Arc::new(session::SessionStore::new(
            cfg.session.cookie_name.clone(),
            Duration::from_secs(cfg.session.ttl_secs),
        )
        .with_max_sessions(cfg.session.max_sessions)),
        static_dir: cfg.static_dir.clone(),
    })
}

/// Build the full application router (without `/metrics`).
pub fn app(cfg: &AppConfig) -> Result<Router> {
    Ok(create_router(build_state(cfg)?))
}
