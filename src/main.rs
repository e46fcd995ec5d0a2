//! Sentiment form service — binary entrypoint.
//! Loads configuration, wires the classifier and session store, and serves
//! the Axum router (page, JSON API, `/metrics`).

use sentiment_form::{app, metrics::Metrics, telemetry, AppConfig};
use shuttle_axum::ShuttleAxum;
use tracing::warn;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let cfg = AppConfig::load()?;
    let mut router = app(&cfg)?;

    match Metrics::init(cfg.classifier.mode) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
