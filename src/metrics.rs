use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::classify::ClassifierMode;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the service counters.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn init(mode: ClassifierMode) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!(
            "sentiment_requests_total",
            "Texts classified, by resulting label"
        );
        describe_counter!(
            "classifier_fallback_total",
            "Classifier calls answered by the lexicon fallback or the neutral sentinel, by reason"
        );
        describe_counter!(
            "keyword_extraction_failures_total",
            "Noun phrase extraction faults swallowed as empty keyword lists"
        );

        // 1 for the active classifier mode
        gauge!("classifier_mode", "mode" => mode.as_str()).set(1.0);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
