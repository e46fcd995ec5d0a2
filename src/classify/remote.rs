//! Remote classifier: one POST per call to a hosted inference endpoint.
//!
//! Request body is `{"inputs": "<text>"}` with an optional bearer token. The
//! provider answers with one of:
//! - `[[{"label": "POSITIVE", "score": 0.99}, ...]]` (nested list)
//! - `[{"label": "POSITIVE", "score": 0.99}, ...]` (flat list)
//! - `{"error": "Model is currently loading"}` (error object)
//!
//! The first `{label, score}` is taken as the best match. An error object
//! falls back to lexicon polarity; anything else, or a failed call, yields
//! the NEUTRAL sentinel. No retries.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{truncate_input, Classification, Classifier, ClassifierMode};
use crate::config::ClassifierConfig;
use crate::lexicon::LexiconAnalyzer;
use crate::telemetry::text_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn classification(&self) -> Classification {
        Classification::from_label(&self.label, self.score)
    }
}

/// Decoded provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Error(String),
    /// Not JSON, an unexpected shape, or empty lists.
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Error { error: serde_json::Value },
}

impl InferenceResponse {
    pub fn decode(body: &[u8]) -> Self {
        match serde_json::from_slice::<WireResponse>(body) {
            Ok(WireResponse::Nested(rows)) => {
                if rows.first().is_some_and(|r| !r.is_empty()) {
                    InferenceResponse::Nested(rows)
                } else {
                    InferenceResponse::Unrecognized
                }
            }
            Ok(WireResponse::Flat(items)) => {
                if items.is_empty() {
                    InferenceResponse::Unrecognized
                } else {
                    InferenceResponse::Flat(items)
                }
            }
            Ok(WireResponse::Error { error }) => InferenceResponse::Error(match error {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            Err(_) => InferenceResponse::Unrecognized,
        }
    }

    /// Highest-ranked entry as ordered by the provider.
    pub fn best(&self) -> Option<&LabelScore> {
        match self {
            InferenceResponse::Nested(rows) => rows.first().and_then(|r| r.first()),
            InferenceResponse::Flat(items) => items.first(),
            InferenceResponse::Error(_) | InferenceResponse::Unrecognized => None,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            InferenceResponse::Nested(_) => "nested",
            InferenceResponse::Flat(_) => "flat",
            InferenceResponse::Error(_) => "error",
            InferenceResponse::Unrecognized => "unrecognized",
        }
    }
}

pub struct RemoteClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    lexicon: Arc<LexiconAnalyzer>,
}

impl RemoteClassifier {
    pub fn from_config(cfg: &ClassifierConfig, lexicon: Arc<LexiconAnalyzer>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sentiment-form/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building inference http client")?;
        Ok(Self::with_client(
            http,
            cfg.endpoint.clone(),
            cfg.api_token.clone(),
            lexicon,
        ))
    }

    pub fn with_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_token: Option<String>,
        lexicon: Arc<LexiconAnalyzer>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_token,
            lexicon,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `None` means the call itself failed (connect, timeout, body read).
    async fn fetch(&self, input: &str) -> Option<InferenceResponse> {
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
        }

        let mut req = self.http.post(&self.endpoint).json(&Req { inputs: input });
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "inference request failed");
                return None;
            }
        };
        // error objects come with non-2xx codes (e.g. 503 while loading), so
        // the body is decoded regardless of status
        let status = resp.status();
        let body = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, %status, "reading inference response failed");
                return None;
            }
        };
        let decoded = InferenceResponse::decode(&body);
        debug!(%status, shape = decoded.shape(), "inference response");
        Some(decoded)
    }

    /// Map a decoded response onto a classification.
    pub fn interpret(&self, response: &InferenceResponse, input: &str) -> Classification {
        match response {
            InferenceResponse::Nested(_) | InferenceResponse::Flat(_) => response
                .best()
                .map(LabelScore::classification)
                .unwrap_or_else(Classification::sentinel),
            InferenceResponse::Error(msg) => {
                let polarity = self.lexicon.score(input).polarity;
                warn!(
                    id = %text_id(input),
                    error = %msg,
                    polarity,
                    "inference provider returned an error; using lexicon polarity"
                );
                metrics::counter!("classifier_fallback_total", "reason" => "provider_error")
                    .increment(1);
                Classification::from_lexicon_polarity(polarity)
            }
            InferenceResponse::Unrecognized => {
                warn!(id = %text_id(input), "unrecognized inference response");
                metrics::counter!("classifier_fallback_total", "reason" => "unrecognized")
                    .increment(1);
                Classification::sentinel()
            }
        }
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Classification {
        let input = truncate_input(text);
        match self.fetch(input).await {
            Some(response) => self.interpret(&response, input),
            None => {
                metrics::counter!("classifier_fallback_total", "reason" => "transport")
                    .increment(1);
                Classification::sentinel()
            }
        }
    }

    fn mode(&self) -> ClassifierMode {
        ClassifierMode::Remote
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;

    fn classifier() -> RemoteClassifier {
        RemoteClassifier::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9/unused",
            None,
            Arc::new(LexiconAnalyzer::default()),
        )
    }

    #[test]
    fn decodes_nested_list() {
        let r = InferenceResponse::decode(
            br#"[[{"label":"NEGATIVE","score":0.91},{"label":"POSITIVE","score":0.09}]]"#,
        );
        assert_eq!(r.shape(), "nested");
        assert_eq!(r.best().unwrap().label, "NEGATIVE");
    }

    #[test]
    fn decodes_flat_list() {
        let r = InferenceResponse::decode(br#"[{"label":"POSITIVE","score":0.95}]"#);
        assert_eq!(r.shape(), "flat");
        assert_eq!(r.best().unwrap().score, 0.95);
    }

    #[test]
    fn decodes_error_object() {
        let r = InferenceResponse::decode(br#"{"error":"loading","estimated_time":20.0}"#);
        assert_eq!(r, InferenceResponse::Error("loading".into()));

        let r = InferenceResponse::decode(br#"{"error":["a","b"]}"#);
        assert_eq!(r, InferenceResponse::Error(r#"["a","b"]"#.into()));
    }

    #[test]
    fn everything_else_is_unrecognized() {
        for body in [
            &b"<html>502</html>"[..],
            b"[]",
            b"[[]]",
            b"{\"label\":\"POSITIVE\"}",
            b"",
            b"42",
        ] {
            assert_eq!(
                InferenceResponse::decode(body),
                InferenceResponse::Unrecognized,
                "body={}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn error_object_falls_back_to_lexicon() {
        let c = classifier();
        let out = c.interpret(&InferenceResponse::Error("loading".into()), "This is not good");
        assert_eq!(out.category, Category::Negative);
        assert_eq!(out.polarity(), -0.35);
    }

    #[test]
    fn unrecognized_is_sentinel() {
        let c = classifier();
        let out = c.interpret(&InferenceResponse::Unrecognized, "anything");
        assert!(out.is_sentinel());
    }

    #[test]
    fn empty_variants_built_by_hand_are_sentinel() {
        let c = classifier();
        assert!(c.interpret(&InferenceResponse::Flat(vec![]), "x").is_sentinel());
        assert!(c
            .interpret(&InferenceResponse::Nested(vec![vec![]]), "x")
            .is_sentinel());
    }
}
