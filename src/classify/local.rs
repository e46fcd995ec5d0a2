//! Local classifier: an in-process model behind a once-only loader.
//!
//! The model is not a global. [`LocalClassifier`] owns a [`ModelLoader`] and
//! a `OnceCell`; the first `classify` call loads the model, concurrent first
//! calls wait on the same load, and later calls reuse the instance. A failed
//! load is logged, answered with the sentinel, and retried on the next call.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{truncate_input, Classification, Classifier, ClassifierMode, LabelScore};
use crate::lexicon::LexiconAnalyzer;
use crate::telemetry::text_id;

/// A loaded binary sentiment model (pipeline-style output).
pub trait SentimentModel: Send + Sync {
    /// Scores ordered best first, e.g. `[{POSITIVE, 0.98}, {NEGATIVE, 0.02}]`.
    fn predict(&self, text: &str) -> Result<Vec<LabelScore>>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn SentimentModel>>;
}

pub struct LocalClassifier {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn SentimentModel>>,
}

impl LocalClassifier {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    /// Wrap an already loaded model.
    pub fn with_model(model: Arc<dyn SentimentModel>) -> Self {
        struct Ready(Arc<dyn SentimentModel>);

        #[async_trait]
        impl ModelLoader for Ready {
            async fn load(&self) -> Result<Arc<dyn SentimentModel>> {
                Ok(self.0.clone())
            }
        }

        Self::new(Ready(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<&Arc<dyn SentimentModel>> {
        self.model
            .get_or_try_init(|| async {
                info!("Loading sentiment model...");
                let m = self.loader.load().await?;
                info!(model = m.name(), "sentiment model ready");
                Ok::<_, anyhow::Error>(m)
            })
            .await
    }
}

#[async_trait]
impl Classifier for LocalClassifier {
    async fn classify(&self, text: &str) -> Classification {
        let input = truncate_input(text);
        let model = match self.model().await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = ?e, "sentiment model failed to load");
                metrics::counter!("classifier_fallback_total", "reason" => "model_load")
                    .increment(1);
                return Classification::sentinel();
            }
        };
        let model = Arc::clone(model);
        let owned = input.to_string();
        let predicted = tokio::task::spawn_blocking(move || model.predict(&owned))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        match predicted {
            Ok(scores) => scores
                .first()
                .map(LabelScore::classification)
                .unwrap_or_else(Classification::sentinel),
            Err(e) => {
                warn!(id = %text_id(input), error = ?e, "local prediction failed");
                metrics::counter!("classifier_fallback_total", "reason" => "predict")
                    .increment(1);
                Classification::sentinel()
            }
        }
    }

    fn mode(&self) -> ClassifierMode {
        ClassifierMode::Local
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Offline model: the sign of the lexicon polarity picks the label and its
/// magnitude is the score. Selected with `local_model = "lexicon"`, and the
/// only local model in builds without the `bert` feature.
pub struct LexiconModel {
    lexicon: Arc<LexiconAnalyzer>,
}

impl LexiconModel {
    pub fn new(lexicon: Arc<LexiconAnalyzer>) -> Self {
        Self { lexicon }
    }
}

impl SentimentModel for LexiconModel {
    fn predict(&self, text: &str) -> Result<Vec<LabelScore>> {
        let p = self.lexicon.score(text).polarity;
        let label = if p >= 0.0 { "POSITIVE" } else { "NEGATIVE" };
        Ok(vec![LabelScore {
            label: label.to_string(),
            score: p.abs(),
        }])
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

pub struct LexiconModelLoader {
    lexicon: Arc<LexiconAnalyzer>,
}

impl LexiconModelLoader {
    pub fn new(lexicon: Arc<LexiconAnalyzer>) -> Self {
        Self { lexicon }
    }
}

#[async_trait]
impl ModelLoader for LexiconModelLoader {
    async fn load(&self) -> Result<Arc<dyn SentimentModel>> {
        Ok(Arc::new(LexiconModel::new(self.lexicon.clone())))
    }
}
