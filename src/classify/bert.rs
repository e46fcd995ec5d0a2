//! DistilBERT (SST-2) sentiment model through rust-bert.
//!
//! Weights are fetched into the rust-bert cache on the first load; loading
//! and inference are blocking libtorch calls and run on the blocking pool.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rust_bert::pipelines::sentiment::{
    SentimentConfig, SentimentModel as BertPipeline, SentimentPolarity,
};

use super::local::{ModelLoader, SentimentModel};
use super::LabelScore;

pub const MODEL_NAME: &str = "distilbert-base-uncased-finetuned-sst-2-english";

pub struct BertSentimentModel {
    pipeline: Mutex<BertPipeline>,
}

impl BertSentimentModel {
    /// Blocking: builds the pipeline with rust-bert's default sentiment
    /// resources (DistilBERT fine-tuned on SST-2).
    pub fn load() -> Result<Self> {
        let pipeline = BertPipeline::new(SentimentConfig::default())
            .with_context(|| format!("loading {MODEL_NAME}"))?;
        Ok(Self {
            pipeline: Mutex::new(pipeline),
        })
    }
}

impl SentimentModel for BertSentimentModel {
    fn predict(&self, text: &str) -> Result<Vec<LabelScore>> {
        let pipeline = self
            .pipeline
            .lock()
            .map_err(|_| anyhow!("sentiment pipeline mutex poisoned"))?;
        let sentiment = pipeline
            .predict(&[text])
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("pipeline returned no prediction"))?;
        let label = match sentiment.polarity {
            SentimentPolarity::Positive => "POSITIVE",
            SentimentPolarity::Negative => "NEGATIVE",
        };
        Ok(vec![LabelScore {
            label: label.to_string(),
            score: sentiment.score,
        }])
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}

pub struct BertModelLoader;

#[async_trait]
impl ModelLoader for BertModelLoader {
    async fn load(&self) -> Result<Arc<dyn SentimentModel>> {
        let model = tokio::task::spawn_blocking(BertSentimentModel::load)
            .await
            .context("model load task aborted")??;
        Ok(Arc::new(model))
    }
}
