//! Primary classifier: binary positive/negative scoring behind one trait.
//!
//! Two interchangeable back-ends, picked at deployment time:
//! - [`remote::RemoteClassifier`]: hosted inference API over HTTP, with a
//!   lexicon fallback when the provider answers with an error object.
//! - [`local::LocalClassifier`]: in-process [`local::SentimentModel`], loaded
//!   once on first use. With the `bert` feature the model is DistilBERT
//!   fine-tuned on SST-2 (rust-bert); otherwise only the lexicon model is
//!   available.
//!
//! `classify` never fails: unreachable or malformed oracles degrade to the
//! NEUTRAL sentinel (confidence 0.0).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::lexicon::LexiconAnalyzer;
use crate::result::round2;

#[cfg(feature = "bert")]
pub mod bert;
pub mod local;
pub mod remote;

pub use local::{LexiconModel, LexiconModelLoader, LocalClassifier, ModelLoader, SentimentModel};
pub use remote::{InferenceResponse, LabelScore, RemoteClassifier};

/// Input ceiling of the classifier, in characters.
pub const MAX_INPUT_CHARS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Positive,
    Negative,
    /// Sentinel for "no answer"; always paired with confidence 0.0.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: Category,
    /// In `[0, 1]`.
    pub confidence: f64,
}

impl Classification {
    pub fn sentinel() -> Self {
        Self {
            category: Category::Neutral,
            confidence: 0.0,
        }
    }

    /// Provider label → category. Only `POSITIVE` (any case) is positive;
    /// every other label is read as negative.
    pub fn from_label(label: &str, score: f64) -> Self {
        let category = if label.trim().eq_ignore_ascii_case("positive") {
            Category::Positive
        } else {
            Category::Negative
        };
        Self {
            category,
            confidence: clamp_confidence(score),
        }
    }

    /// Fabricate a category from a signed lexicon polarity. Never NEUTRAL.
    pub fn from_lexicon_polarity(polarity: f64) -> Self {
        let category = if polarity >= 0.0 {
            Category::Positive
        } else {
            Category::Negative
        };
        Self {
            category,
            confidence: clamp_confidence(polarity.abs()),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.category == Category::Neutral
    }

    /// Signed, two-decimal polarity: `+c` for POSITIVE, `-c` otherwise,
    /// `0.0` for the sentinel.
    pub fn polarity(&self) -> f64 {
        match self.category {
            Category::Positive => round2(self.confidence),
            Category::Negative => round2(-self.confidence),
            Category::Neutral => 0.0,
        }
    }
}

fn clamp_confidence(c: f64) -> f64 {
    if c.is_nan() {
        0.0
    } else {
        c.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    #[default]
    Remote,
    Local,
}

impl ClassifierMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassifierMode::Remote => "remote",
            ClassifierMode::Local => "local",
        }
    }
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which in-process model backs [`ClassifierMode::Local`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalModelKind {
    /// DistilBERT SST-2 through rust-bert; needs the `bert` feature.
    Bert,
    /// Lexicon-backed binary model, no weights required.
    Lexicon,
}

impl Default for LocalModelKind {
    fn default() -> Self {
        if cfg!(feature = "bert") {
            LocalModelKind::Bert
        } else {
            LocalModelKind::Lexicon
        }
    }
}

impl FromStr for LocalModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bert" => Ok(LocalModelKind::Bert),
            "lexicon" => Ok(LocalModelKind::Lexicon),
            other => Err(anyhow!("unsupported local model: {other}")),
        }
    }
}

impl FromStr for ClassifierMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(ClassifierMode::Remote),
            "local" => Ok(ClassifierMode::Local),
            other => Err(anyhow!("unsupported classifier mode: {other}")),
        }
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Score `text`; implementations truncate to [`MAX_INPUT_CHARS`].
    async fn classify(&self, text: &str) -> Classification;

    /// Deployment mode; decides how sentences are scored.
    fn mode(&self) -> ClassifierMode;

    /// Name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Build the configured back-end.
pub fn build_classifier(
    cfg: &ClassifierConfig,
    lexicon: Arc<LexiconAnalyzer>,
) -> Result<DynClassifier> {
    match cfg.mode {
        ClassifierMode::Remote => Ok(Arc::new(RemoteClassifier::from_config(cfg, lexicon)?)),
        ClassifierMode::Local => match cfg.local_model {
            LocalModelKind::Lexicon => Ok(Arc::new(LocalClassifier::new(
                LexiconModelLoader::new(lexicon),
            ))),
            LocalModelKind::Bert => bert_classifier(),
        },
    }
}

#[cfg(feature = "bert")]
fn bert_classifier() -> Result<DynClassifier> {
    Ok(Arc::new(LocalClassifier::new(bert::BertModelLoader)))
}

#[cfg(not(feature = "bert"))]
fn bert_classifier() -> Result<DynClassifier> {
    Err(anyhow!(
        "local_model = \"bert\" requires building with the `bert` feature"
    ))
}

/// First [`MAX_INPUT_CHARS`] characters of `text`.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
