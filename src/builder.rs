//! # SentimentResultBuilder
//! Composes the primary classifier and the lexicon analyzer into one
//! [`SentimentResult`] and threads the caller's [`History`] through.
//!
//! Sentence scoring depends on the classifier mode:
//! - `local`: every sentence goes through the classifier again;
//! - `remote`: the lexicon's own per-sentence polarity is used, so a page
//!   costs one network call regardless of sentence count.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classify::{ClassifierMode, DynClassifier};
use crate::history::{History, HistoryEntry};
use crate::lexicon::{LexiconAnalysis, LexiconAnalyzer};
use crate::result::{SentenceResult, SentimentResult};
use crate::telemetry::text_id;

pub struct SentimentResultBuilder {
    classifier: DynClassifier,
    lexicon: Arc<LexiconAnalyzer>,
}

impl SentimentResultBuilder {
    pub fn new(classifier: DynClassifier, lexicon: Arc<LexiconAnalyzer>) -> Self {
        Self {
            classifier,
            lexicon,
        }
    }

    pub fn mode(&self) -> ClassifierMode {
        self.classifier.mode()
    }

    /// Classify `text` and prepend it to `history`.
    ///
    /// Empty text is a no-op: no result, history returned as given.
    pub async fn build(
        &self,
        text: &str,
        history: History,
    ) -> (Option<SentimentResult>, History) {
        if text.is_empty() {
            return (None, history);
        }
        let result = self.analyze(text).await;
        let history = history.prepended(HistoryEntry::from_result(&result));
        (Some(result), history)
    }

    /// Produce the result record without touching any history.
    pub async fn analyze(&self, text: &str) -> SentimentResult {
        let id = text_id(text);

        let classification = self.classifier.classify(text).await;
        let polarity = classification.polarity();
        debug!(
            %id,
            classifier = self.classifier.name(),
            category = ?classification.category,
            confidence = classification.confidence,
            "classified"
        );

        // the lexicon sees the full text; only the classifier is capped
        let analysis = self.lexicon.analyze(text);
        let keywords = self.keywords(text, &id);
        let sentences = self.sentences(&analysis).await;

        let result = SentimentResult::new(
            text,
            polarity,
            analysis.score.subjectivity,
            keywords,
            sentences,
        );

        metrics::counter!("sentiment_requests_total", "label" => result.label.as_str())
            .increment(1);
        info!(
            %id,
            polarity = result.polarity,
            subjectivity = result.subjectivity,
            label = %result.label,
            sentences = result.sentences.len(),
            "sentiment result built"
        );
        result
    }

    fn keywords(&self, text: &str, id: &str) -> Vec<String> {
        match self.lexicon.noun_phrases(text) {
            Ok(k) => k,
            Err(e) => {
                warn!(%id, error = %e, "noun phrase extraction failed");
                metrics::counter!("keyword_extraction_failures_total").increment(1);
                Vec::new()
            }
        }
    }

    async fn sentences(&self, analysis: &LexiconAnalysis) -> Vec<SentenceResult> {
        match self.classifier.mode() {
            ClassifierMode::Local => {
                let mut out = Vec::with_capacity(analysis.sentences.len());
                for s in &analysis.sentences {
                    let polarity = self.classifier.classify(&s.text).await.polarity();
                    out.push(SentenceResult::new(s.text.clone(), polarity));
                }
                out
            }
            ClassifierMode::Remote => analysis
                .sentences
                .iter()
                .map(|s| SentenceResult::new(s.text.clone(), s.polarity))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Classification, Classifier};
    use crate::history::HISTORY_CAP;
    use crate::lexicon::Lexicon;
    use crate::result::Label;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted classifier: fixed answer, records every input.
    struct Scripted {
        answer: Classification,
        mode: ClassifierMode,
        seen: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(category: Category, confidence: f64, mode: ClassifierMode) -> Arc<Self> {
            Arc::new(Self {
                answer: Classification {
                    category,
                    confidence,
                },
                mode,
                seen: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Classifier for Scripted {
        async fn classify(&self, text: &str) -> Classification {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            self.answer
        }
        fn mode(&self) -> ClassifierMode {
            self.mode
        }
        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn builder(clf: Arc<Scripted>) -> SentimentResultBuilder {
        SentimentResultBuilder::new(clf, Arc::new(LexiconAnalyzer::default()))
    }

    #[tokio::test]
    async fn positive_example_end_to_end() {
        let clf = Scripted::new(Category::Positive, 0.95, ClassifierMode::Remote);
        // subjectivity 0.8 for "love" in this lexicon
        let lx = Lexicon::from_json_str(
            r#"{"words": {"love": [0.5, 0.8]}, "stopwords": ["i", "this"]}"#,
        )
        .unwrap();
        let b = SentimentResultBuilder::new(clf, Arc::new(LexiconAnalyzer::new(lx)));

        let (res, hist) = b.build("I love this!", History::new()).await;
        let res = res.expect("result");
        assert_eq!(res.polarity, 0.95);
        assert_eq!(res.label, Label::Positive);
        assert_eq!(res.emoji, "🤩");
        assert_eq!(res.subjectivity, 0.8);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist.latest().unwrap().text_preview, "I love this!");
        assert_eq!(hist.latest().unwrap().polarity, 0.95);
    }

    #[tokio::test]
    async fn empty_text_is_a_noop() {
        let clf = Scripted::new(Category::Positive, 0.9, ClassifierMode::Remote);
        let b = builder(clf.clone());
        let (seed_res, seed) = b.build("hello", History::new()).await;
        assert!(seed_res.is_some());

        let (res, hist) = b.build("", seed.clone()).await;
        assert!(res.is_none());
        assert_eq!(hist, seed);
        assert_eq!(clf.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_category_gives_negative_polarity() {
        let clf = Scripted::new(Category::Negative, 0.304, ClassifierMode::Remote);
        let (res, _) = builder(clf).build("meh.", History::new()).await;
        let res = res.unwrap();
        assert_eq!(res.polarity, -0.3);
        assert_eq!(res.label, Label::Negative);
        assert_eq!(res.emoji, "🙁");
    }

    #[tokio::test]
    async fn sentinel_gives_neutral_result() {
        let clf = Scripted::new(Category::Neutral, 0.0, ClassifierMode::Remote);
        let (res, _) = builder(clf).build("Anything at all", History::new()).await;
        let res = res.unwrap();
        assert_eq!(res.polarity, 0.0);
        assert_eq!(res.label, Label::Neutral);
        assert_eq!(res.emoji, "😐");
        assert_eq!(res.polarity_percent, 50.0);
    }

    #[tokio::test]
    async fn classifier_gets_truncated_text_lexicon_gets_all() {
        let clf = Scripted::new(Category::Positive, 0.5, ClassifierMode::Remote);
        let b = builder(clf.clone());
        let long = format!("{} {}", "word ".repeat(200), "The battery life is great.");
        let (res, hist) = b.build(&long, History::new()).await;
        let res = res.unwrap();

        // the Classifier impl is responsible for truncation; the builder
        // hands over the original text and the lexicon scores all of it
        assert_eq!(clf.seen.lock().unwrap()[0], long);
        assert_eq!(res.text, long);
        assert!(res.keywords.iter().any(|k| k == "battery life"));
        assert!(hist.latest().unwrap().text_preview.ends_with("..."));
    }

    #[tokio::test]
    async fn remote_mode_scores_sentences_with_lexicon() {
        let clf = Scripted::new(Category::Positive, 0.99, ClassifierMode::Remote);
        let b = builder(clf.clone());
        let (res, _) = b.build("I love it. I hate it.", History::new()).await;
        let res = res.unwrap();

        assert_eq!(clf.calls.load(Ordering::SeqCst), 1);
        assert_eq!(res.sentences.len(), 2);
        assert_eq!(res.sentences[0].polarity, 0.5);
        assert_eq!(res.sentences[0].label, Label::Positive);
        assert_eq!(res.sentences[1].polarity, -0.8);
        assert_eq!(res.sentences[1].label, Label::Negative);
    }

    #[tokio::test]
    async fn local_mode_scores_sentences_with_classifier() {
        let clf = Scripted::new(Category::Positive, 0.99, ClassifierMode::Local);
        let b = builder(clf.clone());
        let (res, _) = b.build("I love it. I hate it.", History::new()).await;
        let res = res.unwrap();

        // whole text + one call per sentence
        assert_eq!(clf.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            clf.seen.lock().unwrap()[1..],
            ["I love it.".to_string(), "I hate it.".to_string()]
        );
        assert!(res.sentences.iter().all(|s| s.polarity == 0.99));
        assert!(res.sentences.iter().all(|s| s.label == Label::Positive));
    }

    #[tokio::test]
    async fn keyword_fault_yields_empty_keywords_only() {
        let clf = Scripted::new(Category::Positive, 0.95, ClassifierMode::Remote);
        // no stopwords → noun phrase extraction fails
        let lx = Lexicon::from_json_str(r#"{"words": {"great": [0.8, 0.75]}}"#).unwrap();
        let b = SentimentResultBuilder::new(clf, Arc::new(LexiconAnalyzer::new(lx)));

        let (res, hist) = b.build("Great battery life.", History::new()).await;
        let res = res.unwrap();
        assert!(res.keywords.is_empty());
        assert_eq!(res.polarity, 0.95);
        assert_eq!(res.subjectivity, 0.75);
        assert_eq!(res.sentences.len(), 1);
        assert_eq!(hist.len(), 1);
    }

    #[tokio::test]
    async fn history_stays_bounded_newest_first() {
        let clf = Scripted::new(Category::Positive, 0.7, ClassifierMode::Remote);
        let b = builder(clf);
        let mut hist = History::new();
        for n in 0..9 {
            let (_, h) = b.build(&format!("entry {n}"), hist).await;
            hist = h;
            assert!(hist.len() <= HISTORY_CAP);
            assert_eq!(hist.latest().unwrap().text_preview, format!("entry {n}"));
        }
        assert_eq!(hist.len(), HISTORY_CAP);
    }
}
