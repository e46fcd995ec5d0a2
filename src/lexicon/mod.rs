//! # Lexicon analyzer
//! Word-list sentiment: sentence segmentation, polarity/subjectivity averaging
//! and noun-phrase extraction.
//!
//! The lexicon ships embedded (`assets/lexicon.json`) and can be replaced by a
//! file with the same schema:
//!
//! ```json
//! { "words": { "good": [0.7, 0.6] },
//!   "intensifiers": { "very": 1.3 },
//!   "negators": ["not"],
//!   "stopwords": ["the"] }
//! ```
//!
//! Each word maps to `[polarity, subjectivity]`. Scores are averaged over the
//! lexicon hits of the text; texts without hits score `(0.0, 0.0)`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

mod phrases;

const EMBEDDED_LEXICON: &str = include_str!("../../assets/lexicon.json");

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)[\w']+").expect("word regex"));

// Terminator run, optional closing quotes/brackets, then whitespace.
static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("sentence regex"));

/// Negation window: a negator up to this many tokens back flips a hit.
const NEGATION_WINDOW: usize = 3;

#[derive(Debug, Deserialize)]
struct LexiconFile {
    words: HashMap<String, (f64, f64)>,
    #[serde(default)]
    intensifiers: HashMap<String, f64>,
    #[serde(default)]
    negators: Vec<String>,
    #[serde(default)]
    stopwords: Vec<String>,
}

/// Parsed word lists used by [`LexiconAnalyzer`].
#[derive(Debug, Clone)]
pub struct Lexicon {
    words: HashMap<String, (f64, f64)>,
    intensifiers: HashMap<String, f64>,
    negators: HashSet<String>,
    stopwords: HashSet<String>,
}

impl Lexicon {
    /// The lexicon compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_json_str(EMBEDDED_LEXICON).expect("valid embedded lexicon")
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(raw).context("parsing lexicon json")?;
        let lower = |v: Vec<String>| -> HashSet<String> {
            v.into_iter().map(|w| w.to_lowercase()).collect()
        };
        Ok(Self {
            words: file
                .words
                .into_iter()
                .map(|(w, (p, s))| (w.to_lowercase(), (p.clamp(-1.0, 1.0), s.clamp(0.0, 1.0))))
                .collect(),
            intensifiers: file
                .intensifiers
                .into_iter()
                .map(|(w, m)| (w.to_lowercase(), m))
                .collect(),
            negators: lower(file.negators),
            stopwords: lower(file.stopwords),
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon from {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("loading lexicon {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn is_negator(&self, tok: &str) -> bool {
        self.negators.contains(tok)
    }
}

/// Averaged lexicon score of a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LexiconScore {
    /// Mean polarity of the hits, in `[-1, 1]`.
    pub polarity: f64,
    /// Mean subjectivity of the hits, in `[0, 1]`.
    pub subjectivity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexiconSentence {
    pub text: String,
    pub polarity: f64,
}

/// Whole-text analysis: overall score plus per-sentence polarity.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconAnalysis {
    pub score: LexiconScore,
    pub sentences: Vec<LexiconSentence>,
}

#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    lexicon: Lexicon,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new(Lexicon::embedded())
    }
}

impl LexiconAnalyzer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Load from an optional path, falling back to the embedded lexicon.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Ok(Self::new(Lexicon::load_from_file(p)?)),
            None => Ok(Self::default()),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn analyze(&self, text: &str) -> LexiconAnalysis {
        let sentences = split_sentences(text)
            .into_iter()
            .map(|s| {
                let polarity = self.score(&s).polarity;
                LexiconSentence { text: s, polarity }
            })
            .collect();
        LexiconAnalysis {
            score: self.score(text),
            sentences,
        }
    }

    /// Mean polarity/subjectivity over lexicon hits.
    ///
    /// An intensifier directly before a hit scales both values (and is not
    /// counted as a hit itself); a negator within the previous
    /// [`NEGATION_WINDOW`] tokens flips the polarity and halves it.
    pub fn score(&self, text: &str) -> LexiconScore {
        let tokens = tokenize(text);
        let lx = &self.lexicon;

        let mut pol_sum = 0.0;
        let mut subj_sum = 0.0;
        let mut hits = 0usize;

        for (i, tok) in tokens.iter().enumerate() {
            let Some(&(base_p, base_s)) = lx.words.get(tok.as_str()) else {
                continue;
            };

            // "really good": `really` only boosts `good`
            let next_is_hit = tokens
                .get(i + 1)
                .is_some_and(|n| lx.words.contains_key(n.as_str()));
            if next_is_hit && lx.intensifiers.contains_key(tok.as_str()) {
                continue;
            }

            let boost = i
                .checked_sub(1)
                .and_then(|j| lx.intensifiers.get(tokens[j].as_str()))
                .copied()
                .unwrap_or(1.0);
            let negated = (1..=NEGATION_WINDOW).any(|k| i >= k && lx.is_negator(&tokens[i - k]));

            let mut p = (base_p * boost).clamp(-1.0, 1.0);
            let s = (base_s * boost).clamp(0.0, 1.0);
            if negated {
                p *= -0.5;
            }

            pol_sum += p;
            subj_sum += s;
            hits += 1;
        }

        if hits == 0 {
            return LexiconScore::default();
        }
        LexiconScore {
            polarity: (pol_sum / hits as f64).clamp(-1.0, 1.0),
            subjectivity: (subj_sum / hits as f64).clamp(0.0, 1.0),
        }
    }

    /// Lowercased noun phrases in first-occurrence order.
    ///
    /// Fails when the stopword list the chunker depends on is unavailable.
    pub fn noun_phrases(&self, text: &str) -> Result<Vec<String>> {
        phrases::extract(text, &self.lexicon)
    }
}

/// Split text into trimmed sentences on `.`, `!` and `?` runs followed by
/// whitespace. Text without a terminator is a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        let piece = text[start..m.end()].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Lowercase word tokens; apostrophes inside words are kept (`don't`).
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
