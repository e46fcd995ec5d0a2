//! Noun-phrase chunker: runs of content words inside a clause.

use std::collections::HashSet;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{split_sentences, Lexicon, WORD_RE};

const MAX_PHRASE_TOKENS: usize = 4;

static CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[,;:()\[\]"“”—–]|\s-\s"#).expect("clause regex"));

struct Word {
    lower: String,
    capitalized: bool,
    sentence_initial: bool,
}

pub(super) fn extract(text: &str, lexicon: &Lexicon) -> Result<Vec<String>> {
    if lexicon.stopwords.is_empty() {
        bail!("noun phrase resources unavailable: stopword list is empty");
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |phrase: String| {
        if seen.insert(phrase.clone()) {
            out.push(phrase);
        }
    };

    for sentence in split_sentences(text) {
        let mut position = 0usize;
        for clause in CLAUSE_RE.split(&sentence) {
            let mut run: Vec<Word> = Vec::new();
            for m in WORD_RE.find_iter(clause) {
                let raw = m.as_str().trim_matches('\'');
                if raw.is_empty() {
                    continue;
                }
                let word = Word {
                    lower: raw.to_lowercase(),
                    capitalized: raw.chars().next().is_some_and(char::is_uppercase),
                    sentence_initial: position == 0,
                };
                position += 1;

                if is_content(&word.lower, lexicon) {
                    run.push(word);
                } else if let Some(p) = flush(&mut run) {
                    push(p);
                }
            }
            if let Some(p) = flush(&mut run) {
                push(p);
            }
        }
    }

    Ok(out)
}

fn is_content(tok: &str, lexicon: &Lexicon) -> bool {
    tok.chars().count() > 1
        && !tok.chars().all(|c| c.is_ascii_digit())
        && !lexicon.stopwords.contains(tok)
        && !lexicon.negators.contains(tok)
        && !lexicon.intensifiers.contains_key(tok)
}

/// Turn the pending run into a phrase (if it qualifies) and clear it.
fn flush(run: &mut Vec<Word>) -> Option<String> {
    let phrase = match run.len() {
        0 => None,
        // a lone word only counts as a proper noun
        1 if run[0].capitalized && !run[0].sentence_initial => Some(run[0].lower.clone()),
        1 => None,
        n => {
            let tail = &run[n.saturating_sub(MAX_PHRASE_TOKENS)..];
            Some(
                tail.iter()
                    .map(|w| w.lower.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    };
    run.clear();
    phrase
}
