//! history.rs — short per-session log of past classifications, newest first.

use serde::Serialize;

use crate::result::{Label, SentimentResult};

/// Maximum number of entries kept per session.
pub const HISTORY_CAP: usize = 5;

/// Characters of input shown in a history row.
pub const PREVIEW_CHARS: usize = 50;

const ID_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub text_preview: String,
    pub label: Label,
    pub emoji: &'static str,
    pub polarity: f64,
}

impl HistoryEntry {
    pub fn from_result(result: &SentimentResult) -> Self {
        Self {
            id: entry_id(),
            text_preview: text_preview(&result.text),
            label: result.label,
            emoji: result.emoji,
            polarity: result.polarity,
        }
    }
}

/// Bounded, newest-first list of [`HistoryEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `entry` and drop everything past [`HISTORY_CAP`].
    pub fn push_front(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
    }

    /// Owned variant of [`History::push_front`].
    pub fn prepended(mut self, entry: HistoryEntry) -> Self {
        self.push_front(entry);
        self
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

/// First [`PREVIEW_CHARS`] characters, with `...` appended only when the
/// text is longer than that.
pub fn text_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Short random token identifying a history row.
pub fn entry_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}
