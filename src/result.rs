//! # Sentiment result
//! The shaped record handed to the page/JSON layer, plus the fixed
//! threshold mappings from polarity to label, emoji and style classes.

use serde::Serialize;

/// Label/color cutoff. Wider than the emoji cutoff (0.0) so small
/// classifier noise around zero reads as Neutral.
pub const LABEL_THRESHOLD: f64 = 0.1;

/// Emoji/background cutoff between "positive" and "intense-positive".
pub const INTENSE_THRESHOLD: f64 = 0.5;

/// Round to two decimals.
///
/// Rounds the exact stored binary value, ties to even, so `0.105` (stored
/// just below) gives `0.1` rather than `0.11`.
pub fn round2(x: f64) -> f64 {
    let r = format!("{x:.2}").parse::<f64>().unwrap_or(x);
    // keep -0.0 out of the output
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    /// Step function with strict inequalities: `±0.1` is Neutral.
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > LABEL_THRESHOLD {
            Label::Positive
        } else if polarity < -LABEL_THRESHOLD {
            Label::Negative
        } else {
            Label::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Positive => "Positive",
            Label::Negative => "Negative",
            Label::Neutral => "Neutral",
        }
    }

    pub fn lower(self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
            Label::Neutral => "neutral",
        }
    }

    pub fn color_class(self) -> &'static str {
        match self {
            Label::Positive => "text-green-600",
            Label::Negative => "text-red-600",
            Label::Neutral => "text-gray-600",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emoji/background bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    IntensePositive,
    Positive,
    Neutral,
    Negative,
    IntenseNegative,
}

impl Mood {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > INTENSE_THRESHOLD {
            Mood::IntensePositive
        } else if polarity > 0.0 {
            Mood::Positive
        } else if polarity < -INTENSE_THRESHOLD {
            Mood::IntenseNegative
        } else if polarity < 0.0 {
            Mood::Negative
        } else {
            Mood::Neutral
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::IntensePositive => "🤩",
            Mood::Positive => "🙂",
            Mood::Neutral => "😐",
            Mood::Negative => "🙁",
            Mood::IntenseNegative => "🤬",
        }
    }

    pub fn bg_class(self) -> &'static str {
        match self {
            Mood::IntensePositive => "bg-positive-intense",
            Mood::Positive => "bg-positive",
            Mood::Neutral => "bg-neutral",
            Mood::Negative => "bg-negative",
            Mood::IntenseNegative => "bg-negative-intense",
        }
    }
}

/// Maps polarity `[-1, 1]` onto `[0, 100]`.
pub fn polarity_percent(polarity: f64) -> f64 {
    (polarity + 1.0) * 50.0
}

pub fn subjectivity_percent(subjectivity: f64) -> f64 {
    subjectivity * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceResult {
    pub text: String,
    pub polarity: f64,
    pub label: Label,
}

impl SentenceResult {
    pub fn new(text: impl Into<String>, polarity: f64) -> Self {
        let polarity = round2(polarity);
        Self {
            text: text.into(),
            polarity,
            label: Label::from_polarity(polarity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub text: String,
    pub polarity: f64,
    pub subjectivity: f64,
    pub label: Label,
    pub keywords: Vec<String>,
    pub sentences: Vec<SentenceResult>,

    // derived from the fields above
    pub emoji: &'static str,
    pub bg_class: &'static str,
    pub color_class: &'static str,
    pub polarity_percent: f64,
    pub subjectivity_percent: f64,
    pub label_lower: &'static str,
}

impl SentimentResult {
    /// Assemble a result; `polarity` and `subjectivity` are rounded here and
    /// every presentation field is derived from them.
    pub fn new(
        text: impl Into<String>,
        polarity: f64,
        subjectivity: f64,
        keywords: Vec<String>,
        sentences: Vec<SentenceResult>,
    ) -> Self {
        let polarity = round2(polarity.clamp(-1.0, 1.0));
        let subjectivity = round2(subjectivity.clamp(0.0, 1.0));
        let label = Label::from_polarity(polarity);
        let mood = Mood::from_polarity(polarity);
        Self {
            text: text.into(),
            polarity,
            subjectivity,
            label,
            keywords,
            sentences,
            emoji: mood.emoji(),
            bg_class: mood.bg_class(),
            color_class: label.color_class(),
            polarity_percent: polarity_percent(polarity),
            subjectivity_percent: subjectivity_percent(subjectivity),
            label_lower: label.lower(),
        }
    }

    pub fn mood(&self) -> Mood {
        Mood::from_polarity(self.polarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_behaves() {
        assert_eq!(round2(0.954), 0.95);
        assert_eq!(round2(0.955_1), 0.96);
        assert_eq!(round2(-0.304), -0.3);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
    }

    #[test]
    fn round2_uses_the_stored_value() {
        assert_eq!(round2(0.105), 0.1);
        assert_eq!(round2(0.015), 0.01);
        assert_eq!(round2(0.495), 0.49);
        assert_eq!(round2(-0.105), -0.1);
        assert_eq!(Label::from_polarity(round2(0.105)), Label::Neutral);

        let r = SentimentResult::new("fine", 0.105, 0.495, vec![], vec![]);
        assert_eq!(r.polarity, 0.1);
        assert_eq!(r.label, Label::Neutral);
        assert_eq!(r.subjectivity, 0.49);
    }

    #[test]
    fn label_boundaries_are_strict() {
        assert_eq!(Label::from_polarity(0.1), Label::Neutral);
        assert_eq!(Label::from_polarity(-0.1), Label::Neutral);
        assert_eq!(Label::from_polarity(0.11), Label::Positive);
        assert_eq!(Label::from_polarity(-0.11), Label::Negative);
        assert_eq!(Label::from_polarity(0.0), Label::Neutral);
    }

    #[test]
    fn label_covers_the_whole_range() {
        for i in -100..=100 {
            let p = i as f64 / 100.0;
            let l = Label::from_polarity(p);
            let expected = if p > 0.1 {
                Label::Positive
            } else if p < -0.1 {
                Label::Negative
            } else {
                Label::Neutral
            };
            assert_eq!(l, expected, "p={p}");
        }
    }

    #[test]
    fn mood_buckets() {
        assert_eq!(Mood::from_polarity(0.51), Mood::IntensePositive);
        assert_eq!(Mood::from_polarity(0.5), Mood::Positive);
        assert_eq!(Mood::from_polarity(0.01), Mood::Positive);
        assert_eq!(Mood::from_polarity(0.0), Mood::Neutral);
        assert_eq!(Mood::from_polarity(-0.01), Mood::Negative);
        assert_eq!(Mood::from_polarity(-0.5), Mood::Negative);
        assert_eq!(Mood::from_polarity(-0.51), Mood::IntenseNegative);
    }

    #[test]
    fn small_polarity_is_neutral_label_but_positive_emoji() {
        let r = SentimentResult::new("meh", 0.05, 0.1, vec![], vec![]);
        assert_eq!(r.label, Label::Neutral);
        assert_eq!(r.emoji, "🙂");
        assert_eq!(r.bg_class, "bg-positive");
        assert_eq!(r.color_class, "text-gray-600");
    }

    #[test]
    fn polarity_percent_endpoints_and_monotonic() {
        assert_eq!(polarity_percent(-1.0), 0.0);
        assert_eq!(polarity_percent(0.0), 50.0);
        assert_eq!(polarity_percent(1.0), 100.0);
        let mut prev = f64::MIN;
        for i in -100..=100 {
            let v = polarity_percent(i as f64 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn derived_fields_follow_polarity() {
        let r = SentimentResult::new("I love this!", 0.95, 0.8, vec![], vec![]);
        assert_eq!(r.label, Label::Positive);
        assert_eq!(r.label_lower, "positive");
        assert_eq!(r.emoji, "🤩");
        assert_eq!(r.bg_class, "bg-positive-intense");
        assert_eq!(r.color_class, "text-green-600");
        assert!((r.polarity_percent - 97.5).abs() < 1e-9);
        assert!((r.subjectivity_percent - 80.0).abs() < 1e-9);
    }

    #[test]
    fn sentence_result_labels_after_rounding() {
        // 0.104 rounds to 0.1, which is Neutral
        let s = SentenceResult::new("ok", 0.104);
        assert_eq!(s.polarity, 0.1);
        assert_eq!(s.label, Label::Neutral);
    }
}
