//! AFINN-inspired rule-based sentiment analyzer
//!
//! Scores text against a fixed table of words with integer valence weights
//! from -5 to +5 and normalizes the aggregate to the 1-5 scale. The table is
//! a published constant of the scoring contract, not configuration: given
//! the same text, every deployment produces the same score bit-for-bit.

use super::SentimentAnalyzer;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Score returned when no lexicon word matches. The no-signal case is a
/// first-class output, not an error.
pub const NEUTRAL_SCORE: f64 = 3.0;

/// Fixed word valence table, curated for transport feedback
static LEXICON_ENTRIES: &[(&str, i32)] = &[
    // Strongly positive (+4 to +5)
    ("excellent", 5),
    ("outstanding", 5),
    ("amazing", 5),
    ("fantastic", 5),
    ("wonderful", 5),
    ("superb", 5),
    ("brilliant", 4),
    ("awesome", 4),
    ("love", 4),
    ("perfect", 5),
    ("exceptional", 5),
    ("delightful", 4),
    // Positive (+2 to +3)
    ("good", 3),
    ("great", 3),
    ("nice", 2),
    ("happy", 3),
    ("pleased", 2),
    ("comfortable", 2),
    ("friendly", 3),
    ("helpful", 3),
    ("professional", 3),
    ("polite", 2),
    ("clean", 2),
    ("safe", 2),
    ("smooth", 2),
    ("punctual", 3),
    ("reliable", 3),
    ("courteous", 3),
    ("pleasant", 2),
    ("enjoy", 3),
    ("recommend", 3),
    ("satisfied", 3),
    // Mildly positive (+1)
    ("okay", 1),
    ("fine", 1),
    ("decent", 1),
    ("adequate", 1),
    ("fair", 1),
    ("acceptable", 1),
    ("average", 0),
    // Mildly negative (-1 to -2)
    ("slow", -2),
    ("late", -2),
    ("delay", -2),
    ("wait", -1),
    ("boring", -2),
    ("mediocre", -1),
    ("disappointing", -2),
    ("uncomfortable", -2),
    ("unfriendly", -2),
    ("dirty", -2),
    ("problem", -2),
    ("issue", -1),
    ("complaint", -2),
    // Negative (-3 to -4)
    ("bad", -3),
    ("poor", -3),
    ("terrible", -4),
    ("horrible", -4),
    ("awful", -4),
    ("rude", -3),
    ("angry", -3),
    ("upset", -3),
    ("dangerous", -4),
    ("unsafe", -4),
    ("worst", -4),
    ("hate", -4),
    ("disgusting", -4),
    ("unacceptable", -3),
    ("unprofessional", -3),
    ("careless", -3),
    ("aggressive", -3),
    ("scary", -3),
    // Strongly negative (-5)
    ("accident", -5),
    ("crash", -5),
    ("harass", -5),
    ("abuse", -5),
    ("threat", -5),
    ("assault", -5),
    ("drunk", -5),
    ("intoxicated", -5),
];

static LEXICON: Lazy<HashMap<&'static str, i32>> =
    Lazy::new(|| LEXICON_ENTRIES.iter().copied().collect());

/// Deterministic lexicon-based sentiment scorer
///
/// Stateless and side-effect-free; the default analyzer wired in by the
/// composition root.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconAnalyzer;

impl LexiconAnalyzer {
    /// Create a new lexicon analyzer
    pub fn new() -> Self {
        Self
    }
}

impl SentimentAnalyzer for LexiconAnalyzer {
    /// Analyzes text and returns a sentiment score from 1.0 to 5.0.
    ///
    /// Tokens are the whitespace-separated runs left after lowercasing and
    /// stripping every non-alphabetic character. Matched weights are
    /// averaged, the [-5,+5] average is mapped linearly onto [1,5], clamped,
    /// and rounded to one decimal place.
    fn analyze(&self, text: &str) -> f64 {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .collect();

        let mut total = 0i32;
        let mut matched = 0u32;

        for word in cleaned.split_whitespace() {
            if let Some(weight) = LEXICON.get(word) {
                total += weight;
                matched += 1;
            }
        }

        if matched == 0 {
            return NEUTRAL_SCORE;
        }

        let avg = f64::from(total) / f64::from(matched);
        let normalized = ((avg + 5.0) / 10.0) * 4.0 + 1.0;

        (normalized.clamp(1.0, 5.0) * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_match_is_exactly_neutral() {
        let analyzer = LexiconAnalyzer::new();
        assert_eq!(analyzer.analyze(""), 3.0);
        assert_eq!(analyzer.analyze("the quick brown fox"), 3.0);
        assert_eq!(analyzer.analyze("1234 !!! ???"), 3.0);
    }

    #[test]
    fn test_single_strong_positive() {
        let analyzer = LexiconAnalyzer::new();
        // avg = 5 -> ((5+5)/10)*4 + 1 = 5.0
        assert_eq!(analyzer.analyze("excellent service"), 5.0);
    }

    #[test]
    fn test_strongly_negative_phrase() {
        let analyzer = LexiconAnalyzer::new();
        // terrible(-4) + rude(-3), avg = -3.5 -> ((1.5)/10)*4 + 1 = 1.6
        assert_eq!(analyzer.analyze("terrible and rude"), 1.6);
    }

    #[test]
    fn test_mixed_sentiment_averages() {
        let analyzer = LexiconAnalyzer::new();
        // good(3) + late(-2), avg = 0.5 -> ((5.5)/10)*4 + 1 = 3.2
        assert_eq!(analyzer.analyze("good driver but late"), 3.2);
    }

    #[test]
    fn test_punctuation_and_case_are_ignored() {
        let analyzer = LexiconAnalyzer::new();
        assert_eq!(analyzer.analyze("EXCELLENT!!!"), analyzer.analyze("excellent"));
        // stripping joins the letters back into a lexicon word: rude(-3) -> 1.8
        assert_eq!(analyzer.analyze("r.u.d.e"), 1.8);
    }

    #[test]
    fn test_deterministic() {
        let analyzer = LexiconAnalyzer::new();
        let text = "smooth trip, punctual and professional";
        assert_eq!(analyzer.analyze(text), analyzer.analyze(text));
    }

    proptest! {
        #[test]
        fn prop_score_in_range(text in ".{0,200}") {
            let score = LexiconAnalyzer::new().analyze(&text);
            prop_assert!((1.0..=5.0).contains(&score));
        }

        #[test]
        fn prop_score_has_one_decimal(text in ".{0,200}") {
            let score = LexiconAnalyzer::new().analyze(&text);
            let scaled = score * 10.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }
}
