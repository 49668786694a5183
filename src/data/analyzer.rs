// ============================================================
// Layer 4: Text Analyzer
// ============================================================
// Turns raw text into index/query terms. The same Analyzer
// value is used when documents are indexed and when queries
// are scored, so both sides draw terms from one vocabulary.
//
// Steps (applied in order):
//   1. Tokenize   split on non-alphanumeric boundaries; decimal
//                 numbers ("3.5") and apostrophe words ("body's")
//                 stay whole
//   2. Lowercase
//   3. Stopwords  drop tokens in the configured set (the set
//                 is lowercased once, so matching ignores case)
//   4. Length     keep tokens with min_len..=max_len characters
//   5. Stem       Snowball English (Porter2) suffix stripping,
//                 repeated until the term stops changing; the
//                 stopword and length checks then run again on
//                 the stem
//
// A Porter2 stem is not always a fixpoint ("respons" stems to
// "respon") and can land on a stopword ("ins" -> "in"), so a
// single pass would make normalize() unstable on its own output.
//
// The Analyzer holds no mutable state: analyze() is a pure
// function of its input and the configuration it was built from.
//
// Reference: Porter (1980), "An algorithm for suffix stripping"
//            Rust Book §13 (Iterators)

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

/// Decimal numbers first, so "3.5" is not split at the dot.
const TOKEN_PATTERN: &str = r"\p{N}+(?:\.\p{N}+)+|[\p{L}\p{N}]+(?:'\p{L}+)*";

/// Upper bound on stem passes. Porter2 only shortens a word.
const MAX_STEM_PASSES: usize = 8;

pub const DEFAULT_STOPWORDS: &[&str] = &["the", "is", "in", "at", "of", "on", "and", "a", "to"];

/// Immutable analyzer settings, loadable from the JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub stopwords: Vec<String>,
    pub min_len:   usize,
    pub max_len:   usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            min_len:   2,
            max_len:   20,
        }
    }
}

pub struct Analyzer {
    token_re:  Regex,
    stopwords: HashSet<String>,
    min_len:   usize,
    max_len:   usize,
    stemmer:   Stemmer,
}

impl Analyzer {
    /// Build an analyzer from its configuration.
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            token_re:  Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex"),
            stopwords: config.stopwords.iter().map(|w| w.to_lowercase()).collect(),
            min_len:   config.min_len,
            max_len:   config.max_len,
            stemmer:   Stemmer::create(Algorithm::English),
        }
    }

    /// Run the full pipeline and return the terms in source order.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.analyze_spans(text).into_iter().map(|(term, _)| term).collect()
    }

    /// Like [`analyze`](Self::analyze), keeping the byte range of the
    /// source token each term came from.
    pub fn analyze_spans(&self, text: &str) -> Vec<(String, Range<usize>)> {
        self.token_re
            .find_iter(text)
            .filter_map(|m| {
                let token = m.as_str().to_lowercase();
                if !self.keeps(&token) {
                    return None;
                }
                let term = self.stem(&token);
                self.keeps(&term).then(|| (term, m.range()))
            })
            .collect()
    }

    /// Analyzed terms joined by single spaces; the form queries are
    /// handed to the rankers in.
    pub fn normalize(&self, text: &str) -> String {
        self.analyze(text).join(" ")
    }

    fn keeps(&self, token: &str) -> bool {
        let len = token.chars().count();
        !self.is_stopword(token) && len >= self.min_len && len <= self.max_len
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    fn stem(&self, token: &str) -> String {
        let mut current = self.stemmer.stem(token).into_owned();
        for _ in 0..MAX_STEM_PASSES {
            let next = self.stemmer.stem(&current).into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

// rust_stemmers::Stemmer has no Debug impl
impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("stopwords", &self.stopwords.len())
            .field("min_len", &self.min_len)
            .field("max_len", &self.max_len)
            .finish()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer_with(stopwords: &[&str]) -> Analyzer {
        Analyzer::new(&AnalyzerConfig {
            stopwords: stopwords.iter().map(|s| s.to_string()).collect(),
            ..AnalyzerConfig::default()
        })
    }

    #[test]
    fn test_full_pipeline() {
        let a = analyzer_with(&["the", "and"]);
        assert_eq!(
            a.analyze("The cats and dogs ran quickly"),
            vec!["cat", "dog", "ran", "quick"]
        );
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        let a = Analyzer::default();
        let once  = a.normalize("The cats and dogs ran quickly through the boundary layers");
        let twice = a.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_twice_matches_once() {
        let a = Analyzer::default();
        let once = a.normalize("response noise expansion only ins and outs early");
        assert!(!once.is_empty());
        assert_eq!(a.normalize(&once), once);
    }

    #[test]
    fn test_every_term_is_its_own_stem() {
        let a = Analyzer::default();
        let text = "response noise expansion only early responses noisy expanding \
                    boundary layers aerodynamic heating";
        for term in a.analyze(text) {
            assert_eq!(a.analyze(&term), vec![term.clone()], "term {term:?} is not stable");
        }
    }

    #[test]
    fn test_stem_landing_on_stopword_is_dropped() {
        let a = Analyzer::default();
        // ins -> in, ons -> on, ats -> at
        assert_eq!(a.analyze("ins ons ats wing"), vec!["wing"]);
    }

    #[test]
    fn test_stopwords_ignore_case() {
        let a = analyzer_with(&["The", "AND"]);
        assert_eq!(a.analyze("THE wing and THE tail"), vec!["wing", "tail"]);
        assert!(a.is_stopword("and"));
    }

    #[test]
    fn test_length_bounds_inclusive() {
        let a = analyzer_with(&[]);
        // 1 char dropped, 2 kept, 21 dropped, 20 kept
        assert_eq!(a.analyze("x").len(), 0);
        assert_eq!(a.analyze("xy").len(), 1);
        assert_eq!(a.analyze("abcdefghijklmnopqrstu").len(), 0);
        assert_eq!(a.analyze("abcdefghijklmnopqrst").len(), 1);
    }

    #[test]
    fn test_splits_on_punctuation() {
        let a = analyzer_with(&[]);
        assert_eq!(a.analyze("boundary-layer, flow!"), vec!["boundari", "layer", "flow"]);
    }

    #[test]
    fn test_decimal_numbers_stay_whole() {
        let a = analyzer_with(&[]);
        assert_eq!(a.analyze("mach 3.5 flow"), vec!["mach", "3.5", "flow"]);
    }

    #[test]
    fn test_stemming_applied() {
        let a = Analyzer::default();
        assert_eq!(a.analyze("running"), vec!["run"]);
        assert_eq!(a.analyze("Flows"), vec!["flow"]);
    }

    #[test]
    fn test_spans_point_at_source_tokens() {
        let a = Analyzer::default();
        let text = "The Flows of air";
        let spans = a.analyze_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].0, "flow");
        assert_eq!(&text[spans[0].1.clone()], "Flows");
        assert_eq!(&text[spans[1].1.clone()], "air");
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let a = Analyzer::default();
        assert!(a.analyze("").is_empty());
        assert!(a.analyze("... --- ...").is_empty());
        assert_eq!(a.normalize("the of and"), "");
    }

    #[test]
    fn test_same_input_same_output() {
        let a = Analyzer::default();
        let text = "Experimental investigation of the aerodynamics of a wing";
        assert_eq!(a.analyze(text), a.analyze(text));
    }
}
