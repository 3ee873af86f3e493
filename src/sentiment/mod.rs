//! Text sentiment scoring
//!
//! A scorer maps text to a compound polarity in [-1.0, 1.0]. Scorers are
//! constructed explicitly and passed to whatever needs them.
//!
//! [`VaderScorer`] uses the full VADER lexicon and is the default.
//! [`LexiconScorer`] applies the same rules to a caller-supplied table and
//! ships with a small crypto slang table.

mod lexicon;
mod vader;


pub use lexicon::DEFAULT_LEXICON;
pub use vader::VaderScorer;

use std::collections::HashMap;

const NEGATION_SCALAR: f64 = -0.74;
const BOOST_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
/// Normalisation constant for `s / sqrt(s^2 + alpha)`
const ALPHA: f64 = 15.0;

/// Deterministic, stateless text scorer
#[cfg_attr(test, mockall::automock)]
pub trait SentimentScorer: Send + Sync {
    /// Compound polarity in [-1.0, 1.0]
    fn score(&self, text: &str) -> f64;
}

/// Rule based scorer over its own lexicon
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::with_lexicon(DEFAULT_LEXICON.iter().map(|(w, v)| (w.to_string(), *v)))
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        let lexicon = entries
            .into_iter()
            .map(|(word, valence)| (word.to_lowercase(), valence))
            .collect();
        Self { lexicon }
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    fn valence_of(&self, tokens: &[Token], i: usize, shouting: bool) -> f64 {
        let token = &tokens[i];
        let mut valence = match self.lexicon.get(&token.lower) {
            Some(&base) if base != 0.0 => base,
            // Neutral words stay neutral under emphasis and negation
            _ => return 0.0,
        };

        if shouting && token.is_caps {
            valence += CAPS_INCREMENT * valence.signum();
        }

        if i > 0 {
            let prev = &tokens[i - 1].lower;
            if lexicon::BOOSTERS.contains(&prev.as_str()) {
                valence += BOOST_INCREMENT * valence.signum();
            } else if lexicon::DAMPENERS.contains(&prev.as_str()) {
                valence -= BOOST_INCREMENT * valence.signum();
            }
        }

        let window = i.saturating_sub(3)..i;
        if tokens[window].iter().any(|t| is_negation(&t.lower)) {
            valence *= NEGATION_SCALAR;
        }

        valence
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }

        // Emphasis only counts when the whole text is not shouted
        let caps_count = tokens.iter().filter(|t| t.is_caps).count();
        let shouting = caps_count > 0 && caps_count < tokens.len();

        let but_at = tokens.iter().position(|t| t.lower == "but");

        let mut sum = 0.0;
        for i in 0..tokens.len() {
            let mut valence = self.valence_of(&tokens, i, shouting);
            if let Some(b) = but_at {
                if i < b {
                    valence *= 0.5;
                } else if i > b {
                    valence *= 1.5;
                }
            }
            sum += valence;
        }

        if sum != 0.0 {
            let bangs = text.matches('!').count().min(MAX_EXCLAMATIONS) as f64;
            sum += bangs * EXCLAMATION_INCREMENT * sum.signum();
        }

        normalize(sum)
    }
}

/// Map an unbounded valence sum into [-1, 1]
pub fn normalize(sum: f64) -> f64 {
    if !sum.is_finite() {
        return 0.0;
    }
    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

struct Token {
    lower: String,
    is_caps: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .filter_map(|raw| {
            let word = raw.trim_matches(|c: char| c.is_ascii_punctuation() && c != '\'');
            let word = word.trim_matches('\'');
            if word.is_empty() {
                return None;
            }
            let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
            let is_caps = letters.len() > 1 && letters.iter().all(|c| c.is_uppercase());
            Some(Token {
                lower: word.to_lowercase(),
                is_caps,
            })
        })
        .collect()
}

fn is_negation(word: &str) -> bool {
    let stripped: String = word.chars().filter(|c| *c != '\'').collect();
    lexicon::NEGATIONS.contains(&stripped.as_str()) || word.ends_with("n't")
}
