//! VADER compound scoring

use super::SentimentScorer;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Scores text with the VADER lexicon and rules
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl VaderScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        // The analyzer only borrows the shared lexicon tables
        let analyzer = SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);
        match scores.get("compound") {
            Some(&compound) if compound.is_finite() => compound.clamp(-1.0, 1.0),
            _ => 0.0,
        }
    }
}
