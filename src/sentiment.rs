//! Polarity scoring and bucketing into integer labels.

use std::fmt;

use clap::ValueEnum;
use once_cell::sync::Lazy;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Scores text on a continuous scale from -1.0 (negative) to 1.0 (positive).
pub trait PolarityScorer {
    fn polarity(&self, text: &str) -> f64;
}

/// Lexicon and rule based scorer using the VADER compound score.
#[derive(Debug, Default, Clone, Copy)]
pub struct VaderScorer;

impl PolarityScorer for VaderScorer {
    fn polarity(&self, text: &str) -> f64 {
        static ANALYZER: Lazy<SentimentIntensityAnalyzer> =
            Lazy::new(SentimentIntensityAnalyzer::new);

        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = ANALYZER.polarity_scores(text);
        scores
            .get("compound")
            .copied()
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }
}

impl<F: Fn(&str) -> f64> PolarityScorer for F {
    fn polarity(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Label scale. `Three` splits at zero; `Five` also splits each side at 0.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scale {
    #[default]
    Three,
    Five,
}

const FIVE_WAY_CUT: f64 = 0.3;

impl Scale {
    pub fn label(self, score: f64) -> i8 {
        match self {
            Scale::Three => {
                if score > 0.0 {
                    1
                } else if score == 0.0 {
                    0
                } else {
                    -1
                }
            }
            Scale::Five => {
                if score < -FIVE_WAY_CUT {
                    0
                } else if score < 0.0 {
                    1
                } else if score == 0.0 {
                    2
                } else if score <= FIVE_WAY_CUT {
                    3
                } else {
                    4
                }
            }
        }
    }

    /// Every label, most positive first.
    pub fn labels(self) -> &'static [i8] {
        match self {
            Scale::Three => &[1, 0, -1],
            Scale::Five => &[4, 3, 2, 1, 0],
        }
    }

    pub fn name(self, label: i8) -> &'static str {
        match (self, label) {
            (Scale::Three, 1) | (Scale::Five, 3) => "Positive",
            (Scale::Three, 0) | (Scale::Five, 2) => "Neutral",
            (Scale::Three, -1) | (Scale::Five, 1) => "Negative",
            (Scale::Five, 4) => "Very positive",
            (Scale::Five, 0) => "Very negative",
            _ => "Unknown",
        }
    }
}

/// Share of each label over one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    scale: Scale,
    subject: &'static str,
    total: usize,
    counts: Vec<(i8, usize)>,
}

impl Summary {
    pub fn from_labels(
        scale: Scale,
        subject: &'static str,
        labels: impl IntoIterator<Item = i8>,
    ) -> Self {
        let mut counts: Vec<(i8, usize)> = scale.labels().iter().map(|&l| (l, 0)).collect();
        let mut total = 0;
        for label in labels {
            total += 1;
            if let Some(entry) = counts.iter_mut().find(|(l, _)| *l == label) {
                entry.1 += 1;
            }
        }
        Self {
            scale,
            subject,
            total,
            counts,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, label: i8) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |(_, c)| *c)
    }

    pub fn percentage(&self, label: i8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(label) as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (label, _)) in self.counts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "Percentage of {} {} {:.2}%",
                self.scale.name(*label),
                self.subject,
                self.percentage(*label)
            )?;
        }
        Ok(())
    }
}
