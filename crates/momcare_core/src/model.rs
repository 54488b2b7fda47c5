use serde::{Deserialize, Serialize};

/// One FAQ pair with its question embedding, computed once at corpus
/// load and never recomputed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        answer: String,
        score: f32,
        index: usize,
    },
    Unmatched {
        best_score: f32,
    },
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn score(&self) -> f32 {
        match self {
            MatchResult::Matched { score, .. } => *score,
            MatchResult::Unmatched { best_score } => *best_score,
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { answer, .. } => Some(answer),
            MatchResult::Unmatched { .. } => None,
        }
    }
}
