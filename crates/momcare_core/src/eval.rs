use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::corpus::FaqCorpus;
use crate::embed::EmbeddingProvider;
use crate::model::MatchResult;
use crate::retrieval::match_query;

pub const DEFAULT_REQUIRED_PASS_RATE: f32 = 0.85;

/// One labeled retrieval case: should this question match, and if so,
/// which answer is acceptable?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub case_id: String,
    pub question: String,
    pub expected_match: bool,
    #[serde(default)]
    pub expected_answer: Option<String>,
    #[serde(default)]
    pub min_similarity: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub case_id: String,
    pub passed: bool,
    pub matched: bool,
    pub answer: Option<String>,
    pub score: f32,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    pub outcomes: Vec<EvalOutcome>,
}

fn case_passes(case: &EvalCase, result: &MatchResult) -> bool {
    if case.expected_match != result.is_matched() {
        return false;
    }

    if let Some(expected) = &case.expected_answer {
        if result.answer() != Some(expected.as_str()) {
            return false;
        }
    }

    if let Some(min_sim) = case.min_similarity {
        if result.score() < min_sim {
            return false;
        }
    }

    true
}

pub fn evaluate_cases<E>(
    embedder: &E,
    corpus: &FaqCorpus,
    cases: &[EvalCase],
    threshold: f32,
) -> anyhow::Result<EvalSummary>
where
    E: EmbeddingProvider + ?Sized,
{
    let mut outcomes = Vec::with_capacity(cases.len());

    for case in cases {
        let start = Instant::now();
        let result = match_query(embedder, corpus, &case.question, threshold)?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        outcomes.push(EvalOutcome {
            case_id: case.case_id.clone(),
            passed: case_passes(case, &result),
            matched: result.is_matched(),
            answer: result.answer().map(str::to_string),
            score: result.score(),
            latency_ms,
        });
    }

    let total = outcomes.len();
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = total.saturating_sub(passed);
    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f32 / total as f32
    };

    Ok(EvalSummary {
        total,
        passed,
        failed,
        pass_rate,
        outcomes,
    })
}
