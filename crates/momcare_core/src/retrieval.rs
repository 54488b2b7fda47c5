use anyhow::Result;

use crate::corpus::FaqCorpus;
use crate::embed::EmbeddingProvider;
use crate::model::MatchResult;

pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.7;

pub const FALLBACK_ANSWER: &str =
    "Sorry, I don't have an answer for that. Please consult a professional.";

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }

    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

/// Full scan for the most similar corpus entry. Ties break toward the
/// lowest index (strictly-greater comparison), so the result is
/// deterministic for any corpus ordering.
pub fn best_match(query_embedding: &[f32], corpus: &FaqCorpus) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (i, entry) in corpus.entries().iter().enumerate() {
        let score = cosine_similarity(query_embedding, &entry.embedding);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }

    best
}

/// Embed the lowercased query and decide against `threshold`. A score
/// exactly equal to the threshold is a match.
pub fn match_query<E>(
    embedder: &E,
    corpus: &FaqCorpus,
    query: &str,
    threshold: f32,
) -> Result<MatchResult>
where
    E: EmbeddingProvider + ?Sized,
{
    let query_embedding = embedder.embed(&query.to_lowercase())?;

    match best_match(&query_embedding, corpus) {
        Some((index, score)) if score >= threshold => {
            let entry = corpus
                .entry(index)
                .ok_or_else(|| anyhow::anyhow!("corpus entry {index} out of range"))?;
            Ok(MatchResult::Matched {
                answer: entry.answer.clone(),
                score,
                index,
            })
        }
        Some((_, score)) => Ok(MatchResult::Unmatched { best_score: score }),
        None => Ok(MatchResult::Unmatched { best_score: 0.0 }),
    }
}

pub fn answer_or_fallback<E>(
    embedder: &E,
    corpus: &FaqCorpus,
    query: &str,
    threshold: f32,
) -> Result<String>
where
    E: EmbeddingProvider + ?Sized,
{
    Ok(match match_query(embedder, corpus, query, threshold)? {
        MatchResult::Matched { answer, .. } => answer,
        MatchResult::Unmatched { .. } => FALLBACK_ANSWER.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbeddingProvider;
    use crate::model::FaqEntry;

    fn mk_corpus(entries: Vec<(&str, Vec<f32>)>) -> FaqCorpus {
        FaqCorpus::new(
            entries
                .into_iter()
                .map(|(answer, embedding)| FaqEntry {
                    question: String::new(),
                    answer: answer.to_string(),
                    embedding,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn cosine_is_bounded_and_symmetric_cases() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        let d = vec![-1.0, 0.0, 0.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c)).abs() < 1e-6);
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_zero_for_zero_norm() {
        let zero = vec![0.0, 0.0];
        let v = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn cosine_is_zero_for_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn ties_break_toward_lowest_index() {
        let corpus = mk_corpus(vec![
            ("first", vec![1.0, 0.0]),
            ("duplicate", vec![1.0, 0.0]),
        ]);
        let (index, score) = best_match(&[1.0, 0.0], &corpus).unwrap();
        assert_eq!(index, 0);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn best_match_is_deterministic() {
        let corpus = mk_corpus(vec![("a", vec![0.8, 0.6]), ("b", vec![0.6, 0.8])]);
        let first = best_match(&[1.0, 0.0], &corpus);
        let second = best_match(&[1.0, 0.0], &corpus);
        assert_eq!(first, second);
    }

    /// Embedder with hand-picked vectors whose norms are exact in f32,
    /// so the similarity values in the boundary test are exact too.
    struct FixedEmbedder;

    impl EmbeddingProvider for FixedEmbedder {
        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(match text {
                "aligned" => vec![3.0, 4.0],
                "offset" => vec![4.0, 3.0],
                _ => vec![0.0, 0.0],
            })
        }
    }

    #[test]
    fn score_equal_to_threshold_matches() {
        let corpus = mk_corpus(vec![("A.", vec![3.0, 4.0])]);

        // Identical vector: dot = 25, norms = 5, similarity exactly 1.0.
        let result = match_query(&FixedEmbedder, &corpus, "aligned", 1.0).unwrap();
        assert!(result.is_matched());
        assert_eq!(result.answer(), Some("A."));

        // Exactly at the threshold is still a match; epsilon below is not.
        let offset_score = cosine_similarity(&[4.0, 3.0], &[3.0, 4.0]);
        let at = match_query(&FixedEmbedder, &corpus, "offset", offset_score).unwrap();
        assert!(at.is_matched());

        let above = match_query(&FixedEmbedder, &corpus, "offset", offset_score + f32::EPSILON)
            .unwrap();
        assert!(!above.is_matched());
    }

    #[test]
    fn identical_question_matches_at_default_threshold() {
        let embedder = HashEmbeddingProvider::new(32);
        let question_embedding = embedder.embed("what is postpartum depression").unwrap();
        let corpus = mk_corpus(vec![("A.", question_embedding)]);

        let result = match_query(
            &embedder,
            &corpus,
            "What is postpartum depression",
            DEFAULT_MATCH_THRESHOLD,
        )
        .unwrap();
        assert!(result.is_matched());
        assert!(result.score() > 0.99);
    }

    #[test]
    fn unmatched_query_gets_fallback_answer() {
        let embedder = HashEmbeddingProvider::new(64);
        let corpus = mk_corpus(vec![(
            "A.",
            embedder.embed("what is postpartum depression").unwrap(),
        )]);

        let answer = answer_or_fallback(
            &embedder,
            &corpus,
            "What is the capital of France?",
            DEFAULT_MATCH_THRESHOLD,
        )
        .unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[test]
    fn empty_query_is_unmatched_not_an_error() {
        let embedder = HashEmbeddingProvider::new(32);
        let corpus = mk_corpus(vec![("A.", embedder.embed("some question").unwrap())]);

        let result = match_query(&embedder, &corpus, "", DEFAULT_MATCH_THRESHOLD).unwrap();
        assert_eq!(result, MatchResult::Unmatched { best_score: 0.0 });
    }
}
