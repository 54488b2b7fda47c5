use std::io;

use thiserror::Error;

use crate::embed::EmbeddingProvider;
use crate::model::FaqEntry;

pub const QUESTION_COLUMN: &str = "Question";
pub const ANSWER_COLUMN: &str = "Answer";

/// A rejected FAQ source row. `row` is the 1-based data row index
/// (header excluded), matching what a reader sees in the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("FAQ row {row}: {reason}")]
pub struct CorpusRowError {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    Row(#[from] CorpusRowError),

    #[error("FAQ source missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("FAQ source has no usable rows")]
    Empty,

    #[error("read FAQ source: {0}")]
    Csv(#[from] csv::Error),

    #[error("embed FAQ question: {0}")]
    Embed(anyhow::Error),
}

/// What to do with a malformed source row. Either way the rejection is
/// explicit: `Strict` aborts the load, `SkipInvalid` hands every
/// skipped row back to the caller for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    Strict,
    SkipInvalid,
}

#[derive(Debug)]
pub struct CorpusLoad {
    pub corpus: FaqCorpus,
    pub skipped: Vec<CorpusRowError>,
}

/// Ordered FAQ collection; insertion order is source order. Built once
/// at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqCorpus {
    entries: Vec<FaqEntry>,
}

impl FaqCorpus {
    pub fn new(entries: Vec<FaqEntry>) -> Result<Self, CorpusError> {
        if entries.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&FaqEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }
}

/// Load a corpus from CSV with named `Question` and `Answer` columns.
/// Each accepted question is lowercased and embedded exactly once here;
/// queries compare against these cached embeddings.
pub fn load_corpus_csv<E, R>(
    reader: R,
    embedder: &E,
    policy: RowPolicy,
) -> Result<CorpusLoad, CorpusError>
where
    E: EmbeddingProvider + ?Sized,
    R: io::Read,
{
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let question_idx = headers
        .iter()
        .position(|h| h.trim() == QUESTION_COLUMN)
        .ok_or(CorpusError::MissingColumn(QUESTION_COLUMN))?;
    let answer_idx = headers
        .iter()
        .position(|h| h.trim() == ANSWER_COLUMN)
        .ok_or(CorpusError::MissingColumn(ANSWER_COLUMN))?;

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (i, record) in csv_reader.records().enumerate() {
        let row = i + 1;
        let record = record?;

        let question = record.get(question_idx).unwrap_or("").trim();
        let answer = record.get(answer_idx).unwrap_or("").trim();

        let reason = if question.is_empty() {
            Some("missing question")
        } else if answer.is_empty() {
            Some("missing answer")
        } else {
            None
        };

        if let Some(reason) = reason {
            let err = CorpusRowError {
                row,
                reason: reason.to_string(),
            };
            match policy {
                RowPolicy::Strict => return Err(err.into()),
                RowPolicy::SkipInvalid => {
                    skipped.push(err);
                    continue;
                }
            }
        }

        let embedding = embedder
            .embed(&question.to_lowercase())
            .map_err(CorpusError::Embed)?;
        entries.push(FaqEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            embedding,
        });
    }

    let corpus = FaqCorpus::new(entries)?;
    Ok(CorpusLoad { corpus, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbeddingProvider;

    const GOOD_CSV: &str = "\
Question,Answer
What is postpartum depression?,A.
How much water should I drink?,B.
";

    #[test]
    fn load_preserves_source_order() {
        let embedder = HashEmbeddingProvider::new(32);
        let load = load_corpus_csv(GOOD_CSV.as_bytes(), &embedder, RowPolicy::Strict).unwrap();

        assert_eq!(load.corpus.len(), 2);
        assert!(load.skipped.is_empty());
        assert_eq!(
            load.corpus.entry(0).unwrap().question,
            "What is postpartum depression?"
        );
        assert_eq!(load.corpus.entry(1).unwrap().answer, "B.");
        assert_eq!(load.corpus.entry(0).unwrap().embedding.len(), 32);
    }

    #[test]
    fn strict_policy_rejects_row_with_index() {
        let csv = "Question,Answer\nQ1,A1\n,A2\n";
        let embedder = HashEmbeddingProvider::new(32);
        let err = load_corpus_csv(csv.as_bytes(), &embedder, RowPolicy::Strict).unwrap_err();

        match err {
            CorpusError::Row(row_err) => {
                assert_eq!(row_err.row, 2);
                assert!(row_err.reason.contains("question"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skip_policy_collects_rejected_rows() {
        let csv = "Question,Answer\nQ1,A1\nQ2,\n,A3\nQ4,A4\n";
        let embedder = HashEmbeddingProvider::new(32);
        let load = load_corpus_csv(csv.as_bytes(), &embedder, RowPolicy::SkipInvalid).unwrap();

        assert_eq!(load.corpus.len(), 2);
        assert_eq!(load.skipped.len(), 2);
        assert_eq!(load.skipped[0].row, 2);
        assert_eq!(load.skipped[1].row, 3);
    }

    #[test]
    fn missing_column_is_a_load_error() {
        let csv = "Q,A\nx,y\n";
        let embedder = HashEmbeddingProvider::new(32);
        let err = load_corpus_csv(csv.as_bytes(), &embedder, RowPolicy::Strict).unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumn("Question")));
    }

    #[test]
    fn empty_source_is_a_load_error() {
        let csv = "Question,Answer\n";
        let embedder = HashEmbeddingProvider::new(32);
        let err = load_corpus_csv(csv.as_bytes(), &embedder, RowPolicy::Strict).unwrap_err();
        assert!(matches!(err, CorpusError::Empty));
    }
}
