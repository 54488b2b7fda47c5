pub mod corpus;
pub mod embed;
pub mod eval;
pub mod features;
pub mod feedback;
pub mod forest;
pub mod model;
pub mod retrieval;
pub mod service;
pub mod storage;
pub mod training;

pub use corpus::{load_corpus_csv, CorpusError, CorpusLoad, CorpusRowError, FaqCorpus, RowPolicy};
pub use embed::{EmbeddingProvider, HashEmbeddingProvider, DEFAULT_EMBEDDING_DIM};
pub use eval::{evaluate_cases, EvalCase, EvalOutcome, EvalSummary};
pub use features::{build_features, FeatureError, FeatureVector, WellnessInput, FEATURE_NAMES};
pub use feedback::FeedbackBands;
pub use forest::{ForestConfig, WellnessModel};
pub use model::{FaqEntry, MatchResult};
pub use retrieval::{
    answer_or_fallback, best_match, cosine_similarity, match_query, DEFAULT_MATCH_THRESHOLD,
    FALLBACK_ANSWER,
};
pub use service::{PredictionResult, PredictionService};
pub use storage::{
    load_corpus_jsonl, load_model, save_corpus_jsonl, save_model, ModelArtifact, ModelLoadError,
};
pub use training::{read_training_csv, train, TrainError, TrainReport, TrainingRecord};
