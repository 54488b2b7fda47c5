use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use momcare_core::{
    evaluate_cases, load_corpus_csv, load_corpus_jsonl, load_model, match_query,
    read_training_csv, save_corpus_jsonl, save_model, train, EvalCase, ForestConfig,
    HashEmbeddingProvider, MatchResult, ModelArtifact, PredictionService, RowPolicy,
    WellnessInput, DEFAULT_EMBEDDING_DIM, DEFAULT_MATCH_THRESHOLD, FALLBACK_ANSWER,
};
use momcare_core::eval::DEFAULT_REQUIRED_PASS_RATE;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "momcare")]
#[command(about = "Postpartum-care FAQ matching and wellness scoring CLI")]
struct Cli {
    /// Embedding dimension for the hash embedder.
    #[arg(long, global = true, default_value_t = DEFAULT_EMBEDDING_DIM)]
    dim: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Embed a FAQ CSV (Question,Answer columns) into a JSONL index.
    BuildIndex {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Skip malformed rows instead of aborting on the first one.
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Answer a free-text question against a built index.
    Ask {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        question: String,
        #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f32,
    },
    /// Run labeled retrieval cases against a built index.
    Eval {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        cases: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f32,
        #[arg(long, default_value_t = DEFAULT_REQUIRED_PASS_RATE)]
        min_pass_rate: f32,
    },
    /// Fit the wellness regressor from a historical tracking CSV.
    Train {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 100)]
        trees: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 0.2)]
        holdout: f32,
    },
    /// Score a wellness input JSON document with a trained model.
    Predict {
        #[arg(long)]
        model: PathBuf,
        /// Path to the input JSON, or `-` for stdin.
        #[arg(long)]
        input: String,
    },
}

fn read_wellness_input(source: &str) -> Result<WellnessInput> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("open {source}"))?
    };
    serde_json::from_str(&raw).context("parse wellness input json")
}

fn read_eval_cases_json(path: &Path) -> Result<Vec<EvalCase>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(file).context("parse eval cases json")
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let embedder = HashEmbeddingProvider::new(cli.dim);

    match &cli.command {
        Commands::BuildIndex {
            input,
            output,
            skip_invalid,
        } => {
            let policy = if *skip_invalid {
                RowPolicy::SkipInvalid
            } else {
                RowPolicy::Strict
            };
            let file = File::open(input).with_context(|| format!("open {}", input.display()))?;
            let load = load_corpus_csv(file, &embedder, policy)
                .with_context(|| format!("load FAQ source {}", input.display()))?;

            for skipped in &load.skipped {
                warn!(row = skipped.row, reason = %skipped.reason, "skipped FAQ row");
            }

            save_corpus_jsonl(output, &load.corpus)?;
            println!(
                "indexed_entries={} skipped_rows={} output={}",
                load.corpus.len(),
                load.skipped.len(),
                output.display()
            );
        }
        Commands::Ask {
            index,
            question,
            threshold,
        } => {
            let corpus = load_corpus_jsonl(index)?;
            info!(entries = corpus.len(), "corpus index loaded");

            let result = match_query(&embedder, &corpus, question, *threshold)?;
            match &result {
                MatchResult::Matched { score, index, .. } => {
                    println!("decision=matched score={score:.4} entry_index={index}");
                }
                MatchResult::Unmatched { best_score } => {
                    println!("decision=unmatched best_score={best_score:.4}");
                }
            }
            println!("answer={}", result.answer().unwrap_or(FALLBACK_ANSWER));
        }
        Commands::Eval {
            index,
            cases,
            threshold,
            min_pass_rate,
        } => {
            let corpus = load_corpus_jsonl(index)?;
            let cases = read_eval_cases_json(cases)?;
            let summary = evaluate_cases(&embedder, &corpus, &cases, *threshold)?;

            println!(
                "total={} passed={} failed={} pass_rate={:.4} required={:.4}",
                summary.total, summary.passed, summary.failed, summary.pass_rate, min_pass_rate
            );
            for o in &summary.outcomes {
                println!(
                    "case={} passed={} matched={} score={:.4} latency={:.1}ms",
                    o.case_id, o.passed, o.matched, o.score, o.latency_ms
                );
            }

            if summary.pass_rate < *min_pass_rate {
                anyhow::bail!(
                    "pass rate {:.4} below required {:.4}",
                    summary.pass_rate,
                    min_pass_rate
                );
            }
        }
        Commands::Train {
            data,
            output,
            trees,
            seed,
            holdout,
        } => {
            let file = File::open(data).with_context(|| format!("open {}", data.display()))?;
            let records = read_training_csv(file)?;
            info!(records = records.len(), "training records loaded");

            let config = ForestConfig {
                trees: *trees,
                seed: *seed,
                ..ForestConfig::default()
            };
            let (model, report) = train(&records, &config, *holdout)?;
            save_model(output, &ModelArtifact::new(model, config))?;

            println!(
                "trained_samples={} holdout_samples={} mae={} mse={} trees={} seed={} output={}",
                report.train_samples,
                report.holdout_samples,
                report
                    .mae
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_else(|| "n/a".to_string()),
                report
                    .mse
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_else(|| "n/a".to_string()),
                config.trees,
                config.seed,
                output.display()
            );
        }
        Commands::Predict { model, input } => {
            let artifact = load_model(model).context("load model artifact")?;
            info!(
                trees = artifact.model.tree_count(),
                trained_at = %artifact.trained_at,
                "model loaded"
            );

            let wellness_input = read_wellness_input(input)?;
            let service = PredictionService::new(artifact.model);
            let result = service.predict(&wellness_input)?;

            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
