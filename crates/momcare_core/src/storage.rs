use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::FaqCorpus;
use crate::forest::{ForestConfig, WellnessModel};
use crate::model::FaqEntry;

/// Serialized form of a fitted model plus enough metadata to audit it.
/// JSON floats round-trip bit-exactly, so a loaded artifact predicts
/// identically to the in-process fit that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub config: ForestConfig,
    pub trained_at: DateTime<Utc>,
    pub model: WellnessModel,
}

impl ModelArtifact {
    pub fn new(model: WellnessModel, config: ForestConfig) -> Self {
        Self {
            feature_names: crate::features::FEATURE_NAMES
                .iter()
                .map(|n| n.to_string())
                .collect(),
            config,
            trained_at: Utc::now(),
            model,
        }
    }
}

/// A missing or corrupt artifact is fatal at startup: the caller must
/// not begin serving predictions without a model.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("open model artifact {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse model artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn save_model(path: &Path, artifact: &ModelArtifact) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, artifact).context("serialize model artifact")
}

pub fn load_model(path: &Path) -> Result<ModelArtifact, ModelLoadError> {
    let file = File::open(path).map_err(|source| ModelLoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ModelLoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn save_corpus_jsonl(path: &Path, corpus: &FaqCorpus) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for entry in corpus.entries() {
        let line = serde_json::to_string(entry).context("serialize faq entry")?;
        writer
            .write_all(line.as_bytes())
            .context("write entry line")?;
        writer.write_all(b"\n").context("write newline")?;
    }

    writer.flush().context("flush output")
}

pub fn load_corpus_jsonl(path: &Path) -> Result<FaqCorpus> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line.context("read jsonl line")?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: FaqEntry = serde_json::from_str(&line).context("parse faq entry json")?;
        entries.push(entry);
    }

    FaqCorpus::new(entries).context("corpus index")
}
