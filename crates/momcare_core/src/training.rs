use std::io;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{build_features, FeatureError, FeatureVector, WellnessInput};
use crate::forest::{ForestConfig, WellnessModel};

pub const COL_SLEEP_DURATION: &str = "Sleep Duration (hrs)";
pub const COL_SLEEP_QUALITY: &str = "Sleep Quality (1-5)";
pub const COL_EXERCISE_DURATION: &str = "Exercise Duration (mins)";
pub const COL_EXERCISE_TYPE: &str = "Exercise Type";
pub const COL_WATER_INTAKE: &str = "Water Intake (glasses)";
pub const COL_PAIN_LEVEL: &str = "Pain Level (0-10)";
pub const COL_STRESS_LEVEL: &str = "Stress Level (1-10)";
pub const COL_MOOD: &str = "Mood / Emotional State";
pub const COL_ENERGY_MORNING: &str = "Energy Morning (0-10)";
pub const COL_ENERGY_AFTERNOON: &str = "Energy Afternoon (0-10)";
pub const COL_ENERGY_NIGHT: &str = "Energy Night (0-10)";

/// Label convention: a weighted blend of the three daily energy
/// readings, each on a 0-10 scale, so the target stays in [0, 10].
pub const MORNING_WEIGHT: f32 = 0.3;
pub const AFTERNOON_WEIGHT: f32 = 0.4;
pub const NIGHT_WEIGHT: f32 = 0.3;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training set is empty")]
    EmptySet,

    #[error("training source missing column {0:?}")]
    MissingColumn(String),

    #[error("training row {row}: {reason}")]
    Row { row: usize, reason: String },

    #[error("training row {row}: {source}")]
    Feature {
        row: usize,
        #[source]
        source: FeatureError,
    },

    #[error("holdout fraction {0} out of range (expected 0.0..1.0)")]
    HoldoutFraction(f32),

    #[error("read training source: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub input: WellnessInput,
    pub label: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub train_samples: usize,
    pub holdout_samples: usize,
    pub mae: Option<f32>,
    pub mse: Option<f32>,
}

struct Columns {
    sleep_duration: usize,
    sleep_quality: usize,
    exercise_duration: usize,
    exercise_type: usize,
    water_intake: usize,
    pain_level: usize,
    stress_level: usize,
    mood: usize,
    energy_morning: usize,
    energy_afternoon: usize,
    energy_night: usize,
}

fn col_index(headers: &csv::StringRecord, name: &str) -> Result<usize, TrainError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| TrainError::MissingColumn(name.to_string()))
}

fn field<'a>(record: &'a csv::StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("").trim()
}

fn parse_f32(record: &csv::StringRecord, index: usize, name: &str, row: usize) -> Result<f32, TrainError> {
    field(record, index).parse().map_err(|_| TrainError::Row {
        row,
        reason: format!("{name}: not a number: {:?}", field(record, index)),
    })
}

fn parse_u8(record: &csv::StringRecord, index: usize, name: &str, row: usize) -> Result<u8, TrainError> {
    field(record, index).parse().map_err(|_| TrainError::Row {
        row,
        reason: format!("{name}: not an integer: {:?}", field(record, index)),
    })
}

/// Read raw labeled wellness records from the historical tracking CSV.
/// Categorical columns stay raw strings here; the feature builder maps
/// and validates them so training and serving share one code path.
pub fn read_training_csv<R: io::Read>(reader: R) -> Result<Vec<TrainingRecord>, TrainError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let cols = Columns {
        sleep_duration: col_index(&headers, COL_SLEEP_DURATION)?,
        sleep_quality: col_index(&headers, COL_SLEEP_QUALITY)?,
        exercise_duration: col_index(&headers, COL_EXERCISE_DURATION)?,
        exercise_type: col_index(&headers, COL_EXERCISE_TYPE)?,
        water_intake: col_index(&headers, COL_WATER_INTAKE)?,
        pain_level: col_index(&headers, COL_PAIN_LEVEL)?,
        stress_level: col_index(&headers, COL_STRESS_LEVEL)?,
        mood: col_index(&headers, COL_MOOD)?,
        energy_morning: col_index(&headers, COL_ENERGY_MORNING)?,
        energy_afternoon: col_index(&headers, COL_ENERGY_AFTERNOON)?,
        energy_night: col_index(&headers, COL_ENERGY_NIGHT)?,
    };

    let mut records = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let row = i + 1;
        let record = record?;

        let input = WellnessInput {
            sleep_duration: parse_f32(&record, cols.sleep_duration, COL_SLEEP_DURATION, row)?,
            sleep_quality: parse_u8(&record, cols.sleep_quality, COL_SLEEP_QUALITY, row)?,
            exercise_duration: parse_f32(
                &record,
                cols.exercise_duration,
                COL_EXERCISE_DURATION,
                row,
            )?,
            exercise_type: field(&record, cols.exercise_type).to_string(),
            water_intake: parse_f32(&record, cols.water_intake, COL_WATER_INTAKE, row)?,
            pain_level: parse_u8(&record, cols.pain_level, COL_PAIN_LEVEL, row)?,
            stress_level: parse_u8(&record, cols.stress_level, COL_STRESS_LEVEL, row)?,
            mood: field(&record, cols.mood).to_string(),
        };

        let morning = parse_f32(&record, cols.energy_morning, COL_ENERGY_MORNING, row)?;
        let afternoon = parse_f32(&record, cols.energy_afternoon, COL_ENERGY_AFTERNOON, row)?;
        let night = parse_f32(&record, cols.energy_night, COL_ENERGY_NIGHT, row)?;
        let label =
            MORNING_WEIGHT * morning + AFTERNOON_WEIGHT * afternoon + NIGHT_WEIGHT * night;

        records.push(TrainingRecord { input, label });
    }

    Ok(records)
}

/// Offline fit: map every record through the feature builder, shuffle
/// with the config seed, hold out `holdout_fraction` of the samples for
/// the error report, and fit the forest on the rest. Deterministic for
/// a fixed seed and record set.
pub fn train(
    records: &[TrainingRecord],
    config: &ForestConfig,
    holdout_fraction: f32,
) -> Result<(WellnessModel, TrainReport), TrainError> {
    if records.is_empty() {
        return Err(TrainError::EmptySet);
    }
    if !(0.0..1.0).contains(&holdout_fraction) {
        return Err(TrainError::HoldoutFraction(holdout_fraction));
    }

    let mut samples: Vec<(FeatureVector, f32)> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let features = build_features(&record.input)
            .map_err(|source| TrainError::Feature { row: i + 1, source })?;
        samples.push((features, record.label));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    samples.shuffle(&mut rng);

    let holdout_count =
        ((samples.len() as f32 * holdout_fraction).round() as usize).min(samples.len() - 1);
    let (train_samples, holdout_samples) = samples.split_at(samples.len() - holdout_count);

    let model = WellnessModel::fit(train_samples, config)?;

    let report = if holdout_samples.is_empty() {
        TrainReport {
            train_samples: train_samples.len(),
            holdout_samples: 0,
            mae: None,
            mse: None,
        }
    } else {
        let mut abs_sum = 0.0f64;
        let mut sq_sum = 0.0f64;
        for (features, label) in holdout_samples {
            let err = f64::from(model.predict(features) - label);
            abs_sum += err.abs();
            sq_sum += err * err;
        }
        let n = holdout_samples.len() as f64;
        TrainReport {
            train_samples: train_samples.len(),
            holdout_samples: holdout_samples.len(),
            mae: Some((abs_sum / n) as f32),
            mse: Some((sq_sum / n) as f32),
        }
    };

    Ok((model, report))
}
