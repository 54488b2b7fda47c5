use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FEATURE_LEN: usize = 8;

/// Feature order is fixed and shared between training and serving;
/// reordering it silently changes what the model's coefficients mean.
pub const FEATURE_NAMES: [&str; FEATURE_LEN] = [
    "sleep_duration",
    "sleep_quality",
    "exercise_duration",
    "exercise_type",
    "water_intake",
    "pain_level",
    "stress_level",
    "mood",
];

/// One day of raw wellness inputs, as submitted per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessInput {
    pub sleep_duration: f32,
    pub sleep_quality: u8,
    pub exercise_duration: f32,
    pub exercise_type: String,
    pub water_intake: f32,
    pub pain_level: u8,
    pub stress_level: u8,
    pub mood: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("unknown {field} category {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("{field} out of domain: {value} (expected {expected})")]
    OutOfDomain {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },
}

pub fn mood_code(mood: &str) -> Result<f32, FeatureError> {
    match mood {
        "Sad" => Ok(0.0),
        "Neutral" => Ok(1.0),
        "Happy" => Ok(2.0),
        "Irritated" => Ok(-1.0),
        other => Err(FeatureError::UnknownCategory {
            field: "mood",
            value: other.to_string(),
        }),
    }
}

pub fn exercise_code(exercise_type: &str) -> Result<f32, FeatureError> {
    match exercise_type {
        "None" => Ok(0.0),
        "Stretching" => Ok(1.0),
        "Walk" => Ok(2.0),
        other => Err(FeatureError::UnknownCategory {
            field: "exercise_type",
            value: other.to_string(),
        }),
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<f32, FeatureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FeatureError::OutOfDomain {
            field,
            value,
            expected: ">= 0",
        })
    }
}

fn check_range(
    field: &'static str,
    value: u8,
    min: u8,
    max: u8,
    expected: &'static str,
) -> Result<f32, FeatureError> {
    if (min..=max).contains(&value) {
        Ok(f32::from(value))
    } else {
        Err(FeatureError::OutOfDomain {
            field,
            value: f32::from(value),
            expected,
        })
    }
}

/// Map raw inputs into the fixed-order feature vector. Pure: the same
/// input always produces the same vector. Unknown categories and
/// out-of-range numerics fail closed instead of defaulting.
pub fn build_features(input: &WellnessInput) -> Result<FeatureVector, FeatureError> {
    Ok(FeatureVector([
        check_non_negative("sleep_duration", input.sleep_duration)?,
        check_range("sleep_quality", input.sleep_quality, 1, 5, "1..=5")?,
        check_non_negative("exercise_duration", input.exercise_duration)?,
        exercise_code(&input.exercise_type)?,
        check_non_negative("water_intake", input.water_intake)?,
        check_range("pain_level", input.pain_level, 0, 10, "0..=10")?,
        check_range("stress_level", input.stress_level, 1, 10, "1..=10")?,
        mood_code(&input.mood)?,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> WellnessInput {
        WellnessInput {
            sleep_duration: 7.5,
            sleep_quality: 4,
            exercise_duration: 30.0,
            exercise_type: "Walk".to_string(),
            water_intake: 8.0,
            pain_level: 2,
            stress_level: 3,
            mood: "Happy".to_string(),
        }
    }

    #[test]
    fn build_is_pure_and_ordered() {
        let input = valid_input();
        let a = build_features(&input).unwrap();
        let b = build_features(&input).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.0, [7.5, 4.0, 30.0, 2.0, 8.0, 2.0, 3.0, 2.0]);
    }

    #[test]
    fn categorical_maps_match_training_codes() {
        assert_eq!(mood_code("Sad").unwrap(), 0.0);
        assert_eq!(mood_code("Neutral").unwrap(), 1.0);
        assert_eq!(mood_code("Happy").unwrap(), 2.0);
        assert_eq!(mood_code("Irritated").unwrap(), -1.0);

        assert_eq!(exercise_code("None").unwrap(), 0.0);
        assert_eq!(exercise_code("Stretching").unwrap(), 1.0);
        assert_eq!(exercise_code("Walk").unwrap(), 2.0);
    }

    #[test]
    fn unknown_mood_fails_closed() {
        let mut input = valid_input();
        input.mood = "Unknown".to_string();

        let err = build_features(&input).unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnknownCategory {
                field: "mood",
                value: "Unknown".to_string(),
            }
        );
    }

    #[test]
    fn unknown_exercise_type_fails_closed() {
        let mut input = valid_input();
        input.exercise_type = "Swimming".to_string();

        let err = build_features(&input).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::UnknownCategory {
                field: "exercise_type",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_numerics_are_rejected() {
        let mut input = valid_input();
        input.sleep_quality = 0;
        assert!(matches!(
            build_features(&input).unwrap_err(),
            FeatureError::OutOfDomain {
                field: "sleep_quality",
                ..
            }
        ));

        let mut input = valid_input();
        input.pain_level = 11;
        assert!(matches!(
            build_features(&input).unwrap_err(),
            FeatureError::OutOfDomain {
                field: "pain_level",
                ..
            }
        ));

        let mut input = valid_input();
        input.sleep_duration = -1.0;
        assert!(matches!(
            build_features(&input).unwrap_err(),
            FeatureError::OutOfDomain {
                field: "sleep_duration",
                ..
            }
        ));

        let mut input = valid_input();
        input.water_intake = f32::NAN;
        assert!(matches!(
            build_features(&input).unwrap_err(),
            FeatureError::OutOfDomain {
                field: "water_intake",
                ..
            }
        ));
    }

    #[test]
    fn minimum_valid_input_maps_to_expected_codes() {
        let input = WellnessInput {
            sleep_duration: 0.0,
            sleep_quality: 1,
            exercise_duration: 0.0,
            exercise_type: "None".to_string(),
            water_intake: 0.0,
            pain_level: 0,
            stress_level: 1,
            mood: "Sad".to_string(),
        };
        let features = build_features(&input).unwrap();
        assert_eq!(features.0, [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }
}
