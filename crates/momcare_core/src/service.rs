use serde::{Deserialize, Serialize};

use crate::features::{build_features, FeatureError, WellnessInput};
use crate::feedback::FeedbackBands;
use crate::forest::WellnessModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub wellness_score: f32,
    pub message: String,
}

/// Builder → regressor → feedback, behind one request/response call.
/// Holds the model read-only; a shared reference can serve concurrent
/// requests without locking.
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: WellnessModel,
    bands: FeedbackBands,
}

impl PredictionService {
    pub fn new(model: WellnessModel) -> Self {
        Self {
            model,
            bands: FeedbackBands::default(),
        }
    }

    pub fn with_bands(model: WellnessModel, bands: FeedbackBands) -> Self {
        Self { model, bands }
    }

    /// Scores stay on the 0-10 training scale, rounded to one decimal.
    /// Invalid input surfaces as the builder's error, never as a
    /// defaulted score.
    pub fn predict(&self, input: &WellnessInput) -> Result<PredictionResult, FeatureError> {
        let features = build_features(input)?;
        let raw = self.model.predict(&features);
        let wellness_score = (raw * 10.0).round() / 10.0;

        Ok(PredictionResult {
            wellness_score,
            message: self.bands.message_for(wellness_score).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::feedback::REST_MESSAGE;
    use crate::forest::ForestConfig;

    fn minimum_input() -> WellnessInput {
        WellnessInput {
            sleep_duration: 0.0,
            sleep_quality: 1,
            exercise_duration: 0.0,
            exercise_type: "None".to_string(),
            water_intake: 0.0,
            pain_level: 0,
            stress_level: 1,
            mood: "Sad".to_string(),
        }
    }

    fn constant_model(label: f32) -> WellnessModel {
        let samples: Vec<(FeatureVector, f32)> = (0..20)
            .map(|i| {
                (
                    FeatureVector([i as f32 * 0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                    label,
                )
            })
            .collect();
        WellnessModel::fit(&samples, &ForestConfig::default()).unwrap()
    }

    #[test]
    fn low_score_gets_rest_message() {
        let service = PredictionService::new(constant_model(2.0));
        let result = service.predict(&minimum_input()).unwrap();

        assert_eq!(result.wellness_score, 2.0);
        assert_eq!(result.message, REST_MESSAGE);
    }

    #[test]
    fn unknown_mood_surfaces_feature_error() {
        let service = PredictionService::new(constant_model(5.0));
        let mut input = minimum_input();
        input.mood = "Unknown".to_string();

        let err = service.predict(&input).unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnknownCategory {
                field: "mood",
                value: "Unknown".to_string(),
            }
        );
    }

    #[test]
    fn score_is_rounded_to_one_decimal() {
        let service = PredictionService::new(constant_model(2.0));
        let result = service.predict(&minimum_input()).unwrap();
        let rescaled = result.wellness_score * 10.0;
        assert_eq!(rescaled, rescaled.round());
    }

    #[test]
    fn result_serializes_with_contract_field_names() {
        let result = PredictionResult {
            wellness_score: 6.4,
            message: "m".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("wellness_score").is_some());
        assert!(json.get("message").is_some());
    }
}
