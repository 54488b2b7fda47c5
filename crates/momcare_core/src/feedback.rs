use serde::{Deserialize, Serialize};

pub const REST_MESSAGE: &str = "Prioritize rest and hydration. Try light stretching.";
pub const OKAY_MESSAGE: &str = "Doing okay! Aim for 7+ hrs of sleep.";
pub const GREAT_MESSAGE: &str = "Great job! Keep up the good habits.";

/// Score bands for the feedback text. Cutoffs are configuration, not
/// baked into the banding logic; defaults match the served model's
/// calibration. Bands are closed-open: a score equal to a cutoff falls
/// into the band above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackBands {
    pub rest_below: f32,
    pub okay_below: f32,
}

impl Default for FeedbackBands {
    fn default() -> Self {
        Self {
            rest_below: 4.0,
            okay_below: 7.0,
        }
    }
}

impl FeedbackBands {
    pub fn message_for(&self, score: f32) -> &'static str {
        if score < self.rest_below {
            REST_MESSAGE
        } else if score < self.okay_below {
            OKAY_MESSAGE
        } else {
            GREAT_MESSAGE
        }
    }
}

pub fn message_for(score: f32) -> &'static str {
    FeedbackBands::default().message_for(score)
}
