use serde::{Deserialize, Serialize};

/// Request body for POST /analyze.
///
/// Parsed leniently: a missing body, `null`, or an absent field all
/// deserialize to `None` and surface as the same validation failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "imageBase64", default)]
    pub image_base64: Option<String>,
}

/// Closed health verdict returned by the analysis model.
///
/// Serialized exactly as the prompt instructs the model to spell it; any
/// other string fails deserialization and is reported as a malformed
/// model response rather than passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    #[serde(rename = "Generally Healthy")]
    GenerallyHealthy,
    #[serde(rename = "Exercise Caution")]
    ExerciseCaution,
    #[serde(rename = "Potentially Harmful")]
    PotentiallyHarmful,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::GenerallyHealthy => "Generally Healthy",
            HealthStatus::ExerciseCaution => "Exercise Caution",
            HealthStatus::PotentiallyHarmful => "Potentially Harmful",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyIngredient {
    pub name: String,
    pub analysis: String,
}

/// Structured nutrition assessment, both the model's output contract and
/// the HTTP response body. `keyIngredients` is expected to hold 5-7
/// entries but the length is not enforced; `concerns` may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: HealthStatus,
    pub summary: String,
    #[serde(rename = "keyIngredients")]
    pub key_ingredients: Vec<KeyIngredient>,
    #[serde(default)]
    pub concerns: String,
    pub recommendation: String,
}
