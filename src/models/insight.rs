use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStage {
    Early,  // up to 6 weeks
    Middle, // up to 12 weeks
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PainTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub recommendation: String,
    pub confidence: f64,
    pub factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_stage: Option<RecoveryStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_trend: Option<PainTrend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_frequency: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

/// Which readings feed the bodyweight-relative strength checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrengthInputMode {
    /// Flat `quadStrength` / `hamstringStrength` fields.
    #[default]
    Legacy,
    /// Injured-side readings from the profile form.
    InjuredLimb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub value: String,
    pub threshold: String,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Strength,
    Symmetry,
    Timing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecommendation {
    pub priority: RiskLevel,
    pub category: RecommendationCategory,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentResult {
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<CategoryRecommendation>,
}
