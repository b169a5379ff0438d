use crate::models::log_entry::deserialize_lenient_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ID: &str = "user1";

/// Body metrics and surgery date for one user. Saved wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(default, deserialize_with = "deserialize_lenient_instant")]
    pub surgery_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "weight")]
    pub bodyweight: Option<f64>,
    /// Flat strength readings read by the legacy scoring mode. The profile
    /// form never fills these in.
    #[serde(default)]
    pub quad_strength: Option<f64>,
    #[serde(default)]
    pub hamstring_strength: Option<f64>,
    #[serde(default)]
    pub injured_quad_strength: Option<f64>,
    #[serde(default)]
    pub non_injured_quad_strength: Option<f64>,
    #[serde(default)]
    pub injured_hamstring_strength: Option<f64>,
    #[serde(default)]
    pub non_injured_hamstring_strength: Option<f64>,
    /// Hand-entered quad LSI kept by older profile documents. Scoring
    /// recomputes LSI from the limb readings and ignores this value.
    #[serde(default, rename = "quadLSI", skip_serializing_if = "Option::is_none")]
    pub quad_lsi: Option<f64>,
}
