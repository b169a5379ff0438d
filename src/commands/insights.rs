use crate::analysis::recommendation::{self, RECENT_LOG_LIMIT};
use crate::analysis::risk;
use crate::commands::db::{with_store, ProfileStore, SqliteStore};
use crate::commands::settings::load_effective_settings;
use crate::models::insight::{RecommendationResult, RiskAssessmentResult, StrengthInputMode};
use crate::models::profile::ProfileSnapshot;
use chrono::Utc;

/// Never fails: any store problem comes back as the zero-confidence fallback.
#[cfg_attr(feature = "app", tauri::command)]
pub async fn generate_recommendation(data_dir: String) -> RecommendationResult {
    let task = tokio::task::spawn_blocking(move || {
        let limit = load_effective_settings(&data_dir)
            .map(|settings| settings.recent_log_limit)
            .unwrap_or_else(|e| {
                log::warn!("Using default log limit, settings unavailable: {e}");
                RECENT_LOG_LIMIT
            });

        match SqliteStore::open(&data_dir) {
            Ok(store) => recommendation::generate_recommendation(&store, limit, Utc::now()),
            Err(e) => {
                log::error!("Error opening log store: {e}");
                recommendation::fallback_result()
            }
        }
    });

    task.await.unwrap_or_else(|e| {
        log::error!("Recommendation task failed: {e}");
        recommendation::fallback_result()
    })
}

#[cfg_attr(feature = "app", tauri::command)]
pub fn assess_risk(metrics: ProfileSnapshot, mode: Option<StrengthInputMode>) -> RiskAssessmentResult {
    risk::assess_risk(&metrics, mode.unwrap_or_default(), Utc::now())
}

/// Score the stored profile using the configured strength input mode.
#[cfg_attr(feature = "app", tauri::command)]
pub async fn assess_saved_profile(data_dir: String) -> Result<Option<RiskAssessmentResult>, String> {
    let settings_dir = data_dir.clone();
    with_store(data_dir, move |store| {
        let settings = load_effective_settings(&settings_dir)?;
        let profile = store.read_profile(&settings.user_id)?;
        Ok(profile.map(|profile| risk::assess_risk(&profile, settings.strength_mode, Utc::now())))
    })
    .await
}
