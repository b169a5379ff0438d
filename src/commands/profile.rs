use crate::commands::db::{with_store, ProfileStore};
use crate::commands::settings::load_effective_settings;
use crate::models::profile::ProfileSnapshot;

#[cfg_attr(feature = "app", tauri::command)]
pub async fn save_profile(data_dir: String, profile: ProfileSnapshot) -> Result<ProfileSnapshot, String> {
    validate_profile(&profile)?;

    let saved = profile.clone();
    let settings_dir = data_dir.clone();
    with_store(data_dir, move |store| {
        let user_id = load_effective_settings(&settings_dir)?.user_id;
        store.write_profile(&user_id, &profile)
    })
    .await?;
    Ok(saved)
}

#[cfg_attr(feature = "app", tauri::command)]
pub async fn get_profile(data_dir: String) -> Result<Option<ProfileSnapshot>, String> {
    let settings_dir = data_dir.clone();
    with_store(data_dir, move |store| {
        let user_id = load_effective_settings(&settings_dir)?.user_id;
        store.read_profile(&user_id)
    })
    .await
}

pub fn validate_profile(profile: &ProfileSnapshot) -> Result<(), String> {
    if let Some(bodyweight) = profile.bodyweight {
        if !bodyweight.is_finite() || bodyweight <= 0.0 {
            return Err(format!("Bodyweight must be a positive number, got {bodyweight}"));
        }
    }

    let strengths = [
        ("quadStrength", profile.quad_strength),
        ("hamstringStrength", profile.hamstring_strength),
        ("injuredQuadStrength", profile.injured_quad_strength),
        ("nonInjuredQuadStrength", profile.non_injured_quad_strength),
        ("injuredHamstringStrength", profile.injured_hamstring_strength),
        ("nonInjuredHamstringStrength", profile.non_injured_hamstring_strength),
    ];

    for (name, value) in strengths {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be zero or greater, got {value}"));
            }
        }
    }

    Ok(())
}
