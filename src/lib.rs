pub mod analysis;
pub mod commands;
pub mod models;

#[cfg(feature = "app")]
use commands::{
    insights::{assess_risk, assess_saved_profile, generate_recommendation},
    logs::{add_log, get_home_summary, get_log_history},
    profile::{get_profile, save_profile},
    settings::{get_settings, save_settings},
};

/// Install the `env_logger` backend. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();

    tauri::Builder::default()
        .invoke_handler(tauri::generate_handler![
            add_log,
            get_log_history,
            get_home_summary,
            save_profile,
            get_profile,
            generate_recommendation,
            assess_risk,
            assess_saved_profile,
            get_settings,
            save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
