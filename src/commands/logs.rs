use crate::analysis::history::home_summary;
use crate::commands::db::{with_store, LogStore};
use crate::models::log_entry::{LogEntry, MAX_PAIN};
use crate::models::summary::HomeSummary;
use chrono::Utc;

#[cfg_attr(feature = "app", tauri::command)]
pub async fn add_log(
    data_dir: String,
    pain: u8,
    activity: String,
    exercises: String,
) -> Result<LogEntry, String> {
    if pain > MAX_PAIN {
        return Err(format!("Pain level must be between 0 and {MAX_PAIN}, got {pain}"));
    }

    let entry = LogEntry {
        id: uuid::Uuid::new_v4().to_string(),
        pain,
        activity,
        exercises,
        timestamp: Some(Utc::now()),
    };

    let saved = entry.clone();
    with_store(data_dir, move |store| store.append_log(&entry)).await?;
    log::info!("Log {} saved (pain {})", saved.id, saved.pain);

    Ok(saved)
}

#[cfg_attr(feature = "app", tauri::command)]
pub async fn get_log_history(data_dir: String) -> Result<Vec<LogEntry>, String> {
    with_store(data_dir, |store| store.fetch_all_logs()).await
}

#[cfg_attr(feature = "app", tauri::command)]
pub async fn get_home_summary(data_dir: String) -> Result<HomeSummary, String> {
    let logs = with_store(data_dir, |store| store.fetch_all_logs()).await?;
    Ok(home_summary(&logs, Utc::now().date_naive()))
}
