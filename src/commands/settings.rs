use crate::analysis::recommendation::RECENT_LOG_LIMIT;
use crate::models::insight::StrengthInputMode;
use crate::models::profile::DEFAULT_USER_ID;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub recent_log_limit: usize,
    pub strength_mode: StrengthInputMode,
    pub user_id: String,
}

#[cfg_attr(feature = "app", tauri::command)]
pub async fn get_settings(data_dir: String) -> Result<Value, String> {
    on_blocking_pool(move || load_settings_from_disk(&data_dir)).await
}

#[cfg_attr(feature = "app", tauri::command)]
pub async fn save_settings(data_dir: String, settings: Value) -> Result<Value, String> {
    on_blocking_pool(move || save_settings_to_disk(&data_dir, settings)).await
}

async fn on_blocking_pool<T, F>(op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| format!("Settings task failed: {e}"))?
}

/// Blocking; call from the blocking pool.
pub fn load_effective_settings(data_dir: &str) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(data_dir)?;
    Ok(effective_settings(&settings))
}

fn effective_settings(settings: &Value) -> EffectiveSettings {
    let recent_log_limit = settings
        .get("recentLogLimit")
        .and_then(Value::as_u64)
        .unwrap_or(RECENT_LOG_LIMIT as u64)
        .clamp(1, 365) as usize;

    let strength_mode = settings
        .get("strengthInputMode")
        .cloned()
        .and_then(|raw| serde_json::from_value::<StrengthInputMode>(raw).ok())
        .unwrap_or_default();

    let user_id = settings
        .get("userId")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string();

    EffectiveSettings {
        recent_log_limit,
        strength_mode,
        user_id,
    }
}

/// Missing keys are filled and written back. A file that does not parse is
/// left untouched and defaults are used for this read.
pub fn load_settings_from_disk(data_dir: &str) -> Result<Value, String> {
    let path = settings_path(data_dir)?;

    let stored = match fs::read_to_string(&path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("settings.json is not valid JSON, using defaults: {e}");
                return Ok(default_settings());
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(format!("Failed to read settings.json: {e}")),
    };

    let migrated = migrate_settings(stored.clone().unwrap_or_else(|| json!({})));
    if stored.as_ref() != Some(&migrated) {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

/// Top-level keys in `incoming` replace stored ones; the rest are kept.
pub fn save_settings_to_disk(data_dir: &str, incoming: Value) -> Result<Value, String> {
    let path = settings_path(data_dir)?;
    let Value::Object(changes) = incoming else {
        return Err("Settings must be a JSON object".to_string());
    };

    let mut current = load_settings_from_disk(data_dir)?;
    if let Some(obj) = current.as_object_mut() {
        obj.extend(changes);
    }

    let migrated = migrate_settings(current);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(data_dir: &str) -> Result<PathBuf, String> {
    fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory: {e}"))?;
    Ok(Path::new(data_dir).join(SETTINGS_FILE_NAME))
}

// Readers never see a half-written file: write beside it, then rename over.
fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    let staged = path.with_extension("json.tmp");
    fs::write(&staged, raw).map_err(|e| format!("Failed to write settings.json: {e}"))?;
    fs::rename(&staged, path).map_err(|e| format!("Failed to replace settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let mut settings = match input {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    if let Value::Object(defaults) = default_settings() {
        for (key, value) in defaults {
            settings.entry(key).or_insert(value);
        }
    }
    settings.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));

    let mut out = Value::Object(settings);
    sanitize_settings(&mut out);
    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "recentLogLimit": RECENT_LOG_LIMIT,
        "strengthInputMode": "legacy",
        "userId": DEFAULT_USER_ID
    })
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "recentLogLimit", 1, 365, RECENT_LOG_LIMIT as u64);
    sanitize_enum(obj, "strengthInputMode", &["legacy", "injuredLimb"], "legacy");

    let user_id = obj
        .get("userId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string();
    obj.insert("userId".to_string(), json!(user_id));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}
