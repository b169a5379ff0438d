use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_PAIN: u8 = 10;

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %H:%M:%S",
];

const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Timestamp as it may be found in the log collection.
///
/// Older entries were written as locale strings, newer ones as server
/// timestamps (`{seconds, nanoseconds}`, or `{_seconds, _nanoseconds}` from
/// admin tooling) or epoch milliseconds. Everything is normalized to a UTC
/// instant on the way in. Any other JSON value is kept as `Other` and reads as
/// no instant at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTimestamp {
    Seconds {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    EpochMillis(f64),
    Instant(DateTime<Utc>),
    Text(String),
    Other(serde_json::Value),
}

impl StoredTimestamp {
    /// `None` when the representation cannot be read as a point in time.
    pub fn normalize(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Seconds { seconds, nanoseconds } => DateTime::from_timestamp(*seconds, *nanoseconds),
            Self::EpochMillis(millis) => {
                if millis.is_finite() {
                    DateTime::from_timestamp_millis(*millis as i64)
                } else {
                    None
                }
            }
            Self::Instant(at) => Some(*at),
            Self::Text(raw) => parse_text_timestamp(raw),
            Self::Other(_) => None,
        }
    }
}

fn parse_text_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // Locale output from some runtimes uses a narrow no-break space before AM/PM.
    let cleaned = raw.trim().replace(['\u{202f}', '\u{a0}'], " ");

    if let Ok(at) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(at.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(naive.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Serde adapter: accepts any [`StoredTimestamp`] shape and keeps the normalized instant.
pub fn deserialize_lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StoredTimestamp>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(StoredTimestamp::normalize))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub pain: u8,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub exercises: String,
    #[serde(default, deserialize_with = "deserialize_lenient_instant")]
    pub timestamp: Option<DateTime<Utc>>, // None when the stored value was unreadable
}

impl LogEntry {
    pub fn from_stored(
        id: String,
        pain: u8,
        activity: String,
        exercises: String,
        stored: Option<&StoredTimestamp>,
    ) -> Self {
        Self {
            id,
            pain,
            activity,
            exercises,
            timestamp: stored.and_then(StoredTimestamp::normalize),
        }
    }

    pub fn has_exercises(&self) -> bool {
        !self.exercises.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn normalizes_server_timestamp_objects() {
        let stored: StoredTimestamp =
            serde_json::from_value(json!({ "seconds": 1_700_000_000, "nanoseconds": 0 })).unwrap();
        assert_eq!(
            stored.normalize(),
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn normalizes_numeric_epoch_millis() {
        let stored: StoredTimestamp = serde_json::from_value(json!(1_700_000_000_000_i64)).unwrap();
        assert_eq!(
            stored.normalize(),
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn normalizes_iso_and_locale_strings() {
        let iso: StoredTimestamp = serde_json::from_value(json!("2025-03-04T10:15:00.000Z")).unwrap();
        assert!(matches!(iso, StoredTimestamp::Instant(_)));
        assert_eq!(
            iso.normalize(),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 10, 15, 0).unwrap())
        );

        let locale = StoredTimestamp::Text("3/4/2025, 10:15:00 PM".to_string());
        assert_eq!(
            locale.normalize(),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 22, 15, 0).unwrap())
        );

        let narrow_space = StoredTimestamp::Text("3/4/2025, 9:05:00\u{202f}AM".to_string());
        assert_eq!(
            narrow_space.normalize(),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 9, 5, 0).unwrap())
        );

        let date_only = StoredTimestamp::Text("2025-03-04".to_string());
        assert_eq!(
            date_only.normalize(),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unreadable_values_normalize_to_none() {
        assert_eq!(StoredTimestamp::Text("yesterday-ish".to_string()).normalize(), None);
        assert_eq!(StoredTimestamp::EpochMillis(f64::NAN).normalize(), None);
    }

    #[test]
    fn log_entry_accepts_any_timestamp_shape() {
        let entry: LogEntry = serde_json::from_value(json!({
            "id": "a",
            "pain": 3,
            "activity": "walk",
            "timestamp": { "seconds": 60 }
        }))
        .unwrap();

        assert_eq!(entry.timestamp, Some(Utc.timestamp_opt(60, 0).unwrap()));
        assert_eq!(entry.exercises, "");
        assert!(!entry.has_exercises());
    }

    #[test]
    fn unrecognized_shapes_keep_the_entry_with_no_timestamp() {
        for raw in [json!(true), json!({ "seconds": 1.5e9 }), json!({ "when": "today" })] {
            let entry: LogEntry = serde_json::from_value(json!({
                "id": "odd",
                "pain": 4,
                "timestamp": raw
            }))
            .unwrap();
            assert_eq!(entry.id, "odd");
            assert_eq!(entry.timestamp, None);
        }

        let stored: StoredTimestamp = serde_json::from_value(json!(false)).unwrap();
        assert_eq!(stored, StoredTimestamp::Other(json!(false)));
    }

    #[test]
    fn reads_underscored_server_timestamps() {
        let entry: LogEntry = serde_json::from_value(json!({
            "id": "admin",
            "pain": 2,
            "timestamp": { "_seconds": 5, "_nanoseconds": 0 }
        }))
        .unwrap();
        assert_eq!(entry.timestamp, Some(Utc.timestamp_opt(5, 0).unwrap()));
    }
}
