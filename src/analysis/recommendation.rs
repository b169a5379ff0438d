use crate::commands::db::LogStore;
use crate::models::insight::{PainTrend, RecommendationResult, RecoveryStage};
use crate::models::log_entry::LogEntry;
use chrono::{DateTime, Utc};

/// How many of the newest logs feed a recommendation.
pub const RECENT_LOG_LIMIT: usize = 30;

const HIGH_PAIN: u8 = 7;
const MODERATE_PAIN: u8 = 4;

const EARLY_STAGE_MAX_WEEKS: f64 = 6.0;
const MIDDLE_STAGE_MAX_WEEKS: f64 = 12.0;

const TREND_WINDOW: usize = 5;
const TREND_THRESHOLD: f64 = 0.5;

const EXERCISE_WINDOW: usize = 7;
const LOW_EXERCISE_FREQUENCY: f64 = 0.5;

const DEFAULT_CONFIDENCE: f64 = 0.8;
const ESCALATED_CONFIDENCE: f64 = 0.9;

const MILLIS_PER_WEEK: f64 = 7.0 * 24.0 * 60.0 * 60.0 * 1000.0;

const HIGH_IMPACT_KEYWORDS: [&str; 2] = ["run", "jump"];

/// Fetch the newest `limit` logs and build a recommendation from them.
///
/// Store failures never reach the caller; they are logged and replaced by a
/// zero-confidence fallback.
pub fn generate_recommendation<S>(store: &S, limit: usize, now: DateTime<Utc>) -> RecommendationResult
where
    S: LogStore + ?Sized,
{
    match store.fetch_recent_logs(limit) {
        Ok(mut logs) => {
            logs.reverse();
            recommend(&logs, now)
        }
        Err(e) => {
            log::error!("Error generating recommendation: {e}");
            fallback_result()
        }
    }
}

/// Build a recommendation from logs in chronological order (oldest first).
pub fn recommend(logs: &[LogEntry], now: DateTime<Utc>) -> RecommendationResult {
    let (Some(first), Some(latest)) = (logs.first(), logs.last()) else {
        return no_data_result();
    };

    let stage = recovery_stage(first.timestamp, now);
    let pains: Vec<u8> = logs.iter().map(|log| log.pain).collect();
    let trend = pain_trend(&pains);
    let frequency = exercise_frequency(logs);

    let mut clauses: Vec<&str> = Vec::new();
    let mut factors: Vec<String> = Vec::new();
    let mut confidence = DEFAULT_CONFIDENCE;

    if latest.pain >= HIGH_PAIN {
        clauses.push("High pain detected. Rest and ice are crucial.");
        factors.push("High pain level".to_string());

        if trend == PainTrend::Increasing {
            clauses.push("Consider consulting your physical therapist as pain is trending upward.");
            factors.push("Increasing pain trend".to_string());
            confidence = ESCALATED_CONFIDENCE;
        }
    } else if latest.pain >= MODERATE_PAIN {
        clauses.push("Moderate pain level.");
        factors.push("Moderate pain level".to_string());

        if frequency < LOW_EXERCISE_FREQUENCY {
            clauses.push("Focus on gentle range of motion exercises and light strengthening.");
            factors.push("Low exercise frequency".to_string());
        } else {
            clauses.push("Maintain current exercise routine but reduce intensity.");
            factors.push("Regular exercise pattern".to_string());
        }
    } else {
        let (guidance, factor) = stage_guidance(stage);
        clauses.push("Low pain level.");
        factors.push("Low pain level".to_string());
        clauses.push(guidance);
        factors.push(factor.to_string());
    }

    if stage != RecoveryStage::Late && is_high_impact(&latest.activity) {
        clauses.push("Avoid high-impact activities until cleared by your physical therapist.");
        factors.push("High-impact activity detected".to_string());
    }

    RecommendationResult {
        recommendation: clauses.join(" "),
        confidence,
        factors,
        recovery_stage: Some(stage),
        pain_trend: Some(trend),
        exercise_frequency: Some(frequency),
    }
}

pub fn no_data_result() -> RecommendationResult {
    RecommendationResult {
        recommendation: "Start your recovery journey by logging your first entry.".to_string(),
        confidence: 1.0,
        factors: vec!["No previous data".to_string()],
        recovery_stage: None,
        pain_trend: None,
        exercise_frequency: None,
    }
}

pub fn fallback_result() -> RecommendationResult {
    RecommendationResult {
        recommendation: "Unable to generate recommendation at this time.".to_string(),
        confidence: 0.0,
        factors: vec!["Error in data processing".to_string()],
        recovery_stage: None,
        pain_trend: None,
        exercise_frequency: None,
    }
}

/// Stage from the first logged day. An unreadable first timestamp lands in
/// `Late` since it satisfies neither bracket.
pub fn recovery_stage(first_log_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> RecoveryStage {
    let weeks = first_log_at
        .map(|first| (now - first).num_milliseconds() as f64 / MILLIS_PER_WEEK)
        .unwrap_or(f64::NAN);
    stage_for_weeks(weeks)
}

pub fn stage_for_weeks(weeks_since_start: f64) -> RecoveryStage {
    if weeks_since_start <= EARLY_STAGE_MAX_WEEKS {
        RecoveryStage::Early
    } else if weeks_since_start <= MIDDLE_STAGE_MAX_WEEKS {
        RecoveryStage::Middle
    } else {
        RecoveryStage::Late
    }
}

/// Mean step between consecutive pain scores over the last five logs.
pub fn pain_trend(pains: &[u8]) -> PainTrend {
    if pains.len() < 2 {
        return PainTrend::Stable;
    }

    let window = &pains[pains.len().saturating_sub(TREND_WINDOW)..];
    let total: f64 = window
        .windows(2)
        .map(|pair| f64::from(pair[1]) - f64::from(pair[0]))
        .sum();
    let mean = total / (window.len() - 1) as f64;

    if mean > TREND_THRESHOLD {
        PainTrend::Increasing
    } else if mean < -TREND_THRESHOLD {
        PainTrend::Decreasing
    } else {
        PainTrend::Stable
    }
}

/// Exercise days among the last seven logs, as a fraction of a week.
pub fn exercise_frequency(logs: &[LogEntry]) -> f64 {
    let window = &logs[logs.len().saturating_sub(EXERCISE_WINDOW)..];
    let days_with_exercises = window.iter().filter(|log| log.has_exercises()).count();
    days_with_exercises as f64 / EXERCISE_WINDOW as f64
}

fn stage_guidance(stage: RecoveryStage) -> (&'static str, &'static str) {
    match stage {
        RecoveryStage::Early => (
            "Continue with basic strengthening and range of motion exercises.",
            "Early recovery stage",
        ),
        RecoveryStage::Middle => (
            "You can progress to more challenging exercises and light activities.",
            "Middle recovery stage",
        ),
        RecoveryStage::Late => (
            "Consider adding sport-specific exercises and controlled impact activities.",
            "Late recovery stage",
        ),
    }
}

fn is_high_impact(activity: &str) -> bool {
    let activity = activity.to_lowercase();
    HIGH_IMPACT_KEYWORDS.iter().any(|keyword| activity.contains(keyword))
}
