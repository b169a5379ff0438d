use crate::models::log_entry::LogEntry;
use crate::models::summary::{HomeSummary, PainChart};
use chrono::{Datelike, NaiveDate};

/// Consecutive logged days ending today or yesterday.
pub fn logging_streak(logs: &[LogEntry], today: NaiveDate) -> usize {
    let mut days: Vec<NaiveDate> = logs
        .iter()
        .filter_map(|log| log.timestamp)
        .map(|at| at.date_naive())
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut cursor = today;
    let mut streak = 0;

    for day in days {
        match (cursor - day).num_days() {
            0 => streak += 1,
            1 => {
                streak += 1;
                cursor = day;
            }
            _ => break,
        }
    }

    streak
}

/// Pain values oldest first with `M/D` labels. Entries without a readable
/// timestamp are left out of the chart.
///
/// `logs` is newest first; equal timestamps keep insertion order.
pub fn pain_chart(logs: &[LogEntry]) -> PainChart {
    let mut dated: Vec<_> = logs
        .iter()
        .rev()
        .filter_map(|log| log.timestamp.map(|at| (at, log.pain)))
        .collect();
    dated.sort_by_key(|(at, _)| *at);

    let mut chart = PainChart::default();
    for (at, pain) in dated {
        chart.labels.push(format!("{}/{}", at.month(), at.day()));
        chart.data.push(pain);
    }
    chart
}

/// `logs` must be newest first, as the log store returns them.
pub fn home_summary(logs: &[LogEntry], today: NaiveDate) -> HomeSummary {
    HomeSummary {
        latest_log: logs.first().cloned(),
        streak: logging_streak(logs, today),
        chart: pain_chart(logs),
    }
}
