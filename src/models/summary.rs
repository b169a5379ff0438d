use crate::models::log_entry::LogEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PainChart {
    pub labels: Vec<String>, // "M/D"
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub latest_log: Option<LogEntry>,
    pub streak: usize,
    pub chart: PainChart,
}
