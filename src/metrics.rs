//! Run metrics written to the JSON run log.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::curation::StageReport;
use crate::models::ScoredArticle;

/// Outcome of the Drive upload step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Skipped,
}

/// Everything worth knowing about one run, after the fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub fetched_count_by_source: BTreeMap<String, usize>,
    pub normalized_count: usize,
    pub deduped_count: usize,
    pub selected_count: usize,
    pub removed_by_url: usize,
    pub removed_by_title: usize,
    /// Most frequent first.
    pub top_topics: Vec<String>,
    pub average_score_overall: f64,
    pub upload_status: UploadStatus,
    pub uploaded_file_id: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub run_timestamp: DateTime<Utc>,
}

impl RunMetrics {
    pub fn new(run_timestamp: DateTime<Utc>) -> Self {
        Self {
            run_timestamp,
            ..Default::default()
        }
    }

    /// Fill stage counts and selection statistics from a pipeline run.
    pub fn record_curation(&mut self, report: &StageReport, selected: &[ScoredArticle]) {
        self.normalized_count = report.normalized_count;
        self.deduped_count = report.deduped_count;
        self.removed_by_url = report.removed_by_url;
        self.removed_by_title = report.removed_by_title;
        self.selected_count = selected.len();
        self.top_topics = top_topics(selected);
        self.average_score_overall = average_score(selected);
        self.warnings.extend(report.warnings.iter().cloned());
    }
}

/// Topics across `selected`, most frequent first; ties in name order.
pub fn top_topics(selected: &[ScoredArticle]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for article in selected {
        for topic in &article.key_topics {
            *counts.entry(topic.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(t, _)| t.to_string()).collect()
}

/// Mean overall score, or 0 for an empty selection.
pub fn average_score(selected: &[ScoredArticle]) -> f64 {
    if selected.is_empty() {
        return 0.0;
    }
    selected.iter().map(|a| a.score_overall).sum::<f64>() / selected.len() as f64
}

/// One structured event per pipeline stage.
pub fn log_stage_counts(stage: &str, count: usize) {
    info!(stage, count, "Pipeline stage count");
}
