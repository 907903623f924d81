use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete steps a caller can narrate while driving a regroup or an
/// incremental assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    GeneratingEmbeddings,
    Clustering,
    WorkstreamsCreated,
    AchievementsAssigned,
    Refreshing,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::GeneratingEmbeddings => "generating_embeddings",
            Phase::Clustering => "clustering",
            Phase::WorkstreamsCreated => "workstreams_created",
            Phase::AchievementsAssigned => "achievements_assigned",
            Phase::Refreshing => "refreshing",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress update, serialized as a single JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            count: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}
