//! Incremental assignment: attach unassigned achievements to the nearest
//! existing workstream centroid.
//!
//! Centroids are read once; they are not updated as achievements are
//! attached. Call [`crate::refresh_centroids`] afterwards to fold the new
//! members in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::achievement::{Achievement, EmbeddedItem, WorkstreamSource};
use crate::cosine::{check_dim, distance};
use crate::WorkstreamError;

/// Centroids closer together than this count as equidistant.
pub const TIE_TOLERANCE: f32 = 1e-6;

/// An existing workstream as far as matching is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstreamCentroid {
    pub id: String,
    pub centroid: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedAchievement {
    pub achievement_id: String,
    pub distance: f32,
    pub source: WorkstreamSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedAchievement {
    pub achievement_id: String,

    /// Closest workstream even though it was too far away.
    pub nearest_workstream_id: String,
    pub distance: f32,
}

/// Result of an incremental assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Newly attached achievements keyed by workstream id.
    pub assigned: BTreeMap<String, Vec<AssignedAchievement>>,

    /// Candidates whose nearest centroid was beyond the threshold.
    pub unassigned: Vec<UnassignedAchievement>,
}

impl Assignment {
    pub fn assigned_count(&self) -> usize {
        self.assigned.values().map(Vec::len).sum()
    }

    /// Writes the new memberships onto `achievements` with source `ai`.
    /// Everything else is left untouched.
    pub fn apply(&self, achievements: &mut [Achievement]) {
        let target: BTreeMap<&str, &str> = self
            .assigned
            .iter()
            .flat_map(|(ws, list)| list.iter().map(move |a| (a.achievement_id.as_str(), ws.as_str())))
            .collect();

        for a in achievements.iter_mut() {
            if let Some(ws) = target.get(a.id.as_str()) {
                a.workstream_id = Some(ws.to_string());
                a.workstream_source = Some(WorkstreamSource::Ai);
            }
        }
    }
}

/// Assigns each candidate to its nearest workstream when the cosine distance
/// is at most `outlier_threshold`.
///
/// Equidistant centroids (within [`TIE_TOLERANCE`]) resolve to the smallest
/// workstream id. Refuses to run without any workstream.
pub fn assign_to_workstreams(
    candidates: &[EmbeddedItem],
    workstreams: &[WorkstreamCentroid],
    outlier_threshold: f32,
) -> Result<Assignment, WorkstreamError> {
    if !(0.0..=2.0).contains(&outlier_threshold) {
        return Err(WorkstreamError::InvalidParams(format!(
            "outlier_threshold must be within [0, 2], got {outlier_threshold}"
        )));
    }
    let first = workstreams.first().ok_or(WorkstreamError::NoExistingWorkstreams)?;
    let dim = first.centroid.len();
    for w in workstreams {
        check_dim(dim, &w.centroid)?;
    }
    for c in candidates {
        check_dim(dim, &c.vector)?;
    }

    let mut ordered: Vec<&WorkstreamCentroid> = workstreams.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut out = Assignment::default();
    for c in candidates {
        let distances: Vec<f32> = ordered.iter().map(|w| distance(&c.vector, &w.centroid)).collect();
        let min = distances.iter().copied().fold(f32::INFINITY, f32::min);
        let (best, d) = ordered
            .iter()
            .zip(&distances)
            .find(|(_, d)| **d <= min + TIE_TOLERANCE)
            .map(|(w, d)| (*w, *d))
            .unwrap_or((ordered[0], distances[0]));

        if d <= outlier_threshold {
            out.assigned
                .entry(best.id.clone())
                .or_default()
                .push(AssignedAchievement {
                    achievement_id: c.id.clone(),
                    distance: d,
                    source: WorkstreamSource::Ai,
                });
        } else {
            out.unassigned.push(UnassignedAchievement {
                achievement_id: c.id.clone(),
                nearest_workstream_id: best.id.clone(),
                distance: d,
            });
        }
    }

    debug!(
        candidates = candidates.len(),
        workstreams = workstreams.len(),
        assigned = out.assigned_count(),
        unassigned = out.unassigned.len(),
        "incremental assignment finished"
    );
    Ok(out)
}
