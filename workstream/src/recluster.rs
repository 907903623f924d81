//! Full regrouping: cluster every embedded achievement from scratch and
//! synthesize a fresh set of workstreams.
//!
//! Prior workstream identities are never reused. The result depends only on
//! the current data, not on earlier runs; use [`crate::assign_to_workstreams`]
//! to attach new achievements to existing workstreams instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::achievement::{Achievement, EmbeddedItem, WorkstreamSource};
use crate::cosine::centroid;
use crate::dbscan::{Clustering, EpsilonStrategy, cluster_embeddings};
use crate::{ClusteringParams, WorkstreamError};

/// Colours handed out round-robin to new workstreams.
pub const PALETTE: [&str; 8] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

/// Knobs for a full regroup that are not population dependent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub epsilon: EpsilonStrategy,

    /// New workstreams are named "{name_prefix} {n}" until someone renames them.
    pub name_prefix: String,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            epsilon: EpsilonStrategy::Fixed,
            name_prefix: "Workstream".into(),
        }
    }
}

/// A workstream synthesized from one surviving cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkstream {
    pub id: String,
    pub name: String,
    pub color: String,
    pub centroid: Vec<f32>,
    pub achievement_ids: Vec<String>,
}

/// Result of a full regroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regroup {
    /// Largest first.
    pub workstreams: Vec<NewWorkstream>,

    /// Ids of achievements left without a workstream.
    pub outliers: Vec<String>,

    /// Neighbourhood radius the clustering used.
    pub epsilon: f32,
}

impl Regroup {
    pub fn workstreams_created(&self) -> usize {
        self.workstreams.len()
    }

    pub fn achievements_assigned(&self) -> usize {
        self.workstreams.iter().map(|w| w.achievement_ids.len()).sum()
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }

    /// Writes the regroup back onto `achievements`: members get their new
    /// workstream (source `ai`), outliers are cleared. Achievements that were
    /// not part of the regrouped population are left alone.
    pub fn apply(&self, achievements: &mut [Achievement]) {
        let mut target: HashMap<&str, Option<&str>> = HashMap::new();
        for w in &self.workstreams {
            for id in &w.achievement_ids {
                target.insert(id, Some(w.id.as_str()));
            }
        }
        for id in &self.outliers {
            target.insert(id, None);
        }

        for a in achievements.iter_mut() {
            match target.get(a.id.as_str()) {
                Some(Some(ws)) => {
                    a.workstream_id = Some((*ws).to_string());
                    a.workstream_source = Some(WorkstreamSource::Ai);
                }
                Some(None) => {
                    a.workstream_id = None;
                    a.workstream_source = None;
                }
                None => {}
            }
        }
    }
}

/// Step one of a regroup: run density clustering over `items`.
pub fn cluster_items(
    items: &[EmbeddedItem],
    params: &ClusteringParams,
    opts: &ClusterOptions,
) -> Result<Clustering, WorkstreamError> {
    cluster_embeddings(items, params, opts.epsilon)
}

/// Step two of a regroup: turn surviving clusters into new workstreams.
///
/// `clustering` must come from [`cluster_items`] over the same `items`.
pub fn build_workstreams(
    items: &[EmbeddedItem],
    clustering: &Clustering,
    opts: &ClusterOptions,
) -> Result<Regroup, WorkstreamError> {
    if clustering.labels.len() != items.len() {
        return Err(WorkstreamError::InvalidParams(format!(
            "clustering covers {} items, got {}",
            clustering.labels.len(),
            items.len()
        )));
    }
    for (c, members) in clustering.clusters.iter().enumerate() {
        if members.is_empty() {
            return Err(WorkstreamError::InvalidParams(format!("cluster {c} has no members")));
        }
        if let Some(&i) = members.iter().find(|&&i| i >= items.len()) {
            return Err(WorkstreamError::InvalidParams(format!(
                "cluster {c} refers to item {i}, only {} given",
                items.len()
            )));
        }
    }

    let mut groups: Vec<Vec<&EmbeddedItem>> = clustering
        .clusters
        .iter()
        .map(|members| members.iter().map(|&i| &items[i]).collect())
        .collect();
    for g in &mut groups {
        g.sort_by(|a, b| a.id.cmp(&b.id));
    }
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].id.cmp(&b[0].id)));

    let mut workstreams = Vec::with_capacity(groups.len());
    for (n, members) in groups.iter().enumerate() {
        let vectors: Vec<&[f32]> = members.iter().map(|m| m.vector.as_slice()).collect();
        workstreams.push(NewWorkstream {
            id: Uuid::new_v4().to_string(),
            name: format!("{} {}", opts.name_prefix, n + 1),
            color: PALETTE[n % PALETTE.len()].to_string(),
            centroid: centroid(&vectors)?,
            achievement_ids: members.iter().map(|m| m.id.clone()).collect(),
        });
    }

    let mut outliers: Vec<String> = clustering.outliers().map(|i| items[i].id.clone()).collect();
    outliers.sort();

    debug!(
        workstreams = workstreams.len(),
        outliers = outliers.len(),
        "workstreams built"
    );

    Ok(Regroup {
        workstreams,
        outliers,
        epsilon: clustering.epsilon,
    })
}

/// Regroups `items` from scratch: [`cluster_items`] then [`build_workstreams`].
pub fn recluster(
    items: &[EmbeddedItem],
    params: &ClusteringParams,
    opts: &ClusterOptions,
) -> Result<Regroup, WorkstreamError> {
    let clustering = cluster_items(items, params, opts)?;
    build_workstreams(items, &clustering, opts)
}
