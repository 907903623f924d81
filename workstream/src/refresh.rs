use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::achievement::Achievement;
use crate::assign::WorkstreamCentroid;
use crate::cosine::centroid;
use crate::WorkstreamError;

/// Result of [`refresh_centroids`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentroidRefresh {
    /// Recomputed centroids, in the order the workstream ids were given.
    pub centroids: Vec<WorkstreamCentroid>,

    /// Workstreams without a single embedded member. Their stored centroid
    /// should be kept or cleared by the caller; none is invented here.
    pub empty: Vec<String>,
}

/// Recomputes each workstream's centroid from its current embedded members.
pub fn refresh_centroids(
    workstream_ids: &[String],
    achievements: &[Achievement],
) -> Result<CentroidRefresh, WorkstreamError> {
    let mut members: HashMap<&str, Vec<&[f32]>> = HashMap::new();
    for a in achievements {
        if let (Some(ws), Some(v)) = (&a.workstream_id, &a.embedding) {
            members.entry(ws.as_str()).or_default().push(v.as_slice());
        }
    }

    let mut out = CentroidRefresh::default();
    for id in workstream_ids {
        match members.get(id.as_str()) {
            Some(vectors) => out.centroids.push(WorkstreamCentroid {
                id: id.clone(),
                centroid: centroid(vectors)?,
            }),
            None => out.empty.push(id.clone()),
        }
    }

    debug!(
        refreshed = out.centroids.len(),
        empty = out.empty.len(),
        "centroids refreshed"
    );
    Ok(out)
}
