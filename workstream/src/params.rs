use serde::{Deserialize, Serialize};

use crate::WorkstreamError;

/// Density and similarity knobs for one clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringParams {
    /// Minimum number of other points within epsilon for a core point.
    pub min_pts: usize,

    /// Clusters smaller than this are demoted to outliers.
    pub min_cluster_size: usize,

    /// Maximum cosine distance for a point to count as "close enough".
    /// Used as the fixed epsilon and as the incremental assignment cutoff.
    pub outlier_threshold: f32,
}

impl ClusteringParams {
    pub const RELAXED: ClusteringParams = ClusteringParams {
        min_pts: 3,
        min_cluster_size: 3,
        outlier_threshold: 0.70,
    };

    pub const STANDARD: ClusteringParams = ClusteringParams {
        min_pts: 3,
        min_cluster_size: 3,
        outlier_threshold: 0.65,
    };

    /// Rejects parameter sets the clustering cannot run with.
    pub fn validate(&self) -> Result<(), WorkstreamError> {
        if self.min_pts == 0 {
            return Err(WorkstreamError::InvalidParams("min_pts must be positive".into()));
        }
        if self.min_cluster_size == 0 {
            return Err(WorkstreamError::InvalidParams(
                "min_cluster_size must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.outlier_threshold) {
            return Err(WorkstreamError::InvalidParams(format!(
                "outlier_threshold must be within [0, 2], got {}",
                self.outlier_threshold
            )));
        }
        Ok(())
    }
}

/// Population-size bands mapping to parameter presets.
///
/// Below `minimum` clustering is refused. From `minimum` up to (excluding)
/// `standard_from` the `relaxed` preset applies, `standard` from there on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presets {
    pub minimum: usize,
    pub standard_from: usize,
    pub relaxed: ClusteringParams,
    pub standard: ClusteringParams,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            minimum: 20,
            standard_from: 100,
            relaxed: ClusteringParams::RELAXED,
            standard: ClusteringParams::STANDARD,
        }
    }
}

impl Presets {
    /// Returns the preset for `total` embedded achievements, or None when the
    /// population is too small for density estimates to mean anything.
    pub fn select(&self, total: usize) -> Option<ClusteringParams> {
        if total < self.minimum {
            None
        } else if total < self.standard_from {
            Some(self.relaxed)
        } else {
            Some(self.standard)
        }
    }

    /// Like [`Presets::select`] but reports the refusal as `InsufficientData`.
    pub fn require(&self, total: usize) -> Result<ClusteringParams, WorkstreamError> {
        self.select(total).ok_or(WorkstreamError::InsufficientData {
            count: total,
            minimum: self.minimum,
        })
    }

    pub fn validate(&self) -> Result<(), WorkstreamError> {
        if self.standard_from < self.minimum {
            return Err(WorkstreamError::InvalidParams(format!(
                "standard_from ({}) below minimum ({})",
                self.standard_from, self.minimum
            )));
        }
        self.relaxed.validate()?;
        self.standard.validate()
    }
}

/// Selects parameters for `total` embedded achievements using the default
/// presets. None below 20.
pub fn clustering_params(total: usize) -> Option<ClusteringParams> {
    Presets::default().select(total)
}
