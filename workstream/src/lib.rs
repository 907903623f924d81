//! Achievement clustering and workstream assignment.
//!
//! Groups a user's embedded achievements into workstreams with density-based
//! clustering over cosine distance, then attaches later achievements to the
//! existing workstreams by nearest centroid.
//!
//! # Usage
//!
//! ```
//! use bragdoc_workstream::{ClusterOptions, EmbeddedItem, clustering_params, recluster};
//!
//! let items: Vec<EmbeddedItem> = (0..30)
//!     .map(|i| EmbeddedItem::new(format!("a{i}"), vec![1.0, (i % 3) as f32 * 0.01]))
//!     .collect();
//!
//! let params = clustering_params(items.len()).expect("enough achievements");
//! let regroup = recluster(&items, &params, &ClusterOptions::default()).unwrap();
//! assert_eq!(regroup.workstreams_created(), 1);
//! ```
//!
//! # Design
//!
//! Everything here is a pure function over values passed in. The work is
//! split into separate steps (parameter selection, clustering, workstream
//! building, breakdown) so a caller can report progress between them:
//!
//! - [`recluster`] replaces all workstreams from scratch and never reuses
//!   earlier identities.
//! - [`assign_to_workstreams`] only attaches unassigned achievements to
//!   existing centroids; it never creates workstreams or moves members.

mod achievement;
mod assign;
mod breakdown;
mod cosine;
mod dbscan;
mod error;
mod params;
mod progress;
mod recluster;
mod refresh;


pub use achievement::{
    Achievement, AchievementFilter, EmbeddedItem, WorkstreamSource, embedded_items,
    missing_embeddings, unassigned_items,
};
pub use assign::{
    AssignedAchievement, Assignment, TIE_TOLERANCE, UnassignedAchievement, WorkstreamCentroid,
    assign_to_workstreams,
};
pub use breakdown::{
    AchievementLine, AssignmentReport, RegroupReport, WorkstreamBreakdown, assignment_breakdown,
    regroup_breakdown,
};
pub use cosine::{centroid, cosine_distance, cosine_similarity};
pub use dbscan::{Clustering, EpsilonStrategy, cluster_embeddings};
pub use error::WorkstreamError;
pub use params::{ClusteringParams, Presets, clustering_params};
pub use progress::{Phase, ProgressEvent};
pub use recluster::{
    ClusterOptions, NewWorkstream, PALETTE, Regroup, build_workstreams, cluster_items, recluster,
};
pub use refresh::{CentroidRefresh, refresh_centroids};
