//! Density-based clustering (DBSCAN) over cosine distance.
//!
//! Unlike textbook DBSCAN, membership here never depends on input order:
//! core points are grouped by connected components first, and border points
//! are attached afterwards to their nearest core neighbour.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cosine::{check_dim, distance};
use crate::{ClusteringParams, WorkstreamError};

/// How the neighbourhood radius is chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EpsilonStrategy {
    /// Epsilon equals `outlier_threshold`.
    #[default]
    Fixed,

    /// Epsilon is the given percentile (0.0 to 1.0) of every point's distance
    /// to its `min_pts`-th nearest neighbour, capped at `outlier_threshold`.
    KDistance { percentile: f32 },
}

/// Output of [`cluster_embeddings`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Input positions grouped per cluster, each list ascending.
    pub clusters: Vec<Vec<usize>>,

    /// Cluster index per input position; None for outliers.
    pub labels: Vec<Option<usize>>,

    /// Neighbourhood radius actually used.
    pub epsilon: f32,

    /// Number of inputs in no cluster.
    pub outlier_count: usize,
}

impl Clustering {
    /// Input positions that ended up in no cluster.
    pub fn outliers(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_none())
            .map(|(i, _)| i)
    }
}

/// Clusters `vectors` by density.
///
/// Every vector must have the same dimension. Clusters below
/// `params.min_cluster_size` are dissolved into outliers. Cluster indices
/// follow each cluster's lowest input position.
pub fn cluster_embeddings<V: AsRef<[f32]>>(
    vectors: &[V],
    params: &ClusteringParams,
    strategy: EpsilonStrategy,
) -> Result<Clustering, WorkstreamError> {
    params.validate()?;
    let vectors: Vec<&[f32]> = vectors.iter().map(|v| v.as_ref()).collect();
    if let Some(first) = vectors.first() {
        for v in &vectors[1..] {
            check_dim(first.len(), v)?;
        }
    }

    let n = vectors.len();
    let dist = DistanceMatrix::new(&vectors);
    let eps = epsilon(&dist, params, strategy)?;

    let neighbors: Vec<Vec<usize>> = (0..n).map(|i| range_query(&dist, i, eps)).collect();
    let core: Vec<bool> = neighbors.iter().map(|nb| nb.len() >= params.min_pts).collect();

    // Connected components over core points.
    const UNDEFINED: usize = usize::MAX;
    let mut component = vec![UNDEFINED; n];
    let mut components = 0usize;
    for i in 0..n {
        if !core[i] || component[i] != UNDEFINED {
            continue;
        }
        component[i] = components;
        let mut seed: Vec<usize> = vec![i];
        while let Some(q) = seed.pop() {
            for &r in &neighbors[q] {
                if core[r] && component[r] == UNDEFINED {
                    component[r] = components;
                    seed.push(r);
                }
            }
        }
        components += 1;
    }

    // Border points join their nearest core neighbour's component.
    for i in 0..n {
        if core[i] {
            continue;
        }
        if let Some(j) = nearest_core(&dist, &vectors, &neighbors[i], i, |j| core[j]) {
            component[i] = component[j];
        }
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); components];
    for (i, &c) in component.iter().enumerate() {
        if c != UNDEFINED {
            members[c].push(i);
        }
    }
    let found = members.len();
    let kept: Vec<bool> = members
        .iter()
        .map(|m| m.len() >= params.min_cluster_size)
        .collect();

    // A border point whose component is dissolved falls back to the nearest
    // core neighbour in a surviving one.
    for i in 0..n {
        let c = component[i];
        if core[i] || c == UNDEFINED || kept[c] {
            continue;
        }
        let fallback = nearest_core(&dist, &vectors, &neighbors[i], i, |j| {
            core[j] && kept[component[j]]
        });
        if let Some(j) = fallback {
            members[component[j]].push(i);
        }
    }

    // Components are discovered in order of their lowest core position, but a
    // border point may sit below it, so order by first member.
    let mut clusters: Vec<Vec<usize>> = members
        .into_iter()
        .zip(kept)
        .filter_map(|(mut m, keep)| {
            keep.then(|| {
                m.sort_unstable();
                m
            })
        })
        .collect();
    clusters.sort_by_key(|m| m[0]);

    let mut labels = vec![None; n];
    for (c, m) in clusters.iter().enumerate() {
        for &i in m {
            labels[i] = Some(c);
        }
    }
    let outlier_count = labels.iter().filter(|l| l.is_none()).count();

    debug!(
        points = n,
        epsilon = eps,
        found,
        kept = clusters.len(),
        outliers = outlier_count,
        "dbscan finished"
    );

    Ok(Clustering {
        clusters,
        labels,
        epsilon: eps,
        outlier_count,
    })
}

/// Resolves the neighbourhood radius for `strategy`.
fn epsilon(
    dist: &DistanceMatrix,
    params: &ClusteringParams,
    strategy: EpsilonStrategy,
) -> Result<f32, WorkstreamError> {
    let percentile = match strategy {
        EpsilonStrategy::Fixed => return Ok(params.outlier_threshold),
        EpsilonStrategy::KDistance { percentile } => percentile,
    };
    if !(0.0..=1.0).contains(&percentile) {
        return Err(WorkstreamError::InvalidParams(format!(
            "k-distance percentile must be within [0, 1], got {percentile}"
        )));
    }

    let n = dist.n;
    let k = params.min_pts;
    if n <= k {
        // Nobody has k neighbours; the cap is all we have.
        return Ok(params.outlier_threshold);
    }

    let mut k_distances: Vec<f32> = (0..n)
        .map(|i| {
            let mut row: Vec<f32> = (0..n).filter(|&j| j != i).map(|j| dist.get(i, j)).collect();
            row.sort_by(|a, b| a.total_cmp(b));
            row[k - 1]
        })
        .collect();
    k_distances.sort_by(|a, b| a.total_cmp(b));

    let idx = (percentile * (n - 1) as f32).round() as usize;
    Ok(k_distances[idx.min(n - 1)].min(params.outlier_threshold))
}

/// Picks the closest of `candidates` to `idx` among those `accept` allows.
/// Exact distance ties go to the smaller vector under [`compare_vectors`].
fn nearest_core(
    dist: &DistanceMatrix,
    vectors: &[&[f32]],
    candidates: &[usize],
    idx: usize,
    accept: impl Fn(usize) -> bool,
) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&j| accept(j))
        .min_by(|&a, &b| {
            dist.get(idx, a)
                .total_cmp(&dist.get(idx, b))
                .then_with(|| compare_vectors(vectors[a], vectors[b]))
        })
}

/// Returns every other position within `eps` of position `idx`.
fn range_query(dist: &DistanceMatrix, idx: usize, eps: f32) -> Vec<usize> {
    (0..dist.n)
        .filter(|&j| j != idx && dist.get(idx, j) <= eps)
        .collect()
}

/// Total order over vectors, used only to break exact distance ties.
fn compare_vectors(a: &[f32], b: &[f32]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Symmetric pairwise cosine distances, computed once per run.
struct DistanceMatrix {
    n: usize,
    data: Vec<f32>,
}

impl DistanceMatrix {
    fn new(vectors: &[&[f32]]) -> Self {
        let n = vectors.len();
        let mut data = vec![0.0f32; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(vectors[i], vectors[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Self { n, data }
    }

    fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_pts: usize, min_cluster_size: usize, outlier_threshold: f32) -> ClusteringParams {
        ClusteringParams {
            min_pts,
            min_cluster_size,
            outlier_threshold,
        }
    }

    fn two_groups() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.99, 0.1, 0.0],
            vec![0.98, 0.15, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.1, 0.99, 0.0],
            vec![0.15, 0.98, 0.0],
        ]
    }

    fn assert_conserved(c: &Clustering, n: usize) {
        let clustered: usize = c.clusters.iter().map(|m| m.len()).sum();
        assert_eq!(clustered + c.outlier_count, n, "every point accounted for once");
        assert_eq!(c.labels.len(), n);
    }

    #[test]
    fn basic_two_clusters() {
        let vectors = two_groups();
        let c = cluster_embeddings(&vectors, &params(2, 2, 0.3), EpsilonStrategy::Fixed).unwrap();

        assert_conserved(&c, 6);
        assert_eq!(c.clusters, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(c.outlier_count, 0);
        assert_eq!(c.epsilon, 0.3);
        assert_eq!(c.labels[0], Some(0));
        assert_eq!(c.labels[5], Some(1));
    }

    #[test]
    fn scaled_groups_along_one_direction_merge() {
        // Same direction, different magnitude: cosine distance is ~0, so these
        // form one group regardless of scale.
        let vectors = vec![
            vec![1.0, 1.0, 1.02],
            vec![1.01, 0.99, 1.0],
            vec![0.99, 1.0, 1.0],
            vec![10.0, 10.0, 10.1],
            vec![10.1, 9.9, 10.0],
            vec![9.9, 10.0, 10.0],
        ];
        let c = cluster_embeddings(&vectors, &params(2, 2, 0.65), EpsilonStrategy::Fixed).unwrap();
        assert_conserved(&c, 6);
        assert_eq!(c.clusters.len(), 1);
    }

    #[test]
    fn noise_single_point() {
        let vectors = vec![vec![1.0, 0.0, 0.0]];
        let c = cluster_embeddings(&vectors, &params(2, 1, 0.1), EpsilonStrategy::Fixed).unwrap();
        assert_eq!(c.labels, vec![None]);
        assert_eq!(c.outlier_count, 1);
        assert!(c.clusters.is_empty());
    }

    #[test]
    fn empty_input() {
        let vectors: Vec<Vec<f32>> = Vec::new();
        let c = cluster_embeddings(&vectors, &params(2, 2, 0.5), EpsilonStrategy::Fixed).unwrap();
        assert!(c.labels.is_empty());
        assert!(c.clusters.is_empty());
        assert_eq!(c.outlier_count, 0);
    }

    #[test]
    fn far_point_is_outlier() {
        let mut vectors = two_groups();
        vectors.push(vec![0.0, 0.0, 1.0]);
        let c = cluster_embeddings(&vectors, &params(2, 2, 0.3), EpsilonStrategy::Fixed).unwrap();
        assert_conserved(&c, 7);
        assert_eq!(c.labels[6], None);
        assert_eq!(c.outliers().collect::<Vec<_>>(), vec![6]);
    }

    #[test]
    fn small_clusters_are_demoted() {
        let vectors = two_groups();
        let c = cluster_embeddings(&vectors, &params(2, 4, 0.3), EpsilonStrategy::Fixed).unwrap();
        assert_conserved(&c, 6);
        assert!(c.clusters.is_empty());
        assert_eq!(c.outlier_count, 6);
    }

    #[test]
    fn border_point_joins_but_does_not_propagate() {
        // 0..4 are a tight core group. 4 is within reach of 3 only and has too
        // few neighbours to be core; 5 is within reach of 4 only.
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.9998, 0.02],
            vec![0.9992, 0.04],
            vec![0.9982, 0.06],
            vec![0.9568, 0.2907],
            vec![0.8628, 0.5055],
        ];
        let c = cluster_embeddings(&vectors, &params(3, 1, 0.03), EpsilonStrategy::Fixed).unwrap();
        assert_conserved(&c, 6);
        assert_eq!(c.clusters, vec![vec![0, 1, 2, 3, 4]]);
        assert_eq!(c.labels[4], Some(0), "border point joins");
        assert_eq!(c.labels[5], None, "membership does not propagate through a border point");
    }

    #[test]
    fn membership_is_order_independent() {
        let vectors = two_groups();
        let forward = cluster_embeddings(&vectors, &params(2, 2, 0.3), EpsilonStrategy::Fixed).unwrap();

        let reversed: Vec<Vec<f32>> = vectors.iter().rev().cloned().collect();
        let backward = cluster_embeddings(&reversed, &params(2, 2, 0.3), EpsilonStrategy::Fixed).unwrap();

        let n = vectors.len();
        for i in 0..n {
            for j in 0..n {
                let same_fwd = forward.labels[i].is_some() && forward.labels[i] == forward.labels[j];
                let (ri, rj) = (n - 1 - i, n - 1 - j);
                let same_bwd = backward.labels[ri].is_some() && backward.labels[ri] == backward.labels[rj];
                assert_eq!(same_fwd, same_bwd, "pair ({i}, {j}) differs by input order");
            }
        }
    }

    fn at_degrees(deg: f32) -> Vec<f32> {
        let r = deg.to_radians();
        vec![r.cos(), r.sin()]
    }

    #[test]
    fn border_point_falls_back_to_surviving_cluster() {
        // 0..=6 are seven cores; 7 sits between them and a four-core group
        // (8..=11) that is too small to keep. 7 is nearer the small group.
        let mut vectors: Vec<Vec<f32>> = (0..=6).map(|d| at_degrees(d as f32)).collect();
        vectors.push(at_degrees(15.5));
        vectors.extend([24.0, 26.0, 28.0, 30.0].map(at_degrees));
        let eps = 1.0 - 10f32.to_radians().cos();

        let c = cluster_embeddings(&vectors, &params(3, 6, eps), EpsilonStrategy::Fixed).unwrap();
        assert_conserved(&c, 12);
        assert_eq!(c.clusters, vec![vec![0, 1, 2, 3, 4, 5, 6, 7]]);
        assert_eq!(c.labels[7], Some(0));
        assert_eq!(c.outliers().collect::<Vec<_>>(), vec![8, 9, 10, 11]);
    }

    /// Groups of original positions sharing a cluster, sorted.
    fn partition(c: &Clustering, order: &[usize]) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = c
            .clusters
            .iter()
            .map(|m| {
                let mut g: Vec<usize> = m.iter().map(|&p| order[p]).collect();
                g.sort_unstable();
                g
            })
            .collect();
        groups.sort();
        groups
    }

    #[test]
    fn contested_border_point_is_order_independent() {
        // 0 is a border point exactly equidistant (9 degrees) from the nearest
        // cores of two separate groups mirrored across the x axis.
        let mut vectors = vec![at_degrees(0.0)];
        vectors.extend([9.0, 11.0, 13.0, 15.0].map(at_degrees));
        vectors.extend([-9.0, -11.0, -13.0, -15.0].map(at_degrees));
        let eps = 1.0 - 10f32.to_radians().cos();
        let p = params(3, 3, eps);

        let identity: Vec<usize> = (0..vectors.len()).collect();
        let c = cluster_embeddings(&vectors, &p, EpsilonStrategy::Fixed).unwrap();
        let expected = partition(&c, &identity);
        // The tie goes to the group with the smaller second component.
        assert_eq!(expected, vec![vec![0, 5, 6, 7, 8], vec![1, 2, 3, 4]]);

        let mut order = identity;
        let mut state = 42u64;
        for round in 0..200 {
            for i in (1..order.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                order.swap(i, ((state >> 33) as usize) % (i + 1));
            }
            let shuffled: Vec<Vec<f32>> = order.iter().map(|&i| vectors[i].clone()).collect();
            let c = cluster_embeddings(&shuffled, &p, EpsilonStrategy::Fixed).unwrap();
            assert_eq!(partition(&c, &order), expected, "round {round}, order {order:?}");
        }
    }

    #[test]
    fn zero_vectors_never_cluster() {
        let vectors = vec![vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0]];
        let c = cluster_embeddings(&vectors, &params(1, 1, 0.7), EpsilonStrategy::Fixed).unwrap();
        assert_eq!(c.outlier_count, 3);
    }

    #[test]
    fn dimension_mismatch_fails() {
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        let err = cluster_embeddings(&vectors, &params(1, 1, 0.5), EpsilonStrategy::Fixed).unwrap_err();
        assert_eq!(err, WorkstreamError::DimensionMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn k_distance_epsilon_is_capped() {
        let vectors = two_groups();
        let strategy = EpsilonStrategy::KDistance { percentile: 1.0 };

        // Largest 2nd-neighbour distance is ~0.0115, above the 0.001 cap.
        let c = cluster_embeddings(&vectors, &params(2, 2, 0.001), strategy).unwrap();
        assert_eq!(c.epsilon, 0.001);
        assert_eq!(c.outlier_count, 6);
    }

    #[test]
    fn k_distance_epsilon_tracks_density() {
        let vectors = two_groups();
        let strategy = EpsilonStrategy::KDistance { percentile: 0.5 };
        let c = cluster_embeddings(&vectors, &params(2, 2, 0.65), strategy).unwrap();

        assert!(c.epsilon < 0.05, "tight groups should give a small epsilon, got {}", c.epsilon);
        assert_conserved(&c, 6);
        assert_eq!(c.clusters, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn k_distance_with_too_few_points_uses_threshold() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let strategy = EpsilonStrategy::KDistance { percentile: 0.5 };
        let c = cluster_embeddings(&vectors, &params(3, 1, 0.4), strategy).unwrap();
        assert_eq!(c.epsilon, 0.4);
    }

    #[test]
    fn k_distance_rejects_bad_percentile() {
        let strategy = EpsilonStrategy::KDistance { percentile: 1.5 };
        let err = cluster_embeddings(&two_groups(), &params(2, 2, 0.3), strategy).unwrap_err();
        assert!(matches!(err, WorkstreamError::InvalidParams(_)));
    }

    #[test]
    fn strategy_serde() {
        let s: EpsilonStrategy =
            serde_json::from_str(r#"{"strategy":"k_distance","percentile":0.9}"#).unwrap();
        assert_eq!(s, EpsilonStrategy::KDistance { percentile: 0.9 });
        let s: EpsilonStrategy = serde_json::from_str(r#"{"strategy":"fixed"}"#).unwrap();
        assert_eq!(s, EpsilonStrategy::Fixed);
    }
}
