use crate::WorkstreamError;

/// Cosine similarity between two vectors.
///
/// Uses f64 intermediate precision. A zero-magnitude vector has no direction,
/// so its similarity to anything (another zero vector included) is -1.0,
/// which keeps [`cosine_distance`] at its maximum of 2.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, WorkstreamError> {
    check_dim(a.len(), b)?;
    Ok(similarity(a, b))
}

/// Cosine distance: `1 - cosine_similarity`.
///
/// Returns a value in `[0, 2]`: 0 for identical direction, 1 for orthogonal,
/// 2 for opposite direction. Zero vectors are maximally distant (2.0).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32, WorkstreamError> {
    check_dim(a.len(), b)?;
    Ok(distance(a, b))
}

/// Component-wise arithmetic mean of `vectors`.
///
/// The result is not normalized; it has the same dimension as the inputs.
pub fn centroid<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Vec<f32>, WorkstreamError> {
    let first = vectors.first().ok_or(WorkstreamError::EmptyCentroidInput)?;
    let dim = first.as_ref().len();

    let mut sum = vec![0.0f64; dim];
    for v in vectors {
        let v = v.as_ref();
        check_dim(dim, v)?;
        for (acc, &x) in sum.iter_mut().zip(v) {
            *acc += x as f64;
        }
    }

    let n = vectors.len() as f64;
    Ok(sum.into_iter().map(|x| (x / n) as f32).collect())
}

/// Returns `DimensionMismatch` unless `v` has exactly `expected` components.
pub(crate) fn check_dim(expected: usize, v: &[f32]) -> Result<(), WorkstreamError> {
    if v.len() != expected {
        return Err(WorkstreamError::DimensionMismatch {
            expected,
            got: v.len(),
        });
    }
    Ok(())
}

/// Unchecked distance for callers that validated dimensions up front.
pub(crate) fn distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - similarity(a, b)
}

fn similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot: f64 = 0.0;
    let mut na: f64 = 0.0;
    let mut nb: f64 = 0.0;
    for (&ai, &bi) in a.iter().zip(b) {
        let ai = ai as f64;
        let bi = bi as f64;
        dot += ai * bi;
        na += ai * ai;
        nb += bi * bi;
    }
    if na == 0.0 || nb == 0.0 {
        return -1.0;
    }
    // Clamp to [-1, 1] to absorb floating point error.
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0) as f32
}
