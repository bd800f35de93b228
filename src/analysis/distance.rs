use crate::error::AnalysisError;

fn lookup(vectors: &[Vec<f64>], index: usize) -> Result<&[f64], AnalysisError> {
    vectors
        .get(index)
        .map(Vec::as_slice)
        .ok_or(AnalysisError::IndexRange {
            index,
            len: vectors.len(),
        })
}

/// L2 norm of `vectors[compare[k]] - vectors[reference[k]]` for every pair `k`.
pub fn euclidean_distance(
    reference: &[usize],
    compare: &[usize],
    vectors: &[Vec<f64>],
) -> Result<Vec<f64>, AnalysisError> {
    if reference.len() != compare.len() {
        return Err(AnalysisError::ShapeMismatch(format!(
            "{} reference indices but {} comparison indices",
            reference.len(),
            compare.len()
        )));
    }

    reference
        .iter()
        .zip(compare)
        .map(|(&r, &c)| {
            let a = lookup(vectors, r)?;
            let b = lookup(vectors, c)?;
            if a.len() != b.len() {
                return Err(AnalysisError::ShapeMismatch(format!(
                    "vector {r} has dimension {} but vector {c} has {}",
                    a.len(),
                    b.len()
                )));
            }
            Ok(b.iter()
                .zip(a)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt())
        })
        .collect()
}
