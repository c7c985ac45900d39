pub mod svm;
pub mod tfidf;

/// Sparse feature vector: `(feature index, value)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Expands `x` into a dense row of `dimension` features; indices past the end are dropped.
pub(crate) fn to_dense(x: &SparseVector, dimension: usize) -> Vec<f64> {
    let mut row = vec![0.0; dimension];
    for &(index, value) in x {
        if let Some(slot) = row.get_mut(index) {
            *slot = value;
        }
    }
    row
}
