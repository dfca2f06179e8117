//! Numeric helpers for action-value vectors

use ndarray::ArrayView1;

/// Maximum entry of an action-value vector.
///
/// # Panics
/// Panics if `values` is empty. An empty action-value vector means the
/// estimator was configured with zero actions; that is a fatal
/// misconfiguration, not a recoverable error.
#[must_use]
pub fn max(values: &ArrayView1<f64>) -> f64 {
    assert!(
        !values.is_empty(),
        "max over empty action-value vector: estimator produced zero actions"
    );
    let mut best = values[0];
    for &v in values.iter() {
        if v > best {
            best = v;
        }
    }
    best
}

/// Index of the maximum entry of an action-value vector.
///
/// Ties break to the first (lowest-index) maximal entry; later equal
/// values never overwrite the stored best index.
///
/// # Panics
/// Panics if `values` is empty, as for [`max`].
#[must_use]
pub fn argmax(values: &ArrayView1<f64>) -> usize {
    assert!(
        !values.is_empty(),
        "argmax over empty action-value vector: estimator produced zero actions"
    );
    let mut best_idx = 0;
    let mut best = values[0];
    for (i, &v) in values.iter().enumerate() {
        if v > best {
            best_idx = i;
            best = v;
        }
    }
    best_idx
}
