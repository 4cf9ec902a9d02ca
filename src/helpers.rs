pub(crate) fn dot(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(xs.len(), ys.len());
    xs.iter().zip(ys).map(|(x, y)| x * y).sum()
}

/// Index of the smallest element, first occurrence winning ties.
pub(crate) fn min_idx(vals: &[f64]) -> usize {
    assert!(!vals.is_empty());
    let mut best = 0;
    for (i, &v) in vals.iter().enumerate().skip(1) {
        if v < vals[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
pub(crate) fn assert_vec_approx_eq(actual: &[f64], reference: &[f64], tol: f64) {
    assert_eq!(actual.len(), reference.len());
    for (i, (&a, &r)) in actual.iter().zip(reference).enumerate() {
        assert!(
            f64::abs(a - r) <= tol,
            "vectors differ at element {}: {} vs {}",
            i,
            a,
            r
        );
    }
}
