//! Scalar summary statistics over host buffers.
//!
//! These are the reductions behind the training diagnostics:
//!
//! - **mean / std**: population moments of a parameter tensor
//! - **fraction_equal**: share of positions where two binary buffers agree
//!
//! ## Example
//!
//! ```
//! use brbm_core::stats::{fraction_equal, mean_std};
//!
//! let (mean, std) = mean_std(&[1.0, 3.0]);
//! assert_eq!(mean, 2.0);
//! assert_eq!(std, 1.0);
//!
//! assert_eq!(fraction_equal(&[1.0, 0.0, 1.0, 0.0], &[1.0, 1.0, 1.0, 0.0]), 0.75);
//! ```

/// Arithmetic mean, accumulated in `f64`.
///
/// Returns 0.0 for an empty slice.
pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

/// Population mean and standard deviation (divides by `n`, not `n - 1`).
///
/// # Example
///
/// ```
/// use brbm_core::stats::mean_std;
///
/// let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
/// assert_eq!(mean, 5.0);
/// assert_eq!(std, 2.0);
/// ```
pub fn mean_std(values: &[f32]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let m = mean(values);
    let var = values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - m;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    (m, var.sqrt())
}

/// Fraction of positions where `a` and `b` hold exactly the same value.
///
/// Only the overlapping prefix is compared. Returns 0.0 when either is empty.
pub fn fraction_equal(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let hits = a.iter().zip(b).filter(|(x, y)| x == y).count();
    hits as f64 / n as f64
}

/// Column means of a row-major `[rows, cols]` buffer.
pub fn column_means(data: &[f32], rows: usize, cols: usize) -> Vec<f64> {
    let mut sums = vec![0.0f64; cols];
    for row in data.chunks_exact(cols).take(rows) {
        for (s, &v) in sums.iter_mut().zip(row) {
            *s += f64::from(v);
        }
    }
    if rows > 0 {
        for s in &mut sums {
            *s /= rows as f64;
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
        assert_eq!(fraction_equal(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_constant_has_zero_std() {
        let (m, s) = mean_std(&[0.25; 16]);
        assert_relative_eq!(m, 0.25);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_column_means() {
        let data = [1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let means = column_means(&data, 4, 2);
        assert_relative_eq!(means[0], 0.75);
        assert_relative_eq!(means[1], 0.25);
    }
}
