//! Discrete Fourier frequency grids.
//!
//! Index order follows `numpy.fft.fftfreq`: for n = 8 the signed
//! indices are `[0, 1, 2, 3, -4, -3, -2, -1]`.

use ndarray::Array3;
use xtal_types::state::Shape3;

/// Signed frequency index of array position `i` on an axis of length `n`.
pub fn fftfreq_index(i: usize, n: usize) -> isize {
    if i < (n + 1) / 2 {
        i as isize
    } else {
        i as isize - n as isize
    }
}

/// Sample frequencies in cycles per voxel. Matches `numpy.fft.fftfreq(n)`.
pub fn fftfreq(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| fftfreq_index(i, n) as f64 / n as f64)
        .collect()
}

/// Per-axis frequency vectors for a 3D shape.
pub fn freq_axes(shape: Shape3) -> [Vec<f64>; 3] {
    [fftfreq(shape[0]), fftfreq(shape[1]), fftfreq(shape[2])]
}

/// Squared frequency magnitude |q|² at every voxel.
pub fn q_squared(shape: Shape3) -> Array3<f64> {
    let [qi, qj, qk] = freq_axes(shape);
    Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(i, j, k)| {
        qi[i] * qi[i] + qj[j] * qj[j] + qk[k] * qk[k]
    })
}

/// Position of the entry closest to `value`; the first one wins a tie.
pub fn nearest_index(axis: &[f64], value: f64) -> usize {
    let mut best_idx = 0usize;
    let mut best_dist = f64::INFINITY;
    for (idx, &x) in axis.iter().enumerate() {
        let d = (x - value).abs();
        if d < best_dist {
            best_dist = d;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fftfreq_even() {
        let f = fftfreq(8);
        let expected = [0.0, 0.125, 0.25, 0.375, -0.5, -0.375, -0.25, -0.125];
        assert_eq!(f.len(), 8);
        for (a, b) in f.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn test_fftfreq_odd() {
        let idx: Vec<isize> = (0..5).map(|i| fftfreq_index(i, 5)).collect();
        assert_eq!(idx, vec![0, 1, 2, -2, -1]);
    }

    #[test]
    fn test_fftfreq_single() {
        assert_eq!(fftfreq(1), vec![0.0]);
    }

    #[test]
    fn test_q_squared_origin_zero() {
        let q2 = q_squared([4, 6, 5]);
        assert_eq!(q2[[0, 0, 0]], 0.0);
        // Nyquist along axis 0 of length 4 is -0.5
        assert!((q2[[2, 0, 0]] - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_nearest_index_tie_goes_first() {
        let axis = fftfreq(4); // [0, 0.25, -0.5, -0.25]
        assert_eq!(nearest_index(&axis, 0.125), 0);
        assert_eq!(nearest_index(&axis, -0.125), 0);
        assert_eq!(nearest_index(&axis, -0.375), 2);
        assert_eq!(nearest_index(&axis, 0.3), 1);
    }
}
