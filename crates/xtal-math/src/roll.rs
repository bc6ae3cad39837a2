//! Index reversals and circular shifts on 3D arrays.

use ndarray::Array3;

/// Reverse every index except 0 along each flagged axis: `i → (n − i) mod n`.
///
/// In `fftfreq` index order this is the frequency-domain image of the
/// real-space coordinate flip `x → −x`. The map is its own inverse.
pub fn flip_nonzero<T: Clone>(input: &Array3<T>, axes: [bool; 3]) -> Array3<T> {
    let (n0, n1, n2) = input.dim();
    let rev = |i: usize, n: usize, flip: bool| if flip && i != 0 { n - i } else { i };
    Array3::from_shape_fn((n0, n1, n2), |(i, j, k)| {
        input[[rev(i, n0, axes[0]), rev(j, n1, axes[1]), rev(k, n2, axes[2])]].clone()
    })
}

/// Roll along all three axes at once. Matches
/// `np.roll(np.roll(np.roll(x, s0, 0), s1, 1), s2, 2)`.
pub fn multiroll<T: Clone>(input: &Array3<T>, shift: [isize; 3]) -> Array3<T> {
    let (n0, n1, n2) = input.dim();
    let src = |i: usize, n: usize, s: isize| (i as isize - s).rem_euclid(n as isize) as usize;
    Array3::from_shape_fn((n0, n1, n2), |(i, j, k)| {
        input[[src(i, n0, shift[0]), src(j, n1, shift[1]), src(k, n2, shift[2])]].clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_keeps_origin() {
        let a = Array3::from_shape_fn((8, 1, 1), |(i, _, _)| i);
        let f = flip_nonzero(&a, [true, false, false]);
        let got: Vec<usize> = f.iter().copied().collect();
        assert_eq!(got, vec![0, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_flip_unflagged_axes_untouched() {
        let a = Array3::from_shape_fn((3, 4, 5), |(i, j, k)| i * 100 + j * 10 + k);
        let f = flip_nonzero(&a, [false, true, false]);
        assert_eq!(f[[2, 1, 3]], a[[2, 3, 3]]);
        assert_eq!(f[[2, 0, 3]], a[[2, 0, 3]]);
    }

    #[test]
    fn test_multiroll_matches_np_roll() {
        // np.roll(np.arange(20).reshape(4,5), (1,3), axis=(0,1))
        let a = Array3::from_shape_fn((4, 5, 1), |(i, j, _)| i * 5 + j);
        let r = multiroll(&a, [1, 3, 0]);
        let expected = [
            [17, 18, 19, 15, 16],
            [2, 3, 4, 0, 1],
            [7, 8, 9, 5, 6],
            [12, 13, 14, 10, 11],
        ];
        for i in 0..4 {
            for j in 0..5 {
                assert_eq!(r[[i, j, 0]], expected[i][j], "mismatch at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_multiroll_negative_and_wrapping_shifts() {
        let a = Array3::from_shape_fn((5, 1, 1), |(i, _, _)| i);
        let back = multiroll(&a, [-2, 0, 0]);
        let wrap = multiroll(&a, [3, 0, 0]);
        assert_eq!(back, wrap);
        assert_eq!(back[[0, 0, 0]], 2);
    }
}
