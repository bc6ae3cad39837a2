// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Property-Based Tests (proptest) for xtal-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for xtal-math using proptest.
//!
//! Covers: 3D FFT inversion and Parseval, flip/roll algebra,
//! fftfreq layout, normalized L2 distance.

use ndarray::Array3;
use num_complex::Complex64;
use proptest::prelude::*;
use xtal_math::fft::{fftn, ifftn};
use xtal_math::freq::{fftfreq, fftfreq_index};
use xtal_math::norms::l2norm;
use xtal_math::roll::{flip_nonzero, multiroll};

fn field(shape: (usize, usize, usize), seed: u64) -> Array3<Complex64> {
    // Small deterministic pseudo-random pattern; proptest drives the seed.
    Array3::from_shape_fn(shape, |(i, j, k)| {
        let h = (i as u64 * 73_856_093) ^ (j as u64 * 19_349_663) ^ (k as u64 * 83_492_791) ^ seed;
        let re = ((h % 1000) as f64) / 1000.0 - 0.5;
        let im = (((h / 1000) % 1000) as f64) / 1000.0 - 0.5;
        Complex64::new(re, im)
    })
}

// ── FFT Properties ───────────────────────────────────────────────────

proptest! {
    /// ifftn(fftn(x)) == x.
    #[test]
    fn fft_inverts(n0 in 1usize..9, n1 in 1usize..9, n2 in 1usize..9, seed in any::<u64>()) {
        let x = field((n0, n1, n2), seed);
        let back = ifftn(&fftn(&x));
        for (a, b) in x.iter().zip(back.iter()) {
            prop_assert!((a - b).norm() < 1e-10, "{} vs {}", a, b);
        }
    }

    /// Parseval: Σ|X|² = N Σ|x|² for the unnormalized forward transform.
    #[test]
    fn fft_parseval(n0 in 1usize..9, n1 in 1usize..9, n2 in 1usize..9, seed in any::<u64>()) {
        let x = field((n0, n1, n2), seed);
        let spectrum = fftn(&x);
        let n = (n0 * n1 * n2) as f64;
        let e_real: f64 = x.iter().map(|v| v.norm_sqr()).sum();
        let e_fourier: f64 = spectrum.iter().map(|v| v.norm_sqr()).sum();
        prop_assert!((e_fourier - n * e_real).abs() < 1e-8 * (1.0 + e_fourier));
    }

    /// The frequency-domain flip commutes with the transform.
    #[test]
    fn flip_commutes_with_fft(
        n0 in 1usize..8, n1 in 1usize..8, n2 in 1usize..8,
        f0 in any::<bool>(), f1 in any::<bool>(), f2 in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let x = field((n0, n1, n2), seed);
        let a = fftn(&flip_nonzero(&x, [f0, f1, f2]));
        let b = flip_nonzero(&fftn(&x), [f0, f1, f2]);
        for (u, v) in a.iter().zip(b.iter()) {
            prop_assert!((u - v).norm() < 1e-9);
        }
    }
}

// ── Flip / Roll Algebra ──────────────────────────────────────────────

proptest! {
    /// Flipping twice is the identity.
    #[test]
    fn flip_is_involution(
        n0 in 1usize..10, n1 in 1usize..10, n2 in 1usize..10,
        f0 in any::<bool>(), f1 in any::<bool>(), f2 in any::<bool>(),
    ) {
        let a = Array3::from_shape_fn((n0, n1, n2), |(i, j, k)| i * 10_000 + j * 100 + k);
        let twice = flip_nonzero(&flip_nonzero(&a, [f0, f1, f2]), [f0, f1, f2]);
        prop_assert_eq!(twice, a);
    }

    /// Rolling by s then −s is the identity.
    #[test]
    fn roll_inverts(
        n0 in 1usize..10, n1 in 1usize..10, n2 in 1usize..10,
        s0 in -20isize..20, s1 in -20isize..20, s2 in -20isize..20,
    ) {
        let a = Array3::from_shape_fn((n0, n1, n2), |(i, j, k)| i * 10_000 + j * 100 + k);
        let back = multiroll(&multiroll(&a, [s0, s1, s2]), [-s0, -s1, -s2]);
        prop_assert_eq!(back, a);
    }
}

// ── Frequencies and Norms ────────────────────────────────────────────

proptest! {
    /// fftfreq covers each signed index exactly once and stays in [-0.5, 0.5).
    #[test]
    fn fftfreq_layout(n in 1usize..64) {
        let f = fftfreq(n);
        prop_assert_eq!(f.len(), n);
        prop_assert_eq!(f[0], 0.0);
        for &v in &f {
            prop_assert!((-0.5..0.5).contains(&v));
        }
        let mut idx: Vec<isize> = (0..n).map(|i| fftfreq_index(i, n)).collect();
        idx.sort_unstable();
        idx.dedup();
        prop_assert_eq!(idx.len(), n);
    }

    /// l2norm scales out a global factor on both operands.
    #[test]
    fn l2norm_scale_invariant(scale in 0.1f64..10.0, seed in any::<u64>()) {
        let a = field((3, 4, 2), seed);
        let b = field((3, 4, 2), seed.wrapping_add(1));
        let d1 = l2norm(&a, &b).unwrap();
        let d2 = l2norm(&a.mapv(|v| v * scale), &b.mapv(|v| v * scale)).unwrap();
        prop_assert!((d1 - d2).abs() < 1e-10 * (1.0 + d1));
    }
}
