// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::config::AlgorithmKind;
use crate::error::{XtalError, XtalResult};
use ndarray::Array3;
use num_complex::Complex64;

/// Complex 3D array: a real-space density or its discrete Fourier transform.
pub type Field = Array3<Complex64>;

/// Non-negative diffraction intensity, same shape as the detector.
pub type Intensity = Array3<f64>;

/// Boolean voxel mask (support or good-pixel).
pub type Mask = Array3<bool>;

/// Detector / field shape `[n0, n1, n2]`.
pub type Shape3 = [usize; 3];

/// Shape of any 3D array as a fixed-size triple.
pub fn shape_of<T>(array: &Array3<T>) -> Shape3 {
    let (n0, n1, n2) = array.dim();
    [n0, n1, n2]
}

/// Fail with `ShapeMismatch` unless `array` has exactly `expected` shape.
pub fn check_shape<T>(what: &str, array: &Array3<T>, expected: Shape3) -> XtalResult<()> {
    let found = shape_of(array);
    if found != expected {
        return Err(XtalError::ShapeMismatch {
            what: what.to_string(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

/// Summary of one completed schedule stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub algorithm: AlgorithmKind,
    pub iterations: usize,
    pub final_modulus_error: f64,
}

/// Result of a full phasing run.
#[derive(Debug, Clone)]
pub struct PhasingOutput {
    /// Recovered real-space solid unit.
    pub field: Field,
    /// Predicted diffraction intensity of `field`.
    pub intensity: Intensity,
    /// Normalized L2 distance between measured and predicted amplitudes, per iteration.
    pub modulus_error: Vec<f64>,
    /// Distance from the current estimate to its support projection, per iteration.
    pub support_error: Vec<f64>,
    /// Distance to the ground truth, per iteration. `None` without a known solid.
    pub fidelity_error: Option<Vec<f64>>,
    pub stages: Vec<StageSummary>,
}

impl PhasingOutput {
    /// Total number of iterations performed.
    pub fn iterations(&self) -> usize {
        self.modulus_error.len()
    }

    pub fn final_modulus_error(&self) -> Option<f64> {
        self.modulus_error.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_of() {
        let a: Array3<f64> = Array3::zeros((4, 5, 6));
        assert_eq!(shape_of(&a), [4, 5, 6]);
    }

    #[test]
    fn test_check_shape_accepts_match() {
        let a: Mask = Array3::from_elem((2, 3, 4), true);
        assert!(check_shape("mask", &a, [2, 3, 4]).is_ok());
    }

    #[test]
    fn test_check_shape_rejects_mismatch() {
        let a: Field = Array3::zeros((2, 3, 4));
        match check_shape("field", &a, [2, 3, 5]) {
            Err(XtalError::ShapeMismatch {
                what,
                expected,
                found,
            }) => {
                assert_eq!(what, "field");
                assert_eq!(expected, vec![2, 3, 5]);
                assert_eq!(found, vec![2, 3, 4]);
            }
            other => panic!("Expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_output_accessors() {
        let out = PhasingOutput {
            field: Array3::zeros((1, 1, 1)),
            intensity: Array3::zeros((1, 1, 1)),
            modulus_error: vec![0.5, 0.25],
            support_error: vec![0.0, 0.0],
            fidelity_error: None,
            stages: Vec::new(),
        };
        assert_eq!(out.iterations(), 2);
        assert_eq!(out.final_modulus_error(), Some(0.25));
    }
}
