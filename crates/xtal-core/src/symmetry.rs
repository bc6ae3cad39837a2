// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Symmetry Group
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Space-group operations acting on the solid unit.
//!
//! Fourier-space arrays are in unshifted `fftfreq` order, so a flip keeps
//! index 0 fixed and mirrors the rest:
//!
//! ```text
//! i         = [ 0,  1,  2,  3, -4, -3, -2, -1]
//! i flipped = [ 0, -1, -2, -3, -4,  3,  2,  1]
//! ```
//!
//! Translation ramps are computed once at construction and never change.

use ndarray::{Array3, Zip};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;
use xtal_math::fft::{fftn, ifftn};
use xtal_math::freq::{fftfreq_index, freq_axes, nearest_index};
use xtal_math::roll::{flip_nonzero, multiroll};
use xtal_types::config::{RunParams, SpaceGroupId};
use xtal_types::error::{XtalError, XtalResult};
use xtal_types::state::{check_shape, Field, Shape3};

/// One operation: axis flips followed by a real-space translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryOp {
    /// Axes reversed by the point part.
    pub flips: [bool; 3],
    /// Translation in voxels.
    pub translation: [f64; 3],
}

impl SymmetryOp {
    pub const IDENTITY: SymmetryOp = SymmetryOp {
        flips: [false; 3],
        translation: [0.0; 3],
    };

    pub fn is_identity(&self) -> bool {
        !self.has_flips() && !self.has_translation()
    }

    fn has_flips(&self) -> bool {
        self.flips.iter().any(|&f| f)
    }

    fn has_translation(&self) -> bool {
        self.translation.iter().any(|&t| t != 0.0)
    }

    /// Whole-voxel shift of the real-space mapping. Sub-voxel parts are dropped.
    pub fn pixel_shift(&self) -> [isize; 3] {
        [
            self.translation[0].floor() as isize,
            self.translation[1].floor() as isize,
            self.translation[2].floor() as isize,
        ]
    }
}

/// Operations of a space group for a unit cell with edges `unit_cell` (voxels).
pub fn space_group_operations(id: SpaceGroupId, unit_cell: [f64; 3]) -> Vec<SymmetryOp> {
    let [a, b, c] = unit_cell;
    match id {
        SpaceGroupId::P1 => vec![SymmetryOp::IDENTITY],
        SpaceGroupId::P212121 => vec![
            SymmetryOp::IDENTITY,
            // x = 1/2 + x, 1/2 - y, -z
            SymmetryOp {
                flips: [false, true, true],
                translation: [a / 2.0, b / 2.0, 0.0],
            },
            // x = -x, 1/2 + y, 1/2 - z
            SymmetryOp {
                flips: [true, false, true],
                translation: [0.0, b / 2.0, c / 2.0],
            },
            // x = 1/2 - x, -y, 1/2 + z
            SymmetryOp {
                flips: [true, true, false],
                translation: [a / 2.0, 0.0, c / 2.0],
            },
        ],
    }
}

/// Phase ramp `exp(-2πi q·T)` with `q` in cycles per voxel.
pub fn translation_ramp(shape: Shape3, translation: [f64; 3]) -> Field {
    let [qi, qj, qk] = freq_axes(shape);
    Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(i, j, k)| {
        let phase = qi[i] * translation[0] + qj[j] * translation[1] + qk[k] * translation[2];
        Complex64::from_polar(1.0, -2.0 * PI * phase)
    })
}

/// Reciprocal-lattice indicator: 1 at the detector voxel nearest each
/// lattice frequency `m / unit_cell`, 0 elsewhere.
///
/// Frequencies that fall between bins snap to the closest one; at an
/// exact half-bin tie the bin earlier in `fftfreq` order wins.
pub fn lattice(unit_cell: [f64; 3], shape: Shape3) -> Array3<f64> {
    let q = freq_axes(shape);
    let bins: Vec<Vec<usize>> = (0..3)
        .map(|axis| {
            let points = (unit_cell[axis].round() as usize).max(1);
            // Lattice spacing at or below the bin spacing reaches every bin.
            if points >= shape[axis] {
                return (0..shape[axis]).collect();
            }
            (0..points)
                .map(|m| {
                    let freq = fftfreq_index(m, points) as f64 / unit_cell[axis];
                    nearest_index(&q[axis], freq)
                })
                .collect()
        })
        .collect();

    let mut out = Array3::zeros((shape[0], shape[1], shape[2]));
    for &i in &bins[0] {
        for &j in &bins[1] {
            for &k in &bins[2] {
                out[[i, j, k]] = 1.0;
            }
        }
    }
    out
}

/// A space group bound to a unit cell and detector shape.
#[derive(Debug, Clone)]
pub struct SymmetryGroup {
    id: SpaceGroupId,
    unit_cell: [f64; 3],
    shape: Shape3,
    ops: Vec<SymmetryOp>,
    /// `None` for operations without translation.
    ramps: Vec<Option<Field>>,
}

impl SymmetryGroup {
    pub fn new(id: SpaceGroupId, unit_cell: [f64; 3], shape: Shape3) -> XtalResult<Self> {
        if shape.iter().any(|&n| n == 0) {
            return Err(XtalError::ConfigError(format!(
                "detector shape must be positive, got {shape:?}"
            )));
        }
        if unit_cell.iter().any(|&u| !u.is_finite() || u <= 0.0) {
            return Err(XtalError::ConfigError(format!(
                "unit cell must be finite and > 0, got {unit_cell:?}"
            )));
        }
        let ops = space_group_operations(id, unit_cell);
        let ramps = ops
            .par_iter()
            .map(|op| {
                op.has_translation()
                    .then(|| translation_ramp(shape, op.translation))
            })
            .collect();
        Ok(SymmetryGroup {
            id,
            unit_cell,
            shape,
            ops,
            ramps,
        })
    }

    pub fn from_params(params: &RunParams) -> XtalResult<Self> {
        params.validate()?;
        Self::new(params.space_group()?, params.unit_cell(), params.shape())
    }

    pub fn id(&self) -> SpaceGroupId {
        self.id
    }

    pub fn unit_cell(&self) -> [f64; 3] {
        self.unit_cell
    }

    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    pub fn operations(&self) -> &[SymmetryOp] {
        &self.ops
    }

    /// Number of symmetry-related copies.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Symmetry copies of a Fourier-space solid unit, each with its ramp applied.
    pub fn solid_syms_fourier(&self, solid: &Field) -> XtalResult<Vec<Field>> {
        check_shape("Fourier solid unit", solid, self.shape)?;
        Ok(self
            .ops
            .par_iter()
            .zip(self.ramps.par_iter())
            .map(|(op, ramp)| {
                let mut copy = if op.has_flips() {
                    flip_nonzero(solid, op.flips)
                } else {
                    solid.clone()
                };
                if let Some(ramp) = ramp {
                    Zip::from(&mut copy).and(ramp).for_each(|c, &r| *c *= r);
                }
                copy
            })
            .collect())
    }

    /// Real-space symmetry copies using whole-voxel circular shifts.
    ///
    /// Only exact for unit cells whose half-edges are whole voxels; use
    /// [`Self::solid_syms_fourier`] for sub-voxel translations.
    pub fn solid_syms_real(&self, solid: &Field) -> XtalResult<Vec<Field>> {
        check_shape("real-space solid unit", solid, self.shape)?;
        Ok(self
            .ops
            .par_iter()
            .map(|op| {
                let flipped = if op.has_flips() {
                    flip_nonzero(solid, op.flips)
                } else {
                    solid.clone()
                };
                if op.has_translation() {
                    multiroll(&flipped, op.pixel_shift())
                } else {
                    flipped
                }
            })
            .collect())
    }

    /// Inverse of [`Self::solid_syms_fourier`]: conjugate ramp, then undo the flip.
    pub fn unflip_modes_fourier(&self, modes: &[Field]) -> XtalResult<Vec<Field>> {
        if modes.len() != self.ops.len() {
            return Err(XtalError::ShapeMismatch {
                what: "symmetry-copy stack".to_string(),
                expected: vec![self.ops.len()],
                found: vec![modes.len()],
            });
        }
        for mode in modes {
            check_shape("symmetry copy", mode, self.shape)?;
        }
        Ok(modes
            .par_iter()
            .zip(self.ops.par_iter().zip(self.ramps.par_iter()))
            .map(|(mode, (op, ramp))| {
                let mut copy = mode.clone();
                if let Some(ramp) = ramp {
                    Zip::from(&mut copy)
                        .and(ramp)
                        .for_each(|c, &r| *c *= r.conj());
                }
                if op.has_flips() {
                    flip_nonzero(&copy, op.flips)
                } else {
                    copy
                }
            })
            .collect())
    }

    /// Real-space unit cell: the inverse transform of the summed Fourier copies.
    pub fn unit_cell_density(&self, solid: &Field) -> XtalResult<Field> {
        check_shape("real-space solid unit", solid, self.shape)?;
        let syms = self.solid_syms_fourier(&fftn(solid))?;
        let mut sum = Field::zeros((self.shape[0], self.shape[1], self.shape[2]));
        for sym in &syms {
            sum += sym;
        }
        Ok(ifftn(&sum))
    }

    /// Reciprocal-lattice indicator for this group's unit cell and shape.
    pub fn lattice(&self) -> Array3<f64> {
        lattice(self.unit_cell, self.shape)
    }
}
