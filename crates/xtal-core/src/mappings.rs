// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Mappings
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Solid unit → symmetry copies → coherent modes → intensity.
//!
//! Two layers of mapping:
//!
//! ```text
//! solid_syms:  o        --> O(R1·q), O(R2·q), ...
//! modes:       O(Ri·q)  --> psi_1, psi_2, ..., psi_lattice
//! intensity:   I = |psi_1|² + |psi_2|² + ... + |psi_lattice|²
//! ```

use crate::disorder::DisorderModel;
use crate::symmetry::SymmetryGroup;
use ndarray::{Array3, Zip};
use num_complex::Complex64;
use xtal_math::fft::Fft3;
use xtal_types::config::{IntensityModel, RunParams};
use xtal_types::error::{XtalError, XtalResult};
use xtal_types::state::{check_shape, Field, Intensity, Shape3};

#[derive(Debug, Clone)]
pub struct Mappings {
    group: SymmetryGroup,
    disorder: DisorderModel,
    model: IntensityModel,
    lattice: Array3<f64>,
    fft: Fft3,
    /// sqrt(1 - w), applied to every symmetry copy.
    diffuse_scale: Array3<f64>,
    /// sqrt(N w) · lattice, applied to the summed copies.
    lattice_scale: Array3<f64>,
}

impl Mappings {
    pub fn new(params: &RunParams) -> XtalResult<Self> {
        params.validate()?;
        let group = SymmetryGroup::from_params(params)?;
        let disorder = DisorderModel::from_params(params)?;
        Self::from_parts(group, disorder, params.phasing.intensity_model)
    }

    pub fn from_parts(
        group: SymmetryGroup,
        disorder: DisorderModel,
        model: IntensityModel,
    ) -> XtalResult<Self> {
        let shape = group.shape();
        check_shape("disorder weighting", disorder.weighting(), shape)?;

        let lattice = group.lattice();
        let n = disorder.n();
        let diffuse_scale = disorder.weighting().mapv(|w| (1.0 - w).max(0.0).sqrt());
        let mut lattice_scale = disorder.weighting().mapv(|w| (n * w).sqrt());
        lattice_scale *= &lattice;

        Ok(Mappings {
            fft: Fft3::new(shape),
            group,
            disorder,
            model,
            lattice,
            diffuse_scale,
            lattice_scale,
        })
    }

    pub fn group(&self) -> &SymmetryGroup {
        &self.group
    }

    pub fn disorder(&self) -> &DisorderModel {
        &self.disorder
    }

    pub fn model(&self) -> IntensityModel {
        self.model
    }

    pub fn lattice(&self) -> &Array3<f64> {
        &self.lattice
    }

    pub fn fft(&self) -> &Fft3 {
        &self.fft
    }

    pub fn shape(&self) -> Shape3 {
        self.group.shape()
    }

    /// Fourier-space symmetry copies of a real-space solid unit.
    pub fn solid_syms(&self, solid: &Field) -> XtalResult<Vec<Field>> {
        let spectrum = self.fft.forward(solid)?;
        self.group.solid_syms_fourier(&spectrum)
    }

    /// Coherent modes whose squared magnitudes sum to the intensity.
    ///
    /// `Disordered`: `sqrt(1-w)·syms[i]` for each copy, then
    /// `sqrt(N·w)·lattice·Σ syms[i]` last. `CoherentSum`: the sum alone.
    pub fn coherent_modes(&self, syms: &[Field]) -> XtalResult<Vec<Field>> {
        self.check_syms(syms)?;
        let sum = self.sum_syms(syms);
        match self.model {
            IntensityModel::Disordered => {
                let mut modes: Vec<Field> = syms
                    .iter()
                    .map(|sym| {
                        let mut mode = sym.clone();
                        Zip::from(&mut mode)
                            .and(&self.diffuse_scale)
                            .for_each(|m, &d| *m *= d);
                        mode
                    })
                    .collect();
                let mut lattice_mode = sum;
                Zip::from(&mut lattice_mode)
                    .and(&self.lattice_scale)
                    .for_each(|m, &l| *m *= l);
                modes.push(lattice_mode);
                Ok(modes)
            }
            IntensityModel::CoherentSum => Ok(vec![sum]),
        }
    }

    /// Predicted intensity of a real-space solid unit.
    pub fn predicted_intensity(&self, solid: &Field) -> XtalResult<Intensity> {
        let syms = self.solid_syms(solid)?;
        self.predicted_intensity_from_syms(&syms)
    }

    /// Predicted intensity from precomputed Fourier-space symmetry copies.
    ///
    /// Same as summing `|mode|²` over [`Self::coherent_modes`] without
    /// materializing the modes.
    pub fn predicted_intensity_from_syms(&self, syms: &[Field]) -> XtalResult<Intensity> {
        self.check_syms(syms)?;
        let sum = self.sum_syms(syms);
        let shape = self.shape();
        let mut out = Intensity::zeros((shape[0], shape[1], shape[2]));
        match self.model {
            IntensityModel::Disordered => {
                for sym in syms {
                    Zip::from(&mut out)
                        .and(sym)
                        .and(&self.diffuse_scale)
                        .for_each(|o, &s, &d| *o += (s * d).norm_sqr());
                }
                Zip::from(&mut out)
                    .and(&sum)
                    .and(&self.lattice_scale)
                    .for_each(|o, &s, &l| *o += (s * l).norm_sqr());
            }
            IntensityModel::CoherentSum => {
                Zip::from(&mut out)
                    .and(&sum)
                    .for_each(|o, &s| *o = s.norm_sqr());
            }
        }
        Ok(out)
    }

    fn check_syms(&self, syms: &[Field]) -> XtalResult<()> {
        if syms.len() != self.group.len() {
            return Err(XtalError::ShapeMismatch {
                what: "symmetry-copy stack".to_string(),
                expected: vec![self.group.len()],
                found: vec![syms.len()],
            });
        }
        for sym in syms {
            check_shape("symmetry copy", sym, self.shape())?;
        }
        Ok(())
    }

    fn sum_syms(&self, syms: &[Field]) -> Field {
        let shape = self.shape();
        let mut sum = Field::zeros((shape[0], shape[1], shape[2]));
        for sym in syms {
            sum += sym;
        }
        sum
    }
}

/// Sum of squared magnitudes over a mode stack.
pub fn mode_intensity(modes: &[Field]) -> Option<Intensity> {
    let first = modes.first()?;
    let mut out = first.mapv(|m| m.norm_sqr());
    for mode in &modes[1..] {
        Zip::from(&mut out)
            .and(mode)
            .for_each(|o, m: &Complex64| *o += m.norm_sqr());
    }
    Some(out)
}
