// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Projections
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fourier modulus and real-space support constraints.

use crate::mappings::Mappings;
use ndarray::{Array3, Zip};
use num_complex::Complex64;
use xtal_types::error::{XtalError, XtalResult};
use xtal_types::state::{check_shape, shape_of, Field, Intensity, Mask};

/// Rescale the primary symmetry copy towards the measured amplitudes.
#[derive(Debug)]
pub struct ModulusProjection<'a> {
    mappings: &'a Mappings,
    amplitude: Array3<f64>,
    good_pix: &'a Mask,
    any_good: bool,
    alpha: f64,
}

impl<'a> ModulusProjection<'a> {
    pub fn new(
        mappings: &'a Mappings,
        intensity: &Intensity,
        good_pix: &'a Mask,
        alpha: f64,
    ) -> XtalResult<Self> {
        let shape = mappings.shape();
        check_shape("measured intensity", intensity, shape)?;
        check_shape("good-pixel mask", good_pix, shape)?;
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(XtalError::ConfigError(format!(
                "alpha must be finite and > 0, got {alpha}"
            )));
        }
        if intensity.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return Err(XtalError::ConfigError(
                "measured intensity must be finite and non-negative".to_string(),
            ));
        }
        Ok(ModulusProjection {
            mappings,
            amplitude: intensity.mapv(f64::sqrt),
            good_pix,
            any_good: good_pix.iter().any(|&g| g),
            alpha,
        })
    }

    /// Measured amplitudes `sqrt(I)`.
    pub fn amplitude(&self) -> &Array3<f64> {
        &self.amplitude
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Apply the projection to a real-space field.
    ///
    /// Where the mask is set the primary copy is multiplied by
    /// `sqrt(I) / (sqrt(M) + α)`, `M` being the predicted intensity of all
    /// modes. An empty mask returns the input untouched.
    pub fn apply(&self, x: &Field) -> XtalResult<Field> {
        if !self.any_good {
            check_shape("modulus projection input", x, self.mappings.shape())?;
            return Ok(x.clone());
        }
        let syms = self.mappings.solid_syms(x)?;
        let predicted = self.mappings.predicted_intensity_from_syms(&syms)?;

        let alpha = self.alpha;
        let mut primary = syms
            .into_iter()
            .next()
            .ok_or_else(|| XtalError::ConfigError("space group has no operations".to_string()))?;
        Zip::from(&mut primary)
            .and(&predicted)
            .and(&self.amplitude)
            .and(self.good_pix)
            .for_each(|c, &m, &a, &good| {
                if good {
                    *c *= a / (m.sqrt() + alpha);
                }
            });

        self.mappings.fft().inverse_inplace(&mut primary)?;
        if !is_finite(&primary) {
            return Err(XtalError::NumericalInstability(
                "modulus projection produced a non-finite value".to_string(),
            ));
        }
        Ok(primary)
    }
}

/// Support, reality and positivity constraint.
#[derive(Debug, Clone, Copy)]
pub struct SupportProjection<'a> {
    support: &'a Mask,
}

impl<'a> SupportProjection<'a> {
    pub fn new(support: &'a Mask) -> Self {
        SupportProjection { support }
    }

    pub fn support(&self) -> &Mask {
        self.support
    }

    /// Zero outside the support, drop the imaginary part, clamp negatives.
    pub fn apply(&self, x: &Field) -> XtalResult<Field> {
        let mut out = x.clone();
        self.apply_inplace(&mut out)?;
        Ok(out)
    }

    pub fn apply_inplace(&self, x: &mut Field) -> XtalResult<()> {
        check_shape("support projection input", x, shape_of(self.support))?;
        Zip::from(x).and(self.support).for_each(|v, &inside| {
            let re = if inside && v.re > 0.0 { v.re } else { 0.0 };
            *v = Complex64::new(re, 0.0);
        });
        Ok(())
    }
}

/// True if no element has a NaN or infinite component.
pub fn is_finite(x: &Field) -> bool {
    x.iter().all(|v| v.re.is_finite() && v.im.is_finite())
}
