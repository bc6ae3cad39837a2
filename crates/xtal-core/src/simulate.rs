// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Simulation Helpers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Forward simulation of diffraction data and the masks phasing needs.

use crate::mappings::Mappings;
use ndarray::{s, Array3, Zip};
use num_complex::Complex64;
use xtal_math::fft::to_complex;
use xtal_types::error::{XtalError, XtalResult};
use xtal_types::state::{check_shape, shape_of, Field, Intensity, Mask, Shape3};

/// Place `solid` at the origin corner of a zero field of `shape`.
pub fn embed(solid: &Field, shape: Shape3) -> XtalResult<Field> {
    let found = shape_of(solid);
    if found.iter().zip(shape.iter()).any(|(f, s)| f > s) {
        return Err(XtalError::ShapeMismatch {
            what: "solid unit larger than detector".to_string(),
            expected: shape.to_vec(),
            found: found.to_vec(),
        });
    }
    let mut out = Field::zeros((shape[0], shape[1], shape[2]));
    out.slice_mut(s![..found[0], ..found[1], ..found[2]])
        .assign(solid);
    Ok(out)
}

/// [`embed`] for a real-valued density, as shape generators produce.
pub fn embed_real(density: &Array3<f64>, shape: Shape3) -> XtalResult<Field> {
    embed(&to_complex(density), shape)
}

/// Forward-simulate a solid unit no larger than the detector.
///
/// Returns the solid embedded in a detector-shape field together with its
/// predicted intensity.
pub fn diffraction(mappings: &Mappings, solid: &Field) -> XtalResult<(Field, Intensity)> {
    let expanded = embed(solid, mappings.shape())?;
    let intensity = mappings.predicted_intensity(&expanded)?;
    Ok((expanded, intensity))
}

/// Voxels whose real part exceeds `threshold`, grown by `dilation` voxels.
///
/// Dilation uses the periodic Chebyshev neighbourhood, so a support
/// touching a face wraps to the opposite one.
pub fn support_from_density(density: &Field, threshold: f64, dilation: usize) -> Mask {
    let seed = density.mapv(|v: Complex64| v.re > threshold);
    dilate(&seed, dilation)
}

/// Grow a mask by `radius` voxels in every direction, with wrap-around.
pub fn dilate(mask: &Mask, radius: usize) -> Mask {
    let mut out = mask.clone();
    for _ in 0..radius {
        let prev = out.clone();
        let (n0, n1, n2) = prev.dim();
        let wrap =
            |i: usize, d: isize, n: usize| (i as isize + d).rem_euclid(n as isize) as usize;
        Zip::indexed(&mut out).for_each(|(i, j, k), v| {
            if *v {
                return;
            }
            'search: for di in -1..=1 {
                for dj in -1..=1 {
                    for dk in -1..=1 {
                        if prev[[wrap(i, di, n0), wrap(j, dj, n1), wrap(k, dk, n2)]] {
                            *v = true;
                            break 'search;
                        }
                    }
                }
            }
        });
    }
    out
}

/// Pixels outside every bad-pixel mask.
pub fn good_pixels(shape: Shape3, bad: &[&Mask]) -> XtalResult<Mask> {
    let mut good = Mask::from_elem((shape[0], shape[1], shape[2]), true);
    for (i, mask) in bad.iter().enumerate() {
        check_shape(&format!("bad-pixel mask {i}"), *mask, shape)?;
        Zip::from(&mut good).and(*mask).for_each(|g, &b| *g &= !b);
    }
    Ok(good)
}
