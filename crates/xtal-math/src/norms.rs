//! Normalized L2 distances used as phasing diagnostics.

use ndarray::{Array3, Zip};
use num_complex::Complex64;
use xtal_types::error::XtalResult;
use xtal_types::state::{check_shape, shape_of};

/// `sqrt(Σ|a − b|² / Σ|a|²)`, the distance of `b` from reference `a`.
///
/// A zero reference gives 0 when `b` is also zero and +∞ otherwise.
pub fn l2norm(a: &Array3<Complex64>, b: &Array3<Complex64>) -> XtalResult<f64> {
    check_shape("l2norm operand", b, shape_of(a))?;
    let mut num = 0.0;
    let mut den = 0.0;
    Zip::from(a).and(b).for_each(|&x, &y| {
        num += (x - y).norm_sqr();
        den += x.norm_sqr();
    });
    Ok(ratio(num, den))
}

/// Real-valued variant of [`l2norm`].
pub fn l2norm_real(a: &Array3<f64>, b: &Array3<f64>) -> XtalResult<f64> {
    check_shape("l2norm operand", b, shape_of(a))?;
    let mut num = 0.0;
    let mut den = 0.0;
    Zip::from(a).and(b).for_each(|&x, &y| {
        num += (x - y) * (x - y);
        den += x * x;
    });
    Ok(ratio(num, den))
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        (num / den).sqrt()
    } else if num == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}
