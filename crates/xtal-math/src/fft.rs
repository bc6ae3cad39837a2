//! 3D FFT wrappers around rustfft.
//!
//! Convention matches numpy:
//! - Forward FFT (fftn): unnormalized
//! - Inverse FFT (ifftn): normalized by 1/(n0*n1*n2)

use ndarray::{Array3, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;
use xtal_types::error::XtalResult;
use xtal_types::state::{check_shape, shape_of, Field, Shape3};

/// Forward and inverse 1D plans for each axis of a fixed 3D shape.
#[derive(Clone)]
pub struct Fft3 {
    shape: Shape3,
    forward: [Arc<dyn Fft<f64>>; 3],
    inverse: [Arc<dyn Fft<f64>>; 3],
}

impl fmt::Debug for Fft3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft3").field("shape", &self.shape).finish()
    }
}

impl Fft3 {
    pub fn new(shape: Shape3) -> Self {
        let mut planner = FftPlanner::new();
        let forward = [
            planner.plan_fft_forward(shape[0]),
            planner.plan_fft_forward(shape[1]),
            planner.plan_fft_forward(shape[2]),
        ];
        let inverse = [
            planner.plan_fft_inverse(shape[0]),
            planner.plan_fft_inverse(shape[1]),
            planner.plan_fft_inverse(shape[2]),
        ];
        Fft3 {
            shape,
            forward,
            inverse,
        }
    }

    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    /// In-place forward transform. Matches `numpy.fft.fftn()`.
    pub fn forward_inplace(&self, data: &mut Field) -> XtalResult<()> {
        check_shape("fft input", data, self.shape)?;
        for (axis, plan) in self.forward.iter().enumerate() {
            transform_axis(data, axis, plan.as_ref());
        }
        Ok(())
    }

    /// In-place inverse transform. Matches `numpy.fft.ifftn()`.
    pub fn inverse_inplace(&self, data: &mut Field) -> XtalResult<()> {
        check_shape("ifft input", data, self.shape)?;
        for (axis, plan) in self.inverse.iter().enumerate() {
            transform_axis(data, axis, plan.as_ref());
        }
        let norm = 1.0 / data.len() as f64;
        data.mapv_inplace(|c| c * norm);
        Ok(())
    }

    pub fn forward(&self, input: &Field) -> XtalResult<Field> {
        let mut data = input.clone();
        self.forward_inplace(&mut data)?;
        Ok(data)
    }

    pub fn inverse(&self, input: &Field) -> XtalResult<Field> {
        let mut data = input.clone();
        self.inverse_inplace(&mut data)?;
        Ok(data)
    }
}

/// Apply a 1D plan along every lane of `axis`.
fn transform_axis(data: &mut Field, axis: usize, plan: &dyn Fft<f64>) {
    let n = data.len_of(Axis(axis));
    let mut buffer = vec![Complex64::new(0.0, 0.0); n];
    let mut scratch = vec![Complex64::new(0.0, 0.0); plan.get_inplace_scratch_len()];

    for mut lane in data.lanes_mut(Axis(axis)) {
        for (b, v) in buffer.iter_mut().zip(lane.iter()) {
            *b = *v;
        }
        plan.process_with_scratch(&mut buffer, &mut scratch);
        for (v, b) in lane.iter_mut().zip(buffer.iter()) {
            *v = *b;
        }
    }
}

/// Forward 3D FFT of a complex field.
pub fn fftn(input: &Field) -> Field {
    let plans = Fft3::new(shape_of(input));
    let mut data = input.clone();
    for (axis, plan) in plans.forward.iter().enumerate() {
        transform_axis(&mut data, axis, plan.as_ref());
    }
    data
}

/// Inverse 3D FFT of a complex field, normalized.
pub fn ifftn(input: &Field) -> Field {
    let plans = Fft3::new(shape_of(input));
    let mut data = input.clone();
    for (axis, plan) in plans.inverse.iter().enumerate() {
        transform_axis(&mut data, axis, plan.as_ref());
    }
    let norm = 1.0 / data.len() as f64;
    data.mapv_inplace(|c| c * norm);
    data
}

/// Promote a real array to a complex field with zero imaginary part.
pub fn to_complex(input: &Array3<f64>) -> Field {
    input.mapv(|v| Complex64::new(v, 0.0))
}
