//! Lattice disorder weighting.
//!
//! A Gaussian displacement of width σ between unit cells damps the Bragg
//! (lattice) channel by the Debye-Waller factor `exp(-4π²σ²|q|²)`; the
//! rest of the intensity goes to the diffuse per-copy channel.

use ndarray::Array3;
use std::f64::consts::PI;
use xtal_math::freq::q_squared;
use xtal_types::config::RunParams;
use xtal_types::error::{XtalError, XtalResult};
use xtal_types::state::Shape3;

/// Fraction of intensity in the lattice channel at each frequency, in [0, 1].
///
/// Equals 1 everywhere for σ = 0 and falls off faster with |q| as σ grows.
pub fn make_weighting(sigma: f64, shape: Shape3) -> Array3<f64> {
    let scale = 4.0 * PI * PI * sigma * sigma;
    q_squared(shape).mapv(|q2| (-scale * q2).exp())
}

#[derive(Debug, Clone)]
pub struct DisorderModel {
    n: f64,
    sigma: f64,
    weighting: Array3<f64>,
}

impl DisorderModel {
    pub fn new(n: f64, sigma: f64, shape: Shape3) -> XtalResult<Self> {
        if !n.is_finite() || n <= 0.0 {
            return Err(XtalError::ConfigError(format!(
                "disorder count N must be finite and > 0, got {n}"
            )));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(XtalError::ConfigError(format!(
                "disorder width sigma must be finite and >= 0, got {sigma}"
            )));
        }
        Ok(DisorderModel {
            n,
            sigma,
            weighting: make_weighting(sigma, shape),
        })
    }

    pub fn from_params(params: &RunParams) -> XtalResult<Self> {
        Self::new(params.disorder.n, params.disorder.sigma, params.shape())
    }

    /// Mean lattice-order count N.
    pub fn n(&self) -> f64 {
        self.n
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn weighting(&self) -> &Array3<f64> {
        &self.weighting
    }
}
