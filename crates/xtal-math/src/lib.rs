//! Numerical primitives for XTAL Phasing.

pub mod fft;
pub mod freq;
pub mod norms;
pub mod roll;
