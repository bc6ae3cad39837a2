//! Phase retrieval for diffuse scattering from translationally disordered crystals.
//!
//! Symmetry and disorder: symmetry, disorder
//! Forward model and constraints: mappings, projection
//! Iteration and data preparation: phasing, simulate

pub mod disorder;
pub mod mappings;
pub mod phasing;
pub mod projection;
pub mod simulate;
pub mod symmetry;
