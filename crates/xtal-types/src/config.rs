// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{XtalError, XtalResult};
use crate::state::Shape3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported crystallographic space groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceGroupId {
    P1,
    P212121,
}

impl FromStr for SpaceGroupId {
    type Err = XtalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "P1" => Ok(SpaceGroupId::P1),
            "P212121" => Ok(SpaceGroupId::P212121),
            other => Err(XtalError::UnknownSpaceGroup(other.to_string())),
        }
    }
}

impl fmt::Display for SpaceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceGroupId::P1 => write!(f, "P1"),
            SpaceGroupId::P212121 => write!(f, "P212121"),
        }
    }
}

/// How the symmetry copies combine into a predicted intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityModel {
    /// Diffuse per-copy modes plus one disorder-weighted lattice mode.
    #[default]
    Disordered,
    /// Single mode holding the coherent unit-cell sum.
    CoherentSum,
}

/// Iterative projection algorithm of one schedule stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    #[serde(rename = "ER")]
    ErrorReduction,
    #[serde(rename = "HIO")]
    HybridInputOutput,
    #[serde(rename = "DM")]
    DifferenceMap,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmKind::ErrorReduction => write!(f, "ER"),
            AlgorithmKind::HybridInputOutput => write!(f, "HIO"),
            AlgorithmKind::DifferenceMap => write!(f, "DM"),
        }
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParams {
    pub crystal: CrystalConfig,
    pub detector: DetectorConfig,
    pub disorder: DisorderConfig,
    #[serde(default)]
    pub phasing: PhasingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrystalConfig {
    /// Space group as written in the config, parsed by [`RunParams::space_group`].
    pub space_group: String,
    /// Unit-cell edge lengths in voxels.
    pub unit_cell: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub shape: Shape3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisorderConfig {
    /// Mean number of ordered unit cells.
    pub n: f64,
    /// Gaussian disorder width (voxels).
    pub sigma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasingConfig {
    /// Modulus projection regularization (default: 1e-10)
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// RNG seed for the initial field. Entropy-seeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub intensity_model: IntensityModel,
    /// Stages run in order (default: 500 HIO then 100 ER)
    #[serde(default = "default_schedule")]
    pub schedule: Vec<StageConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub algorithm: AlgorithmKind,
    pub iterations: usize,
    /// Feedback parameter, ignored by ER (default: 1.0)
    #[serde(default = "default_beta")]
    pub beta: f64,
}

impl StageConfig {
    pub fn new(algorithm: AlgorithmKind, iterations: usize) -> Self {
        StageConfig {
            algorithm,
            iterations,
            beta: default_beta(),
        }
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// β must be finite and non-zero for HIO and DM.
    pub fn validate(&self) -> XtalResult<()> {
        if self.algorithm != AlgorithmKind::ErrorReduction
            && (!self.beta.is_finite() || self.beta == 0.0)
        {
            return Err(XtalError::ConfigError(format!(
                "{} stage: beta must be finite and non-zero, got {}",
                self.algorithm, self.beta
            )));
        }
        Ok(())
    }
}

pub const DEFAULT_ALPHA: f64 = 1.0e-10;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_beta() -> f64 {
    1.0
}
fn default_schedule() -> Vec<StageConfig> {
    vec![
        StageConfig::new(AlgorithmKind::HybridInputOutput, 500),
        StageConfig::new(AlgorithmKind::ErrorReduction, 100),
    ]
}

impl Default for PhasingConfig {
    fn default() -> Self {
        PhasingConfig {
            alpha: default_alpha(),
            seed: None,
            intensity_model: IntensityModel::default(),
            schedule: default_schedule(),
        }
    }
}

impl RunParams {
    /// Parameters for an ordered crystal (N = 1, σ = 0) with the default schedule.
    pub fn new(space_group: SpaceGroupId, unit_cell: [f64; 3], shape: Shape3) -> Self {
        RunParams {
            crystal: CrystalConfig {
                space_group: space_group.to_string(),
                unit_cell,
            },
            detector: DetectorConfig { shape },
            disorder: DisorderConfig { n: 1.0, sigma: 0.0 },
            phasing: PhasingConfig::default(),
        }
    }

    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> XtalResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    pub fn space_group(&self) -> XtalResult<SpaceGroupId> {
        self.crystal.space_group.parse()
    }

    pub fn shape(&self) -> Shape3 {
        self.detector.shape
    }

    pub fn unit_cell(&self) -> [f64; 3] {
        self.crystal.unit_cell
    }

    /// Check every field once, before any array is built.
    pub fn validate(&self) -> XtalResult<()> {
        self.space_group()?;
        if self.detector.shape.iter().any(|&n| n == 0) {
            return Err(XtalError::ConfigError(format!(
                "detector.shape must be positive, got {:?}",
                self.detector.shape
            )));
        }
        if self
            .crystal
            .unit_cell
            .iter()
            .any(|&u| !u.is_finite() || u <= 0.0)
        {
            return Err(XtalError::ConfigError(format!(
                "crystal.unit_cell must be finite and > 0, got {:?}",
                self.crystal.unit_cell
            )));
        }
        if !self.disorder.n.is_finite() || self.disorder.n <= 0.0 {
            return Err(XtalError::ConfigError(
                "disorder.n must be finite and > 0".to_string(),
            ));
        }
        if !self.disorder.sigma.is_finite() || self.disorder.sigma < 0.0 {
            return Err(XtalError::ConfigError(
                "disorder.sigma must be finite and >= 0".to_string(),
            ));
        }
        if !self.phasing.alpha.is_finite() || self.phasing.alpha <= 0.0 {
            return Err(XtalError::ConfigError(
                "phasing.alpha must be finite and > 0".to_string(),
            ));
        }
        for stage in &self.phasing.schedule {
            stage.validate()?;
        }
        Ok(())
    }
}
