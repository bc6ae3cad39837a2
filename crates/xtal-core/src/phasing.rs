// ─────────────────────────────────────────────────────────────────────
// XTAL Phasing — Phasing Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Iterative projection phasing: ER, HIO and the Difference Map.
//!
//! The engine runs a fixed schedule of stages over one working field.
//! Diagnostics are computed on a copy of the current estimate and never
//! feed back into the iteration.

use crate::mappings::Mappings;
use crate::projection::{is_finite, ModulusProjection, SupportProjection};
use log::{debug, info};
use ndarray::{Array3, Zip};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xtal_math::norms::{l2norm, l2norm_real};
use xtal_types::config::{AlgorithmKind, RunParams, StageConfig};
use xtal_types::error::{XtalError, XtalResult};
use xtal_types::state::{check_shape, Field, Intensity, Mask, PhasingOutput, StageSummary};

/// One iteration rule with its feedback parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Algorithm {
    ErrorReduction,
    HybridInputOutput { beta: f64 },
    DifferenceMap { beta: f64 },
}

impl Algorithm {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Algorithm::ErrorReduction => AlgorithmKind::ErrorReduction,
            Algorithm::HybridInputOutput { .. } => AlgorithmKind::HybridInputOutput,
            Algorithm::DifferenceMap { .. } => AlgorithmKind::DifferenceMap,
        }
    }
}

impl From<&StageConfig> for Algorithm {
    fn from(stage: &StageConfig) -> Self {
        match stage.algorithm {
            AlgorithmKind::ErrorReduction => Algorithm::ErrorReduction,
            AlgorithmKind::HybridInputOutput => Algorithm::HybridInputOutput { beta: stage.beta },
            AlgorithmKind::DifferenceMap => Algorithm::DifferenceMap { beta: stage.beta },
        }
    }
}

/// `x ← Psup(Pmod(x))`
pub fn error_reduction<M, S>(x: &Field, pmod: M, psup: S) -> XtalResult<Field>
where
    M: Fn(&Field) -> XtalResult<Field>,
    S: Fn(&Field) -> XtalResult<Field>,
{
    psup(&pmod(x)?)
}

/// `x ← x + β·Psup((1 + 1/β)·Pmod(x) − x/β) − β·Pmod(x)`
pub fn hybrid_input_output<M, S>(x: &Field, pmod: M, psup: S, beta: f64) -> XtalResult<Field>
where
    M: Fn(&Field) -> XtalResult<Field>,
    S: Fn(&Field) -> XtalResult<Field>,
{
    let out = pmod(x)?;
    let inv = 1.0 / beta;
    let relaxed = Zip::from(&out)
        .and(x)
        .map_collect(|&o, &xi| o * (1.0 + inv) - xi * inv);
    let supported = psup(&relaxed)?;
    Ok(Zip::from(x)
        .and(&supported)
        .and(&out)
        .map_collect(|&xi, &s, &o| xi + s * beta - o * beta))
}

/// Difference Map:
///
/// ```text
/// x ← x − Pmod(x) − Psup(x) + Psup(β(1 + 1/β)·Pmod(x)) − β(1 − 1/β)·Pmod(Psup(x))
/// ```
pub fn difference_map<M, S>(x: &Field, pmod: M, psup: S, beta: f64) -> XtalResult<Field>
where
    M: Fn(&Field) -> XtalResult<Field>,
    S: Fn(&Field) -> XtalResult<Field>,
{
    let psi_m = pmod(x)?;
    let psi_s = psup(x)?;
    let gain_m = beta * (1.0 + 1.0 / beta);
    let gain_s = beta * (1.0 - 1.0 / beta);
    let term_s = psup(&psi_m.mapv(|v| v * gain_m))?;
    let term_m = pmod(&psi_s)?;
    Ok(Zip::from(x)
        .and(&psi_m)
        .and(&psi_s)
        .and(&term_s)
        .and(&term_m)
        .map_collect(|&xi, &m, &s, &ts, &tm| xi - m - s + ts - tm * gain_s))
}

/// Difference Map solution estimate: `Psup((1 + 1/β)·Pmod(x) − x/β)`.
pub fn difference_map_solution<M, S>(x: &Field, pmod: M, psup: S, beta: f64) -> XtalResult<Field>
where
    M: Fn(&Field) -> XtalResult<Field>,
    S: Fn(&Field) -> XtalResult<Field>,
{
    let psi_m = pmod(x)?;
    let inv = 1.0 / beta;
    let relaxed = Zip::from(&psi_m)
        .and(x)
        .map_collect(|&m, &xi| m * (1.0 + inv) - xi * inv);
    psup(&relaxed)
}

fn validate_schedule(schedule: &[StageConfig]) -> XtalResult<()> {
    schedule.iter().try_for_each(StageConfig::validate)
}

/// Run parameters must describe the crystal the mappings were built for.
fn check_consistent(mappings: &Mappings, params: &RunParams) -> XtalResult<()> {
    let shape = mappings.shape();
    if params.shape() != shape {
        return Err(XtalError::ShapeMismatch {
            what: "run parameters detector shape".to_string(),
            expected: shape.to_vec(),
            found: params.shape().to_vec(),
        });
    }
    let group = mappings.group();
    let space_group = params.space_group()?;
    if space_group != group.id() {
        return Err(XtalError::ConfigError(format!(
            "run parameters space group {space_group} differs from mappings {}",
            group.id()
        )));
    }
    if params.unit_cell() != group.unit_cell() {
        return Err(XtalError::ConfigError(format!(
            "run parameters unit cell {:?} differs from mappings {:?}",
            params.unit_cell(),
            group.unit_cell()
        )));
    }
    let disorder = mappings.disorder();
    if params.disorder.n != disorder.n() || params.disorder.sigma != disorder.sigma() {
        return Err(XtalError::ConfigError(format!(
            "run parameters disorder (n = {}, sigma = {}) differs from mappings ({}, {})",
            params.disorder.n,
            params.disorder.sigma,
            disorder.n(),
            disorder.sigma()
        )));
    }
    if params.phasing.intensity_model != mappings.model() {
        return Err(XtalError::ConfigError(format!(
            "run parameters intensity model {:?} differs from mappings {:?}",
            params.phasing.intensity_model,
            mappings.model()
        )));
    }
    Ok(())
}

/// Per-iteration diagnostic sequences.
#[derive(Debug, Default)]
struct Diagnostics {
    modulus: Vec<f64>,
    support: Vec<f64>,
    fidelity: Option<Vec<f64>>,
}

/// Drives a schedule of projection stages over one working field.
#[derive(Debug)]
pub struct PhasingEngine<'a> {
    mappings: &'a Mappings,
    pmod: ModulusProjection<'a>,
    psup: SupportProjection<'a>,
    schedule: Vec<StageConfig>,
    seed: Option<u64>,
    known_solid: Option<&'a Field>,
}

impl<'a> PhasingEngine<'a> {
    pub fn new(
        mappings: &'a Mappings,
        params: &RunParams,
        intensity: &Intensity,
        support: &'a Mask,
        good_pix: &'a Mask,
    ) -> XtalResult<Self> {
        params.validate()?;
        check_consistent(mappings, params)?;
        check_shape("support mask", support, mappings.shape())?;
        let pmod = ModulusProjection::new(mappings, intensity, good_pix, params.phasing.alpha)?;
        Ok(PhasingEngine {
            mappings,
            pmod,
            psup: SupportProjection::new(support),
            schedule: params.phasing.schedule.clone(),
            seed: params.phasing.seed,
            known_solid: None,
        })
    }

    /// Replace the configured stage schedule.
    pub fn with_schedule(mut self, schedule: Vec<StageConfig>) -> XtalResult<Self> {
        validate_schedule(&schedule)?;
        self.schedule = schedule;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Ground truth for the fidelity diagnostic (simulations only).
    pub fn with_known_solid(mut self, solid: &'a Field) -> XtalResult<Self> {
        check_shape("known solid", solid, self.mappings.shape())?;
        self.known_solid = Some(solid);
        Ok(self)
    }

    pub fn schedule(&self) -> &[StageConfig] {
        &self.schedule
    }

    pub fn modulus_projection(&self) -> &ModulusProjection<'a> {
        &self.pmod
    }

    pub fn support_projection(&self) -> &SupportProjection<'a> {
        &self.psup
    }

    /// Support-projected random field with components drawn from (0, 1].
    pub fn initial_field(&self) -> XtalResult<Field> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let shape = self.mappings.shape();
        let noise = Array3::from_shape_fn((shape[0], shape[1], shape[2]), |_| {
            Complex64::new(1.0 - rng.gen::<f64>(), 1.0 - rng.gen::<f64>())
        });
        self.psup.apply(&noise)
    }

    /// One iteration of `algorithm` applied to `x`.
    pub fn step(&self, algorithm: Algorithm, x: &Field) -> XtalResult<Field> {
        let pmod = |f: &Field| self.pmod.apply(f);
        let psup = |f: &Field| self.psup.apply(f);
        match algorithm {
            Algorithm::ErrorReduction => error_reduction(x, pmod, psup),
            Algorithm::HybridInputOutput { beta } => hybrid_input_output(x, pmod, psup, beta),
            Algorithm::DifferenceMap { beta } => difference_map(x, pmod, psup, beta),
        }
    }

    /// Density estimate carried by the iterate `x`.
    ///
    /// ER and HIO iterate on the estimate itself; DM needs its solution map.
    pub fn estimate(&self, algorithm: Algorithm, x: &Field) -> XtalResult<Field> {
        match algorithm {
            Algorithm::DifferenceMap { beta } => difference_map_solution(
                x,
                |f: &Field| self.pmod.apply(f),
                |f: &Field| self.psup.apply(f),
                beta,
            ),
            _ => Ok(x.clone()),
        }
    }

    /// Run the schedule from a random support-projected field.
    pub fn run(&self) -> XtalResult<PhasingOutput> {
        self.run_from(self.initial_field()?)
    }

    /// Run the schedule from `initial`, support-projected first.
    pub fn run_from(&self, initial: Field) -> XtalResult<PhasingOutput> {
        let shape = self.mappings.shape();
        check_shape("initial field", &initial, shape)?;
        validate_schedule(&self.schedule)?;

        let total: usize = self.schedule.iter().map(|s| s.iterations).sum();
        info!(
            "Phasing {} on {:?}: {} stage(s), {} iteration(s)",
            self.mappings.group().id(),
            shape,
            self.schedule.len(),
            total
        );

        let mut x = self.psup.apply(&initial)?;
        let mut diag = Diagnostics {
            fidelity: self.known_solid.map(|_| Vec::with_capacity(total)),
            ..Diagnostics::default()
        };
        let mut stages = Vec::with_capacity(self.schedule.len());

        for (s, stage) in self.schedule.iter().enumerate() {
            let algorithm = Algorithm::from(stage);
            let kind = algorithm.kind();
            info!("Stage {}: {} x {}", s + 1, kind, stage.iterations);

            let mut last_estimate = None;
            for i in 0..stage.iterations {
                x = self.step(algorithm, &x).map_err(|e| annotate(e, kind, i))?;
                if !is_finite(&x) {
                    return Err(XtalError::NumericalInstability(format!(
                        "{kind} iteration {i}: non-finite value in working field"
                    )));
                }
                let estimate = self
                    .estimate(algorithm, &x)
                    .map_err(|e| annotate(e, kind, i))?;
                self.record(&estimate, &mut diag)?;
                debug!(
                    "{} {}/{}: e_mod = {:.6e}, e_sup = {:.6e}, e_fid = {:?}",
                    kind,
                    i + 1,
                    stage.iterations,
                    diag.modulus.last().copied().unwrap_or(f64::NAN),
                    diag.support.last().copied().unwrap_or(f64::NAN),
                    diag.fidelity.as_ref().and_then(|f| f.last().copied()),
                );
                last_estimate = Some(estimate);
            }

            if let (Algorithm::DifferenceMap { .. }, Some(estimate)) = (algorithm, last_estimate) {
                x = estimate;
            }
            let final_modulus_error = if stage.iterations > 0 {
                diag.modulus.last().copied().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            };
            info!("Stage {} done: e_mod = {:.6e}", s + 1, final_modulus_error);
            stages.push(StageSummary {
                algorithm: kind,
                iterations: stage.iterations,
                final_modulus_error,
            });
        }

        let intensity = self.mappings.predicted_intensity(&x)?;
        info!(
            "Phasing finished after {} iteration(s): e_mod = {:.6e}",
            total,
            diag.modulus.last().copied().unwrap_or(f64::NAN)
        );
        Ok(PhasingOutput {
            field: x,
            intensity,
            modulus_error: diag.modulus,
            support_error: diag.support,
            fidelity_error: diag.fidelity,
            stages,
        })
    }

    fn record(&self, estimate: &Field, diag: &mut Diagnostics) -> XtalResult<()> {
        let predicted = self.mappings.predicted_intensity(estimate)?;
        let e_mod = l2norm_real(self.pmod.amplitude(), &predicted.mapv(f64::sqrt))?;
        let e_sup = l2norm(estimate, &self.psup.apply(estimate)?)?;
        diag.modulus.push(e_mod);
        diag.support.push(e_sup);
        if let (Some(truth), Some(fidelity)) = (self.known_solid, diag.fidelity.as_mut()) {
            fidelity.push(l2norm(truth, estimate)?);
        }
        Ok(())
    }
}

fn annotate(err: XtalError, kind: AlgorithmKind, iteration: usize) -> XtalError {
    match err {
        XtalError::NumericalInstability(msg) => {
            XtalError::NumericalInstability(format!("{kind} iteration {iteration}: {msg}"))
        }
        other => other,
    }
}
