//! Rejection sampling of hydrogen orbitals into signed point clouds
//!
//! Each request runs two phases against a [`DensityModel`]:
//!
//! 1. Envelope estimation: `envelope_samples` uniform draws of the
//!    r^2 sin(theta)-weighted density; the largest value becomes Pmax. This is
//!    an empirical supremum and can undershoot the true maximum, which clips
//!    the densest region slightly.
//! 2. Accept/reject: candidates from the same proposal are accepted when
//!    `U * Pmax < P`. Accepted points are filed by the sign of
//!    [`DensityModel::signed_amplitude`] into the positive or negative lobe.
//!
//! Without an attempt limit the loop terminates only almost surely;
//! [`SamplerConfig::max_attempts_per_point`] turns a runaway into
//! [`OrbitalError::AttemptsExhausted`].

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{AngularProposal, SamplerConfig};
use crate::error::{OrbitalError, Result};
use crate::physics::{DensityModel, QuantumState, SphericalPoint};

/// Full input to one sampling run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRequest {
    pub state: QuantumState,
    pub num_points: usize,
    pub r_max: f64,
}

impl SampleRequest {
    pub fn new(state: QuantumState, num_points: usize, r_max: f64) -> Result<Self> {
        let state = state.validate()?;
        if num_points == 0 {
            return Err(OrbitalError::InvalidSampleRequest(
                "num_points must be at least 1".to_string(),
            ));
        }
        if !r_max.is_finite() || r_max <= 0.0 {
            return Err(OrbitalError::InvalidSampleRequest(format!(
                "r_max must be a positive finite radius, got {r_max}"
            )));
        }
        Ok(SampleRequest {
            state,
            num_points,
            r_max,
        })
    }
}

/// Point cloud split by lobe sign. Order within each list carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleResult {
    pub positions_pos: Vec<[f64; 3]>,
    pub positions_neg: Vec<[f64; 3]>,
    /// Envelope used for the run
    pub pmax: f64,
    /// Candidates drawn in phase 2
    pub attempts: u64,
}

impl SampleResult {
    pub fn len(&self) -> usize {
        self.positions_pos.len() + self.positions_neg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.len() as f64 / self.attempts as f64
    }

    /// Positive lobe as a flat xyz f32 buffer
    pub fn positive_flat(&self) -> Vec<f32> {
        flatten(&self.positions_pos)
    }

    /// Negative lobe as a flat xyz f32 buffer
    pub fn negative_flat(&self) -> Vec<f32> {
        flatten(&self.positions_neg)
    }
}

fn flatten(points: &[[f64; 3]]) -> Vec<f32> {
    points
        .iter()
        .flat_map(|p| p.iter().map(|&c| c as f32))
        .collect()
}

// Accepted points from one accept/reject loop
struct Partial {
    positions_pos: Vec<[f64; 3]>,
    positions_neg: Vec<[f64; 3]>,
    attempts: u64,
}

impl Partial {
    fn accepted(&self) -> usize {
        self.positions_pos.len() + self.positions_neg.len()
    }
}

fn draw_candidate<R: Rng + ?Sized>(
    proposal: AngularProposal,
    r_max: f64,
    rng: &mut R,
) -> SphericalPoint {
    let r = rng.gen::<f64>() * r_max;
    let theta = match proposal {
        AngularProposal::CosineUniform => (1.0 - 2.0 * rng.gen::<f64>()).acos(),
        AngularProposal::UniformAngle => rng.gen::<f64>() * PI,
    };
    let phi = rng.gen::<f64>() * 2.0 * PI;
    SphericalPoint::new(r, theta, phi)
}

fn accept_reject<R: Rng + ?Sized>(
    model: &DensityModel,
    proposal: AngularProposal,
    r_max: f64,
    pmax: f64,
    quota: usize,
    limit: Option<u64>,
    rng: &mut R,
) -> Partial {
    let mut positions_pos = Vec::new();
    let mut positions_neg = Vec::new();
    let mut accepted = 0;
    let mut attempts = 0u64;

    while accepted < quota {
        if limit.is_some_and(|limit| attempts >= limit) {
            break;
        }
        attempts += 1;

        let candidate = draw_candidate(proposal, r_max, rng);
        let p = model.probability_weight(candidate);

        if rng.gen::<f64>() * pmax < p {
            let point = candidate.to_cartesian();
            if model.signed_amplitude(candidate) >= 0.0 {
                positions_pos.push(point);
            } else {
                positions_neg.push(point);
            }
            accepted += 1;
        }
    }

    Partial {
        positions_pos,
        positions_neg,
        attempts,
    }
}

/// Two-phase rejection sampler. Holds configuration only; every call is
/// independent apart from the random source handed in.
#[derive(Debug, Clone, Default)]
pub struct OrbitalSampler {
    config: SamplerConfig,
}

impl OrbitalSampler {
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(OrbitalSampler { config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Phase 1: empirical maximum of the weighted density over uniform draws.
    pub fn estimate_envelope<R: Rng + ?Sized>(
        &self,
        model: &DensityModel,
        r_max: f64,
        rng: &mut R,
    ) -> Result<f64> {
        let samples = self.config.envelope_samples;
        let mut pmax = 0.0_f64;

        for _ in 0..samples {
            let candidate = draw_candidate(self.config.angular_proposal, r_max, rng);
            let p = model.probability_weight(candidate);
            if p > pmax {
                pmax = p;
            }
        }

        if pmax <= 0.0 || !pmax.is_finite() {
            let state = model.state();
            warn!(n = state.n, l = state.l, m = state.m, r_max, pmax, "degenerate envelope");
            return Err(OrbitalError::DegenerateEnvelope { pmax, samples });
        }

        debug!(pmax, samples, "estimated envelope");
        Ok(pmax)
    }

    /// Runs a request sequentially, or sharded when `shards` is configured.
    pub fn run<R: Rng + ?Sized>(
        &self,
        request: &SampleRequest,
        rng: &mut R,
    ) -> Result<SampleResult> {
        match self.config.shards {
            Some(_) => self.sample_sharded(request, rng),
            None => self.sample(request, rng),
        }
    }

    /// Sequential two-phase sampling.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        request: &SampleRequest,
        rng: &mut R,
    ) -> Result<SampleResult> {
        let request = SampleRequest::new(request.state, request.num_points, request.r_max)?;
        let model = DensityModel::new(request.state);
        let pmax = self.estimate_envelope(&model, request.r_max, rng)?;

        let partial = accept_reject(
            &model,
            self.config.angular_proposal,
            request.r_max,
            pmax,
            request.num_points,
            self.config.attempt_limit(request.num_points),
            rng,
        );

        finish(&request, pmax, vec![partial])
    }

    /// Phase 2 split across rayon workers. The envelope comes from `rng`; each
    /// shard then draws from its own ChaCha stream seeded from `rng`, and shards
    /// are merged in order, so a fixed seed and shard count reproduce the output.
    pub fn sample_sharded<R: Rng + ?Sized>(
        &self,
        request: &SampleRequest,
        rng: &mut R,
    ) -> Result<SampleResult> {
        let request = SampleRequest::new(request.state, request.num_points, request.r_max)?;
        let model = DensityModel::new(request.state);
        let pmax = self.estimate_envelope(&model, request.r_max, rng)?;

        let shards = self
            .config
            .shards
            .unwrap_or_else(rayon::current_num_threads)
            .clamp(1, request.num_points);
        let base = request.num_points / shards;
        let extra = request.num_points % shards;

        let jobs: Vec<(usize, u64)> = (0..shards)
            .map(|i| (base + usize::from(i < extra), rng.gen::<u64>()))
            .collect();

        let proposal = self.config.angular_proposal;
        let partials: Vec<Partial> = jobs
            .into_par_iter()
            .map(|(quota, seed)| {
                let mut shard_rng = ChaCha8Rng::seed_from_u64(seed);
                accept_reject(
                    &model,
                    proposal,
                    request.r_max,
                    pmax,
                    quota,
                    self.config.attempt_limit(quota),
                    &mut shard_rng,
                )
            })
            .collect();

        debug!(shards, "merged sampling shards");
        finish(&request, pmax, partials)
    }
}

fn finish(request: &SampleRequest, pmax: f64, partials: Vec<Partial>) -> Result<SampleResult> {
    let attempts: u64 = partials.iter().map(|p| p.attempts).sum();
    let accepted: usize = partials.iter().map(Partial::accepted).sum();

    if accepted < request.num_points {
        let state = request.state;
        warn!(
            n = state.n,
            l = state.l,
            m = state.m,
            attempts,
            accepted,
            requested = request.num_points,
            "attempt limit reached"
        );
        return Err(OrbitalError::AttemptsExhausted {
            attempts,
            accepted,
            requested: request.num_points,
        });
    }

    let mut result = SampleResult {
        pmax,
        attempts,
        ..SampleResult::default()
    };
    for partial in partials {
        result.positions_pos.extend(partial.positions_pos);
        result.positions_neg.extend(partial.positions_neg);
    }

    debug!(
        positive = result.positions_pos.len(),
        negative = result.positions_neg.len(),
        attempts,
        acceptance = result.acceptance_rate(),
        "sampled orbital"
    );
    Ok(result)
}

/// Samples `num_points` points of the (n, l, m) orbital within `r_max` using the
/// default sampler configuration.
pub fn sample<R: Rng + ?Sized>(
    state: QuantumState,
    num_points: usize,
    r_max: f64,
    rng: &mut R,
) -> Result<SampleResult> {
    let request = SampleRequest::new(state, num_points, r_max)?;
    OrbitalSampler::default().sample(&request, rng)
}
