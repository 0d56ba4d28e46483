//! Configuration objects
//!
//! Everything the old single-page visualizer kept in module-level globals
//! (control-panel parameters, bloom and point-size settings) is an explicit
//! value here. The sampling core only ever reads [`SamplerConfig`]; the other
//! structs travel alongside the point cloud to whatever renders it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OrbitalError, Result};
use crate::physics::QuantumState;
use crate::sampler::SampleRequest;

/// How theta is proposed for each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularProposal {
    /// theta = acos(1 - 2U), uniform over the sphere
    #[default]
    CosineUniform,
    /// theta = pi * U, under which the r^2 sin(theta) weight is exact
    UniformAngle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Uniform draws used to estimate the envelope Pmax.
    pub envelope_samples: usize,
    /// Attempt budget per requested point. `None` disables the guard, in which
    /// case the loop terminates only almost surely.
    pub max_attempts_per_point: Option<u64>,
    pub angular_proposal: AngularProposal,
    /// Worker shards for the parallel sampler. `None` samples sequentially.
    pub shards: Option<usize>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            envelope_samples: 500,
            max_attempts_per_point: Some(100_000),
            angular_proposal: AngularProposal::CosineUniform,
            shards: None,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.envelope_samples == 0 {
            return Err(OrbitalError::InvalidConfig(
                "envelope_samples must be at least 1".to_string(),
            ));
        }
        if self.max_attempts_per_point == Some(0) {
            return Err(OrbitalError::InvalidConfig(
                "max_attempts_per_point must be at least 1".to_string(),
            ));
        }
        if self.shards == Some(0) {
            return Err(OrbitalError::InvalidConfig("shards must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Total attempt ceiling for a request of `num_points`, if any.
    pub fn attempt_limit(&self, num_points: usize) -> Option<u64> {
        self.max_attempts_per_point
            .map(|per_point| per_point.saturating_mul(num_points as u64))
    }
}

/// Control-panel parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitalParams {
    pub n: u32,
    pub l: u32,
    pub m: i32,
    pub num_points: usize,
    pub r_max: f64,
}

impl Default for OrbitalParams {
    fn default() -> Self {
        OrbitalParams {
            n: 2,
            l: 1,
            m: 0,
            num_points: 10_000,
            r_max: 20.0,
        }
    }
}

impl OrbitalParams {
    /// Coerces the numbers the way the panel sliders do: n at least 1,
    /// l capped at n - 1, m snapped to l once |m| exceeds it, and at least one point.
    pub fn constrain(mut self) -> Self {
        self.n = self.n.max(1);
        self.num_points = self.num_points.max(1);
        if self.l >= self.n {
            self.l = self.n - 1;
        }
        if self.m.unsigned_abs() > self.l {
            self.m = self.l as i32;
        }
        self
    }

    pub fn state(&self) -> Result<QuantumState> {
        QuantumState::new(self.n, self.l, self.m)
    }

    pub fn to_request(&self) -> Result<SampleRequest> {
        SampleRequest::new(self.state()?, self.num_points, self.r_max)
    }
}

/// Presentation settings handed to the renderer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub point_size: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    /// 0xRRGGBB for the positive lobe
    pub positive_color: u32,
    pub negative_color: u32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            point_size: 0.3,
            bloom_strength: 1.5,
            bloom_radius: 0.4,
            bloom_threshold: 0.85,
            positive_color: 0xff0000,
            negative_color: 0x00ffff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampler: SamplerConfig,
    pub orbital: OrbitalParams,
    pub view: ViewSettings,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            sampler: SamplerConfig::default(),
            orbital: OrbitalParams::default(),
            view: ViewSettings::default(),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.sampler.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        AppConfig::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(n: u32, l: u32, m: i32) -> OrbitalParams {
        OrbitalParams {
            n,
            l,
            m,
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_panel() {
        let params = OrbitalParams::default();
        assert_eq!((params.n, params.l, params.m), (2, 1, 0));
        assert_eq!(params.num_points, 10_000);
        assert_eq!(params.r_max, 20.0);
        assert_eq!(SamplerConfig::default().envelope_samples, 500);
    }

    #[test]
    fn constrain_clamps_like_sliders() {
        let p = panel(2, 4, -3).constrain();
        assert_eq!((p.n, p.l, p.m), (2, 1, 1));

        let p = panel(0, 0, 2).constrain();
        assert_eq!((p.n, p.l, p.m), (1, 0, 0));

        let p = OrbitalParams {
            num_points: 0,
            ..panel(4, 2, -2)
        }
        .constrain();
        assert_eq!(p.num_points, 1);
        assert_eq!((p.n, p.l, p.m), (4, 2, -2));
        assert!(p.state().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = AppConfig::from_json_str(
            r#"{
                "orbital": { "n": 3, "l": 2 },
                "sampler": { "angular_proposal": "uniform_angle" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.orbital.n, 3);
        assert_eq!(config.orbital.l, 2);
        assert_eq!(config.orbital.num_points, 10_000);
        assert_eq!(config.sampler.angular_proposal, AngularProposal::UniformAngle);
        assert_eq!(config.sampler.envelope_samples, 500);
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn rejects_zero_envelope_samples() {
        let err =
            AppConfig::from_json_str(r#"{ "sampler": { "envelope_samples": 0 } }"#).unwrap_err();
        assert!(matches!(err, OrbitalError::InvalidConfig(_)));
        assert!(matches!(
            AppConfig::from_json_str("{ not json"),
            Err(OrbitalError::Json(_))
        ));
    }

    #[test]
    fn attempt_limit_scales_with_points() {
        let config = SamplerConfig {
            max_attempts_per_point: Some(10),
            ..Default::default()
        };
        assert_eq!(config.attempt_limit(7), Some(70));
        let unbounded = SamplerConfig {
            max_attempts_per_point: None,
            ..Default::default()
        };
        assert_eq!(unbounded.attempt_limit(7), None);
    }
}
