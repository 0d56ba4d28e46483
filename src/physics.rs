//! Hydrogen atom probability density
//! Atomic units throughout: distances are in Bohr radii (a0 = 1)

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{OrbitalError, Result};
use crate::special::{associated_legendre, factorial, laguerre};

/// Largest n + l whose (n + l)! is still a finite f64
pub const MAX_DEGREE_SUM: u32 = 170;

/// Quantum numbers (n, l, m)
/// n: Principal quantum number (1, 2, 3, ...)
/// l: Azimuthal quantum number (0 to n-1)
/// m: Magnetic quantum number (-l to l)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumState {
    pub n: u32,
    pub l: u32,
    pub m: i32,
}

impl QuantumState {
    pub fn new(n: u32, l: u32, m: i32) -> Result<Self> {
        let reason = if n == 0 {
            Some("n must be at least 1")
        } else if l >= n {
            Some("l must be at most n - 1")
        } else if m.unsigned_abs() > l {
            Some("|m| must be at most l")
        } else if u64::from(n) + u64::from(l) > u64::from(MAX_DEGREE_SUM) {
            Some("n + l must be at most 170 for a finite normalization")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(OrbitalError::InvalidQuantumState { n, l, m, reason }),
            None => Ok(QuantumState { n, l, m }),
        }
    }

    /// Re-checks the invariants, for states built through the public fields.
    pub fn validate(self) -> Result<Self> {
        QuantumState::new(self.n, self.l, self.m)
    }
}

/// Sampling-space coordinate: r >= 0, theta in [0, pi], phi in [0, 2pi)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalPoint {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

impl SphericalPoint {
    pub fn new(r: f64, theta: f64, phi: f64) -> Self {
        SphericalPoint { r, theta, phi }
    }

    pub fn to_cartesian(self) -> [f64; 3] {
        let sin_theta = self.theta.sin();
        [
            self.r * sin_theta * self.phi.cos(),
            self.r * sin_theta * self.phi.sin(),
            self.r * self.theta.cos(),
        ]
    }
}

// sqrt((2/n)^3 * (n-l-1)! / (2n (n+l)!))
fn radial_norm(n: u32, l: u32) -> f64 {
    let n_f = n as f64;
    let lower = n.saturating_sub(l).saturating_sub(1);
    let upper = n.saturating_add(l);
    ((2.0 / n_f).powi(3) * factorial(lower) / (2.0 * n_f * factorial(upper))).sqrt()
}

// (2l+1)/(4pi) * (l-|m|)!/(l+|m|)!
fn angular_norm(l: u32, m: i32) -> f64 {
    let m_abs = m.unsigned_abs();
    (2.0 * l as f64 + 1.0) / (4.0 * PI) * factorial(l.saturating_sub(m_abs))
        / factorial(l.saturating_add(m_abs))
}

fn radial_with_norm(norm: f64, n: u32, l: u32, r: f64) -> f64 {
    let rho = 2.0 * r / n as f64;
    let degree = n.saturating_sub(l).saturating_sub(1);
    let poly = laguerre(degree, 2.0 * l as f64 + 1.0, rho);
    norm * rho.powi(l as i32) * (-rho / 2.0).exp() * poly
}

/// |R_nl(r)|^2. Caller guarantees l < n.
pub fn radial_density_squared(n: u32, l: u32, r: f64) -> f64 {
    debug_assert!(n >= 1 && l < n);
    let radial = radial_with_norm(radial_norm(n, l), n, l, r);
    radial * radial
}

/// |Y_lm(theta, phi)|^2, which does not depend on phi. Caller guarantees |m| <= l.
pub fn angular_density_squared(l: u32, m: i32, theta: f64) -> f64 {
    debug_assert!(m.unsigned_abs() <= l);
    let legendre = associated_legendre(l, m, theta.cos());
    angular_norm(l, m) * legendre * legendre
}

/// Probability density |psi|^2 at a point
pub fn density_squared(state: QuantumState, p: SphericalPoint) -> f64 {
    radial_density_squared(state.n, state.l, p.r)
        * angular_density_squared(state.l, state.m, p.theta)
}

/// Sign-carrying proxy used to split points into lobes: |R| * P^|m|_l(cos theta) * cos(m phi).
/// The radial factor enters as a magnitude, so radial nodes never flip the sign.
pub fn signed_amplitude(state: QuantumState, p: SphericalPoint) -> f64 {
    radial_density_squared(state.n, state.l, p.r).sqrt()
        * associated_legendre(state.l, state.m, p.theta.cos())
        * (state.m as f64 * p.phi).cos()
}

/// |psi|^2 * r^2 sin(theta), the acceptance weight in spherical coordinates
pub fn probability_weight(state: QuantumState, p: SphericalPoint) -> f64 {
    density_squared(state, p) * p.r * p.r * p.theta.sin()
}

/// Density evaluator for one state with the normalization constants computed once.
/// The sampler calls this per candidate.
#[derive(Debug, Clone, Copy)]
pub struct DensityModel {
    state: QuantumState,
    radial_norm: f64,
    angular_norm: f64,
}

impl DensityModel {
    pub fn new(state: QuantumState) -> Self {
        DensityModel {
            state,
            radial_norm: radial_norm(state.n, state.l),
            angular_norm: angular_norm(state.l, state.m),
        }
    }

    pub fn state(&self) -> QuantumState {
        self.state
    }

    pub fn radial_squared(&self, r: f64) -> f64 {
        let radial = radial_with_norm(self.radial_norm, self.state.n, self.state.l, r);
        radial * radial
    }

    pub fn angular_squared(&self, theta: f64) -> f64 {
        let legendre = associated_legendre(self.state.l, self.state.m, theta.cos());
        self.angular_norm * legendre * legendre
    }

    pub fn density_squared(&self, p: SphericalPoint) -> f64 {
        self.radial_squared(p.r) * self.angular_squared(p.theta)
    }

    pub fn signed_amplitude(&self, p: SphericalPoint) -> f64 {
        self.radial_squared(p.r).sqrt()
            * associated_legendre(self.state.l, self.state.m, p.theta.cos())
            * (self.state.m as f64 * p.phi).cos()
    }

    pub fn probability_weight(&self, p: SphericalPoint) -> f64 {
        self.density_squared(p) * p.r * p.r * p.theta.sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn state(n: u32, l: u32, m: i32) -> QuantumState {
        QuantumState::new(n, l, m).unwrap()
    }

    /// Midpoint quadrature of |psi|^2 r^2 sin(theta) over r, theta;
    /// the phi integral contributes 2pi since the density is phi-independent.
    fn total_probability(qs: QuantumState, r_end: f64) -> f64 {
        let r_steps = 4000;
        let theta_steps = 400;
        let dr = r_end / r_steps as f64;
        let dtheta = PI / theta_steps as f64;

        let mut sum = 0.0;
        for i in 0..r_steps {
            let r = (i as f64 + 0.5) * dr;
            for j in 0..theta_steps {
                let theta = (j as f64 + 0.5) * dtheta;
                let p = SphericalPoint::new(r, theta, 0.0);
                sum += density_squared(qs, p) * r * r * theta.sin();
            }
        }
        sum * dr * dtheta * 2.0 * PI
    }

    #[test]
    fn test_quantum_state() {
        assert!(QuantumState::new(1, 0, 0).is_ok());
        assert!(QuantumState::new(2, 1, -1).is_ok());
        assert!(QuantumState::new(2, 1, 0).is_ok());
        assert!(QuantumState::new(2, 1, 1).is_ok());

        assert!(QuantumState::new(0, 0, 0).is_err());
        assert!(QuantumState::new(1, 1, 0).is_err());
        assert!(QuantumState::new(2, 0, 1).is_err());
        assert!(QuantumState::new(2, 1, -2).is_err());
    }

    #[test]
    fn invalid_state_reports_reason() {
        match QuantumState::new(2, 0, 1) {
            Err(OrbitalError::InvalidQuantumState { n, l, m, reason }) => {
                assert_eq!((n, l, m), (2, 0, 1));
                assert_eq!(reason, "|m| must be at most l");
            }
            other => panic!("unexpected {other:?}"),
        }
        let built = QuantumState { n: 0, l: 0, m: 0 };
        assert!(built.validate().is_err());
    }

    #[test]
    fn test_to_cartesian() {
        let p = SphericalPoint::new(2.0, PI / 2.0, 0.0).to_cartesian();
        assert_abs_diff_eq!(p[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-12);

        let p = SphericalPoint::new(3.0, 0.0, 1.0).to_cartesian();
        assert_abs_diff_eq!(p[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn ground_state_radial_matches_closed_form() {
        // R_10 = 2 e^{-r}
        for &r in &[0.0_f64, 0.5, 1.0, 3.0] {
            let expected = 4.0 * (-2.0 * r).exp();
            assert_relative_eq!(radial_density_squared(1, 0, r), expected, max_relative = 1e-12);
        }
        // R_21 = r e^{-r/2} / (2 sqrt 6)
        for &r in &[0.5_f64, 2.0, 5.0] {
            let radial = r * (-r / 2.0).exp() / (2.0 * 6.0_f64.sqrt());
            let expected = radial * radial;
            assert_relative_eq!(radial_density_squared(2, 1, r), expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn angular_density_integrates_to_one() {
        for &(l, m) in &[(0, 0), (1, 0), (1, 1), (2, -1), (3, 2), (4, -4)] {
            let steps = 2000;
            let dtheta = PI / steps as f64;
            let total: f64 = (0..steps)
                .map(|j| {
                    let theta = (j as f64 + 0.5) * dtheta;
                    angular_density_squared(l, m, theta) * theta.sin()
                })
                .sum::<f64>()
                * dtheta
                * 2.0
                * PI;
            assert_relative_eq!(total, 1.0, max_relative = 1e-4);
        }
    }

    #[test]
    fn full_density_is_normalized() {
        for &(n, l, m) in &[(1, 0, 0), (2, 0, 0), (2, 1, 0), (3, 2, 1), (3, 1, -1)] {
            let total = total_probability(state(n, l, m), 80.0);
            assert_relative_eq!(total, 1.0, max_relative = 0.01);
        }
    }

    #[test]
    fn model_agrees_with_free_functions() {
        for &(n, l, m) in &[(1, 0, 0), (3, 2, -2), (4, 3, 1), (5, 2, 0)] {
            let qs = state(n, l, m);
            let model = DensityModel::new(qs);
            for &(r, theta, phi) in &[(0.3, 0.2, 0.1), (2.0, 1.4, 3.0), (9.0, 2.9, 5.5)] {
                let p = SphericalPoint::new(r, theta, phi);
                assert_relative_eq!(
                    model.density_squared(p),
                    density_squared(qs, p),
                    max_relative = 1e-12
                );
                assert_relative_eq!(
                    model.probability_weight(p),
                    probability_weight(qs, p),
                    max_relative = 1e-12
                );
                assert_abs_diff_eq!(
                    model.signed_amplitude(p),
                    signed_amplitude(qs, p),
                    epsilon = 1e-15
                );
            }
        }
    }

    #[test]
    fn density_ignores_phi() {
        let qs = state(3, 2, 2);
        let a = density_squared(qs, SphericalPoint::new(4.0, 0.7, 0.0));
        let b = density_squared(qs, SphericalPoint::new(4.0, 0.7, 2.2));
        assert_eq!(a, b);
    }

    #[test]
    fn pz_amplitude_follows_cos_theta() {
        let qs = state(2, 1, 0);
        let upper = signed_amplitude(qs, SphericalPoint::new(2.0, 0.3, 1.0));
        let lower = signed_amplitude(qs, SphericalPoint::new(2.0, PI - 0.3, 1.0));
        assert!(upper > 0.0);
        assert!(lower < 0.0);
        assert_relative_eq!(upper, -lower, max_relative = 1e-12);
    }

    #[test]
    fn s_state_amplitude_never_negative() {
        // The radial node of 2s does not flip the sign proxy.
        let qs = state(2, 0, 0);
        for i in 0..50 {
            let r = i as f64 * 0.2;
            assert!(signed_amplitude(qs, SphericalPoint::new(r, 1.0, 2.0)) >= 0.0);
        }
    }

    #[test]
    fn weight_vanishes_at_origin_and_poles() {
        let qs = state(2, 1, 0);
        assert_eq!(probability_weight(qs, SphericalPoint::new(0.0, 1.0, 0.0)), 0.0);
        let pole = SphericalPoint::new(2.0, 0.0, 0.0);
        assert_abs_diff_eq!(probability_weight(qs, pole), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn huge_states_are_rejected() {
        for &(n, l) in &[((1 << 31) + 1, 1 << 31), (u32::MAX, 0), (171, 0), (100, 71)] {
            match QuantumState::new(n, l, 0) {
                Err(OrbitalError::InvalidQuantumState { reason, .. }) => {
                    assert!(reason.contains("170"), "{reason}");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(QuantumState::new(170, 0, 0).is_ok());
        assert!(QuantumState::new(100, 70, 0).is_ok());
    }

    #[test]
    fn normalization_stays_finite_at_the_degree_limit() {
        let model = DensityModel::new(state(100, 70, 3));
        let p = SphericalPoint::new(50.0, 1.0, 0.5);
        assert!(model.density_squared(p).is_finite());
        assert!(model.signed_amplitude(p).is_finite());
    }
}
