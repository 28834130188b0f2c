//! Configuration types for particles, the constraint solver and the
//! collision world.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::vec::Vec2;

/// Integration scheme used by [`ConstraintSolver`](crate::ConstraintSolver).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Integrator {
    /// Semi-implicit Euler with explicit velocity. Honours `max_velocity`.
    #[default]
    Euler,
    /// Position Verlet with implicit velocity.
    Verlet,
}

/// Per-node tuning copied into every [`ParticleNode`](crate::ParticleNode)
/// at construction and inherited by children.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeParams<F: Float> {
    /// Hooke constant used for springs toward this node's children.
    pub spring_k: F,
    /// Damping of relative velocity along each child spring.
    pub spring_damping: F,
    /// Velocity multiplier applied once per integration step.
    pub damping: F,
    /// Multiplier for force components along axes currently in contact.
    /// 0.0 blocks them entirely.
    pub force_damping: F,
    /// Fraction of the tether error removed per solve while within the
    /// hard limit.
    pub tether_soft_factor: F,
    /// Multiple of rest length beyond which the tether snaps hard.
    pub tether_hard_limit: F,
    /// Collision radius before `update_radii` is called.
    pub radius: F,
}

impl<F: Float> NodeParams<F> {
    pub fn new() -> Self {
        NodeParams {
            spring_k: F::from_f32(0.2),
            spring_damping: F::from_f32(0.85),
            damping: F::from_f32(0.95),
            force_damping: F::zero(),
            tether_soft_factor: F::from_f32(0.1),
            tether_hard_limit: F::from_f32(1.25),
            radius: F::one(),
        }
    }

    pub fn with_spring(mut self, k: F, damping: F) -> Self {
        self.spring_k = k;
        self.spring_damping = damping;
        self
    }

    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_force_damping(mut self, force_damping: F) -> Self {
        self.force_damping = force_damping;
        self
    }

    pub fn with_tether(mut self, soft_factor: F, hard_limit: F) -> Self {
        self.tether_soft_factor = soft_factor;
        self.tether_hard_limit = hard_limit;
        self
    }

    pub fn with_radius(mut self, radius: F) -> Self {
        self.radius = radius;
        self
    }

    /// Check every coefficient against its usable range.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        non_negative("spring_k", self.spring_k)?;
        non_negative("spring_damping", self.spring_damping)?;
        unit_interval("damping", self.damping)?;
        unit_interval("force_damping", self.force_damping)?;
        unit_interval("tether_soft_factor", self.tether_soft_factor)?;
        if !(self.tether_hard_limit.is_finite() && self.tether_hard_limit >= F::one()) {
            return Err(invalid("tether_hard_limit", self.tether_hard_limit));
        }
        non_negative("radius", self.radius)
    }
}

impl<F: Float> Default for NodeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the constraint solver.
///
/// # Builder Pattern
/// ```
/// use frond::config::{Integrator, SolverConfig};
/// use frond::vec::Vec2;
///
/// let config: SolverConfig<f32> = SolverConfig::new()
///     .with_integrator(Integrator::Verlet)
///     .with_spring_iterations(4)
///     .with_gravity(Vec2::new(0.0, 0.15))
///     .with_max_dt(1.0 / 30.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig<F: Float> {
    /// Integration scheme. Default: Euler.
    pub integrator: Integrator,
    /// Spring/tether passes per step, all before integration. Default: 1.
    pub spring_iterations: usize,
    /// Run the positional memory tether after every spring. Default: true.
    pub use_memory_tethers: bool,
    /// Global acceleration, applied as `gravity * mass`. Default: zero.
    pub gravity: Vec2<F>,
    /// Upper bound for a single step, in seconds. Default: 0.04.
    pub max_dt: F,
    /// Speed cap in world units per second, Euler only. Values <= 0
    /// disable the cap. Default: 20.
    pub max_velocity: F,
}

impl<F: Float> SolverConfig<F> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        SolverConfig {
            integrator: Integrator::Euler,
            spring_iterations: 1,
            use_memory_tethers: true,
            gravity: Vec2::zero(),
            max_dt: F::from_f32(0.04),
            max_velocity: F::from_f32(20.0),
        }
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Set the number of spring passes per step (at least 1).
    pub fn with_spring_iterations(mut self, iterations: usize) -> Self {
        self.spring_iterations = iterations.max(1);
        self
    }

    pub fn with_memory_tethers(mut self, enabled: bool) -> Self {
        self.use_memory_tethers = enabled;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_max_dt(mut self, max_dt: F) -> Self {
        self.max_dt = max_dt;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: F) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.spring_iterations == 0 {
            return Err(PhysicsError::InvalidSpringIterations);
        }
        if !(self.max_dt.is_finite() && self.max_dt > F::zero()) {
            return Err(PhysicsError::InvalidTimestep);
        }
        if !self.gravity.x.is_finite() {
            return Err(invalid("gravity.x", self.gravity.x));
        }
        if !self.gravity.y.is_finite() {
            return Err(invalid("gravity.y", self.gravity.y));
        }
        if !self.max_velocity.is_finite() {
            return Err(invalid("max_velocity", self.max_velocity));
        }
        Ok(())
    }
}

impl<F: Float> Default for SolverConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Contact response coefficients for the collision world.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig<F: Float> {
    /// Fraction of approaching normal speed returned on contact. Default: 0.2.
    pub restitution: F,
    /// Fraction of tangential speed removed on contact. Default: 0.05.
    pub friction: F,
}

impl<F: Float> WorldConfig<F> {
    pub fn new() -> Self {
        WorldConfig {
            restitution: F::from_f32(0.2),
            friction: F::from_f32(0.05),
        }
    }

    pub fn with_restitution(mut self, restitution: F) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: F) -> Self {
        self.friction = friction;
        self
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        unit_interval("restitution", self.restitution)?;
        unit_interval("friction", self.friction)
    }
}

impl<F: Float> Default for WorldConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid<F: Float>(name: &'static str, value: F) -> PhysicsError {
    PhysicsError::InvalidCoefficient { name, value: value.to_f64() }
}

fn non_negative<F: Float>(name: &'static str, value: F) -> Result<(), PhysicsError> {
    if value.is_finite() && value >= F::zero() {
        Ok(())
    } else {
        Err(invalid(name, value))
    }
}

fn unit_interval<F: Float>(name: &'static str, value: F) -> Result<(), PhysicsError> {
    if value.is_finite() && value >= F::zero() && value <= F::one() {
        Ok(())
    } else {
        Err(invalid(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_defaults_match_documented_values() {
        let c: SolverConfig<f32> = SolverConfig::default();
        assert_eq!(c.integrator, Integrator::Euler);
        assert_eq!(c.spring_iterations, 1);
        assert!(c.use_memory_tethers);
        assert_eq!(c.gravity, Vec2::zero());
        assert_eq!(c.max_dt, 0.04);
        assert_eq!(c.max_velocity, 20.0);
    }

    #[test]
    fn spring_iterations_builder_never_yields_zero() {
        let c: SolverConfig<f32> = SolverConfig::new().with_spring_iterations(0);
        assert_eq!(c.spring_iterations, 1);
    }

    #[test]
    fn zero_iterations_set_directly_fail_validation() {
        let mut c: SolverConfig<f64> = SolverConfig::new();
        c.spring_iterations = 0;
        assert_eq!(c.validate(), Err(PhysicsError::InvalidSpringIterations));
    }

    #[test]
    fn non_positive_max_dt_is_rejected() {
        let c: SolverConfig<f32> = SolverConfig::new().with_max_dt(0.0);
        assert_eq!(c.validate(), Err(PhysicsError::InvalidTimestep));
    }

    #[test]
    fn restitution_above_one_reports_value() {
        let c: WorldConfig<f32> = WorldConfig::new().with_restitution(1.5);
        assert_eq!(
            c.validate(),
            Err(PhysicsError::InvalidCoefficient { name: "restitution", value: 1.5 })
        );
    }

    #[test]
    fn node_defaults_validate() {
        assert!(NodeParams::<f32>::default().validate().is_ok());
        let bad = NodeParams::<f32>::default().with_tether(0.1, 0.5);
        assert!(matches!(
            bad.validate(),
            Err(PhysicsError::InvalidCoefficient { name: "tether_hard_limit", .. })
        ));
    }
}
