//! Step observer trait for monitoring solver phases and collision contacts.

use crate::float::Float;
use crate::vec::Vec2;

/// Collision axis chosen by the minimum-penetration test.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// One tile contact resolved by [`CollisionWorld`](crate::CollisionWorld).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact<F: Float> {
    /// Diagnostic label of the particle.
    pub label: u32,
    /// Tile column and row.
    pub tile: (i32, i32),
    pub axis: Axis,
    /// Penetration depth along `axis` before correction.
    pub penetration: F,
    /// Unit normal pointing from the tile toward the particle.
    pub normal: Vec2<F>,
    /// Particle position after snap and escape nudges.
    pub position: Vec2<F>,
    /// Velocity before reflection and friction.
    pub velocity_before: Vec2<F>,
    pub velocity_after: Vec2<F>,
    /// Whether the contact flag for `axis` was raised.
    pub supporting: bool,
}

/// Trait for observing simulation steps.
///
/// Implement this trait to monitor solver progress (debugging,
/// visualization, profiling). All methods have default no-op
/// implementations, so the solver's hot path carries no logging branches.
pub trait StepObserver<F: Float> {
    /// Called after contacts are cleared and global forces are applied.
    fn on_forces_applied(&mut self, _particles: usize) {}

    /// Called after each spring/tether pass over the forest.
    fn on_spring_iteration(&mut self, _iteration: usize) {}

    /// Called after all particles have been integrated.
    fn on_integrate(&mut self) {}

    /// Called for every tile contact that moved a particle.
    fn on_contact(&mut self, _contact: &Contact<F>) {}

    /// Called when the escape pass nudges a particle out of a solid cell.
    fn on_escape_nudge(&mut self, _label: u32, _iteration: usize, _position: Vec2<F>) {}

    /// Called after the collision phase, only when a world is configured.
    fn on_collisions_resolved(&mut self) {}

    /// Called when a simulation step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// A no-op observer. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl<F: Float> StepObserver<F> for NoOpStepObserver {}

/// Observer that forwards every hook to `tracing` events.
///
/// Solver phases are emitted at `TRACE` under `frond::solver`, contacts at
/// `DEBUG` under `frond::collision`.
#[cfg(feature = "tracing")]
#[derive(Default)]
pub struct TracingObserver {
    step: u64,
}

#[cfg(feature = "tracing")]
impl TracingObserver {
    pub fn new() -> Self {
        TracingObserver { step: 0 }
    }

    /// Number of completed steps seen so far.
    pub fn steps(&self) -> u64 {
        self.step
    }
}

#[cfg(feature = "tracing")]
impl<F: Float> StepObserver<F> for TracingObserver {
    fn on_forces_applied(&mut self, particles: usize) {
        tracing::trace!(target: "frond::solver", step = self.step, particles, "global forces applied");
    }

    fn on_spring_iteration(&mut self, iteration: usize) {
        tracing::trace!(target: "frond::solver", step = self.step, iteration, "spring pass");
    }

    fn on_integrate(&mut self) {
        tracing::trace!(target: "frond::solver", step = self.step, "integrated");
    }

    fn on_contact(&mut self, contact: &Contact<F>) {
        tracing::debug!(
            target: "frond::collision",
            label = contact.label,
            col = contact.tile.0,
            row = contact.tile.1,
            axis = ?contact.axis,
            penetration = %contact.penetration,
            x = %contact.position.x,
            y = %contact.position.y,
            vx = %contact.velocity_after.x,
            vy = %contact.velocity_after.y,
            supporting = contact.supporting,
            "tile contact"
        );
    }

    fn on_escape_nudge(&mut self, label: u32, iteration: usize, position: Vec2<F>) {
        tracing::debug!(
            target: "frond::collision",
            label,
            iteration,
            x = %position.x,
            y = %position.y,
            "escape nudge"
        );
    }

    fn on_step_complete(&mut self) {
        self.step += 1;
    }
}
