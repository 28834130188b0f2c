//! Fixed-timestep solver for forests of particle trees.

use crate::collision::CollisionWorld;
use crate::config::{Integrator, SolverConfig};
use crate::float::Float;
use crate::forest;
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::particle::ParticleNode;
use alloc::vec::Vec;

/// Advances particle forests one tick at a time.
///
/// Each step runs four phases over every node, each finishing before the
/// next begins: accumulate forces, solve spring/tether edges, integrate,
/// collide.
pub struct ConstraintSolver<'w, F: Float> {
    pub config: SolverConfig<F>,
    world: Option<CollisionWorld<'w, F>>,
}

impl<'w, F: Float> ConstraintSolver<'w, F> {
    pub fn new(config: SolverConfig<F>) -> Self {
        ConstraintSolver { config, world: None }
    }

    /// Resolve collisions against `world` after every integration.
    pub fn with_world(mut self, world: CollisionWorld<'w, F>) -> Self {
        self.world = Some(world);
        self
    }

    pub fn world(&self) -> Option<&CollisionWorld<'w, F>> {
        self.world.as_ref()
    }

    pub fn set_world(&mut self, world: Option<CollisionWorld<'w, F>>) {
        self.world = world;
    }

    pub fn step(&self, dt: F, roots: &mut [ParticleNode<F>]) {
        self.step_with(dt, roots, &mut NoOpStepObserver);
    }

    /// Advance every tree in `roots` by `dt` (clamped to `max_dt`).
    ///
    /// A non-positive `dt` or an empty forest leaves everything untouched.
    pub fn step_with<O>(&self, dt: F, roots: &mut [ParticleNode<F>], observer: &mut O)
    where
        O: StepObserver<F> + ?Sized,
    {
        let dt = dt.min(self.config.max_dt);
        if dt <= F::zero() || roots.is_empty() {
            return;
        }

        let gravity = self.config.gravity;
        let mut count = 0usize;
        forest::for_each_mut(roots, |p| {
            p.clear_contacts();
            if p.inv_mass() != F::zero() {
                p.apply_force(gravity * p.mass());
            }
            count += 1;
        });
        observer.on_forces_applied(count);

        let tethers = self.config.use_memory_tethers;
        for i in 0..self.config.spring_iterations {
            forest::for_each_mut(roots, |p| p.solve_child_edges(dt, tethers));
            observer.on_spring_iteration(i);
        }

        match self.config.integrator {
            Integrator::Euler => {
                let max_velocity = self.config.max_velocity;
                forest::for_each_mut(roots, |p| {
                    p.integrate_euler(dt);
                    p.clamp_velocity(max_velocity);
                });
            }
            Integrator::Verlet => forest::for_each_mut(roots, |p| p.integrate_verlet(dt)),
        }
        observer.on_integrate();

        if let Some(world) = &self.world {
            world.resolve_forest(roots, dt, &mut *observer);
            observer.on_collisions_resolved();
        }

        observer.on_step_complete();
    }

    /// Flat pre-order view of the forest, rebuilt per call.
    pub fn flatten<'a>(&self, roots: &'a [ParticleNode<F>]) -> Vec<&'a ParticleNode<F>> {
        forest::flatten(roots)
    }

    pub fn particle_count(&self, roots: &[ParticleNode<F>]) -> usize {
        forest::node_count(roots)
    }
}

impl<F: Float> Default for ConstraintSolver<'_, F> {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[derive(Default)]
    struct PhaseLog {
        forces: usize,
        springs: usize,
        integrates: usize,
        collisions: usize,
        completes: usize,
    }

    impl StepObserver<f32> for PhaseLog {
        fn on_forces_applied(&mut self, particles: usize) {
            self.forces = particles;
        }
        fn on_spring_iteration(&mut self, _iteration: usize) {
            self.springs += 1;
        }
        fn on_integrate(&mut self) {
            self.integrates += 1;
        }
        fn on_collisions_resolved(&mut self) {
            self.collisions += 1;
        }
        fn on_step_complete(&mut self) {
            self.completes += 1;
        }
    }

    fn chain() -> ParticleNode<f32> {
        let mut root = ParticleNode::fixed(Vec2::new(0.0, 0.0));
        root.create_child(Vec2::new(0.0, -1.0), 0.5)
            .create_child(Vec2::new(0.0, -1.0), 0.5);
        root
    }

    #[test]
    fn empty_forest_is_a_no_op() {
        let solver = ConstraintSolver::<f32>::default();
        let mut log = PhaseLog::default();
        solver.step_with(0.016, &mut [], &mut log);
        assert_eq!(log.completes, 0);
    }

    #[test]
    fn zero_dt_leaves_state_untouched() {
        let solver = ConstraintSolver::new(SolverConfig::new().with_gravity(Vec2::new(0.0, 1.0)));
        let mut roots = [ParticleNode::new(Vec2::new(0.0, 0.0), 1.0)];
        solver.step(0.0, &mut roots);
        assert_eq!(roots[0].pos, Vec2::new(0.0, 0.0));
        assert_eq!(roots[0].force, Vec2::zero());
    }

    #[test]
    fn phases_are_reported_once_per_step() {
        let solver = ConstraintSolver::new(SolverConfig::new().with_spring_iterations(3));
        let mut roots = [chain(), chain()];
        let mut log = PhaseLog::default();
        solver.step_with(0.016, &mut roots, &mut log);

        assert_eq!(log.forces, 6);
        assert_eq!(log.springs, 3);
        assert_eq!(log.integrates, 1);
        assert_eq!(log.collisions, 0, "no world configured");
        assert_eq!(log.completes, 1);
    }

    #[test]
    fn dt_is_clamped_to_max_dt() {
        let config = SolverConfig::new()
            .with_gravity(Vec2::new(0.0, 1.0))
            .with_max_dt(0.01);
        let solver = ConstraintSolver::new(config);
        let mut roots = [ParticleNode::new(Vec2::new(0.0, 0.0), 1.0).with_params(
            crate::config::NodeParams::default().with_damping(1.0),
        )];
        solver.step(10.0, &mut roots);
        // one Euler step of 0.01: v = 0.01, x = 0.0001
        assert!((roots[0].vel.y - 0.01).abs() < 1e-7);
        assert!((roots[0].pos.y - 0.0001).abs() < 1e-8);
    }

    #[test]
    fn contacts_are_cleared_each_step() {
        let solver = ConstraintSolver::<f32>::default();
        let mut roots = [ParticleNode::new(Vec2::new(0.0, 0.0), 1.0)];
        roots[0].contact.x = true;
        roots[0].contact.y = true;
        solver.step(0.016, &mut roots);
        assert!(!roots[0].contact.x && !roots[0].contact.y);
    }

    #[test]
    fn verlet_falls_under_gravity() {
        let config = SolverConfig::new()
            .with_integrator(Integrator::Verlet)
            .with_gravity(Vec2::new(0.0, 1.0));
        let solver = ConstraintSolver::new(config);
        let mut roots = [ParticleNode::new(Vec2::new(0.0, 0.0), 1.0)];
        for _ in 0..30 {
            solver.step(1.0 / 60.0, &mut roots);
        }
        assert!(roots[0].pos.y > 0.0);
        assert!(roots[0].vel.y > 0.0);
    }
}
