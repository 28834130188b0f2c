//! Point-mass particles arranged in owned trees.
//!
//! A [`ParticleNode`] owns its children outright, so a tree is dropped with
//! its root and no node can sit in two trees. Nodes only know about single
//! parent→child edges; traversal, integrator choice and iteration counts
//! belong to [`ConstraintSolver`](crate::ConstraintSolver).

use crate::config::NodeParams;
use crate::error::PhysicsError;
use crate::float::Float;
use crate::forest;
use crate::vec::Vec2;
use alloc::vec::Vec;

/// Floor applied to spring and tether distances before normalising.
pub const MIN_DISTANCE: f32 = 1e-4;

/// Fraction of the overshoot removed by a hard tether snap.
const HARD_SNAP_FRACTION: f32 = 0.5;

/// Per-axis contact state, set by the collision world and cleared at the
/// start of every step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactAxes {
    pub x: bool,
    pub y: bool,
}

/// A point mass with spring, tether and collision state, owning zero or
/// more child nodes.
#[derive(Clone, Debug)]
pub struct ParticleNode<F: Float> {
    pub pos: Vec2<F>,
    /// Position before the last integration. Drives the Verlet integrator.
    pub prev_pos: Vec2<F>,
    pub vel: Vec2<F>,
    /// Force accumulated since the last integration.
    pub force: Vec2<F>,
    /// Force consumed by the last integration.
    pub last_force: Vec2<F>,
    mass: F,
    inv_mass: F,
    fixed: bool,
    /// Marks the main body of an entity. Informational only.
    pub main: bool,
    pub contact: ContactAxes,
    pub radius: F,
    /// Radius in world units, used by collision.
    pub world_radius: F,
    rest_length: F,
    offset: Vec2<F>,
    pub spring_k: F,
    pub spring_damping: F,
    pub damping: F,
    pub force_damping: F,
    pub tether_soft_factor: F,
    pub tether_hard_limit: F,
    children: Vec<ParticleNode<F>>,
    /// Opaque diagnostic tag, reported back through observer contacts.
    pub label: u32,
}

impl<F: Float> ParticleNode<F> {
    /// Free particle at `pos` with default [`NodeParams`].
    ///
    /// Mass must be positive and finite; use [`try_new`](Self::try_new) to
    /// have that checked.
    pub fn new(pos: Vec2<F>, mass: F) -> Self {
        let params = NodeParams::default();
        ParticleNode {
            pos,
            prev_pos: pos,
            vel: Vec2::zero(),
            force: Vec2::zero(),
            last_force: Vec2::zero(),
            mass,
            inv_mass: inverse(mass),
            fixed: false,
            main: false,
            contact: ContactAxes::default(),
            radius: params.radius,
            world_radius: F::zero(),
            rest_length: F::zero(),
            offset: Vec2::zero(),
            spring_k: params.spring_k,
            spring_damping: params.spring_damping,
            damping: params.damping,
            force_damping: params.force_damping,
            tether_soft_factor: params.tether_soft_factor,
            tether_hard_limit: params.tether_hard_limit,
            children: Vec::new(),
            label: 0,
        }
    }

    /// Immovable anchor of unit mass. The mass still scales children
    /// created from it.
    pub fn fixed(pos: Vec2<F>) -> Self {
        let mut node = Self::new(pos, F::one());
        node.pin();
        node
    }

    pub fn try_new(pos: Vec2<F>, mass: F) -> Result<Self, PhysicsError> {
        if !(mass.is_finite() && mass > F::zero()) {
            return Err(PhysicsError::InvalidMass);
        }
        Ok(Self::new(pos, mass))
    }

    pub fn with_params(mut self, params: NodeParams<F>) -> Self {
        self.set_params(params);
        self
    }

    pub fn with_label(mut self, label: u32) -> Self {
        self.label = label;
        self
    }

    pub fn with_main(mut self, main: bool) -> Self {
        self.main = main;
        self
    }

    pub fn params(&self) -> NodeParams<F> {
        NodeParams {
            spring_k: self.spring_k,
            spring_damping: self.spring_damping,
            damping: self.damping,
            force_damping: self.force_damping,
            tether_soft_factor: self.tether_soft_factor,
            tether_hard_limit: self.tether_hard_limit,
            radius: self.radius,
        }
    }

    pub fn set_params(&mut self, params: NodeParams<F>) {
        self.spring_k = params.spring_k;
        self.spring_damping = params.spring_damping;
        self.damping = params.damping;
        self.force_damping = params.force_damping;
        self.tether_soft_factor = params.tether_soft_factor;
        self.tether_hard_limit = params.tether_hard_limit;
        self.radius = params.radius;
    }

    pub fn mass(&self) -> F { self.mass }
    pub fn inv_mass(&self) -> F { self.inv_mass }
    pub fn is_fixed(&self) -> bool { self.fixed }
    /// Distance from the parent at creation. Zero for roots.
    pub fn rest_length(&self) -> F { self.rest_length }
    /// Anchor offset from the parent at creation. Zero for roots.
    pub fn offset(&self) -> Vec2<F> { self.offset }
    pub fn children(&self) -> &[ParticleNode<F>] { &self.children }
    pub fn children_mut(&mut self) -> &mut [ParticleNode<F>] { &mut self.children }

    /// Change the mass. Fixed nodes keep a zero inverse mass.
    pub fn set_mass(&mut self, mass: F) {
        self.mass = mass;
        if !self.fixed {
            self.inv_mass = inverse(mass);
        }
    }

    /// Make the node immovable and drop any motion it had.
    pub fn pin(&mut self) {
        self.fixed = true;
        self.inv_mass = F::zero();
        self.vel = Vec2::zero();
        self.force = Vec2::zero();
        self.prev_pos = self.pos;
    }

    pub fn unpin(&mut self, mass: F) {
        self.fixed = false;
        self.mass = mass;
        self.inv_mass = inverse(mass);
    }

    /// Host teleport: place the node at `pos` at rest. Works on fixed
    /// nodes; children are left where they are.
    pub fn move_to(&mut self, pos: Vec2<F>) {
        self.pos = pos;
        self.prev_pos = pos;
        self.vel = Vec2::zero();
    }

    /// Shift this node and its whole subtree by `delta`, keeping velocities.
    pub fn translate(&mut self, delta: Vec2<F>) {
        forest::for_each_mut(core::slice::from_mut(self), |node| {
            node.pos += delta;
            node.prev_pos += delta;
        });
    }

    pub fn clear_contacts(&mut self) {
        self.contact = ContactAxes::default();
    }

    /// Total nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        forest::node_count(core::slice::from_ref(self))
    }

    /// Pre-order iterator over this subtree, `self` first.
    pub fn iter(&self) -> forest::Iter<'_, F> {
        forest::iter(core::slice::from_ref(self))
    }

    /// Add `force` to the accumulator.
    ///
    /// Components along an axis flagged in contact are scaled by
    /// `force_damping` first, so host forces do not push back into a surface
    /// the collision world just resolved.
    pub fn apply_force(&mut self, force: Vec2<F>) {
        if self.inv_mass == F::zero() {
            return;
        }
        let mut f = force;
        if self.contact.x {
            f.x = f.x * self.force_damping;
        }
        if self.contact.y {
            f.y = f.y * self.force_damping;
        }
        self.force += f;
    }

    /// Apply `force` to this node and every descendant, scaled by `decay`
    /// once per level below this one.
    pub fn apply_cascading_force(&mut self, force: Vec2<F>, decay: F) {
        let mut stack: Vec<(&mut ParticleNode<F>, F)> = alloc::vec![(self, F::one())];
        while let Some((node, scale)) = stack.pop() {
            node.apply_force(force * scale);
            let next = scale * decay;
            stack.extend(node.children.iter_mut().map(|c| (c, next)));
        }
    }

    /// Semi-implicit Euler step. Fixed nodes only drop their force.
    pub fn integrate_euler(&mut self, dt: F) {
        self.last_force = self.force;
        if !self.fixed {
            self.vel += self.force * (self.inv_mass * dt);
            self.vel = self.vel * self.damping;
            self.prev_pos = self.pos;
            self.pos += self.vel * dt;
        }
        self.force = Vec2::zero();
    }

    /// Position Verlet step with damped implicit velocity.
    ///
    /// `vel` is refreshed from the displacement so spring damping and
    /// collision response see the motion.
    pub fn integrate_verlet(&mut self, dt: F) {
        self.last_force = self.force;
        if !self.fixed {
            let implicit = self.pos - self.prev_pos;
            let next = self.pos
                + implicit * self.damping
                + self.force * (self.inv_mass * dt * dt);
            self.prev_pos = self.pos;
            self.pos = next;
            if dt > F::zero() {
                self.vel = (self.pos - self.prev_pos) * (F::one() / dt);
            }
        }
        self.force = Vec2::zero();
    }

    /// Clamp speed to `max_speed`. No-op for fixed nodes or a non-positive
    /// cap.
    pub fn clamp_velocity(&mut self, max_speed: F) {
        if self.fixed || max_speed <= F::zero() {
            return;
        }
        let speed_sq = self.vel.length_sq();
        if speed_sq > max_speed * max_speed {
            self.vel = self.vel * (max_speed / speed_sq.sqrt());
        }
    }

    /// Damped Hookean spring between `self` and `child`, toward
    /// `child.rest_length()`, using this node's `spring_k` and
    /// `spring_damping`.
    ///
    /// The child always receives the force. `self` receives the reaction
    /// unless it is fixed.
    pub fn solve_spring_to_child(&mut self, child: &mut ParticleNode<F>, _dt: F) {
        let (dist, normal) =
            (child.pos - self.pos).length_and_direction(F::from_f32(MIN_DISTANCE));
        let stretch = dist - child.rest_length;
        let closing = (child.vel - self.vel).dot(normal);
        let magnitude = -self.spring_k * stretch - self.spring_damping * closing;
        let force = normal * magnitude;

        child.apply_force(force);
        if !self.fixed {
            self.apply_force(-force);
        }
    }

    /// Positional tether pulling `child` toward `self.pos + child.offset()`.
    ///
    /// Past `rest_length * tether_hard_limit` half the overshoot is removed
    /// at once; inside it the child slides by `tether_soft_factor` of the
    /// error. Velocity heading away from the target is dropped and the
    /// Verlet history re-synced, so the correction does not turn into
    /// momentum. Because outward velocity is dropped on every solve, long
    /// chains swing less freely than springs alone would let them. Fixed
    /// children are left alone.
    pub fn solve_memory_tether(&self, child: &mut ParticleNode<F>, dt: F) {
        if child.fixed {
            return;
        }
        let target = self.pos + child.offset;
        let (dist, dir) = (target - child.pos).length_and_direction(F::from_f32(MIN_DISTANCE));
        let rest = child.rest_length;

        let shift = if dist > rest * child.tether_hard_limit {
            (dist - rest) * F::from_f32(HARD_SNAP_FRACTION)
        } else {
            dist * child.tether_soft_factor
        };
        child.pos += dir * shift;

        let toward = child.vel.dot(dir);
        if toward < F::zero() {
            child.vel -= dir * toward;
        }
        child.sync_history(dt);
    }

    /// Spring (and optionally tether) against every direct child, in
    /// construction order.
    pub(crate) fn solve_child_edges(&mut self, dt: F, tethers: bool) {
        let mut children = core::mem::take(&mut self.children);
        for child in children.iter_mut() {
            self.solve_spring_to_child(child, dt);
            if tethers {
                self.solve_memory_tether(child, dt);
            }
        }
        self.children = children;
    }

    /// Attach a child at `self.pos + offset` with mass and radius scaled by
    /// `scale`. Rest length and anchor offset are fixed here for good. The
    /// child inherits this node's spring, damping and tether tuning.
    pub fn create_child(&mut self, offset: Vec2<F>, scale: F) -> &mut ParticleNode<F> {
        let mut child = ParticleNode::new(self.pos + offset, self.mass * scale)
            .with_params(self.params());
        child.radius = self.radius * scale;
        child.world_radius = self.world_radius * scale;
        child.offset = offset;
        child.rest_length = offset.length();

        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// [`create_child`](Self::create_child) with the scale checked.
    pub fn try_create_child(
        &mut self,
        offset: Vec2<F>,
        scale: F,
    ) -> Result<&mut ParticleNode<F>, PhysicsError> {
        if !(scale.is_finite() && scale > F::zero()) {
            return Err(PhysicsError::InvalidScale);
        }
        Ok(self.create_child(offset, scale))
    }

    /// Set `radius = circumference / 2` and `world_radius = radius *
    /// world_scale`, then taper down the subtree by `decay` per level.
    pub fn update_radii(&mut self, circumference: F, world_scale: F, decay: F) {
        let mut stack: Vec<(&mut ParticleNode<F>, F)> = alloc::vec![(self, circumference)];
        while let Some((node, c)) = stack.pop() {
            node.radius = c * F::half();
            node.world_radius = node.radius * world_scale;
            let next = c * decay;
            stack.extend(node.children.iter_mut().map(|child| (child, next)));
        }
    }

    /// Rebuild `prev_pos` from `vel` after a positional correction.
    pub(crate) fn sync_history(&mut self, dt: F) {
        self.prev_pos = self.pos - self.vel * dt;
    }
}

fn inverse<F: Float>(mass: F) -> F {
    if mass.is_near_zero(F::from_f32(1e-10)) {
        F::zero()
    } else {
        F::one() / mass
    }
}
