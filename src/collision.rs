//! Circle-versus-tile-grid contact resolution.
//!
//! Each particle is tested against the solid tiles in a 3-wide band of
//! columns around it. Rows are picked from the direction of travel, so a
//! particle leaving a floor is not re-flagged as landing on it. Overlaps
//! are resolved one tile at a time along the axis of least penetration.
//!
//! Sequential per-tile resolution is an approximation: at concave corners
//! a later tile can undo part of an earlier correction. The escape pass
//! covers the common case of a snap landing inside a neighbouring solid
//! cell; it is not a simultaneous-contact solver.

use crate::config::WorldConfig;
use crate::float::Float;
use crate::forest;
use crate::observer::{Axis, Contact, NoOpStepObserver, StepObserver};
use crate::particle::ParticleNode;
use crate::tile::TileAccessor;
use crate::vec::Vec2;

/// Gap left between a snapped particle and the tile face.
pub const SNAP_MARGIN: f32 = 1e-3;
/// Distance moved per escape iteration.
pub const ESCAPE_STEP: f32 = 1e-3;
/// Upper bound on escape nudges per resolved tile.
pub const ESCAPE_ITERATIONS: usize = 4;

/// Resolves particles against an injected tile map.
///
/// Without a tile accessor the world is open and every resolve is a no-op.
#[derive(Clone, Copy)]
pub struct CollisionWorld<'w, F: Float> {
    tiles: Option<&'w dyn TileAccessor>,
    config: WorldConfig<F>,
}

impl<'w, F: Float> CollisionWorld<'w, F> {
    pub fn new(tiles: &'w dyn TileAccessor, config: WorldConfig<F>) -> Self {
        CollisionWorld { tiles: Some(tiles), config }
    }

    /// World with no tiles at all.
    pub fn open(config: WorldConfig<F>) -> Self {
        CollisionWorld { tiles: None, config }
    }

    pub fn config(&self) -> &WorldConfig<F> {
        &self.config
    }

    pub fn has_tiles(&self) -> bool {
        self.tiles.is_some()
    }

    pub fn resolve(&self, particle: &mut ParticleNode<F>, dt: F) {
        self.resolve_with(particle, dt, &mut NoOpStepObserver);
    }

    /// Resolve one particle, reporting contacts to `observer`. Fixed
    /// particles are skipped.
    pub fn resolve_with<O>(&self, particle: &mut ParticleNode<F>, dt: F, observer: &mut O)
    where
        O: StepObserver<F> + ?Sized,
    {
        let Some(tiles) = self.tiles else {
            return;
        };
        if particle.is_fixed() {
            return;
        }

        let radius = particle.world_radius;
        let col = particle.pos.x.cell();
        let row = particle.pos.y.cell();
        // upward travel or force takes precedence over downward
        let rows = if rising(particle) {
            row.saturating_sub(1)..=row
        } else if falling(particle) {
            row..=row.saturating_add(1)
        } else {
            row.saturating_sub(1)..=row.saturating_add(1)
        };

        for tile_row in rows {
            for tile_col in col.saturating_sub(1)..=col.saturating_add(1) {
                if tiles.is_solid(tile_col, tile_row) {
                    self.resolve_tile(tiles, particle, (tile_col, tile_row), radius, dt, &mut *observer);
                }
            }
        }
    }

    /// Resolve every node of every tree in pre-order.
    pub fn resolve_forest<O>(&self, roots: &mut [ParticleNode<F>], dt: F, observer: &mut O)
    where
        O: StepObserver<F> + ?Sized,
    {
        if self.tiles.is_none() {
            return;
        }
        forest::for_each_mut(roots, |p| self.resolve_with(p, dt, &mut *observer));
    }

    fn resolve_tile<O>(
        &self,
        tiles: &dyn TileAccessor,
        p: &mut ParticleNode<F>,
        tile: (i32, i32),
        radius: F,
        dt: F,
        observer: &mut O,
    ) where
        O: StepObserver<F> + ?Sized,
    {
        let half = F::half();
        let left = F::from_i32(tile.0);
        let top = F::from_i32(tile.1);
        let offset = p.pos - Vec2::new(left + half, top + half);
        let reach = half + radius;

        let pen_x = reach - offset.x.abs();
        if pen_x <= F::zero() {
            return;
        }
        let pen_y = reach - offset.y.abs();
        if pen_y <= F::zero() {
            return;
        }

        let margin = F::from_f32(SNAP_MARGIN);
        let (axis, penetration) = if pen_x < pen_y { (Axis::X, pen_x) } else { (Axis::Y, pen_y) };
        let (normal, supporting) = match axis {
            Axis::X => {
                let side = if offset.x < F::zero() { -F::one() } else { F::one() };
                p.pos.x = if side < F::zero() {
                    left - radius - margin
                } else {
                    left + F::one() + radius + margin
                };
                p.contact.x = true;
                (Vec2::new(side, F::zero()), true)
            }
            Axis::Y => {
                let side = if offset.y < F::zero() { -F::one() } else { F::one() };
                p.pos.y = if side < F::zero() {
                    top - radius - margin
                } else {
                    top + F::one() + radius + margin
                };
                // grazing a ceiling on the way up is not support
                let supporting = !rising(p);
                if supporting {
                    p.contact.y = true;
                }
                (Vec2::new(F::zero(), side), supporting)
            }
        };

        let velocity_before = p.vel;
        let approach = p.vel.dot(normal);
        if approach < F::zero() {
            let restitution = self.config.restitution;
            p.vel -= normal * ((F::one() + restitution) * approach);
        }
        let keep = F::one() - self.config.friction;
        match axis {
            Axis::X => p.vel.y = p.vel.y * keep,
            Axis::Y => p.vel.x = p.vel.x * keep,
        }

        let step = normal * F::from_f32(ESCAPE_STEP);
        for i in 0..ESCAPE_ITERATIONS {
            if !tiles.is_solid(p.pos.x.cell(), p.pos.y.cell()) {
                break;
            }
            p.pos += step;
            observer.on_escape_nudge(p.label, i, p.pos);
        }

        p.sync_history(dt);
        observer.on_contact(&Contact {
            label: p.label,
            tile,
            axis,
            penetration,
            normal,
            position: p.pos,
            velocity_before,
            velocity_after: p.vel,
            supporting,
        });
    }
}

/// Moving or pushed toward smaller y.
fn rising<F: Float>(p: &ParticleNode<F>) -> bool {
    p.vel.y < F::zero() || p.last_force.y < F::zero()
}

fn falling<F: Float>(p: &ParticleNode<F>) -> bool {
    p.vel.y > F::zero() || p.last_force.y > F::zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Tile, TileGrid};
    use alloc::vec::Vec;

    fn single_tile(col: i32, row: i32) -> Option<Tile> {
        (col == 5 && row == 5).then_some(Tile::SOLID)
    }

    fn ball(x: f32, y: f32, radius: f32) -> ParticleNode<f32> {
        let mut p = ParticleNode::new(Vec2::new(x, y), 1.0);
        p.world_radius = radius;
        p
    }

    #[derive(Default)]
    struct Recorder {
        contacts: Vec<Contact<f32>>,
        nudges: usize,
    }

    impl StepObserver<f32> for Recorder {
        fn on_contact(&mut self, contact: &Contact<f32>) {
            self.contacts.push(*contact);
        }
        fn on_escape_nudge(&mut self, _label: u32, _iteration: usize, _position: Vec2<f32>) {
            self.nudges += 1;
        }
    }

    #[test]
    fn open_world_is_a_no_op() {
        let world = CollisionWorld::open(WorldConfig::default());
        let mut p = ball(5.5, 5.5, 0.25);
        p.vel = Vec2::new(0.0, 1.0);
        world.resolve(&mut p, 0.016);
        assert_eq!(p.pos, Vec2::new(5.5, 5.5));
        assert_eq!(p.contact, Default::default());
    }

    #[test]
    fn landing_snaps_to_tile_top_and_sets_support() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ball(5.5, 4.8, 0.25);
        p.vel = Vec2::new(0.5, 1.0);
        world.resolve(&mut p, 0.016);

        assert!((p.pos.y - (5.0 - 0.25 - SNAP_MARGIN)).abs() < 1e-6);
        assert!(p.contact.y);
        assert!(!p.contact.x);
        // vy reflected with restitution 0.2, vx keeps 95 %
        assert!((p.vel.y + 0.2).abs() < 1e-6);
        assert!((p.vel.x - 0.475).abs() < 1e-6);
    }

    #[test]
    fn rising_particle_ignores_tile_below() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ball(5.5, 4.9, 0.25);
        p.vel = Vec2::new(0.0, -1.0);
        world.resolve(&mut p, 0.016);
        assert!(!p.contact.y);
        assert_eq!(p.pos, Vec2::new(5.5, 4.9));
    }

    #[test]
    fn ceiling_contact_is_not_support() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ball(5.5, 6.2, 0.25);
        p.vel = Vec2::new(0.0, -1.0);
        world.resolve(&mut p, 0.016);

        assert!((p.pos.y - (6.0 + 0.25 + SNAP_MARGIN)).abs() < 1e-6);
        assert!(!p.contact.y);
        assert!((p.vel.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn side_wall_sets_x_contact_and_reflects() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ball(4.8, 5.5, 0.25);
        p.vel = Vec2::new(1.0, 0.0);
        world.resolve(&mut p, 0.016);

        assert!((p.pos.x - (5.0 - 0.25 - SNAP_MARGIN)).abs() < 1e-6);
        assert!(p.contact.x);
        assert!((p.vel.x + 0.2).abs() < 1e-6);
    }

    #[test]
    fn separating_velocity_is_not_reflected() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ball(4.8, 5.5, 0.25);
        p.vel = Vec2::new(-1.0, 0.0);
        world.resolve(&mut p, 0.016);
        assert_eq!(p.vel.x, -1.0);
    }

    #[test]
    fn escape_pass_pushes_out_of_stacked_tiles() {
        let grid = TileGrid::from_rows(&[
            "......", "......", "......", "......", ".....#", ".....#",
        ]);
        let world = CollisionWorld::new(&grid, WorldConfig::default());
        let mut p = ball(5.5, 5.45, 0.1);
        let mut recorder = Recorder::default();
        world.resolve_with(&mut p, 0.016, &mut recorder);

        // snapped onto the top face of (5, 5), which sits inside (5, 4)
        assert_eq!(recorder.nudges, ESCAPE_ITERATIONS);
        let snapped = 5.0 - 0.1 - SNAP_MARGIN;
        let expected = snapped - ESCAPE_STEP * ESCAPE_ITERATIONS as f32;
        assert!((p.pos.y - expected).abs() < 1e-5);
        assert_eq!(recorder.contacts.len(), 1);
        assert_eq!(recorder.contacts[0].tile, (5, 5));
        assert_eq!(recorder.contacts[0].axis, Axis::Y);
    }

    #[test]
    fn far_off_grid_coordinates_do_not_overflow() {
        let open = |_: i32, _: i32| -> Option<Tile> { None };
        let solid = |_: i32, _: i32| Some(Tile::SOLID);
        for (x, y) in [(5.5, -1e10), (1e10, 5.5), (-1e12, 1e12)] {
            let mut p = ball(x, y, 0.25);
            p.vel = Vec2::new(0.0, 1.0);
            CollisionWorld::new(&open, WorldConfig::default()).resolve(&mut p, 0.016);
            CollisionWorld::new(&solid, WorldConfig::default()).resolve(&mut p, 0.016);
            assert_eq!(p.pos, Vec2::new(x, y));
        }
    }

    #[test]
    fn fixed_particles_are_not_moved() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ParticleNode::fixed(Vec2::new(5.5, 4.8));
        p.world_radius = 0.25;
        world.resolve(&mut p, 0.016);
        assert_eq!(p.pos, Vec2::new(5.5, 4.8));
        assert!(!p.contact.y);
    }

    #[test]
    fn contact_resyncs_verlet_history() {
        let tiles = single_tile;
        let world = CollisionWorld::new(&tiles, WorldConfig::default());
        let mut p = ball(5.5, 4.8, 0.25);
        p.vel = Vec2::new(0.0, 1.0);
        world.resolve(&mut p, 0.5);
        let implied = (p.pos - p.prev_pos) * 2.0;
        assert!((implied.y - p.vel.y).abs() < 1e-5);
    }
}
