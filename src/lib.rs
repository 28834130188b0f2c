//! Particle-tree spring physics with tile-grid collision for 2D games.
//!
//! `frond` simulates hierarchies of point masses joined by damped springs:
//! tentacles, hair, vines, jelly limbs. Every tree hangs off a root
//! [`ParticleNode`]; each child remembers the offset it was created at and is
//! pulled back toward it by a spring plus an optional "memory tether". A
//! [`ConstraintSolver`] advances a whole forest per tick and can hand each
//! particle to a [`CollisionWorld`] that pushes it out of solid tiles.
//!
//! # Features
//!
//! - **Owned trees**: children live inside their parent, traversal is iterative
//! - **Two integrators**: semi-implicit Euler with speed clamp, or position Verlet
//! - **Memory tethers**: soft slide plus hard snap keep limbs near their rest pose
//! - **Tile collision**: minimum-penetration push-out with restitution and friction
//! - **Observable**: monitor phases and contacts via the `StepObserver` trait
//! - **`no_std` compatible**: works in embedded and WASM environments
//!
//! Coordinates are y-down: positive y is "down" and gravity is usually `(0, g)`.
//!
//! ```
//! use frond::{ConstraintSolver, ParticleNode, SolverConfig, Vec2};
//!
//! let mut root = ParticleNode::fixed(Vec2::new(0.0_f32, 0.0));
//! root.create_child(Vec2::new(0.0, -1.0), 0.8);
//!
//! let solver = ConstraintSolver::new(SolverConfig::new().with_gravity(Vec2::new(0.0, 0.15)));
//! let mut forest = [root];
//! for _ in 0..60 {
//!     solver.step(0.016, &mut forest);
//! }
//! assert_eq!(solver.particle_count(&forest), 2);
//! assert_eq!(forest[0].pos, Vec2::new(0.0, 0.0));
//! ```

#![no_std]

extern crate alloc;

pub mod collision;
pub mod config;
pub mod error;
pub mod float;
pub mod forest;
pub mod observer;
pub mod particle;
pub mod solver;
pub mod tile;
pub mod vec;

// Re-export primary API
pub use collision::CollisionWorld;
pub use config::{Integrator, NodeParams, SolverConfig, WorldConfig};
pub use error::PhysicsError;
pub use float::Float;
#[cfg(feature = "tracing")]
pub use observer::TracingObserver;
pub use observer::{Axis, Contact, NoOpStepObserver, StepObserver};
pub use particle::{ContactAxes, ParticleNode};
pub use solver::ConstraintSolver;
pub use tile::{Tile, TileAccessor, TileGrid};
pub use vec::Vec2;
