//! Periodic boundary condition generation for 2D representative volume
//! elements.
//!
//! Boundary nodes of a meshed rectangular cell are paired across opposite
//! edges and tied by linear constraint equations; three corners receive the
//! boundary conditions that remove rigid body motion.

pub mod boundary;
pub mod collector;
pub mod constraint_system;
pub mod datatypes;
pub mod emitter;
pub mod error;
pub mod generator;
pub mod input;
pub mod matcher;
pub mod mesher;
pub mod post_processor;
