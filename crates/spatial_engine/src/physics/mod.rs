//! Physics module for collision geometry and body descriptions
//!
//! Simulation itself belongs to the host runtime. This module describes what
//! the host needs to simulate: collision shapes generated from reconstructed
//! geometry or primitives, and the body mode/mass/material of each node.

pub mod body;
pub mod collision;

pub use body::{BodyMode, PhysicsBodyComponent, PhysicsMaterial};
pub use collision::{
    CollisionShape,
    CollisionMeshTemplate,
    BoundingSphere,
    Ray,
    RayHit,
    ShapeError,
    Triangle,
};
