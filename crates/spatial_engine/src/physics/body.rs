//! Physics body descriptions
//!
//! A node with a [`PhysicsBodyComponent`] participates in the host's
//! simulation using the shapes of its collision component.

use serde::{Deserialize, Serialize};

/// How the simulation moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyMode {
    /// Never moves; other bodies collide with it (reconstructed surfaces)
    Static,
    /// Moved by the application, pushes dynamic bodies (fingertips)
    Kinematic,
    /// Moved by the simulation (spawned cubes)
    Dynamic,
}

/// Surface response parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Friction coefficient
    pub friction: f32,
    /// Restitution (0 = no bounce)
    pub restitution: f32,
}

impl PhysicsMaterial {
    /// Create a material
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self { friction, restitution }
    }
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self::new(0.8, 0.0)
    }
}

/// Physics body attached to a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBodyComponent {
    /// Simulation mode
    pub mode: BodyMode,
    /// Mass in kilograms (ignored by static bodies)
    pub mass: f32,
    /// Surface material
    pub material: PhysicsMaterial,
}

impl PhysicsBodyComponent {
    /// Immovable body for reconstructed geometry
    pub fn static_body() -> Self {
        Self { mode: BodyMode::Static, mass: 0.0, material: PhysicsMaterial::default() }
    }

    /// Application-driven body with the given mass
    pub fn kinematic(mass: f32) -> Self {
        Self { mode: BodyMode::Kinematic, mass, material: PhysicsMaterial::default() }
    }

    /// Simulated body
    pub const fn dynamic(mass: f32, material: PhysicsMaterial) -> Self {
        Self { mode: BodyMode::Dynamic, mass, material }
    }
}
