//! Node components
//!
//! Pure data attached to scene nodes. The host runtime reads these to render
//! and simulate; the application only writes them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::physics::CollisionShape;

/// Linear RGBA color
pub type Color = [f32; 4];

/// Named colors used by the application
pub mod colors {
    use super::Color;

    /// System pink
    pub const PINK: Color = [1.0, 0.176, 0.333, 1.0];
    /// Cyan
    pub const CYAN: Color = [0.0, 1.0, 1.0, 1.0];
}

/// Renderable primitive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MeshPrimitive {
    /// Axis-aligned box
    Box {
        /// Edge length (meters)
        size: f32,
        /// Corner rounding radius (meters)
        corner_radius: f32,
    },
    /// Sphere
    Sphere {
        /// Radius (meters)
        radius: f32,
    },
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Lit material
    Simple {
        /// Base color
        color: Color,
        /// Metallic surface
        is_metallic: bool,
    },
    /// Lighting-independent material
    Unlit {
        /// Flat color
        color: Color,
    },
}

/// Visible model of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelComponent {
    /// Mesh primitive
    pub mesh: MeshPrimitive,
    /// Material
    pub material: Material,
}

/// Collision shapes of a node
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionComponent {
    /// Shapes in node-local space
    pub shapes: Vec<CollisionShape>,
    /// Whether the shapes never move
    pub is_static: bool,
}

impl CollisionComponent {
    /// Single-shape collision component
    pub fn new(shape: CollisionShape, is_static: bool) -> Self {
        Self { shapes: vec![shape], is_static }
    }
}

bitflags! {
    /// Input kinds a node accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputType: u8 {
        /// Touch with a hand
        const DIRECT = 0b01;
        /// Look-and-pinch
        const INDIRECT = 0b10;
        /// Both
        const ALL = Self::DIRECT.bits() | Self::INDIRECT.bits();
    }
}

/// Marks a node as a gesture target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputTargetComponent {
    /// Accepted input kinds
    pub allowed_input_types: InputType,
}

impl InputTargetComponent {
    /// Accepts every input kind
    pub const fn all() -> Self {
        Self { allowed_input_types: InputType::ALL }
    }

    /// Accepts only the given input kinds
    pub const fn only(allowed_input_types: InputType) -> Self {
        Self { allowed_input_types }
    }

    /// Whether this target reacts to `input`
    pub const fn accepts(&self, input: InputType) -> bool {
        self.allowed_input_types.intersects(input)
    }
}

impl Default for InputTargetComponent {
    fn default() -> Self {
        Self::all()
    }
}

/// Node opacity (0 = invisible, 1 = opaque)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityComponent(pub f32);
