//! Spatial input gestures

use crate::foundation::math::Vec3;
use crate::physics::collision::RayHit;
use crate::scene::components::InputType;
use crate::scene::NodeId;

/// Tap gesture targeted at a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialTap {
    /// Tap location in global (session) space
    pub location: Vec3,
    /// Node the gesture landed on
    pub target: NodeId,
    /// How the gesture was performed
    pub input: InputType,
}

impl SpatialTap {
    /// Look-and-pinch tap at `location` on `target`
    pub const fn indirect(location: Vec3, target: NodeId) -> Self {
        Self { location, target, input: InputType::INDIRECT }
    }

    /// Tap at the point where a pointing ray met the scene
    pub const fn from_hit(hit: &RayHit) -> Self {
        Self::indirect(hit.point, hit.node)
    }
}
