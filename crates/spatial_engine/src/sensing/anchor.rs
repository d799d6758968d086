//! Anchors and anchor updates

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foundation::math::{Mat4, Vec3};
use crate::physics::collision::{CollisionShape, ShapeError};

/// Opaque identifier the sensing runtime stamps on an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorId(Uuid);

impl AnchorId {
    /// Fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier from raw bits, for deterministic fixtures
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AnchorId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What happened to an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorEvent {
    /// First sighting
    Added,
    /// Pose or geometry changed
    Updated,
    /// No longer tracked
    Removed,
}

/// Tagged anchor event
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorUpdate<A> {
    /// Event tag
    pub event: AnchorEvent,
    /// Anchor state at the time of the event
    pub anchor: A,
}

impl<A> AnchorUpdate<A> {
    /// Create an update
    pub const fn new(event: AnchorEvent, anchor: A) -> Self {
        Self { event, anchor }
    }
}

/// Triangle mesh of a reconstructed surface fragment, in anchor space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Triangles as vertex index triples
    pub faces: Vec<[u32; 3]>,
}

impl MeshGeometry {
    /// Create geometry
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Generate a static collision shape from this geometry
    pub fn to_static_shape(&self) -> Result<CollisionShape, ShapeError> {
        CollisionShape::static_mesh(&self.vertices, &self.faces)
    }
}

/// Reconstructed surface fragment
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAnchor {
    /// Anchor identifier
    pub id: AnchorId,
    /// Pose of the anchor in the session origin
    pub origin_from_anchor: Mat4,
    /// Surface geometry in anchor space
    pub geometry: MeshGeometry,
}

impl MeshAnchor {
    /// Create a mesh anchor
    pub const fn new(id: AnchorId, origin_from_anchor: Mat4, geometry: MeshGeometry) -> Self {
        Self { id, origin_from_anchor, geometry }
    }
}
