//! Scene node

use slotmap::new_key_type;

use crate::foundation::math::Transform;
use crate::physics::PhysicsBodyComponent;
use super::components::{
    CollisionComponent, InputTargetComponent, ModelComponent, OpacityComponent,
};

new_key_type! {
    /// Stable handle to a node in a [`super::SceneGraph`]
    pub struct NodeId;
}

/// Scene node with its components
///
/// Build with the `with_*` methods and insert with
/// [`super::SceneGraph::spawn`].
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Debug name
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Visible model
    pub model: Option<ModelComponent>,
    /// Collision shapes
    pub collision: Option<CollisionComponent>,
    /// Physics body
    pub physics_body: Option<PhysicsBodyComponent>,
    /// Gesture target marker
    pub input_target: Option<InputTargetComponent>,
    /// Opacity override
    pub opacity: Option<OpacityComponent>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl Node {
    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a visible model
    pub fn with_model(mut self, model: ModelComponent) -> Self {
        self.model = Some(model);
        self
    }

    /// Attach collision shapes
    pub fn with_collision(mut self, collision: CollisionComponent) -> Self {
        self.collision = Some(collision);
        self
    }

    /// Attach a physics body
    pub fn with_physics_body(mut self, body: PhysicsBodyComponent) -> Self {
        self.physics_body = Some(body);
        self
    }

    /// Mark as gesture target
    pub fn with_input_target(mut self, target: InputTargetComponent) -> Self {
        self.input_target = Some(target);
        self
    }

    /// Set opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(OpacityComponent(opacity));
        self
    }

    /// Parent node, `None` for roots
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
