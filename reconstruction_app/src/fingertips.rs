//! Fingertip markers
//!
//! Each hand gets one invisible kinematic sphere that follows the tip of its
//! index finger, so the fingertip can push spawned cubes around.

use std::collections::BTreeMap;

use spatial_engine::config::InteractionConfig;
use spatial_engine::physics::{CollisionShape, PhysicsBodyComponent};
use spatial_engine::scene::components::{
    colors, CollisionComponent, Material, MeshPrimitive, ModelComponent,
};
use spatial_engine::scene::{Node, NodeId, SceneError, SceneGraph};
use spatial_engine::sensing::{AnchorUpdate, Chirality, HandAnchor, HandJointName};

/// Marker nodes keyed by hand; created once and never re-keyed
#[derive(Debug)]
pub struct FingertipTracker {
    markers: BTreeMap<Chirality, NodeId>,
}

impl FingertipTracker {
    /// Create one marker per hand under `root`
    pub fn new(scene: &mut SceneGraph, root: NodeId, config: &InteractionConfig) -> Result<Self, SceneError> {
        let mut markers = BTreeMap::new();
        for chirality in Chirality::ALL {
            let marker = scene.spawn(root, marker_node(chirality, config.fingertip_radius))?;
            markers.insert(chirality, marker);
        }
        Ok(Self { markers })
    }

    /// Move the marker of the updated hand onto its index fingertip
    ///
    /// Returns the marker that moved, or `None` when the hand, its skeleton
    /// or the fingertip joint is not tracked.
    pub fn apply(
        &self,
        scene: &mut SceneGraph,
        update: &AnchorUpdate<HandAnchor>,
    ) -> Result<Option<NodeId>, SceneError> {
        let hand = &update.anchor;
        let Some(origin_from_tip) = hand.origin_from_joint(HandJointName::IndexFingerTip) else {
            return Ok(None);
        };
        let Some(&marker) = self.markers.get(&hand.chirality) else {
            return Ok(None);
        };

        scene.set_world_transform(marker, &origin_from_tip)?;
        Ok(Some(marker))
    }

    /// Marker node of a hand
    pub fn marker(&self, chirality: Chirality) -> Option<NodeId> {
        self.markers.get(&chirality).copied()
    }

    /// Both markers, left first
    pub fn markers(&self) -> impl Iterator<Item = (Chirality, NodeId)> + '_ {
        self.markers.iter().map(|(chirality, node)| (*chirality, *node))
    }
}

fn marker_node(chirality: Chirality, radius: f32) -> Node {
    Node::new(format!("fingertip-{chirality:?}").to_lowercase())
        .with_model(ModelComponent {
            mesh: MeshPrimitive::Sphere { radius },
            material: Material::Unlit { color: colors::CYAN },
        })
        .with_collision(CollisionComponent::new(CollisionShape::sphere(radius), false))
        .with_physics_body(PhysicsBodyComponent::kinematic(0.0))
        .with_opacity(0.0)
}
