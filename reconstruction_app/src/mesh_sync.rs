//! Mesh anchor synchronizer
//!
//! Mirrors the scene-reconstruction event stream into the scene graph: one
//! static collider node per mesh anchor, keyed by anchor id.

use std::collections::HashMap;

use spatial_engine::physics::{PhysicsBodyComponent, ShapeError};
use spatial_engine::scene::components::{CollisionComponent, InputTargetComponent};
use spatial_engine::scene::{Node, NodeId, SceneError, SceneGraph};
use spatial_engine::sensing::{AnchorEvent, AnchorId, AnchorUpdate, MeshAnchor};

/// What applying one update did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A node was created and registered
    Inserted(NodeId),
    /// A repeated add replaced the registered node
    Replaced {
        /// Node that was dropped
        previous: NodeId,
        /// Node now registered
        current: NodeId,
    },
    /// The registered node received new geometry and pose
    Updated(NodeId),
    /// The node was detached and unregistered
    Removed(NodeId),
    /// Update or removal for an unknown anchor
    Ignored,
    /// Geometry could not become a collision shape; update dropped
    SkippedInvalidGeometry(ShapeError),
}

/// Lookup table from mesh anchor to collider node
#[derive(Debug)]
pub struct MeshAnchorSynchronizer {
    root: NodeId,
    nodes: HashMap<AnchorId, NodeId>,
}

impl MeshAnchorSynchronizer {
    /// Synchronizer parenting its nodes under `root`
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            nodes: HashMap::new(),
        }
    }

    /// Apply one update from the reconstruction stream
    pub fn apply(
        &mut self,
        scene: &mut SceneGraph,
        update: &AnchorUpdate<MeshAnchor>,
    ) -> Result<SyncOutcome, SceneError> {
        let anchor = &update.anchor;
        match update.event {
            AnchorEvent::Added => self.insert(scene, anchor),
            AnchorEvent::Updated => self.update(scene, anchor),
            AnchorEvent::Removed => Ok(self.remove(scene, anchor.id)),
        }
    }

    fn insert(&mut self, scene: &mut SceneGraph, anchor: &MeshAnchor) -> Result<SyncOutcome, SceneError> {
        let shape = match anchor.geometry.to_static_shape() {
            Ok(shape) => shape,
            Err(error) => {
                log::debug!("Skipping added mesh anchor {}: {}", anchor.id, error);
                return Ok(SyncOutcome::SkippedInvalidGeometry(error));
            }
        };

        let node = Node::new(format!("mesh-{}", anchor.id))
            .with_collision(CollisionComponent::new(shape, true))
            .with_input_target(InputTargetComponent::all())
            .with_physics_body(PhysicsBodyComponent::static_body());

        let current = scene.spawn(self.root, node)?;
        scene.set_world_transform(current, &anchor.origin_from_anchor)?;

        match self.nodes.insert(anchor.id, current) {
            Some(previous) => {
                detach(scene, previous);
                log::debug!("Mesh anchor {} re-added, replaced node {:?}", anchor.id, previous);
                Ok(SyncOutcome::Replaced { previous, current })
            }
            None => {
                log::debug!("Mesh anchor {} added as {:?}", anchor.id, current);
                Ok(SyncOutcome::Inserted(current))
            }
        }
    }

    fn update(&mut self, scene: &mut SceneGraph, anchor: &MeshAnchor) -> Result<SyncOutcome, SceneError> {
        let Some(&node_id) = self.nodes.get(&anchor.id) else {
            // Benign race with removal
            return Ok(SyncOutcome::Ignored);
        };

        let shape = match anchor.geometry.to_static_shape() {
            Ok(shape) => shape,
            Err(error) => {
                log::debug!("Skipping mesh anchor {} update: {}", anchor.id, error);
                return Ok(SyncOutcome::SkippedInvalidGeometry(error));
            }
        };

        let Ok(node) = scene.get_mut(node_id) else {
            log::warn!("Mesh anchor {} lost its node {:?}, unregistering", anchor.id, node_id);
            self.nodes.remove(&anchor.id);
            return Ok(SyncOutcome::Ignored);
        };
        node.collision = Some(CollisionComponent::new(shape, true));
        scene.set_world_transform(node_id, &anchor.origin_from_anchor)?;

        Ok(SyncOutcome::Updated(node_id))
    }

    fn remove(&mut self, scene: &mut SceneGraph, id: AnchorId) -> SyncOutcome {
        match self.nodes.remove(&id) {
            Some(node_id) => {
                detach(scene, node_id);
                log::debug!("Mesh anchor {} removed", id);
                SyncOutcome::Removed(node_id)
            }
            None => SyncOutcome::Ignored,
        }
    }

    /// Node registered for an anchor
    pub fn node_for(&self, id: AnchorId) -> Option<NodeId> {
        self.nodes.get(&id).copied()
    }

    /// Whether an anchor is registered
    pub fn contains(&self, id: AnchorId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Registered anchor ids
    pub fn anchor_ids(&self) -> impl Iterator<Item = AnchorId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of registered anchors
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no anchor is registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Detach every registered node and forget all anchors
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        for (_, node_id) in self.nodes.drain() {
            detach(scene, node_id);
        }
    }
}

fn detach(scene: &mut SceneGraph, node_id: NodeId) {
    if let Err(error) = scene.remove_from_parent(node_id) {
        log::debug!("Mesh node already gone: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use spatial_engine::foundation::math::{PoseRecord, Vec3};
    use spatial_engine::physics::CollisionShape;
    use spatial_engine::sensing::MeshGeometry;

    fn triangle(scale: f32) -> MeshGeometry {
        MeshGeometry::new(
            vec![
                Vec3::new(-scale, 0.0, -scale),
                Vec3::new(scale, 0.0, -scale),
                Vec3::new(0.0, 0.0, scale),
            ],
            vec![[0, 2, 1]],
        )
    }

    fn update(event: AnchorEvent, id: u128, geometry: MeshGeometry) -> AnchorUpdate<MeshAnchor> {
        let pose = PoseRecord::at([0.0, 0.0, -(id as f32)]).to_matrix();
        AnchorUpdate::new(event, MeshAnchor::new(AnchorId::from_u128(id), pose, geometry))
    }

    fn setup() -> (SceneGraph, NodeId, MeshAnchorSynchronizer) {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("content");
        let sync = MeshAnchorSynchronizer::new(root);
        (scene, root, sync)
    }

    #[test]
    fn test_added_creates_static_collider_under_root() {
        let (mut scene, root, mut sync) = setup();

        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(1.0))).unwrap();
        let SyncOutcome::Inserted(node_id) = outcome else {
            panic!("expected insert, got {outcome:?}");
        };

        let node = scene.get(node_id).unwrap();
        assert_eq!(node.parent(), Some(root));
        assert!(node.collision.as_ref().unwrap().is_static);
        assert!(node.input_target.is_some());
        assert_eq!(node.physics_body, Some(PhysicsBodyComponent::static_body()));
        assert_relative_eq!(scene.world_position(node_id).unwrap(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_eq!(sync.node_for(AnchorId::from_u128(1)), Some(node_id));
    }

    #[test]
    fn test_update_for_unknown_anchor_is_noop() {
        let (mut scene, _, mut sync) = setup();
        let nodes_before = scene.len();

        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Updated, 4, triangle(1.0))).unwrap();

        assert_eq!(outcome, SyncOutcome::Ignored);
        assert!(sync.is_empty());
        assert_eq!(scene.len(), nodes_before);
    }

    #[test]
    fn test_remove_for_unknown_anchor_is_noop() {
        let (mut scene, _, mut sync) = setup();
        sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(1.0))).unwrap();

        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Removed, 2, MeshGeometry::default())).unwrap();

        assert_eq!(outcome, SyncOutcome::Ignored);
        assert_eq!(sync.len(), 1);
    }

    #[test]
    fn test_removed_detaches_node_without_geometry() {
        let (mut scene, root, mut sync) = setup();
        let SyncOutcome::Inserted(node_id) =
            sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(1.0))).unwrap()
        else {
            panic!("expected insert");
        };

        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Removed, 1, MeshGeometry::default())).unwrap();

        assert_eq!(outcome, SyncOutcome::Removed(node_id));
        assert!(!scene.contains(node_id));
        assert!(scene.children(root).unwrap().is_empty());
        assert!(!sync.contains(AnchorId::from_u128(1)));
    }

    #[test]
    fn test_repeated_update_is_idempotent() {
        let (mut scene, _, mut sync) = setup();
        sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(1.0))).unwrap();

        let grown = update(AnchorEvent::Updated, 1, triangle(2.0));
        sync.apply(&mut scene, &grown).unwrap();
        let node_id = sync.node_for(AnchorId::from_u128(1)).unwrap();
        let after_first = scene.get(node_id).unwrap().clone();

        sync.apply(&mut scene, &grown).unwrap();
        let after_second = scene.get(node_id).unwrap();

        let geometry = &grown.anchor.geometry;
        let expected = CollisionComponent::new(
            CollisionShape::static_mesh(&geometry.vertices, &geometry.faces).unwrap(),
            true,
        );
        assert_eq!(after_second.collision.as_ref(), Some(&expected));
        assert_eq!(after_first.collision, after_second.collision);
        assert_eq!(after_first.transform, after_second.transform);
        assert_eq!(sync.len(), 1);
    }

    #[test]
    fn test_invalid_geometry_on_add_is_skipped() {
        let (mut scene, _, mut sync) = setup();

        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Added, 1, MeshGeometry::default())).unwrap();

        assert!(matches!(outcome, SyncOutcome::SkippedInvalidGeometry(_)));
        assert!(sync.is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_invalid_geometry_on_update_keeps_previous_shape() {
        let (mut scene, _, mut sync) = setup();
        sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(1.0))).unwrap();
        let node_id = sync.node_for(AnchorId::from_u128(1)).unwrap();
        let before = scene.get(node_id).unwrap().collision.clone();

        let broken = MeshGeometry::new(vec![Vec3::zeros()], vec![[0, 1, 2]]);
        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Updated, 1, broken)).unwrap();

        assert!(matches!(outcome, SyncOutcome::SkippedInvalidGeometry(ShapeError::IndexOutOfBounds { .. })));
        assert_eq!(scene.get(node_id).unwrap().collision, before);
    }

    #[test]
    fn test_re_added_anchor_replaces_node() {
        let (mut scene, root, mut sync) = setup();
        sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(1.0))).unwrap();

        let outcome = sync.apply(&mut scene, &update(AnchorEvent::Added, 1, triangle(3.0))).unwrap();
        let SyncOutcome::Replaced { previous, current } = outcome else {
            panic!("expected replace, got {outcome:?}");
        };

        assert!(!scene.contains(previous));
        assert!(scene.contains(current));
        assert_eq!(scene.children(root).unwrap(), &[current]);
        assert_eq!(sync.len(), 1);
    }

    #[derive(Debug, Clone, Copy)]
    enum Footprint {
        Triangle(f32),
        Empty,
        OutOfRange,
    }

    impl Footprint {
        fn geometry(self) -> MeshGeometry {
            match self {
                Self::Triangle(scale) => triangle(scale),
                Self::Empty => MeshGeometry::default(),
                Self::OutOfRange => MeshGeometry::new(vec![Vec3::zeros(), Vec3::x()], vec![[0, 1, 5]]),
            }
        }

        const fn is_valid(self) -> bool {
            matches!(self, Self::Triangle(_))
        }
    }

    fn any_event() -> impl Strategy<Value = AnchorEvent> {
        prop_oneof![
            Just(AnchorEvent::Added),
            Just(AnchorEvent::Updated),
            Just(AnchorEvent::Removed),
        ]
    }

    fn any_footprint() -> impl Strategy<Value = Footprint> {
        prop_oneof![
            4 => (0.1f32..5.0).prop_map(Footprint::Triangle),
            1 => Just(Footprint::Empty),
            1 => Just(Footprint::OutOfRange),
        ]
    }

    proptest! {
        #[test]
        fn test_registered_set_tracks_event_history(
            steps in proptest::collection::vec((0u128..16, any_event(), any_footprint()), 0..200)
        ) {
            let (mut scene, root, mut sync) = setup();
            let mut expected: HashSet<AnchorId> = HashSet::new();

            for (id, event, footprint) in steps {
                match event {
                    AnchorEvent::Added if footprint.is_valid() => {
                        expected.insert(AnchorId::from_u128(id));
                    }
                    AnchorEvent::Removed => {
                        expected.remove(&AnchorId::from_u128(id));
                    }
                    _ => {}
                }
                sync.apply(&mut scene, &update(event, id, footprint.geometry())).unwrap();
            }

            let registered: HashSet<AnchorId> = sync.anchor_ids().collect();
            prop_assert_eq!(&registered, &expected);
            prop_assert_eq!(scene.children(root).unwrap().len(), expected.len());
            prop_assert_eq!(scene.len(), expected.len() + 1);
        }
    }

    #[test]
    fn test_clear_detaches_everything() {
        let (mut scene, root, mut sync) = setup();
        for id in 1..=3 {
            sync.apply(&mut scene, &update(AnchorEvent::Added, id, triangle(1.0))).unwrap();
        }

        sync.clear(&mut scene);

        assert!(sync.is_empty());
        assert!(scene.children(root).unwrap().is_empty());
    }
}
