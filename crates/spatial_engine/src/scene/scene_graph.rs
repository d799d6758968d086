//! Scene graph and bounding volumes
//!
//! Arena-backed node hierarchy. Handles stay valid until their node is
//! removed; a removed handle never aliases a later node.

use slotmap::SlotMap;
use thiserror::Error;

use crate::foundation::math::{Mat4, Point3, Transform, Vec3};
use crate::physics::collision::{Ray, RayHit};
use super::node::{Node, NodeId};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, point| Self {
            min: bounds.min.inf(&point),
            max: bounds.max.sup(&point),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Bounds of this box after an affine transform
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point(&Point3::from(corner)).coords
        });
        // Eight corners, never empty
        Self::from_points(corners).unwrap_or(*self)
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the ray parameter of the entry point if the ray intersects, None otherwise
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x == 0.0 { f32::INFINITY } else { 1.0 / ray_dir.x },
            if ray_dir.y == 0.0 { f32::INFINITY } else { 1.0 / ray_dir.y },
            if ray_dir.z == 0.0 { f32::INFINITY } else { 1.0 / ray_dir.z },
        );

        let t1 = (self.min.x - ray_origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray_origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray_origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray_origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray_origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray_origin.z) * inv_dir.z;

        // 0 * inf yields NaN on an axis-parallel ray inside the slab; min/max skip NaN
        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live node
    #[error("Node {0:?} not found in scene")]
    NodeNotFound(NodeId),

    /// The node's world transform has no inverse (zero scale somewhere up the chain)
    #[error("Node {0:?} has a singular world transform")]
    SingularTransform(NodeId),
}

/// Arena-backed scene graph
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parentless node
    pub fn create_root(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.nodes.insert(Node::new(name));
        self.roots.push(id);
        id
    }

    /// Insert `node` as the last child of `parent`
    pub fn spawn(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Detach a node from its parent and drop it together with its subtree
    ///
    /// Returns the detached node (its child list still names the dropped children).
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<Node, SceneError> {
        let node = self.nodes.remove(id).ok_or(SceneError::NodeNotFound(id))?;

        match node.parent.and_then(|parent| self.nodes.get_mut(parent)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }

        let mut pending = node.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                pending.extend(removed.children);
            }
        }

        Ok(node)
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node
    pub fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Mutably borrow a node
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Children of a node
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        self.get(id).map(Node::children)
    }

    /// Total number of live nodes, roots included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every live node
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Set the transform relative to the parent
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.get_mut(id)?.transform = transform;
        Ok(())
    }

    /// Place a node so that its world transform equals `world_from_node`
    pub fn set_world_transform(&mut self, id: NodeId, world_from_node: &Mat4) -> Result<(), SceneError> {
        let local = match self.get(id)?.parent {
            Some(parent) => {
                let world_from_parent = self.world_matrix(parent)?;
                let parent_from_world = world_from_parent
                    .try_inverse()
                    .ok_or(SceneError::SingularTransform(parent))?;
                parent_from_world * world_from_node
            }
            None => *world_from_node,
        };
        self.set_transform(id, Transform::from_matrix(&local))
    }

    /// World transform of a node as a matrix
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut node = self.get(id)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
            matrix = node.transform.to_matrix() * matrix;
        }
        Ok(matrix)
    }

    /// World-space position of a node origin
    pub fn world_position(&self, id: NodeId) -> Result<Vec3, SceneError> {
        self.world_matrix(id)
            .map(|matrix| matrix.transform_point(&Point3::origin()).coords)
    }

    /// Convert a world-space point into the local space of `id`
    pub fn convert_to_local(&self, id: NodeId, world_point: Vec3) -> Result<Vec3, SceneError> {
        let world_from_node = self.world_matrix(id)?;
        let node_from_world = world_from_node
            .try_inverse()
            .ok_or(SceneError::SingularTransform(id))?;
        Ok(node_from_world.transform_point(&Point3::from(world_point)).coords)
    }

    /// World-space bounds of a node's collision shapes
    pub fn world_bounds(&self, id: NodeId) -> Result<Option<AABB>, SceneError> {
        let node = self.get(id)?;
        let Some(collision) = &node.collision else {
            return Ok(None);
        };
        let world_from_node = self.world_matrix(id)?;
        let corners = collision
            .shapes
            .iter()
            .map(|shape| shape.world_bounds(&world_from_node))
            .flat_map(|bounds| [bounds.min, bounds.max]);
        Ok(AABB::from_points(corners))
    }

    /// Nearest collision hit along `ray` among nodes accepted by `filter`
    pub fn raycast(&self, ray: &Ray, filter: impl Fn(&Node) -> bool) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;

        for (id, node) in &self.nodes {
            let Some(collision) = &node.collision else { continue };
            if !filter(node) {
                continue;
            }
            let Ok(world_from_node) = self.world_matrix(id) else { continue };

            for shape in &collision.shapes {
                if let Some(hit) = shape.intersect_ray(&world_from_node, ray) {
                    if best.map_or(true, |current| hit.distance < current.distance) {
                        best = Some(RayHit {
                            node: id,
                            distance: hit.distance,
                            point: hit.point,
                            normal: hit.normal,
                        });
                    }
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::CollisionShape;
    use crate::scene::components::CollisionComponent;
    use approx::assert_relative_eq;

    fn cube_node(name: &str, position: Vec3) -> Node {
        Node::new(name)
            .with_transform(Transform::from_position(position))
            .with_collision(CollisionComponent::new(CollisionShape::cube(1.0), false))
    }

    #[test]
    fn test_aabb_from_points() {
        let bounds = AABB::from_points([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 0.5),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(AABB::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_spawn_and_remove_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        let parent = scene.spawn(root, Node::new("parent")).unwrap();
        let child = scene.spawn(parent, Node::new("child")).unwrap();
        assert_eq!(scene.len(), 3);

        let removed = scene.remove_from_parent(parent).unwrap();
        assert_eq!(removed.name, "parent");
        assert!(!scene.contains(parent));
        assert!(!scene.contains(child));
        assert!(scene.children(root).unwrap().is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_remove_unknown_node_fails() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        let node = scene.spawn(root, Node::new("gone")).unwrap();
        scene.remove_from_parent(node).unwrap();

        assert_eq!(scene.remove_from_parent(node).unwrap_err(), SceneError::NodeNotFound(node));
    }

    #[test]
    fn test_world_transform_composes_parents() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        scene.set_transform(root, Transform::from_position(Vec3::new(0.0, 1.0, 0.0))).unwrap();
        let child = scene
            .spawn(root, Node::new("child").with_transform(Transform::from_position(Vec3::new(2.0, 0.0, 0.0))))
            .unwrap();

        assert_relative_eq!(scene.world_position(child).unwrap(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_set_world_transform_under_offset_parent() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        scene.set_transform(root, Transform::from_position(Vec3::new(0.0, 1.0, 0.0))).unwrap();
        let child = scene.spawn(root, Node::new("child")).unwrap();

        let target = Transform::from_position(Vec3::new(3.0, 3.0, 3.0)).to_matrix();
        scene.set_world_transform(child, &target).unwrap();

        assert_relative_eq!(scene.world_position(child).unwrap(), Vec3::new(3.0, 3.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(scene.get(child).unwrap().transform.position, Vec3::new(3.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_raycast_returns_nearest_hit() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        let near = scene.spawn(root, cube_node("near", Vec3::new(0.0, 0.0, -3.0))).unwrap();
        scene.spawn(root, cube_node("far", Vec3::new(0.0, 0.0, -6.0))).unwrap();

        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.raycast(&ray, |_| true).unwrap();

        assert_eq!(hit.node, near);
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_raycast_respects_filter() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        scene.spawn(root, cube_node("near", Vec3::new(0.0, 0.0, -3.0))).unwrap();
        let far = scene.spawn(root, cube_node("far", Vec3::new(0.0, 0.0, -6.0))).unwrap();

        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.raycast(&ray, |node| node.name == "far").unwrap();
        assert_eq!(hit.node, far);
    }

    #[test]
    fn test_world_bounds_cover_collision_shapes() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        let cube = scene.spawn(root, cube_node("cube", Vec3::new(1.0, 0.0, 0.0))).unwrap();

        let bounds = scene.world_bounds(cube).unwrap().unwrap();
        assert_relative_eq!(bounds.min, Vec3::new(0.5, -0.5, -0.5), epsilon = 1e-6);
        assert_relative_eq!(bounds.max, Vec3::new(1.5, 0.5, 0.5), epsilon = 1e-6);
        assert_eq!(scene.world_bounds(root).unwrap(), None);
    }

    #[test]
    fn test_zero_scale_parent_is_rejected() {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("root");
        let mut flattened = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
        flattened.scale = Vec3::zeros();
        scene.set_transform(root, flattened).unwrap();
        let child = scene.spawn(root, Node::new("child")).unwrap();

        let target = Transform::from_position(Vec3::new(3.0, 3.0, 3.0)).to_matrix();
        assert_eq!(
            scene.set_world_transform(child, &target).unwrap_err(),
            SceneError::SingularTransform(root)
        );
        assert_eq!(
            scene.convert_to_local(root, Vec3::new(1.0, 1.0, 1.0)).unwrap_err(),
            SceneError::SingularTransform(root)
        );
        assert_eq!(scene.get(child).unwrap().transform, Transform::default());
    }
}
