//! High-level collision shape abstractions
//!
//! Shapes are stored in model space. Tests against them move the query into
//! model space using the owning node's world transform.

use std::sync::Arc;

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::scene::AABB;
use super::mesh::{CollisionMeshTemplate, ShapeError};
use super::primitives::{BoundingSphere, Ray};

/// Collision shape types (stored in MODEL SPACE)
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// A sphere centered on the node origin
    Sphere {
        /// Radius in meters
        radius: f32,
    },
    /// A box centered on the node origin
    Box {
        /// Half of the edge length along each axis
        half_extents: Vec3,
    },
    /// A static triangle mesh, shared between the collision and physics components
    Mesh(Arc<CollisionMeshTemplate>),
}

/// World-space result of a ray test against a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersection {
    /// Distance along the (normalized) ray
    pub distance: f32,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal in world space
    pub normal: Vec3,
}

impl CollisionShape {
    /// Creates a spherical collision shape with given radius
    pub const fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Creates a cube with the given edge length
    pub fn cube(size: f32) -> Self {
        Self::boxed(Vec3::new(size, size, size))
    }

    /// Creates a box with the given edge lengths
    pub fn boxed(size: Vec3) -> Self {
        Self::Box { half_extents: size * 0.5 }
    }

    /// Generates a static mesh shape from MODEL SPACE reconstruction geometry
    pub fn static_mesh(vertices: &[Vec3], faces: &[[u32; 3]]) -> Result<Self, ShapeError> {
        CollisionMeshTemplate::from_geometry(vertices, faces).map(|template| Self::Mesh(Arc::new(template)))
    }

    /// Whether this shape can only back a static body
    pub const fn is_static_only(&self) -> bool {
        matches!(self, Self::Mesh(_))
    }

    /// Bounds in model space
    pub fn local_bounds(&self) -> AABB {
        match self {
            Self::Sphere { radius } => AABB::from_center_extents(Vec3::zeros(), Vec3::new(*radius, *radius, *radius)),
            Self::Box { half_extents } => AABB::from_center_extents(Vec3::zeros(), *half_extents),
            Self::Mesh(template) => template.local_bounds,
        }
    }

    /// Bounds in world space for a node placed at `world_from_local`
    pub fn world_bounds(&self, world_from_local: &Mat4) -> AABB {
        self.local_bounds().transformed(world_from_local)
    }

    /// Test a world-space ray against this shape placed at `world_from_local`
    pub fn intersect_ray(&self, world_from_local: &Mat4, ray: &Ray) -> Option<RayIntersection> {
        let local_from_world = world_from_local.try_inverse()?;
        let local_ray = Ray::from_raw(
            local_from_world.transform_point(&Point3::from(ray.origin)).coords,
            local_from_world.transform_vector(&ray.direction),
        );

        let (t, local_normal) = match self {
            Self::Sphere { radius } => {
                let sphere = BoundingSphere::new(Vec3::zeros(), *radius);
                sphere.intersect_ray(&local_ray).map(|(t, _, normal)| (t, normal))?
            }
            Self::Box { half_extents } => {
                let bounds = AABB::from_center_extents(Vec3::zeros(), *half_extents);
                let t = bounds.intersect_ray(local_ray.origin, local_ray.direction)?;
                (t, box_face_normal(local_ray.point_at(t), *half_extents))
            }
            Self::Mesh(template) => template.intersect_ray(&local_ray).map(|(t, _, normal)| (t, normal))?,
        };

        let scale = ray.direction.magnitude();
        Some(RayIntersection {
            distance: t * scale,
            point: ray.point_at(t),
            normal: world_from_local.transform_vector(&local_normal).normalize(),
        })
    }
}

/// Outward normal of the box face closest to `point`
fn box_face_normal(point: Vec3, half_extents: Vec3) -> Vec3 {
    let relative = point.component_div(&half_extents);
    let axis = relative.iamax();
    let mut normal = Vec3::zeros();
    normal[axis] = relative[axis].signum();
    normal
}
