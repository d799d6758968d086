//! Collision mesh representations
//!
//! Static triangle meshes built from scene-reconstruction geometry. The
//! template is stored in MODEL SPACE (anchor-local coordinates); the owning
//! node's transform places it in the world.

use crate::foundation::math::Vec3;
use crate::scene::AABB;
use super::primitives::{BoundingSphere, Ray, Triangle};
use thiserror::Error;

/// Reasons reconstruction geometry cannot become a collision shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// No vertices or no faces were supplied
    #[error("Mesh geometry is empty ({vertices} vertices, {faces} faces)")]
    EmptyGeometry {
        /// Vertex count
        vertices: usize,
        /// Face count
        faces: usize,
    },

    /// A face references a vertex that does not exist
    #[error("Face {face} references vertex {index} but only {vertex_count} vertices exist")]
    IndexOutOfBounds {
        /// Offending face
        face: usize,
        /// Offending index
        index: u32,
        /// Number of vertices available
        vertex_count: usize,
    },

    /// A vertex contains NaN or infinity
    #[error("Vertex {0} is not finite")]
    NonFiniteVertex(usize),

    /// Every face has zero area
    #[error("Mesh has no non-degenerate faces")]
    Degenerate,
}

/// A collision mesh template stored in MODEL SPACE (local coordinates)
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMeshTemplate {
    /// Triangles in MODEL SPACE (local coordinates, never modified)
    pub local_triangles: Vec<Triangle>,
    /// Local axis-aligned bounds
    pub local_bounds: AABB,
    /// Local bounding sphere enclosing every triangle
    pub local_bounding_sphere: BoundingSphere,
}

impl CollisionMeshTemplate {
    /// Creates a collision mesh template from MODEL SPACE vertices and triangle faces
    ///
    /// Zero-area faces are dropped. Fails when nothing usable remains.
    pub fn from_geometry(vertices: &[Vec3], faces: &[[u32; 3]]) -> Result<Self, ShapeError> {
        if vertices.is_empty() || faces.is_empty() {
            return Err(ShapeError::EmptyGeometry {
                vertices: vertices.len(),
                faces: faces.len(),
            });
        }

        if let Some(index) = vertices.iter().position(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(ShapeError::NonFiniteVertex(index));
        }

        let mut triangles = Vec::with_capacity(faces.len());
        for (face_index, face) in faces.iter().enumerate() {
            let mut corners = [Vec3::zeros(); 3];
            for (corner, &index) in corners.iter_mut().zip(face) {
                *corner = *vertices.get(index as usize).ok_or(ShapeError::IndexOutOfBounds {
                    face: face_index,
                    index,
                    vertex_count: vertices.len(),
                })?;
            }

            let triangle = Triangle::new(corners[0], corners[1], corners[2]);
            if triangle.area() > f32::EPSILON {
                triangles.push(triangle);
            }
        }

        if triangles.is_empty() {
            return Err(ShapeError::Degenerate);
        }

        let local_bounds = AABB::from_points(
            triangles.iter().flat_map(|tri| [tri.v0, tri.v1, tri.v2]),
        )
        .ok_or(ShapeError::Degenerate)?;

        let center = local_bounds.center();
        let radius = triangles
            .iter()
            .flat_map(|tri| [tri.v0, tri.v1, tri.v2])
            .map(|vertex| (vertex - center).magnitude())
            .fold(0.0f32, f32::max);

        Ok(Self {
            local_triangles: triangles,
            local_bounds,
            local_bounding_sphere: BoundingSphere::new(center, radius),
        })
    }

    /// Number of triangles kept
    pub fn triangle_count(&self) -> usize {
        self.local_triangles.len()
    }

    /// Test a MODEL SPACE ray against all triangles
    /// Returns closest hit (t, hit_point, normal) in model space
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        // Slightly inflated so grazing hits on flat patches are not culled
        let bounds = BoundingSphere::new(
            self.local_bounding_sphere.center,
            self.local_bounding_sphere.radius + 1e-4,
        );
        bounds.intersect_ray(ray)?;

        let mut closest_hit: Option<(f32, Vec3, Vec3)> = None;
        for triangle in &self.local_triangles {
            if let Some((t, _u, _v)) = triangle.intersect_ray(ray) {
                if closest_hit.map_or(true, |(best, _, _)| t < best) {
                    closest_hit = Some((t, ray.point_at(t), triangle.normal()));
                }
            }
        }

        closest_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> (Vec<Vec3>, Vec<[u32; 3]>) {
        let vertices = vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 3, 2]];
        (vertices, faces)
    }

    #[test]
    fn test_quad_builds_two_triangles() {
        let (vertices, faces) = quad();
        let template = CollisionMeshTemplate::from_geometry(&vertices, &faces).unwrap();

        assert_eq!(template.triangle_count(), 2);
        assert_relative_eq!(template.local_bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_relative_eq!(template.local_bounds.max, Vec3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(template.local_bounding_sphere.radius, 2.0f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let result = CollisionMeshTemplate::from_geometry(&[], &[]);
        assert_eq!(result, Err(ShapeError::EmptyGeometry { vertices: 0, faces: 0 }));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let (vertices, _) = quad();
        let result = CollisionMeshTemplate::from_geometry(&vertices, &[[0, 1, 7]]);
        assert_eq!(
            result,
            Err(ShapeError::IndexOutOfBounds { face: 0, index: 7, vertex_count: 4 })
        );
    }

    #[test]
    fn test_all_degenerate_faces_rejected() {
        let (vertices, _) = quad();
        let result = CollisionMeshTemplate::from_geometry(&vertices, &[[0, 0, 1], [2, 2, 2]]);
        assert_eq!(result, Err(ShapeError::Degenerate));
    }

    #[test]
    fn test_nan_vertex_rejected() {
        let vertices = vec![Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
        let result = CollisionMeshTemplate::from_geometry(&vertices, &[[0, 1, 2]]);
        assert_eq!(result, Err(ShapeError::NonFiniteVertex(1)));
    }

    #[test]
    fn test_ray_picks_nearest_surface() {
        let (vertices, faces) = quad();
        let template = CollisionMeshTemplate::from_geometry(&vertices, &faces).unwrap();
        let ray = Ray::new(Vec3::new(0.5, 1.0, -0.5), Vec3::new(0.0, -1.0, 0.0));

        let (t, point, _) = template.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 1.0, epsilon = 1e-6);
        assert_relative_eq!(point, Vec3::new(0.5, 0.0, -0.5), epsilon = 1e-6);
    }
}
