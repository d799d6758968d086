//! Collision geometry
//!
//! # Architecture
//!
//! - **Model Space Storage**: Collision shapes stored in local coordinates
//! - **On-Demand Transformation**: Rays are moved into model space during tests
//!   instead of transforming the shape
//!
//! # Module Organization
//!
//! - [`primitives`] - Basic geometric primitives (rays, spheres, triangles)
//! - [`mesh`] - Triangle meshes generated from reconstruction geometry
//! - [`shape`] - Shapes attached to scene nodes

pub mod primitives;
pub mod mesh;
pub mod shape;

pub use primitives::{Ray, RayHit, BoundingSphere, Triangle};
pub use mesh::{CollisionMeshTemplate, ShapeError};
pub use shape::{CollisionShape, RayIntersection};
