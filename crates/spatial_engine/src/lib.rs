//! # Spatial Engine
//!
//! Scene graph, collision geometry and sensor-stream plumbing for
//! mixed-reality scenes built from live scene reconstruction and hand tracking.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed node hierarchy with per-node components
//! - **Collision Geometry**: Static mesh shapes generated from reconstruction anchors
//! - **Sensing Seam**: Async session trait delivering mesh, hand and session events
//! - **Scripted Sessions**: Replay recorded sensor traffic for headless runs and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_engine::prelude::*;
//!
//! # async fn demo(scenario: Scenario) -> Result<(), SessionError> {
//! let session = ScriptedSession::new(scenario, SessionConfig::default());
//! let mut streams = session.run(DataProviders::SCENE_RECONSTRUCTION).await?;
//!
//! let mut scene = SceneGraph::new();
//! let root = scene.create_root("content");
//! if let Some(mut meshes) = streams.mesh_updates.take() {
//!     while let Some(update) = meshes.recv().await {
//!         println!("{:?} {}", update.event, update.anchor.id);
//!     }
//! }
//! # let _ = root;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod physics;
pub mod sensing;
pub mod input;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, InteractionConfig, SessionConfig},
        foundation::math::{Vec3, Mat4, Quat, Transform, PoseRecord},
        scene::{
            SceneGraph, SceneError, Node, NodeId, AABB,
            components::{
                CollisionComponent, InputTargetComponent, InputType, Material, MeshPrimitive,
                ModelComponent, OpacityComponent,
            },
        },
        physics::{
            BodyMode, PhysicsBodyComponent, PhysicsMaterial,
            collision::{CollisionShape, Ray, RayHit, ShapeError},
        },
        sensing::{
            AnchorEvent, AnchorId, AnchorUpdate, AuthorizationStatus, AuthorizationType,
            Chirality, DataProviderState, DataProviders, HandAnchor, HandJoint, HandJointName,
            HandSkeleton, MeshAnchor, MeshGeometry, ProviderError, Scenario, ScriptedSession,
            SensingSession, SessionError, SessionEvent, SessionStreams,
        },
        input::SpatialTap,
    };
}
