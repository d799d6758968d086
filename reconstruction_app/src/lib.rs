//! # Reconstruction App
//!
//! Mixed-reality playground: reconstructed room surfaces become static
//! colliders, each index fingertip carries an invisible kinematic sphere, and
//! tapping a surface drops a pink cube onto it.
//!
//! - [`mesh_sync`] mirrors mesh anchors into collider nodes
//! - [`fingertips`] keeps the fingertip markers on the hands
//! - [`model`] owns the scene and consumes the session streams
//! - [`app`] is the immersive-space toggle and error window
//! - [`demo`] drives all of it headless from a scripted session

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod app;
pub mod config;
pub mod demo;
pub mod fingertips;
pub mod mesh_sync;
pub mod model;

pub use app::{AppError, ErrorWindow, ImmersiveApp, ImmersiveSpaceState};
pub use config::AppConfig;
pub use demo::{run_demo, DemoReport, DemoScript, TapRecord};
pub use model::{ReconstructionModel, SceneSnapshot};
