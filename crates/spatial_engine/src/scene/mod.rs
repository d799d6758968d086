//! Scene management system
//!
//! Provides the scene graph the application mirrors sensor data into.
//!
//! ## Architecture
//!
//! ```text
//! Sensor streams (mesh / hands / taps)
//!      ↓
//! Application model (bookkeeping)
//!      ↓
//! Scene graph (nodes + components)
//!      ↓
//! Host runtime (rendering, physics)
//! ```
//!
//! Nodes live in an arena keyed by [`NodeId`]; parent/child links are stored
//! on the nodes themselves. Removing a node removes its whole subtree.

mod scene_graph;
mod node;
pub mod components;

pub use scene_graph::{SceneGraph, SceneError, AABB};
pub use node::{Node, NodeId};
