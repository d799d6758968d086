//! Sensor seam
//!
//! Types describing the data a mixed-reality sensing runtime produces, and the
//! [`SensingSession`] trait through which the application subscribes to it.
//!
//! Three asynchronous sequences come out of a running session:
//!
//! - mesh anchor updates (scene reconstruction)
//! - hand anchor updates (hand tracking)
//! - session events (authorization and data-provider state)
//!
//! Each is delivered over a bounded `tokio` channel. [`ScriptedSession`]
//! replays a recorded [`Scenario`] through the same channels.

mod anchor;
mod hand;
mod session;
mod scripted;

pub use anchor::{AnchorEvent, AnchorId, AnchorUpdate, MeshAnchor, MeshGeometry};
pub use hand::{Chirality, HandAnchor, HandJoint, HandJointName, HandSkeleton};
pub use session::{
    AuthorizationStatus, AuthorizationType, DataProviderState, DataProviders, ProviderError,
    SensingSession, SessionError, SessionEvent, SessionStreams,
};
pub use scripted::{
    AuthorizationRecord, HandUpdateRecord, JointRecord, MeshUpdateRecord, Scenario, ScriptedSession,
    ScriptedStep,
};
