//! Sensing session trait, session events and errors

use std::collections::HashMap;

use async_trait::async_trait;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::anchor::{AnchorUpdate, MeshAnchor};
use super::hand::HandAnchor;

bitflags! {
    /// Data providers a session can run
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DataProviders: u8 {
        /// Scene reconstruction (mesh anchors)
        const SCENE_RECONSTRUCTION = 0b01;
        /// Hand tracking (hand anchors)
        const HAND_TRACKING = 0b10;
    }
}

impl DataProviders {
    /// Authorizations the user must grant before these providers can run
    pub fn required_authorizations(self) -> Vec<AuthorizationType> {
        let mut types = Vec::with_capacity(2);
        if self.contains(Self::HAND_TRACKING) {
            types.push(AuthorizationType::HandTracking);
        }
        if self.contains(Self::SCENE_RECONSTRUCTION) {
            types.push(AuthorizationType::WorldSensing);
        }
        types
    }
}

/// Kinds of user authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationType {
    /// Hand skeleton data
    HandTracking,
    /// Surroundings (scene reconstruction)
    WorldSensing,
}

/// Authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    #[default]
    NotDetermined,
    /// Granted
    Allowed,
    /// Refused or revoked
    Denied,
}

/// Lifecycle state of a data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataProviderState {
    /// Created, not running
    Initialized,
    /// Delivering updates
    Running,
    /// Temporarily suspended
    Paused,
    /// Finished, will not deliver again
    Stopped,
}

/// Failure reported by a data provider
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    /// Runtime-supplied description
    pub message: String,
}

impl ProviderError {
    /// Create a provider error
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Session-level event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The user changed an authorization
    AuthorizationChanged {
        /// Which authorization
        kind: AuthorizationType,
        /// New status
        status: AuthorizationStatus,
    },
    /// Data providers changed state
    DataProviderStateChanged {
        /// Affected providers
        providers: DataProviders,
        /// New state
        state: DataProviderState,
        /// Failure that caused the change, if any
        #[serde(default)]
        error: Option<ProviderError>,
    },
}

/// Errors starting or driving a session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The device cannot run these providers
    #[error("Data providers not supported on this device: {0:?}")]
    Unsupported(DataProviders),

    /// The user has not granted a required authorization
    #[error("Authorization not granted: {0:?}")]
    NotAuthorized(AuthorizationType),

    /// `run` was called on a running session
    #[error("Session is already running")]
    AlreadyRunning,

    /// The runtime failed to start a provider
    #[error("Data provider failed: {0}")]
    ProviderFailed(#[from] ProviderError),
}

/// Receivers of a running session
///
/// Anchor streams are present only for the providers passed to
/// [`SensingSession::run`]. Each stream ends when the session stops.
#[derive(Debug)]
pub struct SessionStreams {
    /// Scene reconstruction updates
    pub mesh_updates: Option<mpsc::Receiver<AnchorUpdate<MeshAnchor>>>,
    /// Hand tracking updates
    pub hand_updates: Option<mpsc::Receiver<AnchorUpdate<HandAnchor>>>,
    /// Session events
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Connection to a sensing runtime
#[async_trait]
pub trait SensingSession: Send + Sync {
    /// Whether this device can run every provider in `providers`
    fn is_supported(&self, providers: DataProviders) -> bool;

    /// Ask the user for authorizations; returns the resulting status of each
    async fn request_authorization(
        &self,
        types: &[AuthorizationType],
    ) -> HashMap<AuthorizationType, AuthorizationStatus>;

    /// Start the providers and return their update streams
    async fn run(&self, providers: DataProviders) -> Result<SessionStreams, SessionError>;

    /// Stop all providers; open streams end
    fn stop(&self);
}
