//! Scripted sensing session
//!
//! Replays a recorded [`Scenario`] through the same channels a live runtime
//! would use. Scenarios are RON files:
//!
//! ```ron
//! Scenario(
//!     steps: [
//!         Mesh((
//!             event: Added,
//!             id: "6f1c1a52-3f5e-4f7d-9d55-6c0c2b7f0a01",
//!             pose: (position: (0.0, 0.0, -1.0)),
//!             vertices: [(-1.0, 0.0, -1.0), (1.0, 0.0, -1.0), (0.0, 0.0, 1.0)],
//!             faces: [(0, 2, 1)],
//!         )),
//!         Hand((chirality: Right, pose: (position: (0.2, 1.0, -0.3)))),
//!     ],
//! )
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{Config, SessionConfig};
use crate::foundation::math::{PoseRecord, Vec3};
use super::anchor::{AnchorEvent, AnchorId, AnchorUpdate, MeshAnchor, MeshGeometry};
use super::hand::{Chirality, HandAnchor, HandJoint, HandJointName, HandSkeleton};
use super::session::{
    AuthorizationStatus, AuthorizationType, DataProviderState, DataProviders, ProviderError,
    SensingSession, SessionError, SessionEvent, SessionStreams,
};

const fn default_true() -> bool {
    true
}

/// Recorded mesh anchor update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshUpdateRecord {
    /// Event tag
    pub event: AnchorEvent,
    /// Anchor identifier
    pub id: AnchorId,
    /// Anchor pose in the session origin
    #[serde(default)]
    pub pose: PoseRecord,
    /// Vertices in anchor space
    #[serde(default)]
    pub vertices: Vec<[f32; 3]>,
    /// Triangles
    #[serde(default)]
    pub faces: Vec<[u32; 3]>,
}

impl MeshUpdateRecord {
    /// Convert into the update a runtime would deliver
    pub fn to_update(&self) -> AnchorUpdate<MeshAnchor> {
        let geometry = MeshGeometry::new(
            self.vertices.iter().copied().map(Vec3::from).collect(),
            self.faces.clone(),
        );
        AnchorUpdate::new(self.event, MeshAnchor::new(self.id, self.pose.to_matrix(), geometry))
    }
}

/// Recorded skeleton joint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointRecord {
    /// Joint name
    pub name: HandJointName,
    /// Whether the joint is tracked
    #[serde(default = "default_true")]
    pub tracked: bool,
    /// Pose relative to the hand anchor
    #[serde(default)]
    pub pose: PoseRecord,
}

/// Recorded hand anchor update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandUpdateRecord {
    /// Which hand
    pub chirality: Chirality,
    /// Event tag
    #[serde(default = "HandUpdateRecord::default_event")]
    pub event: AnchorEvent,
    /// Anchor identifier; one fixed id per hand when omitted
    #[serde(default)]
    pub id: Option<AnchorId>,
    /// Whether the hand is tracked
    #[serde(default = "default_true")]
    pub tracked: bool,
    /// Wrist pose in the session origin
    #[serde(default)]
    pub pose: PoseRecord,
    /// Skeleton joints; no skeleton when empty
    #[serde(default)]
    pub joints: Vec<JointRecord>,
}

impl HandUpdateRecord {
    const fn default_event() -> AnchorEvent {
        AnchorEvent::Updated
    }

    /// Convert into the update a runtime would deliver
    pub fn to_update(&self) -> AnchorUpdate<HandAnchor> {
        let id = self.id.unwrap_or(match self.chirality {
            Chirality::Left => AnchorId::from_u128(1),
            Chirality::Right => AnchorId::from_u128(2),
        });
        let skeleton = (!self.joints.is_empty()).then(|| {
            HandSkeleton::new(self.joints.iter().map(|joint| {
                (
                    joint.name,
                    HandJoint { is_tracked: joint.tracked, anchor_from_joint: joint.pose.to_matrix() },
                )
            }))
        });

        AnchorUpdate::new(
            self.event,
            HandAnchor {
                id,
                chirality: self.chirality,
                is_tracked: self.tracked,
                origin_from_anchor: self.pose.to_matrix(),
                skeleton,
            },
        )
    }
}

/// One replayed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptedStep {
    /// Scene reconstruction update
    Mesh(MeshUpdateRecord),
    /// Hand tracking update
    Hand(HandUpdateRecord),
    /// Session event
    Session(SessionEvent),
}

/// Authorization answers of the scripted user
///
/// `NotDetermined` resolves to `Allowed` when requested, as if the user
/// accepted the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationRecord {
    /// Hand tracking answer
    pub hand_tracking: AuthorizationStatus,
    /// World sensing answer
    pub world_sensing: AuthorizationStatus,
}

impl AuthorizationRecord {
    /// Answer for `kind` after prompting
    pub fn resolve(&self, kind: AuthorizationType) -> AuthorizationStatus {
        let status = match kind {
            AuthorizationType::HandTracking => self.hand_tracking,
            AuthorizationType::WorldSensing => self.world_sensing,
        };
        match status {
            AuthorizationStatus::NotDetermined => AuthorizationStatus::Allowed,
            decided => decided,
        }
    }
}

impl Default for AuthorizationRecord {
    fn default() -> Self {
        Self {
            hand_tracking: AuthorizationStatus::Allowed,
            world_sensing: AuthorizationStatus::Allowed,
        }
    }
}

/// Recorded sensor traffic and device capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Providers the device supports
    pub supported: DataProviders,
    /// Authorization answers
    pub authorization: AuthorizationRecord,
    /// When set, `run` fails with this provider error
    pub run_failure: Option<String>,
    /// Replayed traffic, in order
    pub steps: Vec<ScriptedStep>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            supported: DataProviders::all(),
            authorization: AuthorizationRecord::default(),
            run_failure: None,
            steps: Vec::new(),
        }
    }
}

impl Config for Scenario {}

impl Scenario {
    /// Scenario replaying `steps` on a fully capable, fully authorized device
    pub fn with_steps(steps: Vec<ScriptedStep>) -> Self {
        Self { steps, ..Default::default() }
    }
}

/// Session that replays a [`Scenario`]
pub struct ScriptedSession {
    scenario: Scenario,
    config: SessionConfig,
    replay: Mutex<Option<JoinHandle<()>>>,
}

impl ScriptedSession {
    /// Create a session; nothing is replayed until [`SensingSession::run`]
    pub fn new(scenario: Scenario, config: SessionConfig) -> Self {
        Self {
            scenario,
            config,
            replay: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SensingSession for ScriptedSession {
    fn is_supported(&self, providers: DataProviders) -> bool {
        self.scenario.supported.contains(providers)
    }

    async fn request_authorization(
        &self,
        types: &[AuthorizationType],
    ) -> HashMap<AuthorizationType, AuthorizationStatus> {
        types
            .iter()
            .map(|kind| (*kind, self.scenario.authorization.resolve(*kind)))
            .collect()
    }

    async fn run(&self, providers: DataProviders) -> Result<SessionStreams, SessionError> {
        if !self.is_supported(providers) {
            return Err(SessionError::Unsupported(providers.difference(self.scenario.supported)));
        }
        for kind in providers.required_authorizations() {
            if self.scenario.authorization.resolve(kind) == AuthorizationStatus::Denied {
                return Err(SessionError::NotAuthorized(kind));
            }
        }
        if let Some(message) = &self.scenario.run_failure {
            return Err(ProviderError::new(message.clone()).into());
        }

        let mut replay = self.replay.lock().unwrap_or_else(PoisonError::into_inner);
        if replay.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(SessionError::AlreadyRunning);
        }

        let capacity = self.config.channel_capacity.max(1);
        let (mesh_tx, mesh_rx) = providers
            .contains(DataProviders::SCENE_RECONSTRUCTION)
            .then(|| mpsc::channel(capacity))
            .unzip();
        let (hand_tx, hand_rx) = providers
            .contains(DataProviders::HAND_TRACKING)
            .then(|| mpsc::channel(capacity))
            .unzip();
        let (events_tx, events_rx) = mpsc::channel(capacity);

        let channels = ReplayChannels { providers, mesh: mesh_tx, hands: hand_tx, events: events_tx };
        let steps = self.scenario.steps.clone();
        let delay = Duration::from_millis(self.config.step_delay_ms);

        log::info!("Starting scripted session: {:?}, {} steps", providers, steps.len());
        *replay = Some(tokio::spawn(channels.replay(steps, delay)));

        Ok(SessionStreams {
            mesh_updates: mesh_rx,
            hand_updates: hand_rx,
            events: events_rx,
        })
    }

    fn stop(&self) {
        let handle = self.replay.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
            log::info!("Scripted session stopped");
        }
    }
}

struct ReplayChannels {
    providers: DataProviders,
    mesh: Option<mpsc::Sender<AnchorUpdate<MeshAnchor>>>,
    hands: Option<mpsc::Sender<AnchorUpdate<HandAnchor>>>,
    events: mpsc::Sender<SessionEvent>,
}

impl ReplayChannels {
    async fn replay(self, steps: Vec<ScriptedStep>, delay: Duration) {
        let running = SessionEvent::DataProviderStateChanged {
            providers: self.providers,
            state: DataProviderState::Running,
            error: None,
        };
        if self.events.send(running).await.is_err() {
            log::debug!("Session event receiver dropped before replay started");
        }

        let total = steps.len();
        for (index, step) in steps.into_iter().enumerate() {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            // Steps for providers that were not started are dropped
            let delivered = match step {
                ScriptedStep::Mesh(record) => match &self.mesh {
                    Some(tx) => tx.send(record.to_update()).await.is_ok(),
                    None => true,
                },
                ScriptedStep::Hand(record) => match &self.hands {
                    Some(tx) => tx.send(record.to_update()).await.is_ok(),
                    None => true,
                },
                ScriptedStep::Session(event) => self.events.send(event).await.is_ok(),
            };

            if !delivered {
                log::debug!("Receiver dropped, scripted step {index} discarded");
            }
        }

        log::debug!("Scripted session replayed {total} steps");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_record(event: AnchorEvent, id: u128) -> ScriptedStep {
        ScriptedStep::Mesh(MeshUpdateRecord {
            event,
            id: AnchorId::from_u128(id),
            pose: PoseRecord::default(),
            vertices: vec![[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 0.0, 1.0]],
            faces: vec![[0, 2, 1]],
        })
    }

    #[tokio::test]
    async fn test_replays_mesh_updates_in_order_then_ends() {
        let scenario = Scenario::with_steps(vec![
            floor_record(AnchorEvent::Added, 1),
            floor_record(AnchorEvent::Removed, 1),
        ]);
        let session = ScriptedSession::new(scenario, SessionConfig::default());

        let mut streams = session.run(DataProviders::SCENE_RECONSTRUCTION).await.unwrap();
        assert!(streams.hand_updates.is_none());

        let mut meshes = streams.mesh_updates.take().unwrap();
        assert_eq!(meshes.recv().await.unwrap().event, AnchorEvent::Added);
        assert_eq!(meshes.recv().await.unwrap().event, AnchorEvent::Removed);
        assert!(meshes.recv().await.is_none());

        let first_event = streams.events.recv().await.unwrap();
        assert!(matches!(
            first_event,
            SessionEvent::DataProviderStateChanged { state: DataProviderState::Running, .. }
        ));
    }

    #[tokio::test]
    async fn test_unsupported_provider_rejected() {
        let scenario = Scenario { supported: DataProviders::HAND_TRACKING, ..Default::default() };
        let session = ScriptedSession::new(scenario, SessionConfig::default());

        let result = session.run(DataProviders::all()).await;
        assert_eq!(result.unwrap_err(), SessionError::Unsupported(DataProviders::SCENE_RECONSTRUCTION));
    }

    #[tokio::test]
    async fn test_denied_authorization_blocks_run() {
        let scenario = Scenario {
            authorization: AuthorizationRecord {
                world_sensing: AuthorizationStatus::Denied,
                ..Default::default()
            },
            ..Default::default()
        };
        let session = ScriptedSession::new(scenario, SessionConfig::default());

        let statuses = session.request_authorization(&[AuthorizationType::WorldSensing]).await;
        assert_eq!(statuses[&AuthorizationType::WorldSensing], AuthorizationStatus::Denied);

        let result = session.run(DataProviders::SCENE_RECONSTRUCTION).await;
        assert_eq!(result.unwrap_err(), SessionError::NotAuthorized(AuthorizationType::WorldSensing));
    }

    #[tokio::test]
    async fn test_dropped_hand_stream_does_not_stall_meshes() {
        let scenario = Scenario::with_steps(vec![
            ScriptedStep::Hand(HandUpdateRecord {
                chirality: Chirality::Left,
                event: AnchorEvent::Updated,
                id: None,
                tracked: true,
                pose: PoseRecord::default(),
                joints: Vec::new(),
            }),
            floor_record(AnchorEvent::Added, 9),
        ]);
        let session = ScriptedSession::new(scenario, SessionConfig::default());

        let mut streams = session.run(DataProviders::all()).await.unwrap();
        drop(streams.hand_updates.take());

        let mut meshes = streams.mesh_updates.take().unwrap();
        let update = meshes.recv().await.unwrap();
        assert_eq!(update.anchor.id, AnchorId::from_u128(9));
    }

    #[test]
    fn test_scenario_parses_from_ron() {
        let text = r#"
            Scenario(
                authorization: (world_sensing: Denied),
                steps: [
                    Mesh((
                        event: Added,
                        id: "00000000-0000-0000-0000-000000000005",
                        vertices: [(-1.0, 0.0, -1.0), (1.0, 0.0, -1.0), (0.0, 0.0, 1.0)],
                        faces: [(0, 2, 1)],
                    )),
                    Hand((chirality: Left, tracked: false)),
                    Session(AuthorizationChanged(kind: HandTracking, status: Denied)),
                ],
            )
        "#;
        let scenario: Scenario = ron::from_str(text).unwrap();

        assert_eq!(scenario.supported, DataProviders::all());
        assert_eq!(scenario.authorization.world_sensing, AuthorizationStatus::Denied);
        assert_eq!(scenario.authorization.hand_tracking, AuthorizationStatus::Allowed);
        assert_eq!(scenario.steps.len(), 3);

        let ScriptedStep::Mesh(record) = &scenario.steps[0] else {
            panic!("expected a mesh step");
        };
        assert_eq!(record.id, AnchorId::from_u128(5));
        assert_eq!(record.to_update().anchor.geometry.faces.len(), 1);
    }
}
