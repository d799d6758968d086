//! Reconstruction model
//!
//! Owns the content scene and everything that writes to it: the mesh anchor
//! synchronizer, the fingertip markers, the tap-spawned cubes and the error
//! flag. The model is cheap to clone; clones share the same state so each
//! stream consumer can run on its own task.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};

use spatial_engine::config::InteractionConfig;
use spatial_engine::foundation::math::{Transform, Vec3};
use spatial_engine::input::SpatialTap;
use spatial_engine::physics::{CollisionShape, PhysicsBodyComponent, PhysicsMaterial, Ray};
use spatial_engine::scene::components::{
    colors, CollisionComponent, InputTargetComponent, InputType, Material, MeshPrimitive,
    ModelComponent,
};
use spatial_engine::scene::{Node, NodeId, SceneError, SceneGraph, AABB};
use spatial_engine::sensing::{
    AnchorUpdate, AuthorizationStatus, Chirality, DataProviders, HandAnchor, MeshAnchor,
    SensingSession, SessionError, SessionEvent, SessionStreams,
};

use crate::fingertips::FingertipTracker;
use crate::mesh_sync::MeshAnchorSynchronizer;

/// Providers the model consumes
pub const REQUIRED_PROVIDERS: DataProviders =
    DataProviders::SCENE_RECONSTRUCTION.union(DataProviders::HAND_TRACKING);

struct ContentState {
    scene: SceneGraph,
    root: NodeId,
    meshes: MeshAnchorSynchronizer,
    fingertips: FingertipTracker,
    cubes: Vec<NodeId>,
}

impl ContentState {
    fn new(config: &InteractionConfig) -> Result<Self, SceneError> {
        let mut scene = SceneGraph::new();
        let root = scene.create_root("content");
        let fingertips = FingertipTracker::new(&mut scene, root, config)?;

        Ok(Self {
            scene,
            root,
            meshes: MeshAnchorSynchronizer::new(root),
            fingertips,
            cubes: Vec::new(),
        })
    }

    fn spawn_cube(&mut self, config: &InteractionConfig, location: Vec3) -> Result<NodeId, SceneError> {
        let position = location + Vec3::new(0.0, config.spawn_height_offset, 0.0);
        let material = PhysicsMaterial::new(config.friction, config.restitution);

        let cube = Node::new(format!("cube-{}", self.cubes.len()))
            .with_transform(Transform::from_position(position))
            .with_model(ModelComponent {
                mesh: MeshPrimitive::Box { size: config.cube_size, corner_radius: 0.0 },
                material: Material::Simple { color: colors::PINK, is_metallic: false },
            })
            .with_collision(CollisionComponent::new(CollisionShape::cube(config.cube_size), false))
            .with_physics_body(PhysicsBodyComponent::dynamic(config.cube_mass, material))
            .with_input_target(InputTargetComponent::only(InputType::INDIRECT));

        let id = self.scene.spawn(self.root, cube)?;
        self.cubes.push(id);
        log::info!("Spawned cube {} at {:?}", self.cubes.len(), position.as_slice());
        Ok(id)
    }
}

/// Coordinating object for the immersive content
#[derive(Clone)]
pub struct ReconstructionModel {
    state: Arc<Mutex<ContentState>>,
    config: InteractionConfig,
    errors: Arc<watch::Sender<bool>>,
}

impl fmt::Debug for ReconstructionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconstructionModel")
            .field("config", &self.config)
            .field("error_state", &self.error_state())
            .finish_non_exhaustive()
    }
}

impl ReconstructionModel {
    /// Create the content root and the fingertip markers
    pub fn new(config: InteractionConfig) -> Result<Self, SceneError> {
        let state = ContentState::new(&config)?;
        let (errors, _) = watch::channel(false);

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            config,
            errors: Arc::new(errors),
        })
    }

    /// Root node all content hangs from
    pub async fn setup_content_entity(&self) -> NodeId {
        self.state.lock().await.root
    }

    /// Interaction parameters in use
    pub const fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Whether a session fault has been reported
    pub fn error_state(&self) -> bool {
        *self.errors.borrow()
    }

    /// Watch the error flag
    pub fn subscribe_errors(&self) -> watch::Receiver<bool> {
        self.errors.subscribe()
    }

    /// Raise the error flag; it stays raised
    pub fn flag_error(&self, reason: &str) {
        log::warn!("Session fault: {reason}");
        self.errors.send_if_modified(|flag| !std::mem::replace(flag, true));
    }

    /// Start scene reconstruction and hand tracking
    pub async fn run_session<S>(&self, session: &S) -> Result<SessionStreams, SessionError>
    where
        S: SensingSession + ?Sized,
    {
        match session.run(REQUIRED_PROVIDERS).await {
            Ok(streams) => {
                log::info!("Sensing session running");
                Ok(streams)
            }
            Err(error) => {
                self.flag_error(&format!("failed to start session: {error}"));
                Err(error)
            }
        }
    }

    /// Mirror mesh anchor updates into the scene until the stream ends
    pub async fn process_reconstruction_updates(&self, mut updates: mpsc::Receiver<AnchorUpdate<MeshAnchor>>) {
        let mut applied = 0usize;
        while let Some(update) = updates.recv().await {
            let mut guard = self.state.lock().await;
            let ContentState { scene, meshes, .. } = &mut *guard;
            match meshes.apply(scene, &update) {
                Ok(outcome) => {
                    applied += 1;
                    log::trace!("Mesh anchor {}: {:?}", update.anchor.id, outcome);
                }
                Err(error) => log::warn!("Mesh anchor {} not applied: {}", update.anchor.id, error),
            }
        }
        log::debug!("Reconstruction stream ended after {applied} updates");
    }

    /// Move fingertip markers with hand updates until the stream ends
    pub async fn process_hand_updates(&self, mut updates: mpsc::Receiver<AnchorUpdate<HandAnchor>>) {
        while let Some(update) = updates.recv().await {
            let mut guard = self.state.lock().await;
            let ContentState { scene, fingertips, .. } = &mut *guard;
            if let Err(error) = fingertips.apply(scene, &update) {
                log::warn!("Hand update for {:?} not applied: {}", update.anchor.chirality, error);
            }
        }
        log::debug!("Hand tracking stream ended");
    }

    /// React to session events until the stream ends
    ///
    /// A denied authorization or a provider error raises the error flag.
    pub async fn monitor_session_events(&self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::AuthorizationChanged { kind, status } => {
                    if status == AuthorizationStatus::Denied {
                        self.flag_error(&format!("{kind:?} authorization denied"));
                    } else {
                        log::info!("{kind:?} authorization is now {status:?}");
                    }
                }
                SessionEvent::DataProviderStateChanged { providers, state, error } => match error {
                    Some(error) => self.flag_error(&format!("{providers:?} entered {state:?}: {error}")),
                    None => log::info!("{providers:?} entered {state:?}"),
                },
            }
        }
        log::debug!("Session event stream ended");
    }

    /// Spawn a dynamic cube above `location` (content space)
    pub async fn add_cube(&self, location: Vec3) -> Result<NodeId, SceneError> {
        self.state.lock().await.spawn_cube(&self.config, location)
    }

    /// Spawn a cube for a tap gesture
    ///
    /// Taps whose target is gone or does not accept the gesture are ignored.
    pub async fn handle_tap(&self, tap: SpatialTap) -> Result<Option<NodeId>, SceneError> {
        let mut state = self.state.lock().await;

        let accepts = state
            .scene
            .get(tap.target)
            .ok()
            .and_then(|node| node.input_target)
            .is_some_and(|target| target.accepts(tap.input));
        if !accepts {
            log::debug!("Ignoring tap on {:?}", tap.target);
            return Ok(None);
        }

        let location = state.scene.convert_to_local(state.root, tap.location)?;
        state.spawn_cube(&self.config, location).map(Some)
    }

    /// Resolve a pointing ray to a tap on the nearest gesture target
    pub async fn tap_from_ray(&self, ray: &Ray) -> Option<SpatialTap> {
        let state = self.state.lock().await;
        state
            .scene
            .raycast(ray, |node| {
                node.input_target
                    .is_some_and(|target| target.accepts(InputType::INDIRECT))
            })
            .map(|hit| SpatialTap::from_hit(&hit))
    }

    /// Drop mesh nodes and cubes, keeping the root and the fingertip markers
    pub async fn reset(&self) {
        let mut guard = self.state.lock().await;
        let ContentState { scene, meshes, cubes, .. } = &mut *guard;

        meshes.clear(scene);
        for cube in cubes.drain(..) {
            if let Err(error) = scene.remove_from_parent(cube) {
                log::debug!("Cube already gone: {error}");
            }
        }
        log::info!("Content reset, {} nodes left", scene.len());
    }

    /// Run `f` against the scene graph and its root
    pub async fn inspect<R>(&self, f: impl FnOnce(&SceneGraph, NodeId) -> R) -> R {
        let state = self.state.lock().await;
        f(&state.scene, state.root)
    }

    /// Summary of the current content
    pub async fn snapshot(&self) -> SceneSnapshot {
        let state = self.state.lock().await;

        let world_position = |node: NodeId| state.scene.world_position(node).ok();
        let fingertips = state
            .fingertips
            .markers()
            .filter_map(|(chirality, marker)| Some((chirality, world_position(marker)?)))
            .collect();
        let cubes = state.cubes.iter().filter_map(|cube| world_position(*cube)).collect();
        let room_bounds = AABB::from_points(
            state
                .meshes
                .anchor_ids()
                .filter_map(|id| state.meshes.node_for(id))
                .filter_map(|node| state.scene.world_bounds(node).ok().flatten())
                .flat_map(|bounds| [bounds.min, bounds.max]),
        );

        SceneSnapshot {
            node_count: state.scene.len(),
            mesh_anchor_count: state.meshes.len(),
            room_bounds,
            cubes,
            fingertips,
            error: self.error_state(),
        }
    }
}

/// Point-in-time summary of the content
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    /// Live nodes, root included
    pub node_count: usize,
    /// Registered mesh anchors
    pub mesh_anchor_count: usize,
    /// World bounds of every reconstructed surface, `None` before the first mesh
    pub room_bounds: Option<AABB>,
    /// World positions of spawned cubes, oldest first
    pub cubes: Vec<Vec3>,
    /// World positions of the fingertip markers
    pub fingertips: Vec<(Chirality, Vec3)>,
    /// Error flag
    pub error: bool,
}

impl fmt::Display for SceneSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:        {}", self.node_count)?;
        writeln!(f, "mesh anchors: {}", self.mesh_anchor_count)?;
        if let Some(AABB { min, max }) = self.room_bounds {
            writeln!(
                f,
                "room bounds:  ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        writeln!(f, "cubes:        {}", self.cubes.len())?;
        for (index, cube) in self.cubes.iter().enumerate() {
            writeln!(f, "  cube {index}: ({:.3}, {:.3}, {:.3})", cube.x, cube.y, cube.z)?;
        }
        for (chirality, tip) in &self.fingertips {
            writeln!(f, "{chirality:?} fingertip: ({:.3}, {:.3}, {:.3})", tip.x, tip.y, tip.z)?;
        }
        write!(f, "error:        {}", self.error)
    }
}
