//! Headless demo run
//!
//! Opens the immersive space against a scripted session, lets the recorded
//! traffic play out, performs the scripted taps and reports what the scene
//! looked like before the space was closed again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use spatial_engine::config::Config;
use spatial_engine::foundation::math::{PoseRecord, Vec3};
use spatial_engine::physics::Ray;
use spatial_engine::sensing::{
    AnchorEvent, AnchorId, Chirality, HandJointName, HandUpdateRecord, JointRecord,
    MeshUpdateRecord, Scenario, ScriptedSession, ScriptedStep,
};

use crate::app::{AppError, ErrorWindow, ImmersiveApp};
use crate::config::AppConfig;
use crate::model::{ReconstructionModel, SceneSnapshot};

/// Scripted tap gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TapRecord {
    /// Spawn directly above a content-space location
    At((f32, f32, f32)),
    /// Look along a ray and tap whatever gesture target it meets first
    Ray {
        /// Ray origin in global space
        origin: (f32, f32, f32),
        /// Ray direction; need not be normalized
        direction: (f32, f32, f32),
    },
}

/// Scenario plus the taps to perform once its traffic has played out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoScript {
    /// Recorded sensor traffic
    pub scenario: Scenario,
    /// Taps in order
    pub taps: Vec<TapRecord>,
}

impl Config for DemoScript {}

impl DemoScript {
    /// A small room: floor and table meshes, a right hand pointing at the
    /// table, and two taps
    pub fn sample() -> Self {
        let floor = ScriptedStep::Mesh(MeshUpdateRecord {
            event: AnchorEvent::Added,
            id: AnchorId::from_u128(0x100),
            pose: PoseRecord::default(),
            vertices: vec![[-2.0, 0.0, -2.0], [2.0, 0.0, -2.0], [2.0, 0.0, 2.0], [-2.0, 0.0, 2.0]],
            faces: vec![[0, 2, 1], [0, 3, 2]],
        });
        let table_top = |event| {
            ScriptedStep::Mesh(MeshUpdateRecord {
                event,
                id: AnchorId::from_u128(0x200),
                pose: PoseRecord::at([0.0, 0.75, -1.0]),
                vertices: vec![[-0.5, 0.0, -0.3], [0.5, 0.0, -0.3], [0.5, 0.0, 0.3], [-0.5, 0.0, 0.3]],
                faces: vec![[0, 2, 1], [0, 3, 2]],
            })
        };
        let right_hand = ScriptedStep::Hand(HandUpdateRecord {
            chirality: Chirality::Right,
            event: AnchorEvent::Added,
            id: None,
            tracked: true,
            pose: PoseRecord::at([0.2, 1.0, -0.4]),
            joints: vec![JointRecord {
                name: HandJointName::IndexFingerTip,
                tracked: true,
                pose: PoseRecord::at([0.0, 0.0, -0.12]),
            }],
        });

        Self {
            scenario: Scenario::with_steps(vec![
                floor,
                table_top(AnchorEvent::Added),
                right_hand,
                table_top(AnchorEvent::Updated),
            ]),
            taps: vec![
                TapRecord::Ray { origin: (0.1, 1.6, 0.0), direction: (0.0, -0.85, -1.0) },
                TapRecord::At((1.0, 0.0, -1.5)),
            ],
        }
    }
}

/// Outcome of a demo run
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    /// Scene as it stood before closing
    pub snapshot: SceneSnapshot,
    /// Cubes spawned by the scripted taps
    pub cubes_spawned: usize,
    /// Error window that was presented, if any
    pub error: Option<ErrorWindow>,
}

/// Run a script end to end
///
/// Session faults do not fail the run; they show up as the report's error
/// window.
pub async fn run_demo(config: &AppConfig, script: DemoScript) -> Result<DemoReport, AppError> {
    let session = Arc::new(ScriptedSession::new(script.scenario, config.session.clone()));
    let model = ReconstructionModel::new(config.interaction.clone())?;
    let mut app = ImmersiveApp::new(session, model.clone());

    if let Err(error) = app.set_show_immersive_space(true).await {
        log::warn!("Immersive space did not open: {error}");
        return Ok(DemoReport {
            snapshot: model.snapshot().await,
            cubes_spawned: 0,
            error: app.error_window(),
        });
    }

    app.wait_for_streams().await?;

    let mut cubes_spawned = 0;
    for tap in &script.taps {
        if perform_tap(&model, tap).await? {
            cubes_spawned += 1;
        }
    }

    let report = DemoReport {
        snapshot: model.snapshot().await,
        cubes_spawned,
        error: app.error_window(),
    };
    app.set_show_immersive_space(false).await?;
    Ok(report)
}

async fn perform_tap(model: &ReconstructionModel, tap: &TapRecord) -> Result<bool, AppError> {
    match *tap {
        TapRecord::At((x, y, z)) => {
            model.add_cube(Vec3::new(x, y, z)).await?;
            Ok(true)
        }
        TapRecord::Ray { origin, direction } => {
            let ray = Ray::new(
                Vec3::new(origin.0, origin.1, origin.2),
                Vec3::new(direction.0, direction.1, direction.2),
            );
            let Some(gesture) = model.tap_from_ray(&ray).await else {
                log::info!("Tap ray from {origin:?} hit nothing");
                return Ok(false);
            };
            Ok(model.handle_tap(gesture).await?.is_some())
        }
    }
}
