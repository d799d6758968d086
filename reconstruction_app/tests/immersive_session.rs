//! End-to-end runs of the immersive view against scripted sessions

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;

use reconstruction_app::{ImmersiveApp, ImmersiveSpaceState, ReconstructionModel};
use spatial_engine::config::{Config, InteractionConfig, SessionConfig};
use spatial_engine::foundation::math::{PoseRecord, Vec3};
use spatial_engine::physics::Ray;
use spatial_engine::sensing::{
    AnchorEvent, AnchorId, AuthorizationStatus, AuthorizationType, DataProviderState,
    DataProviders, MeshUpdateRecord, ProviderError, Scenario, ScriptedSession, ScriptedStep,
    SessionEvent,
};

fn wall(event: AnchorEvent, id: u128, x: f32) -> ScriptedStep {
    ScriptedStep::Mesh(MeshUpdateRecord {
        event,
        id: AnchorId::from_u128(id),
        pose: PoseRecord::at([x, 0.0, -3.0]),
        vertices: vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 2.0, 0.0], [-1.0, 2.0, 0.0]],
        faces: vec![[0, 1, 2], [0, 2, 3]],
    })
}

fn launch(scenario: Scenario) -> ImmersiveApp<ScriptedSession> {
    launch_with(scenario, SessionConfig::default())
}

fn launch_with(scenario: Scenario, config: SessionConfig) -> ImmersiveApp<ScriptedSession> {
    let session = Arc::new(ScriptedSession::new(scenario, config));
    let model = ReconstructionModel::new(InteractionConfig::default()).unwrap();
    ImmersiveApp::new(session, model)
}

#[tokio::test]
async fn mesh_traffic_is_mirrored_then_cleared_on_close() {
    let mut app = launch(Scenario::with_steps(vec![
        wall(AnchorEvent::Added, 1, 0.0),
        wall(AnchorEvent::Added, 2, 2.5),
        wall(AnchorEvent::Updated, 3, 5.0),
        wall(AnchorEvent::Added, 4, -2.5),
        wall(AnchorEvent::Removed, 2, 0.0),
        wall(AnchorEvent::Updated, 1, 0.5),
    ]));

    app.set_show_immersive_space(true).await.unwrap();
    app.wait_for_streams().await.unwrap();

    let snapshot = app.model().snapshot().await;
    assert_eq!(snapshot.mesh_anchor_count, 2);
    assert!(!snapshot.error);

    app.set_show_immersive_space(false).await.unwrap();
    assert_eq!(app.immersive_space_state(), ImmersiveSpaceState::Closed);
    assert_eq!(app.model().snapshot().await.mesh_anchor_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn closing_mid_replay_stops_mirroring_and_reopen_starts_over() {
    let walls = (1..=20).map(|id| wall(AnchorEvent::Added, id, id as f32)).collect();
    let mut app = launch_with(
        Scenario::with_steps(walls),
        SessionConfig {
            step_delay_ms: 10,
            ..SessionConfig::default()
        },
    );

    app.set_show_immersive_space(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(55)).await;
    app.set_show_immersive_space(false).await.unwrap();

    assert_eq!(app.immersive_space_state(), ImmersiveSpaceState::Closed);
    assert_eq!(app.model().snapshot().await.mesh_anchor_count, 0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.model().snapshot().await.mesh_anchor_count, 0);

    app.set_show_immersive_space(true).await.unwrap();
    app.wait_for_streams().await.unwrap();

    let snapshot = app.model().snapshot().await;
    assert_eq!(snapshot.mesh_anchor_count, 20);
    // root + 2 fingertips + 20 walls
    assert_eq!(snapshot.node_count, 23);
    assert!(!snapshot.error);
}

#[tokio::test]
async fn tap_on_reconstructed_wall_spawns_cube_in_front_of_it() {
    let mut app = launch(Scenario::with_steps(vec![wall(AnchorEvent::Added, 1, 0.0)]));
    app.set_show_immersive_space(true).await.unwrap();
    app.wait_for_streams().await.unwrap();

    let ray = Ray::new(Vec3::new(0.3, 1.2, 0.0), Vec3::new(0.0, 0.0, -1.0));
    let tap = app.model().tap_from_ray(&ray).await.unwrap();
    assert_relative_eq!(tap.location, Vec3::new(0.3, 1.2, -3.0), epsilon = 1e-5);

    let before = app.model().snapshot().await.node_count;
    let cube = app.model().handle_tap(tap).await.unwrap();

    assert!(cube.is_some());
    let snapshot = app.model().snapshot().await;
    assert_eq!(snapshot.node_count, before + 1);
    assert_relative_eq!(snapshot.cubes[0], Vec3::new(0.3, 1.4, -3.0), epsilon = 1e-5);
}

#[tokio::test]
async fn provider_error_mid_session_raises_error_window() {
    let mut app = launch(Scenario::with_steps(vec![
        wall(AnchorEvent::Added, 1, 0.0),
        ScriptedStep::Session(SessionEvent::DataProviderStateChanged {
            providers: DataProviders::SCENE_RECONSTRUCTION,
            state: DataProviderState::Stopped,
            error: Some(ProviderError::new("reconstruction interrupted")),
        }),
    ]));

    app.set_show_immersive_space(true).await.unwrap();
    let window = app.wait_for_error().await;

    assert!(window.is_some());
    assert!(app.model().error_state());
}

#[tokio::test]
async fn revoked_authorization_raises_error_window() {
    let mut app = launch(Scenario::with_steps(vec![ScriptedStep::Session(
        SessionEvent::AuthorizationChanged {
            kind: AuthorizationType::WorldSensing,
            status: AuthorizationStatus::Denied,
        },
    )]));

    app.set_show_immersive_space(true).await.unwrap();
    app.wait_for_streams().await.unwrap();

    assert!(app.error_window().is_some());
}

#[tokio::test]
async fn bundled_room_scenario_loads_and_replays() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/room.ron");
    let script = reconstruction_app::DemoScript::load_from_file(path).unwrap();

    let report = reconstruction_app::run_demo(&Default::default(), script).await.unwrap();

    assert_eq!(report.error, None);
    assert!(report.snapshot.mesh_anchor_count > 0);
    assert!(report.cubes_spawned > 0);
}
