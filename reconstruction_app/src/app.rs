//! Immersive view controller
//!
//! Owns the single toggle that opens and closes the immersive space. Opening
//! checks the device and the user's authorizations, starts the sensing
//! session and hands each of its streams to a task of its own; closing tears
//! all of that down again.

use std::sync::Arc;

use tokio::task::JoinHandle;

use spatial_engine::config::ConfigError;
use spatial_engine::scene::SceneError;
use spatial_engine::sensing::{
    AuthorizationStatus, AuthorizationType, DataProviders, SensingSession, SessionError,
};

use crate::model::{ReconstructionModel, REQUIRED_PROVIDERS};

/// Application errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The device cannot run the required providers
    #[error("Sensing not supported on this device: {0:?}")]
    Unsupported(DataProviders),

    /// The user refused an authorization
    #[error("{0:?} authorization denied")]
    NotAuthorized(AuthorizationType),

    /// Session failed to start
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Scene graph error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A stream consumer panicked
    #[error("Stream task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Whether the immersive space is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImmersiveSpaceState {
    /// Not showing
    #[default]
    Closed,
    /// Showing, streams being consumed
    Open,
}

/// Generic error display shown once the error flag is raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorWindow {
    message: &'static str,
}

impl ErrorWindow {
    const MESSAGE: &'static str =
        "Scene reconstruction or hand tracking stopped working. Close and reopen the app to try again.";

    /// Text shown to the user
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl Default for ErrorWindow {
    fn default() -> Self {
        Self { message: Self::MESSAGE }
    }
}

/// Content view controller
pub struct ImmersiveApp<S: SensingSession + 'static> {
    session: Arc<S>,
    model: ReconstructionModel,
    state: ImmersiveSpaceState,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: SensingSession + 'static> ImmersiveApp<S> {
    /// Controller with the immersive space closed
    pub fn new(session: Arc<S>, model: ReconstructionModel) -> Self {
        Self {
            session,
            model,
            state: ImmersiveSpaceState::Closed,
            tasks: Vec::new(),
        }
    }

    /// Shared content model
    pub const fn model(&self) -> &ReconstructionModel {
        &self.model
    }

    /// Current state of the immersive space
    pub const fn immersive_space_state(&self) -> ImmersiveSpaceState {
        self.state
    }

    /// Error window to present, if the error flag is raised
    pub fn error_window(&self) -> Option<ErrorWindow> {
        self.model.error_state().then(ErrorWindow::default)
    }

    /// Wait until the error flag is raised
    ///
    /// Returns `None` if the model is dropped first.
    pub async fn wait_for_error(&self) -> Option<ErrorWindow> {
        let mut errors = self.model.subscribe_errors();
        errors.wait_for(|raised| *raised).await.ok()?;
        Some(ErrorWindow::default())
    }

    /// The toggle control
    ///
    /// Setting the current state again does nothing. A failed open leaves
    /// the space closed with the error flag raised.
    pub async fn set_show_immersive_space(&mut self, show: bool) -> Result<ImmersiveSpaceState, AppError> {
        match (show, self.state) {
            (true, ImmersiveSpaceState::Closed) => self.open().await?,
            (false, ImmersiveSpaceState::Open) => self.close().await,
            _ => log::debug!("Immersive space already {:?}", self.state),
        }
        Ok(self.state)
    }

    async fn open(&mut self) -> Result<(), AppError> {
        log::info!("Opening immersive space");

        if !self.session.is_supported(REQUIRED_PROVIDERS) {
            self.model.flag_error("scene reconstruction or hand tracking not supported");
            return Err(AppError::Unsupported(REQUIRED_PROVIDERS));
        }

        let kinds = REQUIRED_PROVIDERS.required_authorizations();
        let answers = self.session.request_authorization(&kinds).await;
        for kind in kinds {
            let status = answers.get(&kind).copied().unwrap_or_default();
            log::info!("{kind:?} authorization: {status:?}");
            if status == AuthorizationStatus::Denied {
                self.model.flag_error(&format!("{kind:?} authorization denied"));
                return Err(AppError::NotAuthorized(kind));
            }
        }

        let streams = self.model.run_session(self.session.as_ref()).await?;

        if let Some(meshes) = streams.mesh_updates {
            let model = self.model.clone();
            self.tasks.push(tokio::spawn(async move {
                model.process_reconstruction_updates(meshes).await;
            }));
        }
        if let Some(hands) = streams.hand_updates {
            let model = self.model.clone();
            self.tasks.push(tokio::spawn(async move {
                model.process_hand_updates(hands).await;
            }));
        }
        let model = self.model.clone();
        let events = streams.events;
        self.tasks.push(tokio::spawn(async move {
            model.monitor_session_events(events).await;
        }));

        self.state = ImmersiveSpaceState::Open;
        log::info!("Immersive space open, {} stream tasks", self.tasks.len());
        Ok(())
    }

    async fn close(&mut self) {
        log::info!("Closing immersive space");
        let tasks: Vec<_> = self.tasks.drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        // Consumers must be gone before the reset or a buffered update could land after it
        for task in tasks {
            if let Err(error) = task.await {
                if !error.is_cancelled() {
                    log::warn!("Stream consumer failed while closing: {error}");
                }
            }
        }
        self.session.stop();
        self.model.reset().await;
        self.state = ImmersiveSpaceState::Closed;
    }

    /// Wait for every stream consumer to finish
    ///
    /// Streams end when the session stops producing. Aborted consumers are
    /// not an error.
    pub async fn wait_for_streams(&mut self) -> Result<(), AppError> {
        for task in std::mem::take(&mut self.tasks) {
            match task.await {
                Ok(()) => {}
                Err(error) if error.is_cancelled() => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }
}

impl<S: SensingSession + 'static> Drop for ImmersiveApp<S> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
