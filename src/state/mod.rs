pub mod clock;
pub mod names;
pub mod roster;
pub mod round;
pub mod scoring;
pub mod session;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    media::MediaResolver,
    state::{
        clock::Clock,
        session::{GameSettings, SessionController},
    },
};

pub type SharedState = Arc<AppState>;

/// Central application state: the one game session plus static settings.
pub struct AppState {
    session: SessionController,
    baby_name: String,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        resolver: Arc<dyn MediaResolver>,
    ) -> SharedState {
        Self::with_settings(config.game, config.baby_name.clone(), clock, resolver)
    }

    /// Construct state from explicit game settings.
    pub fn with_settings(
        settings: GameSettings,
        baby_name: String,
        clock: Arc<dyn Clock>,
        resolver: Arc<dyn MediaResolver>,
    ) -> SharedState {
        Arc::new(Self {
            session: SessionController::new(settings, clock, resolver),
            baby_name,
        })
    }

    /// The lock-guarded game session.
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Label for whose age is being guessed.
    pub fn baby_name(&self) -> &str {
        &self.baby_name
    }
}
