/// OpenAPI documentation generation.
pub mod documentation;
/// Game lifecycle and round actions.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Player identity and naming.
pub mod player_service;
/// Read-only snapshot of the session.
pub mod state_service;
