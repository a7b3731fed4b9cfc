use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the age-guessing backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::player::register,
        crate::routes::player::change_username,
        crate::routes::game::new_game,
        crate::routes::game::join,
        crate::routes::game::guess,
        crate::routes::game::ready,
        crate::routes::game::get_state,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::player::RegisterRequest,
            crate::dto::player::RegisterResponse,
            crate::dto::player::UsernameRequest,
            crate::dto::player::UsernameResponse,
            crate::dto::player::PlayerActionRequest,
            crate::dto::player::GuessRequest,
            crate::dto::player::AcceptedResponse,
            crate::dto::player::OkResponse,
            crate::dto::player::NewGameResponse,
            crate::dto::player::LeaderboardEntry,
            crate::dto::phase::PublicPhase,
            crate::dto::phase::RejectionReason,
            crate::dto::state::StateResponse,
            crate::dto::state::GameStateDto,
            crate::dto::state::RevealDto,
            crate::dto::state::RoundResultDto,
            crate::dto::state::ReadyDto,
            crate::dto::state::PendingDto,
            crate::media::MediaType,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "player", description = "Player identity"),
        (name = "game", description = "Game lifecycle, guesses and state polling"),
    )
)]
pub struct ApiDoc;
