use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Game Shelf Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::start_session,
        crate::routes::auth::end_session,
        crate::routes::auth::me,
        crate::routes::games::create_game,
        crate::routes::games::get_game,
        crate::routes::games::update_game,
        crate::routes::games::delete_game,
        crate::routes::games::game_stats,
        crate::routes::games::categories,
        crate::routes::households::create_household,
        crate::routes::households::list_households,
        crate::routes::households::get_household,
        crate::routes::households::join_household,
        crate::routes::households::regenerate_invite_code,
        crate::routes::households::link_game,
        crate::routes::households::add_game,
        crate::routes::households::household_events,
        crate::routes::ownerships::update_ownership,
        crate::routes::ownerships::delete_ownership,
        crate::routes::ownerships::list_owned_games,
        crate::routes::preferences::set_reaction,
        crate::routes::preferences::toggle_favorite,
        crate::routes::preferences::list_preferences,
        crate::routes::picker::quick_pick,
        crate::routes::picker::start_spin,
        crate::routes::picker::spin_status,
        crate::routes::picker::spin_stream,
        crate::routes::catalog::search,
        crate::routes::catalog::details,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::auth::AuthProvider,
            crate::dto::auth::SessionRequest,
            crate::dto::auth::SessionResponse,
            crate::dto::auth::UserSummary,
            crate::dto::auth::MeResponse,
            crate::dto::game::GameInput,
            crate::dto::game::GameSummary,
            crate::dto::game::CreateGameResponse,
            crate::dto::game::GameStatsResponse,
            crate::dto::household::CreateHouseholdRequest,
            crate::dto::household::JoinHouseholdRequest,
            crate::dto::household::HouseholdListItem,
            crate::dto::household::HouseholdSummary,
            crate::dto::household::InviteCodeResponse,
            crate::dto::ownership::LinkOwnershipRequest,
            crate::dto::ownership::AddGameRequest,
            crate::dto::ownership::UpdateOwnershipRequest,
            crate::dto::ownership::OwnershipSummary,
            crate::dto::ownership::OwnedGameSummary,
            crate::dto::ownership::AddGameResponse,
            crate::dto::ownership::GameFilterInput,
            crate::dto::preference::ReactionDto,
            crate::dto::preference::SetReactionRequest,
            crate::dto::preference::PreferenceSummary,
            crate::dto::picker::PreferenceFilter,
            crate::dto::picker::PickerRequest,
            crate::dto::picker::QuickPickResponse,
            crate::dto::picker::SpinStartResponse,
            crate::dto::picker::SpinPhaseDto,
            crate::dto::picker::SpinStatusResponse,
            crate::dto::picker::SpinFrameEvent,
            crate::dto::picker::SpinRevealEvent,
            crate::dto::catalog::CatalogSearchResult,
            crate::dto::catalog::CatalogSearchResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::OwnershipChangedEvent,
            crate::dto::sse::OwnershipRemovedEvent,
            crate::dto::sse::GameUpdatedEvent,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Session lifecycle and profile"),
        (name = "games", description = "Shared game records"),
        (name = "households", description = "Households, invites and membership"),
        (name = "ownerships", description = "Household copies and the owned-game listing"),
        (name = "preferences", description = "Per-user reactions and favorites"),
        (name = "picker", description = "Random game selection"),
        (name = "catalog", description = "External board game catalog"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picker_schemas_are_documented_with_serialisable_defaults() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let schemas = &doc["components"]["schemas"];
        for name in ["PickerRequest", "GameFilterInput", "PreferenceFilter"] {
            assert!(schemas[name].is_object(), "{name} missing");
        }
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());

        let defaults =
            serde_json::to_value(crate::dto::picker::PickerRequest::default()).unwrap();
        assert_eq!(defaults["preference"], "any");
        assert_eq!(defaults["filter"]["play_time"], "any");
    }
}
