use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    content::get_page,
    events::{approve_event, submit_event},
    health_check,
    opportunities::{
        get_opportunity, list_causes, list_locations, list_opportunities, list_organizers,
    },
    personalize::personalize_content,
    register::register,
    search::search,
    webhooks::{algolia_sync, revalidate},
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.cors_allowed_origins);
    let security = create_security_headers_layer(state.config.is_production);

    let api = Router::new()
        .route("/opportunities", get(list_opportunities))
        .route("/opportunities/:slug", get(get_opportunity))
        .route("/causes", get(list_causes))
        .route("/locations", get(list_locations))
        .route("/organizers", get(list_organizers))
        .route("/pages/:content_type", get(get_page))
        .route("/search", get(search))
        .route("/register", post(register))
        .route("/submit-event", post(submit_event))
        .route("/approve-event", post(approve_event))
        .route("/revalidate", post(revalidate))
        .route("/algolia-sync", post(algolia_sync))
        .route("/personalize", post(personalize_content));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(security)
        .layer(cors)
}
