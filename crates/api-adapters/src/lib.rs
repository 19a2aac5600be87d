//! # api-adapters
//!
//! HTTP surface of the kanban backend. Every resource route lives under
//! `/kanban-api/v1`; the probes sit at the root.

pub mod dto;
pub mod i18n;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod monitoring;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use state::AppState;

/// Prefix of every resource route.
pub const API_PREFIX: &str = "/kanban-api/v1";

/// Background uploads travel as base64 data URLs inside JSON.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[cfg(feature = "web-axum")]
pub fn router(state: AppState) -> axum::Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, post, put};
    use tower::ServiceBuilder;
    use tower_http::trace::TraceLayer;

    let api = axum::Router::new()
        .route("/users/register", post(handlers::register_user))
        .route("/users/authenticate", post(handlers::authenticate))
        .route("/boards", get(handlers::get_boards).post(handlers::create_board))
        .route(
            "/boards/{id}",
            get(handlers::get_board).put(handlers::update_board).delete(handlers::delete_board),
        )
        .route("/boards/{id}/order", put(handlers::reorder_lists))
        .route("/lists", post(handlers::create_list))
        .route(
            "/lists/{id}",
            get(handlers::get_list).put(handlers::update_list).delete(handlers::delete_list),
        )
        .route("/lists/{id}/order", put(handlers::reorder_cards))
        .route("/cards", post(handlers::create_card))
        .route(
            "/cards/{id}",
            get(handlers::get_card).put(handlers::update_card).delete(handlers::delete_card),
        )
        .route("/cards/{id}/comments", get(handlers::get_card_comments))
        .route("/comments", post(handlers::create_comment))
        .route(
            "/comments/{id}",
            get(handlers::get_comment).put(handlers::update_comment).delete(handlers::delete_comment),
        )
        .route("/checklists", post(handlers::create_checklist))
        .route(
            "/checklists/{id}",
            get(handlers::get_checklist)
                .put(handlers::update_checklist)
                .delete(handlers::delete_checklist),
        )
        .route("/checklists/{id}/order", put(handlers::reorder_checklist_items))
        .route("/checklistitems", post(handlers::create_checklist_item))
        .route(
            "/checklistitems/{id}",
            get(handlers::get_checklist_item)
                .put(handlers::update_checklist_item)
                .delete(handlers::delete_checklist_item),
        )
        .route("/backgrounds", get(handlers::get_backgrounds).post(handlers::create_background))
        .route(
            "/backgrounds/{id}",
            get(handlers::get_background).delete(handlers::delete_background),
        )
        .route("/logs", get(handlers::get_logs));

    axum::Router::new()
        .route("/healthcheck", get(monitoring::healthcheck))
        .route("/liveness", get(monitoring::liveness))
        .nest(API_PREFIX, api)
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::localize_errors))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::set_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
                .layer(middleware::propagate_request_id())
                .layer(middleware::cors_policy())
                .layer(middleware::compression()),
        )
        .with_state(state)
}
