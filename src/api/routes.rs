use axum::http::HeaderValue;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::auth;

pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let card_routes = Router::new()
        .route(
            "/",
            get(handlers::cards::list_cards).post(handlers::cards::create_card),
        )
        .route(
            "/{id}",
            get(handlers::cards::get_card)
                .patch(handlers::cards::update_card)
                .delete(handlers::cards::delete_card),
        )
        .route("/{id}/move", patch(handlers::cards::move_card))
        .route("/{id}/tasks", put(handlers::cards::update_tasks))
        .route("/{id}/labels", post(handlers::cards::add_label))
        .route("/{id}/labels/{label}", delete(handlers::cards::remove_label));

    let board_routes = Router::new()
        .route(
            "/",
            get(handlers::boards::list_boards).post(handlers::boards::create_board),
        )
        .route(
            "/{id}",
            get(handlers::boards::get_board)
                .patch(handlers::boards::update_board)
                .delete(handlers::boards::delete_board),
        )
        .route("/{id}/columns", put(handlers::boards::update_columns));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/api/auth/register", post(auth::handlers::register))
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/auth/refresh", post(auth::handlers::refresh));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::handlers::me))
        .nest("/api/boards", board_routes)
        .nest("/api/cards", card_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
