use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::posts;
use crate::search;

/// CORS for every route: any origin, and every OPTIONS request is answered
/// here with an empty 200 before routing or auth.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(false)
}

/// All API routes with the auth gate and CORS applied.
pub fn app(state: AppState, max_image_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/post",
            post(posts::create_post).layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .route("/search", get(search::search_posts))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors())
}
