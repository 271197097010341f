use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Public Router Module
///
/// Defines endpoints that are reachable without a session. News content is
/// public by design — visible to anonymous and authenticated actors alike —
/// and the auth entry points must obviously be open.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /news?page=...
        // The paginated public news listing, newest first.
        .route("/news", get(handlers::news_home))
        // GET /news/{id} — public detail view with the ordered comment thread.
        // POST /news/{id} — comment creation. The handler's AuthUser extractor
        // turns anonymous posts into a login redirect before anything runs.
        .route(
            "/news/{id}",
            get(handlers::news_detail).post(handlers::add_comment),
        )
        // GET/POST /auth/signup
        .route(
            "/auth/signup",
            get(handlers::signup_form).post(handlers::signup),
        )
        // GET/POST /auth/login
        // The login entry point every anonymous redirect targets; `?next=`
        // carries the path to resume after authentication.
        .route(
            "/auth/login",
            get(handlers::login_form).post(handlers::login),
        )
        // GET/POST /auth/logout
        .route(
            "/auth/logout",
            get(handlers::logout).post(handlers::logout),
        )
}
