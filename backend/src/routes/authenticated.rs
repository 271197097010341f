use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the routes that require a live session: the whole notes surface and
/// comment mutation. Every handler here relies on the `AuthUser` extractor
/// middleware being layered above this module, which guarantees anonymous
/// requests are redirected to login before any handler runs. Ownership checks
/// (owner-scoped queries and the masking gate) happen inside the handlers and
/// the repository on top of that.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /notes — the owner-scoped listing.
        .route("/notes", get(handlers::list_notes))
        // GET/POST /notes/add — creation form and submission. Slug uniqueness
        // and derivation are enforced in the handler's slug policy.
        .route(
            "/notes/add",
            get(handlers::note_form).post(handlers::create_note),
        )
        // GET /notes/success — the fixed post-mutation landing view.
        // Registered before the {slug} capture so the literal segment wins.
        .route("/notes/success", get(handlers::notes_success))
        // GET /notes/{slug} — owner-only detail, masked 404 for anyone else.
        .route("/notes/{slug}", get(handlers::note_detail))
        // GET/POST /notes/{slug}/edit
        .route(
            "/notes/{slug}/edit",
            get(handlers::edit_note_form).post(handlers::update_note),
        )
        // GET/POST/DELETE /notes/{slug}/delete — GET serves the owner's
        // confirmation view; POST and DELETE both perform the deletion.
        .route(
            "/notes/{slug}/delete",
            get(handlers::delete_note_confirm)
                .post(handlers::delete_note)
                .delete(handlers::delete_note),
        )
        // --- Comment mutation (author-only) ---
        .route(
            "/comments/{id}/edit",
            get(handlers::edit_comment_form).post(handlers::update_comment),
        )
        .route(
            "/comments/{id}/delete",
            get(handlers::delete_comment_confirm)
                .post(handlers::delete_comment)
                .delete(handlers::delete_comment),
        )
        // GET /me — the session's profile.
        .route("/me", get(handlers::get_me))
}
