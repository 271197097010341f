use axum::{
    Json,
    extract::{Form, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{self, AuthUser},
    models::{
        self, Comment, CommentForm, LoginForm, NewsDetail, NewsPage, Note, NoteForm, SignupForm,
        User, UserProfile, ValidationErrors,
    },
    policy::{self, ContentFilter},
};

// Fixed success location for every note mutation.
const NOTES_SUCCESS_URL: &str = "/notes/success";

// --- Query Structs ---

/// PageQuery
///
/// Accepted query parameters for the public news listing (GET /news).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// 1-based page number; anything missing or below 1 serves the first page.
    pub page: Option<i64>,
}

/// NextQuery
///
/// Carries the `next` parameter of the login redirect so a successful login
/// can resume the interrupted request.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NextQuery {
    pub next: Option<String>,
}

// Validation failures re-render with HTTP 200 and a field-scoped error body;
// the underlying storage is guaranteed untouched by the caller.
fn form_error(errors: ValidationErrors) -> Response {
    (StatusCode::OK, Json(errors)).into_response()
}

// Only same-site paths are acceptable post-login targets. A second leading
// slash would make the target protocol-relative, so it is rejected too.
fn safe_next(next: Option<String>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| "/news".to_string())
}

// --- Notes Handlers ---

/// list_notes
///
/// [Authenticated Route] Lists the requesting user's notes — and only theirs.
/// The owner scoping lives in the repository query, so other owners' notes
/// never reach this handler at all.
#[utoipa::path(
    get,
    path = "/notes",
    responses((status = 200, description = "Owner-scoped notes", body = [Note]))
)]
pub async fn list_notes(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Note>> {
    let notes = state.repo.list_notes(id).await;
    Json(notes)
}

/// note_form
///
/// [Authenticated Route] Serves the blank creation form payload.
#[utoipa::path(
    get,
    path = "/notes/add",
    responses((status = 200, description = "Blank note form", body = NoteForm))
)]
pub async fn note_form(_user: AuthUser) -> Json<NoteForm> {
    Json(NoteForm::default())
}

/// create_note
///
/// [Authenticated Route] Creates a note owned by the requesting user.
///
/// Slug policy, in order: shape (a submitted slug must be URL-safe and within
/// the column length), uniqueness (reject with the colliding slug plus the
/// configured warning suffix, nothing persisted), then derivation (a missing
/// slug is slugified from the title). The repository insert is a single
/// statement backed by a unique index, so a collision that slips past the
/// pre-check still cannot produce a partial write.
#[utoipa::path(
    post,
    path = "/notes/add",
    request_body = NoteForm,
    responses(
        (status = 303, description = "Created; redirect to the success view"),
        (status = 200, description = "Validation failure", body = ValidationErrors)
    )
)]
pub async fn create_note(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<NoteForm>,
) -> Response {
    let slug = match policy::resolve_slug(form.slug.as_deref(), &form.title) {
        Ok(slug) => slug,
        Err(error) => return form_error(ValidationErrors::single(error)),
    };

    if let Some(existing) = state.repo.find_note_by_slug(&slug).await {
        // Uniqueness is system-wide: colliding with your own note still counts.
        return form_error(ValidationErrors::single(policy::slug_collision_error(
            &existing.slug,
            &state.config.slug_warning,
        )));
    }

    match state
        .repo
        .create_note(user_id, &form.title, &form.text, &slug)
        .await
    {
        Some(_) => Redirect::to(NOTES_SUCCESS_URL).into_response(),
        // Lost the race against a concurrent creation; the unique index held.
        None => form_error(ValidationErrors::single(policy::slug_collision_error(
            &slug,
            &state.config.slug_warning,
        ))),
    }
}

/// note_detail
///
/// [Authenticated Route] Retrieves a single note through the ownership gate:
/// a non-owner receives 404, never a "forbidden" signal, so the note's
/// existence leaks to nobody but its owner.
#[utoipa::path(
    get,
    path = "/notes/{slug}",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Found", body = Note),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn note_detail(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<models::Note>, StatusCode> {
    state
        .repo
        .find_note_by_slug(&slug)
        .await
        .and_then(|note| policy::visible_to(note, user_id))
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// edit_note_form
///
/// [Authenticated Route] Serves the prefilled edit form for the owner.
/// Uses the owner-scoped repository fetch, so the 404 masking is enforced in
/// SQL here.
#[utoipa::path(
    get,
    path = "/notes/{slug}/edit",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Prefilled form", body = NoteForm),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn edit_note_form(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NoteForm>, StatusCode> {
    let note = state
        .repo
        .get_note(&slug, user_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(NoteForm {
        title: note.title,
        text: note.text,
        slug: Some(note.slug),
    }))
}

/// update_note
///
/// [Authenticated Route] Edits an owned note. Same slug policy as creation;
/// keeping the current slug is not a collision, taking another note's slug is.
/// A failed validation leaves the persisted note byte-for-byte unchanged.
#[utoipa::path(
    post,
    path = "/notes/{slug}/edit",
    params(("slug" = String, Path, description = "Note slug")),
    request_body = NoteForm,
    responses(
        (status = 303, description = "Updated; redirect to the success view"),
        (status = 200, description = "Validation failure", body = ValidationErrors),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn update_note(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<NoteForm>,
) -> Response {
    let Some(note) = state
        .repo
        .find_note_by_slug(&slug)
        .await
        .and_then(|note| policy::visible_to(note, user_id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let new_slug = match policy::resolve_slug(form.slug.as_deref(), &form.title) {
        Ok(slug) => slug,
        Err(error) => return form_error(ValidationErrors::single(error)),
    };

    if let Some(other) = state.repo.find_note_by_slug(&new_slug).await {
        if other.id != note.id {
            return form_error(ValidationErrors::single(policy::slug_collision_error(
                &other.slug,
                &state.config.slug_warning,
            )));
        }
    }

    match state
        .repo
        .update_note(note.id, user_id, &form.title, &form.text, &new_slug)
        .await
    {
        Some(_) => Redirect::to(NOTES_SUCCESS_URL).into_response(),
        None => form_error(ValidationErrors::single(policy::slug_collision_error(
            &new_slug,
            &state.config.slug_warning,
        ))),
    }
}

/// delete_note_confirm
///
/// [Authenticated Route] The owner's delete confirmation view. Non-owners get
/// the masked 404.
#[utoipa::path(
    get,
    path = "/notes/{slug}/delete",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Note pending deletion", body = Note),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_note_confirm(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<models::Note>, StatusCode> {
    state
        .repo
        .find_note_by_slug(&slug)
        .await
        .and_then(|note| policy::visible_to(note, user_id))
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// delete_note
///
/// [Authenticated Route] Deletes an owned note and redirects to the success
/// view. The repository predicate enforces ownership, so affecting zero rows
/// covers both "missing" and "not yours" with the same 404.
#[utoipa::path(
    delete,
    path = "/notes/{slug}/delete",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 303, description = "Deleted; redirect to the success view"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_note(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    if state.repo.delete_note(&slug, user_id).await {
        Redirect::to(NOTES_SUCCESS_URL).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// notes_success
///
/// [Authenticated Route] The fixed landing view after any note mutation.
#[utoipa::path(
    get,
    path = "/notes/success",
    responses((status = 200, description = "Operation completed"))
)]
pub async fn notes_success(_user: AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "detail": "done" }))
}

// --- News & Comments Handlers ---

/// news_home
///
/// [Public Route] Paginated news listing, newest first. Page size is the
/// configured constant; the page number is clamped to 1 from below.
#[utoipa::path(
    get,
    path = "/news",
    params(PageQuery),
    responses((status = 200, description = "Paginated news", body = NewsPage))
)]
pub async fn news_home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<NewsPage> {
    let page_size = state.config.news_page_size;
    let page = query.page.unwrap_or(1).max(1);
    // Saturating: an absurdly large page number serves an empty page rather
    // than overflowing the offset.
    let offset = page.saturating_sub(1).saturating_mul(page_size);

    let items = state.repo.list_news(page_size, offset).await;
    let total = state.repo.count_news().await;

    Json(NewsPage {
        items,
        page,
        page_size,
        total,
    })
}

/// news_detail
///
/// [Public Route] A single news item with its comment thread, oldest first.
/// Visible to anonymous and authenticated actors alike.
#[utoipa::path(
    get,
    path = "/news/{id}",
    params(("id" = i64, Path, description = "News ID")),
    responses(
        (status = 200, description = "Found", body = NewsDetail),
        (status = 404, description = "No such news item")
    )
)]
pub async fn news_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NewsDetail>, StatusCode> {
    let news = state.repo.get_news(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let comments = state.repo.get_comments(id).await;
    Ok(Json(NewsDetail { news, comments }))
}

/// add_comment
///
/// [Authenticated Route] Posts a comment under a news item. The content filter
/// runs before any persistence: a banned word rejects the write with a field
/// error on `text` and the comment count provably unchanged. Anonymous actors
/// never reach this body — the extractor redirects them to login.
#[utoipa::path(
    post,
    path = "/news/{id}",
    params(("id" = i64, Path, description = "News ID")),
    request_body = CommentForm,
    responses(
        (status = 303, description = "Created; redirect to the thread anchor"),
        (status = 200, description = "Validation failure", body = ValidationErrors),
        (status = 404, description = "No such news item")
    )
)]
pub async fn add_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(news_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Response {
    let filter = ContentFilter::new(&state.config.banned_words, &state.config.comment_warning);
    if let Err(error) = filter.check(&form.text) {
        return form_error(ValidationErrors::single(error));
    }

    match state.repo.create_comment(news_id, user_id, &form.text).await {
        Some(_) => Redirect::to(&comments_anchor(news_id)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// edit_comment_form
///
/// [Authenticated Route] Serves the prefilled edit form to the comment's
/// author; anyone else gets the masked 404.
#[utoipa::path(
    get,
    path = "/comments/{id}/edit",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Prefilled form", body = CommentForm),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn edit_comment_form(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CommentForm>, StatusCode> {
    state
        .repo
        .find_comment(id)
        .await
        .and_then(|comment| policy::visible_to(comment, user_id))
        .map(|comment| Json(CommentForm { text: comment.text }))
        .ok_or(StatusCode::NOT_FOUND)
}

/// update_comment
///
/// [Authenticated Route] Edits an owned comment, re-running the content filter
/// first; on success redirects back to the parent thread anchor.
#[utoipa::path(
    post,
    path = "/comments/{id}/edit",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentForm,
    responses(
        (status = 303, description = "Updated; redirect to the thread anchor"),
        (status = 200, description = "Validation failure", body = ValidationErrors),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn update_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(comment) = state
        .repo
        .find_comment(id)
        .await
        .and_then(|comment| policy::visible_to(comment, user_id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let filter = ContentFilter::new(&state.config.banned_words, &state.config.comment_warning);
    if let Err(error) = filter.check(&form.text) {
        return form_error(ValidationErrors::single(error));
    }

    match state.repo.update_comment(comment.id, user_id, &form.text).await {
        Some(updated) => Redirect::to(&comments_anchor(updated.news_id)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// delete_comment_confirm
///
/// [Authenticated Route] The author's delete confirmation view.
#[utoipa::path(
    get,
    path = "/comments/{id}/delete",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment pending deletion", body = Comment),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_comment_confirm(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<models::Comment>, StatusCode> {
    state
        .repo
        .find_comment(id)
        .await
        .and_then(|comment| policy::visible_to(comment, user_id))
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// delete_comment
///
/// [Authenticated Route] Deletes an owned comment and redirects back to the
/// parent news thread, anchored at the comments fragment.
#[utoipa::path(
    delete,
    path = "/comments/{id}/delete",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 303, description = "Deleted; redirect to the thread anchor"),
        (status = 404, description = "Missing or not yours")
    )
)]
pub async fn delete_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    // Fetch first: the redirect needs the parent news id, and the gate masks
    // foreign comments before any mutation is attempted.
    let Some(comment) = state
        .repo
        .find_comment(id)
        .await
        .and_then(|comment| policy::visible_to(comment, user_id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if state.repo.delete_comment(comment.id, user_id).await {
        Redirect::to(&comments_anchor(comment.news_id)).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn comments_anchor(news_id: i64) -> String {
    format!("/news/{news_id}#comments")
}

// --- Users Handlers ---

/// signup_form
///
/// [Public Route] Serves the blank signup form payload.
#[utoipa::path(
    get,
    path = "/auth/signup",
    responses((status = 200, description = "Blank signup form", body = SignupForm))
)]
pub async fn signup_form() -> Json<SignupForm> {
    Json(SignupForm::default())
}

/// signup
///
/// [Public Route] Creates a local identity and logs it in immediately. The
/// password is salted and hashed before persistence; a taken username is a
/// field-scoped validation failure, not an error.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupForm,
    responses(
        (status = 303, description = "Account created and logged in"),
        (status = 200, description = "Validation failure", body = ValidationErrors)
    )
)]
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let salt = Uuid::new_v4().simple().to_string();
    let user = User {
        id: Uuid::new_v4(),
        username: form.username,
        password_hash: auth::hash_password(&form.password, &salt),
        salt,
    };

    let Some(created) = state.repo.create_user(user).await else {
        return form_error(ValidationErrors::single(models::FieldError::new(
            "username",
            "A user with that username already exists.".to_string(),
        )));
    };

    establish_session(&state, created.id, "/news".to_string())
}

/// login_form
///
/// [Public Route] Serves the blank login form payload.
#[utoipa::path(
    get,
    path = "/auth/login",
    responses((status = 200, description = "Blank login form", body = LoginForm))
)]
pub async fn login_form() -> Json<LoginForm> {
    Json(LoginForm::default())
}

/// login
///
/// [Public Route] Verifies credentials, sets the session cookie, and resumes
/// the interrupted flow via the `next` parameter (same-site paths only).
#[utoipa::path(
    post,
    path = "/auth/login",
    params(NextQuery),
    request_body = LoginForm,
    responses(
        (status = 303, description = "Logged in; redirect to `next` or the news home"),
        (status = 200, description = "Bad credentials", body = ValidationErrors)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = state.repo.get_user_by_username(&form.username).await;
    let verified = user.filter(|u| auth::hash_password(&form.password, &u.salt) == u.password_hash);

    match verified {
        Some(user) => establish_session(&state, user.id, safe_next(query.next)),
        None => form_error(ValidationErrors::single(models::FieldError::new(
            "password",
            "Please enter a correct username and password.".to_string(),
        ))),
    }
}

/// logout
///
/// [Public Route] Discards the session cookie. Safe to call anonymously.
#[utoipa::path(
    get,
    path = "/auth/logout",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Json(serde_json::json!({ "detail": "logged out" })),
    )
        .into_response()
}

/// get_me
///
/// [Authenticated Route] The authenticated user's profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(AuthUser { id, username }: AuthUser) -> Json<UserProfile> {
    Json(UserProfile { id, username })
}

// Issues the session cookie and redirects to `target`. Token signing can only
// fail on serialization, which is treated as an internal error.
fn establish_session(state: &AppState, user_id: Uuid, target: String) -> Response {
    match auth::issue_session_token(user_id, &state.config.session_secret) {
        Ok(token) => (
            [(header::SET_COOKIE, auth::session_cookie(&token))],
            Redirect::to(&target),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("session token error: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
