use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record stored in the `users` table. The password material
/// (hash + salt) never leaves the backend; responses use `UserProfile` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    // The user's unique handle, used for login and display.
    pub username: String,
    // Hex-encoded salted SHA-256 digest of the password.
    pub password_hash: String,
    // Per-user random salt mixed into the digest.
    pub salt: String,
}

/// Note
///
/// A personal note from the `notes` table. Notes are strictly owner-scoped:
/// every read or write outside the owner's session must behave as if the
/// record did not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    /// URL-safe identifier, unique across ALL notes (not per owner).
    /// Backed by a unique index; see schema.sql.
    pub slug: String,
    // FK to users.id (Owner).
    pub author_id: Uuid,
}

/// News
///
/// A publicly visible news item from the `news` table. News records are seeded
/// out-of-band and are read-only through this API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
}

/// Comment
///
/// A comment attached to a news item, augmented with the author's username
/// (a join operation). Only the author may edit or delete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub news_id: i64,
    // FK to users.id (Author).
    pub author_id: Uuid,
    pub text: String,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    // Loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author_username: Option<String>,
}

/// --- Request Payloads (Input Schemas) ---

/// NoteForm
///
/// Input payload for creating or editing a note. The slug is optional: when it
/// is omitted (or blank) the server derives one from the title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NoteForm {
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// CommentForm
///
/// Input payload for posting or editing a comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentForm {
    pub text: String,
}

/// SignupForm
///
/// Input payload for the public signup endpoint. The password is hashed with a
/// per-user salt before persistence and never stored or logged in clear text.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
}

/// LoginForm
///
/// Input payload for the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// --- Validation & Response Schemas (Output) ---

/// FieldError
///
/// A single validation failure bound to the offending form field. This is the
/// rendering-independent replacement for framework form-error binding: the
/// client decides how to surface the (field, message) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
        }
    }
}

/// ValidationErrors
///
/// The body of a rejected form submission. Returned with HTTP 200 so the
/// client re-renders the form; the persisted state is guaranteed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// UserProfile
///
/// Output schema for the authenticated user. Strips password material.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
}

/// NewsPage
///
/// Output schema for the paginated news home listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewsPage {
    pub items: Vec<News>,
    /// 1-based page number actually served.
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// NewsDetail
///
/// Output schema for a single news item with its ordered comment thread
/// (oldest first). The comment form is rendered client-side; this payload is
/// the data it binds to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<Comment>,
}
