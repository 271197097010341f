use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Comment, News, Note, User};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the
/// core of the Repository Abstraction pattern, allowing the handlers to
/// interact with the data layer without knowing the specific implementation
/// (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Auth ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    // Returns None when the username is already taken.
    async fn create_user(&self, user: User) -> Option<User>;

    // --- Notes ---
    // Owner-scoped listing: the visible set is exactly the actor's own notes.
    async fn list_notes(&self, author_id: Uuid) -> Vec<Note>;
    // Owner-scoped single fetch: None when the note is missing OR not owned.
    async fn get_note(&self, slug: &str, author_id: Uuid) -> Option<Note>;
    // Unscoped fetch, used by the slug-uniqueness check and the ownership gate.
    async fn find_note_by_slug(&self, slug: &str) -> Option<Note>;
    // Returns None on a slug collision (unique-index backstop for the
    // application-level pre-check).
    async fn create_note(
        &self,
        author_id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Option<Note>;
    // Owner-only update; None when gone, not owned, or the new slug collides.
    async fn update_note(
        &self,
        id: Uuid,
        author_id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Option<Note>;
    // Owner-only: deletes only if `author_id` matches the note's owner.
    async fn delete_note(&self, slug: &str, author_id: Uuid) -> bool;

    // --- News (public, read-only) ---
    async fn list_news(&self, limit: i64, offset: i64) -> Vec<News>;
    async fn count_news(&self) -> i64;
    async fn get_news(&self, id: i64) -> Option<News>;

    // --- Comments ---
    // Ordered comment thread for a news item (oldest first).
    async fn get_comments(&self, news_id: i64) -> Vec<Comment>;
    // Unscoped fetch; the handler-level ownership gate masks foreign comments.
    async fn find_comment(&self, id: i64) -> Option<Comment>;
    // None when the parent news item does not exist.
    async fn create_comment(&self, news_id: i64, author_id: Uuid, text: &str) -> Option<Comment>;
    // Author-only update.
    async fn update_comment(&self, id: i64, author_id: Uuid, text: &str) -> Option<Comment>;
    // Author-only: deletes only if `author_id` matches the comment's author.
    async fn delete_comment(&self, id: i64, author_id: Uuid) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Slug uniqueness is enforced by a unique index (see schema.sql), so two
/// concurrent creations with the same derived slug cannot both succeed even if
/// they both pass the application-level pre-check.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Treats a unique-constraint violation as a modeled conflict (None) and logs
// everything else before degrading to None.
fn absorb_conflict<T>(context: &str, err: sqlx::Error) -> Option<T> {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return None;
        }
    }
    tracing::error!("{context} error: {err:?}");
    None
}

const USER_COLUMNS: &str = "id, username, password_hash, salt";
const NOTE_COLUMNS: &str = "id, title, text, slug, author_id";
const NEWS_COLUMNS: &str = "id, title, text, date";

#[async_trait]
impl Repository for PostgresRepository {
    /// get_user
    ///
    /// Retrieves the identity record needed for session validation.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {e:?}");
                None
            })
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_by_username error: {e:?}");
            None
        })
    }

    /// create_user
    ///
    /// Inserts a new identity record. The unique constraint on `username` makes
    /// duplicate handles a modeled conflict rather than an error.
    async fn create_user(&self, user: User) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, password_hash, salt) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .fetch_one(&self.pool)
        .await
        .map_or_else(|e| absorb_conflict("create_user", e), Some)
    }

    // --- NOTES ---

    /// list_notes
    ///
    /// **Security**: strictly owner-scoped. Other owners' notes must never
    /// appear in the returned collection.
    async fn list_notes(&self, author_id: Uuid) -> Vec<Note> {
        sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE author_id = $1 ORDER BY title ASC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_notes error: {e:?}");
            vec![]
        })
    }

    /// get_note
    ///
    /// Retrieves a note only if the querying user is the owner. A non-owner
    /// receives None, indistinguishable from a missing note.
    async fn get_note(&self, slug: &str, author_id: Uuid) -> Option<Note> {
        sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE slug = $1 AND author_id = $2"
        ))
        .bind(slug)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_note error: {e:?}");
            None
        })
    }

    async fn find_note_by_slug(&self, slug: &str) -> Option<Note> {
        sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_note_by_slug error: {e:?}");
                None
            })
    }

    /// create_note
    ///
    /// Single-statement insert: a rejected write (slug collision) leaves zero
    /// partial side effects.
    async fn create_note(
        &self,
        author_id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Option<Note> {
        sqlx::query_as::<_, Note>(&format!(
            "INSERT INTO notes (id, title, text, slug, author_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {NOTE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(text)
        .bind(slug)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_or_else(|e| absorb_conflict("create_note", e), Some)
    }

    /// update_note
    ///
    /// Updates a note only if `author_id` matches the owner — the Owner-Only
    /// check duplicated at the storage layer as defense in depth.
    async fn update_note(
        &self,
        id: Uuid,
        author_id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Option<Note> {
        sqlx::query_as::<_, Note>(&format!(
            "UPDATE notes SET title = $3, text = $4, slug = $5 \
             WHERE id = $1 AND author_id = $2 RETURNING {NOTE_COLUMNS}"
        ))
        .bind(id)
        .bind(author_id)
        .bind(title)
        .bind(text)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_or_else(|e| absorb_conflict("update_note", e), |note| note)
    }

    /// delete_note
    ///
    /// Deletes only when the owner matches; affecting zero rows covers both
    /// "missing" and "not yours".
    async fn delete_note(&self, slug: &str, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM notes WHERE slug = $1 AND author_id = $2")
            .bind(slug)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_note error: {e:?}");
                false
            }
        }
    }

    // --- NEWS ---

    /// list_news
    ///
    /// Public listing, newest first. Pagination happens here (LIMIT/OFFSET)
    /// rather than in the handler.
    async fn list_news(&self, limit: i64, offset: i64) -> Vec<News> {
        sqlx::query_as::<_, News>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news ORDER BY date DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_news error: {e:?}");
            vec![]
        })
    }

    async fn count_news(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("count_news error: {e:?}");
                0
            })
    }

    async fn get_news(&self, id: i64) -> Option<News> {
        sqlx::query_as::<_, News>(&format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_news error: {e:?}");
                None
            })
    }

    // --- COMMENTS ---

    /// get_comments
    ///
    /// The ordered thread under a news item, enriched with each author's
    /// username via a JOIN.
    async fn get_comments(&self, news_id: i64) -> Vec<Comment> {
        sqlx::query_as::<_, Comment>(
            "SELECT c.id, c.news_id, c.author_id, c.text, c.created, \
                    u.username AS author_username \
             FROM comments c \
             JOIN users u ON c.author_id = u.id \
             WHERE c.news_id = $1 \
             ORDER BY c.created ASC",
        )
        .bind(news_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_comments error: {e:?}");
            vec![]
        })
    }

    async fn find_comment(&self, id: i64) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(
            "SELECT c.id, c.news_id, c.author_id, c.text, c.created, \
                    u.username AS author_username \
             FROM comments c \
             JOIN users u ON c.author_id = u.id \
             WHERE c.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_comment error: {e:?}");
            None
        })
    }

    /// create_comment
    ///
    /// Uses a CTE to perform the insert and the author-username join in one
    /// statement. A missing parent news item violates the FK and resolves to
    /// None.
    async fn create_comment(&self, news_id: i64, author_id: Uuid, text: &str) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(
            "WITH inserted AS (\
                 INSERT INTO comments (news_id, author_id, text) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, news_id, author_id, text, created\
             ) \
             SELECT i.id, i.news_id, i.author_id, i.text, i.created, \
                    u.username AS author_username \
             FROM inserted i JOIN users u ON i.author_id = u.id",
        )
        .bind(news_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_or_else(
            |e| {
                tracing::error!("create_comment error: {e:?}");
                None
            },
            Some,
        )
    }

    /// update_comment
    ///
    /// Author-Only update at the storage layer.
    async fn update_comment(&self, id: i64, author_id: Uuid, text: &str) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(
            "UPDATE comments SET text = $3 \
             WHERE id = $1 AND author_id = $2 \
             RETURNING id, news_id, author_id, text, created",
        )
        .bind(id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_comment error: {e:?}");
            None
        })
    }

    /// delete_comment
    ///
    /// Deletes a comment only if `author_id` matches the comment author.
    async fn delete_comment(&self, id: i64, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_comment error: {e:?}");
                false
            }
        }
    }
}
