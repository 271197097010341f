/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// This structure ensures that access control is applied explicitly at the
/// module level (via Axum layers), preventing accidental exposure of protected
/// endpoints.

/// Routes accessible to all users (anonymous included): the public news
/// surface, the auth entry points, and the health probe. Comment creation also
/// lives here because it shares the news:detail path, but its handler demands
/// an identity and redirects anonymous actors to login.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware: everything under
/// /notes plus comment edit/delete. An anonymous request never reaches these
/// handlers; the rejection is a redirect to `{login_url}?next={path}`.
pub mod authenticated;
