use uuid::Uuid;

use crate::models::{Comment, FieldError, Note};

// Derived slugs are capped the way the persisted column is.
const MAX_SLUG_LEN: usize = 100;

/// Owned
///
/// The polymorphic "owned resource" capability. Notes and comments share one
/// ownership rule, so the gate below is implemented once against this trait
/// instead of being duplicated per entity kind.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Note {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

/// visible_to
///
/// The ownership gate for single-resource operations (detail/edit/delete).
/// Returns the resource only when the acting identity owns it; otherwise the
/// resource is masked as absent. Callers map `None` to a not-found response,
/// never to a "forbidden" signal — a non-owner must not learn the resource
/// exists.
pub fn visible_to<R: Owned>(resource: R, actor: Uuid) -> Option<R> {
    (resource.owner_id() == actor).then_some(resource)
}

/// slugify
///
/// Derives a URL-safe slug from a title. Pure and deterministic: the same
/// title always yields the same slug. Lowercases, folds common accented Latin
/// characters to ASCII, collapses every run of other characters into a single
/// hyphen, and trims leading/trailing hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        let folded = fold_char(ch);
        if folded.is_empty() {
            // Anything unmappable acts as a separator between kept runs.
            pending_separator = !slug.is_empty();
            continue;
        }
        if pending_separator {
            slug.push('-');
            pending_separator = false;
        }
        slug.push_str(folded);
    }

    slug.truncate(MAX_SLUG_LEN);
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// Maps a lowercased character to its slug representation. ASCII alphanumerics
// pass through; a small transliteration table covers the accented Latin range;
// everything else is dropped (and treated as a separator by the caller).
fn fold_char(ch: char) -> &'static str {
    match ch {
        'a' => "a", 'b' => "b", 'c' => "c", 'd' => "d", 'e' => "e", 'f' => "f",
        'g' => "g", 'h' => "h", 'i' => "i", 'j' => "j", 'k' => "k", 'l' => "l",
        'm' => "m", 'n' => "n", 'o' => "o", 'p' => "p", 'q' => "q", 'r' => "r",
        's' => "s", 't' => "t", 'u' => "u", 'v' => "v", 'w' => "w", 'x' => "x",
        'y' => "y", 'z' => "z",
        '0' => "0", '1' => "1", '2' => "2", '3' => "3", '4' => "4",
        '5' => "5", '6' => "6", '7' => "7", '8' => "8", '9' => "9",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => "",
    }
}

/// resolve_slug
///
/// The derivation half of the slug policy: an explicitly submitted, non-blank
/// slug wins once it passes shape validation; otherwise one is derived from
/// the title. Applies identically to creation and editing. Derived slugs are
/// valid by construction, so only submitted values are checked.
pub fn resolve_slug(submitted: Option<&str>, title: &str) -> Result<String, FieldError> {
    match submitted.map(str::trim) {
        Some(s) if !s.is_empty() => {
            validate_slug(s)?;
            Ok(s.to_string())
        }
        _ => Ok(slugify(title)),
    }
}

// Shape check for submitted slugs: URL-safe charset and the persisted column's
// length cap. Rejections are field errors on the slug input, distinct from the
// collision error.
fn validate_slug(slug: &str) -> Result<(), FieldError> {
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FieldError::new(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
                .to_string(),
        ));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(FieldError::new(
            "slug",
            format!("Ensure the slug has at most {MAX_SLUG_LEN} characters."),
        ));
    }
    Ok(())
}

/// slug_collision_error
///
/// The field error surfaced when a submitted slug already belongs to another
/// note: the colliding value concatenated with the configured warning suffix,
/// bound to the `slug` input.
pub fn slug_collision_error(colliding_slug: &str, warning: &str) -> FieldError {
    FieldError::new("slug", format!("{colliding_slug}{warning}"))
}

/// ContentFilter
///
/// Banned-word scanner for comment text. Constructed from configuration values
/// so it stays pure and independently testable; it owns no global state.
pub struct ContentFilter {
    banned_words: Vec<String>,
    warning: String,
}

impl ContentFilter {
    /// Builds a filter over the configured word list. Words are expected
    /// lowercase (AppConfig normalizes them on load).
    pub fn new(banned_words: &[String], warning: &str) -> Self {
        Self {
            banned_words: banned_words.to_vec(),
            warning: warning.to_string(),
        }
    }

    /// Scans `text` for any banned word as a substring of the lowercased text.
    /// On a match returns the fixed warning bound to the `text` field; the
    /// caller must reject the write and leave persisted state unchanged.
    pub fn check(&self, text: &str) -> Result<(), FieldError> {
        let lowered = text.to_lowercase();
        if self.banned_words.iter().any(|word| lowered.contains(word)) {
            return Err(FieldError::new("text", self.warning.clone()));
        }
        Ok(())
    }
}
