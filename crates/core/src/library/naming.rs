use once_cell::sync::Lazy;
use regex_lite::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

const MAX_SLUG_LEN: usize = 50;

/// Lowercase, drop punctuation, collapse whitespace and dashes into single
/// dashes, and cap the length at 50 characters.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lower, "");
    let dashed = SEPARATORS.replace_all(cleaned.trim(), "-");
    truncate_slug(dashed.trim_matches('-'), MAX_SLUG_LEN)
}

/// Cut a slug to at most `max` characters without leaving a trailing dash.
pub fn truncate_slug(slug: &str, max: usize) -> String {
    let cut: String = slug.chars().take(max).collect();
    cut.trim_end_matches('-').to_string()
}

/// `name.ext` -> `name-{n}.ext`
pub(crate) fn with_counter(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", filename, n),
    }
}
