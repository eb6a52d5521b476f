//! Deterministic branch naming for started tasks.

const SLUG_MAX_CHARS: usize = 30;
const BRANCH_PREFIX: &str = "feature/task-";

/// Derives the branch name for a task from its id and title.
///
/// The first 8 characters of the id are combined with a slug of the
/// title: non-ASCII characters are dropped (not transliterated), runs of
/// remaining non-alphanumerics become a single `-`, the slug is trimmed,
/// lower-cased and capped at 30 characters. A title with no Latin
/// alphanumerics yields `feature/task-<id8>` with no trailing separator.
pub fn derive_branch_name(id: &str, title: &str) -> String {
    let id8: String = id.chars().take(8).collect();
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{BRANCH_PREFIX}{id8}")
    } else {
        format!("{BRANCH_PREFIX}{id8}-{slug}")
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for ch in title.chars().filter(char::is_ascii) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-').to_ascii_lowercase();
    trimmed.chars().take(SLUG_MAX_CHARS).collect()
}
