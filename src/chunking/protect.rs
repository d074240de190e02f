//! Sections that must stay in one chunk.
//!
//! A question like "list all the recommendations" is only answerable if the
//! recommendations section is retrieved as a single unit.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Normalized keywords. `recommandation` also covers the plural.
pub const PROTECTED_KEYWORDS: &[&str] = &["recommandation", "conclusion", "synthese", "recapitulatif"];

/// Lowercase and strip diacritics (NFD, then drop combining marks).
pub fn fold_title(title: &str) -> String {
    title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// True when the title names a recommendations, conclusion, summary or recap section.
pub fn is_protected(title: Option<&str>) -> bool {
    let title = match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return false,
    };
    let folded = fold_title(title);
    PROTECTED_KEYWORDS.iter().any(|keyword| folded.contains(keyword))
}
