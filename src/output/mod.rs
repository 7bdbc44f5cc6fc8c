pub mod json;
pub mod table;

use regex::Regex;
use std::sync::OnceLock;

const SLUG_MAX_WORDS: usize = 10;

/// URL slug for a question: lowercase words joined by `-`, capped at ten words.
pub fn create_slug(content: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let re = NON_WORD.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

    let lower = content.to_lowercase();
    re.split(&lower)
        .filter(|w| !w.is_empty())
        .take(SLUG_MAX_WORDS)
        .collect::<Vec<_>>()
        .join("-")
}

/// Link to a question's detail page.
pub fn question_href(id: &str, content: &str) -> String {
    format!("/questions/{}/{}", id, create_slug(content))
}
