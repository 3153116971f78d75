//! Label text shown above a hovered note.
//!
//! Rules:
//! - whitespace runs (including newlines) collapse to one space;
//! - empty content shows a placeholder;
//! - text longer than the limit is cut and suffixed with `...`.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMPTY_NOTE_LABEL: &str = "(empty note)";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Derives the single-line label text for `content`.
pub fn label_text(content: &str, max_chars: usize) -> String {
    let collapsed = WHITESPACE_RE.replace_all(content, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        return EMPTY_NOTE_LABEL.to_string();
    }
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(max_chars).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{label_text, EMPTY_NOTE_LABEL};

    #[test]
    fn collapses_whitespace() {
        assert_eq!(label_text("  buy\n\n  lamp\t", 80), "buy lamp");
    }

    #[test]
    fn empty_content_uses_placeholder() {
        assert_eq!(label_text(" \n ", 80), EMPTY_NOTE_LABEL);
    }

    #[test]
    fn long_content_is_cut_on_char_boundaries() {
        assert_eq!(label_text("move the rug left", 9), "move the...");
        assert_eq!(label_text("ääääää", 3), "äää...");
    }
}
