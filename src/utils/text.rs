/// Preview length for post excerpts, in characters.
const EXCERPT_LEN: usize = 150;

/// Derive the stored excerpt from post content at write time: the first 150
/// characters, with an ellipsis when the content was truncated.
pub fn make_excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let excerpt: String = chars.by_ref().take(EXCERPT_LEN).collect();
    if chars.next().is_some() {
        format!("{}...", excerpt)
    } else {
        excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_is_kept_verbatim() {
        assert_eq!(make_excerpt("Hello"), "Hello");
        assert_eq!(make_excerpt(""), "");
    }

    #[test]
    fn test_long_content_is_truncated_with_ellipsis() {
        let content = "a".repeat(200);
        let excerpt = make_excerpt(&content);
        assert_eq!(excerpt.len(), 153);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_exact_length_has_no_ellipsis() {
        let content = "b".repeat(150);
        assert_eq!(make_excerpt(&content), content);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let content = "é".repeat(200);
        let excerpt = make_excerpt(&content);
        assert_eq!(excerpt.chars().count(), 153);
    }
}
