use ammonia::Builder;
use once_cell::sync::Lazy;

/// Cleaner for post bodies produced by the rich-text editor. Keeps the
/// formatting tags the editor emits, drops scripts, event handlers and
/// anything else ammonia considers unsafe.
static POST_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .add_generic_attributes(&["class"])
        .link_rel(Some("noopener noreferrer"));
    builder
});

/// Cleaner for comments: plain formatting only, no images or headings.
static COMMENT_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder.rm_tags(&["img", "h1", "h2", "h3", "h4", "h5", "h6"]);
    builder
});

pub fn clean_post_html(content: &str) -> String {
    POST_CLEANER.clean(content).to_string()
}

pub fn clean_comment_html(content: &str) -> String {
    COMMENT_CLEANER.clean(content).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_are_stripped() {
        let dirty = r#"<p>hi</p><script>alert(1)</script>"#;
        assert_eq!(clean_post_html(dirty), "<p>hi</p>");
    }

    #[test]
    fn test_event_handlers_are_stripped() {
        let dirty = r#"<p onclick="steal()">hi</p>"#;
        assert_eq!(clean_post_html(dirty), "<p>hi</p>");
    }

    #[test]
    fn test_comments_drop_images() {
        let dirty = r#"<p>nice</p><img src="x.png">"#;
        assert_eq!(clean_comment_html(dirty), "<p>nice</p>");
    }
}
