use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9\-_]").unwrap()
});

static HYPHEN_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-+").unwrap()
});

/// Generate a URL-friendly slug from a post title.
pub fn generate_slug(title: &str) -> String {
    let mut slug = title.to_lowercase();

    slug = slug.replace(' ', "-");

    // Strip everything that is not alphanumeric, hyphen or underscore
    slug = SLUG_REGEX.replace_all(&slug, "").to_string();

    // Collapse consecutive hyphens
    slug = HYPHEN_RUN_REGEX.replace_all(&slug, "-").to_string();

    slug = slug.trim_matches('-').to_string();

    // Cap the length, avoiding a cut in the middle of a word
    if slug.len() > 100 {
        slug = slug.chars().take(100).collect();
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > 50 {
                slug = slug[..last_hyphen].to_string();
            }
        }
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// First candidate for a new post: base slug plus the last four digits of
/// the current unix-millisecond clock. Unique enough in practice; the post
/// service retries with `with_random_suffix` when the UNIQUE index disagrees.
pub fn with_time_suffix(base: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("{}-{:04}", base, millis % 10_000)
}

/// Retry candidate after a slug collision: base slug plus a random
/// four-digit suffix.
pub fn with_random_suffix(base: &str) -> String {
    let n: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{:04}", base, n)
}

/// Validate slug format (route parameters).
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 110 {
        return false;
    }

    static VALID_CHARS: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap()
    });
    if !VALID_CHARS.is_match(slug) {
        return false;
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return false;
    }

    if slug.contains("--") {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("How to Build a Blog in Rust"), "how-to-build-a-blog-in-rust");
        assert_eq!(generate_slug("JavaScript: The Good Parts"), "javascript-the-good-parts");
        assert_eq!(generate_slug("Hello, World! How are you?"), "hello-world-how-are-you");
        assert_eq!(generate_slug(""), "untitled");
        assert_eq!(generate_slug("   "), "untitled");
        assert_eq!(generate_slug("---"), "untitled");
    }

    #[test]
    fn test_suffixed_slugs_stay_valid() {
        let slug = with_time_suffix(&generate_slug("Hello World"));
        assert!(slug.starts_with("hello-world-"));
        assert!(is_valid_slug(&slug));

        let slug = with_random_suffix("hello-world");
        assert_eq!(slug.len(), "hello-world-".len() + 4);
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("hello-world"));
        assert!(is_valid_slug("hello_world"));
        assert!(is_valid_slug("hello123"));
        assert!(is_valid_slug("hello-world-1234"));

        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-hello"));
        assert!(!is_valid_slug("hello-"));
        assert!(!is_valid_slug("hello--world"));
        assert!(!is_valid_slug("hello world"));
        assert!(!is_valid_slug("hello@world"));
    }
}
