/// Slug used when a title contains no alphanumeric characters at all.
const EMPTY_SLUG: &str = "article";

/// slugify
///
/// Generate a URL-safe slug from a title: lowercase ASCII alphanumerics, every other
/// run of characters collapsed into a single hyphen, no leading or trailing hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// unique_slug
///
/// Returns `base` if it is free, otherwise the first of `base-2`, `base-3`, ... for
/// which `is_taken` answers false.
pub fn unique_slug(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Bass Basics"), "bass-basics");
        assert_eq!(slugify("  Pike   Tips!! "), "pike-tips");
        assert_eq!(slugify("Fly-Fishing 101: The Basics"), "fly-fishing-101-the-basics");
    }

    #[test]
    fn slugify_drops_non_ascii_and_falls_back_when_empty() {
        assert_eq!(slugify("Café Trout"), "caf-trout");
        assert_eq!(slugify("!!!"), "article");
    }

    #[test]
    fn unique_slug_appends_first_free_suffix() {
        let taken = ["pike-tips", "pike-tips-2"];
        assert_eq!(unique_slug("pike-tips", |s| taken.contains(&s)), "pike-tips-3");
        assert_eq!(unique_slug("walleye", |s| taken.contains(&s)), "walleye");
    }
}
