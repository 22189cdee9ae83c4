/*
 * Name resolution helpers shared by the mutation engine: auto-suffixing of
 * labels and titles so they stay unique within their scope, derivation of
 * URL-safe page ids from item labels, and display names for uploaded files.
 */

/*
 * Returns `wanted` if no existing name equals it, otherwise the first of
 * `"wanted (2)"`, `"wanted (3)"`, ... that is free. Comparison is case-sensitive.
 */
pub fn unique_name<'a, I>(wanted: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<&str> = existing.into_iter().collect();
    if !taken.contains(&wanted) {
        return wanted.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{wanted} ({n})");
        if !taken.iter().any(|name| *name == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/*
 * Derives a page id from a label: lowercase ASCII alphanumerics, every other run
 * of characters collapsed into a single '-', no leading or trailing '-'.
 * Labels without any usable character map to "page".
 */
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

/* Like `unique_name`, but suffixes slugs as `base-2`, `base-3`, ... */
pub fn unique_slug<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<&str> = existing.into_iter().collect();
    if !taken.contains(&base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.iter().any(|id| *id == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/* Splits "notes.final.pdf" into ("notes.final", ".pdf"). Dotfiles have no extension. */
pub fn split_ext(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/*
 * The name a file should be shown under when the user asked for `desired`.
 * A blank request keeps `fallback`. A request without its own extension keeps
 * the extension of `fallback`.
 */
pub fn display_name(desired: &str, fallback: &str) -> String {
    let desired = desired.trim();
    if desired.is_empty() {
        return fallback.to_string();
    }
    if desired.contains('.') && !desired.ends_with('.') {
        return desired.to_string();
    }
    let (_, ext) = split_ext(fallback);
    format!("{desired}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_free_name_is_kept() {
        assert_eq!(unique_name("Notes", ["Intro", "Quiz"]), "Notes");
    }

    #[test]
    fn test_unique_name_suffixes_in_order() {
        assert_eq!(unique_name("Notes", ["Notes"]), "Notes (2)");
        assert_eq!(unique_name("Notes", ["Notes", "Notes (2)"]), "Notes (3)");
        assert_eq!(unique_name("Notes", ["Notes", "Notes (3)"]), "Notes (2)");
    }

    #[test]
    fn test_unique_name_is_case_sensitive() {
        assert_eq!(unique_name("notes", ["Notes"]), "notes");
    }

    #[test]
    fn test_slugify_variations() {
        assert_eq!(slugify("Course Overview"), "course-overview");
        assert_eq!(slugify("  Week 1: Intro!  "), "week-1-intro");
        assert_eq!(slugify("Notes (2)"), "notes-2");
        assert_eq!(slugify("???"), "page");
        assert_eq!(slugify("Ünïcode"), "n-code");
    }

    #[test]
    fn test_unique_slug_suffixes() {
        assert_eq!(unique_slug("notes", ["intro"]), "notes");
        assert_eq!(unique_slug("notes", ["notes", "notes-2"]), "notes-3");
    }

    #[test]
    fn test_split_ext() {
        assert_eq!(split_ext("notes.final.pdf"), ("notes.final", ".pdf"));
        assert_eq!(split_ext("README"), ("README", ""));
        assert_eq!(split_ext(".bashrc"), (".bashrc", ""));
    }

    #[test]
    fn test_display_name_keeps_extension_when_omitted() {
        assert_eq!(display_name("Week 1 slides", "slides.pdf"), "Week 1 slides.pdf");
        assert_eq!(display_name("  Handout.docx ", "slides.pdf"), "Handout.docx");
        assert_eq!(display_name("Draft.", "slides.pdf"), "Draft..pdf");
        assert_eq!(display_name("   ", "slides.pdf"), "slides.pdf");
        assert_eq!(display_name("Notes", "README"), "Notes");
    }
}
