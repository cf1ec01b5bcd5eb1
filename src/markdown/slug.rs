//! GitHub-style heading slugs.

use unicode_normalization::UnicodeNormalization;

/// Approximates GitHub's anchor slugs: NFKD fold, lowercase, spaces to
/// hyphens, punctuation removed, repeated hyphens squeezed, edges trimmed.
pub fn slugify_github(title: &str) -> String {
    let folded: String = title.trim().nfkd().collect::<String>().to_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut prev_hyphen = false;
    for ch in folded.chars() {
        let mapped = if ch.is_whitespace() { '-' } else { ch };
        if mapped == '-' || mapped.is_ascii_lowercase() || mapped.is_ascii_digit() {
            if mapped == '-' {
                if prev_hyphen {
                    continue;
                }
                prev_hyphen = true;
            } else {
                prev_hyphen = false;
            }
            slug.push(mapped);
        }
    }

    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_titles() {
        assert_eq!(slugify_github("Getting Started"), "getting-started");
        assert_eq!(slugify_github("FAQ: Common Questions"), "faq-common-questions");
        assert_eq!(slugify_github("API & Usage"), "api-usage");
    }

    #[test]
    fn squeezes_and_trims_hyphens() {
        assert_eq!(slugify_github("  a -- b  "), "a-b");
        assert_eq!(slugify_github("--edge--"), "edge");
    }

    #[test]
    fn folds_unicode() {
        assert_eq!(slugify_github("Café Menü"), "cafe-menu");
    }
}
