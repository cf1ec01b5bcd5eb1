//! Placeholder lines left behind for removed ranges.

use super::model::{PlaceholderMode, PlaceholderPolicy};

/// Renders a single placeholder line (no trailing newline). Returns an
/// empty string when the policy suppresses placeholders.
pub fn render_placeholder(
    lines_removed: usize,
    bytes_removed: usize,
    title: Option<&str>,
    policy: &PlaceholderPolicy,
    override_template: Option<&str>,
) -> String {
    if policy.mode == PlaceholderMode::None {
        return String::new();
    }

    let template = override_template
        .or(policy.template.as_deref())
        .unwrap_or("> *(omitted)*")
        .trim();

    template
        .replace("{title}", title.unwrap_or("section"))
        .replace("{lines}", &lines_removed.to_string())
        .replace("{bytes}", &bytes_removed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_fields() {
        let policy = PlaceholderPolicy {
            mode: PlaceholderMode::Summary,
            template: Some("{title}: -{lines} lines, -{bytes} bytes".to_string()),
        };
        let line = render_placeholder(3, 42, Some("Intro"), &policy, None);
        assert_eq!(line, "Intro: -3 lines, -42 bytes");
    }

    #[test]
    fn rule_override_wins() {
        let policy = PlaceholderPolicy {
            mode: PlaceholderMode::Summary,
            template: Some("policy".to_string()),
        };
        let line = render_placeholder(1, 1, None, &policy, Some("rule {lines}"));
        assert_eq!(line, "rule 1");
    }
}
