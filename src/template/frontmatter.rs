//! YAML frontmatter of context and template files.
//!
//! A frontmatter block is delimited by lines consisting solely of `---`
//! (optional trailing whitespace); the opening delimiter must be the very
//! first line. Parse failures and non-mapping documents are silently
//! treated as "no frontmatter".

use serde::Serialize;
use serde_yaml::Value;

/// Parsed frontmatter of a context file. Only the `include` key is
/// recognized; it accepts a string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextFrontmatter {
    pub include: Vec<String>,
}

impl ContextFrontmatter {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    fn from_value(value: &Value) -> Option<Self> {
        let mapping = value.as_mapping()?;
        let mut frontmatter = Self::default();
        if let Some(include) = mapping.get("include") {
            match include {
                Value::String(s) => frontmatter.include.push(s.clone()),
                Value::Sequence(seq) => {
                    for item in seq {
                        if let Value::String(s) = item {
                            frontmatter.include.push(s.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        Some(frontmatter)
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Splits frontmatter off a file. Returns the metadata (if a well-formed
/// block was found) and the remaining text.
pub fn parse_frontmatter(text: &str) -> (Option<ContextFrontmatter>, &str) {
    let mut lines = text.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return (None, text);
    };
    if !is_delimiter(first) {
        return (None, text);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if is_delimiter(line) {
            let yaml_src = &text[yaml_start..offset];
            let remaining = &text[offset + line.len()..];
            return match parse_yaml_block(yaml_src) {
                Some(frontmatter) => (Some(frontmatter), remaining),
                None => (None, text),
            };
        }
        offset += line.len();
    }

    // opening delimiter without a closing one
    (None, text)
}

fn parse_yaml_block(yaml_src: &str) -> Option<ContextFrontmatter> {
    if yaml_src.trim().is_empty() {
        return Some(ContextFrontmatter::default());
    }
    match serde_yaml::from_str::<Value>(yaml_src) {
        Ok(value) => ContextFrontmatter::from_value(&value),
        Err(_) => None,
    }
}

/// Remaining text with any frontmatter removed.
pub fn strip_frontmatter(text: &str) -> &str {
    parse_frontmatter(text).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_include_list() {
        let (fm, rest) = parse_frontmatter("---\ninclude: [base, extra]\n---\n# Body\n");
        assert_eq!(fm.unwrap().include, vec!["base", "extra"]);
        assert_eq!(rest, "# Body\n");
    }

    #[test]
    fn include_string_becomes_single_entry() {
        let (fm, _) = parse_frontmatter("---\ninclude: base\n---\n");
        assert_eq!(fm.unwrap().include, vec!["base"]);
    }

    #[test]
    fn empty_frontmatter_strips_delimiters() {
        let (fm, rest) = parse_frontmatter("---\n---\nbody");
        assert_eq!(fm, Some(ContextFrontmatter::default()));
        assert_eq!(rest, "body");
    }

    #[test]
    fn unterminated_block_is_no_frontmatter() {
        let text = "---\ninclude: base\nbody";
        assert_eq!(parse_frontmatter(text), (None, text));
    }

    #[test]
    fn non_mapping_yaml_is_ignored() {
        let text = "---\n- just\n- a list\n---\nbody";
        assert_eq!(parse_frontmatter(text), (None, text));
    }

    #[test]
    fn invalid_yaml_is_ignored() {
        let text = "---\n{broken\n---\nbody";
        assert_eq!(parse_frontmatter(text), (None, text));
    }

    #[test]
    fn mid_file_delimiters_are_not_frontmatter() {
        let text = "intro\n---\nx\n---\n";
        assert_eq!(parse_frontmatter(text), (None, text));
    }
}
