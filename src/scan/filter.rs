//! Class-token and attribute filters.

use regex::Regex;

use crate::debug;

/// Decides which class tokens are utility candidates.
///
/// A token is rejected when it matches an ignore pattern (syntax
/// highlighter and copy-button classes by default), starts with a
/// placeholder/magic prefix, or contains template punctuation.
#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    patterns: Vec<Regex>,
    prefixes: Vec<String>,
}

impl ClassFilter {
    pub fn new<P, S>(patterns: P, prefixes: impl IntoIterator<Item = S>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self {
            patterns: Vec::new(),
            prefixes: prefixes.into_iter().map(|p| p.as_ref().to_string()).collect(),
        };
        for pattern in patterns {
            filter.add_pattern(pattern.as_ref());
        }
        filter
    }

    /// Register an ignore pattern.
    ///
    /// The pattern is compiled as a regex; text that is not a valid regex is
    /// matched literally as a class prefix.
    pub fn add_pattern(&mut self, pattern: &str) {
        let regex = Regex::new(pattern).or_else(|e| {
            debug!("scan"; "pattern `{}` is not a regex ({}), matching literally", pattern, e);
            Regex::new(&format!("^{}", regex::escape(pattern)))
        });
        match regex {
            Ok(regex) => self.patterns.push(regex),
            Err(e) => crate::log!("scan"; "ignoring pattern `{}`: {}", pattern, e),
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Whether `token` should be treated as a utility class candidate.
    pub fn accepts(&self, token: &str) -> bool {
        if token.is_empty() || has_template_syntax(token) {
            return false;
        }
        if self.prefixes.iter().any(|p| token.starts_with(p.as_str())) {
            return false;
        }
        !self.patterns.iter().any(|re| re.is_match(token))
    }
}

fn has_template_syntax(token: &str) -> bool {
    token
        .chars()
        .any(|c| matches!(c, '{' | '}' | '"' | '\'' | '`' | '=' | '<' | '>' | ';' | '(' | ')'))
}

/// Attribute names whose mutations never matter.
///
/// Entries ending in `*` match by prefix (`aria-*`).
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    names: Vec<String>,
}

impl AttributeFilter {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, attribute: &str) -> bool {
        self.names.iter().any(|name| match name.strip_suffix('*') {
            Some(prefix) => attribute.starts_with(prefix),
            None => name.eq_ignore_ascii_case(attribute),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> ClassFilter {
        ClassFilter::new(["^hljs", "^language-", "^copy-"], ["$", "{{", "@", ":"])
    }

    #[test]
    fn test_accepts_utilities() {
        let f = default_filter();
        assert!(f.accepts("color-primary-bg"));
        assert!(f.accepts("hover:bg-primary"));
        assert!(f.accepts("w-1/2"));
    }

    #[test]
    fn test_rejects_ignored_patterns() {
        let f = default_filter();
        assert!(!f.accepts("hljs-keyword"));
        assert!(!f.accepts("language-rust"));
        assert!(!f.accepts("copy-button"));
    }

    #[test]
    fn test_rejects_placeholders_and_templates() {
        let f = default_filter();
        assert!(!f.accepts("$store"));
        assert!(!f.accepts("{{cls}}"));
        assert!(!f.accepts("${active}"));
        assert!(!f.accepts("a=b"));
        assert!(!f.accepts(""));
    }

    #[test]
    fn test_invalid_regex_matched_literally() {
        let mut f = ClassFilter::default();
        f.add_pattern("btn[");
        assert_eq!(f.pattern_count(), 1);
        assert!(!f.accepts("btn[primary"));
        assert!(f.accepts("btn-primary"));
    }

    #[test]
    fn test_attribute_filter() {
        let f = AttributeFilter::new(["id", "aria-*", "data-order"]);
        assert!(f.is_ignored("aria-hidden"));
        assert!(f.is_ignored("id"));
        assert!(f.is_ignored("data-order"));
        assert!(!f.is_ignored("class"));
        assert!(!f.is_ignored("data-component"));
    }
}
