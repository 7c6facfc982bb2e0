//! Utility rule generation.
//!
//! A class decomposes into `variant:*` modifiers, an optional `!` important
//! marker, and a base `prefix-value`. The base is looked up in the utility
//! table (longest prefix first), the variants shape the selector and the
//! layer the rule renders into. Anything unrecognized yields no rule.

mod rule;
mod utilities;
mod variant;

pub use rule::{Declarations, Layer, Rule, escape_class, render};
pub use utilities::Utility;
pub use variant::{Variant, VariantTable};

use crate::theme::Theme;

/// Maps class names to CSS rules.
///
/// Starts with the critical utility subset so first-paint styles can be
/// produced before the full table is enabled.
#[derive(Debug, Clone)]
pub struct RuleGenerator {
    /// Sorted by descending prefix length.
    utilities: Vec<Utility>,
    variants: VariantTable,
    full: bool,
}

/// Parsed form of a class name.
#[derive(Debug, PartialEq, Eq)]
struct ClassParts<'a> {
    variants: Vec<&'a str>,
    base: &'a str,
    important: bool,
}

fn parse_class(class: &str) -> Option<ClassParts<'_>> {
    let mut segments: Vec<&str> = class.split(':').collect();
    let base = segments.pop()?;
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let (base, important) = if let Some(b) = base.strip_prefix('!') {
        (b, true)
    } else if let Some(b) = base.strip_suffix('!') {
        (b, true)
    } else {
        (base, false)
    };
    if base.is_empty() {
        return None;
    }

    Some(ClassParts {
        variants: segments,
        base,
        important,
    })
}

impl RuleGenerator {
    pub fn new(theme: &Theme) -> Self {
        let mut generator = Self {
            utilities: utilities::critical(),
            variants: VariantTable::new(theme),
            full: false,
        };
        generator.sort_utilities();
        generator
    }

    /// Enable the deferred utilities. Idempotent.
    pub fn enable_full(&mut self) {
        if self.full {
            return;
        }
        self.utilities.extend(utilities::deferred());
        self.sort_utilities();
        self.full = true;
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Rebuild theme-derived tables (breakpoints).
    pub fn set_theme(&mut self, theme: &Theme) {
        self.variants = VariantTable::new(theme);
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.utilities.iter().map(|u| u.prefix)
    }

    fn sort_utilities(&mut self) {
        self.utilities
            .sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    /// Declarations for a bare utility (`bg-primary`), no variants.
    fn declarations(&self, base: &str, theme: &Theme) -> Option<Declarations> {
        self.utilities.iter().find_map(|utility| {
            let value = base.strip_prefix(utility.prefix)?;
            if value.is_empty() {
                return None;
            }
            (utility.generate)(value, theme)
        })
    }

    /// Generate the rule for `class`, or `None` if it is not a known utility.
    pub fn generate(&self, class: &str, theme: &Theme) -> Option<Rule> {
        let parts = parse_class(class)?;
        let variants = parts
            .variants
            .iter()
            .map(|name| self.variants.lookup(name))
            .collect::<Option<Vec<_>>>()?;

        let mut declarations = self.declarations(parts.base, theme)?;
        if parts.important {
            for (_, value) in &mut declarations {
                value.push_str(" !important");
            }
        }

        let (selector, layer) = build_selector(class, &variants);
        Some(Rule {
            class: class.to_string(),
            selector,
            declarations,
            layer,
        })
    }
}

fn build_selector(class: &str, variants: &[Variant]) -> (String, Layer) {
    let mut selector = format!(".{}", escape_class(class));
    let mut element = None;
    let mut group = false;
    let mut media: Vec<(u32, &str)> = Vec::new();
    let mut pseudo = false;

    for variant in variants {
        match variant {
            Variant::Pseudo(p) => {
                selector.push_str(p);
                pseudo = true;
            }
            Variant::PseudoElement(e) => {
                element = Some(*e);
                pseudo = true;
            }
            Variant::GroupHover => {
                group = true;
                pseudo = true;
            }
            Variant::Media { rank, query } => media.push((*rank, query)),
        }
    }
    if let Some(e) = element {
        selector.push_str(e);
    }
    if group {
        selector = format!(".group:hover {selector}");
    }

    let layer = if !media.is_empty() {
        let rank = media.iter().map(|(r, _)| *r).max().unwrap_or_default();
        let query = media
            .iter()
            .map(|(_, q)| *q)
            .collect::<Vec<_>>()
            .join(" and ");
        Layer::Media { rank, query }
    } else if pseudo {
        Layer::Pseudo
    } else {
        Layer::Base
    };

    (selector, layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme::parse(
            &[":root { --color-primary: #ff0000; --font-weight-heavy: 850; }"],
            ":root",
            "@theme",
        )
    }

    fn full() -> RuleGenerator {
        let mut generator = RuleGenerator::new(&theme());
        generator.enable_full();
        generator
    }

    #[test]
    fn test_parse_class() {
        assert_eq!(
            parse_class("md:hover:!p-4"),
            Some(ClassParts {
                variants: vec!["md", "hover"],
                base: "p-4",
                important: true,
            })
        );
        assert_eq!(parse_class("p-4!").map(|p| p.important), Some(true));
        assert_eq!(parse_class("md::p-4"), None);
        assert_eq!(parse_class("hover:"), None);
        assert_eq!(parse_class("!"), None);
    }

    #[test]
    fn test_color_bg_rule() {
        let rule = full().generate("color-primary-bg", &theme()).unwrap();
        assert_eq!(rule.to_css(), ".color-primary-bg { background-color: #ff0000; }");
        assert_eq!(rule.layer, Layer::Base);
    }

    #[test]
    fn test_unknown_class_produces_nothing() {
        assert!(full().generate("totally-unknown-xyz", &theme()).is_none());
        assert!(full().generate("bg-", &theme()).is_none());
        assert!(full().generate("wiggle:bg-primary", &theme()).is_none());
    }

    #[test]
    fn test_critical_then_full() {
        let mut generator = RuleGenerator::new(&theme());
        assert!(!generator.is_full());
        assert!(generator.generate("bg-primary", &theme()).is_some());
        assert!(generator.generate("p-4", &theme()).is_none());

        generator.enable_full();
        generator.enable_full();
        assert!(generator.generate("p-4", &theme()).is_some());
        assert_eq!(generator.prefixes().filter(|p| *p == "p-").count(), 1);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let rule = full().generate("font-weight-heavy", &theme()).unwrap();
        assert_eq!(rule.declarations, vec![("font-weight", "850".to_string())]);
        let rule = full().generate("gap-x-2", &theme()).unwrap();
        assert_eq!(rule.declarations[0].0, "column-gap");
    }

    #[test]
    fn test_pseudo_variant() {
        let rule = full().generate("hover:bg-primary", &theme()).unwrap();
        assert_eq!(
            rule.to_css(),
            ".hover\\:bg-primary:hover { background-color: #ff0000; }"
        );
        assert_eq!(rule.layer, Layer::Pseudo);
    }

    #[test]
    fn test_group_hover_and_placeholder() {
        let rule = full().generate("group-hover:color-primary", &theme()).unwrap();
        assert_eq!(rule.selector, ".group:hover .group-hover\\:color-primary");
        let rule = full().generate("placeholder:color-primary", &theme()).unwrap();
        assert_eq!(rule.selector, ".placeholder\\:color-primary::placeholder");
    }

    #[test]
    fn test_media_variants() {
        let rule = full().generate("md:p-4", &theme()).unwrap();
        assert_eq!(
            rule.layer,
            Layer::Media {
                rank: 2,
                query: "(min-width: 48rem)".into()
            }
        );

        let rule = full().generate("dark:md:hover:bg-primary", &theme()).unwrap();
        assert_eq!(rule.selector, ".dark\\:md\\:hover\\:bg-primary:hover");
        assert_eq!(
            rule.layer,
            Layer::Media {
                rank: 1000,
                query: "(prefers-color-scheme: dark) and (min-width: 48rem)".into()
            }
        );
    }

    #[test]
    fn test_important() {
        let rule = full().generate("!bg-primary", &theme()).unwrap();
        assert_eq!(
            rule.to_css(),
            ".\\!bg-primary { background-color: #ff0000 !important; }"
        );
    }

    #[test]
    fn test_set_theme_updates_breakpoints() {
        let mut generator = full();
        let theme = Theme::parse(&["@theme { --breakpoint-tablet: 700px; }"], ":root", "@theme");
        generator.set_theme(&theme);
        assert!(generator.generate("tablet:w-full", &theme).is_some());
        assert!(generator.generate("md:w-full", &theme).is_none());
    }
}
