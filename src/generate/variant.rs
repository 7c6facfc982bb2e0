//! Variant modifiers: `hover:`, `focus:`, `dark:`, `md:`, ...

use crate::theme::Theme;

/// Breakpoints used when the theme declares no `--breakpoint-*`.
const DEFAULT_BREAKPOINTS: &[(&str, &str)] = &[
    ("sm", "40rem"),
    ("md", "48rem"),
    ("lg", "64rem"),
    ("xl", "80rem"),
    ("2xl", "96rem"),
];

const PSEUDO_CLASSES: &[(&str, &str)] = &[
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-visible", ":focus-visible"),
    ("focus-within", ":focus-within"),
    ("active", ":active"),
    ("visited", ":visited"),
    ("disabled", ":disabled"),
    ("checked", ":checked"),
    ("required", ":required"),
    ("invalid", ":invalid"),
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
];

/// Media rank of `dark:`, placed after every breakpoint.
const DARK_RANK: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// Appended to the selector (`:hover`).
    Pseudo(&'static str),
    /// Appended as a pseudo-element after all pseudo-classes.
    PseudoElement(&'static str),
    /// `.group:hover .x`
    GroupHover,
    /// Wraps the rule in `@media`.
    Media { rank: u32, query: String },
}

/// Variant lookup, rebuilt whenever the theme changes.
#[derive(Debug, Clone)]
pub struct VariantTable {
    /// (name, min-width), ascending.
    breakpoints: Vec<(String, String)>,
}

impl VariantTable {
    pub fn new(theme: &Theme) -> Self {
        let mut breakpoints: Vec<(String, String)> = theme
            .namespace("breakpoint")
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        if breakpoints.is_empty() {
            breakpoints = DEFAULT_BREAKPOINTS
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect();
        }
        breakpoints.sort_by(|a, b| length_px(&a.1).total_cmp(&length_px(&b.1)));

        Self { breakpoints }
    }

    pub fn lookup(&self, name: &str) -> Option<Variant> {
        if let Some((_, pseudo)) = PSEUDO_CLASSES.iter().find(|(n, _)| *n == name) {
            return Some(Variant::Pseudo(pseudo));
        }
        match name {
            "placeholder" => return Some(Variant::PseudoElement("::placeholder")),
            "group-hover" => return Some(Variant::GroupHover),
            "dark" => {
                return Some(Variant::Media {
                    rank: DARK_RANK,
                    query: "(prefers-color-scheme: dark)".into(),
                });
            }
            _ => {}
        }
        self.breakpoints
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| Variant::Media {
                rank: i as u32 + 1,
                query: format!("(min-width: {})", self.breakpoints[i].1),
            })
    }

    pub fn breakpoints(&self) -> &[(String, String)] {
        &self.breakpoints
    }
}

/// Approximate a CSS length in px for ordering (`rem`/`em` = 16px).
fn length_px(value: &str) -> f64 {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let number: f64 = value[..split].parse().unwrap_or(f64::MAX);
    match &value[split..] {
        "rem" | "em" => number * 16.0,
        _ => number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_breakpoints() {
        let table = VariantTable::new(&Theme::default());
        assert_eq!(
            table.lookup("md"),
            Some(Variant::Media {
                rank: 2,
                query: "(min-width: 48rem)".into()
            })
        );
        assert_eq!(table.breakpoints().len(), 5);
    }

    #[test]
    fn test_theme_breakpoints_sorted_by_width() {
        let theme = Theme::parse(
            &["@theme { --breakpoint-tablet: 768px; --breakpoint-phone: 30rem; }"],
            ":root",
            "@theme",
        );
        let table = VariantTable::new(&theme);
        let names: Vec<_> = table.breakpoints().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["phone", "tablet"]);
        assert_eq!(table.lookup("md"), None);
    }

    #[test]
    fn test_pseudo_variants() {
        let table = VariantTable::new(&Theme::default());
        assert_eq!(table.lookup("hover"), Some(Variant::Pseudo(":hover")));
        assert_eq!(table.lookup("first"), Some(Variant::Pseudo(":first-child")));
        assert_eq!(table.lookup("group-hover"), Some(Variant::GroupHover));
        assert_eq!(table.lookup("nope"), None);
    }

    #[test]
    fn test_length_px() {
        assert_eq!(length_px("48rem"), 768.0);
        assert_eq!(length_px("700px"), 700.0);
    }
}
