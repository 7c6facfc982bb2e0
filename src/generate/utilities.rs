//! Prefix → generator table.
//!
//! Every generator receives the class value after its prefix
//! (`bg-primary` → `primary`) and the theme, and returns declarations or
//! `None` when the value means nothing to it.

use super::rule::Declarations;
use crate::theme::Theme;

type Generate = fn(&str, &Theme) -> Option<Declarations>;

/// A recognized class prefix and its generator.
#[derive(Clone, Copy)]
pub struct Utility {
    pub prefix: &'static str,
    pub generate: Generate,
}

impl std::fmt::Debug for Utility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utility").field("prefix", &self.prefix).finish()
    }
}

fn utility(prefix: &'static str, generate: Generate) -> Utility {
    Utility { prefix, generate }
}

/// Available synchronously for first-paint styles.
pub fn critical() -> Vec<Utility> {
    vec![
        utility("color-", color),
        utility("bg-", background),
        utility("text-", text),
        utility("font-weight-", font_weight),
        utility("font-", font),
    ]
}

/// Enabled after full initialization.
pub fn deferred() -> Vec<Utility> {
    vec![
        utility("border-", border),
        utility("shadow-", shadow),
        utility("rounded-", rounded),
        utility("leading-", leading),
        utility("tracking-", tracking),
        utility("opacity-", opacity),
        utility("blur-", blur),
        utility("z-", z_index),
        utility("p-", |v, t| spacing(v, t, &["padding"])),
        utility("px-", |v, t| spacing(v, t, &["padding-inline"])),
        utility("py-", |v, t| spacing(v, t, &["padding-block"])),
        utility("pt-", |v, t| spacing(v, t, &["padding-top"])),
        utility("pr-", |v, t| spacing(v, t, &["padding-right"])),
        utility("pb-", |v, t| spacing(v, t, &["padding-bottom"])),
        utility("pl-", |v, t| spacing(v, t, &["padding-left"])),
        utility("m-", |v, t| margin(v, t, &["margin"])),
        utility("mx-", |v, t| margin(v, t, &["margin-inline"])),
        utility("my-", |v, t| margin(v, t, &["margin-block"])),
        utility("mt-", |v, t| margin(v, t, &["margin-top"])),
        utility("mr-", |v, t| margin(v, t, &["margin-right"])),
        utility("mb-", |v, t| margin(v, t, &["margin-bottom"])),
        utility("ml-", |v, t| margin(v, t, &["margin-left"])),
        utility("gap-", |v, t| spacing(v, t, &["gap"])),
        utility("gap-x-", |v, t| spacing(v, t, &["column-gap"])),
        utility("gap-y-", |v, t| spacing(v, t, &["row-gap"])),
        utility("w-", |v, t| size(v, t, &["width"], "100vw")),
        utility("h-", |v, t| size(v, t, &["height"], "100vh")),
        utility("size-", |v, t| size(v, t, &["width", "height"], "100vw")),
    ]
}

/// Spacing base when the theme declares no `--spacing`.
const DEFAULT_SPACING: &str = "0.25rem";

const DEFAULT_FONT_WEIGHTS: &[(&str, &str)] = &[
    ("thin", "100"),
    ("extralight", "200"),
    ("light", "300"),
    ("normal", "400"),
    ("medium", "500"),
    ("semibold", "600"),
    ("bold", "700"),
    ("extrabold", "800"),
    ("black", "900"),
];

/// Suffixes accepted after a `color-{name}` class.
const COLOR_SUFFIXES: &[(&str, &str)] = &[
    ("-bg", "background-color"),
    ("-border", "border-color"),
    ("-fill", "fill"),
    ("-stroke", "stroke"),
    ("-outline", "outline-color"),
    ("-decoration", "text-decoration-color"),
    ("-caret", "caret-color"),
    ("-accent", "accent-color"),
];

fn decl(prop: &'static str, value: impl Into<String>) -> Option<Declarations> {
    Some(vec![(prop, value.into())])
}

fn decls(props: &[&'static str], value: &str) -> Option<Declarations> {
    Some(props.iter().map(|p| (*p, value.to_string())).collect())
}

/// `--color-{name}` with an optional `/opacity` modifier.
fn theme_color(value: &str, theme: &Theme) -> Option<String> {
    let (name, alpha) = match value.split_once('/') {
        Some((name, alpha)) => (name, Some(alpha)),
        None => (value, None),
    };
    let color = theme.resolve(&format!("color-{name}"))?;
    match alpha {
        None => Some(color),
        Some(alpha) => {
            let pct: u32 = alpha.parse().ok().filter(|p| *p <= 100)?;
            Some(format!("color-mix(in srgb, {color} {pct}%, transparent)"))
        }
    }
}

fn color(value: &str, theme: &Theme) -> Option<Declarations> {
    if let Some(c) = theme_color(value, theme) {
        return decl("color", c);
    }
    COLOR_SUFFIXES.iter().find_map(|(suffix, prop)| {
        let name = value.strip_suffix(suffix)?;
        decl(prop, theme_color(name, theme)?)
    })
}

fn background(value: &str, theme: &Theme) -> Option<Declarations> {
    match value {
        "transparent" | "inherit" | "currentColor" => decl("background-color", value),
        _ => decl("background-color", theme_color(value, theme)?),
    }
}

fn text(value: &str, theme: &Theme) -> Option<Declarations> {
    if let Some(c) = theme_color(value, theme) {
        return decl("color", c);
    }
    if let Some(size) = theme.resolve(&format!("text-{value}")) {
        let mut out = vec![("font-size", size)];
        if let Some(lh) = theme.resolve(&format!("text-{value}--line-height")) {
            out.push(("line-height", lh));
        }
        return Some(out);
    }
    match value {
        "left" | "center" | "right" | "justify" | "start" | "end" => decl("text-align", value),
        _ => None,
    }
}

fn font_weight(value: &str, theme: &Theme) -> Option<Declarations> {
    if let Some(w) = theme.resolve(&format!("font-weight-{value}")) {
        return decl("font-weight", w);
    }
    let (_, w) = DEFAULT_FONT_WEIGHTS.iter().find(|(n, _)| *n == value)?;
    decl("font-weight", *w)
}

fn font(value: &str, theme: &Theme) -> Option<Declarations> {
    if let Some(family) = theme.resolve(&format!("font-{value}")) {
        return decl("font-family", family);
    }
    font_weight(value, theme)
}

fn border(value: &str, theme: &Theme) -> Option<Declarations> {
    if let Ok(width) = value.parse::<u32>() {
        return decl("border-width", px(width));
    }
    decl("border-color", theme_color(value, theme)?)
}

fn shadow(value: &str, theme: &Theme) -> Option<Declarations> {
    if value == "none" {
        return decl("box-shadow", "0 0 #0000");
    }
    decl("box-shadow", theme.resolve(&format!("shadow-{value}"))?)
}

fn rounded(value: &str, theme: &Theme) -> Option<Declarations> {
    match value {
        "none" => decl("border-radius", "0"),
        "full" => decl("border-radius", "9999px"),
        _ => decl("border-radius", theme.resolve(&format!("radius-{value}"))?),
    }
}

fn leading(value: &str, theme: &Theme) -> Option<Declarations> {
    if let Some(lh) = theme.resolve(&format!("leading-{value}")) {
        return decl("line-height", lh);
    }
    match value {
        "none" => decl("line-height", "1"),
        _ => decl("line-height", spacing_value(value, theme)?),
    }
}

fn tracking(value: &str, theme: &Theme) -> Option<Declarations> {
    decl("letter-spacing", theme.resolve(&format!("tracking-{value}"))?)
}

fn opacity(value: &str, _theme: &Theme) -> Option<Declarations> {
    let pct: u32 = value.parse().ok().filter(|p| *p <= 100)?;
    decl("opacity", format_number(f64::from(pct) / 100.0))
}

fn blur(value: &str, theme: &Theme) -> Option<Declarations> {
    if value == "none" {
        return decl("filter", "none");
    }
    let amount = theme.resolve(&format!("blur-{value}"))?;
    decl("filter", format!("blur({amount})"))
}

fn z_index(value: &str, _theme: &Theme) -> Option<Declarations> {
    if value == "auto" || value.parse::<i32>().is_ok() {
        return decl("z-index", value);
    }
    None
}

/// Spacing scale value: named `--spacing-{n}`, `px`, or `n × --spacing`.
fn spacing_value(value: &str, theme: &Theme) -> Option<String> {
    if let Some(named) = theme.resolve(&format!("spacing-{value}")) {
        return Some(named);
    }
    match value {
        "0" => return Some("0".into()),
        "px" => return Some("1px".into()),
        _ => {}
    }
    let n: f64 = value.parse().ok()?;
    if !n.is_finite() || n < 0.0 || (n * 4.0).fract() != 0.0 {
        return None;
    }
    let base = theme
        .resolve("spacing")
        .unwrap_or_else(|| DEFAULT_SPACING.to_string());
    Some(format!("calc({base} * {})", format_number(n)))
}

fn spacing(value: &str, theme: &Theme, props: &[&'static str]) -> Option<Declarations> {
    decls(props, &spacing_value(value, theme)?)
}

fn margin(value: &str, theme: &Theme, props: &[&'static str]) -> Option<Declarations> {
    if value == "auto" {
        return decls(props, "auto");
    }
    spacing(value, theme, props)
}

fn size(value: &str, theme: &Theme, props: &[&'static str], screen: &str) -> Option<Declarations> {
    let keyword = match value {
        "auto" => Some("auto"),
        "full" => Some("100%"),
        "screen" => Some(screen),
        "min" => Some("min-content"),
        "max" => Some("max-content"),
        "fit" => Some("fit-content"),
        _ => None,
    };
    if let Some(k) = keyword {
        return decls(props, k);
    }
    if let Some((num, den)) = value.split_once('/') {
        let num: u32 = num.parse().ok()?;
        let den: u32 = den.parse().ok().filter(|d| *d > 0)?;
        let pct = f64::from(num) * 100.0 / f64::from(den);
        return decls(props, &format!("{}%", format_number(pct)));
    }
    spacing(value, theme, props)
}

fn px(n: u32) -> String {
    if n == 0 { "0".into() } else { format!("{n}px") }
}

/// Shortest decimal rendering, at most 6 fractional digits.
fn format_number(n: f64) -> String {
    let s = format!("{n:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" { "0".into() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme::parse(
            &[":root {
                --color-primary: #ff0000;
                --color-ink: var(--color-primary);
                --spacing: 0.25rem;
                --spacing-gutter: 2rem;
                --text-lg: 1.125rem;
                --text-lg--line-height: 1.75rem;
                --font-sans: Inter, sans-serif;
                --font-weight-heavy: 850;
                --shadow-md: 0 4px 6px rgb(0 0 0 / 0.1);
                --radius-lg: 0.5rem;
                --blur-sm: 4px;
            }"],
            ":root",
            "@theme",
        )
    }

    fn run(generate: Generate, value: &str) -> Option<Declarations> {
        generate(value, &theme())
    }

    #[test]
    fn test_color_prefix_with_suffixes() {
        assert_eq!(run(color, "primary"), Some(vec![("color", "#ff0000".into())]));
        assert_eq!(
            run(color, "primary-bg"),
            Some(vec![("background-color", "#ff0000".into())])
        );
        assert_eq!(
            run(color, "ink-border"),
            Some(vec![("border-color", "#ff0000".into())])
        );
        assert_eq!(run(color, "missing-bg"), None);
    }

    #[test]
    fn test_color_opacity_modifier() {
        assert_eq!(
            run(background, "primary/50"),
            Some(vec![(
                "background-color",
                "color-mix(in srgb, #ff0000 50%, transparent)".into()
            )])
        );
        assert_eq!(run(background, "primary/150"), None);
    }

    #[test]
    fn test_text_color_size_align() {
        assert_eq!(run(text, "primary"), Some(vec![("color", "#ff0000".into())]));
        assert_eq!(
            run(text, "lg"),
            Some(vec![
                ("font-size", "1.125rem".into()),
                ("line-height", "1.75rem".into())
            ])
        );
        assert_eq!(run(text, "center"), Some(vec![("text-align", "center".into())]));
        assert_eq!(run(text, "huge"), None);
    }

    #[test]
    fn test_font_family_and_weight() {
        assert_eq!(
            run(font, "sans"),
            Some(vec![("font-family", "Inter, sans-serif".into())])
        );
        assert_eq!(run(font, "bold"), Some(vec![("font-weight", "700".into())]));
        assert_eq!(run(font_weight, "heavy"), Some(vec![("font-weight", "850".into())]));
    }

    #[test]
    fn test_spacing_scale() {
        assert_eq!(spacing_value("4", &theme()).as_deref(), Some("calc(0.25rem * 4)"));
        assert_eq!(spacing_value("0.5", &theme()).as_deref(), Some("calc(0.25rem * 0.5)"));
        assert_eq!(spacing_value("gutter", &theme()).as_deref(), Some("2rem"));
        assert_eq!(spacing_value("px", &theme()).as_deref(), Some("1px"));
        assert_eq!(spacing_value("0.3", &theme()), None);
        assert_eq!(spacing_value("wide", &theme()), None);
    }

    #[test]
    fn test_spacing_default_base() {
        assert_eq!(
            spacing_value("2", &Theme::default()).as_deref(),
            Some("calc(0.25rem * 2)")
        );
    }

    #[test]
    fn test_sizes() {
        let full = size("full", &theme(), &["width"], "100vw");
        assert_eq!(full, Some(vec![("width", "100%".into())]));
        let third = size("1/3", &theme(), &["width"], "100vw");
        assert_eq!(third, Some(vec![("width", "33.333333%".into())]));
        let both = size("4", &theme(), &["width", "height"], "100vw").unwrap();
        assert_eq!(both.len(), 2);
        assert_eq!(size("1/0", &theme(), &["width"], "100vw"), None);
    }

    #[test]
    fn test_misc_generators() {
        assert_eq!(run(border, "2"), Some(vec![("border-width", "2px".into())]));
        assert_eq!(run(rounded, "lg"), Some(vec![("border-radius", "0.5rem".into())]));
        assert_eq!(run(opacity, "50"), Some(vec![("opacity", "0.5".into())]));
        assert_eq!(run(blur, "sm"), Some(vec![("filter", "blur(4px)".into())]));
        assert_eq!(run(z_index, "10"), Some(vec![("z-index", "10".into())]));
        assert_eq!(run(shadow, "xl"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(0.0), "0");
    }
}
