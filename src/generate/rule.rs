//! Generated CSS rules and their rendering order.

use std::fmt::Write;

/// CSS declarations in source order.
pub type Declarations = Vec<(&'static str, String)>;

/// Where a rule lands in the utility sheet.
///
/// Plain utilities first, then pseudo-class variants, then media blocks in
/// ascending breakpoint order, so later (more specific) variants win.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Base,
    Pseudo,
    Media { rank: u32, query: String },
}

/// One generated utility rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub class: String,
    pub selector: String,
    pub declarations: Declarations,
    pub layer: Layer,
}

impl Rule {
    /// `selector { prop: value; ... }` on a single line.
    pub fn to_css(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(&self.selector);
        out.push_str(" {");
        for (prop, value) in &self.declarations {
            let _ = write!(out, " {prop}: {value};");
        }
        out.push_str(" }");
        out
    }
}

/// Render rules into a stylesheet, deterministically ordered.
pub fn render<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> String {
    let mut rules: Vec<&Rule> = rules.into_iter().collect();
    rules.sort_by(|a, b| a.layer.cmp(&b.layer).then_with(|| a.class.cmp(&b.class)));

    let mut out = String::new();
    let mut open_media: Option<&str> = None;

    for rule in rules {
        let media = match &rule.layer {
            Layer::Media { query, .. } => Some(query.as_str()),
            _ => None,
        };
        if open_media != media {
            if open_media.is_some() {
                out.push_str("}\n");
            }
            if let Some(query) = media {
                let _ = writeln!(out, "@media {query} {{");
            }
            open_media = media;
        }
        if open_media.is_some() {
            out.push_str("  ");
        }
        out.push_str(&rule.to_css());
        out.push('\n');
    }
    if open_media.is_some() {
        out.push_str("}\n");
    }

    out
}

/// Escape a class name for use in a CSS selector.
pub fn escape_class(class: &str) -> String {
    let mut out = String::with_capacity(class.len() + 4);
    for (i, c) in class.chars().enumerate() {
        match c {
            c if c.is_ascii_digit() && i == 0 => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}
