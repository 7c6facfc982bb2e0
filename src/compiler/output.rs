//! The live utility stylesheet and where it ends up.
//!
//! Two sheets exist: a transient critical sheet (first-paint subset) that
//! belongs at the very top of `<head>`, and the utility sheet, which must
//! stay the last stylesheet in `<head>` so utilities win over other styles.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use regex::Regex;

pub const UTILITY_STYLE_ID: &str = "utility-styles";
pub const CRITICAL_STYLE_ID: &str = "utility-styles-critical";

/// Previously injected utility `<style>` elements (either id).
static RE_INJECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<style\b[^>]*\bid\s*=\s*["']utility-styles(?:-critical)?["'][^>]*>.*?</style>[ \t]*\n?"#)
        .unwrap()
});

static RE_HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").unwrap());

static RE_HEAD_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());

/// Stylesheet elements: `<style ...>` or `<link rel="stylesheet" ...>`.
static RE_STYLESHEET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<style\b[^>]*>|<link\b[^>]*\brel\s*=\s*["']?stylesheet["']?[^>]*>"#).unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStylesheet {
    critical: Option<String>,
    css: String,
}

impl LiveStylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_critical(&mut self, css: String) {
        self.critical = Some(css);
    }

    /// Drop the critical sheet once the full sheet is in place.
    pub fn clear_critical(&mut self) {
        self.critical = None;
    }

    pub fn critical(&self) -> Option<&str> {
        self.critical.as_deref()
    }

    /// Replace the utility sheet. Returns whether the content changed.
    pub fn set(&mut self, css: String) -> bool {
        if self.css == css {
            return false;
        }
        self.css = css;
        true
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    /// Place the sheets into `html`.
    ///
    /// Any previously injected elements are removed first, so repeated calls
    /// re-assert the positions instead of stacking copies.
    pub fn inject(&self, html: &str) -> String {
        let html = RE_INJECTED.replace_all(html, "");
        let critical = self.critical.as_deref().map(|css| style_element(CRITICAL_STYLE_ID, css));
        let utilities = style_element(UTILITY_STYLE_ID, &self.css);

        let (Some(open), Some(close)) = (RE_HEAD_OPEN.find(&html), RE_HEAD_CLOSE.find(&html)) else {
            // No <head>: both sheets go first
            let mut out = critical.unwrap_or_default();
            out.push_str(&utilities);
            out.push_str(&html);
            return out;
        };

        let mut out = String::with_capacity(html.len() + utilities.len() + 64);
        out.push_str(&html[..open.end()]);
        if let Some(critical) = &critical {
            out.push('\n');
            out.push_str(critical);
        }
        out.push_str(&html[open.end()..close.start()]);
        out.push_str(&utilities);
        out.push_str(&html[close.start()..]);
        out
    }

    /// Write the utility sheet to `path`, skipping identical content.
    ///
    /// Returns whether the file was (re)written.
    pub fn write(&self, path: &Path, minify: bool) -> io::Result<bool> {
        let content = if minify {
            minify_css(&self.css).unwrap_or_else(|| {
                crate::log!("compile"; "minification failed, writing unminified css");
                self.css.clone()
            })
        } else {
            self.css.clone()
        };

        if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(true)
    }

    /// Inject into the HTML file at `path` in place. Returns whether it changed.
    pub fn inject_file(&self, path: &Path) -> io::Result<bool> {
        let html = fs::read_to_string(path)?;
        let injected = self.inject(&html);
        if injected == html {
            return Ok(false);
        }
        fs::write(path, injected)?;
        Ok(true)
    }
}

fn style_element(id: &str, css: &str) -> String {
    format!("<style id=\"{id}\">\n{css}</style>\n")
}

/// Whether the utility `<style>` is the last stylesheet element in `<head>`.
pub fn is_utility_sheet_last(html: &str) -> bool {
    let head_end = RE_HEAD_CLOSE.find(html).map_or(html.len(), |m| m.start());
    let head = &html[..head_end];
    RE_STYLESHEET
        .find_iter(head)
        .last()
        .is_some_and(|m| m.as_str().contains(UTILITY_STYLE_ID) && !m.as_str().contains(CRITICAL_STYLE_ID))
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}
