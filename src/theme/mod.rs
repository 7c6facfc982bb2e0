//! Theme variables parsed from CSS custom-property blocks.
//!
//! Two block kinds are recognized, both configurable:
//!
//! ```css
//! :root { --color-primary: #ff0000; }
//! @theme { --spacing: 0.25rem; --breakpoint-md: 48rem; }
//! ```
//!
//! Declarations must follow `--name: value;`. Anything else is skipped, so a
//! malformed block simply contributes no variables.

mod hash;

pub use hash::ThemeHash;

use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Maximum `var()` indirection depth before resolution gives up.
const MAX_RESOLVE_DEPTH: usize = 8;

static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static RE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([A-Za-z0-9_-]+)\s*:\s*([^;{}]+?)\s*;").unwrap());

static RE_VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*--([A-Za-z0-9_-]+)\s*(?:,\s*([^()]*(?:\([^()]*\)[^()]*)*))?\)").unwrap()
});

static RE_STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style([^>]*)>(.*?)</style\s*>").unwrap());

/// A single custom property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeVariable {
    /// Name without the leading `--`.
    pub name: String,
    pub value: String,
}

/// Parsed theme snapshot.
#[derive(Debug, Clone)]
pub struct Theme {
    vars: FxHashMap<String, String>,
    hash: ThemeHash,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            vars: FxHashMap::default(),
            hash: ThemeHash::compute(""),
        }
    }
}

impl Theme {
    /// Parse all `root_selector` and `theme_selector` blocks found in `sources`.
    pub fn parse<S: AsRef<str>>(sources: &[S], root_selector: &str, theme_selector: &str) -> Self {
        let mut vars = FxHashMap::default();
        let mut hashed = String::new();

        for source in sources {
            let css = RE_COMMENT.replace_all(source.as_ref(), "");
            for selector in [root_selector, theme_selector] {
                if selector.is_empty() {
                    continue;
                }
                for body in find_blocks(&css, selector) {
                    hashed.push_str(body.trim());
                    hashed.push('\n');
                    for var in parse_variables(body) {
                        vars.insert(var.name, var.value);
                    }
                }
            }
        }

        Self {
            vars,
            hash: ThemeHash::compute(&hashed),
        }
    }

    pub fn hash(&self) -> &ThemeHash {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Raw value of `--name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Value of `--name` with every `var()` reference substituted.
    ///
    /// Undefined references without a fallback, and reference cycles, make
    /// the whole variable undefined.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let raw = self.get(name)?;
        self.resolve_value(raw, 0)
    }

    fn resolve_value(&self, value: &str, depth: usize) -> Option<String> {
        if depth > MAX_RESOLVE_DEPTH {
            return None;
        }
        if !value.contains("var(") {
            return Some(value.to_string());
        }

        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for caps in RE_VAR_REF.captures_iter(value) {
            let whole = caps.get(0)?;
            out.push_str(&value[last..whole.start()]);
            let replacement = match self.get(&caps[1]) {
                Some(inner) => self.resolve_value(inner, depth + 1)?,
                None => {
                    let fallback = caps.get(2)?.as_str().trim();
                    self.resolve_value(fallback, depth + 1)?
                }
            };
            out.push_str(&replacement);
            last = whole.end();
        }
        out.push_str(&value[last..]);
        Some(out)
    }

    /// Variables whose name starts with `namespace-`, sorted by name.
    ///
    /// Returned names have the namespace stripped.
    pub fn namespace(&self, namespace: &str) -> Vec<(&str, &str)> {
        let prefix = format!("{namespace}-");
        let mut out: Vec<_> = self
            .vars
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|rest| (rest, v.as_str())))
            .collect();
        out.sort_unstable();
        out
    }
}

/// Collect the bodies of every `selector { ... }` block in `css`.
///
/// Modifiers between the selector and the brace are allowed
/// (`@theme inline { ... }`, `:root, :host { ... }`).
fn find_blocks<'a>(css: &'a str, selector: &str) -> Vec<&'a str> {
    let bytes = css.as_bytes();
    let mut blocks = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = css[search_from..].find(selector) {
        let start = search_from + offset;
        let after = start + selector.len();
        search_from = after;

        let boundary_before = start == 0 || !is_ident_byte(bytes[start - 1]);
        let boundary_after = bytes.get(after).is_none_or(|b| !is_ident_byte(*b));
        if !boundary_before || !boundary_after {
            continue;
        }

        let Some(open) = prelude_end(&css[after..]).map(|i| after + i) else {
            continue;
        };
        let Some(close) = matching_brace(css, open) else {
            // Unterminated block: take the rest, it is still the best guess.
            blocks.push(&css[open + 1..]);
            break;
        };
        blocks.push(&css[open + 1..close]);
        search_from = close + 1;
    }

    blocks
}

/// Offset of the `{` ending a block prelude, if the text is one.
fn prelude_end(rest: &str) -> Option<usize> {
    for (i, c) in rest.char_indices() {
        match c {
            '{' => return Some(i),
            ';' | '}' | '(' | ')' => return None,
            _ => {}
        }
    }
    None
}

fn matching_brace(css: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in css.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Every `--name: value;` declaration in a block body.
pub fn parse_variables(body: &str) -> Vec<ThemeVariable> {
    RE_VARIABLE
        .captures_iter(body)
        .map(|caps| ThemeVariable {
            name: caps[1].to_string(),
            value: caps[2].trim().to_string(),
        })
        .collect()
}

/// Contents of the `<style>` elements of an HTML document.
///
/// Style elements produced by this compiler (`id="utility-styles..."`) are
/// skipped so generated output never feeds back into the theme.
pub fn style_blocks(html: &str) -> Vec<&str> {
    RE_STYLE_BLOCK
        .captures_iter(html)
        .filter(|caps| !caps[1].contains("utility-styles"))
        .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
        .collect()
}
