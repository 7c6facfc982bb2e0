//! Class scanning: which utility classes does the project use?
//!
//! Two sets are kept apart:
//! - **static**: classes found in the entry page and component HTML. Scanned
//!   once and cached until component HTML arrives after the scan.
//! - **dynamic**: classes first seen through mutations or route changes.
//!
//! A class in either set is "known" and never triggers new-class detection
//! again.

mod filter;
mod mutation;
mod selector;

pub use filter::{AttributeFilter, ClassFilter};
pub use mutation::{DynamicScan, ElementSnapshot, Mutation, MutationRules};
pub use selector::{Selector, SelectorError};

use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::LazyLock;

use crate::debug;

/// `class="..."` / `class='...'`, not preceded by `:` (bound classes).
static RE_CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[\s<])class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// `:class="..."` / `x-bind:class="..."` expressions of the host library.
static RE_BOUND_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:x-bind)?:class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Quoted string literals inside a bound expression.
static RE_STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']*)'|`([^`$]*)`|"([^"]*)""#).unwrap());

/// Collects used classes from page/component HTML and DOM mutations.
#[derive(Debug, Clone)]
pub struct ClassScanner {
    filter: ClassFilter,
    static_classes: FxHashSet<String>,
    dynamic_classes: FxHashSet<String>,
    components_scanned: bool,
    host_detection: bool,
}

impl ClassScanner {
    pub fn new(filter: ClassFilter) -> Self {
        Self {
            filter,
            static_classes: FxHashSet::default(),
            dynamic_classes: FxHashSet::default(),
            components_scanned: false,
            host_detection: true,
        }
    }

    pub fn filter_mut(&mut self) -> &mut ClassFilter {
        &mut self.filter
    }

    /// Enable or disable extraction from host-library class bindings.
    ///
    /// Disabled in degraded mode, when the host library never showed up.
    pub fn set_host_detection(&mut self, enabled: bool) {
        self.host_detection = enabled;
    }

    pub fn host_detection(&self) -> bool {
        self.host_detection
    }

    /// Whether the static set must be (re)built before the next compile.
    pub fn needs_static_scan(&self) -> bool {
        !self.components_scanned
    }

    /// Reset the "components scanned" flag, e.g. after component HTML
    /// arrived later than the initial scan.
    pub fn invalidate_components(&mut self) {
        self.components_scanned = false;
    }

    /// Rebuild the static set from the full page and every component.
    ///
    /// Returns the number of static classes.
    pub fn scan_static<S: AsRef<str>>(&mut self, page: &str, components: &[S]) -> usize {
        let mut classes = FxHashSet::default();
        classes.extend(self.extract(page));
        for html in components {
            classes.extend(self.extract(html.as_ref()));
        }

        debug!("scan"; "static scan: {} classes from page + {} components", classes.len(), components.len());

        self.static_classes = classes;
        self.components_scanned = true;
        self.static_classes.len()
    }

    /// Add classes from HTML that arrived after the static scan.
    ///
    /// Returns the classes that were not known before.
    pub fn scan_fragment(&mut self, html: &str) -> Vec<String> {
        let found = self.extract(html);
        let mut fresh = Vec::new();
        for class in found {
            if !self.is_known(&class) {
                fresh.push(class.clone());
            }
            self.static_classes.insert(class);
        }
        fresh
    }

    /// Extract candidate classes from HTML text, in document order, deduplicated.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut push = |token: &str| {
            if self.filter.accepts(token) && seen.insert(token.to_string()) {
                out.push(token.to_string());
            }
        };

        for caps in RE_CLASS_ATTR.captures_iter(html) {
            if let Some(value) = caps.get(1).or_else(|| caps.get(2)) {
                value.as_str().split_whitespace().for_each(&mut push);
            }
        }

        if self.host_detection {
            for caps in RE_BOUND_CLASS.captures_iter(html) {
                let Some(expr) = caps.get(1).or_else(|| caps.get(2)) else {
                    continue;
                };
                for lit in RE_STRING_LITERAL.captures_iter(expr.as_str()) {
                    if let Some(value) = lit.get(1).or_else(|| lit.get(2)).or_else(|| lit.get(3)) {
                        value.as_str().split_whitespace().for_each(&mut push);
                    }
                }
            }
        }

        out
    }

    pub fn is_known(&self, class: &str) -> bool {
        self.static_classes.contains(class) || self.dynamic_classes.contains(class)
    }

    /// Record classes observed at runtime; returns the ones never seen before.
    pub fn record<'a>(&mut self, classes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut fresh = Vec::new();
        for class in classes {
            if !self.filter.accepts(class) || self.is_known(class) {
                continue;
            }
            self.dynamic_classes.insert(class.to_string());
            fresh.push(class.to_string());
        }
        fresh
    }

    /// Process a batch of mutations against the known sets.
    pub fn scan_dynamic(&mut self, mutations: &[Mutation], rules: &MutationRules) -> DynamicScan {
        let mut result = DynamicScan::default();

        for mutation in mutations {
            match mutation {
                Mutation::Attributes {
                    attribute,
                    target,
                    ancestors,
                } => {
                    let is_class = attribute.eq_ignore_ascii_case("class");
                    if !is_class && rules.ignored_attributes.is_ignored(attribute) {
                        continue;
                    }
                    if rules.inside_ignored(target, ancestors) {
                        continue;
                    }
                    if is_class {
                        let fresh = self.record(target.classes());
                        result.new_classes.extend(fresh);
                    } else if rules.is_significant(target) {
                        // e.g. `x-data` added to an existing element
                        self.collect_subtree(target, rules, &mut result);
                    }
                }
                Mutation::ChildList {
                    target,
                    ancestors,
                    added,
                } => {
                    if rules.inside_ignored(target, ancestors) {
                        continue;
                    }
                    for node in added {
                        if rules.is_ignored_element(node) {
                            continue;
                        }
                        if rules.is_significant(node) {
                            result.significant = true;
                        }
                        self.collect_subtree(node, rules, &mut result);
                    }
                }
            }
        }

        result
    }

    fn collect_subtree(&mut self, node: &ElementSnapshot, rules: &MutationRules, result: &mut DynamicScan) {
        if rules.is_ignored_element(node) {
            return;
        }
        let fresh = self.record(node.classes());
        result.new_classes.extend(fresh);
        if let Some(bound) = node.attr(":class").or_else(|| node.attr("x-bind:class"))
            && self.host_detection
        {
            let html = format!(":class=\"{}\"", bound.replace('"', "'"));
            let found = self.extract(&html);
            let fresh = self.record(found.iter().map(String::as_str));
            result.new_classes.extend(fresh);
        }
        for child in &node.children {
            if rules.is_significant(child) {
                result.significant = true;
            }
            self.collect_subtree(child, rules, result);
        }
    }

    pub fn static_classes(&self) -> &FxHashSet<String> {
        &self.static_classes
    }

    pub fn dynamic_classes(&self) -> &FxHashSet<String> {
        &self.dynamic_classes
    }

    /// Union of static and dynamic classes, sorted.
    pub fn used_classes(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .static_classes
            .union(&self.dynamic_classes)
            .cloned()
            .collect();
        all.sort_unstable();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        for re in [&RE_CLASS_ATTR, &RE_BOUND_CLASS, &RE_STRING_LITERAL] {
            LazyLock::force(re);
        }
    }

    fn scanner() -> ClassScanner {
        ClassScanner::new(ClassFilter::new(["^hljs", "^copy-"], ["$", "{{"]))
    }

    fn rules() -> MutationRules {
        MutationRules {
            ignored_attributes: AttributeFilter::new(["id", "aria-*", "data-order"]),
            ignored_elements: vec![Selector::parse("pre, code").unwrap()],
            significant: vec![Selector::parse("[x-data], [data-component]").unwrap()],
        }
    }

    fn class_mutation(class: &str) -> Mutation {
        Mutation::Attributes {
            attribute: "class".into(),
            target: ElementSnapshot::new("div").with_class(class),
            ancestors: vec![],
        }
    }

    #[test]
    fn test_extract_class_attributes() {
        let s = scanner();
        let html = r#"<div class="p-4  bg-primary"><span class='text-sm hljs-title'></span><i class="p-4"></i></div>"#;
        assert_eq!(s.extract(html), vec!["p-4", "bg-primary", "text-sm"]);
    }

    #[test]
    fn test_extract_skips_placeholders() {
        let s = scanner();
        let html = r#"<div class="{{cls}} $magic copy-btn rounded-lg"></div>"#;
        assert_eq!(s.extract(html), vec!["rounded-lg"]);
    }

    #[test]
    fn test_bound_classes_need_host_detection() {
        let mut s = scanner();
        let html = r#"<div :class="{ 'bg-primary text-white': active }" class="p-2"></div>"#;
        assert_eq!(s.extract(html), vec!["p-2", "bg-primary", "text-white"]);

        s.set_host_detection(false);
        assert_eq!(s.extract(html), vec!["p-2"]);
    }

    #[test]
    fn test_static_scan_cached_until_invalidated() {
        let mut s = scanner();
        assert!(s.needs_static_scan());
        let count = s.scan_static(r#"<p class="a b"></p>"#, &[r#"<p class="c"></p>"#]);
        assert_eq!(count, 3);
        assert!(!s.needs_static_scan());

        s.invalidate_components();
        assert!(s.needs_static_scan());
    }

    #[test]
    fn test_scan_fragment_reports_unknown_only() {
        let mut s = scanner();
        s.scan_static(r#"<p class="a"></p>"#, &[] as &[&str]);
        assert_eq!(s.scan_fragment(r#"<p class="a b"></p>"#), vec!["b"]);
        assert!(s.static_classes().contains("b"));
    }

    #[test]
    fn test_class_mutation_detects_new_classes_once() {
        let mut s = scanner();
        s.scan_static(r#"<p class="p-4"></p>"#, &[] as &[&str]);

        let first = s.scan_dynamic(&[class_mutation("p-4 bg-primary")], &rules());
        assert_eq!(first.new_classes, vec!["bg-primary"]);
        assert!(first.should_recompile());

        let second = s.scan_dynamic(&[class_mutation("p-4 bg-primary")], &rules());
        assert!(second.new_classes.is_empty());
        assert!(!second.should_recompile());
    }

    #[test]
    fn test_ignored_attribute_never_triggers() {
        let mut s = scanner();
        let m = Mutation::Attributes {
            attribute: "aria-hidden".into(),
            target: ElementSnapshot::new("div").with_class("brand-new"),
            ancestors: vec![],
        };
        let result = s.scan_dynamic(&[m], &rules());
        assert!(!result.should_recompile());
        assert!(!s.is_known("brand-new"));
    }

    #[test]
    fn test_insertions_inside_code_blocks_skipped() {
        let mut s = scanner();
        let m = Mutation::ChildList {
            target: ElementSnapshot::new("span"),
            ancestors: vec![ElementSnapshot::new("code"), ElementSnapshot::new("pre")],
            added: vec![ElementSnapshot::new("span").with_class("token-keyword")],
        };
        let result = s.scan_dynamic(&[m], &rules());
        assert!(!result.should_recompile());

        let nested = Mutation::ChildList {
            target: ElementSnapshot::new("main"),
            ancestors: vec![],
            added: vec![
                ElementSnapshot::new("pre")
                    .with_child(ElementSnapshot::new("span").with_class("inside-pre")),
            ],
        };
        let result = s.scan_dynamic(&[nested], &rules());
        assert!(!result.should_recompile());
        assert!(!s.is_known("inside-pre"));
    }

    #[test]
    fn test_significant_insertion() {
        let mut s = scanner();
        let m = Mutation::ChildList {
            target: ElementSnapshot::new("main"),
            ancestors: vec![],
            added: vec![
                ElementSnapshot::new("section")
                    .with_attrs([("x-data", "")])
                    .with_child(ElementSnapshot::new("p").with_class("text-lg")),
            ],
        };
        let result = s.scan_dynamic(&[m], &rules());
        assert!(result.significant);
        assert_eq!(result.new_classes, vec!["text-lg"]);
    }

    #[test]
    fn test_plain_insertion_without_new_classes() {
        let mut s = scanner();
        s.scan_static(r#"<p class="p-4"></p>"#, &[] as &[&str]);
        let m = Mutation::ChildList {
            target: ElementSnapshot::new("ul"),
            ancestors: vec![],
            added: vec![ElementSnapshot::new("li").with_class("p-4")],
        };
        assert!(!s.scan_dynamic(&[m], &rules()).should_recompile());
    }

    #[test]
    fn test_used_classes_sorted_union() {
        let mut s = scanner();
        s.scan_static(r#"<p class="b a"></p>"#, &[] as &[&str]);
        s.record(["c"]);
        assert_eq!(s.used_classes(), vec!["a", "b", "c"]);
    }
}
