//! DOM mutation records and the rules that decide which ones matter.
//!
//! Mutations arrive as serializable snapshots so an embedder (browser
//! bridge, dev server) can stream them as JSON lines:
//!
//! ```json
//! {"type":"attributes","attribute":"class","target":{"tag":"div","attributes":{"class":"p-4 bg-primary"}}}
//! {"type":"child_list","target":{"tag":"main"},"added":[{"tag":"section","attributes":{"x-data":""}}]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::filter::AttributeFilter;
use super::selector::Selector;

/// Snapshot of an element and (optionally) its subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_attrs<'a>(mut self, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (k, v) in attrs {
            self.attributes.insert(k.to_ascii_lowercase(), v.to_string());
        }
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.with_attrs([("class", class)])
    }

    pub fn with_child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }
}

/// A single observed DOM change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// An attribute of `target` changed; `target` carries the new values.
    Attributes {
        attribute: String,
        target: ElementSnapshot,
        /// Ancestors of `target`, nearest first.
        #[serde(default)]
        ancestors: Vec<ElementSnapshot>,
    },
    /// Children were inserted under `target`.
    ChildList {
        target: ElementSnapshot,
        #[serde(default)]
        ancestors: Vec<ElementSnapshot>,
        #[serde(default)]
        added: Vec<ElementSnapshot>,
    },
}

/// Which mutations are significant.
#[derive(Debug, Clone, Default)]
pub struct MutationRules {
    pub ignored_attributes: AttributeFilter,
    pub ignored_elements: Vec<Selector>,
    pub significant: Vec<Selector>,
}

impl MutationRules {
    /// Element lies in (or is) an ignored subtree such as a code block.
    pub fn is_ignored_element(&self, element: &ElementSnapshot) -> bool {
        self.ignored_elements.iter().any(|s| s.matches(element))
    }

    pub fn is_significant(&self, element: &ElementSnapshot) -> bool {
        self.significant.iter().any(|s| s.matches(element))
    }

    pub fn inside_ignored(&self, target: &ElementSnapshot, ancestors: &[ElementSnapshot]) -> bool {
        self.is_ignored_element(target) || ancestors.iter().any(|a| self.is_ignored_element(a))
    }
}

/// Outcome of processing one mutation batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicScan {
    /// Classes seen for the first time, in discovery order.
    pub new_classes: Vec<String>,
    /// A significant element (component/reactive marker) was inserted.
    pub significant: bool,
}

impl DynamicScan {
    pub fn should_recompile(&self) -> bool {
        self.significant || !self.new_classes.is_empty()
    }
}
