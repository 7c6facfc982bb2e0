//! Lifecycle events consumed by the compiler.
//!
//! Embedders stream them as JSON lines; the `manifest:` prefixed names
//! dispatched by the component loader and router are accepted as aliases.
//!
//! ```json
//! {"event":"component-loaded","name":"nav","html":"<nav class=\"p-4\">...</nav>"}
//! {"event":"manifest:route-change","path":"/about"}
//! {"event":"mutations","mutations":[{"type":"attributes","attribute":"class","target":{"tag":"div","attributes":{"class":"p-8"}}}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::scan::Mutation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum CompilerEvent {
    /// A component fragment finished loading.
    #[serde(alias = "manifest:component-loaded")]
    ComponentLoaded { name: String, html: String },

    /// The component loader processed the current batch.
    #[serde(alias = "manifest:components-processed")]
    ComponentsProcessed,

    /// All components are in place.
    #[serde(alias = "manifest:components-ready")]
    ComponentsReady,

    #[serde(alias = "manifest:route-change")]
    RouteChange { path: String },

    /// A batch of DOM mutations, in observer delivery order.
    Mutations { mutations: Vec<Mutation> },

    /// Explicit external request.
    Trigger { reason: String },

    /// Theme sources changed.
    ThemeChanged,
}

impl CompilerEvent {
    /// Parse one line of the event feed.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    /// Short label used as the recompile reason.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ComponentLoaded { .. } => "component-loaded",
            Self::ComponentsProcessed => "components-processed",
            Self::ComponentsReady => "components-ready",
            Self::RouteChange { .. } => "route-change",
            Self::Mutations { .. } => "mutation",
            Self::Trigger { .. } => "trigger",
            Self::ThemeChanged => "theme-changed",
        }
    }
}
