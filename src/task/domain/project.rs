//! Project snapshot consulted by task transitions.
//!
//! Projects are owned elsewhere; the task context only reads the parts that
//! shape a transition: options, the status graph and the status catalog.

use super::{BuiltinStatus, CompanyPriority};
use crate::shared::{CompanyId, FederationId, Language, ProjectId};
use crate::workflow::domain::StatusGraph;
use serde::{Deserialize, Serialize};

/// Color used when a project does not choose one.
pub const DEFAULT_PROJECT_COLOR: &str = "#111111";

fn default_color() -> String {
    DEFAULT_PROJECT_COLOR.to_owned()
}

/// Per-project switches stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOptions {
    /// Require a comment when cancelling.
    #[serde(default)]
    pub require_cancelation_comment: bool,
    /// Require a comment when completing.
    #[serde(default)]
    pub require_done_comment: bool,
    /// Whether the project tracks its own status.
    #[serde(default)]
    pub status_enable: bool,
    /// Display color.
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            require_cancelation_comment: false,
            require_done_comment: false,
            status_enable: false,
            color: default_color(),
        }
    }
}

/// Project-defined presentation of a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    /// Status code.
    pub number: i32,
    /// Display name.
    pub name: String,
    /// `#RRGGBB` color.
    pub color: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Read-only view of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Owning federation.
    pub federation: FederationId,
    /// Owning company.
    pub company: CompanyId,
    /// Display name.
    pub name: String,
    /// Switches.
    pub options: ProjectOptions,
    /// Custom workflow; the built-in one applies when absent or empty.
    pub status_graph: Option<StatusGraph>,
    /// Status catalog.
    pub statuses: Vec<ProjectStatus>,
    /// Company priority catalog.
    pub priorities: Vec<CompanyPriority>,
}

impl Project {
    /// Creates a project with default options and no catalogs.
    #[must_use]
    pub fn new(
        federation: FederationId,
        company: CompanyId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: ProjectId::new(),
            federation,
            company,
            name: name.into(),
            options: ProjectOptions::default(),
            status_graph: None,
            statuses: Vec::new(),
            priorities: Vec::new(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ProjectOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets a custom workflow.
    #[must_use]
    pub fn with_status_graph(mut self, graph: StatusGraph) -> Self {
        self.status_graph = Some(graph);
        self
    }

    /// Replaces the status catalog.
    #[must_use]
    pub fn with_statuses(mut self, statuses: Vec<ProjectStatus>) -> Self {
        self.statuses = statuses;
        self
    }

    /// Replaces the priority catalog.
    #[must_use]
    pub fn with_priorities(mut self, priorities: Vec<CompanyPriority>) -> Self {
        self.priorities = priorities;
        self
    }

    /// Returns the workflow governing transitions.
    #[must_use]
    pub fn workflow(&self) -> StatusGraph {
        self.status_graph
            .as_ref()
            .filter(|graph| !graph.is_empty())
            .cloned()
            .unwrap_or_else(StatusGraph::default_workflow)
    }

    /// Presents `number` using the catalog, falling back to built-in labels
    /// in the project color.
    #[must_use]
    pub fn status_view(&self, number: i32, language: Language) -> ProjectStatus {
        if let Some(status) = self.statuses.iter().find(|status| status.number == number) {
            return status.clone();
        }
        ProjectStatus {
            number,
            name: BuiltinStatus::from_code(number)
                .map_or_else(String::new, |status| status.label(language).to_owned()),
            color: self.options.color.clone(),
            description: String::new(),
        }
    }
}
