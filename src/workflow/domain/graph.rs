//! Directed status graph and reachability.

use super::StatusGraphError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Label matching any target during traversal.
pub const WILDCARD: &str = "*";

/// Largest status label accepted in a graph.
pub const MAX_STATUS_LABEL: u8 = 20;

/// Label traversal starts from when the current status is not a node.
pub const ENTRY_LABEL: &str = "0";

/// Outcome of a reachability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    /// Whether the target can be reached.
    pub reachable: bool,
    /// Route from the start to the hit on success; every traversed label in
    /// visiting order on failure.
    pub path: Vec<String>,
}

impl Reachability {
    fn denied(path: Vec<String>) -> Self {
        Self {
            reachable: false,
            path,
        }
    }
}

/// Directed graph over status labels.
///
/// Every edge target is also a node, possibly with no outgoing edges. Edge
/// lists never contain duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct StatusGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl StatusGraph {
    /// Returns the built-in workflow used when a project defines none.
    #[must_use]
    pub fn default_workflow() -> Self {
        let mut graph = Self::default();
        for (from, targets) in [
            ("0", &["1"][..]),
            ("1", &["2"][..]),
            ("2", &["3", "4", "6"][..]),
            ("3", &["2"][..]),
            ("4", &["5", "2"][..]),
            ("5", &["2"][..]),
            ("6", &["2"][..]),
        ] {
            for target in targets {
                graph.insert_edge(from, target);
            }
        }
        graph
    }

    /// Parses a graph from a `{source: [targets]}` JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StatusGraphError::Malformed`] for invalid JSON and
    /// [`StatusGraphError::InvalidLabel`] for out-of-range labels.
    pub fn from_json(json: &str) -> Result<Self, StatusGraphError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(json).map_err(|err| {
            tracing::error!(error = %err, "status graph json rejected");
            StatusGraphError::Malformed(err.to_string())
        })?;
        Self::from_map(raw)
    }

    /// Builds a graph from an adjacency map.
    ///
    /// # Errors
    ///
    /// Returns [`StatusGraphError::InvalidLabel`] when a source or target is
    /// neither `*` nor an integer in `0..=20`.
    pub fn from_map(raw: BTreeMap<String, Vec<String>>) -> Result<Self, StatusGraphError> {
        let mut graph = Self::default();
        for (from, targets) in raw {
            validate_label(&from)?;
            graph.edges.entry(from.clone()).or_default();
            for target in targets {
                validate_label(&target)?;
                graph.insert_edge(&from, &target);
            }
        }
        Ok(graph)
    }

    /// Serializes the graph back to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StatusGraphError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, StatusGraphError> {
        serde_json::to_string(&self.edges).map_err(|err| StatusGraphError::Malformed(err.to_string()))
    }

    /// Returns the adjacency map.
    #[must_use]
    pub const fn to_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.edges
    }

    /// Returns `true` when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns `true` when `label` is a node.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.edges.contains_key(label)
    }

    /// Returns the outgoing edges of `label`.
    #[must_use]
    pub fn targets(&self, label: &str) -> &[String] {
        self.edges.get(label).map_or(&[], Vec::as_slice)
    }

    /// Adds the edge `from → to`; a no-op when it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StatusGraphError::InvalidLabel`] for out-of-range labels.
    pub fn add_route(&mut self, from: &str, to: &str) -> Result<(), StatusGraphError> {
        validate_label(from)?;
        validate_label(to)?;
        self.insert_edge(from, to);
        Ok(())
    }

    /// Removes the edge `from → to` when present.
    ///
    /// Missing sources are logged and otherwise ignored.
    pub fn remove_route(&mut self, from: &str, to: &str) {
        let Some(targets) = self.edges.get_mut(from) else {
            tracing::warn!(from, to, "route not found");
            return;
        };
        targets.retain(|target| target != to);
    }

    /// Checks whether `target` can be reached from `current`.
    ///
    /// Traversal starts at [`ENTRY_LABEL`] when `current` is not a node. A
    /// target that is not a node is never reachable. Visiting the target or
    /// [`WILDCARD`] succeeds.
    #[must_use]
    pub fn reachable(&self, current: &str, target: &str) -> Reachability {
        if !self.contains(target) {
            return Reachability::denied(Vec::new());
        }
        let start = if self.contains(current) {
            current
        } else {
            ENTRY_LABEL
        };

        let mut search = Search {
            graph: self,
            target,
            visited: HashSet::new(),
            visit_order: Vec::new(),
            route: Vec::new(),
        };
        if search.visit(start) {
            Reachability {
                reachable: true,
                path: search.route,
            }
        } else {
            Reachability::denied(search.visit_order)
        }
    }

    /// Checks reachability between two integer statuses.
    #[must_use]
    pub fn reachable_status(&self, current: i32, target: i32) -> Reachability {
        self.reachable(&current.to_string(), &target.to_string())
    }

    fn insert_edge(&mut self, from: &str, to: &str) {
        self.edges.entry(to.to_owned()).or_default();
        let targets = self.edges.entry(from.to_owned()).or_default();
        if !targets.iter().any(|existing| existing == to) {
            targets.push(to.to_owned());
        }
    }
}

struct Search<'a> {
    graph: &'a StatusGraph,
    target: &'a str,
    visited: HashSet<&'a str>,
    visit_order: Vec<String>,
    route: Vec<String>,
}

impl<'a> Search<'a> {
    fn visit(&mut self, label: &'a str) -> bool {
        if !self.visited.insert(label) {
            return false;
        }
        self.visit_order.push(label.to_owned());
        self.route.push(label.to_owned());

        if label == self.target || label == WILDCARD {
            return true;
        }
        let graph = self.graph;
        for next in graph.targets(label) {
            if self.visit(next) {
                return true;
            }
        }
        self.route.pop();
        false
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for StatusGraph {
    type Error = StatusGraphError;

    fn try_from(value: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        Self::from_map(value)
    }
}

impl From<StatusGraph> for BTreeMap<String, Vec<String>> {
    fn from(value: StatusGraph) -> Self {
        value.edges
    }
}

fn validate_label(label: &str) -> Result<(), StatusGraphError> {
    if label == WILDCARD {
        return Ok(());
    }
    match label.parse::<u8>() {
        Ok(value) if value <= MAX_STATUS_LABEL && label == value.to_string() => Ok(()),
        _ => Err(StatusGraphError::InvalidLabel(label.to_owned())),
    }
}
