// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, TaskKind};

/// Internal node structure: composition shape plus immediate members.
#[derive(Debug, Clone)]
struct DagNode {
    kind: TaskKind,
    /// Direct members, in declaration order (empty for leaves).
    members: Vec<String>,
    /// Composites that list this task as a member.
    parents: Vec<String>,
}

/// In-memory composition graph keyed by task name.
///
/// Acyclicity is already checked in `config::validate`; this keeps adjacency
/// information for registry construction and diagnostics.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<String, DagNode>,
}

impl DagGraph {
    /// Build the graph from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut nodes: HashMap<String, DagNode> = HashMap::new();

        for (name, task) in cfg.task.iter() {
            // Validated configs always classify.
            let Some(kind) = task.kind() else { continue };
            nodes.insert(
                name.clone(),
                DagNode {
                    kind,
                    members: task.members().to_vec(),
                    parents: Vec::new(),
                },
            );
        }

        let edges: Vec<(String, String)> = nodes
            .iter()
            .flat_map(|(name, node)| {
                node.members
                    .iter()
                    .map(move |member| (name.clone(), member.clone()))
            })
            .collect();

        for (parent, member) in edges {
            if let Some(node) = nodes.get_mut(&member) {
                if !node.parents.contains(&parent) {
                    node.parents.push(parent);
                }
            }
        }

        Self { nodes }
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn kind_of(&self, name: &str) -> Option<TaskKind> {
        self.nodes.get(name).map(|n| n.kind)
    }

    /// Immediate members of a composite, in declaration order.
    pub fn members_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.members.as_slice())
            .unwrap_or(&[])
    }

    /// Composites that directly contain `name`.
    pub fn parents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Task names ordered so that every member appears before the composites
    /// containing it.
    pub fn members_first_order(&self) -> Vec<String> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        let mut names: Vec<&str> = self.tasks().collect();
        // Stable input order keeps the result deterministic.
        names.sort_unstable();

        for &name in names.iter() {
            graph.add_node(name);
        }
        for &name in names.iter() {
            for member in self.members_of(name) {
                graph.add_edge(member.as_str(), name, ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => order.into_iter().map(str::to_string).collect(),
            // Unreachable for validated configs; fall back to name order.
            Err(_) => names.into_iter().map(str::to_string).collect(),
        }
    }

    /// Leaf tasks reachable from `name`, in execution declaration order.
    pub fn leaves_under(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaves(name, &mut out);
        out
    }

    fn collect_leaves(&self, name: &str, out: &mut Vec<String>) {
        match self.kind_of(name) {
            Some(TaskKind::Leaf(_)) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
            }
            Some(_) => {
                for member in self.members_of(name) {
                    self.collect_leaves(member, out);
                }
            }
            None => {}
        }
    }
}
