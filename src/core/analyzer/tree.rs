use std::collections::HashMap;

use crate::error::{CallscopeError, Result};
use super::label::Label;
use super::types::{CallEdge, CallGraphMap};

/// How a call graph gets projected into a single-parent tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeMode {
    /// Nodes are reused by name; a function discovered again moves under
    /// its most recent caller, silently detaching from the earlier one.
    /// This matches historical behavior and is the default.
    #[default]
    Reparent,

    /// Shared dependencies are duplicated per occurrence, so every
    /// caller keeps its own copy of the subtree.
    Expand,
}

/// Rooted projection of a [`CallGraphMap`], stored as an arena.
#[derive(Debug, Clone)]
pub struct CallTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

#[derive(Debug, Clone)]
struct TreeNode {
    label: Label,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Build the call tree rooted at `root_name`.
///
/// Every call edge becomes a child: callees present in the map get their
/// own subtree, while imported-only callees become leaves labeled with
/// the unknown-line placeholder. An absent root is a handled "not found",
/// never a panic.
pub fn build_tree(map: &CallGraphMap, root_name: &str, mode: TreeMode) -> Result<CallTree> {
    if !map.contains(root_name) {
        return Err(CallscopeError::FunctionNotFound(root_name.to_string()));
    }

    let mut builder = TreeBuilder {
        map,
        nodes: Vec::new(),
        cache: HashMap::new(),
    };

    let root = match mode {
        TreeMode::Reparent => builder.build_shared(root_name, &mut Vec::new()),
        TreeMode::Expand => builder.build_expanded(root_name, &mut Vec::new()),
    };

    match root {
        Some(root) => Ok(CallTree { nodes: builder.nodes, root }),
        None => Err(CallscopeError::FunctionNotFound(root_name.to_string())),
    }
}

impl CallTree {
    pub fn root_label(&self) -> &Label {
        &self.nodes[self.root].label
    }

    /// Post-order linearization: every child label before its parent, in
    /// the order the edges were recorded. This is the processing order
    /// downstream consumers rely on, dependencies before dependents.
    pub fn flatten(&self) -> Vec<String> {
        let mut labels = Vec::new();
        self.flatten_into(self.root, &mut labels);
        labels
    }

    fn flatten_into(&self, node: usize, labels: &mut Vec<String>) {
        for &child in &self.nodes[node].children {
            self.flatten_into(child, labels);
        }
        labels.push(self.nodes[node].label.encode());
    }

    /// ASCII rendering with box-drawing branches
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.nodes[self.root].label.encode());
        out.push('\n');
        self.render_children(self.root, "", &mut out);
        out
    }

    fn render_children(&self, node: usize, prefix: &str, out: &mut String) {
        let children = &self.nodes[node].children;
        for (index, &child) in children.iter().enumerate() {
            let last = index + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&self.nodes[child].label.encode());
            out.push('\n');

            let deeper = format!("{}{}", prefix, if last { "    " } else { "│   " });
            self.render_children(child, &deeper, out);
        }
    }
}

struct TreeBuilder<'a> {
    map: &'a CallGraphMap,
    nodes: Vec<TreeNode>,
    cache: HashMap<String, usize>,
}

impl TreeBuilder<'_> {
    fn alloc(&mut self, label: Label) -> usize {
        self.nodes.push(TreeNode {
            label,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Name-keyed reuse: a function seen before is returned from the
    /// cache and the caller re-parents it. An edge back to a node whose
    /// subtree is still being built (cross-file mutual recursion) is
    /// dropped instead; attaching it would cycle the tree.
    fn build_shared(&mut self, name: &str, open: &mut Vec<String>) -> Option<usize> {
        if let Some(&id) = self.cache.get(name) {
            if open.iter().any(|n| n == name) {
                return None;
            }
            return Some(id);
        }

        let entry = self.map.get(name)?.clone();
        let id = self.alloc(Label::from_entry(name, &entry));
        self.cache.insert(name.to_string(), id);
        open.push(name.to_string());

        for edge in &entry.calls {
            let child = if self.map.contains(&edge.name) {
                self.build_shared(&edge.name, open)
            } else {
                Some(self.leaf_for(edge))
            };
            if let Some(child) = child {
                self.attach(id, child);
            }
        }

        open.pop();
        Some(id)
    }

    fn leaf_for(&mut self, edge: &CallEdge) -> usize {
        if let Some(&id) = self.cache.get(&edge.name) {
            return id;
        }
        let id = self.alloc(Label::from_edge(edge));
        self.cache.insert(edge.name.clone(), id);
        id
    }

    /// Move `child` under `parent`, detaching it from any earlier
    /// parent. Skipped when the move would create a cycle; the graph
    /// can contain cross-file mutual recursion the per-file stack never
    /// saw.
    fn attach(&mut self, parent: usize, child: usize) {
        if self.is_ancestor(child, parent) {
            return;
        }
        if let Some(old) = self.nodes[child].parent {
            self.nodes[old].children.retain(|&c| c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn is_ancestor(&self, candidate: usize, node: usize) -> bool {
        let mut current = node;
        loop {
            if current == candidate {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Duplicate-per-occurrence projection; `open` guards graph cycles
    fn build_expanded(&mut self, name: &str, open: &mut Vec<String>) -> Option<usize> {
        if open.iter().any(|n| n == name) {
            return None;
        }
        let entry = self.map.get(name)?.clone();

        let id = self.alloc(Label::from_entry(name, &entry));
        open.push(name.to_string());

        for edge in &entry.calls {
            let child = if self.map.contains(&edge.name) {
                self.build_expanded(&edge.name, open)
            } else {
                Some(self.alloc(Label::from_edge(edge)))
            };
            if let Some(child) = child {
                self.nodes[child].parent = Some(id);
                self.nodes[id].children.push(child);
            }
        }

        open.pop();
        Some(id)
    }
}
