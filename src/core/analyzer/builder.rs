use std::collections::HashMap;
use std::path::Path;

use crate::core::syntax::{CallNode, SyntaxNode, SyntaxTree};
use super::types::{CallEdge, CallGraphMap, FunctionEntry, FunctionRecord, ImportedSymbol};

/// Second pass over one file: attribute every call expression to its
/// enclosing function and record the edges.
///
/// The walk carries an explicit stack of currently-open function names.
/// A call whose target is anywhere on that stack (not just on top) is
/// dropped entirely, which suppresses direct self-calls and any mutual
/// recursion among nested definitions.
pub(crate) struct CallGraphBuilder<'a> {
    file: &'a Path,
    functions: &'a HashMap<String, FunctionRecord>,
    imports: &'a HashMap<String, ImportedSymbol>,
    stack: Vec<String>,
}

impl<'a> CallGraphBuilder<'a> {
    pub fn new(
        file: &'a Path,
        functions: &'a HashMap<String, FunctionRecord>,
        imports: &'a HashMap<String, ImportedSymbol>,
    ) -> Self {
        Self {
            file,
            functions,
            imports,
            stack: Vec::new(),
        }
    }

    pub fn run(mut self, tree: &SyntaxTree, graph: &mut CallGraphMap) {
        for node in &tree.nodes {
            self.walk(node, graph);
        }
    }

    fn walk(&mut self, node: &SyntaxNode, graph: &mut CallGraphMap) {
        match node {
            SyntaxNode::Definition(def) => {
                graph.insert(def.name.clone(), self.open_entry(def.name.as_str(), def.start_line, def.end_line));
                self.stack.push(def.name.clone());
                for child in &def.body {
                    self.walk(child, graph);
                }
                self.stack.pop();
            }
            SyntaxNode::Call(call) => {
                self.record_call(call, graph);
                for child in &call.children {
                    self.walk(child, graph);
                }
            }
            SyntaxNode::Import(_) => {}
            SyntaxNode::Other(other) => {
                for child in &other.children {
                    self.walk(child, graph);
                }
            }
        }
    }

    /// Fresh entry for a definition being opened; location comes from the
    /// collected table so merged cross-file records stay authoritative
    fn open_entry(&self, name: &str, start_line: usize, end_line: usize) -> FunctionEntry {
        match self.functions.get(name) {
            Some(record) => FunctionEntry {
                file: record.file.clone(),
                start_line: record.start_line,
                end_line: record.end_line,
                calls: Vec::new(),
            },
            None => FunctionEntry {
                file: self.file.to_path_buf(),
                start_line,
                end_line,
                calls: Vec::new(),
            },
        }
    }

    fn record_call(&self, call: &CallNode, graph: &mut CallGraphMap) {
        // Module-level calls have no enclosing function and are ignored
        let Some(current) = self.stack.last() else {
            return;
        };
        let Some(name) = call.callee.as_deref() else {
            return;
        };

        // Recursion suppression: no edge back into any open frame
        if self.stack.iter().any(|open| open == name) {
            return;
        }

        let edge = if let Some(record) = self.functions.get(name) {
            CallEdge {
                name: name.to_string(),
                file: record.file.clone(),
                start_line: Some(record.start_line),
                end_line: Some(record.end_line),
            }
        } else if let Some(symbol) = self.imports.get(name) {
            match &symbol.file {
                Some(path) => CallEdge {
                    name: name.to_string(),
                    file: path.clone(),
                    start_line: None,
                    end_line: None,
                },
                // An import that never resolved is indistinguishable
                // from noise
                None => return,
            }
        } else {
            // Builtins, parameters, unresolved externals
            return;
        };

        if let Some(entry) = graph.get_mut(current) {
            entry.calls.push(edge);
        }
    }
}
