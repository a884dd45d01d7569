// src/core/analyzer/types.rs
use std::collections::HashMap;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Location of one user-defined function.
///
/// Keyed by bare name in the tables, so two files defining the same name
/// collide; the later-processed definition wins. That imprecision is part
/// of the published behavior, not an oversight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub file: PathBuf,

    /// 1-indexed line of the definition
    pub start_line: usize,

    /// 1-indexed inclusive last line
    pub end_line: usize,
}

/// A name bound by an import statement.
///
/// Imported functions are opaque leaves: no line range is ever known for
/// them, only where the binding points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedSymbol {
    /// Resolved source file, None when resolution failed
    pub file: Option<PathBuf>,

    /// Dotted module reference as written
    pub module: String,
}

/// One recorded call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    /// Callee name
    pub name: String,

    /// File the callee lives in
    pub file: PathBuf,

    /// Callee definition lines; None when the callee is an imported
    /// symbol whose source was not parsed
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

/// A function together with its outgoing calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,

    /// Outgoing edges in the order the call sites were encountered
    pub calls: Vec<CallEdge>,
}

/// The flat call graph merged across every file an analysis touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallGraphMap {
    /// Function name -> entry; merged by name-keyed overwrite
    pub functions: HashMap<String, FunctionEntry>,
}

impl CallGraphMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FunctionEntry> {
        self.functions.get_mut(name)
    }

    pub fn insert(&mut self, name: String, entry: FunctionEntry) {
        self.functions.insert(name, entry);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Overwrite-merge another map into this one; entries from `other`
    /// win on name collisions
    pub fn merge(&mut self, other: CallGraphMap) {
        self.functions.extend(other.functions);
    }
}
