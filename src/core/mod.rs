// src/core/mod.rs
mod engine;
mod parser;
mod snippet;
mod syntax;

// Call-graph analysis passes
mod analyzer;

pub use parser::PythonParser;
pub use syntax::{CallNode, FunctionDef, ImportNode, ImportTarget, OtherNode, SyntaxNode, SyntaxTree};

pub use analyzer::{
    build_tree, Analyzer, CallEdge, CallGraphMap, CallTree, FunctionEntry,
    FunctionRecord, ImportedSymbol, Label, ModuleResolver, TreeMode,
};

pub use snippet::{extract, replace};

// Export the main engine
pub use engine::Engine;
