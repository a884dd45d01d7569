use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::syntax::{ImportTarget, SyntaxNode, SyntaxTree};
use super::driver::{Analyzer, FileAnalysis};
use super::resolver::ModuleResolver;
use super::types::{FunctionRecord, ImportedSymbol};

/// First pass over one file: function definitions and imported names.
///
/// The walk is strictly document order, and a resolved import is followed
/// inline: the imported file is fully analyzed and merged before the
/// walk continues. That ordering is what makes the name-keyed overwrite
/// semantics come out right: a definition written after an import shadows
/// the imported one, and vice versa.
pub(crate) struct Collector<'a> {
    analyzer: &'a Analyzer,
    file: &'a Path,
    resolver: ModuleResolver,
}

impl<'a> Collector<'a> {
    pub fn new(analyzer: &'a Analyzer, file: &'a Path, base_dir: &Path) -> Self {
        let resolver = analyzer.resolver_for(base_dir);
        Self { analyzer, file, resolver }
    }

    pub fn collect(
        &self,
        tree: &SyntaxTree,
        analysis: &mut FileAnalysis,
        visited: &mut HashSet<PathBuf>,
    ) {
        for node in &tree.nodes {
            self.collect_node(node, analysis, visited);
        }
    }

    fn collect_node(
        &self,
        node: &SyntaxNode,
        analysis: &mut FileAnalysis,
        visited: &mut HashSet<PathBuf>,
    ) {
        match node {
            SyntaxNode::Definition(def) => {
                // Nested definitions land in the same table under their
                // bare name
                analysis.functions.insert(
                    def.name.clone(),
                    FunctionRecord {
                        file: self.file.to_path_buf(),
                        start_line: def.start_line,
                        end_line: def.end_line,
                    },
                );
                for child in &def.body {
                    self.collect_node(child, analysis, visited);
                }
            }
            SyntaxNode::Import(import) => {
                for target in &import.targets {
                    self.collect_import(target, analysis, visited);
                }
            }
            SyntaxNode::Call(call) => {
                for child in &call.children {
                    self.collect_node(child, analysis, visited);
                }
            }
            SyntaxNode::Other(other) => {
                for child in &other.children {
                    self.collect_node(child, analysis, visited);
                }
            }
        }
    }

    fn collect_import(
        &self,
        target: &ImportTarget,
        analysis: &mut FileAnalysis,
        visited: &mut HashSet<PathBuf>,
    ) {
        let resolved = self.resolver.resolve(&target.module);

        analysis.imports.insert(
            target.name.clone(),
            ImportedSymbol {
                file: resolved.clone(),
                module: target.module.clone(),
            },
        );

        match resolved {
            Some(path) => self.analyzer.follow_import(&path, analysis, visited),
            None => debug!(
                "Unresolved import '{}' in {}",
                target.module,
                self.file.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::core::parser::PythonParser;

    fn collect_source(source: &str) -> FileAnalysis {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.py");

        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse(source, &file).unwrap();

        let analyzer = Analyzer::new(AnalysisConfig::default());
        let collector = Collector::new(&analyzer, &file, dir.path());

        let mut analysis = FileAnalysis::default();
        let mut visited = HashSet::new();
        collector.collect(&tree, &mut analysis, &mut visited);
        analysis
    }

    #[test]
    fn test_collects_nested_definitions() {
        let analysis = collect_source(
            "def outer():\n    def inner():\n        pass\n    return inner\n",
        );

        let outer = &analysis.functions["outer"];
        assert_eq!((outer.start_line, outer.end_line), (1, 4));

        let inner = &analysis.functions["inner"];
        assert_eq!((inner.start_line, inner.end_line), (2, 3));
    }

    #[test]
    fn test_line_ranges_stay_inside_the_file() {
        let source = "def a():\n    return 1\n\n\ndef b():\n    x = 1\n    return x\n";
        let analysis = collect_source(source);
        let total = source.lines().count();

        for record in analysis.functions.values() {
            assert!(record.start_line <= record.end_line);
            assert!(record.end_line <= total);
        }
    }

    #[test]
    fn test_unresolved_import_recorded_without_file() {
        let analysis = collect_source("from missing import thing\n");

        let symbol = &analysis.imports["thing"];
        assert_eq!(symbol.file, None);
        assert_eq!(symbol.module, "missing");
    }
}
