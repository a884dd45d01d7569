use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::{CallscopeError, Result};
use crate::core::parser::PythonParser;
use crate::core::syntax::SyntaxNode;
use super::builder::CallGraphBuilder;
use super::collector::Collector;
use super::resolver::ModuleResolver;
use super::types::{CallGraphMap, FunctionRecord, ImportedSymbol};

/// Tables produced by analyzing one file plus everything it imports.
#[derive(Debug, Default)]
pub(crate) struct FileAnalysis {
    pub functions: HashMap<String, FunctionRecord>,
    pub imports: HashMap<String, ImportedSymbol>,
    pub graph: CallGraphMap,
}

impl FileAnalysis {
    /// Overwrite-merge a fully analyzed import into this file's tables
    fn absorb(&mut self, other: FileAnalysis) {
        self.functions.extend(other.functions);
        self.imports.extend(other.imports);
        self.graph.merge(other.graph);
    }
}

/// Drives collection and call-graph building across an import closure.
///
/// All per-run state (the visited set guarding against import cycles,
/// and every intermediate table) lives on the stack of one `analyze`
/// call. Concurrent analyses never share anything.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze an entry file and every import transitively reachable
    /// from it, producing the merged flat call graph.
    ///
    /// A file that fails to read or parse contributes empty tables and
    /// the run continues; only a failure on the entry file itself is
    /// fatal.
    pub fn analyze(&self, entry: &Path) -> Result<CallGraphMap> {
        self.analyze_with_base(entry, None)
    }

    /// Like [`Analyzer::analyze`] with an explicit import search base
    /// instead of the entry file's directory.
    pub fn analyze_with_base(&self, entry: &Path, base_dir: Option<&Path>) -> Result<CallGraphMap> {
        let mut visited = HashSet::new();
        visited.insert(normalize(entry));

        let analysis = self.process_file(entry, base_dir, &mut visited)?;

        debug!(
            "Analysis of {} covered {} functions across {} file(s)",
            entry.display(),
            analysis.graph.len(),
            visited.len()
        );
        Ok(analysis.graph)
    }

    /// Names of the functions defined directly in one file, breadth
    /// first: top-level definitions come before nested ones. No imports
    /// are followed and no calls are analyzed.
    pub fn function_names(&self, path: &Path) -> Result<Vec<String>> {
        let source = self.read_source(path)?;
        let tree = PythonParser::new()?.parse(&source, path)?;

        let mut names = Vec::new();
        let mut queue: VecDeque<&SyntaxNode> = tree.nodes.iter().collect();
        while let Some(node) = queue.pop_front() {
            if let SyntaxNode::Definition(def) = node {
                names.push(def.name.clone());
            }
            queue.extend(node.children());
        }
        Ok(names)
    }

    /// Full pipeline for one file: parse, collect (recursing into
    /// resolved imports), then build this file's call edges against the
    /// merged tables.
    fn process_file(
        &self,
        path: &Path,
        base_dir: Option<&Path>,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<FileAnalysis> {
        let source = self.read_source(path)?;
        let tree = PythonParser::new()?.parse(&source, path)?;

        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => parent_dir(path),
        };

        let mut analysis = FileAnalysis::default();
        Collector::new(self, path, &base).collect(&tree, &mut analysis, visited);
        CallGraphBuilder::new(path, &analysis.functions, &analysis.imports)
            .run(&tree, &mut analysis.graph);

        Ok(analysis)
    }

    /// Recurse into a resolved import unless its file was already
    /// processed this run. Failures are absorbed: the module contributes
    /// nothing and the caller keeps going.
    pub(crate) fn follow_import(
        &self,
        path: &Path,
        analysis: &mut FileAnalysis,
        visited: &mut HashSet<PathBuf>,
    ) {
        if !visited.insert(normalize(path)) {
            return;
        }

        match self.process_file(path, None, visited) {
            Ok(child) => analysis.absorb(child),
            Err(e) => warn!("Skipping imported module {}: {}", path.display(), e),
        }
    }

    pub(crate) fn resolver_for(&self, base_dir: &Path) -> ModuleResolver {
        ModuleResolver::new(
            base_dir,
            &self.config.search_roots,
            &self.config.vendor_markers,
            &self.config.source_extension,
        )
    }

    fn read_source(&self, path: &Path) -> Result<String> {
        let source = std::fs::read_to_string(path)?;
        if source.len() > self.config.max_file_size {
            return Err(CallscopeError::Parse(
                format!("File {} exceeds maximum size limit", path.display())
            ));
        }
        Ok(source)
    }
}

/// Visited-set key: canonical where the file system cooperates
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => PathBuf::from("."),
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    use super::*;

    fn analyzer() -> Analyzer {
        Analyzer::new(AnalysisConfig::default())
    }

    #[test]
    fn test_follows_imports_across_files() {
        let dir = TempDir::new().unwrap();
        dir.child("util.py")
            .write_str("def helper():\n    return 1\n")
            .unwrap();
        dir.child("main.py")
            .write_str("from util import helper\n\ndef main():\n    helper()\n")
            .unwrap();

        let graph = analyzer().analyze(dir.child("main.py").path()).unwrap();

        assert!(graph.contains("main"));
        assert!(graph.contains("helper"));

        // helper's definition was parsed, so the edge carries real lines
        let calls = &graph.get("main").unwrap().calls;
        assert_eq!(calls[0].name, "helper");
        assert_eq!(calls[0].start_line, Some(1));
    }

    #[test]
    fn test_circular_imports_terminate() {
        let dir = TempDir::new().unwrap();
        dir.child("x.py")
            .write_str("import y\n\ndef from_x():\n    pass\n")
            .unwrap();
        dir.child("y.py")
            .write_str("import x\n\ndef from_y():\n    pass\n")
            .unwrap();

        let graph = analyzer().analyze(dir.child("x.py").path()).unwrap();

        assert!(graph.contains("from_x"));
        assert!(graph.contains("from_y"));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_broken_import_is_absorbed() {
        let dir = TempDir::new().unwrap();
        dir.child("broken.py")
            .write_str("def oops(:\n")
            .unwrap();
        dir.child("main.py")
            .write_str("from broken import oops\n\ndef main():\n    oops()\n")
            .unwrap();

        let graph = analyzer().analyze(dir.child("main.py").path()).unwrap();

        // The broken module contributed nothing, but its import binding
        // survives as an opaque leaf
        assert!(graph.contains("main"));
        assert!(!graph.contains("oops"));
        let calls = &graph.get("main").unwrap().calls;
        assert_eq!(calls[0].name, "oops");
        assert_eq!(calls[0].start_line, None);
    }

    #[test]
    fn test_entry_parse_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        dir.child("bad.py").write_str("def bad(:\n").unwrap();

        let result = analyzer().analyze(dir.child("bad.py").path());
        assert!(matches!(result, Err(CallscopeError::Parse(_))));
    }

    #[test]
    fn test_later_definition_wins_name_collision() {
        let dir = TempDir::new().unwrap();
        dir.child("util.py")
            .write_str("def fmt():\n    return 'lib'\n")
            .unwrap();
        dir.child("main.py")
            .write_str("from util import fmt\n\ndef fmt():\n    return 'local'\n")
            .unwrap();

        let graph = analyzer().analyze(dir.child("main.py").path()).unwrap();

        // The entry file's own definition comes after the import and
        // overwrites the imported one
        let entry = graph.get("fmt").unwrap();
        assert!(entry.file.ends_with("main.py"));
        assert_eq!(entry.start_line, 3);
    }

    #[test]
    fn test_function_names_skips_imports() {
        let dir = TempDir::new().unwrap();
        dir.child("other.py").write_str("def elsewhere():\n    pass\n").unwrap();
        dir.child("menu.py")
            .write_str("import other\n\ndef first():\n    def inner():\n        pass\n\ndef second():\n    pass\n")
            .unwrap();

        let names = analyzer()
            .function_names(dir.child("menu.py").path())
            .unwrap();

        // Breadth first: both top-level names before the nested one
        assert_eq!(names, vec!["first", "second", "inner"]);
    }

    #[test]
    fn test_missing_entry_file_is_io_error() {
        let result = analyzer().analyze(Path::new("/nonexistent/zzz.py"));
        assert!(matches!(result, Err(CallscopeError::Io(_))));
    }
}
