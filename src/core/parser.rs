use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{CallscopeError, Result};
use super::syntax::{
    CallNode, FunctionDef, ImportNode, ImportTarget, OtherNode, SyntaxNode, SyntaxTree,
};

/// Python source parser built on Tree-sitter.
///
/// Lowers the concrete syntax tree into the typed [`SyntaxTree`] the
/// analyzer passes consume. A file whose parse contains syntax errors is
/// rejected outright so that it contributes empty tables upstream.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser.set_language(&python_language)
            .map_err(|e| CallscopeError::Parse(format!("Failed to set Python language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse a source file into the typed syntax tree
    pub fn parse(&mut self, source: &str, file_path: &Path) -> Result<SyntaxTree> {
        let tree = self.parser.parse(source, None)
            .ok_or_else(|| CallscopeError::Parse(
                format!("Failed to parse {}", file_path.display())
            ))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(CallscopeError::Parse(
                format!("Syntax error in {} near line {}", file_path.display(), line)
            ));
        }

        Ok(SyntaxTree {
            nodes: self.lower_children(root, source),
            total_lines: source.lines().count(),
        })
    }

    fn lower_children(&self, node: Node, source: &str) -> Vec<SyntaxNode> {
        let mut lowered = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if let Some(n) = self.lower_node(child, source) {
                lowered.push(n);
            }
        }
        lowered
    }

    fn lower_node(&self, node: Node, source: &str) -> Option<SyntaxNode> {
        match node.kind() {
            "function_definition" => self.lower_function(node, source, Vec::new()),
            "decorated_definition" => self.lower_decorated(node, source),
            "import_statement" => Some(self.lower_import(node, source)),
            "import_from_statement" => Some(self.lower_import_from(node, source)),
            "call" => Some(self.lower_call(node, source)),
            "comment" => None,
            _ => {
                // Keep the nesting but only when something of interest
                // survives underneath
                let children = self.lower_children(node, source);
                if children.is_empty() {
                    None
                } else {
                    Some(SyntaxNode::Other(OtherNode {
                        line: node.start_position().row + 1,
                        children,
                    }))
                }
            }
        }
    }

    /// Lower a function definition.
    ///
    /// The body is assembled in the order the original AST walks it:
    /// parameter defaults, the block, then decorators, so calls in any
    /// of them are attributed to this function by the builder pass.
    fn lower_function(
        &self,
        node: Node,
        source: &str,
        decorators: Vec<SyntaxNode>,
    ) -> Option<SyntaxNode> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node, source).to_string();
        let start_line = node.start_position().row + 1;
        let end_line = start_line.max(self.max_source_line(node));

        let mut body = Vec::new();
        if let Some(parameters) = node.child_by_field_name("parameters") {
            body.extend(self.lower_children(parameters, source));
        }
        if let Some(block) = node.child_by_field_name("body") {
            body.extend(self.lower_children(block, source));
        }
        body.extend(decorators);

        Some(SyntaxNode::Definition(FunctionDef {
            name,
            start_line,
            end_line,
            body,
        }))
    }

    fn lower_decorated(&self, node: Node, source: &str) -> Option<SyntaxNode> {
        let definition = node.child_by_field_name("definition");

        if let Some(def) = definition.filter(|d| d.kind() == "function_definition") {
            let mut decorators = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "decorator" {
                    decorators.extend(self.lower_children(child, source));
                }
            }
            return self.lower_function(def, source, decorators);
        }

        // Decorated class: nothing special, keep descending
        let children = self.lower_children(node, source);
        if children.is_empty() {
            None
        } else {
            Some(SyntaxNode::Other(OtherNode {
                line: node.start_position().row + 1,
                children,
            }))
        }
    }

    /// `import a.b, c`: each module binds its own dotted name
    fn lower_import(&self, node: Node, source: &str) -> SyntaxNode {
        let mut targets = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "dotted_name" => {
                    let module = self.node_text(child, source).to_string();
                    targets.push(ImportTarget { name: module.clone(), module });
                }
                "aliased_import" => {
                    // The alias is ignored on purpose; the module name is
                    // what the tables track
                    if let Some(name_node) = child.child_by_field_name("name") {
                        let module = self.node_text(name_node, source).to_string();
                        targets.push(ImportTarget { name: module.clone(), module });
                    }
                }
                _ => {}
            }
        }

        SyntaxNode::Import(ImportNode {
            line: node.start_position().row + 1,
            targets,
        })
    }

    /// `from a.b import f, g as h`: every imported name binds against
    /// the same module. Relative imports are resolved by stripping the
    /// leading dots; a bare `from . import x` binds nothing.
    fn lower_import_from(&self, node: Node, source: &str) -> SyntaxNode {
        let line = node.start_position().row + 1;

        let module = match node.child_by_field_name("module_name") {
            Some(m) => self.node_text(m, source).trim_start_matches('.').to_string(),
            None => String::new(),
        };

        let mut targets = Vec::new();
        if !module.is_empty() {
            let mut cursor = node.walk();
            for child in node.children_by_field_name("name", &mut cursor) {
                let name_node = match child.kind() {
                    "dotted_name" => Some(child),
                    "aliased_import" => child.child_by_field_name("name"),
                    _ => None,
                };
                if let Some(n) = name_node {
                    targets.push(ImportTarget {
                        module: module.clone(),
                        name: self.node_text(n, source).to_string(),
                    });
                }
            }

            if targets.is_empty() {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "wildcard_import" {
                        targets.push(ImportTarget {
                            module: module.clone(),
                            name: "*".to_string(),
                        });
                    }
                }
            }
        }

        SyntaxNode::Import(ImportNode { line, targets })
    }

    fn lower_call(&self, node: Node, source: &str) -> SyntaxNode {
        let function = node.child_by_field_name("function");
        let callee = function.and_then(|f| self.callee_name(f, source));

        let mut children = Vec::new();
        if let Some(f) = function {
            // Nested calls can hide in the callee position: get()(),
            // obj.method(x).chain()
            if let Some(n) = self.lower_node(f, source) {
                children.push(n);
            }
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            children.extend(self.lower_children(arguments, source));
        }

        SyntaxNode::Call(CallNode {
            callee,
            line: node.start_position().row + 1,
            children,
        })
    }

    /// Best-effort callee naming: a bare identifier names itself; an
    /// attribute access keeps only its trailing name, so `a.b.run()` and
    /// `c.run()` both resolve to `run`. Receiver types are never
    /// examined.
    fn callee_name(&self, node: Node, source: &str) -> Option<String> {
        match node.kind() {
            "identifier" => Some(self.node_text(node, source).to_string()),
            "attribute" => node
                .child_by_field_name("attribute")
                .map(|a| self.node_text(a, source).to_string()),
            _ => None,
        }
    }

    /// Last source line covered by a definition: the maximum start line
    /// over its non-comment descendants. Trailing blank lines and
    /// comments after the final statement carry no node and are excluded.
    fn max_source_line(&self, node: Node) -> usize {
        let mut last = node.start_position().row + 1;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            last = last.max(self.max_source_line(child));
        }
        last
    }

    /// Extract text content of a node
    fn node_text<'a>(&self, node: Node, source: &'a str) -> &'a str {
        &source[node.byte_range()]
    }
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn parse(source: &str) -> SyntaxTree {
        let mut parser = PythonParser::new().unwrap();
        parser.parse(source, &PathBuf::from("test.py")).unwrap()
    }

    fn find_definition(nodes: &[SyntaxNode]) -> Option<&FunctionDef> {
        for node in nodes {
            if let SyntaxNode::Definition(def) = node {
                return Some(def);
            }
            if let Some(def) = find_definition(node.children()) {
                return Some(def);
            }
        }
        None
    }

    fn first_definition(tree: &SyntaxTree) -> &FunctionDef {
        find_definition(&tree.nodes).expect("no definition found")
    }

    fn calls_in(nodes: &[SyntaxNode], out: &mut Vec<Option<String>>) {
        for node in nodes {
            if let SyntaxNode::Call(call) = node {
                out.push(call.callee.clone());
            }
            calls_in(node.children(), out);
        }
    }

    #[test]
    fn test_lower_simple_function() {
        let tree = parse("def foo():\n    return 1\n");
        let def = first_definition(&tree);
        assert_eq!(def.name, "foo");
        assert_eq!(def.start_line, 1);
        assert_eq!(def.end_line, 2);
        assert_eq!(tree.total_lines, 2);
    }

    #[test]
    fn test_end_line_excludes_trailing_comment() {
        let tree = parse("def foo():\n    x = 1\n    # trailing note\n");
        let def = first_definition(&tree);
        assert_eq!(def.end_line, 2);
    }

    #[test]
    fn test_attribute_call_uses_trailing_name() {
        let tree = parse("def f():\n    client.session.get(url)\n");
        let mut calls = Vec::new();
        calls_in(&first_definition(&tree).body, &mut calls);
        assert_eq!(calls, vec![Some("get".to_string())]);
    }

    #[test]
    fn test_subscript_call_has_no_name() {
        let tree = parse("def f():\n    handlers[0]()\n");
        let mut calls = Vec::new();
        calls_in(&first_definition(&tree).body, &mut calls);
        assert_eq!(calls, vec![None]);
    }

    #[test]
    fn test_from_import_binds_original_names() {
        let tree = parse("from util import helper, fmt as f\n");
        let targets = match &tree.nodes[0] {
            SyntaxNode::Import(import) => &import.targets,
            other => panic!("expected import, got {:?}", other),
        };
        assert_eq!(
            targets,
            &vec![
                ImportTarget { module: "util".into(), name: "helper".into() },
                ImportTarget { module: "util".into(), name: "fmt".into() },
            ]
        );
    }

    #[test]
    fn test_bare_relative_import_binds_nothing() {
        let tree = parse("from . import sibling\n");
        let targets = match &tree.nodes[0] {
            SyntaxNode::Import(import) => &import.targets,
            other => panic!("expected import, got {:?}", other),
        };
        assert!(targets.is_empty());
    }

    #[test]
    fn test_dotted_import_binds_module_path() {
        let tree = parse("import pkg.mod\n");
        let targets = match &tree.nodes[0] {
            SyntaxNode::Import(import) => &import.targets,
            other => panic!("expected import, got {:?}", other),
        };
        assert_eq!(
            targets,
            &vec![ImportTarget { module: "pkg.mod".into(), name: "pkg.mod".into() }]
        );
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let mut parser = PythonParser::new().unwrap();
        let result = parser.parse("def broken(:\n", &PathBuf::from("bad.py"));
        assert!(matches!(result, Err(CallscopeError::Parse(_))));
    }

    #[test]
    fn test_methods_lowered_under_bare_name() {
        let tree = parse("class Greeter:\n    def greet(self):\n        return 'hi'\n");
        assert!(matches!(&tree.nodes[0], SyntaxNode::Other(_)));
        let def = first_definition(&tree);
        assert_eq!(def.name, "greet");
        assert_eq!(def.start_line, 2);
    }
}
