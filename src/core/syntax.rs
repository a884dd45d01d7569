//! Typed syntax-tree representation produced by the parser front end.
//!
//! Only the constructs the analyzer cares about get their own variant:
//! function definitions, imports, and call expressions. Everything else
//! is folded into `Other` nodes that merely preserve nesting, so the
//! collector and builder can walk the tree with explicit state instead
//! of dispatching on raw grammar kinds.

/// One parsed source file, lowered to analyzer-relevant nodes.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    /// Top-level nodes in document order
    pub nodes: Vec<SyntaxNode>,

    /// Total number of lines in the source file
    pub total_lines: usize,
}

#[derive(Debug, Clone)]
pub enum SyntaxNode {
    /// A function definition (module-level, nested, or method)
    Definition(FunctionDef),

    /// An import statement binding one or more names
    Import(ImportNode),

    /// A call expression
    Call(CallNode),

    /// Any other construct that can contain the above
    Other(OtherNode),
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Bare function name; nesting and receivers are not qualified
    pub name: String,

    /// 1-indexed line of the `def` keyword
    pub start_line: usize,

    /// 1-indexed last source line of the body (see parser end-line rules)
    pub end_line: usize,

    /// Lowered body in document order (parameters, block, decorators)
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone)]
pub struct ImportNode {
    pub line: usize,

    /// Names bound by this statement, with the module each comes from
    pub targets: Vec<ImportTarget>,
}

/// One name introduced by an import statement.
///
/// Aliases are deliberately not tracked: `from m import f as g` binds
/// `f` here, and calls through `g` fall out as unresolved noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// Dotted module reference to resolve
    pub module: String,

    /// Name the statement binds (`*` for wildcard imports)
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CallNode {
    /// Resolved callee name, or None when the call target has no
    /// usable name (subscripts, nested call results, lambdas)
    pub callee: Option<String>,

    pub line: usize,

    /// Lowered callee subtree and arguments, in source order
    pub children: Vec<SyntaxNode>,
}

#[derive(Debug, Clone)]
pub struct OtherNode {
    pub line: usize,

    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Child nodes, for walkers that do not care about the variant
    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            SyntaxNode::Definition(def) => &def.body,
            SyntaxNode::Import(_) => &[],
            SyntaxNode::Call(call) => &call.children,
            SyntaxNode::Other(other) => &other.children,
        }
    }
}
