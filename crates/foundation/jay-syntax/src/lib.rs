//! Abstract syntax tree for the Jay language
//!
//! Nodes are arena-allocated per source file and referred to by index, so a
//! back reference held elsewhere (for example by a scope node) never owns or
//! extends the life of a node. Every node carries its source span; the scope
//! builder consumes spans and node shape, nothing else.

pub mod walk;

use jay_arena::{Arena, Idx};
use jay_intern::Symbol;
use jay_span::{FileId, Span};

/// AST node IDs
pub type DeclId = Idx<Decl>;
pub type StmtId = Idx<Stmt>;
pub type ExprId = Idx<Expr>;
pub type PatternId = Idx<Pattern>;

/// One item of a source file or a block: a declaration or a statement.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Item {
    /// A declaration
    Decl(DeclId),
    /// A statement (top-level code, or ordinary statements inside blocks)
    Stmt(StmtId),
}

/// A declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// `struct` declaration (value type)
    Struct(NominalDecl),
    /// `enum` declaration (value type)
    Enum(NominalDecl),
    /// `trait` declaration (protocol-like)
    Trait(NominalDecl),
    /// `fn` declaration
    Function(FunctionDecl),
    /// `let`/`var` declaration with one or more entries
    Binding(BindingDecl),
}

impl Decl {
    /// The declared name, if the declaration introduces a single one.
    /// Bindings introduce names through their patterns instead.
    pub fn name(&self) -> Option<Symbol> {
        match self {
            Self::Struct(nominal) | Self::Enum(nominal) | Self::Trait(nominal) => {
                Some(nominal.name)
            }
            Self::Function(function) => Some(function.name),
            Self::Binding(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Struct(nominal) | Self::Enum(nominal) | Self::Trait(nominal) => nominal.span,
            Self::Function(function) => function.span,
            Self::Binding(binding) => binding.span,
        }
    }

    pub fn as_nominal(&self) -> Option<&NominalDecl> {
        match self {
            Self::Struct(nominal) | Self::Enum(nominal) | Self::Trait(nominal) => Some(nominal),
            Self::Function(_) | Self::Binding(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_binding(&self) -> Option<&BindingDecl> {
        match self {
            Self::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    /// The declaration's generic parameters, outermost first.
    pub fn generics(&self) -> &[GenericParam] {
        match self {
            Self::Struct(nominal) | Self::Enum(nominal) | Self::Trait(nominal) => {
                &nominal.generics
            }
            Self::Function(function) => &function.generics,
            Self::Binding(_) => &[],
        }
    }

    /// Protocol-like declarations obey the illegal-nesting visibility rule.
    pub fn is_trait(&self) -> bool {
        matches!(self, Self::Trait(_))
    }
}

/// A nominal type declaration: `struct`, `enum` or `trait`
#[derive(Debug, Clone, PartialEq)]
pub struct NominalDecl {
    /// Type name
    pub name: Symbol,
    /// Generic parameters, in source order
    pub generics: Vec<GenericParam>,
    /// Trailing `where` clause
    pub where_clause: Option<WhereClause>,
    /// Member declarations, in source order
    pub members: Vec<DeclId>,
    /// Span of the braced body
    pub body_span: Span,
    /// Span of the whole declaration
    pub span: Span,
}

/// One generic parameter, e.g. `B: A` in `<A, B: A>`
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    /// Parameter name
    pub name: Symbol,
    /// Inline constraint, if any
    pub constraint: Option<TypeRef>,
    /// Span of the parameter including its constraint
    pub span: Span,
}

/// A trailing `where` clause
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// Requirements, in source order
    pub requirements: Vec<WhereRequirement>,
    /// Span of the whole clause
    pub span: Span,
}

/// One `Subject: Bound` requirement of a `where` clause
#[derive(Debug, Clone, PartialEq)]
pub struct WhereRequirement {
    /// Constrained type
    pub subject: TypeRef,
    /// Required bound
    pub bound: TypeRef,
    /// Span of the requirement
    pub span: Span,
}

/// A syntactic reference to a type by name
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    /// Referenced name
    pub name: Symbol,
    /// Span of the reference
    pub span: Span,
}

/// A function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Function name
    pub name: Symbol,
    /// Generic parameters, in source order
    pub generics: Vec<GenericParam>,
    /// Parameters, in source order
    pub params: Vec<Param>,
    /// Span of the parenthesized parameter list
    pub param_span: Span,
    /// Trailing `where` clause
    pub where_clause: Option<WhereClause>,
    /// Declared return type
    pub return_type: Option<TypeRef>,
    /// Body block (`Stmt::Block`), absent for requirements without bodies
    pub body: Option<StmtId>,
    /// Span of the whole declaration
    pub span: Span,
}

/// One function or closure parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: Symbol,
    /// Declared type
    pub ty: Option<TypeRef>,
    /// Default argument expression
    pub default: Option<ExprId>,
    /// Span of the parameter
    pub span: Span,
}

/// A `let`/`var` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct BindingDecl {
    /// `var` rather than `let`
    pub mutable: bool,
    /// Entries, in source order (`let a = 1, b = a` has two)
    pub entries: Vec<BindingEntry>,
    /// Span of the whole declaration
    pub span: Span,
}

/// One entry of a binding declaration
#[derive(Debug, Clone, PartialEq)]
pub struct BindingEntry {
    /// Bound pattern
    pub pattern: PatternId,
    /// Initializer expression
    pub init: Option<ExprId>,
    /// Accessors (`get`/`set`), for computed or observed entries
    pub accessors: Vec<Accessor>,
    /// Span of the entry
    pub span: Span,
}

/// A `get` or `set` accessor attached to a binding entry
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// Accessor kind
    pub kind: AccessorKind,
    /// Body block (`Stmt::Block`)
    pub body: StmtId,
    /// Span of the accessor
    pub span: Span,
}

/// Accessor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// `get`
    Get,
    /// `set`
    Set,
}

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `{ ... }`
    Block(Block),
    /// `if` with a condition clause chain
    If {
        /// Condition clauses, in source order
        conditions: Vec<Condition>,
        /// Then body (`Stmt::Block`)
        then_body: StmtId,
        /// Else body (`Stmt::Block`), if any
        else_body: Option<StmtId>,
        /// Span of the whole statement
        span: Span,
    },
    /// `while` with a condition clause chain
    While {
        /// Condition clauses, in source order
        conditions: Vec<Condition>,
        /// Body (`Stmt::Block`)
        body: StmtId,
        /// Span of the whole statement
        span: Span,
    },
    /// `guard ... else { ... }`
    Guard {
        /// Condition clauses, in source order
        conditions: Vec<Condition>,
        /// Else body (`Stmt::Block`)
        else_body: StmtId,
        /// Span of the whole statement
        span: Span,
    },
    /// `repeat { ... } while cond`
    RepeatWhile {
        /// Body (`Stmt::Block`)
        body: StmtId,
        /// Trailing condition
        condition: ExprId,
        /// Span of the whole statement
        span: Span,
    },
    /// `for pattern in iterable { ... }`
    For {
        /// Loop pattern
        pattern: PatternId,
        /// Iterated expression
        iterable: ExprId,
        /// Body (`Stmt::Block`)
        body: StmtId,
        /// Span of the whole statement
        span: Span,
    },
    /// `switch scrutinee { case ... }`
    Switch {
        /// Switched expression
        scrutinee: ExprId,
        /// Cases, in source order
        cases: Vec<SwitchCase>,
        /// Span of the whole statement
        span: Span,
    },
    /// `do { ... } catch ...`
    Do {
        /// Body (`Stmt::Block`)
        body: StmtId,
        /// Catch clauses, in source order
        catches: Vec<CatchClause>,
        /// Span of the whole statement
        span: Span,
    },
    /// Expression statement
    Expr {
        /// The expression
        expr: ExprId,
        /// Span of the statement
        span: Span,
    },
    /// `return`
    Return {
        /// Returned value, if any
        value: Option<ExprId>,
        /// Span of the statement
        span: Span,
    },
    /// `break`
    Break {
        /// Span of the statement
        span: Span,
    },
    /// `continue`
    Continue {
        /// Span of the statement
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Self::Block(block) => block.span,
            Self::If { span, .. }
            | Self::While { span, .. }
            | Self::Guard { span, .. }
            | Self::RepeatWhile { span, .. }
            | Self::For { span, .. }
            | Self::Switch { span, .. }
            | Self::Do { span, .. }
            | Self::Expr { span, .. }
            | Self::Return { span, .. }
            | Self::Break { span }
            | Self::Continue { span } => *span,
        }
    }
}

/// A braced sequence of items
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Declarations and statements, in source order
    pub items: Vec<Item>,
    /// Span including the braces
    pub span: Span,
}

/// One clause of an `if`/`while`/`guard` condition chain
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A boolean condition expression
    Bool {
        /// The condition
        expr: ExprId,
        /// Span of the clause
        span: Span,
    },
    /// A `let pattern = init` binding condition
    Binding {
        /// Bound pattern
        pattern: PatternId,
        /// Matched expression
        init: ExprId,
        /// Span of the clause
        span: Span,
    },
}

impl Condition {
    pub fn span(&self) -> Span {
        match self {
            Self::Bool { span, .. } | Self::Binding { span, .. } => *span,
        }
    }
}

/// One `case` of a `switch` statement
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Label patterns (a case may match several)
    pub patterns: Vec<PatternId>,
    /// Guard expression after `where`, if any
    pub guard: Option<ExprId>,
    /// Body (`Stmt::Block`)
    pub body: StmtId,
    /// Span of the case including label and body
    pub span: Span,
}

/// One `catch` clause of a `do` statement
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Caught pattern; absent clauses bind nothing
    pub pattern: Option<PatternId>,
    /// Body (`Stmt::Block`)
    pub body: StmtId,
    /// Span of the clause
    pub span: Span,
}

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal
    Literal {
        /// Literal value
        kind: LiteralKind,
        /// Span of the literal
        span: Span,
    },
    /// An unqualified name reference
    Name {
        /// Referenced name
        name: Symbol,
        /// Span of the reference
        span: Span,
    },
    /// A call
    Call {
        /// Called expression
        callee: ExprId,
        /// Arguments, in source order
        args: Vec<ExprId>,
        /// Span of the call
        span: Span,
    },
    /// Member access `base.name`
    Member {
        /// Base expression
        base: ExprId,
        /// Member name
        name: Symbol,
        /// Span of the access
        span: Span,
    },
    /// A binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: ExprId,
        /// Right operand
        rhs: ExprId,
        /// Span of the operation
        span: Span,
    },
    /// A closure literal
    Closure {
        /// Capture list items, in source order
        captures: Vec<CaptureItem>,
        /// Parameters, in source order
        params: Vec<Param>,
        /// Body (`Stmt::Block`)
        body: StmtId,
        /// Span of the closure
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal { span, .. }
            | Self::Name { span, .. }
            | Self::Call { span, .. }
            | Self::Member { span, .. }
            | Self::Binary { span, .. }
            | Self::Closure { span, .. } => *span,
        }
    }
}

/// One item of a closure capture list, e.g. `x` or `y = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureItem {
    /// Captured name
    pub name: Symbol,
    /// Capture initializer, if any
    pub init: Option<ExprId>,
    /// Span of the item
    pub span: Span,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs, reason = "operator names are self-describing")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    And,
    Or,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    /// Integer literal
    Int(i64),
    /// Boolean literal
    Bool(bool),
    /// String literal
    String(String),
}

/// A pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// A name binding; the pattern node is the variable's identity
    Name {
        /// Bound name
        name: Symbol,
        /// Span of the binding site
        span: Span,
    },
    /// A tuple of sub-patterns
    Tuple {
        /// Elements, in source order
        elements: Vec<PatternId>,
        /// Span of the tuple
        span: Span,
    },
    /// `_`
    Wildcard {
        /// Span of the wildcard
        span: Span,
    },
    /// A literal pattern (binds nothing)
    Literal {
        /// Matched literal
        kind: LiteralKind,
        /// Span of the literal
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Self::Name { span, .. }
            | Self::Tuple { span, .. }
            | Self::Wildcard { span }
            | Self::Literal { span, .. } => *span,
        }
    }
}

/// The AST of one source file
#[derive(Debug)]
pub struct SourceFile {
    /// File identity
    pub file: FileId,
    /// Span of the whole file
    pub span: Span,
    /// Top-level items, in source order
    pub items: Vec<Item>,
    /// All declarations
    pub decls: Arena<Decl>,
    /// All statements
    pub stmts: Arena<Stmt>,
    /// All expressions
    pub exprs: Arena<Expr>,
    /// All patterns
    pub patterns: Arena<Pattern>,
}

impl SourceFile {
    pub fn new(file: FileId, span: Span) -> Self {
        Self {
            file,
            span,
            items: Vec::new(),
            decls: Arena::default(),
            stmts: Arena::default(),
            exprs: Arena::default(),
            patterns: Arena::default(),
        }
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.alloc(decl)
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.alloc(stmt)
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.alloc(expr)
    }

    pub fn alloc_pattern(&mut self, pattern: Pattern) -> PatternId {
        self.patterns.alloc(pattern)
    }

    /// Append a top-level item. Items must be pushed in source order.
    pub fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn decl_span(&self, id: DeclId) -> Span {
        self.decls[id].span()
    }

    pub fn stmt_span(&self, id: StmtId) -> Span {
        self.stmts[id].span()
    }

    pub fn expr_span(&self, id: ExprId) -> Span {
        self.exprs[id].span()
    }

    pub fn pattern_span(&self, id: PatternId) -> Span {
        self.patterns[id].span()
    }

    /// The block behind a `Stmt::Block` id, or `None` for malformed input.
    pub fn block(&self, id: StmtId) -> Option<&Block> {
        match &self.stmts[id] {
            Stmt::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Collect the variables a pattern binds, in source order.
    ///
    /// Wildcards and literal patterns bind nothing; a pattern without
    /// bindings simply contributes an empty list.
    pub fn bound_vars(&self, pattern: PatternId, out: &mut Vec<(Symbol, PatternId)>) {
        match &self.patterns[pattern] {
            Pattern::Name { name, .. } => out.push((*name, pattern)),
            Pattern::Tuple { elements, .. } => {
                for &element in elements {
                    self.bound_vars(element, out);
                }
            }
            Pattern::Wildcard { .. } | Pattern::Literal { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jay_intern::Interner;

    #[test]
    fn test_bound_vars_in_source_order() {
        let interner = Interner::new();
        let mut file = SourceFile::new(FileId(0), Span::new(0, 20));

        let first = file.alloc_pattern(Pattern::Name {
            name: interner.intern("a"),
            span: Span::new(1, 2),
        });
        let hole = file.alloc_pattern(Pattern::Wildcard {
            span: Span::new(4, 5),
        });
        let second = file.alloc_pattern(Pattern::Name {
            name: interner.intern("b"),
            span: Span::new(7, 8),
        });
        let tuple = file.alloc_pattern(Pattern::Tuple {
            elements: vec![first, hole, second],
            span: Span::new(0, 9),
        });

        let mut vars = Vec::new();
        file.bound_vars(tuple, &mut vars);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].1, first);
        assert_eq!(vars[1].1, second);
    }

    #[test]
    fn test_wildcard_binds_nothing() {
        let mut file = SourceFile::new(FileId(0), Span::new(0, 4));
        let hole = file.alloc_pattern(Pattern::Wildcard {
            span: Span::new(0, 1),
        });
        let mut vars = Vec::new();
        file.bound_vars(hole, &mut vars);
        assert!(vars.is_empty());
    }

    #[test]
    fn test_block_accessor_rejects_non_block() {
        let mut file = SourceFile::new(FileId(0), Span::new(0, 4));
        let stmt = file.alloc_stmt(Stmt::Break {
            span: Span::new(0, 4),
        });
        assert!(file.block(stmt).is_none());
    }
}
