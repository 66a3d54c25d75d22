//! Scope node ontology and the scope tree
//!
//! One `ScopeKind` variant exists per syntactic construct that introduces or
//! modifies a lookup scope. The tree is arena-allocated per source file;
//! parent links, redirects and guards refer to nodes by `ScopeId` and never
//! own them. Nodes are created once, never re-parented, and mutated only by
//! appending children and widening the ignored range.

use crate::error::InvariantViolation;
use crate::portion::DeclPortion;
use jay_arena::{Arena, Idx};
use jay_span::Span;
use jay_syntax::{DeclId, ExprId, SourceFile, StmtId};
use std::cell::Cell;

/// Unique identifier for a scope node
pub type ScopeId = Idx<ScopeData>;

/// The closed set of scope node variants.
///
/// Payloads are non-owning back references into the AST arenas of the file
/// the tree was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// File root; owns everything else
    SourceFile,
    /// One slice (whole / trailing where / body) of a nominal declaration
    Nominal {
        /// The struct/enum/trait declaration
        decl: DeclId,
        /// Which textual slice this node represents
        portion: DeclPortion,
    },
    /// One generic parameter; each nests inside the previous one
    GenericParams {
        /// Declaration owning the parameter list
        owner: DeclId,
        /// Index of the parameter this node introduces
        index: usize,
    },
    /// A function declaration
    Function {
        /// The function
        decl: DeclId,
    },
    /// A function's parameter list; parameters are visible in the body
    FunctionParams {
        /// The function
        decl: DeclId,
    },
    /// A function body; split from the declaration because implicit-self
    /// visibility differs
    FunctionBody {
        /// The function
        decl: DeclId,
    },
    /// A default-argument initializer
    DefaultArgument {
        /// The function
        function: DeclId,
        /// Index of the defaulted parameter
        param: usize,
    },
    /// One entry of a binding declaration; binds nothing itself
    BindingDecl {
        /// The binding declaration
        decl: DeclId,
        /// Entry index
        entry: usize,
    },
    /// The initializer of a binding entry; textually outside the names the
    /// entry introduces
    BindingInitializer {
        /// The binding declaration
        decl: DeclId,
        /// Entry index
        entry: usize,
    },
    /// The remainder of the enclosing region after a binding entry; this is
    /// where the entry's names are visible
    BindingUse {
        /// The binding declaration
        decl: DeclId,
        /// Entry index
        entry: usize,
    },
    /// A `get`/`set` accessor body, folded out of its owning binding entry
    AccessorBody {
        /// The binding declaration
        decl: DeclId,
        /// Entry index
        entry: usize,
        /// Accessor index within the entry
        accessor: usize,
    },
    /// One bound clause of an `if`/`while`/`guard` condition chain; covers
    /// from the end of its own initializer to the end of the governed region
    ConditionalClause {
        /// The conditional statement
        stmt: StmtId,
        /// Clause index
        clause: usize,
    },
    /// The continuation after a `guard`; redirects its lookup parent to the
    /// deepest clause of the guard statement
    ConditionalClauseUse {
        /// Scope of the `guard` statement the redirect targets
        guard: ScopeId,
    },
    /// An `if` statement
    If {
        /// The statement
        stmt: StmtId,
    },
    /// A `while` statement
    While {
        /// The statement
        stmt: StmtId,
    },
    /// A `guard` statement
    Guard {
        /// The statement
        stmt: StmtId,
    },
    /// A `repeat`-`while` statement
    RepeatWhile {
        /// The statement
        stmt: StmtId,
    },
    /// A `for` statement; the iterated expression lives here, outside the
    /// loop pattern's names
    For {
        /// The statement
        stmt: StmtId,
    },
    /// A `for` body; the loop pattern's names are visible here
    ForBody {
        /// The statement
        stmt: StmtId,
    },
    /// A `switch` statement
    Switch {
        /// The statement
        stmt: StmtId,
    },
    /// One `case` of a `switch`, label through body
    Case {
        /// The statement
        stmt: StmtId,
        /// Case index
        case: usize,
    },
    /// A `do`-`catch` statement
    DoCatch {
        /// The statement
        stmt: StmtId,
    },
    /// One `catch` clause
    CatchClause {
        /// The statement
        stmt: StmtId,
        /// Clause index
        index: usize,
    },
    /// A brace statement
    Block {
        /// The statement
        stmt: StmtId,
    },
    /// A closure capture list
    CaptureList {
        /// The closure expression
        closure: ExprId,
    },
    /// A closure parameter list
    ClosureParams {
        /// The closure expression
        closure: ExprId,
    },
    /// A closure body
    ClosureBody {
        /// The closure expression
        closure: ExprId,
    },
}

impl ScopeKind {
    /// Variant name for the debug dump.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SourceFile => "SourceFile",
            Self::Nominal {
                portion: DeclPortion::Whole,
                ..
            } => "NominalWhole",
            Self::Nominal {
                portion: DeclPortion::TrailingWhere,
                ..
            } => "NominalTrailingWhere",
            Self::Nominal {
                portion: DeclPortion::Body,
                ..
            } => "NominalBody",
            Self::GenericParams { .. } => "GenericParams",
            Self::Function { .. } => "Function",
            Self::FunctionParams { .. } => "FunctionParams",
            Self::FunctionBody { .. } => "FunctionBody",
            Self::DefaultArgument { .. } => "DefaultArgument",
            Self::BindingDecl { .. } => "BindingDecl",
            Self::BindingInitializer { .. } => "BindingInitializer",
            Self::BindingUse { .. } => "BindingUse",
            Self::AccessorBody { .. } => "AccessorBody",
            Self::ConditionalClause { .. } => "ConditionalClause",
            Self::ConditionalClauseUse { .. } => "ConditionalClauseUse",
            Self::If { .. } => "If",
            Self::While { .. } => "While",
            Self::Guard { .. } => "Guard",
            Self::RepeatWhile { .. } => "RepeatWhile",
            Self::For { .. } => "For",
            Self::ForBody { .. } => "ForBody",
            Self::Switch { .. } => "Switch",
            Self::Case { .. } => "Case",
            Self::DoCatch { .. } => "DoCatch",
            Self::CatchClause { .. } => "CatchClause",
            Self::Block { .. } => "Block",
            Self::CaptureList { .. } => "CaptureList",
            Self::ClosureParams { .. } => "ClosureParams",
            Self::ClosureBody { .. } => "ClosureBody",
        }
    }
}

/// Expansion progress of a single node.
///
/// Expansion is checked and set before any child is created, so re-entry is
/// detected instead of duplicating children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    /// Children not yet materialized
    Unexpanded,
    /// Expansion in progress; re-entry is an invariant violation
    Expanding,
    /// Children materialized; further `expand` calls are no-ops
    Expanded,
}

/// One node of the scope tree
#[derive(Debug)]
pub struct ScopeData {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    children: Vec<ScopeId>,
    /// Range covered ignoring children, fixed at creation
    childless: Span,
    /// Positions that belong to this node but form no child scope
    ignored: Option<Span>,
    /// Memoized resolved range; cleared on every mutation
    cached_range: Cell<Option<Span>>,
    expansion: ExpansionState,
}

impl ScopeData {
    fn new(parent: Option<ScopeId>, kind: ScopeKind, childless: Span) -> Self {
        Self {
            parent,
            kind,
            children: Vec::new(),
            childless,
            ignored: None,
            cached_range: Cell::new(None),
            expansion: ExpansionState::Unexpanded,
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Children in source order.
    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    /// The range this node covers ignoring its children.
    pub fn childless_range(&self) -> Span {
        self.childless
    }

    pub fn expansion(&self) -> ExpansionState {
        self.expansion
    }

    /// Resolved range: the childless range widened by the ignored range.
    /// Children are contained in it by invariant.
    pub fn range(&self) -> Span {
        if let Some(range) = self.cached_range.get() {
            return range;
        }
        let range = match self.ignored {
            Some(ignored) => self.childless.cover(ignored),
            None => self.childless,
        };
        self.cached_range.set(Some(range));
        range
    }
}

/// The lexical scope tree of one source file.
///
/// All nodes live in one arena and die together; the tree owns its nodes
/// top-down and this struct is the only mutation surface, so the structural
/// invariants are re-validated on every mutation:
///
/// 1. a child's range is a subset of its parent's range
/// 2. children are ordered by range start and pairwise non-overlapping
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Arena<ScopeData>,
    root: ScopeId,
}

impl ScopeTree {
    /// Create a tree containing only the file root scope.
    pub fn new(file: &SourceFile) -> Self {
        let mut scopes = Arena::new();
        let root = scopes.alloc(ScopeData::new(None, ScopeKind::SourceFile, file.span));
        Self { scopes, root }
    }

    /// The file root scope.
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// All nodes, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &ScopeData)> {
        self.scopes.iter()
    }

    /// Resolved range of a node.
    pub fn range(&self, scope: ScopeId) -> Span {
        self.scopes[scope].range()
    }

    /// Append a new child scope covering `childless`, validating the
    /// containment and ordering invariants against its siblings.
    pub(crate) fn new_child(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        childless: Span,
    ) -> ScopeId {
        enforce(self.check_new_child(parent, childless));
        let child = self
            .scopes
            .alloc(ScopeData::new(Some(parent), kind, childless));
        let parent_data = &mut self.scopes[parent];
        parent_data.children.push(child);
        parent_data.cached_range.set(None);
        child
    }

    /// Like [`Self::new_child`], for scopes whose children are materialized
    /// by their owner's expansion rather than their own.
    pub(crate) fn new_child_expanded(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        childless: Span,
    ) -> ScopeId {
        let child = self.new_child(parent, kind, childless);
        self.scopes[child].expansion = ExpansionState::Expanded;
        child
    }

    /// Absorb a span of positions that belong to `scope` but form no child
    /// scope, keeping "every position is inside some range" true.
    pub(crate) fn widen_ignored(&mut self, scope: ScopeId, span: Span) {
        let data = &mut self.scopes[scope];
        data.ignored = Some(match data.ignored {
            Some(ignored) => ignored.cover(span),
            None => span,
        });
        data.cached_range.set(None);
    }

    fn check_new_child(&self, parent: ScopeId, childless: Span) -> Result<(), InvariantViolation> {
        let parent_data = &self.scopes[parent];
        let parent_range = parent_data.range();
        if !parent_range.contains(childless) {
            return Err(InvariantViolation::ChildEscapesParent {
                parent: parent_range,
                child: childless,
            });
        }
        if let Some(&last) = parent_data.children.last() {
            let last_range = self.scopes[last].range();
            if !last_range.precedes(childless) {
                return Err(InvariantViolation::ChildrenOutOfOrder {
                    first: last_range,
                    second: childless,
                });
            }
        }
        Ok(())
    }

    /// Begin expanding `scope`. Returns `false` when the node is already
    /// expanded (or is being expanded, which is a violation reported in
    /// debug builds), so expansion stays idempotent.
    pub(crate) fn begin_expansion(&mut self, scope: ScopeId) -> bool {
        match self.scopes[scope].expansion {
            ExpansionState::Unexpanded => {
                self.scopes[scope].expansion = ExpansionState::Expanding;
                true
            }
            ExpansionState::Expanding => {
                enforce(Err(InvariantViolation::ReentrantExpansion));
                false
            }
            ExpansionState::Expanded => false,
        }
    }

    pub(crate) fn finish_expansion(&mut self, scope: ScopeId) {
        self.scopes[scope].expansion = ExpansionState::Expanded;
    }

    /// Validate the whole tree. Used by tests; the incremental checks in
    /// [`Self::new_child`] keep this true during construction.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (scope, data) in self.scopes.iter() {
            let range = data.range();
            let mut previous: Option<Span> = None;
            for &child in &data.children {
                let child_data = &self.scopes[child];
                if child_data.parent != Some(scope) {
                    return Err(InvariantViolation::BrokenParentLink);
                }
                let child_range = child_data.range();
                if !range.contains(child_range) {
                    return Err(InvariantViolation::ChildEscapesParent {
                        parent: range,
                        child: child_range,
                    });
                }
                if let Some(first) = previous {
                    if !first.precedes(child_range) {
                        return Err(InvariantViolation::ChildrenOutOfOrder {
                            first,
                            second: child_range,
                        });
                    }
                }
                previous = Some(child_range);
            }
        }
        Ok(())
    }
}

impl std::ops::Index<ScopeId> for ScopeTree {
    type Output = ScopeData;

    fn index(&self, scope: ScopeId) -> &ScopeData {
        &self.scopes[scope]
    }
}

/// Abort on a structural violation in debug builds; release builds skip the
/// cost and trust the builder.
fn enforce(check: Result<(), InvariantViolation>) {
    if cfg!(debug_assertions) {
        if let Err(violation) = check {
            panic!("scope tree invariant violated: {violation}");
        }
    }
}
