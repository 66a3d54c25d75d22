//! Unqualified name lookup over the scope tree
//!
//! Lookup locates the innermost scope containing a source position, then
//! walks outward through (possibly redirected) lookup parents. At each node
//! it reports the node's own bindings, performs guarded self-type member
//! lookup at nominal portions, and honors the first lookup limit
//! encountered. Declarations are streamed to the caller's consumer in
//! shadowing order, innermost first; the engine never deduplicates across
//! scopes, because different callers want different shadowing policies.
//!
//! Missing pieces of walk state default to the permissive side: no limit
//! keeps searching, an absent self context only downgrades the visibility
//! reason, and an unresolved cascading use finalizes to cascading.
//! Under-searching silently breaks resolution; over-searching only risks
//! spurious, filterable candidates.

use crate::builder::ScopeBuilder;
use crate::node::{ScopeId, ScopeKind, ScopeTree};
use crate::portion::DeclPortion;
use jay_intern::Symbol;
use jay_syntax::{
    CaptureItem, Condition, Decl, DeclId, Expr, ExprId, Item, Param, PatternId, SourceFile, Stmt,
    StmtId,
};
use rustc_hash::FxHashSet;

/// Whether a name reference affects recompilation beyond its own context.
///
/// Code inside closures, local functions and default-argument initializers
/// is re-checked independently of its lexical context, so references there
/// resolve to non-cascading; anything still unknown when the walk finishes
/// is treated as cascading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadingUse {
    /// Not yet determined
    Unknown,
    /// The reference affects the surrounding recompilation unit
    Cascading,
    /// The reference is private to its context
    NonCascading,
}

/// Why a found declaration is visible at the lookup position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityReason {
    /// A local binding: pattern variable, capture, or local declaration
    LocalVariable,
    /// A function or closure parameter
    FunctionParameter,
    /// A generic parameter
    GenericParameter,
    /// A member of the type whose implicit self applies at the position
    MemberOfCurrentType,
    /// A member of a lexically enclosing type
    MemberOfEnclosingType,
    /// A top-level declaration of the file
    TopLevel,
}

/// A non-owning reference to a found declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRef {
    /// A named declaration (function, nominal type)
    Decl(DeclId),
    /// A pattern-bound variable, identified by its name pattern
    Var(PatternId),
    /// A function parameter
    Param {
        /// The function
        function: DeclId,
        /// Parameter index
        index: usize,
    },
    /// A closure parameter
    ClosureParam {
        /// The closure expression
        closure: ExprId,
        /// Parameter index
        index: usize,
    },
    /// A generic parameter
    GenericParam {
        /// The declaration owning the parameter list
        owner: DeclId,
        /// Parameter index
        index: usize,
    },
    /// A closure capture item
    Capture {
        /// The closure expression
        closure: ExprId,
        /// Capture index
        index: usize,
    },
}

/// One declaration reported by lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundDecl {
    /// What was found
    pub decl: DeclRef,
    /// Why it is visible
    pub reason: VisibilityReason,
}

/// Receives declarations as lookup finds them, innermost scope first.
pub trait DeclConsumer {
    /// Accept one declaration. Return `true` to stop the walk.
    fn found(&mut self, found: FoundDecl) -> bool;
}

/// Collects every visible declaration; never stops the walk.
#[derive(Debug, Default)]
pub struct CollectAll {
    /// Everything reported, in shadowing order
    pub decls: Vec<FoundDecl>,
}

impl DeclConsumer for CollectAll {
    fn found(&mut self, found: FoundDecl) -> bool {
        self.decls.push(found);
        false
    }
}

/// Keeps only the innermost match and stops the walk.
#[derive(Debug, Default)]
pub struct FirstMatch {
    /// The innermost reported declaration, if any
    pub decl: Option<FoundDecl>,
}

impl DeclConsumer for FirstMatch {
    fn found(&mut self, found: FoundDecl) -> bool {
        self.decl = Some(found);
        true
    }
}

/// State carried along the outward walk.
struct WalkState {
    /// The nominal whose implicit self applies at the position, once known
    self_context: Option<DeclId>,
    /// Nominals whose members were already scanned, so a body scope nested
    /// in its declaration scope does not re-scan the same self type
    searched: FxHashSet<DeclId>,
    cascading: CascadingUse,
    /// The scope after which the walk must stop, once one is found
    limit: Option<ScopeId>,
}

impl ScopeTree {
    /// The sole lookup entry point.
    ///
    /// Finds the innermost scope containing `loc` (descending from `start`,
    /// or the file root), then walks outward reporting every declaration
    /// named `name` to `consumer`, expanding unrealized scopes on demand.
    /// Returns whether the reference should be treated as cascading.
    pub fn unqualified_lookup(
        &mut self,
        file: &SourceFile,
        name: Symbol,
        loc: u32,
        start: Option<ScopeId>,
        hint: CascadingUse,
        consumer: &mut dyn DeclConsumer,
    ) -> CascadingUse {
        let start = start.unwrap_or_else(|| self.root());
        let innermost = self.innermost_at(file, start, loc);
        self.walk_outward(file, name, innermost, hint, consumer)
    }

    /// Descend by containment to the innermost scope containing `loc`.
    ///
    /// Children are ordered and non-overlapping, so at most one child
    /// contains the position and the result is unambiguous.
    pub fn innermost_at(&mut self, file: &SourceFile, from: ScopeId, loc: u32) -> ScopeId {
        let mut current = from;
        loop {
            ScopeBuilder::new(self, file).expand(current);
            let next = self[current]
                .children()
                .iter()
                .copied()
                .find(|&child| self.range(child).contains_offset(loc));
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    fn walk_outward(
        &mut self,
        file: &SourceFile,
        name: Symbol,
        start: ScopeId,
        hint: CascadingUse,
        consumer: &mut dyn DeclConsumer,
    ) -> CascadingUse {
        let mut state = WalkState {
            self_context: None,
            searched: FxHashSet::default(),
            cascading: hint,
            limit: None,
        };
        let mut current = start;
        loop {
            if self.scope_bindings(file, current, name, consumer) {
                break;
            }
            if let ScopeKind::Nominal { decl, portion } = self[current].kind() {
                if portion.contributes_members()
                    && self.self_type_lookup(file, decl, name, &mut state, consumer)
                {
                    break;
                }
            }
            if matches!(self[current].kind(), ScopeKind::SourceFile) {
                self.top_level_stage(file, name, consumer);
                break;
            }
            if state.limit.is_none() {
                state.limit = self.lookup_limit(file, current);
            }
            if state.limit == Some(current) {
                break;
            }
            state.self_context = self.self_context_for_parent(current, state.self_context);
            state.cascading = self.resolve_cascading_use(current, state.cascading);
            current = self.lookup_parent(file, current);
        }
        match state.cascading {
            CascadingUse::Unknown => CascadingUse::Cascading,
            resolved => resolved,
        }
    }

    /// Report the names bound directly by `scope` itself, not inherited
    /// from ancestors. Most variants bind nothing.
    fn scope_bindings(
        &self,
        file: &SourceFile,
        scope: ScopeId,
        name: Symbol,
        consumer: &mut dyn DeclConsumer,
    ) -> bool {
        match self[scope].kind() {
            ScopeKind::GenericParams { owner, index } => {
                match file.decls[owner].generics().get(index) {
                    Some(param) if param.name == name => consumer.found(FoundDecl {
                        decl: DeclRef::GenericParam { owner, index },
                        reason: VisibilityReason::GenericParameter,
                    }),
                    _ => false,
                }
            }
            ScopeKind::FunctionParams { decl } => {
                let Some(function) = file.decls[decl].as_function() else {
                    return false;
                };
                for (index, param) in function.params.iter().enumerate() {
                    if param.name == name
                        && consumer.found(FoundDecl {
                            decl: DeclRef::Param {
                                function: decl,
                                index,
                            },
                            reason: VisibilityReason::FunctionParameter,
                        })
                    {
                        return true;
                    }
                }
                false
            }
            ScopeKind::ClosureParams { closure } => {
                let Some(params) = closure_params(file, closure) else {
                    return false;
                };
                for (index, param) in params.iter().enumerate() {
                    if param.name == name
                        && consumer.found(FoundDecl {
                            decl: DeclRef::ClosureParam { closure, index },
                            reason: VisibilityReason::FunctionParameter,
                        })
                    {
                        return true;
                    }
                }
                false
            }
            ScopeKind::CaptureList { closure } => {
                let Some(captures) = closure_captures(file, closure) else {
                    return false;
                };
                for (index, capture) in captures.iter().enumerate() {
                    if capture.name == name
                        && consumer.found(FoundDecl {
                            decl: DeclRef::Capture { closure, index },
                            reason: VisibilityReason::LocalVariable,
                        })
                    {
                        return true;
                    }
                }
                false
            }
            ScopeKind::BindingUse { decl, entry } => {
                let pattern = file.decls[decl]
                    .as_binding()
                    .and_then(|binding| binding.entries.get(entry))
                    .map(|entry| entry.pattern);
                self.pattern_bindings(file, pattern, name, consumer)
            }
            ScopeKind::ConditionalClause { stmt, clause } => {
                let pattern = match condition_list(file, stmt).and_then(|list| list.get(clause)) {
                    Some(Condition::Binding { pattern, .. }) => Some(*pattern),
                    _ => None,
                };
                self.pattern_bindings(file, pattern, name, consumer)
            }
            ScopeKind::ForBody { stmt } => {
                let (pattern, body) = match &file.stmts[stmt] {
                    Stmt::For { pattern, body, .. } => (Some(*pattern), Some(*body)),
                    _ => (None, None),
                };
                self.pattern_bindings(file, pattern, name, consumer)
                    || self.block_decls(file, body, name, consumer)
            }
            ScopeKind::Case { stmt, case } => {
                // Labels of one case bind a single canonical set; the first
                // pattern's variables stand for all of them.
                let pattern = match &file.stmts[stmt] {
                    Stmt::Switch { cases, .. } => cases
                        .get(case)
                        .and_then(|case| case.patterns.first().copied()),
                    _ => None,
                };
                self.pattern_bindings(file, pattern, name, consumer)
            }
            ScopeKind::CatchClause { stmt, index } => {
                let pattern = match &file.stmts[stmt] {
                    Stmt::Do { catches, .. } => {
                        catches.get(index).and_then(|catch| catch.pattern)
                    }
                    _ => None,
                };
                self.pattern_bindings(file, pattern, name, consumer)
            }
            ScopeKind::Block { stmt } => self.block_decls(file, Some(stmt), name, consumer),
            ScopeKind::FunctionBody { decl } => {
                let body = file.decls[decl].as_function().and_then(|f| f.body);
                self.block_decls(file, body, name, consumer)
            }
            ScopeKind::ClosureBody { closure } => {
                let body = closure_body(file, closure);
                self.block_decls(file, body, name, consumer)
            }
            ScopeKind::AccessorBody {
                decl,
                entry,
                accessor,
            } => {
                let body = file.decls[decl]
                    .as_binding()
                    .and_then(|binding| binding.entries.get(entry))
                    .and_then(|entry| entry.accessors.get(accessor))
                    .map(|accessor| accessor.body);
                self.block_decls(file, body, name, consumer)
            }
            _ => false,
        }
    }

    /// Report the matching variables a pattern binds. A missing or
    /// binding-less pattern contributes nothing.
    fn pattern_bindings(
        &self,
        file: &SourceFile,
        pattern: Option<PatternId>,
        name: Symbol,
        consumer: &mut dyn DeclConsumer,
    ) -> bool {
        let Some(pattern) = pattern else {
            return false;
        };
        report_pattern_vars(file, pattern, name, VisibilityReason::LocalVariable, consumer)
    }

    /// Report matching function and type declarations directly contained in
    /// a block: unlike `let` entries, those are visible in the whole block.
    fn block_decls(
        &self,
        file: &SourceFile,
        block_stmt: Option<StmtId>,
        name: Symbol,
        consumer: &mut dyn DeclConsumer,
    ) -> bool {
        let Some(block) = block_stmt.and_then(|stmt| file.block(stmt)) else {
            return false;
        };
        for item in &block.items {
            if let Item::Decl(decl) = *item {
                if file.decls[decl].name() == Some(name)
                    && consumer.found(FoundDecl {
                        decl: DeclRef::Decl(decl),
                        reason: VisibilityReason::LocalVariable,
                    })
                {
                    return true;
                }
            }
        }
        false
    }

    /// Scan the members of a nominal declaration, guarded so the same type
    /// is scanned at most once per walk even though several of its portion
    /// scopes lie on the ancestor chain.
    fn self_type_lookup(
        &self,
        file: &SourceFile,
        decl: DeclId,
        name: Symbol,
        state: &mut WalkState,
        consumer: &mut dyn DeclConsumer,
    ) -> bool {
        if !state.searched.insert(decl) {
            return false;
        }
        let Some(nominal) = file.decls[decl].as_nominal() else {
            return false;
        };
        let reason = if state.self_context == Some(decl) {
            VisibilityReason::MemberOfCurrentType
        } else {
            VisibilityReason::MemberOfEnclosingType
        };
        for &member in &nominal.members {
            match &file.decls[member] {
                Decl::Binding(binding) => {
                    for entry in &binding.entries {
                        if report_pattern_vars(file, entry.pattern, name, reason, consumer) {
                            return true;
                        }
                    }
                }
                other => {
                    if other.name() == Some(name)
                        && consumer.found(FoundDecl {
                            decl: DeclRef::Decl(member),
                            reason,
                        })
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// The self context the parent should see when the walk leaves `scope`:
    /// method and accessor bodies substitute their innermost enclosing
    /// nominal, member-binding initializers clear it, everything else
    /// passes the input through.
    fn self_context_for_parent(&self, scope: ScopeId, input: Option<DeclId>) -> Option<DeclId> {
        match self[scope].kind() {
            ScopeKind::FunctionBody { .. } | ScopeKind::AccessorBody { .. } => {
                self.enclosing_nominal(scope)
            }
            ScopeKind::BindingInitializer { .. } if self.is_member_initializer(scope) => None,
            _ => input,
        }
    }

    /// Resolve an unknown cascading use at the few variants whose interior
    /// is re-checked independently of its lexical context.
    fn resolve_cascading_use(&self, scope: ScopeId, input: CascadingUse) -> CascadingUse {
        if input != CascadingUse::Unknown {
            return input;
        }
        match self[scope].kind() {
            ScopeKind::ClosureBody { .. } | ScopeKind::DefaultArgument { .. } => {
                CascadingUse::NonCascading
            }
            ScopeKind::FunctionBody { .. } if self.is_local_function_body(scope) => {
                CascadingUse::NonCascading
            }
            _ => input,
        }
    }

    fn lookup_limit(&self, file: &SourceFile, scope: ScopeId) -> Option<ScopeId> {
        match self[scope].kind() {
            ScopeKind::Nominal { decl, portion } => portion.lookup_limit(self, scope, file, decl),
            _ => None,
        }
    }

    /// The scope the walk continues into: normally the structural parent.
    /// The guard continuation redirects to the deepest clause of its guard,
    /// expanding it on demand; a guard without bound clauses falls back to
    /// the structural parent.
    fn lookup_parent(&mut self, file: &SourceFile, scope: ScopeId) -> ScopeId {
        let redirect = match self[scope].kind() {
            ScopeKind::ConditionalClauseUse { guard } => {
                ScopeBuilder::new(self, file).deepest_clause(guard)
            }
            _ => None,
        };
        redirect
            .or_else(|| self[scope].parent())
            .unwrap_or_else(|| self.root())
    }

    /// The file-root stage: top-level functions and nominals. Top-level
    /// binding variables are not re-reported here; their ordered visibility
    /// is already modeled by use scopes.
    fn top_level_stage(&self, file: &SourceFile, name: Symbol, consumer: &mut dyn DeclConsumer) {
        for item in &file.items {
            if let Item::Decl(decl) = *item {
                if matches!(file.decls[decl], Decl::Binding(_)) {
                    continue;
                }
                if file.decls[decl].name() == Some(name)
                    && consumer.found(FoundDecl {
                        decl: DeclRef::Decl(decl),
                        reason: VisibilityReason::TopLevel,
                    })
                {
                    return;
                }
            }
        }
    }

    /// The innermost nominal body enclosing `scope`, if any.
    fn enclosing_nominal(&self, scope: ScopeId) -> Option<DeclId> {
        let mut current = self[scope].parent();
        while let Some(ancestor) = current {
            if let ScopeKind::Nominal {
                decl,
                portion: DeclPortion::Body,
            } = self[ancestor].kind()
            {
                return Some(decl);
            }
            current = self[ancestor].parent();
        }
        None
    }

    /// Whether an initializer scope initializes a type member.
    fn is_member_initializer(&self, scope: ScopeId) -> bool {
        let Some(parent) = self[scope].parent() else {
            return false;
        };
        matches!(self[parent].kind(), ScopeKind::BindingDecl { .. })
            && self[parent].parent().is_some_and(|grandparent| {
                matches!(
                    self[grandparent].kind(),
                    ScopeKind::Nominal {
                        portion: DeclPortion::Body,
                        ..
                    }
                )
            })
    }

    /// Whether a function body scope belongs to a local function: one
    /// declared inside another body rather than at the top level or as a
    /// type member. Use-scope wrappers are transparent here.
    fn is_local_function_body(&self, scope: ScopeId) -> bool {
        let mut function = None;
        let mut current = self[scope].parent();
        while let Some(ancestor) = current {
            if matches!(self[ancestor].kind(), ScopeKind::Function { .. }) {
                function = Some(ancestor);
                break;
            }
            current = self[ancestor].parent();
        }
        let Some(function) = function else {
            return false;
        };
        let mut parent = self[function].parent();
        while let Some(ancestor) = parent {
            match self[ancestor].kind() {
                ScopeKind::BindingUse { .. } | ScopeKind::ConditionalClauseUse { .. } => {
                    parent = self[ancestor].parent();
                }
                ScopeKind::SourceFile | ScopeKind::Nominal { .. } => return false,
                _ => return true,
            }
        }
        false
    }
}

/// Report the matching variables bound by `pattern` with the given reason.
fn report_pattern_vars(
    file: &SourceFile,
    pattern: PatternId,
    name: Symbol,
    reason: VisibilityReason,
    consumer: &mut dyn DeclConsumer,
) -> bool {
    let mut vars = Vec::new();
    file.bound_vars(pattern, &mut vars);
    for (var_name, var) in vars {
        if var_name == name
            && consumer.found(FoundDecl {
                decl: DeclRef::Var(var),
                reason,
            })
        {
            return true;
        }
    }
    false
}

fn closure_params(file: &SourceFile, closure: ExprId) -> Option<&[Param]> {
    match &file.exprs[closure] {
        Expr::Closure { params, .. } => Some(params),
        _ => None,
    }
}

fn closure_captures(file: &SourceFile, closure: ExprId) -> Option<&[CaptureItem]> {
    match &file.exprs[closure] {
        Expr::Closure { captures, .. } => Some(captures),
        _ => None,
    }
}

fn closure_body(file: &SourceFile, closure: ExprId) -> Option<StmtId> {
    match &file.exprs[closure] {
        Expr::Closure { body, .. } => Some(*body),
        _ => None,
    }
}

fn condition_list(file: &SourceFile, stmt: StmtId) -> Option<&[Condition]> {
    match &file.stmts[stmt] {
        Stmt::If { conditions, .. }
        | Stmt::While { conditions, .. }
        | Stmt::Guard { conditions, .. } => Some(conditions),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jay_intern::Interner;
    use jay_span::{FileId, Span};
    use jay_syntax::{
        BindingDecl, BindingEntry, BinaryOp, Block, FunctionDecl, LiteralKind, Pattern,
    };

    fn name_pattern(
        file: &mut SourceFile,
        interner: &Interner,
        name: &str,
        lo: u32,
        hi: u32,
    ) -> PatternId {
        file.alloc_pattern(Pattern::Name {
            name: interner.intern(name),
            span: Span::new(lo, hi),
        })
    }

    fn name_expr(file: &mut SourceFile, interner: &Interner, name: &str, lo: u32, hi: u32) -> ExprId {
        file.alloc_expr(Expr::Name {
            name: interner.intern(name),
            span: Span::new(lo, hi),
        })
    }

    fn let_item(
        file: &mut SourceFile,
        pattern: PatternId,
        init: ExprId,
        lo: u32,
        hi: u32,
    ) -> Item {
        let binding = file.alloc_decl(Decl::Binding(BindingDecl {
            mutable: false,
            entries: vec![BindingEntry {
                pattern,
                init: Some(init),
                accessors: Vec::new(),
                span: Span::new(lo, hi),
            }],
            span: Span::new(lo, hi),
        }));
        Item::Decl(binding)
    }

    fn collect(
        tree: &mut ScopeTree,
        file: &SourceFile,
        interner: &Interner,
        name: &str,
        loc: u32,
    ) -> Vec<FoundDecl> {
        let mut consumer = CollectAll::default();
        tree.unqualified_lookup(
            file,
            interner.intern(name),
            loc,
            None,
            CascadingUse::Unknown,
            &mut consumer,
        );
        consumer.decls
    }

    /// `let a = 1; let b = a; let c = a + b`
    fn three_bindings(interner: &Interner) -> (SourceFile, PatternId, PatternId) {
        let mut file = SourceFile::new(FileId(0), Span::new(0, 36));

        let pattern_a = name_pattern(&mut file, interner, "a", 4, 5);
        let one = file.alloc_expr(Expr::Literal {
            kind: LiteralKind::Int(1),
            span: Span::new(8, 9),
        });
        let first = let_item(&mut file, pattern_a, one, 0, 9);
        file.push_item(first);

        let pattern_b = name_pattern(&mut file, interner, "b", 15, 16);
        let a_ref = name_expr(&mut file, interner, "a", 19, 20);
        let second = let_item(&mut file, pattern_b, a_ref, 11, 21);
        file.push_item(second);

        let pattern_c = name_pattern(&mut file, interner, "c", 27, 28);
        let a_again = name_expr(&mut file, interner, "a", 31, 32);
        let b_ref = name_expr(&mut file, interner, "b", 35, 36);
        let sum = file.alloc_expr(Expr::Binary {
            op: BinaryOp::Add,
            lhs: a_again,
            rhs: b_ref,
            span: Span::new(31, 36),
        });
        let third = let_item(&mut file, pattern_c, sum, 23, 36);
        file.push_item(third);

        (file, pattern_a, pattern_b)
    }

    #[test]
    fn test_chained_bindings_resolve_to_first_declaration() {
        let interner = Interner::new();
        let (file, pattern_a, _) = three_bindings(&interner);
        let mut tree = ScopeTree::new(&file);

        // `a` inside `c`'s initializer: exactly the first declaration.
        let found = collect(&mut tree, &file, &interner, "a", 31);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].decl, DeclRef::Var(pattern_a));
        assert_eq!(found[0].reason, VisibilityReason::LocalVariable);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_initializer_does_not_see_its_own_binding() {
        let interner = Interner::new();
        let (file, pattern_a, _) = three_bindings(&interner);
        let mut tree = ScopeTree::new(&file);

        // Inside `b`'s initializer, `b` is not yet bound but `a` is.
        assert!(collect(&mut tree, &file, &interner, "b", 19).is_empty());
        let found = collect(&mut tree, &file, &interner, "a", 19);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].decl, DeclRef::Var(pattern_a));
    }

    #[test]
    fn test_later_binding_visible_after_its_entry() {
        let interner = Interner::new();
        let (file, _, pattern_b) = three_bindings(&interner);
        let mut tree = ScopeTree::new(&file);

        let found = collect(&mut tree, &file, &interner, "b", 35);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].decl, DeclRef::Var(pattern_b));
    }

    /// `fn f(x) { let x = 1  g(x) }`
    fn shadowing_file(interner: &Interner) -> (SourceFile, DeclId, PatternId) {
        let mut file = SourceFile::new(FileId(0), Span::new(0, 30));

        let local_x = name_pattern(&mut file, interner, "x", 14, 15);
        let one = file.alloc_expr(Expr::Literal {
            kind: LiteralKind::Int(1),
            span: Span::new(18, 19),
        });
        let local_let = let_item(&mut file, local_x, one, 10, 19);

        let x_ref = name_expr(&mut file, interner, "x", 23, 24);
        let callee = name_expr(&mut file, interner, "g", 21, 22);
        let call = file.alloc_expr(Expr::Call {
            callee,
            args: vec![x_ref],
            span: Span::new(21, 25),
        });
        let call_stmt = file.alloc_stmt(Stmt::Expr {
            expr: call,
            span: Span::new(21, 25),
        });

        let body = file.alloc_stmt(Stmt::Block(Block {
            items: vec![local_let, Item::Stmt(call_stmt)],
            span: Span::new(8, 30),
        }));
        let function = file.alloc_decl(Decl::Function(FunctionDecl {
            name: interner.intern("f"),
            generics: Vec::new(),
            params: vec![Param {
                name: interner.intern("x"),
                ty: None,
                default: None,
                span: Span::new(5, 6),
            }],
            param_span: Span::new(4, 7),
            where_clause: None,
            return_type: None,
            body: Some(body),
            span: Span::new(0, 30),
        }));
        file.push_item(Item::Decl(function));

        (file, function, local_x)
    }

    #[test]
    fn test_inner_binding_reported_before_outer() {
        let interner = Interner::new();
        let (file, function, local_x) = shadowing_file(&interner);
        let mut tree = ScopeTree::new(&file);

        let found = collect(&mut tree, &file, &interner, "x", 23);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].decl, DeclRef::Var(local_x));
        assert_eq!(found[0].reason, VisibilityReason::LocalVariable);
        assert_eq!(
            found[1].decl,
            DeclRef::Param { function, index: 0 }
        );
        assert_eq!(found[1].reason, VisibilityReason::FunctionParameter);
    }

    #[test]
    fn test_first_match_consumer_stops_at_innermost() {
        let interner = Interner::new();
        let (file, _, local_x) = shadowing_file(&interner);
        let mut tree = ScopeTree::new(&file);

        let mut consumer = FirstMatch::default();
        tree.unqualified_lookup(
            &file,
            interner.intern("x"),
            23,
            None,
            CascadingUse::Unknown,
            &mut consumer,
        );
        assert_eq!(consumer.decl.map(|found| found.decl), Some(DeclRef::Var(local_x)));
    }

    #[test]
    fn test_function_body_reference_is_cascading_by_default() {
        let interner = Interner::new();
        let (file, _, _) = shadowing_file(&interner);
        let mut tree = ScopeTree::new(&file);

        let mut consumer = CollectAll::default();
        let cascading = tree.unqualified_lookup(
            &file,
            interner.intern("x"),
            23,
            None,
            CascadingUse::Unknown,
            &mut consumer,
        );
        assert_eq!(cascading, CascadingUse::Cascading);
    }

    #[test]
    fn test_cascading_hint_passes_through() {
        let interner = Interner::new();
        let (file, _, _) = shadowing_file(&interner);
        let mut tree = ScopeTree::new(&file);

        let mut consumer = CollectAll::default();
        let cascading = tree.unqualified_lookup(
            &file,
            interner.intern("x"),
            23,
            None,
            CascadingUse::NonCascading,
            &mut consumer,
        );
        assert_eq!(cascading, CascadingUse::NonCascading);
    }

    /// `let h = { (y) in g(y) }`
    #[test]
    fn test_closure_interior_resolves_non_cascading() {
        let interner = Interner::new();
        let mut file = SourceFile::new(FileId(0), Span::new(0, 30));

        let pattern_h = name_pattern(&mut file, &interner, "h", 4, 5);
        let y_ref = name_expr(&mut file, &interner, "y", 19, 20);
        let callee = name_expr(&mut file, &interner, "g", 17, 18);
        let call = file.alloc_expr(Expr::Call {
            callee,
            args: vec![y_ref],
            span: Span::new(17, 21),
        });
        let call_stmt = file.alloc_stmt(Stmt::Expr {
            expr: call,
            span: Span::new(17, 21),
        });
        let body = file.alloc_stmt(Stmt::Block(Block {
            items: vec![Item::Stmt(call_stmt)],
            span: Span::new(15, 24),
        }));
        let closure = file.alloc_expr(Expr::Closure {
            captures: Vec::new(),
            params: vec![Param {
                name: interner.intern("y"),
                ty: None,
                default: None,
                span: Span::new(10, 11),
            }],
            body,
            span: Span::new(8, 26),
        });
        let binding = let_item(&mut file, pattern_h, closure, 0, 26);
        file.push_item(binding);

        let mut tree = ScopeTree::new(&file);
        let mut consumer = CollectAll::default();
        let cascading = tree.unqualified_lookup(
            &file,
            interner.intern("y"),
            19,
            None,
            CascadingUse::Unknown,
            &mut consumer,
        );
        assert_eq!(cascading, CascadingUse::NonCascading);
        assert_eq!(consumer.decls.len(), 1);
        assert_eq!(
            consumer.decls[0].decl,
            DeclRef::ClosureParam { closure, index: 0 }
        );
    }
}
