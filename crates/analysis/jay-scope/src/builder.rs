//! Demand-driven construction of the scope tree
//!
//! A node's children are not materialized until something needs to descend
//! into it: the first lookup that reaches the node, or a whole-tree dump.
//! Expansion is monotonic (children are never removed or reordered) and
//! idempotent; the containment and ordering invariants are re-validated for
//! every appended child.
//!
//! A few scopes are materialized by their owner's expansion instead of their
//! own, because they interleave with their siblings: the binding-use chain a
//! block grows around its `let` entries, and the condition-clause chain of an
//! `if`/`while`/`guard`. Those are created already expanded.

use crate::node::{ScopeId, ScopeKind, ScopeTree};
use crate::portion::DeclPortion;
use jay_span::Span;
use jay_syntax::{Condition, Decl, DeclId, Expr, ExprId, GenericParam, Item, SourceFile, Stmt,
    StmtId, walk};

/// Expands scope nodes from the AST they mirror.
pub struct ScopeBuilder<'t, 'a> {
    tree: &'t mut ScopeTree,
    file: &'a SourceFile,
}

impl<'t, 'a> ScopeBuilder<'t, 'a> {
    pub fn new(tree: &'t mut ScopeTree, file: &'a SourceFile) -> Self {
        Self { tree, file }
    }

    /// Materialize the children of `scope`. Safe to call repeatedly; already
    /// expanded nodes are left untouched.
    pub fn expand(&mut self, scope: ScopeId) {
        if !self.tree.begin_expansion(scope) {
            return;
        }
        self.expand_children(scope);
        self.tree.finish_expansion(scope);
    }

    /// Realize the whole tree. Used by the debug dump and by tests.
    pub fn expand_all(&mut self) {
        let mut pending = vec![self.tree.root()];
        while let Some(scope) = pending.pop() {
            self.expand(scope);
            pending.extend(self.tree[scope].children().iter().copied());
        }
    }

    fn expand_children(&mut self, scope: ScopeId) {
        match self.tree[scope].kind() {
            ScopeKind::SourceFile => {
                let items = self.file.items.clone();
                self.expand_items(scope, &items, self.file.span.end);
            }
            ScopeKind::Nominal { decl, portion } => portion.expand_children(self, scope, decl),
            ScopeKind::GenericParams { owner, index } => {
                self.expand_generic_param(scope, owner, index);
            }
            ScopeKind::Function { decl } => self.add_generic_chain_or_continue(scope, decl),
            ScopeKind::FunctionParams { decl } => self.expand_function_params(scope, decl),
            ScopeKind::FunctionBody { decl } => {
                let body = self.file.decls[decl].as_function().and_then(|f| f.body);
                if let Some(body) = body {
                    self.expand_folded_block(scope, body);
                }
            }
            ScopeKind::DefaultArgument { function, param } => {
                let default = self.file.decls[function]
                    .as_function()
                    .and_then(|f| f.params.get(param))
                    .and_then(|p| p.default);
                if let Some(default) = default {
                    self.add_expr_scopes(scope, default);
                }
            }
            ScopeKind::BindingDecl { decl, entry } => self.expand_binding_entry(scope, decl, entry),
            ScopeKind::BindingInitializer { decl, entry } => {
                let init = self.binding_entry(decl, entry).and_then(|e| e.init);
                if let Some(init) = init {
                    self.add_expr_scopes(scope, init);
                }
            }
            ScopeKind::AccessorBody {
                decl,
                entry,
                accessor,
            } => {
                let body = self
                    .binding_entry(decl, entry)
                    .and_then(|e| e.accessors.get(accessor))
                    .map(|a| a.body);
                if let Some(body) = body {
                    self.expand_folded_block(scope, body);
                }
            }
            // Materialized by their owner's expansion; nothing of their own.
            ScopeKind::BindingUse { .. }
            | ScopeKind::ConditionalClause { .. }
            | ScopeKind::ConditionalClauseUse { .. } => {}
            ScopeKind::If { stmt } => self.expand_if(scope, stmt),
            ScopeKind::While { stmt } => self.expand_while(scope, stmt),
            ScopeKind::Guard { stmt } => self.expand_guard(scope, stmt),
            ScopeKind::RepeatWhile { stmt } => {
                if let Stmt::RepeatWhile {
                    body, condition, ..
                } = self.file.stmts[stmt].clone()
                {
                    self.add_block_scope(scope, body);
                    self.add_expr_scopes(scope, condition);
                }
            }
            ScopeKind::For { stmt } => {
                if let Stmt::For { iterable, body, .. } = self.file.stmts[stmt].clone() {
                    self.add_expr_scopes(scope, iterable);
                    let body_span = self.file.stmt_span(body);
                    self.tree
                        .new_child(scope, ScopeKind::ForBody { stmt }, body_span);
                }
            }
            ScopeKind::ForBody { stmt } => {
                if let Stmt::For { body, .. } = &self.file.stmts[stmt] {
                    self.expand_folded_block(scope, *body);
                }
            }
            ScopeKind::Switch { stmt } => self.expand_switch(scope, stmt),
            ScopeKind::Case { stmt, case } => {
                let case_data = match &self.file.stmts[stmt] {
                    Stmt::Switch { cases, .. } => cases.get(case).cloned(),
                    _ => None,
                };
                if let Some(case_data) = case_data {
                    if let Some(guard) = case_data.guard {
                        self.add_expr_scopes(scope, guard);
                    }
                    self.add_block_scope(scope, case_data.body);
                }
            }
            ScopeKind::DoCatch { stmt } => self.expand_do_catch(scope, stmt),
            ScopeKind::CatchClause { stmt, index } => {
                let body = match &self.file.stmts[stmt] {
                    Stmt::Do { catches, .. } => catches.get(index).map(|c| c.body),
                    _ => None,
                };
                if let Some(body) = body {
                    self.add_block_scope(scope, body);
                }
            }
            ScopeKind::Block { stmt } => self.expand_folded_block(scope, stmt),
            ScopeKind::CaptureList { closure } => self.expand_capture_list(scope, closure),
            ScopeKind::ClosureParams { closure } => {
                let body = self.closure_body(closure);
                if let Some(body) = body {
                    let body_span = self.file.stmt_span(body);
                    self.tree
                        .new_child(scope, ScopeKind::ClosureBody { closure }, body_span);
                }
            }
            ScopeKind::ClosureBody { closure } => {
                if let Some(body) = self.closure_body(closure) {
                    self.expand_folded_block(scope, body);
                }
            }
        }
    }

    /// Add the scopes for a run of block or top-level items. `let` entries
    /// deepen the current parent with a use scope covering the rest of the
    /// region, so later items nest inside the names earlier entries bind.
    fn expand_items(&mut self, parent: ScopeId, items: &[Item], region_end: u32) {
        let mut cursor = parent;
        for &item in items {
            match item {
                Item::Decl(decl) => {
                    cursor = self.add_decl_scopes(cursor, decl, region_end, true);
                }
                Item::Stmt(stmt) => self.add_stmt_scopes(&mut cursor, stmt, region_end),
            }
        }
    }

    /// Add the scope(s) for one declaration. In ordered regions (blocks and
    /// top-level code) binding entries grow the use-scope chain and the
    /// returned cursor deepens; member regions are unordered and the cursor
    /// is returned unchanged.
    fn add_decl_scopes(
        &mut self,
        cursor: ScopeId,
        decl: DeclId,
        region_end: u32,
        ordered: bool,
    ) -> ScopeId {
        let span = self.file.decl_span(decl);
        match &self.file.decls[decl] {
            Decl::Struct(_) | Decl::Enum(_) | Decl::Trait(_) => {
                self.tree.new_child(
                    cursor,
                    ScopeKind::Nominal {
                        decl,
                        portion: DeclPortion::Whole,
                    },
                    span,
                );
                cursor
            }
            Decl::Function(_) => {
                self.tree
                    .new_child(cursor, ScopeKind::Function { decl }, span);
                cursor
            }
            Decl::Binding(binding) => {
                let entry_spans: Vec<Span> = binding.entries.iter().map(|e| e.span).collect();
                let mut cursor = cursor;
                for (entry, entry_span) in entry_spans.into_iter().enumerate() {
                    self.tree
                        .new_child(cursor, ScopeKind::BindingDecl { decl, entry }, entry_span);
                    if ordered {
                        cursor = self.tree.new_child_expanded(
                            cursor,
                            ScopeKind::BindingUse { decl, entry },
                            Span::new(entry_span.end, region_end),
                        );
                    }
                }
                cursor
            }
        }
    }

    /// Add the scope for one statement, if it forms one. A `guard` also
    /// grows a continuation use scope and deepens the cursor; statements
    /// that form no scope widen the cursor's ignored range instead.
    fn add_stmt_scopes(&mut self, cursor: &mut ScopeId, stmt: StmtId, region_end: u32) {
        let span = self.file.stmt_span(stmt);
        match &self.file.stmts[stmt] {
            Stmt::Block(_) => {
                self.tree
                    .new_child(*cursor, ScopeKind::Block { stmt }, span);
            }
            Stmt::If { .. } => {
                self.tree.new_child(*cursor, ScopeKind::If { stmt }, span);
            }
            Stmt::While { .. } => {
                self.tree
                    .new_child(*cursor, ScopeKind::While { stmt }, span);
            }
            Stmt::Guard { .. } => {
                let guard = self
                    .tree
                    .new_child(*cursor, ScopeKind::Guard { stmt }, span);
                *cursor = self.tree.new_child_expanded(
                    *cursor,
                    ScopeKind::ConditionalClauseUse { guard },
                    Span::new(span.end, region_end),
                );
            }
            Stmt::RepeatWhile { .. } => {
                self.tree
                    .new_child(*cursor, ScopeKind::RepeatWhile { stmt }, span);
            }
            Stmt::For { .. } => {
                self.tree.new_child(*cursor, ScopeKind::For { stmt }, span);
            }
            Stmt::Switch { .. } => {
                self.tree
                    .new_child(*cursor, ScopeKind::Switch { stmt }, span);
            }
            Stmt::Do { .. } => {
                self.tree
                    .new_child(*cursor, ScopeKind::DoCatch { stmt }, span);
            }
            Stmt::Expr { expr, .. } => {
                let expr = *expr;
                if !self.add_expr_scopes(*cursor, expr) {
                    self.tree.widen_ignored(*cursor, span);
                }
            }
            Stmt::Return { value, .. } => {
                let value = *value;
                let formed = value.is_some_and(|value| self.add_expr_scopes(*cursor, value));
                if !formed {
                    self.tree.widen_ignored(*cursor, span);
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => {
                self.tree.widen_ignored(*cursor, span);
            }
        }
    }

    /// Start the generic-parameter chain of `decl`, or continue straight to
    /// whatever follows it when there are no generic parameters.
    pub(crate) fn add_generic_chain_or_continue(&mut self, scope: ScopeId, decl: DeclId) {
        let generics = self.generics_of(decl);
        match generics.first() {
            Some(first) => {
                let end = self.file.decl_span(decl).end;
                self.tree.new_child(
                    scope,
                    ScopeKind::GenericParams {
                        owner: decl,
                        index: 0,
                    },
                    Span::new(first.span.start, end),
                );
            }
            None => self.add_post_generics(scope, decl),
        }
    }

    /// One generic parameter scope nests the next: later parameters may
    /// reference earlier ones but not vice versa.
    fn expand_generic_param(&mut self, scope: ScopeId, owner: DeclId, index: usize) {
        let generics = self.generics_of(owner);
        match generics.get(index + 1) {
            Some(next) => {
                let end = self.file.decl_span(owner).end;
                self.tree.new_child(
                    scope,
                    ScopeKind::GenericParams {
                        owner,
                        index: index + 1,
                    },
                    Span::new(next.span.start, end),
                );
            }
            None => self.add_post_generics(scope, owner),
        }
    }

    /// The scope that follows a declaration's generic parameters: the
    /// trailing where clause (nominals), the body, or the parameter list
    /// (functions).
    fn add_post_generics(&mut self, scope: ScopeId, decl: DeclId) {
        match &self.file.decls[decl] {
            Decl::Struct(nominal) | Decl::Enum(nominal) | Decl::Trait(nominal) => {
                match &nominal.where_clause {
                    Some(where_clause) => {
                        let span = Span::new(where_clause.span.start, nominal.span.end);
                        self.tree.new_child(
                            scope,
                            ScopeKind::Nominal {
                                decl,
                                portion: DeclPortion::TrailingWhere,
                            },
                            span,
                        );
                    }
                    None => self.add_nominal_body(scope, decl),
                }
            }
            Decl::Function(function) => {
                let span = Span::new(function.param_span.start, function.span.end);
                self.tree
                    .new_child(scope, ScopeKind::FunctionParams { decl }, span);
            }
            Decl::Binding(_) => {}
        }
    }

    /// Add the body-portion scope of a nominal declaration.
    pub(crate) fn add_nominal_body(&mut self, scope: ScopeId, decl: DeclId) {
        if let Some(nominal) = self.file.decls[decl].as_nominal() {
            let span = nominal.body_span;
            self.tree.new_child(
                scope,
                ScopeKind::Nominal {
                    decl,
                    portion: DeclPortion::Body,
                },
                span,
            );
        }
    }

    /// Add the member scopes of a nominal body. Members are unordered, so
    /// binding entries get no use scopes; member names are found through
    /// self-type lookup instead.
    pub(crate) fn add_member_scopes(&mut self, scope: ScopeId, decl: DeclId) {
        let Some(nominal) = self.file.decls[decl].as_nominal() else {
            return;
        };
        let members = nominal.members.clone();
        let end = nominal.body_span.end;
        for member in members {
            self.add_decl_scopes(scope, member, end, false);
        }
    }

    fn expand_function_params(&mut self, scope: ScopeId, decl: DeclId) {
        let Some(function) = self.file.decls[decl].as_function() else {
            return;
        };
        let defaults: Vec<(usize, ExprId)> = function
            .params
            .iter()
            .enumerate()
            .filter_map(|(index, param)| param.default.map(|default| (index, default)))
            .collect();
        let body = function.body;
        for (param, default) in defaults {
            let span = self.file.expr_span(default);
            self.tree.new_child(
                scope,
                ScopeKind::DefaultArgument {
                    function: decl,
                    param,
                },
                span,
            );
        }
        if let Some(body) = body {
            let span = self.file.stmt_span(body);
            self.tree
                .new_child(scope, ScopeKind::FunctionBody { decl }, span);
        }
    }

    /// The initializer and any accessor bodies of one binding entry.
    /// Accessors are deliberately folded into the owning entry's expansion
    /// rather than expanded as declarations of their own.
    fn expand_binding_entry(&mut self, scope: ScopeId, decl: DeclId, entry: usize) {
        let Some(entry_data) = self.binding_entry(decl, entry) else {
            return;
        };
        let init = entry_data.init;
        let accessor_spans: Vec<Span> = entry_data.accessors.iter().map(|a| a.span).collect();
        if let Some(init) = init {
            let span = self.file.expr_span(init);
            self.tree
                .new_child(scope, ScopeKind::BindingInitializer { decl, entry }, span);
        }
        for (accessor, span) in accessor_spans.into_iter().enumerate() {
            self.tree.new_child(
                scope,
                ScopeKind::AccessorBody {
                    decl,
                    entry,
                    accessor,
                },
                span,
            );
        }
    }

    fn expand_if(&mut self, scope: ScopeId, stmt: StmtId) {
        let Stmt::If {
            conditions,
            then_body,
            else_body,
            ..
        } = self.file.stmts[stmt].clone()
        else {
            return;
        };
        let then_end = self.file.stmt_span(then_body).end;
        let deepest = self.add_condition_chain(scope, stmt, &conditions, then_end);
        self.add_block_scope(deepest, then_body);
        if let Some(else_body) = else_body {
            self.add_block_scope(scope, else_body);
        }
    }

    fn expand_while(&mut self, scope: ScopeId, stmt: StmtId) {
        let Stmt::While {
            conditions, body, ..
        } = self.file.stmts[stmt].clone()
        else {
            return;
        };
        let body_end = self.file.stmt_span(body).end;
        let deepest = self.add_condition_chain(scope, stmt, &conditions, body_end);
        self.add_block_scope(deepest, body);
    }

    fn expand_guard(&mut self, scope: ScopeId, stmt: StmtId) {
        let Stmt::Guard {
            conditions,
            else_body,
            ..
        } = self.file.stmts[stmt].clone()
        else {
            return;
        };
        // Clauses stop before the else body: the bindings are not
        // initialized on the else path.
        let else_span = self.file.stmt_span(else_body);
        self.add_condition_chain(scope, stmt, &conditions, else_span.start);
        self.add_block_scope(scope, else_body);
    }

    /// Each bound clause covers from the end of its own initializer to the
    /// end of the governed region, so the initializer sits outside the names
    /// it binds and inside the names of earlier clauses. Returns the deepest
    /// scope, where the governed body belongs.
    fn add_condition_chain(
        &mut self,
        parent: ScopeId,
        stmt: StmtId,
        conditions: &[Condition],
        region_end: u32,
    ) -> ScopeId {
        let mut cursor = parent;
        for (clause, condition) in conditions.iter().enumerate() {
            match condition {
                Condition::Bool { expr, .. } => {
                    self.add_expr_scopes(cursor, *expr);
                }
                Condition::Binding { init, span, .. } => {
                    self.add_expr_scopes(cursor, *init);
                    cursor = self.tree.new_child_expanded(
                        cursor,
                        ScopeKind::ConditionalClause { stmt, clause },
                        Span::new(span.end, region_end),
                    );
                }
            }
        }
        cursor
    }

    fn expand_switch(&mut self, scope: ScopeId, stmt: StmtId) {
        let Stmt::Switch {
            scrutinee, cases, ..
        } = self.file.stmts[stmt].clone()
        else {
            return;
        };
        self.add_expr_scopes(scope, scrutinee);
        for (case, case_data) in cases.iter().enumerate() {
            self.tree
                .new_child(scope, ScopeKind::Case { stmt, case }, case_data.span);
        }
    }

    fn expand_do_catch(&mut self, scope: ScopeId, stmt: StmtId) {
        let Stmt::Do { body, catches, .. } = self.file.stmts[stmt].clone() else {
            return;
        };
        self.add_block_scope(scope, body);
        for (index, catch) in catches.iter().enumerate() {
            self.tree
                .new_child(scope, ScopeKind::CatchClause { stmt, index }, catch.span);
        }
    }

    fn expand_capture_list(&mut self, scope: ScopeId, closure: ExprId) {
        let Expr::Closure {
            captures,
            params,
            body,
            span,
        } = self.file.exprs[closure].clone()
        else {
            return;
        };
        for capture in &captures {
            if let Some(init) = capture.init {
                self.add_expr_scopes(scope, init);
            }
        }
        match params.first() {
            Some(first) => {
                self.tree.new_child(
                    scope,
                    ScopeKind::ClosureParams { closure },
                    Span::new(first.span.start, span.end),
                );
            }
            None => {
                let body_span = self.file.stmt_span(body);
                self.tree
                    .new_child(scope, ScopeKind::ClosureBody { closure }, body_span);
            }
        }
    }

    /// Expand the items of a brace statement directly into `scope`; the
    /// brace statement itself gets no separate node when it is a function,
    /// closure, accessor or loop body.
    fn expand_folded_block(&mut self, scope: ScopeId, block_stmt: StmtId) {
        let Some(block) = self.file.block(block_stmt) else {
            return;
        };
        let items = block.items.clone();
        let end = block.span.end;
        self.expand_items(scope, &items, end);
    }

    fn add_block_scope(&mut self, parent: ScopeId, stmt: StmtId) {
        let span = self.file.stmt_span(stmt);
        self.tree
            .new_child(parent, ScopeKind::Block { stmt }, span);
    }

    /// Add the scope chains for the outermost closures of `expr`. Returns
    /// whether any scope was formed.
    fn add_expr_scopes(&mut self, parent: ScopeId, expr: ExprId) -> bool {
        let mut closures = Vec::new();
        walk::collect_closures(self.file, expr, &mut closures);
        let formed = !closures.is_empty();
        for closure in closures {
            self.add_closure_scope(parent, closure);
        }
        formed
    }

    /// The outermost scope of a closure: capture list when present, else
    /// parameter list, else the body itself.
    fn add_closure_scope(&mut self, parent: ScopeId, closure: ExprId) {
        let Expr::Closure {
            captures,
            params,
            body,
            span,
        } = self.file.exprs[closure].clone()
        else {
            return;
        };
        if !captures.is_empty() {
            self.tree
                .new_child(parent, ScopeKind::CaptureList { closure }, span);
        } else if let Some(first) = params.first() {
            self.tree.new_child(
                parent,
                ScopeKind::ClosureParams { closure },
                Span::new(first.span.start, span.end),
            );
        } else {
            let body_span = self.file.stmt_span(body);
            self.tree
                .new_child(parent, ScopeKind::ClosureBody { closure }, body_span);
        }
    }

    /// Walk the clause chain of an expanded `guard` scope to its deepest
    /// bound clause, expanding on demand. `None` when the guard binds
    /// nothing, in which case lookup falls back to the structural parent.
    pub(crate) fn deepest_clause(&mut self, guard: ScopeId) -> Option<ScopeId> {
        self.expand(guard);
        let mut deepest = None;
        let mut current = guard;
        loop {
            let next = self.tree[current]
                .children()
                .iter()
                .copied()
                .find(|&child| {
                    matches!(self.tree[child].kind(), ScopeKind::ConditionalClause { .. })
                });
            match next {
                Some(clause) => {
                    deepest = Some(clause);
                    current = clause;
                }
                None => break,
            }
        }
        deepest
    }

    fn generics_of(&self, decl: DeclId) -> &'a [GenericParam] {
        self.file.decls[decl].generics()
    }

    fn binding_entry(&self, decl: DeclId, entry: usize) -> Option<&jay_syntax::BindingEntry> {
        self.file.decls[decl]
            .as_binding()
            .and_then(|binding| binding.entries.get(entry))
    }

    fn closure_body(&self, closure: ExprId) -> Option<StmtId> {
        match &self.file.exprs[closure] {
            Expr::Closure { body, .. } => Some(*body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ExpansionState;
    use jay_intern::Interner;
    use jay_span::FileId;
    use jay_syntax::{
        Accessor, AccessorKind, BindingDecl, BindingEntry, Block, Decl, FunctionDecl,
        LiteralKind, NominalDecl, Param, Pattern, PatternId, TypeRef, WhereClause,
        WhereRequirement,
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

    fn int_expr(file: &mut SourceFile, value: i64, lo: u32, hi: u32) -> ExprId {
        file.alloc_expr(Expr::Literal {
            kind: LiteralKind::Int(value),
            span: Span::new(lo, hi),
        })
    }

    /// `struct S<A, B: A> where A: P { let m = 1  fn f() { } }`
    fn generic_struct_file(interner: &Interner) -> SourceFile {
        let mut file = SourceFile::new(FileId(0), Span::new(0, 60));

        let pattern_m = name_pattern(&mut file, interner, "m", 36, 37);
        let one = int_expr(&mut file, 1, 40, 41);
        let member_binding = file.alloc_decl(Decl::Binding(BindingDecl {
            mutable: false,
            entries: vec![BindingEntry {
                pattern: pattern_m,
                init: Some(one),
                accessors: Vec::new(),
                span: Span::new(32, 41),
            }],
            span: Span::new(32, 41),
        }));

        let body = file.alloc_stmt(Stmt::Block(Block {
            items: Vec::new(),
            span: Span::new(51, 58),
        }));
        let member_fn = file.alloc_decl(Decl::Function(FunctionDecl {
            name: interner.intern("f"),
            generics: Vec::new(),
            params: Vec::new(),
            param_span: Span::new(48, 50),
            where_clause: None,
            return_type: None,
            body: Some(body),
            span: Span::new(43, 58),
        }));

        let strukt = file.alloc_decl(Decl::Struct(NominalDecl {
            name: interner.intern("S"),
            generics: vec![
                GenericParam {
                    name: interner.intern("A"),
                    constraint: None,
                    span: Span::new(9, 10),
                },
                GenericParam {
                    name: interner.intern("B"),
                    constraint: Some(TypeRef {
                        name: interner.intern("A"),
                        span: Span::new(15, 16),
                    }),
                    span: Span::new(12, 16),
                },
            ],
            where_clause: Some(WhereClause {
                requirements: vec![WhereRequirement {
                    subject: TypeRef {
                        name: interner.intern("A"),
                        span: Span::new(24, 25),
                    },
                    bound: TypeRef {
                        name: interner.intern("P"),
                        span: Span::new(27, 28),
                    },
                    span: Span::new(24, 28),
                }],
                span: Span::new(18, 28),
            }),
            members: vec![member_binding, member_fn],
            body_span: Span::new(30, 60),
            span: Span::new(0, 60),
        }));
        file.push_item(Item::Decl(strukt));

        file
    }

    fn single_child(tree: &ScopeTree, scope: ScopeId) -> ScopeId {
        let children = tree[scope].children();
        assert_eq!(children.len(), 1, "expected exactly one child");
        children[0]
    }

    #[test]
    fn test_nominal_triad_chain() {
        let interner = Interner::new();
        let file = generic_struct_file(&interner);
        let mut tree = ScopeTree::new(&file);
        ScopeBuilder::new(&mut tree, &file).expand_all();

        let whole = single_child(&tree, tree.root());
        assert!(matches!(
            tree[whole].kind(),
            ScopeKind::Nominal {
                portion: DeclPortion::Whole,
                ..
            }
        ));
        assert_eq!(tree.range(whole), Span::new(0, 60));

        let first_param = single_child(&tree, whole);
        assert!(matches!(
            tree[first_param].kind(),
            ScopeKind::GenericParams { index: 0, .. }
        ));
        assert_eq!(tree.range(first_param), Span::new(9, 60));

        let second_param = single_child(&tree, first_param);
        assert!(matches!(
            tree[second_param].kind(),
            ScopeKind::GenericParams { index: 1, .. }
        ));
        assert_eq!(tree.range(second_param), Span::new(12, 60));

        let trailing_where = single_child(&tree, second_param);
        assert!(matches!(
            tree[trailing_where].kind(),
            ScopeKind::Nominal {
                portion: DeclPortion::TrailingWhere,
                ..
            }
        ));
        assert_eq!(tree.range(trailing_where), Span::new(18, 60));

        let body = single_child(&tree, trailing_where);
        assert!(matches!(
            tree[body].kind(),
            ScopeKind::Nominal {
                portion: DeclPortion::Body,
                ..
            }
        ));
        assert_eq!(tree.range(body), Span::new(30, 60));

        // Members are unordered: the binding entry gets no use scope.
        let kinds: Vec<&str> = tree[body]
            .children()
            .iter()
            .map(|&child| tree[child].kind().name())
            .collect();
        assert_eq!(kinds, ["BindingDecl", "Function"]);

        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let interner = Interner::new();
        let file = generic_struct_file(&interner);
        let mut tree = ScopeTree::new(&file);

        let root = tree.root();
        ScopeBuilder::new(&mut tree, &file).expand(root);
        let children_after_first: Vec<ScopeId> = tree[tree.root()].children().to_vec();
        ScopeBuilder::new(&mut tree, &file).expand(root);
        assert_eq!(tree[tree.root()].children(), &children_after_first[..]);

        ScopeBuilder::new(&mut tree, &file).expand_all();
        let realized = tree.len();
        ScopeBuilder::new(&mut tree, &file).expand_all();
        assert_eq!(tree.len(), realized);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_innermost_descent_is_unambiguous() {
        let interner = Interner::new();
        let file = generic_struct_file(&interner);
        let mut tree = ScopeTree::new(&file);
        ScopeBuilder::new(&mut tree, &file).expand_all();

        for loc in 0..file.span.end {
            let innermost = tree.innermost_at(&file, tree.root(), loc);
            assert!(
                innermost == tree.root() || tree.range(innermost).contains_offset(loc),
                "innermost scope must contain the location",
            );
            let containing: Vec<ScopeId> = tree[innermost]
                .children()
                .iter()
                .copied()
                .filter(|&child| tree.range(child).contains_offset(loc))
                .collect();
            assert!(containing.is_empty(), "no child may still contain {loc}");
        }
    }

    /// `guard let x = f() else { return }  h(x)` at top level.
    fn guarded_file(interner: &Interner) -> SourceFile {
        let mut file = SourceFile::new(FileId(0), Span::new(0, 40));

        let pattern_x = name_pattern(&mut file, interner, "x", 12, 13);
        let call_f = file.alloc_expr(Expr::Name {
            name: interner.intern("f"),
            span: Span::new(16, 19),
        });
        let return_stmt = file.alloc_stmt(Stmt::Return {
            value: None,
            span: Span::new(27, 30),
        });
        let else_body = file.alloc_stmt(Stmt::Block(Block {
            items: vec![Item::Stmt(return_stmt)],
            span: Span::new(25, 32),
        }));
        let guard_stmt = file.alloc_stmt(Stmt::Guard {
            conditions: vec![Condition::Binding {
                pattern: pattern_x,
                init: call_f,
                span: Span::new(8, 19),
            }],
            else_body,
            span: Span::new(2, 32),
        });
        file.push_item(Item::Stmt(guard_stmt));

        let use_x = file.alloc_expr(Expr::Name {
            name: interner.intern("x"),
            span: Span::new(36, 37),
        });
        let use_stmt = file.alloc_stmt(Stmt::Expr {
            expr: use_x,
            span: Span::new(34, 38),
        });
        file.push_item(Item::Stmt(use_stmt));

        file
    }

    #[test]
    fn test_guard_grows_continuation_scope() {
        let interner = Interner::new();
        let file = guarded_file(&interner);
        let mut tree = ScopeTree::new(&file);
        ScopeBuilder::new(&mut tree, &file).expand_all();

        let root_kinds: Vec<&str> = tree[tree.root()]
            .children()
            .iter()
            .map(|&child| tree[child].kind().name())
            .collect();
        assert_eq!(root_kinds, ["Guard", "ConditionalClauseUse"]);

        let guard = tree[tree.root()].children()[0];
        let continuation = tree[tree.root()].children()[1];
        assert_eq!(tree.range(continuation), Span::new(32, 40));

        // The clause stops before the else body: its bindings are not
        // initialized on the else path.
        let guard_kinds: Vec<&str> = tree[guard]
            .children()
            .iter()
            .map(|&child| tree[child].kind().name())
            .collect();
        assert_eq!(guard_kinds, ["ConditionalClause", "Block"]);
        let clause = tree[guard].children()[0];
        assert_eq!(tree.range(clause), Span::new(19, 25));

        let mut builder = ScopeBuilder::new(&mut tree, &file);
        assert_eq!(builder.deepest_clause(guard), Some(clause));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_accessors_fold_into_binding_entry() {
        let interner = Interner::new();
        let mut file = SourceFile::new(FileId(0), Span::new(0, 24));

        let pattern_p = name_pattern(&mut file, &interner, "p", 4, 5);
        let one = int_expr(&mut file, 1, 13, 14);
        let getter_return = file.alloc_stmt(Stmt::Return {
            value: Some(one),
            span: Span::new(11, 15),
        });
        let getter_body = file.alloc_stmt(Stmt::Block(Block {
            items: vec![Item::Stmt(getter_return)],
            span: Span::new(10, 18),
        }));
        let binding = file.alloc_decl(Decl::Binding(BindingDecl {
            mutable: true,
            entries: vec![BindingEntry {
                pattern: pattern_p,
                init: None,
                accessors: vec![Accessor {
                    kind: AccessorKind::Get,
                    body: getter_body,
                    span: Span::new(6, 18),
                }],
                span: Span::new(0, 20),
            }],
            span: Span::new(0, 20),
        }));
        file.push_item(Item::Decl(binding));

        let mut tree = ScopeTree::new(&file);
        ScopeBuilder::new(&mut tree, &file).expand_all();

        let root_kinds: Vec<&str> = tree[tree.root()]
            .children()
            .iter()
            .map(|&child| tree[child].kind().name())
            .collect();
        assert_eq!(root_kinds, ["BindingDecl", "BindingUse"]);

        let entry_scope = tree[tree.root()].children()[0];
        let entry_kinds: Vec<&str> = tree[entry_scope]
            .children()
            .iter()
            .map(|&child| tree[child].kind().name())
            .collect();
        assert_eq!(entry_kinds, ["AccessorBody"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_function_chain_with_default_argument() {
        let interner = Interner::new();
        let mut file = SourceFile::new(FileId(0), Span::new(0, 20));

        let default = int_expr(&mut file, 1, 13, 14);
        let body = file.alloc_stmt(Stmt::Block(Block {
            items: Vec::new(),
            span: Span::new(17, 20),
        }));
        let function = file.alloc_decl(Decl::Function(FunctionDecl {
            name: interner.intern("g"),
            generics: Vec::new(),
            params: vec![Param {
                name: interner.intern("x"),
                ty: None,
                default: Some(default),
                span: Span::new(5, 14),
            }],
            param_span: Span::new(4, 16),
            where_clause: None,
            return_type: None,
            body: Some(body),
            span: Span::new(0, 20),
        }));
        file.push_item(Item::Decl(function));

        let mut tree = ScopeTree::new(&file);
        ScopeBuilder::new(&mut tree, &file).expand_all();

        let function_scope = single_child(&tree, tree.root());
        assert!(matches!(
            tree[function_scope].kind(),
            ScopeKind::Function { .. }
        ));

        let params = single_child(&tree, function_scope);
        assert!(matches!(
            tree[params].kind(),
            ScopeKind::FunctionParams { .. }
        ));
        assert_eq!(tree.range(params), Span::new(4, 20));

        let param_kinds: Vec<&str> = tree[params]
            .children()
            .iter()
            .map(|&child| tree[child].kind().name())
            .collect();
        assert_eq!(param_kinds, ["DefaultArgument", "FunctionBody"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_lazy_scopes_stay_unexpanded_until_visited() {
        let interner = Interner::new();
        let file = generic_struct_file(&interner);
        let mut tree = ScopeTree::new(&file);

        let root = tree.root();
        ScopeBuilder::new(&mut tree, &file).expand(root);
        let whole = single_child(&tree, tree.root());
        assert_eq!(tree[whole].expansion(), ExpansionState::Unexpanded);
        assert!(tree[whole].children().is_empty());

        ScopeBuilder::new(&mut tree, &file).expand(whole);
        assert_eq!(tree[whole].expansion(), ExpansionState::Expanded);
        assert_eq!(tree[whole].children().len(), 1);
    }
}
