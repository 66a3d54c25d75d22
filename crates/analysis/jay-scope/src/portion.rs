//! The whole/where/body slicing strategy for nominal declaration scopes
//!
//! A nominal declaration contributes up to three nested scope nodes, all of
//! the same `Nominal` variant, distinguished by an immutable portion value:
//! the whole declaration, the trailing `where` clause, and the braced body.
//! The portion intercepts exactly three behaviors: how the node expands,
//! whether its slice performs self-type member lookup, and the hard lookup
//! limit for the slice. Dispatch is by value; portions own nothing.

use crate::builder::ScopeBuilder;
use crate::node::{ScopeId, ScopeKind, ScopeTree};
use jay_syntax::{DeclId, SourceFile};

/// Which textual slice of a nominal declaration a scope node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclPortion {
    /// The whole declaration, header included
    Whole,
    /// The trailing `where` clause through the end of the declaration
    TrailingWhere,
    /// The braced member body
    Body,
}

impl DeclPortion {
    /// Materialize the children of a `Nominal` scope carrying this portion.
    ///
    /// The whole slice starts the generic-parameter chain (or skips straight
    /// to the deeper portions), the where slice wraps the body, and the body
    /// slice holds the member declarations.
    pub(crate) fn expand_children(
        self,
        builder: &mut ScopeBuilder<'_, '_>,
        scope: ScopeId,
        decl: DeclId,
    ) {
        match self {
            Self::Whole => builder.add_generic_chain_or_continue(scope, decl),
            Self::TrailingWhere => builder.add_nominal_body(scope, decl),
            Self::Body => builder.add_member_scopes(scope, decl),
        }
    }

    /// Whether lookups passing this slice scan the declaration's members.
    ///
    /// The header slice sees generic parameters but not members, so a name
    /// in an inheritance clause cannot be shadowed by a member of the type
    /// being declared.
    pub(crate) fn contributes_members(self) -> bool {
        match self {
            Self::Whole => false,
            Self::TrailingWhere | Self::Body => true,
        }
    }

    /// The ancestor boundary beyond which an outward lookup must not pass.
    ///
    /// Only the whole slice of a protocol-like declaration that is illegally
    /// nested inside a nominal body installs a limit: the walk may finish
    /// the trait's own scopes and must then stop, so the enclosing type's
    /// names are never reported inside the trait.
    pub(crate) fn lookup_limit(
        self,
        tree: &ScopeTree,
        scope: ScopeId,
        file: &SourceFile,
        decl: DeclId,
    ) -> Option<ScopeId> {
        if self != Self::Whole || !file.decls[decl].is_trait() {
            return None;
        }
        let mut current = tree[scope].parent();
        while let Some(ancestor) = current {
            if matches!(
                tree[ancestor].kind(),
                ScopeKind::Nominal {
                    portion: Self::Body,
                    ..
                }
            ) {
                return Some(scope);
            }
            current = tree[ancestor].parent();
        }
        None
    }
}
