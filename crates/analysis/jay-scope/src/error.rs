//! Error types for the scope tree
//!
//! Structural violations are programmer errors in the builder or the AST
//! collaborator, not user errors: wrong lookup results are worse than a
//! crash in a front end, so debug builds abort at the mutation site instead
//! of recovering. Release builds skip the checks.

use jay_span::Span;

/// A structural invariant of the scope tree failed to hold
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A child's range is not a subset of its parent's range
    #[error("child scope range {child} escapes parent scope range {parent}")]
    ChildEscapesParent {
        /// Resolved range of the parent
        parent: Span,
        /// Range of the offending child
        child: Span,
    },

    /// Siblings out of source order, or overlapping
    #[error("child scope range {second} overlaps or precedes its elder sibling {first}")]
    ChildrenOutOfOrder {
        /// Range of the previously appended sibling
        first: Span,
        /// Range of the offending new sibling
        second: Span,
    },

    /// A scope's expansion re-entered itself
    #[error("scope expansion re-entered while already in progress")]
    ReentrantExpansion,

    /// A child's parent link does not name the scope that owns it
    #[error("child scope does not link back to its owning parent")]
    BrokenParentLink,
}
