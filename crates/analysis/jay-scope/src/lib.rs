//! Lexical scope tree and unqualified name lookup for Jay
//!
//! This crate answers one question: which named declarations are textually
//! visible from a given source position, and in what shadowing order. It
//! builds a tree of scope nodes mirroring the nesting structure of a parsed
//! file and walks it outward from the innermost scope containing the
//! position, streaming every visible declaration to a caller-supplied
//! consumer. Inner declarations are reported before outer ones; the consumer
//! owns any further shadowing or filtering policy.
//!
//! # Architecture
//!
//! - **Scope tree** (`node`): arena-allocated nodes, one closed `ScopeKind`
//!   variant per syntactic construct that introduces or modifies a lookup
//!   scope, with structural invariants enforced on every mutation
//! - **Portions** (`portion`): the whole/where/body slicing strategy shared
//!   by nominal declaration scopes
//! - **Builder** (`builder`): lazy, idempotent, monotonic expansion of a
//!   node's children from the AST
//! - **Lookup** (`lookup`): the outward walk, with per-variant local
//!   bindings, self-type member lookup, lookup limits, lookup-parent
//!   redirects and cascading-use tracking
//! - **Dump** (`dump`): an indented debug print of the realized tree
//!
//! Type resolution, overload resolution and semantic usability checks
//! (accessibility, mutability) are deliberately not performed here.
//!
//! # Usage
//!
//! ```rust,ignore
//! use jay_scope::{CascadingUse, CollectAll, ScopeTree};
//!
//! let mut tree = ScopeTree::new(&file);
//! let mut consumer = CollectAll::default();
//! let cascading = tree.unqualified_lookup(
//!     &file, name, loc, None, CascadingUse::Unknown, &mut consumer,
//! );
//! // consumer.found holds the visible declarations, innermost first
//! ```

pub mod builder;
pub mod dump;
pub mod error;
pub mod lookup;
pub mod node;
pub mod portion;

pub use builder::ScopeBuilder;
pub use dump::dump;
pub use error::InvariantViolation;
pub use lookup::{
    CascadingUse, CollectAll, DeclConsumer, DeclRef, FirstMatch, FoundDecl, VisibilityReason,
};
pub use node::{ExpansionState, ScopeData, ScopeId, ScopeKind, ScopeTree};
pub use portion::DeclPortion;
