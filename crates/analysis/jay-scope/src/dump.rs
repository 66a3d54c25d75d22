//! Debug print of the realized scope tree
//!
//! One line per node: variant name, arena index for identity, resolved
//! range. Human-read-only; the format is not stable.

use crate::builder::ScopeBuilder;
use crate::node::{ScopeId, ScopeTree};
use jay_syntax::SourceFile;
use std::fmt::Write as _;

/// Expand the whole tree and render it, indented by nesting depth.
pub fn dump(tree: &mut ScopeTree, file: &SourceFile) -> String {
    ScopeBuilder::new(tree, file).expand_all();
    let mut out = String::new();
    write_scope(tree, tree.root(), 0, &mut out);
    out
}

fn write_scope(tree: &ScopeTree, scope: ScopeId, depth: usize, out: &mut String) {
    let data = &tree[scope];
    let _ = writeln!(
        out,
        "{:indent$}{} @{} {}",
        "",
        data.kind().name(),
        u32::from(scope.into_raw()),
        data.range(),
        indent = depth * 2,
    );
    for &child in data.children() {
        write_scope(tree, child, depth + 1, out);
    }
}
