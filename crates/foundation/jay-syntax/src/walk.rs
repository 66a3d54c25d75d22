//! Shallow expression walks used by the scope builder

use crate::{Expr, ExprId, SourceFile};

/// Collect the closures contained in `expr`, outermost only.
///
/// The walk does not descend into a collected closure: its capture
/// initializers and body belong to the closure's own scopes.
pub fn collect_closures(file: &SourceFile, expr: ExprId, out: &mut Vec<ExprId>) {
    match &file.exprs[expr] {
        Expr::Closure { .. } => out.push(expr),
        Expr::Call { callee, args, .. } => {
            collect_closures(file, *callee, out);
            for &arg in args {
                collect_closures(file, arg, out);
            }
        }
        Expr::Member { base, .. } => collect_closures(file, *base, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_closures(file, *lhs, out);
            collect_closures(file, *rhs, out);
        }
        Expr::Literal { .. } | Expr::Name { .. } => {}
    }
}
