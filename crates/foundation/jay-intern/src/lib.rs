//! String interning for symbols

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::sync::Arc;

/// Thread-safe string interner.
///
/// Cheap to clone; all clones share one symbol table.
#[derive(Clone)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    pub fn resolve(&self, sym: &Symbol) -> &str {
        self.inner.resolve(sym)
    }

    pub fn try_resolve(&self, sym: &Symbol) -> Option<&str> {
        self.inner.try_resolve(sym)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_round_trip() {
        let interner = Interner::new();
        let sym = interner.intern("lookup");
        assert_eq!(interner.intern("lookup"), sym);
        assert_eq!(interner.resolve(&sym), "lookup");
    }

    #[test]
    fn test_clones_share_table() {
        let interner = Interner::new();
        let clone = interner.clone();
        assert_eq!(interner.intern("name"), clone.intern("name"));
    }
}
