extern crate derive_more;
use derive_more::Deref;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An interned identifier. Equality and hashing go through the address of
/// the shared allocation, so two symbols from the same table compare equal
/// exactly when they were interned from the same spelling.
#[derive(Deref, Debug, Clone)]
pub struct ScmSymbol(Rc<str>);

impl PartialEq for ScmSymbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ScmSymbol {}

impl Hash for ScmSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state);
    }
}

impl AsRef<str> for ScmSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScmSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The interner. Entries are only ever added: symbol identity relies on a
/// spelling never being re-allocated for the life of the table. Each
/// `Interpreter` owns one, so independent instances never share symbols.
#[derive(Default)]
pub struct SymbolTable {
    entries: HashMap<String, ScmSymbol>,
}

impl SymbolTable {
    pub fn intern(&mut self, text: &str) -> ScmSymbol {
        if let Some(symbol) = self.entries.get(text) {
            return symbol.clone();
        }
        let symbol = ScmSymbol(Rc::from(text));
        self.entries.insert(text.to_string(), symbol.clone());
        symbol
    }
}

/// The special-form tags, interned up front so that the evaluator's
/// dispatch is a chain of identity comparisons rather than text compares.
#[derive(Clone)]
pub struct Syntax {
    pub quote: ScmSymbol,
    pub define: ScmSymbol,
    pub set: ScmSymbol,
    pub ok: ScmSymbol,
    pub if_: ScmSymbol,
    pub lambda: ScmSymbol,
    pub begin: ScmSymbol,
    pub cond: ScmSymbol,
    pub else_: ScmSymbol,
    pub let_: ScmSymbol,
    pub and: ScmSymbol,
    pub or: ScmSymbol,
}

impl Syntax {
    pub fn intern_in(symbols: &mut SymbolTable) -> Self {
        Syntax {
            quote: symbols.intern("quote"),
            define: symbols.intern("define"),
            set: symbols.intern("set!"),
            ok: symbols.intern("ok"),
            if_: symbols.intern("if"),
            lambda: symbols.intern("lambda"),
            begin: symbols.intern("begin"),
            cond: symbols.intern("cond"),
            else_: symbols.intern("else"),
            let_: symbols.intern("let"),
            and: symbols.intern("and"),
            or: symbols.intern("or"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = SymbolTable::default();
        let first = table.intern("foo");
        let second = table.intern("foo");
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_spellings_are_distinct_symbols() {
        let mut table = SymbolTable::default();
        assert_ne!(table.intern("foo"), table.intern("bar"));
    }

    #[test]
    fn separate_tables_do_not_share_identity() {
        let mut a = SymbolTable::default();
        let mut b = SymbolTable::default();
        assert_ne!(a.intern("foo"), b.intern("foo"));
    }

    #[test]
    fn symbols_deref_to_their_text() {
        let mut table = SymbolTable::default();
        let symbol = table.intern("set-car!");
        assert_eq!(symbol.as_ref(), "set-car!");
        assert_eq!(symbol.to_string(), "set-car!");
    }

    #[test]
    fn syntax_tags_match_fresh_interns() {
        let mut table = SymbolTable::default();
        let syntax = Syntax::intern_in(&mut table);
        assert_eq!(syntax.quote, table.intern("quote"));
        assert_eq!(syntax.else_, table.intern("else"));
    }
}
