use crate::symbols::ScmSymbol;
use crate::types::ScmObject;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One frame of lexical bindings, chained to its enclosing frame.
///
/// Frames are shared: every closure created while a frame was innermost
/// keeps an `Rc` to it, and `set!`/`define` write through the `RefCell`, so
/// all holders observe the mutation. Single-threaded by construction.
pub struct Environment {
    bindings: RefCell<HashMap<ScmSymbol, ScmObject>>,
    enclosing: Option<Rc<Environment>>,
}

#[derive(Debug)]
pub struct UnboundVariable(pub String);

impl fmt::Display for UnboundVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unbound variable '{}'", self.0)
    }
}

impl Environment {
    /// The outermost frame; it has no parent.
    pub fn global() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            enclosing: None,
        })
    }

    /// A fresh, empty frame enclosed by `parent`.
    pub fn spawn_from(parent: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            enclosing: Some(Rc::clone(parent)),
        })
    }

    /// Bind in this frame only. Redefinition overwrites; enclosing frames
    /// are never consulted.
    pub fn define(&self, key: ScmSymbol, value: ScmObject) {
        self.bindings.borrow_mut().insert(key, value);
    }

    /// Mutate the first binding for `key` found walking outward.
    pub fn set(&self, key: &ScmSymbol, value: ScmObject) -> Result<(), UnboundVariable> {
        let mut env = self;
        loop {
            if let Some(slot) = env.bindings.borrow_mut().get_mut(key) {
                *slot = value;
                return Ok(());
            }
            match &env.enclosing {
                Some(parent) => env = parent,
                None => return Err(UnboundVariable(key.to_string())),
            }
        }
    }

    /// Look `key` up, walking outward through enclosing frames.
    pub fn fetch(&self, key: &ScmSymbol) -> Result<ScmObject, UnboundVariable> {
        let mut env = self;
        loop {
            if let Some(value) = env.bindings.borrow().get(key) {
                return Ok(value.clone());
            }
            match &env.enclosing {
                Some(parent) => env = parent,
                None => return Err(UnboundVariable(key.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;
    use crate::types::ScmInt;

    fn fix(n: ScmInt) -> ScmObject {
        ScmObject::Fixnum(n)
    }

    #[test]
    fn define_then_fetch() {
        let mut table = SymbolTable::default();
        let env = Environment::global();
        env.define(table.intern("x"), fix(1));
        assert_eq!(env.fetch(&table.intern("x")).unwrap(), fix(1));
    }

    #[test]
    fn fetch_walks_outward() {
        let mut table = SymbolTable::default();
        let global = Environment::global();
        global.define(table.intern("x"), fix(1));
        let inner = Environment::spawn_from(&global);
        assert_eq!(inner.fetch(&table.intern("x")).unwrap(), fix(1));
    }

    #[test]
    fn inner_define_shadows_without_touching_outer() {
        let mut table = SymbolTable::default();
        let global = Environment::global();
        global.define(table.intern("x"), fix(1));
        let inner = Environment::spawn_from(&global);
        inner.define(table.intern("x"), fix(2));
        assert_eq!(inner.fetch(&table.intern("x")).unwrap(), fix(2));
        assert_eq!(global.fetch(&table.intern("x")).unwrap(), fix(1));
    }

    #[test]
    fn set_mutates_the_binding_frame() {
        let mut table = SymbolTable::default();
        let global = Environment::global();
        global.define(table.intern("x"), fix(1));
        let inner = Environment::spawn_from(&global);
        inner.set(&table.intern("x"), fix(2)).unwrap();
        assert_eq!(global.fetch(&table.intern("x")).unwrap(), fix(2));
    }

    #[test]
    fn set_on_unbound_symbol_fails() {
        let mut table = SymbolTable::default();
        let env = Environment::global();
        let err = env.set(&table.intern("nope"), fix(1)).unwrap_err();
        assert_eq!(err.0, "nope");
    }

    #[test]
    fn fetch_on_unbound_symbol_fails() {
        let mut table = SymbolTable::default();
        let env = Environment::global();
        assert!(env.fetch(&table.intern("nope")).is_err());
    }
}
