use crate::environment::Environment;
use crate::evaluator;
use crate::symbols::{ScmSymbol, SymbolTable};
use itertools::Itertools;
use std::cell::RefCell;
use std::fmt::{self, Formatter};
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type ScmInt = isize;

/// Every datum the reader produces and the evaluator consumes.
///
/// Scalars carry their payload directly; pairs and compound procedures sit
/// behind `Rc` because they are shared: a pair may be reachable from several
/// bindings (and mutated through any of them), and a procedure keeps its
/// defining environment alive for as long as the procedure itself is.
#[derive(Debug, Clone)]
pub enum ScmObject {
    Fixnum(ScmInt),
    Boolean(bool),
    Character(char),
    String(String),
    EmptyList,
    Pair(Rc<Pair>),
    Symbol(ScmSymbol),
    Primitive(&'static PrimitiveFn),
    Lambda(Rc<Lambda>),
}

/// A two-slot mutable cell. `set-car!` and `set-cdr!` write through the
/// `RefCell`s, so every holder of the `Rc` observes the mutation.
#[derive(Debug)]
pub struct Pair {
    pub car: RefCell<ScmObject>,
    pub cdr: RefCell<ScmObject>,
}

impl ScmObject {
    pub fn cons(car: ScmObject, cdr: ScmObject) -> Self {
        ScmObject::Pair(Rc::new(Pair {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    pub fn list_from_vec(elements: Vec<ScmObject>) -> Self {
        elements
            .into_iter()
            .rev()
            .fold(ScmObject::EmptyList, |tail, head| ScmObject::cons(head, tail))
    }

    /// Clone out the elements of a proper list. Fails on a dotted tail.
    pub fn to_proper_list(&self) -> Result<Vec<ScmObject>, TypeMismatch> {
        let mut elements = Vec::new();
        let mut rest = self.clone();
        loop {
            match rest {
                ScmObject::EmptyList => return Ok(elements),
                ScmObject::Pair(pair) => {
                    elements.push(pair.car.borrow().clone());
                    let next = pair.cdr.borrow().clone();
                    rest = next;
                }
                _ => return Err(TypeMismatch::NotAList),
            }
        }
    }

    pub(crate) fn is_true(&self) -> bool {
        matches!(self, ScmObject::Boolean(true))
    }

    pub(crate) fn is_false(&self) -> bool {
        matches!(self, ScmObject::Boolean(false))
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ScmObject::Fixnum(_) => "fixnum",
            ScmObject::Boolean(_) => "boolean",
            ScmObject::Character(_) => "character",
            ScmObject::String(_) => "string",
            ScmObject::EmptyList => "the empty list",
            ScmObject::Pair(_) => "pair",
            ScmObject::Symbol(_) => "symbol",
            ScmObject::Primitive(_) => "primitive procedure",
            ScmObject::Lambda(_) => "compound procedure",
        }
    }
}

#[derive(Debug)]
pub enum TypeMismatch {
    NotAFixnum,
    NotACharacter,
    NotAString,
    NotAPair,
    NotASymbol,
    NotAList,
}

impl ScmObject {
    pub(crate) fn as_fixnum(&self) -> Result<ScmInt, TypeMismatch> {
        match self {
            ScmObject::Fixnum(x) => Ok(*x),
            _ => Err(TypeMismatch::NotAFixnum),
        }
    }

    pub(crate) fn as_character(&self) -> Result<char, TypeMismatch> {
        match self {
            ScmObject::Character(c) => Ok(*c),
            _ => Err(TypeMismatch::NotACharacter),
        }
    }

    pub(crate) fn as_string(&self) -> Result<&str, TypeMismatch> {
        match self {
            ScmObject::String(s) => Ok(s),
            _ => Err(TypeMismatch::NotAString),
        }
    }

    pub(crate) fn as_pair(&self) -> Result<&Rc<Pair>, TypeMismatch> {
        match self {
            ScmObject::Pair(p) => Ok(p),
            _ => Err(TypeMismatch::NotAPair),
        }
    }

    pub(crate) fn as_symbol(&self) -> Result<&ScmSymbol, TypeMismatch> {
        match self {
            ScmObject::Symbol(s) => Ok(s),
            _ => Err(TypeMismatch::NotASymbol),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

/// A built-in procedure. The table in `core` declares one of these per
/// operation; arity is validated by the evaluator before `fn_ptr` runs, so
/// the host functions may index their argument slice freely within it.
pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&mut SymbolTable, &[ScmObject]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive procedure #<{}>", self.name)
    }
}

/// A compound procedure: parameter names, a list of body expressions, and
/// the environment in effect at the `lambda`. The environment is held by
/// reference, never copied, so `set!` in one closure is seen by siblings.
pub struct Lambda {
    pub parameters: Vec<ScmSymbol>,
    pub body: ScmObject,
    pub env: Rc<Environment>,
}

impl Lambda {
    pub(crate) fn arity(&self) -> Arity {
        Arity::exactly(self.parameters.len())
    }
}

impl fmt::Debug for Lambda {
    // Not derived because we skip env: the defining environment may well
    // contain this very procedure.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lambda{{parameters: ({}), body: {:?}}}",
            self.parameters.iter().join(" "),
            self.body
        )
    }
}

impl PartialEq for ScmObject {
    fn eq(&self, other: &Self) -> bool {
        use ScmObject::*;
        match (self, other) {
            (Fixnum(x), Fixnum(y)) => x == y,
            (Boolean(x), Boolean(y)) => x == y,
            (Character(x), Character(y)) => x == y,
            (String(x), String(y)) => x == y,
            (EmptyList, EmptyList) => true,
            (Symbol(x), Symbol(y)) => x == y,
            (Pair(x), Pair(y)) => {
                *x.car.borrow() == *y.car.borrow() && *x.cdr.borrow() == *y.cdr.borrow()
            }
            (Primitive(x), Primitive(y)) => std::ptr::eq(*x, *y),
            (Lambda(x), Lambda(y)) => Rc::ptr_eq(x, y),
            (_, _) => false,
        }
    }
}

impl Eq for ScmObject {}
