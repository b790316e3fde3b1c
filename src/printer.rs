use crate::strings;
use crate::types::{Pair, ScmObject};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

/// Render an object in the reader's literal syntax, so that (for types with
/// a literal syntax) reading the output back produces an equal object.
pub fn pr_str(object: &ScmObject) -> String {
    object.to_string()
}

impl fmt::Display for ScmObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScmObject::Fixnum(value) => write!(f, "{}", value),
            ScmObject::Boolean(true) => write!(f, "#t"),
            ScmObject::Boolean(false) => write!(f, "#f"),
            ScmObject::Character(c) => write_character(f, *c),
            ScmObject::String(s) => write!(f, "{}", strings::string_repr(s)),
            ScmObject::EmptyList => write!(f, "()"),
            ScmObject::Pair(pair) => {
                write!(f, "(")?;
                write_pair(f, pair)?;
                write!(f, ")")
            }
            ScmObject::Symbol(name) => write!(f, "{}", name),
            ScmObject::Primitive(func) => write!(f, "#<procedure {}>", func.name),
            ScmObject::Lambda(lambda) => {
                write!(f, "#<procedure ({})>", lambda.parameters.iter().join(" "))
            }
        }
    }
}

fn write_character(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        '\n' => write!(f, "#\\newline"),
        ' ' => write!(f, "#\\space"),
        c => write!(f, "#\\{}", c),
    }
}

/// The shared tail rendering: elements separated by spaces, a non-list tail
/// spelled with a dot. Iterates; list length must not cost host stack.
fn write_pair(f: &mut fmt::Formatter<'_>, pair: &Rc<Pair>) -> fmt::Result {
    let mut pair = Rc::clone(pair);
    loop {
        write!(f, "{}", pair.car.borrow())?;
        let cdr = pair.cdr.borrow().clone();
        match cdr {
            ScmObject::Pair(rest) => {
                write!(f, " ")?;
                pair = rest;
            }
            ScmObject::EmptyList => return Ok(()),
            tail => return write!(f, " . {}", tail),
        }
    }
}
