use crate::environment::Environment;
use crate::symbols::{SymbolTable, Syntax};
use crate::types::ScmObject;
use crate::{core, evaluator, printer, reader};
use std::fmt;
use std::rc::Rc;

pub type Result<T = ScmObject> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "syntax error: {}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

/// One self-contained interpreter: its own symbol table, pre-interned
/// syntax tags, and global environment with the primitives installed.
/// Instances share no state, so they can coexist and be tested in
/// isolation.
pub struct Interpreter {
    symbols: SymbolTable,
    syntax: Syntax,
    global: Rc<Environment>,
}

impl Default for Interpreter {
    fn default() -> Self {
        let mut symbols = SymbolTable::default();
        let syntax = Syntax::intern_in(&mut symbols);
        let global = Environment::global();
        core::install(&mut symbols, &global);
        Interpreter {
            symbols,
            syntax,
            global,
        }
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub(crate) fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn global(&self) -> &Rc<Environment> {
        &self.global
    }

    /// Parse one datum from `input`.
    pub fn read(&mut self, input: &str) -> Result {
        reader::read_str(input, &mut self.symbols).map_err(Error::Read)
    }

    /// Evaluate an expression in the global environment.
    pub fn eval(&mut self, expr: &ScmObject) -> Result {
        let env = Rc::clone(&self.global);
        evaluator::eval(self, expr, &env).map_err(Error::Eval)
    }

    /// Evaluate an expression in a given environment.
    pub fn eval_in(&mut self, expr: &ScmObject, env: &Rc<Environment>) -> Result {
        evaluator::eval(self, expr, env).map_err(Error::Eval)
    }

    pub fn eval_str(&mut self, input: &str) -> Result {
        let expr = self.read(input)?;
        self.eval(&expr)
    }

    /// Read-eval-print one line of input.
    pub fn rep(&mut self, line: &str) -> Result<String> {
        self.eval_str(line).map(|value| printer::pr_str(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_round_trips_a_line() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.rep("(+ 1 2)").unwrap(), "3");
    }

    #[test]
    fn read_errors_are_distinguished_from_eval_errors() {
        let mut interp = Interpreter::new();
        assert!(matches!(interp.rep("(+ 1"), Err(Error::Read(_))));
        assert!(matches!(interp.rep("(+ 1 'x)"), Err(Error::Eval(_))));
    }

    #[test]
    fn instances_are_isolated() {
        let mut a = Interpreter::new();
        let mut b = Interpreter::new();
        a.rep("(define x 1)").unwrap();
        assert_eq!(a.rep("x").unwrap(), "1");
        assert!(matches!(b.rep("x"), Err(Error::Eval(_))));
    }

    #[test]
    fn definitions_persist_across_lines() {
        let mut interp = Interpreter::new();
        interp.rep("(define (square n) (* n n))").unwrap();
        assert_eq!(interp.rep("(square 12)").unwrap(), "144");
    }

    #[test]
    fn an_expression_error_leaves_the_interpreter_usable() {
        let mut interp = Interpreter::new();
        assert!(interp.rep("(car 5)").is_err());
        assert_eq!(interp.rep("(car '(1 2))").unwrap(), "1");
    }
}
