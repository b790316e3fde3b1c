use crate::environment::{self, Environment};
use crate::interpreter::Interpreter;
use crate::special_forms::{self, ShortCircuit};
use crate::types::{self, Arity, Lambda, PrimitiveFn, ScmInt, ScmObject, TypeMismatch};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

pub type Result<T = ScmObject> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnboundVariable(environment::UnboundVariable),
    Define(special_forms::DefineError),
    Lambda(special_forms::LambdaError),
    Let(special_forms::LetError),
    Cond(special_forms::CondError),
    TypeMismatch(types::TypeMismatch),
    BadArgCount(types::BadArgCount),
    NotApplicable(ScmObject),
    CannotEvaluate(&'static str),
    DivideByZero,
    BadCharacterCode(ScmInt),
    NumberParse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnboundVariable(e) => write!(f, "{}", e),
            Error::Define(e) => write!(f, "define: {:?}", e),
            Error::Lambda(e) => write!(f, "lambda: {:?}", e),
            Error::Let(e) => write!(f, "let: {:?}", e),
            Error::Cond(special_forms::CondError::MisplacedElse) => {
                write!(f, "cond: else clause is not last")
            }
            Error::Cond(e) => write!(f, "cond: {:?}", e),
            Error::TypeMismatch(e) => write!(f, "type mismatch: {:?}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::NotApplicable(obj) => write!(f, "cannot apply non-procedure {}", obj),
            Error::CannotEvaluate(kind) => write!(f, "cannot evaluate {} expression", kind),
            Error::DivideByZero => write!(f, "cannot divide by zero!"),
            Error::BadCharacterCode(n) => write!(f, "{} is not a character code", n),
            Error::NumberParse(s) => write!(f, "cannot parse '{}' as a number", s),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

/// Evaluate `orig_ast` in `orig_env`.
///
/// The loop rebinds `(ast, env)` instead of recursing wherever a form ends
/// in the value of a sub-expression (`if`/`cond` branches, the last
/// expression of a `begin` or procedure body, `let` expansions), so tail
/// calls in evaluated programs do not consume host stack. Everything else
/// (operand evaluation, nested forms) recurses and is bounded by expression
/// depth.
pub fn eval(interp: &mut Interpreter, orig_ast: &ScmObject, orig_env: &Rc<Environment>) -> Result {
    use ScmObject::{
        Boolean, Character, EmptyList, Fixnum, Lambda, Pair, Primitive, String, Symbol,
    };
    let syntax = interp.syntax().clone();
    let mut ast = orig_ast.clone();
    let mut env = Rc::clone(orig_env);
    loop {
        match &ast {
            Fixnum(_) | Boolean(_) | Character(_) | String(_) => return Ok(ast.clone()),
            Symbol(name) => return env.fetch(name).map_err(Error::UnboundVariable),
            Pair(_) => {
                log::trace!("apply ({})", &ast);
                let argv = ast.to_proper_list().map_err(Error::TypeMismatch)?;
                if let Symbol(name) = &argv[0] {
                    if *name == syntax.quote {
                        Arity::exactly(1)
                            .validate_for(argv[1..].len(), "quote")
                            .map_err(Error::BadArgCount)?;
                        return Ok(argv[1].clone());
                    } else if *name == syntax.set {
                        return special_forms::apply_set(interp, &argv[1..], &env);
                    } else if *name == syntax.define {
                        let result = special_forms::apply_define(interp, &argv[1..], &env);
                        if result.is_ok() {
                            log::debug!("define {}", argv[1]);
                        }
                        return result;
                    } else if *name == syntax.if_ {
                        ast = special_forms::apply_if(interp, &argv[1..], &env)?;
                        continue;
                    } else if *name == syntax.lambda {
                        return special_forms::apply_lambda(&argv[1..], &env);
                    } else if *name == syntax.begin {
                        ast = special_forms::apply_begin(interp, &argv[1..], &env)?;
                        continue;
                    } else if *name == syntax.cond {
                        ast = special_forms::cond_to_if(&syntax, &argv[1..])?;
                        continue;
                    } else if *name == syntax.let_ {
                        ast = special_forms::let_to_application(&syntax, &argv[1..])?;
                        continue;
                    } else if *name == syntax.and {
                        match special_forms::apply_and(interp, &argv[1..], &env)? {
                            ShortCircuit::Finished(value) => return Ok(value),
                            ShortCircuit::EvaluateFurther(last) => {
                                ast = last;
                                continue;
                            }
                        }
                    } else if *name == syntax.or {
                        match special_forms::apply_or(interp, &argv[1..], &env)? {
                            ShortCircuit::Finished(value) => return Ok(value),
                            ShortCircuit::EvaluateFurther(last) => {
                                ast = last;
                                continue;
                            }
                        }
                    }
                }
                let evaluated = evaluate_sequence_elementwise(interp, &argv, &env)?;
                let (callable, args) = evaluated.split_first().unwrap();
                match callable {
                    Primitive(func) => return call_primitive(interp, func, args),
                    Lambda(func) => {
                        env = make_procedure_env(func, args)?;
                        // A procedure body is a sequence: run (begin . body).
                        ast = ScmObject::cons(
                            ScmObject::Symbol(syntax.begin.clone()),
                            func.body.clone(),
                        );
                        continue;
                    }
                    _ => return Err(Error::NotApplicable(callable.clone())),
                }
            }
            EmptyList | Primitive(_) | Lambda(_) => {
                return Err(Error::CannotEvaluate(ast.type_name()))
            }
        }
    }
}

pub fn evaluate_sequence_elementwise(
    interp: &mut Interpreter,
    seq: &[ScmObject],
    env: &Rc<Environment>,
) -> std::result::Result<Vec<ScmObject>, Error> {
    seq.iter().map(|obj| eval(interp, obj, env)).collect()
}

pub(crate) fn pretty_print_args(args: &[ScmObject]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => args.iter().join(" "),
    }
}

pub(crate) fn call_primitive(
    interp: &mut Interpreter,
    func: &PrimitiveFn,
    args: &[ScmObject],
) -> Result {
    func.arity
        .validate_for(args.len(), func.name)
        .map_err(Error::BadArgCount)?;
    log::trace!("call {} with {}", func.name, pretty_print_args(args));
    let result = (func.fn_ptr)(interp.symbols_mut(), args);
    match &result {
        Ok(value) => log::trace!("call to {} resulted in {}", func.name, value),
        Err(e) => log::trace!("call to {} failed: {}", func.name, e),
    }
    result
}

fn make_procedure_env(func: &Lambda, args: &[ScmObject]) -> Result<Rc<Environment>> {
    func.arity()
        .validate_for(args.len(), "compound procedure")
        .map_err(Error::BadArgCount)?;
    let env = Environment::spawn_from(&func.env);
    for (key, value) in func.parameters.iter().zip(args) {
        env.define(key.clone(), value.clone());
    }
    Ok(env)
}
