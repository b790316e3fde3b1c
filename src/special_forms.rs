use crate::environment::Environment;
use crate::evaluator::{eval, Error, Result};
use crate::interpreter::Interpreter;
use crate::symbols::{ScmSymbol, Syntax};
use crate::types::{Arity, Lambda, ScmObject};
use std::rc::Rc;

#[derive(Debug)]
pub enum DefineError {
    NameNotASymbol,
}

#[derive(Debug)]
pub enum LambdaError {
    ParametersNotAList,
    ParameterNotASymbol,
}

#[derive(Debug)]
pub enum LetError {
    BindingsNotAList,
    BindingNotAPair,
}

#[derive(Debug)]
pub enum CondError {
    MisplacedElse,
    ClauseNotAList,
}

/// `(set! var value)`: evaluate, then mutate the nearest binding.
pub fn apply_set(interp: &mut Interpreter, args: &[ScmObject], env: &Rc<Environment>) -> Result {
    Arity::exactly(2)
        .validate_for(args.len(), "set!")
        .map_err(Error::BadArgCount)?;
    let key = args[0].as_symbol().map_err(Error::TypeMismatch)?.clone();
    let value = eval(interp, &args[1], env)?;
    env.set(&key, value).map_err(Error::UnboundVariable)?;
    Ok(ScmObject::Symbol(interp.syntax().ok.clone()))
}

/// `(define name value)`, or the shorthand `(define (name params...)
/// body...)` which binds `name` to a lambda over the remaining forms.
/// Always binds in the innermost frame.
pub fn apply_define(interp: &mut Interpreter, args: &[ScmObject], env: &Rc<Environment>) -> Result {
    Arity::at_least(2)
        .validate_for(args.len(), "define")
        .map_err(Error::BadArgCount)?;
    let (key, value_form) = match &args[0] {
        ScmObject::Symbol(name) => {
            Arity::exactly(2)
                .validate_for(args.len(), "define")
                .map_err(Error::BadArgCount)?;
            (name.clone(), args[1].clone())
        }
        ScmObject::Pair(header) => {
            let name = header
                .car
                .borrow()
                .as_symbol()
                .map_err(|_| Error::Define(DefineError::NameNotASymbol))?
                .clone();
            let parameters = header.cdr.borrow().clone();
            let body = ScmObject::list_from_vec(args[1..].to_vec());
            (name, make_lambda(interp.syntax(), parameters, body))
        }
        _ => return Err(Error::Define(DefineError::NameNotASymbol)),
    };
    let value = eval(interp, &value_form, env)?;
    env.define(key, value);
    Ok(ScmObject::Symbol(interp.syntax().ok.clone()))
}

/// Build the expression `(lambda parameters . body)`.
pub(crate) fn make_lambda(syntax: &Syntax, parameters: ScmObject, body: ScmObject) -> ScmObject {
    ScmObject::cons(
        ScmObject::Symbol(syntax.lambda.clone()),
        ScmObject::cons(parameters, body),
    )
}

/// `(if predicate consequent [alternative])`. Only the true singleton
/// selects the consequent; a missing alternative yields `#f`. Returns the
/// chosen branch unevaluated so the caller's loop can tail-evaluate it.
pub fn apply_if(interp: &mut Interpreter, args: &[ScmObject], env: &Rc<Environment>) -> Result {
    Arity::Between(2..=3)
        .validate_for(args.len(), "if")
        .map_err(Error::BadArgCount)?;
    let condition = eval(interp, &args[0], env)?;
    if condition.is_true() {
        Ok(args[1].clone())
    } else if args.len() == 3 {
        Ok(args[2].clone())
    } else {
        Ok(ScmObject::Boolean(false))
    }
}

/// `(lambda (params...) body...)`: capture the current environment.
pub fn apply_lambda(args: &[ScmObject], env: &Rc<Environment>) -> Result {
    Arity::at_least(2)
        .validate_for(args.len(), "lambda")
        .map_err(Error::BadArgCount)?;
    let parameters = parse_parameters(&args[0])?;
    let body = ScmObject::list_from_vec(args[1..].to_vec());
    Ok(ScmObject::Lambda(Rc::new(Lambda {
        parameters,
        body,
        env: Rc::clone(env),
    })))
}

fn parse_parameters(form: &ScmObject) -> std::result::Result<Vec<ScmSymbol>, Error> {
    let items = form
        .to_proper_list()
        .or(Err(Error::Lambda(LambdaError::ParametersNotAList)))?;
    items
        .iter()
        .map(|obj| match obj {
            ScmObject::Symbol(s) => Ok(s.clone()),
            _ => Err(Error::Lambda(LambdaError::ParameterNotASymbol)),
        })
        .collect()
}

/// `(begin e1 ... en)`: evaluate all but the last for effect; the last is
/// handed back for the caller to tail-evaluate.
pub fn apply_begin(interp: &mut Interpreter, args: &[ScmObject], env: &Rc<Environment>) -> Result {
    Arity::at_least(1)
        .validate_for(args.len(), "begin")
        .map_err(Error::BadArgCount)?;
    let (last, init) = args.split_last().unwrap();
    for expr in init {
        eval(interp, expr, env)?;
    }
    Ok(last.clone())
}

/// Desugar `(cond clauses...)` into nested `if` forms. An `else` clause
/// must be last; a cond with no applicable clause is `#f`.
pub fn cond_to_if(syntax: &Syntax, clauses: &[ScmObject]) -> Result {
    let (first, rest) = match clauses.split_first() {
        None => return Ok(ScmObject::Boolean(false)),
        Some(split) => split,
    };
    let clause = first
        .to_proper_list()
        .or(Err(Error::Cond(CondError::ClauseNotAList)))?;
    let (test, actions) = match clause.split_first() {
        None => return Err(Error::Cond(CondError::ClauseNotAList)),
        Some(split) => split,
    };
    if is_else(syntax, test) {
        if rest.is_empty() {
            Ok(sequence_to_exp(syntax, actions))
        } else {
            Err(Error::Cond(CondError::MisplacedElse))
        }
    } else {
        Ok(make_if(
            syntax,
            test.clone(),
            sequence_to_exp(syntax, actions),
            cond_to_if(syntax, rest)?,
        ))
    }
}

fn is_else(syntax: &Syntax, test: &ScmObject) -> bool {
    matches!(test, ScmObject::Symbol(s) if *s == syntax.else_)
}

/// One expression stays bare; several get an implicit `begin`.
fn sequence_to_exp(syntax: &Syntax, seq: &[ScmObject]) -> ScmObject {
    match seq {
        [] => ScmObject::EmptyList,
        [single] => single.clone(),
        _ => ScmObject::cons(
            ScmObject::Symbol(syntax.begin.clone()),
            ScmObject::list_from_vec(seq.to_vec()),
        ),
    }
}

fn make_if(
    syntax: &Syntax,
    predicate: ScmObject,
    consequent: ScmObject,
    alternative: ScmObject,
) -> ScmObject {
    ScmObject::list_from_vec(vec![
        ScmObject::Symbol(syntax.if_.clone()),
        predicate,
        consequent,
        alternative,
    ])
}

/// Desugar `(let ((name value)...) body...)` into the immediate
/// application of a lambda over the binding names.
pub fn let_to_application(syntax: &Syntax, args: &[ScmObject]) -> Result {
    Arity::at_least(2)
        .validate_for(args.len(), "let")
        .map_err(Error::BadArgCount)?;
    let bindings = args[0]
        .to_proper_list()
        .or(Err(Error::Let(LetError::BindingsNotAList)))?;
    let mut names = Vec::with_capacity(bindings.len());
    let mut values = Vec::with_capacity(bindings.len());
    for binding in &bindings {
        match binding.to_proper_list().ok().as_deref() {
            Some([name, value]) => {
                names.push(name.clone());
                values.push(value.clone());
            }
            _ => return Err(Error::Let(LetError::BindingNotAPair)),
        }
    }
    let operator = make_lambda(
        syntax,
        ScmObject::list_from_vec(names),
        ScmObject::list_from_vec(args[1..].to_vec()),
    );
    let mut application = Vec::with_capacity(values.len() + 1);
    application.push(operator);
    application.extend(values);
    Ok(ScmObject::list_from_vec(application))
}

/// The outcome of `and`/`or` up to their last operand: either the answer,
/// or the final operand for the caller to tail-evaluate.
pub(crate) enum ShortCircuit {
    Finished(ScmObject),
    EvaluateFurther(ScmObject),
}

/// `(and ...)`: stop at the first false operand. Empty is `#t`.
pub(crate) fn apply_and(
    interp: &mut Interpreter,
    args: &[ScmObject],
    env: &Rc<Environment>,
) -> std::result::Result<ShortCircuit, Error> {
    let (last, init) = match args.split_last() {
        None => return Ok(ShortCircuit::Finished(ScmObject::Boolean(true))),
        Some(split) => split,
    };
    for expr in init {
        let value = eval(interp, expr, env)?;
        if value.is_false() {
            return Ok(ShortCircuit::Finished(value));
        }
    }
    Ok(ShortCircuit::EvaluateFurther(last.clone()))
}

/// `(or ...)`: stop at the first operand that is not false. Empty is `#f`.
pub(crate) fn apply_or(
    interp: &mut Interpreter,
    args: &[ScmObject],
    env: &Rc<Environment>,
) -> std::result::Result<ShortCircuit, Error> {
    let (last, init) = match args.split_last() {
        None => return Ok(ShortCircuit::Finished(ScmObject::Boolean(false))),
        Some(split) => split,
    };
    for expr in init {
        let value = eval(interp, expr, env)?;
        if !value.is_false() {
            return Ok(ShortCircuit::Finished(value));
        }
    }
    Ok(ShortCircuit::EvaluateFurther(last.clone()))
}
