use crate::environment::Environment;
use crate::evaluator;
use crate::symbols::SymbolTable;
use crate::types::{Arity, PrimitiveFn, ScmInt, ScmObject};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

fn grab_fixnums(args: &[ScmObject]) -> evaluator::Result<Vec<ScmInt>> {
    let type_check: Result<Vec<_>, _> = args.iter().map(|o| o.as_fixnum()).collect();
    type_check.map_err(evaluator::Error::TypeMismatch)
}

// Arithmetic

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: sum_,
    arity: Arity::AtLeast(0..),
};

fn sum_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let value = grab_fixnums(args)?
        .iter()
        .fold(0 as ScmInt, |acc, &x| acc.wrapping_add(x));
    Ok(ScmObject::Fixnum(value))
}

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: sub_,
    arity: Arity::at_least(1),
};

// Folds from the first argument: (- 5) is 5, not -5.
fn sub_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let operands = grab_fixnums(args)?;
    let (first, rest) = operands.split_first().unwrap();
    let value = rest.iter().fold(*first, |acc, &x| acc.wrapping_sub(x));
    Ok(ScmObject::Fixnum(value))
}

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: mul_,
    arity: Arity::AtLeast(0..),
};

fn mul_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let value = grab_fixnums(args)?
        .iter()
        .fold(1 as ScmInt, |acc, &x| acc.wrapping_mul(x));
    Ok(ScmObject::Fixnum(value))
}

const QUOTIENT: PrimitiveFn = PrimitiveFn {
    name: "quotient",
    fn_ptr: quotient_,
    arity: Arity::exactly(2),
};

fn quotient_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    match grab_fixnums(args)?.as_slice() {
        [_, 0] => Err(evaluator::Error::DivideByZero),
        [x, y] => Ok(ScmObject::Fixnum(x.wrapping_div(*y))),
        _ => unreachable!(),
    }
}

const REMAINDER: PrimitiveFn = PrimitiveFn {
    name: "remainder",
    fn_ptr: remainder_,
    arity: Arity::exactly(2),
};

fn remainder_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    match grab_fixnums(args)?.as_slice() {
        [_, 0] => Err(evaluator::Error::DivideByZero),
        [x, y] => Ok(ScmObject::Fixnum(x.wrapping_rem(*y))),
        _ => unreachable!(),
    }
}

// Numeric comparisons. A chain shorter than two links holds no relation:
// the answer is #f, not an error.

fn monotone_(args: &[ScmObject], comp: fn(&ScmInt, &ScmInt) -> bool) -> evaluator::Result {
    let operands = grab_fixnums(args)?;
    let holds = operands.len() >= 2 && operands.windows(2).all(|w| comp(&w[0], &w[1]));
    Ok(ScmObject::Boolean(holds))
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |_symbols: &mut SymbolTable, args: &[ScmObject]| {
                    monotone_(args, ScmInt::[<$NAME:lower>])
                },
                arity: Arity::at_least(1),
            };
        }
    };
}

comparison_primitive!(=, EQ);
comparison_primitive!(<, LT);
comparison_primitive!(>, GT);

// Type predicates

const NULL_TEST: PrimitiveFn = PrimitiveFn {
    name: "null?",
    fn_ptr: null_test_,
    arity: Arity::exactly(1),
};
fn null_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(args[0], ScmObject::EmptyList)))
}

const BOOLEAN_TEST: PrimitiveFn = PrimitiveFn {
    name: "boolean?",
    fn_ptr: boolean_test_,
    arity: Arity::exactly(1),
};
fn boolean_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(args[0], ScmObject::Boolean(_))))
}

const SYMBOL_TEST: PrimitiveFn = PrimitiveFn {
    name: "symbol?",
    fn_ptr: symbol_test_,
    arity: Arity::exactly(1),
};
fn symbol_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(args[0], ScmObject::Symbol(_))))
}

const INTEGER_TEST: PrimitiveFn = PrimitiveFn {
    name: "integer?",
    fn_ptr: integer_test_,
    arity: Arity::exactly(1),
};
fn integer_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(args[0], ScmObject::Fixnum(_))))
}

const CHAR_TEST: PrimitiveFn = PrimitiveFn {
    name: "char?",
    fn_ptr: char_test_,
    arity: Arity::exactly(1),
};
fn char_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(
        args[0],
        ScmObject::Character(_)
    )))
}

const STRING_TEST: PrimitiveFn = PrimitiveFn {
    name: "string?",
    fn_ptr: string_test_,
    arity: Arity::exactly(1),
};
fn string_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(args[0], ScmObject::String(_))))
}

const PAIR_TEST: PrimitiveFn = PrimitiveFn {
    name: "pair?",
    fn_ptr: pair_test_,
    arity: Arity::exactly(1),
};
fn pair_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(args[0], ScmObject::Pair(_))))
}

const PROCEDURE_TEST: PrimitiveFn = PrimitiveFn {
    name: "procedure?",
    fn_ptr: procedure_test_,
    arity: Arity::exactly(1),
};
fn procedure_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(matches!(
        args[0],
        ScmObject::Primitive(_) | ScmObject::Lambda(_)
    )))
}

// Working with pairs and lists

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
};
fn cons_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::cons(args[0].clone(), args[1].clone()))
}

const CAR: PrimitiveFn = PrimitiveFn {
    name: "car",
    fn_ptr: car_,
    arity: Arity::exactly(1),
};
fn car_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let pair = args[0].as_pair().map_err(evaluator::Error::TypeMismatch)?;
    let car = pair.car.borrow().clone();
    Ok(car)
}

const CDR: PrimitiveFn = PrimitiveFn {
    name: "cdr",
    fn_ptr: cdr_,
    arity: Arity::exactly(1),
};
fn cdr_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let pair = args[0].as_pair().map_err(evaluator::Error::TypeMismatch)?;
    let cdr = pair.cdr.borrow().clone();
    Ok(cdr)
}

const SET_CAR: PrimitiveFn = PrimitiveFn {
    name: "set-car!",
    fn_ptr: set_car_,
    arity: Arity::exactly(2),
};
fn set_car_(symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let pair = args[0].as_pair().map_err(evaluator::Error::TypeMismatch)?;
    *pair.car.borrow_mut() = args[1].clone();
    Ok(ScmObject::Symbol(symbols.intern("ok")))
}

const SET_CDR: PrimitiveFn = PrimitiveFn {
    name: "set-cdr!",
    fn_ptr: set_cdr_,
    arity: Arity::exactly(2),
};
fn set_cdr_(symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let pair = args[0].as_pair().map_err(evaluator::Error::TypeMismatch)?;
    *pair.cdr.borrow_mut() = args[1].clone();
    Ok(ScmObject::Symbol(symbols.intern("ok")))
}

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: list_,
    arity: Arity::at_least(0),
};
fn list_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::list_from_vec(args.to_vec()))
}

// Identity comparison: scalars by payload, pairs and procedures by
// reference. Stays well-defined on cyclic structures.

const EQ_TEST: PrimitiveFn = PrimitiveFn {
    name: "eq?",
    fn_ptr: eq_test_,
    arity: Arity::exactly(2),
};
fn eq_test_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    Ok(ScmObject::Boolean(identical(&args[0], &args[1])))
}

fn identical(x: &ScmObject, y: &ScmObject) -> bool {
    use ScmObject::*;
    match (x, y) {
        (Fixnum(a), Fixnum(b)) => a == b,
        (Boolean(a), Boolean(b)) => a == b,
        (Character(a), Character(b)) => a == b,
        (String(a), String(b)) => a == b,
        (EmptyList, EmptyList) => true,
        (Symbol(a), Symbol(b)) => a == b,
        (Pair(a), Pair(b)) => Rc::ptr_eq(a, b),
        (Primitive(a), Primitive(b)) => std::ptr::eq(*a, *b),
        (Lambda(a), Lambda(b)) => Rc::ptr_eq(a, b),
        (_, _) => false,
    }
}

// Conversions

const CHAR_TO_INTEGER: PrimitiveFn = PrimitiveFn {
    name: "char->integer",
    fn_ptr: char_to_integer_,
    arity: Arity::exactly(1),
};
fn char_to_integer_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let c = args[0]
        .as_character()
        .map_err(evaluator::Error::TypeMismatch)?;
    Ok(ScmObject::Fixnum(c as ScmInt))
}

const INTEGER_TO_CHAR: PrimitiveFn = PrimitiveFn {
    name: "integer->char",
    fn_ptr: integer_to_char_,
    arity: Arity::exactly(1),
};
fn integer_to_char_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let code = args[0].as_fixnum().map_err(evaluator::Error::TypeMismatch)?;
    u32::try_from(code)
        .ok()
        .and_then(std::char::from_u32)
        .map(ScmObject::Character)
        .ok_or(evaluator::Error::BadCharacterCode(code))
}

const NUMBER_TO_STRING: PrimitiveFn = PrimitiveFn {
    name: "number->string",
    fn_ptr: number_to_string_,
    arity: Arity::exactly(1),
};
fn number_to_string_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let n = args[0].as_fixnum().map_err(evaluator::Error::TypeMismatch)?;
    Ok(ScmObject::String(n.to_string()))
}

const STRING_TO_NUMBER: PrimitiveFn = PrimitiveFn {
    name: "string->number",
    fn_ptr: string_to_number_,
    arity: Arity::exactly(1),
};
fn string_to_number_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let s = args[0].as_string().map_err(evaluator::Error::TypeMismatch)?;
    s.parse::<ScmInt>()
        .map(ScmObject::Fixnum)
        .or(Err(evaluator::Error::NumberParse(s.to_string())))
}

const SYMBOL_TO_STRING: PrimitiveFn = PrimitiveFn {
    name: "symbol->string",
    fn_ptr: symbol_to_string_,
    arity: Arity::exactly(1),
};
fn symbol_to_string_(_symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let symbol = args[0].as_symbol().map_err(evaluator::Error::TypeMismatch)?;
    Ok(ScmObject::String(symbol.to_string()))
}

const STRING_TO_SYMBOL: PrimitiveFn = PrimitiveFn {
    name: "string->symbol",
    fn_ptr: string_to_symbol_,
    arity: Arity::exactly(1),
};
fn string_to_symbol_(symbols: &mut SymbolTable, args: &[ScmObject]) -> evaluator::Result {
    let s = args[0].as_string().map_err(evaluator::Error::TypeMismatch)?;
    Ok(ScmObject::Symbol(symbols.intern(s)))
}

static PRIMITIVES: [PrimitiveFn; 29] = [
    // Arithmetic
    SUM,
    SUB,
    MUL,
    QUOTIENT,
    REMAINDER,
    // Comparisons
    EQ,
    LT,
    GT,
    // Type predicates
    NULL_TEST,
    BOOLEAN_TEST,
    SYMBOL_TEST,
    INTEGER_TEST,
    CHAR_TEST,
    STRING_TEST,
    PAIR_TEST,
    PROCEDURE_TEST,
    // Pairs and lists
    CONS,
    CAR,
    CDR,
    SET_CAR,
    SET_CDR,
    LIST,
    // Identity
    EQ_TEST,
    // Conversions
    CHAR_TO_INTEGER,
    INTEGER_TO_CHAR,
    NUMBER_TO_STRING,
    STRING_TO_NUMBER,
    SYMBOL_TO_STRING,
    STRING_TO_SYMBOL,
];

type Namespace = HashMap<&'static str, &'static PrimitiveFn>;

lazy_static! {
    pub static ref CORE: Namespace = {
        let mut map = Namespace::new();
        for func in PRIMITIVES.iter() {
            map.insert(func.name, func);
        }
        map
    };
}

/// Bind every primitive into `global` under its scheme name.
pub fn install(symbols: &mut SymbolTable, global: &Rc<Environment>) {
    for (&name, &func) in CORE.iter() {
        global.define(symbols.intern(name), ScmObject::Primitive(func));
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::Error;
    use crate::interpreter::{self, Interpreter};
    use crate::printer;
    use crate::types::{ScmObject, TypeMismatch};

    fn run(sources: &[&str]) -> std::result::Result<String, interpreter::Error> {
        let mut interp = Interpreter::new();
        let mut value = ScmObject::Boolean(false);
        for src in sources {
            value = interp.eval_str(src)?;
        }
        Ok(printer::pr_str(&value))
    }

    fn eval_err(sources: &[&str]) -> Error {
        match run(sources) {
            Err(interpreter::Error::Eval(e)) => e,
            other => panic!("expected an evaluation error, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run(&["(+)"]).unwrap(), "0");
        assert_eq!(run(&["(+ 1 2 3)"]).unwrap(), "6");
        assert_eq!(run(&["(- 5)"]).unwrap(), "5");
        assert_eq!(run(&["(- 10 1 2)"]).unwrap(), "7");
        assert_eq!(run(&["(*)"]).unwrap(), "1");
        assert_eq!(run(&["(* 2 3 4)"]).unwrap(), "24");
    }

    #[test]
    fn quotient_and_remainder_truncate_toward_zero() {
        assert_eq!(run(&["(quotient 7 2)"]).unwrap(), "3");
        assert_eq!(run(&["(quotient -7 2)"]).unwrap(), "-3");
        assert_eq!(run(&["(remainder 7 2)"]).unwrap(), "1");
        assert_eq!(run(&["(remainder -7 2)"]).unwrap(), "-1");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(
            eval_err(&["(quotient 1 0)"]),
            Error::DivideByZero
        ));
        assert!(matches!(
            eval_err(&["(remainder 1 0)"]),
            Error::DivideByZero
        ));
    }

    #[test]
    fn arithmetic_requires_fixnums() {
        assert!(matches!(
            eval_err(&["(+ 1 #t)"]),
            Error::TypeMismatch(TypeMismatch::NotAFixnum)
        ));
    }

    #[test]
    fn comparison_chains() {
        assert_eq!(run(&["(= 1 1 1)"]).unwrap(), "#t");
        assert_eq!(run(&["(= 1 2)"]).unwrap(), "#f");
        assert_eq!(run(&["(< 1 2 3)"]).unwrap(), "#t");
        assert_eq!(run(&["(< 1 3 2)"]).unwrap(), "#f");
        assert_eq!(run(&["(> 3 2 1)"]).unwrap(), "#t");
        assert_eq!(run(&["(> 1 2)"]).unwrap(), "#f");
    }

    #[test]
    fn a_single_operand_comparison_is_false_not_an_error() {
        assert_eq!(run(&["(= 1)"]).unwrap(), "#f");
        assert_eq!(run(&["(< 1)"]).unwrap(), "#f");
        assert_eq!(run(&["(> 1)"]).unwrap(), "#f");
    }

    #[test]
    fn type_predicates() {
        assert_eq!(run(&["(null? '())"]).unwrap(), "#t");
        assert_eq!(run(&["(null? '(1))"]).unwrap(), "#f");
        assert_eq!(run(&["(boolean? #f)"]).unwrap(), "#t");
        assert_eq!(run(&["(symbol? 'a)"]).unwrap(), "#t");
        assert_eq!(run(&["(symbol? \"a\")"]).unwrap(), "#f");
        assert_eq!(run(&["(integer? 1)"]).unwrap(), "#t");
        assert_eq!(run(&["(char? #\\a)"]).unwrap(), "#t");
        assert_eq!(run(&["(string? \"a\")"]).unwrap(), "#t");
        assert_eq!(run(&["(pair? '(1))"]).unwrap(), "#t");
        assert_eq!(run(&["(pair? '())"]).unwrap(), "#f");
        assert_eq!(run(&["(procedure? car)"]).unwrap(), "#t");
        assert_eq!(run(&["(procedure? (lambda (x) x))"]).unwrap(), "#t");
        assert_eq!(run(&["(procedure? 'car)"]).unwrap(), "#f");
    }

    #[test]
    fn pair_operations() {
        assert_eq!(run(&["(cons 1 2)"]).unwrap(), "(1 . 2)");
        assert_eq!(run(&["(car '(1 2))"]).unwrap(), "1");
        assert_eq!(run(&["(cdr '(1 2))"]).unwrap(), "(2)");
        assert_eq!(run(&["(list 1 2 3)"]).unwrap(), "(1 2 3)");
        assert_eq!(run(&["(list)"]).unwrap(), "()");
    }

    #[test]
    fn car_of_a_non_pair_is_a_type_error() {
        assert!(matches!(
            eval_err(&["(car 5)"]),
            Error::TypeMismatch(TypeMismatch::NotAPair)
        ));
        assert!(matches!(
            eval_err(&["(cdr '())"]),
            Error::TypeMismatch(TypeMismatch::NotAPair)
        ));
    }

    #[test]
    fn mutators_return_ok_and_write_through() {
        assert_eq!(
            run(&["(define p '(1 2))", "(set-car! p 9)"]).unwrap(),
            "ok"
        );
        assert_eq!(
            run(&["(define p '(1 2))", "(set-cdr! p '(8))", "p"]).unwrap(),
            "(1 8)"
        );
    }

    #[test]
    fn eq_compares_scalars_by_payload() {
        assert_eq!(run(&["(eq? 1 1)"]).unwrap(), "#t");
        assert_eq!(run(&["(eq? 1 2)"]).unwrap(), "#f");
        assert_eq!(run(&["(eq? 'a 'a)"]).unwrap(), "#t");
        assert_eq!(run(&["(eq? #\\a #\\a)"]).unwrap(), "#t");
        assert_eq!(run(&["(eq? \"a\" \"a\")"]).unwrap(), "#t");
        assert_eq!(run(&["(eq? '() '())"]).unwrap(), "#t");
    }

    #[test]
    fn eq_is_false_across_variants() {
        assert_eq!(run(&["(eq? 97 #\\a)"]).unwrap(), "#f");
        assert_eq!(run(&["(eq? 1 \"1\")"]).unwrap(), "#f");
        assert_eq!(run(&["(eq? 'a \"a\")"]).unwrap(), "#f");
    }

    #[test]
    fn eq_compares_pairs_by_reference() {
        assert_eq!(run(&["(eq? '(1) '(1))"]).unwrap(), "#f");
        assert_eq!(run(&["(define p '(1))", "(eq? p p)"]).unwrap(), "#t");
    }

    #[test]
    fn character_conversions() {
        assert_eq!(run(&["(char->integer #\\a)"]).unwrap(), "97");
        assert_eq!(run(&["(integer->char 97)"]).unwrap(), "#\\a");
        assert_eq!(
            run(&["(char->integer #\\newline)"]).unwrap(),
            "10"
        );
        assert!(matches!(
            eval_err(&["(integer->char -1)"]),
            Error::BadCharacterCode(-1)
        ));
    }

    #[test]
    fn number_string_conversions() {
        assert_eq!(run(&["(number->string 42)"]).unwrap(), "\"42\"");
        assert_eq!(run(&["(string->number \"42\")"]).unwrap(), "42");
        assert_eq!(run(&["(string->number \"-7\")"]).unwrap(), "-7");
        assert!(matches!(
            eval_err(&["(string->number \"fish\")"]),
            Error::NumberParse(_)
        ));
    }

    #[test]
    fn symbol_string_conversions_preserve_identity() {
        assert_eq!(run(&["(symbol->string 'abc)"]).unwrap(), "\"abc\"");
        assert_eq!(run(&["(string->symbol \"abc\")"]).unwrap(), "abc");
        // A converted symbol is the interned symbol.
        assert_eq!(
            run(&["(eq? (string->symbol \"abc\") 'abc)"]).unwrap(),
            "#t"
        );
    }

    #[test]
    fn arity_violations_are_reported() {
        assert!(matches!(eval_err(&["(cons 1)"]), Error::BadArgCount(_)));
        assert!(matches!(
            eval_err(&["(car '(1) '(2))"]),
            Error::BadArgCount(_)
        ));
        assert!(matches!(eval_err(&["(-)"]), Error::BadArgCount(_)));
    }
}
