//! Native procedures and the bootstrap of the global environment.

use std::rc::Rc;

use log::debug;

use crate::{
    environment::Environment,
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::{Expr, Symbol},
    number::Number,
    parser::parse_all,
    procedure::{Arity, Native, NativeFn, Procedure},
};

mod control;
mod io;
mod list;
mod numeric;
mod text;
mod vector;

/// A table entry: the global name, what it accepts, and the implementation.
type Builtin = (&'static str, Arity, NativeFn);

const PRELUDE: &str = include_str!("../prelude.scm");

fn register(environment: &Environment, table: &[Builtin]) {
    for &(name, arity, func) in table {
        let native = Native { name, arity, func };
        environment.bind(Symbol::new(name), Expr::Procedure(Procedure::Native(Rc::new(native))));
    }
}

/// A root frame holding only the natives.
pub fn native_environment() -> Rc<Environment> {
    let environment = Environment::new();
    for table in [numeric::BUILTINS, list::BUILTINS, text::BUILTINS, vector::BUILTINS, io::BUILTINS, control::BUILTINS] {
        register(&environment, table);
    }
    environment
}

/// A fresh global environment: the natives, then the prelude evaluated with
/// `evaluator`.
pub fn standard_environment(evaluator: &dyn Evaluator) -> Result<Rc<Environment>> {
    let environment = native_environment();
    load_prelude(&environment, evaluator)?;
    Ok(environment)
}

pub fn load_prelude(environment: &Rc<Environment>, evaluator: &dyn Evaluator) -> Result<()> {
    let program = parse_all(PRELUDE)?;
    debug!("Loading prelude ({} definitions)", program.len());
    for expr in &program {
        evaluator.eval(expr, environment)?;
    }
    Ok(())
}

fn type_error(name: &str, expected: &str, got: &Expr) -> SchemeError {
    SchemeError::evaluation(format!("{}: expected {}, got {}", name, expected, got))
}

fn number_arg(name: &str, value: &Expr) -> Result<Number> {
    match value {
        Expr::Number(number) => Ok(*number),
        other => Err(type_error(name, "a number", other)),
    }
}

fn integer_arg(name: &str, value: &Expr) -> Result<i64> {
    match value {
        Expr::Number(Number::Integer(integer)) => Ok(*integer),
        other => Err(type_error(name, "an integer", other)),
    }
}

/// A non-negative integer below `len`, or below or equal to it when
/// `inclusive` is set.
fn index_arg(name: &str, value: &Expr, len: usize, inclusive: bool) -> Result<usize> {
    let index = integer_arg(name, value)?;
    match usize::try_from(index) {
        Ok(index) if index < len || (inclusive && index == len) => Ok(index),
        _ => Err(SchemeError::evaluation(format!("{}: index {} out of range", name, index))),
    }
}

fn boolean(value: bool) -> Result<Expr> {
    Ok(Expr::Boolean(value))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::Strategy;

    use super::*;

    pub(super) fn run(source: &str) -> Result<String> {
        let mut last = Expr::Void;
        for strategy in [Strategy::Recursive, Strategy::Stack] {
            let evaluator = strategy.evaluator(16);
            let environment = standard_environment(evaluator.as_ref())?;
            let value = parse_all(source)?.iter()
                .try_fold(Expr::Void, |_, expr| evaluator.eval(expr, &environment))?;
            if strategy != Strategy::Recursive && !value.equal(&last) {
                return Err(SchemeError::evaluation(format!("evaluators disagree: {} and {}", last, value)));
            }
            last = value;
        }
        Ok(last.to_string())
    }

    #[test]
    fn every_table_is_registered() -> Result<()> {
        let environment = native_environment();
        for name in ["+", "cons", "string-append", "vector-ref", "display", "apply"] {
            assert!(environment.get(&Symbol::new(name)).is_ok(), "{} is missing", name);
        }
        assert!(environment.get(&Symbol::new("map")).is_err());
        Ok(())
    }

    #[test]
    fn prelude_is_loaded() -> Result<()> {
        assert_eq!(run("(map + '(1 2 3) '(10 20 30))")?, "(11 22 33)");
        assert_eq!(run("(filter (lambda (x) (> x 1)) '(1 2 3))")?, "(2 3)");
        assert_eq!(run("(foldl cons '() '(1 2 3))")?, "(3 2 1)");
        assert_eq!(run("(foldr cons '() '(1 2 3))")?, "(1 2 3)");
        assert_eq!(run("(reduce + 0 '(1 2 3 4))")?, "10");
        assert_eq!(run("(assq 'b '((a 1) (b 2)))")?, "(b 2)");
        assert_eq!(run("(assoc \"b\" '((\"a\" . 1) (\"b\" . 2)))")?, "(\"b\" . 2)");
        assert_eq!(run("(member '(1) '(0 (1) 2))")?, "((1) 2)");
        assert_eq!(run("(memq 'z '(a b))")?, "#f");
        assert_eq!(run("(list-ref '(a b c) 2)")?, "c");
        assert_eq!(run("(iota 4)")?, "(0 1 2 3)");
        assert_eq!(run("(iota 3 1 2)")?, "(1 3 5)");
        assert_eq!(run("(caddr '(1 2 3))")?, "3");
        assert_eq!(run("(for-each (lambda (x) x) '(1 2))")?, "#<void>");
        Ok(())
    }

    #[test]
    fn arity_is_checked_before_the_call() {
        assert!(matches!(run("(car)"), Err(SchemeError::Evaluation { .. })));
        assert!(matches!(run("(cons 1 2 3)"), Err(SchemeError::Evaluation { .. })));
    }
}
