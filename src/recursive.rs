use std::rc::Rc;

use crate::{
    environment::Environment,
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::{Expr, Pair},
    procedure::Procedure,
    special::{self, Definition, Keyword},
};


/// Tree-walking evaluator. Every sub-expression is a host call, so nesting
/// and recursion depth are bounded by the host stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursiveEvaluator;

impl Evaluator for RecursiveEvaluator {
    fn eval(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Expr> {
        evaluate(expr, env)
    }
}

pub(crate) fn evaluate(expr: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    match expr {
        Expr::Symbol(symbol) => environment.get(symbol),
        Expr::Keyword(keyword) => Err(SchemeError::syntax(format!("keyword {} used as an expression", keyword.name()))),
        Expr::Pair(form) if expr.is_list() => evaluate_form(form, expr, environment),
        // Every other atom, and improper pairs, evaluate to themselves
        other => Ok(other.clone()),
    }
}

fn evaluate_form(form: &Rc<Pair>, expr: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    let operands = form.cdr();
    match form.car() {
        Expr::Keyword(Keyword::Quote) => special::quotation(&operands),
        Expr::Keyword(Keyword::If) => evaluate_if(&operands, environment),
        Expr::Keyword(Keyword::Define) => evaluate_define(&operands, environment),
        Expr::Keyword(Keyword::Set) => evaluate_set_bang(&operands, environment),
        Expr::Keyword(Keyword::Lambda) => special::lambda(&operands, environment),
        Expr::Keyword(Keyword::Let) => evaluate(&special::let_application(&operands, environment)?, environment),
        Expr::Keyword(Keyword::Cond) => evaluate_cond(&operands, environment),
        Expr::Keyword(Keyword::And) => evaluate_and(&operands, environment),
        Expr::Keyword(Keyword::Or) => evaluate_or(&operands, environment),
        Expr::Keyword(Keyword::Begin) => evaluate_body(&operands, environment),
        Expr::Keyword(Keyword::Else) => Err(SchemeError::syntax("else outside of cond")),
        _ => evaluate_application(expr, environment),
    }
}

fn evaluate_application(form: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    // Operator and operands are evaluated left to right before the call
    let mut values = form.iter()
        .map(|item| evaluate(&item, environment))
        .collect::<Result<Vec<Expr>>>()?
        .into_iter();

    match values.next() {
        Some(procedure) => apply_procedure(&procedure, values.collect()),
        None => Err(SchemeError::evaluation("cannot evaluate an empty application")),
    }
}

pub(crate) fn apply_procedure(procedure: &Expr, args: Vec<Expr>) -> Result<Expr> {
    match procedure {
        Expr::Procedure(Procedure::Native(native)) => native.call(&args, &RecursiveEvaluator),
        Expr::Procedure(Procedure::Closure(closure)) => {
            let frame = closure.bind_arguments(args)?;
            evaluate_body(&closure.body, &frame)
        }
        other => Err(SchemeError::evaluation(format!("not a procedure: {}", other))),
    }
}

/// Evaluates each expression in order and returns the last value.
fn evaluate_body(body: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    body.iter().try_fold(Expr::Void, |_, expr| evaluate(&expr, environment))
}

fn evaluate_if(operands: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    let (test, consequent, alternate) = special::conditional(operands)?;
    if evaluate(&test.car(), environment)?.is_true() {
        evaluate(&consequent, environment)
    } else {
        match alternate {
            Some(alternate) => evaluate(&alternate, environment),
            None => Ok(Expr::Void),
        }
    }
}

fn evaluate_cond(operands: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    for clause in operands.iter() {
        let clause = special::cond_clause(&clause)?;
        let test = match clause.car() {
            Expr::Keyword(Keyword::Else) => Expr::Boolean(true),
            test => evaluate(&test, environment)?,
        };
        if test.is_true() {
            let body = clause.cdr();
            return if body.is_nil() { Ok(test) } else { evaluate_body(&body, environment) };
        }
    }
    Ok(Expr::Boolean(false))
}

fn evaluate_and(operands: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    let mut result = Expr::Boolean(true);
    for operand in operands.iter() {
        result = evaluate(&operand, environment)?;
        if !result.is_true() {
            return Ok(Expr::Boolean(false));
        }
    }
    Ok(result)
}

fn evaluate_or(operands: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    for operand in operands.iter() {
        let value = evaluate(&operand, environment)?;
        if value.is_true() {
            return Ok(value);
        }
    }
    Ok(Expr::Boolean(false))
}

fn evaluate_define(operands: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    match special::definition(operands, environment)? {
        Definition::Procedure(name, closure) => Ok(environment.bind(name, closure)),
        Definition::Variable(name, value) => {
            let value = evaluate(&value.car(), environment)?;
            Ok(environment.bind(name, value))
        }
    }
}

fn evaluate_set_bang(operands: &Expr, environment: &Rc<Environment>) -> Result<Expr> {
    let (name, value) = special::assignment(operands)?;
    let value = evaluate(&value.car(), environment)?;
    environment.set(&name, value)
}

#[cfg(test)]
mod tests {
    use crate::{builtin::standard_environment, parser::parse_all};

    use super::*;

    fn run(source: &str) -> Result<Expr> {
        let environment = standard_environment(&RecursiveEvaluator)?;
        parse_all(source)?.iter().try_fold(Expr::Void, |_, expr| evaluate(expr, &environment))
    }

    #[test]
    fn arithmetic() -> Result<()> {
        assert_eq!(run("(+ 1 2)")?.to_string(), "3");
        assert_eq!(run("(+ 3 (+ 1 2) 4)")?.to_string(), "10");
        Ok(())
    }

    #[test]
    fn closures_capture_their_environment() -> Result<()> {
        let source = "
            (define (make-counter)
              (let ((n 0))
                (lambda () (set! n (+ n 1)) n)))
            (define c (make-counter))
            (c) (c)
            (c)";
        assert_eq!(run(source)?.to_string(), "3");
        Ok(())
    }

    #[test]
    fn variadic_closures() -> Result<()> {
        assert_eq!(run("((lambda (a . rest) (cons a rest)) 1 2 3)")?.to_string(), "(1 2 3)");
        assert_eq!(run("((lambda args args))")?.to_string(), "()");
        Ok(())
    }

    #[test]
    fn let_binds_simultaneously() -> Result<()> {
        assert_eq!(run("(define x 1) (let ((x 10) (y x)) y)")?.to_string(), "1");
        Ok(())
    }

    #[test]
    fn named_let_loops() -> Result<()> {
        assert_eq!(run("(let loop ((i 0) (acc 1)) (if (= i 5) acc (loop (+ i 1) (* acc 2))))")?.to_string(), "32");
        Ok(())
    }

    #[test]
    fn failures() {
        assert!(matches!(run("(1 2)"), Err(SchemeError::Evaluation { .. })));
        assert!(matches!(run("(set! never-defined 1)"), Err(SchemeError::UnboundVariable { .. })));
        assert!(matches!(run("((lambda (x) x))"), Err(SchemeError::Evaluation { .. })));
        assert!(matches!(run("(if)"), Err(SchemeError::Syntax(_))));
    }
}
