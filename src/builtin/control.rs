use itertools::Itertools;

use crate::{
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::Expr,
    procedure::Arity,
};

use super::{boolean, type_error, Builtin};


pub(super) const BUILTINS: &[Builtin] = &[
    ("procedure?", Arity::Exact(1), builtin_is_procedure),
    ("apply", Arity::AtLeast(1), builtin_apply),
    ("error", Arity::AtLeast(1), builtin_error),
];

fn builtin_is_procedure(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Procedure(_)))
}

/// `(apply f a b '(c d))` calls `f` with `a b c d`.
fn builtin_apply(values: &[Expr], evaluator: &dyn Evaluator) -> Result<Expr> {
    let procedure = &values[0];
    if !matches!(procedure, Expr::Procedure(_)) {
        return Err(type_error("apply", "a procedure", procedure));
    }

    let mut args = vec![];
    if let Some((spread, leading)) = values[1..].split_last() {
        if !spread.is_list() {
            return Err(type_error("apply", "a proper list as the last argument", spread));
        }
        args.extend(leading.iter().cloned());
        args.extend(spread.iter());
    }
    evaluator.apply(procedure, &args)
}

/// Raises an evaluation failure: the message is displayed, irritants written.
fn builtin_error(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let message = std::iter::once(values[0].display().to_string())
        .chain(values[1..].iter().map(Expr::to_string))
        .join(" ");
    Err(SchemeError::evaluation(message))
}

#[cfg(test)]
mod tests {
    use crate::{builtin::tests::run, error::SchemeError};

    #[test]
    fn apply_spreads_the_last_argument() -> anyhow::Result<()> {
        assert_eq!(run("(apply + 1 2 '(3 4))")?, "10");
        assert_eq!(run("(apply list '())")?, "()");
        assert_eq!(run("(apply (lambda args args) 'a '(b))")?, "(a b)");
        // Arguments are values and are not evaluated a second time
        assert_eq!(run("(apply car '((quote x)))")?, "quote");
        assert_eq!(run("(apply list '(x (+ 1 2)))")?, "(x (+ 1 2))");
        Ok(())
    }

    #[test]
    fn procedures() -> anyhow::Result<()> {
        assert_eq!(run("(procedure? car)")?, "#t");
        assert_eq!(run("(procedure? (lambda () 1))")?, "#t");
        assert_eq!(run("(procedure? 'car)")?, "#f");
        Ok(())
    }

    #[test]
    fn errors_carry_their_message() {
        match run("(error \"bad thing:\" 'x \"y\" 3)") {
            Err(SchemeError::Evaluation { message, .. }) => assert_eq!(message, "bad thing: x \"y\" 3"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(run("(apply 1 '())").is_err());
        assert!(run("(apply + 1)").is_err());
    }
}
