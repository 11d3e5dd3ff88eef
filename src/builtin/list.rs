use crate::{
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::Expr,
    procedure::Arity,
};

use super::{boolean, index_arg, type_error, Builtin};


pub(super) const BUILTINS: &[Builtin] = &[
    ("cons", Arity::Exact(2), builtin_cons),
    ("car", Arity::Exact(1), builtin_car),
    ("cdr", Arity::Exact(1), builtin_cdr),
    ("set-car!", Arity::Exact(2), builtin_set_car),
    ("set-cdr!", Arity::Exact(2), builtin_set_cdr),
    ("list", Arity::AtLeast(0), builtin_list),
    ("length", Arity::Exact(1), builtin_length),
    ("append", Arity::AtLeast(0), builtin_append),
    ("reverse", Arity::Exact(1), builtin_reverse),
    ("list-tail", Arity::Exact(2), builtin_list_tail),
    ("null?", Arity::Exact(1), builtin_is_null),
    ("pair?", Arity::Exact(1), builtin_is_pair),
    ("list?", Arity::Exact(1), builtin_is_list),
    ("eq?", Arity::Exact(2), builtin_eqv),
    ("eqv?", Arity::Exact(2), builtin_eqv),
    ("equal?", Arity::Exact(2), builtin_equal),
    ("not", Arity::Exact(1), builtin_not),
];

fn proper_list(name: &str, value: &Expr) -> Result<Vec<Expr>> {
    match value.is_list() {
        true => Ok(value.iter().collect()),
        false => Err(type_error(name, "a proper list", value)),
    }
}

fn builtin_cons(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::cons(values[0].clone(), values[1].clone()))
}

fn builtin_car(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Pair(pair) => Ok(pair.car()),
        other => Err(type_error("car", "a pair", other)),
    }
}

fn builtin_cdr(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Pair(pair) => Ok(pair.cdr()),
        other => Err(type_error("cdr", "a pair", other)),
    }
}

fn builtin_set_car(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Pair(pair) => {
            pair.set_car(values[1].clone());
            Ok(Expr::Void)
        }
        other => Err(type_error("set-car!", "a pair", other)),
    }
}

fn builtin_set_cdr(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Pair(pair) => {
            pair.set_cdr(values[1].clone());
            Ok(Expr::Void)
        }
        other => Err(type_error("set-cdr!", "a pair", other)),
    }
}

fn builtin_list(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::list(values.iter().cloned()))
}

fn builtin_length(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let length = proper_list("length", &values[0])?.len();
    Ok(Expr::integer(length as i64))
}

/// Every argument but the last is copied; the last becomes the shared tail.
fn builtin_append(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let Some((tail, lists)) = values.split_last() else { return Ok(Expr::Nil) };

    let mut items = vec![];
    for list in lists {
        items.extend(proper_list("append", list)?);
    }
    Ok(Expr::list_with_tail(items, tail.clone()))
}

fn builtin_reverse(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let items = proper_list("reverse", &values[0])?;
    Ok(items.into_iter().fold(Expr::Nil, |rest, item| Expr::cons(item, rest)))
}

fn builtin_list_tail(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let count = index_arg("list-tail", &values[1], usize::MAX, false)?;
    let mut current = values[0].clone();
    for _ in 0..count {
        current = match current {
            Expr::Pair(pair) => pair.cdr(),
            _ => return Err(SchemeError::evaluation(format!("list-tail: list {} is shorter than {}", values[0], count))),
        };
    }
    Ok(current)
}

fn builtin_is_null(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(values[0].is_nil())
}

fn builtin_is_pair(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Pair(_)))
}

fn builtin_is_list(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(values[0].is_list())
}

fn builtin_eqv(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(values[0].eqv(&values[1]))
}

fn builtin_equal(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(values[0].equal(&values[1]))
}

fn builtin_not(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(!values[0].is_true())
}

#[cfg(test)]
mod tests {
    use crate::builtin::tests::run;

    #[test]
    fn construction_and_access() -> anyhow::Result<()> {
        assert_eq!(run("(cons 1 2)")?, "(1 . 2)");
        assert_eq!(run("(car '(a b))")?, "a");
        assert_eq!(run("(cdr '(a b))")?, "(b)");
        assert_eq!(run("(list)")?, "()");
        assert_eq!(run("(length '(1 2 3))")?, "3");
        assert_eq!(run("(append '(1) '(2 3) '() 4)")?, "(1 2 3 . 4)");
        assert_eq!(run("(append)")?, "()");
        assert_eq!(run("(reverse '(1 2 3))")?, "(3 2 1)");
        assert_eq!(run("(list-tail '(1 2 3) 1)")?, "(2 3)");
        Ok(())
    }

    #[test]
    fn mutation_is_visible_through_sharing() -> anyhow::Result<()> {
        assert_eq!(run("(define p (list 1 2)) (define q p) (set-car! q 9) p")?, "(9 2)");
        assert_eq!(run("(define p (list 1 2)) (set-cdr! p 3) p")?, "(1 . 3)");
        Ok(())
    }

    #[test]
    fn predicates() -> anyhow::Result<()> {
        assert_eq!(run("(null? '())")?, "#t");
        assert_eq!(run("(pair? '())")?, "#f");
        assert_eq!(run("(list? '(1 . 2))")?, "#f");
        assert_eq!(run("(eq? 'a 'a)")?, "#t");
        assert_eq!(run("(eqv? 2 2.0)")?, "#f");
        assert_eq!(run("(eq? (list 1) (list 1))")?, "#f");
        assert_eq!(run("(equal? (list 1 \"a\") (list 1 \"a\"))")?, "#t");
        assert_eq!(run("(not 0)")?, "#f");
        Ok(())
    }

    #[test]
    fn failures() {
        assert!(run("(car '())").is_err());
        assert!(run("(length '(1 . 2))").is_err());
        assert!(run("(list-tail '(1) 3)").is_err());
        assert!(run("(append 1 '())").is_err());
    }

    #[test]
    fn circular_lists() -> anyhow::Result<()> {
        let cycle = "(define p (list 1 2)) (set-cdr! (cdr p) p)";
        assert_eq!(run(&format!("{} (list? p)", cycle))?, "#f");
        assert_eq!(run(&format!("{} (pair? p)", cycle))?, "#t");
        assert_eq!(run(&format!("{} (car (cdr (cdr p)))", cycle))?, "1");
        assert!(run(&format!("{} (length p)", cycle)).is_err());
        assert!(run(&format!("{} (reverse p)", cycle)).is_err());
        assert!(run(&format!("{} (list->vector p)", cycle)).is_err());
        Ok(())
    }
}
