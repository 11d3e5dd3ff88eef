use std::cmp::Ordering;

use crate::{
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::Expr,
    number::Number,
    procedure::Arity,
};

use super::{boolean, number_arg, Builtin};


pub(super) const BUILTINS: &[Builtin] = &[
    ("+", Arity::AtLeast(0), builtin_add),
    ("-", Arity::AtLeast(1), builtin_sub),
    ("*", Arity::AtLeast(0), builtin_mul),
    ("/", Arity::AtLeast(1), builtin_div),
    ("quotient", Arity::Exact(2), builtin_quotient),
    ("remainder", Arity::Exact(2), builtin_remainder),
    ("modulo", Arity::Exact(2), builtin_modulo),
    ("=", Arity::AtLeast(1), builtin_eq),
    ("<", Arity::AtLeast(1), builtin_less),
    (">", Arity::AtLeast(1), builtin_greater),
    ("<=", Arity::AtLeast(1), builtin_less_eq),
    (">=", Arity::AtLeast(1), builtin_greater_eq),
    ("abs", Arity::Exact(1), builtin_abs),
    ("min", Arity::AtLeast(1), builtin_min),
    ("max", Arity::AtLeast(1), builtin_max),
    ("number?", Arity::Exact(1), builtin_is_number),
    ("integer?", Arity::Exact(1), builtin_is_integer),
    ("real?", Arity::Exact(1), builtin_is_number),
    ("zero?", Arity::Exact(1), builtin_is_zero),
    ("exact->inexact", Arity::Exact(1), builtin_to_inexact),
    ("inexact->exact", Arity::Exact(1), builtin_to_exact),
    ("floor", Arity::Exact(1), builtin_floor),
    ("ceiling", Arity::Exact(1), builtin_ceiling),
    ("round", Arity::Exact(1), builtin_round),
    ("truncate", Arity::Exact(1), builtin_truncate),
    ("sqrt", Arity::Exact(1), builtin_sqrt),
    ("expt", Arity::Exact(2), builtin_expt),
];

fn numbers(name: &str, values: &[Expr]) -> Result<Vec<Number>> {
    values.iter().map(|value| number_arg(name, value)).collect()
}

fn fold(name: &str, values: &[Expr], initial: Number, f: fn(Number, Number) -> Result<Number>) -> Result<Expr> {
    numbers(name, values)?.into_iter()
        .try_fold(initial, f)
        .map(Expr::Number)
}

fn builtin_add(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    fold("+", values, Number::Integer(0), Number::add)
}

fn builtin_mul(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    fold("*", values, Number::Integer(1), Number::mul)
}

fn builtin_sub(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let first = number_arg("-", &values[0])?;
    if values.len() == 1 { return Ok(Expr::Number(first.negate()?)); }
    fold("-", &values[1..], first, Number::sub)
}

fn builtin_div(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let first = number_arg("/", &values[0])?;
    if values.len() == 1 { return Ok(Expr::Number(Number::Integer(1).div(first)?)); }
    fold("/", &values[1..], first, Number::div)
}

fn builtin_quotient(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Number(number_arg("quotient", &values[0])?.quotient(number_arg("quotient", &values[1])?)?))
}

fn builtin_remainder(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Number(number_arg("remainder", &values[0])?.remainder(number_arg("remainder", &values[1])?)?))
}

fn builtin_modulo(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Number(number_arg("modulo", &values[0])?.modulo(number_arg("modulo", &values[1])?)?))
}

/// True when every neighbouring pair satisfies `f`. NaN compares as nothing.
fn builtin_compare(name: &str, values: &[Expr], f: fn(Ordering) -> bool) -> Result<Expr> {
    let values = numbers(name, values)?;
    boolean(values.windows(2).all(|pair| pair[0].compare(pair[1]).is_some_and(f)))
}

fn builtin_eq(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    builtin_compare("=", values, Ordering::is_eq)
}

fn builtin_less(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    builtin_compare("<", values, Ordering::is_lt)
}

fn builtin_greater(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    builtin_compare(">", values, Ordering::is_gt)
}

fn builtin_less_eq(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    builtin_compare("<=", values, Ordering::is_le)
}

fn builtin_greater_eq(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    builtin_compare(">=", values, Ordering::is_ge)
}

fn builtin_abs(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match number_arg("abs", &values[0])? {
        Number::Integer(value) => value.checked_abs()
            .map(Expr::integer)
            .ok_or_else(|| SchemeError::evaluation("abs: integer overflow")),
        Number::Real(value) => Ok(Expr::real(value.abs())),
    }
}

/// `min` and `max` return a real as soon as any argument is one.
fn extremum(name: &str, values: &[Expr], keep: Ordering) -> Result<Expr> {
    let values = numbers(name, values)?;
    let inexact = values.iter().any(|value| matches!(value, Number::Real(_)));
    let mut best = values[0];
    for value in &values[1..] {
        match value.compare(best) {
            Some(ordering) if ordering == keep => best = *value,
            None => best = Number::Real(f64::NAN),
            _ => {}
        }
    }
    Ok(Expr::Number(if inexact { best.to_inexact() } else { best }))
}

fn builtin_min(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    extremum("min", values, Ordering::Less)
}

fn builtin_max(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    extremum("max", values, Ordering::Greater)
}

fn builtin_is_number(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Number(_)))
}

fn builtin_is_integer(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Number(number) if number.is_integer()))
}

fn builtin_is_zero(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(number_arg("zero?", &values[0])?.is_zero())
}

fn builtin_to_inexact(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Number(number_arg("exact->inexact", &values[0])?.to_inexact()))
}

fn builtin_to_exact(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Number(number_arg("inexact->exact", &values[0])?.to_exact()?))
}

/// Integers are already whole; reals stay inexact.
fn rounding(name: &str, values: &[Expr], f: fn(f64) -> f64) -> Result<Expr> {
    match number_arg(name, &values[0])? {
        Number::Integer(value) => Ok(Expr::integer(value)),
        Number::Real(value) => Ok(Expr::real(f(value))),
    }
}

fn builtin_floor(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    rounding("floor", values, f64::floor)
}

fn builtin_ceiling(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    rounding("ceiling", values, f64::ceil)
}

fn builtin_round(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    rounding("round", values, f64::round_ties_even)
}

fn builtin_truncate(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    rounding("truncate", values, f64::trunc)
}

fn builtin_sqrt(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match number_arg("sqrt", &values[0])? {
        Number::Integer(value) if value >= 0 => {
            let root = (value as f64).sqrt().round() as i64;
            match root.checked_mul(root) {
                Some(square) if square == value => Ok(Expr::integer(root)),
                _ => Ok(Expr::real((value as f64).sqrt())),
            }
        }
        number => Ok(Expr::real(number.as_f64().sqrt())),
    }
}

fn builtin_expt(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let base = number_arg("expt", &values[0])?;
    let exponent = number_arg("expt", &values[1])?;
    match (base, exponent) {
        (Number::Integer(base), Number::Integer(exponent)) if exponent >= 0 => u32::try_from(exponent).ok()
            .and_then(|exponent| base.checked_pow(exponent))
            .map(Expr::integer)
            .ok_or_else(|| SchemeError::evaluation("expt: integer overflow")),
        (base, exponent) => Ok(Expr::real(base.as_f64().powf(exponent.as_f64()))),
    }
}

#[cfg(test)]
mod tests {
    use crate::builtin::tests::run;

    #[test]
    fn arithmetic() -> anyhow::Result<()> {
        assert_eq!(run("(+)")?, "0");
        assert_eq!(run("(+ 1 2.5)")?, "3.5");
        assert_eq!(run("(- 5)")?, "-5");
        assert_eq!(run("(- 10 1 2)")?, "7");
        assert_eq!(run("(* 2 3 4)")?, "24");
        assert_eq!(run("(/ 6 3)")?, "2");
        assert_eq!(run("(/ 1 2)")?, "0.5");
        assert_eq!(run("(/ 4)")?, "0.25");
        assert_eq!(run("(/ 1.0 0)")?, "+inf.0");
        assert_eq!(run("(quotient -7 2)")?, "-3");
        assert_eq!(run("(remainder -7 2)")?, "-1");
        assert_eq!(run("(modulo -7 2)")?, "1");
        assert_eq!(run("(modulo 7 -2)")?, "-1");
        Ok(())
    }

    #[test]
    fn comparisons() -> anyhow::Result<()> {
        assert_eq!(run("(= 1 1.0)")?, "#t");
        assert_eq!(run("(< 1 2 3)")?, "#t");
        assert_eq!(run("(< 1 3 2)")?, "#f");
        assert_eq!(run("(>= 3 3 1)")?, "#t");
        assert_eq!(run("(= +nan.0 +nan.0)")?, "#f");
        assert_eq!(run("(max 1 2.0)")?, "2.0");
        assert_eq!(run("(min 4 2 8)")?, "2");
        Ok(())
    }

    #[test]
    fn conversions() -> anyhow::Result<()> {
        assert_eq!(run("(exact->inexact 3)")?, "3.0");
        assert_eq!(run("(inexact->exact 3.0)")?, "3");
        assert_eq!(run("(round 2.5)")?, "2.0");
        assert_eq!(run("(floor -1.5)")?, "-2.0");
        assert_eq!(run("(truncate -1.5)")?, "-1.0");
        assert_eq!(run("(sqrt 16)")?, "4");
        assert_eq!(run("(sqrt 2.25)")?, "1.5");
        assert_eq!(run("(expt 2 10)")?, "1024");
        assert_eq!(run("(expt 2.0 -1)")?, "0.5");
        assert_eq!(run("(integer? 2.0)")?, "#t");
        assert_eq!(run("(number? 'a)")?, "#f");
        Ok(())
    }

    #[test]
    fn failures() {
        assert!(run("(+ 1 'a)").is_err());
        assert!(run("(/ 1 0)").is_err());
        assert!(run("(quotient 1 0)").is_err());
        assert!(run("(* 9223372036854775807 2)").is_err());
        assert!(run("(/ -9223372036854775808 -1)").is_err());
        assert!(run("(expt 10 100)").is_err());
        assert!(run("(inexact->exact +inf.0)").is_err());
        assert!(run("(-)").is_err());
    }
}
