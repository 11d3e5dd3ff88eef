use core::fmt;
use std::rc::Rc;

use crate::{environment::Environment, error::{Result, SchemeError}, evaluator::Evaluator, expr::{Expr, Symbol}};


/// Host-implemented procedures receive their already-evaluated arguments and
/// the evaluator that called them, so they can call back into user code.
pub type NativeFn = fn(&[Expr], &dyn Evaluator) -> Result<Expr>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(low, high) => (low..=high).contains(&count),
        }
    }

    pub fn check(self, name: &str, count: usize) -> Result<()> {
        if self.accepts(count) {
            return Ok(());
        }
        let expected = match self {
            Self::Exact(n) => format!("{}", n),
            Self::AtLeast(n) => format!("at least {}", n),
            Self::Between(low, high) => format!("between {} and {}", low, high),
        };
        Err(SchemeError::evaluation(format!("{}: expected {} arguments, got {}", name, expected, count)))
    }
}

pub struct Native {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl Native {
    pub fn call(&self, args: &[Expr], evaluator: &dyn Evaluator) -> Result<Expr> {
        self.arity.check(self.name, args.len())?;
        (self.func)(args, evaluator)
    }
}

/// A user-defined procedure: parameters, a body (a non-empty proper list of
/// expressions) and the environment it was created in.
pub struct Closure {
    pub name: Option<Symbol>,
    pub params: Vec<Symbol>,
    pub rest: Option<Symbol>,
    pub body: Expr,
    pub env: Rc<Environment>,
}

impl Closure {
    pub fn arity(&self) -> Arity {
        match self.rest {
            Some(_) => Arity::AtLeast(self.params.len()),
            None => Arity::Exact(self.params.len()),
        }
    }

    /// Creates the call frame: fixed parameters are bound positionally and any
    /// remaining arguments are collected into a list for the rest parameter.
    pub fn bind_arguments(self: &Rc<Self>, args: Vec<Expr>) -> Result<Rc<Environment>> {
        let name = self.name.as_ref().map(Symbol::as_str).unwrap_or("#<procedure>");
        self.arity().check(name, args.len())?;

        let frame = Environment::call(self);
        let mut args = args.into_iter();
        for param in &self.params {
            if let Some(value) = args.next() {
                frame.bind(param.clone(), value);
            }
        }
        if let Some(rest) = &self.rest {
            frame.bind(rest.clone(), Expr::list(args));
        }
        Ok(frame)
    }
}

#[derive(Clone)]
pub enum Procedure {
    Native(Rc<Native>),
    Closure(Rc<Closure>),
}

impl Procedure {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Native(native) => Some(native.name),
            Self::Closure(closure) => closure.name.as_ref().map(Symbol::as_str),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native(a), Self::Native(b)) => Rc::ptr_eq(a, b),
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(native) => write!(f, "Native({})", native.name),
            Self::Closure(closure) => write!(f, "Closure({:?}, {:?})", closure.params, closure.rest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(params: &[&str], rest: Option<&str>) -> Rc<Closure> {
        Rc::new(Closure {
            name: Some(Symbol::new("f")),
            params: params.iter().map(|name| Symbol::new(name)).collect(),
            rest: rest.map(Symbol::new),
            body: Expr::list([Expr::integer(0)]),
            env: Environment::new(),
        })
    }

    #[test]
    fn fixed_arity_is_exact() {
        let f = closure(&["a", "b"], None);
        assert!(f.bind_arguments(vec![Expr::integer(1)]).is_err());
        assert!(f.bind_arguments(vec![Expr::integer(1), Expr::integer(2), Expr::integer(3)]).is_err());
        assert!(f.bind_arguments(vec![Expr::integer(1), Expr::integer(2)]).is_ok());
    }

    #[test]
    fn rest_parameter_collects_the_remainder() -> Result<()> {
        let f = closure(&["a"], Some("more"));
        let frame = f.bind_arguments(vec![Expr::integer(1), Expr::integer(2), Expr::integer(3)])?;
        assert_eq!(frame.get(&Symbol::new("a"))?.to_string(), "1");
        assert_eq!(frame.get(&Symbol::new("more"))?.to_string(), "(2 3)");

        let frame = f.bind_arguments(vec![Expr::integer(1)])?;
        assert!(frame.get(&Symbol::new("more"))?.is_nil());
        Ok(())
    }

    #[test]
    fn call_frames_keep_their_procedure_alive() -> Result<()> {
        let f = closure(&["a"], None);
        let weak = Rc::downgrade(&f);
        let frame = f.bind_arguments(vec![Expr::integer(1)])?;
        drop(f);
        assert!(weak.upgrade().is_some());
        drop(frame);
        assert!(weak.upgrade().is_none());
        Ok(())
    }

    #[test]
    fn arity_messages_name_the_procedure() {
        let error = Arity::Between(1, 2).check("substring", 0).unwrap_err();
        assert_eq!(error.to_string(), "substring: expected between 1 and 2 arguments, got 0");
    }
}
