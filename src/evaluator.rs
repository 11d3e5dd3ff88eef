use std::rc::Rc;

use serde::Deserialize;

use crate::{
    environment::Environment,
    error::Result,
    expr::Expr,
    recursive::RecursiveEvaluator,
    special,
    trampoline::StackEvaluator,
};


/// The contract every evaluation strategy satisfies. Library code and the
/// front-ends depend on this trait only.
pub trait Evaluator {
    fn eval(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Expr>;

    /// Applies a procedure to already-evaluated arguments by evaluating the
    /// synthetic form `(procedure 'arg ...)`.
    fn apply(&self, procedure: &Expr, args: &[Expr]) -> Result<Expr> {
        let form = Expr::cons(procedure.clone(), Expr::list(args.iter().cloned().map(special::quote)));
        self.eval(&form, &Environment::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Host recursion; simple, but depth is bounded by the host stack.
    Recursive,
    /// Explicit frame stack with constant host stack use for tail calls.
    #[default]
    Stack,
}

impl Strategy {
    pub fn evaluator(self, trace_limit: usize) -> Box<dyn Evaluator> {
        match self {
            Self::Recursive => Box::new(RecursiveEvaluator),
            Self::Stack => Box::new(StackEvaluator::new(trace_limit)),
        }
    }
}
