use std::rc::Rc;

use log::debug;

use crate::{
    builtin::{native_environment, standard_environment},
    config::Config,
    environment::Environment,
    error::Result,
    evaluator::Evaluator,
    expr::Expr,
    parser::parse_all,
};


/// An evaluation context: a global environment and the evaluator that runs
/// everything in it. Definitions persist across calls.
pub struct Interpreter {
    evaluator: Box<dyn Evaluator>,
    environment: Rc<Environment>,
    config: Config,
}

impl Interpreter {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        debug!("Creating interpreter with {:?}", config);
        let evaluator = config.strategy.evaluator(config.trace_limit);
        let environment = match config.prelude {
            true => standard_environment(evaluator.as_ref())?,
            false => native_environment(),
        };

        Ok(Self { evaluator, environment, config })
    }

    pub fn eval(&self, expr: &Expr) -> Result<Expr> {
        self.evaluator.eval(expr, &self.environment)
    }

    /// Evaluates every datum of `source` in order and returns the last value,
    /// `#<void>` for a program with none.
    pub fn eval_str(&self, source: &str) -> Result<Expr> {
        parse_all(source)?.iter()
            .try_fold(Expr::Void, |_, expr| self.eval(expr))
    }

    pub fn apply(&self, procedure: &Expr, args: &[Expr]) -> Result<Expr> {
        self.evaluator.apply(procedure, args)
    }

    pub fn environment(&self) -> &Rc<Environment> {
        &self.environment
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
