mod builtin;
mod config;
mod context;
mod environment;
mod error;
mod evaluator;
mod expr;
mod number;
mod parser;
mod port;
mod procedure;
mod recursive;
mod special;
mod trampoline;

#[cfg(test)]
mod test_utils;

pub use builtin::{load_prelude, native_environment, standard_environment};
pub use config::Config;
pub use context::Interpreter;
pub use environment::Environment;
pub use error::{Result, SchemeError};
pub use evaluator::{Evaluator, Strategy};
pub use expr::{Expr, Pair, Symbol};
pub use number::Number;
pub use parser::{parse, parse_all};
pub use port::Port;
pub use procedure::{Arity, Closure, Native, NativeFn, Procedure};
pub use recursive::RecursiveEvaluator;
pub use special::Keyword;
pub use trampoline::{StackEvaluator, DEFAULT_TRACE_LIMIT};
