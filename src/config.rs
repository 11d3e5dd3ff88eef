use std::path::Path;

use serde::Deserialize;

use crate::{evaluator::Strategy, trampoline::DEFAULT_TRACE_LIMIT};


/// Interpreter settings. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub strategy: Strategy,
    /// Evaluate the bundled library procedures into the global environment.
    pub prelude: bool,
    /// Most pending frames rendered into an error trace.
    pub trace_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { strategy: Strategy::default(), prelude: true, trace_limit: DEFAULT_TRACE_LIMIT }
    }
}

impl Config {
    pub fn from_json(source: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }
}
