use thiserror::Error;


#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemeError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("syntax error: unexpected end of input")]
    Incomplete,

    #[error("unbound variable: {name}{trace}")]
    UnboundVariable { name: String, trace: String },

    #[error("{message}{trace}")]
    Evaluation { message: String, trace: String },
}

impl SchemeError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundVariable { name: name.into(), trace: String::new() }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation { message: message.into(), trace: String::new() }
    }

    /// Name of the error class, as used by the conformance fixtures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SyntaxError",
            Self::Incomplete => "Incomplete",
            Self::UnboundVariable { .. } => "UnboundVariable",
            Self::Evaluation { .. } => "EvaluationError",
        }
    }

    /// Attaches a rendered frame trace. Errors that already carry one keep it,
    /// so failures raised by a nested evaluation report the innermost stack.
    pub(crate) fn with_trace(self, rendered: impl FnOnce() -> String) -> Self {
        match self {
            Self::UnboundVariable { name, trace } if trace.is_empty() =>
                Self::UnboundVariable { name, trace: rendered() },
            Self::Evaluation { message, trace } if trace.is_empty() =>
                Self::Evaluation { message, trace: rendered() },
            other => other,
        }
    }
}

pub type Result<T, E = SchemeError> = std::result::Result<T, E>;
