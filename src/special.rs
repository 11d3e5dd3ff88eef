//! Reserved special-form keywords and the syntax rules both evaluators share.
//!
//! The reader tags reserved names as [`Keyword`]s, so dispatch is on the tag
//! and a keyword can never be looked up, bound or shadowed as a variable.

use std::rc::Rc;

use crate::{
    environment::Environment,
    error::{Result, SchemeError},
    expr::{Expr, Pair, Symbol},
    procedure::{Closure, Procedure},
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Quote,
    If,
    Define,
    Set,
    Lambda,
    Let,
    Cond,
    Else,
    And,
    Or,
    Begin,
}

impl Keyword {
    pub const ALL: [Keyword; 11] = [
        Self::Quote, Self::If, Self::Define, Self::Set, Self::Lambda, Self::Let,
        Self::Cond, Self::Else, Self::And, Self::Or, Self::Begin,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|keyword| keyword.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::If => "if",
            Self::Define => "define",
            Self::Set => "set!",
            Self::Lambda => "lambda",
            Self::Let => "let",
            Self::Cond => "cond",
            Self::Else => "else",
            Self::And => "and",
            Self::Or => "or",
            Self::Begin => "begin",
        }
    }
}

/// What a `define` form introduces.
pub(crate) enum Definition {
    /// `(define name value)`: the cell holds the value expression.
    Variable(Symbol, Rc<Pair>),
    /// `(define (name . params) body...)`: the closure is already built.
    Procedure(Symbol, Expr),
}

fn malformed(form: Keyword, operands: &Expr) -> SchemeError {
    SchemeError::syntax(format!("malformed {}: ({} {})", form.name(), form.name(), render_operands(operands)))
}

fn render_operands(operands: &Expr) -> String {
    let rendered = operands.to_string();
    match operands {
        Expr::Pair(_) => rendered[1..rendered.len() - 1].to_string(),
        _ => rendered,
    }
}

/// The operand cells of a form, checked against an exact count or a minimum.
fn operand_cells(form: Keyword, operands: &Expr, min: usize, max: Option<usize>) -> Result<Vec<Rc<Pair>>> {
    if !operands.is_list() {
        return Err(malformed(form, operands));
    }
    let cells: Vec<Rc<Pair>> = operands.cells().collect();
    if cells.len() < min || max.is_some_and(|max| cells.len() > max) {
        return Err(malformed(form, operands));
    }
    Ok(cells)
}

/// A name that may be bound: any symbol, never a keyword.
pub(crate) fn binding_name(expr: &Expr) -> Result<Symbol> {
    match expr {
        Expr::Symbol(symbol) => Ok(symbol.clone()),
        Expr::Keyword(keyword) => Err(SchemeError::syntax(format!("cannot bind the keyword {}", keyword.name()))),
        other => Err(SchemeError::syntax(format!("expected an identifier, got {}", other))),
    }
}

/// Splits `(a b . rest)`, `(a b)` or a bare `args` into fixed and rest parameters.
pub(crate) fn parameters(spec: &Expr) -> Result<(Vec<Symbol>, Option<Symbol>)> {
    let mut params = Vec::new();
    let mut current = spec.clone();
    loop {
        current = match current {
            Expr::Nil => return Ok((params, None)),
            Expr::Pair(pair) => {
                let name = binding_name(&pair.car())?;
                if params.contains(&name) {
                    return Err(SchemeError::syntax(format!("duplicate parameter {}", name)));
                }
                params.push(name);
                pair.cdr()
            }
            rest => return Ok((params, Some(binding_name(&rest)?))),
        };
    }
}

fn check_body(body: &Expr) -> Result<()> {
    if body.is_nil() || !body.is_list() {
        return Err(SchemeError::syntax(format!("procedure body must be a non-empty list, got {}", body)));
    }
    Ok(())
}

pub(crate) fn make_closure(name: Option<Symbol>, spec: &Expr, body: Expr, env: &Rc<Environment>) -> Result<Expr> {
    check_body(&body)?;
    let (params, rest) = parameters(spec)?;
    Ok(Expr::Procedure(Procedure::Closure(Rc::new(Closure { name, params, rest, body, env: env.clone() }))))
}

pub(crate) fn quotation(operands: &Expr) -> Result<Expr> {
    let cells = operand_cells(Keyword::Quote, operands, 1, Some(1))?;
    Ok(cells[0].car())
}

pub(crate) fn quote(value: Expr) -> Expr {
    Expr::list([Expr::Keyword(Keyword::Quote), value])
}

pub(crate) fn lambda(operands: &Expr, env: &Rc<Environment>) -> Result<Expr> {
    let cells = operand_cells(Keyword::Lambda, operands, 2, None)?;
    make_closure(None, &cells[0].car(), cells[0].cdr(), env)
}

pub(crate) fn definition(operands: &Expr, env: &Rc<Environment>) -> Result<Definition> {
    let cells = operand_cells(Keyword::Define, operands, 2, None)?;
    match cells[0].car() {
        Expr::Pair(target) => {
            let name = binding_name(&target.car())?;
            let closure = make_closure(Some(name.clone()), &target.cdr(), cells[0].cdr(), env)?;
            Ok(Definition::Procedure(name, closure))
        }
        target if cells.len() == 2 => Ok(Definition::Variable(binding_name(&target)?, cells[1].clone())),
        _ => Err(malformed(Keyword::Define, operands)),
    }
}

/// `(set! name value)`: the name and the cell holding the value expression.
pub(crate) fn assignment(operands: &Expr) -> Result<(Symbol, Rc<Pair>)> {
    let cells = operand_cells(Keyword::Set, operands, 2, Some(2))?;
    Ok((binding_name(&cells[0].car())?, cells[1].clone()))
}

/// `(if test consequent [alternate])`: the test cell and both branches.
pub(crate) fn conditional(operands: &Expr) -> Result<(Rc<Pair>, Expr, Option<Expr>)> {
    let cells = operand_cells(Keyword::If, operands, 2, Some(3))?;
    Ok((cells[0].clone(), cells[1].car(), cells.get(2).map(|cell| cell.car())))
}

/// A `cond` clause must be a non-empty proper list `(test body...)`.
pub(crate) fn cond_clause(clause: &Expr) -> Result<Rc<Pair>> {
    match clause {
        Expr::Pair(pair) if clause.is_list() => Ok(pair.clone()),
        other => Err(SchemeError::syntax(format!("cond clause must be a list, got {}", other))),
    }
}

/// Turns a body into a single expression: the expression itself when there
/// is only one, otherwise a `begin` around all of them.
pub(crate) fn sequence(body: Expr) -> Expr {
    match &body {
        Expr::Pair(pair) if pair.cdr().is_nil() => pair.car(),
        _ => Expr::cons(Expr::Keyword(Keyword::Begin), body),
    }
}

/// Rewrites `(let ((n v) ...) body...)` into `(<closure> v ...)`, where the
/// closure takes the names as parameters and closes over `env`. Values are
/// therefore evaluated in the outer scope and bound simultaneously.
///
/// Named `let` binds the name to the closure in a frame only the closure's
/// body can see. That binding is weak, so the closure and its scope do not
/// keep each other alive.
pub(crate) fn let_application(operands: &Expr, env: &Rc<Environment>) -> Result<Expr> {
    let cells = operand_cells(Keyword::Let, operands, 2, None)?;
    let (name, bindings, body) = match cells[0].car() {
        Expr::Symbol(name) if cells.len() >= 3 => (Some(name), cells[1].car(), cells[1].cdr()),
        Expr::Keyword(keyword) => return Err(SchemeError::syntax(format!("cannot bind the keyword {}", keyword.name()))),
        bindings => (None, bindings, cells[0].cdr()),
    };
    if !bindings.is_list() {
        return Err(malformed(Keyword::Let, operands));
    }

    let mut names = Vec::new();
    let mut values = Vec::new();
    for binding in bindings.iter() {
        match binding.to_vec().ok().as_deref() {
            Some([name, value]) => {
                names.push(name.clone());
                values.push(value.clone());
            }
            _ => return Err(SchemeError::syntax(format!("let binding must be (name value), got {}", binding))),
        }
    }

    let closure = match name {
        Some(name) => {
            check_body(&body)?;
            let (params, rest) = parameters(&Expr::list(names))?;
            let closure = Rc::new_cyclic(|itself| Closure {
                name: Some(name.clone()),
                params,
                rest,
                body,
                env: Environment::recursive(env, name, itself.clone()),
            });
            Expr::Procedure(Procedure::Closure(closure))
        }
        None => make_closure(None, &Expr::list(names), body, env)?,
    };
    Ok(Expr::cons(closure, Expr::list(values)))
}
