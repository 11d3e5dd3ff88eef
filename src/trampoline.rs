//! Evaluation on an explicit frame stack.
//!
//! Instead of recursing for every sub-expression, the machine keeps a stack of
//! [`Frame`]s. A frame that needs the value of an operand pushes a child frame
//! whose destination is the cons cell holding that operand; the child writes
//! its value straight into the cell and the parent picks it up when it is on
//! top again. Tail positions never push: the frame is rewritten in place (`if`,
//! `cond`, `and`, `or`, `let`) or replaced by the callee's body (closure
//! calls), so tail calls run in constant host stack.

use std::rc::Rc;

use itertools::Itertools;
use log::{debug, trace};

use crate::{
    environment::Environment,
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::{Expr, Pair},
    procedure::Procedure,
    special::{self, Definition, Keyword},
};


pub const DEFAULT_TRACE_LIMIT: usize = 16;

/// Each call to [`Evaluator::eval`] runs on a fresh stack, so natives may
/// re-enter the evaluator while an outer evaluation is suspended.
#[derive(Debug, Clone, Copy)]
pub struct StackEvaluator {
    trace_limit: usize,
}

impl StackEvaluator {
    pub fn new(trace_limit: usize) -> Self {
        Self { trace_limit }
    }
}

impl Default for StackEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_LIMIT)
    }
}

impl Evaluator for StackEvaluator {
    fn eval(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Expr> {
        Machine {
            evaluator: self,
            stack: vec![Frame::new(expr, env, None)],
            result: Expr::Void,
        }.run()
    }
}

struct Frame {
    /// Owned copy of the expression's spine; rewritten in place as it runs.
    expr: Expr,
    env: Rc<Environment>,
    /// Set once the frame's operands have been handed to child frames.
    pushed: bool,
    /// The cell whose `car` receives this frame's value, or the machine's
    /// result slot when absent.
    destination: Option<Rc<Pair>>,
}

impl Frame {
    fn new(expr: &Expr, env: &Rc<Environment>, destination: Option<Rc<Pair>>) -> Self {
        Self { expr: expr.copy_spine(), env: env.clone(), pushed: false, destination }
    }

    /// Tail position: this frame becomes `expr`.
    fn rewrite(&mut self, expr: &Expr) -> Transition {
        self.expr = expr.copy_spine();
        self.pushed = false;
        Transition::Suspend(Vec::new())
    }
}

enum Transition {
    /// The frame is done and produced a value.
    Return(Expr),
    /// The frame stays on the stack; the children (last one on top) run first.
    Suspend(Vec<Frame>),
    /// The frame is gone; these frames take over its destination.
    Replace(Vec<Frame>),
}

struct Machine<'a> {
    evaluator: &'a StackEvaluator,
    stack: Vec<Frame>,
    result: Expr,
}

impl Machine<'_> {
    fn run(mut self) -> Result<Expr> {
        while let Some(mut frame) = self.stack.pop() {
            match self.step(&mut frame) {
                Ok(Transition::Return(value)) => match frame.destination {
                    Some(cell) => cell.set_car(value),
                    None => self.result = value,
                },
                Ok(Transition::Suspend(children)) => {
                    self.stack.push(frame);
                    self.stack.extend(children);
                }
                Ok(Transition::Replace(frames)) => self.stack.extend(frames),
                Err(error) => {
                    self.stack.push(frame);
                    debug!("evaluation failed with {} pending frames: {}", self.stack.len(), error);
                    return Err(error.with_trace(|| self.trace()));
                }
            }
        }
        Ok(self.result)
    }

    /// Pending frames, innermost first.
    fn trace(&self) -> String {
        let limit = self.evaluator.trace_limit;
        let mut rendered = self.stack.iter().rev()
            .take(limit)
            .map(|frame| format!("\n  in {}", frame.expr))
            .join("");
        if self.stack.len() > limit {
            rendered.push_str(&format!("\n  ... {} more frames", self.stack.len() - limit));
        }
        rendered
    }

    fn step(&self, frame: &mut Frame) -> Result<Transition> {
        let form = match &frame.expr {
            Expr::Symbol(symbol) => return Ok(Transition::Return(frame.env.get(symbol)?)),
            Expr::Keyword(keyword) => return Err(SchemeError::syntax(format!("keyword {} used as an expression", keyword.name()))),
            Expr::Pair(form) if frame.expr.is_list() => form.clone(),
            other => return Ok(Transition::Return(other.clone())),
        };

        let operands = form.cdr();
        match form.car() {
            Expr::Keyword(Keyword::Quote) => Ok(Transition::Return(special::quotation(&operands)?)),
            Expr::Keyword(Keyword::If) => step_if(frame, &operands),
            Expr::Keyword(Keyword::Define) => step_define(frame, &operands),
            Expr::Keyword(Keyword::Set) => step_set_bang(frame, &operands),
            Expr::Keyword(Keyword::Lambda) => Ok(Transition::Return(special::lambda(&operands, &frame.env)?)),
            Expr::Keyword(Keyword::Let) => {
                // The application form is freshly built, so it needs no copy
                frame.expr = special::let_application(&operands, &frame.env)?;
                frame.pushed = false;
                Ok(Transition::Suspend(Vec::new()))
            }
            Expr::Keyword(Keyword::Cond) => step_cond(frame, &form),
            Expr::Keyword(Keyword::And) => step_logical(frame, &form, true),
            Expr::Keyword(Keyword::Or) => step_logical(frame, &form, false),
            Expr::Keyword(Keyword::Begin) => Ok(step_begin(frame, &operands)),
            Expr::Keyword(Keyword::Else) => Err(SchemeError::syntax("else outside of cond")),
            _ => self.step_application(frame, &form),
        }
    }

    fn step_application(&self, frame: &mut Frame, form: &Rc<Pair>) -> Result<Transition> {
        if !frame.pushed {
            frame.pushed = true;
            let pending = frame.expr.cells()
                .filter(|cell| needs_evaluation(&cell.car()))
                .map(|cell| Frame::new(&cell.car(), &frame.env, Some(cell)))
                .collect_vec();
            if !pending.is_empty() {
                // Reversed so the leftmost operand is evaluated first
                return Ok(Transition::Suspend(pending.into_iter().rev().collect()));
            }
        }

        let args = form.cdr().iter().collect_vec();
        match form.car() {
            Expr::Procedure(Procedure::Native(native)) => Ok(Transition::Return(native.call(&args, self.evaluator)?)),
            Expr::Procedure(Procedure::Closure(closure)) => {
                let env = closure.bind_arguments(args)?;
                trace!("tail call into {}, {} frames pending", closure.name.as_ref().map(|name| name.as_str()).unwrap_or("lambda"), self.stack.len());
                Ok(Transition::Replace(body_frames(&closure.body, &env, &frame.destination)))
            }
            other => Err(SchemeError::evaluation(format!("not a procedure: {}", other))),
        }
    }
}

/// One frame per body expression, first expression on top. All of them write
/// to the same destination, so the last one to run provides the value.
fn body_frames(body: &Expr, env: &Rc<Environment>, destination: &Option<Rc<Pair>>) -> Vec<Frame> {
    body.iter()
        .collect_vec()
        .into_iter()
        .rev()
        .map(|expr| Frame::new(&expr, env, destination.clone()))
        .collect()
}

fn needs_evaluation(expr: &Expr) -> bool {
    match expr {
        Expr::Symbol(_) | Expr::Keyword(_) => true,
        Expr::Pair(_) => expr.is_list(),
        _ => false,
    }
}

/// The value of an operand that can be had without a frame: a variable or a
/// self-evaluating atom. `None` when the operand needs a frame of its own.
fn trivial_value(expr: &Expr, env: &Rc<Environment>) -> Result<Option<Expr>> {
    match expr {
        Expr::Symbol(symbol) => env.get(symbol).map(Some),
        _ if needs_evaluation(expr) => Ok(None),
        other => Ok(Some(other.clone())),
    }
}

fn step_begin(frame: &Frame, operands: &Expr) -> Transition {
    if operands.is_nil() {
        return Transition::Return(Expr::Void);
    }
    Transition::Replace(body_frames(operands, &frame.env, &frame.destination))
}

fn step_if(frame: &mut Frame, operands: &Expr) -> Result<Transition> {
    let (test, consequent, alternate) = special::conditional(operands)?;
    if !frame.pushed {
        frame.pushed = true;
        let child = Frame::new(&test.car(), &frame.env, Some(test));
        return Ok(Transition::Suspend(vec![child]));
    }

    if test.car().is_true() {
        Ok(frame.rewrite(&consequent))
    } else {
        match alternate {
            Some(alternate) => Ok(frame.rewrite(&alternate)),
            None => Ok(Transition::Return(Expr::Void)),
        }
    }
}

fn step_define(frame: &mut Frame, operands: &Expr) -> Result<Transition> {
    match special::definition(operands, &frame.env)? {
        Definition::Procedure(name, closure) => Ok(Transition::Return(frame.env.bind(name, closure))),
        Definition::Variable(name, value) if frame.pushed => Ok(Transition::Return(frame.env.bind(name, value.car()))),
        Definition::Variable(_, value) => {
            frame.pushed = true;
            let child = Frame::new(&value.car(), &frame.env, Some(value));
            Ok(Transition::Suspend(vec![child]))
        }
    }
}

fn step_set_bang(frame: &mut Frame, operands: &Expr) -> Result<Transition> {
    let (name, value) = special::assignment(operands)?;
    if frame.pushed {
        return Ok(Transition::Return(frame.env.set(&name, value.car())?));
    }
    frame.pushed = true;
    let child = Frame::new(&value.car(), &frame.env, Some(value));
    Ok(Transition::Suspend(vec![child]))
}

/// `and` (conjunction) and `or`. Operands are consumed from the front of the
/// frame's own copy of the form; the last one is evaluated in tail position.
fn step_logical(frame: &mut Frame, form: &Rc<Pair>, conjunction: bool) -> Result<Transition> {
    loop {
        let cell = match form.cdr() {
            Expr::Nil => return Ok(Transition::Return(Expr::Boolean(conjunction))),
            Expr::Pair(cell) => cell,
            other => return Err(SchemeError::syntax(format!("malformed operands: {}", other))),
        };

        let value = if frame.pushed {
            frame.pushed = false;
            cell.car()
        } else if cell.cdr().is_nil() {
            return Ok(frame.rewrite(&cell.car()));
        } else {
            match trivial_value(&cell.car(), &frame.env)? {
                Some(value) => value,
                None => {
                    frame.pushed = true;
                    let child = Frame::new(&cell.car(), &frame.env, Some(cell));
                    return Ok(Transition::Suspend(vec![child]));
                }
            }
        };

        if value.is_true() != conjunction {
            return Ok(Transition::Return(if conjunction { Expr::Boolean(false) } else { value }));
        }
        form.set_cdr(cell.cdr());
    }
}

/// Clauses are tested front to back; a failed clause is dropped from the
/// frame's copy of the form and a matching clause's body replaces the frame.
fn step_cond(frame: &mut Frame, form: &Rc<Pair>) -> Result<Transition> {
    loop {
        let cell = match form.cdr() {
            Expr::Nil => return Ok(Transition::Return(Expr::Boolean(false))),
            Expr::Pair(cell) => cell,
            other => return Err(SchemeError::syntax(format!("malformed cond clauses: {}", other))),
        };
        let clause = special::cond_clause(&cell.car())?;

        let test = if frame.pushed {
            frame.pushed = false;
            clause.car()
        } else {
            match clause.car() {
                Expr::Keyword(Keyword::Else) => Expr::Boolean(true),
                test => match trivial_value(&test, &frame.env)? {
                    Some(value) => value,
                    None => {
                        // The test value lands in a private head cell, leaving the clause syntax intact
                        let head = Pair::new(test.clone(), clause.cdr());
                        cell.set_car(Expr::Pair(head.clone()));
                        frame.pushed = true;
                        let child = Frame::new(&test, &frame.env, Some(head));
                        return Ok(Transition::Suspend(vec![child]));
                    }
                },
            }
        };

        if test.is_true() {
            let body = clause.cdr();
            if body.is_nil() {
                return Ok(Transition::Return(test));
            }
            return Ok(frame.rewrite(&special::sequence(body)));
        }
        form.set_cdr(cell.cdr());
    }
}
