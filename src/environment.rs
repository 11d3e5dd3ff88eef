use core::fmt;
use std::{cell::RefCell, collections::HashMap, rc::{Rc, Weak}};

use crate::{
    error::{Result, SchemeError},
    expr::{Expr, Symbol},
    procedure::{Closure, Procedure},
};


/// One frame of lexical scope. Lookups walk outward through `parent` and stop
/// at the first frame holding the name.
///
/// A named `let` procedure is reachable from its own scope only through the
/// weak `recursion` slot. Frames created by calling a closure keep it alive
/// through `caller`, so the weak slot can always be upgraded while anything
/// can still see the scope.
pub struct Environment {
    bindings: RefCell<HashMap<Symbol, Expr>>,
    parent: Option<Rc<Environment>>,
    recursion: Option<(Symbol, Weak<Closure>)>,
    caller: Option<Rc<Closure>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.bindings.borrow().len())
            .field("parent", &self.parent.is_some())
            .field("recursion", &self.recursion.as_ref().map(|(name, _)| name))
            .field("caller", &self.caller.as_ref().and_then(|closure| closure.name.as_ref()))
            .finish()
    }
}

impl Environment {
    fn frame(parent: Option<Rc<Self>>, recursion: Option<(Symbol, Weak<Closure>)>, caller: Option<Rc<Closure>>) -> Rc<Self> {
        Rc::new(Self { bindings: RefCell::new(HashMap::new()), parent, recursion, caller })
    }

    /// A root frame with no bindings.
    pub fn new() -> Rc<Self> {
        Self::frame(None, None, None)
    }

    pub fn extend(parent: &Rc<Self>) -> Rc<Self> {
        Self::frame(Some(parent.clone()), None, None)
    }

    /// The frame for one call of `closure`.
    pub(crate) fn call(closure: &Rc<Closure>) -> Rc<Self> {
        Self::frame(Some(closure.env.clone()), None, Some(closure.clone()))
    }

    /// The scope of a named `let`, where `name` refers to the loop procedure.
    pub(crate) fn recursive(parent: &Rc<Self>, name: Symbol, procedure: Weak<Closure>) -> Rc<Self> {
        Self::frame(Some(parent.clone()), Some((name, procedure)), None)
    }

    /// Inserts or overwrites `name` in this frame and returns the value.
    pub fn bind(&self, name: Symbol, value: Expr) -> Expr {
        self.bindings.borrow_mut().insert(name, value.clone());
        value
    }

    pub fn contains(&self, name: &Symbol) -> bool {
        self.bindings.borrow().contains_key(name)
            || self.recursion.as_ref().is_some_and(|(bound, _)| bound == name)
    }

    fn lookup(&self, name: &Symbol) -> Option<Expr> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        match &self.recursion {
            Some((bound, procedure)) if bound == name => procedure.upgrade().map(|closure| Expr::Procedure(Procedure::Closure(closure))),
            _ => None,
        }
    }

    /// The innermost frame binding `name`.
    pub fn find(self: &Rc<Self>, name: &Symbol) -> Result<Rc<Self>> {
        let mut frame = self;
        loop {
            if frame.contains(name) {
                return Ok(frame.clone());
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => return Err(SchemeError::unbound(name.as_str())),
            }
        }
    }

    pub fn get(&self, name: &Symbol) -> Result<Expr> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.lookup(name) {
                return Ok(value);
            }
            match &frame.parent {
                Some(parent) => frame = &**parent,
                None => return Err(SchemeError::unbound(name.as_str())),
            }
        }
    }

    /// Overwrites an existing binding wherever it lives in the chain.
    pub fn set(self: &Rc<Self>, name: &Symbol, value: Expr) -> Result<Expr> {
        Ok(self.find(name)?.bind(name.clone(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() -> Result<()> {
        let global = Environment::new();
        global.bind(Symbol::new("x"), Expr::integer(1));
        let inner = Environment::extend(&global);
        inner.bind(Symbol::new("y"), Expr::integer(2));

        assert!(inner.get(&Symbol::new("x"))?.equal(&Expr::integer(1)));
        assert!(inner.get(&Symbol::new("y"))?.equal(&Expr::integer(2)));
        assert!(matches!(global.get(&Symbol::new("y")), Err(SchemeError::UnboundVariable { .. })));
        Ok(())
    }

    #[test]
    fn inner_binding_shadows() -> Result<()> {
        let global = Environment::new();
        global.bind(Symbol::new("x"), Expr::integer(1));
        let inner = Environment::extend(&global);
        inner.bind(Symbol::new("x"), Expr::integer(2));

        assert!(inner.get(&Symbol::new("x"))?.equal(&Expr::integer(2)));
        assert!(global.get(&Symbol::new("x"))?.equal(&Expr::integer(1)));
        Ok(())
    }

    #[test]
    fn set_overwrites_the_defining_frame() -> Result<()> {
        let global = Environment::new();
        global.bind(Symbol::new("x"), Expr::integer(1));
        let inner = Environment::extend(&global);

        inner.set(&Symbol::new("x"), Expr::integer(5))?;
        assert!(!inner.contains(&Symbol::new("x")));
        assert!(global.get(&Symbol::new("x"))?.equal(&Expr::integer(5)));
        Ok(())
    }

    #[test]
    fn set_requires_an_existing_binding() {
        let global = Environment::new();
        let result = global.set(&Symbol::new("missing"), Expr::integer(1));
        assert!(matches!(result, Err(SchemeError::UnboundVariable { name, .. }) if name == "missing"));
    }
}
