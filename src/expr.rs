use core::fmt;
use std::{cell::RefCell, collections::HashSet, rc::Rc};

use itertools::Itertools;

use crate::{error::{Result, SchemeError}, number::Number, port::Port, procedure::Procedure, special::Keyword};


thread_local! {
    static SYMBOLS: RefCell<HashSet<Rc<str>>> = RefCell::new(HashSet::new());
}

/// An interned identifier. Two symbols with the same name share storage.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        SYMBOLS.with(|symbols| {
            let mut symbols = symbols.borrow_mut();
            if let Some(interned) = symbols.get(name) {
                return Self(interned.clone());
            }
            let interned: Rc<str> = Rc::from(name);
            symbols.insert(interned.clone());
            Self(interned)
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cons cell. Both slots are mutable so evaluators and `set-car!` can write
/// into them.
pub struct Pair {
    car: RefCell<Expr>,
    cdr: RefCell<Expr>,
}

impl Pair {
    pub fn new(car: Expr, cdr: Expr) -> Rc<Self> {
        Rc::new(Self { car: RefCell::new(car), cdr: RefCell::new(cdr) })
    }

    pub fn car(&self) -> Expr {
        self.car.borrow().clone()
    }

    pub fn cdr(&self) -> Expr {
        self.cdr.borrow().clone()
    }

    pub fn set_car(&self, value: Expr) {
        *self.car.borrow_mut() = value;
    }

    pub fn set_cdr(&self, value: Expr) {
        *self.cdr.borrow_mut() = value;
    }
}

impl Drop for Pair {
    fn drop(&mut self) {
        // Unlink the spine iteratively so dropping a long list does not recurse once per element
        let mut next = std::mem::replace(self.cdr.get_mut(), Expr::Nil);
        while let Expr::Pair(pair) = next {
            match Rc::try_unwrap(pair) {
                Ok(mut pair) => next = std::mem::replace(pair.cdr.get_mut(), Expr::Nil),
                Err(_) => break,
            }
        }
    }
}

/// Every runtime value of the language.
#[derive(Clone)]
pub enum Expr {
    Nil,
    Boolean(bool),
    Number(Number),
    Character(char),
    Str(Rc<RefCell<String>>),
    Symbol(Symbol),
    Keyword(Keyword),
    Pair(Rc<Pair>),
    Vector(Rc<RefCell<Vec<Expr>>>),
    ByteVector(Rc<RefCell<Vec<u8>>>),
    Procedure(Procedure),
    Port(Rc<Port>),
    Eof,
    Void,
}

/// Iterates over the elements of a list, stopping at the first non-pair tail.
pub struct ListIter {
    current: Expr,
}

impl Iterator for ListIter {
    type Item = Expr;

    fn next(&mut self) -> Option<Expr> {
        match std::mem::replace(&mut self.current, Expr::Nil) {
            Expr::Pair(pair) => {
                self.current = pair.cdr();
                Some(pair.car())
            }
            _ => None,
        }
    }
}

/// Iterates over the cells of a list, so callers can write into each `car`.
pub struct CellIter {
    current: Expr,
}

impl Iterator for CellIter {
    type Item = Rc<Pair>;

    fn next(&mut self) -> Option<Rc<Pair>> {
        match std::mem::replace(&mut self.current, Expr::Nil) {
            Expr::Pair(pair) => {
                self.current = pair.cdr();
                Some(pair)
            }
            _ => None,
        }
    }
}

impl Expr {
    pub fn cons(car: Expr, cdr: Expr) -> Self {
        Self::Pair(Pair::new(car, cdr))
    }

    pub fn list(items: impl IntoIterator<Item = Expr>) -> Self {
        Self::list_with_tail(items, Self::Nil)
    }

    pub fn list_with_tail(items: impl IntoIterator<Item = Expr>, tail: Expr) -> Self {
        let items = items.into_iter().collect_vec();
        items.into_iter().rev().fold(tail, |rest, item| Self::cons(item, rest))
    }

    pub fn integer(value: i64) -> Self {
        Self::Number(Number::Integer(value))
    }

    pub fn real(value: f64) -> Self {
        Self::Number(Number::Real(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(Rc::new(RefCell::new(value.into())))
    }

    pub fn symbol(name: &str) -> Self {
        Self::Symbol(Symbol::new(name))
    }

    pub fn vector(items: Vec<Expr>) -> Self {
        Self::Vector(Rc::new(RefCell::new(items)))
    }

    pub fn byte_vector(bytes: Vec<u8>) -> Self {
        Self::ByteVector(Rc::new(RefCell::new(bytes)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Everything except `#f` counts as true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Self::Boolean(false))
    }

    /// A proper list is a finite chain of pairs ending in the empty list.
    /// Circular chains are caught by a second cursor moving at half speed.
    pub fn is_list(&self) -> bool {
        let mut fast = self.clone();
        let mut slow = self.clone();
        loop {
            for _ in 0..2 {
                fast = match fast {
                    Self::Nil => return true,
                    Self::Pair(pair) => pair.cdr(),
                    _ => return false,
                };
            }
            slow = match slow {
                Self::Pair(pair) => pair.cdr(),
                _ => return false,
            };
            if let (Self::Pair(a), Self::Pair(b)) = (&fast, &slow) {
                if Rc::ptr_eq(a, b) { return false; }
            }
        }
    }

    pub fn iter(&self) -> ListIter {
        ListIter { current: self.clone() }
    }

    pub fn cells(&self) -> CellIter {
        CellIter { current: self.clone() }
    }

    pub fn to_vec(&self) -> Result<Vec<Expr>> {
        if !self.is_list() {
            return Err(SchemeError::evaluation(format!("expected a proper list, got {}", self)));
        }
        Ok(self.iter().collect())
    }

    pub fn as_pair(&self) -> Option<&Rc<Pair>> {
        match self {
            Self::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Copies the cells of a proper list, sharing the elements. Anything else
    /// is returned as is.
    pub fn copy_spine(&self) -> Self {
        match self {
            Self::Pair(_) if self.is_list() => Self::list(self.iter()),
            other => other.clone(),
        }
    }

    /// Identity comparison, except for atoms which compare by value.
    pub fn eqv(&self, other: &Expr) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) | (Self::Eof, Self::Eof) | (Self::Void, Self::Void) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(Number::Integer(a)), Self::Number(Number::Integer(b))) => a == b,
            (Self::Number(Number::Real(a)), Self::Number(Number::Real(b))) => a == b,
            (Self::Character(a), Self::Character(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Keyword(a), Self::Keyword(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => Rc::ptr_eq(a, b),
            (Self::Pair(a), Self::Pair(b)) => Rc::ptr_eq(a, b),
            (Self::Vector(a), Self::Vector(b)) => Rc::ptr_eq(a, b),
            (Self::ByteVector(a), Self::ByteVector(b)) => Rc::ptr_eq(a, b),
            (Self::Procedure(a), Self::Procedure(b)) => a.ptr_eq(b),
            (Self::Port(a), Self::Port(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Structural equality: composite values compare element-wise, numbers
    /// compare by value across integer and real, opaque handles by identity.
    pub fn equal(&self, other: &Expr) -> bool {
        let (mut left, mut right) = (self.clone(), other.clone());
        loop {
            (left, right) = match (&left, &right) {
                (Self::Pair(a), Self::Pair(b)) => {
                    if Rc::ptr_eq(a, b) { return true; }
                    if !a.car().equal(&b.car()) { return false; }
                    (a.cdr(), b.cdr())
                }
                (Self::Number(a), Self::Number(b)) => return a.numeric_eq(*b),
                (Self::Str(a), Self::Str(b)) => return *a.borrow() == *b.borrow(),
                (Self::Vector(a), Self::Vector(b)) => {
                    let (a, b) = (a.borrow(), b.borrow());
                    return a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.equal(b));
                }
                (Self::ByteVector(a), Self::ByteVector(b)) => return *a.borrow() == *b.borrow(),
                _ => return left.eqv(&right),
            };
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "empty list",
            Self::Boolean(_) => "boolean",
            Self::Number(Number::Integer(_)) => "integer",
            Self::Number(Number::Real(_)) => "real",
            Self::Character(_) => "character",
            Self::Str(_) => "string",
            Self::Symbol(_) | Self::Keyword(_) => "symbol",
            Self::Pair(_) => "pair",
            Self::Vector(_) => "vector",
            Self::ByteVector(_) => "bytevector",
            Self::Procedure(_) => "procedure",
            Self::Port(_) => "port",
            Self::Eof => "eof",
            Self::Void => "void",
        }
    }

    /// The `display` rendering: like `Display` but strings and characters are
    /// written raw.
    pub fn display(&self) -> Displayed<'_> {
        Displayed(self)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, write: bool) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "()"),
            Self::Boolean(value) => write!(f, "{}", if *value { "#t" } else { "#f" }),
            Self::Number(number) => write!(f, "{}", number),
            Self::Character(c) if !write => write!(f, "{}", c),
            Self::Character(c) => match CHARACTER_NAMES.iter().find(|(_, named)| named == c) {
                Some((name, _)) => write!(f, "#\\{}", name),
                None => write!(f, "#\\{}", c),
            },
            Self::Str(value) if !write => write!(f, "{}", value.borrow()),
            Self::Str(value) => write_string_literal(f, &value.borrow()),
            Self::Symbol(symbol) => write!(f, "{}", symbol),
            Self::Keyword(keyword) => write!(f, "{}", keyword.name()),
            Self::Pair(pair) => {
                write!(f, "(")?;
                pair.car().render(f, write)?;
                let mut rest = pair.cdr();
                // Trails `rest` at half speed; meeting it means the tail is circular
                let mut lagging = pair.clone();
                let mut advance = false;
                loop {
                    match rest {
                        Self::Nil => break,
                        Self::Pair(next) if Rc::ptr_eq(&next, &lagging) => {
                            write!(f, " ...")?;
                            break;
                        }
                        Self::Pair(next) => {
                            write!(f, " ")?;
                            next.car().render(f, write)?;
                            rest = next.cdr();
                            if advance {
                                if let Self::Pair(behind) = lagging.cdr() { lagging = behind; }
                            }
                            advance = !advance;
                        }
                        tail => {
                            write!(f, " . ")?;
                            tail.render(f, write)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Self::Vector(items) => {
                write!(f, "#(")?;
                for (index, item) in items.borrow().iter().enumerate() {
                    if index > 0 { write!(f, " ")?; }
                    item.render(f, write)?;
                }
                write!(f, ")")
            }
            Self::ByteVector(bytes) => write!(f, "#vu8({})", bytes.borrow().iter().join(" ")),
            Self::Procedure(procedure) => match procedure.name() {
                Some(name) => write!(f, "#<procedure {}>", name),
                None => write!(f, "#<procedure>"),
            },
            Self::Port(_) => write!(f, "#<port>"),
            Self::Eof => write!(f, "#<eof>"),
            Self::Void => write!(f, "#<void>"),
        }
    }
}

/// Named characters understood by the reader and used by the printer.
pub(crate) const CHARACTER_NAMES: &[(&str, char)] = &[
    ("space", ' '),
    ("newline", '\n'),
    ("tab", '\t'),
    ("return", '\r'),
    ("nul", '\0'),
    ("alarm", '\x07'),
    ("backspace", '\x08'),
    ("delete", '\x7f'),
    ("escape", '\x1b'),
    ("linefeed", '\n'),
];

fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in value.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, true)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}

pub struct Displayed<'a>(&'a Expr);

impl fmt::Display for Displayed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render(f, false)
    }
}

impl From<Number> for Expr {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Expr {
        Expr::list([Expr::integer(1), Expr::list([Expr::string("a\"b"), Expr::Boolean(false)]), Expr::real(2.5)])
    }

    #[test]
    fn renders_lists_and_pairs() {
        assert_eq!(sample().to_string(), r#"(1 ("a\"b" #f) 2.5)"#);
        assert_eq!(Expr::cons(Expr::symbol("a"), Expr::symbol("b")).to_string(), "(a . b)");
        assert_eq!(Expr::list_with_tail([Expr::integer(1), Expr::integer(2)], Expr::integer(3)).to_string(), "(1 2 . 3)");
        assert_eq!(Expr::Character(' ').to_string(), "#\\space");
        assert_eq!(Expr::byte_vector(vec![1, 255]).to_string(), "#vu8(1 255)");
        assert_eq!(Expr::vector(vec![Expr::Nil, Expr::Character('x')]).to_string(), "#(() #\\x)");
    }

    #[test]
    fn display_writes_strings_raw() {
        let value = Expr::list([Expr::string("hi"), Expr::Character('c')]);
        assert_eq!(value.display().to_string(), "(hi c)");
    }

    #[test]
    fn structural_equality() {
        assert!(sample().equal(&sample()));
        assert!(!sample().eqv(&sample()));
        assert!(Expr::integer(1).equal(&Expr::real(1.0)));
        assert!(!Expr::integer(1).eqv(&Expr::real(1.0)));
        assert!(Expr::vector(vec![Expr::integer(1)]).equal(&Expr::vector(vec![Expr::real(1.0)])));
        assert!(!Expr::list([Expr::integer(1)]).equal(&Expr::list([Expr::integer(1), Expr::integer(2)])));
    }

    #[test]
    fn proper_list_detection() {
        assert!(Expr::Nil.is_list());
        assert!(sample().is_list());
        assert!(!Expr::cons(Expr::integer(1), Expr::integer(2)).is_list());
        assert!(Expr::cons(Expr::integer(1), Expr::integer(2)).to_vec().is_err());
    }

    #[test]
    fn circular_lists_are_not_proper() {
        let list = Expr::list([Expr::integer(1), Expr::integer(2), Expr::integer(3)]);
        let last = list.cells().last().unwrap();
        last.set_cdr(list.clone());

        assert!(!list.is_list());
        assert!(list.to_vec().is_err());
        assert!(list.copy_spine().as_pair().is_some_and(|pair| Rc::ptr_eq(pair, list.as_pair().unwrap())));
        assert!(list.to_string().starts_with("(1 2 3"));
        assert!(list.to_string().ends_with(" ...)"));

        let single = Expr::list([Expr::integer(1)]);
        single.as_pair().unwrap().set_cdr(single.clone());
        assert!(!single.is_list());
        assert_eq!(single.to_string(), "(1 ...)");

        // Break the cycles so the cells are freed
        last.set_cdr(Expr::Nil);
        single.as_pair().unwrap().set_cdr(Expr::Nil);
    }

    #[test]
    fn copy_spine_does_not_alias_cells() {
        let original = sample();
        let copy = original.copy_spine();
        copy.as_pair().unwrap().set_car(Expr::symbol("changed"));
        assert_eq!(original.to_string(), r#"(1 ("a\"b" #f) 2.5)"#);
        assert_eq!(copy.to_string(), r#"(changed ("a\"b" #f) 2.5)"#);
    }

    #[test]
    fn symbols_are_interned() {
        let (a, b) = (Symbol::new("alpha"), Symbol::new("alpha"));
        assert!(Rc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn long_lists_drop_without_recursing() {
        let list = Expr::list((0..200_000).map(Expr::integer));
        assert_eq!(list.iter().count(), 200_000);
        drop(list);
    }
}
