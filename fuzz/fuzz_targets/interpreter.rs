#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};
use schemer::{Config, Interpreter, Strategy};

// Natives, literals and a small pool of variables
#[derive(Arbitrary, Debug)]
enum SchemeAtom {
    Add, Sub, Mul, Div,
    True, False, Nil,
    Greater, GreaterEq,
    Less, LessEq, Eq,

    List, Car, Cdr, Length,
    ListRef, Append, Map,
    Filter, Reduce, Apply,

    Variable(u8),
    Integer(i64),
    Real(f64),
    Text(String),
}

fn variable(index: u8) -> String {
    format!("v{}", index % 4)
}

impl fmt::Display for SchemeAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            SchemeAtom::Add => "+",
            SchemeAtom::Sub => "-",
            SchemeAtom::Mul => "*",
            SchemeAtom::Div => "/",
            SchemeAtom::True => "#t",
            SchemeAtom::False => "#f",
            SchemeAtom::Nil => "'()",
            SchemeAtom::Greater => ">",
            SchemeAtom::GreaterEq => ">=",
            SchemeAtom::Less => "<",
            SchemeAtom::LessEq => "<=",
            SchemeAtom::Eq => "=",
            SchemeAtom::List => "list",
            SchemeAtom::Car => "car",
            SchemeAtom::Cdr => "cdr",
            SchemeAtom::Length => "length",
            SchemeAtom::ListRef => "list-ref",
            SchemeAtom::Append => "append",
            SchemeAtom::Map => "map",
            SchemeAtom::Filter => "filter",
            SchemeAtom::Reduce => "reduce",
            SchemeAtom::Apply => "apply",
            SchemeAtom::Variable(index) => return write!(f, "{}", variable(*index)),
            SchemeAtom::Integer(value) => return write!(f, "{}", value),
            SchemeAtom::Real(value) => return write!(f, "{}", schemer::Number::Real(*value)),
            SchemeAtom::Text(value) => return write!(f, "{}", schemer::Expr::string(value.as_str())),
        })
    }
}

// No closures are generated, so every program terminates
#[derive(Arbitrary, Debug)]
enum SchemeCommand {
    Define(u8, Box<SchemeCommand>),
    Set(u8, Box<SchemeCommand>),
    Let(Vec<(u8, SchemeCommand)>, Vec<SchemeCommand>),
    If(Vec<SchemeCommand>),
    Cond(Vec<Vec<SchemeCommand>>),
    And(Vec<SchemeCommand>),
    Or(Vec<SchemeCommand>),
    Not(Vec<SchemeCommand>),
    Cons(Vec<SchemeCommand>),
    Begin(Vec<SchemeCommand>),
    Quote(Box<SchemeCommand>),
    Call(Vec<SchemeCommand>),

    Atom(SchemeAtom),
}

fn stringify_arguments(values: &[SchemeCommand]) -> String {
    values.iter()
        .map(SchemeCommand::to_string)
        .join(" ")
}

impl fmt::Display for SchemeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemeCommand::Atom(atom) => atom.fmt(f),
            SchemeCommand::Define(name, value) => write!(f, "(define {} {})", variable(*name), value),
            SchemeCommand::Set(name, value) => write!(f, "(set! {} {})", variable(*name), value),
            SchemeCommand::Let(bindings, body) => {
                let bindings = bindings.iter()
                    .map(|(name, value)| format!("({} {})", variable(*name), value))
                    .join(" ");
                write!(f, "(let ({}) {})", bindings, stringify_arguments(body))
            }
            SchemeCommand::Cond(clauses) => {
                let clauses = clauses.iter()
                    .map(|clause| format!("({})", stringify_arguments(clause)))
                    .join(" ");
                write!(f, "(cond {})", clauses)
            }
            SchemeCommand::Quote(quoted) => write!(f, "'{}", quoted),
            SchemeCommand::Call(args) => write!(f, "({})", stringify_arguments(args)),
            SchemeCommand::If(args) |
            SchemeCommand::And(args) |
            SchemeCommand::Or(args) |
            SchemeCommand::Not(args) |
            SchemeCommand::Cons(args) |
            SchemeCommand::Begin(args) => {
                let head = match self {
                    SchemeCommand::If(_) => "if",
                    SchemeCommand::And(_) => "and",
                    SchemeCommand::Or(_) => "or",
                    SchemeCommand::Not(_) => "not",
                    SchemeCommand::Cons(_) => "cons",
                    _ => "begin",
                };
                write!(f, "({} {})", head, stringify_arguments(args))
            }
        }
    }
}

fn interpreter(strategy: Strategy) -> Interpreter {
    Interpreter::with_config(Config { strategy, ..Config::default() }).expect("standard environment loads")
}

// Both evaluators must agree on every value and on every error class
fuzz_target!(|commands: Vec<SchemeCommand>| {
    let recursive = interpreter(Strategy::Recursive);
    let stack = interpreter(Strategy::Stack);

    for command in commands {
        let command = command.to_string();
        let expected = recursive.eval_str(&command).map(|value| value.to_string()).map_err(|error| error.kind());
        let actual = stack.eval_str(&command).map(|value| value.to_string()).map_err(|error| error.kind());
        assert_eq!(expected, actual, "evaluators disagree on {}", command);
    }
});
