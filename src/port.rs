use core::fmt;
use std::{cell::{Cell, RefCell}, collections::VecDeque, io::{BufRead, Write}, rc::Rc};

use crate::error::{Result, SchemeError};


enum PortKind {
    StringInput(RefCell<VecDeque<char>>),
    StringOutput(RefCell<String>),
    Stdout,
    /// Characters of the current line that have not been consumed yet.
    Stdin(RefCell<VecDeque<char>>),
}

/// A character port. Input ports can be read and peeked, output ports
/// written; either kind can be closed, after which every operation fails.
pub struct Port {
    kind: PortKind,
    closed: Cell<bool>,
}

thread_local! {
    static STDOUT: Rc<Port> = Rc::new(Port::new(PortKind::Stdout));
    static STDIN: Rc<Port> = Rc::new(Port::new(PortKind::Stdin(RefCell::new(VecDeque::new()))));
}

impl Port {
    fn new(kind: PortKind) -> Self {
        Self { kind, closed: Cell::new(false) }
    }

    pub fn input_string(text: &str) -> Rc<Self> {
        Rc::new(Self::new(PortKind::StringInput(RefCell::new(text.chars().collect()))))
    }

    pub fn output_string() -> Rc<Self> {
        Rc::new(Self::new(PortKind::StringOutput(RefCell::new(String::new()))))
    }

    pub fn stdout() -> Rc<Self> {
        STDOUT.with(Rc::clone)
    }

    pub fn stdin() -> Rc<Self> {
        STDIN.with(Rc::clone)
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, PortKind::StringInput(_) | PortKind::Stdin(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, PortKind::StringOutput(_) | PortKind::Stdout)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn close(&self) {
        self.closed.set(true);
    }

    fn open(&self) -> Result<()> {
        match self.closed.get() {
            true => Err(SchemeError::evaluation("port is closed")),
            false => Ok(()),
        }
    }

    fn pending(&self) -> Result<&RefCell<VecDeque<char>>> {
        self.open()?;
        match &self.kind {
            PortKind::StringInput(pending) => Ok(pending),
            PortKind::Stdin(pending) => {
                if pending.borrow().is_empty() {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)
                        .map_err(|error| SchemeError::evaluation(format!("cannot read standard input: {}", error)))?;
                    pending.borrow_mut().extend(line.chars());
                }
                Ok(pending)
            }
            _ => Err(SchemeError::evaluation("not an input port")),
        }
    }

    /// Consumes the next character; `None` at end of input.
    pub fn read_char(&self) -> Result<Option<char>> {
        Ok(self.pending()?.borrow_mut().pop_front())
    }

    pub fn peek_char(&self) -> Result<Option<char>> {
        Ok(self.pending()?.borrow().front().copied())
    }

    /// String ports never block. Standard input is reported ready as a read
    /// would at worst wait for the rest of a line.
    pub fn char_ready(&self) -> Result<bool> {
        self.open()?;
        match &self.kind {
            PortKind::StringInput(_) | PortKind::Stdin(_) => Ok(true),
            _ => Err(SchemeError::evaluation("not an input port")),
        }
    }

    pub fn write_str(&self, text: &str) -> Result<()> {
        self.open()?;
        match &self.kind {
            PortKind::StringOutput(buffer) => {
                buffer.borrow_mut().push_str(text);
                Ok(())
            }
            PortKind::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(text.as_bytes())
                    .and_then(|_| stdout.flush())
                    .map_err(|error| SchemeError::evaluation(format!("cannot write to standard output: {}", error)))
            }
            _ => Err(SchemeError::evaluation("not an output port")),
        }
    }

    pub fn write_char(&self, c: char) -> Result<()> {
        self.write_str(c.encode_utf8(&mut [0; 4]))
    }

    /// Everything written so far to a string output port.
    pub fn output(&self) -> Result<String> {
        match &self.kind {
            PortKind::StringOutput(buffer) => Ok(buffer.borrow().clone()),
            _ => Err(SchemeError::evaluation("not a string output port")),
        }
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PortKind::StringInput(_) => "string input",
            PortKind::StringOutput(_) => "string output",
            PortKind::Stdout => "stdout",
            PortKind::Stdin(_) => "stdin",
        };
        write!(f, "Port({}{})", kind, if self.is_closed() { ", closed" } else { "" })
    }
}
