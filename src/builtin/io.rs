use std::rc::Rc;

use crate::{
    error::Result,
    evaluator::Evaluator,
    expr::Expr,
    port::Port,
    procedure::Arity,
};

use super::{boolean, type_error, Builtin};


pub(super) const BUILTINS: &[Builtin] = &[
    ("display", Arity::Between(1, 2), builtin_display),
    ("write", Arity::Between(1, 2), builtin_write),
    ("newline", Arity::Between(0, 1), builtin_newline),
    ("write-char", Arity::Between(1, 2), builtin_write_char),
    ("read-char", Arity::Between(0, 1), builtin_read_char),
    ("peek-char", Arity::Between(0, 1), builtin_peek_char),
    ("char-ready?", Arity::Between(0, 1), builtin_char_ready),
    ("close-port", Arity::Exact(1), builtin_close_port),
    ("input-port?", Arity::Exact(1), builtin_is_input_port),
    ("output-port?", Arity::Exact(1), builtin_is_output_port),
    ("open-input-string", Arity::Exact(1), builtin_open_input_string),
    ("open-output-string", Arity::Exact(0), builtin_open_output_string),
    ("get-output-string", Arity::Exact(1), builtin_get_output_string),
    ("current-output-port", Arity::Exact(0), builtin_current_output_port),
    ("eof-object", Arity::Exact(0), builtin_eof_object),
    ("eof-object?", Arity::Exact(1), builtin_is_eof_object),
];

/// The optional port argument at `index`, or the standard port.
fn port_arg(name: &str, values: &[Expr], index: usize, standard: fn() -> Rc<Port>) -> Result<Rc<Port>> {
    match values.get(index) {
        None => Ok(standard()),
        Some(Expr::Port(port)) => Ok(port.clone()),
        Some(other) => Err(type_error(name, "a port", other)),
    }
}

fn character(read: Option<char>) -> Expr {
    read.map(Expr::Character).unwrap_or(Expr::Eof)
}

fn builtin_display(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    port_arg("display", values, 1, Port::stdout)?.write_str(&values[0].display().to_string())?;
    Ok(Expr::Void)
}

fn builtin_write(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    port_arg("write", values, 1, Port::stdout)?.write_str(&values[0].to_string())?;
    Ok(Expr::Void)
}

fn builtin_newline(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    port_arg("newline", values, 0, Port::stdout)?.write_char('\n')?;
    Ok(Expr::Void)
}

fn builtin_write_char(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let Expr::Character(c) = values[0] else { return Err(type_error("write-char", "a character", &values[0])) };
    port_arg("write-char", values, 1, Port::stdout)?.write_char(c)?;
    Ok(Expr::Void)
}

fn builtin_read_char(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(character(port_arg("read-char", values, 0, Port::stdin)?.read_char()?))
}

fn builtin_peek_char(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(character(port_arg("peek-char", values, 0, Port::stdin)?.peek_char()?))
}

fn builtin_char_ready(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(port_arg("char-ready?", values, 0, Port::stdin)?.char_ready()?)
}

fn builtin_close_port(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Port(port) => {
            port.close();
            Ok(Expr::Void)
        }
        other => Err(type_error("close-port", "a port", other)),
    }
}

fn builtin_is_input_port(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(&values[0], Expr::Port(port) if port.is_input()))
}

fn builtin_is_output_port(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(&values[0], Expr::Port(port) if port.is_output()))
}

fn builtin_open_input_string(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Str(text) => Ok(Expr::Port(Port::input_string(&text.borrow()))),
        other => Err(type_error("open-input-string", "a string", other)),
    }
}

fn builtin_open_output_string(_: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Port(Port::output_string()))
}

fn builtin_get_output_string(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Port(port) => Ok(Expr::string(port.output()?)),
        other => Err(type_error("get-output-string", "a port", other)),
    }
}

fn builtin_current_output_port(_: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Port(Port::stdout()))
}

fn builtin_eof_object(_: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::Eof)
}

fn builtin_is_eof_object(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Eof))
}

#[cfg(test)]
mod tests {
    use crate::builtin::tests::run;

    #[test]
    fn string_output_ports() -> anyhow::Result<()> {
        let source = "
            (define out (open-output-string))
            (display \"a\\\"b\" out)
            (write \"a\\\"b\" out)
            (write-char #\\! out)
            (newline out)
            (display '(1 #\\x) out)
            (get-output-string out)";
        assert_eq!(run(source)?, r#""a\"b\"a\\\"b\"!\n(1 x)""#);
        Ok(())
    }

    #[test]
    fn string_input_ports() -> anyhow::Result<()> {
        let source = "
            (define in (open-input-string \"hi\"))
            (list (peek-char in) (read-char in) (read-char in) (char-ready? in) (eof-object? (read-char in)))";
        assert_eq!(run(source)?, r"(#\h #\h #\i #t #t)");
        Ok(())
    }

    #[test]
    fn port_predicates() -> anyhow::Result<()> {
        assert_eq!(run("(input-port? (open-input-string \"\"))")?, "#t");
        assert_eq!(run("(output-port? (open-input-string \"\"))")?, "#f");
        assert_eq!(run("(output-port? (current-output-port))")?, "#t");
        assert_eq!(run("(eof-object? (eof-object))")?, "#t");
        assert_eq!(run("(display \"\")")?, "#<void>");
        Ok(())
    }

    #[test]
    fn failures() {
        assert!(run("(define p (open-output-string)) (close-port p) (display 1 p)").is_err());
        assert!(run("(read-char (open-output-string))").is_err());
        assert!(run("(write-char \"a\")").is_err());
        assert!(run("(display 1 2)").is_err());
    }
}
