use logos::Logos;

use crate::{
    error::SchemeError,
    expr::{Expr, CHARACTER_NAMES},
    number::Number,
    special::{self, Keyword},
};


#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("#(")]
    VectorOpen,

    #[token("#vu8(")]
    ByteVectorOpen,

    #[token("'")]
    Quote,

    #[token(".")]
    Dot,

    #[regex("#t|#true")]
    True,

    #[regex("#f|#false")]
    False,

    #[regex(r"#\\.[a-zA-Z0-9]*", |lex| lex.slice())]
    Character(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Str(&'a str),

    #[regex(r#"[^\s()'";#.][^\s()'";]*"#, |lex| lex.slice())]
    #[regex(r#"\.[^\s()'";]+"#, |lex| lex.slice())]
    Atom(&'a str),
}

type ParseResult<O> = Result<O, SchemeError>;


fn lexer<'a>(input: &'a str) -> ParseResult<Vec<Token<'a>>> {
    let mut tokens = vec![];
    let mut tokenizer = Token::lexer(input);

    while let Some(result) = tokenizer.next() {
        match result {
            Ok(token) => tokens.push(token),
            // An opening quote with no closing one means the string runs past the input
            Err(_) if tokenizer.slice().starts_with('"') => return Err(SchemeError::Incomplete),
            Err(_) => return Err(SchemeError::syntax(format!("invalid token {:?}", tokenizer.slice()))),
        }
    }

    Ok(tokens)
}

pub(crate) fn parse_number(literal: &str) -> Option<Number> {
    match literal {
        "+inf.0" => return Some(Number::Real(f64::INFINITY)),
        "-inf.0" => return Some(Number::Real(f64::NEG_INFINITY)),
        "+nan.0" | "-nan.0" => return Some(Number::Real(f64::NAN)),
        _ => {}
    }
    if let Ok(integer) = literal.parse::<i64>() {
        return Some(Number::Integer(integer));
    }

    // Rust also accepts things like "inf" and "NaN", which are identifiers here
    let unsigned = literal.strip_prefix(['+', '-']).unwrap_or(literal);
    let digits = unsigned.strip_prefix('.').unwrap_or(unsigned);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    literal.parse::<f64>().ok().map(Number::Real)
}

fn parse_atom(literal: &str) -> Expr {
    if let Some(number) = parse_number(literal) {
        return Expr::Number(number);
    }
    match Keyword::from_name(literal) {
        Some(keyword) => Expr::Keyword(keyword),
        None => Expr::symbol(literal),
    }
}

fn parse_character(literal: &str) -> ParseResult<Expr> {
    let name = &literal[2..];
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Expr::Character(c));
    }
    if let Some((_, c)) = CHARACTER_NAMES.iter().find(|(known, _)| *known == name) {
        return Ok(Expr::Character(*c));
    }
    name.strip_prefix('x')
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .and_then(char::from_u32)
        .map(Expr::Character)
        .ok_or_else(|| SchemeError::syntax(format!("unknown character {}", literal)))
}

fn parse_string(literal: &str) -> ParseResult<Expr> {
    let mut value = String::new();
    let mut chars = literal[1..literal.len() - 1].chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        value.push(match chars.next() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('"') => '"',
            Some('\\') => '\\',
            Some('0') => '\0',
            Some(other) => return Err(SchemeError::syntax(format!("unknown escape \\{} in string", other))),
            None => return Err(SchemeError::Incomplete),
        });
    }
    Ok(Expr::string(value))
}

/// Elements up to and including the closing parenthesis.
fn parse_sequence<'a, 'b>(mut tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Vec<Expr>)> {
    let mut items = vec![];
    loop {
        match tokens.first() {
            None => return Err(SchemeError::Incomplete),
            Some(Token::RightParen) => return Ok((&tokens[1..], items)),
            Some(_) => {
                let (rest, item) = parse_datum(tokens)?;
                items.push(item);
                tokens = rest;
            }
        }
    }
}

/// The rest of a list after its opening parenthesis, with an optional
/// `. tail` before the closing one.
fn parse_list<'a, 'b>(mut tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Expr)> {
    let mut items = vec![];
    loop {
        match tokens.first() {
            None => return Err(SchemeError::Incomplete),
            Some(Token::RightParen) => return Ok((&tokens[1..], Expr::list(items))),
            Some(Token::Dot) => {
                if items.is_empty() {
                    return Err(SchemeError::syntax("dotted pair without a head"));
                }
                let (rest, tail) = parse_datum(&tokens[1..])?;
                return match rest.first() {
                    None => Err(SchemeError::Incomplete),
                    Some(Token::RightParen) => Ok((&rest[1..], Expr::list_with_tail(items, tail))),
                    Some(token) => Err(SchemeError::syntax(format!("expected ) after dotted tail, found {:?}", token))),
                };
            }
            Some(_) => {
                let (rest, item) = parse_datum(tokens)?;
                items.push(item);
                tokens = rest;
            }
        }
    }
}

fn parse_bytes(items: Vec<Expr>) -> ParseResult<Vec<u8>> {
    items.into_iter()
        .map(|item| match item {
            Expr::Number(Number::Integer(byte)) => u8::try_from(byte).map_err(|_| SchemeError::syntax(format!("byte out of range: {}", byte))),
            other => Err(SchemeError::syntax(format!("bytevector element must be a byte, got {}", other))),
        }).collect()
}

fn parse_datum<'a, 'b>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Expr)> {
    let (first, rest) = tokens.split_first().ok_or(SchemeError::Incomplete)?;
    match first {
        Token::LeftParen => parse_list(rest),
        Token::VectorOpen => {
            let (rest, items) = parse_sequence(rest)?;
            Ok((rest, Expr::vector(items)))
        }
        Token::ByteVectorOpen => {
            let (rest, items) = parse_sequence(rest)?;
            Ok((rest, Expr::byte_vector(parse_bytes(items)?)))
        }
        Token::Quote => {
            let (rest, quoted) = parse_datum(rest)?;
            Ok((rest, special::quote(quoted)))
        }
        Token::RightParen => Err(SchemeError::syntax("unexpected )")),
        Token::Dot => Err(SchemeError::syntax("unexpected .")),
        Token::True => Ok((rest, Expr::Boolean(true))),
        Token::False => Ok((rest, Expr::Boolean(false))),
        Token::Character(literal) => Ok((rest, parse_character(literal)?)),
        Token::Str(literal) => Ok((rest, parse_string(literal)?)),
        Token::Atom(literal) => Ok((rest, parse_atom(literal))),
    }
}

/// Reads exactly one datum.
pub fn parse(input: &str) -> ParseResult<Expr> {
    let tokens = lexer(input)?;

    let (tokens, expr) = parse_datum(&tokens)?;
    if !tokens.is_empty() { return Err(SchemeError::syntax(format!("unexpected input after datum: {:?}", tokens[0]))); }

    Ok(expr)
}

/// Reads every datum in a program.
pub fn parse_all(input: &str) -> ParseResult<Vec<Expr>> {
    let tokens = lexer(input)?;
    let mut remaining = tokens.as_slice();
    let mut program = vec![];

    while !remaining.is_empty() {
        let (rest, expr) = parse_datum(remaining)?;
        program.push(expr);
        remaining = rest;
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use crate::test_utils::{all_testcases, load_test_pair};

    use super::*;

    fn render(source: &str) -> String {
        match parse(source) {
            Ok(expr) => expr.to_string(),
            Err(error) => error.kind().to_string(),
        }
    }

    #[test]
    fn atoms() {
        assert_eq!(render("42"), "42");
        assert_eq!(render("-7"), "-7");
        assert_eq!(render("2.50"), "2.5");
        assert_eq!(render("1e3"), "1000.0");
        assert_eq!(render(".5"), "0.5");
        assert_eq!(render("-inf.0"), "-inf.0");
        assert_eq!(render("inf"), "inf");
        assert_eq!(render("..."), "...");
        assert_eq!(render("#t"), "#t");
        assert_eq!(render("#false"), "#f");
        assert_eq!(render(r"#\a"), r"#\a");
        assert_eq!(render(r"#\space"), r"#\space");
        assert_eq!(render(r"#\("), r"#\(");
        assert_eq!(render(r"#\x41"), r"#\A");
        assert_eq!(render(r#""a\tb\n\"c\"""#), r#""a\tb\n\"c\"""#);
    }

    #[test]
    fn compound_data() {
        assert_eq!(render("(1 (2 3) ())"), "(1 (2 3) ())");
        assert_eq!(render("(a . b)"), "(a . b)");
        assert_eq!(render("(a b . (c d))"), "(a b c d)");
        assert_eq!(render("#(1 #t \"x\")"), "#(1 #t \"x\")");
        assert_eq!(render("#vu8(0 255)"), "#vu8(0 255)");
        assert_eq!(render("'x"), "(quote x)");
        assert_eq!(render("; comment\n(a ; inner\n b)"), "(a b)");
    }

    #[test]
    fn keywords_are_tagged() -> anyhow::Result<()> {
        let expr = parse("(if else x)")?;
        let items = expr.to_vec()?;
        assert!(matches!(items[0], Expr::Keyword(Keyword::If)));
        assert!(matches!(items[1], Expr::Keyword(Keyword::Else)));
        assert!(matches!(items[2], Expr::Symbol(_)));
        Ok(())
    }

    #[test]
    fn malformed_input() {
        assert_eq!(render("(1 2"), "Incomplete");
        assert_eq!(render("\"abc"), "Incomplete");
        assert_eq!(render("'"), "Incomplete");
        assert_eq!(render(")"), "SyntaxError");
        assert_eq!(render("(. 1)"), "SyntaxError");
        assert_eq!(render("(1 . 2 3)"), "SyntaxError");
        assert_eq!(render("#vu8(256)"), "SyntaxError");
        assert_eq!(render("1 2"), "SyntaxError");
        assert_eq!(render(r#""\q""#), "SyntaxError");
    }

    #[test]
    fn programs_hold_several_datums() -> anyhow::Result<()> {
        let program = parse_all("(define x 1)\n(+ x 1) x")?;
        assert_eq!(program.len(), 3);
        assert!(parse_all("   ; nothing\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn rendering_round_trips() -> anyhow::Result<()> {
        let samples = [
            Expr::list([Expr::integer(1), Expr::real(-2.25), Expr::string("q\"uo\\te"), Expr::Character('\n')]),
            Expr::list([Expr::symbol("lambda-ish"), Expr::list([]), Expr::Boolean(true), Expr::real(1e21)]),
            Expr::vector(vec![Expr::integer(0), Expr::list([Expr::symbol("x")])]),
            Expr::byte_vector(vec![1, 2, 3]),
            special::quote(Expr::list([Expr::Keyword(Keyword::Define), Expr::symbol("y"), Expr::real(0.1)])),
        ];
        for sample in samples {
            let reparsed = parse(&sample.to_string())?;
            if !reparsed.equal(&sample) {
                bail!("{} reparsed as {}", sample, reparsed);
            }
        }
        Ok(())
    }

    #[test]
    fn parse_testcases() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            for (lineno, (input, expected)) in load_test_pair(testcase)?.into_iter().enumerate() {
                let expected: Result<String, String> = expected.into();
                // Malformed special forms still read fine, only the evaluators reject them
                if let (Err(error), Ok(_)) = (parse(&input), expected) {
                    bail!("Testcase {}:{} - could not parse {:?}: {}", testcase, lineno + 1, input, error);
                }
            }
        }
        Ok(())
    }
}
