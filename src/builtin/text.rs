use crate::{
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::Expr,
    parser::parse_number,
    procedure::Arity,
    special::Keyword,
};

use super::{boolean, index_arg, integer_arg, type_error, Builtin};


pub(super) const BUILTINS: &[Builtin] = &[
    ("string?", Arity::Exact(1), builtin_is_string),
    ("string-length", Arity::Exact(1), builtin_string_length),
    ("string-ref", Arity::Exact(2), builtin_string_ref),
    ("string-append", Arity::AtLeast(0), builtin_string_append),
    ("substring", Arity::Between(2, 3), builtin_substring),
    ("string=?", Arity::AtLeast(1), builtin_string_eq),
    ("string<?", Arity::AtLeast(1), builtin_string_less),
    ("string->symbol", Arity::Exact(1), builtin_string_to_symbol),
    ("symbol->string", Arity::Exact(1), builtin_symbol_to_string),
    ("string->number", Arity::Exact(1), builtin_string_to_number),
    ("number->string", Arity::Exact(1), builtin_number_to_string),
    ("string->list", Arity::Exact(1), builtin_string_to_list),
    ("list->string", Arity::Exact(1), builtin_list_to_string),
    ("symbol?", Arity::Exact(1), builtin_is_symbol),
    ("char?", Arity::Exact(1), builtin_is_char),
    ("char->integer", Arity::Exact(1), builtin_char_to_integer),
    ("integer->char", Arity::Exact(1), builtin_integer_to_char),
    ("char=?", Arity::AtLeast(1), builtin_char_eq),
    ("char<?", Arity::AtLeast(1), builtin_char_less),
];

fn string_arg(name: &str, value: &Expr) -> Result<String> {
    match value {
        Expr::Str(text) => Ok(text.borrow().clone()),
        other => Err(type_error(name, "a string", other)),
    }
}

fn char_arg(name: &str, value: &Expr) -> Result<char> {
    match value {
        Expr::Character(c) => Ok(*c),
        other => Err(type_error(name, "a character", other)),
    }
}

fn builtin_is_string(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Str(_)))
}

fn builtin_string_length(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let text = string_arg("string-length", &values[0])?;
    Ok(Expr::integer(text.chars().count() as i64))
}

fn builtin_string_ref(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let chars = string_arg("string-ref", &values[0])?.chars().collect::<Vec<char>>();
    let index = index_arg("string-ref", &values[1], chars.len(), false)?;
    Ok(Expr::Character(chars[index]))
}

fn builtin_string_append(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    values.iter()
        .map(|value| string_arg("string-append", value))
        .collect::<Result<String>>()
        .map(Expr::string)
}

fn builtin_substring(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let chars = string_arg("substring", &values[0])?.chars().collect::<Vec<char>>();
    let start = index_arg("substring", &values[1], chars.len(), true)?;
    let end = match values.get(2) {
        Some(end) => index_arg("substring", end, chars.len(), true)?,
        None => chars.len(),
    };
    if start > end {
        return Err(SchemeError::evaluation(format!("substring: start {} is after end {}", start, end)));
    }
    Ok(Expr::string(chars[start..end].iter().collect::<String>()))
}

fn builtin_string_eq(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let strings = values.iter().map(|value| string_arg("string=?", value)).collect::<Result<Vec<String>>>()?;
    boolean(strings.windows(2).all(|pair| pair[0] == pair[1]))
}

fn builtin_string_less(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let strings = values.iter().map(|value| string_arg("string<?", value)).collect::<Result<Vec<String>>>()?;
    boolean(strings.windows(2).all(|pair| pair[0] < pair[1]))
}

/// Reserved names come back as keywords, exactly as the reader would tag them.
fn builtin_string_to_symbol(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let name = string_arg("string->symbol", &values[0])?;
    Ok(Keyword::from_name(&name).map(Expr::Keyword).unwrap_or_else(|| Expr::symbol(&name)))
}

fn builtin_symbol_to_string(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Symbol(symbol) => Ok(Expr::string(symbol.as_str())),
        Expr::Keyword(keyword) => Ok(Expr::string(keyword.name())),
        other => Err(type_error("symbol->string", "a symbol", other)),
    }
}

fn builtin_string_to_number(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let text = string_arg("string->number", &values[0])?;
    Ok(parse_number(text.trim()).map(Expr::Number).unwrap_or(Expr::Boolean(false)))
}

fn builtin_number_to_string(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Number(number) => Ok(Expr::string(number.to_string())),
        other => Err(type_error("number->string", "a number", other)),
    }
}

fn builtin_string_to_list(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let text = string_arg("string->list", &values[0])?;
    Ok(Expr::list(text.chars().map(Expr::Character)))
}

fn builtin_list_to_string(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    if !values[0].is_list() {
        return Err(type_error("list->string", "a list of characters", &values[0]));
    }
    values[0].iter()
        .map(|item| char_arg("list->string", &item))
        .collect::<Result<String>>()
        .map(Expr::string)
}

fn builtin_is_symbol(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Symbol(_) | Expr::Keyword(_)))
}

fn builtin_is_char(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Character(_)))
}

fn builtin_char_to_integer(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::integer(char_arg("char->integer", &values[0])? as i64))
}

fn builtin_integer_to_char(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let code = integer_arg("integer->char", &values[0])?;
    u32::try_from(code).ok()
        .and_then(char::from_u32)
        .map(Expr::Character)
        .ok_or_else(|| SchemeError::evaluation(format!("integer->char: {} is not a character", code)))
}

fn builtin_char_eq(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let chars = values.iter().map(|value| char_arg("char=?", value)).collect::<Result<Vec<char>>>()?;
    boolean(chars.windows(2).all(|pair| pair[0] == pair[1]))
}

fn builtin_char_less(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let chars = values.iter().map(|value| char_arg("char<?", value)).collect::<Result<Vec<char>>>()?;
    boolean(chars.windows(2).all(|pair| pair[0] < pair[1]))
}

#[cfg(test)]
mod tests {
    use crate::builtin::tests::run;

    #[test]
    fn strings() -> anyhow::Result<()> {
        assert_eq!(run("(string-length \"héllo\")")?, "5");
        assert_eq!(run("(string-ref \"abc\" 1)")?, "#\\b");
        assert_eq!(run("(string-append \"ab\" \"\" \"c\")")?, "\"abc\"");
        assert_eq!(run("(substring \"hello\" 1 3)")?, "\"el\"");
        assert_eq!(run("(substring \"hello\" 5)")?, "\"\"");
        assert_eq!(run("(string=? \"a\" \"a\" \"a\")")?, "#t");
        assert_eq!(run("(string<? \"abc\" \"abd\")")?, "#t");
        assert_eq!(run("(string->list \"ab\")")?, "(#\\a #\\b)");
        assert_eq!(run("(list->string (list #\\a #\\space))")?, "\"a \"");
        Ok(())
    }

    #[test]
    fn symbols_and_numbers() -> anyhow::Result<()> {
        assert_eq!(run("(string->symbol \"abc\")")?, "abc");
        assert_eq!(run("(symbol->string 'if)")?, "\"if\"");
        assert_eq!(run("(symbol? (string->symbol \"lambda\"))")?, "#t");
        assert_eq!(run("(eq? (string->symbol \"x\") 'x)")?, "#t");
        assert_eq!(run("(string->number \"-12\")")?, "-12");
        assert_eq!(run("(string->number \"1.5\")")?, "1.5");
        assert_eq!(run("(string->number \"abc\")")?, "#f");
        assert_eq!(run("(number->string 2.0)")?, "\"2.0\"");
        Ok(())
    }

    #[test]
    fn characters() -> anyhow::Result<()> {
        assert_eq!(run("(char->integer #\\A)")?, "65");
        assert_eq!(run("(integer->char 97)")?, "#\\a");
        assert_eq!(run("(char=? #\\a #\\a)")?, "#t");
        assert_eq!(run("(char<? #\\a #\\b #\\c)")?, "#t");
        assert_eq!(run("(char? \"a\")")?, "#f");
        Ok(())
    }

    #[test]
    fn failures() {
        assert!(run("(string-ref \"abc\" 3)").is_err());
        assert!(run("(substring \"abc\" 2 1)").is_err());
        assert!(run("(string-length 'abc)").is_err());
        assert!(run("(integer->char -1)").is_err());
        assert!(run("(list->string '(1 2))").is_err());
    }
}
