use crate::{
    error::{Result, SchemeError},
    evaluator::Evaluator,
    expr::Expr,
    procedure::Arity,
};

use super::{boolean, index_arg, integer_arg, type_error, Builtin};


pub(super) const BUILTINS: &[Builtin] = &[
    ("vector", Arity::AtLeast(0), builtin_vector),
    ("make-vector", Arity::Between(1, 2), builtin_make_vector),
    ("vector?", Arity::Exact(1), builtin_is_vector),
    ("vector-length", Arity::Exact(1), builtin_vector_length),
    ("vector-ref", Arity::Exact(2), builtin_vector_ref),
    ("vector-set!", Arity::Exact(3), builtin_vector_set),
    ("vector->list", Arity::Exact(1), builtin_vector_to_list),
    ("list->vector", Arity::Exact(1), builtin_list_to_vector),
    ("bytevector", Arity::AtLeast(0), builtin_bytevector),
    ("make-bytevector", Arity::Between(1, 2), builtin_make_bytevector),
    ("bytevector?", Arity::Exact(1), builtin_is_bytevector),
    ("bytevector-length", Arity::Exact(1), builtin_bytevector_length),
    ("bytevector-u8-ref", Arity::Exact(2), builtin_bytevector_ref),
    ("bytevector-u8-set!", Arity::Exact(3), builtin_bytevector_set),
];

fn length_arg(name: &str, value: &Expr) -> Result<usize> {
    let length = integer_arg(name, value)?;
    usize::try_from(length).map_err(|_| SchemeError::evaluation(format!("{}: negative length {}", name, length)))
}

fn byte_arg(name: &str, value: &Expr) -> Result<u8> {
    let byte = integer_arg(name, value)?;
    u8::try_from(byte).map_err(|_| SchemeError::evaluation(format!("{}: {} is not a byte", name, byte)))
}

fn builtin_vector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    Ok(Expr::vector(values.to_vec()))
}

fn builtin_make_vector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let length = length_arg("make-vector", &values[0])?;
    let fill = values.get(1).cloned().unwrap_or(Expr::integer(0));
    Ok(Expr::vector(vec![fill; length]))
}

fn builtin_is_vector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::Vector(_)))
}

fn builtin_vector_length(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Vector(items) => Ok(Expr::integer(items.borrow().len() as i64)),
        other => Err(type_error("vector-length", "a vector", other)),
    }
}

fn builtin_vector_ref(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Vector(items) => {
            let items = items.borrow();
            let index = index_arg("vector-ref", &values[1], items.len(), false)?;
            Ok(items[index].clone())
        }
        other => Err(type_error("vector-ref", "a vector", other)),
    }
}

fn builtin_vector_set(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Vector(items) => {
            let mut items = items.borrow_mut();
            let index = index_arg("vector-set!", &values[1], items.len(), false)?;
            items[index] = values[2].clone();
            Ok(Expr::Void)
        }
        other => Err(type_error("vector-set!", "a vector", other)),
    }
}

fn builtin_vector_to_list(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::Vector(items) => Ok(Expr::list(items.borrow().iter().cloned())),
        other => Err(type_error("vector->list", "a vector", other)),
    }
}

fn builtin_list_to_vector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    if !values[0].is_list() {
        return Err(type_error("list->vector", "a proper list", &values[0]));
    }
    Ok(Expr::vector(values[0].iter().collect()))
}

fn builtin_bytevector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    values.iter()
        .map(|value| byte_arg("bytevector", value))
        .collect::<Result<Vec<u8>>>()
        .map(Expr::byte_vector)
}

fn builtin_make_bytevector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    let length = length_arg("make-bytevector", &values[0])?;
    let fill = match values.get(1) {
        Some(fill) => byte_arg("make-bytevector", fill)?,
        None => 0,
    };
    Ok(Expr::byte_vector(vec![fill; length]))
}

fn builtin_is_bytevector(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    boolean(matches!(values[0], Expr::ByteVector(_)))
}

fn builtin_bytevector_length(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::ByteVector(bytes) => Ok(Expr::integer(bytes.borrow().len() as i64)),
        other => Err(type_error("bytevector-length", "a bytevector", other)),
    }
}

fn builtin_bytevector_ref(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::ByteVector(bytes) => {
            let bytes = bytes.borrow();
            let index = index_arg("bytevector-u8-ref", &values[1], bytes.len(), false)?;
            Ok(Expr::integer(bytes[index] as i64))
        }
        other => Err(type_error("bytevector-u8-ref", "a bytevector", other)),
    }
}

fn builtin_bytevector_set(values: &[Expr], _: &dyn Evaluator) -> Result<Expr> {
    match &values[0] {
        Expr::ByteVector(bytes) => {
            let byte = byte_arg("bytevector-u8-set!", &values[2])?;
            let mut bytes = bytes.borrow_mut();
            let index = index_arg("bytevector-u8-set!", &values[1], bytes.len(), false)?;
            bytes[index] = byte;
            Ok(Expr::Void)
        }
        other => Err(type_error("bytevector-u8-set!", "a bytevector", other)),
    }
}
