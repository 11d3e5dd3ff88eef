use core::fmt;
use std::cmp::Ordering;

use crate::error::{Result, SchemeError};


/// The numeric tower: a machine integer and a float, nothing in between.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

fn overflow(operation: &str) -> SchemeError {
    SchemeError::evaluation(format!("{}: integer overflow", operation))
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Real(value) => value,
        }
    }

    pub fn is_integer(self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Real(value) => value.is_finite() && value.fract() == 0.0,
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    pub fn add(self, other: Self) -> Result<Self> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.checked_add(b).map(Self::Integer).ok_or_else(|| overflow("+")),
            (a, b) => Ok(Self::Real(a.as_f64() + b.as_f64())),
        }
    }

    pub fn sub(self, other: Self) -> Result<Self> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.checked_sub(b).map(Self::Integer).ok_or_else(|| overflow("-")),
            (a, b) => Ok(Self::Real(a.as_f64() - b.as_f64())),
        }
    }

    pub fn mul(self, other: Self) -> Result<Self> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.checked_mul(b).map(Self::Integer).ok_or_else(|| overflow("*")),
            (a, b) => Ok(Self::Real(a.as_f64() * b.as_f64())),
        }
    }

    /// Integer division stays exact only when it divides evenly.
    pub fn div(self, other: Self) -> Result<Self> {
        match (self, other) {
            (Self::Integer(_), Self::Integer(0)) => Err(SchemeError::evaluation("/: division by zero")),
            (Self::Integer(a), Self::Integer(b)) => match a.checked_rem(b) {
                Some(0) => a.checked_div(b).map(Self::Integer).ok_or_else(|| overflow("/")),
                Some(_) => Ok(Self::Real(a as f64 / b as f64)),
                None => Err(overflow("/")),
            },
            (a, b) => Ok(Self::Real(a.as_f64() / b.as_f64())),
        }
    }

    pub fn quotient(self, other: Self) -> Result<Self> {
        self.integer_division("quotient", other, |a, b| a.checked_div(b), |a, b| (a / b).trunc())
    }

    pub fn remainder(self, other: Self) -> Result<Self> {
        self.integer_division("remainder", other, |a, b| a.checked_rem(b), |a, b| a % b)
    }

    pub fn modulo(self, other: Self) -> Result<Self> {
        self.integer_division("modulo", other, |a, b| a.checked_rem_euclid(b).map(|m| if b < 0 && m != 0 { m + b } else { m }), |a, b| {
            let m = a % b;
            if m != 0.0 && (m < 0.0) != (b < 0.0) { m + b } else { m }
        })
    }

    fn integer_division(
        self,
        name: &str,
        other: Self,
        exact: impl Fn(i64, i64) -> Option<i64>,
        inexact: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        if !self.is_integer() || !other.is_integer() {
            return Err(SchemeError::evaluation(format!("{}: expected integer arguments", name)));
        }
        if other.is_zero() {
            return Err(SchemeError::evaluation(format!("{}: division by zero", name)));
        }
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => exact(a, b).map(Self::Integer).ok_or_else(|| overflow(name)),
            (a, b) => Ok(Self::Real(inexact(a.as_f64(), b.as_f64()))),
        }
    }

    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    /// Numeric equality with integer/real cross-promotion.
    pub fn numeric_eq(self, other: Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    pub fn negate(self) -> Result<Self> {
        Self::Integer(0).sub(self)
    }

    pub fn to_exact(self) -> Result<Self> {
        match self {
            Self::Integer(_) => Ok(self),
            Self::Real(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.2e18 => Ok(Self::Integer(value as i64)),
            Self::Real(value) => Err(SchemeError::evaluation(format!("inexact->exact: no exact representation of {}", Self::Real(value)))),
        }
    }

    pub fn to_inexact(self) -> Self {
        Self::Real(self.as_f64())
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Real(value) if value.is_nan() => write!(f, "+nan.0"),
            Self::Real(value) if value.is_infinite() => write!(f, "{}inf.0", if *value > 0.0 { "+" } else { "-" }),
            // Debug keeps a trailing `.0` on whole floats, so reals never print as integers
            Self::Real(value) => write!(f, "{:?}", value),
        }
    }
}
