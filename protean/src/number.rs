//! Numeric tower: `Integer` overflows into `BigInteger`, anything mixed
//! with a `Float` becomes a `Float`.

use std::{cmp::Ordering, rc::Rc};

use num::{BigInt, ToPrimitive, Zero};

use crate::{RuntimeError, Value};

enum Num<'a> {
    Int(i64),
    Big(&'a BigInt),
    Float(f64),
}

#[derive(Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
}

fn as_num(value: &Value) -> Result<Num<'_>, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(Num::Int(*i)),
        Value::BigInteger(big) => Ok(Num::Big(big)),
        Value::Float(f) => Ok(Num::Float(*f)),
        other => Err(RuntimeError::type_error("Number", other)),
    }
}

impl Num<'_> {
    fn to_f64(&self) -> f64 {
        match self {
            Num::Int(i) => *i as f64,
            Num::Big(big) => big.to_f64().unwrap_or(f64::NAN),
            Num::Float(f) => *f,
        }
    }

    fn to_big(&self) -> BigInt {
        match self {
            Num::Int(i) => BigInt::from(*i),
            Num::Big(big) => (*big).clone(),
            Num::Float(_) => unreachable!("floats are handled before"),
        }
    }
}

/// Demote a big result that fits back into an `Integer`.
pub fn normalize(big: BigInt) -> Value {
    match big.to_i64() {
        Some(small) => Value::Integer(small),
        None => Value::BigInteger(Rc::new(big)),
    }
}

fn arithmetic(a: &Value, b: &Value, op: Op) -> Result<Value, RuntimeError> {
    let (x, y) = (as_num(a)?, as_num(b)?);

    if matches!(x, Num::Float(_)) || matches!(y, Num::Float(_)) {
        let (x, y) = (x.to_f64(), y.to_f64());
        let result = match op {
            Op::Add => x + y,
            Op::Sub => x - y,
            Op::Mul => x * y,
        };
        return Ok(Value::Float(result));
    }

    if let (Num::Int(x), Num::Int(y)) = (&x, &y) {
        let checked = match op {
            Op::Add => x.checked_add(*y),
            Op::Sub => x.checked_sub(*y),
            Op::Mul => x.checked_mul(*y),
        };
        if let Some(result) = checked {
            return Ok(Value::Integer(result));
        }
    }

    let (x, y) = (x.to_big(), y.to_big());
    let result = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
    };
    Ok(normalize(result))
}

pub fn add(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arithmetic(a, b, Op::Add)
}

pub fn sub(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arithmetic(a, b, Op::Sub)
}

pub fn mul(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    arithmetic(a, b, Op::Mul)
}

/// Exact when the integers divide evenly, a `Float` otherwise.
pub fn div(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    let (x, y) = (as_num(a)?, as_num(b)?);

    match (&x, &y) {
        (Num::Float(_), _) | (_, Num::Float(_)) => {
            Ok(Value::Float(x.to_f64() / y.to_f64()))
        }
        (Num::Int(_), Num::Int(0)) => Err(RuntimeError::DivisionByZero),
        (Num::Int(p), Num::Int(q)) => match p.checked_rem(*q) {
            Some(0) => Ok(Value::Integer(*p / *q)),
            // i64::MIN / -1 divides evenly but overflows
            None => Ok(normalize(BigInt::from(*p) / BigInt::from(*q))),
            Some(_) => Ok(Value::Float(*p as f64 / *q as f64)),
        },
        _ => {
            let (p, q) = (x.to_big(), y.to_big());
            if q.is_zero() {
                return Err(RuntimeError::DivisionByZero);
            }
            if (&p % &q).is_zero() {
                Ok(normalize(p / q))
            } else {
                Ok(Value::Float(x.to_f64() / y.to_f64()))
            }
        }
    }
}

pub fn rem(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    let (x, y) = (as_num(a)?, as_num(b)?);

    match (&x, &y) {
        (Num::Float(_), _) | (_, Num::Float(_)) => {
            Ok(Value::Float(x.to_f64() % y.to_f64()))
        }
        (Num::Int(_), Num::Int(0)) => Err(RuntimeError::DivisionByZero),
        (Num::Int(p), Num::Int(q)) => {
            Ok(Value::Integer(p.checked_rem(*q).unwrap_or(0)))
        }
        _ => {
            let (p, q) = (x.to_big(), y.to_big());
            if q.is_zero() {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(normalize(p % q))
        }
    }
}

/// `None` when either side is NaN.
pub fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>, RuntimeError> {
    let (x, y) = (as_num(a)?, as_num(b)?);

    Ok(match (&x, &y) {
        (Num::Int(p), Num::Int(q)) => Some(p.cmp(q)),
        (Num::Float(_), _) | (_, Num::Float(_)) => {
            x.to_f64().partial_cmp(&y.to_f64())
        }
        _ => Some(x.to_big().cmp(&y.to_big())),
    })
}

pub fn negate(a: &Value) -> Result<Value, RuntimeError> {
    sub(&Value::Integer(0), a)
}

pub fn to_f64(a: &Value) -> Result<f64, RuntimeError> {
    Ok(as_num(a)?.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic() {
        assert!(matches!(
            add(&Value::Integer(2), &Value::Integer(3)),
            Ok(Value::Integer(5))
        ));
        assert!(matches!(
            mul(&Value::Integer(-4), &Value::Integer(3)),
            Ok(Value::Integer(-12))
        ));
    }

    #[test]
    fn overflow_promotes_and_demotes() {
        let big = add(&Value::Integer(i64::MAX), &Value::Integer(1)).unwrap();
        assert!(matches!(big, Value::BigInteger(_)));

        let back = sub(&big, &Value::Integer(1)).unwrap();
        assert!(matches!(back, Value::Integer(i64::MAX)));
    }

    #[test]
    fn dividing_min_by_minus_one_stays_exact() {
        let quotient = div(&Value::Integer(i64::MIN), &Value::Integer(-1)).unwrap();
        let Value::BigInteger(big) = quotient else {
            panic!("expected a big integer");
        };
        assert_eq!(*big, -BigInt::from(i64::MIN));
    }

    #[test]
    fn mixed_float_arithmetic() {
        let sum = add(&Value::Integer(1), &Value::Float(0.5)).unwrap();
        assert!(matches!(sum, Value::Float(f) if f == 1.5));
    }

    #[test]
    fn division_is_exact_when_possible() {
        assert!(matches!(
            div(&Value::Integer(6), &Value::Integer(3)),
            Ok(Value::Integer(2))
        ));
        assert!(matches!(
            div(&Value::Integer(7), &Value::Integer(2)),
            Ok(Value::Float(f)) if f == 3.5
        ));
        assert!(matches!(
            div(&Value::Integer(1), &Value::Integer(0)),
            Err(RuntimeError::DivisionByZero)
        ));
        assert!(matches!(
            rem(&Value::Integer(7), &Value::Integer(0)),
            Err(RuntimeError::DivisionByZero)
        ));
    }

    #[test]
    fn comparison() {
        assert_eq!(
            compare(&Value::Integer(1), &Value::Float(1.5)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&Value::Float(f64::NAN), &Value::Integer(1)).unwrap(),
            None
        );
        let big = add(&Value::Integer(i64::MAX), &Value::Integer(10)).unwrap();
        assert_eq!(
            compare(&big, &Value::Integer(0)).unwrap(),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn non_numbers_are_type_errors() {
        let result = add(&Value::Integer(1), &Value::string("x"));
        assert!(matches!(
            result,
            Err(RuntimeError::TypeError {
                expected: "Number",
                got: "Sequence"
            })
        ));
    }
}
