use std::cmp::Ordering;

use crate::{
    EvalResult, PrimitiveContext, RuntimeError, Value, number,
    primitives::{PrimitiveMessage, inputs},
};

pub const PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("+", 1, number_add),
    PrimitiveMessage::new("-", 1, number_sub),
    PrimitiveMessage::new("*", 1, number_mul),
    PrimitiveMessage::new("/", 1, number_div),
    PrimitiveMessage::new("%", 1, number_rem),
    PrimitiveMessage::new("<", 1, number_lt),
    PrimitiveMessage::new("<=", 1, number_leq),
    PrimitiveMessage::new(">", 1, number_gt),
    PrimitiveMessage::new(">=", 1, number_geq),
    PrimitiveMessage::new("negate", 0, number_neg),
    PrimitiveMessage::new("abs", 0, number_abs),
    PrimitiveMessage::new("floor", 0, number_floor),
];

type NumberBinop = fn(&Value, &Value) -> Result<Value, RuntimeError>;

fn number_binop(ctx: &mut PrimitiveContext, op: NumberBinop) -> EvalResult {
    let [other] = inputs(ctx);
    Ok(op(ctx.receiver(), &other)?)
}

/// NaN compares false against everything.
fn number_compare(
    ctx: &mut PrimitiveContext,
    accept: fn(Ordering) -> bool,
) -> EvalResult {
    let [other] = inputs(ctx);
    let ordering = number::compare(ctx.receiver(), &other)?;
    Ok(Value::from_bool(ordering.is_some_and(accept)))
}

pub fn number_add(ctx: &mut PrimitiveContext) -> EvalResult {
    number_binop(ctx, number::add)
}

pub fn number_sub(ctx: &mut PrimitiveContext) -> EvalResult {
    number_binop(ctx, number::sub)
}

pub fn number_mul(ctx: &mut PrimitiveContext) -> EvalResult {
    number_binop(ctx, number::mul)
}

pub fn number_div(ctx: &mut PrimitiveContext) -> EvalResult {
    number_binop(ctx, number::div)
}

pub fn number_rem(ctx: &mut PrimitiveContext) -> EvalResult {
    number_binop(ctx, number::rem)
}

pub fn number_lt(ctx: &mut PrimitiveContext) -> EvalResult {
    number_compare(ctx, Ordering::is_lt)
}

pub fn number_leq(ctx: &mut PrimitiveContext) -> EvalResult {
    number_compare(ctx, Ordering::is_le)
}

pub fn number_gt(ctx: &mut PrimitiveContext) -> EvalResult {
    number_compare(ctx, Ordering::is_gt)
}

pub fn number_geq(ctx: &mut PrimitiveContext) -> EvalResult {
    number_compare(ctx, Ordering::is_ge)
}

pub fn number_neg(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(number::negate(ctx.receiver())?)
}

pub fn number_abs(ctx: &mut PrimitiveContext) -> EvalResult {
    let receiver = ctx.receiver();
    match number::compare(receiver, &Value::Integer(0))? {
        Some(Ordering::Less) => Ok(number::negate(receiver)?),
        _ => Ok(receiver.clone()),
    }
}

pub fn number_floor(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
            Ok(Value::Integer(f.floor() as i64))
        }
        Value::Float(f) => Ok(Value::Float(f.floor())),
        other if other.is_number() => Ok(other.clone()),
        other => Err(RuntimeError::type_error("Number", other).into()),
    }
}
