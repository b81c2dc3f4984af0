use chrono::{Datelike, Utc};

use crate::{
    EvalResult, PrimitiveContext, RuntimeError, Value,
    primitives::PrimitiveMessage,
};

pub const PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("now", 0, now),
    PrimitiveMessage::new("asNumber", 0, as_number),
    PrimitiveMessage::new("year", 0, year),
];

pub fn now(_ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::Date(Utc::now()))
}

/// Seconds since the epoch, with sub-second precision.
pub fn as_number(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Date(date) => {
            let micros = date.timestamp_micros();
            Ok(Value::Float(micros as f64 / 1_000_000.0))
        }
        other => Err(RuntimeError::type_error("Date", other).into()),
    }
}

pub fn year(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Date(date) => Ok(Value::Integer(date.year() as i64)),
        other => Err(RuntimeError::type_error("Date", other).into()),
    }
}
