use std::fmt::Write;

use num::BigInt;

use crate::Value;

const DEFAULT_MAX_DEPTH: usize = 3;
const LEGACY_SIGNIFICANT_DIGITS: i32 = 15;

/// How numbers turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberFormat {
    /// Rust formatting; floats always show a fraction (`3.0`).
    #[default]
    Plain,
    /// Integral floats drop the fraction, others keep at most 15
    /// significant digits; `nan`, `inf` and `-inf` are lowercase.
    Legacy,
}

impl NumberFormat {
    pub fn format_integer(self, value: i64) -> String {
        value.to_string()
    }

    pub fn format_big_integer(self, value: &BigInt) -> String {
        value.to_string()
    }

    pub fn format_float(self, value: f64) -> String {
        match self {
            NumberFormat::Plain => format!("{value:?}"),
            NumberFormat::Legacy => legacy_float(value),
        }
    }
}

fn legacy_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = LEGACY_SIGNIFICANT_DIGITS - 1 - magnitude;
    if !(0..=30).contains(&decimals) {
        return format!("{value:e}");
    }

    let text = format!("{value:.*}", decimals as usize);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Text form of a value, as `asString` and `println` see it.
pub fn display_value(value: &Value, format: NumberFormat) -> String {
    let mut output = String::new();
    write_value(&mut output, value, format, 0, DEFAULT_MAX_DEPTH);
    output
}

fn write_value(
    output: &mut String,
    value: &Value,
    format: NumberFormat,
    depth: usize,
    max_depth: usize,
) {
    match value {
        Value::Nil => output.push_str("nil"),
        Value::True => output.push_str("true"),
        Value::False => output.push_str("false"),
        Value::Integer(i) => output.push_str(&format.format_integer(*i)),
        Value::BigInteger(big) => {
            output.push_str(&format.format_big_integer(big))
        }
        Value::Float(f) => output.push_str(&format.format_float(*f)),
        Value::String(text) => output.push_str(text),
        Value::Object(object) => {
            let _ = write!(output, "Object_{:#x}", object.id());
        }
        Value::Function(function) => {
            let _ = write!(output, "Function({})", function.name);
        }
        Value::Block(block) => {
            let _ = write!(output, "block({})", block.code.parameters.join(", "));
        }
        Value::Method(method) => {
            let _ =
                write!(output, "method({})", method.code.parameters.join(", "));
        }
        Value::List(list) => {
            if depth >= max_depth {
                output.push_str("list(...)");
                return;
            }
            output.push_str("list(");
            for (i, item) in list.borrow().iter().enumerate() {
                if i > 0 {
                    output.push_str(", ");
                }
                write_value(output, item, format, depth + 1, max_depth);
            }
            output.push(')');
        }
        Value::Map(map) => {
            if depth >= max_depth {
                output.push_str("Map(...)");
                return;
            }
            output.push_str("Map(");
            for (i, (key, item)) in map.borrow().iter().enumerate() {
                if i > 0 {
                    output.push_str(", ");
                }
                let _ = write!(output, "{key}: ");
                write_value(output, item, format, depth + 1, max_depth);
            }
            output.push(')');
        }
        Value::Message(message) => output.push_str(&message.name),
        Value::Call(call) => {
            let _ = write!(output, "Call({})", call.message.name);
        }
        Value::Locals(locals) => {
            let _ = write!(
                output,
                "Locals_{:#x}",
                std::rc::Rc::as_ptr(locals) as usize
            );
        }
        Value::Coroutine(coroutine) => {
            let _ = write!(output, "Coroutine({})", coroutine.label());
        }
        Value::Date(date) => output.push_str(&date.to_rfc3339()),
    }
}
