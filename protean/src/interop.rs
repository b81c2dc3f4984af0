//! Host-facing view of values.

use std::rc::Rc;

use num::ToPrimitive;

use crate::{LookupResult, RuntimeError, VM, Value, lookup_value};

/// 2^63, the first float past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

pub trait Interop {
    fn has_members(&self) -> bool;
    fn is_null(&self) -> bool;
    fn is_boolean(&self) -> bool;
    fn as_boolean(&self) -> Result<bool, RuntimeError>;
    fn is_string(&self) -> bool;
    fn as_string(&self) -> Result<Rc<str>, RuntimeError>;
    fn fits_in_i64(&self) -> bool;
    fn as_i64(&self) -> Result<i64, RuntimeError>;
    fn fits_in_f64(&self) -> bool;
    fn as_f64(&self) -> Result<f64, RuntimeError>;
    /// Own slot names, in definition order.
    fn member_keys(&self) -> Vec<Rc<str>>;
    /// Reads along the prototype chain, without activating.
    fn read_member(&self, vm: &VM, key: &str) -> Result<Value, RuntimeError>;
    /// Defines on the object itself, shadowing any inherited slot.
    fn write_member(&self, key: &str, value: Value) -> Result<(), RuntimeError>;
}

impl Interop for Value {
    fn has_members(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    fn is_null(&self) -> bool {
        self.is_nil()
    }

    fn is_boolean(&self) -> bool {
        matches!(self, Value::True | Value::False)
    }

    fn as_boolean(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::True => Ok(true),
            Value::False => Ok(false),
            other => Err(RuntimeError::type_error("Boolean", other)),
        }
    }

    fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    fn as_string(&self) -> Result<Rc<str>, RuntimeError> {
        match self {
            Value::String(text) => Ok(text.clone()),
            other => Err(RuntimeError::type_error("Sequence", other)),
        }
    }

    fn fits_in_i64(&self) -> bool {
        match self {
            Value::Integer(_) => true,
            Value::Float(f) => f.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(f),
            _ => false,
        }
    }

    fn as_i64(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Float(f) if self.fits_in_i64() => Ok(*f as i64),
            other => Err(RuntimeError::type_error("Integer", other)),
        }
    }

    fn fits_in_f64(&self) -> bool {
        match self {
            Value::Float(_) => true,
            Value::Integer(i) => {
                let f = *i as f64;
                f < I64_LIMIT && f as i64 == *i
            }
            Value::BigInteger(big) => big.to_f64().is_some_and(f64::is_finite),
            _ => false,
        }
    }

    fn as_f64(&self) -> Result<f64, RuntimeError> {
        match self {
            Value::Float(f) => Ok(*f),
            other if other.fits_in_f64() => crate::number::to_f64(other),
            other => Err(RuntimeError::type_error("Float", other)),
        }
    }

    fn member_keys(&self) -> Vec<Rc<str>> {
        match self {
            Value::Object(object) => object.slot_names(),
            _ => Vec::new(),
        }
    }

    fn read_member(&self, vm: &VM, key: &str) -> Result<Value, RuntimeError> {
        match lookup_value(&vm.specials, self, key) {
            LookupResult::Found { value, .. } => Ok(value),
            LookupResult::None => Err(RuntimeError::undefined(&Rc::from(key), None)),
        }
    }

    fn write_member(&self, key: &str, value: Value) -> Result<(), RuntimeError> {
        let Value::Object(object) = self else {
            return Err(RuntimeError::type_error("Object", self));
        };
        object.put(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VMCreateInfo;

    #[test]
    fn scalar_views() {
        assert!(Value::Nil.is_null());
        assert!(Value::True.as_boolean().unwrap());
        assert!(Value::Float(3.0).fits_in_i64());
        assert!(!Value::Float(3.5).fits_in_i64());
        assert_eq!(Value::Integer(7).as_f64().unwrap(), 7.0);
        assert!(Value::string("x").as_i64().is_err());
    }

    #[test]
    fn floats_past_i64_do_not_fit() {
        let two_63 = Value::Float(2f64.powi(63));
        assert!(!two_63.fits_in_i64());
        assert!(two_63.as_i64().is_err());

        let min = Value::Float(-(2f64.powi(63)));
        assert!(matches!(min.as_i64(), Ok(i64::MIN)));
        assert!(!Value::Integer(i64::MAX).fits_in_f64());
    }

    #[test]
    fn members_read_through_prototypes() {
        let vm = VM::new(VMCreateInfo::default());
        let parent = vm.clone_object(None);
        parent.put("size", Value::Integer(3));
        let child = Value::Object(vm.clone_object(Some(&Value::Object(parent.clone()))));

        assert!(child.has_members());
        assert!(child.member_keys().is_empty());
        assert!(matches!(child.read_member(&vm, "size"), Ok(Value::Integer(3))));
        assert!(child.read_member(&vm, "nope").is_err());
    }

    #[test]
    fn write_member_shadows_inherited_slots() {
        let vm = VM::new(VMCreateInfo::default());
        let parent = vm.clone_object(None);
        parent.put("size", Value::Integer(3));
        let child = vm.clone_object(Some(&Value::Object(parent.clone())));
        let value = Value::Object(child.clone());

        value.write_member("size", Value::Integer(4)).unwrap();
        assert!(matches!(parent.get_slot("size"), Some(Value::Integer(3))));
        assert!(matches!(child.get_slot("size"), Some(Value::Integer(4))));

        let fresh = Value::Object(vm.clone_object(None));
        fresh.write_member("type", Value::string("Fresh")).unwrap();
        let root = vm.specials.object.clone();
        assert!(matches!(root.get_slot("type"), Some(Value::String(name)) if &*name == "Object"));
    }
}
