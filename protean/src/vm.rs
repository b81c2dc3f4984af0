use std::rc::Rc;

use crate::{Coroutine, NumberFormat, Object, ObjectRef, Value, primitives};

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Shared prototypes of every value variant.
#[derive(Debug)]
pub struct SpecialObjects {
    pub object: ObjectRef,
    pub nil: ObjectRef,
    pub true_object: ObjectRef,
    pub false_object: ObjectRef,
    pub number: ObjectRef,
    pub sequence: ObjectRef,
    pub list: ObjectRef,
    pub map: ObjectRef,
    pub message: ObjectRef,
    pub call: ObjectRef,
    pub locals: ObjectRef,
    pub coroutine: ObjectRef,
    pub date: ObjectRef,
    pub function: ObjectRef,
    pub block: ObjectRef,
    pub method: ObjectRef,
    pub exception: ObjectRef,
}

#[derive(Debug, Clone)]
pub struct VMCreateInfo {
    pub number_format: NumberFormat,
    /// Nested activations allowed before `StackOverflow`.
    pub max_depth: usize,
    pub coroutine_label: String,
}

impl Default for VMCreateInfo {
    fn default() -> Self {
        Self {
            number_format: NumberFormat::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            coroutine_label: "main".to_string(),
        }
    }
}

/// Process-wide engine state.
#[derive(Debug)]
pub struct VM {
    pub lobby: ObjectRef,
    pub core_protos: ObjectRef,
    pub specials: SpecialObjects,
    pub coroutine: Rc<Coroutine>,
    pub number_format: NumberFormat,
    pub max_depth: usize,
}

impl SpecialObjects {
    fn derived_from(object: ObjectRef) -> Self {
        let derive = || ObjectRef::clone_of(&object);
        Self {
            nil: derive(),
            true_object: derive(),
            false_object: derive(),
            number: derive(),
            sequence: derive(),
            list: derive(),
            map: derive(),
            message: derive(),
            call: derive(),
            locals: derive(),
            coroutine: derive(),
            date: derive(),
            function: derive(),
            block: derive(),
            method: derive(),
            exception: derive(),
            object,
        }
    }

    /// Prototypes with no lobby behind them.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self::derived_from(ObjectRef::new(Object::new(None)))
    }

    /// Where lookup starts for `value`: objects own their table, every
    /// other variant delegates to its shared prototype.
    pub fn effective_prototype(&self, value: &Value) -> ObjectRef {
        match value {
            Value::Object(object) => object.clone(),
            Value::Nil => self.nil.clone(),
            Value::True => self.true_object.clone(),
            Value::False => self.false_object.clone(),
            Value::Integer(_) | Value::BigInteger(_) | Value::Float(_) => {
                self.number.clone()
            }
            Value::String(_) => self.sequence.clone(),
            Value::Function(_) => self.function.clone(),
            Value::Block(_) => self.block.clone(),
            Value::Method(_) => self.method.clone(),
            Value::List(_) => self.list.clone(),
            Value::Map(_) => self.map.clone(),
            Value::Message(_) => self.message.clone(),
            Value::Call(_) => self.call.clone(),
            Value::Locals(_) => self.locals.clone(),
            Value::Coroutine(_) => self.coroutine.clone(),
            Value::Date(_) => self.date.clone(),
        }
    }

    fn named(&self) -> [(&'static str, &ObjectRef); 17] {
        [
            ("Object", &self.object),
            ("Nil", &self.nil),
            ("True", &self.true_object),
            ("False", &self.false_object),
            ("Number", &self.number),
            ("Sequence", &self.sequence),
            ("List", &self.list),
            ("Map", &self.map),
            ("Message", &self.message),
            ("Call", &self.call),
            ("Locals", &self.locals),
            ("Coroutine", &self.coroutine),
            ("Date", &self.date),
            ("Function", &self.function),
            ("Block", &self.block),
            ("Method", &self.method),
            ("Exception", &self.exception),
        ]
    }
}

impl VM {
    pub fn new(info: VMCreateInfo) -> Self {
        // Object -> Lobby -> Protos -> Object
        let object = ObjectRef::new(Object::new(None));
        let core_protos = ObjectRef::clone_of(&object);
        let lobby = ObjectRef::clone_of(&core_protos);
        object.set_prototype(Some(lobby.clone()));

        let specials = SpecialObjects::derived_from(object);

        for (name, proto) in specials.named() {
            proto.put("type", Value::string(name));
            core_protos.put(name, Value::Object(proto.clone()));
        }
        core_protos.put("type", Value::string("Protos"));
        lobby.put("type", Value::string("Lobby"));
        lobby.put("Lobby", Value::Object(lobby.clone()));
        lobby.put("Protos", Value::Object(core_protos.clone()));
        lobby.put("nil", Value::Nil);
        lobby.put("true", Value::True);
        lobby.put("false", Value::False);

        let coroutine = Rc::new(Coroutine::new(1, &info.coroutine_label));

        let vm = Self {
            lobby,
            core_protos,
            specials,
            coroutine,
            number_format: info.number_format,
            max_depth: info.max_depth,
        };
        primitives::install(&vm);

        log::debug!(
            "bootstrapped {} prototypes, max depth {}",
            vm.specials.named().len(),
            vm.max_depth
        );
        vm
    }

    /// `clone(prototype?)`: the new object delegates to the effective
    /// prototype of `prototype`, or to `Object`.
    pub fn clone_object(&self, prototype: Option<&Value>) -> ObjectRef {
        let proto = match prototype {
            Some(value) => self.specials.effective_prototype(value),
            None => self.specials.object.clone(),
        };
        ObjectRef::clone_of(&proto)
    }

    #[inline]
    pub fn effective_prototype(&self, value: &Value) -> ObjectRef {
        self.specials.effective_prototype(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{has_prototype, lookup_slot};

    #[test]
    fn prototype_graph_is_cyclic_but_connected() {
        let vm = VM::new(VMCreateInfo::default());
        let object = &vm.specials.object;
        assert!(has_prototype(object, &vm.lobby));
        assert!(has_prototype(&vm.lobby, &vm.core_protos));
        assert!(has_prototype(&vm.core_protos, object));
    }

    #[test]
    fn every_object_has_a_prototype() {
        let vm = VM::new(VMCreateInfo::default());
        for (_, proto) in vm.specials.named() {
            assert!(proto.prototype().is_some());
        }
        assert!(vm.lobby.prototype().is_some());
    }

    #[test]
    fn protos_are_reachable_from_any_object() {
        let vm = VM::new(VMCreateInfo::default());
        let fresh = vm.clone_object(None);
        assert!(lookup_slot(&fresh, "List").is_found());
        assert!(lookup_slot(&fresh, "Lobby").is_found());
        assert!(!lookup_slot(&fresh, "definitelyMissing").is_found());
    }

    #[test]
    fn clone_of_primitive_uses_shared_prototype() {
        let vm = VM::new(VMCreateInfo::default());
        let from_number = vm.clone_object(Some(&Value::Integer(3)));
        assert_eq!(from_number.prototype(), Some(vm.specials.number.clone()));

        let parent = vm.clone_object(None);
        let child = vm.clone_object(Some(&Value::Object(parent.clone())));
        assert_eq!(child.prototype(), Some(parent));
        assert!(child.slot_names().is_empty());
    }
}
