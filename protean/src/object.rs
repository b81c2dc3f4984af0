use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use indexmap::IndexMap;

use crate::Value;

/// A mutable slot-holding object.
///
/// `prototype` is the delegation link walked by lookup; the slot table
/// keeps insertion order so enumeration is stable.
#[derive(Debug, Default)]
pub struct Object {
    prototype: Option<ObjectRef>,
    slots: IndexMap<Rc<str>, Value>,
}

/// Shared handle to an [`Object`]. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl Object {
    pub fn new(prototype: Option<ObjectRef>) -> Self {
        Self {
            prototype,
            slots: IndexMap::new(),
        }
    }

    #[inline]
    pub fn prototype(&self) -> Option<&ObjectRef> {
        self.prototype.as_ref()
    }

    pub fn set_prototype(&mut self, prototype: Option<ObjectRef>) {
        self.prototype = prototype;
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.slots.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.slots.get_mut(key)
    }

    /// Inserts or overwrites in place; an overwritten key keeps its
    /// position.
    pub fn put(&mut self, key: impl Into<Rc<str>>, value: Value) {
        self.slots.insert(key.into(), value);
    }

    #[inline]
    pub fn has_slot(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn remove_slot(&mut self, key: &str) -> Option<Value> {
        self.slots.shift_remove(key)
    }

    pub fn slot_names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.slots.keys()
    }

    pub fn slots(&self) -> &IndexMap<Rc<str>, Value> {
        &self.slots
    }
}

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// A fresh object with an empty table delegating to `prototype`.
    pub fn clone_of(prototype: &ObjectRef) -> Self {
        Self::new(Object::new(Some(prototype.clone())))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    #[inline]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const u8 as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn prototype(&self) -> Option<ObjectRef> {
        self.borrow().prototype().cloned()
    }

    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        self.borrow_mut().set_prototype(prototype);
    }

    pub fn put(&self, key: impl Into<Rc<str>>, value: Value) {
        self.borrow_mut().put(key, value);
    }

    pub fn has_slot(&self, key: &str) -> bool {
        self.borrow().has_slot(key)
    }

    /// Own-table read, no delegation.
    pub fn get_slot(&self, key: &str) -> Option<Value> {
        self.borrow().get(key).cloned()
    }

    pub fn slot_names(&self) -> Vec<Rc<str>> {
        self.borrow().slot_names().cloned().collect()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object@{:#x}", self.id())
    }
}
