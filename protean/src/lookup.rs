use rustc_hash::FxHashSet;

use crate::{ObjectRef, SpecialObjects, Value};

/// Identity set used to break prototype cycles.
#[derive(Debug, Default)]
pub struct VisitedSet(FxHashSet<usize>);

impl VisitedSet {
    /// `false` if `object` was already visited.
    #[inline]
    pub fn insert(&mut self, object: &ObjectRef) -> bool {
        self.0.insert(object.id())
    }
}

/// The result of a slot lookup.
#[derive(Debug, Clone)]
pub enum LookupResult {
    /// Name was not found.
    None,
    /// Name was found.
    Found {
        /// The object that owns the slot (may differ from the start object
        /// if the slot was found via the prototype chain).
        holder: ObjectRef,
        value: Value,
    },
}

#[derive(Debug, Clone)]
pub enum UpdateResult {
    Updated(Value),
    NotFound,
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found { .. })
    }

    pub fn value(self) -> Option<Value> {
        match self {
            LookupResult::None => None,
            LookupResult::Found { value, .. } => Some(value),
        }
    }
}

/// Walk `start` and its prototypes, returning the first holder of `key`.
///
/// Every node is visited at most once, so cyclic chains end in
/// [`LookupResult::None`].
pub fn lookup_slot(start: &ObjectRef, key: &str) -> LookupResult {
    let mut visited = VisitedSet::default();
    let mut current = Some(start.clone());

    while let Some(object) = current {
        if !visited.insert(&object) {
            log::debug!("lookup of `{key}` stopped at a prototype cycle");
            return LookupResult::None;
        }

        let next = {
            let borrowed = object.borrow();
            if let Some(value) = borrowed.get(key) {
                return LookupResult::Found {
                    holder: object.clone(),
                    value: value.clone(),
                };
            }
            borrowed.prototype().cloned()
        };
        current = next;
    }

    LookupResult::None
}

/// Look up `key` on any value, starting at its effective prototype.
#[inline]
pub fn lookup_value(
    specials: &SpecialObjects,
    receiver: &Value,
    key: &str,
) -> LookupResult {
    lookup_slot(&specials.effective_prototype(receiver), key)
}

pub fn get_or_default(
    specials: &SpecialObjects,
    receiver: &Value,
    key: &str,
    default: Value,
) -> Value {
    lookup_value(specials, receiver, key).value().unwrap_or(default)
}

/// Overwrite `key` where it is already defined.
///
/// A miss is reported, not repaired: the caller decides whether the slot
/// should be defined fresh.
pub fn update_slot(
    specials: &SpecialObjects,
    receiver: &Value,
    key: &str,
    new_value: Value,
) -> UpdateResult {
    match lookup_value(specials, receiver, key) {
        LookupResult::None => UpdateResult::NotFound,
        LookupResult::Found { holder, .. } => {
            holder.put(key, new_value.clone());
            UpdateResult::Updated(new_value)
        }
    }
}

/// `true` if `candidate` appears in the prototype chain above `object`.
pub fn has_prototype(object: &ObjectRef, candidate: &ObjectRef) -> bool {
    let mut visited = VisitedSet::default();
    visited.insert(object);
    let mut current = object.prototype();

    while let Some(proto) = current {
        if proto.ptr_eq(candidate) {
            return true;
        }
        if !visited.insert(&proto) {
            return false;
        }
        current = proto.prototype();
    }

    false
}
