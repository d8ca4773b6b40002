use super::StorageValue;
use crate::types::TypeTag;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A host value carried opaquely inside a [`Value`](super::Value).
pub trait ObjectValue: Any + fmt::Debug + fmt::Display + Send + Sync {
    fn type_tag(&self) -> TypeTag;

    fn as_any(&self) -> &dyn Any;

    fn eq_object(&self, other: &dyn ObjectValue) -> bool;

    fn hash_object(&self, state: &mut dyn Hasher);
}

impl<T> ObjectValue for T
where
    T: StorageValue + fmt::Debug + fmt::Display + Eq + Hash + Send + Sync,
{
    fn type_tag(&self) -> TypeTag {
        T::type_tag()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_object(&self, other: &dyn ObjectValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| other == self)
    }

    fn hash_object(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// Shared handle to a type-erased host value.
#[derive(Clone)]
pub struct Object(Arc<dyn ObjectValue>);

impl Object {
    pub fn new<T: ObjectValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn type_tag(&self) -> TypeTag {
        self.0.type_tag()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.0.as_any().is::<T>()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_object(other.0.as_ref())
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_object(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// One constant of a registered enumeration.
#[derive(Debug, Clone, Copy)]
pub struct EnumConstant {
    tag: TypeTag,
    ordinal: usize,
    name: &'static str,
}

impl EnumConstant {
    pub fn new(tag: TypeTag, ordinal: usize, name: &'static str) -> Self {
        Self { tag, ordinal, name }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EnumConstant {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.ordinal == other.ordinal
    }
}

impl Eq for EnumConstant {}

impl Hash for EnumConstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        self.ordinal.hash(state);
    }
}

impl fmt::Display for EnumConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_object_equality_by_value() {
        let id = Uuid::new_v4();
        let a = Object::new(id);
        let b = Object::new(id);

        assert_eq!(a, b);
        assert_ne!(a, Object::new(Uuid::new_v4()));
        assert_eq!(a.downcast_ref::<Uuid>(), Some(&id));
        assert!(!a.is::<String>());
    }

    #[test]
    fn test_objects_of_different_types_differ() {
        let a = Object::new(util::IgnoreCase::new("abc"));
        let b = Object::new(Uuid::nil());

        assert_ne!(a, b);
        assert_ne!(a.type_tag(), b.type_tag());
    }
}
