//! Runtime type descriptions used to pick translators
//!
//! Every persisted attribute carries a [`TypeTag`]. Tags of bare scalars
//! (`i32`, `bool`, ...) are normalized to their nullable wrapper form before
//! any lookup, so `i32` and `Option<i32>` share one translator.

use crate::value::Value;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Scalar kinds that have a primitive and a wrapper form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Scalar {
    /// Nullable wrapper tag of this scalar.
    pub fn wrapper(self) -> TypeTag {
        let kind = TypeKind::Wrapper(self);
        match self {
            Self::Bool => TypeTag::new::<Option<bool>>("Boolean", kind, &[]),
            Self::Byte => TypeTag::new::<Option<i8>>("Byte", kind, &[]),
            Self::Short => TypeTag::new::<Option<i16>>("Short", kind, &[]),
            Self::Int => TypeTag::new::<Option<i32>>("Integer", kind, &[]),
            Self::Long => TypeTag::new::<Option<i64>>("Long", kind, &[]),
            Self::Float => TypeTag::new::<Option<f32>>("Float", kind, &[]),
            Self::Double => TypeTag::new::<Option<f64>>("Double", kind, &[]),
            Self::Char => TypeTag::new::<Option<char>>("Character", kind, &[]),
        }
    }

    /// Canonical default used when a null is loaded into this scalar.
    pub fn zero(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Byte => Value::Byte(0),
            Self::Short => Value::Short(0),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::Char => Value::Char(' '),
        }
    }
}

/// Capability interfaces a type can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    Collection,
    List,
    Set,
    Map,
    SortedMap,
    Serializable,
}

struct InterfaceMarker<const N: u8>;
struct CategoryMarker<const N: u8>;

impl Interface {
    /// Interfaces this interface directly extends.
    pub fn extends(self) -> &'static [Interface] {
        match self {
            Self::List | Self::Set => &[Self::Collection],
            Self::SortedMap => &[Self::Map],
            Self::Collection | Self::Map | Self::Serializable => &[],
        }
    }

    pub fn tag(self) -> TypeTag {
        let kind = TypeKind::Interface(self);
        match self {
            Self::Collection => TypeTag::new::<InterfaceMarker<0>>("Collection", kind, &[]),
            Self::List => TypeTag::new::<InterfaceMarker<1>>("List", kind, &[]),
            Self::Set => TypeTag::new::<InterfaceMarker<2>>("Set", kind, &[]),
            Self::Map => TypeTag::new::<InterfaceMarker<3>>("Map", kind, &[]),
            Self::SortedMap => TypeTag::new::<InterfaceMarker<4>>("SortedMap", kind, &[]),
            Self::Serializable => TypeTag::new::<InterfaceMarker<5>>("Serializable", kind, &[]),
        }
    }

    fn closure_contains(self, target: Interface) -> bool {
        self == target || self.extends().iter().any(|parent| parent.closure_contains(target))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A bare scalar slot that can never hold null.
    Primitive(Scalar),
    /// The nullable form of a scalar.
    Wrapper(Scalar),
    /// An enumeration with the given constant names, in declaration order.
    Enum(&'static [&'static str]),
    Interface(Interface),
    Class,
}

/// Identity and shape of a persisted type.
///
/// Two tags are equal when they describe the same Rust type.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
    interfaces: &'static [Interface],
}

impl TypeTag {
    pub fn new<T: ?Sized + 'static>(
        name: &'static str,
        kind: TypeKind,
        interfaces: &'static [Interface],
    ) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            kind,
            interfaces,
        }
    }

    pub fn primitive<T: 'static>(scalar: Scalar) -> Self {
        Self::new::<T>(std::any::type_name::<T>(), TypeKind::Primitive(scalar), &[])
    }

    /// Tag of a concrete type implementing the given interfaces.
    pub fn class<T: ?Sized + 'static>(interfaces: &'static [Interface]) -> Self {
        Self::new::<T>(std::any::type_name::<T>(), TypeKind::Class, interfaces)
    }

    pub fn enumeration<T: 'static>(constants: &'static [&'static str]) -> Self {
        Self::new::<T>(std::any::type_name::<T>(), TypeKind::Enum(constants), &[])
    }

    /// The universal object type.
    pub fn object() -> Self {
        Self::new::<Value>("Object", TypeKind::Class, &[])
    }

    /// Key of the category translator shared by all enumerations.
    pub fn any_enum() -> Self {
        Self::new::<CategoryMarker<0>>("Enum", TypeKind::Class, &[])
    }

    /// Tag of raw byte strings.
    pub fn bytes() -> Self {
        Self::new::<[u8]>("byte[]", TypeKind::Class, &[Interface::Serializable])
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn interfaces(&self) -> &'static [Interface] {
        self.interfaces
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn is_object(&self) -> bool {
        self.id == TypeId::of::<Value>()
    }

    /// Enum constant names, if this is an enumeration.
    pub fn constants(&self) -> Option<&'static [&'static str]> {
        match self.kind {
            TypeKind::Enum(constants) => Some(constants),
            _ => None,
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTag")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Returns the wrapper form of a primitive tag, or the tag unchanged.
pub fn normalize(tag: &TypeTag) -> TypeTag {
    match tag.kind {
        TypeKind::Primitive(scalar) => scalar.wrapper(),
        _ => *tag,
    }
}

/// Canonical default of a scalar type, `None` for every other type.
pub fn zero_value(tag: &TypeTag) -> Option<Value> {
    match normalize(tag).kind {
        TypeKind::Wrapper(scalar) => Some(scalar.zero()),
        _ => None,
    }
}

/// Whether `tag` implements the interface described by `interface`.
///
/// Walks the full interface closure of `tag`. Returns false when
/// `interface` is not an interface tag.
pub fn implements(tag: &TypeTag, interface: &TypeTag) -> bool {
    match interface.kind {
        TypeKind::Interface(target) => implements_interface(tag, target),
        _ => false,
    }
}

pub fn implements_interface(tag: &TypeTag, target: Interface) -> bool {
    if let TypeKind::Interface(own) = tag.kind {
        if own.closure_contains(target) {
            return true;
        }
    }
    tag.interfaces
        .iter()
        .any(|declared| declared.closure_contains(target))
}
