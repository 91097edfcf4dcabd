//! Runtime type identity and ancestry.
//!
//! A [`TypeDescriptor`] is the token used wherever a comparison depends on
//! the runtime type of a value: the instance-of check of field-selective
//! policies and comparator resolution in the type comparator registry.
//! Descriptors are declared as `static` items so that every value of a type
//! shares one descriptor:
//!
//! ```
//! use verity_types::{TypeDescriptor, OBJECT};
//!
//! static PET: TypeDescriptor = TypeDescriptor::interface("zoo.Pet");
//! static DOG_INTERFACES: [&TypeDescriptor; 1] = [&PET];
//! static ANIMAL: TypeDescriptor = TypeDescriptor::class("zoo.Animal").extends(&OBJECT);
//! static DOG: TypeDescriptor = TypeDescriptor::class("zoo.Dog")
//!     .extends(&ANIMAL)
//!     .implements(&DOG_INTERFACES);
//!
//! assert!(DOG.is_subtype_of(&ANIMAL));
//! assert!(DOG.is_subtype_of(&PET));
//! assert!(!ANIMAL.is_subtype_of(&DOG));
//! ```
//!
//! # Identity
//!
//! Two descriptors are the same type iff their names are equal. Names are
//! expected to be unique within a process; use qualified names
//! (`"crate.Type"`) for user types.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Whether a descriptor names a concrete class or a capability interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
}

/// A runtime type-identity token with its declared ancestry.
pub struct TypeDescriptor {
    name: &'static str,
    kind: TypeKind,
    superclass: Option<&'static TypeDescriptor>,
    interfaces: &'static [&'static TypeDescriptor],
}

impl TypeDescriptor {
    /// Declare a class with no superclass and no interfaces.
    pub const fn class(name: &'static str) -> Self {
        Self {
            name,
            kind: TypeKind::Class,
            superclass: None,
            interfaces: &[],
        }
    }

    /// Declare an interface with no super-interfaces.
    pub const fn interface(name: &'static str) -> Self {
        Self {
            name,
            kind: TypeKind::Interface,
            superclass: None,
            interfaces: &[],
        }
    }

    /// Set the direct superclass.
    pub const fn extends(self, parent: &'static TypeDescriptor) -> Self {
        Self {
            superclass: Some(parent),
            ..self
        }
    }

    /// Set the directly implemented interfaces (or, for an interface, its
    /// super-interfaces), in declaration order.
    pub const fn implements(self, interfaces: &'static [&'static TypeDescriptor]) -> Self {
        Self { interfaces, ..self }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// The direct superclass, if any.
    pub fn superclass(&self) -> Option<&'static TypeDescriptor> {
        self.superclass
    }

    /// The directly declared interfaces, in declaration order.
    pub fn interfaces(&self) -> &'static [&'static TypeDescriptor] {
        self.interfaces
    }

    /// The superclass chain, closest first, excluding `self`.
    pub fn superclasses(&self) -> impl Iterator<Item = &'static TypeDescriptor> {
        std::iter::successors(self.superclass, |t| t.superclass)
    }

    /// Every interface reachable from this type, each listed once.
    ///
    /// The order is breadth-first: the interfaces declared by this type (in
    /// declaration order), then those declared by each superclass (closest
    /// superclass first), then the super-interfaces of those, level by level.
    /// The order depends only on the static declarations.
    pub fn interfaces_by_distance(&self) -> Vec<&'static TypeDescriptor> {
        let mut queue: VecDeque<&'static TypeDescriptor> =
            self.interfaces.iter().copied().collect();
        for ancestor in self.superclasses() {
            queue.extend(ancestor.interfaces.iter().copied());
        }

        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        while let Some(interface) = queue.pop_front() {
            if seen.insert(interface.name) {
                ordered.push(interface);
                queue.extend(interface.interfaces.iter().copied());
            }
        }
        ordered
    }

    /// Returns `true` if a value of this type is an instance of `other`.
    ///
    /// Reflexive: every type is a subtype of itself.
    pub fn is_subtype_of(&self, other: &TypeDescriptor) -> bool {
        self == other
            || self.superclasses().any(|t| t == other)
            || self.interfaces_by_distance().into_iter().any(|t| t == other)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass.map(|t| t.name))
            .field(
                "interfaces",
                &self.interfaces.iter().map(|t| t.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ---------------------------------------------------------------------
// Built-in descriptors
// ---------------------------------------------------------------------

/// Root class of every built-in and user type.
pub static OBJECT: TypeDescriptor = TypeDescriptor::class("verity.Object");

/// Implemented by the numeric built-ins.
pub static NUMBER: TypeDescriptor = TypeDescriptor::interface("verity.Number");

static NUMERIC: [&TypeDescriptor; 1] = [&NUMBER];

pub static BOOL: TypeDescriptor = TypeDescriptor::class("verity.Bool").extends(&OBJECT);
pub static INT: TypeDescriptor = TypeDescriptor::class("verity.Int")
    .extends(&OBJECT)
    .implements(&NUMERIC);
pub static FLOAT: TypeDescriptor = TypeDescriptor::class("verity.Float")
    .extends(&OBJECT)
    .implements(&NUMERIC);
pub static TEXT: TypeDescriptor = TypeDescriptor::class("verity.Text").extends(&OBJECT);
pub static BYTES: TypeDescriptor = TypeDescriptor::class("verity.Bytes").extends(&OBJECT);
pub static LIST: TypeDescriptor = TypeDescriptor::class("verity.List").extends(&OBJECT);
