//! Type and member definitions as a compilation unit exposes them.
//!
//! Definitions are the raw side of the scan: they may carry records that fail to decode
//! ([`Record::Corrupt`]). The scanner turns the readable ones into catalog symbols
//! ([`crate::catalog`]).

use std::fmt;

use bitflags::bitflags;

use crate::{
    corpus::{Annotation, Record},
    registry::Routine,
    Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Modifier flags of a method definition
    pub struct MethodModifiers: u32 {
        /// The method does not take an instance; only static methods can be validators
        const STATIC = 0x0001;
        /// Publicly accessible
        const PUBLIC = 0x0002;
        /// Can be overridden
        const VIRTUAL = 0x0004;
        /// No body in the declaring type
        const ABSTRACT = 0x0008;
        /// Compiler generated (accessors, constructors)
        const SPECIAL_NAME = 0x0010;
    }
}

/// A type definition inside a compilation unit.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    /// Namespace, can be empty
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Enumerations are classified separately and their members are not scanned
    pub is_enum_like: bool,
    /// Annotations declared on the type
    pub annotations: Record<Vec<Annotation>>,
    /// Declared members in declaration order
    pub members: Vec<Record<MemberDefinition>>,
}

impl TypeDefinition {
    /// A non-enum type (class, struct, interface) without members
    pub fn class(namespace: &str, name: &str) -> Self {
        TypeDefinition {
            namespace: namespace.to_string(),
            name: name.to_string(),
            is_enum_like: false,
            annotations: Record::Decoded(Vec::new()),
            members: Vec::new(),
        }
    }

    /// An enumeration without members
    pub fn enumeration(namespace: &str, name: &str) -> Self {
        TypeDefinition {
            is_enum_like: true,
            ..TypeDefinition::class(namespace, name)
        }
    }

    /// `Namespace.Name`, or just `Name` for types without a namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// The decoded annotations of this type
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the annotation list cannot be decoded.
    pub fn annotations(&self) -> Result<&[Annotation]> {
        self.annotations.resolve().map(Vec::as_slice)
    }

    /// Adds an annotation. Ignored if the annotation list is corrupt.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Marks the annotation list of this type as undecodable
    #[must_use]
    pub fn with_corrupt_annotations(mut self, reason: &str) -> Self {
        self.annotations = Record::Corrupt(reason.to_string());
        self
    }

    /// Adds a field
    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.members
            .push(Record::Decoded(MemberDefinition::Field(field)));
        self
    }

    /// Adds a property
    #[must_use]
    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.members
            .push(Record::Decoded(MemberDefinition::Property(property)));
        self
    }

    /// Adds a method
    #[must_use]
    pub fn with_method(mut self, method: MethodDefinition) -> Self {
        self.members
            .push(Record::Decoded(MemberDefinition::Method(method)));
        self
    }

    /// Adds a member slot that cannot be read
    #[must_use]
    pub fn with_corrupt_member(mut self, reason: &str) -> Self {
        self.members.push(Record::Corrupt(reason.to_string()));
        self
    }
}

/// A member definition
#[derive(Debug, Clone)]
pub enum MemberDefinition {
    /// A field
    Field(FieldDefinition),
    /// A property
    Property(PropertyDefinition),
    /// A method
    Method(MethodDefinition),
}

impl MemberDefinition {
    /// Name of the member
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberDefinition::Field(field) => &field.name,
            MemberDefinition::Property(property) => &property.name,
            MemberDefinition::Method(method) => &method.name,
        }
    }

    /// Annotation record of the member
    #[must_use]
    pub fn annotation_record(&self) -> &Record<Vec<Annotation>> {
        match self {
            MemberDefinition::Field(field) => &field.annotations,
            MemberDefinition::Property(property) => &property.annotations,
            MemberDefinition::Method(method) => &method.annotations,
        }
    }
}

/// A field definition
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Name of the value type
    pub type_name: String,
    /// Whether the host persists this field. Splits fields into two buckets.
    pub is_host_serializable: bool,
    /// Annotations declared on the field
    pub annotations: Record<Vec<Annotation>>,
}

impl FieldDefinition {
    /// A non-serializable field without annotations
    pub fn new(name: &str, type_name: &str) -> Self {
        FieldDefinition {
            name: name.to_string(),
            type_name: type_name.to_string(),
            is_host_serializable: false,
            annotations: Record::Decoded(Vec::new()),
        }
    }

    /// Sets whether the host serializes this field
    #[must_use]
    pub fn serializable(mut self, serializable: bool) -> Self {
        self.is_host_serializable = serializable;
        self
    }

    /// Adds an annotation. Ignored if the annotation list is corrupt.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Marks the annotation list of this field as undecodable
    #[must_use]
    pub fn with_corrupt_annotations(mut self, reason: &str) -> Self {
        self.annotations = Record::Corrupt(reason.to_string());
        self
    }
}

/// A property definition
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Name of the value type
    pub type_name: String,
    /// Has a getter
    pub has_getter: bool,
    /// Has a setter
    pub has_setter: bool,
    /// Annotations declared on the property
    pub annotations: Record<Vec<Annotation>>,
}

impl PropertyDefinition {
    /// A read-write property without annotations
    pub fn new(name: &str, type_name: &str) -> Self {
        PropertyDefinition {
            name: name.to_string(),
            type_name: type_name.to_string(),
            has_getter: true,
            has_setter: true,
            annotations: Record::Decoded(Vec::new()),
        }
    }

    /// Removes the setter
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.has_setter = false;
        self
    }

    /// Adds an annotation. Ignored if the annotation list is corrupt.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A method definition
///
/// `routine` is the bindable body of the method. The scanner only looks at it when the
/// method is static and carries a registration annotation.
#[derive(Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Modifier flags
    pub modifiers: MethodModifiers,
    /// Name of the return type
    pub return_type: String,
    /// Names of the parameter types, in order
    pub parameters: Vec<String>,
    /// Annotations declared on the method
    pub annotations: Record<Vec<Annotation>>,
    /// The callable body, if the host exposes one
    pub routine: Option<Routine>,
}

impl MethodDefinition {
    /// An instance method returning `void`, without body or annotations
    pub fn new(name: &str) -> Self {
        MethodDefinition {
            name: name.to_string(),
            modifiers: MethodModifiers::PUBLIC,
            return_type: "void".to_string(),
            parameters: Vec::new(),
            annotations: Record::Decoded(Vec::new()),
            routine: None,
        }
    }

    /// A static method with the given body, the usual shape of a validator
    pub fn validator(name: &str, routine: Routine) -> Self {
        MethodDefinition::new(name)
            .with_modifiers(MethodModifiers::PUBLIC | MethodModifiers::STATIC)
            .with_routine(routine)
    }

    /// Replaces the modifier flags
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Sets the callable body
    #[must_use]
    pub fn with_routine(mut self, routine: Routine) -> Self {
        self.routine = Some(routine);
        self
    }

    /// Sets the return type name
    #[must_use]
    pub fn returning(mut self, type_name: &str) -> Self {
        self.return_type = type_name.to_string();
        self
    }

    /// Appends a parameter type name
    #[must_use]
    pub fn with_parameter(mut self, type_name: &str) -> Self {
        self.parameters.push(type_name.to_string());
        self
    }

    /// Adds an annotation. Ignored if the annotation list is corrupt.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Returns `true` for static methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(MethodModifiers::STATIC)
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .field("return_type", &self.return_type)
            .field("parameters", &self.parameters)
            .field("annotations", &self.annotations)
            .field("routine", &self.routine.as_ref().map(Routine::shape))
            .finish()
    }
}

pub(crate) fn full_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}
