//! Scanned symbols.
//!
//! Symbols are the immutable, read-only view validators receive. A type owns its members;
//! members point back at their declaring type through a [`Weak`] reference, so the catalog
//! never forms a reference cycle.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::corpus::{Annotation, AnnotationKind, MethodModifiers};

/// A reference to a [`TypeSymbol`]
pub type TypeSymbolRc = Arc<TypeSymbol>;
/// A reference to a [`FieldSymbol`]
pub type FieldSymbolRc = Arc<FieldSymbol>;
/// A reference to a [`PropertySymbol`]
pub type PropertySymbolRc = Arc<PropertySymbol>;
/// A reference to a [`MethodSymbol`]
pub type MethodSymbolRc = Arc<MethodSymbol>;

/// Annotation kinds whose validators must never receive a symbol.
///
/// Built from the `Exclude` annotations of the symbol and, for members, of the declaring
/// type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet(Vec<AnnotationKind>);

impl SkipSet {
    /// Collects the kinds of every `Exclude` annotation in `annotations`
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let kinds = annotations
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::Exclude(kinds) => Some(kinds.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();

        SkipSet::normalized(kinds)
    }

    /// The kinds of both sets
    #[must_use]
    pub fn union(&self, other: &SkipSet) -> SkipSet {
        if other.0.is_empty() {
            return self.clone();
        }

        let mut kinds = Vec::with_capacity(self.0.len() + other.0.len());
        kinds.extend(self.0.iter().cloned());
        kinds.extend(other.0.iter().cloned());
        SkipSet::normalized(kinds)
    }

    /// Returns `true` if validators declared by `kind` must skip this symbol
    #[must_use]
    pub fn contains(&self, kind: &AnnotationKind) -> bool {
        self.0.binary_search(kind).is_ok()
    }

    /// Returns `true` if nothing is excluded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The excluded kinds, sorted
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationKind> {
        self.0.iter()
    }

    fn normalized(mut kinds: Vec<AnnotationKind>) -> SkipSet {
        kinds.sort_unstable();
        kinds.dedup();
        SkipSet(kinds)
    }
}

/// Common read access to every symbol validators receive.
pub trait Symbol {
    /// Annotations declared on the symbol. Empty if they could not be decoded.
    fn annotations(&self) -> &[Annotation];

    /// Kinds whose validators must skip this symbol
    fn skip_set(&self) -> &SkipSet;

    /// Name of the compilation unit the symbol was scanned from
    fn unit(&self) -> &str;

    /// Human readable name, `Namespace.Type` or `Namespace.Type::member`
    fn display_name(&self) -> String;

    /// Returns `true` if a custom annotation of `kind` is declared on the symbol
    fn has_annotation(&self, kind: &AnnotationKind) -> bool {
        self.custom_annotation(kind).is_some()
    }

    /// The arguments of the first custom annotation of `kind`
    fn custom_annotation(&self, kind: &AnnotationKind) -> Option<&[String]> {
        self.annotations().iter().find_map(|annotation| match annotation {
            Annotation::Custom { kind: found, args } if found == kind => Some(args.as_slice()),
            _ => None,
        })
    }
}

impl<T: Symbol + ?Sized> Symbol for Arc<T> {
    fn annotations(&self) -> &[Annotation] {
        (**self).annotations()
    }

    fn skip_set(&self) -> &SkipSet {
        (**self).skip_set()
    }

    fn unit(&self) -> &str {
        (**self).unit()
    }

    fn display_name(&self) -> String {
        (**self).display_name()
    }
}

/// A scanned type
#[derive(Debug)]
pub struct TypeSymbol {
    /// Name of the owning compilation unit
    pub unit: Arc<str>,
    /// Namespace, can be empty
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Enumerations land in their own bucket and have no scanned members
    pub is_enum_like: bool,
    /// Declared annotations
    pub annotations: Vec<Annotation>,
    /// Kinds excluded on the type; members inherit them
    pub skip: SkipSet,
    /// Scanned members, in declaration order
    pub members: Vec<MemberSymbol>,
}

impl TypeSymbol {
    /// `Namespace.Name`, or `Name` without namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        crate::corpus::full_name(&self.namespace, &self.name)
    }

    /// The scanned fields of this type
    pub fn fields(&self) -> impl Iterator<Item = &FieldSymbolRc> {
        self.members.iter().filter_map(|member| match member {
            MemberSymbol::Field(field) => Some(field),
            _ => None,
        })
    }

    /// The scanned properties of this type
    pub fn properties(&self) -> impl Iterator<Item = &PropertySymbolRc> {
        self.members.iter().filter_map(|member| match member {
            MemberSymbol::Property(property) => Some(property),
            _ => None,
        })
    }

    /// The scanned methods of this type
    pub fn methods(&self) -> impl Iterator<Item = &MethodSymbolRc> {
        self.members.iter().filter_map(|member| match member {
            MemberSymbol::Method(method) => Some(method),
            _ => None,
        })
    }
}

impl Symbol for TypeSymbol {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn skip_set(&self) -> &SkipSet {
        &self.skip
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn display_name(&self) -> String {
        self.full_name()
    }
}

/// Identity shared by every member variant
#[derive(Debug)]
pub struct MemberInfo {
    /// Name of the owning compilation unit
    pub unit: Arc<str>,
    /// Full name of the declaring type
    pub declaring_name: Arc<str>,
    /// The declaring type, alive as long as the catalog is
    pub declaring_type: Weak<TypeSymbol>,
    /// Member name
    pub name: String,
    /// Declared annotations
    pub annotations: Vec<Annotation>,
    /// Own `Exclude` kinds united with those of the declaring type
    pub skip: SkipSet,
}

impl MemberInfo {
    /// The declaring type, `None` once the catalog was dropped
    #[must_use]
    pub fn declaring_type(&self) -> Option<TypeSymbolRc> {
        self.declaring_type.upgrade()
    }
}

macro_rules! member_symbol {
    ($symbol:ty) => {
        impl std::ops::Deref for $symbol {
            type Target = MemberInfo;

            fn deref(&self) -> &MemberInfo {
                &self.info
            }
        }

        impl Symbol for $symbol {
            fn annotations(&self) -> &[Annotation] {
                &self.info.annotations
            }

            fn skip_set(&self) -> &SkipSet {
                &self.info.skip
            }

            fn unit(&self) -> &str {
                &self.info.unit
            }

            fn display_name(&self) -> String {
                format!("{}::{}", self.info.declaring_name, self.info.name)
            }
        }
    };
}

/// A scanned field
#[derive(Debug)]
pub struct FieldSymbol {
    /// Shared member identity
    pub info: MemberInfo,
    /// Name of the value type
    pub type_name: String,
    /// Whether the host persists this field
    pub is_host_serializable: bool,
}

/// A scanned property
#[derive(Debug)]
pub struct PropertySymbol {
    /// Shared member identity
    pub info: MemberInfo,
    /// Name of the value type
    pub type_name: String,
    /// Has a getter
    pub has_getter: bool,
    /// Has a setter
    pub has_setter: bool,
}

/// A scanned method
#[derive(Debug)]
pub struct MethodSymbol {
    /// Shared member identity
    pub info: MemberInfo,
    /// Modifier flags
    pub modifiers: MethodModifiers,
    /// Name of the return type
    pub return_type: String,
    /// Names of the parameter types
    pub parameters: Vec<String>,
}

impl MethodSymbol {
    /// Returns `true` for static methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(MethodModifiers::STATIC)
    }
}

member_symbol!(FieldSymbol);
member_symbol!(PropertySymbol);
member_symbol!(MethodSymbol);

/// A member of any variant, as received by `EachMember` validators
#[derive(Debug, Clone)]
pub enum MemberSymbol {
    /// A field
    Field(FieldSymbolRc),
    /// A property
    Property(PropertySymbolRc),
    /// A method
    Method(MethodSymbolRc),
}

impl MemberSymbol {
    /// Identity shared by all variants
    #[must_use]
    pub fn info(&self) -> &MemberInfo {
        match self {
            MemberSymbol::Field(field) => &field.info,
            MemberSymbol::Property(property) => &property.info,
            MemberSymbol::Method(method) => &method.info,
        }
    }

    /// Member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info().name
    }
}

impl Symbol for MemberSymbol {
    fn annotations(&self) -> &[Annotation] {
        &self.info().annotations
    }

    fn skip_set(&self) -> &SkipSet {
        &self.info().skip
    }

    fn unit(&self) -> &str {
        &self.info().unit
    }

    fn display_name(&self) -> String {
        let info = self.info();
        format!("{}::{}", info.declaring_name, info.name)
    }
}

/// Identity of the symbol a diagnostic is about
#[derive(Debug, Clone)]
pub enum SymbolRef {
    /// A type
    Type(TypeSymbolRc),
    /// A member
    Member(MemberSymbol),
}

impl SymbolRef {
    /// The referenced symbol
    #[must_use]
    pub fn symbol(&self) -> &dyn Symbol {
        match self {
            SymbolRef::Type(symbol) => &**symbol as &dyn Symbol,
            SymbolRef::Member(member) => member as &dyn Symbol,
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SymbolRef::Type(_) => "type",
            SymbolRef::Member(MemberSymbol::Field(_)) => "field",
            SymbolRef::Member(MemberSymbol::Property(_)) => "property",
            SymbolRef::Member(MemberSymbol::Method(_)) => "method",
        };
        write!(f, "{} {}", label, self.symbol().display_name())
    }
}

impl From<TypeSymbolRc> for SymbolRef {
    fn from(symbol: TypeSymbolRc) -> Self {
        SymbolRef::Type(symbol)
    }
}

impl From<MemberSymbol> for SymbolRef {
    fn from(member: MemberSymbol) -> Self {
        SymbolRef::Member(member)
    }
}

impl From<FieldSymbolRc> for SymbolRef {
    fn from(field: FieldSymbolRc) -> Self {
        SymbolRef::Member(MemberSymbol::Field(field))
    }
}

impl From<PropertySymbolRc> for SymbolRef {
    fn from(property: PropertySymbolRc) -> Self {
        SymbolRef::Member(MemberSymbol::Property(property))
    }
}

impl From<MethodSymbolRc> for SymbolRef {
    fn from(method: MethodSymbolRc) -> Self {
        SymbolRef::Member(MemberSymbol::Method(method))
    }
}
