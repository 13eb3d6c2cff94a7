//! Validator categories and the callback shapes they require.
//!
//! A [`Category`] says which symbols a validator is called with. Each category fixes one
//! [`Shape`], the callback signature its routines must have. The shape is checked once,
//! when a routine is bound, so a dispatched callback never sees a symbol of the wrong kind.
//!
//! # Categories
//!
//! | Category | Symbols | Shape |
//! |----------|---------|-------|
//! | `EachType(filter)` | enum-like and/or non-enum-like types | [`Shape::Type`] |
//! | `EachMember` | every field, property and method | [`Shape::Member`] |
//! | `EachField(filter)` | serializable and/or non-serializable fields | [`Shape::Field`] |
//! | `EachProperty` | every property | [`Shape::Property`] |
//! | `EachMethod` | every method | [`Shape::Method`] |
//! | `Once` | none, one call per order key | [`Shape::Unit`] |
//!
//! # Filters
//!
//! Each type and each field lives in exactly one specific bucket. An `Either` filter accepts
//! both, so the registry stores such a validator under both buckets and it still runs once
//! per symbol.
//!
//! # Examples
//!
//! ```rust
//! use symcheck::registry::{Category, FieldFilter, Shape};
//!
//! let category = Category::EachField(FieldFilter::Either);
//! assert_eq!(category.shape(), Shape::Field);
//! assert!(FieldFilter::Either.accepts(true) && FieldFilter::Either.accepts(false));
//! assert_eq!(Shape::Unit.signature(), "fn(&Reporter) -> Result<()>");
//! ```

use strum::{Display, EnumIter, IntoStaticStr};

/// Which types an `EachType` validator receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TypeFilter {
    /// Enumerations only
    EnumLike,
    /// Everything that is not an enumeration
    NonEnumLike,
    /// All types
    Either,
}

impl TypeFilter {
    /// Returns `true` if a type with the given classification passes this filter
    #[must_use]
    pub fn accepts(self, is_enum_like: bool) -> bool {
        match self {
            TypeFilter::EnumLike => is_enum_like,
            TypeFilter::NonEnumLike => !is_enum_like,
            TypeFilter::Either => true,
        }
    }
}

/// Which fields an `EachField` validator receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FieldFilter {
    /// Fields the host persists
    Serializable,
    /// Fields the host does not persist
    NonSerializable,
    /// All fields
    Either,
}

impl FieldFilter {
    /// Returns `true` if a field with the given serializability passes this filter
    #[must_use]
    pub fn accepts(self, is_host_serializable: bool) -> bool {
        match self {
            FieldFilter::Serializable => is_host_serializable,
            FieldFilter::NonSerializable => !is_host_serializable,
            FieldFilter::Either => true,
        }
    }
}

/// The symbol category a validator registers against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Category {
    /// One call per type passing the filter
    EachType(TypeFilter),
    /// One call per field, property and method
    EachMember,
    /// One call per field passing the filter
    EachField(FieldFilter),
    /// One call per property
    EachProperty,
    /// One call per method
    EachMethod,
    /// One call per run, no symbol
    Once,
}

impl Category {
    /// The callback shape routines of this category must have
    #[must_use]
    pub fn shape(self) -> Shape {
        match self {
            Category::EachType(_) => Shape::Type,
            Category::EachMember => Shape::Member,
            Category::EachField(_) => Shape::Field,
            Category::EachProperty => Shape::Property,
            Category::EachMethod => Shape::Method,
            Category::Once => Shape::Unit,
        }
    }
}

/// The parameter shape of a validator callback.
///
/// The display form is the Rust signature a routine needs, and is what registration
/// diagnostics name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum Shape {
    /// Receives one type
    #[strum(serialize = "fn(&TypeSymbolRc, &Reporter) -> Result<()>")]
    Type,
    /// Receives one member of any variant
    #[strum(serialize = "fn(&MemberSymbol, &Reporter) -> Result<()>")]
    Member,
    /// Receives one field
    #[strum(serialize = "fn(&FieldSymbolRc, &Reporter) -> Result<()>")]
    Field,
    /// Receives one property
    #[strum(serialize = "fn(&PropertySymbolRc, &Reporter) -> Result<()>")]
    Property,
    /// Receives one method
    #[strum(serialize = "fn(&MethodSymbolRc, &Reporter) -> Result<()>")]
    Method,
    /// Receives no symbol
    #[strum(serialize = "fn(&Reporter) -> Result<()>")]
    Unit,
}

impl Shape {
    /// The required Rust signature
    #[must_use]
    pub fn signature(self) -> &'static str {
        self.into()
    }
}
