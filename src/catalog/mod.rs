//! The symbol catalog.
//!
//! A [`Catalog`] classifies every scanned symbol into the buckets validators register
//! against. Each type lands in exactly one of the two type buckets, each field in exactly
//! one of the two serializability buckets, and every field, property and method also lands
//! in the member bucket. Buckets keep insertion order, which is the order validators see
//! symbols in.
//!
//! Catalogs are built per partition by the scanner and folded into one by the merger. After
//! the merge the catalog is never mutated again.

mod symbols;

pub use symbols::{
    FieldSymbol, FieldSymbolRc, MemberInfo, MemberSymbol, MethodSymbol, MethodSymbolRc,
    PropertySymbol, PropertySymbolRc, SkipSet, Symbol, SymbolRef, TypeSymbol, TypeSymbolRc,
};

use std::fmt;

/// Bucket sizes of a catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Enum-like types
    pub enum_types: usize,
    /// Non-enum-like types
    pub object_types: usize,
    /// Members of any variant
    pub members: usize,
    /// Serializable fields
    pub serializable_fields: usize,
    /// Non-serializable fields
    pub non_serializable_fields: usize,
    /// Properties
    pub properties: usize,
    /// Methods
    pub methods: usize,
}

impl CatalogStatistics {
    /// Adds the counts of `other` to ours
    pub fn add(&mut self, other: &CatalogStatistics) {
        self.enum_types += other.enum_types;
        self.object_types += other.object_types;
        self.members += other.members;
        self.serializable_fields += other.serializable_fields;
        self.non_serializable_fields += other.non_serializable_fields;
        self.properties += other.properties;
        self.methods += other.methods;
    }

    /// Types of both classifications
    #[must_use]
    pub fn types(&self) -> usize {
        self.enum_types + self.object_types
    }

    /// Fields of both serializability classes
    #[must_use]
    pub fn fields(&self) -> usize {
        self.serializable_fields + self.non_serializable_fields
    }
}

impl fmt::Display for CatalogStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} types ({} enum-like), {} members ({} fields, {} properties, {} methods)",
            self.types(),
            self.enum_types,
            self.members,
            self.fields(),
            self.properties,
            self.methods
        )
    }
}

/// Classified symbols of one partition or of a whole run.
#[derive(Debug, Default)]
pub struct Catalog {
    enum_types: Vec<TypeSymbolRc>,
    object_types: Vec<TypeSymbolRc>,
    members: Vec<MemberSymbol>,
    serializable_fields: Vec<FieldSymbolRc>,
    non_serializable_fields: Vec<FieldSymbolRc>,
    properties: Vec<PropertySymbolRc>,
    methods: Vec<MethodSymbolRc>,
}

impl Catalog {
    /// An empty catalog with room for the given bucket sizes
    pub(crate) fn with_capacity(statistics: &CatalogStatistics) -> Self {
        Catalog {
            enum_types: Vec::with_capacity(statistics.enum_types),
            object_types: Vec::with_capacity(statistics.object_types),
            members: Vec::with_capacity(statistics.members),
            serializable_fields: Vec::with_capacity(statistics.serializable_fields),
            non_serializable_fields: Vec::with_capacity(statistics.non_serializable_fields),
            properties: Vec::with_capacity(statistics.properties),
            methods: Vec::with_capacity(statistics.methods),
        }
    }

    /// Classifies a type and its already scanned members
    pub(crate) fn push_type(&mut self, symbol: TypeSymbolRc) {
        for member in &symbol.members {
            self.push_member(member.clone());
        }

        if symbol.is_enum_like {
            self.enum_types.push(symbol);
        } else {
            self.object_types.push(symbol);
        }
    }

    fn push_member(&mut self, member: MemberSymbol) {
        match &member {
            MemberSymbol::Field(field) if field.is_host_serializable => {
                self.serializable_fields.push(field.clone());
            }
            MemberSymbol::Field(field) => self.non_serializable_fields.push(field.clone()),
            MemberSymbol::Property(property) => self.properties.push(property.clone()),
            MemberSymbol::Method(method) => self.methods.push(method.clone()),
        }
        self.members.push(member);
    }

    /// Appends every bucket of `other` after ours
    pub(crate) fn extend(&mut self, other: Catalog) {
        self.enum_types.extend(other.enum_types);
        self.object_types.extend(other.object_types);
        self.members.extend(other.members);
        self.serializable_fields.extend(other.serializable_fields);
        self.non_serializable_fields
            .extend(other.non_serializable_fields);
        self.properties.extend(other.properties);
        self.methods.extend(other.methods);
    }

    /// Enum-like types
    #[must_use]
    pub fn enum_types(&self) -> &[TypeSymbolRc] {
        &self.enum_types
    }

    /// Non-enum-like types
    #[must_use]
    pub fn object_types(&self) -> &[TypeSymbolRc] {
        &self.object_types
    }

    /// All types, enum-like first
    pub fn types(&self) -> impl Iterator<Item = &TypeSymbolRc> {
        self.enum_types.iter().chain(self.object_types.iter())
    }

    /// Members of any variant
    #[must_use]
    pub fn members(&self) -> &[MemberSymbol] {
        &self.members
    }

    /// Fields the host persists
    #[must_use]
    pub fn serializable_fields(&self) -> &[FieldSymbolRc] {
        &self.serializable_fields
    }

    /// Fields the host does not persist
    #[must_use]
    pub fn non_serializable_fields(&self) -> &[FieldSymbolRc] {
        &self.non_serializable_fields
    }

    /// The "either" view: every field, serializable first
    pub fn fields(&self) -> impl Iterator<Item = &FieldSymbolRc> {
        self.serializable_fields
            .iter()
            .chain(self.non_serializable_fields.iter())
    }

    /// Properties
    #[must_use]
    pub fn properties(&self) -> &[PropertySymbolRc] {
        &self.properties
    }

    /// Methods
    #[must_use]
    pub fn methods(&self) -> &[MethodSymbolRc] {
        &self.methods
    }

    /// Looks up a type by its full name
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<&TypeSymbolRc> {
        self.types().find(|symbol| symbol.full_name() == full_name)
    }

    /// Returns `true` if no type was classified
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enum_types.is_empty() && self.object_types.is_empty()
    }

    /// Bucket sizes
    #[must_use]
    pub fn statistics(&self) -> CatalogStatistics {
        CatalogStatistics {
            enum_types: self.enum_types.len(),
            object_types: self.object_types.len(),
            members: self.members.len(),
            serializable_fields: self.serializable_fields.len(),
            non_serializable_fields: self.non_serializable_fields.len(),
            properties: self.properties.len(),
            methods: self.methods.len(),
        }
    }
}
