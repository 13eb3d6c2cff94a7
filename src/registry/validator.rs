//! Validator callbacks, routines and registrations.
//!
//! A [`Routine`] is a callable body of a known [`Shape`], the way a host exposes the body
//! of a static method. A [`Validator`] is a callback tagged with the category it runs for;
//! its variants fix the parameter shape, so a registered validator can never be called
//! with the wrong kind of symbol. [`Validator::bind`] is the only place where a shape is
//! checked at runtime, when a discovered routine is paired with its annotation.

use std::{fmt, sync::Arc};

use crate::{
    catalog::{FieldSymbolRc, MemberSymbol, MethodSymbolRc, PropertySymbolRc, TypeSymbolRc},
    corpus::AnnotationKind,
    diagnostics::Reporter,
    registry::{Category, FieldFilter, Shape, TypeFilter},
    Error, Result,
};

/// Callback receiving one type
pub type TypeCallback = Arc<dyn Fn(&TypeSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync>;
/// Callback receiving one member of any variant
pub type MemberCallback = Arc<dyn Fn(&MemberSymbol, &Reporter<'_>) -> Result<()> + Send + Sync>;
/// Callback receiving one field
pub type FieldCallback = Arc<dyn Fn(&FieldSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync>;
/// Callback receiving one property
pub type PropertyCallback =
    Arc<dyn Fn(&PropertySymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync>;
/// Callback receiving one method
pub type MethodCallback = Arc<dyn Fn(&MethodSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync>;
/// Callback receiving no symbol
pub type OnceCallback = Arc<dyn Fn(&Reporter<'_>) -> Result<()> + Send + Sync>;

/// The callable body of a method, as exposed by a compilation unit.
#[derive(Clone)]
pub enum Routine {
    /// Takes a type
    Type(TypeCallback),
    /// Takes a member
    Member(MemberCallback),
    /// Takes a field
    Field(FieldCallback),
    /// Takes a property
    Property(PropertyCallback),
    /// Takes a method
    Method(MethodCallback),
    /// Takes nothing
    Unit(OnceCallback),
}

impl Routine {
    /// A routine taking a type
    pub fn on_type<F>(f: F) -> Self
    where
        F: Fn(&TypeSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Routine::Type(Arc::new(f))
    }

    /// A routine taking a member
    pub fn on_member<F>(f: F) -> Self
    where
        F: Fn(&MemberSymbol, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Routine::Member(Arc::new(f))
    }

    /// A routine taking a field
    pub fn on_field<F>(f: F) -> Self
    where
        F: Fn(&FieldSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Routine::Field(Arc::new(f))
    }

    /// A routine taking a property
    pub fn on_property<F>(f: F) -> Self
    where
        F: Fn(&PropertySymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Routine::Property(Arc::new(f))
    }

    /// A routine taking a method
    pub fn on_method<F>(f: F) -> Self
    where
        F: Fn(&MethodSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Routine::Method(Arc::new(f))
    }

    /// A routine taking nothing
    pub fn once<F>(f: F) -> Self
    where
        F: Fn(&Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Routine::Unit(Arc::new(f))
    }

    /// The parameter shape of this routine
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Routine::Type(_) => Shape::Type,
            Routine::Member(_) => Shape::Member,
            Routine::Field(_) => Shape::Field,
            Routine::Property(_) => Shape::Property,
            Routine::Method(_) => Shape::Method,
            Routine::Unit(_) => Shape::Unit,
        }
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Routine({:?})", self.shape())
    }
}

/// A callback tagged with the category it runs for.
#[derive(Clone)]
pub enum Validator {
    /// Runs for each type passing the filter
    EachType(TypeFilter, TypeCallback),
    /// Runs for each member
    EachMember(MemberCallback),
    /// Runs for each field passing the filter
    EachField(FieldFilter, FieldCallback),
    /// Runs for each property
    EachProperty(PropertyCallback),
    /// Runs for each method
    EachMethod(MethodCallback),
    /// Runs once per order key it is registered at
    Once(OnceCallback),
}

impl Validator {
    /// A type validator
    pub fn each_type<F>(filter: TypeFilter, f: F) -> Self
    where
        F: Fn(&TypeSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Validator::EachType(filter, Arc::new(f))
    }

    /// A member validator
    pub fn each_member<F>(f: F) -> Self
    where
        F: Fn(&MemberSymbol, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Validator::EachMember(Arc::new(f))
    }

    /// A field validator
    pub fn each_field<F>(filter: FieldFilter, f: F) -> Self
    where
        F: Fn(&FieldSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Validator::EachField(filter, Arc::new(f))
    }

    /// A property validator
    pub fn each_property<F>(f: F) -> Self
    where
        F: Fn(&PropertySymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Validator::EachProperty(Arc::new(f))
    }

    /// A method validator
    pub fn each_method<F>(f: F) -> Self
    where
        F: Fn(&MethodSymbolRc, &Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Validator::EachMethod(Arc::new(f))
    }

    /// A validator without symbol
    pub fn once<F>(f: F) -> Self
    where
        F: Fn(&Reporter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Validator::Once(Arc::new(f))
    }

    /// The category this validator runs for
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Validator::EachType(filter, _) => Category::EachType(*filter),
            Validator::EachMember(_) => Category::EachMember,
            Validator::EachField(filter, _) => Category::EachField(*filter),
            Validator::EachProperty(_) => Category::EachProperty,
            Validator::EachMethod(_) => Category::EachMethod,
            Validator::Once(_) => Category::Once,
        }
    }

    /// Binds a discovered routine to the shape `category` requires.
    ///
    /// # Arguments
    ///
    /// * `category` - The category named by the registration annotation
    /// * `routine` - The body of the annotated method, `None` if it has none
    /// * `name` - Display name of the routine, used in the error
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ShapeMismatch`] naming the required shape if the routine is
    /// missing or has a different shape.
    pub fn bind(category: Category, routine: Option<&Routine>, name: &str) -> Result<Self> {
        let validator = match (category, routine) {
            (Category::EachType(filter), Some(Routine::Type(callback))) => {
                Validator::EachType(filter, callback.clone())
            }
            (Category::EachMember, Some(Routine::Member(callback))) => {
                Validator::EachMember(callback.clone())
            }
            (Category::EachField(filter), Some(Routine::Field(callback))) => {
                Validator::EachField(filter, callback.clone())
            }
            (Category::EachProperty, Some(Routine::Property(callback))) => {
                Validator::EachProperty(callback.clone())
            }
            (Category::EachMethod, Some(Routine::Method(callback))) => {
                Validator::EachMethod(callback.clone())
            }
            (Category::Once, Some(Routine::Unit(callback))) => Validator::Once(callback.clone()),
            (_, routine) => {
                return Err(Error::ShapeMismatch {
                    routine: name.to_string(),
                    expected: category.shape(),
                    found: routine.map(Routine::shape),
                })
            }
        };

        Ok(validator)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({:?})", self.category())
    }
}

/// One entry of the registration table.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Order key; validators run in ascending order-key phases
    pub order: i32,
    /// The kind that declares this validator, checked against symbol skip sets
    pub kind: AnnotationKind,
    /// Display name used in diagnostics
    pub name: Arc<str>,
    /// The callback and its category
    pub validator: Validator,
}

impl Registration {
    /// A registration at order 0
    ///
    /// # Arguments
    ///
    /// * `kind` - The annotation kind this validator belongs to
    /// * `name` - Display name used in diagnostics
    /// * `validator` - The callback and its category
    pub fn new(kind: impl Into<AnnotationKind>, name: &str, validator: Validator) -> Self {
        Registration {
            order: 0,
            kind: kind.into(),
            name: Arc::from(name),
            validator,
        }
    }

    /// Moves this registration to another order key
    #[must_use]
    pub fn at_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}
