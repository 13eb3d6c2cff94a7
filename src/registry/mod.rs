//! Validator registrations grouped by category and order key.
//!
//! The [`Registry`] is the runtime form of the registration table. Every [`Registration`]
//! lands in the bucket its category names, inside an [`OrderGroups`] that keeps one ordered
//! `Vec` of callbacks per order key. Two registrations at the same category and order are
//! both kept, in registration order.
//!
//! Filters that accept everything (`TypeFilter::Either`, `FieldFilter::Either`) store the
//! validator in both specific buckets. Every symbol lives in exactly one specific bucket, so
//! such a validator still runs exactly once per symbol.
//!
//! # Examples
//!
//! ```rust
//! use symcheck::registry::{FieldFilter, Registration, Registry, Validator};
//!
//! let mut registry = Registry::default();
//! registry.register(Registration::new(
//!     "Game.Required",
//!     "required",
//!     Validator::each_field(FieldFilter::Either, |_, _| Ok(())),
//! ));
//! registry.register(
//!     Registration::new("Game.Setup", "setup", Validator::once(|_| Ok(()))).at_order(-1),
//! );
//!
//! assert_eq!(registry.len(), 2);
//! assert_eq!(registry.order_keys(), vec![-1, 0]);
//! assert_eq!(registry.serializable_fields().at(0).len(), 1);
//! assert_eq!(registry.non_serializable_fields().at(0).len(), 1);
//! ```

mod category;
mod validator;

pub use category::{Category, FieldFilter, Shape, TypeFilter};
pub use validator::{
    FieldCallback, MemberCallback, MethodCallback, OnceCallback, PropertyCallback, Registration,
    Routine, TypeCallback, Validator,
};

use std::{collections::BTreeMap, sync::Arc};

use crate::corpus::AnnotationKind;

/// A callback as stored in a bucket: the kind and name of its registration travel with it.
#[derive(Clone)]
pub struct Registered<F> {
    /// The declaring annotation kind
    pub kind: AnnotationKind,
    /// Display name used in diagnostics
    pub name: Arc<str>,
    /// The callback
    pub callback: F,
}

fn registered<F>(kind: &AnnotationKind, name: &Arc<str>, callback: F) -> Registered<F> {
    Registered {
        kind: kind.clone(),
        name: name.clone(),
        callback,
    }
}

/// Callbacks of one bucket, one ordered list per order key.
pub struct OrderGroups<F> {
    groups: BTreeMap<i32, Vec<Registered<F>>>,
}

impl<F> Default for OrderGroups<F> {
    fn default() -> Self {
        OrderGroups {
            groups: BTreeMap::new(),
        }
    }
}

impl<F> OrderGroups<F> {
    fn push(&mut self, order: i32, registered: Registered<F>) {
        self.groups.entry(order).or_default().push(registered);
    }

    /// Callbacks registered at `order`, in registration order
    #[must_use]
    pub fn at(&self, order: i32) -> &[Registered<F>] {
        self.groups.get(&order).map_or(&[], Vec::as_slice)
    }

    /// Order keys with at least one callback, ascending
    pub fn orders(&self) -> impl Iterator<Item = i32> + '_ {
        self.groups.keys().copied()
    }

    /// Total number of callbacks over all order keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Returns `true` if no callback is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Appends the groups of `other` after ours, key by key
    fn append(&mut self, other: OrderGroups<F>) {
        for (order, mut entries) in other.groups {
            let target = self.groups.entry(order).or_default();
            target.reserve(entries.len());
            target.append(&mut entries);
        }
    }
}

/// All validators of one run, bucketed by the symbol category they receive.
#[derive(Default)]
pub struct Registry {
    enum_types: OrderGroups<TypeCallback>,
    object_types: OrderGroups<TypeCallback>,
    members: OrderGroups<MemberCallback>,
    serializable_fields: OrderGroups<FieldCallback>,
    non_serializable_fields: OrderGroups<FieldCallback>,
    properties: OrderGroups<PropertyCallback>,
    methods: OrderGroups<MethodCallback>,
    once: OrderGroups<OnceCallback>,
    registrations: usize,
}

impl Registry {
    /// Adds a registration to the bucket(s) its category names.
    ///
    /// Registrations are never replaced; a second registration at the same category and
    /// order runs after the first.
    pub fn register(&mut self, registration: Registration) {
        let Registration {
            order,
            kind,
            name,
            validator,
        } = registration;

        match validator {
            Validator::EachType(filter, callback) => {
                if filter.accepts(true) {
                    let entry = registered(&kind, &name, callback.clone());
                    self.enum_types.push(order, entry);
                }
                if filter.accepts(false) {
                    self.object_types.push(order, registered(&kind, &name, callback));
                }
            }
            Validator::EachMember(callback) => {
                self.members.push(order, registered(&kind, &name, callback));
            }
            Validator::EachField(filter, callback) => {
                if filter.accepts(true) {
                    let entry = registered(&kind, &name, callback.clone());
                    self.serializable_fields.push(order, entry);
                }
                if filter.accepts(false) {
                    self.non_serializable_fields.push(order, registered(&kind, &name, callback));
                }
            }
            Validator::EachProperty(callback) => {
                self.properties.push(order, registered(&kind, &name, callback));
            }
            Validator::EachMethod(callback) => {
                self.methods.push(order, registered(&kind, &name, callback));
            }
            Validator::Once(callback) => {
                self.once.push(order, registered(&kind, &name, callback));
            }
        }

        self.registrations += 1;
    }

    /// Distinct order keys over all buckets, ascending
    #[must_use]
    pub fn order_keys(&self) -> Vec<i32> {
        let mut keys: Vec<i32> = self
            .enum_types
            .orders()
            .chain(self.object_types.orders())
            .chain(self.members.orders())
            .chain(self.serializable_fields.orders())
            .chain(self.non_serializable_fields.orders())
            .chain(self.properties.orders())
            .chain(self.methods.orders())
            .chain(self.once.orders())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Number of registrations accepted, counting an `Either` registration once
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations
    }

    /// Returns `true` if nothing was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations == 0
    }

    /// Validators for enum-like types
    #[must_use]
    pub fn enum_types(&self) -> &OrderGroups<TypeCallback> {
        &self.enum_types
    }

    /// Validators for non-enum-like types
    #[must_use]
    pub fn object_types(&self) -> &OrderGroups<TypeCallback> {
        &self.object_types
    }

    /// Validators for members of any variant
    #[must_use]
    pub fn members(&self) -> &OrderGroups<MemberCallback> {
        &self.members
    }

    /// Validators for serializable fields
    #[must_use]
    pub fn serializable_fields(&self) -> &OrderGroups<FieldCallback> {
        &self.serializable_fields
    }

    /// Validators for non-serializable fields
    #[must_use]
    pub fn non_serializable_fields(&self) -> &OrderGroups<FieldCallback> {
        &self.non_serializable_fields
    }

    /// Validators for properties
    #[must_use]
    pub fn properties(&self) -> &OrderGroups<PropertyCallback> {
        &self.properties
    }

    /// Validators for methods
    #[must_use]
    pub fn methods(&self) -> &OrderGroups<MethodCallback> {
        &self.methods
    }

    /// Validators without symbol
    #[must_use]
    pub fn once(&self) -> &OrderGroups<OnceCallback> {
        &self.once
    }

    /// Appends every bucket of `other` after ours. Used by the merger, in partition order.
    pub(crate) fn append(&mut self, other: Registry) {
        self.enum_types.append(other.enum_types);
        self.object_types.append(other.object_types);
        self.members.append(other.members);
        self.serializable_fields.append(other.serializable_fields);
        self.non_serializable_fields
            .append(other.non_serializable_fields);
        self.properties.append(other.properties);
        self.methods.append(other.methods);
        self.once.append(other.once);
        self.registrations += other.registrations;
    }
}
