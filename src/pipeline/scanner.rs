//! Corpus scanner
//!
//! Turns compilation units into partitions: one partial [`Catalog`] and one partial
//! [`Registry`] per unit. Units are scanned in parallel on the run's pool; a partition is
//! owned by the worker scanning it, so no state is shared while scanning.
//!
//! # Per unit
//! - A unit marked `DoNotInspect` produces an empty, skipped partition
//! - Unreadable types and members are logged and skipped
//! - Types and members marked `DoNotInspect` never reach the catalog
//! - Annotation lists that cannot be decoded fail open: the symbol is scanned with no
//!   annotations and an empty skip set
//! - Enum-like types have no scanned members
//!
//! # Validator discovery
//! Only static methods that reach the catalog are candidates, so routines on enum-like
//! types, on `DoNotInspect` types and on `DoNotInspect` methods are never registered.
//! Each registration annotation binds the routine to the callback shape its category
//! requires. A routine of the wrong shape yields an `InvalidRegistration` diagnostic and is
//! dropped. Instance methods are never registered.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Weak,
};

use rayon::prelude::*;

use crate::{
    catalog::{
        Catalog, FieldSymbol, MemberInfo, MemberSymbol, MethodSymbol, PropertySymbol, SkipSet,
        TypeSymbol,
    },
    corpus::{
        is_do_not_inspect, Annotation, AnnotationKind, CompilationUnit, MemberDefinition,
        MethodDefinition, Record, TypeDefinition,
    },
    diagnostics::{Diagnostic, DiagnosticKind},
    pipeline::PipelineContext,
    registry::{Registration, Registry, Validator},
};

/// The result of scanning one unit
pub(crate) struct ScanPartition {
    /// Name of the scanned unit
    pub unit: Arc<str>,
    /// Symbols of the unit
    pub catalog: Catalog,
    /// Validators discovered in the unit
    pub registry: Registry,
    /// The unit was marked `DoNotInspect`
    pub skipped: bool,
    /// Scanning stopped early because of cancellation
    pub cancelled: bool,
    /// Records that could not be read
    pub malformed: usize,
}

impl ScanPartition {
    fn new(unit: Arc<str>) -> Self {
        ScanPartition {
            unit,
            catalog: Catalog::default(),
            registry: Registry::default(),
            skipped: false,
            cancelled: false,
            malformed: 0,
        }
    }
}

/// Scans compilation units into partitions.
pub(crate) struct CorpusScanner<'a> {
    context: &'a PipelineContext<'a>,
}

impl<'a> CorpusScanner<'a> {
    pub fn new(context: &'a PipelineContext<'a>) -> Self {
        CorpusScanner { context }
    }

    /// Scans every unit in parallel. Partitions are returned in unit order.
    pub fn scan(&self, units: &[Arc<dyn CompilationUnit>]) -> Vec<ScanPartition> {
        let total = units.len();
        let completed = AtomicUsize::new(0);

        self.context.thread_pool().install(|| {
            units
                .par_iter()
                .map(|unit| {
                    let partition = self.scan_unit(unit.as_ref());

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.context
                        .observer()
                        .unit_scanned(&partition.unit, done, total);

                    partition
                })
                .collect()
        })
    }

    fn scan_unit(&self, unit: &dyn CompilationUnit) -> ScanPartition {
        let mut partition = ScanPartition::new(Arc::from(unit.name()));

        match unit.annotations() {
            Ok(annotations) if is_do_not_inspect(annotations) => {
                log::debug!("Skipping unit '{}' (DoNotInspect)", partition.unit);
                partition.skipped = true;
                return partition;
            }
            Ok(_) => {}
            Err(error) => {
                log::warn!(
                    "Annotations of unit '{}' could not be read, scanning it anyway - {}",
                    partition.unit,
                    error
                );
                partition.malformed += 1;
            }
        }

        for index in 0..unit.type_count() {
            if self.context.is_cancelled() {
                partition.cancelled = true;
                break;
            }

            match unit.type_at(index) {
                Ok(definition) => self.scan_type(&definition, &mut partition),
                Err(error) => {
                    log::warn!(
                        "Skipping type #{} of unit '{}' - {}",
                        index,
                        partition.unit,
                        error
                    );
                    partition.malformed += 1;
                }
            }
        }

        log::debug!(
            "Scanned unit '{}': {}, {} registrations",
            partition.unit,
            partition.catalog.statistics(),
            partition.registry.len()
        );

        partition
    }

    fn scan_type(&self, definition: &TypeDefinition, partition: &mut ScanPartition) {
        let full_name: Arc<str> = Arc::from(definition.full_name());

        let annotations = decoded(&definition.annotations, &full_name, &mut partition.malformed);
        if is_do_not_inspect(&annotations) {
            return;
        }

        let skip = SkipSet::from_annotations(&annotations);
        let unit = partition.unit.clone();
        let malformed = &mut partition.malformed;
        let mut routines = Vec::new();

        let symbol = Arc::new_cyclic(|declaring_type: &Weak<TypeSymbol>| {
            let members = if definition.is_enum_like {
                Vec::new()
            } else {
                let scope = MemberScope {
                    unit: &unit,
                    declaring_name: &full_name,
                    declaring_type,
                    type_skip: &skip,
                };
                scan_members(definition, &scope, &mut routines, malformed)
            };

            TypeSymbol {
                unit: unit.clone(),
                namespace: definition.namespace.clone(),
                name: definition.name.clone(),
                is_enum_like: definition.is_enum_like,
                annotations,
                skip: skip.clone(),
                members,
            }
        });

        partition.catalog.push_type(symbol);
        self.discover_validators(&routines, &full_name, partition);
    }

    /// Binds the registration annotations of catalogued static methods.
    fn discover_validators(
        &self,
        routines: &[(&MethodDefinition, Vec<Annotation>)],
        full_name: &Arc<str>,
        partition: &mut ScanPartition,
    ) {
        for (method, annotations) in routines {
            for (category, order) in annotations.iter().filter_map(Annotation::registration) {
                let name = routine_name(full_name, method);
                match Validator::bind(category, method.routine.as_ref(), &name) {
                    Ok(validator) => partition.registry.register(Registration {
                        order,
                        kind: AnnotationKind::new(full_name),
                        name: Arc::from(name),
                        validator,
                    }),
                    Err(error) => {
                        log::debug!("Dropping registration of '{}' - {}", name, error);
                        self.context.report(
                            Diagnostic::new(DiagnosticKind::InvalidRegistration, error.to_string())
                                .with_source(Arc::from(name)),
                        );
                    }
                }
            }
        }
    }
}

/// The declaring type a member is scanned under
struct MemberScope<'a> {
    unit: &'a Arc<str>,
    declaring_name: &'a Arc<str>,
    declaring_type: &'a Weak<TypeSymbol>,
    type_skip: &'a SkipSet,
}

/// Scans the members of a non-enum type. Static methods that reach the catalog are pushed
/// to `routines` together with their annotations, for validator discovery.
fn scan_members<'d>(
    definition: &'d TypeDefinition,
    scope: &MemberScope<'_>,
    routines: &mut Vec<(&'d MethodDefinition, Vec<Annotation>)>,
    malformed: &mut usize,
) -> Vec<MemberSymbol> {
    let mut members = Vec::with_capacity(definition.members.len());

    for (index, record) in definition.members.iter().enumerate() {
        let member = match record {
            Record::Decoded(member) => member,
            Record::Corrupt(reason) => {
                log::warn!(
                    "Skipping member #{} of '{}' - {}",
                    index,
                    scope.declaring_name,
                    reason
                );
                *malformed += 1;
                continue;
            }
        };

        let annotations = decoded(member.annotation_record(), scope.declaring_name, malformed);
        if is_do_not_inspect(&annotations) {
            continue;
        }

        if let MemberDefinition::Method(method) = member {
            if method.is_static() {
                routines.push((method, annotations.clone()));
            }
        }

        let info = MemberInfo {
            unit: scope.unit.clone(),
            declaring_name: scope.declaring_name.clone(),
            declaring_type: scope.declaring_type.clone(),
            name: member.name().to_string(),
            skip: SkipSet::from_annotations(&annotations).union(scope.type_skip),
            annotations,
        };

        members.push(match member {
            MemberDefinition::Field(field) => MemberSymbol::Field(Arc::new(FieldSymbol {
                info,
                type_name: field.type_name.clone(),
                is_host_serializable: field.is_host_serializable,
            })),
            MemberDefinition::Property(property) => {
                MemberSymbol::Property(Arc::new(PropertySymbol {
                    info,
                    type_name: property.type_name.clone(),
                    has_getter: property.has_getter,
                    has_setter: property.has_setter,
                }))
            }
            MemberDefinition::Method(method) => MemberSymbol::Method(Arc::new(MethodSymbol {
                info,
                modifiers: method.modifiers,
                return_type: method.return_type.clone(),
                parameters: method.parameters.clone(),
            })),
        });
    }

    members
}

/// Annotations of a record, or none if they cannot be decoded
fn decoded(
    record: &Record<Vec<Annotation>>,
    owner: &str,
    malformed: &mut usize,
) -> Vec<Annotation> {
    match record.resolve() {
        Ok(annotations) => annotations.clone(),
        Err(error) => {
            log::warn!(
                "Annotations in '{}' could not be read, treating them as empty - {}",
                owner,
                error
            );
            *malformed += 1;
            Vec::new()
        }
    }
}

fn routine_name(declaring_name: &str, method: &MethodDefinition) -> String {
    format!("{}::{}", declaring_name, method.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        corpus::{FieldDefinition, MethodModifiers, Module, PropertyDefinition},
        diagnostics::DiagnosticLog,
        registry::{FieldFilter, Routine, TypeFilter},
        test::TestRun,
    };

    fn scan(units: &[Arc<dyn CompilationUnit>]) -> (Vec<ScanPartition>, DiagnosticLog) {
        let run = TestRun::new();
        let partitions = CorpusScanner::new(&run.context()).scan(units);
        (partitions, run.into_log())
    }

    #[test]
    fn classifies_types_and_members() {
        let unit = Module::new("Game")
            .with_type(TypeDefinition::enumeration("Game", "Team"))
            .with_type(
                TypeDefinition::class("Game", "Player")
                    .with_field(FieldDefinition::new("health", "float").serializable(true))
                    .with_field(FieldDefinition::new("target", "Enemy"))
                    .with_property(PropertyDefinition::new("Name", "string"))
                    .with_method(MethodDefinition::new("Update")),
            )
            .into_unit();

        let (partitions, _) = scan(&[unit]);
        let statistics = partitions[0].catalog.statistics();

        assert_eq!(statistics.enum_types, 1);
        assert_eq!(statistics.object_types, 1);
        assert_eq!(statistics.members, 4);
        assert_eq!(statistics.serializable_fields, 1);
        assert_eq!(statistics.non_serializable_fields, 1);
        assert_eq!(statistics.properties, 1);
        assert_eq!(statistics.methods, 1);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let unit = Module::new("Broken")
            .with_corrupt_type("bad typedef row")
            .with_type(
                TypeDefinition::class("Game", "Player")
                    .with_corrupt_member("bad field row")
                    .with_field(
                        FieldDefinition::new("health", "float")
                            .annotated(Annotation::DoNotInspect)
                            .with_corrupt_annotations("bad blob"),
                    ),
            )
            .into_unit();

        let (partitions, log) = scan(&[unit]);
        let partition = &partitions[0];

        assert_eq!(partition.malformed, 3);
        assert_eq!(partition.catalog.statistics().object_types, 1);
        // corrupt annotations fail open, so the field is scanned
        let field = &partition.catalog.non_serializable_fields()[0];
        assert!(field.annotations.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn do_not_inspect_hides_units_types_and_members() {
        let hidden_unit = Module::new("Vendor")
            .annotated(Annotation::DoNotInspect)
            .with_type(TypeDefinition::class("Vendor", "Tool"))
            .into_unit();
        let unit = Module::new("Game")
            .with_type(TypeDefinition::class("Game", "Hidden").annotated(Annotation::DoNotInspect))
            .with_type(
                TypeDefinition::class("Game", "Visible")
                    .with_field(FieldDefinition::new("shown", "int"))
                    .with_field(
                        FieldDefinition::new("hidden", "int").annotated(Annotation::DoNotInspect),
                    ),
            )
            .into_unit();

        let (partitions, _) = scan(&[hidden_unit, unit]);

        assert!(partitions[0].skipped);
        assert!(partitions[0].catalog.is_empty());
        let catalog = &partitions[1].catalog;
        assert!(catalog.find_type("Game.Hidden").is_none());
        let names: Vec<&str> = catalog.members().iter().map(MemberSymbol::name).collect();
        assert_eq!(names, vec!["shown"]);
    }

    #[test]
    fn member_skip_sets_include_the_declaring_type() {
        let unit = Module::new("Game")
            .with_type(
                TypeDefinition::class("Game", "Player")
                    .annotated(Annotation::exclude(["Game.Range"]))
                    .with_field(
                        FieldDefinition::new("speed", "float")
                            .annotated(Annotation::exclude(["Game.Required"])),
                    ),
            )
            .into_unit();

        let (partitions, _) = scan(&[unit]);
        let field = &partitions[0].catalog.non_serializable_fields()[0];

        assert!(field.skip.contains(&AnnotationKind::new("Game.Range")));
        assert!(field.skip.contains(&AnnotationKind::new("Game.Required")));
        assert_eq!(
            field.declaring_type().map(|owner| owner.full_name()),
            Some("Game.Player".to_string())
        );
    }

    #[test]
    fn static_routines_are_registered_and_mismatches_reported() {
        let unit = Module::new("Rules")
            .with_type(
                TypeDefinition::class("Game", "RequiredRule")
                    .with_method(
                        MethodDefinition::validator("Check", Routine::on_field(|_, _| Ok(())))
                            .annotated(Annotation::OnEachField {
                                filter: FieldFilter::Either,
                                order: 2,
                            }),
                    )
                    .with_method(
                        MethodDefinition::validator("Wrong", Routine::on_type(|_, _| Ok(())))
                            .annotated(Annotation::OnEachMethod { order: 0 }),
                    )
                    .with_method(
                        MethodDefinition::new("Instance")
                            .with_routine(Routine::once(|_| Ok(())))
                            .annotated(Annotation::Once { order: 0 }),
                    )
                    .with_method(
                        MethodDefinition::new("Abstract")
                            .with_modifiers(MethodModifiers::STATIC | MethodModifiers::ABSTRACT)
                            .annotated(Annotation::Once { order: 0 }),
                    ),
            )
            .into_unit();

        let (partitions, log) = scan(&[unit]);
        let registry = &partitions[0].registry;

        assert_eq!(registry.len(), 1);
        let registered = &registry.serializable_fields().at(2)[0];
        assert_eq!(registered.kind.as_str(), "Game.RequiredRule");
        assert_eq!(&*registered.name, "Game.RequiredRule::Check");
        assert_eq!(registry.non_serializable_fields().at(2).len(), 1);

        let invalid = log.of_kind(DiagnosticKind::InvalidRegistration);
        assert_eq!(invalid.len(), 2);
        assert!(invalid[0]
            .message
            .contains("fn(&MethodSymbolRc, &Reporter) -> Result<()>"));
        assert!(invalid[1].message.contains("no body"));
        assert_eq!(partitions[0].catalog.methods().len(), 4);
    }

    #[test]
    fn hidden_routines_are_not_registered() {
        let check = || {
            MethodDefinition::validator("Check", Routine::on_type(|_, _| Ok(()))).annotated(
                Annotation::OnEachType {
                    filter: TypeFilter::Either,
                    order: 0,
                },
            )
        };
        let unit = Module::new("Rules")
            .with_type(
                TypeDefinition::class("Rules", "HiddenType")
                    .annotated(Annotation::DoNotInspect)
                    .with_method(check()),
            )
            .with_type(
                TypeDefinition::class("Rules", "Visible")
                    .with_method(check().annotated(Annotation::DoNotInspect)),
            )
            .with_type(TypeDefinition::enumeration("Rules", "Kind").with_method(check()))
            .with_type(TypeDefinition::class("Rules", "Active").with_method(check()))
            .into_unit();

        let (partitions, log) = scan(&[unit]);
        let registry = &partitions[0].registry;

        assert_eq!(registry.len(), 1);
        assert_eq!(&*registry.object_types().at(0)[0].name, "Rules.Active::Check");
        assert!(log.is_empty());
    }

    #[test]
    fn cancelled_scans_stop_early() {
        let unit = Module::new("Game")
            .with_type(TypeDefinition::class("Game", "Player"))
            .into_unit();
        let run = TestRun::new();
        run.token.cancel();

        let partitions = CorpusScanner::new(&run.context()).scan(&[unit]);

        assert!(partitions[0].cancelled);
        assert!(partitions[0].catalog.is_empty());
    }
}
