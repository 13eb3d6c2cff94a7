//! Integration tests for full pipeline runs.
//!
//! These tests drive [`Pipeline::run`] end to end over in-memory corpora and check the
//! guarantees a host relies on:
//! - Catalog membership does not depend on how the corpus is split into units
//! - `DoNotInspect` and `Exclude` keep symbols away from validators
//! - Order keys are strict phases, and same-order registrations accumulate
//! - Failing validators are isolated, and cancellation truncates cleanly

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::{DashMap, DashSet};
use symcheck::prelude::*;

/// Records (validator, symbol) pairs from any worker thread
type Seen = Arc<DashSet<(String, String)>>;

/// Factory method for a validator of every symbol category, all at `order` and declared by
/// `kind`, recording what they see into `seen`.
fn register_everywhere(pipeline: &mut Pipeline, kind: &str, order: i32, seen: &Seen) {
    let validators = [
        {
            let seen = seen.clone();
            Validator::each_type(TypeFilter::EnumLike, move |symbol, _| {
                seen.insert(("enum".to_string(), symbol.display_name()));
                Ok(())
            })
        },
        {
            let seen = seen.clone();
            Validator::each_type(TypeFilter::NonEnumLike, move |symbol, _| {
                seen.insert(("object".to_string(), symbol.display_name()));
                Ok(())
            })
        },
        {
            let seen = seen.clone();
            Validator::each_member(move |symbol, _| {
                seen.insert(("member".to_string(), symbol.display_name()));
                Ok(())
            })
        },
        {
            let seen = seen.clone();
            Validator::each_field(FieldFilter::Serializable, move |symbol, _| {
                seen.insert(("serializable".to_string(), symbol.display_name()));
                Ok(())
            })
        },
        {
            let seen = seen.clone();
            Validator::each_field(FieldFilter::NonSerializable, move |symbol, _| {
                seen.insert(("non-serializable".to_string(), symbol.display_name()));
                Ok(())
            })
        },
        {
            let seen = seen.clone();
            Validator::each_property(move |symbol, _| {
                seen.insert(("property".to_string(), symbol.display_name()));
                Ok(())
            })
        },
        {
            let seen = seen.clone();
            Validator::each_method(move |symbol, _| {
                seen.insert(("method".to_string(), symbol.display_name()));
                Ok(())
            })
        },
    ];

    for (index, validator) in validators.into_iter().enumerate() {
        pipeline.register(
            Registration::new(kind, &format!("{kind}#{index}"), validator).at_order(order),
        );
    }
}

/// Factory method for a gameplay type with one member of every variant
fn gameplay_type(namespace: &str, name: &str) -> TypeDefinition {
    TypeDefinition::class(namespace, name)
        .with_field(FieldDefinition::new("health", "float").serializable(true))
        .with_field(FieldDefinition::new("target", "Transform"))
        .with_property(PropertyDefinition::new("IsAlive", "bool").read_only())
        .with_method(MethodDefinition::new("Update"))
}

fn run(pipeline: &Pipeline, units: &[Arc<dyn CompilationUnit>]) -> (RunReport, DiagnosticLog) {
    let log = DiagnosticLog::new();
    let report = pipeline
        .run(units, &log, &CancellationToken::new())
        .expect("pipeline run");
    (report, log)
}

#[test]
fn memberships_do_not_depend_on_partitioning() {
    let definitions: Vec<TypeDefinition> = (0..12)
        .map(|index| {
            if index % 4 == 0 {
                TypeDefinition::enumeration("Game", &format!("Kind{index}"))
            } else {
                gameplay_type("Game", &format!("Actor{index}"))
            }
        })
        .collect();

    let single = vec![definitions
        .iter()
        .cloned()
        .fold(Module::new("All"), Module::with_type)
        .into_unit()];
    let split: Vec<Arc<dyn CompilationUnit>> = definitions
        .chunks(3)
        .enumerate()
        .map(|(index, chunk)| {
            chunk
                .iter()
                .cloned()
                .fold(Module::new(&format!("Part{index}")), Module::with_type)
                .into_unit()
        })
        .collect();

    let mut memberships = Vec::new();
    for units in [single, split] {
        let seen: Seen = Arc::default();
        let mut pipeline = Pipeline::new(PipelineConfig::everything().with_threads(4));
        register_everywhere(&mut pipeline, "Everything", 0, &seen);

        let (report, _) = run(&pipeline, &units);
        assert_eq!(report.catalog.enum_types, 3);
        assert_eq!(report.catalog.object_types, 9);

        let mut pairs: Vec<(String, String)> =
            seen.iter().map(|entry| entry.key().clone()).collect();
        pairs.sort();
        memberships.push(pairs);
    }

    assert_eq!(memberships[0].len(), 3 + 9 + 9 * 4 + 9 + 9 + 9 + 9);
    assert_eq!(memberships[0], memberships[1]);
}

#[test]
fn do_not_inspect_symbols_are_invisible() {
    let units = vec![
        Module::new("Vendor")
            .annotated(Annotation::DoNotInspect)
            .with_type(gameplay_type("Vendor", "Tool"))
            .into_unit(),
        Module::new("Game")
            .with_type(gameplay_type("Game", "Hidden").annotated(Annotation::DoNotInspect))
            .with_type(
                gameplay_type("Game", "Player")
                    .with_field(
                        FieldDefinition::new("secret", "int").annotated(Annotation::DoNotInspect),
                    )
                    .with_method(
                        MethodDefinition::new("Cheat").annotated(Annotation::DoNotInspect),
                    ),
            )
            .into_unit(),
    ];

    let seen: Seen = Arc::default();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    register_everywhere(&mut pipeline, "Everything", 0, &seen);
    let (report, _) = run(&pipeline, &units);

    assert_eq!(report.units_skipped, 1);
    for entry in seen.iter() {
        let (_, symbol) = entry.key();
        assert!(!symbol.starts_with("Vendor."), "saw {symbol}");
        assert!(!symbol.starts_with("Game.Hidden"), "saw {symbol}");
        assert!(!symbol.ends_with("::secret"), "saw {symbol}");
        assert!(!symbol.ends_with("::Cheat"), "saw {symbol}");
    }
    assert!(seen.contains(&("object".to_string(), "Game.Player".to_string())));
}

#[test]
fn exclusion_applies_per_kind() {
    let units = vec![Module::new("Game")
        .with_type(
            gameplay_type("Game", "Player")
                .annotated(Annotation::exclude(["Rules.Naming"]))
                .with_field(
                    FieldDefinition::new("ammo", "int")
                        .serializable(true)
                        .annotated(Annotation::exclude(["Rules.Range"])),
                ),
        )
        .into_unit()];

    let naming: Seen = Arc::default();
    let range: Seen = Arc::default();
    let other: Seen = Arc::default();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    register_everywhere(&mut pipeline, "Rules.Naming", 0, &naming);
    register_everywhere(&mut pipeline, "Rules.Range", 0, &range);
    register_everywhere(&mut pipeline, "Rules.Other", 0, &other);

    let (report, _) = run(&pipeline, &units);

    // the type exclusion covers the type and every member
    assert!(naming.is_empty());
    assert!(!range.contains(&("serializable".to_string(), "Game.Player::ammo".to_string())));
    assert!(range.contains(&("serializable".to_string(), "Game.Player::health".to_string())));
    assert!(other.contains(&("serializable".to_string(), "Game.Player::ammo".to_string())));
    assert!(report.skipped > 0);
}

#[test]
fn order_keys_are_strict_phases() {
    let clock = Arc::new(AtomicUsize::new(0));
    let finished: Arc<DashMap<i32, usize>> = Arc::default();
    let started: Arc<DashMap<i32, usize>> = Arc::default();

    let mut pipeline = Pipeline::new(PipelineConfig::everything().with_threads(4));
    for order in [3, -1, 0] {
        let (clock_a, finished_a, started_a) = (clock.clone(), finished.clone(), started.clone());
        pipeline.register(
            Registration::new(
                "Stages",
                &format!("fields@{order}"),
                Validator::each_field(FieldFilter::Either, move |_, _| {
                    let now = clock_a.fetch_add(1, Ordering::SeqCst);
                    started_a.entry(order).and_modify(|t| *t = (*t).min(now)).or_insert(now);
                    let end = clock_a.fetch_add(1, Ordering::SeqCst);
                    finished_a.entry(order).and_modify(|t| *t = (*t).max(end)).or_insert(end);
                    Ok(())
                }),
            )
            .at_order(order),
        );
        let (clock_b, finished_b, started_b) = (clock.clone(), finished.clone(), started.clone());
        pipeline.register(
            Registration::new(
                "Stages",
                &format!("types@{order}"),
                Validator::each_type(TypeFilter::Either, move |_, _| {
                    let now = clock_b.fetch_add(1, Ordering::SeqCst);
                    started_b.entry(order).and_modify(|t| *t = (*t).min(now)).or_insert(now);
                    let end = clock_b.fetch_add(1, Ordering::SeqCst);
                    finished_b.entry(order).and_modify(|t| *t = (*t).max(end)).or_insert(end);
                    Ok(())
                }),
            )
            .at_order(order),
        );
    }

    let units: Vec<Arc<dyn CompilationUnit>> = (0..4)
        .map(|index| {
            Module::new(&format!("Unit{index}"))
                .with_type(gameplay_type("Game", &format!("Actor{index}")))
                .with_type(TypeDefinition::enumeration("Game", &format!("Kind{index}")))
                .into_unit()
        })
        .collect();

    let (report, _) = run(&pipeline, &units);
    assert_eq!(report.orders, vec![-1, 0, 3]);

    for (earlier, later) in [(-1, 0), (0, 3)] {
        let done = *finished.get(&earlier).expect("earlier key ran");
        let begun = *started.get(&later).expect("later key ran");
        assert!(done < begun, "key {earlier} ended at {done}, key {later} began at {begun}");
    }
}

#[test]
fn staged_validators_share_an_index() {
    // order 0 builds an index that order 1 relies on being complete
    let index: Arc<DashMap<String, usize>> = Arc::default();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());

    let writer = index.clone();
    pipeline.register(Registration::new(
        "Game.Required",
        "index-fields",
        Validator::each_field(FieldFilter::Serializable, move |field, _| {
            *writer.entry(field.declaring_name.to_string()).or_insert(0) += 1;
            Ok(())
        }),
    ));

    let reader = index.clone();
    pipeline.register(
        Registration::new(
            "Game.Required",
            "require-saved-state",
            Validator::each_type(TypeFilter::NonEnumLike, move |symbol, reporter| {
                if !reader.contains_key(&symbol.full_name()) {
                    reporter.violation(symbol.clone(), "nothing on this type is saved");
                }
                Ok(())
            }),
        )
        .at_order(1),
    );

    let units = vec![Module::new("Game")
        .with_type(gameplay_type("Game", "Player"))
        .with_type(
            TypeDefinition::class("Game", "Cache")
                .with_field(FieldDefinition::new("map", "Dictionary")),
        )
        .into_unit()];

    let (_, log) = run(&pipeline, &units);

    let violations = log.of_kind(DiagnosticKind::Violation);
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0].symbol.as_ref().map(ToString::to_string).as_deref(),
        Some("type Game.Cache")
    );
}

#[test]
fn same_order_registrations_are_additive() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = |calls: &Arc<AtomicUsize>| {
        let calls = calls.clone();
        move |_: &PropertySymbolRc, _: &Reporter<'_>| -> Result<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    };

    let discovered = calls.clone();
    let units = vec![Module::new("Game")
        .with_type(gameplay_type("Game", "Player"))
        .with_type(
            TypeDefinition::class("Rules", "Properties")
                .with_method(
                    MethodDefinition::validator(
                        "Check",
                        Routine::on_property(move |_, _| {
                            discovered.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }),
                    )
                    .annotated(Annotation::OnEachProperty { order: 0 }),
                ),
        )
        .into_unit()];

    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    pipeline
        .register(Registration::new("A", "first", Validator::each_property(counter(&calls))))
        .register(Registration::new("B", "second", Validator::each_property(counter(&calls))));

    let (report, _) = run(&pipeline, &units);

    assert_eq!(report.registrations, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn failing_validators_are_isolated() {
    let units = vec![Module::new("Game")
        .with_type(gameplay_type("Game", "Alpha"))
        .with_type(gameplay_type("Game", "Beta"))
        .into_unit()];

    let seen: Seen = Arc::default();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    let recorder = seen.clone();
    pipeline.register(Registration::new(
        "Rules",
        "picky",
        Validator::each_type(TypeFilter::NonEnumLike, move |symbol, _| {
            if symbol.name == "Alpha" {
                return Err(Error::Validator("Alpha is not allowed".to_string()));
            }
            recorder.insert(("picky".to_string(), symbol.display_name()));
            Ok(())
        }),
    ));
    let sibling = seen.clone();
    pipeline.register(Registration::new(
        "Rules",
        "sibling",
        Validator::each_method(move |symbol, _| {
            sibling.insert(("sibling".to_string(), symbol.display_name()));
            Ok(())
        }),
    ));

    let (report, log) = run(&pipeline, &units);

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.failures, 1);
    assert!(seen.contains(&("picky".to_string(), "Game.Beta".to_string())));
    assert!(seen.contains(&("sibling".to_string(), "Game.Alpha::Update".to_string())));

    let failures = log.of_kind(DiagnosticKind::ValidatorFailure);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].message, "Alpha is not allowed");
    assert_eq!(failures[0].source.as_deref(), Some("picky"));
}

#[test]
fn scenario_excluded_unit_is_not_catalogued() {
    let unit = |name: &str, types: usize| {
        (0..types)
            .fold(Module::new(name), |module, index| {
                module.with_type(TypeDefinition::class(name, &format!("Type{index}")))
            })
    };
    let units = vec![
        unit("Unit1", 5).into_unit(),
        unit("Unit2", 4).annotated(Annotation::DoNotInspect).into_unit(),
        unit("Unit3", 2).into_unit(),
    ];

    let units_seen: Arc<DashSet<String>> = Arc::default();
    let recorder = units_seen.clone();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    pipeline.register(Registration::new(
        "Audit",
        "units",
        Validator::each_type(TypeFilter::NonEnumLike, move |symbol, _| {
            recorder.insert(symbol.unit().to_string());
            Ok(())
        }),
    ));

    let (report, _) = run(&pipeline, &units);

    assert_eq!(report.catalog.object_types, 7);
    assert_eq!(report.invocations, 7);
    assert!(!units_seen.contains("Unit2"));
    assert_eq!(units_seen.len(), 2);
}

#[test]
fn scenario_serializable_and_either_field_validators() {
    let units = vec![Module::new("Game")
        .with_type(
            TypeDefinition::class("Game", "Player")
                .with_field(FieldDefinition::new("F", "int").serializable(true)),
        )
        .into_unit()];

    let calls: Arc<DashMap<&'static str, usize>> = Arc::default();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    for (label, filter) in [
        ("serializable", FieldFilter::Serializable),
        ("either", FieldFilter::Either),
    ] {
        let calls = calls.clone();
        pipeline.register(Registration::new(
            "Fields",
            label,
            Validator::each_field(filter, move |field, _| {
                assert_eq!(field.name, "F");
                *calls.entry(label).or_insert(0) += 1;
                Ok(())
            }),
        ));
    }

    let (report, _) = run(&pipeline, &units);

    assert_eq!(report.invocations, 2);
    assert_eq!(calls.get("serializable").map(|count| *count), Some(1));
    assert_eq!(calls.get("either").map(|count| *count), Some(1));
}

#[test]
fn scenario_cancellation_during_second_key() {
    let units = vec![(0..20)
        .fold(Module::new("Game"), |module, index| {
            module.with_type(TypeDefinition::class("Game", &format!("Type{index}")))
        })
        .into_unit()];

    let token = CancellationToken::new();
    let mut pipeline = Pipeline::new(PipelineConfig::everything());
    for order in 0..3 {
        let token = token.clone();
        pipeline.register(
            Registration::new(
                "Stages",
                &format!("stage{order}"),
                Validator::each_type(TypeFilter::NonEnumLike, move |symbol, reporter| {
                    reporter.violation(symbol.clone(), format!("stage {order}"));
                    if order == 1 {
                        token.cancel();
                    }
                    Ok(())
                }),
            )
            .at_order(order),
        );
    }

    let log = DiagnosticLog::new();
    let report = pipeline.run(&units, &log, &token).expect("cancelled runs still report");

    let messages = log.messages();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.orders, vec![0, 1]);
    assert_eq!(messages.iter().filter(|m| *m == "stage 0").count(), 20);
    assert_eq!(messages.iter().filter(|m| *m == "stage 1").count(), 1);
    assert!(!messages.iter().any(|m| m == "stage 2"));
}

#[test]
fn discovered_registrations_with_wrong_shapes_are_reported() {
    let units = vec![Module::new("Rules")
        .with_type(
            TypeDefinition::class("Rules", "Broken")
                .with_method(
                    MethodDefinition::validator("Check", Routine::on_method(|_, _| Ok(())))
                        .annotated(Annotation::OnEachType {
                            filter: TypeFilter::Either,
                            order: 0,
                        }),
                ),
        )
        .into_unit()];

    let (report, log) = run(&Pipeline::new(PipelineConfig::everything()), &units);

    assert_eq!(report.registrations, 0);
    let invalid = log.of_kind(DiagnosticKind::InvalidRegistration);
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].source.as_deref(), Some("Rules.Broken::Check"));
    assert!(invalid[0].message.contains(Shape::Type.signature()));
}

#[test]
fn routines_on_hidden_symbols_never_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let check = |calls: &Arc<AtomicUsize>| {
        let calls = calls.clone();
        MethodDefinition::validator(
            "Check",
            Routine::on_type(move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .annotated(Annotation::OnEachType {
            filter: TypeFilter::Either,
            order: 0,
        })
    };

    let units = vec![(0..100)
        .fold(Module::new("Rules"), |module, index| {
            module.with_type(TypeDefinition::class("Game", &format!("Type{index}")))
        })
        .with_type(
            TypeDefinition::class("Rules", "HiddenType")
                .annotated(Annotation::DoNotInspect)
                .with_method(check(&calls)),
        )
        .with_type(
            TypeDefinition::class("Rules", "Visible")
                .with_method(check(&calls).annotated(Annotation::DoNotInspect)),
        )
        .into_unit()];

    let (report, _) = run(&Pipeline::new(PipelineConfig::everything()), &units);

    assert_eq!(report.registrations, 0);
    assert_eq!(report.invocations, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
