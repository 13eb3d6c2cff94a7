//! Fixtures shared by the unit tests of this crate.

use std::sync::{Arc, Weak};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    catalog::{FieldSymbol, MemberInfo, MemberSymbol, SkipSet, Symbol, TypeSymbol, TypeSymbolRc},
    diagnostics::DiagnosticLog,
    pipeline::{CancellationToken, NoopObserver, PipelineConfig, PipelineContext},
    registry::{FieldFilter, TypeFilter, Validator},
};

/// A field to put on a fixture type
pub struct FieldSpec {
    pub name: &'static str,
    pub serializable: bool,
}

// Helper function to describe a field of a fixture type
pub fn field(name: &'static str, serializable: bool) -> FieldSpec {
    FieldSpec { name, serializable }
}

// Helper function to create a non-enum TypeSymbol with fields and no annotations
pub fn object_type(unit: &str, namespace: &str, name: &str, fields: &[FieldSpec]) -> TypeSymbolRc {
    let unit: Arc<str> = Arc::from(unit);
    let declaring_name: Arc<str> = Arc::from(crate::corpus::full_name(namespace, name).as_str());

    Arc::new_cyclic(|declaring_type: &Weak<TypeSymbol>| TypeSymbol {
        unit: unit.clone(),
        namespace: namespace.to_string(),
        name: name.to_string(),
        is_enum_like: false,
        annotations: Vec::new(),
        skip: SkipSet::default(),
        members: fields
            .iter()
            .map(|spec| {
                MemberSymbol::Field(Arc::new(FieldSymbol {
                    info: MemberInfo {
                        unit: unit.clone(),
                        declaring_name: declaring_name.clone(),
                        declaring_type: declaring_type.clone(),
                        name: spec.name.to_string(),
                        annotations: Vec::new(),
                        skip: SkipSet::default(),
                    },
                    type_name: "int".to_string(),
                    is_host_serializable: spec.serializable,
                }))
            })
            .collect(),
    })
}

/// Everything a pipeline phase needs to run outside of `Pipeline::run`
pub struct TestRun {
    pub config: PipelineConfig,
    pub log: DiagnosticLog,
    pub token: CancellationToken,
    observer: NoopObserver,
    thread_pool: ThreadPool,
}

impl TestRun {
    pub fn new() -> Self {
        TestRun {
            config: PipelineConfig::everything(),
            log: DiagnosticLog::new(),
            token: CancellationToken::new(),
            observer: NoopObserver,
            thread_pool: ThreadPoolBuilder::new().num_threads(4).build().unwrap(),
        }
    }

    pub fn context(&self) -> PipelineContext<'_> {
        PipelineContext::new(
            &self.config,
            &self.log,
            &self.token,
            &self.observer,
            &self.thread_pool,
        )
    }

    pub fn into_log(self) -> DiagnosticLog {
        self.log
    }
}

/// Records which validator saw which symbol, in call order
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<boxcar::Vec<(String, String)>>,
}

impl Recorder {
    fn record(&self, label: &str, symbol: String) {
        self.calls.push((label.to_string(), symbol));
    }

    // Helper function to create a type validator recording its calls under `label`
    pub fn type_validator(&self, filter: TypeFilter, label: &'static str) -> Validator {
        let recorder = self.clone();
        Validator::each_type(filter, move |symbol, _| {
            recorder.record(label, symbol.display_name());
            Ok(())
        })
    }

    // Helper function to create a field validator recording its calls under `label`
    pub fn field_validator(&self, filter: FieldFilter, label: &'static str) -> Validator {
        let recorder = self.clone();
        Validator::each_field(filter, move |symbol, _| {
            recorder.record(label, symbol.display_name());
            Ok(())
        })
    }

    // Helper function to create a once validator recording its calls under `label`
    pub fn once_validator(&self, label: &'static str) -> Validator {
        let recorder = self.clone();
        Validator::once(move |_| {
            recorder.record(label, String::new());
            Ok(())
        })
    }

    /// How often validator `label` was called with `symbol`
    pub fn count(&self, label: &str, symbol: &str) -> usize {
        self.calls
            .iter()
            .filter(|(_, (seen_label, seen_symbol))| seen_label == label && seen_symbol == symbol)
            .count()
    }

    /// Labels of all calls, in call order
    pub fn sequence(&self) -> Vec<String> {
        self.calls
            .iter()
            .map(|(_, (label, _))| label.clone())
            .collect()
    }
}
