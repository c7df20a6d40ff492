//! Dependency and conflict resolution for merge requests.
//! Decides admissibility of a base × modules combination before any text
//! is generated. All rule violations are collected across every phase so
//! the caller sees the complete diagnostic picture in one pass.

use crate::constants::{SEMANTIC_CONFLICTS, SIZE_CEILING};
use crate::error::Result;
use crate::loader::Catalog;
use crate::model::{BaseTemplate, InjectionMode, MergeRequest, Module};
use crate::slots;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use semver::Version;
use serde_json::Value;
use thiserror::Error as ThisError;

/// A violated validation rule. Each variant names every offending source
/// so a user can fix all issues in one pass.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("module '{module}' does not support base '{base}'")]
    IncompatibleBase { module: String, base: String },

    #[error("module '{module}' is incompatible with base '{base}'")]
    ExcludedBase { module: String, base: String },

    #[error("module '{module}' is incompatible with module '{other}'")]
    ExcludedModule { module: String, other: String },

    #[error("module '{module}' requires base version {required}, but '{base}' is version {actual}")]
    VersionTooLow { module: String, base: String, required: String, actual: String },

    #[error("missing dependency: module '{module}' requires '{requirement}', which cannot be satisfied")]
    MissingDependency { module: String, requirement: String },

    #[error("module '{module}' targets slot '{slot}', which base '{base}' does not declare")]
    MissingSlot { module: String, slot: String, base: String },

    #[error("module '{module}' requires type parameter '{param}' to be {expected}, but it is {actual}")]
    TypeMismatch { module: String, param: String, expected: String, actual: String },

    #[error("unknown type parameter '{param}' for base '{base}'")]
    UnknownTypeParam { param: String, base: String },

    #[error("name collision: '{symbol}' is defined by both {first} and {second}")]
    NameCollision { symbol: String, first: String, second: String },

    #[error("exclusivity conflict: '{first}' and '{second}' are both exclusive in category '{category}'")]
    ExclusiveConflict { category: String, first: String, second: String },

    #[error("semantic conflict: '{first}' ({first_tag}) cannot be combined with '{second}' ({second_tag})")]
    SemanticConflict { first: String, first_tag: String, second: String, second_tag: String },

    #[error("conflicting replace: '{first}' and '{second}' both replace slot '{slot}'")]
    ConflictingReplace { slot: String, first: String, second: String },
}

/// An advisory notice that does not block merging.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    #[error("module '{module}' was added automatically to satisfy '{required_by}'")]
    AutoAdded { module: String, required_by: String },

    #[error("estimated contract size {estimated} bytes exceeds the {ceiling} byte ceiling")]
    SizeCeiling { estimated: u64, ceiling: u64 },

    #[error("module '{module}' declares an unparseable version requirement '{requirement}'")]
    BadVersionRequirement { module: String, requirement: String },
}

/// Aggregated outcome of all validation phases.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<Violation>,
    pub warnings: Vec<Advisory>,
}

impl ValidationReport {
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A validated merge request: the base, the fully-expanded module
/// selection in order, the resolved type parameters, and the report.
#[derive(Debug)]
pub struct Resolution<'a> {
    pub base: &'a BaseTemplate,
    pub modules: Vec<&'a Module>,
    pub params: IndexMap<String, Value>,
    pub report: ValidationReport,
}

/// Multi-phase admissibility checker for merge requests.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    semantic_conflicts: Vec<(String, String)>,
    size_ceiling: u64,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let semantic_conflicts = SEMANTIC_CONFLICTS
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        Self { catalog, semantic_conflicts, size_ceiling: SIZE_CEILING }
    }

    /// Replaces the known-incompatible-tag-pairs table.
    pub fn with_semantic_conflicts(mut self, pairs: Vec<(String, String)>) -> Self {
        self.semantic_conflicts = pairs;
        self
    }

    /// Replaces the advisory size ceiling.
    pub fn with_size_ceiling(mut self, ceiling: u64) -> Self {
        self.size_ceiling = ceiling;
        self
    }

    /// Resolves a merge request into a validated selection.
    ///
    /// The requested base and every directly requested module must exist;
    /// a missing one aborts immediately with `NotFound`. Everything else
    /// is collected into the report: the dependency closure is expanded
    /// first, then every phase runs against the fixed point, so a
    /// violation introduced by an auto-added dependency is still caught.
    ///
    /// # Errors
    /// * `Error::BaseNotFound` / `Error::ModuleNotFound` for unknown
    ///   requested identifiers
    pub fn resolve(&self, request: &MergeRequest) -> Result<Resolution<'a>> {
        let base = self.catalog.base(&request.base)?;

        let mut selected: Vec<&Module> = Vec::new();
        let mut ids: IndexSet<String> = IndexSet::new();
        for id in &request.modules {
            let module = self.catalog.module(id)?;
            if ids.insert(module.id.clone()) {
                selected.push(module);
            } else {
                debug!("Module '{}' requested more than once", id);
            }
        }

        let mut report = ValidationReport::default();

        self.expand_dependencies(&mut selected, &mut ids, &mut report);

        let params = slots::resolve_params(base, &request.param_overrides);

        self.check_base(base, &request.param_overrides, &mut report);
        self.check_module_compat(base, &selected, &mut report);
        self.check_slots(base, &selected, &mut report);
        self.check_types(&selected, &params, &mut report);
        self.check_collisions(base, &selected, &mut report);
        self.check_exclusivity(&selected, &mut report);
        self.check_size(&selected, &mut report);
        self.check_semantics(&selected, &mut report);

        debug!(
            "Resolved '{}' with {} module(s): {} error(s), {} warning(s)",
            base.name,
            selected.len(),
            report.errors.len(),
            report.warnings.len()
        );

        Ok(Resolution { base, modules: selected, params, report })
    }

    /// Phase 3, run first: expands `requires` edges to a fixed point.
    /// Resolvable dependencies are auto-added with a warning; unresolvable
    /// ones are errors. Cycles terminate because every module is added at
    /// most once.
    fn expand_dependencies(
        &self,
        selected: &mut Vec<&'a Module>,
        ids: &mut IndexSet<String>,
        report: &mut ValidationReport,
    ) {
        let mut i = 0;
        while i < selected.len() {
            let module = selected[i];
            for requirement in &module.requires {
                if ids.contains(requirement) {
                    continue;
                }
                match self.catalog.modules.get(requirement) {
                    Some(dependency) => {
                        debug!(
                            "Auto-adding '{}' required by '{}'",
                            dependency.id, module.id
                        );
                        ids.insert(dependency.id.clone());
                        selected.push(dependency);
                        report.warnings.push(Advisory::AutoAdded {
                            module: dependency.id.clone(),
                            required_by: module.id.clone(),
                        });
                    }
                    None => report.errors.push(Violation::MissingDependency {
                        module: module.id.clone(),
                        requirement: requirement.clone(),
                    }),
                }
            }
            i += 1;
        }
    }

    /// Phase 1: explicit parameter overrides must name declared type
    /// parameters of the base.
    fn check_base(
        &self,
        base: &BaseTemplate,
        overrides: &IndexMap<String, Value>,
        report: &mut ValidationReport,
    ) {
        for param in overrides.keys() {
            if !base.type_params.contains_key(param) {
                report.errors.push(Violation::UnknownTypeParam {
                    param: param.clone(),
                    base: base.name.clone(),
                });
            }
        }
    }

    /// Phase 2: allow-list, deny-list, and minimum-version checks for
    /// every selected module against the base and against each other.
    fn check_module_compat(
        &self,
        base: &BaseTemplate,
        selected: &[&Module],
        report: &mut ValidationReport,
    ) {
        for module in selected {
            if !module.compatible_with.is_empty()
                && !module.compatible_with.contains(&base.name)
            {
                report.errors.push(Violation::IncompatibleBase {
                    module: module.id.clone(),
                    base: base.name.clone(),
                });
            }
            if module.incompatible_with.contains(&base.name) {
                report.errors.push(Violation::ExcludedBase {
                    module: module.id.clone(),
                    base: base.name.clone(),
                });
            }
            for other in selected {
                if other.id == module.id {
                    continue;
                }
                let excluded = module
                    .incompatible_with
                    .iter()
                    .any(|entry| entry == &other.id || entry == other.category());
                if excluded {
                    report.errors.push(Violation::ExcludedModule {
                        module: module.id.clone(),
                        other: other.id.clone(),
                    });
                }
            }
            if let Some(requirement) = &module.requires_version {
                match Version::parse(requirement) {
                    Ok(required) => {
                        let actual = Version::parse(&base.version)
                            .unwrap_or_else(|_| Version::new(0, 0, 0));
                        if actual < required {
                            report.errors.push(Violation::VersionTooLow {
                                module: module.id.clone(),
                                base: base.name.clone(),
                                required: requirement.clone(),
                                actual: base.version.clone(),
                            });
                        }
                    }
                    Err(_) => report.warnings.push(Advisory::BadVersionRequirement {
                        module: module.id.clone(),
                        requirement: requirement.clone(),
                    }),
                }
            }
        }
    }

    /// Phase 4: every slot a module references, whether via
    /// `requiresSlots` or as an injection target, must be declared by the
    /// base. Also rejects two modules replacing the same slot, which
    /// would otherwise silently discard one of them.
    fn check_slots(
        &self,
        base: &BaseTemplate,
        selected: &[&Module],
        report: &mut ValidationReport,
    ) {
        for module in selected {
            let mut referenced: IndexSet<&String> = IndexSet::new();
            referenced.extend(&module.requires_slots);
            referenced.extend(module.injections.keys());
            for slot in referenced {
                if !base.slots.contains(slot) {
                    report.errors.push(Violation::MissingSlot {
                        module: module.id.clone(),
                        slot: slot.clone(),
                        base: base.name.clone(),
                    });
                }
            }
        }

        let mut replacers: IndexMap<String, String> = IndexMap::new();
        for module in selected {
            for (slot, injection) in &module.injections {
                if injection.mode != InjectionMode::Replace {
                    continue;
                }
                match replacers.get(slot) {
                    Some(first) => report.errors.push(Violation::ConflictingReplace {
                        slot: slot.clone(),
                        first: first.clone(),
                        second: module.id.clone(),
                    }),
                    None => {
                        replacers.insert(slot.clone(), module.id.clone());
                    }
                }
            }
        }
    }

    /// Phase 5: `requiresTypes` constraints against the resolved
    /// parameters. A scalar constraint must match exactly; an array
    /// constraint is satisfied by any of its members.
    fn check_types(
        &self,
        selected: &[&Module],
        params: &IndexMap<String, Value>,
        report: &mut ValidationReport,
    ) {
        for module in selected {
            for (param, constraint) in &module.requires_types {
                let actual = params.get(param);
                let satisfied = match (constraint.as_array(), actual) {
                    (Some(allowed), Some(value)) => allowed.contains(value),
                    (None, Some(value)) => value == constraint,
                    (_, None) => false,
                };
                if !satisfied {
                    report.errors.push(Violation::TypeMismatch {
                        module: module.id.clone(),
                        param: param.clone(),
                        expected: constraint.to_string(),
                        actual: actual
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| "unset".to_string()),
                    });
                }
            }
        }
    }

    /// Phase 6: the union of base `exposes` and all module `provides`
    /// must be collision-free.
    fn check_collisions(
        &self,
        base: &BaseTemplate,
        selected: &[&Module],
        report: &mut ValidationReport,
    ) {
        let mut seen: IndexMap<String, String> = IndexMap::new();
        for symbol in base.exposes.symbols() {
            seen.entry(symbol.clone()).or_insert_with(|| format!("base '{}'", base.name));
        }
        for module in selected {
            for symbol in module.provides.symbols() {
                let source = format!("module '{}'", module.id);
                match seen.get(symbol) {
                    Some(first) => report.errors.push(Violation::NameCollision {
                        symbol: symbol.clone(),
                        first: first.clone(),
                        second: source,
                    }),
                    None => {
                        seen.insert(symbol.clone(), source);
                    }
                }
            }
        }
    }

    /// Phase 7: at most one exclusive module per category.
    fn check_exclusivity(&self, selected: &[&Module], report: &mut ValidationReport) {
        let mut exclusive: IndexMap<&str, &str> = IndexMap::new();
        for module in selected {
            if !module.exclusive {
                continue;
            }
            match exclusive.get(module.category()) {
                Some(first) => report.errors.push(Violation::ExclusiveConflict {
                    category: module.category().to_string(),
                    first: first.to_string(),
                    second: module.id.clone(),
                }),
                None => {
                    exclusive.insert(module.category(), module.id.as_str());
                }
            }
        }
    }

    /// Phase 8: advisory only. Size hints are non-authoritative, so an
    /// excessive sum never blocks the merge.
    fn check_size(&self, selected: &[&Module], report: &mut ValidationReport) {
        let estimated: u64 = selected.iter().map(|m| m.estimated_size).sum();
        if estimated > self.size_ceiling {
            report.warnings.push(Advisory::SizeCeiling {
                estimated,
                ceiling: self.size_ceiling,
            });
        }
    }

    /// Phase 9: pairwise semantic-tag check against the
    /// known-incompatible-pairs table.
    fn check_semantics(&self, selected: &[&Module], report: &mut ValidationReport) {
        for (i, first) in selected.iter().enumerate() {
            for second in &selected[i + 1..] {
                for tag_a in &first.semantics {
                    for tag_b in &second.semantics {
                        let conflicting = self.semantic_conflicts.iter().any(|(x, y)| {
                            (x == tag_a && y == tag_b) || (x == tag_b && y == tag_a)
                        });
                        if conflicting {
                            report.errors.push(Violation::SemanticConflict {
                                first: first.id.clone(),
                                first_tag: tag_a.clone(),
                                second: second.id.clone(),
                                second_tag: tag_b.clone(),
                            });
                        }
                    }
                }
            }
        }
    }
}
