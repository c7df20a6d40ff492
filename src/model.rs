//! Shared data model for the merge engine.
//! Base templates and modules are deserialized from metadata documents at
//! the load boundary; every optional field defaults to its empty/neutral
//! value so downstream logic never deals with nullable fields.

use crate::resolver::ValidationReport;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// How a module fragment combines with existing slot content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionMode {
    /// Concatenate after existing content
    #[default]
    Append,
    /// Concatenate before existing content
    Prepend,
    /// Discard prior content for the slot and substitute this fragment
    Replace,
}

/// A single injection descriptor: content targeted at one named slot.
#[derive(Debug, Clone, Deserialize)]
pub struct Injection {
    /// Fragment text, rendered against the merge context before injection
    pub content: String,
    #[serde(default)]
    pub mode: InjectionMode,
    /// Numeric priority for deterministic sequencing among modules
    /// targeting the same slot (ascending)
    #[serde(default)]
    pub order: i64,
    /// Optional predicate over the active type parameters and selected
    /// modules; the fragment is skipped when it evaluates false
    #[serde(default)]
    pub condition: Option<String>,
}

/// Symbols a base template already defines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exposes {
    pub variables: Vec<String>,
    pub functions: Vec<String>,
    pub events: Vec<String>,
}

impl Exposes {
    /// All exposed symbol names, in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.variables.iter().chain(&self.functions).chain(&self.events)
    }
}

/// Symbols a module introduces into the merged contract.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Provides {
    pub state_variables: Vec<String>,
    pub functions: Vec<String>,
    pub modifiers: Vec<String>,
    pub events: Vec<String>,
    pub errors: Vec<String>,
}

impl Provides {
    /// All provided symbol names, in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.state_variables
            .iter()
            .chain(&self.functions)
            .chain(&self.modifiers)
            .chain(&self.events)
            .chain(&self.errors)
    }
}

/// A named, versioned contract skeleton with declared insertion points.
///
/// Immutable for the duration of a merge; the merge step only reads it
/// and produces new output text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseTemplate {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Relative output path -> raw template text. Populated by the loader
    /// from the base directory's `files/` subtree, not the metadata document.
    #[serde(skip)]
    pub files: IndexMap<String, String>,
    /// Slot names the base exposes for injection, in document order
    pub slots: Vec<String>,
    /// Placeholder name -> default scalar value, overridable at merge time
    pub type_params: IndexMap<String, Value>,
    pub exposes: Exposes,
    pub inherits: Vec<String>,
    pub imports: Vec<String>,
}

/// A named, addressable (`category/name`) feature fragment.
///
/// Read-only and shareable: many merge requests may reference the same
/// in-memory record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Module {
    /// Full identifier `category/name`, assigned by the loader
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    /// Allow-list of base names; empty means compatible with all bases
    pub compatible_with: Vec<String>,
    /// Deny-list, checked against the base name and against other selected
    /// module ids and categories
    pub incompatible_with: Vec<String>,
    /// Module identifiers that must also be present in the selection
    pub requires: Vec<String>,
    /// Slot names the target base must expose
    pub requires_slots: Vec<String>,
    /// Type-parameter constraints: scalar = must equal, array = one of
    pub requires_types: IndexMap<String, Value>,
    /// Minimum base version (semver)
    pub requires_version: Option<String>,
    /// At most one exclusive module per category may be selected
    pub exclusive: bool,
    /// Free-form tags used for semantic conflict detection
    pub semantics: Vec<String>,
    /// Slot name -> injection descriptor
    pub injections: IndexMap<String, Injection>,
    pub provides: Provides,
    /// Extra output files contributed verbatim to the generated project
    pub additional_files: IndexMap<String, String>,
    /// Optional test fragment appended to the generated test skeleton
    pub tests: Option<String>,
    pub estimated_size: u64,
    pub estimated_gas: u64,
}

impl Module {
    /// The category component of the module identifier.
    pub fn category(&self) -> &str {
        self.id.split('/').next().unwrap_or("")
    }
}

/// Ephemeral value object describing one merge invocation.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Selected base name
    pub base: String,
    /// Requested module identifiers, in selection order
    pub modules: Vec<String>,
    /// Name of the generated project
    pub project_name: String,
    /// Explicit type-parameter overrides, merged over the base defaults
    pub param_overrides: IndexMap<String, Value>,
    /// Validate and assemble without any intention to write files
    pub dry_run: bool,
}

impl MergeRequest {
    pub fn new(
        base: impl Into<String>,
        modules: Vec<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            modules,
            project_name: project_name.into(),
            param_overrides: IndexMap::new(),
            dry_run: false,
        }
    }
}

/// The outcome of a merge: generated files plus the validation report.
/// Constructed once by the merger; immutable afterward.
#[derive(Debug)]
pub struct MergeResult {
    pub success: bool,
    /// Relative output path -> final text
    pub files: IndexMap<String, String>,
    pub report: ValidationReport,
}
