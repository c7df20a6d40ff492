//! Slot injection and final text assembly.
//! Consumes a validated resolution and produces the merged project files:
//! the contract sources, module-contributed extras, a test skeleton, a
//! patched package manifest, and a README. Given a valid resolution the
//! assembly is total; all fallible work happens during validation.

use crate::error::{Error, Result};
use crate::model::{Injection, InjectionMode, MergeResult};
use crate::renderer::TemplateRenderer;
use crate::resolver::Resolution;
use crate::slots::{self, Segment};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde_json::{json, Value};

/// Assembles merged output from a validated resolution.
pub struct Merger<'a> {
    renderer: &'a dyn TemplateRenderer,
}

impl<'a> Merger<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// Produces the merged project files.
    ///
    /// Refuses to run when the resolution carries errors: the result has
    /// `success: false`, an empty file map, and the untouched report, so
    /// nothing downstream can perform partial writes.
    pub fn merge(&self, resolution: &Resolution, project_name: &str) -> Result<MergeResult> {
        if !resolution.report.valid() {
            debug!("Merge refused: {} validation error(s)", resolution.report.errors.len());
            return Ok(MergeResult {
                success: false,
                files: IndexMap::new(),
                report: resolution.report.clone(),
            });
        }

        let context = merge_context(resolution, project_name);
        let parsed = slots::parse_base(resolution.base, &resolution.params);

        let mut files = IndexMap::new();
        for (path, segments) in &parsed {
            files.insert(path.clone(), self.assemble(segments, resolution, &context)?);
        }

        for module in &resolution.modules {
            for (path, content) in &module.additional_files {
                let rendered = self.renderer.render(content, &context)?;
                files.insert(path.clone(), rendered);
            }
        }

        patch_package_json(&mut files, project_name)?;

        let contract = contract_name(&files, project_name);
        let test_file = self.generate_test_skeleton(&contract, resolution, &context)?;
        files.insert(format!("test/{}.ts", contract), test_file);
        files.insert("README.md".to_string(), generate_readme(project_name, resolution));
        files.insert(
            "fheforge.manifest.json".to_string(),
            generate_manifest(resolution, project_name)?,
        );

        Ok(MergeResult { success: true, files, report: resolution.report.clone() })
    }

    /// Walks one file's parsed segments, emitting literal text verbatim
    /// and filling each slot from the selected modules.
    fn assemble(
        &self,
        segments: &[Segment],
        resolution: &Resolution,
        context: &Value,
    ) -> Result<String> {
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot { name, indent, standalone } => {
                    let content = self.render_slot(name, resolution, context)?;
                    if content.is_empty() {
                        continue;
                    }
                    if *standalone {
                        for line in content.lines() {
                            if line.is_empty() {
                                out.push('\n');
                            } else {
                                out.push_str(indent);
                                out.push_str(line);
                                out.push('\n');
                            }
                        }
                    } else {
                        out.push_str(&content);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Collects, filters, orders, and applies every injection targeting
    /// one slot. The order is total: declared `order` ascending, then
    /// selection order, then module identifier.
    fn render_slot(
        &self,
        slot: &str,
        resolution: &Resolution,
        context: &Value,
    ) -> Result<String> {
        let mut candidates: Vec<(i64, usize, &str, &Injection)> = Vec::new();
        for (position, module) in resolution.modules.iter().enumerate() {
            if let Some(injection) = module.injections.get(slot) {
                if self.condition_holds(injection.condition.as_deref(), context)? {
                    candidates.push((injection.order, position, module.id.as_str(), injection));
                }
            }
        }
        candidates.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        let mut parts: Vec<String> = Vec::new();
        for (_, _, _, injection) in &candidates {
            let rendered = self.renderer.render(&injection.content, context)?;
            match injection.mode {
                InjectionMode::Append => parts.push(rendered),
                InjectionMode::Prepend => parts.insert(0, rendered),
                InjectionMode::Replace => {
                    parts.clear();
                    parts.push(rendered);
                }
            }
        }
        Ok(parts.join("\n"))
    }

    /// Evaluates an injection condition against the merge context.
    /// Missing or empty conditions hold, as does a rendered value that is
    /// not a JSON boolean.
    fn condition_holds(&self, condition: Option<&str>, context: &Value) -> Result<bool> {
        let condition = match condition {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Ok(true),
        };
        let rendered = self.renderer.render(condition, context)?;
        Ok(serde_json::from_str::<bool>(rendered.trim()).unwrap_or(true))
    }

    /// Generates the Hardhat test skeleton: one placeholder case per
    /// declared function of the resulting project, plus any module test
    /// fragments.
    fn generate_test_skeleton(
        &self,
        contract: &str,
        resolution: &Resolution,
        context: &Value,
    ) -> Result<String> {
        let mut functions: IndexSet<&String> = IndexSet::new();
        functions.extend(&resolution.base.exposes.functions);
        for module in &resolution.modules {
            functions.extend(&module.provides.functions);
        }

        let mut out = String::new();
        out.push_str("import { expect } from \"chai\";\n");
        out.push_str("import { ethers } from \"hardhat\";\n\n");
        out.push_str(&format!("describe(\"{}\", function () {{\n", contract));
        out.push_str("  let contract: any;\n\n");
        out.push_str("  beforeEach(async function () {\n");
        out.push_str(&format!(
            "    const factory = await ethers.getContractFactory(\"{}\");\n",
            contract
        ));
        out.push_str("    contract = await factory.deploy();\n");
        out.push_str("    await contract.waitForDeployment();\n");
        out.push_str("  });\n");
        for function in &functions {
            out.push('\n');
            out.push_str(&format!("  it(\"exposes {}\", async function () {{\n", function));
            out.push_str(&format!(
                "    // TODO: exercise {} against an encrypted fixture\n",
                function
            ));
            out.push_str(&format!(
                "    expect(typeof contract.{}).to.equal(\"function\");\n",
                function
            ));
            out.push_str("  });\n");
        }
        out.push_str("});\n");

        for module in &resolution.modules {
            if let Some(tests) = &module.tests {
                out.push('\n');
                out.push_str(&self.renderer.render(tests, context)?);
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }
}

/// Builds the rendering context shared by conditions, fragments, and
/// module test text. Type parameters appear both at the top level and
/// under `params`; the selected module identifiers under `modules`.
fn merge_context(resolution: &Resolution, project_name: &str) -> Value {
    let mut root = serde_json::Map::new();
    for (key, value) in &resolution.params {
        root.insert(key.clone(), value.clone());
    }
    let params: serde_json::Map<String, Value> =
        resolution.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    root.insert("params".to_string(), Value::Object(params));
    root.insert(
        "modules".to_string(),
        Value::Array(
            resolution.modules.iter().map(|m| Value::String(m.id.clone())).collect(),
        ),
    );
    root.insert("project".to_string(), Value::String(project_name.to_string()));
    Value::Object(root)
}

/// Sets the project name in the generated `package.json`, creating a
/// minimal manifest when the base does not carry one.
fn patch_package_json(files: &mut IndexMap<String, String>, project_name: &str) -> Result<()> {
    let package_name = project_name.to_lowercase().replace(' ', "-");
    let patched = match files.get("package.json") {
        Some(content) => {
            let mut manifest: Value = serde_json::from_str(content).map_err(|e| {
                Error::TemplateError(format!("invalid package.json template: {}", e))
            })?;
            if let Some(object) = manifest.as_object_mut() {
                object.insert("name".to_string(), Value::String(package_name));
            }
            manifest
        }
        None => json!({
            "name": package_name,
            "version": "0.1.0",
            "scripts": { "test": "hardhat test" }
        }),
    };
    let text = serde_json::to_string_pretty(&patched)
        .map_err(|e| Error::TemplateError(e.to_string()))?;
    files.insert("package.json".to_string(), text + "\n");
    Ok(())
}

/// The contract name: the stem of the first Solidity file under
/// `contracts/`, falling back to the project name.
fn contract_name(files: &IndexMap<String, String>, project_name: &str) -> String {
    files
        .keys()
        .find(|path| path.starts_with("contracts/") && path.ends_with(".sol"))
        .and_then(|path| {
            std::path::Path::new(path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| project_name.to_string())
}

/// Summarises the base and the applied modules with their provided
/// functions.
fn generate_readme(project_name: &str, resolution: &Resolution) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", project_name));
    out.push_str(&format!(
        "Generated by fheforge from the '{}' base template.\n",
        resolution.base.name
    ));
    if !resolution.base.description.is_empty() {
        out.push('\n');
        out.push_str(&resolution.base.description);
        out.push('\n');
    }
    if !resolution.modules.is_empty() {
        out.push_str("\n## Modules\n\n");
        for module in &resolution.modules {
            out.push_str(&format!("- **{}**", module.id));
            if !module.description.is_empty() {
                out.push_str(&format!(" - {}", module.description));
            }
            out.push('\n');
            if !module.provides.functions.is_empty() {
                let functions: Vec<String> = module
                    .provides
                    .functions
                    .iter()
                    .map(|f| format!("`{}`", f))
                    .collect();
                out.push_str(&format!("  - Functions: {}\n", functions.join(", ")));
            }
        }
    }
    out
}

/// Records the applied combination so a generated project is traceable
/// back to its inputs.
fn generate_manifest(resolution: &Resolution, project_name: &str) -> Result<String> {
    let manifest = json!({
        "project": project_name,
        "base": {
            "name": resolution.base.name,
            "version": resolution.base.version,
        },
        "modules": resolution
            .modules
            .iter()
            .map(|m| json!({ "id": m.id, "version": m.version }))
            .collect::<Vec<_>>(),
        "params": resolution.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<serde_json::Map<_, _>>(),
    });
    let text = serde_json::to_string_pretty(&manifest)
        .map_err(|e| Error::TemplateError(e.to_string()))?;
    Ok(text + "\n")
}
