//! The merge engine facade consumed by the CLI: resolve, merge, preview.

use crate::error::{Error, Result};
use crate::loader::Catalog;
use crate::merger::Merger;
use crate::model::{MergeRequest, MergeResult};
use crate::renderer::MiniJinjaRenderer;
use crate::resolver::{Resolver, ValidationReport};

/// One merge engine over a loaded catalog. Holds no mutable state; any
/// number of requests may be served from the same instance.
pub struct Forge<'a> {
    resolver: Resolver<'a>,
    renderer: MiniJinjaRenderer,
}

impl<'a> Forge<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { resolver: Resolver::new(catalog), renderer: MiniJinjaRenderer::new() }
    }

    /// Validates and merges a request. An inadmissible combination yields
    /// `success: false` with the full report; no files are produced.
    ///
    /// # Errors
    /// * `Error::BaseNotFound` / `Error::ModuleNotFound` for unknown
    ///   requested identifiers
    pub fn merge(&self, request: &MergeRequest) -> Result<MergeResult> {
        let resolution = self.resolver.resolve(request)?;
        Merger::new(&self.renderer).merge(&resolution, &request.project_name)
    }

    /// Runs the validation phases without assembling any text.
    pub fn validate_only(&self, request: &MergeRequest) -> Result<ValidationReport> {
        Ok(self.resolver.resolve(request)?.report)
    }

    /// Renders the merged contract text without writing anything.
    ///
    /// # Errors
    /// * `Error::MergeRefused` when the combination fails validation
    pub fn preview(&self, request: &MergeRequest) -> Result<String> {
        let result = self.merge(request)?;
        if !result.success {
            return Err(Error::MergeRefused { error_count: result.report.errors.len() });
        }
        let contract = result
            .files
            .iter()
            .find(|(path, _)| path.starts_with("contracts/") && path.ends_with(".sol"));
        match contract {
            Some((_, text)) => Ok(text.clone()),
            None => Ok(result.files.values().cloned().collect::<Vec<_>>().join("\n")),
        }
    }
}
