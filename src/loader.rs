//! Template store loading for fheforge.
//! Reads base and module definitions from a template directory into
//! immutable in-memory records. The store is a value constructed per
//! invocation; there are no global caches, so repeated invocations in one
//! process cannot observe stale state.

use crate::constants::{BASES_DIR, METADATA_FILES, MODULES_DIR, SKELETON_DIR};
use crate::error::{Error, Result};
use crate::model::{BaseTemplate, Module};
use indexmap::IndexMap;
use log::debug;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All loaded bases and modules for one invocation.
#[derive(Debug, Default)]
pub struct Catalog {
    pub bases: IndexMap<String, BaseTemplate>,
    pub modules: IndexMap<String, Module>,
}

impl Catalog {
    /// Looks up a base by name.
    ///
    /// # Errors
    /// * `Error::BaseNotFound` if the name is unknown
    pub fn base(&self, name: &str) -> Result<&BaseTemplate> {
        self.bases.get(name).ok_or_else(|| Error::BaseNotFound { name: name.to_string() })
    }

    /// Looks up a module by `category/name` identifier.
    ///
    /// # Errors
    /// * `Error::ModuleNotFound` if the identifier is unknown
    pub fn module(&self, id: &str) -> Result<&Module> {
        self.modules.get(id).ok_or_else(|| Error::ModuleNotFound { id: id.to_string() })
    }
}

/// Filesystem-backed source of base and module records.
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Directory holding the shared project skeleton, if any.
    pub fn skeleton_dir(&self) -> PathBuf {
        self.root.join(SKELETON_DIR)
    }

    /// Loads a base template: its metadata document plus the template text
    /// of every file under its `files/` subtree.
    ///
    /// # Errors
    /// * `Error::BaseNotFound` if the directory or metadata document is absent
    pub fn load_base(&self, name: &str) -> Result<BaseTemplate> {
        let base_dir = self.root.join(BASES_DIR).join(name);
        if !base_dir.is_dir() {
            return Err(Error::BaseNotFound { name: name.to_string() });
        }
        let mut base: BaseTemplate = read_metadata(&base_dir)
            .ok_or_else(|| Error::BaseNotFound { name: name.to_string() })
            .and_then(|(path, content)| parse_metadata(&path, &content))?;
        base.name = name.to_string();
        base.files = read_template_files(&base_dir.join("files"))?;
        debug!("Loaded base '{}' with {} file(s)", base.name, base.files.len());
        Ok(base)
    }

    /// Loads a module by `category/name` identifier.
    ///
    /// # Errors
    /// * `Error::InvalidModuleId` if the identifier is malformed
    /// * `Error::ModuleNotFound` if the directory or metadata document is absent
    pub fn load_module(&self, id: &str) -> Result<Module> {
        let (category, name) = split_module_id(id)?;
        let module_dir = self.root.join(MODULES_DIR).join(category).join(name);
        if !module_dir.is_dir() {
            return Err(Error::ModuleNotFound { id: id.to_string() });
        }
        let mut module: Module = read_metadata(&module_dir)
            .ok_or_else(|| Error::ModuleNotFound { id: id.to_string() })
            .and_then(|(path, content)| parse_metadata(&path, &content))?;
        module.id = format!("{}/{}", category, name);
        debug!("Loaded module '{}'", module.id);
        Ok(module)
    }

    /// Loads every module under `modules/<category>/<name>/`, in path order.
    pub fn load_all_modules(&self) -> Result<IndexMap<String, Module>> {
        let mut modules = IndexMap::new();
        let modules_dir = self.root.join(MODULES_DIR);
        if !modules_dir.is_dir() {
            return Ok(modules);
        }
        for entry in WalkDir::new(&modules_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::TemplateError(e.to_string()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&modules_dir)
                .map_err(|e| Error::TemplateError(e.to_string()))?;
            let id = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
            if read_metadata(entry.path()).is_none() {
                debug!("Skipping '{}': no metadata document", id);
                continue;
            }
            let module = self.load_module(&id)?;
            modules.insert(module.id.clone(), module);
        }
        Ok(modules)
    }

    /// Loads every base under `bases/<name>/`, in path order.
    pub fn load_all_bases(&self) -> Result<IndexMap<String, BaseTemplate>> {
        let mut bases = IndexMap::new();
        let bases_dir = self.root.join(BASES_DIR);
        if !bases_dir.is_dir() {
            return Ok(bases);
        }
        for entry in
            WalkDir::new(&bases_dir).min_depth(1).max_depth(1).sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::TemplateError(e.to_string()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if read_metadata(entry.path()).is_none() {
                debug!("Skipping base '{}': no metadata document", name);
                continue;
            }
            let base = self.load_base(&name)?;
            bases.insert(base.name.clone(), base);
        }
        Ok(bases)
    }

    /// Loads the full catalog of bases and modules.
    pub fn load_catalog(&self) -> Result<Catalog> {
        Ok(Catalog { bases: self.load_all_bases()?, modules: self.load_all_modules()? })
    }
}

/// Splits a `category/name` identifier into its two components.
pub fn split_module_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once('/') {
        Some((category, name))
            if !category.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((category, name))
        }
        _ => Err(Error::InvalidModuleId { id: id.to_string() }),
    }
}

/// Returns the first metadata document found in `dir`, trying the
/// supported file names in order.
fn read_metadata(dir: &Path) -> Option<(PathBuf, String)> {
    for file in METADATA_FILES {
        let path = dir.join(file);
        if path.is_file() {
            debug!("Loading metadata from {}", path.display());
            return fs::read_to_string(&path).ok().map(|content| (path, content));
        }
    }
    None
}

/// Parses a metadata document, trying JSON first, then YAML.
fn parse_metadata<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(_) => serde_yaml::from_str(content).map_err(|e| Error::MetadataError {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Reads every file under a base's `files/` subtree into a path -> text
/// mapping with forward-slash relative paths.
fn read_template_files(files_dir: &Path) -> Result<IndexMap<String, String>> {
    let mut files = IndexMap::new();
    if !files_dir.is_dir() {
        return Ok(files);
    }
    for entry in WalkDir::new(files_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::TemplateError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(files_dir)
            .map_err(|e| Error::TemplateError(e.to_string()))?;
        let rel = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        let content = fs::read_to_string(entry.path()).map_err(Error::IoError)?;
        files.insert(rel, content);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_module_id() {
        assert_eq!(split_module_id("acl/transient").unwrap(), ("acl", "transient"));
        assert!(split_module_id("no-category").is_err());
        assert!(split_module_id("too/many/parts").is_err());
        assert!(split_module_id("/name").is_err());
    }
}
