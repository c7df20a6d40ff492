//! Expression rendering for module fragments and conditions.
//! Injection content and `condition` predicates are MiniJinja templates
//! evaluated against the merge context.

use crate::error::{Error, Result};
use minijinja::Environment;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new MiniJinjaRenderer instance with default environment.
    pub fn new() -> Self {
        let env = Environment::new();
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let mut env = self.env.clone();
        env.add_template("temp", template).map_err(Error::RenderError)?;

        let tmpl = env.get_template("temp").map_err(Error::RenderError)?;

        tmpl.render(context).map_err(Error::RenderError)
    }
}
