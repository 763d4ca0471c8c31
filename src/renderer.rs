//! Template rendering for poja.
//! Substitutes configuration values into template paths and bodies with
//! MiniJinja and applies fragment merges to the rendered bodies.

use crate::catalog::Catalog;
use crate::config::ConfigModel;
use crate::error::RenderError;
use crate::fragments::{load_entries, merge_entries};
use crate::resolver::ResolvedEntry;
use log::debug;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use std::path::PathBuf;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `name` - Template name used in error messages
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String, RenderError>` - Rendered template string
    fn render(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<String, RenderError>;
}

/// MiniJinja-based template rendering engine.
///
/// Undefined variables are errors, nothing is auto-escaped and a trailing
/// newline is preserved, so a body renders to exactly what the template says.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// # Errors
    /// * `RenderError::UnknownPlaceholder` if the template uses an undefined variable
    /// * `RenderError::Template` for syntax and other evaluation errors
    fn render(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<String, RenderError> {
        let to_render_error = |e: minijinja::Error| match e.kind() {
            ErrorKind::UndefinedError => {
                RenderError::UnknownPlaceholder { template: name.to_string(), detail: e.to_string() }
            }
            _ => RenderError::Template { template: name.to_string(), detail: e.to_string() },
        };

        let mut env = self.env.clone();
        env.add_template(name, template).map_err(to_render_error)?;
        let tmpl = env.get_template(name).map_err(to_render_error)?;
        tmpl.render(context).map_err(to_render_error)
    }
}

/// Checks that a rendered relative path is usable as an output location.
pub fn is_rendered_path_valid<S: AsRef<str>>(path: S) -> bool {
    let path = path.as_ref();
    !path.is_empty()
        && !path.starts_with('/')
        && !path.split('/').any(|segment| segment.is_empty() || segment == "..")
}

/// A final output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Directory { path: PathBuf },
    File { path: PathBuf, content: Vec<u8>, executable: bool },
}

impl Rendered {
    /// Destination relative to the output directory.
    pub fn path(&self) -> &PathBuf {
        match self {
            Rendered::Directory { path } | Rendered::File { path, .. } => path,
        }
    }
}

/// Renders resolved entries against one configuration.
pub struct Renderer<'a> {
    engine: &'a dyn TemplateRenderer,
    catalog: &'a Catalog,
    context: serde_json::Value,
}

impl<'a> Renderer<'a> {
    pub fn new(engine: &'a dyn TemplateRenderer, catalog: &'a Catalog, config: &ConfigModel) -> Self {
        Self { engine, catalog, context: config.context() }
    }

    fn render_path(&self, entry: &ResolvedEntry) -> Result<PathBuf, RenderError> {
        let name = format!("{} (path)", entry.entry.path);
        let path = self.engine.render(&name, &entry.output, &self.context)?;
        if !is_rendered_path_valid(&path) {
            return Err(RenderError::InvalidPath { template: entry.entry.path.clone(), path });
        }
        Ok(PathBuf::from(path))
    }

    /// Produces the final path and content of a resolved entry.
    ///
    /// `.j2` sources are rendered and merged, other files are copied byte for byte.
    ///
    /// # Errors
    /// * `RenderError::UnknownPlaceholder` for undefined variables in path or body
    /// * `RenderError::InvalidPath` if the path renders to something unusable
    /// * `RenderError::AuxFileNotFound` / `RenderError::InvalidAuxEntry` for bad fragments
    /// * `RenderError::MergeMarker` if a declared merge has no single marker
    pub fn render(&self, entry: &ResolvedEntry) -> Result<Rendered, RenderError> {
        let path = self.render_path(entry)?;
        if entry.is_dir() {
            return Ok(Rendered::Directory { path });
        }

        let template = &entry.entry.path;
        let source = self.catalog.source_path(entry.entry);
        let content = std::fs::read(&source)
            .map_err(|e| RenderError::Io { path: source.clone(), source: e })?;

        let content = if entry.entry.render || !entry.merges.is_empty() {
            let body = String::from_utf8(content).map_err(|e| RenderError::Template {
                template: template.clone(),
                detail: e.to_string(),
            })?;
            let mut body = if entry.entry.render {
                debug!("Rendering '{}' to '{}'", template, path.display());
                self.engine.render(template, &body, &self.context)?
            } else {
                body
            };
            for merge in &entry.merges {
                let entries = match &merge.source {
                    Some(aux_path) => load_entries(merge.kind, aux_path)?,
                    None => Vec::new(),
                };
                debug!("Merging {} {} entries into '{}'", entries.len(), merge.kind, template);
                body = merge_entries(template, &body, merge.kind, &entries)?;
            }
            body.into_bytes()
        } else {
            debug!("Copying '{}' to '{}'", template, path.display());
            content
        };

        Ok(Rendered::File { path, content, executable: entry.entry.executable })
    }
}
