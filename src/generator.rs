//! Generation pipeline: configuration, catalog, resolution, rendering, writing.

use crate::catalog::Catalog;
use crate::config::{ConfigModel, RawOptions};
use crate::error::Result;
use crate::renderer::{MiniJinjaRenderer, Rendered, Renderer};
use crate::resolver::resolve;
use crate::writer::write_tree;
use log::info;
use std::path::{Path, PathBuf};

/// Outcome of a successful run.
#[derive(Debug)]
pub struct Generation {
    pub config: ConfigModel,
    /// Written files, in catalog order.
    pub files: Vec<PathBuf>,
}

/// Resolves and renders every entry without touching the output directory.
pub fn render_all(config: &ConfigModel, catalog: &Catalog) -> Result<Vec<Rendered>> {
    let entries = resolve(catalog, config)?;
    info!("Resolved {} entries from {}", entries.len(), catalog.root().display());

    let engine = MiniJinjaRenderer::new();
    let renderer = Renderer::new(&engine, catalog, config);
    let rendered = entries
        .iter()
        .map(|entry| renderer.render(entry))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rendered)
}

/// Generates a project into `output_dir`.
///
/// # Arguments
/// * `raw` - Options from the command line and/or configuration file
/// * `template_root` - Root of the template tree
/// * `output_dir` - Destination directory, created if missing
///
/// # Errors
/// The first error of any stage. Files already written are left in place.
pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(
    raw: RawOptions,
    template_root: P,
    output_dir: Q,
) -> Result<Generation> {
    let config = ConfigModel::build(raw)?;
    info!("Generating '{}' into {}", config.app_name, output_dir.as_ref().display());

    let catalog = Catalog::load(template_root)?;
    let rendered = render_all(&config, &catalog)?;
    let files = write_tree(&rendered, output_dir)?;

    info!("Wrote {} files", files.len());
    Ok(Generation { config, files })
}
