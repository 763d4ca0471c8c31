//! Common constants used throughout poja.

/// Catalog manifest file name, looked up at the template root
pub const CATALOG_FILE: &str = ".poja-catalog.yml";

/// Suffix marking a template source that goes through the renderer
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Template tree in the source checkout the binary was built from
pub const BUILD_TEMPLATE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/poja");

/// Template tree location relative to an installation directory
pub const TEMPLATE_DIR: &str = "templates/poja";

/// Installation prefix directory holding shared data, relative to the binary
pub const SHARE_DIR: &str = "../share/poja";

/// Marker introducing a merge region inside a template body
pub const MERGE_MARKER: &str = "poja-merge:";

/// Leading character of comment lines in auxiliary files
pub const AUX_COMMENT: char = '#';
