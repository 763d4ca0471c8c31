//! Template catalog: a read-only index of the template tree.
//!
//! The tree is walked once in file-name order. Inclusion conditions, variant
//! groups, kept empty directories, executable bits and merge points are not
//! inferred from the files themselves but declared in the `.poja-catalog.yml`
//! manifest at the template root, e.g.
//!
//! ```yaml
//! rules:
//!   - path: "cf-stacks/network-stack.yml.j2"
//!     when:
//!       - { field: with_own_vpc, equals: "true" }
//! variants:
//!   - output: build.gradle
//!     field: with_database
//!     required: true
//!     choices:
//!       postgres: build.gradle.postgres.j2
//!       sqlite: build.gradle.sqlite.j2
//! keep_dirs:
//!   - path: vpc-config
//! executables:
//!   - gradlew
//! merges:
//!   - { path: "build.gradle.*.j2", aux: custom_java_deps }
//! ```

use crate::config::ConfigModel;
use crate::constants::{CATALOG_FILE, TEMPLATE_SUFFIX};
use crate::error::ResolutionError;
use crate::fragments::AuxKind;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A single manifest condition on one option.
///
/// Exactly one of `equals`, `not_equals` or `in` must be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub field: String,
    #[serde(default)]
    pub equals: Option<String>,
    #[serde(default)]
    pub not_equals: Option<String>,
    #[serde(default, rename = "in")]
    pub one_of: Option<Vec<String>>,
}

/// Inclusion predicate over a [`ConfigModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Always,
    Equals { field: String, value: String },
    NotEquals { field: String, value: String },
    OneOf { field: String, values: Vec<String> },
    All(Vec<Predicate>),
}

impl Predicate {
    /// Builds the conjunction of manifest conditions attached to `path`.
    ///
    /// # Errors
    /// * `ResolutionError::UnknownField` if a condition names an unknown option
    /// * `ResolutionError::InvalidCatalog` unless each condition has exactly one operator
    pub fn from_conditions(path: &str, conditions: &[Condition]) -> Result<Self, ResolutionError> {
        let mut predicates = Vec::with_capacity(conditions.len());
        for condition in conditions {
            if !ConfigModel::is_known(&condition.field) {
                return Err(ResolutionError::UnknownField {
                    path: path.to_string(),
                    field: condition.field.clone(),
                });
            }
            let field = condition.field.clone();
            let predicate = match (&condition.equals, &condition.not_equals, &condition.one_of) {
                (Some(value), None, None) => Predicate::Equals { field, value: value.clone() },
                (None, Some(value), None) => Predicate::NotEquals { field, value: value.clone() },
                (None, None, Some(values)) => Predicate::OneOf { field, values: values.clone() },
                _ => {
                    return Err(ResolutionError::InvalidCatalog(format!(
                        "condition on '{}' for '{path}' needs exactly one of equals, not_equals, in",
                        condition.field
                    )))
                }
            };
            predicates.push(predicate);
        }
        Ok(Predicate::Always.and(Predicate::All(predicates)))
    }

    /// Conjunction of two predicates, flattening trivial cases.
    pub fn and(self, other: Predicate) -> Predicate {
        let mut parts = Vec::new();
        for predicate in [self, other] {
            match predicate {
                Predicate::Always => {}
                Predicate::All(inner) => parts.extend(inner),
                single => parts.push(single),
            }
        }
        match parts.len() {
            0 => Predicate::Always,
            1 => parts.remove(0),
            _ => Predicate::All(parts),
        }
    }

    /// Evaluates the predicate. Unset options never equal anything.
    pub fn evaluate(&self, config: &ConfigModel) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Equals { field, value } => config.get(field).as_ref() == Some(value),
            Predicate::NotEquals { field, value } => config.get(field).as_ref() != Some(value),
            Predicate::OneOf { field, values } => {
                config.get(field).is_some_and(|current| values.contains(&current))
            }
            Predicate::All(predicates) => predicates.iter().all(|p| p.evaluate(config)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSpec {
    path: String,
    #[serde(default)]
    when: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantSpec {
    output: String,
    field: String,
    #[serde(default)]
    required: bool,
    choices: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MergeSpec {
    path: String,
    aux: AuxKind,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    rules: Vec<RuleSpec>,
    #[serde(default)]
    variants: Vec<VariantSpec>,
    #[serde(default)]
    keep_dirs: Vec<RuleSpec>,
    #[serde(default)]
    executables: Vec<String>,
    #[serde(default)]
    merges: Vec<MergeSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One template file or directory.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Source path relative to the template root, `/`-separated.
    pub path: String,
    pub kind: EntryKind,
    pub predicate: Predicate,
    /// Index of the enclosing directory entry, `None` at the root.
    pub parent: Option<usize>,
    /// Source goes through the template engine (ends with `.j2`).
    pub render: bool,
    pub executable: bool,
    /// Directory materialized even without surviving children.
    pub keep: bool,
    /// Variant group this source belongs to.
    pub variant: Option<usize>,
    pub merges: Vec<AuxKind>,
}

impl CatalogEntry {
    /// Output path before placeholder substitution; variants use their group's output.
    pub fn default_output(&self) -> String {
        match self.kind {
            EntryKind::File => {
                self.path.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(&self.path).to_string()
            }
            EntryKind::Directory => self.path.clone(),
        }
    }
}

/// Alternate sources for one logical output path, selected by `field`.
#[derive(Debug, Clone)]
pub struct VariantGroup {
    pub output: String,
    pub field: String,
    pub required: bool,
    /// Discriminating value to source path.
    pub choices: IndexMap<String, String>,
}

/// The loaded template tree.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    entries: Vec<CatalogEntry>,
    variants: Vec<VariantGroup>,
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet, ResolutionError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern).literal_separator(true).build().map_err(|e| {
            ResolutionError::InvalidCatalog(format!("invalid pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ResolutionError::InvalidCatalog(format!("pattern set failed: {e}")))
}

fn relative_path(root: &Path, path: &Path) -> Result<String, ResolutionError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| ResolutionError::InvalidCatalog(e.to_string()))?;
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().ok_or_else(|| {
                ResolutionError::InvalidCatalog(format!(
                    "non UTF-8 template path '{}'",
                    relative.display()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}

fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

impl Catalog {
    /// Loads the template tree under `template_root` and its manifest.
    ///
    /// # Errors
    /// * `ResolutionError::InvalidCatalog` if the root or manifest cannot be read
    ///   or the manifest is inconsistent with the tree
    /// * `ResolutionError::UnknownField` for conditions on unknown options
    pub fn load<P: AsRef<Path>>(template_root: P) -> Result<Self, ResolutionError> {
        let root = template_root.as_ref();
        if !root.is_dir() {
            return Err(ResolutionError::InvalidCatalog(format!(
                "template root '{}' is not a directory",
                root.display()
            )));
        }

        let manifest_path = root.join(CATALOG_FILE);
        let manifest: Manifest = if manifest_path.exists() {
            debug!("Loading catalog manifest from {}", manifest_path.display());
            let content = std::fs::read_to_string(&manifest_path).map_err(|e| {
                ResolutionError::InvalidCatalog(format!("cannot read {CATALOG_FILE}: {e}"))
            })?;
            serde_yaml::from_str(&content).map_err(|e| {
                ResolutionError::InvalidCatalog(format!("invalid {CATALOG_FILE}: {e}"))
            })?
        } else {
            debug!("{CATALOG_FILE} does not exist, every template is included");
            Manifest::default()
        };

        Self::from_manifest(root, manifest)
    }

    fn from_manifest(root: &Path, manifest: Manifest) -> Result<Self, ResolutionError> {
        let rule_patterns: Vec<&str> = manifest.rules.iter().map(|r| r.path.as_str()).collect();
        let rule_set = build_globset(&rule_patterns)?;
        let rule_predicates = manifest
            .rules
            .iter()
            .map(|rule| Predicate::from_conditions(&rule.path, &rule.when))
            .collect::<Result<Vec<_>, _>>()?;

        let exec_patterns: Vec<&str> = manifest.executables.iter().map(String::as_str).collect();
        let exec_set = build_globset(&exec_patterns)?;

        let merge_patterns: Vec<&str> = manifest.merges.iter().map(|m| m.path.as_str()).collect();
        let merge_set = build_globset(&merge_patterns)?;

        let mut variant_of: HashMap<&str, usize> = HashMap::new();
        for (index, variant) in manifest.variants.iter().enumerate() {
            if !ConfigModel::is_known(&variant.field) {
                return Err(ResolutionError::UnknownField {
                    path: variant.output.clone(),
                    field: variant.field.clone(),
                });
            }
            for source in variant.choices.values() {
                if let Some(other) = variant_of.insert(source.as_str(), index) {
                    if other != index {
                        return Err(ResolutionError::InvalidCatalog(format!(
                            "'{source}' belongs to more than one variant group"
                        )));
                    }
                }
            }
        }

        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        let walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        for dir_entry in walker {
            let dir_entry = dir_entry.map_err(|e| ResolutionError::InvalidCatalog(e.to_string()))?;
            let path = relative_path(root, dir_entry.path())?;
            if path == CATALOG_FILE {
                continue;
            }

            let kind = if dir_entry.file_type().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            let predicate = rule_set
                .matches(&path)
                .into_iter()
                .fold(Predicate::Always, |acc, i| acc.and(rule_predicates[i].clone()));

            let merges = match kind {
                EntryKind::File => {
                    merge_set.matches(&path).into_iter().map(|i| manifest.merges[i].aux).collect()
                }
                EntryKind::Directory => Vec::new(),
            };

            let entry = CatalogEntry {
                parent: parent_path(&path).and_then(|p| index_of.get(p).copied()),
                render: kind == EntryKind::File && path.ends_with(TEMPLATE_SUFFIX),
                executable: kind == EntryKind::File && exec_set.is_match(&path),
                keep: false,
                variant: variant_of.get(path.as_str()).copied(),
                merges,
                predicate,
                kind,
                path,
            };
            debug!("Catalog entry '{}': {:?}", entry.path, entry.predicate);
            index_of.insert(entry.path.clone(), entries.len());
            entries.push(entry);
        }

        for keep in &manifest.keep_dirs {
            let predicate = Predicate::from_conditions(&keep.path, &keep.when)?;
            match index_of.get(keep.path.as_str()) {
                Some(&index) if entries[index].kind == EntryKind::Directory => {
                    let entry = &mut entries[index];
                    entry.keep = true;
                    entry.predicate = entry.predicate.clone().and(predicate);
                }
                Some(_) => {
                    return Err(ResolutionError::InvalidCatalog(format!(
                        "kept directory '{}' is a file",
                        keep.path
                    )))
                }
                None => {
                    let parent = match parent_path(&keep.path) {
                        Some(p) => Some(index_of.get(p).copied().ok_or_else(|| {
                            ResolutionError::InvalidCatalog(format!(
                                "parent of kept directory '{}' is missing",
                                keep.path
                            ))
                        })?),
                        None => None,
                    };
                    index_of.insert(keep.path.clone(), entries.len());
                    entries.push(CatalogEntry {
                        path: keep.path.clone(),
                        kind: EntryKind::Directory,
                        predicate,
                        parent,
                        render: false,
                        executable: false,
                        keep: true,
                        variant: None,
                        merges: Vec::new(),
                    });
                }
            }
        }

        let variants = manifest
            .variants
            .into_iter()
            .map(|v| VariantGroup {
                output: v.output,
                field: v.field,
                required: v.required,
                choices: v.choices,
            })
            .collect();

        Ok(Catalog { root: root.to_path_buf(), entries, variants })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn variants(&self) -> &[VariantGroup] {
        &self.variants
    }

    /// Looks up an entry by its source path.
    pub fn entry(&self, path: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Absolute location of an entry's source.
    pub fn source_path(&self, entry: &CatalogEntry) -> PathBuf {
        self.root.join(&entry.path)
    }
}
