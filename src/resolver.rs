//! Inclusion resolution: evaluates a [`ConfigModel`] against a [`Catalog`]
//! and yields the ordered list of directories and files to generate.

use crate::catalog::{Catalog, CatalogEntry, EntryKind};
use crate::config::ConfigModel;
use crate::error::ResolutionError;
use crate::fragments::AuxKind;
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;

/// A fragment merge an entry must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    pub kind: AuxKind,
    /// Fragment file; `None` when the option is unset and the marker is just dropped.
    pub source: Option<PathBuf>,
}

/// A catalog entry selected for this run.
#[derive(Debug, Clone)]
pub struct ResolvedEntry<'c> {
    /// Output path relative to the output directory, before placeholder substitution.
    pub output: String,
    pub entry: &'c CatalogEntry,
    pub merges: Vec<Merge>,
}

impl ResolvedEntry<'_> {
    pub fn is_dir(&self) -> bool {
        self.entry.kind == EntryKind::Directory
    }
}

/// Picks, for each variant group, the source selected by its discriminating field.
fn select_variants(
    catalog: &Catalog,
    config: &ConfigModel,
) -> Result<Vec<Option<String>>, ResolutionError> {
    let mut selected = Vec::with_capacity(catalog.variants().len());
    for group in catalog.variants() {
        let value = config.get(&group.field).unwrap_or_default();
        let choice = group.choices.get(&value);
        match choice {
            Some(source) => match catalog.entry(source) {
                Some(entry) if entry.kind == EntryKind::File => {
                    debug!("Variant '{}' for {}={}", source, group.field, value);
                    selected.push(Some(source.clone()));
                }
                _ => {
                    return Err(ResolutionError::MissingRequiredFile {
                        output: group.output.clone(),
                        reason: format!("variant source '{source}' is not in the template tree"),
                    })
                }
            },
            None if group.required => {
                return Err(ResolutionError::MissingRequiredFile {
                    output: group.output.clone(),
                    reason: format!("no variant for {}='{}'", group.field, value),
                })
            }
            None => {
                debug!("No variant of '{}' for {}={}", group.output, group.field, value);
                selected.push(None);
            }
        }
    }
    Ok(selected)
}

/// Resolves the entries to generate, in catalog order.
///
/// A file is included when its own predicate and those of all its ancestor
/// directories hold; a variant source additionally has to be the one selected
/// for its group. A directory is included when its predicates hold and either
/// it is annotated as kept or an included file lies beneath it.
///
/// # Errors
/// * `ResolutionError::MissingRequiredFile` when a required variant cannot be provided
/// * `ResolutionError::ConflictingVariant` when two included entries share an output path
pub fn resolve<'c>(
    catalog: &'c Catalog,
    config: &ConfigModel,
) -> Result<Vec<ResolvedEntry<'c>>, ResolutionError> {
    let entries = catalog.entries();
    let selected = select_variants(catalog, config)?;

    let mut allowed = vec![false; entries.len()];
    for (index, entry) in entries.iter().enumerate() {
        let parent_allowed = entry.parent.map_or(true, |p| allowed[p]);
        allowed[index] = parent_allowed && entry.predicate.evaluate(config);
    }

    let mut outputs: Vec<Option<String>> = vec![None; entries.len()];
    let mut claimed: HashMap<String, &str> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.kind != EntryKind::File {
            continue;
        }
        let output = match entry.variant {
            Some(group_index) => {
                let group = &catalog.variants()[group_index];
                if selected[group_index].as_deref() != Some(entry.path.as_str()) {
                    continue;
                }
                if !allowed[index] {
                    if group.required {
                        return Err(ResolutionError::MissingRequiredFile {
                            output: group.output.clone(),
                            reason: format!("variant source '{}' is excluded", entry.path),
                        });
                    }
                    continue;
                }
                group.output.clone()
            }
            None if allowed[index] => entry.default_output(),
            None => {
                debug!("Excluding '{}'", entry.path);
                continue;
            }
        };
        if let Some(first) = claimed.insert(output.clone(), entry.path.as_str()) {
            return Err(ResolutionError::ConflictingVariant {
                output,
                first: first.to_string(),
                second: entry.path.clone(),
            });
        }
        outputs[index] = Some(output);
    }

    let survivors: Vec<String> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry.kind {
            EntryKind::File => outputs[index].clone(),
            EntryKind::Directory if entry.keep && allowed[index] => Some(entry.path.clone()),
            EntryKind::Directory => None,
        })
        .collect();

    for (index, entry) in entries.iter().enumerate() {
        if entry.kind != EntryKind::Directory || !allowed[index] {
            continue;
        }
        let prefix = format!("{}/", entry.path);
        if entry.keep || survivors.iter().any(|s| s.starts_with(&prefix)) {
            outputs[index] = Some(entry.path.clone());
        } else {
            debug!("Omitting empty directory '{}'", entry.path);
        }
    }

    let resolved = entries
        .iter()
        .zip(outputs)
        .filter_map(|(entry, output)| {
            output.map(|output| ResolvedEntry {
                output,
                entry,
                merges: entry
                    .merges
                    .iter()
                    .map(|kind| Merge {
                        kind: *kind,
                        source: kind.source(config).map(PathBuf::from),
                    })
                    .collect(),
            })
        })
        .collect();
    Ok(resolved)
}
