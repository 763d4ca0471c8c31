//! Auxiliary fragment files and their merge into template bodies.
//!
//! A fragment file holds one directive per line. Blank lines and lines starting
//! with `#` are skipped; every other line must match the syntax of its
//! [`AuxKind`]. Validated entries replace the single `poja-merge: <kind>` marker
//! line of the target template, indented like the marker.

use crate::config::ConfigModel;
use crate::constants::{AUX_COMMENT, MERGE_MARKER};
use crate::error::RenderError;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

static JAVA_DEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(implementation|api|compileOnly|runtimeOnly|annotationProcessor|testImplementation|testCompileOnly|testRuntimeOnly|testAnnotationProcessor)(\s+|\s*\(\s*)['"a-z]"#,
    )
    .expect("valid dependency pattern")
});
static JAVA_REPOSITORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(mavenCentral\(\)|mavenLocal\(\)|google\(\)|gradlePluginPortal\(\)|maven\s*\{.*\})$")
        .expect("valid repository pattern")
});
static JAVA_ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Z_][A-Z0-9_]*)=(?P<value>.+)$").expect("valid env var pattern")
});
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<indent>[ \t]*)\S*\s*{MERGE_MARKER}\s*(?P<kind>[a-z_]+)\s*$"))
        .expect("valid marker pattern")
});

/// Kinds of auxiliary fragment a template can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxKind {
    CustomJavaDeps,
    CustomJavaRepositories,
    CustomJavaEnvVars,
}

impl AuxKind {
    /// Name of the option pointing at the fragment file, also used in markers.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuxKind::CustomJavaDeps => "custom_java_deps",
            AuxKind::CustomJavaRepositories => "custom_java_repositories",
            AuxKind::CustomJavaEnvVars => "custom_java_env_vars",
        }
    }

    /// Resolved fragment file configured for this kind, if any.
    pub fn source<'a>(&self, config: &'a ConfigModel) -> Option<&'a Path> {
        let source = match self {
            AuxKind::CustomJavaDeps => &config.custom_java_deps,
            AuxKind::CustomJavaRepositories => &config.custom_java_repositories,
            AuxKind::CustomJavaEnvVars => &config.custom_java_env_vars,
        };
        source.as_ref().map(|s| s.path.as_path())
    }

    /// Checks one trimmed line and formats it for insertion.
    fn format(&self, line: &str) -> Option<String> {
        match self {
            AuxKind::CustomJavaDeps => JAVA_DEP.is_match(line).then(|| line.to_string()),
            AuxKind::CustomJavaRepositories => {
                JAVA_REPOSITORY.is_match(line).then(|| line.to_string())
            }
            AuxKind::CustomJavaEnvVars => JAVA_ENV_VAR.captures(line).map(|caps| {
                let value = caps["value"].trim().replace('\'', "''");
                format!("{}: '{}'", &caps["name"], value)
            }),
        }
    }
}

impl fmt::Display for AuxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses fragment file content into formatted entries, in file order.
///
/// # Errors
/// * `RenderError::InvalidAuxEntry` naming the first malformed line
pub fn parse_entries(kind: AuxKind, path: &Path, content: &str) -> Result<Vec<String>, RenderError> {
    let mut entries = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(AUX_COMMENT) {
            continue;
        }
        match kind.format(line) {
            Some(entry) => entries.push(entry),
            None => {
                return Err(RenderError::InvalidAuxEntry {
                    path: path.to_path_buf(),
                    kind: kind.as_str(),
                    line_number: index + 1,
                    line: line.to_string(),
                })
            }
        }
    }
    Ok(entries)
}

/// Reads and validates a fragment file.
///
/// # Errors
/// * `RenderError::AuxFileNotFound` if the file does not exist
/// * `RenderError::InvalidAuxEntry` for a malformed line
pub fn load_entries(kind: AuxKind, path: &Path) -> Result<Vec<String>, RenderError> {
    debug!("Reading {} from {}", kind, path.display());
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RenderError::AuxFileNotFound { path: path.to_path_buf() },
        _ => RenderError::Io { path: path.to_path_buf(), source: e },
    })?;
    parse_entries(kind, path, &content)
}

/// Replaces the marker line of `kind` in `body` with `entries`.
///
/// Everything outside the marker line is kept byte for byte, including the
/// line terminators.
///
/// # Errors
/// * `RenderError::MergeMarker` unless the marker occurs exactly once
pub fn merge_entries(
    template: &str,
    body: &str,
    kind: AuxKind,
    entries: &[String],
) -> Result<String, RenderError> {
    let mut merged = String::with_capacity(body.len());
    let mut found = 0;

    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let marker = MARKER.captures(content).filter(|caps| &caps["kind"] == kind.as_str());
        match marker {
            Some(caps) => {
                found += 1;
                let newline = &line[content.len()..];
                let newline = if newline.is_empty() { "\n" } else { newline };
                for entry in entries {
                    merged.push_str(&caps["indent"]);
                    merged.push_str(entry);
                    merged.push_str(newline);
                }
            }
            None => merged.push_str(line),
        }
    }

    if found != 1 {
        return Err(RenderError::MergeMarker {
            template: template.to_string(),
            kind: kind.as_str(),
            found,
        });
    }
    Ok(merged)
}
