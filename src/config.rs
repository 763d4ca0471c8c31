//! Configuration handling for poja.
//! Raw options arrive either as discrete command-line flags or as a `poja.yml`
//! file; both are normalized into [`RawOptions`] and validated once into an
//! immutable [`ConfigModel`].

use crate::error::ConfigError;
use cruet::Inflector;
use indexmap::IndexMap;
use log::{debug, warn};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

/// Every recognized option, in the order used for the rendering context.
pub const OPTIONS: [&str; 19] = [
    "app_name",
    "region",
    "with_own_vpc",
    "ssm_sg_id",
    "ssm_subnet1_id",
    "ssm_subnet2_id",
    "ses_source",
    "with_database",
    "package_full_name",
    "jacoco_min_coverage",
    "with_snapstart",
    "with_swagger_ui",
    "with_gen_clients",
    "with_publish_to_npm_registry",
    "ts_client_default_openapi_server_url",
    "ts_client_api_url_env_var_name",
    "custom_java_deps",
    "custom_java_repositories",
    "custom_java_env_vars",
];

/// Values computed from the options and exposed to templates.
pub const DERIVED: [&str; 4] = ["package_path", "database_name", "app_pascal_name", "poja_version"];

/// Options naming auxiliary fragment files.
const AUX_OPTIONS: [&str; 3] = ["custom_java_deps", "custom_java_repositories", "custom_java_env_vars"];

/// Keys a config file may carry without being options.
const IGNORED_KEYS: [&str; 1] = ["poja_version"];

pub const DEFAULT_REGION: &str = "eu-west-3";
pub const DEFAULT_SES_SOURCE: &str = "noreply@nowhere.com";
pub const DEFAULT_PACKAGE: &str = "com.company.base";
pub const DEFAULT_JACOCO_MIN_COVERAGE: &str = "0.8";

static APP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("valid app name pattern"));
static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$").expect("valid package pattern")
});

/// Unvalidated options, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    pub app_name: Option<String>,
    pub region: Option<String>,
    pub with_own_vpc: Option<String>,
    pub ssm_sg_id: Option<String>,
    pub ssm_subnet1_id: Option<String>,
    pub ssm_subnet2_id: Option<String>,
    pub ses_source: Option<String>,
    pub with_database: Option<String>,
    pub package_full_name: Option<String>,
    pub jacoco_min_coverage: Option<String>,
    pub with_snapstart: Option<String>,
    pub with_swagger_ui: Option<String>,
    pub with_gen_clients: Option<String>,
    pub with_publish_to_npm_registry: Option<String>,
    pub ts_client_default_openapi_server_url: Option<String>,
    pub ts_client_api_url_env_var_name: Option<String>,
    pub custom_java_deps: Option<String>,
    pub custom_java_repositories: Option<String>,
    pub custom_java_env_vars: Option<String>,
}

impl RawOptions {
    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key {
            "app_name" => &mut self.app_name,
            "region" => &mut self.region,
            "with_own_vpc" => &mut self.with_own_vpc,
            "ssm_sg_id" => &mut self.ssm_sg_id,
            "ssm_subnet1_id" => &mut self.ssm_subnet1_id,
            "ssm_subnet2_id" => &mut self.ssm_subnet2_id,
            "ses_source" => &mut self.ses_source,
            "with_database" => &mut self.with_database,
            "package_full_name" => &mut self.package_full_name,
            "jacoco_min_coverage" => &mut self.jacoco_min_coverage,
            "with_snapstart" => &mut self.with_snapstart,
            "with_swagger_ui" => &mut self.with_swagger_ui,
            "with_gen_clients" => &mut self.with_gen_clients,
            "with_publish_to_npm_registry" => &mut self.with_publish_to_npm_registry,
            "ts_client_default_openapi_server_url" => {
                &mut self.ts_client_default_openapi_server_url
            }
            "ts_client_api_url_env_var_name" => &mut self.ts_client_api_url_env_var_name,
            "custom_java_deps" => &mut self.custom_java_deps,
            "custom_java_repositories" => &mut self.custom_java_repositories,
            "custom_java_env_vars" => &mut self.custom_java_env_vars,
            _ => return None,
        };
        Some(slot)
    }

    /// Sets an option by name.
    ///
    /// # Errors
    /// * `ConfigError::Parse` if `key` is not a recognized option
    pub fn set<S: Into<String>>(&mut self, key: &str, value: S) -> Result<(), ConfigError> {
        match self.slot(key) {
            Some(slot) => {
                *slot = Some(value.into());
                Ok(())
            }
            None => Err(ConfigError::Parse(format!("unknown option '{key}'"))),
        }
    }

    /// Parses a flat YAML mapping of option names to scalars.
    ///
    /// Booleans and numbers are normalized to their string form, so
    /// `with_own_vpc: true` and `with_own_vpc: "true"` are equivalent.
    /// Relative auxiliary file paths are anchored to `base_dir`.
    ///
    /// # Arguments
    /// * `content` - YAML document
    /// * `base_dir` - Directory holding the document
    ///
    /// # Errors
    /// * `ConfigError::Parse` on malformed YAML, unknown keys or non-scalar values
    pub fn from_yaml_str<P: AsRef<Path>>(content: &str, base_dir: P) -> Result<Self, ConfigError> {
        let raw: IndexMap<String, serde_yaml::Value> = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("invalid configuration format: {e}")))?;

        let base_dir = base_dir.as_ref();
        let mut options = RawOptions::default();
        for (key, value) in raw {
            if IGNORED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let value = match value {
                serde_yaml::Value::Null => continue,
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                _ => {
                    return Err(ConfigError::Parse(format!(
                        "option '{key}' must be a scalar value"
                    )))
                }
            };
            let value = if AUX_OPTIONS.contains(&key.as_str()) {
                anchor(value, base_dir)
            } else {
                value
            };
            options.set(&key, value)?;
        }
        Ok(options)
    }

    /// Loads a `poja.yml` file; relative auxiliary paths resolve against its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Parse(format!("cannot read '{}': {e}", path.display()))
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_yaml_str(&content, base_dir)
    }

    /// Returns `self` with every option set in `overrides` replaced.
    pub fn merge(mut self, mut overrides: RawOptions) -> Self {
        for key in OPTIONS {
            let value = overrides.slot(key).and_then(Option::take);
            if let (Some(value), Some(slot)) = (value, self.slot(key)) {
                *slot = Some(value);
            }
        }
        self
    }
}

/// Database flavour backing the generated application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
    NonPojaManagedPostgres,
    None,
}

impl DatabaseKind {
    pub const ALL: [DatabaseKind; 4] = [
        DatabaseKind::Postgres,
        DatabaseKind::Sqlite,
        DatabaseKind::NonPojaManagedPostgres,
        DatabaseKind::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::NonPojaManagedPostgres => "non-poja-managed-postgres",
            DatabaseKind::None => "none",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseKind::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or_else(|| {
            ConfigError::InvalidEnum {
                field: "with_database",
                value: s.to_string(),
                expected: DatabaseKind::ALL.map(|k| k.as_str()).join(", "),
            }
        })
    }
}

/// An auxiliary file reference: the path as the user wrote it, and where it resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxSource {
    pub declared: String,
    pub path: PathBuf,
}

impl AuxSource {
    /// Absolute location as a string, the form exposed to templates.
    pub fn location(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// SSM parameter names of a user-provided VPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcParams {
    pub ssm_sg_id: String,
    pub ssm_subnet1_id: String,
    pub ssm_subnet2_id: String,
}

/// TypeScript client settings used when publishing to npm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsClient {
    pub default_openapi_server_url: String,
    pub api_url_env_var_name: String,
}

/// Validated generation options with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigModel {
    pub app_name: String,
    pub region: String,
    pub vpc: Option<VpcParams>,
    pub ses_source: String,
    pub with_database: DatabaseKind,
    pub package_full_name: String,
    pub jacoco_min_coverage: String,
    pub with_snapstart: bool,
    pub with_swagger_ui: bool,
    pub with_gen_clients: bool,
    pub with_publish_to_npm_registry: bool,
    pub ts_client: Option<TsClient>,
    pub custom_java_deps: Option<AuxSource>,
    pub custom_java_repositories: Option<AuxSource>,
    pub custom_java_env_vars: Option<AuxSource>,
}

fn parse_bool(field: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref() {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ConfigError::InvalidBoolean { field, value: other.to_string() }),
    }
}

fn require(
    field: &'static str,
    required_by: &'static str,
    value: Option<String>,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingDependentField { field, required_by }),
    }
}

fn anchor(value: String, base_dir: &Path) -> String {
    let path = Path::new(&value);
    if value.trim().is_empty() || path.is_absolute() || base_dir.as_os_str().is_empty() {
        value
    } else {
        base_dir.join(path).to_string_lossy().into_owned()
    }
}

/// Resolves an auxiliary file option against the working directory.
///
/// The absolute form is what ends up in the emitted `poja.yml`, so the file
/// is found again whatever directory the project is regenerated from.
fn aux_source(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<AuxSource>, ConfigError> {
    let Some(declared) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let path = std::path::absolute(&declared).map_err(|e| ConfigError::InvalidValue {
        field,
        value: declared.clone(),
        reason: e.to_string(),
    })?;
    Ok(Some(AuxSource { declared, path }))
}

impl ConfigModel {
    /// Validates raw options and applies defaults.
    ///
    /// # Errors
    /// * `ConfigError::MissingRequiredField` if `app_name` is absent
    /// * `ConfigError::InvalidBoolean` for boolean options other than "true"/"false"
    /// * `ConfigError::InvalidEnum` for an unknown `with_database`
    /// * `ConfigError::MissingDependentField` when an enabled option lacks its companions
    /// * `ConfigError::InvalidValue` for malformed names or coverage
    pub fn build(raw: RawOptions) -> Result<Self, ConfigError> {
        let app_name = raw
            .app_name
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingRequiredField { field: "app_name" })?;
        if !APP_NAME.is_match(&app_name) {
            return Err(ConfigError::InvalidValue {
                field: "app_name",
                value: app_name,
                reason: "expected lowercase letters, digits and dashes".to_string(),
            });
        }

        let package_full_name = raw.package_full_name.unwrap_or_else(|| DEFAULT_PACKAGE.to_string());
        if !PACKAGE.is_match(&package_full_name) {
            return Err(ConfigError::InvalidValue {
                field: "package_full_name",
                value: package_full_name,
                reason: "expected a dot-separated lowercase Java package".to_string(),
            });
        }

        let jacoco_min_coverage =
            raw.jacoco_min_coverage.unwrap_or_else(|| DEFAULT_JACOCO_MIN_COVERAGE.to_string());
        // Canonical form, so "0.50" and a YAML 0.50 render identically.
        let jacoco_min_coverage = match jacoco_min_coverage.trim().parse::<f64>() {
            Ok(ratio) if (0.0..=1.0).contains(&ratio) => ratio.to_string(),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "jacoco_min_coverage",
                    value: jacoco_min_coverage,
                    reason: "expected a ratio between 0 and 1".to_string(),
                })
            }
        };

        let with_database = match raw.with_database.as_deref() {
            Some(value) => value.parse()?,
            None => DatabaseKind::None,
        };

        let with_own_vpc = parse_bool("with_own_vpc", raw.with_own_vpc)?;
        let vpc = if with_own_vpc {
            Some(VpcParams {
                ssm_sg_id: require("ssm_sg_id", "with_own_vpc", raw.ssm_sg_id)?,
                ssm_subnet1_id: require("ssm_subnet1_id", "with_own_vpc", raw.ssm_subnet1_id)?,
                ssm_subnet2_id: require("ssm_subnet2_id", "with_own_vpc", raw.ssm_subnet2_id)?,
            })
        } else {
            if raw.ssm_sg_id.is_some() || raw.ssm_subnet1_id.is_some() || raw.ssm_subnet2_id.is_some()
            {
                warn!("SSM network ids are ignored because with_own_vpc is false");
            }
            None
        };

        let with_snapstart = parse_bool("with_snapstart", raw.with_snapstart)?;
        let with_swagger_ui = parse_bool("with_swagger_ui", raw.with_swagger_ui)?;
        let with_gen_clients = parse_bool("with_gen_clients", raw.with_gen_clients)?;
        let with_publish_to_npm_registry =
            parse_bool("with_publish_to_npm_registry", raw.with_publish_to_npm_registry)?;

        let ts_client = if with_publish_to_npm_registry && with_gen_clients {
            Some(TsClient {
                default_openapi_server_url: require(
                    "ts_client_default_openapi_server_url",
                    "with_publish_to_npm_registry",
                    raw.ts_client_default_openapi_server_url,
                )?,
                api_url_env_var_name: require(
                    "ts_client_api_url_env_var_name",
                    "with_publish_to_npm_registry",
                    raw.ts_client_api_url_env_var_name,
                )?,
            })
        } else {
            if with_publish_to_npm_registry {
                warn!("with_publish_to_npm_registry has no effect without with_gen_clients");
            }
            None
        };

        Ok(ConfigModel {
            app_name,
            region: raw.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            vpc,
            ses_source: raw.ses_source.unwrap_or_else(|| DEFAULT_SES_SOURCE.to_string()),
            with_database,
            package_full_name,
            jacoco_min_coverage,
            with_snapstart,
            with_swagger_ui,
            with_gen_clients,
            with_publish_to_npm_registry,
            ts_client,
            custom_java_deps: aux_source("custom_java_deps", raw.custom_java_deps)?,
            custom_java_repositories: aux_source(
                "custom_java_repositories",
                raw.custom_java_repositories,
            )?,
            custom_java_env_vars: aux_source("custom_java_env_vars", raw.custom_java_env_vars)?,
        })
    }

    /// Returns the string value of an option or derived value.
    ///
    /// `None` means the option is known but unset; unknown names also yield `None`,
    /// use [`ConfigModel::is_known`] to tell them apart.
    pub fn get(&self, field: &str) -> Option<String> {
        let flag = |b: bool| Some(b.to_string());
        match field {
            "app_name" => Some(self.app_name.clone()),
            "region" => Some(self.region.clone()),
            "with_own_vpc" => flag(self.vpc.is_some()),
            "ssm_sg_id" => self.vpc.as_ref().map(|v| v.ssm_sg_id.clone()),
            "ssm_subnet1_id" => self.vpc.as_ref().map(|v| v.ssm_subnet1_id.clone()),
            "ssm_subnet2_id" => self.vpc.as_ref().map(|v| v.ssm_subnet2_id.clone()),
            "ses_source" => Some(self.ses_source.clone()),
            "with_database" => Some(self.with_database.to_string()),
            "package_full_name" => Some(self.package_full_name.clone()),
            "jacoco_min_coverage" => Some(self.jacoco_min_coverage.clone()),
            "with_snapstart" => flag(self.with_snapstart),
            "with_swagger_ui" => flag(self.with_swagger_ui),
            "with_gen_clients" => flag(self.with_gen_clients),
            "with_publish_to_npm_registry" => flag(self.with_publish_to_npm_registry),
            "ts_client_default_openapi_server_url" => {
                self.ts_client.as_ref().map(|t| t.default_openapi_server_url.clone())
            }
            "ts_client_api_url_env_var_name" => {
                self.ts_client.as_ref().map(|t| t.api_url_env_var_name.clone())
            }
            "custom_java_deps" => self.custom_java_deps.as_ref().map(AuxSource::location),
            "custom_java_repositories" => {
                self.custom_java_repositories.as_ref().map(AuxSource::location)
            }
            "custom_java_env_vars" => self.custom_java_env_vars.as_ref().map(AuxSource::location),
            "package_path" => Some(self.package_full_name.replace('.', "/")),
            "database_name" => Some(self.app_name.to_snake_case()),
            "app_pascal_name" => Some(self.app_name.to_pascal_case()),
            "poja_version" => Some(env!("CARGO_PKG_VERSION").to_string()),
            _ => None,
        }
    }

    /// Whether `field` names an option or a derived value.
    pub fn is_known(field: &str) -> bool {
        OPTIONS.contains(&field) || DERIVED.contains(&field)
    }

    /// Builds the rendering context: every option and derived value as a string,
    /// unset options as empty strings.
    pub fn context(&self) -> serde_json::Value {
        let context: serde_json::Map<String, serde_json::Value> = OPTIONS
            .iter()
            .chain(DERIVED.iter())
            .map(|field| {
                let value = self.get(field).unwrap_or_default();
                (field.to_string(), serde_json::Value::String(value))
            })
            .collect();
        serde_json::Value::Object(context)
    }
}
