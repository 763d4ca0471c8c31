//! Command-line interface implementation for poja.
//! Provides argument parsing and help text formatting using clap.

use crate::config::RawOptions;
use crate::constants::{BUILD_TEMPLATE_ROOT, SHARE_DIR, TEMPLATE_DIR};
use crate::error::ConfigError;
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};

/// Command-line arguments structure for poja.
///
/// Every generation option can also be given in a `poja.yml` file passed with
/// `--poja-conf`; flags given explicitly take precedence over the file.
#[derive(Parser, Debug)]
#[command(author, version, about = "poja: serverless Java project generator", long_about = None)]
pub struct Args {
    /// Application name, lowercase letters, digits and dashes
    #[arg(long)]
    pub app_name: Option<String>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Deploy into a VPC whose ids are read from SSM ("true" or "false")
    #[arg(long)]
    pub with_own_vpc: Option<String>,

    /// SSM parameter holding the security group id
    #[arg(long)]
    pub ssm_sg_id: Option<String>,

    /// SSM parameter holding the first private subnet id
    #[arg(long)]
    pub ssm_subnet1_id: Option<String>,

    /// SSM parameter holding the second private subnet id
    #[arg(long)]
    pub ssm_subnet2_id: Option<String>,

    /// Verified SES sender address
    #[arg(long)]
    pub ses_source: Option<String>,

    /// One of postgres, sqlite, non-poja-managed-postgres, none
    #[arg(long)]
    pub with_database: Option<String>,

    /// Java package of the application, e.g. com.company.base
    #[arg(long)]
    pub package_full_name: Option<String>,

    /// Minimal test coverage ratio enforced by JaCoCo
    #[arg(long)]
    pub jacoco_min_coverage: Option<String>,

    /// Enable Lambda SnapStart ("true" or "false")
    #[arg(long)]
    pub with_snapstart: Option<String>,

    /// Serve Swagger UI for the API ("true" or "false")
    #[arg(long)]
    pub with_swagger_ui: Option<String>,

    /// Generate API clients from the OpenAPI document ("true" or "false")
    #[arg(long)]
    pub with_gen_clients: Option<String>,

    /// Publish the generated TypeScript client to npm ("true" or "false")
    #[arg(long)]
    pub with_publish_to_npm_registry: Option<String>,

    /// Default server URL baked into the TypeScript client
    #[arg(long)]
    pub ts_client_default_openapi_server_url: Option<String>,

    /// Environment variable overriding the TypeScript client API URL
    #[arg(long)]
    pub ts_client_api_url_env_var_name: Option<String>,

    /// File listing extra Gradle dependencies, one per line
    #[arg(long)]
    pub custom_java_deps: Option<String>,

    /// File listing extra Gradle repositories, one per line
    #[arg(long)]
    pub custom_java_repositories: Option<String>,

    /// File listing extra NAME=value environment variables, one per line
    #[arg(long)]
    pub custom_java_env_vars: Option<String>,

    /// Read options from a poja.yml file
    #[arg(long, value_name = "FILE")]
    pub poja_conf: Option<PathBuf>,

    /// Directory where the generated project will be written
    #[arg(long, value_name = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Root of the template tree [default: the installed templates]
    #[arg(long, value_name = "DIR")]
    pub template_root: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Options given as discrete flags.
    pub fn flag_options(&self) -> RawOptions {
        RawOptions {
            app_name: self.app_name.clone(),
            region: self.region.clone(),
            with_own_vpc: self.with_own_vpc.clone(),
            ssm_sg_id: self.ssm_sg_id.clone(),
            ssm_subnet1_id: self.ssm_subnet1_id.clone(),
            ssm_subnet2_id: self.ssm_subnet2_id.clone(),
            ses_source: self.ses_source.clone(),
            with_database: self.with_database.clone(),
            package_full_name: self.package_full_name.clone(),
            jacoco_min_coverage: self.jacoco_min_coverage.clone(),
            with_snapstart: self.with_snapstart.clone(),
            with_swagger_ui: self.with_swagger_ui.clone(),
            with_gen_clients: self.with_gen_clients.clone(),
            with_publish_to_npm_registry: self.with_publish_to_npm_registry.clone(),
            ts_client_default_openapi_server_url: self.ts_client_default_openapi_server_url.clone(),
            ts_client_api_url_env_var_name: self.ts_client_api_url_env_var_name.clone(),
            custom_java_deps: self.custom_java_deps.clone(),
            custom_java_repositories: self.custom_java_repositories.clone(),
            custom_java_env_vars: self.custom_java_env_vars.clone(),
        }
    }

    /// Options from `--poja-conf`, if any, overridden by explicit flags.
    ///
    /// # Errors
    /// * `ConfigError::Parse` if the configuration file cannot be read or parsed
    pub fn raw_options(&self) -> Result<RawOptions, ConfigError> {
        let base = match &self.poja_conf {
            Some(path) => RawOptions::from_file(path)?,
            None => RawOptions::default(),
        };
        Ok(base.merge(self.flag_options()))
    }

    /// `--template-root` if given, otherwise [`default_template_root`].
    pub fn resolved_template_root(&self) -> PathBuf {
        self.template_root.clone().unwrap_or_else(default_template_root)
    }
}

/// Finds an installed template tree for the binary at `exe`: either
/// `templates/poja` beside it or under `../share/poja/`.
pub fn installed_template_root(exe: &Path) -> Option<PathBuf> {
    let bin_dir = exe.parent()?;
    [bin_dir.join(TEMPLATE_DIR), bin_dir.join(SHARE_DIR).join(TEMPLATE_DIR)]
        .into_iter()
        .find(|candidate| candidate.is_dir())
}

/// Template tree used without `--template-root`.
///
/// Prefers a tree installed next to the running binary and falls back to the
/// source checkout it was built from.
pub fn default_template_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| installed_template_root(&exe))
        .unwrap_or_else(|| PathBuf::from(BUILD_TEMPLATE_ROOT))
}

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 and the help text when called without any argument
/// * With clap's default error handling for invalid arguments
pub fn get_args() -> Args {
    if std::env::args_os().len() <= 1 {
        let _ = Args::command().help_template(HELP_TEMPLATE).print_help();
        std::process::exit(1);
    }
    Args::parse()
}
