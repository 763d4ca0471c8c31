use std::io;
use std::path::PathBuf;

use poja::error::{ConfigError, Error, RenderError, ResolutionError, WriteError};

#[test]
fn test_error_conversion() {
    let err: Error = ConfigError::MissingRequiredField { field: "app_name" }.into();
    assert!(matches!(err, Error::Config(ConfigError::MissingRequiredField { .. })));

    let err: Error = WriteError::Io {
        path: PathBuf::from("out"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    }
    .into();
    assert!(matches!(err, Error::Write(WriteError::Io { .. })));
}

#[test]
fn test_error_display() {
    let err: Error = ConfigError::MissingRequiredField { field: "app_name" }.into();
    assert_eq!(err.to_string(), "Configuration error: 'app_name' is required.");

    let err = ConfigError::MissingDependentField { field: "ssm_sg_id", required_by: "with_own_vpc" };
    assert_eq!(
        err.to_string(),
        "Configuration error: 'ssm_sg_id' is required when 'with_own_vpc' is set."
    );

    let err = ConfigError::InvalidBoolean { field: "with_snapstart", value: "yes".to_string() };
    assert_eq!(
        err.to_string(),
        "Configuration error: 'with_snapstart' must be \"true\" or \"false\", got 'yes'."
    );

    let err = ResolutionError::ConflictingVariant {
        output: "build.gradle".to_string(),
        first: "build.gradle.j2".to_string(),
        second: "build.gradle".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Resolution error: 'build.gradle' is produced by both 'build.gradle.j2' and 'build.gradle'."
    );

    let err = RenderError::InvalidAuxEntry {
        path: PathBuf::from("deps.txt"),
        kind: "custom_java_deps",
        line_number: 2,
        line: "compile 'a:b:1'".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Render error: deps.txt:2: invalid custom_java_deps entry 'compile 'a:b:1''."
    );

    let err = WriteError::PathConflict { path: PathBuf::from("out/build.gradle") };
    assert_eq!(
        err.to_string(),
        "Write error: 'out/build.gradle' is targeted by more than one entry."
    );
}
