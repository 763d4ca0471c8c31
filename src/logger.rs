//! Logging setup for the poja binary.

use log::LevelFilter;

/// Initializes `env_logger` on stderr: `Debug` with `--verbose`, `Warn` otherwise.
/// `RUST_LOG`, when set, takes precedence over both.
pub fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}
