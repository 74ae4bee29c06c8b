//! tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Filter for a bare level; dependencies stay at `warn`
fn level_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    if level.contains('=') || level.contains(',') {
        level
    } else {
        format!("warn,wfexport={level},wf_export={level}")
    }
}

/// Pick the filter: `--log-level`, then `RUST_LOG`, then the config, then `info`
fn select_filter(cli_level: Option<&str>, env_filter: Option<&str>, config_level: Option<&str>) -> String {
    if let Some(level) = cli_level.filter(|l| !l.is_empty()) {
        return level_directives(level);
    }
    if let Some(filter) = env_filter.filter(|f| !f.is_empty()) {
        return filter.to_string();
    }
    level_directives(config_level.filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LEVEL))
}

pub fn init(cli_level: Option<&str>, config_level: Option<&str>) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = select_filter(cli_level, env.as_deref(), config_level);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(level_directives(DEFAULT_LEVEL)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
