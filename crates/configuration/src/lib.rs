use config::{Environment, File, Source};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{Config, DatabaseSettings, DemoSettings, LogFormat, LoggingSettings};

/// Prefix for environment overrides, e.g. `NOTES__DATABASE__MAX_CONNECTIONS=4`.
const ENV_PREFIX: &str = "NOTES";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads the application configuration from the default `config.toml` file.
///
/// The file is optional here: without it, defaults and environment
/// variables are used.
pub fn load_config() -> Result<Config, ConfigError> {
    let file = File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false);
    build_config(file, env_source(), fallback_url())
}

/// Loads the application configuration from an explicitly chosen `path`.
///
/// Layers, lowest precedence first: built-in defaults, the TOML file (which
/// must exist), then `NOTES__*` environment variables. If no layer sets
/// `database.url`, the `DATABASE_URL` variable is used.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let file = File::from(path).required(true);
    build_config(file, env_source(), fallback_url())
}

fn fallback_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn build_config<S>(
    file: S,
    env: Environment,
    fallback_url: Option<String>,
) -> Result<Config, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let mut config = builder.try_deserialize::<Config>()?;

    if config.database.url.trim().is_empty() {
        if let Some(url) = fallback_url {
            config.database.url = url;
        }
    }

    Ok(config)
}
