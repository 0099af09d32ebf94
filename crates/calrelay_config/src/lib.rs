use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::warn;
pub mod models;
pub use models::*;

/// Prefix for configuration environment variables, e.g. `CALRELAY__SERVER__PORT`.
pub const DEFAULT_PREFIX: &str = "CALRELAY";

/// Marker value replaced by an environment variable at load time.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Loads the layered configuration.
///
/// Sources, later ones winning:
/// 1. `$CONFIG_DIR/default.*` (optional)
/// 2. `$CONFIG_DIR/$RUN_ENV.*` (optional, `RUN_ENV` defaults to `debug`)
/// 3. `CALRELAY__*` environment variables
///
/// String values equal to `"secret_from_env"` are then replaced from the
/// environment, see [`apply_env_overrides_from_marker`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    tracing::debug!(
        "Loading config from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    load_config_from(builder)
}

/// Builds and deserializes a prepared source stack, then resolves secret markers.
pub fn load_config_from(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values.
///
/// The variable name is the value's path joined with `_` and upper-cased:
/// `cal.api_key` reads `CAL_API_KEY`. Returns the paths whose variable was
/// not set; their marker is left in place.
fn inject_env_secrets(value: &mut Value) -> Vec<Vec<String>> {
    fn walk(path: Vec<String>, obj: &mut Value, unresolved: &mut Vec<Vec<String>>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v, unresolved);
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter_mut().enumerate() {
                    let mut new_path = path.clone();
                    new_path.push(i.to_string());
                    walk(new_path, v, unresolved);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = std::env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    unresolved.push(path);
                }
            }
            _ => {}
        }
    }

    let mut unresolved = Vec::new();
    walk(vec![], value, &mut unresolved);
    unresolved
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config.
///
/// A marker left unresolved is an error, except inside the `x402` section
/// while `use_x402` is off.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    let unresolved = inject_env_secrets(&mut json);

    let (tolerated, missing): (Vec<_>, Vec<_>) = unresolved
        .into_iter()
        .partition(|path| !config.use_x402 && path.first().map(String::as_str) == Some("x402"));
    for path in &tolerated {
        warn!("env var {} not set, x402 is disabled", path.join("_").to_uppercase());
    }
    let missing: Vec<String> = missing
        .iter()
        .map(|path| path.join("_").to_uppercase())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::Message(format!(
            "missing environment variables for {SECRET_MARKER} values: {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, at most once.
///
/// The file is `$DOTENV_OVERRIDE` when set, else the first command line
/// argument if it starts with `.env`, else `.env`. A missing file is ignored.
/// Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = std::env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
