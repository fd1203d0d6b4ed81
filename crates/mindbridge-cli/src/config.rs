use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mindbridge_api::client::DEFAULT_BASE_URL;
use mindbridge_core::models::session::DEFAULT_MODEL;
use mindbridge_core::models::user::Credentials;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

const CONFIG_FILE: &str = "config.json";
const AUTH_FILE: &str = "auth.json";

/// Environment variable overriding the configured backend URL.
pub const API_URL_ENV: &str = "MINDBRIDGE_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindbridgeConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub base_url: String,
    /// Chat model sent with streamed messages. Added in v1.
    pub default_model: String,
    /// Overall limit per request. Absent means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub created_at: jiff::Timestamp,
}

impl MindbridgeConfig {
    pub fn new(base_url: impl Into<String>, now: jiff::Timestamp) -> Self {
        Self {
            config_version: CURRENT_VERSION,
            base_url: base_url.into(),
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: None,
            created_at: now,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Printable summary of the config and the stored login. The token is
/// never shown in full.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigInfo {
    pub path: String,
    pub base_url: String,
    pub default_model: String,
    pub request_timeout_secs: Option<u64>,
    pub created_at: String,
    pub signed_in_as: Option<String>,
    pub token_hint: Option<String>,
    pub token_expires_at: Option<String>,
}

pub fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("com.mindbridge.cli"))
}

/// Load the config stored in `dir`, or `None` if there is none yet.
pub fn load_config(dir: &Path) -> eyre::Result<Option<MindbridgeConfig>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: MindbridgeConfig = serde_json::from_value(migrated)?;
    Ok(Some(config))
}

/// Load the stored config, falling back to defaults without writing them.
pub fn load_or_default(dir: &Path) -> eyre::Result<MindbridgeConfig> {
    Ok(load_config(dir)?
        .unwrap_or_else(|| MindbridgeConfig::new(DEFAULT_BASE_URL, jiff::Timestamp::now())))
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update mindbridge."
        ));
    }

    // v0 → v1: add default_model
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("default_model")
            .or_insert(serde_json::Value::String(DEFAULT_MODEL.to_string()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (added default_model)");
    }

    Ok(json)
}

pub fn save_config(dir: &Path, config: &MindbridgeConfig) -> eyre::Result<()> {
    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = write_private(dir, CONFIG_FILE, &serde_json::to_string_pretty(&stamped)?)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

pub fn load_auth(dir: &Path) -> eyre::Result<Option<Credentials>> {
    let path = dir.join(AUTH_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read login at {}: {e}", path.display()))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

pub fn save_auth(dir: &Path, credentials: &Credentials) -> eyre::Result<()> {
    let path = write_private(dir, AUTH_FILE, &serde_json::to_string_pretty(credentials)?)?;
    tracing::debug!(path = %path.display(), "login saved");
    Ok(())
}

pub fn delete_auth(dir: &Path) -> eyre::Result<()> {
    let path = dir.join(AUTH_FILE);
    if path.exists() {
        std::fs::remove_file(&path)?;
        tracing::info!(path = %path.display(), "login deleted");
    }
    Ok(())
}

/// Write `contents` to `dir/name` via a temp file and rename, readable only
/// by the owner on Unix.
fn write_private(dir: &Path, name: &str, contents: &str) -> eyre::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(name);
    let tmp_path = dir.join(format!("{name}.tmp"));
    std::fs::write(&tmp_path, contents.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;
    Ok(path)
}

/// Pick the backend URL: command-line flag, then environment, then config.
pub fn resolve_base_url(
    flag: Option<&str>,
    env: Option<&str>,
    config: &MindbridgeConfig,
) -> String {
    [flag, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(config.base_url.as_str())
        .to_string()
}

pub fn config_info(
    dir: &Path,
    config: &MindbridgeConfig,
    credentials: Option<&Credentials>,
) -> ConfigInfo {
    ConfigInfo {
        path: dir.join(CONFIG_FILE).display().to_string(),
        base_url: config.base_url.clone(),
        default_model: config.default_model.clone(),
        request_timeout_secs: config.request_timeout_secs,
        created_at: config.created_at.to_string(),
        signed_in_as: credentials.map(|c| format!("{} ({})", c.user.name, c.user.role)),
        token_hint: credentials.map(|c| redact_token(&c.token)),
        token_expires_at: credentials.and_then(|c| c.expires_at.map(|at| at.to_string())),
    }
}

fn redact_token(token: &str) -> String {
    if token.len() <= 8 {
        return "****".to_string();
    }
    match (token.get(..4), token.get(token.len() - 4..)) {
        (Some(prefix), Some(suffix)) => format!("{prefix}...{suffix}"),
        _ => "****".to_string(),
    }
}
