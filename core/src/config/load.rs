use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::StateError;

/// Get the default recce data directory: ~/.recce
pub fn get_recce_data_dir() -> Result<PathBuf, StateError> {
    dirs::home_dir().map(|home| home.join(".recce")).ok_or_else(|| {
        StateError::configuration(
            "Cannot determine home directory",
            "Set HOME (or USERPROFILE on Windows).",
        )
    })
}

fn parse_file(path: &Path) -> Result<AppConfig, StateError> {
    let s = std::fs::read_to_string(path)?;
    toml::from_str::<AppConfig>(&s).map_err(|e| {
        StateError::configuration(
            format!("Invalid config file {}: {}", path.display(), e),
            "Fix the TOML syntax or remove the file to use defaults.",
        )
    })
}

pub fn load_default() -> Result<AppConfig, StateError> {
    // Priority 1: ~/.recce/config.toml
    let recce_config = get_recce_data_dir()?.join("config.toml");

    // Priority 2: ./recce.toml (current directory)
    let local_config = Path::new("recce.toml");

    let mut cfg = if recce_config.exists() {
        parse_file(&recce_config)?
    } else if local_config.exists() {
        parse_file(local_config)?
    } else {
        AppConfig::default()
    };

    // Environment variable overrides (Priority 0: highest)
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Overlays non-blank variables from `lookup` onto `cfg`.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("RECCE_CLOUD_API_HOST") {
        cfg.cloud.api_host = v;
    }
    if let Some(v) = get("RECCE_CLOUD_TOKEN") {
        cfg.cloud.token = Some(v);
    }
    if let Some(v) = get("RECCE_STATE_HOST") {
        cfg.state_host = Some(v);
    }
    if let Some(v) = get("AWS_REGION").or_else(|| get("AWS_DEFAULT_REGION")) {
        cfg.object_store.region = v;
    }
    if let Some(v) = get("AWS_ENDPOINT_URL_S3") {
        cfg.object_store.endpoint = Some(v);
    }
    if let Some(v) = get("AWS_ACCESS_KEY_ID") {
        cfg.object_store.access_key_id = Some(v);
    }
    if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
        cfg.object_store.secret_access_key = Some(v);
    }
    if let Some(v) = get("AWS_SESSION_TOKEN") {
        cfg.object_store.session_token = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.cloud.api_host, "https://staging.cloud.datarecce.io");
        assert_eq!(cfg.cloud.timeout_ms, 30_000);
        assert_eq!(cfg.object_store.region, "us-east-1");
        assert!(cfg.state_host.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            lookup_from(&[
                ("RECCE_CLOUD_API_HOST", "https://cloud.example.com"),
                ("RECCE_CLOUD_TOKEN", "tok"),
                ("RECCE_STATE_HOST", "s3://states"),
                ("AWS_DEFAULT_REGION", "eu-west-1"),
                ("AWS_ACCESS_KEY_ID", "AKID"),
            ]),
        );
        assert_eq!(cfg.cloud.api_host, "https://cloud.example.com");
        assert_eq!(cfg.cloud.token.as_deref(), Some("tok"));
        assert_eq!(cfg.state_host.as_deref(), Some("s3://states"));
        assert_eq!(cfg.object_store.region, "eu-west-1");
        assert_eq!(cfg.object_store.access_key_id.as_deref(), Some("AKID"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, lookup_from(&[("RECCE_CLOUD_API_HOST", "  ")]));
        assert_eq!(cfg.cloud.api_host, "https://staging.cloud.datarecce.io");
    }

    #[test]
    fn test_region_prefers_aws_region() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            lookup_from(&[("AWS_REGION", "ap-south-1"), ("AWS_DEFAULT_REGION", "eu-west-1")]),
        );
        assert_eq!(cfg.object_store.region, "ap-south-1");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [cloud]
            token = "abc"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cloud.token.as_deref(), Some("abc"));
        assert_eq!(cfg.cloud.api_host, "https://staging.cloud.datarecce.io");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.console);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recce.toml");
        std::fs::write(&path, "[cloud\n").unwrap();
        let err = parse_file(&path).unwrap_err();
        assert!(err.hint().is_some());
    }
}
