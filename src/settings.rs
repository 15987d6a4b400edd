use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// User supplied source definitions, merged over the built-ins.
pub fn custom_sources_path() -> PathBuf {
    home_dir().join("to-ynab-sources.json")
}

pub fn upload_config_path() -> PathBuf {
    home_dir().join(".ynab-config.json")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAccount {
    pub account_name: String,
    pub account_id: String,
    pub budget_name: String,
    pub budget_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub accounts: Vec<SavedAccount>,
}

/// Load the upload config. A file that no longer parses is removed.
pub fn load_upload_config() -> UploadConfig {
    let path = upload_config_path();
    let Ok(content) = std::fs::read_to_string(&path) else {
        return UploadConfig::default();
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Discarding unreadable {}: {e}", path.display());
            let _ = std::fs::remove_file(&path);
            UploadConfig::default()
        }
    }
}

pub fn save_upload_config(config: &UploadConfig) -> Result<()> {
    let json = serde_json::to_string(config)?;
    std::fs::write(upload_config_path(), json)?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(format!("{}{rest}", home.to_string_lossy()));
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_config_roundtrip_uses_camel_case() {
        let config = UploadConfig {
            access_token: "token".to_string(),
            accounts: vec![SavedAccount {
                account_name: "Checking".to_string(),
                account_id: "a1".to_string(),
                budget_name: "Home".to_string(),
                budget_id: "b1".to_string(),
            }],
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"accessToken\":\"token\""));
        assert!(json.contains("\"budgetId\":\"b1\""));
        let loaded: UploadConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.accounts, config.accounts);
    }

    #[test]
    fn test_upload_config_defaults_missing_fields() {
        let config: UploadConfig = serde_json::from_str(r#"{"accessToken": "abc"}"#).unwrap();
        assert_eq!(config.access_token, "abc");
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_shellexpand_path_plain() {
        assert_eq!(shellexpand_path("out/dir"), PathBuf::from("out/dir"));
    }

    #[test]
    fn test_shellexpand_path_home() {
        let expanded = shellexpand_path("~/exports");
        assert!(expanded.to_string_lossy().ends_with("/exports"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
