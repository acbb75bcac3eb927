use crate::assets::descriptor::AssetDescriptor;
use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// User-declared list of assets to fetch
///
/// Read from `.json` or `.toml`. Nothing about download state is ever written
/// back; presence and checksum on disk are the only durable state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

impl AssetManifest {
    /// Load an asset list, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("Failed to read asset list {}: {e}", path.display()))
        })?;

        let manifest = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content)?,
            Some("toml") => Self::from_toml(&content)?,
            _ => {
                return Err(FetchError::Config(format!(
                    "Unsupported asset list format: {} (expected .json or .toml)",
                    path.display()
                )))
            }
        };

        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| FetchError::Config(format!("Failed to parse asset list: {e}")))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FetchError::Config(format!("Failed to parse asset list: {e}")))
    }

    /// Validate every descriptor, reporting the first offender by position
    pub fn validate(&self) -> Result<()> {
        for (i, asset) in self.assets.iter().enumerate() {
            asset.validate().map_err(|e| {
                FetchError::InvalidArgument(format!("asset #{}: {e}", i + 1))
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_manifest() {
        let manifest = AssetManifest::default();
        assert!(manifest.is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assets.toml");
        fs::write(
            &path,
            r#"
            [[assets]]
            url = "https://host/model.zip"
            subfolder = "Resnet"

            [[assets]]
            url = "https://host/labels.txt"
            subfolder = "Resnet"
            sha256 = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
            "#,
        )
        .unwrap();

        let manifest = AssetManifest::load(&path).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.assets[0].file_name().unwrap(), "model.zip");
        assert!(manifest.assets[1].expected_checksum().is_some());
    }

    #[test]
    fn test_load_json_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assets.json");
        fs::write(
            &path,
            r#"{"assets": [
                {"url": "https://host/b.pb", "subfolder": "Inception"},
                {"url": "https://host/a.txt", "subfolder": "Inception"}
            ]}"#,
        )
        .unwrap();

        let manifest = AssetManifest::load(&path).unwrap();
        let names: Vec<String> = manifest
            .assets
            .iter()
            .map(|a| a.file_name().unwrap())
            .collect();
        assert_eq!(names, vec!["b.pb", "a.txt"]);
    }

    #[test]
    fn test_invalid_entry_reports_position() {
        let manifest = AssetManifest::from_json(
            r#"{"assets": [
                {"url": "https://host/ok.pb", "subfolder": "Inception"},
                {"url": "", "subfolder": "Inception"}
            ]}"#,
        )
        .unwrap();

        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("asset #2"));
    }

    #[test]
    fn test_unknown_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assets.yaml");
        fs::write(&path, "assets: []").unwrap();

        assert!(matches!(
            AssetManifest::load(&path),
            Err(FetchError::Config(_))
        ));
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let result = AssetManifest::load(&temp_dir.path().join("missing.json"));
        assert!(result.is_err());
    }
}
