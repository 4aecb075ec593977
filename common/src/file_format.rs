use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum FileFormatError {
    #[error("Failed to get file extension of '{0}'")]
    MissingFileExtension(PathBuf),
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(PathBuf),
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FileFormatResult<T> = Result<T, FileFormatError>;

/// Text formats accepted for configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_file_name(path: &Path) -> FileFormatResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| FileFormatError::MissingFileExtension(path.to_path_buf()))?;

        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(FileFormatError::UnsupportedFileExtension(
                path.to_path_buf(),
            )),
        }
    }
}

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> FileFormatResult<String> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::to_string(value)?),
        FileFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub fn deserialize<T: DeserializeOwned>(
    serialized: &str,
    format: FileFormat,
) -> FileFormatResult<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        FileFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

/// Read and deserialize a file, picking the format from its extension.
pub fn load_from_file<T: DeserializeOwned>(path: &Path) -> FileFormatResult<T> {
    let format = FileFormat::from_file_name(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| FileFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    deserialize(&text, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: f32,
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FileFormat::from_file_name(Path::new("a/b.YML")).unwrap(),
            FileFormat::Yaml
        );
        assert_eq!(
            FileFormat::from_file_name(Path::new("params.json")).unwrap(),
            FileFormat::Json
        );
        assert!(matches!(
            FileFormat::from_file_name(Path::new("params")),
            Err(FileFormatError::MissingFileExtension(_))
        ));
        assert!(matches!(
            FileFormat::from_file_name(Path::new("params.toml")),
            Err(FileFormatError::UnsupportedFileExtension(_))
        ));
    }

    #[test]
    fn test_yaml_and_json_agree() {
        let sample = Sample {
            name: "speck".to_string(),
            value: 0.25,
        };
        for format in [FileFormat::Yaml, FileFormat::Json] {
            let text = serialize(&sample, format).unwrap();
            let back: Sample = deserialize(&text, format).unwrap();
            assert_eq!(back, sample);
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        std::fs::write(&path, "name: dust\nvalue: 1.5\n").unwrap();

        let loaded: Sample = load_from_file(&path).unwrap();
        assert_eq!(loaded.name, "dust");
        assert_eq!(loaded.value, 1.5);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = load_from_file::<Sample>(Path::new("/nonexistent/sample.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sample.json"));
    }
}
