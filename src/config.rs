//! YAML-backed settings.
//!
//! [`IngestionSettings`] is the serializable part of [`IngestionOptions`] plus an optional file
//! discovery block, so a batch job can be described in a document like:
//!
//! ```yaml
//! format: workbook
//! header_marker: Date
//! alert_at_or_above: error
//! discovery:
//!   dirs: [/data/incoming]
//!   pattern: "*.xlsx"
//!   max_age: 2days
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::discovery::FileFilter;
use crate::error::DataResult;
use crate::ingestion::{IngestionOptions, IngestionSeverity, SourceFormat, DEFAULT_HEADER_MARKER};

/// Decode the YAML document at `path` into `T`.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> DataResult<T> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(file)?)
}

/// Ingestion settings as read from a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Force a source format instead of inferring it from extensions.
    pub format: Option<SourceFormat>,
    pub header_marker: String,
    pub alert_at_or_above: IngestionSeverity,
    /// Where to look for source files.
    pub discovery: Option<DiscoverySettings>,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            format: None,
            header_marker: DEFAULT_HEADER_MARKER.to_string(),
            alert_at_or_above: IngestionSeverity::Critical,
            discovery: None,
        }
    }
}

/// File discovery block of [`IngestionSettings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    pub dirs: Vec<PathBuf>,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Maximum file age, e.g. `"30m"` or `"2days"`.
    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
}

fn default_pattern() -> String {
    "*".to_string()
}

impl IngestionSettings {
    /// Load settings from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> DataResult<Self> {
        load_yaml(path)
    }

    /// Options for [`crate::ingestion::LoadedRows::from_files_with_options`]; no observer is set.
    pub fn to_options(&self) -> IngestionOptions {
        IngestionOptions {
            format: self.format,
            header_marker: self.header_marker.clone(),
            alert_at_or_above: self.alert_at_or_above,
            ..Default::default()
        }
    }

    /// File filter described by the discovery block, if there is one.
    pub fn file_filter(&self) -> DataResult<Option<FileFilter>> {
        let Some(discovery) = &self.discovery else {
            return Ok(None);
        };
        let mut filter = FileFilter::new()
            .with_pattern(&discovery.pattern)?
            .with_dirs(&discovery.dirs);
        if let Some(age) = discovery.max_age {
            filter = filter.with_max_age(age);
        }
        Ok(Some(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let doc = "format: workbook\nheader_marker: Date\nalert_at_or_above: error\ndiscovery:\n  dirs: [/data/in]\n  pattern: \"*.xlsx\"\n  max_age: 2h\n";
        let settings: IngestionSettings = serde_yaml::from_str(doc).unwrap();
        assert_eq!(settings.format, Some(SourceFormat::Workbook));
        assert_eq!(settings.alert_at_or_above, IngestionSeverity::Error);
        let discovery = settings.discovery.clone().unwrap();
        assert_eq!(discovery.max_age, Some(Duration::from_secs(7200)));

        let opts = settings.to_options();
        assert_eq!(opts.header_marker, "Date");
        assert!(opts.observer.is_none());
        assert!(settings.file_filter().unwrap().is_some());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let settings: IngestionSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, IngestionSettings::default());
        assert!(settings.file_filter().unwrap().is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = IngestionSettings::from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, crate::error::DataError::Io(_)));
    }
}
