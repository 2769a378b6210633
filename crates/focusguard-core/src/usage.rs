//! Usage-data sources.
//!
//! The platform usage-stats service is external; this module only defines the
//! contract the aggregator queries and a JSON-file implementation used by the
//! CLI and for offline replays.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::UsageSourceError;

/// Bucket granularity requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Let the platform pick the best fit for the range.
    Best,
}

/// Total foreground time of one package inside the queried range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUsage {
    pub package_name: String,
    pub total_foreground_millis: i64,
}

impl PackageUsage {
    pub fn new(package_name: impl Into<String>, total_foreground_millis: i64) -> Self {
        Self {
            package_name: package_name.into(),
            total_foreground_millis,
        }
    }

    pub fn from_minutes(package_name: impl Into<String>, minutes: i64) -> Self {
        Self::new(package_name, minutes * 60_000)
    }
}

/// Platform usage statistics.
///
/// A package may appear more than once when the platform returns several
/// buckets; callers sum the rows.
pub trait UsageSource: Send + Sync {
    fn query(
        &self,
        kind: IntervalKind,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<PackageUsage>, UsageSourceError>;
}

/// Reads a JSON array of [`PackageUsage`] on every query.
///
/// The file is a snapshot of today's usage; the interval is validated but not
/// used for filtering.
#[derive(Debug, Clone)]
pub struct JsonFileUsageSource {
    path: PathBuf,
}

impl JsonFileUsageSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageSource for JsonFileUsageSource {
    fn query(
        &self,
        _kind: IntervalKind,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<PackageUsage>, UsageSourceError> {
        if end_millis <= start_millis {
            return Err(UsageSourceError::InvalidInterval {
                start_millis,
                end_millis,
            });
        }
        let read_failed = |message: String| UsageSourceError::ReadFailed {
            path: self.path.clone(),
            message,
        };
        let content = std::fs::read_to_string(&self.path).map_err(|e| read_failed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| read_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn json_file_source_reads_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"package_name":"com.example.feed","total_foreground_millis":2700000}}]"#
        )
        .unwrap();

        let source = JsonFileUsageSource::new(file.path());
        let rows = source.query(IntervalKind::Daily, 0, 1).unwrap();
        assert_eq!(rows, vec![PackageUsage::from_minutes("com.example.feed", 45)]);
    }

    #[test]
    fn json_file_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileUsageSource::new(dir.path().join("missing.json"));
        let err = source.query(IntervalKind::Daily, 0, 1).unwrap_err();
        assert!(matches!(err, UsageSourceError::ReadFailed { .. }));
    }

    #[test]
    fn json_file_source_rejects_inverted_interval() {
        let source = JsonFileUsageSource::new("unused.json");
        let err = source.query(IntervalKind::Daily, 10, 10).unwrap_err();
        assert!(matches!(err, UsageSourceError::InvalidInterval { .. }));
    }
}
