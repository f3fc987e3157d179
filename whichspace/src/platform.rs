use std::path::{Path, PathBuf};

use crate::core::{Snapshot, SnapshotRecord};

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("window server connection unavailable")]
    ConnectionUnavailable,
    #[error("window server returned no managed display spaces")]
    NoDisplaySpaces,
    #[error("failed to read snapshot {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Trait for querying display and space state from the system.
/// This abstraction allows mocking in tests.
pub trait SpaceDataSource {
    /// Raw records exactly as the source reports them, no caching.
    fn query_record(&self) -> Result<SnapshotRecord, DataSourceError>;

    fn query_snapshot(&self) -> Result<Snapshot, DataSourceError> {
        self.query_record().map(Snapshot::from_record)
    }
}

/// Trait for rendering the resolved label (side effects).
/// Only ever called from the main thread.
pub trait StatusPublisher {
    fn publish(&mut self, label: &str);
}

/// macOS implementation of SpaceDataSource backed by the window server.
#[cfg(target_os = "macos")]
pub struct MacOSSpaceDataSource {
    connection: crate::macos::ConnectionId,
}

#[cfg(target_os = "macos")]
impl MacOSSpaceDataSource {
    pub fn new() -> Self {
        Self {
            connection: crate::macos::default_connection(),
        }
    }
}

#[cfg(target_os = "macos")]
impl SpaceDataSource for MacOSSpaceDataSource {
    fn query_record(&self) -> Result<SnapshotRecord, DataSourceError> {
        if self.connection == 0 {
            return Err(DataSourceError::ConnectionUnavailable);
        }
        let displays = crate::macos::copy_managed_display_spaces(self.connection)
            .ok_or(DataSourceError::NoDisplaySpaces)?;
        let active_display = crate::macos::copy_active_menu_bar_display(self.connection);
        Ok(SnapshotRecord {
            displays,
            active_display,
        })
    }
}

#[cfg(target_os = "macos")]
impl Default for MacOSSpaceDataSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a JSON snapshot captured earlier with `whichspace snapshot`.
pub struct FileDataSource {
    path: PathBuf,
}

impl FileDataSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SpaceDataSource for FileDataSource {
    fn query_record(&self) -> Result<SnapshotRecord, DataSourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| {
            DataSourceError::Read {
                path: self.path.clone(),
                source,
            }
        })?;
        serde_json::from_str(&contents).map_err(|source| DataSourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    #[test]
    fn test_file_data_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let record = create_test_record(vec![create_test_display("Main", 2, &[1, 2])], "Main");
        std::fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

        let source = FileDataSource::new(&path);
        assert_eq!(source.query_record().unwrap(), record);
        assert_eq!(source.query_snapshot().unwrap().displays.len(), 1);
    }

    #[test]
    fn test_file_data_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileDataSource::new(dir.path().join("missing.json"));
        assert!(matches!(
            missing.query_record(),
            Err(DataSourceError::Read { .. })
        ));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileDataSource::new(&path).query_record(),
            Err(DataSourceError::Parse { .. })
        ));
    }

    #[test]
    fn test_mock_without_record_is_unavailable() {
        let source = MockSpaceDataSource::new();
        assert!(matches!(
            source.query_snapshot(),
            Err(DataSourceError::ConnectionUnavailable)
        ));
        assert_eq!(source.query_count(), 1);
    }
}
