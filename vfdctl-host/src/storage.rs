//! Directory-backed storage volume

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use vfdctl_core::traits::{StorageError, StorageMedium};

/// A directory on the host filesystem standing in for removable media
///
/// Resource names resolve relative to the root directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageMedium for FileStorage {
    type Handle = File;

    fn open(&mut self, resource: &str) -> Result<Self::Handle, StorageError> {
        File::open(self.root.join(resource)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Io,
        })
    }

    fn read(&mut self, handle: &mut Self::Handle, buffer: &mut [u8]) -> Result<usize, StorageError> {
        handle.read(buffer).map_err(|_| StorageError::Io)
    }

    fn close(&mut self, handle: Self::Handle) {
        drop(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfdctl_core::config::{ConfigLoader, LoadError};

    #[test]
    fn test_open_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.open("conf.txt"),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn test_load_document_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("conf.txt"),
            "{\n  // bench unit\n  \"device\": {\"device_name\": \"bench-1\"},\n  \"broker\": {\"broker_url\": \"broker.example\"}\n}",
        )
        .unwrap();

        let mut loader = ConfigLoader::new(FileStorage::new(dir.path()));
        let config = loader.load("conf.txt").unwrap();
        assert!(config.formed);
        assert_eq!(config.device.name.as_str(), "bench-1");
        assert_eq!(config.broker.url.as_str(), "broker.example");
    }

    #[test]
    fn test_load_missing_resource_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ConfigLoader::new(FileStorage::new(dir.path()));
        let result = loader.load("conf.txt");
        assert!(matches!(result, Err(LoadError::ResourceUnavailable)));
    }

    #[test]
    fn test_reads_span_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        std::fs::write(dir.path().join("blob"), vec![0x55u8; 4096]).unwrap();

        let mut handle = storage.open("blob").unwrap();
        let mut total = 0;
        let mut buffer = [0u8; 512];
        loop {
            let n = storage.read(&mut handle, &mut buffer).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        storage.close(handle);
        assert_eq!(total, 4096);
    }
}
