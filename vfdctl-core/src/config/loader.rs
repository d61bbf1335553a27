//! Configuration loading
//!
//! Reads the configuration document from a named resource on the
//! storage volume, strips comments, parses it, and builds the typed
//! [`Configuration`]. The storage handle is released exactly once on
//! every path out of [`ConfigLoader::load`].

use crate::traits::{StorageError, StorageMedium};

use super::document::{parse_document, strip_comments};
use super::types::Configuration;

/// Largest document the loader will read, in bytes
///
/// Anything past this is not read; a document cut short here fails to
/// parse and is reported as malformed.
pub const MAX_DOCUMENT_LEN: usize = 8192;

/// Why a load failed
///
/// Both cases are recoverable: the caller runs on defaults or retries
/// after the operator fixes the volume.
#[derive(Debug)]
pub enum LoadError {
    /// The resource could not be opened or read
    ResourceUnavailable,
    /// The document did not parse; carries the parser diagnostic
    MalformedDocument(serde_json_core::de::Error),
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ResourceUnavailable => write!(f, "configuration resource unavailable"),
            Self::MalformedDocument(err) => {
                write!(f, "malformed configuration document: {}", err)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LoadError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ResourceUnavailable => defmt::write!(f, "ResourceUnavailable"),
            Self::MalformedDocument(err) => {
                defmt::write!(f, "MalformedDocument({})", defmt::Debug2Format(err))
            }
        }
    }
}

/// Reads and assembles the gateway configuration
pub struct ConfigLoader<S: StorageMedium> {
    storage: S,
}

impl<S: StorageMedium> ConfigLoader<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Hand the storage backend back to the caller
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load the named resource into a fully-populated configuration
    ///
    /// Open failures and read failures report `ResourceUnavailable`;
    /// a document that does not parse reports `MalformedDocument`. On
    /// success the returned value has `formed` set.
    pub fn load(&mut self, resource: &str) -> Result<Configuration, LoadError> {
        let mut handle = self
            .storage
            .open(resource)
            .map_err(|_| LoadError::ResourceUnavailable)?;
        let mut buffer = [0u8; MAX_DOCUMENT_LEN];
        // The handle is closed before the buffer is inspected, so one
        // release covers success, read failure, and parse failure.
        let read = self.read_fully(&mut handle, &mut buffer);
        self.storage.close(handle);
        let len = read.map_err(|_| LoadError::ResourceUnavailable)?;

        let document_bytes = &mut buffer[..len];
        strip_comments(document_bytes);
        let document = parse_document(document_bytes).map_err(LoadError::MalformedDocument)?;
        let mut config = Configuration::from_document(&document);
        config.formed = true;
        Ok(config)
    }

    fn read_fully(
        &mut self,
        handle: &mut S::Handle,
        buffer: &mut [u8],
    ) -> Result<usize, StorageError> {
        let mut len = 0;
        while len < buffer.len() {
            match self.storage.read(handle, &mut buffer[len..])? {
                0 => break,
                n => len += n,
            }
        }
        Ok(len)
    }
}
