//! Storage access for the configuration volume

/// Errors surfaced by a storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// The named resource does not exist on the volume
    NotFound,
    /// The volume or the handle failed mid-operation
    Io,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "resource not found"),
            Self::Io => write!(f, "storage i/o failure"),
        }
    }
}

/// A mounted volume holding named read-only resources
///
/// Handles are consumed by [`close`](StorageMedium::close), so a
/// handle cannot be released twice.
pub trait StorageMedium {
    /// Backend-specific open-file state
    type Handle;

    /// Open a named resource for reading
    fn open(&mut self, resource: &str) -> Result<Self::Handle, StorageError>;

    /// Read the next chunk, returning the byte count; 0 means end of
    /// resource
    fn read(&mut self, handle: &mut Self::Handle, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Release the handle
    fn close(&mut self, handle: Self::Handle);
}
