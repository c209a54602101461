//! Blob storage adapters.

pub mod filesystem;

pub use filesystem::FilesystemBlobStore;
