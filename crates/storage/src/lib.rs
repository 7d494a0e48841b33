//! Storage abstraction and implementations for dcqc.
//!
//! This crate provides the blob store capability used to resolve and fetch
//! remote files, a local mirror implementation, and JSON document IO.

#![warn(missing_docs)]

pub mod trait_;
pub mod local;
pub mod documents;

pub use trait_::{BlobInfo, BlobStore, StorageError, Result};
pub use local::LocalBlobStore;
pub use documents::{read_json, write_json};
