//! Storage infrastructure of the document store.
//!
//! Owns the byte-level representation of document content: flat text blobs
//! addressable by a per-document deterministic name, the audit log lines
//! embedded in them, and the per-document exclusive locks that serialize
//! content resets.

pub mod audit;
pub mod content;
pub mod locks;

pub use audit::AuditLog;
pub use audit::AuditOperation;
pub use content::ContentHandle;
pub use content::ContentStore;
pub use locks::DocumentLocks;
pub use locks::LockTimeout;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("content blob '{name}' already exists")]
    AlreadyExists { name: String },
    #[error("content blob '{name}' is not materialized")]
    NotMaterialized { name: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
