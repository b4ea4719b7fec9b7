//! Internal-consistency errors.
//!
//! These indicate a bug in the engine or an inconsistent cache, not a
//! problem in analyzed code. They are never reported as analysis issues and
//! never pass through the issue gate; callers propagate them with `?` and
//! the driver aborts the run.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("expecting {id} to have storage in {path}")]
    MissingFunction { id: String, path: String },

    #[error("not expecting {id} to not have storage in {path}")]
    MissingDeclaringFunction { id: String, path: String },

    #[error("property {id} should exist")]
    MissingProperty { id: String },

    #[error("could not get class storage for {name}")]
    MissingClassLike { name: String },

    #[error("could not get file storage for {path}")]
    MissingFile { path: String },

    #[error("expecting non-empty root file path and checked file path")]
    MissingFilePaths,

    #[error("malformed property id {id}")]
    MalformedPropertyId { id: String },
}
