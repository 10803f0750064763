use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the component repository.
/// 零件儲存層可能發生的錯誤。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("the workspace at '{0}' wasn't found")]
    WorkspaceNotFound(PathBuf),
    #[error("the workspace hasn't been opened yet")]
    WorkspaceNotOpen,
    #[error("the component '{0}' wasn't found")]
    ComponentNotFound(String),
    #[error("couldn't locate the component manifest in path {0}")]
    ManifestNotFound(PathBuf),
    #[error("a component named '{0}' already exists")]
    ComponentExists(String),
    #[error("the component is already named '{0}' (use rename instead)")]
    NameAlreadySet(String),
    #[error("invalid component name '{0}'")]
    InvalidName(String),
    #[error("invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },
    #[error("the component '{0}' hasn't been saved yet")]
    ComponentNotSaved(String),
    #[error("the component '{0}' has been deleted")]
    ComponentDeleted(String),
    #[error("no image was found with the name '{0}'")]
    ImageNotFound(String),
    #[error("failed to decode image {path}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("I/O error on '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
