use std::path::PathBuf;
use thiserror::Error;

/// Failure to read a gamelist or recovery fragment into an element tree, or
/// to write one back out.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Unbalanced element <{0}>")]
    Unbalanced(String),

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Document has more than one root element")]
    MultipleRoots,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Malformed document {}: {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("Path {} lies outside library root {}", path.display(), root.display())]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Unrecognized extension: {}", .0.display())]
    UnknownExtension(PathBuf),

    #[error("Write failed for {}: {reason}", path.display())]
    WriteFailure { path: PathBuf, reason: String },

    #[error("Rename {} -> {} failed: {reason}", from.display(), to.display())]
    RenameFailure {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Unknown metadata field: {0}")]
    UnknownField(String),

    #[error("Unknown library: {0}")]
    UnknownLibrary(String),

    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

impl StoreError {
    /// Per-entry rejections that skip one node but never abort a load.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::PathOutsideRoot { .. } | StoreError::UnknownExtension(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
